//! Persisted shape of the annotation sidecar.
//!
//! Field names mirror the on-disk JSON exactly (`bads`, `selection`,
//! `params`, `exclude`). Maps are `BTreeMap` and bad-channel lists are kept
//! sorted so that normalize-then-save is deterministic: saving an opened
//! document twice produces byte-identical sidecar content.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::TOOL_VERSION;

/// Provenance stamp: which build of the tool last wrote the document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LogConfig {
    /// Free-form build/revision identifier.
    pub version: String,
}

/// The whole sidecar document, one per data directory.
///
/// All artifacts inside a directory share this one document. After
/// [`CleaningLog::normalize`] the three sub-logs and the config stamp are
/// always present.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CleaningLog {
    /// Annotations for continuous recordings, keyed by file basename.
    #[serde(default)]
    pub raws: BTreeMap<String, RawEntry>,
    /// Annotations for epoch collections, keyed by file basename.
    #[serde(default)]
    pub epochs: BTreeMap<String, EpochsEntry>,
    /// Annotations for ICA decompositions, keyed by file basename.
    #[serde(default)]
    pub icas: BTreeMap<String, IcaEntry>,
    /// Provenance stamp; `None` only before normalization.
    #[serde(default)]
    pub config: Option<LogConfig>,
}

impl CleaningLog {
    /// Materialize missing pieces and canonicalize ordering.
    ///
    /// Stamps `config` when absent; warns (non-fatal) when the stored stamp
    /// was written by a different build. No schema migration is attempted.
    pub fn normalize(&mut self) {
        match &self.config {
            None => {
                self.config = Some(LogConfig {
                    version: TOOL_VERSION.to_string(),
                });
            }
            Some(config) if config.version != TOOL_VERSION => {
                warn!(
                    stored = %config.version,
                    current = %TOOL_VERSION,
                    "sidecar was written by a different eeg-cleaner version; \
                     annotations may not apply cleanly"
                );
            }
            Some(_) => {}
        }
        for entry in self.raws.values_mut() {
            canonicalize_bads(&mut entry.bads);
        }
        for entry in self.epochs.values_mut() {
            canonicalize_bads(&mut entry.bads);
        }
    }
}

fn canonicalize_bads(bads: &mut Vec<String>) {
    bads.sort_unstable();
    bads.dedup();
}

/// Union newly flagged channels into a stored `bads` list, keeping it sorted.
fn union_bads(stored: &mut Vec<String>, incoming: &BTreeSet<String>) {
    let mut merged: BTreeSet<String> = stored.drain(..).collect();
    merged.extend(incoming.iter().cloned());
    *stored = merged.into_iter().collect();
}

/// Annotations for one continuous recording.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RawEntry {
    /// Bad channel names. Grows by union, never shrinks automatically.
    #[serde(default)]
    pub bads: Vec<String>,
}

impl RawEntry {
    /// Union newly flagged channels into this entry.
    pub fn merge_bads(&mut self, incoming: &BTreeSet<String>) {
        union_bads(&mut self.bads, incoming);
    }
}

/// Annotations for one epoch collection.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EpochsEntry {
    /// Bad channel names, union-merged like [`RawEntry::bads`].
    #[serde(default)]
    pub bads: Vec<String>,
    /// Original-space indices retained as good at the time of last save.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection: Option<Vec<usize>>,
    /// Structural fingerprint, seeded on first save and immutable after.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<EpochsParams>,
}

impl EpochsEntry {
    /// Union newly flagged channels into this entry.
    pub fn merge_bads(&mut self, incoming: &BTreeSet<String>) {
        union_bads(&mut self.bads, incoming);
    }
}

/// Fingerprint of how an epoch collection was cut.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EpochsParams {
    /// Cut start offset relative to the event, in seconds.
    pub tmin: f64,
    /// Cut end offset relative to the event, in seconds.
    pub tmax: f64,
    /// Event sample-times of the retained epochs at first save.
    pub events: Vec<i64>,
}

/// Annotations for one ICA decomposition.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct IcaEntry {
    /// Component indices marked for exclusion. Last write wins: exclusions
    /// are one canonical decision per fit, not a union.
    #[serde(default)]
    pub exclude: Vec<usize>,
    /// Structural fingerprint, seeded on first save and immutable after.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<IcaParams>,
}

/// Fingerprint of an ICA fit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IcaParams {
    /// Names of the channels the decomposition was fit on.
    pub ch_names: Vec<String>,
    /// Fit-algorithm parameter set.
    pub fit_params: serde_json::Map<String, serde_json::Value>,
    /// Requested component count.
    pub n_components: f64,
    /// High-pass edge of the fitted data, in Hz.
    pub highpass: f64,
    /// Low-pass edge of the fitted data, in Hz.
    pub lowpass: f64,
    /// Sampling rate of the fitted data, in Hz.
    pub sfreq: f64,
}
