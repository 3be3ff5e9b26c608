//! Per-file stage flow shared by the raw, epochs and ICA cleaning stages.
//!
//! Argument parsing and data loading stay in the stage binaries; what they
//! share is the loop body: skip files that are already annotated unless
//! redoing, restore prior decisions unless resetting, hand the artifact to
//! the scientist, then record the outcome.

use tracing::info;

use crate::annotations::AnnotationStore;
use crate::artifact::Artifact;
use crate::error::Result;

/// Flags a stage run passes down to every file.
#[derive(Debug, Clone, Copy, Default)]
pub struct StageOptions {
    /// Re-clean files that already have an entry in the log.
    pub redo: bool,
    /// Start from a blank slate instead of restoring prior decisions.
    pub reset: bool,
    /// Fail when no sidecar exists yet (later stages require earlier ones).
    pub required: bool,
}

/// What happened to one file during a stage run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
    /// Already annotated and `redo` was not set.
    Skipped,
    /// Inspected and recorded.
    Cleaned,
}

/// Run the stage loop body for one artifact.
///
/// `inspect` is the interactive or batch annotation step; it sees the
/// artifact with prior annotations already merged (unless `reset`).
///
/// # Errors
///
/// Propagates store and guard errors, and whatever `inspect` returns.
pub fn clean_artifact<F>(
    store: &AnnotationStore,
    artifact: &mut Artifact,
    options: StageOptions,
    inspect: F,
) -> Result<StageOutcome>
where
    F: FnOnce(&mut Artifact) -> Result<()>,
{
    if !options.redo && store.is_annotated(artifact.kind(), artifact.file_name())? {
        info!(file = artifact.file_name(), "already cleaned, skipping");
        return Ok(StageOutcome::Skipped);
    }

    if options.reset {
        info!(file = artifact.file_name(), "resetting prior annotations");
    } else {
        store.apply(artifact, options.required)?;
    }

    inspect(artifact)?;
    store.record(artifact)?;
    Ok(StageOutcome::Cleaned)
}
