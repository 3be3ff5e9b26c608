//! Transient in-memory views of the data being annotated.
//!
//! Loading recordings, epoch collections and ICA decompositions from their
//! native binary formats is a collaborator's job. These types carry only the
//! state the annotation log reads and mutates: a stable file-name identity,
//! the mutable bad-channel set, and per kind the retained-epoch
//! bookkeeping or the ICA fit metadata the consistency guard fingerprints.
//!
//! The persisted log owns all annotation state; an artifact receives
//! annotations by mutation on the apply path and contributes them on the
//! record path, then is dropped.

use std::collections::BTreeSet;

/// Why an epoch was dropped from the retained set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropReason {
    /// Rejected during visual inspection (also used when re-applying a
    /// previously recorded rejection).
    Inspection,
    /// Rejected explicitly by the user.
    User,
    /// Any other reason (acquisition flag, amplitude threshold, ...).
    Other(String),
}

impl DropReason {
    /// True for drops that represent a human decision.
    #[must_use]
    pub const fn is_manual(&self) -> bool {
        matches!(self, Self::Inspection | Self::User)
    }
}

/// A continuous recording.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raw {
    file_name: String,
    /// Channels currently flagged as bad.
    pub bads: BTreeSet<String>,
}

impl Raw {
    /// Create a view of a recording with no bad channels flagged.
    #[must_use]
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            bads: BTreeSet::new(),
        }
    }

    /// File basename identifying this recording in the log.
    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Flag a channel as bad.
    pub fn mark_bad(&mut self, channel: impl Into<String>) {
        self.bads.insert(channel.into());
    }
}

/// An epoch collection cut from a continuous recording.
///
/// `selection` holds the *original-space* indices of the epochs still
/// retained, in order; `events` holds the event sample-time of each retained
/// epoch (same length and order as `selection`); `drop_log` has one slot per
/// original epoch and is empty for retained ones.
#[derive(Debug, Clone, PartialEq)]
pub struct Epochs {
    file_name: String,
    /// Channels currently flagged as bad.
    pub bads: BTreeSet<String>,
    tmin: f64,
    tmax: f64,
    selection: Vec<usize>,
    events: Vec<i64>,
    drop_log: Vec<Vec<DropReason>>,
}

impl Epochs {
    /// Create a freshly cut epoch collection with every epoch retained.
    ///
    /// `events` carries one event sample-time per epoch; `tmin`/`tmax` are
    /// the cut boundaries relative to each event.
    #[must_use]
    pub fn new(file_name: impl Into<String>, tmin: f64, tmax: f64, events: Vec<i64>) -> Self {
        let n = events.len();
        Self {
            file_name: file_name.into(),
            bads: BTreeSet::new(),
            tmin,
            tmax,
            selection: (0..n).collect(),
            events,
            drop_log: vec![Vec::new(); n],
        }
    }

    /// File basename identifying this epoch collection in the log.
    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Cut start offset relative to the event, in seconds.
    #[must_use]
    pub const fn tmin(&self) -> f64 {
        self.tmin
    }

    /// Cut end offset relative to the event, in seconds.
    #[must_use]
    pub const fn tmax(&self) -> f64 {
        self.tmax
    }

    /// Original-space indices of the retained epochs, in order.
    #[must_use]
    pub fn selection(&self) -> &[usize] {
        &self.selection
    }

    /// Event sample-time of each retained epoch, aligned with `selection`.
    #[must_use]
    pub fn events(&self) -> &[i64] {
        &self.events
    }

    /// One drop-reason list per original epoch; empty means retained.
    #[must_use]
    pub fn drop_log(&self) -> &[Vec<DropReason>] {
        &self.drop_log
    }

    /// Number of epochs still retained.
    #[must_use]
    pub fn len(&self) -> usize {
        self.selection.len()
    }

    /// True when every epoch has been dropped.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.selection.is_empty()
    }

    /// Drop epochs by their *position* in the current retained sequence,
    /// tagging each with `reason`. Positions beyond the retained count are
    /// ignored.
    pub fn drop_epochs(&mut self, positions: &[usize], reason: &DropReason) {
        let to_drop: BTreeSet<usize> = positions
            .iter()
            .copied()
            .filter(|&p| p < self.selection.len())
            .collect();
        if to_drop.is_empty() {
            return;
        }

        let mut selection = Vec::with_capacity(self.selection.len() - to_drop.len());
        let mut events = Vec::with_capacity(selection.capacity());
        for (pos, (&orig, &evt)) in self.selection.iter().zip(&self.events).enumerate() {
            if to_drop.contains(&pos) {
                self.drop_log[orig].push(reason.clone());
            } else {
                selection.push(orig);
                events.push(evt);
            }
        }
        self.selection = selection;
        self.events = events;
    }

    /// Original-space indices of epochs dropped by a human decision.
    #[must_use]
    pub fn manually_dropped(&self) -> Vec<usize> {
        self.drop_log
            .iter()
            .enumerate()
            .filter(|(_, reasons)| reasons.iter().any(DropReason::is_manual))
            .map(|(idx, _)| idx)
            .collect()
    }
}

/// An ICA decomposition plus the fit metadata the guard fingerprints.
#[derive(Debug, Clone, PartialEq)]
pub struct Ica {
    file_name: String,
    ch_names: Vec<String>,
    fit_params: serde_json::Map<String, serde_json::Value>,
    n_components: f64,
    highpass: f64,
    lowpass: f64,
    sfreq: f64,
    /// Component indices currently marked for exclusion.
    pub exclude: Vec<usize>,
}

impl Ica {
    /// Create a builder for a decomposition view.
    #[must_use]
    pub fn builder(file_name: impl Into<String>) -> IcaBuilder {
        IcaBuilder::new(file_name)
    }

    /// File basename identifying this decomposition in the log.
    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Names of the channels the decomposition was fit on.
    #[must_use]
    pub fn ch_names(&self) -> &[String] {
        &self.ch_names
    }

    /// Parameters passed to the fit algorithm.
    #[must_use]
    pub const fn fit_params(&self) -> &serde_json::Map<String, serde_json::Value> {
        &self.fit_params
    }

    /// Requested component count (an integer count or a variance fraction).
    #[must_use]
    pub const fn n_components(&self) -> f64 {
        self.n_components
    }

    /// High-pass edge of the data the decomposition was fit on, in Hz.
    #[must_use]
    pub const fn highpass(&self) -> f64 {
        self.highpass
    }

    /// Low-pass edge of the data the decomposition was fit on, in Hz.
    #[must_use]
    pub const fn lowpass(&self) -> f64 {
        self.lowpass
    }

    /// Sampling rate of the data the decomposition was fit on, in Hz.
    #[must_use]
    pub const fn sfreq(&self) -> f64 {
        self.sfreq
    }
}

/// Builder for [`Ica`].
#[derive(Debug)]
pub struct IcaBuilder {
    file_name: String,
    ch_names: Vec<String>,
    fit_params: serde_json::Map<String, serde_json::Value>,
    n_components: f64,
    highpass: f64,
    lowpass: f64,
    sfreq: f64,
}

impl IcaBuilder {
    /// Create a new builder.
    #[must_use]
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            ch_names: Vec::new(),
            fit_params: serde_json::Map::new(),
            n_components: 0.0,
            highpass: 0.0,
            lowpass: 0.0,
            sfreq: 0.0,
        }
    }

    /// Set the channel names the decomposition was fit on.
    #[must_use]
    pub fn ch_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ch_names = names.into_iter().map(Into::into).collect();
        self
    }

    /// Set the fit-algorithm parameter set.
    #[must_use]
    pub fn fit_params(mut self, params: serde_json::Map<String, serde_json::Value>) -> Self {
        self.fit_params = params;
        self
    }

    /// Set the requested component count.
    #[must_use]
    pub const fn n_components(mut self, n: f64) -> Self {
        self.n_components = n;
        self
    }

    /// Set the high-pass/low-pass/sample-rate triple of the fitted data.
    #[must_use]
    pub const fn band(mut self, highpass: f64, lowpass: f64, sfreq: f64) -> Self {
        self.highpass = highpass;
        self.lowpass = lowpass;
        self.sfreq = sfreq;
        self
    }

    /// Build the [`Ica`] with an empty exclusion list.
    #[must_use]
    pub fn build(self) -> Ica {
        Ica {
            file_name: self.file_name,
            ch_names: self.ch_names,
            fit_params: self.fit_params,
            n_components: self.n_components,
            highpass: self.highpass,
            lowpass: self.lowpass,
            sfreq: self.sfreq,
            exclude: Vec::new(),
        }
    }
}

/// Closed set of artifact kinds the log knows about.
///
/// One variant per sub-log in the sidecar document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    /// Continuous recording.
    Raw,
    /// Epoch collection.
    Epochs,
    /// ICA decomposition.
    Ica,
}

impl ArtifactKind {
    /// Sidecar sub-log key for this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Raw => "raws",
            Self::Epochs => "epochs",
            Self::Ica => "icas",
        }
    }
}

/// An artifact of any kind, the store's single dispatch point.
#[derive(Debug, Clone, PartialEq)]
pub enum Artifact {
    /// Continuous recording.
    Raw(Raw),
    /// Epoch collection.
    Epochs(Epochs),
    /// ICA decomposition.
    Ica(Ica),
}

impl Artifact {
    /// Which sub-log this artifact is annotated in.
    #[must_use]
    pub const fn kind(&self) -> ArtifactKind {
        match self {
            Self::Raw(_) => ArtifactKind::Raw,
            Self::Epochs(_) => ArtifactKind::Epochs,
            Self::Ica(_) => ArtifactKind::Ica,
        }
    }

    /// File basename keying this artifact within its sub-log.
    #[must_use]
    pub fn file_name(&self) -> &str {
        match self {
            Self::Raw(raw) => raw.file_name(),
            Self::Epochs(epochs) => epochs.file_name(),
            Self::Ica(ica) => ica.file_name(),
        }
    }
}

impl From<Raw> for Artifact {
    fn from(raw: Raw) -> Self {
        Self::Raw(raw)
    }
}

impl From<Epochs> for Artifact {
    fn from(epochs: Epochs) -> Self {
        Self::Epochs(epochs)
    }
}

impl From<Ica> for Artifact {
    fn from(ica: Ica) -> Self {
        Self::Ica(ica)
    }
}
