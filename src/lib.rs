//! # eeg-cleaner: persistent annotations for iterative EEG artifact cleaning
//!
//! Cleaning an EEG recording is a loop: cut the continuous data into epochs,
//! inspect them, reject bad channels and bad epochs, fit an ICA, exclude
//! artifactual components, then go around again with better parameters. Every
//! pass re-loads the data from scratch, so the human decisions made on earlier
//! passes have to be persisted somewhere and re-applied, and they have to be
//! *refused* when the data underneath them has silently changed shape.
//!
//! This crate is that somewhere: a JSON sidecar document (`eeg_cleaner.json`,
//! one per data directory) holding bad-channel, epoch-rejection and
//! component-exclusion annotations, plus a consistency guard that fingerprints
//! the annotated data and aborts a merge when the fingerprint no longer
//! matches.
//!
//! Reading and writing recordings in their native binary formats, plotting,
//! and report rendering are all external collaborators; the in-memory
//! [`artifact`] types carry exactly the state the log needs and nothing else.
//!
//! ## Example
//!
//! ```rust,no_run
//! use eeg_cleaner::artifact::{Artifact, Raw};
//! use eeg_cleaner::annotations::AnnotationStore;
//!
//! let store = AnnotationStore::new("/data/study/sub-01/eeg");
//!
//! let raw = Raw::new("sub-01_task-rest_eeg.fif");
//! // ... load channel state from the recording ...
//!
//! // Restore bad channels marked on a previous pass.
//! let mut artifact = Artifact::Raw(raw);
//! store.apply(&mut artifact, false)?;
//!
//! // ... the scientist inspects the signal and marks more channels ...
//!
//! // Merge the decisions back into the sidecar.
//! store.record(&artifact)?;
//! # Ok::<(), eeg_cleaner::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod annotations;
pub mod artifact;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod report;

pub use error::{Error, Result};

/// Version stamp written into the sidecar's `config.version` field.
///
/// A sidecar written by a different build is still read, but a warning is
/// emitted so the operator knows the annotations predate the current tool.
pub const TOOL_VERSION: &str = env!("CARGO_PKG_VERSION");
