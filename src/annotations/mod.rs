//! The annotation log: sidecar document, store operations, consistency guard.
//!
//! One JSON sidecar (`eeg_cleaner.json`) per data directory holds three
//! independent sub-logs plus a provenance stamp:
//!
//! ```text
//! CleaningLog
//!   ├── raws:   file name -> RawEntry    { bads }
//!   ├── epochs: file name -> EpochsEntry { bads, selection, params }
//!   ├── icas:   file name -> IcaEntry    { exclude, params }
//!   └── config: { version }
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use eeg_cleaner::annotations::AnnotationStore;
//! use eeg_cleaner::artifact::{Artifact, Epochs};
//!
//! let store = AnnotationStore::new("/data/study/sub-01/eeg");
//!
//! let epochs = Epochs::new("sub-01_eeg_epo.fif", -0.5, 2.0, vec![100, 200, 300]);
//! let mut artifact = Artifact::Epochs(epochs);
//!
//! // Restore prior decisions, refusing stale ones.
//! store.apply(&mut artifact, true)?;
//!
//! // ... inspection happens ...
//!
//! store.record(&artifact)?;
//! # Ok::<(), eeg_cleaner::Error>(())
//! ```

mod document;
mod guard;
mod store;

pub use document::{CleaningLog, EpochsEntry, EpochsParams, IcaEntry, IcaParams, LogConfig, RawEntry};
pub use store::{AnnotationStore, SIDECAR_NAME};
