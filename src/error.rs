//! Error types for eeg-cleaner
//!
//! Guard failures carry the offending field and both values so the operator
//! can see exactly which re-processing step invalidated the annotations.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// eeg-cleaner error types
#[derive(Error, Debug)]
pub enum Error {
    /// A required annotation sidecar does not exist.
    #[error("missing annotation log {}: was this recording cleaned?", .0.display())]
    MissingAnnotation(PathBuf),

    /// The data being annotated no longer matches the stored fingerprint.
    ///
    /// Never auto-resolved: guessing which side is right would corrupt the
    /// scientific record.
    #[error("{field} does not match: stored {stored}, now {current}")]
    ParameterMismatch {
        /// Name of the first fingerprint field that diverged.
        field: &'static str,
        /// Value recorded when the annotations were first saved.
        stored: String,
        /// Value presented by the freshly loaded data.
        current: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed sidecar or reject-list document
    #[error("malformed annotation document: {0}")]
    Json(#[from] serde_json::Error),
}
