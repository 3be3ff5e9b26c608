//! Scoped per-run log sink.
//!
//! Each cleaning run appends to `eeg_cleaner.log` in the data directory so a
//! session leaves an audit trail next to the sidecar. The sink is installed
//! as the *thread-default* subscriber and detached when the returned guard
//! drops, rather than mutating process-global handler state.

use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::subscriber::DefaultGuard;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::{fmt, EnvFilter, Registry};

/// Fixed run-log file name, kept alongside the sidecar.
pub const LOG_FILE_NAME: &str = "eeg_cleaner.log";

/// Keeps the run log attached; dropping it detaches the sink.
pub struct RunLogGuard {
    path: PathBuf,
    _guard: DefaultGuard,
}

impl RunLogGuard {
    /// Full path of the log file this run appends to.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Attach a run log for the given data directory (a file path resolves to
/// its parent). Events also go to stderr; verbosity follows `RUST_LOG`,
/// defaulting to `info`.
///
/// # Errors
///
/// Fails when the log file cannot be opened for appending.
pub fn attach_run_log(path: impl AsRef<Path>) -> crate::Result<RunLogGuard> {
    let path = path.as_ref();
    let dir = if path.is_file() {
        path.parent().unwrap_or_else(|| Path::new("."))
    } else {
        path
    };
    let log_path = dir.join(LOG_FILE_NAME);
    let file = OpenOptions::new().create(true).append(true).open(&log_path)?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = Registry::default()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr))
        .with(fmt::layer().with_ansi(false).with_writer(Arc::new(file)));

    Ok(RunLogGuard {
        path: log_path,
        _guard: tracing::subscriber::set_default(subscriber),
    })
}
