//! Store operations against the sidecar document.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::artifact::{Artifact, ArtifactKind, DropReason};
use crate::error::{Error, Result};

use super::document::CleaningLog;
use super::guard;

/// Fixed sidecar file name, one per data directory.
pub const SIDECAR_NAME: &str = "eeg_cleaner.json";

/// Annotation store bound to one data directory.
///
/// Every artifact inside the directory shares the same sidecar document, so
/// the store is keyed by directory and entries are keyed by file basename.
#[derive(Debug, Clone)]
pub struct AnnotationStore {
    root: PathBuf,
}

impl AnnotationStore {
    /// Bind a store to a data directory. A path to a file inside the
    /// directory works too and resolves to its parent.
    #[must_use]
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let root = if path.is_file() {
            path.parent().unwrap_or_else(|| Path::new(".")).to_path_buf()
        } else {
            path.to_path_buf()
        };
        Self { root }
    }

    /// Directory this store is bound to.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Full path of the sidecar document.
    #[must_use]
    pub fn sidecar_path(&self) -> PathBuf {
        self.root.join(SIDECAR_NAME)
    }

    /// Read the sidecar document, materializing an empty one if absent.
    ///
    /// The normalized result is immediately written back, so a legacy or
    /// partial document is healed on disk as a side effect of opening it.
    /// A provenance stamp from a different build is warned about but the
    /// document stays usable.
    ///
    /// # Errors
    ///
    /// Fails on unreadable or malformed JSON, or when the write-back fails.
    pub fn open(&self) -> Result<CleaningLog> {
        let path = self.sidecar_path();
        let mut log = if path.exists() {
            serde_json::from_slice(&fs::read(&path)?)?
        } else {
            debug!(path = %path.display(), "no sidecar yet, starting empty");
            CleaningLog::default()
        };
        log.normalize();
        self.write(&log)?;
        Ok(log)
    }

    /// Normalize and persist the whole document (write-replace).
    ///
    /// There are no partial updates: callers merge in memory first, then the
    /// full document is written to a temporary file and renamed into place so
    /// a reader never sees a half-written sidecar.
    ///
    /// # Errors
    ///
    /// Fails when serialization or the replace write fails.
    pub fn save(&self, log: &mut CleaningLog) -> Result<()> {
        log.normalize();
        self.write(log)
    }

    fn write(&self, log: &CleaningLog) -> Result<()> {
        let path = self.sidecar_path();
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(log)?)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    /// True if the sub-log for `kind` contains `key`.
    ///
    /// Pure existence check for skip-if-already-cleaned logic: never writes,
    /// never runs the guard; an absent sidecar is simply `false`.
    ///
    /// # Errors
    ///
    /// Fails on unreadable or malformed JSON.
    pub fn is_annotated(&self, kind: ArtifactKind, key: &str) -> Result<bool> {
        let path = self.sidecar_path();
        if !path.exists() {
            return Ok(false);
        }
        let log: CleaningLog = serde_json::from_slice(&fs::read(&path)?)?;
        Ok(match kind {
            ArtifactKind::Raw => log.raws.contains_key(key),
            ArtifactKind::Epochs => log.epochs.contains_key(key),
            ArtifactKind::Ica => log.icas.contains_key(key),
        })
    }

    /// Merge previously stored annotations onto a freshly loaded artifact.
    ///
    /// Bad channels are unioned into the artifact's set. For epochs the
    /// guard runs first, then every epoch present in the stored selection's
    /// complement is re-dropped with reason [`DropReason::Inspection`],
    /// reproducing the recorded rejection onto a collection that started
    /// from the full set. For ICA the guard runs, then the exclusion list is
    /// overwritten with the stored one.
    ///
    /// An artifact with no entry gets an empty merge. Note that opening the
    /// sidecar heals it on disk even on this read path.
    ///
    /// # Errors
    ///
    /// [`Error::MissingAnnotation`] when `required` and no sidecar exists;
    /// [`Error::ParameterMismatch`] from the guard. A guard failure leaves
    /// both the store and the artifact unmodified.
    pub fn apply(&self, artifact: &mut Artifact, required: bool) -> Result<()> {
        let path = self.sidecar_path();
        if required && !path.exists() {
            return Err(Error::MissingAnnotation(path));
        }
        let log = self.open()?;

        match artifact {
            Artifact::Raw(raw) => {
                if let Some(entry) = log.raws.get(raw.file_name()) {
                    raw.bads.extend(entry.bads.iter().cloned());
                }
                info!(bads = ?raw.bads, "restored bad channels");
            }
            Artifact::Epochs(epochs) => {
                // The entry is cloned so first-contact seeding done by the
                // guard stays in memory; only `record` persists params.
                let mut entry = log
                    .epochs
                    .get(epochs.file_name())
                    .cloned()
                    .unwrap_or_default();
                guard::check_epochs(&mut entry, epochs)?;

                epochs.bads.extend(entry.bads.iter().cloned());
                info!(bads = ?epochs.bads, "restored bad channels");

                let prev: BTreeSet<usize> = match entry.selection {
                    Some(selection) => selection.into_iter().collect(),
                    None => epochs.selection().iter().copied().collect(),
                };
                let positions: Vec<usize> = epochs
                    .selection()
                    .iter()
                    .enumerate()
                    .filter(|(_, orig)| !prev.contains(orig))
                    .map(|(pos, _)| pos)
                    .collect();
                info!(n = positions.len(), "re-dropping previously rejected epochs");
                epochs.drop_epochs(&positions, &DropReason::Inspection);
            }
            Artifact::Ica(ica) => {
                let mut entry = log
                    .icas
                    .get(ica.file_name())
                    .cloned()
                    .unwrap_or_default();
                guard::check_ica(&mut entry, ica)?;
                ica.exclude = entry.exclude;
                info!(exclude = ?ica.exclude, "restored excluded components");
            }
        }
        Ok(())
    }

    /// Merge the artifact's current annotation state into the log and save.
    ///
    /// The guard validates the artifact against the stored fingerprint, or
    /// seeds the fingerprint on first contact; this is the only path that
    /// sets `params`. Channel bads are unioned, the epoch selection is
    /// snapshotted, and ICA exclusions overwrite the stored list.
    ///
    /// # Errors
    ///
    /// [`Error::ParameterMismatch`] from the guard, in which case nothing is
    /// persisted; otherwise I/O and JSON errors from the save.
    pub fn record(&self, artifact: &Artifact) -> Result<()> {
        let mut log = self.open()?;

        match artifact {
            Artifact::Raw(raw) => {
                let entry = log.raws.entry(raw.file_name().to_string()).or_default();
                entry.merge_bads(&raw.bads);
                info!(bads = ?entry.bads, "updating bad channels");
            }
            Artifact::Epochs(epochs) => {
                let entry = log.epochs.entry(epochs.file_name().to_string()).or_default();
                guard::check_epochs(entry, epochs)?;
                entry.merge_bads(&epochs.bads);
                entry.selection = Some(epochs.selection().to_vec());
                info!(bads = ?entry.bads, "updating bad channels");
                info!(dropped = ?epochs.manually_dropped(), "updating bad epochs");
            }
            Artifact::Ica(ica) => {
                let entry = log.icas.entry(ica.file_name().to_string()).or_default();
                guard::check_ica(entry, ica)?;
                entry.exclude = ica.exclude.clone();
                info!(exclude = ?entry.exclude, "updating excluded components");
            }
        }
        self.save(&mut log)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::{Epochs, Ica, Raw};
    use tempfile::TempDir;

    #[test]
    fn test_store_resolves_file_path_to_parent() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("sub-01_eeg.fif");
        fs::write(&file, b"").unwrap();
        let store = AnnotationStore::new(&file);
        assert_eq!(store.root(), dir.path());
    }

    #[test]
    fn test_open_creates_and_heals() {
        let dir = TempDir::new().unwrap();
        let store = AnnotationStore::new(dir.path());
        assert!(!store.sidecar_path().exists());

        let log = store.open().unwrap();
        assert!(log.raws.is_empty());
        assert!(store.sidecar_path().exists());

        // A partial legacy document grows its missing sub-logs on open.
        fs::write(store.sidecar_path(), b"{\"raws\": {}}").unwrap();
        let log = store.open().unwrap();
        assert!(log.config.is_some());
        let on_disk: CleaningLog =
            serde_json::from_slice(&fs::read(store.sidecar_path()).unwrap()).unwrap();
        assert!(on_disk.config.is_some());
    }

    #[test]
    fn test_apply_missing_sidecar_required() {
        let dir = TempDir::new().unwrap();
        let store = AnnotationStore::new(dir.path());
        let mut artifact = Artifact::Raw(Raw::new("sub-01_eeg.fif"));
        let err = store.apply(&mut artifact, true).unwrap_err();
        assert!(matches!(err, Error::MissingAnnotation(_)));
        // required=false is a no-op merge (but heals the sidecar).
        store.apply(&mut artifact, false).unwrap();
        assert!(store.sidecar_path().exists());
    }

    #[test]
    fn test_record_then_apply_raw_unions_bads() {
        let dir = TempDir::new().unwrap();
        let store = AnnotationStore::new(dir.path());

        let mut raw = Raw::new("sub-01_eeg.fif");
        raw.mark_bad("Fp1");
        store.record(&Artifact::Raw(raw)).unwrap();

        let mut reloaded = Raw::new("sub-01_eeg.fif");
        reloaded.mark_bad("Oz");
        let mut artifact = Artifact::Raw(reloaded);
        store.apply(&mut artifact, true).unwrap();
        let Artifact::Raw(reloaded) = artifact else {
            unreachable!()
        };
        let bads: Vec<&str> = reloaded.bads.iter().map(String::as_str).collect();
        assert_eq!(bads, vec!["Fp1", "Oz"]);
    }

    #[test]
    fn test_apply_redrops_recorded_epoch_rejections() {
        let dir = TempDir::new().unwrap();
        let store = AnnotationStore::new(dir.path());

        let mut epochs = Epochs::new("e_epo.fif", -0.5, 2.0, vec![100, 200, 300, 400, 500]);
        epochs.drop_epochs(&[1, 3], &DropReason::User);
        store.record(&Artifact::Epochs(epochs)).unwrap();

        // Fresh load starts from the full set again.
        let fresh = Epochs::new("e_epo.fif", -0.5, 2.0, vec![100, 200, 300, 400, 500]);
        let mut artifact = Artifact::Epochs(fresh);
        store.apply(&mut artifact, true).unwrap();
        let Artifact::Epochs(fresh) = artifact else {
            unreachable!()
        };
        assert_eq!(fresh.selection(), &[0, 2, 4]);
        assert_eq!(fresh.events(), &[100, 300, 500]);
        assert!(fresh.drop_log()[1].contains(&DropReason::Inspection));
    }

    #[test]
    fn test_ica_exclude_overwrites() {
        let dir = TempDir::new().unwrap();
        let store = AnnotationStore::new(dir.path());
        let make = || {
            Ica::builder("sub-01-epo-ica.fif")
                .ch_names(["Fp1", "Fp2"])
                .n_components(0.99)
                .band(1.0, 40.0, 250.0)
                .build()
        };

        let mut ica = make();
        ica.exclude = vec![2, 5];
        store.record(&Artifact::Ica(ica)).unwrap();

        let mut ica = make();
        ica.exclude = vec![5];
        store.record(&Artifact::Ica(ica)).unwrap();

        let log = store.open().unwrap();
        assert_eq!(log.icas["sub-01-epo-ica.fif"].exclude, vec![5]);
    }

    #[test]
    fn test_is_annotated_never_writes() {
        let dir = TempDir::new().unwrap();
        let store = AnnotationStore::new(dir.path());
        assert!(!store.is_annotated(ArtifactKind::Raw, "x.fif").unwrap());
        assert!(!store.sidecar_path().exists());
    }

    #[test]
    fn test_guard_failure_leaves_store_untouched() {
        let dir = TempDir::new().unwrap();
        let store = AnnotationStore::new(dir.path());

        let epochs = Epochs::new("e_epo.fif", -0.5, 2.0, vec![100, 200, 300]);
        store.record(&Artifact::Epochs(epochs)).unwrap();
        let before = fs::read(store.sidecar_path()).unwrap();

        let recut = Epochs::new("e_epo.fif", -0.4, 2.0, vec![100, 200, 300]);
        let err = store.record(&Artifact::Epochs(recut)).unwrap_err();
        assert!(matches!(err, Error::ParameterMismatch { field: "tmin", .. }));
        assert_eq!(fs::read(store.sidecar_path()).unwrap(), before);
    }
}
