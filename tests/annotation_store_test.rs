//! Annotation store behavior against a real directory: creation, healing,
//! merge semantics and the documented side effects of `open`.

use std::fs;

use eeg_cleaner::annotations::{AnnotationStore, CleaningLog, SIDECAR_NAME};
use eeg_cleaner::artifact::{Artifact, DropReason, Epochs, Ica, Raw};
use eeg_cleaner::{Error, TOOL_VERSION};
use tempfile::TempDir;

fn sample_ica(name: &str) -> Ica {
    Ica::builder(name)
        .ch_names(["Fp1", "Fp2", "Cz"])
        .n_components(0.99)
        .band(1.0, 40.0, 250.0)
        .build()
}

// =============================================================================
// open / save
// =============================================================================

#[test]
fn test_open_missing_sidecar_writes_empty_document() {
    let dir = TempDir::new().unwrap();
    let store = AnnotationStore::new(dir.path());

    let log = store.open().unwrap();
    assert!(log.raws.is_empty());
    assert!(log.epochs.is_empty());
    assert!(log.icas.is_empty());
    assert_eq!(
        log.config.as_ref().map(|c| c.version.as_str()),
        Some(TOOL_VERSION)
    );

    let on_disk: serde_json::Value =
        serde_json::from_slice(&fs::read(dir.path().join(SIDECAR_NAME)).unwrap()).unwrap();
    assert_eq!(
        on_disk,
        serde_json::json!({
            "raws": {},
            "epochs": {},
            "icas": {},
            "config": {"version": TOOL_VERSION},
        })
    );
}

#[test]
fn test_save_open_round_trip_is_byte_stable() {
    let dir = TempDir::new().unwrap();
    let store = AnnotationStore::new(dir.path());

    let mut raw = Raw::new("sub-01_eeg.fif");
    raw.mark_bad("Fp1");
    raw.mark_bad("Cz");
    store.record(&Artifact::Raw(raw)).unwrap();

    let mut epochs = Epochs::new("sub-01_eeg_epo.fif", -0.5, 2.0, vec![100, 200, 300]);
    epochs.drop_epochs(&[1], &DropReason::Inspection);
    store.record(&Artifact::Epochs(epochs)).unwrap();

    let first = fs::read(dir.path().join(SIDECAR_NAME)).unwrap();
    store.open().unwrap();
    let second = fs::read(dir.path().join(SIDECAR_NAME)).unwrap();
    store.open().unwrap();
    let third = fs::read(dir.path().join(SIDECAR_NAME)).unwrap();
    assert_eq!(first, second);
    assert_eq!(second, third);
}

#[test]
fn test_foreign_provenance_stamp_is_non_fatal() {
    let dir = TempDir::new().unwrap();
    let store = AnnotationStore::new(dir.path());
    fs::write(
        dir.path().join(SIDECAR_NAME),
        serde_json::json!({
            "raws": {"old.fif": {"bads": ["Fp1"]}},
            "config": {"version": "0.0.1-prehistoric"},
        })
        .to_string(),
    )
    .unwrap();

    let log = store.open().unwrap();
    // Data is still usable and the stamp is not rewritten.
    assert_eq!(log.raws["old.fif"].bads, vec!["Fp1"]);
    assert_eq!(
        log.config.as_ref().map(|c| c.version.as_str()),
        Some("0.0.1-prehistoric")
    );
}

#[test]
fn test_malformed_sidecar_propagates() {
    let dir = TempDir::new().unwrap();
    let store = AnnotationStore::new(dir.path());
    fs::write(dir.path().join(SIDECAR_NAME), b"{not json").unwrap();
    assert!(matches!(store.open().unwrap_err(), Error::Json(_)));
}

// =============================================================================
// Merge semantics
// =============================================================================

#[test]
fn test_bad_channel_union_is_monotone() {
    let dir = TempDir::new().unwrap();
    let store = AnnotationStore::new(dir.path());

    let passes: [&[&str]; 3] = [&["Fp1", "Cz"], &["Oz"], &["Cz"]];
    let mut seen = 0;
    for pass in passes {
        let mut raw = Raw::new("sub-01_eeg.fif");
        for ch in pass {
            raw.mark_bad(*ch);
        }
        store.record(&Artifact::Raw(raw)).unwrap();

        let log = store.open().unwrap();
        let stored = &log.raws["sub-01_eeg.fif"].bads;
        assert!(stored.len() >= seen, "bads shrank: {stored:?}");
        seen = stored.len();
    }

    let log = store.open().unwrap();
    assert_eq!(log.raws["sub-01_eeg.fif"].bads, vec!["Cz", "Fp1", "Oz"]);
}

#[test]
fn test_ica_exclude_is_last_write_wins() {
    let dir = TempDir::new().unwrap();
    let store = AnnotationStore::new(dir.path());

    let mut ica = sample_ica("sub-01-epo-ica.fif");
    ica.exclude = vec![2, 5];
    store.record(&Artifact::Ica(ica)).unwrap();

    let mut ica = sample_ica("sub-01-epo-ica.fif");
    ica.exclude = vec![5];
    store.record(&Artifact::Ica(ica)).unwrap();

    // Overwrite, not union: contrast with channel merging above.
    let log = store.open().unwrap();
    assert_eq!(log.icas["sub-01-epo-ica.fif"].exclude, vec![5]);
}

#[test]
fn test_apply_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let store = AnnotationStore::new(dir.path());

    let mut epochs = Epochs::new("e_epo.fif", -0.5, 2.0, vec![100, 200, 300, 400]);
    epochs.bads.insert("Fp1".to_string());
    epochs.drop_epochs(&[2], &DropReason::User);
    store.record(&Artifact::Epochs(epochs)).unwrap();

    let mut artifact = Artifact::Epochs(Epochs::new("e_epo.fif", -0.5, 2.0, vec![100, 200, 300, 400]));
    store.apply(&mut artifact, true).unwrap();
    let once = artifact.clone();
    store.apply(&mut artifact, true).unwrap();
    assert_eq!(artifact, once);
}

#[test]
fn test_entries_are_independent_per_file_and_kind() {
    let dir = TempDir::new().unwrap();
    let store = AnnotationStore::new(dir.path());

    let mut raw = Raw::new("sub-01_eeg.fif");
    raw.mark_bad("Fp1");
    store.record(&Artifact::Raw(raw)).unwrap();

    let mut other = Raw::new("sub-02_eeg.fif");
    other.mark_bad("Oz");
    store.record(&Artifact::Raw(other)).unwrap();

    store
        .record(&Artifact::Epochs(Epochs::new(
            "sub-01_eeg_epo.fif",
            -0.5,
            2.0,
            vec![10, 20],
        )))
        .unwrap();

    let log = store.open().unwrap();
    assert_eq!(log.raws.len(), 2);
    assert_eq!(log.epochs.len(), 1);
    assert_eq!(log.raws["sub-01_eeg.fif"].bads, vec!["Fp1"]);
    assert_eq!(log.raws["sub-02_eeg.fif"].bads, vec!["Oz"]);
}

#[test]
fn test_is_annotated_tracks_entries() {
    use eeg_cleaner::artifact::ArtifactKind;

    let dir = TempDir::new().unwrap();
    let store = AnnotationStore::new(dir.path());
    assert!(!store
        .is_annotated(ArtifactKind::Epochs, "e_epo.fif")
        .unwrap());

    store
        .record(&Artifact::Epochs(Epochs::new("e_epo.fif", -0.5, 2.0, vec![10])))
        .unwrap();
    assert!(store
        .is_annotated(ArtifactKind::Epochs, "e_epo.fif")
        .unwrap());
    // Same key, different sub-log.
    assert!(!store.is_annotated(ArtifactKind::Raw, "e_epo.fif").unwrap());
}

#[test]
fn test_document_survives_partial_pipeline_runs() {
    // Simulates raw -> epochs -> ICA stages hitting the same directory on
    // separate runs, none of which may clobber the earlier stages' entries.
    let dir = TempDir::new().unwrap();

    {
        let store = AnnotationStore::new(dir.path());
        let mut raw = Raw::new("sub-01_eeg.fif");
        raw.mark_bad("Fp1");
        store.record(&Artifact::Raw(raw)).unwrap();
    }
    {
        let store = AnnotationStore::new(dir.path());
        let mut epochs = Epochs::new("sub-01_eeg_epo.fif", -0.5, 2.0, vec![100, 200]);
        epochs.drop_epochs(&[0], &DropReason::Inspection);
        store.record(&Artifact::Epochs(epochs)).unwrap();
    }
    {
        let store = AnnotationStore::new(dir.path());
        let mut ica = sample_ica("sub-01-epo-ica.fif");
        ica.exclude = vec![3];
        store.record(&Artifact::Ica(ica)).unwrap();
    }

    let log: CleaningLog =
        serde_json::from_slice(&fs::read(dir.path().join(SIDECAR_NAME)).unwrap()).unwrap();
    assert_eq!(log.raws["sub-01_eeg.fif"].bads, vec!["Fp1"]);
    assert_eq!(log.epochs["sub-01_eeg_epo.fif"].selection, Some(vec![1]));
    assert_eq!(log.icas["sub-01-epo-ica.fif"].exclude, vec![3]);
}
