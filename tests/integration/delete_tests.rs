use filetime::{set_file_mtime, FileTime};
use proview::actions::delete::{
    delete_batch, permanent_delete, select_duplicates, validate_selection, DeleteConfig,
    DeleteError,
};
use proview::cancel::CancellationToken;
use proview::duplicates::{find_duplicates_in, FinderConfig};
use proview::progress::NoopProgress;
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

#[test]
fn test_delete_duplicates_of_real_scan_keeps_oldest() {
    let dir = tempdir().unwrap();
    let names = ["old.dat", "mid.dat", "new.dat"];
    for (i, name) in names.iter().enumerate() {
        let path = dir.path().join(name);
        fs::write(&path, b"duplicated payload").unwrap();
        set_file_mtime(&path, FileTime::from_unix_time(1_000_000 + i as i64 * 1000, 0)).unwrap();
    }
    fs::write(dir.path().join("solo.dat"), b"unique").unwrap();

    let report = find_duplicates_in(
        dir.path(),
        FinderConfig::default(),
        &CancellationToken::new(),
        &NoopProgress,
    )
    .into_report()
    .unwrap();
    assert_eq!(report.groups.len(), 1);

    let selected = select_duplicates(&report.groups);
    assert_eq!(selected.len(), 2);
    validate_selection(&selected, &report.groups).unwrap();

    let result = delete_batch(
        &selected,
        &DeleteConfig::permanent(),
        &CancellationToken::new(),
        &NoopProgress,
    );

    assert!(result.all_succeeded());
    assert_eq!(result.success_count(), 2);
    assert_eq!(result.bytes_freed, 36);
    assert_eq!(result.bytes_freed, report.total_wasted);
    assert!(dir.path().join("old.dat").exists());
    assert!(!dir.path().join("mid.dat").exists());
    assert!(!dir.path().join("new.dat").exists());
    assert!(dir.path().join("solo.dat").exists());
}

#[test]
fn test_selecting_every_member_is_rejected() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a"), b"same").unwrap();
    fs::write(dir.path().join("b"), b"same").unwrap();

    let report = find_duplicates_in(
        dir.path(),
        FinderConfig::default(),
        &CancellationToken::new(),
        &NoopProgress,
    )
    .into_report()
    .unwrap();

    let everything: Vec<PathBuf> = report.groups[0].files.clone();
    assert!(matches!(
        validate_selection(&everything, &report.groups),
        Err(DeleteError::AllCopiesWouldBeDeleted)
    ));
}

#[test]
fn test_batch_continues_past_missing_paths() {
    let dir = tempdir().unwrap();
    let present = dir.path().join("present.txt");
    fs::write(&present, b"abc").unwrap();
    let missing = dir.path().join("missing.txt");

    let result = delete_batch(
        &[missing.clone(), present.clone()],
        &DeleteConfig::permanent(),
        &CancellationToken::new(),
        &NoopProgress,
    );

    assert_eq!(result.success_count(), 1);
    assert_eq!(result.failure_count(), 1);
    assert_eq!(result.failures[0].0, missing);
    assert!(!present.exists());
    assert!(result
        .summary()
        .starts_with("Deleted 1 file(s), 1 failed, freed"));
}

#[test]
fn test_cancelled_batch_deletes_nothing() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("keep.txt");
    fs::write(&file, b"x").unwrap();

    let token = CancellationToken::new();
    token.cancel();
    let result = delete_batch(&[file.clone()], &DeleteConfig::permanent(), &token, &NoopProgress);

    assert!(result.cancelled);
    assert_eq!(result.total_count(), 0);
    assert!(file.exists());
}

#[test]
fn test_permanent_delete_directory() {
    let dir = tempdir().unwrap();
    let sub = dir.path().join("sub");
    fs::create_dir_all(sub.join("inner")).unwrap();
    fs::write(sub.join("inner/f"), b"f").unwrap();

    let deleted = permanent_delete(&sub).unwrap();
    assert!(deleted.permanent);
    assert_eq!(deleted.size, 0);
    assert!(!sub.exists());
}
