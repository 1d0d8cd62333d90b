use filetime::{set_file_mtime, FileTime};
use proview::cancel::CancellationToken;
use proview::duplicates::{find_duplicates_in, DuplicateFinder, FinderConfig, ScanOutcome};
use proview::progress::{NoopProgress, ProgressCallback};
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use tempfile::tempdir;

#[derive(Default)]
struct Recorder {
    percents: Mutex<Vec<u8>>,
    messages: Mutex<Vec<String>>,
}

impl ProgressCallback for Recorder {
    fn on_progress(&self, percent: u8) {
        self.percents.lock().unwrap().push(percent);
    }

    fn on_message(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}

/// Cancels its token once hashing progress appears.
struct CancelOnProgress(CancellationToken);

impl ProgressCallback for CancelOnProgress {
    fn on_progress(&self, _percent: u8) {
        self.0.cancel();
    }
}

fn scan(root: &std::path::Path) -> proview::duplicates::DuplicateReport {
    find_duplicates_in(
        root,
        FinderConfig::default(),
        &CancellationToken::new(),
        &NoopProgress,
    )
    .into_report()
    .expect("scan was not cancelled")
}

#[test]
fn test_scan_empty_directory() {
    let dir = tempdir().unwrap();
    let report = scan(dir.path());

    assert!(report.is_empty());
    assert_eq!(report.total_wasted, 0);
    assert_eq!(report.summary.total_files, 0);
}

#[test]
fn test_scan_unique_files() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), b"content a").unwrap();
    fs::write(dir.path().join("b.txt"), b"content b").unwrap();
    fs::write(dir.path().join("c.txt"), b"content c").unwrap();

    let report = scan(dir.path());

    // same size, different content
    assert!(report.is_empty());
    assert_eq!(report.summary.total_files, 3);
    assert_eq!(report.summary.potential_duplicates, 3);
}

#[test]
fn test_scan_nested_duplicates() {
    let dir = tempdir().unwrap();
    let sub = dir.path().join("deep/er");
    fs::create_dir_all(&sub).unwrap();
    fs::write(dir.path().join("top.dat"), b"shared bytes").unwrap();
    fs::write(sub.join("bottom.dat"), b"shared bytes").unwrap();

    let report = scan(dir.path());

    assert_eq!(report.groups.len(), 1);
    let group = &report.groups[0];
    assert_eq!(group.count, 2);
    assert_eq!(group.size, 12);
    assert_eq!(group.wasted_bytes, 12);
    assert_eq!(report.total_wasted, 12);
}

#[test]
fn test_group_invariants_hold() {
    let dir = tempdir().unwrap();
    for i in 0..4 {
        fs::write(dir.path().join(format!("x{i}")), b"xxxxxxxx").unwrap();
    }
    for i in 0..2 {
        fs::write(dir.path().join(format!("y{i}")), b"yyyyyyyy").unwrap();
    }
    fs::write(dir.path().join("z"), b"zzzzzzzz").unwrap();

    let report = scan(dir.path());

    assert_eq!(report.groups.len(), 2);
    for group in &report.groups {
        assert_eq!(group.count, group.files.len());
        assert_eq!(group.wasted_bytes, group.size * (group.count as u64 - 1));
    }
    assert_eq!(
        report.total_wasted,
        report.groups.iter().map(|g| g.wasted_bytes).sum::<u64>()
    );
}

#[test]
fn test_original_is_oldest() {
    let dir = tempdir().unwrap();
    let names = ["a_newest", "b_oldest", "c_middle"];
    let times = [3_000_000, 1_000_000, 2_000_000];
    for (name, time) in names.iter().zip(times) {
        let path = dir.path().join(name);
        fs::write(&path, b"same").unwrap();
        set_file_mtime(&path, FileTime::from_unix_time(time, 0)).unwrap();
    }

    let report = scan(dir.path());
    let files = &report.groups[0].files;

    assert_eq!(files[0], dir.path().join("b_oldest"));
    assert_eq!(files[1], dir.path().join("c_middle"));
    assert_eq!(files[2], dir.path().join("a_newest"));
}

#[test]
fn test_min_size_filters_small_files() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("s1"), b"ab").unwrap();
    fs::write(dir.path().join("s2"), b"ab").unwrap();
    fs::write(dir.path().join("l1"), b"abcdefgh").unwrap();
    fs::write(dir.path().join("l2"), b"abcdefgh").unwrap();

    let report = find_duplicates_in(
        dir.path(),
        FinderConfig::default().with_min_size(5),
        &CancellationToken::new(),
        &NoopProgress,
    )
    .into_report()
    .unwrap();

    assert_eq!(report.groups.len(), 1);
    assert_eq!(report.groups[0].size, 8);
    assert_eq!(report.summary.total_files, 2);
}

#[test]
fn test_multiple_roots_and_nested_root() {
    let a = tempdir().unwrap();
    let b = tempdir().unwrap();
    fs::write(a.path().join("one"), b"payload").unwrap();
    fs::write(b.path().join("two"), b"payload").unwrap();
    let nested = a.path().join("inner");
    fs::create_dir(&nested).unwrap();
    fs::write(nested.join("three"), b"payload").unwrap();

    let roots = vec![
        a.path().to_path_buf(),
        b.path().to_path_buf(),
        nested,
        PathBuf::from("/definitely/not/here"),
    ];
    let report = DuplicateFinder::with_defaults()
        .find_duplicates(&roots, &CancellationToken::new(), &NoopProgress)
        .into_report()
        .unwrap();

    assert_eq!(report.summary.roots_scanned, 2);
    assert_eq!(report.groups.len(), 1);
    // the nested root is not scanned twice
    assert_eq!(report.groups[0].count, 3);
}

#[test]
fn test_status_messages_and_final_progress() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a"), b"dup").unwrap();
    fs::write(dir.path().join("b"), b"dup").unwrap();

    let recorder = Recorder::default();
    let outcome = DuplicateFinder::with_defaults().find_duplicates(
        &[dir.path().to_path_buf()],
        &CancellationToken::new(),
        &recorder,
    );

    assert!(!outcome.is_cancelled());
    let messages = recorder.messages.lock().unwrap();
    assert_eq!(messages[0], "Scanning files...");
    assert!(messages.contains(&"Found 2 files, checking for duplicates...".to_string()));
    assert!(messages.contains(&"Checking 2 potential duplicates...".to_string()));
    assert_eq!(recorder.percents.lock().unwrap().last(), Some(&100));
}

#[test]
fn test_no_candidates_reports_empty_result() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("only"), b"lonely").unwrap();

    let recorder = Recorder::default();
    let outcome = DuplicateFinder::with_defaults().find_duplicates(
        &[dir.path().to_path_buf()],
        &CancellationToken::new(),
        &recorder,
    );

    match outcome {
        ScanOutcome::Completed(report) => assert!(report.is_empty()),
        ScanOutcome::Cancelled => panic!("scan should complete"),
    }
    assert_eq!(*recorder.percents.lock().unwrap(), vec![100]);
}

#[test]
fn test_cancel_mid_hash_gives_no_result() {
    let dir = tempdir().unwrap();
    for i in 0..40 {
        fs::write(dir.path().join(format!("f{i:02}")), b"identical").unwrap();
    }

    let token = CancellationToken::new();
    let config = FinderConfig {
        progress_interval: 1,
        ..FinderConfig::default()
    };
    let outcome = DuplicateFinder::new(config).find_duplicates(
        &[dir.path().to_path_buf()],
        &token,
        &CancelOnProgress(token.clone()),
    );

    assert!(outcome.is_cancelled());
    assert!(outcome.report().is_none());
}

#[test]
fn test_cancelled_before_start() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a"), b"x").unwrap();

    let token = CancellationToken::new();
    token.cancel();
    let outcome = find_duplicates_in(dir.path(), FinderConfig::default(), &token, &NoopProgress);

    assert!(matches!(outcome, ScanOutcome::Cancelled));
}

#[cfg(unix)]
#[test]
fn test_symlinks_are_not_counted() {
    let dir = tempdir().unwrap();
    let target = dir.path().join("real");
    fs::write(&target, b"data").unwrap();
    std::os::unix::fs::symlink(&target, dir.path().join("link")).unwrap();

    let report = scan(dir.path());

    assert!(report.is_empty());
    assert_eq!(report.summary.total_files, 1);
}
