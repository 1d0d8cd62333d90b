use proview::cancel::CancellationToken;
use proview::progress::{NoopProgress, ProgressCallback};
use proview::search::{SearchConfig, SearchEngine};
use std::fs;
use std::sync::Mutex;
use tempfile::tempdir;

#[derive(Default)]
struct Percents(Mutex<Vec<u8>>);

impl ProgressCallback for Percents {
    fn on_progress(&self, percent: u8) {
        self.0.lock().unwrap().push(percent);
    }
}

fn engine() -> SearchEngine {
    SearchEngine::new(SearchConfig::default())
}

#[test]
fn test_exact_name_listed_once() {
    let dir = tempdir().unwrap();
    fs::create_dir_all(dir.path().join("a/b")).unwrap();
    fs::write(dir.path().join("a/b/budget.xlsx"), b"").unwrap();
    fs::write(dir.path().join("a/notes.txt"), b"").unwrap();

    let outcome = engine().search(
        dir.path(),
        "budget.xlsx",
        &CancellationToken::new(),
        &NoopProgress,
    );

    assert_eq!(outcome.matches, vec![dir.path().join("a/b/budget.xlsx")]);
    assert!(!outcome.limit_reached);
    assert!(!outcome.cancelled);
}

#[test]
fn test_case_insensitive_files_and_dirs() {
    let dir = tempdir().unwrap();
    fs::create_dir(dir.path().join("Photos")).unwrap();
    fs::write(dir.path().join("Photos/photo1.JPG"), b"").unwrap();
    fs::write(dir.path().join("other.txt"), b"").unwrap();

    let outcome = engine().search(dir.path(), "  PHOTO ", &CancellationToken::new(), &NoopProgress);

    // the matching directory is listed and still descended into
    assert_eq!(
        outcome.matches,
        vec![
            dir.path().join("Photos"),
            dir.path().join("Photos/photo1.JPG")
        ]
    );
}

#[test]
fn test_short_query_matches_nothing() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a"), b"").unwrap();

    let percents = Percents::default();
    let outcome = engine().search(dir.path(), " a ", &CancellationToken::new(), &percents);

    assert!(outcome.matches.is_empty());
    assert_eq!(*percents.0.lock().unwrap(), vec![100]);
}

#[test]
fn test_missing_root_is_empty() {
    let dir = tempdir().unwrap();
    let outcome = engine().search(
        &dir.path().join("missing"),
        "anything",
        &CancellationToken::new(),
        &NoopProgress,
    );
    assert!(outcome.matches.is_empty());
    assert_eq!(outcome.dirs_visited, 0);
}

#[test]
fn test_match_limit_stops_search() {
    let dir = tempdir().unwrap();
    for i in 0..20 {
        fs::write(dir.path().join(format!("log_{i:02}.txt")), b"").unwrap();
    }

    let config = SearchConfig {
        max_matches: 5,
        ..SearchConfig::default()
    };
    let outcome = SearchEngine::new(config).search(
        dir.path(),
        "log_",
        &CancellationToken::new(),
        &NoopProgress,
    );

    assert_eq!(outcome.matches.len(), 5);
    assert!(outcome.limit_reached);
    assert_eq!(outcome.matches[0], dir.path().join("log_00.txt"));
}

#[test]
fn test_directory_limit_stops_search() {
    let dir = tempdir().unwrap();
    for i in 0..10 {
        let sub = dir.path().join(format!("d{i}"));
        fs::create_dir(&sub).unwrap();
        fs::write(sub.join("needle.txt"), b"").unwrap();
    }

    let config = SearchConfig {
        max_dirs: 3,
        ..SearchConfig::default()
    };
    let outcome = SearchEngine::new(config).search(
        dir.path(),
        "needle",
        &CancellationToken::new(),
        &NoopProgress,
    );

    assert!(outcome.limit_reached);
    assert_eq!(outcome.dirs_visited, 3);
    assert!(outcome.matches.len() < 10);
}

#[test]
fn test_progress_estimate_and_completion() {
    let dir = tempdir().unwrap();
    for i in 0..12 {
        fs::create_dir(dir.path().join(format!("dir{i:02}"))).unwrap();
    }

    let percents = Percents::default();
    engine().search(dir.path(), "zz", &CancellationToken::new(), &percents);

    // 13 directories with the root: reports at 5 and 10, then completion
    assert_eq!(*percents.0.lock().unwrap(), vec![10, 20, 100]);
}

#[test]
fn test_cancelled_search_keeps_partial_matches() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("match.txt"), b"").unwrap();

    let token = CancellationToken::new();
    token.cancel();
    let percents = Percents::default();
    let outcome = engine().search(dir.path(), "match", &token, &percents);

    assert!(outcome.cancelled);
    assert!(outcome.matches.is_empty());
    assert_eq!(percents.0.lock().unwrap().last(), Some(&100));
}
