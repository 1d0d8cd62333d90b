use filetime::{set_file_mtime, FileTime};
use proview::actions::transfer::{
    conflict_free_target, execute, FileOperationRequest, FileOperationResult, OperationKind,
    TransferError,
};
use proview::cancel::CancellationToken;
use proview::progress::{NoopProgress, ProgressCallback};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::tempdir;

#[derive(Default)]
struct Percents(Mutex<Vec<u8>>);

impl ProgressCallback for Percents {
    fn on_progress(&self, percent: u8) {
        self.0.lock().unwrap().push(percent);
    }
}

fn run(sources: Vec<PathBuf>, dest: &Path, kind: OperationKind) -> FileOperationResult {
    execute(
        &FileOperationRequest::new(sources, dest.to_path_buf(), kind),
        &CancellationToken::new(),
        &NoopProgress,
    )
    .unwrap()
}

#[test]
fn test_copy_ten_items_progress() {
    let src = tempdir().unwrap();
    let dest = tempdir().unwrap();
    let sources: Vec<PathBuf> = (0..10)
        .map(|i| {
            let p = src.path().join(format!("f{i}.txt"));
            fs::write(&p, format!("file {i}")).unwrap();
            p
        })
        .collect();

    let percents = Percents::default();
    let result = execute(
        &FileOperationRequest::new(sources, dest.path().to_path_buf(), OperationKind::Copy),
        &CancellationToken::new(),
        &percents,
    )
    .unwrap();

    assert_eq!(result.success_count, 10);
    assert!(result.all_succeeded());
    assert_eq!(
        *percents.0.lock().unwrap(),
        vec![10, 20, 30, 40, 50, 60, 70, 80, 90, 100]
    );
    assert_eq!(fs::read_to_string(dest.path().join("f3.txt")).unwrap(), "file 3");
}

#[test]
fn test_vanished_source_is_reported() {
    let src = tempdir().unwrap();
    let dest = tempdir().unwrap();
    let a = src.path().join("a.txt");
    let b = src.path().join("b.txt");
    let c = src.path().join("c.txt");
    fs::write(&a, b"a").unwrap();
    fs::write(&c, b"c").unwrap();

    let result = run(vec![a, b, c], dest.path(), OperationKind::Copy);

    assert_eq!(result.success_count, 2);
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].message.contains("no longer exists"));
    assert_eq!(result.errors[0].to_string(), "b.txt: Source no longer exists");
}

#[test]
fn test_conflicting_names_get_copy_suffix() {
    let src = tempdir().unwrap();
    let dest = tempdir().unwrap();
    let a = src.path().join("a.txt");
    fs::write(&a, b"new").unwrap();
    fs::write(dest.path().join("a.txt"), b"old").unwrap();

    run(vec![a.clone()], dest.path(), OperationKind::Copy);
    run(vec![a], dest.path(), OperationKind::Copy);

    assert_eq!(fs::read_to_string(dest.path().join("a.txt")).unwrap(), "old");
    assert!(dest.path().join("a_copy_1.txt").exists());
    assert!(dest.path().join("a_copy_2.txt").exists());
    assert_eq!(
        conflict_free_target(dest.path(), "a.txt"),
        dest.path().join("a_copy_3.txt")
    );
}

#[test]
fn test_same_names_in_one_batch_get_increasing_suffixes() {
    let src = tempdir().unwrap();
    let dest = tempdir().unwrap();
    let mut sources = Vec::new();
    for dir in ["one", "two"] {
        let path = src.path().join(dir).join("a.txt");
        fs::create_dir(src.path().join(dir)).unwrap();
        fs::write(&path, dir).unwrap();
        sources.push(path);
    }
    fs::write(dest.path().join("a.txt"), b"existing").unwrap();

    let result = run(sources, dest.path(), OperationKind::Copy);

    assert_eq!(result.success_count, 2);
    assert_eq!(fs::read_to_string(dest.path().join("a.txt")).unwrap(), "existing");
    assert_eq!(fs::read_to_string(dest.path().join("a_copy_1.txt")).unwrap(), "one");
    assert_eq!(fs::read_to_string(dest.path().join("a_copy_2.txt")).unwrap(), "two");
}

#[test]
fn test_move_directory_into_own_child_fails() {
    let root = tempdir().unwrap();
    let parent = root.path().join("parent");
    let child = parent.join("child");
    fs::create_dir_all(&child).unwrap();
    fs::write(parent.join("keep.txt"), b"k").unwrap();

    let result = run(vec![parent.clone()], &child, OperationKind::Move);

    assert_eq!(result.success_count, 0);
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0]
        .message
        .contains("Cannot move to itself or subdirectory"));
    assert!(parent.join("keep.txt").exists());
    assert_eq!(fs::read_dir(&child).unwrap().count(), 0);
}

#[test]
fn test_copy_into_itself_fails() {
    let root = tempdir().unwrap();
    let dir = root.path().join("dir");
    fs::create_dir(&dir).unwrap();

    let result = run(vec![dir.clone()], &dir, OperationKind::Copy);
    assert!(result.errors[0]
        .message
        .contains("Cannot copy to itself or subdirectory"));
}

#[test]
fn test_invalid_destination_touches_nothing() {
    let src = tempdir().unwrap();
    let a = src.path().join("a.txt");
    fs::write(&a, b"a").unwrap();

    let percents = Percents::default();
    let err = execute(
        &FileOperationRequest::new(vec![a.clone()], a.clone(), OperationKind::Move),
        &CancellationToken::new(),
        &percents,
    )
    .unwrap_err();

    assert!(matches!(err, TransferError::InvalidDestination(_)));
    assert_eq!(err.to_string(), "Invalid destination directory.");
    assert!(percents.0.lock().unwrap().is_empty());
    assert!(a.exists());
}

#[test]
fn test_move_tree_preserves_content_and_mtime() {
    let src = tempdir().unwrap();
    let dest = tempdir().unwrap();
    let tree = src.path().join("tree");
    fs::create_dir_all(tree.join("sub")).unwrap();
    let leaf = tree.join("sub/leaf.txt");
    fs::write(&leaf, b"leaf").unwrap();
    set_file_mtime(&leaf, FileTime::from_unix_time(1_234_567, 0)).unwrap();

    let result = run(vec![tree.clone()], dest.path(), OperationKind::Move);

    assert!(result.all_succeeded());
    assert!(!tree.exists());
    let moved = dest.path().join("tree/sub/leaf.txt");
    assert_eq!(fs::read(&moved).unwrap(), b"leaf");
    let mtime = FileTime::from_last_modification_time(&fs::metadata(&moved).unwrap());
    assert_eq!(mtime.unix_seconds(), 1_234_567);
}

#[test]
fn test_copy_tree_preserves_file_mtime() {
    let src = tempdir().unwrap();
    let dest = tempdir().unwrap();
    let tree = src.path().join("tree");
    fs::create_dir(&tree).unwrap();
    let file = tree.join("f.txt");
    fs::write(&file, b"f").unwrap();
    set_file_mtime(&file, FileTime::from_unix_time(42_000, 0)).unwrap();

    run(vec![tree.clone()], dest.path(), OperationKind::Copy);

    let copied = dest.path().join("tree/f.txt");
    let mtime = FileTime::from_last_modification_time(&fs::metadata(&copied).unwrap());
    assert_eq!(mtime.unix_seconds(), 42_000);
    assert!(file.exists());
}

#[test]
fn test_move_into_same_parent_renames() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a.txt");
    fs::write(&a, b"a").unwrap();

    let result = run(vec![a.clone()], dir.path(), OperationKind::Move);

    assert!(result.all_succeeded());
    assert!(!a.exists());
    assert!(dir.path().join("a_copy_1.txt").exists());
}

#[test]
fn test_cancelled_batch_returns_partial_result() {
    let src = tempdir().unwrap();
    let dest = tempdir().unwrap();
    let a = src.path().join("a");
    fs::write(&a, b"a").unwrap();

    let token = CancellationToken::new();
    token.cancel();
    let result = execute(
        &FileOperationRequest::new(vec![a], dest.path().to_path_buf(), OperationKind::Copy),
        &token,
        &NoopProgress,
    )
    .unwrap();

    assert!(result.cancelled);
    assert_eq!(result.processed(), 0);
    assert_eq!(result.total, 1);
}

#[cfg(unix)]
#[test]
fn test_symlink_inside_tree_is_recreated() {
    let src = tempdir().unwrap();
    let dest = tempdir().unwrap();
    let tree = src.path().join("tree");
    fs::create_dir(&tree).unwrap();
    std::os::unix::fs::symlink("target-does-not-matter", tree.join("link")).unwrap();

    let result = run(vec![tree], dest.path(), OperationKind::Copy);

    assert!(result.all_succeeded());
    let link = dest.path().join("tree/link");
    assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
    assert_eq!(
        fs::read_link(&link).unwrap(),
        PathBuf::from("target-does-not-matter")
    );
}
