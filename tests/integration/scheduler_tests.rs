use proview::actions::transfer::OperationKind;
use proview::search::SearchConfig;
use proview::tasks::{Scheduler, TaskEvent, TaskHandle, TaskKind, TaskState};
use std::fs;
use std::time::Duration;
use tempfile::TempDir;

const WAIT: Duration = Duration::from_secs(10);

fn drain(scheduler: &Scheduler, handle: &TaskHandle) -> Vec<TaskEvent> {
    let mut events = Vec::new();
    while let Some(event) = scheduler.next_event(handle, WAIT) {
        let done = event.is_finished();
        events.push(event);
        if done {
            break;
        }
    }
    events
}

fn progress_values(events: &[TaskEvent]) -> Vec<u8> {
    events
        .iter()
        .filter_map(|e| match e {
            TaskEvent::Progress(p) => Some(*p),
            _ => None,
        })
        .collect()
}

#[test]
fn test_duplicate_scan_result_then_finished() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("a.bin"), b"same bytes").unwrap();
    fs::write(dir.path().join("b.bin"), b"same bytes").unwrap();
    fs::write(dir.path().join("c.bin"), b"different!").unwrap();

    let scheduler = Scheduler::new(2).unwrap();
    let handle = scheduler.start_duplicate_scan(vec![dir.path().to_path_buf()], 0);
    assert_eq!(handle.kind(), TaskKind::DuplicateScan);

    let events = drain(&scheduler, &handle);
    let n = events.len();
    assert!(n >= 2);
    assert!(events[n - 1].is_finished());

    let TaskEvent::DuplicateResult(report) = &events[n - 2] else {
        panic!("expected a duplicate result before Finished, got {:?}", events[n - 2]);
    };
    assert_eq!(report.groups.len(), 1);
    assert_eq!(report.groups[0].files.len(), 2);
    assert_eq!(report.total_wasted, 10);

    assert_eq!(progress_values(&events).last(), Some(&100));
    assert!(events
        .iter()
        .any(|e| matches!(e, TaskEvent::Status(s) if s.starts_with("Scanning"))));
    assert_eq!(scheduler.state(TaskKind::DuplicateScan), TaskState::Completed);
}

#[test]
fn test_cancelled_scan_emits_no_result() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("a"), b"x").unwrap();

    let scheduler = Scheduler::new(1).unwrap();
    let handle = scheduler.start_duplicate_scan(vec![dir.path().to_path_buf()], 0);
    handle.cancel();

    let events = drain(&scheduler, &handle);
    assert!(events.last().is_some_and(TaskEvent::is_finished));
    // the worker may have finished before the cancel landed
    let got_result = events
        .iter()
        .any(|e| matches!(e, TaskEvent::DuplicateResult(_)));
    let state = scheduler.state(TaskKind::DuplicateScan);
    if got_result {
        assert!(state.is_terminal());
    } else {
        assert_eq!(state, TaskState::Cancelled);
    }
}

#[test]
fn test_file_operation_through_scheduler() {
    let src = TempDir::new().unwrap();
    let dest = TempDir::new().unwrap();
    let sources: Vec<_> = (0..4)
        .map(|i| {
            let p = src.path().join(format!("{i}.txt"));
            fs::write(&p, b"data").unwrap();
            p
        })
        .collect();

    let scheduler = Scheduler::new(1).unwrap();
    let handle =
        scheduler.start_file_operation(sources, dest.path().to_path_buf(), OperationKind::Move);
    let events = drain(&scheduler, &handle);

    assert_eq!(progress_values(&events), vec![25, 50, 75, 100]);
    let result = events
        .iter()
        .find_map(|e| match e {
            TaskEvent::FileOperationResult(r) => Some(r),
            _ => None,
        })
        .unwrap();
    assert_eq!(result.success_count, 4);
    assert_eq!(fs::read_dir(src.path()).unwrap().count(), 0);
    assert_eq!(fs::read_dir(dest.path()).unwrap().count(), 4);
    assert_eq!(scheduler.state(TaskKind::FileOp), TaskState::Completed);
}

#[test]
fn test_search_limits_from_config() {
    let dir = TempDir::new().unwrap();
    for i in 0..6 {
        fs::write(dir.path().join(format!("hit{i}.log")), b"").unwrap();
    }

    let config = SearchConfig {
        max_matches: 3,
        ..SearchConfig::default()
    };
    let scheduler = Scheduler::new(1).unwrap().with_search_config(config);
    let handle = scheduler.start_search(dir.path().to_path_buf(), "hit");

    let outcome = drain(&scheduler, &handle)
        .into_iter()
        .find_map(|e| match e {
            TaskEvent::SearchMatches(o) => Some(o),
            _ => None,
        })
        .unwrap();
    assert_eq!(outcome.matches.len(), 3);
    assert!(outcome.limit_reached);
}

#[test]
fn test_late_events_of_superseded_search_are_not_current() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("needle"), b"").unwrap();

    let scheduler = Scheduler::new(2).unwrap();
    let old = scheduler.start_search(dir.path().to_path_buf(), "needle");
    let new = scheduler.start_search(dir.path().to_path_buf(), "needle");

    let mut saw_new_finished = false;
    while let Ok(message) = scheduler.events().recv_timeout(WAIT) {
        if old.owns(&message) {
            assert!(!scheduler.is_current(&message));
        } else {
            assert!(new.owns(&message));
            assert!(scheduler.is_current(&message));
            if message.event.is_finished() {
                saw_new_finished = true;
                break;
            }
        }
    }
    assert!(saw_new_finished);
    assert_eq!(scheduler.state(TaskKind::Search), TaskState::Completed);
}

#[test]
fn test_workers_count() {
    let scheduler = Scheduler::new(3).unwrap();
    assert_eq!(scheduler.workers(), 3);
}

#[test]
fn test_concurrent_kinds_keep_their_events() {
    let src = TempDir::new().unwrap();
    let dest = TempDir::new().unwrap();
    let sources: Vec<_> = (0..3)
        .map(|i| {
            let p = src.path().join(format!("doc{i}.txt"));
            fs::write(&p, b"contents").unwrap();
            p
        })
        .collect();

    let scheduler = Scheduler::new(2).unwrap();
    let op =
        scheduler.start_file_operation(sources, dest.path().to_path_buf(), OperationKind::Copy);
    let search = scheduler.start_search(src.path().to_path_buf(), "doc");

    let search_events = drain(&scheduler, &search);
    assert!(search_events.last().is_some_and(TaskEvent::is_finished));

    let op_events = drain(&scheduler, &op);
    assert_eq!(progress_values(&op_events).last(), Some(&100));
    assert!(op_events.last().is_some_and(TaskEvent::is_finished));
    let result = op_events
        .iter()
        .find_map(|e| match e {
            TaskEvent::FileOperationResult(r) => Some(r),
            _ => None,
        })
        .unwrap();
    assert_eq!(result.success_count, 3);
}
