//! Runs engines on a worker pool and forwards their events.
//!
//! The [`Scheduler`] owns a `rayon` thread pool and one unbounded
//! `crossbeam-channel` channel. Each `start_*` call allocates a new task id,
//! supersedes the running instance of the same kind (its token is
//! cancelled, nobody waits for it) and spawns the engine on the pool. All
//! events of all instances arrive on [`Scheduler::events`]; a listener
//! uses [`Scheduler::is_current`] to drop late events from superseded
//! instances.
//!
//! A host that follows one task at a time uses [`Scheduler::next_event`]
//! instead. Events of other live instances read on the way are parked
//! until their own handle asks for them.

use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use thiserror::Error;

use crate::actions::transfer::{self, FileOperationRequest, OperationKind};
use crate::cancel::CancellationToken;
use crate::duplicates::{DuplicateFinder, FinderConfig, ScanOutcome};
use crate::progress::ProgressCallback;
use crate::search::{SearchConfig, SearchEngine};

use super::events::{TaskEvent, TaskId, TaskKind, TaskMessage, TaskState};

/// Errors raised while setting up the scheduler.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The worker pool could not be created.
    #[error("failed to build worker pool: {0}")]
    PoolBuild(#[from] rayon::ThreadPoolBuildError),
}

/// Handle to one started task instance.
#[derive(Debug, Clone)]
pub struct TaskHandle {
    id: TaskId,
    kind: TaskKind,
    token: CancellationToken,
}

impl TaskHandle {
    /// Instance id carried by every event of this instance.
    #[must_use]
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Kind of the instance.
    #[must_use]
    pub fn kind(&self) -> TaskKind {
        self.kind
    }

    /// The instance's cancellation token.
    #[must_use]
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Request cancellation. Idempotent and non-blocking.
    pub fn cancel(&self) {
        if self.token.cancel() {
            log::debug!("Cancellation requested for {} #{}", self.kind, self.id);
        }
    }

    /// Whether `message` was produced by this instance.
    #[must_use]
    pub fn owns(&self, message: &TaskMessage) -> bool {
        message.id == self.id && message.kind == self.kind
    }
}

#[derive(Debug)]
struct Slot {
    id: TaskId,
    token: CancellationToken,
    state: TaskState,
}

type Slots = Arc<Mutex<HashMap<TaskKind, Slot>>>;

fn lock(slots: &Slots) -> MutexGuard<'_, HashMap<TaskKind, Slot>> {
    slots.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Progress sink that turns engine callbacks into channel messages.
struct ChannelProgress {
    id: TaskId,
    kind: TaskKind,
    sender: Sender<TaskMessage>,
}

impl ChannelProgress {
    fn send(&self, event: TaskEvent) {
        // The receiver lives as long as the scheduler; a send can only fail
        // while it is being torn down.
        let _ = self.sender.send(TaskMessage {
            id: self.id,
            kind: self.kind,
            event,
        });
    }
}

impl ProgressCallback for ChannelProgress {
    fn on_progress(&self, percent: u8) {
        self.send(TaskEvent::Progress(percent));
    }

    fn on_message(&self, message: &str) {
        self.send(TaskEvent::Status(message.to_string()));
    }
}

/// Marks the instance finished when the engine returns or unwinds.
struct FinishGuard {
    channel: ChannelProgress,
    token: CancellationToken,
    slots: Slots,
}

impl Drop for FinishGuard {
    fn drop(&mut self) {
        let state = if self.token.is_cancelled() {
            TaskState::Cancelled
        } else {
            TaskState::Completed
        };

        {
            let mut slots = lock(&self.slots);
            if let Some(slot) = slots.get_mut(&self.channel.kind) {
                if slot.id == self.channel.id {
                    slot.state = state;
                }
            }
        }

        log::debug!(
            "{} #{} finished ({:?})",
            self.channel.kind,
            self.channel.id,
            state
        );
        self.channel.send(TaskEvent::Finished);
    }
}

/// Owner of the worker pool and the event channel.
pub struct Scheduler {
    pool: rayon::ThreadPool,
    sender: Sender<TaskMessage>,
    receiver: Receiver<TaskMessage>,
    slots: Slots,
    parked: Mutex<HashMap<TaskId, VecDeque<TaskEvent>>>,
    next_id: AtomicU64,
    search_config: SearchConfig,
    finder_config: FinderConfig,
}

impl Scheduler {
    /// Create a scheduler with `workers` threads (0 picks rayon's default).
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::PoolBuild`] if the pool cannot be created.
    pub fn new(workers: usize) -> Result<Self, SchedulerError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("proview-worker-{i}"))
            .panic_handler(|_| log::error!("A background task panicked"))
            .build()?;
        let (sender, receiver) = unbounded();

        log::debug!("Scheduler started with {} worker(s)", pool.current_num_threads());

        Ok(Self {
            pool,
            sender,
            receiver,
            slots: Arc::new(Mutex::new(HashMap::new())),
            parked: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            search_config: SearchConfig::default(),
            finder_config: FinderConfig::default(),
        })
    }

    /// Use these search limits for subsequent searches.
    #[must_use]
    pub fn with_search_config(mut self, config: SearchConfig) -> Self {
        self.search_config = config;
        self
    }

    /// Use these finder settings for subsequent duplicate scans.
    ///
    /// `min_size` is still taken from each `start_duplicate_scan` call.
    #[must_use]
    pub fn with_finder_config(mut self, config: FinderConfig) -> Self {
        self.finder_config = config;
        self
    }

    /// Number of worker threads.
    #[must_use]
    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Receiver for the events of every task.
    #[must_use]
    pub fn events(&self) -> &Receiver<TaskMessage> {
        &self.receiver
    }

    /// Start a file-name search.
    ///
    /// Emits `Progress`, one `SearchMatches`, then `Finished`.
    pub fn start_search(&self, root: PathBuf, query: impl Into<String>) -> TaskHandle {
        let query = query.into();
        let engine = SearchEngine::new(self.search_config.clone());

        self.spawn(TaskKind::Search, move |token, channel| {
            let outcome = engine.search(&root, &query, token, channel);
            channel.send(TaskEvent::SearchMatches(outcome));
        })
    }

    /// Start a duplicate scan over `roots`.
    ///
    /// Emits `Progress` and `Status`, a `DuplicateResult` unless the scan was
    /// cancelled, then `Finished`.
    pub fn start_duplicate_scan(&self, roots: Vec<PathBuf>, min_size: u64) -> TaskHandle {
        let finder = DuplicateFinder::new(self.finder_config.clone().with_min_size(min_size));

        self.spawn(TaskKind::DuplicateScan, move |token, channel| {
            match finder.find_duplicates(&roots, token, channel) {
                ScanOutcome::Completed(report) => {
                    channel.send(TaskEvent::DuplicateResult(report));
                }
                ScanOutcome::Cancelled => {
                    log::info!("Duplicate scan cancelled, no result");
                }
            }
        })
    }

    /// Start a bulk copy or move.
    ///
    /// Emits `Progress` and a `FileOperationResult`, or a single `Error` if
    /// the destination is invalid, then `Finished`.
    pub fn start_file_operation(
        &self,
        sources: Vec<PathBuf>,
        destination: PathBuf,
        kind: OperationKind,
    ) -> TaskHandle {
        let request = FileOperationRequest::new(sources, destination, kind);

        self.spawn(TaskKind::FileOp, move |token, channel| {
            match transfer::execute(&request, token, channel) {
                Ok(result) => channel.send(TaskEvent::FileOperationResult(result)),
                Err(e) => channel.send(TaskEvent::Error {
                    title: request.kind.error_title().to_string(),
                    message: e.to_string(),
                }),
            }
        })
    }

    /// Cancel a task. Idempotent and non-blocking.
    pub fn cancel(&self, handle: &TaskHandle) {
        handle.cancel();
    }

    /// Cancel whatever is running, of every kind.
    pub fn cancel_all(&self) {
        for slot in lock(&self.slots).values() {
            if slot.state == TaskState::Running {
                slot.token.cancel();
            }
        }
    }

    /// State of the current instance of `kind`.
    #[must_use]
    pub fn state(&self, kind: TaskKind) -> TaskState {
        lock(&self.slots)
            .get(&kind)
            .map_or(TaskState::Idle, |slot| slot.state)
    }

    /// Whether `message` belongs to the newest instance of its kind.
    #[must_use]
    pub fn is_current(&self, message: &TaskMessage) -> bool {
        lock(&self.slots)
            .get(&message.kind)
            .is_some_and(|slot| slot.id == message.id)
    }

    /// Block until the next event of `handle`'s instance.
    ///
    /// Events of other live instances are parked for their own handles;
    /// events of superseded instances are dropped. Returns `None` on
    /// timeout.
    pub fn next_event(&self, handle: &TaskHandle, timeout: Duration) -> Option<TaskEvent> {
        if let Some(event) = self.take_parked(handle.id) {
            return Some(event);
        }

        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.receiver.recv_timeout(remaining) {
                Ok(message) if handle.owns(&message) => return Some(message.event),
                Ok(message) if self.is_current(&message) => {
                    log::trace!("Parking event from {} #{}", message.kind, message.id);
                    self.park(message);
                }
                Ok(message) => {
                    log::trace!("Dropping stale event from {} #{}", message.kind, message.id);
                }
                Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => return None,
            }
        }
    }

    fn park(&self, message: TaskMessage) {
        self.parked
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(message.id)
            .or_default()
            .push_back(message.event);
    }

    fn take_parked(&self, id: TaskId) -> Option<TaskEvent> {
        let mut parked = self.parked.lock().unwrap_or_else(PoisonError::into_inner);
        let queue = parked.get_mut(&id)?;
        let event = queue.pop_front();
        if queue.is_empty() {
            parked.remove(&id);
        }
        event
    }

    fn spawn<F>(&self, kind: TaskKind, job: F) -> TaskHandle
    where
        F: FnOnce(&CancellationToken, &ChannelProgress) + Send + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let token = CancellationToken::new();

        {
            let mut slots = lock(&self.slots);
            let previous = slots.insert(
                kind,
                Slot {
                    id,
                    token: token.clone(),
                    state: TaskState::Running,
                },
            );
            if let Some(previous) = previous {
                if previous.state == TaskState::Running {
                    log::info!("Superseding {} #{} with #{}", kind, previous.id, id);
                }
                previous.token.cancel();
                self.parked
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .remove(&previous.id);
            }
        }

        let guard = FinishGuard {
            channel: ChannelProgress {
                id,
                kind,
                sender: self.sender.clone(),
            },
            token: token.clone(),
            slots: Arc::clone(&self.slots),
        };

        log::debug!("Starting {} #{}", kind, id);
        self.pool.spawn(move || {
            let guard = guard;
            job(&guard.token, &guard.channel);
        });

        TaskHandle { id, kind, token }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
