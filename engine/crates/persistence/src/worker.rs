use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, PoisonError};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use observability::{AttemptOutcome, LogoutMetrics, PlayerCountObserver};
use session::{SessionBound, SharedRegistry};
use space::MovementRoster;

use crate::error::PersistenceError;
use crate::queue::LogoutQueue;
use crate::shutdown::Shutdown;

/// Result of a save attempt that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Everything was written.
    Saved,
    /// The stored session token no longer matches; nothing was written.
    Stale,
}

/// One attempt at persisting a player. Implementations connect, write and
/// disconnect on every call; the worker retries failures forever.
pub trait SaveAttempt<T>: Send {
    fn attempt(&mut self, player: &mut T) -> Result<SaveOutcome, PersistenceError>;
}

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Pause after every pass, whether or not anything was saved.
    pub interval: Duration,
    /// Attempts slower than this are logged as warnings.
    pub slow_save: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(500),
            slow_save: Duration::from_secs(2),
        }
    }
}

/// Server collaborators told about a completed logout.
#[derive(Clone)]
pub struct LogoutContext {
    pub online: SharedRegistry,
    pub movement: Arc<dyn MovementRoster>,
    pub player_count: Arc<dyn PlayerCountObserver>,
}

/// Drains a [`LogoutQueue`] one player per pass.
pub struct LogoutWorker<T, S> {
    queue: LogoutQueue<T>,
    saver: S,
    context: LogoutContext,
    config: WorkerConfig,
}

impl<T, S> LogoutWorker<T, S>
where
    T: SessionBound + Send + 'static,
    S: SaveAttempt<T> + 'static,
{
    pub fn new(queue: LogoutQueue<T>, saver: S, context: LogoutContext, config: WorkerConfig) -> Self {
        Self {
            queue,
            saver,
            context,
            config,
        }
    }

    pub fn queue(&self) -> &LogoutQueue<T> {
        &self.queue
    }

    /// Run a single pass without sleeping. Returns None if the queue was
    /// empty.
    pub fn run_once(&mut self) -> Option<AttemptOutcome> {
        let mut player = self.queue.pop()?;
        let username = player.username().to_string();
        let started = Instant::now();

        let saver = &mut self.saver;
        let attempt = panic::catch_unwind(AssertUnwindSafe(|| saver.attempt(&mut player)));

        let outcome = match attempt {
            Ok(Ok(saved)) => {
                self.queue.finish();
                if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| self.deregister(&player))) {
                    tracing::error!(
                        username = %username,
                        panic = panic_message(&*payload),
                        "deregistering a saved player panicked"
                    );
                }
                tracing::info!(username = %username, "{} logged out", username);
                match saved {
                    SaveOutcome::Saved => AttemptOutcome::Saved,
                    SaveOutcome::Stale => AttemptOutcome::Stale,
                }
            }
            Ok(Err(e)) => {
                tracing::warn!(username = %username, error = %e, "logout save failed, requeueing");
                self.queue.requeue(player);
                AttemptOutcome::Requeued
            }
            Err(payload) => {
                tracing::error!(
                    username = %username,
                    panic = panic_message(&*payload),
                    "logout save panicked, requeueing"
                );
                self.queue.requeue(player);
                AttemptOutcome::Requeued
            }
        };

        LogoutMetrics {
            username,
            outcome,
            duration_us: started.elapsed().as_micros(),
            pending: self.queue.size(),
            slow_budget_us: self.config.slow_save.as_micros(),
        }
        .log();

        Some(outcome)
    }

    fn deregister(&self, player: &T) {
        let online = {
            let mut registry = self.context.online.lock().unwrap_or_else(PoisonError::into_inner);
            registry.remove(player.username(), player.session_id());
            registry.count()
        };
        self.context.movement.remove_player(player.username());
        self.context.player_count.player_count_changed(online);
    }

    /// Move the worker onto its own thread and drain until `shutdown` trips.
    pub fn start(mut self, shutdown: Shutdown) -> Result<WorkerHandle, PersistenceError> {
        let stop_rx = shutdown.subscribe();
        let interval = self.config.interval;

        let thread = std::thread::Builder::new()
            .name("logout-worker".to_string())
            .spawn(move || {
                tracing::info!(interval_ms = interval.as_millis() as u64, "logout worker started");
                while !stop_rx.is_shutdown() {
                    self.run_once();
                    std::thread::sleep(interval);
                }
                tracing::info!(pending = self.queue.size(), "logout worker stopped");
            })?;

        Ok(WorkerHandle {
            shutdown,
            thread: Some(thread),
        })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Running,
    Stopped,
}

/// Handle to a started worker. Dropping it trips the shutdown flag the
/// worker was started with.
pub struct WorkerHandle {
    shutdown: Shutdown,
    thread: Option<JoinHandle<()>>,
}

impl WorkerHandle {
    /// Trip the worker's shutdown flag. Takes effect at the top of its next
    /// pass; a save in progress runs to completion and queued players stay
    /// queued.
    pub fn stop(&self) {
        self.shutdown.trigger();
    }

    pub fn state(&self) -> WorkerState {
        let finished = self.thread.as_ref().map_or(true, |t| t.is_finished());
        if self.shutdown.is_triggered() || finished {
            WorkerState::Stopped
        } else {
            WorkerState::Running
        }
    }

    /// Stop and wait for the worker thread to exit.
    pub fn join(mut self) {
        self.stop();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                tracing::error!("logout worker thread panicked");
            }
        }
    }
}

impl Drop for WorkerHandle {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::tests::TestPlayer;
    use observability::PeakPlayerCount;
    use session::{OnlineRegistry, SessionId};
    use space::MovementService;
    use std::collections::VecDeque;
    use std::sync::{Barrier, Mutex};

    /// Replays scripted results; saves once the script runs out.
    struct ScriptedSaver {
        script: VecDeque<Result<SaveOutcome, PersistenceError>>,
        attempts: Arc<Mutex<Vec<String>>>,
    }

    impl ScriptedSaver {
        fn new(script: Vec<Result<SaveOutcome, PersistenceError>>) -> Self {
            Self {
                script: script.into(),
                attempts: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    impl SaveAttempt<TestPlayer> for ScriptedSaver {
        fn attempt(&mut self, player: &mut TestPlayer) -> Result<SaveOutcome, PersistenceError> {
            self.attempts.lock().unwrap().push(player.name.clone());
            self.script.pop_front().unwrap_or(Ok(SaveOutcome::Saved))
        }
    }

    struct Fixture {
        online: SharedRegistry,
        movement: Arc<MovementService>,
        peak: Arc<PeakPlayerCount>,
    }

    impl Fixture {
        fn new(players: &[(u64, &str)]) -> Self {
            let online = OnlineRegistry::shared();
            let movement = Arc::new(MovementService::new());
            for &(sid, name) in players {
                online.lock().unwrap().register(SessionId(sid), name);
                movement.add_player(name);
            }
            Self {
                online,
                movement,
                peak: Arc::new(PeakPlayerCount::new()),
            }
        }

        fn context(&self) -> LogoutContext {
            LogoutContext {
                online: self.online.clone(),
                movement: self.movement.clone(),
                player_count: self.peak.clone(),
            }
        }
    }

    fn fast_config() -> WorkerConfig {
        WorkerConfig {
            interval: Duration::from_millis(5),
            slow_save: Duration::from_secs(5),
        }
    }

    #[test]
    fn empty_queue_does_nothing() {
        let fx = Fixture::new(&[]);
        let mut worker = LogoutWorker::new(
            LogoutQueue::<TestPlayer>::new(),
            ScriptedSaver::new(vec![]),
            fx.context(),
            fast_config(),
        );
        assert_eq!(worker.run_once(), None);
    }

    #[test]
    fn successful_save_deregisters() {
        let fx = Fixture::new(&[(1, "Ash"), (2, "Misty")]);
        let queue = LogoutQueue::new();
        queue.enqueue(TestPlayer::new(1, "Ash"));
        let mut worker = LogoutWorker::new(queue.clone(), ScriptedSaver::new(vec![]), fx.context(), fast_config());

        assert!(queue.contains("Ash"));
        assert_eq!(worker.run_once(), Some(AttemptOutcome::Saved));
        assert!(!queue.contains("Ash"));
        assert!(!fx.online.lock().unwrap().contains("Ash"));
        assert!(!fx.movement.is_tracking("Ash"));
        assert!(fx.movement.is_tracking("Misty"));
        assert_eq!(fx.peak.current(), 1);
    }

    #[test]
    fn failed_save_requeues_at_tail() {
        let fx = Fixture::new(&[(1, "Ash"), (2, "Misty")]);
        let queue = LogoutQueue::new();
        queue.enqueue(TestPlayer::new(1, "Ash"));
        queue.enqueue(TestPlayer::new(2, "Misty"));
        let saver = ScriptedSaver::new(vec![Err(PersistenceError::Connection("refused".into()))]);
        let attempts = saver.attempts.clone();
        let mut worker = LogoutWorker::new(queue.clone(), saver, fx.context(), fast_config());

        assert_eq!(worker.run_once(), Some(AttemptOutcome::Requeued));
        assert_eq!(queue.size(), 2);
        assert!(queue.contains("Ash"));
        assert!(fx.online.lock().unwrap().contains("Ash"));

        assert_eq!(worker.run_once(), Some(AttemptOutcome::Saved));
        assert_eq!(worker.run_once(), Some(AttemptOutcome::Saved));
        assert_eq!(*attempts.lock().unwrap(), vec!["Ash", "Misty", "Ash"]);
        assert_eq!(queue.size(), 0);
    }

    #[test]
    fn stale_save_still_deregisters() {
        let fx = Fixture::new(&[(1, "Ash")]);
        let queue = LogoutQueue::new();
        queue.enqueue(TestPlayer::new(1, "Ash"));
        let mut worker = LogoutWorker::new(
            queue.clone(),
            ScriptedSaver::new(vec![Ok(SaveOutcome::Stale)]),
            fx.context(),
            fast_config(),
        );

        assert_eq!(worker.run_once(), Some(AttemptOutcome::Stale));
        assert!(!queue.contains("Ash"));
        assert!(!fx.online.lock().unwrap().contains("Ash"));
    }

    #[test]
    fn stale_logout_keeps_newer_registry_entry() {
        let fx = Fixture::new(&[(2, "Ash")]);
        let queue = LogoutQueue::new();
        queue.enqueue(TestPlayer::new(1, "Ash"));
        let mut worker = LogoutWorker::new(
            queue,
            ScriptedSaver::new(vec![Ok(SaveOutcome::Stale)]),
            fx.context(),
            fast_config(),
        );

        worker.run_once();
        let online = fx.online.lock().unwrap();
        assert_eq!(online.get("Ash").unwrap().session_id, SessionId(2));
    }

    #[test]
    fn started_worker_drains_then_stops() {
        let fx = Fixture::new(&[(1, "Ash"), (2, "Misty")]);
        let queue = LogoutQueue::new();
        queue.enqueue(TestPlayer::new(1, "Ash"));
        queue.enqueue(TestPlayer::new(2, "Misty"));
        let worker = LogoutWorker::new(queue.clone(), ScriptedSaver::new(vec![]), fx.context(), fast_config());

        let handle = worker.start(Shutdown::new()).unwrap();
        assert_eq!(handle.state(), WorkerState::Running);

        let deadline = Instant::now() + Duration::from_secs(5);
        while (queue.contains("Ash") || queue.contains("Misty")) && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(queue.size(), 0);
        assert_eq!(fx.online.lock().unwrap().count(), 0);

        handle.stop();
        assert_eq!(handle.state(), WorkerState::Stopped);
        handle.join();
    }

    #[test]
    fn stopped_worker_leaves_queue_alone() {
        let fx = Fixture::new(&[]);
        let queue = LogoutQueue::new();
        let worker = LogoutWorker::new(queue.clone(), ScriptedSaver::new(vec![]), fx.context(), fast_config());
        let handle = worker.start(Shutdown::new()).unwrap();
        handle.join();

        queue.enqueue(TestPlayer::new(1, "Ash"));
        std::thread::sleep(Duration::from_millis(30));
        assert_eq!(queue.size(), 1);
    }

    /// Panics on the first `panics` attempts, then saves.
    struct PanickingSaver {
        panics: usize,
    }

    impl SaveAttempt<TestPlayer> for PanickingSaver {
        fn attempt(&mut self, player: &mut TestPlayer) -> Result<SaveOutcome, PersistenceError> {
            if self.panics > 0 {
                self.panics -= 1;
                panic!("driver blew up saving {}", player.name);
            }
            Ok(SaveOutcome::Saved)
        }
    }

    #[test]
    fn panicking_save_is_requeued() {
        let fx = Fixture::new(&[(1, "Ash")]);
        let queue = LogoutQueue::new();
        queue.enqueue(TestPlayer::new(1, "Ash"));
        let mut worker = LogoutWorker::new(queue.clone(), PanickingSaver { panics: 1 }, fx.context(), fast_config());

        assert_eq!(worker.run_once(), Some(AttemptOutcome::Requeued));
        assert_eq!(queue.size(), 1);
        assert!(queue.contains("Ash"));
        assert!(fx.online.lock().unwrap().contains("Ash"));

        assert_eq!(worker.run_once(), Some(AttemptOutcome::Saved));
        assert!(!queue.contains("Ash"));
        assert!(!fx.online.lock().unwrap().contains("Ash"));
    }

    #[test]
    fn started_worker_survives_panicking_save() {
        let fx = Fixture::new(&[(1, "Ash")]);
        let queue = LogoutQueue::new();
        queue.enqueue(TestPlayer::new(1, "Ash"));
        let worker = LogoutWorker::new(queue.clone(), PanickingSaver { panics: 3 }, fx.context(), fast_config());
        let handle = worker.start(Shutdown::new()).unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        while queue.contains("Ash") && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(5));
        }
        assert!(!queue.contains("Ash"));
        assert_eq!(handle.state(), WorkerState::Running);
        assert!(!fx.online.lock().unwrap().contains("Ash"));
        handle.join();
    }

    struct PanickingRoster;

    impl MovementRoster for PanickingRoster {
        fn remove_player(&self, username: &str) -> bool {
            panic!("movement roster lost {}", username);
        }
    }

    #[test]
    fn panicking_collaborator_still_finishes_logout() {
        let fx = Fixture::new(&[(1, "Ash")]);
        let queue = LogoutQueue::new();
        queue.enqueue(TestPlayer::new(1, "Ash"));
        let context = LogoutContext {
            movement: Arc::new(PanickingRoster),
            ..fx.context()
        };
        let mut worker = LogoutWorker::new(queue.clone(), ScriptedSaver::new(vec![]), context, fast_config());

        assert_eq!(worker.run_once(), Some(AttemptOutcome::Saved));
        assert!(!queue.contains("Ash"));
        assert_eq!(queue.size(), 0);
        assert!(!fx.online.lock().unwrap().contains("Ash"));
    }

    /// Holds the attempt open until the test releases it.
    struct GatedSaver {
        entered: Arc<Barrier>,
        release: Arc<Barrier>,
    }

    impl SaveAttempt<TestPlayer> for GatedSaver {
        fn attempt(&mut self, _player: &mut TestPlayer) -> Result<SaveOutcome, PersistenceError> {
            self.entered.wait();
            self.release.wait();
            Ok(SaveOutcome::Saved)
        }
    }

    #[test]
    fn stop_lets_in_flight_save_finish() {
        let fx = Fixture::new(&[(1, "Ash"), (2, "Misty")]);
        let queue = LogoutQueue::new();
        queue.enqueue(TestPlayer::new(1, "Ash"));
        queue.enqueue(TestPlayer::new(2, "Misty"));
        let entered = Arc::new(Barrier::new(2));
        let release = Arc::new(Barrier::new(2));
        let saver = GatedSaver {
            entered: entered.clone(),
            release: release.clone(),
        };
        let worker = LogoutWorker::new(queue.clone(), saver, fx.context(), fast_config());
        let handle = worker.start(Shutdown::new()).unwrap();

        entered.wait();
        handle.stop();
        assert!(queue.contains("Ash"));
        release.wait();
        handle.join();

        assert!(!queue.contains("Ash"));
        assert!(!fx.online.lock().unwrap().contains("Ash"));
        assert!(!fx.movement.is_tracking("Ash"));
        assert!(queue.contains("Misty"));
        assert_eq!(queue.size(), 1);
    }

    #[test]
    fn dropped_handle_stops_worker() {
        let fx = Fixture::new(&[]);
        let queue = LogoutQueue::new();
        let shutdown = Shutdown::new();
        let worker = LogoutWorker::new(queue.clone(), ScriptedSaver::new(vec![]), fx.context(), fast_config());
        drop(worker.start(shutdown.clone()).unwrap());
        assert!(shutdown.is_triggered());

        std::thread::sleep(Duration::from_millis(30));
        queue.enqueue(TestPlayer::new(1, "Ash"));
        std::thread::sleep(Duration::from_millis(30));
        assert_eq!(queue.size(), 1);
    }

    #[test]
    fn shared_shutdown_stops_worker() {
        let fx = Fixture::new(&[]);
        let shutdown = Shutdown::new();
        let worker = LogoutWorker::new(
            LogoutQueue::<TestPlayer>::new(),
            ScriptedSaver::new(vec![]),
            fx.context(),
            fast_config(),
        );
        let handle = worker.start(shutdown.clone()).unwrap();
        shutdown.trigger();

        let deadline = Instant::now() + Duration::from_secs(5);
        while handle.thread.as_ref().is_some_and(|t| !t.is_finished()) && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(handle.state(), WorkerState::Stopped);
        assert!(handle.thread.as_ref().is_some_and(|t| t.is_finished()));
    }
}
