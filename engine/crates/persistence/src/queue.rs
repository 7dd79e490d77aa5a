use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use session::{SessionBound, SessionId};

/// The player the worker has popped and is currently saving.
#[derive(Debug)]
struct InFlight {
    session_id: SessionId,
    username: String,
}

#[derive(Debug)]
struct QueueState<T> {
    pending: VecDeque<T>,
    in_flight: Option<InFlight>,
}

/// FIFO of players waiting to be saved after disconnecting.
///
/// Producers hand the player over by value, so once enqueued only the
/// logout worker can touch it. Cloning the queue clones the handle; all
/// clones share the same contents.
#[derive(Debug)]
pub struct LogoutQueue<T> {
    state: Arc<Mutex<QueueState<T>>>,
}

impl<T> Clone for LogoutQueue<T> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<T: SessionBound> Default for LogoutQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: SessionBound> LogoutQueue<T> {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(QueueState {
                pending: VecDeque::new(),
                in_flight: None,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue a player for saving. Returns false (and drops `player`) if the
    /// same session is already queued or being saved.
    pub fn enqueue(&self, player: T) -> bool {
        let session_id = player.session_id();
        let mut state = self.lock();
        let in_flight = state
            .in_flight
            .as_ref()
            .is_some_and(|f| f.session_id == session_id);
        if in_flight || state.pending.iter().any(|p| p.session_id() == session_id) {
            tracing::debug!(
                username = player.username(),
                session = session_id.0,
                "player already queued for logout"
            );
            return false;
        }
        state.pending.push_back(player);
        true
    }

    /// Number of players waiting (not counting one being saved right now).
    pub fn size(&self) -> usize {
        self.lock().pending.len()
    }

    /// Whether an account is waiting to be saved or is being saved right
    /// now. Case-insensitive. Login must wait while this is true.
    pub fn contains(&self, username: &str) -> bool {
        let state = self.lock();
        state
            .in_flight
            .as_ref()
            .is_some_and(|f| f.username.eq_ignore_ascii_case(username))
            || state
                .pending
                .iter()
                .any(|p| p.username().eq_ignore_ascii_case(username))
    }

    /// Take the head of the queue and mark it in flight.
    pub(crate) fn pop(&self) -> Option<T> {
        let mut state = self.lock();
        let player = state.pending.pop_front()?;
        state.in_flight = Some(InFlight {
            session_id: player.session_id(),
            username: player.username().to_string(),
        });
        Some(player)
    }

    /// Put a player whose save failed back on the tail.
    pub(crate) fn requeue(&self, player: T) {
        let mut state = self.lock();
        state.in_flight = None;
        state.pending.push_back(player);
    }

    /// Clear the in-flight marker after a successful save.
    pub(crate) fn finish(&self) {
        self.lock().in_flight = None;
    }
}
