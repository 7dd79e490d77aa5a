use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

/// The network connection behind a logged-in player.
///
/// Only the lifecycle half of the transport is needed here: whether the
/// connection is still open, and a way to close it.
pub trait SessionLink: Send + Sync {
    fn is_connected(&self) -> bool;
    fn close(&self);
}

/// Anything that belongs to exactly one login session of one account.
pub trait SessionBound {
    fn session_id(&self) -> SessionId;
    fn username(&self) -> &str;
}

/// An entry in the online-player registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnlinePlayer {
    pub session_id: SessionId,
    pub username: String,
}

/// Players currently online, keyed by lowercased username.
#[derive(Debug, Default)]
pub struct OnlineRegistry {
    players: BTreeMap<String, OnlinePlayer>,
}

pub type SharedRegistry = Arc<Mutex<OnlineRegistry>>;

impl OnlineRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedRegistry {
        Arc::new(Mutex::new(Self::new()))
    }

    /// Register a player for a session. A newer session replaces any older
    /// entry for the same account.
    pub fn register(&mut self, session_id: SessionId, username: &str) -> Option<OnlinePlayer> {
        self.players.insert(
            username.to_lowercase(),
            OnlinePlayer {
                session_id,
                username: username.to_string(),
            },
        )
    }

    /// Remove a player by name, but only if the entry still belongs to
    /// `session_id`. Returns true if an entry was removed.
    pub fn remove(&mut self, username: &str, session_id: SessionId) -> bool {
        let key = username.to_lowercase();
        match self.players.get(&key) {
            Some(entry) if entry.session_id == session_id => {
                self.players.remove(&key);
                true
            }
            Some(entry) => {
                tracing::debug!(
                    username,
                    owner = entry.session_id.0,
                    session = session_id.0,
                    "registry entry belongs to a newer session, keeping it"
                );
                false
            }
            None => false,
        }
    }

    pub fn get(&self, username: &str) -> Option<&OnlinePlayer> {
        self.players.get(&username.to_lowercase())
    }

    pub fn contains(&self, username: &str) -> bool {
        self.players.contains_key(&username.to_lowercase())
    }

    pub fn count(&self) -> usize {
        self.players.len()
    }
}
