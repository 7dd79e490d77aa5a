use std::sync::atomic::{AtomicUsize, Ordering};

use tracing_subscriber::{fmt, EnvFilter};

pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

/// How a single logout attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// State was written to storage.
    Saved,
    /// A newer session owns the account; nothing was written.
    Stale,
    /// The attempt failed and the player went back on the queue.
    Requeued,
}

impl AttemptOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Saved => "saved",
            Self::Stale => "stale",
            Self::Requeued => "requeued",
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogoutMetrics {
    pub username: String,
    pub outcome: AttemptOutcome,
    pub duration_us: u128,
    /// Queue length after the attempt finished.
    pub pending: usize,
    pub slow_budget_us: u128,
}

impl LogoutMetrics {
    pub fn log(&self) {
        if self.duration_us > self.slow_budget_us {
            tracing::warn!(
                username = %self.username,
                outcome = self.outcome.as_str(),
                duration_us = self.duration_us,
                pending = self.pending,
                "logout attempt exceeded budget ({}us > {}us)",
                self.duration_us,
                self.slow_budget_us
            );
        } else {
            tracing::info!(
                username = %self.username,
                outcome = self.outcome.as_str(),
                duration_us = self.duration_us,
                pending = self.pending,
                "logout attempt finished"
            );
        }
    }
}

/// Receives the online player count whenever a player leaves the server.
pub trait PlayerCountObserver: Send + Sync {
    fn player_count_changed(&self, online: usize);
}

/// Logs the online count and remembers the highest count ever seen.
#[derive(Debug, Default)]
pub struct PeakPlayerCount {
    current: AtomicUsize,
    highest: AtomicUsize,
}

impl PeakPlayerCount {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> usize {
        self.current.load(Ordering::Relaxed)
    }

    pub fn highest(&self) -> usize {
        self.highest.load(Ordering::Relaxed)
    }
}

impl PlayerCountObserver for PeakPlayerCount {
    fn player_count_changed(&self, online: usize) {
        self.current.store(online, Ordering::Relaxed);
        tracing::info!(online, "{} players online", online);
        let previous = self.highest.fetch_max(online, Ordering::Relaxed);
        if online > previous {
            tracing::info!(highest = online, "new online player record");
        }
    }
}
