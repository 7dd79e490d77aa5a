pub mod error;
pub mod queue;
pub mod shutdown;
pub mod worker;

pub use error::PersistenceError;
pub use queue::LogoutQueue;
pub use shutdown::{Shutdown, ShutdownRx};
pub use worker::{
    LogoutContext, LogoutWorker, SaveAttempt, SaveOutcome, WorkerConfig, WorkerHandle, WorkerState,
};
