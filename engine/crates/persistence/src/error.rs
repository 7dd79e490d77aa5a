use std::io;

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    /// Storage could not be reached; nothing was written.
    #[error("storage connection failed: {0}")]
    Connection(String),

    /// A statement failed or a required child entity was missing. Writes
    /// made earlier in the same attempt stay applied.
    #[error("storage write failed: {0}")]
    Write(String),

    #[error("failed to spawn logout worker: {0}")]
    Spawn(#[from] io::Error),
}
