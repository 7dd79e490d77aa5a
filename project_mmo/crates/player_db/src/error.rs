use persistence::PersistenceError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlayerDbError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("cannot connect to {path}: {source}")]
    Connect {
        path: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("member not found: {0}")]
    MemberNotFound(i64),

    #[error("member name already taken: {0}")]
    MemberExists(String),

    #[error("no {table} row for id {id}")]
    RowMissing { table: &'static str, id: i64 },

    #[error("member {0} has no bag")]
    MissingBag(i64),
}

impl From<PlayerDbError> for PersistenceError {
    fn from(e: PlayerDbError) -> Self {
        match e {
            PlayerDbError::Connect { .. } => PersistenceError::Connection(e.to_string()),
            other => PersistenceError::Write(other.to_string()),
        }
    }
}
