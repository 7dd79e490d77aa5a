use std::path::Path;
use std::time::Duration;

use rusqlite::{Connection, OpenFlags};

use crate::containers::{BagRepo, BoxRepo, PartyRepo};
use crate::creature::CreatureRepo;
use crate::error::PlayerDbError;
use crate::member::MemberRepo;
use crate::schema;

/// Where the player store lives and how long a statement may wait on a
/// locked database before failing.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub path: String,
    pub busy_timeout: Duration,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "data/players.db".to_string(),
            busy_timeout: Duration::from_secs(5),
        }
    }
}

/// Main database handle wrapping a SQLite connection.
pub struct PlayerDb {
    conn: Connection,
}

impl PlayerDb {
    /// Open (or create) the store and make sure every table exists.
    pub fn open(config: &DatabaseConfig) -> Result<Self, PlayerDbError> {
        // Ensure parent directory exists
        if let Some(parent) = Path::new(&config.path).parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    PlayerDbError::Database(rusqlite::Error::SqliteFailure(
                        rusqlite::ffi::Error::new(1),
                        Some(format!("failed to create dir: {}", e)),
                    ))
                })?;
            }
        }

        let conn = Connection::open(&config.path)?;
        conn.busy_timeout(config.busy_timeout)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
        schema::create_tables(&conn)?;
        Ok(Self { conn })
    }

    /// Connect to an existing store. Never creates the file or the schema,
    /// so a missing database is a connection failure.
    pub fn connect(config: &DatabaseConfig) -> Result<Self, PlayerDbError> {
        let connect_err = |source| PlayerDbError::Connect {
            path: config.path.clone(),
            source,
        };
        let conn = Connection::open_with_flags(
            &config.path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(connect_err)?;
        conn.busy_timeout(config.busy_timeout).map_err(connect_err)?;
        conn.execute_batch("PRAGMA foreign_keys=ON;").map_err(connect_err)?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (for testing).
    pub fn open_memory() -> Result<Self, PlayerDbError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        schema::create_tables(&conn)?;
        Ok(Self { conn })
    }

    /// Close the connection, reporting any error SQLite raises on close.
    pub fn close(self) -> Result<(), PlayerDbError> {
        self.conn.close().map_err(|(_, e)| PlayerDbError::Database(e))
    }

    pub fn members(&self) -> MemberRepo<'_> {
        MemberRepo::new(&self.conn)
    }

    pub fn creatures(&self) -> CreatureRepo<'_> {
        CreatureRepo::new(&self.conn)
    }

    pub fn parties(&self) -> PartyRepo<'_> {
        PartyRepo::new(&self.conn)
    }

    pub fn bags(&self) -> BagRepo<'_> {
        BagRepo::new(&self.conn)
    }

    pub fn boxes(&self) -> BoxRepo<'_> {
        BoxRepo::new(&self.conn)
    }

    #[cfg(test)]
    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }
}
