use player_state::{BAG_SLOTS, BOX_SLOTS, PARTY_SIZE};
use rusqlite::Connection;

use crate::error::PlayerDbError;
use crate::schema::numbered_columns;

fn assignments(columns: &[String]) -> String {
    columns
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{} = ?{}", c, i + 1))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Repository for party reference rows (one per member).
pub struct PartyRepo<'a> {
    conn: &'a Connection,
}

impl<'a> PartyRepo<'a> {
    pub(crate) fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn update(&self, member: i64, ids: &[i64; PARTY_SIZE]) -> Result<(), PlayerDbError> {
        let columns = numbered_columns("creature", PARTY_SIZE);
        let sql = format!(
            "UPDATE parties SET {} WHERE member = ?{}",
            assignments(&columns),
            PARTY_SIZE + 1
        );
        let rows = self.conn.execute(
            &sql,
            rusqlite::params_from_iter(ids.iter().chain(std::iter::once(&member))),
        )?;
        if rows == 0 {
            return Err(PlayerDbError::RowMissing {
                table: "parties",
                id: member,
            });
        }
        Ok(())
    }

    pub fn load(&self, member: i64) -> Result<[i64; PARTY_SIZE], PlayerDbError> {
        let sql = format!(
            "SELECT {} FROM parties WHERE member = ?1",
            numbered_columns("creature", PARTY_SIZE).join(", ")
        );
        self.conn
            .query_row(&sql, rusqlite::params![member], |row| {
                let mut ids = [0i64; PARTY_SIZE];
                for (i, id) in ids.iter_mut().enumerate() {
                    *id = row.get(i)?;
                }
                Ok(ids)
            })
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => PlayerDbError::RowMissing {
                    table: "parties",
                    id: member,
                },
                other => other.into(),
            })
    }
}

/// Repository for bag rows.
pub struct BagRepo<'a> {
    conn: &'a Connection,
}

impl<'a> BagRepo<'a> {
    pub(crate) fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Write one bag slot. Callers clamp values before writing.
    pub fn update_slot(&self, bag_id: i64, slot: usize, item: i32, quantity: i32) -> Result<(), PlayerDbError> {
        if slot >= BAG_SLOTS {
            return Err(PlayerDbError::RowMissing {
                table: "bags",
                id: bag_id,
            });
        }
        let sql = format!(
            "UPDATE bags SET item{slot} = ?1, quantity{slot} = ?2 WHERE id = ?3"
        );
        let rows = self
            .conn
            .execute(&sql, rusqlite::params![item, quantity, bag_id])?;
        if rows == 0 {
            return Err(PlayerDbError::RowMissing {
                table: "bags",
                id: bag_id,
            });
        }
        Ok(())
    }

    /// All slots as (item, quantity) pairs; empty slots read as (0, 0).
    pub fn load(&self, bag_id: i64) -> Result<Vec<(i32, i32)>, PlayerDbError> {
        let columns: Vec<String> = (0..BAG_SLOTS)
            .map(|i| format!("item{i}, quantity{i}"))
            .collect();
        let sql = format!("SELECT {} FROM bags WHERE id = ?1", columns.join(", "));
        self.conn
            .query_row(&sql, rusqlite::params![bag_id], |row| {
                (0..BAG_SLOTS)
                    .map(|i| Ok((row.get::<_, i32>(i * 2)?, row.get::<_, i32>(i * 2 + 1)?)))
                    .collect::<rusqlite::Result<Vec<(i32, i32)>>>()
            })
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => PlayerDbError::RowMissing {
                    table: "bags",
                    id: bag_id,
                },
                other => other.into(),
            })
    }
}

/// A storage box row.
#[derive(Debug, Clone)]
pub struct BoxRecord {
    pub id: i64,
    pub member: i64,
    pub creatures: Vec<i64>,
}

/// Repository for storage box rows.
pub struct BoxRepo<'a> {
    conn: &'a Connection,
}

impl<'a> BoxRepo<'a> {
    pub(crate) fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Insert an all-empty box for a member and return its id, read back
    /// as the member's newest box.
    pub fn insert_empty(&self, member: i64) -> Result<i64, PlayerDbError> {
        self.conn.execute(
            "INSERT INTO boxes (member) VALUES (?1)",
            rusqlite::params![member],
        )?;
        Ok(self.conn.query_row(
            "SELECT id FROM boxes WHERE member = ?1 ORDER BY id DESC LIMIT 1",
            rusqlite::params![member],
            |row| row.get(0),
        )?)
    }

    pub fn update(&self, box_id: i64, ids: &[i64; BOX_SLOTS]) -> Result<(), PlayerDbError> {
        let columns = numbered_columns("creature", BOX_SLOTS);
        let sql = format!(
            "UPDATE boxes SET {} WHERE id = ?{}",
            assignments(&columns),
            BOX_SLOTS + 1
        );
        let rows = self.conn.execute(
            &sql,
            rusqlite::params_from_iter(ids.iter().chain(std::iter::once(&box_id))),
        )?;
        if rows == 0 {
            return Err(PlayerDbError::RowMissing {
                table: "boxes",
                id: box_id,
            });
        }
        Ok(())
    }

    /// A member's boxes in insertion order.
    pub fn list_for_member(&self, member: i64) -> Result<Vec<BoxRecord>, PlayerDbError> {
        let sql = format!(
            "SELECT id, member, {} FROM boxes WHERE member = ?1 ORDER BY id",
            numbered_columns("creature", BOX_SLOTS).join(", ")
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let records = stmt
            .query_map(rusqlite::params![member], |row| {
                Ok(BoxRecord {
                    id: row.get(0)?,
                    member: row.get(1)?,
                    creatures: (0..BOX_SLOTS)
                        .map(|i| row.get(i + 2))
                        .collect::<Result<Vec<i64>, _>>()?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }
}
