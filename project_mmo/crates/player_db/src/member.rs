use player_state::{Badges, Location, PlayerAggregate, SkillExperience};
use rusqlite::Connection;
use space::MapCoord;

use crate::error::PlayerDbError;
use crate::schema::bool_text;

/// A member (profile) row.
#[derive(Debug, Clone)]
pub struct MemberRecord {
    pub id: i64,
    pub username: String,
    pub bag_id: i64,
    pub last_login_time: i64,
    pub last_login_server: Option<String>,
    pub sprite: i32,
    pub money: i64,
    pub npc_multiplier: String,
    pub skills: SkillExperience,
    pub position: Location,
    pub heal_point: Location,
    pub surfing: bool,
    pub badges: Badges,
}

/// Repository for the member table.
pub struct MemberRepo<'a> {
    conn: &'a Connection,
}

impl<'a> MemberRepo<'a> {
    pub(crate) fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Register a member together with the bag and party rows every member
    /// owns.
    pub fn create(&self, username: &str, login_time: i64) -> Result<MemberRecord, PlayerDbError> {
        if self.id_by_username(username)?.is_some() {
            return Err(PlayerDbError::MemberExists(username.to_string()));
        }

        self.conn.execute("INSERT INTO bags DEFAULT VALUES", [])?;
        let bag_id = self.conn.last_insert_rowid();

        self.conn.execute(
            "INSERT INTO members (username, last_login_time, bag_id) VALUES (?1, ?2, ?3)",
            rusqlite::params![username, login_time, bag_id],
        )?;
        let id = self.conn.last_insert_rowid();

        self.conn.execute(
            "INSERT INTO parties (member) VALUES (?1)",
            rusqlite::params![id],
        )?;

        self.load(id)
    }

    pub fn id_by_username(&self, username: &str) -> Result<Option<i64>, PlayerDbError> {
        match self.conn.query_row(
            "SELECT id FROM members WHERE username = ?1",
            rusqlite::params![username],
            |row| row.get(0),
        ) {
            Ok(id) => Ok(Some(id)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// The login timestamp of the session that currently owns the account.
    pub fn session_token(&self, id: i64) -> Result<i64, PlayerDbError> {
        self.conn
            .query_row(
                "SELECT last_login_time FROM members WHERE id = ?1",
                rusqlite::params![id],
                |row| row.get(0),
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => PlayerDbError::MemberNotFound(id),
                other => other.into(),
            })
    }

    /// Stamp a new login: the session token and the server holding it.
    pub fn record_login(&self, id: i64, login_time: i64, server: &str) -> Result<(), PlayerDbError> {
        let rows = self.conn.execute(
            "UPDATE members SET last_login_time = ?1, last_login_server = ?2 WHERE id = ?3",
            rusqlite::params![login_time, server, id],
        )?;
        if rows == 0 {
            return Err(PlayerDbError::MemberNotFound(id));
        }
        Ok(())
    }

    /// Clear the server marker once the member's state is stored.
    pub fn mark_logged_out(&self, id: i64) -> Result<(), PlayerDbError> {
        let rows = self.conn.execute(
            "UPDATE members SET last_login_server = NULL WHERE id = ?1",
            rusqlite::params![id],
        )?;
        if rows == 0 {
            return Err(PlayerDbError::MemberNotFound(id));
        }
        Ok(())
    }

    /// Overwrite the profile row with the player's in-memory state.
    pub fn update_profile(&self, player: &PlayerAggregate) -> Result<(), PlayerDbError> {
        let rows = self.conn.execute(
            "UPDATE members SET
                sprite = ?1, money = ?2, npc_mul = ?3,
                sk_herb = ?4, sk_craft = ?5, sk_fish = ?6, sk_train = ?7, sk_coord = ?8, sk_breed = ?9,
                x = ?10, y = ?11, map_x = ?12, map_y = ?13,
                heal_x = ?14, heal_y = ?15, heal_map_x = ?16, heal_map_y = ?17,
                is_surfing = ?18, badges = ?19
             WHERE username = ?20 AND id = ?21",
            rusqlite::params![
                player.sprite,
                player.money,
                player.npc_multiplier_text(),
                player.skills.herbalism,
                player.skills.crafting,
                player.skills.fishing,
                player.skills.training,
                player.skills.coordinating,
                player.skills.breeding,
                player.position.x,
                player.position.y,
                player.position.map.x,
                player.position.map.y,
                player.heal_point.x,
                player.heal_point.y,
                player.heal_point.map.x,
                player.heal_point.map.y,
                bool_text(player.surfing),
                player.badges.encode(),
                player.username,
                player.account_id,
            ],
        )?;
        if rows == 0 {
            return Err(PlayerDbError::RowMissing {
                table: "members",
                id: player.account_id,
            });
        }
        Ok(())
    }

    pub fn load(&self, id: i64) -> Result<MemberRecord, PlayerDbError> {
        self.conn
            .query_row(
                "SELECT id, username, bag_id, last_login_time, last_login_server, sprite, money, npc_mul,
                        sk_herb, sk_craft, sk_fish, sk_train, sk_coord, sk_breed,
                        x, y, map_x, map_y, heal_x, heal_y, heal_map_x, heal_map_y,
                        is_surfing, badges
                 FROM members WHERE id = ?1",
                rusqlite::params![id],
                |row| {
                    let surfing: String = row.get(22)?;
                    let badges: String = row.get(23)?;
                    Ok(MemberRecord {
                        id: row.get(0)?,
                        username: row.get(1)?,
                        bag_id: row.get(2)?,
                        last_login_time: row.get(3)?,
                        last_login_server: row.get(4)?,
                        sprite: row.get(5)?,
                        money: row.get(6)?,
                        npc_multiplier: row.get(7)?,
                        skills: SkillExperience {
                            herbalism: row.get(8)?,
                            crafting: row.get(9)?,
                            fishing: row.get(10)?,
                            training: row.get(11)?,
                            coordinating: row.get(12)?,
                            breeding: row.get(13)?,
                        },
                        position: Location::new(
                            row.get(14)?,
                            row.get(15)?,
                            MapCoord::new(row.get(16)?, row.get(17)?),
                        ),
                        heal_point: Location::new(
                            row.get(18)?,
                            row.get(19)?,
                            MapCoord::new(row.get(20)?, row.get(21)?),
                        ),
                        surfing: surfing == "true",
                        badges: Badges::decode(&badges),
                    })
                },
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => PlayerDbError::MemberNotFound(id),
                other => other.into(),
            })
    }
}
