use player_state::{Creature, MOVE_SLOTS};
use rusqlite::Connection;

use crate::error::PlayerDbError;
use crate::schema::{bool_text, ABSENT_MOVE};

/// A creature row as stored.
#[derive(Debug, Clone)]
pub struct CreatureRecord {
    pub id: i64,
    pub name: String,
    pub species: String,
    pub exp: i64,
    pub level: i32,
    pub fainted: bool,
    pub shiny: bool,
    pub held_item: String,
    pub original_trainer: String,
    pub date_caught: String,
    pub moves: [String; MOVE_SLOTS],
    pub health: i32,
    pub evs: [i32; 6],
    pub ivs: [i32; 6],
    pub pp: [i32; MOVE_SLOTS],
    pub max_pp: [i32; MOVE_SLOTS],
    pub pp_ups: [i32; MOVE_SLOTS],
}

/// Per-slot (pp, max pp, pp-up count); empty slots write zeros.
fn move_counters(c: &Creature) -> [(i32, i32, i32); MOVE_SLOTS] {
    std::array::from_fn(|i| {
        c.moves[i]
            .as_ref()
            .map(|m| (m.pp, m.max_pp, m.pp_ups))
            .unwrap_or((0, 0, 0))
    })
}

/// Repository for the creature table.
pub struct CreatureRepo<'a> {
    conn: &'a Connection,
}

impl<'a> CreatureRepo<'a> {
    pub(crate) fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Insert the identity fields of a new creature and return the id the
    /// store assigned, read back by original trainer and capture time.
    pub fn insert(&self, c: &Creature) -> Result<i64, PlayerDbError> {
        self.conn.execute(
            "INSERT INTO creatures
                (name, species, exp, base_exp, exp_type, is_fainted, level, happiness,
                 gender, nature, ability, held_item, is_shiny, original_trainer, date_caught)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
            rusqlite::params![
                c.name,
                c.species,
                c.exp,
                c.base_exp,
                c.exp_curve.as_str(),
                bool_text(c.fainted),
                c.level,
                c.happiness,
                c.gender,
                c.nature,
                c.ability,
                c.held_item,
                bool_text(c.shiny),
                c.original_trainer,
                c.date_caught,
            ],
        )?;
        self.find_by_origin(&c.original_trainer, &c.date_caught)
    }

    /// Look up a creature id by original trainer and capture time.
    ///
    /// The pair is not unique. When several rows match, the newest row is
    /// returned and the collision is logged.
    pub fn find_by_origin(&self, trainer: &str, date_caught: &str) -> Result<i64, PlayerDbError> {
        let mut stmt = self.conn.prepare(
            "SELECT id FROM creatures WHERE original_trainer = ?1 AND date_caught = ?2 ORDER BY id DESC",
        )?;
        let ids = stmt
            .query_map(rusqlite::params![trainer, date_caught], |row| row.get::<_, i64>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        match ids.as_slice() {
            [] => Err(PlayerDbError::Database(rusqlite::Error::QueryReturnedNoRows)),
            [id] => Ok(*id),
            [newest, ..] => {
                tracing::warn!(
                    trainer,
                    date_caught,
                    matches = ids.len(),
                    chosen = newest,
                    "creature origin key is ambiguous"
                );
                Ok(*newest)
            }
        }
    }

    /// Overwrite the identity fields of an existing creature.
    pub fn update_profile(&self, id: i64, c: &Creature) -> Result<(), PlayerDbError> {
        let rows = self.conn.execute(
            "UPDATE creatures SET
                name = ?1, species = ?2, exp = ?3, base_exp = ?4, exp_type = ?5, is_fainted = ?6,
                level = ?7, happiness = ?8, gender = ?9, nature = ?10, ability = ?11,
                held_item = ?12, is_shiny = ?13
             WHERE id = ?14",
            rusqlite::params![
                c.name,
                c.species,
                c.exp,
                c.base_exp,
                c.exp_curve.as_str(),
                bool_text(c.fainted),
                c.level,
                c.happiness,
                c.gender,
                c.nature,
                c.ability,
                c.held_item,
                bool_text(c.shiny),
                id,
            ],
        )?;
        Self::expect_row(rows, id)
    }

    /// Moves, current health, battle stats and effort values.
    pub fn update_moves_and_stats(&self, id: i64, c: &Creature) -> Result<(), PlayerDbError> {
        let mv = |slot| c.move_name(slot).unwrap_or(ABSENT_MOVE);
        let ev = c.evs.to_array();
        let rows = self.conn.execute(
            "UPDATE creatures SET
                move0 = ?1, move1 = ?2, move2 = ?3, move3 = ?4,
                hp = ?5, atk = ?6, def = ?7, speed = ?8, sp_atk = ?9, sp_def = ?10,
                ev_hp = ?11, ev_atk = ?12, ev_def = ?13, ev_spd = ?14, ev_spatk = ?15, ev_spdef = ?16
             WHERE id = ?17",
            rusqlite::params![
                mv(0),
                mv(1),
                mv(2),
                mv(3),
                c.health,
                c.stats.attack,
                c.stats.defense,
                c.stats.speed,
                c.stats.special_attack,
                c.stats.special_defense,
                ev[0],
                ev[1],
                ev[2],
                ev[3],
                ev[4],
                ev[5],
                id,
            ],
        )?;
        Self::expect_row(rows, id)
    }

    /// Potential values and per-move use counters.
    pub fn update_potentials_and_pp(&self, id: i64, c: &Creature) -> Result<(), PlayerDbError> {
        let iv = c.ivs.to_array();
        let m = move_counters(c);
        let rows = self.conn.execute(
            "UPDATE creatures SET
                iv_hp = ?1, iv_atk = ?2, iv_def = ?3, iv_spd = ?4, iv_spatk = ?5, iv_spdef = ?6,
                pp0 = ?7, pp1 = ?8, pp2 = ?9, pp3 = ?10,
                max_pp0 = ?11, max_pp1 = ?12, max_pp2 = ?13, max_pp3 = ?14,
                pp_up0 = ?15, pp_up1 = ?16, pp_up2 = ?17, pp_up3 = ?18
             WHERE id = ?19",
            rusqlite::params![
                iv[0], iv[1], iv[2], iv[3], iv[4], iv[5],
                m[0].0, m[1].0, m[2].0, m[3].0,
                m[0].1, m[1].1, m[2].1, m[3].1,
                m[0].2, m[1].2, m[2].2, m[3].2,
                id,
            ],
        )?;
        Self::expect_row(rows, id)
    }

    fn expect_row(rows: usize, id: i64) -> Result<(), PlayerDbError> {
        if rows == 0 {
            return Err(PlayerDbError::RowMissing {
                table: "creatures",
                id,
            });
        }
        Ok(())
    }

    pub fn count(&self) -> Result<i64, PlayerDbError> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM creatures", [], |row| row.get(0))?)
    }

    pub fn load(&self, id: i64) -> Result<CreatureRecord, PlayerDbError> {
        self.conn
            .query_row(
                "SELECT id, name, species, exp, level, is_fainted, is_shiny, held_item,
                        original_trainer, date_caught,
                        move0, move1, move2, move3, hp,
                        ev_hp, ev_atk, ev_def, ev_spd, ev_spatk, ev_spdef,
                        iv_hp, iv_atk, iv_def, iv_spd, iv_spatk, iv_spdef,
                        pp0, pp1, pp2, pp3, max_pp0, max_pp1, max_pp2, max_pp3,
                        pp_up0, pp_up1, pp_up2, pp_up3
                 FROM creatures WHERE id = ?1",
                rusqlite::params![id],
                |row| {
                    let fainted: String = row.get(5)?;
                    let shiny: String = row.get(6)?;
                    Ok(CreatureRecord {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        species: row.get(2)?,
                        exp: row.get(3)?,
                        level: row.get(4)?,
                        fainted: fainted == "true",
                        shiny: shiny == "true",
                        held_item: row.get(7)?,
                        original_trainer: row.get(8)?,
                        date_caught: row.get(9)?,
                        moves: [row.get(10)?, row.get(11)?, row.get(12)?, row.get(13)?],
                        health: row.get(14)?,
                        evs: [row.get(15)?, row.get(16)?, row.get(17)?, row.get(18)?, row.get(19)?, row.get(20)?],
                        ivs: [row.get(21)?, row.get(22)?, row.get(23)?, row.get(24)?, row.get(25)?, row.get(26)?],
                        pp: [row.get(27)?, row.get(28)?, row.get(29)?, row.get(30)?],
                        max_pp: [row.get(31)?, row.get(32)?, row.get(33)?, row.get(34)?],
                        pp_ups: [row.get(35)?, row.get(36)?, row.get(37)?, row.get(38)?],
                    })
                },
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => PlayerDbError::RowMissing {
                    table: "creatures",
                    id,
                },
                other => other.into(),
            })
    }
}
