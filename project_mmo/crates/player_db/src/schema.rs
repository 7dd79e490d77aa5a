use player_state::{BADGE_COUNT, BAG_SLOTS, BOX_SLOTS, MOVE_SLOTS, PARTY_SIZE};
use rusqlite::Connection;

use crate::error::PlayerDbError;

/// Stored in party and box columns for an empty slot.
pub const UNSAVED_ID: i64 = -1;

/// Stored in a move column when the slot holds no move.
pub const ABSENT_MOVE: &str = "null";

/// `prefix0, prefix1, ...`
pub(crate) fn numbered_columns(prefix: &str, count: usize) -> Vec<String> {
    (0..count).map(|i| format!("{}{}", prefix, i)).collect()
}

fn column_decls(prefix: &str, count: usize, decl: &str) -> String {
    numbered_columns(prefix, count)
        .into_iter()
        .map(|c| format!("{} {}", c, decl))
        .collect::<Vec<_>>()
        .join(",\n            ")
}

pub(crate) fn bool_text(b: bool) -> &'static str {
    if b {
        "true"
    } else {
        "false"
    }
}

pub fn create_tables(conn: &Connection) -> Result<(), PlayerDbError> {
    let no_badges = "0".repeat(BADGE_COUNT);
    let unsaved_default = format!("INTEGER NOT NULL DEFAULT {}", UNSAVED_ID);

    let bag_columns = (0..BAG_SLOTS)
        .map(|i| format!("item{i} INTEGER NOT NULL DEFAULT 0,\n            quantity{i} INTEGER NOT NULL DEFAULT 0"))
        .collect::<Vec<_>>()
        .join(",\n            ");

    conn.execute_batch(&format!(
        "
        CREATE TABLE IF NOT EXISTS bags (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            {bag_columns}
        );

        CREATE TABLE IF NOT EXISTS members (
            id                INTEGER PRIMARY KEY AUTOINCREMENT,
            username          TEXT NOT NULL UNIQUE COLLATE NOCASE,
            last_login_time   INTEGER NOT NULL DEFAULT 0,
            last_login_server TEXT,
            bag_id            INTEGER NOT NULL REFERENCES bags(id),
            sprite            INTEGER NOT NULL DEFAULT 0,
            money             INTEGER NOT NULL DEFAULT 0,
            npc_mul           TEXT NOT NULL DEFAULT '1.0',
            sk_herb           INTEGER NOT NULL DEFAULT 0,
            sk_craft          INTEGER NOT NULL DEFAULT 0,
            sk_fish           INTEGER NOT NULL DEFAULT 0,
            sk_train          INTEGER NOT NULL DEFAULT 0,
            sk_coord          INTEGER NOT NULL DEFAULT 0,
            sk_breed          INTEGER NOT NULL DEFAULT 0,
            x                 INTEGER NOT NULL DEFAULT 0,
            y                 INTEGER NOT NULL DEFAULT 0,
            map_x             INTEGER NOT NULL DEFAULT 0,
            map_y             INTEGER NOT NULL DEFAULT 0,
            heal_x            INTEGER NOT NULL DEFAULT 0,
            heal_y            INTEGER NOT NULL DEFAULT 0,
            heal_map_x        INTEGER NOT NULL DEFAULT 0,
            heal_map_y        INTEGER NOT NULL DEFAULT 0,
            is_surfing        TEXT NOT NULL DEFAULT 'false',
            badges            TEXT NOT NULL DEFAULT '{no_badges}'
        );

        CREATE TABLE IF NOT EXISTS parties (
            member INTEGER PRIMARY KEY REFERENCES members(id),
            {party_columns}
        );

        CREATE TABLE IF NOT EXISTS boxes (
            id     INTEGER PRIMARY KEY AUTOINCREMENT,
            member INTEGER NOT NULL REFERENCES members(id),
            {box_columns}
        );

        CREATE TABLE IF NOT EXISTS creatures (
            id               INTEGER PRIMARY KEY AUTOINCREMENT,
            name             TEXT NOT NULL,
            species          TEXT NOT NULL,
            exp              INTEGER NOT NULL DEFAULT 0,
            base_exp         INTEGER NOT NULL DEFAULT 0,
            exp_type         TEXT NOT NULL,
            is_fainted       TEXT NOT NULL DEFAULT 'false',
            level            INTEGER NOT NULL DEFAULT 1,
            happiness        INTEGER NOT NULL DEFAULT 0,
            gender           INTEGER NOT NULL DEFAULT 0,
            nature           TEXT NOT NULL DEFAULT '',
            ability          TEXT NOT NULL DEFAULT '',
            held_item        TEXT NOT NULL DEFAULT '',
            is_shiny         TEXT NOT NULL DEFAULT 'false',
            original_trainer TEXT NOT NULL,
            date_caught      TEXT NOT NULL,
            {move_columns},
            hp      INTEGER NOT NULL DEFAULT 0,
            atk     INTEGER NOT NULL DEFAULT 0,
            def     INTEGER NOT NULL DEFAULT 0,
            speed   INTEGER NOT NULL DEFAULT 0,
            sp_atk  INTEGER NOT NULL DEFAULT 0,
            sp_def  INTEGER NOT NULL DEFAULT 0,
            ev_hp    INTEGER NOT NULL DEFAULT 0,
            ev_atk   INTEGER NOT NULL DEFAULT 0,
            ev_def   INTEGER NOT NULL DEFAULT 0,
            ev_spd   INTEGER NOT NULL DEFAULT 0,
            ev_spatk INTEGER NOT NULL DEFAULT 0,
            ev_spdef INTEGER NOT NULL DEFAULT 0,
            iv_hp    INTEGER NOT NULL DEFAULT 0,
            iv_atk   INTEGER NOT NULL DEFAULT 0,
            iv_def   INTEGER NOT NULL DEFAULT 0,
            iv_spd   INTEGER NOT NULL DEFAULT 0,
            iv_spatk INTEGER NOT NULL DEFAULT 0,
            iv_spdef INTEGER NOT NULL DEFAULT 0,
            {pp_columns},
            {max_pp_columns},
            {pp_up_columns}
        );

        CREATE INDEX IF NOT EXISTS idx_creatures_origin
            ON creatures (original_trainer, date_caught);
        CREATE INDEX IF NOT EXISTS idx_boxes_member ON boxes (member);
        ",
        party_columns = column_decls("creature", PARTY_SIZE, &unsaved_default),
        box_columns = column_decls("creature", BOX_SLOTS, &unsaved_default),
        move_columns = column_decls("move", MOVE_SLOTS, &format!("TEXT NOT NULL DEFAULT '{}'", ABSENT_MOVE)),
        pp_columns = column_decls("pp", MOVE_SLOTS, "INTEGER NOT NULL DEFAULT 0"),
        max_pp_columns = column_decls("max_pp", MOVE_SLOTS, "INTEGER NOT NULL DEFAULT 0"),
        pp_up_columns = column_decls("pp_up", MOVE_SLOTS, "INTEGER NOT NULL DEFAULT 0"),
    ))?;
    Ok(())
}
