use persistence::{PersistenceError, SaveAttempt, SaveOutcome};
use player_state::{Creature, PlayerAggregate, BOX_SLOTS, PARTY_SIZE};

use crate::creature::CreatureRepo;
use crate::db::{DatabaseConfig, PlayerDb};
use crate::error::PlayerDbError;
use crate::schema::UNSAVED_ID;

/// Saves logged-out players, opening a fresh connection per attempt.
#[derive(Debug, Clone)]
pub struct PlayerSaver {
    config: DatabaseConfig,
}

impl PlayerSaver {
    pub fn new(config: DatabaseConfig) -> Self {
        Self { config }
    }
}

impl SaveAttempt<PlayerAggregate> for PlayerSaver {
    fn attempt(&mut self, player: &mut PlayerAggregate) -> Result<SaveOutcome, PersistenceError> {
        let db = PlayerDb::connect(&self.config)?;
        let outcome = save_player(&db, player)?;
        if let Err(e) = db.close() {
            tracing::warn!(username = %player.username, error = %e, "closing player store failed");
        }
        player.close_session();
        Ok(outcome)
    }
}

/// Persist a player unless a newer session already owns the account.
///
/// Writes go in dependency order: profile, party creatures, party row,
/// bag, boxes. Nothing runs in a transaction; on error the writes made so
/// far stay and a retry starts again from the profile. Every step
/// overwrites by id, so repeating it is harmless.
pub fn save_player(db: &PlayerDb, player: &mut PlayerAggregate) -> Result<SaveOutcome, PlayerDbError> {
    let stored_token = db.members().session_token(player.account_id)?;
    if stored_token != player.session_token {
        tracing::info!(
            username = %player.username,
            stored_token,
            session_token = player.session_token,
            "account claimed by a newer session, skipping save"
        );
        return Ok(SaveOutcome::Stale);
    }

    db.members().update_profile(player)?;
    save_party(db, player)?;
    save_bag(db, player)?;
    save_boxes(db, player)?;
    db.members().mark_logged_out(player.account_id)?;

    player.detach_from_map();
    player.dispose();
    Ok(SaveOutcome::Saved)
}

/// Insert or update one creature and return its id. A new creature gets
/// its id as soon as the insert lands, so a retry after a later failure
/// updates instead of inserting again.
fn save_creature(creatures: &CreatureRepo<'_>, c: &mut Creature) -> Result<i64, PlayerDbError> {
    let id = match c.db_id {
        Some(id) => {
            creatures.update_profile(id, c)?;
            id
        }
        None => {
            let id = creatures.insert(c)?;
            c.db_id = Some(id);
            id
        }
    };
    creatures.update_moves_and_stats(id, c)?;
    creatures.update_potentials_and_pp(id, c)?;
    Ok(id)
}

fn slot_id(slot: &Option<Creature>) -> i64 {
    slot.as_ref().and_then(|c| c.db_id).unwrap_or(UNSAVED_ID)
}

fn save_party(db: &PlayerDb, player: &mut PlayerAggregate) -> Result<(), PlayerDbError> {
    let creatures = db.creatures();
    for c in player.party.slots_mut().iter_mut().flatten() {
        save_creature(&creatures, c)?;
    }

    let slots = player.party.slots();
    let ids: [i64; PARTY_SIZE] = std::array::from_fn(|i| slot_id(&slots[i]));
    db.parties().update(player.account_id, &ids)
}

fn save_bag(db: &PlayerDb, player: &PlayerAggregate) -> Result<(), PlayerDbError> {
    let bag = player
        .bag
        .as_ref()
        .ok_or(PlayerDbError::MissingBag(player.account_id))?;
    let bags = db.bags();
    for (slot, stack) in bag.occupied() {
        let (item, quantity) = stack.clamped();
        bags.update_slot(bag.db_id, slot, item, quantity)?;
    }
    Ok(())
}

fn save_boxes(db: &PlayerDb, player: &mut PlayerAggregate) -> Result<(), PlayerDbError> {
    let member = player.account_id;
    let creatures = db.creatures();
    let boxes = db.boxes();

    for storage in player.boxes.iter_mut().flatten() {
        let box_id = match storage.db_id {
            Some(id) => id,
            None => {
                let id = boxes.insert_empty(member)?;
                storage.db_id = Some(id);
                id
            }
        };

        for c in storage.slots_mut().iter_mut().flatten() {
            save_creature(&creatures, c)?;
        }

        let slots = storage.slots();
        let ids: [i64; BOX_SLOTS] = std::array::from_fn(|i| slot_id(&slots[i]));
        boxes.update(box_id, &ids)?;
    }
    Ok(())
}
