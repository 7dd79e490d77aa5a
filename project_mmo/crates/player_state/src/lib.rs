pub mod containers;
pub mod creature;
pub mod player;

pub use containers::{Bag, BagItem, Party, StorageBox, BAG_SLOTS, BOX_COUNT, BOX_SLOTS, PARTY_SIZE};
pub use creature::{Creature, ExpCurve, MoveSlot, StatSpread, Stats, MOVE_SLOTS};
pub use player::{Badges, Location, PlayerAggregate, SkillExperience, BADGE_COUNT, NPC_MULTIPLIER_WIDTH};
