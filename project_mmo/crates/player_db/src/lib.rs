pub mod containers;
pub mod creature;
pub mod db;
pub mod error;
pub mod member;
pub mod save;
mod schema;

pub use containers::{BagRepo, BoxRecord, BoxRepo, PartyRepo};
pub use creature::{CreatureRecord, CreatureRepo};
pub use db::{DatabaseConfig, PlayerDb};
pub use error::PlayerDbError;
pub use member::{MemberRecord, MemberRepo};
pub use save::{save_player, PlayerSaver};
pub use schema::{ABSENT_MOVE, UNSAVED_ID};
