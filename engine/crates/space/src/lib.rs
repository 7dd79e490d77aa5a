pub mod map_grid;
pub mod model;

pub use map_grid::{MapGrid, MovementService, ServerMap};
pub use model::{MapCoord, MapError, MovementRoster, WorldMap};
