use std::fmt;

#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("map {0} does not exist")]
    MapNotFound(MapCoord),

    #[error("player {username} already on map {map}")]
    AlreadyPlaced { username: String, map: MapCoord },
}

/// Identifies one map of the world grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct MapCoord {
    pub x: i32,
    pub y: i32,
}

impl MapCoord {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for MapCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A map container players can stand on.
pub trait WorldMap: Send + Sync {
    fn coord(&self) -> MapCoord;

    /// Take a player off this map. Returns false if the player was not on it.
    fn remove_char(&self, username: &str) -> bool;
}

/// The movement subsystem's view of which players it is simulating.
pub trait MovementRoster: Send + Sync {
    /// Stop tracking a player. Returns false if the player was not tracked.
    fn remove_player(&self, username: &str) -> bool;
}
