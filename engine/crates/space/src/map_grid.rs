use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, PoisonError};

use crate::model::{MapCoord, MapError, MovementRoster, WorldMap};

/// A single map and the players standing on it.
#[derive(Debug)]
pub struct ServerMap {
    coord: MapCoord,
    occupants: Mutex<BTreeSet<String>>,
}

impl ServerMap {
    pub fn new(coord: MapCoord) -> Self {
        Self {
            coord,
            occupants: Mutex::new(BTreeSet::new()),
        }
    }

    pub fn add_char(&self, username: &str) -> Result<(), MapError> {
        let mut occupants = self.occupants.lock().unwrap_or_else(PoisonError::into_inner);
        if !occupants.insert(username.to_lowercase()) {
            return Err(MapError::AlreadyPlaced {
                username: username.to_string(),
                map: self.coord,
            });
        }
        Ok(())
    }

    pub fn has_char(&self, username: &str) -> bool {
        self.occupants
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&username.to_lowercase())
    }

    pub fn occupant_count(&self) -> usize {
        self.occupants.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl WorldMap for ServerMap {
    fn coord(&self) -> MapCoord {
        self.coord
    }

    fn remove_char(&self, username: &str) -> bool {
        self.occupants
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&username.to_lowercase())
    }
}

/// All maps of the world, keyed by grid coordinate.
#[derive(Debug, Default)]
pub struct MapGrid {
    maps: BTreeMap<MapCoord, Arc<ServerMap>>,
}

impl MapGrid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a map, returning the shared handle.
    pub fn register_map(&mut self, coord: MapCoord) -> Arc<ServerMap> {
        self.maps
            .entry(coord)
            .or_insert_with(|| Arc::new(ServerMap::new(coord)))
            .clone()
    }

    pub fn map(&self, coord: MapCoord) -> Result<Arc<ServerMap>, MapError> {
        self.maps
            .get(&coord)
            .cloned()
            .ok_or(MapError::MapNotFound(coord))
    }

    pub fn map_count(&self) -> usize {
        self.maps.len()
    }

    /// Place a player on a map and return the map handle the player should
    /// keep while attached.
    pub fn place(&self, coord: MapCoord, username: &str) -> Result<Arc<ServerMap>, MapError> {
        let map = self.map(coord)?;
        map.add_char(username)?;
        Ok(map)
    }
}

/// Tracks the players the movement subsystem is currently stepping.
#[derive(Debug, Default)]
pub struct MovementService {
    players: Mutex<BTreeSet<String>>,
}

impl MovementService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_player(&self, username: &str) {
        self.players
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(username.to_lowercase());
    }

    pub fn is_tracking(&self, username: &str) -> bool {
        self.players
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&username.to_lowercase())
    }

    pub fn player_count(&self) -> usize {
        self.players.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl MovementRoster for MovementService {
    fn remove_player(&self, username: &str) -> bool {
        let removed = self
            .players
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&username.to_lowercase());
        if !removed {
            tracing::debug!(username, "movement service was not tracking player");
        }
        removed
    }
}
