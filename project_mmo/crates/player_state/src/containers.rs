use crate::creature::Creature;

pub const PARTY_SIZE: usize = 6;
pub const BAG_SLOTS: usize = 30;
pub const BOX_COUNT: usize = 9;
pub const BOX_SLOTS: usize = 31;

/// The six creatures a player carries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Party {
    slots: [Option<Creature>; PARTY_SIZE],
}

impl Party {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, slot: usize) -> Option<&Creature> {
        self.slots.get(slot)?.as_ref()
    }

    pub fn get_mut(&mut self, slot: usize) -> Option<&mut Creature> {
        self.slots.get_mut(slot)?.as_mut()
    }

    /// Put a creature in a slot, returning what was there. Out-of-range
    /// slots hand the creature back.
    pub fn set(&mut self, slot: usize, creature: Creature) -> Result<Option<Creature>, Creature> {
        match self.slots.get_mut(slot) {
            Some(s) => Ok(s.replace(creature)),
            None => Err(creature),
        }
    }

    pub fn take(&mut self, slot: usize) -> Option<Creature> {
        self.slots.get_mut(slot)?.take()
    }

    pub fn slots(&self) -> &[Option<Creature>; PARTY_SIZE] {
        &self.slots
    }

    pub fn slots_mut(&mut self) -> &mut [Option<Creature>; PARTY_SIZE] {
        &mut self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One stack of items in the bag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BagItem {
    pub item: i32,
    pub quantity: i32,
}

impl BagItem {
    pub fn new(item: i32, quantity: i32) -> Self {
        Self { item, quantity }
    }

    /// Item kind and quantity with negative values raised to zero.
    pub fn clamped(self) -> (i32, i32) {
        (self.item.max(0), self.quantity.max(0))
    }
}

/// The player's inventory. Its storage row exists from registration, so
/// the identifier is always known.
#[derive(Debug, Clone, PartialEq)]
pub struct Bag {
    pub db_id: i64,
    slots: [Option<BagItem>; BAG_SLOTS],
}

impl Bag {
    pub fn new(db_id: i64) -> Self {
        Self {
            db_id,
            slots: [None; BAG_SLOTS],
        }
    }

    pub fn get(&self, slot: usize) -> Option<BagItem> {
        self.slots.get(slot).copied().flatten()
    }

    /// Returns false if the slot is out of range.
    pub fn set(&mut self, slot: usize, item: Option<BagItem>) -> bool {
        match self.slots.get_mut(slot) {
            Some(s) => {
                *s = item;
                true
            }
            None => false,
        }
    }

    /// Occupied slots with their index.
    pub fn occupied(&self) -> impl Iterator<Item = (usize, BagItem)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.map(|item| (i, item)))
    }
}

/// A PC storage box.
#[derive(Debug, Clone, PartialEq)]
pub struct StorageBox {
    /// Storage identifier; None until the box row is first inserted.
    pub db_id: Option<i64>,
    slots: [Option<Creature>; BOX_SLOTS],
}

impl Default for StorageBox {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageBox {
    pub fn new() -> Self {
        Self {
            db_id: None,
            slots: std::array::from_fn(|_| None),
        }
    }

    pub fn get(&self, slot: usize) -> Option<&Creature> {
        self.slots.get(slot)?.as_ref()
    }

    pub fn set(&mut self, slot: usize, creature: Creature) -> Result<Option<Creature>, Creature> {
        match self.slots.get_mut(slot) {
            Some(s) => Ok(s.replace(creature)),
            None => Err(creature),
        }
    }

    pub fn slots(&self) -> &[Option<Creature>; BOX_SLOTS] {
        &self.slots
    }

    pub fn slots_mut(&mut self) -> &mut [Option<Creature>; BOX_SLOTS] {
        &mut self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
