use std::fmt;
use std::sync::Arc;

use session::{SessionBound, SessionId, SessionLink};
use space::{MapCoord, WorldMap};

use crate::containers::{Bag, Party, StorageBox, BOX_COUNT};

pub const BADGE_COUNT: usize = 42;

/// Stored width of the NPC difficulty multiplier text.
pub const NPC_MULTIPLIER_WIDTH: usize = 20;

/// Earned badges, one flag per badge in slot order.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Badges([bool; BADGE_COUNT]);

impl Default for Badges {
    fn default() -> Self {
        Self([false; BADGE_COUNT])
    }
}

impl fmt::Debug for Badges {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Badges({})", self.encode())
    }
}

impl Badges {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_indices(indices: &[usize]) -> Self {
        let mut badges = Self::new();
        for &i in indices {
            badges.set(i, true);
        }
        badges
    }

    /// Returns false if `index` is out of range.
    pub fn set(&mut self, index: usize, earned: bool) -> bool {
        match self.0.get_mut(index) {
            Some(flag) => {
                *flag = earned;
                true
            }
            None => false,
        }
    }

    pub fn has(&self, index: usize) -> bool {
        self.0.get(index).copied().unwrap_or(false)
    }

    pub fn count(&self) -> usize {
        self.0.iter().filter(|&&b| b).count()
    }

    /// 42 characters, '1' for earned and '0' otherwise.
    pub fn encode(&self) -> String {
        self.0.iter().map(|&b| if b { '1' } else { '0' }).collect()
    }

    /// Inverse of [`Badges::encode`]. Characters past the 42nd are ignored;
    /// anything other than '1' reads as not earned.
    pub fn decode(s: &str) -> Self {
        let mut badges = Self::new();
        for (i, c) in s.chars().take(BADGE_COUNT).enumerate() {
            badges.0[i] = c == '1';
        }
        badges
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SkillExperience {
    pub herbalism: i64,
    pub crafting: i64,
    pub fishing: i64,
    pub training: i64,
    pub coordinating: i64,
    pub breeding: i64,
}

/// A tile on a specific map.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Location {
    pub x: i32,
    pub y: i32,
    pub map: MapCoord,
}

impl Location {
    pub fn new(x: i32, y: i32, map: MapCoord) -> Self {
        Self { x, y, map }
    }
}

/// Everything about one logged-in player that is persisted on logout.
pub struct PlayerAggregate {
    session_id: SessionId,
    pub account_id: i64,
    pub username: String,
    /// Login timestamp written to storage at login; compared on save.
    pub session_token: i64,
    pub position: Location,
    pub heal_point: Location,
    pub badges: Badges,
    pub skills: SkillExperience,
    pub money: i64,
    pub npc_multiplier: f64,
    pub surfing: bool,
    pub sprite: i32,
    pub party: Party,
    pub bag: Option<Bag>,
    pub boxes: [Option<StorageBox>; BOX_COUNT],
    session: Option<Arc<dyn SessionLink>>,
    map: Option<Arc<dyn WorldMap>>,
}

impl fmt::Debug for PlayerAggregate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlayerAggregate")
            .field("session_id", &self.session_id)
            .field("account_id", &self.account_id)
            .field("username", &self.username)
            .field("session_token", &self.session_token)
            .field("party", &self.party.len())
            .field("on_map", &self.map.as_ref().map(|m| m.coord()))
            .finish_non_exhaustive()
    }
}

impl PlayerAggregate {
    pub fn new(session_id: SessionId, account_id: i64, username: impl Into<String>, session_token: i64) -> Self {
        Self {
            session_id,
            account_id,
            username: username.into(),
            session_token,
            position: Location::default(),
            heal_point: Location::default(),
            badges: Badges::new(),
            skills: SkillExperience::default(),
            money: 0,
            npc_multiplier: 1.0,
            surfing: false,
            sprite: 0,
            party: Party::new(),
            bag: None,
            boxes: Default::default(),
            session: None,
            map: None,
        }
    }

    pub fn with_session(mut self, link: Arc<dyn SessionLink>) -> Self {
        self.session = Some(link);
        self
    }

    pub fn attach_map(&mut self, map: Arc<dyn WorldMap>) {
        self.map = Some(map);
    }

    pub fn map(&self) -> Option<&Arc<dyn WorldMap>> {
        self.map.as_ref()
    }

    /// Take the player off its current map. Returns true if it was attached.
    pub fn detach_from_map(&mut self) -> bool {
        match self.map.take() {
            Some(map) => {
                map.remove_char(&self.username);
                true
            }
            None => false,
        }
    }

    /// Close the network session if it is still open.
    pub fn close_session(&self) {
        if let Some(link) = &self.session {
            if link.is_connected() {
                link.close();
            }
        }
    }

    /// NPC multiplier as stored: decimal text with at least one fractional
    /// digit (`1.0`, not `1`), cut to 20 characters.
    pub fn npc_multiplier_text(&self) -> String {
        let mut text = self.npc_multiplier.to_string();
        if self.npc_multiplier.is_finite() && !text.contains('.') {
            text.push_str(".0");
        }
        text.chars().take(NPC_MULTIPLIER_WIDTH).collect()
    }

    /// Drop the party, bag and boxes once their state has been stored.
    pub fn dispose(&mut self) {
        self.party = Party::new();
        self.bag = None;
        self.boxes = Default::default();
    }
}

impl SessionBound for PlayerAggregate {
    fn session_id(&self) -> SessionId {
        self.session_id
    }

    fn username(&self) -> &str {
        &self.username
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::creature::Creature;
    use space::MapGrid;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[test]
    fn badge_encoding_marks_earned_slots() {
        let badges = Badges::from_indices(&[0, 5, 41]);
        let encoded = badges.encode();
        assert_eq!(encoded.len(), BADGE_COUNT);
        assert_eq!(encoded.matches('1').count(), 3);
        for (i, c) in encoded.chars().enumerate() {
            let expected = if [0, 5, 41].contains(&i) { '1' } else { '0' };
            assert_eq!(c, expected, "slot {}", i);
        }
    }

    #[test]
    fn badge_decode_inverts_encode() {
        let badges = Badges::from_indices(&[1, 2, 40]);
        assert_eq!(Badges::decode(&badges.encode()), badges);
        assert_eq!(Badges::decode("1").count(), 1);
    }

    #[test]
    fn badge_out_of_range_ignored() {
        let mut badges = Badges::new();
        assert!(!badges.set(BADGE_COUNT, true));
        assert!(!badges.has(BADGE_COUNT));
        assert_eq!(badges.count(), 0);
    }

    #[test]
    fn npc_multiplier_keeps_fraction() {
        let mut player = PlayerAggregate::new(SessionId(1), 1, "Ash", 100);
        assert_eq!(player.npc_multiplier_text(), "1.0");
        player.npc_multiplier = 2.0;
        assert_eq!(player.npc_multiplier_text(), "2.0");
        player.npc_multiplier = -3.0;
        assert_eq!(player.npc_multiplier_text(), "-3.0");
    }

    #[test]
    fn npc_multiplier_truncated() {
        let mut player = PlayerAggregate::new(SessionId(1), 1, "Ash", 100);
        player.npc_multiplier = 1.5;
        assert_eq!(player.npc_multiplier_text(), "1.5");

        player.npc_multiplier = 0.000012345678901234567;
        let text = player.npc_multiplier_text();
        assert_eq!(text.len(), NPC_MULTIPLIER_WIDTH);
        assert!(text.starts_with("0.0000123456"));
    }

    #[test]
    fn detach_removes_from_map() {
        let mut grid = MapGrid::new();
        grid.register_map(MapCoord::new(0, 0));
        let map = grid.place(MapCoord::new(0, 0), "Ash").unwrap();

        let mut player = PlayerAggregate::new(SessionId(1), 1, "Ash", 100);
        player.attach_map(map.clone());
        assert!(player.detach_from_map());
        assert!(!map.has_char("Ash"));
        assert!(player.map().is_none());
        assert!(!player.detach_from_map());
    }

    struct FlagSession {
        open: AtomicBool,
    }

    impl SessionLink for FlagSession {
        fn is_connected(&self) -> bool {
            self.open.load(Ordering::SeqCst)
        }
        fn close(&self) {
            self.open.store(false, Ordering::SeqCst);
        }
    }

    #[test]
    fn close_session_closes_open_link() {
        let link = Arc::new(FlagSession {
            open: AtomicBool::new(true),
        });
        let player = PlayerAggregate::new(SessionId(1), 1, "Ash", 100).with_session(link.clone());
        player.close_session();
        assert!(!link.is_connected());
    }

    #[test]
    fn dispose_releases_children() {
        let mut player = PlayerAggregate::new(SessionId(1), 1, "Ash", 100);
        player.party.set(0, Creature::caught("Pikachu", "Ash", "t")).unwrap();
        player.bag = Some(Bag::new(4));
        player.boxes[0] = Some(StorageBox::new());
        player.dispose();
        assert!(player.party.is_empty());
        assert!(player.bag.is_none());
        assert!(player.boxes.iter().all(Option::is_none));
    }
}
