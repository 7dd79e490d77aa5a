pub const MOVE_SLOTS: usize = 4;

/// Experience growth curve of a species.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpCurve {
    Medium,
    Erratic,
    Fluctuating,
    Parabolic,
    Fast,
    Slow,
}

impl ExpCurve {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Medium => "MEDIUM",
            Self::Erratic => "ERRATIC",
            Self::Fluctuating => "FLUCTUATING",
            Self::Parabolic => "PARABOLIC",
            Self::Fast => "FAST",
            Self::Slow => "SLOW",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "MEDIUM" => Some(Self::Medium),
            "ERRATIC" => Some(Self::Erratic),
            "FLUCTUATING" => Some(Self::Fluctuating),
            "PARABOLIC" => Some(Self::Parabolic),
            "FAST" => Some(Self::Fast),
            "SLOW" => Some(Self::Slow),
            _ => None,
        }
    }
}

/// The five battle stats (health is tracked separately as current HP).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    pub attack: i32,
    pub defense: i32,
    pub speed: i32,
    pub special_attack: i32,
    pub special_defense: i32,
}

/// A value per stat including HP, used for effort and potential values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatSpread {
    pub hp: i32,
    pub attack: i32,
    pub defense: i32,
    pub speed: i32,
    pub special_attack: i32,
    pub special_defense: i32,
}

impl StatSpread {
    /// Values in storage column order: hp, atk, def, spd, spatk, spdef.
    pub fn to_array(self) -> [i32; 6] {
        [
            self.hp,
            self.attack,
            self.defense,
            self.speed,
            self.special_attack,
            self.special_defense,
        ]
    }
}

/// A learned move and its use counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveSlot {
    pub name: String,
    pub pp: i32,
    pub max_pp: i32,
    /// Times a PP-raising item has been applied to this slot.
    pub pp_ups: i32,
}

impl MoveSlot {
    pub fn new(name: impl Into<String>, max_pp: i32) -> Self {
        Self {
            name: name.into(),
            pp: max_pp,
            max_pp,
            pp_ups: 0,
        }
    }
}

/// A creature owned by a player, in the party or in a storage box.
#[derive(Debug, Clone, PartialEq)]
pub struct Creature {
    /// Storage identifier; None until the creature is first inserted.
    pub db_id: Option<i64>,
    pub name: String,
    pub species: String,
    pub exp: i64,
    pub base_exp: i32,
    pub exp_curve: ExpCurve,
    pub fainted: bool,
    pub level: i32,
    pub happiness: i32,
    pub gender: i32,
    pub nature: String,
    pub ability: String,
    pub held_item: String,
    pub shiny: bool,
    pub original_trainer: String,
    /// Capture timestamp, as recorded at capture time.
    pub date_caught: String,
    pub health: i32,
    pub stats: Stats,
    pub evs: StatSpread,
    pub ivs: StatSpread,
    pub moves: [Option<MoveSlot>; MOVE_SLOTS],
}

impl Creature {
    /// A freshly caught creature that has never been stored.
    pub fn caught(
        species: impl Into<String>,
        original_trainer: impl Into<String>,
        date_caught: impl Into<String>,
    ) -> Self {
        let species = species.into();
        Self {
            db_id: None,
            name: species.clone(),
            species,
            exp: 0,
            base_exp: 0,
            exp_curve: ExpCurve::Medium,
            fainted: false,
            level: 1,
            happiness: 70,
            gender: 0,
            nature: String::new(),
            ability: String::new(),
            held_item: String::new(),
            shiny: false,
            original_trainer: original_trainer.into(),
            date_caught: date_caught.into(),
            health: 1,
            stats: Stats::default(),
            evs: StatSpread::default(),
            ivs: StatSpread::default(),
            moves: Default::default(),
        }
    }

    pub fn is_saved(&self) -> bool {
        self.db_id.is_some()
    }

    pub fn move_name(&self, slot: usize) -> Option<&str> {
        self.moves.get(slot)?.as_ref().map(|m| m.name.as_str())
    }
}
