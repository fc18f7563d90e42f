/// Battle configuration constants and tunable house rules.
///
/// All runtime-tunable values travel with [`BattleSetup`](crate::state::BattleSetup)
/// so that every participant simulates under identical rules. Nothing here is
/// read from process-wide state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BattleConfig {
    /// Battle ends in a draw once this round number completes.
    pub max_rounds: i8,

    /// Rounds a long disable (paralyze, petrify, fear) persists after the
    /// round it was applied.
    pub disable_duration: i8,

    /// Rounds a long damage-over-time effect (poison, frostbite, blister)
    /// persists after the round it was applied.
    pub dot_duration: i8,
}

impl BattleConfig {
    // ===== compile-time constants used as type parameters =====
    /// Maximum unit records tracked per battle: 12 live slots plus headroom
    /// for summons over dead bodies, minus two because each side's last slot
    /// must hold a living unit or the battle is already over.
    pub const MAX_UNITS: usize = 22;
    /// Turn queue entries per round: 12 units plus one reserved slot.
    pub const MAX_TURN_ENTRIES: usize = 13;
    /// Slots per side's group.
    pub const MAX_GROUP_SLOTS: usize = 6;
    /// Modifier relation capacity per direction per unit.
    pub const MAX_MODIFIERS: usize = 8;
    /// Items a leader may consume during one battle.
    pub const MAX_USED_ITEMS: usize = 4;
    /// Lines in a group's slot geometry (two columns of three).
    pub const GROUP_LINES: u8 = 3;
    /// Slot leaders occupy while dueling, so they face each other.
    pub const DUEL_SLOT: u8 = 2;

    // ===== runtime-tunable defaults =====
    pub const DEFAULT_MAX_ROUNDS: i8 = 50;
    pub const DEFAULT_DISABLE_DURATION: i8 = 3;
    pub const DEFAULT_DOT_DURATION: i8 = 2;

    pub fn new() -> Self {
        Self {
            max_rounds: Self::DEFAULT_MAX_ROUNDS,
            disable_duration: Self::DEFAULT_DISABLE_DURATION,
            dot_duration: Self::DEFAULT_DOT_DURATION,
        }
    }

    pub fn with_max_rounds(max_rounds: i8) -> Self {
        Self {
            max_rounds,
            ..Self::new()
        }
    }
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self::new()
    }
}
