//! Authoritative battle state representation.
//!
//! This module owns the replicated aggregate: unit records, the round turn
//! queue, group/player identity and round bookkeeping. Collaborating layers
//! query this state but mutate it exclusively through the declared operations
//! so the invariants in the crate docs hold on every participant.

pub mod error;
pub mod types;

mod ledger;
mod modifiers;

use arrayvec::ArrayVec;

pub use error::{LedgerError, ModifierError, SlotError};
pub use types::{
    AttackClass, AttackReach, AttackSource, AttackSpec, ClassWards, ExtendedStatusFlags,
    ModifiedUnit, ObjectCategory, ObjectId, RoundPhase, Side, SourceWards, StatusFlags, TurnEntry,
    TurnQueue, UnitRecord,
};

use crate::config::BattleConfig;

/// Initial facts about one unit entering the battle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UnitSetup {
    pub unit: ObjectId,
    pub slot: u8,
    pub hp: i16,
    pub leader: bool,
}

impl UnitSetup {
    pub fn new(unit: ObjectId, slot: u8, hp: i16) -> Self {
        Self {
            unit,
            slot,
            hp,
            leader: false,
        }
    }

    pub fn leader(mut self) -> Self {
        self.leader = true;
        self
    }
}

/// One engaging group: identity plus its original stack membership.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GroupSetup {
    pub group: ObjectId,
    pub player: ObjectId,
    pub units: ArrayVec<UnitSetup, { BattleConfig::MAX_GROUP_SLOTS }>,
}

/// Everything needed to create identical initial state on every participant.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BattleSetup {
    pub attacker: GroupSetup,
    pub defender: GroupSetup,
    /// 1-vs-1 leader duel: leaders swap to the facing slot, everyone else
    /// is hidden for the duration.
    pub duel: bool,
}

/// Canonical replicated battle state.
///
/// Structural equality over this type is the replay-verification comparison:
/// ordering within the bounded lists is significant.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BattleState {
    /// Records for every unit that has participated, dead ones included.
    pub(crate) units: ArrayVec<UnitRecord, { BattleConfig::MAX_UNITS }>,
    /// Remaining turns of the current round.
    pub turn_queue: TurnQueue,

    pub attacker_group: ObjectId,
    pub defender_group: ObjectId,
    pub attacker_player: ObjectId,
    pub defender_player: ObjectId,

    /// Original stack membership, fixed for the battle.
    pub attacker_stack: ArrayVec<ObjectId, { BattleConfig::MAX_GROUP_SLOTS }>,
    pub defender_stack: ArrayVec<ObjectId, { BattleConfig::MAX_GROUP_SLOTS }>,

    /// Items consumed during the battle.
    pub used_items: ArrayVec<ObjectId, { BattleConfig::MAX_USED_ITEMS }>,

    /// Round counting starts from 1; 0 only before the first round begins.
    pub current_round: i8,
    pub phase: RoundPhase,
    pub duel: bool,
    /// Set once the battle reaches `BattleOver`; `None` means a draw when
    /// the phase is terminal, undecided otherwise.
    pub winner: Option<Side>,
}

impl BattleState {
    /// Builds the initial replicated state from the two engaging groups.
    pub fn setup(setup: &BattleSetup) -> Self {
        let mut state = Self {
            units: ArrayVec::new(),
            turn_queue: TurnQueue::new(),
            attacker_group: setup.attacker.group,
            defender_group: setup.defender.group,
            attacker_player: setup.attacker.player,
            defender_player: setup.defender.player,
            attacker_stack: setup.attacker.units.iter().map(|u| u.unit).collect(),
            defender_stack: setup.defender.units.iter().map(|u| u.unit).collect(),
            used_items: ArrayVec::new(),
            current_round: 0,
            phase: RoundPhase::RoundStart,
            duel: setup.duel,
            winner: None,
        };

        for (side, group) in [
            (Side::Attacker, &setup.attacker),
            (Side::Defender, &setup.defender),
        ] {
            for unit_setup in &group.units {
                let mut record =
                    UnitRecord::new(unit_setup.unit, side, unit_setup.slot, unit_setup.hp);
                if setup.duel {
                    if unit_setup.leader {
                        record.slot = BattleConfig::DUEL_SLOT;
                    } else {
                        record.set_status(StatusFlags::HIDDEN, true);
                    }
                }
                state.units.push(record);
            }
        }

        state
    }

    // ========================================================================
    // Read-only queries
    // ========================================================================

    pub fn units(&self) -> impl Iterator<Item = &UnitRecord> {
        self.units.iter()
    }

    pub fn contains_unit(&self, unit: ObjectId) -> bool {
        self.units.iter().any(|record| record.unit == unit)
    }

    pub fn group_id(&self, side: Side) -> ObjectId {
        match side {
            Side::Attacker => self.attacker_group,
            Side::Defender => self.defender_group,
        }
    }

    pub fn player_id(&self, side: Side) -> ObjectId {
        match side {
            Side::Attacker => self.attacker_player,
            Side::Defender => self.defender_player,
        }
    }

    /// Living unit occupying a slot on a side, if any. Dead bodies do not
    /// count; they only block summoning when the battle is at capacity.
    pub fn living_at_slot(&self, side: Side, slot: u8) -> Option<&UnitRecord> {
        self.units
            .iter()
            .find(|record| record.side == side && record.slot == slot && record.is_alive())
    }

    pub fn living_units(&self, side: Side) -> impl Iterator<Item = &UnitRecord> {
        self.units
            .iter()
            .filter(move |record| record.side == side && record.is_alive())
    }

    /// A side is defeated when it has no living, non-hidden unit left.
    pub fn side_defeated(&self, side: Side) -> bool {
        !self
            .living_units(side)
            .any(|record| !record.has_status(StatusFlags::HIDDEN | StatusFlags::RETREATED))
    }

    pub fn is_battle_over(&self) -> bool {
        self.phase == RoundPhase::BattleOver
    }

    // ========================================================================
    // Unit lifecycle
    // ========================================================================

    /// Adds a unit summoned mid-battle over a free (or dead-occupied) slot
    /// on the summoner's side.
    ///
    /// Fails with [`SlotError::CapacityExceeded`] when no slot remains or
    /// the record table is full. The summoned unit takes no turn in the
    /// current round; it enters the order when the next round is built.
    pub fn add_summoned_unit(
        &mut self,
        owner: ObjectId,
        side: Side,
        unit: ObjectId,
        hp: i16,
    ) -> Result<u8, SlotError> {
        let slot = (0..BattleConfig::MAX_GROUP_SLOTS as u8)
            .find(|&slot| self.living_at_slot(side, slot).is_none())
            .ok_or(SlotError::CapacityExceeded { side })?;

        if self.units.is_full() {
            return Err(SlotError::CapacityExceeded { side });
        }

        let mut record = UnitRecord::new(unit, side, slot, hp);
        record.set_status(StatusFlags::SUMMON, true);
        record.summon_owner = owner;
        self.units.push(record);
        Ok(slot)
    }

    /// Fully detaches a unit: removes its record, its turn entries, and
    /// every modifier edge it participates in, as one step.
    ///
    /// This is the route for summon/unsummon bookkeeping; ordinary deaths
    /// keep the record (the body holds a slot) and go through `set_hp`.
    pub fn remove_unit(&mut self, unit: ObjectId) -> Result<(), LedgerError> {
        if !self.contains_unit(unit) {
            return Err(LedgerError::UnitNotFound { unit });
        }

        self.detach_modifiers(unit);
        self.turn_queue.remove_unit(unit);
        self.units.retain(|record| record.unit != unit);
        Ok(())
    }

    /// Records an item consumed during the battle. Returns false when the
    /// per-battle item limit is already reached.
    pub fn record_item_use(&mut self, item: ObjectId) -> bool {
        if self.used_items.is_full() {
            return false;
        }
        self.used_items.push(item);
        true
    }

    // ========================================================================
    // Debug invariants
    // ========================================================================

    /// Structural invariants preserved by every declared mutation. Checked
    /// from the engine in debug builds only.
    #[cfg(debug_assertions)]
    pub(crate) fn assert_invariants(&self) {
        for entry in self.turn_queue.iter() {
            debug_assert!(
                self.contains_unit(entry.unit),
                "turn entry {} has no unit record",
                entry.unit
            );
            debug_assert!(entry.attacks_left > 0, "queued entry with zero attacks");
        }

        for record in &self.units {
            for edge in &record.modified_units {
                let target = self
                    .units
                    .iter()
                    .find(|r| r.unit == edge.unit)
                    .expect("modifier edge points at a missing unit");
                debug_assert!(
                    target.modifiers.contains(&edge.modifier),
                    "modifier relation asymmetric between {} and {}",
                    record.unit,
                    edge.unit
                );
            }
        }
    }
}

/// Deterministic SHA-256 digest of the full battle state.
///
/// Participants exchange digests after each applied action to detect
/// divergence early; bincode serialization keeps the byte stream identical
/// across platforms.
#[cfg(feature = "serde")]
pub fn state_digest(state: &BattleState) -> [u8; 32] {
    use sha2::{Digest, Sha256};

    let mut hasher = Sha256::new();
    let bytes = bincode::serialize(state).expect("BattleState serialization should not fail");
    hasher.update(&bytes);
    hasher.finalize().into()
}
