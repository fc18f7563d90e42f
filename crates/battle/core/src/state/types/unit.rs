//! Per-unit battle record: status bits, effect attribution, armor and the
//! modifier relation views.

use arrayvec::ArrayVec;

use crate::config::BattleConfig;

use super::attack::{ClassWards, SourceWards};
use super::common::{ObjectId, Side};
use super::status::{ExtendedStatusFlags, StatusFlags};

/// One edge of the modifier relation: a unit this record's owner modifies,
/// together with the modifier imposed on it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModifiedUnit {
    pub unit: ObjectId,
    pub modifier: ObjectId,
}

/// Battle-local record of a single participating unit.
///
/// Records are created when the battle begins (or a unit is summoned) and
/// mutated exclusively through [`BattleState`](crate::state::BattleState)
/// operations so the aggregate invariants hold.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UnitRecord {
    pub unit: ObjectId,
    /// Identity before a transform was applied; equals `unit` otherwise.
    pub base_unit: ObjectId,

    pub statuses: StatusFlags,
    pub extended_statuses: ExtendedStatusFlags,

    /// Attack that applied the active poison effect, for expiry attribution.
    pub poison_attack: ObjectId,
    pub frostbite_attack: ObjectId,
    pub blister_attack: ObjectId,

    /// Round when paralyze, petrify or fear was applied. 0 means not applied.
    pub disable_applied_round: i8,
    pub poison_applied_round: i8,
    pub frostbite_applied_round: i8,
    pub blister_applied_round: i8,
    pub transform_applied_round: i8,

    pub hp: i16,
    pub xp: i16,

    /// Total armor reduced by shatter attacks. Negative values increase armor.
    pub shattered_armor: i32,
    pub fortification_armor: i32,
    /// Damage reduction applied to mage units; not shown in unit encyclopedia.
    pub attack_power_reduction: i32,

    pub source_wards_removed: SourceWards,
    pub class_wards_removed: ClassWards,

    /// Positional index within the side's group, fixed for the battle.
    pub slot: u8,
    pub side: Side,
    pub revived: bool,
    /// Unit waited and then started retreating; skipped when the next
    /// round's turn order is computed.
    pub retreating_after_wait: bool,

    /// Unit that summoned this one; `NONE` for original stack members.
    pub summon_owner: ObjectId,

    /// Units this unit currently modifies, with the imposed modifier ids.
    pub modified_units: ArrayVec<ModifiedUnit, { BattleConfig::MAX_MODIFIERS }>,
    /// Modifiers currently applied to this unit.
    pub modifiers: ArrayVec<ObjectId, { BattleConfig::MAX_MODIFIERS }>,
}

impl UnitRecord {
    pub fn new(unit: ObjectId, side: Side, slot: u8, hp: i16) -> Self {
        Self {
            unit,
            base_unit: unit,
            statuses: StatusFlags::empty(),
            extended_statuses: ExtendedStatusFlags::empty(),
            poison_attack: ObjectId::NONE,
            frostbite_attack: ObjectId::NONE,
            blister_attack: ObjectId::NONE,
            disable_applied_round: 0,
            poison_applied_round: 0,
            frostbite_applied_round: 0,
            blister_applied_round: 0,
            transform_applied_round: 0,
            hp,
            xp: 0,
            shattered_armor: 0,
            fortification_armor: 0,
            attack_power_reduction: 0,
            source_wards_removed: SourceWards::empty(),
            class_wards_removed: ClassWards::empty(),
            slot,
            side,
            revived: false,
            retreating_after_wait: false,
            summon_owner: ObjectId::NONE,
            modified_units: ArrayVec::new(),
            modifiers: ArrayVec::new(),
        }
    }

    #[inline]
    pub fn has_status(&self, flag: StatusFlags) -> bool {
        self.statuses.intersects(flag)
    }

    /// Sets or clears a status flag. Idempotent: re-setting an already-set
    /// flag has no observable side effect.
    ///
    /// Clearing any of the three disabling statuses also clears the
    /// `DISABLE_LONG` aggregate once none of them remain set.
    pub fn set_status(&mut self, flag: StatusFlags, enabled: bool) {
        self.statuses.set(flag, enabled);

        if !enabled
            && flag.intersects(StatusFlags::DISABLING)
            && !self.statuses.intersects(StatusFlags::DISABLING)
        {
            self.statuses.remove(StatusFlags::DISABLE_LONG);
            self.disable_applied_round = 0;
        }
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        !self.has_status(StatusFlags::DEAD)
    }

    /// Whether a unit may still be chosen as an attack target at all.
    #[inline]
    pub fn is_targetable(&self) -> bool {
        !self.has_status(StatusFlags::UNTARGETABLE)
    }

    /// Whether the unit is currently prevented from acting on its turn.
    #[inline]
    pub fn is_disabled(&self) -> bool {
        self.has_status(StatusFlags::DISABLING)
    }

    /// Clamps into the representable hit point range; never wraps.
    pub fn clamp_hp(value: i32) -> i16 {
        value.clamp(i16::MIN as i32, i16::MAX as i32) as i16
    }

    pub fn set_xp(&mut self, value: i32) {
        self.xp = Self::clamp_hp(value);
    }

    pub fn is_source_ward_removed(&self, ward: SourceWards) -> bool {
        self.source_wards_removed.contains(ward)
    }

    pub fn is_class_ward_removed(&self, ward: ClassWards) -> bool {
        self.class_wards_removed.contains(ward)
    }

    /// Clears one-shot boost/lower damage statuses; long variants survive.
    /// Initiative reduction is left alone here: it is consumed by the next
    /// turn-order build and cleared by cure effects instead.
    pub fn clear_one_shot_damage_modifiers(&mut self) {
        if !self.has_status(StatusFlags::BOOST_DAMAGE_LONG) {
            self.statuses.remove(StatusFlags::BOOST_ANY);
        }
        if !self.has_status(StatusFlags::LOWER_DAMAGE_LONG) {
            self.statuses.remove(StatusFlags::LOWER_ANY);
        }
    }
}
