//! Per-unit battle status flags.
//!
//! Bit positions are wire-stable within a protocol epoch: new statuses are
//! appended, existing bits are never renumbered. `DISABLE_LONG` is an
//! aggregate over the three disabling statuses and is maintained by the
//! ledger, not set directly.

use bitflags::bitflags;

bitflags! {
    /// Independent boolean facts about a unit's battle condition.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct StatusFlags: u64 {
        /// Unit was killed and its experience points were counted.
        const XP_COUNTED            = 1 << 0;
        const DEAD                  = 1 << 1;
        const PARALYZE              = 1 << 2;
        const PETRIFY               = 1 << 3;
        /// Long disable applied (paralyze, petrify or fear).
        const DISABLE_LONG          = 1 << 4;
        /// 25% damage boost.
        const BOOST_DAMAGE_LVL1     = 1 << 5;
        /// 50% damage boost.
        const BOOST_DAMAGE_LVL2     = 1 << 6;
        /// 75% damage boost.
        const BOOST_DAMAGE_LVL3     = 1 << 7;
        /// 100% damage boost.
        const BOOST_DAMAGE_LVL4     = 1 << 8;
        /// Boost persists until battle is over or lower damage applied.
        const BOOST_DAMAGE_LONG     = 1 << 9;
        /// 50% lower damage.
        const LOWER_DAMAGE_LVL1     = 1 << 10;
        /// 33% lower damage.
        const LOWER_DAMAGE_LVL2     = 1 << 11;
        const LOWER_DAMAGE_LONG     = 1 << 12;
        /// 50% lower initiative.
        const LOWER_INITIATIVE      = 1 << 13;
        const LOWER_INITIATIVE_LONG = 1 << 14;
        const POISON                = 1 << 15;
        const POISON_LONG           = 1 << 16;
        const FROSTBITE             = 1 << 17;
        const FROSTBITE_LONG        = 1 << 18;
        const BLISTER               = 1 << 19;
        const BLISTER_LONG          = 1 << 20;
        const CURED                 = 1 << 21;
        /// Unit transformed by another unit.
        const TRANSFORM             = 1 << 22;
        const TRANSFORM_LONG        = 1 << 23;
        /// Unit transformed itself.
        const TRANSFORM_SELF        = 1 << 24;
        const TRANSFORM_DOPPELGANGER = 1 << 25;
        const TRANSFORM_DRAIN_LEVEL = 1 << 26;
        /// Unit was summoned during battle.
        const SUMMON                = 1 << 27;
        /// Unit completed its retreat and left the battle.
        const RETREATED             = 1 << 28;
        /// Unit is retreating.
        const RETREAT               = 1 << 29;
        /// Unit is hidden, e.g. a non-leader while leaders duel.
        const HIDDEN                = 1 << 30;
        /// Defend was used in this round.
        const DEFEND                = 1 << 31;
        /// Unsummon effect applied.
        const UNSUMMONED            = 1 << 32;
        const FEAR                  = 1 << 33;
    }
}

bitflags! {
    /// Second, sparsely used flag set reserved for forward compatibility.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct ExtendedStatusFlags: u64 {}
}

impl StatusFlags {
    /// Statuses that disable a unit from acting.
    pub const DISABLING: Self = Self::PARALYZE.union(Self::PETRIFY).union(Self::FEAR);

    /// Every boost-damage level.
    pub const BOOST_ANY: Self = Self::BOOST_DAMAGE_LVL1
        .union(Self::BOOST_DAMAGE_LVL2)
        .union(Self::BOOST_DAMAGE_LVL3)
        .union(Self::BOOST_DAMAGE_LVL4);

    /// Every lower-damage level.
    pub const LOWER_ANY: Self = Self::LOWER_DAMAGE_LVL1.union(Self::LOWER_DAMAGE_LVL2);

    /// Damage-over-time statuses.
    pub const DOT_ANY: Self = Self::POISON.union(Self::FROSTBITE).union(Self::BLISTER);

    /// A unit carrying any of these can never be a valid attack target.
    pub const UNTARGETABLE: Self = Self::XP_COUNTED
        .union(Self::DEAD)
        .union(Self::UNSUMMONED)
        .union(Self::RETREATED)
        .union(Self::HIDDEN);

    /// Damage-boost multiplier numerator in percent for the current flags.
    pub fn boost_damage_percent(self) -> i32 {
        if self.contains(Self::BOOST_DAMAGE_LVL4) {
            100
        } else if self.contains(Self::BOOST_DAMAGE_LVL3) {
            75
        } else if self.contains(Self::BOOST_DAMAGE_LVL2) {
            50
        } else if self.contains(Self::BOOST_DAMAGE_LVL1) {
            25
        } else {
            0
        }
    }

    /// Damage reduction in percent for the current flags.
    pub fn lower_damage_percent(self) -> i32 {
        if self.contains(Self::LOWER_DAMAGE_LVL1) {
            50
        } else if self.contains(Self::LOWER_DAMAGE_LVL2) {
            33
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabling_group_covers_all_three_statuses() {
        for flag in [StatusFlags::PARALYZE, StatusFlags::PETRIFY, StatusFlags::FEAR] {
            assert!(StatusFlags::DISABLING.contains(flag));
        }
        assert!(!StatusFlags::DISABLING.contains(StatusFlags::DEAD));
    }

    #[test]
    fn boost_levels_pick_the_strongest_set_bit() {
        let flags = StatusFlags::BOOST_DAMAGE_LVL1 | StatusFlags::BOOST_DAMAGE_LVL3;
        assert_eq!(flags.boost_damage_percent(), 75);
        assert_eq!(StatusFlags::empty().boost_damage_percent(), 0);
    }
}
