//! Attack taxonomy: sources, classes, reach and ward masks.

use bitflags::bitflags;
use strum::{EnumIter, FromRepr};

use super::common::ObjectId;

/// Elemental / physical source of an attack. Immunities and wards are keyed
/// by source.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, FromRepr, EnumIter, strum::Display)]
#[strum(serialize_all = "lowercase")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum AttackSource {
    Weapon = 0,
    Mind = 1,
    Life = 2,
    Death = 3,
    Fire = 4,
    Water = 5,
    Earth = 6,
    Air = 7,
}

/// What an attack does. Immunities and wards are also keyed by class.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, FromRepr, EnumIter, strum::Display)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum AttackClass {
    Damage = 0,
    Drain = 1,
    Paralyze = 2,
    Heal = 3,
    Fear = 4,
    BoostDamage = 5,
    Petrify = 6,
    LowerDamage = 7,
    LowerInitiative = 8,
    Poison = 9,
    Frostbite = 10,
    Blister = 11,
    Revive = 12,
    Cure = 13,
    Summon = 14,
    DrainLevel = 15,
    GiveAttack = 16,
    Doppelganger = 17,
    TransformSelf = 18,
    TransformOther = 19,
    Shatter = 20,
    BestowWards = 21,
}

impl AttackClass {
    /// True for classes that apply to the acting unit's own side.
    pub const fn targets_allies(self) -> bool {
        matches!(
            self,
            Self::Heal
                | Self::BoostDamage
                | Self::Revive
                | Self::Cure
                | Self::GiveAttack
                | Self::BestowWards
        )
    }

    /// True for classes that remove hit points.
    pub const fn is_damage(self) -> bool {
        matches!(self, Self::Damage | Self::Drain | Self::DrainLevel)
    }

    /// True for damage-over-time classes.
    pub const fn is_dot(self) -> bool {
        matches!(self, Self::Poison | Self::Frostbite | Self::Blister)
    }
}

/// Geometric / selection policy governing which units an attack may target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, FromRepr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum AttackReach {
    /// Every valid unit on the target side at once; no selection choice.
    All = 0,
    /// The acting side chooses one target among all valid units.
    Any = 1,
    /// Restricted to slots adjacent by the group's fixed slot geometry.
    Adjacent = 2,
}

bitflags! {
    /// Source-keyed immunities currently warded off (suppressed).
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct SourceWards: u8 {
        const WEAPON = 1 << AttackSource::Weapon as u8;
        const MIND   = 1 << AttackSource::Mind as u8;
        const LIFE   = 1 << AttackSource::Life as u8;
        const DEATH  = 1 << AttackSource::Death as u8;
        const FIRE   = 1 << AttackSource::Fire as u8;
        const WATER  = 1 << AttackSource::Water as u8;
        const EARTH  = 1 << AttackSource::Earth as u8;
        const AIR    = 1 << AttackSource::Air as u8;
    }
}

impl SourceWards {
    pub fn from_source(source: AttackSource) -> Self {
        Self::from_bits_truncate(1 << source as u8)
    }
}

bitflags! {
    /// Class-keyed immunities currently warded off (suppressed).
    ///
    /// One bit per [`AttackClass`] discriminant; constructed through
    /// [`ClassWards::from_class`] rather than named constants.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct ClassWards: u32 {
        const ALL = (1 << 22) - 1;
    }
}

impl ClassWards {
    pub fn from_class(class: AttackClass) -> Self {
        Self::from_bits_truncate(1 << class as u32)
    }
}

/// Static description of a single attack, supplied by the content layer.
///
/// Specs are external data resolved through the environment; battle state
/// only stores the attack ids needed for effect attribution.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttackSpec {
    pub id: ObjectId,
    pub class: AttackClass,
    pub source: AttackSource,
    pub reach: AttackReach,
    /// Damage or heal amount; interpretation depends on class.
    pub damage: i16,
    /// Boost/lower level for the damage-modifier classes (1-based).
    pub level: u8,
    /// Long variant: persists across rounds until expired or cleared.
    pub long: bool,
    /// Unit template placed on the battlefield by `Summon` class attacks.
    pub summon: Option<ObjectId>,
}

impl AttackSpec {
    /// Plain single-target damage attack; the common case in tests.
    pub fn damage(id: ObjectId, source: AttackSource, reach: AttackReach, damage: i16) -> Self {
        Self {
            id,
            class: AttackClass::Damage,
            source,
            reach,
            damage,
            level: 0,
            long: false,
            summon: None,
        }
    }

    pub fn with_class(mut self, class: AttackClass) -> Self {
        self.class = class;
        self
    }

    pub fn with_reach(mut self, reach: AttackReach) -> Self {
        self.reach = reach;
        self
    }

    pub fn with_level(mut self, level: u8) -> Self {
        self.level = level;
        self
    }

    pub fn long(mut self) -> Self {
        self.long = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn every_class_has_a_distinct_ward_bit() {
        let mut seen = ClassWards::empty();
        for class in AttackClass::iter() {
            let ward = ClassWards::from_class(class);
            assert!(!ward.is_empty(), "{class} ward bit out of range");
            assert!(!seen.intersects(ward), "{class} ward bit collides");
            seen |= ward;
        }
        assert_eq!(seen, ClassWards::ALL);
    }

    #[test]
    fn source_ward_bits_match_discriminants() {
        for source in AttackSource::iter() {
            assert_eq!(
                SourceWards::from_source(source).bits(),
                1 << source as u8
            );
        }
    }
}
