//! Traits describing read-only content data.
//!
//! Unit initiative, armor, immunities, attack specifications and item
//! effects are content-layer facts, not battle state. Oracles expose them to
//! the engine without hard coupling to a concrete data source; every
//! participant must supply oracles answering identically or the simulations
//! diverge.

use crate::state::{AttackSpec, ClassWards, ObjectId, SourceWards};

/// Read-only facts about units, supplied by the content layer.
pub trait UnitOracle {
    /// Initiative used to order turns; higher acts first.
    fn initiative(&self, unit: ObjectId) -> i16;

    /// Armor in percent of damage absorbed, before battle modifiers.
    fn armor(&self, unit: ObjectId) -> i16;

    /// The unit's primary attack.
    fn attack(&self, unit: ObjectId) -> AttackSpec;

    /// Scoring used by auto-targeting to rank enemy threat.
    fn threat(&self, unit: ObjectId) -> i32;

    /// Overall unit value; fear attacks prefer the most valuable target.
    fn unit_value(&self, unit: ObjectId) -> i32;

    /// Experience awarded to the killer when this unit dies.
    fn xp_reward(&self, unit: ObjectId) -> i16;

    /// Hit point ceiling used by heal and drain effects.
    fn max_hp(&self, _unit: ObjectId) -> i16 {
        i16::MAX
    }

    /// Attacks per turn; 2 for double-attack units.
    fn attacks_per_turn(&self, _unit: ObjectId) -> u8 {
        1
    }

    /// Attack sources this unit is immune to (before ward removal).
    fn source_immunities(&self, _unit: ObjectId) -> SourceWards {
        SourceWards::empty()
    }

    /// Attack classes this unit is immune to (before ward removal).
    fn class_immunities(&self, _unit: ObjectId) -> ClassWards {
        ClassWards::empty()
    }
}

/// Read-only item facts for `UseItem` actions.
pub trait ItemOracle {
    /// The attack this item performs when used in battle, if usable.
    fn battle_spec(&self, item: ObjectId) -> Option<AttackSpec>;
}

/// Error raised when a required oracle is missing from the environment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum OracleError {
    #[error("unit oracle not available")]
    UnitsNotAvailable,
    #[error("item oracle not available")]
    ItemsNotAvailable,
}

/// Aggregates the read-only oracles required by the engine and resolvers.
#[derive(Clone, Copy)]
pub struct Env<'a, U, I>
where
    U: UnitOracle + ?Sized,
    I: ItemOracle + ?Sized,
{
    units: Option<&'a U>,
    items: Option<&'a I>,
}

pub type BattleEnv<'a> = Env<'a, dyn UnitOracle + 'a, dyn ItemOracle + 'a>;

impl<'a, U, I> Env<'a, U, I>
where
    U: UnitOracle + ?Sized,
    I: ItemOracle + ?Sized,
{
    pub fn new(units: Option<&'a U>, items: Option<&'a I>) -> Self {
        Self { units, items }
    }

    pub fn with_units(units: &'a U) -> Self {
        Self::new(Some(units), None)
    }

    pub fn with_all(units: &'a U, items: &'a I) -> Self {
        Self::new(Some(units), Some(items))
    }

    pub fn empty() -> Self {
        Self {
            units: None,
            items: None,
        }
    }

    /// Returns the UnitOracle, or an error if not available.
    pub fn units(&self) -> Result<&'a U, OracleError> {
        self.units.ok_or(OracleError::UnitsNotAvailable)
    }

    /// Returns the ItemOracle, or an error if not available.
    pub fn items(&self) -> Result<&'a I, OracleError> {
        self.items.ok_or(OracleError::ItemsNotAvailable)
    }
}
