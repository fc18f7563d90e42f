//! Action submission surface.
//!
//! A participant (human or AI) submits one tagged action per turn. Actions
//! are validated against the scheduler state and either applied atomically
//! or rejected with a typed reason; rejected actions leave state untouched.

use crate::error::{BattleError, ErrorSeverity};
use crate::state::ObjectId;

/// One submitted battle action with its payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BattleAction {
    /// Perform the unit's primary attack. `target` is `None` for attacks
    /// with `All` reach, where no selection choice exists.
    Attack {
        attacker: ObjectId,
        target: Option<ObjectId>,
    },
    /// Give up the turn.
    Skip { unit: ObjectId },
    /// Start retreating; the retreat completes at the next round start.
    Retreat { unit: ObjectId },
    /// Postpone the turn to the end of the round.
    Wait { unit: ObjectId },
    /// Take a defensive stance for the rest of the round.
    Defend { unit: ObjectId },
    /// Let auto-targeting pick and perform the best attack.
    Auto { unit: ObjectId },
    /// Consume a battle item; `target` as for `Attack`.
    UseItem {
        unit: ObjectId,
        item: ObjectId,
        target: Option<ObjectId>,
    },
    /// Resolve the battle immediately from current totals.
    Resolve,
}

impl BattleAction {
    /// The unit performing this action; `None` for host-level actions.
    pub fn actor(&self) -> Option<ObjectId> {
        match *self {
            Self::Attack { attacker, .. } => Some(attacker),
            Self::Skip { unit }
            | Self::Retreat { unit }
            | Self::Wait { unit }
            | Self::Defend { unit }
            | Self::Auto { unit }
            | Self::UseItem { unit, .. } => Some(unit),
            Self::Resolve => None,
        }
    }

    /// Snake case name used for logging and serialization keys.
    pub fn as_snake_case(&self) -> &'static str {
        match self {
            Self::Attack { .. } => "attack",
            Self::Skip { .. } => "skip",
            Self::Retreat { .. } => "retreat",
            Self::Wait { .. } => "wait",
            Self::Defend { .. } => "defend",
            Self::Auto { .. } => "auto",
            Self::UseItem { .. } => "use_item",
            Self::Resolve => "resolve",
        }
    }
}

/// Why an action is illegal for the current scheduler state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum IllegalActionReason {
    /// The battle already reached its terminal state.
    BattleOver,
    /// The acting unit is not the front entry of the turn queue.
    NotUnitsTurn { current: Option<ObjectId> },
    /// The attack's reach requires an explicit target.
    TargetRequired,
    /// The item cannot be used in battle.
    ItemNotUsable,
    /// The per-battle item limit is already reached.
    ItemLimitReached,
}

/// Errors recoverable at the action submission boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ActionError {
    #[error("action not legal for current state: {reason:?}")]
    IllegalAction { reason: IllegalActionReason },

    #[error("unit {target} is not a legal target for {attacker}")]
    InvalidTarget {
        attacker: ObjectId,
        target: ObjectId,
    },
}

impl ActionError {
    pub fn illegal(reason: IllegalActionReason) -> Self {
        Self::IllegalAction { reason }
    }
}

impl BattleError for ActionError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::IllegalAction { .. } => "ACTION_ILLEGAL",
            Self::InvalidTarget { .. } => "ACTION_INVALID_TARGET",
        }
    }
}
