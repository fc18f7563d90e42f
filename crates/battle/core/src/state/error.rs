//! Error types for battle state operations.

use crate::error::{BattleError, ErrorContext, ErrorSeverity};
use crate::state::{ObjectId, Side};

/// Errors surfaced by ledger lookups and status mutation.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LedgerError {
    /// The unit id has no record in this battle.
    #[error("unit {unit} not found in battle state")]
    UnitNotFound { unit: ObjectId },
}

impl BattleError for LedgerError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::UnitNotFound { .. } => ErrorSeverity::Validation,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::UnitNotFound { .. } => "STATE_UNIT_NOT_FOUND",
        }
    }
}

/// Errors surfaced when adding units to a side's group.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SlotError {
    /// No free slot remains on the target side; a design-level limit reached
    /// by normal gameplay, surfaced as a warning-logged no-op upstream.
    #[error("no free slot remains on the {side} side")]
    CapacityExceeded { side: Side },
}

impl BattleError for SlotError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::CapacityExceeded { .. } => ErrorSeverity::Recoverable,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::CapacityExceeded { .. } => "STATE_SLOT_CAPACITY_EXCEEDED",
        }
    }
}

/// Errors surfaced by the modifier relation.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ModifierError {
    /// Either side's bounded modifier list is full. The relation is left
    /// untouched; upstream treats this as a warning-logged no-op.
    #[error("modifier capacity exceeded between {source_id} and {target}")]
    CapacityExceeded {
        #[cfg_attr(feature = "serde", serde(rename = "source"))]
        source_id: ObjectId,
        target: ObjectId,
        #[cfg_attr(feature = "serde", serde(skip))]
        context: Option<ErrorContext>,
    },

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl ModifierError {
    pub fn capacity_exceeded(source: ObjectId, target: ObjectId, round: i8) -> Self {
        Self::CapacityExceeded {
            source_id: source,
            target,
            context: Some(ErrorContext::new(round).with_unit(source)),
        }
    }
}

impl BattleError for ModifierError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::CapacityExceeded { .. } => ErrorSeverity::Recoverable,
            Self::Ledger(inner) => inner.severity(),
        }
    }

    fn context(&self) -> Option<&ErrorContext> {
        match self {
            Self::CapacityExceeded { context, .. } => context.as_ref(),
            Self::Ledger(_) => None,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::CapacityExceeded { .. } => "STATE_MODIFIER_CAPACITY_EXCEEDED",
            Self::Ledger(inner) => inner.error_code(),
        }
    }
}
