//! Error types for the action execution pipeline.

use crate::action::ActionError;
use crate::combat::CombatError;
use crate::env::OracleError;
use crate::error::{BattleError, ErrorSeverity};
use crate::state::error::{LedgerError, ModifierError, SlotError};

/// Errors surfaced while executing an action through the battle engine.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ExecuteError {
    #[error("action rejected: {0}")]
    Action(#[from] ActionError),

    #[error("ledger operation failed: {0}")]
    Ledger(#[from] LedgerError),

    #[error("modifier operation failed: {0}")]
    Modifier(ModifierError),

    #[error("slot operation failed: {0}")]
    Slot(SlotError),

    #[error("oracle missing: {0}")]
    Oracle(#[from] OracleError),
}

impl From<CombatError> for ExecuteError {
    fn from(error: CombatError) -> Self {
        match error {
            CombatError::Ledger(inner) => Self::Ledger(inner),
            CombatError::Modifier(inner) => Self::Modifier(inner),
            CombatError::Slot(inner) => Self::Slot(inner),
        }
    }
}

impl BattleError for ExecuteError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Action(inner) => inner.severity(),
            Self::Ledger(inner) => inner.severity(),
            Self::Modifier(inner) => inner.severity(),
            Self::Slot(inner) => inner.severity(),
            Self::Oracle(_) => ErrorSeverity::Fatal,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Action(inner) => inner.error_code(),
            Self::Ledger(inner) => inner.error_code(),
            Self::Modifier(inner) => inner.error_code(),
            Self::Slot(inner) => inner.error_code(),
            Self::Oracle(_) => "ENGINE_ORACLE_MISSING",
        }
    }
}
