//! Common error infrastructure for battle-core.
//!
//! Domain-specific errors (e.g., `LedgerError`, `ActionError`) are defined in
//! their respective modules alongside the operations they validate. This
//! module provides the shared severity/context machinery used by all of them.

use crate::state::ObjectId;

/// Severity level of an error, used for categorization and recovery strategies.
///
/// - **Recoverable**: a design-level limit reached by normal gameplay; the
///   operation becomes a no-op and the session keeps running
/// - **Validation**: invalid input rejected at the submission boundary
/// - **Internal**: unexpected state inconsistency, indicates a bug
/// - **Fatal**: replicated state can no longer be trusted
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// Recoverable error - surface as a no-op with a logged warning.
    ///
    /// Examples: modifier capacity reached, summon slot capacity reached
    Recoverable,

    /// Validation error - reject the action, inform the submitter.
    ///
    /// Examples: unknown unit, illegal action for current phase
    Validation,

    /// Internal error - unexpected state inconsistency.
    Internal,

    /// Fatal error - battle state corrupted, requires resynchronization.
    ///
    /// Example: malformed snapshot received from the network
    Fatal,
}

impl ErrorSeverity {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Internal => "internal",
            Self::Fatal => "fatal",
        }
    }

    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable)
    }
}

/// Contextual information attached to errors for diagnostics.
///
/// Captured at the point of error creation; the round number correlates the
/// failure with a specific point of the replicated action sequence. The
/// static message keeps the type serializable for logs but not
/// round-trippable, which errors never need to be.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ErrorContext {
    /// Unit that triggered the error (if applicable).
    pub unit: Option<ObjectId>,

    /// Battle round at the time of error.
    pub round: i8,

    /// Optional static message providing additional context.
    pub message: Option<&'static str>,
}

impl ErrorContext {
    #[must_use]
    pub const fn new(round: i8) -> Self {
        Self {
            unit: None,
            round,
            message: None,
        }
    }

    #[must_use]
    pub const fn with_unit(mut self, unit: ObjectId) -> Self {
        self.unit = Some(unit);
        self
    }

    #[must_use]
    pub const fn with_message(mut self, message: &'static str) -> Self {
        self.message = Some(message);
        self
    }
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self::new(0)
    }
}

/// Common trait for all battle-core errors.
///
/// Implemented by every error enum in the crate so the runtime can apply a
/// uniform recovery strategy (reject, warn-and-continue, resynchronize).
pub trait BattleError: core::fmt::Display + core::fmt::Debug {
    /// Returns the severity level of this error.
    fn severity(&self) -> ErrorSeverity;

    /// Returns the context information for this error, if available.
    fn context(&self) -> Option<&ErrorContext> {
        None
    }

    /// Returns a static string identifier for this error variant.
    fn error_code(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}
