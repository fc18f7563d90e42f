//! Deterministic battle simulation core shared by every participant.
//!
//! `battle-core` defines the replicated state, the turn scheduler, the
//! target resolution suite and the action execution pipeline for a
//! turn-based tactical battle. All state mutation flows through
//! [`engine::BattleEngine`]; given the same setup and the same totally
//! ordered action sequence, every participant arrives at bit-identical
//! state. The surrounding transport, content data and presentation are
//! external collaborators reached through the oracle traits in [`env`].
pub mod action;
pub mod codec;
pub mod combat;
pub mod config;
pub mod engine;
pub mod env;
pub mod error;
pub mod scheduler;
pub mod state;
pub mod targeting;

#[cfg(test)]
pub(crate) mod testutil;

pub use action::{ActionError, BattleAction, IllegalActionReason};
pub use codec::{decode_snapshot, encode_snapshot, CodecError, SNAPSHOT_EPOCH, SNAPSHOT_LEN};
pub use combat::{CombatError, HitResult};
pub use config::BattleConfig;
pub use engine::{ActionOutcome, BattleEngine, CapacityWarning, ExecuteError};
pub use env::{BattleEnv, Env, ItemOracle, OracleError, UnitOracle};
pub use error::{BattleError, ErrorContext, ErrorSeverity};
pub use state::{
    AttackClass, AttackReach, AttackSource, AttackSpec, BattleSetup, BattleState, GroupSetup,
    LedgerError, ModifierError, ObjectCategory, ObjectId, RoundPhase, Side, SlotError, StatusFlags,
    TurnEntry, TurnQueue, UnitRecord, UnitSetup,
};
pub use targeting::{resolve_targets, select::find_attack_target, TargetList};

#[cfg(feature = "serde")]
pub use state::state_digest;
