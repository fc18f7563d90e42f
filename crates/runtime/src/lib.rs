//! Replication layer for the deterministic battle core.
//!
//! A [`session::BattleSession`] wraps one battle instance: it consumes the
//! totally-ordered action feed the transport delivers, applies each action
//! atomically through the engine, answers read-only queries for UI/AI
//! collaborators, and keeps the action log used for replay verification and
//! crash recovery. Sessions are isolated per battle; a host runs many of
//! them side by side without shared state.

pub mod replay;
pub mod session;
pub mod sync;

pub use replay::{state_digest_hex, verify_replay, ActionLog, ReplayError};
pub use session::{BattleSession, SessionError};
pub use sync::SyncError;
