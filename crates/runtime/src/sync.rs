//! Snapshot exchange and resynchronization.
//!
//! Full snapshots travel through the fixed-size wire codec. A malformed
//! payload means the local replica can no longer be trusted to match the
//! others, so the session surfaces a resynchronization request instead of
//! continuing on a guess.

use battle_core::{codec, CodecError};

use crate::session::BattleSession;

/// Errors surfaced while installing a received snapshot.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// The snapshot violated the wire contract. Fatal for this replica:
    /// request a fresh snapshot from a trusted participant.
    #[error("resynchronization required: {0}")]
    ResyncRequired(#[from] CodecError),
}

impl BattleSession {
    /// Encodes the current state for transmission; always the fixed size
    /// of the current protocol epoch.
    pub fn snapshot(&self) -> Vec<u8> {
        codec::encode_snapshot(self.state())
    }

    /// Replaces local state with a snapshot received from a trusted
    /// participant.
    ///
    /// On a malformed payload local state is left untouched and the caller
    /// must trigger resynchronization.
    pub fn install_snapshot(&mut self, bytes: &[u8]) -> Result<(), SyncError> {
        match codec::decode_snapshot(bytes) {
            Ok(state) => {
                tracing::info!(
                    round = state.current_round,
                    phase = ?state.phase,
                    "snapshot installed"
                );
                *self.state_mut() = state;
                Ok(())
            }
            Err(error) => {
                tracing::error!(%error, "received malformed snapshot");
                Err(error.into())
            }
        }
    }
}
