//! Replay verification.
//!
//! The determinism contract: replaying the logged action sequence against
//! the logged setup must reproduce a structurally equal final state on any
//! participant. Digests make the comparison cheap to exchange over the wire.

use battle_core::{
    state_digest, BattleAction, BattleConfig, BattleEngine, BattleSetup, BattleState, Env,
    ExecuteError, ItemOracle, UnitOracle,
};

/// Everything needed to re-simulate a battle from scratch.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ActionLog {
    pub setup: BattleSetup,
    pub config: BattleConfig,
    pub actions: Vec<BattleAction>,
}

/// Errors surfaced while re-simulating a logged battle.
#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    /// A logged action failed to apply; the log itself is inconsistent.
    #[error("logged action {index} failed to replay: {error}")]
    Execute { index: usize, error: ExecuteError },

    /// Replay finished but the final state does not match the expected
    /// digest: the participants diverged somewhere along the sequence.
    #[error("replay diverged: expected digest {expected}, got {actual}")]
    Diverged { expected: String, actual: String },
}

/// Hex-encoded deterministic digest of a battle state.
pub fn state_digest_hex(state: &BattleState) -> String {
    hex::encode(state_digest(state))
}

/// Re-simulates a logged battle and checks the final state digest.
///
/// Returns the reconstructed final state so callers can diff it against
/// their own when investigating a divergence.
pub fn verify_replay(
    log: &ActionLog,
    units: &dyn UnitOracle,
    items: Option<&dyn ItemOracle>,
    expected_digest: &str,
) -> Result<BattleState, ReplayError> {
    let mut state = BattleState::setup(&log.setup);
    let env = Env::new(Some(units), items);

    for (index, action) in log.actions.iter().enumerate() {
        BattleEngine::new(&mut state, log.config)
            .execute(&env, action)
            .map_err(|error| ReplayError::Execute { index, error })?;
    }

    let actual = state_digest_hex(&state);
    if actual != expected_digest {
        tracing::error!(expected = expected_digest, %actual, "replay diverged");
        return Err(ReplayError::Diverged {
            expected: expected_digest.to_string(),
            actual,
        });
    }

    Ok(state)
}
