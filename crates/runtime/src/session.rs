//! One replicated battle instance.

use battle_core::{
    ActionOutcome, BattleAction, BattleConfig, BattleEngine, BattleError, BattleSetup, BattleState,
    CapacityWarning, Env, ErrorSeverity, ExecuteError, ItemOracle, ObjectId, RoundPhase, Side,
    StatusFlags, TargetList, TurnEntry, UnitOracle,
};

/// Error surfaced to the submitting participant.
///
/// Everything here is recoverable at the submission boundary: the action was
/// rejected, state is unchanged, and the participant may submit another.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("action rejected: {0}")]
    Rejected(#[from] ExecuteError),
}

/// Owns one battle's replicated state and its oracles.
///
/// The transport guarantees every participant feeds their session the same
/// action sequence in the same order; under that contract all sessions stay
/// structurally equal after every applied action.
pub struct BattleSession {
    state: BattleState,
    config: BattleConfig,
    units: Box<dyn UnitOracle>,
    items: Option<Box<dyn ItemOracle>>,
    log: Vec<BattleAction>,
}

impl BattleSession {
    pub fn new(
        setup: &BattleSetup,
        config: BattleConfig,
        units: Box<dyn UnitOracle>,
        items: Option<Box<dyn ItemOracle>>,
    ) -> Self {
        Self {
            state: BattleState::setup(setup),
            config,
            units,
            items,
            log: Vec::new(),
        }
    }

    /// Advances scheduling until a unit may act (or the battle ended), so
    /// clients can query the initial turn order before the first action.
    pub fn prepare(&mut self) -> Result<(), SessionError> {
        let env = Env::new(Some(self.units.as_ref()), self.items.as_deref());
        BattleEngine::new(&mut self.state, self.config).prepare(&env)?;
        Ok(())
    }

    /// Validates and applies one action from the ordered feed.
    ///
    /// On success the action is appended to the log and must be relayed
    /// verbatim to every other participant. Capacity no-ops encountered
    /// during application are logged as warnings, not failures.
    pub fn submit(&mut self, action: BattleAction) -> Result<ActionOutcome, SessionError> {
        let env = Env::new(Some(self.units.as_ref()), self.items.as_deref());
        let mut engine = BattleEngine::new(&mut self.state, self.config);

        match engine.execute(&env, &action) {
            Ok(outcome) => {
                for warning in &outcome.warnings {
                    match warning {
                        CapacityWarning::Modifier { source, target } => tracing::warn!(
                            %source,
                            %target,
                            "modifier capacity exceeded, application skipped"
                        ),
                        CapacityWarning::Slot { side } => tracing::warn!(
                            %side,
                            "no free slot for summon, application skipped"
                        ),
                    }
                }
                tracing::debug!(
                    action = action.as_snake_case(),
                    round = self.state.current_round,
                    phase = ?outcome.phase,
                    "action applied"
                );
                self.log.push(action);
                Ok(outcome)
            }
            Err(error) => {
                match error.severity() {
                    ErrorSeverity::Fatal | ErrorSeverity::Internal => tracing::error!(
                        action = action.as_snake_case(),
                        code = error.error_code(),
                        %error,
                        "action failed"
                    ),
                    _ => tracing::debug!(
                        action = action.as_snake_case(),
                        code = error.error_code(),
                        %error,
                        "action rejected"
                    ),
                }
                Err(error.into())
            }
        }
    }

    // ========================================================================
    // Read-only queries for UI/AI collaborators
    // ========================================================================

    pub fn state(&self) -> &BattleState {
        &self.state
    }

    pub fn config(&self) -> &BattleConfig {
        &self.config
    }

    pub fn status(&self, unit: ObjectId, flag: StatusFlags) -> bool {
        self.state.status(unit, flag).unwrap_or(false)
    }

    /// Snapshot of the remaining turn order this round.
    pub fn turn_order(&self) -> Vec<TurnEntry> {
        self.state.turn_queue.iter().copied().collect()
    }

    /// Legal targets the pending action would have right now; empty for
    /// actions that take no target.
    pub fn targets_for(&self, action: &BattleAction) -> TargetList {
        let spec = match *action {
            BattleAction::Attack { attacker, .. } | BattleAction::Auto { unit: attacker } => {
                Some((attacker, self.units.attack(attacker)))
            }
            BattleAction::UseItem { unit, item, .. } => self
                .items
                .as_deref()
                .and_then(|items| items.battle_spec(item))
                .map(|spec| (unit, spec)),
            _ => None,
        };

        spec.and_then(|(actor, spec)| {
            battle_core::resolve_targets(&spec, &self.state, actor).ok()
        })
        .unwrap_or_default()
    }

    pub fn is_battle_over(&self) -> bool {
        self.state.phase == RoundPhase::BattleOver
    }

    pub fn winner(&self) -> Option<Side> {
        self.state.winner
    }

    /// Actions applied so far, in order.
    pub fn action_log(&self) -> &[BattleAction] {
        &self.log
    }

    pub(crate) fn state_mut(&mut self) -> &mut BattleState {
        &mut self.state
    }
}
