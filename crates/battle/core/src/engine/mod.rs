//! Turn scheduling and action execution pipeline.
//!
//! The [`BattleEngine`] is the authoritative reducer for
//! [`BattleState`]: every participant feeds it the same totally-ordered
//! action sequence and ends up with structurally equal state. Validation
//! happens before any mutation, so a rejected action observably never ran.

mod errors;

pub use errors::ExecuteError;

use crate::action::{ActionError, BattleAction, IllegalActionReason};
use crate::combat::{self, CombatError, HitResult};
use crate::config::BattleConfig;
use crate::env::BattleEnv;
use crate::scheduler;
use crate::state::error::ModifierError;
use crate::state::{
    AttackClass, AttackReach, AttackSpec, BattleState, ObjectId, RoundPhase, Side, StatusFlags,
};
use crate::targeting::{resolve_targets, select};

/// Capacity limits hit while applying effects. Per the error-handling
/// contract these do not abort the action; the affected application becomes
/// a no-op and the session layer logs a warning.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CapacityWarning {
    Modifier { source: ObjectId, target: ObjectId },
    Slot { side: Side },
}

/// Complete outcome of one applied action, for relay and presentation.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActionOutcome {
    pub action: BattleAction,
    /// Per-target effect results, in application order.
    pub hits: Vec<HitResult>,
    /// Capacity no-ops encountered during application.
    pub warnings: Vec<CapacityWarning>,
    /// Scheduler phase after the action settled.
    pub phase: RoundPhase,
}

/// Battle engine driving action execution, turn scheduling and the
/// end-of-battle checks.
pub struct BattleEngine<'a> {
    state: &'a mut BattleState,
    config: BattleConfig,
}

impl<'a> BattleEngine<'a> {
    pub fn new(state: &'a mut BattleState, config: BattleConfig) -> Self {
        Self { state, config }
    }

    pub fn state(&self) -> &BattleState {
        self.state
    }

    /// Advances the phase machine until a unit may act or the battle ended.
    /// Idempotent between actions; `execute` calls it on both edges.
    pub fn prepare(&mut self, env: &BattleEnv<'_>) -> Result<(), ExecuteError> {
        scheduler::advance_until_actionable(self.state, env, &self.config)?;
        Ok(())
    }

    /// Validates and applies one submitted action.
    ///
    /// Rejections leave the state untouched. Individual applications are
    /// atomic; capacity no-ops are reported through the outcome instead of
    /// failing the whole action.
    pub fn execute(
        &mut self,
        env: &BattleEnv<'_>,
        action: &BattleAction,
    ) -> Result<ActionOutcome, ExecuteError> {
        self.prepare(env)?;

        if self.state.phase == RoundPhase::BattleOver {
            return Err(ActionError::illegal(IllegalActionReason::BattleOver).into());
        }

        let mut hits = Vec::new();
        let mut warnings = Vec::new();

        match *action {
            BattleAction::Resolve => self.resolve_battle(),

            BattleAction::Attack { attacker, target } => {
                self.validate_actor(attacker)?;
                let spec = env.units()?.attack(attacker);
                self.perform_attack(env, attacker, &spec, target, &mut hits, &mut warnings)?;
                scheduler::advance_turn(self.state, true);
            }

            BattleAction::Auto { unit } => {
                self.validate_actor(unit)?;
                let spec = env.units()?.attack(unit);
                let picked = select::find_attack_target(&spec, self.state, env.units()?, unit)?;
                match picked {
                    Some(target) => {
                        let chosen =
                            (spec.reach != AttackReach::All).then_some(target);
                        self.perform_attack(env, unit, &spec, chosen, &mut hits, &mut warnings)?;
                        scheduler::advance_turn(self.state, true);
                    }
                    // Nothing legal to attack: the unit gives up its turn.
                    None => scheduler::advance_turn(self.state, false),
                }
            }

            BattleAction::Skip { unit } => {
                self.validate_actor(unit)?;
                scheduler::advance_turn(self.state, false);
            }

            BattleAction::Defend { unit } => {
                self.validate_actor(unit)?;
                self.state.set_status(unit, StatusFlags::DEFEND, true)?;
                scheduler::advance_turn(self.state, false);
            }

            BattleAction::Wait { unit } => {
                self.validate_actor(unit)?;
                self.state.turn_queue.move_front_to_back();
                scheduler::prepare_next_unit(self.state);
            }

            BattleAction::Retreat { unit } => {
                self.validate_actor(unit)?;
                let waited = self
                    .state
                    .turn_queue
                    .front()
                    .map(|entry| entry.waited)
                    .unwrap_or(false);
                self.state.set_status(unit, StatusFlags::RETREAT, true)?;
                self.state.unit_mut(unit)?.retreating_after_wait = waited;
                scheduler::advance_turn(self.state, false);
            }

            BattleAction::UseItem { unit, item, target } => {
                self.validate_actor(unit)?;
                let spec = env
                    .items()?
                    .battle_spec(item)
                    .ok_or(ActionError::illegal(IllegalActionReason::ItemNotUsable))?;
                if !self.state.record_item_use(item) {
                    return Err(
                        ActionError::illegal(IllegalActionReason::ItemLimitReached).into()
                    );
                }
                self.perform_attack(env, unit, &spec, target, &mut hits, &mut warnings)?;
                scheduler::advance_turn(self.state, false);
            }
        }

        self.prepare(env)?;

        #[cfg(debug_assertions)]
        self.state.assert_invariants();

        Ok(ActionOutcome {
            action: *action,
            hits,
            warnings,
            phase: self.state.phase,
        })
    }

    /// Non-host actions must come from the front queue entry's unit.
    fn validate_actor(&self, actor: ObjectId) -> Result<(), ActionError> {
        let current = self.state.turn_queue.front().map(|entry| entry.unit);
        if current != Some(actor) {
            return Err(ActionError::illegal(IllegalActionReason::NotUnitsTurn {
                current,
            }));
        }
        Ok(())
    }

    /// Resolves targets for a spec and applies it to each of them.
    fn perform_attack(
        &mut self,
        env: &BattleEnv<'_>,
        attacker: ObjectId,
        spec: &AttackSpec,
        chosen: Option<ObjectId>,
        hits: &mut Vec<HitResult>,
        warnings: &mut Vec<CapacityWarning>,
    ) -> Result<(), ExecuteError> {
        let targets: Vec<ObjectId> = match spec.class {
            // Self-directed classes need no target resolution.
            AttackClass::Summon | AttackClass::TransformSelf => vec![attacker],

            // The resolver gate never admits dead units; revives validate
            // their target against the dedicated rule instead.
            AttackClass::Revive => {
                let target =
                    chosen.ok_or(ActionError::illegal(IllegalActionReason::TargetRequired))?;
                if !combat::unit_can_be_revived(self.state, target) {
                    return Err(ActionError::InvalidTarget { attacker, target }.into());
                }
                vec![target]
            }

            _ => {
                let candidates = resolve_targets(spec, self.state, attacker)?;
                match spec.reach {
                    AttackReach::All => candidates.iter().copied().collect(),
                    AttackReach::Any | AttackReach::Adjacent => {
                        let target = chosen
                            .ok_or(ActionError::illegal(IllegalActionReason::TargetRequired))?;
                        if !candidates.contains(&target) {
                            return Err(ActionError::InvalidTarget { attacker, target }.into());
                        }
                        vec![target]
                    }
                }
            }
        };

        let units = env.units()?;
        for target in targets {
            match combat::apply_spec_to_target(self.state, units, attacker, spec, target) {
                Ok(hit) => hits.push(hit),
                Err(CombatError::Modifier(ModifierError::CapacityExceeded {
                    source_id: source,
                    target,
                    ..
                })) => warnings.push(CapacityWarning::Modifier { source, target }),
                Err(CombatError::Slot(error)) => {
                    let crate::state::error::SlotError::CapacityExceeded { side } = error;
                    warnings.push(CapacityWarning::Slot { side });
                }
                Err(error) => return Err(error.into()),
            }
        }
        Ok(())
    }

    /// Instant resolution: the side with more remaining hit points wins.
    fn resolve_battle(&mut self) {
        let total = |side: Side| -> i32 {
            self.state
                .living_units(side)
                .map(|record| record.hp.max(0) as i32)
                .sum()
        };

        let attacker_total = total(Side::Attacker);
        let defender_total = total(Side::Defender);
        self.state.winner = match attacker_total.cmp(&defender_total) {
            std::cmp::Ordering::Greater => Some(Side::Attacker),
            std::cmp::Ordering::Less => Some(Side::Defender),
            std::cmp::Ordering::Equal => None,
        };
        self.state.turn_queue.clear();
        self.state.phase = RoundPhase::BattleOver;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{ActionError, BattleAction, IllegalActionReason};
    use crate::config::BattleConfig;
    use crate::state::{
        AttackClass, AttackReach, AttackSource, AttackSpec, RoundPhase, Side, StatusFlags,
    };
    use crate::testutil::{attack_id, env_with, item_id, two_on_one, unit_id, FixedOracle};

    fn lethal_oracle() -> FixedOracle {
        FixedOracle::new().attack_spec(
            unit_id(1),
            AttackSpec::damage(attack_id(1), AttackSource::Weapon, AttackReach::Any, 50),
        )
    }

    #[test]
    fn lethal_attack_ends_the_battle_at_round_end() {
        let mut state = two_on_one();
        let oracle = lethal_oracle();
        let env = env_with(&oracle);
        let mut engine = BattleEngine::new(&mut state, BattleConfig::default());

        let outcome = engine
            .execute(
                &env,
                &BattleAction::Attack {
                    attacker: unit_id(1),
                    target: Some(unit_id(10)),
                },
            )
            .unwrap();

        assert!(outcome.hits[0].killed);
        assert_eq!(outcome.phase, RoundPhase::BattleOver);
        assert!(state.unit(unit_id(10)).unwrap().has_status(StatusFlags::DEAD));
        assert!(state.unit(unit_id(10)).unwrap().hp <= 0);
        assert!(!state.turn_queue.contains(unit_id(10)));
        assert_eq!(state.winner, Some(Side::Attacker));
    }

    #[test]
    fn double_attacker_acts_again_before_anyone_else() {
        let mut state = two_on_one();
        let oracle = FixedOracle::new()
            .double_attack(unit_id(1))
            .attack_spec(
                unit_id(1),
                AttackSpec::damage(attack_id(1), AttackSource::Weapon, AttackReach::Any, 1),
            );
        let env = env_with(&oracle);
        let mut engine = BattleEngine::new(&mut state, BattleConfig::default());

        let action = BattleAction::Attack {
            attacker: unit_id(1),
            target: Some(unit_id(10)),
        };
        engine.execute(&env, &action).unwrap();

        // Re-queued at the front with one attack remaining.
        let front = engine.state().turn_queue.front().copied().unwrap();
        assert_eq!(front.unit, unit_id(1));
        assert_eq!(front.attacks_left, 1);

        engine.execute(&env, &action).unwrap();
        assert_ne!(
            engine.state().turn_queue.front().map(|e| e.unit),
            Some(unit_id(1))
        );
    }

    #[test]
    fn rejected_action_leaves_state_untouched() {
        let mut state = two_on_one();
        let oracle = FixedOracle::new();
        let env = env_with(&oracle);
        let mut engine = BattleEngine::new(&mut state, BattleConfig::default());
        engine.prepare(&env).unwrap();

        let before = engine.state().clone();
        let result = engine.execute(
            &env,
            &BattleAction::Attack {
                attacker: unit_id(2),
                target: Some(unit_id(10)),
            },
        );

        assert!(matches!(
            result,
            Err(ExecuteError::Action(ActionError::IllegalAction {
                reason: IllegalActionReason::NotUnitsTurn { .. }
            }))
        ));
        assert_eq!(*engine.state(), before);
    }

    #[test]
    fn attacking_an_ally_is_an_invalid_target() {
        let mut state = two_on_one();
        let oracle = FixedOracle::new();
        let env = env_with(&oracle);
        let mut engine = BattleEngine::new(&mut state, BattleConfig::default());

        let result = engine.execute(
            &env,
            &BattleAction::Attack {
                attacker: unit_id(1),
                target: Some(unit_id(2)),
            },
        );
        assert!(matches!(
            result,
            Err(ExecuteError::Action(ActionError::InvalidTarget { .. }))
        ));
    }

    #[test]
    fn wait_defers_the_turn_and_defend_marks_the_round() {
        let mut state = two_on_one();
        let oracle = FixedOracle::new();
        let env = env_with(&oracle);
        let mut engine = BattleEngine::new(&mut state, BattleConfig::default());

        engine
            .execute(&env, &BattleAction::Wait { unit: unit_id(1) })
            .unwrap();
        assert_ne!(
            engine.state().turn_queue.front().map(|e| e.unit),
            Some(unit_id(1))
        );

        let next = engine.state().turn_queue.front().unwrap().unit;
        engine
            .execute(&env, &BattleAction::Defend { unit: next })
            .unwrap();
        assert!(engine.state().unit(next).unwrap().has_status(StatusFlags::DEFEND));
    }

    #[test]
    fn retreat_after_wait_skips_the_next_round_entirely() {
        let mut state = two_on_one();
        let oracle = FixedOracle::new();
        let env = env_with(&oracle);
        let mut engine = BattleEngine::new(&mut state, BattleConfig::default());

        engine
            .execute(&env, &BattleAction::Wait { unit: unit_id(1) })
            .unwrap();

        // Burn the other turns so the waited unit comes up again.
        let mut guard = 0;
        while engine.state().turn_queue.front().map(|e| e.unit) != Some(unit_id(1)) {
            let unit = engine.state().turn_queue.front().unwrap().unit;
            engine.execute(&env, &BattleAction::Skip { unit }).unwrap();
            guard += 1;
            assert!(guard < 8, "waited unit never came back up");
        }

        engine
            .execute(&env, &BattleAction::Retreat { unit: unit_id(1) })
            .unwrap();

        // The next round built without it, and the retreat completed.
        assert_eq!(engine.state().current_round, 2);
        assert!(!engine.state().turn_queue.contains(unit_id(1)));
        assert!(engine
            .state()
            .unit(unit_id(1))
            .unwrap()
            .has_status(StatusFlags::RETREATED));
    }

    #[test]
    fn item_use_is_limited_per_battle() {
        let mut state = two_on_one();
        for n in 0..4 {
            assert!(state.record_item_use(item_id(n)));
        }
        let oracle = FixedOracle::new().item(
            item_id(9),
            AttackSpec::damage(attack_id(5), AttackSource::Life, AttackReach::Any, 8)
                .with_class(AttackClass::Heal),
        );
        let env = env_with(&oracle);
        let mut engine = BattleEngine::new(&mut state, BattleConfig::default());

        let result = engine.execute(
            &env,
            &BattleAction::UseItem {
                unit: unit_id(1),
                item: item_id(9),
                target: Some(unit_id(1)),
            },
        );
        assert!(matches!(
            result,
            Err(ExecuteError::Action(ActionError::IllegalAction {
                reason: IllegalActionReason::ItemLimitReached
            }))
        ));
    }

    #[test]
    fn modifier_capacity_becomes_a_warning_not_a_failure() {
        let mut state = two_on_one();
        for n in 0..BattleConfig::MAX_MODIFIERS as u16 {
            state
                .apply_modifier(unit_id(2), unit_id(1), attack_id(100 + n))
                .unwrap();
        }
        let oracle = FixedOracle::new().attack_spec(
            unit_id(1),
            AttackSpec::damage(attack_id(1), AttackSource::Life, AttackReach::Any, 0)
                .with_class(AttackClass::BoostDamage)
                .with_level(1),
        );
        let env = env_with(&oracle);
        let mut engine = BattleEngine::new(&mut state, BattleConfig::default());

        let outcome = engine
            .execute(
                &env,
                &BattleAction::Attack {
                    attacker: unit_id(1),
                    target: Some(unit_id(1)),
                },
            )
            .unwrap();

        assert_eq!(
            outcome.warnings,
            vec![CapacityWarning::Modifier {
                source: unit_id(1),
                target: unit_id(1),
            }]
        );
    }

    #[test]
    fn auto_picks_a_target_and_attacks() {
        let mut state = two_on_one();
        let oracle = lethal_oracle();
        let env = env_with(&oracle);
        let mut engine = BattleEngine::new(&mut state, BattleConfig::default());

        let outcome = engine
            .execute(&env, &BattleAction::Auto { unit: unit_id(1) })
            .unwrap();
        assert_eq!(outcome.hits[0].target, unit_id(10));
        assert!(outcome.hits[0].killed);
    }

    #[test]
    fn resolve_settles_from_remaining_hit_points() {
        let mut state = two_on_one();
        let oracle = FixedOracle::new();
        let env = env_with(&oracle);
        let mut engine = BattleEngine::new(&mut state, BattleConfig::default());

        engine.execute(&env, &BattleAction::Resolve).unwrap();
        assert_eq!(engine.state().phase, RoundPhase::BattleOver);
        assert_eq!(engine.state().winner, Some(Side::Attacker));
    }
}
