//! Turn scheduling state machine.
//!
//! Drives the per-round phase cycle
//! `RoundStart → TurnsBuilt → InTurn → TurnAdvancing → RoundEnd → RoundStart | BattleOver`.
//! Every decision is a deterministic function of battle state and oracle
//! data; no clock or random input participates, so replaying the same action
//! sequence reproduces the same order everywhere.

use crate::config::BattleConfig;
use crate::env::{BattleEnv, OracleError};
use crate::state::{BattleState, ObjectId, RoundPhase, Side, StatusFlags, TurnEntry};

/// Starts the next round: bumps the round counter, retires retreating
/// units, resets per-round transient statuses and expires lapsed long
/// effects.
pub fn begin_round(state: &mut BattleState, config: &BattleConfig) {
    debug_assert_eq!(state.phase, RoundPhase::RoundStart);

    state.current_round = state.current_round.saturating_add(1);
    let round = state.current_round;

    let mut retired: Vec<ObjectId> = Vec::new();
    for record in state.units.iter_mut() {
        if !record.is_alive() {
            continue;
        }

        // Units that were retreating finish their retreat instead of acting.
        if record.has_status(StatusFlags::RETREAT) || record.retreating_after_wait {
            record.statuses.remove(StatusFlags::RETREAT);
            record.statuses.insert(StatusFlags::RETREATED);
            record.retreating_after_wait = false;
            retired.push(record.unit);
            continue;
        }

        record.set_status(StatusFlags::DEFEND, false);
        record.set_status(StatusFlags::CURED, false);
        record.clear_one_shot_damage_modifiers();

        // Long disables expire a fixed number of rounds after application.
        if record.disable_applied_round != 0
            && round - record.disable_applied_round > config.disable_duration
        {
            record.set_status(StatusFlags::PARALYZE, false);
            record.set_status(StatusFlags::PETRIFY, false);
            record.set_status(StatusFlags::FEAR, false);
        }

        if record.poison_applied_round != 0
            && round - record.poison_applied_round > config.dot_duration
        {
            record
                .statuses
                .remove(StatusFlags::POISON | StatusFlags::POISON_LONG);
            record.poison_applied_round = 0;
            record.poison_attack = ObjectId::NONE;
        }
        if record.frostbite_applied_round != 0
            && round - record.frostbite_applied_round > config.dot_duration
        {
            record
                .statuses
                .remove(StatusFlags::FROSTBITE | StatusFlags::FROSTBITE_LONG);
            record.frostbite_applied_round = 0;
            record.frostbite_attack = ObjectId::NONE;
        }
        if record.blister_applied_round != 0
            && round - record.blister_applied_round > config.dot_duration
        {
            record
                .statuses
                .remove(StatusFlags::BLISTER | StatusFlags::BLISTER_LONG);
            record.blister_applied_round = 0;
            record.blister_attack = ObjectId::NONE;
        }
    }

    // A retired unit's lingering buffs vanish with it.
    for unit in retired {
        state.detach_modifiers(unit);
    }
}

/// Computes the round's turn order.
///
/// Descending initiative (halved by `LOWER_INITIATIVE`), stable tie-break on
/// ascending slot index, then attacker side before defender. Hidden and
/// retreated units never enter the order; double-attack units enter with two
/// attacks on their entry.
pub fn build_turn_order(state: &mut BattleState, env: &BattleEnv<'_>) -> Result<(), OracleError> {
    let units = env.units()?;

    let mut order: Vec<(i16, u8, Side, ObjectId, u8)> = state
        .units
        .iter()
        .filter(|record| {
            record.is_alive()
                && !record.has_status(
                    StatusFlags::HIDDEN | StatusFlags::RETREATED | StatusFlags::UNSUMMONED,
                )
                && !record.retreating_after_wait
        })
        .map(|record| {
            let mut initiative = units.initiative(record.unit);
            if record.has_status(StatusFlags::LOWER_INITIATIVE) {
                initiative /= 2;
            }
            let attacks = units.attacks_per_turn(record.unit).max(1);
            (initiative, record.slot, record.side, record.unit, attacks)
        })
        .collect();

    order.sort_by(|a, b| {
        b.0.cmp(&a.0)
            .then(a.1.cmp(&b.1))
            .then(b.2.is_attacker().cmp(&a.2.is_attacker()))
    });

    state.turn_queue.clear();
    for (_, _, _, unit, attacks) in order {
        if !state.turn_queue.push(TurnEntry::new(unit, attacks)) {
            break;
        }
    }

    state.phase = if state.turn_queue.is_empty() {
        RoundPhase::RoundEnd
    } else {
        RoundPhase::TurnsBuilt
    };
    Ok(())
}

/// Retires the consumed front entry and prepares the next unit.
///
/// A qualifying attack by a unit with attacks remaining re-queues the entry
/// at the front instead, realizing double-attack semantics. The unit that
/// finished its turn loses one-shot damage modifiers; the unit about to act
/// gets its imposed modifiers resolved away before acting.
pub fn advance_turn(state: &mut BattleState, qualifying_attack: bool) {
    state.phase = RoundPhase::TurnAdvancing;

    let Some(front) = state.turn_queue.front().copied() else {
        state.phase = RoundPhase::RoundEnd;
        return;
    };

    let requeued = qualifying_attack
        && front.attacks_left > 1
        && state.turn_queue.contains(front.unit)
        && state.turn_queue.requeue_front();

    if !requeued {
        // The unit's turn is fully over.
        if state.turn_queue.front().map(|e| e.unit) == Some(front.unit) {
            state.turn_queue.advance();
        }
        if let Ok(record) = state.unit_mut(front.unit) {
            record.clear_one_shot_damage_modifiers();
        }
        prepare_next_unit(state);
    }

    state.phase = if state.turn_queue.is_empty() {
        RoundPhase::RoundEnd
    } else {
        RoundPhase::InTurn
    };
}

/// Cleanup run for the unit about to act: effects it imposes on others are
/// removed so they cannot outlive the source's current state.
pub(crate) fn prepare_next_unit(state: &mut BattleState) {
    if let Some(next) = state.turn_queue.front().map(|entry| entry.unit) {
        let _ = state.remove_modifiers_by_source(next);
    }
}

/// Evaluates the end-of-round terminal conditions.
///
/// Fires when one side has no living, non-hidden units, an explicit retreat
/// emptied a side, or the configured round limit was reached (draw).
pub fn check_battle_over(state: &mut BattleState, config: &BattleConfig) -> bool {
    let attacker_out = state.side_defeated(Side::Attacker);
    let defender_out = state.side_defeated(Side::Defender);

    if attacker_out || defender_out {
        state.winner = match (attacker_out, defender_out) {
            (false, true) => Some(Side::Attacker),
            (true, false) => Some(Side::Defender),
            _ => None,
        };
        state.phase = RoundPhase::BattleOver;
        return true;
    }

    if state.current_round >= config.max_rounds {
        state.winner = None;
        state.phase = RoundPhase::BattleOver;
        return true;
    }

    false
}

/// Advances the phase machine until a unit may act or the battle is over.
///
/// Dead or disabled units at the front of the queue lose their turn here;
/// their entries are consumed without an action.
pub fn advance_until_actionable(
    state: &mut BattleState,
    env: &BattleEnv<'_>,
    config: &BattleConfig,
) -> Result<(), OracleError> {
    loop {
        match state.phase {
            RoundPhase::RoundStart => {
                begin_round(state, config);
                build_turn_order(state, env)?;
                if state.phase == RoundPhase::TurnsBuilt {
                    prepare_next_unit(state);
                    state.phase = RoundPhase::InTurn;
                }
            }
            RoundPhase::TurnsBuilt => {
                prepare_next_unit(state);
                state.phase = RoundPhase::InTurn;
            }
            RoundPhase::InTurn => {
                // Mid-round defeat short-circuits the remaining turns.
                if state.side_defeated(Side::Attacker) || state.side_defeated(Side::Defender) {
                    state.turn_queue.clear();
                    state.phase = RoundPhase::RoundEnd;
                    continue;
                }

                let Some(front) = state.turn_queue.front().copied() else {
                    state.phase = RoundPhase::RoundEnd;
                    continue;
                };
                let actionable = state
                    .unit(front.unit)
                    .map(|record| record.is_alive() && !record.is_disabled())
                    .unwrap_or(false);
                if actionable {
                    return Ok(());
                }
                advance_turn(state, false);
            }
            RoundPhase::TurnAdvancing => {
                state.phase = if state.turn_queue.is_empty() {
                    RoundPhase::RoundEnd
                } else {
                    RoundPhase::InTurn
                };
            }
            RoundPhase::RoundEnd => {
                if check_battle_over(state, config) {
                    return Ok(());
                }
                state.phase = RoundPhase::RoundStart;
            }
            RoundPhase::BattleOver => return Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BattleConfig;
    use crate::state::{RoundPhase, StatusFlags};
    use crate::testutil::{env_with, unit_id, FixedOracle, two_on_one};

    #[test]
    fn turn_order_sorts_by_initiative_with_slot_tie_break() {
        let mut state = two_on_one();
        let oracle = FixedOracle::new()
            .initiative(unit_id(1), 40)
            .initiative(unit_id(2), 60)
            .initiative(unit_id(10), 60);
        let env = env_with(&oracle);

        state.phase = RoundPhase::RoundStart;
        begin_round(&mut state, &BattleConfig::default());
        build_turn_order(&mut state, &env).unwrap();

        let order: Vec<_> = state.turn_queue.iter().map(|e| e.unit).collect();
        // Units 2 and 10 tie at 60; unit 10 sits at slot 0, unit 2 at slot 2.
        assert_eq!(order, vec![unit_id(10), unit_id(2), unit_id(1)]);
    }

    #[test]
    fn lowered_initiative_halves_the_oracle_value() {
        let mut state = two_on_one();
        state
            .set_status(unit_id(10), StatusFlags::LOWER_INITIATIVE, true)
            .unwrap();
        let oracle = FixedOracle::new()
            .initiative(unit_id(1), 40)
            .initiative(unit_id(2), 10)
            .initiative(unit_id(10), 60);
        let env = env_with(&oracle);

        state.phase = RoundPhase::RoundStart;
        begin_round(&mut state, &BattleConfig::default());
        build_turn_order(&mut state, &env).unwrap();

        let order: Vec<_> = state.turn_queue.iter().map(|e| e.unit).collect();
        assert_eq!(order, vec![unit_id(1), unit_id(10), unit_id(2)]);
    }

    #[test]
    fn retreating_units_finish_their_retreat_at_round_start() {
        let mut state = two_on_one();
        state
            .set_status(unit_id(2), StatusFlags::RETREAT, true)
            .unwrap();

        begin_round(&mut state, &BattleConfig::default());

        let record = state.unit(unit_id(2)).unwrap();
        assert!(record.has_status(StatusFlags::RETREATED));
        assert!(!record.has_status(StatusFlags::RETREAT));
    }

    #[test]
    fn waited_retreater_is_excluded_from_the_next_order() {
        let mut state = two_on_one();
        state.unit_mut(unit_id(2)).unwrap().retreating_after_wait = true;
        let oracle = FixedOracle::default();
        let env = env_with(&oracle);

        begin_round(&mut state, &BattleConfig::default());
        build_turn_order(&mut state, &env).unwrap();

        assert!(!state.turn_queue.contains(unit_id(2)));
    }

    #[test]
    fn round_limit_produces_a_draw() {
        let mut state = two_on_one();
        let config = BattleConfig::with_max_rounds(1);
        state.current_round = 1;

        assert!(check_battle_over(&mut state, &config));
        assert_eq!(state.phase, RoundPhase::BattleOver);
        assert_eq!(state.winner, None);
    }

    #[test]
    fn long_disable_expires_after_its_duration() {
        let mut state = two_on_one();
        let config = BattleConfig::default();
        {
            let record = state.unit_mut(unit_id(10)).unwrap();
            record.set_status(StatusFlags::PARALYZE, true);
            record.set_status(StatusFlags::DISABLE_LONG, true);
            record.disable_applied_round = 1;
        }

        state.current_round = config.disable_duration;
        begin_round(&mut state, &config);
        assert!(state
            .unit(unit_id(10))
            .unwrap()
            .has_status(StatusFlags::PARALYZE));

        state.phase = RoundPhase::RoundStart;
        begin_round(&mut state, &config);
        let record = state.unit(unit_id(10)).unwrap();
        assert!(!record.has_status(StatusFlags::PARALYZE));
        assert!(!record.has_status(StatusFlags::DISABLE_LONG));
    }
}
