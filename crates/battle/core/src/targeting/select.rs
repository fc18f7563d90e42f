//! Deterministic auto-target selection.
//!
//! Used for AI-controlled actors and the `Auto` action. Every heuristic is
//! a pure function of battle state and oracle data with a final tie-break on
//! ascending slot index, so independent participants pick the same target.

use std::cmp::Reverse;

use crate::combat::{effective_damage, immunity_armed, unit_can_be_cured, unit_can_be_revived};
use crate::env::UnitOracle;
use crate::state::error::LedgerError;
use crate::state::{AttackClass, AttackReach, AttackSpec, BattleState, ObjectId, StatusFlags};

use super::{resolve_targets, TargetList};

/// Picks the attack target an AI actor should use, dispatching on the
/// attack's class and reach. Returns `None` when no legal target exists.
pub fn find_attack_target(
    spec: &AttackSpec,
    state: &BattleState,
    units: &dyn UnitOracle,
    actor: ObjectId,
) -> Result<Option<ObjectId>, LedgerError> {
    let candidates = resolve_targets(spec, state, actor)?;

    let picked = match spec.class {
        AttackClass::BoostDamage => find_boost_target(state, &candidates),
        AttackClass::Fear => find_fear_target(state, units, &candidates),
        AttackClass::Doppelganger => find_doppelganger_target(state, units, &candidates),
        AttackClass::Heal => find_heal_target(state, units, &candidates),
        AttackClass::Cure => candidates
            .iter()
            .copied()
            .find(|&unit| unit_can_be_cured(state, unit)),
        AttackClass::Revive => find_revive_target(state, actor),
        _ if spec.class.is_damage() || spec.class.is_dot() => match spec.reach {
            // No selection choice exists for All reach; report the first.
            AttackReach::All => candidates.first().copied(),
            AttackReach::Any | AttackReach::Adjacent => {
                find_damage_target(spec, state, units, actor, &candidates)?
            }
        },
        _ => candidates.first().copied(),
    };

    Ok(picked)
}

/// Damage heuristic: lethal targets first, then the highest externally
/// scored threat, then the lowest slot index.
fn find_damage_target(
    spec: &AttackSpec,
    state: &BattleState,
    units: &dyn UnitOracle,
    actor: ObjectId,
    candidates: &TargetList,
) -> Result<Option<ObjectId>, LedgerError> {
    let attacker = state.unit(actor)?;

    Ok(candidates
        .iter()
        .copied()
        .filter_map(|unit| state.unit(unit).ok())
        .filter(|target| !immunity_armed(spec, target, units))
        .min_by_key(|target| {
            let damage = effective_damage(spec, attacker, target, units);
            let lethal = damage >= target.hp as i32;
            (
                Reverse(lethal),
                Reverse(units.threat(target.unit)),
                target.slot,
            )
        })
        .map(|target| target.unit))
}

/// Boost attacks prefer the ally whose damage is currently boosted least.
fn find_boost_target(state: &BattleState, candidates: &TargetList) -> Option<ObjectId> {
    candidates
        .iter()
        .copied()
        .filter_map(|unit| state.unit(unit).ok())
        .min_by_key(|target| (target.statuses.boost_damage_percent(), target.slot))
        .map(|target| target.unit)
}

/// Fear attacks prefer the most valuable enemy that is not yet disabled.
fn find_fear_target(
    state: &BattleState,
    units: &dyn UnitOracle,
    candidates: &TargetList,
) -> Option<ObjectId> {
    candidates
        .iter()
        .copied()
        .filter_map(|unit| state.unit(unit).ok())
        .filter(|target| !target.is_disabled())
        .min_by_key(|target| (Reverse(units.unit_value(target.unit)), target.slot))
        .map(|target| target.unit)
}

/// Doppelgangers copy the enemy least likely to already be transformed.
fn find_doppelganger_target(
    state: &BattleState,
    units: &dyn UnitOracle,
    candidates: &TargetList,
) -> Option<ObjectId> {
    candidates
        .iter()
        .copied()
        .filter_map(|unit| state.unit(unit).ok())
        .min_by_key(|target| {
            let transformed = target.statuses.intersects(
                StatusFlags::TRANSFORM
                    | StatusFlags::TRANSFORM_SELF
                    | StatusFlags::TRANSFORM_DOPPELGANGER,
            );
            (transformed, Reverse(units.unit_value(target.unit)), target.slot)
        })
        .map(|target| target.unit)
}

/// Heals go to the ally missing the most hit points.
fn find_heal_target(
    state: &BattleState,
    units: &dyn UnitOracle,
    candidates: &TargetList,
) -> Option<ObjectId> {
    candidates
        .iter()
        .copied()
        .filter_map(|unit| state.unit(unit).ok())
        .filter(|target| (target.hp as i32) < units.max_hp(target.unit) as i32)
        .min_by_key(|target| (target.hp, target.slot))
        .map(|target| target.unit)
}

/// Revives bypass the resolver gate (the gate never admits dead units) and
/// scan the actor's side directly.
fn find_revive_target(state: &BattleState, actor: ObjectId) -> Option<ObjectId> {
    let side = state.unit(actor).ok()?.side;
    let mut revivable: Vec<_> = state
        .units()
        .filter(|record| record.side == side && unit_can_be_revived(state, record.unit))
        .collect();
    revivable.sort_by_key(|record| record.slot);
    revivable.first().map(|record| record.unit)
}
