//! Attack effect application and the damage formula.
//!
//! One function per concern: [`effective_damage`] is the pure damage
//! computation shared with auto-targeting, [`apply_spec_to_target`] mutates
//! the battle state for a single (attack, target) pair. Target legality is
//! decided by the resolver before anything here runs.

use crate::env::UnitOracle;
use crate::state::error::{LedgerError, ModifierError, SlotError};
use crate::state::{
    AttackClass, AttackSpec, BattleState, ClassWards, ObjectId, SourceWards, StatusFlags,
    UnitRecord,
};

/// Outcome of applying one attack to one target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HitResult {
    pub target: ObjectId,
    /// Hit points removed (negative values mean healing).
    pub damage: i32,
    pub killed: bool,
    /// Statuses inflicted on the target by this hit.
    pub inflicted: StatusFlags,
}

impl HitResult {
    fn none(target: ObjectId) -> Self {
        Self {
            target,
            damage: 0,
            killed: false,
            inflicted: StatusFlags::empty(),
        }
    }
}

/// Errors surfaced while applying attack effects.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CombatError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Modifier(#[from] ModifierError),
    #[error(transparent)]
    Slot(#[from] SlotError),
}

/// Damage one application of `spec` would deal to `target`, after the
/// attacker's power reduction, boost/lower statuses and the target's
/// armor stack.
pub fn effective_damage(
    spec: &AttackSpec,
    attacker: &UnitRecord,
    target: &UnitRecord,
    units: &dyn UnitOracle,
) -> i32 {
    let base = (spec.damage as i32 - attacker.attack_power_reduction).max(0);
    let boosted = base * (100 + attacker.statuses.boost_damage_percent()) / 100;
    let lowered = boosted * (100 - attacker.statuses.lower_damage_percent()) / 100;

    let armor = (units.armor(target.unit) as i32 + target.fortification_armor
        - target.shattered_armor)
        .clamp(0, 100);
    lowered * (100 - armor) / 100
}

/// Whether the target's immunity against this spec is still armed.
///
/// An armed immunity absorbs one application and becomes warded off
/// (suppressed) in the process; `restore_wards` re-arms it.
pub fn immunity_armed(spec: &AttackSpec, target: &UnitRecord, units: &dyn UnitOracle) -> bool {
    let source_ward = SourceWards::from_source(spec.source);
    if units.source_immunities(target.unit).contains(source_ward)
        && !target.is_source_ward_removed(source_ward)
    {
        return true;
    }

    let class_ward = ClassWards::from_class(spec.class);
    units.class_immunities(target.unit).contains(class_ward)
        && !target.is_class_ward_removed(class_ward)
}

/// Applies a single attack to a single resolved target.
///
/// Deaths run through the ledger's hit point transition; experience is
/// awarded to the attacker the moment the kill is counted.
pub fn apply_spec_to_target(
    state: &mut BattleState,
    units: &dyn UnitOracle,
    attacker_id: ObjectId,
    spec: &AttackSpec,
    target_id: ObjectId,
) -> Result<HitResult, CombatError> {
    let round = state.current_round;
    let mut result = HitResult::none(target_id);

    // Armed immunities absorb exactly one application of a matching attack.
    if !spec.class.targets_allies() {
        let target = state.unit(target_id)?;
        if immunity_armed(spec, target, units) {
            let source_ward = SourceWards::from_source(spec.source);
            if units.source_immunities(target_id).contains(source_ward) {
                state.remove_source_ward(target_id, spec.source)?;
            } else {
                state.remove_class_ward(target_id, spec.class)?;
            }
            return Ok(result);
        }
    }

    match spec.class {
        AttackClass::Damage | AttackClass::Drain => {
            let attacker = state.unit(attacker_id)?.clone();
            let target = state.unit(target_id)?;
            let damage = effective_damage(spec, &attacker, target, units);
            let remaining = target.hp as i32 - damage;

            state.set_hp(target_id, remaining)?;
            result.damage = damage;
            result.killed = remaining <= 0;

            if result.killed {
                award_experience(state, units, attacker_id, target_id)?;
            }

            // Drain feeds half the damage dealt back to the attacker.
            if spec.class == AttackClass::Drain && damage > 0 {
                let attacker_hp = state.unit(attacker_id)?.hp as i32;
                let healed =
                    (attacker_hp + damage / 2).min(units.max_hp(attacker_id) as i32);
                state.set_hp(attacker_id, healed)?;
            }
        }

        AttackClass::Heal => {
            let target = state.unit(target_id)?;
            if target.is_alive() {
                let healed =
                    (target.hp as i32 + spec.damage as i32).min(units.max_hp(target_id) as i32);
                result.damage = target.hp as i32 - healed;
                state.set_hp(target_id, healed)?;
            }
        }

        AttackClass::Revive => {
            if unit_can_be_revived(state, target_id) {
                let record = state.unit_mut(target_id)?;
                record.statuses.remove(StatusFlags::DEAD);
                record.revived = true;
                record.hp = spec.damage.max(1);
            }
        }

        AttackClass::Cure => {
            let record = state.unit_mut(target_id)?;
            record.statuses.remove(
                StatusFlags::DOT_ANY
                    | StatusFlags::POISON_LONG
                    | StatusFlags::FROSTBITE_LONG
                    | StatusFlags::BLISTER_LONG,
            );
            record.poison_attack = ObjectId::NONE;
            record.frostbite_attack = ObjectId::NONE;
            record.blister_attack = ObjectId::NONE;
            record.poison_applied_round = 0;
            record.frostbite_applied_round = 0;
            record.blister_applied_round = 0;
            record.set_status(StatusFlags::CURED, true);
            result.inflicted = StatusFlags::CURED;
        }

        AttackClass::BoostDamage => {
            let flag = match spec.level {
                0 | 1 => StatusFlags::BOOST_DAMAGE_LVL1,
                2 => StatusFlags::BOOST_DAMAGE_LVL2,
                3 => StatusFlags::BOOST_DAMAGE_LVL3,
                _ => StatusFlags::BOOST_DAMAGE_LVL4,
            };
            // The relation edge must exist before the status does, or the
            // effect could never be reverted. Capacity failure is a no-op.
            state.apply_modifier(attacker_id, target_id, spec.id)?;
            inflict(state, target_id, flag, spec.long.then_some(StatusFlags::BOOST_DAMAGE_LONG))?;
            result.inflicted = flag;
        }

        AttackClass::LowerDamage => {
            let flag = match spec.level {
                0 | 1 => StatusFlags::LOWER_DAMAGE_LVL1,
                _ => StatusFlags::LOWER_DAMAGE_LVL2,
            };
            state.apply_modifier(attacker_id, target_id, spec.id)?;
            inflict(state, target_id, flag, spec.long.then_some(StatusFlags::LOWER_DAMAGE_LONG))?;
            result.inflicted = flag;
        }

        AttackClass::LowerInitiative => {
            state.apply_modifier(attacker_id, target_id, spec.id)?;
            inflict(
                state,
                target_id,
                StatusFlags::LOWER_INITIATIVE,
                spec.long.then_some(StatusFlags::LOWER_INITIATIVE_LONG),
            )?;
            result.inflicted = StatusFlags::LOWER_INITIATIVE;
        }

        AttackClass::Paralyze | AttackClass::Petrify | AttackClass::Fear => {
            let flag = match spec.class {
                AttackClass::Paralyze => StatusFlags::PARALYZE,
                AttackClass::Petrify => StatusFlags::PETRIFY,
                _ => StatusFlags::FEAR,
            };
            inflict(state, target_id, flag, spec.long.then_some(StatusFlags::DISABLE_LONG))?;
            state.unit_mut(target_id)?.disable_applied_round = round;
            result.inflicted = flag;
        }

        AttackClass::Poison | AttackClass::Frostbite | AttackClass::Blister => {
            let (flag, long_flag) = match spec.class {
                AttackClass::Poison => (StatusFlags::POISON, StatusFlags::POISON_LONG),
                AttackClass::Frostbite => (StatusFlags::FROSTBITE, StatusFlags::FROSTBITE_LONG),
                _ => (StatusFlags::BLISTER, StatusFlags::BLISTER_LONG),
            };
            inflict(state, target_id, flag, spec.long.then_some(long_flag))?;
            let record = state.unit_mut(target_id)?;
            match spec.class {
                AttackClass::Poison => {
                    record.poison_attack = spec.id;
                    record.poison_applied_round = round;
                }
                AttackClass::Frostbite => {
                    record.frostbite_attack = spec.id;
                    record.frostbite_applied_round = round;
                }
                _ => {
                    record.blister_attack = spec.id;
                    record.blister_applied_round = round;
                }
            }
            result.inflicted = flag;
        }

        AttackClass::Shatter => {
            let record = state.unit_mut(target_id)?;
            record.shattered_armor = record.shattered_armor.saturating_add(spec.damage as i32);
        }

        AttackClass::Summon => {
            if let Some(unit) = spec.summon {
                let side = state.unit(attacker_id)?.side;
                let hp = spec.damage.max(1);
                state.add_summoned_unit(attacker_id, side, unit, hp)?;
            }
        }

        AttackClass::GiveAttack => {
            state.give_attack(target_id, 2)?;
        }

        AttackClass::BestowWards => {
            state.restore_wards(target_id)?;
        }

        AttackClass::DrainLevel => {
            inflict(state, target_id, StatusFlags::TRANSFORM_DRAIN_LEVEL, None)?;
            state.unit_mut(target_id)?.transform_applied_round = round;
            result.inflicted = StatusFlags::TRANSFORM_DRAIN_LEVEL;
        }

        AttackClass::TransformOther => {
            inflict(
                state,
                target_id,
                StatusFlags::TRANSFORM,
                spec.long.then_some(StatusFlags::TRANSFORM_LONG),
            )?;
            state.unit_mut(target_id)?.transform_applied_round = round;
            result.inflicted = StatusFlags::TRANSFORM;
        }

        AttackClass::TransformSelf => {
            inflict(state, attacker_id, StatusFlags::TRANSFORM_SELF, None)?;
            state.unit_mut(attacker_id)?.transform_applied_round = round;
        }

        AttackClass::Doppelganger => {
            // The doppelganger copies the target: the transform lands on
            // the acting unit, the target is bookkeeping only.
            let base = state.unit(target_id)?.unit;
            let record = state.unit_mut(attacker_id)?;
            record.statuses.insert(StatusFlags::TRANSFORM_DOPPELGANGER);
            record.base_unit = base;
            record.transform_applied_round = round;
        }
    }

    Ok(result)
}

/// Counts the kill for experience exactly once.
fn award_experience(
    state: &mut BattleState,
    units: &dyn UnitOracle,
    attacker_id: ObjectId,
    target_id: ObjectId,
) -> Result<(), CombatError> {
    if state.status(target_id, StatusFlags::XP_COUNTED)? {
        return Ok(());
    }
    state.set_status(target_id, StatusFlags::XP_COUNTED, true)?;

    let reward = units.xp_reward(target_id) as i32;
    let current = state.unit(attacker_id)?.xp as i32;
    state.set_xp(attacker_id, current + reward)?;
    Ok(())
}

fn inflict(
    state: &mut BattleState,
    target: ObjectId,
    flag: StatusFlags,
    long_flag: Option<StatusFlags>,
) -> Result<(), LedgerError> {
    state.set_status(target, flag, true)?;
    if let Some(long_flag) = long_flag {
        state.set_status(target, long_flag, true)?;
    }
    Ok(())
}

/// A unit can be healed while it lives and is still in the fight.
pub fn unit_can_be_healed(state: &BattleState, unit: ObjectId) -> bool {
    state
        .unit(unit)
        .map(|record| record.is_alive() && record.is_targetable())
        .unwrap_or(false)
}

/// A unit can be cured while alive and suffering a removable effect.
pub fn unit_can_be_cured(state: &BattleState, unit: ObjectId) -> bool {
    state
        .unit(unit)
        .map(|record| {
            record.is_alive()
                && record.has_status(
                    StatusFlags::DOT_ANY | StatusFlags::LOWER_ANY | StatusFlags::LOWER_INITIATIVE,
                )
        })
        .unwrap_or(false)
}

/// A dead unit can be revived until its experience is counted, unless it
/// was itself summoned mid-battle.
pub fn unit_can_be_revived(state: &BattleState, unit: ObjectId) -> bool {
    state
        .unit(unit)
        .map(|record| {
            record.has_status(StatusFlags::DEAD)
                && !record.has_status(StatusFlags::XP_COUNTED | StatusFlags::SUMMON)
        })
        .unwrap_or(false)
}
