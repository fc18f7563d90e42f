//! Target resolution: which units an attack may legally apply to.
//!
//! Resolution is a pure function family over the battle state; nothing here
//! mutates. The slot geometry is two columns of three lines per side: even
//! slots form the front column, `slot >> 1` is the line.

pub mod select;

use arrayvec::ArrayVec;

use crate::config::BattleConfig;
use crate::state::error::LedgerError;
use crate::state::{AttackReach, AttackSpec, BattleState, ObjectId, Side, UnitRecord};

/// Resolved candidate set, ordered by ascending slot for determinism.
pub type TargetList = ArrayVec<ObjectId, { BattleConfig::MAX_UNITS }>;

#[inline]
pub const fn slot_line(slot: u8) -> u8 {
    slot >> 1
}

#[inline]
pub const fn is_front_slot(slot: u8) -> bool {
    slot & 1 == 0
}

/// Status/side gating shared by every reach category: a unit whose
/// experience was counted, or that is dead, unsummoned, retreated or hidden
/// is never a valid target, and the attack's class fixes which side it may
/// apply to.
pub fn can_attack_unit(spec: &AttackSpec, actor_side: Side, target: &UnitRecord) -> bool {
    let required_side = if spec.class.targets_allies() {
        actor_side
    } else {
        actor_side.opponent()
    };
    target.side == required_side && target.is_targetable()
}

/// Whether the acting unit's own allies leave its adjacent attack a path to
/// the opposing line.
///
/// A back-column unit is covered by a living front-column ally within one
/// line of its own; covered units cannot reach past the cover. Front-column
/// units always have a path.
pub fn allies_not_preventing_adjacent_attack(state: &BattleState, side: Side, slot: u8) -> bool {
    if is_front_slot(slot) {
        return true;
    }
    let line = slot_line(slot);
    !(0..BattleConfig::MAX_GROUP_SLOTS as u8)
        .filter(|&s| is_front_slot(s) && slot_line(s).abs_diff(line) <= 1)
        .any(|s| state.living_at_slot(side, s).is_some())
}

/// Computes the legal target set for an attack, polymorphic over reach.
///
/// `All` and `Any` differ only in whether a choice exists afterwards; both
/// return every unit passing the validity gate. `Adjacent` additionally
/// applies the slot geometry and the ally-blocking rule, which is evaluated
/// before the candidate set is finalized.
pub fn resolve_targets(
    spec: &AttackSpec,
    state: &BattleState,
    actor: ObjectId,
) -> Result<TargetList, LedgerError> {
    let actor_record = state.unit(actor)?;
    let actor_side = actor_record.side;
    let actor_slot = actor_record.slot;

    let mut targets = TargetList::new();
    let mut push_sorted = |targets: &mut TargetList, records: Vec<&UnitRecord>| {
        let mut records = records;
        records.sort_by_key(|record| record.slot);
        for record in records {
            targets.push(record.unit);
        }
    };

    match spec.reach {
        AttackReach::All | AttackReach::Any => {
            let candidates: Vec<&UnitRecord> = state
                .units()
                .filter(|record| can_attack_unit(spec, actor_side, record))
                .collect();
            push_sorted(&mut targets, candidates);
        }

        AttackReach::Adjacent => {
            let unblocked = allies_not_preventing_adjacent_attack(state, actor_side, actor_slot);

            if spec.class.targets_allies() {
                // Adjacent reach never includes the acting unit's own slot.
                let candidates: Vec<&UnitRecord> = state
                    .units()
                    .filter(|record| record.unit != actor)
                    .filter(|record| can_attack_unit(spec, actor_side, record))
                    .filter(|record| {
                        // Covered units only reach the allies covering them.
                        unblocked
                            || (is_front_slot(record.slot)
                                && slot_line(record.slot).abs_diff(slot_line(actor_slot)) <= 1)
                    })
                    .collect();
                push_sorted(&mut targets, candidates);
            } else if unblocked {
                let enemy = actor_side.opponent();
                let front_line_alive = (0..BattleConfig::MAX_GROUP_SLOTS as u8)
                    .filter(|&s| is_front_slot(s))
                    .any(|s| state.living_at_slot(enemy, s).is_some());

                let candidates: Vec<&UnitRecord> = state
                    .units()
                    .filter(|record| can_attack_unit(spec, actor_side, record))
                    .filter(|record| is_front_slot(record.slot) == front_line_alive)
                    .collect();
                push_sorted(&mut targets, candidates);
            }
        }
    }

    Ok(targets)
}
