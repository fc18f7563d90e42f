//! Modifier graph: who is buffing/debuffing whom.
//!
//! The relation is directed (source imposes modifier on target) and stored
//! as two bounded index views that are always updated together, so the
//! symmetric invariant holds by construction. All operations are O(capacity).

use super::error::ModifierError;
use super::types::{ModifiedUnit, ObjectId};
use super::BattleState;

impl BattleState {
    /// Records that `source` imposes `modifier` on `target`.
    ///
    /// Transactional: capacities on both sides are checked before either
    /// view mutates, so a failure leaves the relation untouched.
    pub fn apply_modifier(
        &mut self,
        source: ObjectId,
        target: ObjectId,
        modifier: ObjectId,
    ) -> Result<(), ModifierError> {
        let source_full = self.unit(source)?.modified_units.is_full();
        let target_full = self.unit(target)?.modifiers.is_full();
        if source_full || target_full {
            return Err(ModifierError::capacity_exceeded(
                source,
                target,
                self.current_round,
            ));
        }

        self.unit_mut(source)?.modified_units.push(ModifiedUnit {
            unit: target,
            modifier,
        });
        self.unit_mut(target)?.modifiers.push(modifier);
        Ok(())
    }

    /// Removes every modifier `source` currently imposes, on any target.
    ///
    /// Runs before the source's own turn begins so stale effects from a
    /// unit that has since died or changed state do not linger.
    pub fn remove_modifiers_by_source(&mut self, source: ObjectId) -> Result<(), ModifierError> {
        let edges: Vec<ModifiedUnit> = self.unit(source)?.modified_units.iter().copied().collect();

        for edge in &edges {
            if let Ok(target) = self.unit_mut(edge.unit) {
                if let Some(position) = target.modifiers.iter().position(|m| *m == edge.modifier) {
                    target.modifiers.remove(position);
                }
            }
        }
        self.unit_mut(source)?.modified_units.clear();
        Ok(())
    }

    /// Removes a single modifier from `target`, updating the imposing
    /// unit's view as well.
    pub fn remove_modifier(
        &mut self,
        target: ObjectId,
        modifier: ObjectId,
    ) -> Result<(), ModifierError> {
        let record = self.unit_mut(target)?;
        if let Some(position) = record.modifiers.iter().position(|m| *m == modifier) {
            record.modifiers.remove(position);
        }

        for source in self.units.iter_mut() {
            if let Some(position) = source
                .modified_units
                .iter()
                .position(|edge| edge.unit == target && edge.modifier == modifier)
            {
                source.modified_units.remove(position);
            }
        }
        Ok(())
    }

    pub fn unit_has_modifier(&self, target: ObjectId, modifier: ObjectId) -> bool {
        self.unit(target)
            .map(|record| record.modifiers.contains(&modifier))
            .unwrap_or(false)
    }

    /// Strips the unit out of the relation entirely, as both source and
    /// target. Used by the death transition and `remove_unit`.
    pub(crate) fn detach_modifiers(&mut self, unit: ObjectId) {
        let edges: Vec<ModifiedUnit> = self
            .unit(unit)
            .map(|record| record.modified_units.iter().copied().collect())
            .unwrap_or_default();
        for edge in &edges {
            if let Ok(target) = self.unit_mut(edge.unit) {
                if let Some(position) = target.modifiers.iter().position(|m| *m == edge.modifier) {
                    target.modifiers.remove(position);
                }
            }
        }

        for record in self.units.iter_mut() {
            if record.unit == unit {
                record.modified_units.clear();
                record.modifiers.clear();
            } else {
                record.modified_units.retain(|edge| edge.unit != unit);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::BattleConfig;
    use crate::state::{ObjectCategory, ObjectId};
    use crate::testutil::{two_on_one, unit_id};

    fn modifier_id(n: u16) -> ObjectId {
        ObjectId::new(ObjectCategory::Modifier, n)
    }

    #[test]
    fn apply_then_remove_by_source_leaves_both_views_empty() {
        let mut state = two_on_one();
        state
            .apply_modifier(unit_id(1), unit_id(2), modifier_id(1))
            .unwrap();
        state
            .apply_modifier(unit_id(1), unit_id(10), modifier_id(2))
            .unwrap();

        assert!(state.unit_has_modifier(unit_id(2), modifier_id(1)));

        state.remove_modifiers_by_source(unit_id(1)).unwrap();

        assert!(state.unit(unit_id(1)).unwrap().modified_units.is_empty());
        assert!(state.unit(unit_id(2)).unwrap().modifiers.is_empty());
        assert!(state.unit(unit_id(10)).unwrap().modifiers.is_empty());
    }

    #[test]
    fn capacity_overflow_is_rejected_without_partial_application() {
        let mut state = two_on_one();
        for n in 0..BattleConfig::MAX_MODIFIERS as u16 {
            state
                .apply_modifier(unit_id(1), unit_id(2), modifier_id(n))
                .unwrap();
        }

        let before = state.clone();
        let result = state.apply_modifier(unit_id(1), unit_id(10), modifier_id(99));
        assert!(result.is_err());
        assert_eq!(state, before);
    }

    #[test]
    fn remove_single_modifier_updates_both_sides() {
        let mut state = two_on_one();
        state
            .apply_modifier(unit_id(1), unit_id(2), modifier_id(1))
            .unwrap();
        state
            .apply_modifier(unit_id(1), unit_id(2), modifier_id(2))
            .unwrap();

        state.remove_modifier(unit_id(2), modifier_id(1)).unwrap();

        assert!(!state.unit_has_modifier(unit_id(2), modifier_id(1)));
        assert!(state.unit_has_modifier(unit_id(2), modifier_id(2)));
        assert_eq!(state.unit(unit_id(1)).unwrap().modified_units.len(), 1);
    }

    #[test]
    fn death_detaches_the_unit_from_the_relation_in_both_directions() {
        let mut state = two_on_one();
        state
            .apply_modifier(unit_id(1), unit_id(10), modifier_id(1))
            .unwrap();
        state
            .apply_modifier(unit_id(10), unit_id(1), modifier_id(2))
            .unwrap();

        state.set_hp(unit_id(10), 0).unwrap();

        assert!(state.unit(unit_id(1)).unwrap().modified_units.is_empty());
        assert!(!state.unit_has_modifier(unit_id(1), modifier_id(2)));
        assert!(state.unit(unit_id(10)).unwrap().modifiers.is_empty());
    }
}
