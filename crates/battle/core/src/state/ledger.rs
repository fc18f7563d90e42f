//! Unit status ledger: the per-unit accessor and mutation surface.
//!
//! Every operation looks units up by id and fails with
//! [`LedgerError::UnitNotFound`] for ids that never joined this battle.
//! Numeric setters clamp to the representable range and never wrap.

use super::error::LedgerError;
use super::types::{AttackClass, AttackSource, ClassWards, ObjectId, SourceWards, StatusFlags};
use super::{BattleState, TurnEntry, UnitRecord};

impl BattleState {
    pub fn unit(&self, unit: ObjectId) -> Result<&UnitRecord, LedgerError> {
        self.units
            .iter()
            .find(|record| record.unit == unit)
            .ok_or(LedgerError::UnitNotFound { unit })
    }

    pub fn unit_mut(&mut self, unit: ObjectId) -> Result<&mut UnitRecord, LedgerError> {
        self.units
            .iter_mut()
            .find(|record| record.unit == unit)
            .ok_or(LedgerError::UnitNotFound { unit })
    }

    pub fn status(&self, unit: ObjectId, flag: StatusFlags) -> Result<bool, LedgerError> {
        Ok(self.unit(unit)?.has_status(flag))
    }

    /// Sets or clears a status flag. Idempotent; see
    /// [`UnitRecord::set_status`] for the disable-aggregate behavior.
    ///
    /// `DEAD` is not settable through this path: deaths flow through
    /// [`BattleState::set_hp`], summon bookkeeping through
    /// [`BattleState::remove_unit`].
    pub fn set_status(
        &mut self,
        unit: ObjectId,
        flag: StatusFlags,
        enabled: bool,
    ) -> Result<(), LedgerError> {
        debug_assert!(
            !(enabled && flag.contains(StatusFlags::DEAD)),
            "DEAD is set by the hit point death transition only"
        );
        self.unit_mut(unit)?.set_status(flag, enabled);
        Ok(())
    }

    /// Sets a unit's hit points, clamped into the `i16` range.
    ///
    /// A value of zero or below runs the death transition: the single path
    /// that sets `DEAD`. The transition clears position-dependent statuses,
    /// strips the unit's modifier edges in both directions and removes it
    /// from the remaining turn order. Already-dead units only get their hit
    /// points updated (setting `DEAD` is idempotent).
    pub fn set_hp(&mut self, unit: ObjectId, value: i32) -> Result<(), LedgerError> {
        let clamped = UnitRecord::clamp_hp(value);
        let record = self.unit_mut(unit)?;
        record.hp = clamped;

        if clamped > 0 || !record.is_alive() {
            return Ok(());
        }

        record.statuses.insert(StatusFlags::DEAD);
        record
            .statuses
            .remove(StatusFlags::DEFEND | StatusFlags::RETREAT | StatusFlags::DISABLING);
        record.statuses.remove(StatusFlags::DISABLE_LONG);
        record.disable_applied_round = 0;

        self.detach_modifiers(unit);
        self.turn_queue.remove_unit(unit);
        Ok(())
    }

    pub fn set_xp(&mut self, unit: ObjectId, value: i32) -> Result<(), LedgerError> {
        self.unit_mut(unit)?.set_xp(value);
        Ok(())
    }

    pub fn set_shattered_armor(&mut self, unit: ObjectId, value: i32) -> Result<(), LedgerError> {
        self.unit_mut(unit)?.shattered_armor = value;
        Ok(())
    }

    pub fn set_fortification_armor(
        &mut self,
        unit: ObjectId,
        value: i32,
    ) -> Result<(), LedgerError> {
        self.unit_mut(unit)?.fortification_armor = value;
        Ok(())
    }

    pub fn set_attack_power_reduction(
        &mut self,
        unit: ObjectId,
        value: i32,
    ) -> Result<(), LedgerError> {
        self.unit_mut(unit)?.attack_power_reduction = value;
        Ok(())
    }

    // ========================================================================
    // Ward suppression
    // ========================================================================

    pub fn is_source_ward_removed(
        &self,
        unit: ObjectId,
        source: AttackSource,
    ) -> Result<bool, LedgerError> {
        Ok(self
            .unit(unit)?
            .is_source_ward_removed(SourceWards::from_source(source)))
    }

    pub fn remove_source_ward(
        &mut self,
        unit: ObjectId,
        source: AttackSource,
    ) -> Result<(), LedgerError> {
        self.unit_mut(unit)?
            .source_wards_removed
            .insert(SourceWards::from_source(source));
        Ok(())
    }

    pub fn is_class_ward_removed(
        &self,
        unit: ObjectId,
        class: AttackClass,
    ) -> Result<bool, LedgerError> {
        Ok(self
            .unit(unit)?
            .is_class_ward_removed(ClassWards::from_class(class)))
    }

    pub fn remove_class_ward(
        &mut self,
        unit: ObjectId,
        class: AttackClass,
    ) -> Result<(), LedgerError> {
        self.unit_mut(unit)?
            .class_wards_removed
            .insert(ClassWards::from_class(class));
        Ok(())
    }

    /// Restores every suppressed immunity on the unit.
    pub fn restore_wards(&mut self, unit: ObjectId) -> Result<(), LedgerError> {
        let record = self.unit_mut(unit)?;
        record.source_wards_removed = SourceWards::empty();
        record.class_wards_removed = ClassWards::empty();
        Ok(())
    }

    // ========================================================================
    // Turn-entry attack counters
    // ========================================================================

    /// Grants a unit extra attacks this round by inserting a turn entry
    /// right after the current one (or raising its pending entry's count).
    pub fn give_attack(&mut self, unit: ObjectId, attacks: u8) -> Result<(), LedgerError> {
        if !self.contains_unit(unit) {
            return Err(LedgerError::UnitNotFound { unit });
        }

        let attacks = attacks.max(1);
        if let Some(entry) = self.turn_queue.entry_mut(unit) {
            entry.attacks_left = entry.attacks_left.max(attacks);
        } else {
            self.turn_queue
                .insert_after_front(TurnEntry::new(unit, attacks));
        }
        Ok(())
    }

    /// Decrements the unit's pending attack counter; entries that reach
    /// zero leave the queue for the rest of the round.
    pub fn decrease_unit_attacks(&mut self, unit: ObjectId) -> Result<(), LedgerError> {
        if !self.contains_unit(unit) {
            return Err(LedgerError::UnitNotFound { unit });
        }

        if let Some(entry) = self.turn_queue.entry_mut(unit) {
            entry.attacks_left = entry.attacks_left.saturating_sub(1);
            if entry.attacks_left == 0 {
                self.turn_queue.remove_unit(unit);
            }
        }
        Ok(())
    }
}
