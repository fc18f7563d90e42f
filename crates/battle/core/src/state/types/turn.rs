//! Round turn-order bookkeeping.

use arrayvec::ArrayVec;

use crate::config::BattleConfig;

use super::common::ObjectId;

/// Scheduler state machine position, replicated with the battle state so
/// every participant agrees on which actions are currently legal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, strum::FromRepr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum RoundPhase {
    /// Per-round transient statuses are being reset.
    #[default]
    RoundStart = 0,
    /// The round's turn order has been computed.
    TurnsBuilt = 1,
    /// The front queue entry's unit may act.
    InTurn = 2,
    /// The consumed entry is being retired and cleanup runs.
    TurnAdvancing = 3,
    /// No entries remain; end-of-round checks run.
    RoundEnd = 4,
    /// Terminal: one side won, a side retreated out, or the round limit hit.
    BattleOver = 5,
}

/// One scheduled turn within the current round.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TurnEntry {
    pub unit: ObjectId,
    /// Attacks the unit may still perform this turn; 2 for double-attack
    /// units. Never negative; reaching 0 removes the entry.
    pub attacks_left: u8,
    /// The unit used Wait this round and was moved to the back of the queue.
    pub waited: bool,
}

impl TurnEntry {
    pub fn new(unit: ObjectId, attacks_left: u8) -> Self {
        Self {
            unit,
            attacks_left,
            waited: false,
        }
    }
}

/// Ordered sequence of turns remaining in the current round.
///
/// Rebuilt at the start of each round; consumed and mutated as turns are
/// taken. The entry at the front is the unit currently allowed to act.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TurnQueue {
    entries: ArrayVec<TurnEntry, { BattleConfig::MAX_TURN_ENTRIES }>,
}

impl TurnQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: TurnEntry) -> bool {
        if self.entries.is_full() {
            return false;
        }
        self.entries.push(entry);
        true
    }

    pub fn front(&self) -> Option<&TurnEntry> {
        self.entries.first()
    }

    /// Removes the front entry; the next unit becomes current.
    pub fn advance(&mut self) -> Option<TurnEntry> {
        if self.entries.is_empty() {
            None
        } else {
            Some(self.entries.remove(0))
        }
    }

    /// Double-attack: decrement the front entry's counter and keep it at the
    /// front so the unit acts again before anyone else. Returns false when
    /// no attack remains and the entry was removed instead.
    pub fn requeue_front(&mut self) -> bool {
        let Some(front) = self.entries.first_mut() else {
            return false;
        };
        front.attacks_left = front.attacks_left.saturating_sub(1);
        if front.attacks_left == 0 {
            self.entries.remove(0);
            false
        } else {
            true
        }
    }

    /// Moves the front entry behind every other entry of the round (Wait).
    pub fn move_front_to_back(&mut self) {
        if self.entries.len() > 1 {
            let mut entry = self.entries.remove(0);
            entry.waited = true;
            self.entries.push(entry);
        } else if let Some(front) = self.entries.first_mut() {
            front.waited = true;
        }
    }

    /// Inserts an extra turn right after the current front entry.
    pub fn insert_after_front(&mut self, entry: TurnEntry) -> bool {
        if self.entries.is_full() {
            return false;
        }
        let index = if self.entries.is_empty() { 0 } else { 1 };
        self.entries.insert(index, entry);
        true
    }

    pub fn remove_unit(&mut self, unit: ObjectId) {
        self.entries.retain(|entry| entry.unit != unit);
    }

    pub fn contains(&self, unit: ObjectId) -> bool {
        self.entries.iter().any(|entry| entry.unit == unit)
    }

    pub fn entry_mut(&mut self, unit: ObjectId) -> Option<&mut TurnEntry> {
        self.entries.iter_mut().find(|entry| entry.unit == unit)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TurnEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
