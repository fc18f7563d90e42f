//! Shared fixtures for unit tests: canned battle states and a configurable
//! unit oracle.

use std::collections::HashMap;

use crate::env::{BattleEnv, Env, ItemOracle, UnitOracle};
use crate::state::{
    AttackClass, AttackReach, AttackSource, AttackSpec, BattleSetup, BattleState, ClassWards,
    GroupSetup, ObjectCategory, ObjectId, SourceWards, UnitSetup,
};

pub(crate) fn unit_id(n: u16) -> ObjectId {
    ObjectId::new(ObjectCategory::Unit, n)
}

pub(crate) fn attack_id(n: u16) -> ObjectId {
    ObjectId::new(ObjectCategory::Attack, n)
}

pub(crate) fn item_id(n: u16) -> ObjectId {
    ObjectId::new(ObjectCategory::Item, n)
}

fn group(side: u16, units: &[UnitSetup]) -> GroupSetup {
    GroupSetup {
        group: ObjectId::new(ObjectCategory::Stack, side),
        player: ObjectId::new(ObjectCategory::Player, side),
        units: units.iter().copied().collect(),
    }
}

/// Attacker units 1 (slot 0) and 2 (slot 2) against defender unit 10.
pub(crate) fn two_on_one_setup() -> BattleSetup {
    BattleSetup {
        attacker: group(
            1,
            &[
                UnitSetup::new(unit_id(1), 0, 20).leader(),
                UnitSetup::new(unit_id(2), 2, 15),
            ],
        ),
        defender: group(2, &[UnitSetup::new(unit_id(10), 0, 12).leader()]),
        duel: false,
    }
}

pub(crate) fn two_on_one() -> BattleState {
    BattleState::setup(&two_on_one_setup())
}

/// Same attackers against defenders 10 (slot 0, 12 hp) and 11 (slot 2, 8 hp).
pub(crate) fn two_on_two() -> BattleState {
    BattleState::setup(&BattleSetup {
        attacker: group(
            1,
            &[
                UnitSetup::new(unit_id(1), 0, 20).leader(),
                UnitSetup::new(unit_id(2), 2, 15),
            ],
        ),
        defender: group(
            2,
            &[
                UnitSetup::new(unit_id(10), 0, 12).leader(),
                UnitSetup::new(unit_id(11), 2, 8),
            ],
        ),
        duel: false,
    })
}

/// Linear front-column layout for adjacency tests: unit 1 covered in the
/// back at slot 1, unit 2 at front slot 2, unit 3 at front slot 4.
pub(crate) fn linear_three_slots() -> BattleState {
    BattleState::setup(&BattleSetup {
        attacker: group(
            1,
            &[
                UnitSetup::new(unit_id(1), 1, 10).leader(),
                UnitSetup::new(unit_id(2), 2, 10),
                UnitSetup::new(unit_id(3), 4, 10),
            ],
        ),
        defender: group(2, &[UnitSetup::new(unit_id(10), 0, 10).leader()]),
        duel: false,
    })
}

/// Oracle with fixed per-unit overrides over sensible defaults.
#[derive(Default)]
pub(crate) struct FixedOracle {
    initiative: HashMap<ObjectId, i16>,
    armor: HashMap<ObjectId, i16>,
    threat: HashMap<ObjectId, i32>,
    unit_value: HashMap<ObjectId, i32>,
    xp_reward: HashMap<ObjectId, i16>,
    max_hp: HashMap<ObjectId, i16>,
    attacks: HashMap<ObjectId, AttackSpec>,
    attacks_per_turn: HashMap<ObjectId, u8>,
    source_immunities: HashMap<ObjectId, SourceWards>,
    class_immunities: HashMap<ObjectId, ClassWards>,
    items: HashMap<ObjectId, AttackSpec>,
}

impl FixedOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn initiative(mut self, unit: ObjectId, value: i16) -> Self {
        self.initiative.insert(unit, value);
        self
    }

    pub fn armor(mut self, unit: ObjectId, value: i16) -> Self {
        self.armor.insert(unit, value);
        self
    }

    pub fn threat(mut self, unit: ObjectId, value: i32) -> Self {
        self.threat.insert(unit, value);
        self
    }

    pub fn unit_value(mut self, unit: ObjectId, value: i32) -> Self {
        self.unit_value.insert(unit, value);
        self
    }

    pub fn xp_reward(mut self, unit: ObjectId, value: i16) -> Self {
        self.xp_reward.insert(unit, value);
        self
    }

    pub fn max_hp(mut self, unit: ObjectId, value: i16) -> Self {
        self.max_hp.insert(unit, value);
        self
    }

    pub fn attack_spec(mut self, unit: ObjectId, spec: AttackSpec) -> Self {
        self.attacks.insert(unit, spec);
        self
    }

    pub fn double_attack(mut self, unit: ObjectId) -> Self {
        self.attacks_per_turn.insert(unit, 2);
        self
    }

    pub fn immune_to_source(mut self, unit: ObjectId, source: AttackSource) -> Self {
        let entry = self.source_immunities.entry(unit).or_default();
        entry.insert(SourceWards::from_source(source));
        self
    }

    pub fn immune_to_class(mut self, unit: ObjectId, class: AttackClass) -> Self {
        let entry = self.class_immunities.entry(unit).or_default();
        entry.insert(ClassWards::from_class(class));
        self
    }

    pub fn item(mut self, item: ObjectId, spec: AttackSpec) -> Self {
        self.items.insert(item, spec);
        self
    }
}

impl UnitOracle for FixedOracle {
    fn initiative(&self, unit: ObjectId) -> i16 {
        self.initiative.get(&unit).copied().unwrap_or(50)
    }

    fn armor(&self, unit: ObjectId) -> i16 {
        self.armor.get(&unit).copied().unwrap_or(0)
    }

    fn attack(&self, unit: ObjectId) -> AttackSpec {
        self.attacks.get(&unit).copied().unwrap_or_else(|| {
            AttackSpec::damage(attack_id(1), AttackSource::Weapon, AttackReach::Any, 10)
        })
    }

    fn threat(&self, unit: ObjectId) -> i32 {
        self.threat.get(&unit).copied().unwrap_or(0)
    }

    fn unit_value(&self, unit: ObjectId) -> i32 {
        self.unit_value.get(&unit).copied().unwrap_or(0)
    }

    fn xp_reward(&self, unit: ObjectId) -> i16 {
        self.xp_reward.get(&unit).copied().unwrap_or(10)
    }

    fn max_hp(&self, unit: ObjectId) -> i16 {
        self.max_hp.get(&unit).copied().unwrap_or(i16::MAX)
    }

    fn attacks_per_turn(&self, unit: ObjectId) -> u8 {
        self.attacks_per_turn.get(&unit).copied().unwrap_or(1)
    }

    fn source_immunities(&self, unit: ObjectId) -> SourceWards {
        self.source_immunities.get(&unit).copied().unwrap_or_default()
    }

    fn class_immunities(&self, unit: ObjectId) -> ClassWards {
        self.class_immunities.get(&unit).copied().unwrap_or_default()
    }
}

impl ItemOracle for FixedOracle {
    fn battle_spec(&self, item: ObjectId) -> Option<AttackSpec> {
        self.items.get(&item).copied()
    }
}

pub(crate) fn env_with(oracle: &FixedOracle) -> BattleEnv<'_> {
    Env::new(Some(oracle as &dyn UnitOracle), Some(oracle as &dyn ItemOracle))
}
