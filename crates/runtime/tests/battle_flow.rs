//! End-to-end battle flows through the session layer.

use std::collections::HashMap;

use battle_core::{
    AttackReach, AttackSource, AttackSpec, BattleAction, BattleConfig, BattleSetup, GroupSetup,
    ItemOracle, ObjectCategory, ObjectId, Side, StatusFlags, UnitOracle, UnitSetup,
};
use battle_runtime::{state_digest_hex, verify_replay, ActionLog, BattleSession, SyncError};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn unit(n: u16) -> ObjectId {
    ObjectId::new(ObjectCategory::Unit, n)
}

fn attack(n: u16) -> ObjectId {
    ObjectId::new(ObjectCategory::Attack, n)
}

/// Content stand-in: per-unit numbers the real game reads from unit data.
#[derive(Clone, Default)]
struct ScriptedOracle {
    initiative: HashMap<ObjectId, i16>,
    damage: HashMap<ObjectId, i16>,
    double: Vec<ObjectId>,
}

impl ScriptedOracle {
    fn initiative(mut self, unit: ObjectId, value: i16) -> Self {
        self.initiative.insert(unit, value);
        self
    }

    fn damage(mut self, unit: ObjectId, value: i16) -> Self {
        self.damage.insert(unit, value);
        self
    }

    fn double_attack(mut self, unit: ObjectId) -> Self {
        self.double.push(unit);
        self
    }
}

impl UnitOracle for ScriptedOracle {
    fn initiative(&self, unit: ObjectId) -> i16 {
        self.initiative.get(&unit).copied().unwrap_or(40)
    }

    fn armor(&self, _unit: ObjectId) -> i16 {
        0
    }

    fn attack(&self, unit: ObjectId) -> AttackSpec {
        AttackSpec::damage(
            attack(1),
            AttackSource::Weapon,
            AttackReach::Any,
            self.damage.get(&unit).copied().unwrap_or(5),
        )
    }

    fn threat(&self, unit: ObjectId) -> i32 {
        self.damage.get(&unit).copied().unwrap_or(5) as i32
    }

    fn unit_value(&self, unit: ObjectId) -> i32 {
        self.threat(unit)
    }

    fn xp_reward(&self, _unit: ObjectId) -> i16 {
        25
    }

    fn attacks_per_turn(&self, unit: ObjectId) -> u8 {
        if self.double.contains(&unit) { 2 } else { 1 }
    }
}

impl ItemOracle for ScriptedOracle {
    fn battle_spec(&self, _item: ObjectId) -> Option<AttackSpec> {
        None
    }
}

/// Attacker stack of two (slots 0 and 1) against a lone defender (slot 0).
fn two_versus_one_setup() -> BattleSetup {
    BattleSetup {
        attacker: GroupSetup {
            group: ObjectId::new(ObjectCategory::Stack, 1),
            player: ObjectId::new(ObjectCategory::Player, 1),
            units: [
                UnitSetup::new(unit(1), 0, 20).leader(),
                UnitSetup::new(unit(2), 1, 15),
            ]
            .into_iter()
            .collect(),
        },
        defender: GroupSetup {
            group: ObjectId::new(ObjectCategory::Stack, 2),
            player: ObjectId::new(ObjectCategory::Player, 2),
            units: [UnitSetup::new(unit(10), 0, 12).leader()].into_iter().collect(),
        },
        duel: false,
    }
}

fn session_with(oracle: &ScriptedOracle) -> BattleSession {
    BattleSession::new(
        &two_versus_one_setup(),
        BattleConfig::default(),
        Box::new(oracle.clone()),
        Some(Box::new(oracle.clone())),
    )
}

#[test]
fn lethal_attack_ends_the_battle() {
    init_tracing();
    let oracle = ScriptedOracle::default()
        .initiative(unit(1), 60)
        .damage(unit(1), 50);
    let mut session = session_with(&oracle);

    let outcome = session
        .submit(BattleAction::Attack {
            attacker: unit(1),
            target: Some(unit(10)),
        })
        .unwrap();

    assert!(outcome.hits[0].killed);
    assert!(session.state().unit(unit(10)).unwrap().hp <= 0);
    assert!(session.status(unit(10), StatusFlags::DEAD));
    assert!(session.turn_order().iter().all(|entry| entry.unit != unit(10)));
    assert!(session.is_battle_over());
    assert_eq!(session.winner(), Some(Side::Attacker));
}

#[test]
fn double_attacker_takes_both_attacks_up_front() {
    init_tracing();
    let oracle = ScriptedOracle::default()
        .initiative(unit(1), 60)
        .damage(unit(1), 3)
        .double_attack(unit(1));
    let mut session = session_with(&oracle);
    session.prepare().unwrap();

    assert_eq!(session.turn_order()[0].attacks_left, 2);

    let action = BattleAction::Attack {
        attacker: unit(1),
        target: Some(unit(10)),
    };
    session.submit(action).unwrap();

    // Still this unit's turn, with one attack left.
    let order = session.turn_order();
    assert_eq!(order[0].unit, unit(1));
    assert_eq!(order[0].attacks_left, 1);

    session.submit(action).unwrap();
    assert_ne!(session.turn_order()[0].unit, unit(1));
    assert_eq!(session.state().unit(unit(10)).unwrap().hp, 6);
}

#[test]
fn identical_action_feeds_produce_identical_states() {
    init_tracing();
    let oracle = ScriptedOracle::default()
        .initiative(unit(1), 60)
        .initiative(unit(10), 50)
        .initiative(unit(2), 30)
        .damage(unit(1), 4)
        .damage(unit(10), 6);

    let script = [
        BattleAction::Attack {
            attacker: unit(1),
            target: Some(unit(10)),
        },
        BattleAction::Attack {
            attacker: unit(10),
            target: Some(unit(2)),
        },
        BattleAction::Defend { unit: unit(2) },
        BattleAction::Attack {
            attacker: unit(1),
            target: Some(unit(10)),
        },
        BattleAction::Wait { unit: unit(10) },
        BattleAction::Skip { unit: unit(2) },
        BattleAction::Attack {
            attacker: unit(10),
            target: Some(unit(1)),
        },
    ];

    let mut left = session_with(&oracle);
    let mut right = session_with(&oracle);
    for action in script {
        left.submit(action).unwrap();
        right.submit(action).unwrap();
    }

    assert_eq!(left.state(), right.state());
    assert_eq!(
        state_digest_hex(left.state()),
        state_digest_hex(right.state())
    );
}

#[test]
fn replay_verification_reconstructs_the_logged_battle() {
    init_tracing();
    let oracle = ScriptedOracle::default()
        .initiative(unit(1), 60)
        .damage(unit(1), 50);
    let mut session = session_with(&oracle);
    session
        .submit(BattleAction::Attack {
            attacker: unit(1),
            target: Some(unit(10)),
        })
        .unwrap();

    let log = ActionLog {
        setup: two_versus_one_setup(),
        config: BattleConfig::default(),
        actions: session.action_log().to_vec(),
    };
    let digest = state_digest_hex(session.state());

    let replayed = verify_replay(&log, &oracle, None, &digest).unwrap();
    assert_eq!(&replayed, session.state());

    // A wrong digest is reported as divergence.
    let bad = verify_replay(&log, &oracle, None, "00ff00ff");
    assert!(bad.is_err());
}

#[test]
fn snapshots_round_trip_between_sessions() {
    init_tracing();
    let oracle = ScriptedOracle::default().initiative(unit(1), 60);
    let mut source = session_with(&oracle);
    source
        .submit(BattleAction::Attack {
            attacker: unit(1),
            target: Some(unit(10)),
        })
        .unwrap();

    let mut replica = session_with(&oracle);
    replica.install_snapshot(&source.snapshot()).unwrap();
    assert_eq!(replica.state(), source.state());
}

#[test]
fn malformed_snapshot_requires_resynchronization() {
    init_tracing();
    let oracle = ScriptedOracle::default();
    let source = session_with(&oracle);
    let mut replica = session_with(&oracle);
    let before = replica.state().clone();

    let mut bytes = source.snapshot();
    bytes.truncate(bytes.len() - 1);

    let result = replica.install_snapshot(&bytes);
    assert!(matches!(result, Err(SyncError::ResyncRequired(_))));
    assert_eq!(replica.state(), &before);
}

#[test]
fn queries_expose_turn_order_and_pending_targets() {
    init_tracing();
    let oracle = ScriptedOracle::default()
        .initiative(unit(1), 60)
        .initiative(unit(10), 50)
        .initiative(unit(2), 30);
    let mut session = session_with(&oracle);
    session.prepare().unwrap();

    let order: Vec<_> = session.turn_order().iter().map(|e| e.unit).collect();
    assert_eq!(order, vec![unit(1), unit(10), unit(2)]);

    let targets = session.targets_for(&BattleAction::Attack {
        attacker: unit(1),
        target: None,
    });
    assert_eq!(targets.as_slice(), [unit(10)]);
}
