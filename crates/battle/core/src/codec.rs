//! Wire snapshot codec.
//!
//! Full battle-state snapshots travel as a fixed-size little-endian layout:
//! every field has a stable byte offset and size within a protocol epoch,
//! and evolution is additive only (new fields append, nothing reorders or
//! resizes). Bounded lists are encoded as an occupied count followed by
//! capacity fixed-width entries, vacant entries zeroed, which is what keeps
//! the total size constant.
//!
//! A snapshot whose declared or actual size does not match the epoch's
//! expected size is rejected outright; the receiving session must
//! resynchronize from a trusted participant instead of guessing.

use arrayvec::ArrayVec;

use crate::config::BattleConfig;
use crate::error::{BattleError, ErrorSeverity};
use crate::state::{
    BattleState, ExtendedStatusFlags, ModifiedUnit, ObjectId, RoundPhase, Side, StatusFlags,
    TurnEntry, TurnQueue, UnitRecord,
};

/// `BMSG` in little-endian byte order.
pub const SNAPSHOT_MAGIC: u32 = u32::from_le_bytes(*b"BMSG");

/// Protocol epoch; bump only for additive layout extensions.
pub const SNAPSHOT_EPOCH: u16 = 1;

const OBJECT_ID_LEN: usize = 4;
const UNIT_RECORD_LEN: usize = 6 * OBJECT_ID_LEN // ids, effect attribution, summon owner
    + 2 * 8                                      // status flag sets
    + 5                                          // applied-round counters
    + 2 * 2                                      // hp, xp
    + 3 * 4                                      // armor stack
    + 1 + 4                                      // ward masks
    + 3                                          // slot, side, flags
    + (1 + BattleConfig::MAX_MODIFIERS * 2 * OBJECT_ID_LEN)
    + (1 + BattleConfig::MAX_MODIFIERS * OBJECT_ID_LEN);

const TURN_ENTRY_LEN: usize = OBJECT_ID_LEN + 2;

/// Fixed payload size for the current epoch.
pub const PAYLOAD_LEN: usize = (1 + BattleConfig::MAX_UNITS * UNIT_RECORD_LEN)
    + (1 + BattleConfig::MAX_TURN_ENTRIES * TURN_ENTRY_LEN)
    + 4 * OBJECT_ID_LEN
    + 2 * (1 + BattleConfig::MAX_GROUP_SLOTS * OBJECT_ID_LEN)
    + (1 + BattleConfig::MAX_USED_ITEMS * OBJECT_ID_LEN)
    + 4;

const HEADER_LEN: usize = 4 + 2 + 4;

/// Total encoded snapshot size for the current epoch.
pub const SNAPSHOT_LEN: usize = HEADER_LEN + PAYLOAD_LEN;

/// Deserialization contract violation. Fatal for the battle session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum CodecError {
    #[error("malformed battle state: {reason}")]
    MalformedBattleState { reason: &'static str },
}

impl CodecError {
    fn malformed(reason: &'static str) -> Self {
        Self::MalformedBattleState { reason }
    }
}

impl BattleError for CodecError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Fatal
    }

    fn error_code(&self) -> &'static str {
        "CODEC_MALFORMED_BATTLE_STATE"
    }
}

// ============================================================================
// Encoding
// ============================================================================

struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    fn put_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    fn put_i8(&mut self, value: i8) {
        self.buf.push(value as u8);
    }

    fn put_u16(&mut self, value: u16) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    fn put_i16(&mut self, value: i16) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    fn put_u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    fn put_i32(&mut self, value: i32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    fn put_u64(&mut self, value: u64) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    fn put_id(&mut self, id: ObjectId) {
        self.put_u32(id.0);
    }
}

fn encode_unit(w: &mut Writer, record: &UnitRecord) {
    w.put_id(record.unit);
    w.put_id(record.base_unit);
    w.put_u64(record.statuses.bits());
    w.put_u64(record.extended_statuses.bits());
    w.put_id(record.poison_attack);
    w.put_id(record.frostbite_attack);
    w.put_id(record.blister_attack);
    w.put_i8(record.disable_applied_round);
    w.put_i8(record.poison_applied_round);
    w.put_i8(record.frostbite_applied_round);
    w.put_i8(record.blister_applied_round);
    w.put_i8(record.transform_applied_round);
    w.put_i16(record.hp);
    w.put_i16(record.xp);
    w.put_i32(record.shattered_armor);
    w.put_i32(record.fortification_armor);
    w.put_i32(record.attack_power_reduction);
    w.put_u8(record.source_wards_removed.bits());
    w.put_u32(record.class_wards_removed.bits());
    w.put_u8(record.slot);
    w.put_u8(record.side as u8);
    w.put_u8(u8::from(record.revived) | (u8::from(record.retreating_after_wait) << 1));
    w.put_id(record.summon_owner);

    w.put_u8(record.modified_units.len() as u8);
    for index in 0..BattleConfig::MAX_MODIFIERS {
        let edge = record.modified_units.get(index).copied().unwrap_or(ModifiedUnit {
            unit: ObjectId::NONE,
            modifier: ObjectId::NONE,
        });
        w.put_id(edge.unit);
        w.put_id(edge.modifier);
    }

    w.put_u8(record.modifiers.len() as u8);
    for index in 0..BattleConfig::MAX_MODIFIERS {
        w.put_id(record.modifiers.get(index).copied().unwrap_or(ObjectId::NONE));
    }
}

/// Encodes a full snapshot; always exactly [`SNAPSHOT_LEN`] bytes.
pub fn encode_snapshot(state: &BattleState) -> Vec<u8> {
    let mut w = Writer::with_capacity(SNAPSHOT_LEN);
    w.put_u32(SNAPSHOT_MAGIC);
    w.put_u16(SNAPSHOT_EPOCH);
    w.put_u32(PAYLOAD_LEN as u32);

    let empty = UnitRecord::new(ObjectId::NONE, Side::Attacker, 0, 0);
    w.put_u8(state.units().count() as u8);
    for index in 0..BattleConfig::MAX_UNITS {
        encode_unit(&mut w, state.units().nth(index).unwrap_or(&empty));
    }

    w.put_u8(state.turn_queue.len() as u8);
    for index in 0..BattleConfig::MAX_TURN_ENTRIES {
        let entry = state
            .turn_queue
            .iter()
            .nth(index)
            .copied()
            .unwrap_or(TurnEntry::new(ObjectId::NONE, 0));
        w.put_id(entry.unit);
        w.put_u8(entry.attacks_left);
        w.put_u8(u8::from(entry.waited));
    }

    w.put_id(state.attacker_group);
    w.put_id(state.defender_group);
    w.put_id(state.attacker_player);
    w.put_id(state.defender_player);

    for stack in [&state.attacker_stack, &state.defender_stack] {
        w.put_u8(stack.len() as u8);
        for index in 0..BattleConfig::MAX_GROUP_SLOTS {
            w.put_id(stack.get(index).copied().unwrap_or(ObjectId::NONE));
        }
    }

    w.put_u8(state.used_items.len() as u8);
    for index in 0..BattleConfig::MAX_USED_ITEMS {
        w.put_id(state.used_items.get(index).copied().unwrap_or(ObjectId::NONE));
    }

    w.put_i8(state.current_round);
    w.put_u8(state.phase as u8);
    w.put_u8(u8::from(state.duel));
    w.put_u8(match state.winner {
        None => 0,
        Some(Side::Attacker) => 1,
        Some(Side::Defender) => 2,
    });

    debug_assert_eq!(w.buf.len(), SNAPSHOT_LEN);
    w.buf
}

// ============================================================================
// Decoding
// ============================================================================

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn take<const N: usize>(&mut self) -> Result<[u8; N], CodecError> {
        let end = self.pos + N;
        let slice = self
            .buf
            .get(self.pos..end)
            .ok_or(CodecError::malformed("truncated payload"))?;
        self.pos = end;
        Ok(slice.try_into().expect("slice length checked"))
    }

    fn u8(&mut self) -> Result<u8, CodecError> {
        Ok(self.take::<1>()?[0])
    }

    fn i8(&mut self) -> Result<i8, CodecError> {
        Ok(self.take::<1>()?[0] as i8)
    }

    fn u16(&mut self) -> Result<u16, CodecError> {
        Ok(u16::from_le_bytes(self.take::<2>()?))
    }

    fn i16(&mut self) -> Result<i16, CodecError> {
        Ok(i16::from_le_bytes(self.take::<2>()?))
    }

    fn u32(&mut self) -> Result<u32, CodecError> {
        Ok(u32::from_le_bytes(self.take::<4>()?))
    }

    fn i32(&mut self) -> Result<i32, CodecError> {
        Ok(i32::from_le_bytes(self.take::<4>()?))
    }

    fn u64(&mut self) -> Result<u64, CodecError> {
        Ok(u64::from_le_bytes(self.take::<8>()?))
    }

    fn id(&mut self) -> Result<ObjectId, CodecError> {
        Ok(ObjectId(self.u32()?))
    }

    fn side(&mut self) -> Result<Side, CodecError> {
        match self.u8()? {
            0 => Ok(Side::Attacker),
            1 => Ok(Side::Defender),
            _ => Err(CodecError::malformed("invalid side")),
        }
    }
}

fn decode_unit(r: &mut Reader<'_>) -> Result<UnitRecord, CodecError> {
    let unit = r.id()?;
    let base_unit = r.id()?;
    let statuses = StatusFlags::from_bits(r.u64()?)
        .ok_or(CodecError::malformed("unknown status bits"))?;
    let extended_statuses = ExtendedStatusFlags::from_bits(r.u64()?)
        .ok_or(CodecError::malformed("unknown extended status bits"))?;

    let mut record = UnitRecord::new(unit, Side::Attacker, 0, 0);
    record.base_unit = base_unit;
    record.statuses = statuses;
    record.extended_statuses = extended_statuses;
    record.poison_attack = r.id()?;
    record.frostbite_attack = r.id()?;
    record.blister_attack = r.id()?;
    record.disable_applied_round = r.i8()?;
    record.poison_applied_round = r.i8()?;
    record.frostbite_applied_round = r.i8()?;
    record.blister_applied_round = r.i8()?;
    record.transform_applied_round = r.i8()?;
    record.hp = r.i16()?;
    record.xp = r.i16()?;
    record.shattered_armor = r.i32()?;
    record.fortification_armor = r.i32()?;
    record.attack_power_reduction = r.i32()?;
    record.source_wards_removed = crate::state::SourceWards::from_bits_truncate(r.u8()?);
    record.class_wards_removed = crate::state::ClassWards::from_bits(r.u32()?)
        .ok_or(CodecError::malformed("unknown class ward bits"))?;
    record.slot = r.u8()?;
    record.side = r.side()?;
    let flags = r.u8()?;
    record.revived = flags & 0b01 != 0;
    record.retreating_after_wait = flags & 0b10 != 0;
    record.summon_owner = r.id()?;

    let modified_count = r.u8()? as usize;
    if modified_count > BattleConfig::MAX_MODIFIERS {
        return Err(CodecError::malformed("modified unit count out of range"));
    }
    for index in 0..BattleConfig::MAX_MODIFIERS {
        let edge_unit = r.id()?;
        let edge_modifier = r.id()?;
        if index < modified_count {
            record.modified_units.push(ModifiedUnit {
                unit: edge_unit,
                modifier: edge_modifier,
            });
        }
    }

    let modifier_count = r.u8()? as usize;
    if modifier_count > BattleConfig::MAX_MODIFIERS {
        return Err(CodecError::malformed("modifier count out of range"));
    }
    for index in 0..BattleConfig::MAX_MODIFIERS {
        let modifier = r.id()?;
        if index < modifier_count {
            record.modifiers.push(modifier);
        }
    }

    Ok(record)
}

/// Decodes and validates a full snapshot.
///
/// Rejects payloads whose total or declared size does not match the fixed
/// size for the current epoch.
pub fn decode_snapshot(bytes: &[u8]) -> Result<BattleState, CodecError> {
    if bytes.len() != SNAPSHOT_LEN {
        return Err(CodecError::malformed("unexpected snapshot size"));
    }

    let mut r = Reader::new(bytes);
    if r.u32()? != SNAPSHOT_MAGIC {
        return Err(CodecError::malformed("bad magic"));
    }
    if r.u16()? != SNAPSHOT_EPOCH {
        return Err(CodecError::malformed("unsupported epoch"));
    }
    if r.u32()? as usize != PAYLOAD_LEN {
        return Err(CodecError::malformed("declared size mismatch"));
    }

    let unit_count = r.u8()? as usize;
    if unit_count > BattleConfig::MAX_UNITS {
        return Err(CodecError::malformed("unit count out of range"));
    }
    let mut units = ArrayVec::new();
    for index in 0..BattleConfig::MAX_UNITS {
        let record = decode_unit(&mut r)?;
        if index < unit_count {
            units.push(record);
        }
    }

    let entry_count = r.u8()? as usize;
    if entry_count > BattleConfig::MAX_TURN_ENTRIES {
        return Err(CodecError::malformed("turn entry count out of range"));
    }
    let mut turn_queue = TurnQueue::new();
    for index in 0..BattleConfig::MAX_TURN_ENTRIES {
        let unit = r.id()?;
        let attacks_left = r.u8()?;
        let waited = r.u8()? != 0;
        if index < entry_count {
            let mut entry = TurnEntry::new(unit, attacks_left);
            entry.waited = waited;
            turn_queue.push(entry);
        }
    }

    let attacker_group = r.id()?;
    let defender_group = r.id()?;
    let attacker_player = r.id()?;
    let defender_player = r.id()?;

    let mut stacks: [ArrayVec<ObjectId, { BattleConfig::MAX_GROUP_SLOTS }>; 2] =
        [ArrayVec::new(), ArrayVec::new()];
    for stack in &mut stacks {
        let count = r.u8()? as usize;
        if count > BattleConfig::MAX_GROUP_SLOTS {
            return Err(CodecError::malformed("stack count out of range"));
        }
        for index in 0..BattleConfig::MAX_GROUP_SLOTS {
            let id = r.id()?;
            if index < count {
                stack.push(id);
            }
        }
    }
    let [attacker_stack, defender_stack] = stacks;

    let item_count = r.u8()? as usize;
    if item_count > BattleConfig::MAX_USED_ITEMS {
        return Err(CodecError::malformed("used item count out of range"));
    }
    let mut used_items = ArrayVec::new();
    for index in 0..BattleConfig::MAX_USED_ITEMS {
        let id = r.id()?;
        if index < item_count {
            used_items.push(id);
        }
    }

    let current_round = r.i8()?;
    let phase = RoundPhase::from_repr(r.u8()?)
        .ok_or(CodecError::malformed("invalid scheduler phase"))?;
    let duel = r.u8()? != 0;
    let winner = match r.u8()? {
        0 => None,
        1 => Some(Side::Attacker),
        2 => Some(Side::Defender),
        _ => return Err(CodecError::malformed("invalid winner")),
    };

    Ok(BattleState {
        units,
        turn_queue,
        attacker_group,
        defender_group,
        attacker_player,
        defender_player,
        attacker_stack,
        defender_stack,
        used_items,
        current_round,
        phase,
        duel,
        winner,
    })
}
