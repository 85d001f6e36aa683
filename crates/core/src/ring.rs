//! Two 256-entry snapshot-object history rings (§4.4): one populated by the
//! server as it emits `GAME_UPDATE` frames, and a symmetric one a client
//! keeps as it decodes them. Both are indexed by the low 8 bits of the
//! packet id; round-trip bit widths mirror the quantization formulas in
//! §4.4 exactly.

use crate::object::{Object, ObjectType};
use crate::rotation;

pub const POS_BITS: u8 = 17;
pub const ROT_BITS: u8 = 31;
pub const STICK_POS_BITS: u8 = 13;
pub const STICK_ROT_BITS: u8 = 25;
pub const HEAD_BODY_ROT_BITS: u8 = 16;

const POS_SCALE: f32 = 1024.0;
const POS_MAX: u32 = 0x1_FFFF;
const STICK_POS_SCALE: f32 = 1024.0;
const STICK_POS_OFFSET: f32 = 4.0;
const STICK_POS_MAX: u32 = 0x1FFF;
const HEAD_BODY_SCALE: f32 = 8192.0;
const HEAD_BODY_OFFSET: f32 = 16384.0;
const HEAD_BODY_MAX: u32 = 0x7FFF;

pub fn quantize_pos(v: f32) -> u32 {
    ((v * POS_SCALE).round() as i64).clamp(0, POS_MAX as i64) as u32
}

pub fn dequantize_pos(q: u32) -> f32 {
    q as f32 / POS_SCALE
}

pub fn quantize_stick_pos(stick: f32, player: f32) -> u32 {
    (((stick + STICK_POS_OFFSET - player) * STICK_POS_SCALE).round() as i64)
        .clamp(0, STICK_POS_MAX as i64) as u32
}

pub fn dequantize_stick_pos(q: u32, player: f32) -> f32 {
    q as f32 / STICK_POS_SCALE - STICK_POS_OFFSET + player
}

pub fn quantize_head_body_rot(rot: f32) -> u32 {
    ((rot * HEAD_BODY_SCALE + HEAD_BODY_OFFSET).round() as i64).clamp(0, HEAD_BODY_MAX as i64)
        as u32
}

pub fn dequantize_head_body_rot(q: u32) -> f32 {
    (q as f32 - HEAD_BODY_OFFSET) / HEAD_BODY_SCALE
}

/// Quantized rotation, transmitted as the Y and Z basis rows (§4.2); X is
/// reconstructed on decode as their cross product.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuantizedRotation {
    pub y_row: u32,
    pub z_row: u32,
}

impl QuantizedRotation {
    pub fn encode(rotation: crate::math::Mat3, bits: u8) -> Self {
        Self {
            y_row: rotation::encode(bits, rotation.y),
            z_row: rotation::encode(bits, rotation.z),
        }
    }

    pub fn decode(self, bits: u8) -> crate::math::Mat3 {
        let y = rotation::decode(bits, self.y_row);
        let z = rotation::decode(bits, self.z_row);
        crate::math::Mat3::from_yz(y, z)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StickSnapshot {
    pub pos: [u32; 3],
    pub rot: QuantizedRotation,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectSnapshot {
    pub object_type: ObjectType,
    pub pos: [u32; 3],
    pub rot: QuantizedRotation,
    pub stick: Option<StickSnapshot>,
    pub head_rot: u32,
    pub body_rot: u32,
}

impl ObjectSnapshot {
    pub fn from_object(object: &Object) -> Self {
        let body = object.body();
        let pos = [
            quantize_pos(body.position.x),
            quantize_pos(body.position.y),
            quantize_pos(body.position.z),
        ];
        let rot = QuantizedRotation::encode(body.rotation, ROT_BITS);
        match object {
            Object::Puck(_) => Self { object_type: ObjectType::Puck, pos, rot, stick: None, head_rot: 0, body_rot: 0 },
            Object::Player(p) => {
                let stick_pos = [
                    quantize_stick_pos(p.stick_pos.x, body.position.x),
                    quantize_stick_pos(p.stick_pos.y, body.position.y),
                    quantize_stick_pos(p.stick_pos.z, body.position.z),
                ];
                Self {
                    object_type: ObjectType::Player,
                    pos,
                    rot,
                    stick: Some(StickSnapshot {
                        pos: stick_pos,
                        rot: QuantizedRotation::encode(p.stick_rot, STICK_ROT_BITS),
                    }),
                    head_rot: quantize_head_body_rot(p.head_rot),
                    body_rot: quantize_head_body_rot(p.body_rot),
                }
            }
        }
    }
}

/// Snapshot of every occupied object slot at one packet id (§3: "snapshot
/// ring; each entry a vector of 32 optional object records").
#[derive(Debug, Clone, Default)]
pub struct RingEntry {
    pub objects: [Option<ObjectSnapshot>; 32],
}

/// A 256-entry ring indexed by `packet_id & 0xFF`. The server side never
/// reads it for delta encoding (writers always emit discriminant 3, §9
/// open question iii) but keeps it so the same type serves a client's
/// symmetric decode-side ring (§4.4). Each slot is tagged with the full
/// `packet_id` it was written for, so a slot that's been through a
/// 256-frame rollover since is correctly rejected as stale rather than
/// returned as if it were still fresh.
pub struct ObjectRing {
    entries: Box<[Option<(u32, RingEntry)>; 256]>,
}

impl Default for ObjectRing {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectRing {
    pub fn new() -> Self {
        Self { entries: Box::new(std::array::from_fn(|_| None)) }
    }

    pub fn insert(&mut self, packet_id: u32, entry: RingEntry) {
        self.entries[(packet_id & 0xFF) as usize] = Some((packet_id, entry));
    }

    /// Returns the entry tagged with exactly `packet_id`, or `None` if the
    /// slot is empty or holds a different tag — a stale entry left behind
    /// by an earlier 256-frame rollover — the freshness window named in
    /// §4.4/§5.
    pub fn get(&self, packet_id: u32) -> Option<&RingEntry> {
        match &self.entries[(packet_id & 0xFF) as usize] {
            Some((tag, entry)) if *tag == packet_id => Some(entry),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{Mat3, Vec3};
    use crate::object::{PlayerObject, PuckObject};

    #[test]
    fn position_quantization_round_trips_within_ulp() {
        let v = 12.5_f32;
        let q = quantize_pos(v);
        let back = dequantize_pos(q);
        assert!((back - v).abs() < 1.0 / 1024.0);
    }

    #[test]
    fn position_quantization_clamps_negative_to_zero() {
        assert_eq!(quantize_pos(-5.0), 0);
    }

    #[test]
    fn puck_snapshot_has_no_stick() {
        let puck = Object::Puck(PuckObject::spawn(Vec3::new(25.0, 5.0, 25.0), Mat3::IDENTITY));
        let snap = ObjectSnapshot::from_object(&puck);
        assert!(snap.stick.is_none());
        assert_eq!(snap.object_type, ObjectType::Puck);
    }

    #[test]
    fn player_snapshot_carries_stick_fields() {
        let player = Object::Player(PlayerObject::spawn(Vec3::new(10.0, 2.0, 10.0), Mat3::IDENTITY, 0));
        let snap = ObjectSnapshot::from_object(&player);
        assert!(snap.stick.is_some());
    }

    #[test]
    fn ring_entry_is_addressed_by_low_byte_of_packet_id() {
        let mut ring = ObjectRing::new();
        ring.insert(300, RingEntry::default());
        assert!(ring.get(300).is_some());
        assert!(ring.get(45).is_none()); // different slot entirely
    }

    #[test]
    fn stale_entry_from_a_prior_rollover_is_rejected_even_in_the_same_slot() {
        let mut ring = ObjectRing::new();
        // 44 and 300 land in the same slot (300 & 0xFF == 44); a lookup for
        // the earlier packet id must not be satisfied by the later write
        // that happens to share a slot.
        ring.insert(44, RingEntry::default());
        ring.insert(300, RingEntry::default());
        assert!(ring.get(300).is_some());
        assert!(ring.get(44).is_none());
    }
}
