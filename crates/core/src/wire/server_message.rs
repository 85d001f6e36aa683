use super::{command, WireError, MAGIC};
use crate::bitio::{BitReader, BitWriter};
use crate::eventlog::Event;
use crate::object::ObjectType;
use crate::ring::{
    ObjectSnapshot, QuantizedRotation, StickSnapshot, HEAD_BODY_ROT_BITS, POS_BITS, ROT_BITS,
    STICK_POS_BITS, STICK_ROT_BITS,
};

pub const NAME_LEN: usize = 32;
pub const OBJECT_SLOTS: usize = 32;

#[derive(Debug, Clone, PartialEq)]
pub struct InfoResponse {
    pub version: u8,
    pub nonce: u32,
    pub player_count: u8,
    pub team_size: u8,
    pub name: [u8; NAME_LEN],
}

#[derive(Debug, Clone, PartialEq)]
pub struct GameUpdate {
    pub game_id: u32,
    pub simstep: u32,
    pub gameover: bool,
    pub red_score: u8,
    pub blue_score: u8,
    pub timeleft: u16,
    pub timeout: u16,
    pub period: u8,
    pub your_slot: u8,
    pub packet_id: u32,
    /// Wire sentinel `u32::MAX` decodes to `None` ("no prior ack yet", §4.5).
    pub previous_packet_id: Option<u32>,
    pub objects: [Option<ObjectSnapshot>; OBJECT_SLOTS],
    pub base_msg_index: u16,
    pub events: Vec<Event>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ServerMessage {
    InfoResponse(InfoResponse),
    GameUpdate(GameUpdate),
    NewMatch { game_id: u32 },
}

impl ServerMessage {
    pub fn encode(&self) -> Vec<u8> {
        let mut w = BitWriter::new();
        w.write_bytes_aligned(&MAGIC);
        match self {
            ServerMessage::InfoResponse(r) => {
                w.write_u8_aligned(command::INFO_RESPONSE);
                w.write_u8_aligned(r.version);
                w.write_u32_aligned(r.nonce);
                w.write_u8_aligned(r.player_count);
                w.write_unsigned(4, 0);
                w.write_unsigned(4, r.team_size as u32);
                w.write_bytes_aligned(&r.name);
            }
            ServerMessage::GameUpdate(g) => {
                w.write_u8_aligned(command::GAME_UPDATE);
                w.write_u32_aligned(g.game_id);
                w.write_u32_aligned(g.simstep);
                w.write_unsigned(1, g.gameover as u32);
                w.write_u8_aligned(g.red_score);
                w.write_u8_aligned(g.blue_score);
                w.write_u16_aligned(g.timeleft);
                w.write_u16_aligned(g.timeout);
                w.write_u8_aligned(g.period);
                w.write_u8_aligned(g.your_slot);
                w.write_u32_aligned(g.packet_id);
                w.write_u32_aligned(g.previous_packet_id.unwrap_or(u32::MAX));
                for slot in &g.objects {
                    encode_object_slot(&mut w, slot.as_ref());
                }
                w.write_unsigned(4, g.events.len() as u32);
                w.write_u16_aligned(g.base_msg_index);
                for event in &g.events {
                    event.encode(&mut w);
                }
            }
            ServerMessage::NewMatch { game_id } => {
                w.write_u8_aligned(command::NEW_MATCH);
                w.write_u32_aligned(*game_id);
            }
        }
        w.finish()
    }

    pub fn decode(data: &[u8]) -> Option<ServerMessage> {
        Self::try_decode(data).ok()
    }

    pub fn try_decode(data: &[u8]) -> Result<ServerMessage, WireError> {
        let mut r = BitReader::new(data);
        if data.len() < 4 {
            return Err(WireError::Truncated);
        }
        if r.read_bytes_aligned(4) != MAGIC {
            return Err(WireError::BadMagic);
        }
        let cmd = r.read_u8_aligned();
        let msg = match cmd {
            command::INFO_RESPONSE => {
                let version = r.read_u8_aligned();
                let nonce = r.read_u32_aligned();
                let player_count = r.read_u8_aligned();
                let _reserved = r.read_unsigned(4);
                let team_size = r.read_unsigned(4) as u8;
                let raw = r.read_bytes_aligned(NAME_LEN);
                let mut name = [0u8; NAME_LEN];
                name[..raw.len()].copy_from_slice(raw);
                ServerMessage::InfoResponse(InfoResponse { version, nonce, player_count, team_size, name })
            }
            command::GAME_UPDATE => {
                let game_id = r.read_u32_aligned();
                let simstep = r.read_u32_aligned();
                let gameover = r.read_unsigned(1) != 0;
                let red_score = r.read_u8_aligned();
                let blue_score = r.read_u8_aligned();
                let timeleft = r.read_u16_aligned();
                let timeout = r.read_u16_aligned();
                let period = r.read_u8_aligned();
                let your_slot = r.read_u8_aligned();
                let packet_id = r.read_u32_aligned();
                let previous_raw = r.read_u32_aligned();
                let previous_packet_id = if previous_raw == u32::MAX { None } else { Some(previous_raw) };

                let mut objects: [Option<ObjectSnapshot>; OBJECT_SLOTS] = std::array::from_fn(|_| None);
                for slot in objects.iter_mut() {
                    *slot = decode_object_slot(&mut r);
                }

                let event_count = r.read_unsigned(4) as usize;
                let base_msg_index = r.read_u16_aligned();
                let mut events = Vec::with_capacity(event_count);
                for _ in 0..event_count {
                    match Event::decode(&mut r) {
                        Some(e) => events.push(e),
                        None => break,
                    }
                }
                ServerMessage::GameUpdate(GameUpdate {
                    game_id,
                    simstep,
                    gameover,
                    red_score,
                    blue_score,
                    timeleft,
                    timeout,
                    period,
                    your_slot,
                    packet_id,
                    previous_packet_id,
                    objects,
                    base_msg_index,
                    events,
                })
            }
            command::NEW_MATCH => {
                let game_id = r.read_u32_aligned();
                ServerMessage::NewMatch { game_id }
            }
            other => return Err(WireError::UnknownCommand(other)),
        };
        if r.overran() {
            Err(WireError::Overran)
        } else {
            Ok(msg)
        }
    }
}

fn encode_object_slot(w: &mut BitWriter, slot: Option<&ObjectSnapshot>) {
    match slot {
        None => w.write_unsigned(1, 0),
        Some(obj) => {
            w.write_unsigned(1, 1);
            w.write_unsigned(2, obj.object_type as u32);
            w.write_pos_absolute(POS_BITS, obj.pos[0]);
            w.write_pos_absolute(POS_BITS, obj.pos[1]);
            w.write_pos_absolute(POS_BITS, obj.pos[2]);
            w.write_pos_absolute(ROT_BITS, obj.rot.y_row);
            w.write_pos_absolute(ROT_BITS, obj.rot.z_row);
            if let Some(stick) = &obj.stick {
                w.write_pos_absolute(STICK_POS_BITS, stick.pos[0]);
                w.write_pos_absolute(STICK_POS_BITS, stick.pos[1]);
                w.write_pos_absolute(STICK_POS_BITS, stick.pos[2]);
                w.write_pos_absolute(STICK_ROT_BITS, stick.rot.y_row);
                w.write_pos_absolute(STICK_ROT_BITS, stick.rot.z_row);
                w.write_pos_absolute(HEAD_BODY_ROT_BITS, obj.head_rot);
                w.write_pos_absolute(HEAD_BODY_ROT_BITS, obj.body_rot);
            }
        }
    }
}

fn decode_object_slot(r: &mut BitReader) -> Option<ObjectSnapshot> {
    if r.read_unsigned(1) == 0 {
        return None;
    }
    let object_type = if r.read_unsigned(2) == ObjectType::Puck as u32 {
        ObjectType::Puck
    } else {
        ObjectType::Player
    };
    let pos = [
        r.read_pos(POS_BITS, None).unwrap_or(0) as u32,
        r.read_pos(POS_BITS, None).unwrap_or(0) as u32,
        r.read_pos(POS_BITS, None).unwrap_or(0) as u32,
    ];
    let rot = QuantizedRotation {
        y_row: r.read_pos(ROT_BITS, None).unwrap_or(0) as u32,
        z_row: r.read_pos(ROT_BITS, None).unwrap_or(0) as u32,
    };
    let (stick, head_rot, body_rot) = if object_type == ObjectType::Player {
        let stick_pos = [
            r.read_pos(STICK_POS_BITS, None).unwrap_or(0) as u32,
            r.read_pos(STICK_POS_BITS, None).unwrap_or(0) as u32,
            r.read_pos(STICK_POS_BITS, None).unwrap_or(0) as u32,
        ];
        let stick_rot = QuantizedRotation {
            y_row: r.read_pos(STICK_ROT_BITS, None).unwrap_or(0) as u32,
            z_row: r.read_pos(STICK_ROT_BITS, None).unwrap_or(0) as u32,
        };
        let head_rot = r.read_pos(HEAD_BODY_ROT_BITS, None).unwrap_or(0) as u32;
        let body_rot = r.read_pos(HEAD_BODY_ROT_BITS, None).unwrap_or(0) as u32;
        (Some(StickSnapshot { pos: stick_pos, rot: stick_rot }), head_rot, body_rot)
    } else {
        (None, 0, 0)
    };
    Some(ObjectSnapshot { object_type, pos, rot, stick, head_rot, body_rot })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eventlog::Team;
    use crate::math::{Mat3, Vec3};
    use crate::object::{Object, PlayerObject, PuckObject};

    #[test]
    fn info_response_round_trips() {
        let mut name = [0u8; NAME_LEN];
        name[..4].copy_from_slice(b"Rink");
        let msg = ServerMessage::InfoResponse(InfoResponse {
            version: 55,
            nonce: 0xCAFEBABE,
            player_count: 4,
            team_size: 6,
            name,
        });
        assert_eq!(ServerMessage::decode(&msg.encode()), Some(msg));
    }

    #[test]
    fn new_match_round_trips() {
        let msg = ServerMessage::NewMatch { game_id: 7 };
        assert_eq!(ServerMessage::decode(&msg.encode()), Some(msg));
    }

    #[test]
    fn game_update_round_trips_with_mixed_objects() {
        let mut objects: [Option<ObjectSnapshot>; OBJECT_SLOTS] = std::array::from_fn(|_| None);
        objects[0] = Some(ObjectSnapshot::from_object(&Object::Player(PlayerObject::spawn(
            Vec3::new(10.0, 2.0, 10.0),
            Mat3::IDENTITY,
            0,
        ))));
        objects[5] = Some(ObjectSnapshot::from_object(&Object::Puck(PuckObject::spawn(
            Vec3::new(25.0, 5.0, 25.0),
            Mat3::IDENTITY,
        ))));

        let msg = ServerMessage::GameUpdate(GameUpdate {
            game_id: 1,
            simstep: 42,
            gameover: false,
            red_score: 1,
            blue_score: 0,
            timeleft: 29000,
            timeout: 0,
            period: 0,
            your_slot: 0,
            packet_id: 3,
            previous_packet_id: Some(2),
            objects,
            base_msg_index: 0,
            events: vec![Event::Goal { team: Team::Red, scorer: Some(0), assister: None }],
        });
        assert_eq!(ServerMessage::decode(&msg.encode()), Some(msg));
    }

    #[test]
    fn game_update_round_trips_with_no_previous_ack() {
        let objects: [Option<ObjectSnapshot>; OBJECT_SLOTS] = std::array::from_fn(|_| None);
        let msg = ServerMessage::GameUpdate(GameUpdate {
            game_id: 1,
            simstep: 0,
            gameover: false,
            red_score: 0,
            blue_score: 0,
            timeleft: 30000,
            timeout: 0,
            period: 0,
            your_slot: 0,
            packet_id: 0,
            previous_packet_id: None,
            objects,
            base_msg_index: 0,
            events: Vec::new(),
        });
        assert_eq!(ServerMessage::decode(&msg.encode()), Some(msg));
    }

    #[test]
    fn try_decode_reports_unknown_command() {
        let mut bytes = MAGIC.to_vec();
        bytes.push(250);
        assert_eq!(ServerMessage::try_decode(&bytes), Err(WireError::UnknownCommand(250)));
    }
}
