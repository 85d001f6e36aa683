use super::{command, WireError, MAGIC};
use crate::bitio::{BitReader, BitWriter};

pub const NAME_LEN: usize = 32;

#[derive(Debug, Clone, PartialEq)]
pub struct ChatFragment {
    pub rep_index: u8,
    pub text: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClientMessage {
    InfoRequest {
        version: u8,
        nonce: u32,
    },
    Join {
        version: u8,
        name: [u8; NAME_LEN],
    },
    Update {
        game_id: u32,
        stick_angle: f32,
        turn: f32,
        reserved: f32,
        fwd_back: f32,
        stick_x: f32,
        stick_y: f32,
        head_rot: f32,
        body_rot: f32,
        keys: u32,
        last_acked_packet: u32,
        last_seen_msg_index: u16,
        chat: Option<ChatFragment>,
    },
    Exit,
}

impl ClientMessage {
    pub fn encode(&self) -> Vec<u8> {
        let mut w = BitWriter::new();
        w.write_bytes_aligned(&MAGIC);
        match self {
            ClientMessage::InfoRequest { version, nonce } => {
                w.write_u8_aligned(command::INFO_REQUEST);
                w.write_u8_aligned(*version);
                w.write_u32_aligned(*nonce);
            }
            ClientMessage::Join { version, name } => {
                w.write_u8_aligned(command::JOIN);
                w.write_u8_aligned(*version);
                w.write_bytes_aligned(name);
            }
            ClientMessage::Update {
                game_id,
                stick_angle,
                turn,
                reserved,
                fwd_back,
                stick_x,
                stick_y,
                head_rot,
                body_rot,
                keys,
                last_acked_packet,
                last_seen_msg_index,
                chat,
            } => {
                w.write_u8_aligned(command::UPDATE);
                w.write_u32_aligned(*game_id);
                for v in [stick_angle, turn, reserved, fwd_back, stick_x, stick_y, head_rot, body_rot] {
                    w.write_f32_aligned(*v);
                }
                w.write_u32_aligned(*keys);
                w.write_u32_aligned(*last_acked_packet);
                w.write_u16_aligned(*last_seen_msg_index);
                match chat {
                    Some(frag) => {
                        w.write_unsigned(1, 1);
                        w.write_unsigned(3, frag.rep_index as u32);
                        w.write_u8_aligned(frag.text.len() as u8);
                        w.write_ascii7(&frag.text);
                    }
                    None => w.write_unsigned(1, 0),
                }
            }
            ClientMessage::Exit => {
                w.write_u8_aligned(command::EXIT);
            }
        }
        w.finish()
    }

    /// `None` on bad magic, unknown command, or a truncated body — all
    /// silently dropped per §7's `MalformedDatagram`/`UnknownCommand`. The
    /// reactor only ever calls this; `try_decode` exists for embedders that
    /// want to know which.
    pub fn decode(data: &[u8]) -> Option<ClientMessage> {
        Self::try_decode(data).ok()
    }

    pub fn try_decode(data: &[u8]) -> Result<ClientMessage, WireError> {
        let mut r = BitReader::new(data);
        if data.len() < 4 {
            return Err(WireError::Truncated);
        }
        if r.read_bytes_aligned(4) != MAGIC {
            return Err(WireError::BadMagic);
        }
        let cmd = r.read_u8_aligned();
        let msg = match cmd {
            command::INFO_REQUEST => {
                let version = r.read_u8_aligned();
                let nonce = r.read_u32_aligned();
                ClientMessage::InfoRequest { version, nonce }
            }
            command::JOIN => {
                let version = r.read_u8_aligned();
                let raw = r.read_bytes_aligned(NAME_LEN);
                let mut name = [0u8; NAME_LEN];
                name[..raw.len()].copy_from_slice(raw);
                ClientMessage::Join { version, name }
            }
            command::UPDATE => {
                let game_id = r.read_u32_aligned();
                let stick_angle = r.read_f32_aligned();
                let turn = r.read_f32_aligned();
                let reserved = r.read_f32_aligned();
                let fwd_back = r.read_f32_aligned();
                let stick_x = r.read_f32_aligned();
                let stick_y = r.read_f32_aligned();
                let head_rot = r.read_f32_aligned();
                let body_rot = r.read_f32_aligned();
                let keys = r.read_u32_aligned();
                let last_acked_packet = r.read_u32_aligned();
                let last_seen_msg_index = r.read_u16_aligned();
                let chat = if r.read_unsigned(1) != 0 {
                    let rep_index = r.read_unsigned(3) as u8;
                    let len = r.read_u8_aligned() as usize;
                    Some(ChatFragment { rep_index, text: r.read_ascii7(len) })
                } else {
                    None
                };
                ClientMessage::Update {
                    game_id,
                    stick_angle,
                    turn,
                    reserved,
                    fwd_back,
                    stick_x,
                    stick_y,
                    head_rot,
                    body_rot,
                    keys,
                    last_acked_packet,
                    last_seen_msg_index,
                    chat,
                }
            }
            command::EXIT => ClientMessage::Exit,
            other => return Err(WireError::UnknownCommand(other)),
        };
        if r.overran() {
            Err(WireError::Overran)
        } else {
            Ok(msg)
        }
    }
}
