//! Per-client server-side session state (§3). A session owns no object
//! directly — it holds a non-owning `objectSlot` index into the 32-slot
//! object grid, per the disjoint-slot-table pattern in §9.

use std::net::SocketAddr;

use crate::eventlog::Team;
use crate::keys::Keys;

/// Latest input registers carried by the client's `UPDATE` datagram,
/// applied by physics on the following tick (§3, §4.6).
#[derive(Debug, Clone, Copy, Default)]
pub struct PlayerInput {
    pub stick_angle: f32,
    pub turn: f32,
    pub fwd_back: f32,
    pub stick_x: f32,
    pub stick_y: f32,
    pub head_rot: f32,
    pub body_rot: f32,
    pub keys: Keys,
    pub prev_keys: Keys,
}

#[derive(Debug, Clone)]
pub struct PlayerSession {
    pub slot: u8,
    pub team: Team,
    pub name: [u8; 32],
    pub object_slot: Option<u8>,
    pub goals: u16,
    pub assists: u16,
    pub address: SocketAddr,
    /// Last game id the client echoed back in `UPDATE`.
    pub game_id: u32,
    /// `None` until the client has acknowledged at least one snapshot.
    pub last_acked_packet: Option<u32>,
    pub msg_index: u16,
    pub chat_rep_index: u8,
    pub input: PlayerInput,
    pub inactivity: u32,
}

impl PlayerSession {
    pub fn new(slot: u8, address: SocketAddr, name: [u8; 32], game_id: u32) -> Self {
        Self {
            slot,
            team: Team::Spectator,
            name,
            object_slot: None,
            goals: 0,
            assists: 0,
            address,
            game_id,
            last_acked_packet: None,
            msg_index: 0,
            chat_rep_index: 0,
            input: PlayerInput::default(),
            inactivity: 0,
        }
    }

    /// NUL-trimmed display name (§3: "≤31 bytes, ASCII, NUL-trimmed").
    pub fn display_name(&self) -> &[u8] {
        let len = self.name.iter().position(|&b| b == 0).unwrap_or(self.name.len());
        &self.name[..len]
    }

    pub fn reset_inactivity(&mut self) {
        self.inactivity = 0;
    }
}
