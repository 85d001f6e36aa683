//! Overall game state (§3, §4.8): scores, clock, period, the 256-slot
//! session roster, the 32-slot object grid, id allocation, and the
//! spawn/reset policy. Owns the one per-tick entry point; does no I/O
//! itself — `tick()` returns the datagrams the caller should send.

use std::net::SocketAddr;

use crate::eventlog::{Event, EventLog, Team};
use crate::keys::Keys;
use crate::math::{Mat3, Vec3};
use crate::object::{Object, PlayerObject, PuckObject};
use crate::physics;
use crate::ring::{ObjectRing, ObjectSnapshot, RingEntry};
use crate::rink::Rink;
use crate::session::{PlayerInput, PlayerSession};
use crate::wire::server_message::{GameUpdate, InfoResponse};
use crate::wire::{ServerMessage, PROTOCOL_VERSION};

pub const MAX_SESSIONS: usize = 256;
pub const OBJECT_SLOTS: usize = 32;
pub const DEFAULT_TEAM_SIZE: u8 = 5;
pub const STARTING_TIMELEFT: u16 = 30000;
pub const INACTIVITY_LIMIT: u32 = 1200;

/// Puck spawn point used by `start_new_game` (original `setStartPuckPosition`).
const PUCK_SPAWN: Vec3 = Vec3::new(10.0, 2.0, 10.0);
/// Literal spawn used by the red team (matches the end-to-end scenario in §8 S2).
const RED_SPAWN: Vec3 = Vec3::new(10.0, 2.0, 10.0);

/// A datagram `Match` wants sent to one session, left to the caller's I/O.
#[derive(Debug, Clone, PartialEq)]
pub struct Outgoing {
    pub slot: u8,
    pub address: SocketAddr,
    pub message: ServerMessage,
}

fn truncate_name(name: &[u8; 32]) -> [u8; 31] {
    let mut out = [0u8; 31];
    out.copy_from_slice(&name[..31]);
    out
}

pub struct Match {
    id_alloc: u32,
    game_id: u32,
    red_score: u8,
    blue_score: u8,
    period: u8,
    timeleft: u16,
    timeout: u16,
    simstep: u32,
    gameover: bool,
    /// Starts at -1 per §3; the first snapshot frame advances it to 0.
    packet_id: i64,
    team_size: u8,
    sessions: Box<[Option<PlayerSession>; MAX_SESSIONS]>,
    objects: Box<[Option<Object>; OBJECT_SLOTS]>,
    ring: ObjectRing,
    event_log: EventLog,
    rink: Rink,
}

impl Match {
    pub fn new(rink: Rink, team_size: u8) -> Self {
        Self {
            id_alloc: 1,
            game_id: 0,
            red_score: 0,
            blue_score: 0,
            period: 0,
            timeleft: STARTING_TIMELEFT,
            timeout: 0,
            simstep: 0,
            gameover: false,
            packet_id: -1,
            team_size,
            sessions: Box::new(std::array::from_fn(|_| None)),
            objects: Box::new(std::array::from_fn(|_| None)),
            ring: ObjectRing::new(),
            event_log: EventLog::new(),
            rink,
        }
    }

    pub fn game_id(&self) -> u32 {
        self.game_id
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.iter().all(Option::is_none)
    }

    pub fn session_count(&self) -> u8 {
        self.sessions.iter().filter(|s| s.is_some()).count() as u8
    }

    fn find_empty_session_slot(&self) -> Option<u8> {
        self.sessions.iter().position(Option::is_none).map(|i| i as u8)
    }

    fn find_empty_object_slot(&self) -> Option<u8> {
        self.objects.iter().position(Option::is_none).map(|i| i as u8)
    }

    pub fn find_session_by_addr(&self, addr: SocketAddr) -> Option<u8> {
        self.sessions
            .iter()
            .enumerate()
            .find_map(|(i, s)| s.as_ref().filter(|s| s.address == addr).map(|_| i as u8))
    }

    /// Read-only view of a session, for callers (the UDP reactor, tests)
    /// that need to inspect roster state without reaching into `Match`.
    pub fn session_snapshot(&self, slot: u8) -> Option<&PlayerSession> {
        self.sessions.get(slot as usize)?.as_ref()
    }

    /// Read-only view of an occupied object slot.
    pub fn object_snapshot(&self, slot: u8) -> Option<&Object> {
        self.objects.get(slot as usize)?.as_ref()
    }

    /// The slot holding the puck, if any is on the ice.
    pub fn find_puck_slot(&self) -> Option<u8> {
        self.objects
            .iter()
            .enumerate()
            .find_map(|(i, o)| matches!(o, Some(Object::Puck(_))).then_some(i as u8))
    }

    /// Every event not yet acknowledged as of client-reported `msg_index`
    /// `from`, plus the base index of the returned window (§4.7).
    pub fn event_log_window(&self, from: u16) -> (u16, &[Event]) {
        self.event_log.window(from)
    }

    /// Overwrites the first puck on the ice with a known pose and linear
    /// velocity; test-only hook for deterministic physics scenarios.
    #[doc(hidden)]
    pub fn debug_set_puck(&mut self, position: Vec3, pos_delta: Vec3) {
        let Some(slot) = self.find_puck_slot() else { return };
        if let Some(Object::Puck(p)) = self.objects[slot as usize].as_mut() {
            p.body.position = position;
            p.body.pos_delta = pos_delta;
        }
    }

    pub fn info_response(&self, server_name: [u8; 32], nonce: u32) -> ServerMessage {
        ServerMessage::InfoResponse(InfoResponse {
            version: PROTOCOL_VERSION,
            nonce,
            player_count: self.session_count(),
            team_size: self.team_size,
            name: server_name,
        })
    }

    /// Allocates the next game id, clears scores/clock/objects/events, and
    /// re-announces every already-connected session to the fresh event log
    /// (§4.8 `start_new_game`).
    pub fn start_new_game(&mut self) {
        self.game_id = self.id_alloc;
        self.id_alloc += 1;
        self.red_score = 0;
        self.blue_score = 0;
        self.period = 0;
        self.timeleft = STARTING_TIMELEFT;
        self.timeout = 0;
        self.gameover = false;
        self.simstep = 0;
        self.packet_id = -1;
        self.objects = Box::new(std::array::from_fn(|_| None));
        self.event_log = EventLog::new();
        self.ring = ObjectRing::new();

        log::info!("starting new match, game id {}", self.game_id);

        for session in self.sessions.iter_mut().flatten() {
            session.team = Team::Spectator;
            session.object_slot = None;
            session.last_acked_packet = None;
            session.msg_index = 0;
        }

        let announcements: Vec<(u8, [u8; 32])> =
            self.sessions.iter().flatten().map(|s| (s.slot, s.name)).collect();
        for (slot, name) in announcements {
            self.event_log.append(Event::JoinExit {
                slot,
                joined: true,
                team: Some(Team::Spectator),
                object_slot: None,
                name: truncate_name(&name),
            });
        }

        let puck_slot = self.find_empty_object_slot().expect("empty grid after reset");
        self.objects[puck_slot as usize] = Some(Object::Puck(PuckObject::spawn(PUCK_SPAWN, Mat3::IDENTITY)));
    }

    /// Registers a new session; starts a new match if this is the first
    /// player, otherwise announces the join to the running match (§4.8).
    pub fn join(&mut self, address: SocketAddr, name: [u8; 32]) -> Option<u8> {
        if self.find_session_by_addr(address).is_some() {
            return None; // DuplicateJoin (§7): ignored
        }
        let slot = self.find_empty_session_slot()?;
        let is_first = self.is_empty();
        self.sessions[slot as usize] = Some(PlayerSession::new(slot, address, name, self.game_id));

        if is_first {
            self.start_new_game();
        } else {
            self.event_log.append(Event::JoinExit {
                slot,
                joined: true,
                team: Some(Team::Spectator),
                object_slot: None,
                name: truncate_name(&name),
            });
        }
        let display = {
            let s = self.sessions[slot as usize].as_ref().unwrap();
            s.display_name().to_vec()
        };
        self.append_server_chat(format!("{} joined", String::from_utf8_lossy(&display)));
        log::info!("session {} joined from {}", slot, address);
        Some(slot)
    }

    /// Removes a session, releasing its object slot and recording the exit
    /// (§3 lifecycle, §7 taxonomy).
    pub fn exit(&mut self, slot: u8) {
        let Some(session) = self.sessions[slot as usize].take() else { return };
        if let Some(obj_slot) = session.object_slot {
            self.objects[obj_slot as usize] = None;
        }
        let display = session.display_name().to_vec();
        self.append_server_chat(format!("{} exited", String::from_utf8_lossy(&display)));
        self.event_log.append(Event::JoinExit {
            slot,
            joined: false,
            team: None,
            object_slot: None,
            name: truncate_name(&session.name),
        });
        log::info!("session {} exited", slot);
    }

    fn append_server_chat(&mut self, text: String) {
        self.event_log.append(Event::Chat { author: None, text: text.into_bytes() });
    }

    /// Applies one client UPDATE datagram's fields to session `slot` (§4.3,
    /// §7 `GameIdMismatch`/`UnknownSender`).
    #[allow(clippy::too_many_arguments)]
    pub fn apply_update(
        &mut self,
        slot: u8,
        game_id: u32,
        stick_angle: f32,
        turn: f32,
        fwd_back: f32,
        stick_x: f32,
        stick_y: f32,
        head_rot: f32,
        body_rot: f32,
        keys: u32,
        last_acked_packet: u32,
        last_seen_msg_index: u16,
        chat: Option<(u8, Vec<u8>)>,
    ) {
        let Some(session) = self.sessions[slot as usize].as_mut() else { return }; // UnknownSender
        session.reset_inactivity();
        session.game_id = game_id;
        if game_id != self.game_id {
            return; // GameIdMismatch: ignored, but inactivity already reset
        }
        session.input.prev_keys = session.input.keys;
        session.input.keys = Keys::from_bits_truncate(keys);
        session.input.stick_angle = stick_angle;
        session.input.turn = turn;
        session.input.fwd_back = fwd_back;
        session.input.stick_x = stick_x;
        session.input.stick_y = stick_y;
        session.input.head_rot = head_rot;
        session.input.body_rot = body_rot;
        session.last_acked_packet = if last_acked_packet == u32::MAX { None } else { Some(last_acked_packet) };
        session.msg_index = last_seen_msg_index;

        if let Some((rep_index, text)) = chat {
            if rep_index != session.chat_rep_index {
                session.chat_rep_index = rep_index;
                self.event_log.append(Event::Chat { author: Some(slot), text });
            }
        }
    }

    fn spawn_point(&self, team: Team) -> Vec3 {
        match team {
            Team::Red => RED_SPAWN,
            Team::Blue => Vec3::new(self.rink.width() - 10.0, 2.0, self.rink.length() - 10.0),
            Team::Spectator => Vec3::ZERO,
        }
    }

    fn move_to_spectator(&mut self, slot: u8) {
        let object_slot = self.sessions[slot as usize].as_ref().unwrap().object_slot;
        if let Some(obj_slot) = object_slot {
            self.objects[obj_slot as usize] = None;
        }
        let session = self.sessions[slot as usize].as_mut().unwrap();
        session.team = Team::Spectator;
        session.object_slot = None;
        let name = truncate_name(&session.name);
        self.event_log.append(Event::JoinExit { slot, joined: true, team: Some(Team::Spectator), object_slot: None, name });
    }

    /// Moves `slot` onto `team`. Spawns a fresh object only when the session
    /// currently has none (i.e. is coming from spectator); switching
    /// straight between red and blue while already on the ice just relabels
    /// the existing object, matching the original's direct team reassignment.
    fn move_to_team(&mut self, slot: u8, team: Team) {
        let had_object = self.sessions[slot as usize].as_ref().unwrap().object_slot.is_some();
        if !had_object {
            let Some(obj_slot) = self.find_empty_object_slot() else { return };
            let spawn = self.spawn_point(team);
            self.objects[obj_slot as usize] = Some(Object::Player(PlayerObject::spawn(spawn, Mat3::IDENTITY, slot)));
            let session = self.sessions[slot as usize].as_mut().unwrap();
            session.team = team;
            session.object_slot = Some(obj_slot);
        } else {
            let session = self.sessions[slot as usize].as_mut().unwrap();
            session.team = team;
        }
        let session = self.sessions[slot as usize].as_ref().unwrap();
        let name = truncate_name(&session.name);
        let object_slot = session.object_slot;
        self.event_log.append(Event::JoinExit { slot, joined: true, team: Some(team), object_slot, name });
    }

    /// Re-derives every session's team from its `keys` bits 2/3/5, each
    /// edge-triggered independently rather than trusted as a truthy team
    /// value (§9 open question i). Spectate takes priority over joining a
    /// team, and red over blue, when more than one edge fires in the same
    /// tick.
    fn apply_team_changes(&mut self) {
        let slots: Vec<u8> = self.sessions.iter().enumerate().filter_map(|(i, s)| s.as_ref().map(|_| i as u8)).collect();
        for slot in slots {
            let session = self.sessions[slot as usize].as_ref().unwrap();
            let (keys, prev_keys, team) = (session.input.keys, session.input.prev_keys, session.team);
            if keys.pressed_edge(prev_keys, Keys::SPECTATE) && team != Team::Spectator {
                self.move_to_spectator(slot);
            } else if keys.pressed_edge(prev_keys, Keys::JOIN_RED) && team != Team::Red {
                self.move_to_team(slot, Team::Red);
            } else if keys.pressed_edge(prev_keys, Keys::JOIN_BLUE) && team != Team::Blue {
                self.move_to_team(slot, Team::Blue);
            }
        }
    }

    fn build_input_array(&self) -> [PlayerInput; OBJECT_SLOTS] {
        let mut inputs: [PlayerInput; OBJECT_SLOTS] = std::array::from_fn(|_| PlayerInput::default());
        for session in self.sessions.iter().flatten() {
            if let Some(obj_slot) = session.object_slot {
                inputs[obj_slot as usize] = session.input;
            }
        }
        inputs
    }

    fn build_ring_entry(&self) -> RingEntry {
        let mut entry = RingEntry::default();
        for (i, object) in self.objects.iter().enumerate() {
            entry.objects[i] = object.as_ref().map(ObjectSnapshot::from_object);
        }
        entry
    }

    /// Evicts sessions past the inactivity limit, run once per snapshot
    /// frame (§4.8). Returns the slots removed so the caller can log them.
    fn evict_inactive(&mut self) -> Vec<u8> {
        let mut evicted = Vec::new();
        for (i, session) in self.sessions.iter_mut().enumerate() {
            if let Some(s) = session {
                s.inactivity += 1;
                if s.inactivity >= INACTIVITY_LIMIT {
                    evicted.push(i as u8);
                }
            }
        }
        evicted
    }

    fn build_snapshot_messages(&self) -> Vec<Outgoing> {
        let snapshot_objects = self.ring.get(self.packet_id as u32).map(|e| e.objects).unwrap_or_default();
        let mut out = Vec::with_capacity(self.session_count() as usize);
        for session in self.sessions.iter().flatten() {
            if session.game_id != self.game_id {
                out.push(Outgoing {
                    slot: session.slot,
                    address: session.address,
                    message: ServerMessage::NewMatch { game_id: self.game_id },
                });
                continue;
            }
            let (base_msg_index, events) = self.event_log.window(session.msg_index);
            out.push(Outgoing {
                slot: session.slot,
                address: session.address,
                message: ServerMessage::GameUpdate(GameUpdate {
                    game_id: self.game_id,
                    simstep: self.simstep,
                    gameover: self.gameover,
                    red_score: self.red_score,
                    blue_score: self.blue_score,
                    timeleft: self.timeleft,
                    timeout: self.timeout,
                    period: self.period,
                    your_slot: session.slot,
                    packet_id: self.packet_id as u32,
                    previous_packet_id: session.last_acked_packet,
                    objects: snapshot_objects,
                    base_msg_index,
                    events: events.to_vec(),
                }),
            });
        }
        out
    }

    /// Advances one 100 Hz tick: team-change side effects, physics, the
    /// clock, and — every second tick — a fresh snapshot frame (§4.8).
    /// Returns the datagrams to send this tick, if any.
    pub fn tick(&mut self) -> Vec<Outgoing> {
        self.apply_team_changes();

        let inputs = self.build_input_array();
        physics::step_tick(&mut self.objects, &inputs, &self.rink);

        self.timeleft = if self.timeleft == 0 { STARTING_TIMELEFT } else { self.timeleft - 1 };
        self.simstep = self.simstep.wrapping_add(1);

        if self.simstep & 1 != 0 {
            return Vec::new();
        }

        for slot in self.evict_inactive() {
            log::warn!("session {} evicted for inactivity", slot);
            self.exit(slot);
        }

        self.packet_id += 1;
        let entry = self.build_ring_entry();
        self.ring.insert(self.packet_id as u32, entry);

        self.build_snapshot_messages()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(port: u16) -> SocketAddr {
        format!("127.0.0.1:{port}").parse().unwrap()
    }

    fn name(bytes: &[u8]) -> [u8; 32] {
        let mut n = [0u8; 32];
        n[..bytes.len()].copy_from_slice(bytes);
        n
    }

    #[test]
    fn first_join_starts_a_match_with_spectator_join_event() {
        let mut m = Match::new(Rink::default_sized(), DEFAULT_TEAM_SIZE);
        let slot = m.join(addr(1), name(b"Alice")).unwrap();
        assert_eq!(slot, 0);
        assert_eq!(m.game_id(), 1);
        let (_, events) = m.event_log.window(0);
        assert!(events.iter().any(|e| matches!(e, Event::JoinExit { team: Some(Team::Spectator), .. })));
    }

    #[test]
    fn joining_red_spawns_a_player_object_at_the_red_spawn_point() {
        let mut m = Match::new(Rink::default_sized(), DEFAULT_TEAM_SIZE);
        let slot = m.join(addr(1), name(b"Alice")).unwrap();
        m.sessions[slot as usize].as_mut().unwrap().input.keys = Keys::JOIN_RED;
        m.tick();
        let session = m.sessions[slot as usize].as_ref().unwrap();
        assert_eq!(session.team, Team::Red);
        let obj_slot = session.object_slot.expect("object spawned");
        let Some(Object::Player(p)) = &m.objects[obj_slot as usize] else { panic!("expected player") };
        assert_eq!(p.body.position, RED_SPAWN);
    }

    #[test]
    fn inactivity_evicts_after_limit_and_logs_an_exit_event() {
        let mut m = Match::new(Rink::default_sized(), DEFAULT_TEAM_SIZE);
        let slot = m.join(addr(1), name(b"Alice")).unwrap();
        for _ in 0..(INACTIVITY_LIMIT as u64 * 2 + 4) {
            m.tick();
        }
        assert!(m.sessions[slot as usize].is_none());
        let (_, events) = m.event_log.window(0);
        assert!(events.iter().any(|e| matches!(e, Event::JoinExit { joined: false, .. })));
    }

    #[test]
    fn update_resets_inactivity_even_on_game_id_mismatch() {
        let mut m = Match::new(Rink::default_sized(), DEFAULT_TEAM_SIZE);
        let slot = m.join(addr(1), name(b"Alice")).unwrap();
        m.sessions[slot as usize].as_mut().unwrap().inactivity = 500;
        m.apply_update(slot, self_game_id_plus_one(&m), 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0, u32::MAX, 0, None);
        assert_eq!(m.sessions[slot as usize].as_ref().unwrap().inactivity, 0);
    }

    fn self_game_id_plus_one(m: &Match) -> u32 {
        m.game_id() + 1
    }

    #[test]
    fn event_window_is_idempotent_across_repeated_delivery() {
        let mut m = Match::new(Rink::default_sized(), DEFAULT_TEAM_SIZE);
        let slot = m.join(addr(1), name(b"Bob")).unwrap();
        m.sessions[slot as usize].as_mut().unwrap().input.keys = Keys::JOIN_RED;
        m.tick();
        let first = m.build_snapshot_messages();
        let second = m.build_snapshot_messages();
        assert_eq!(first, second);
    }
}
