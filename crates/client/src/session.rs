//! Client-side connection state machine (§4.5). Mirrors the teacher's
//! `NetworkClient` handshake/reconciliation split, minus everything that
//! exists only to feed a renderer: `Joining` repeats `JOIN` until the first
//! `GAME_UPDATE` with no pending events arrives, then `InMatch` composes
//! `UPDATE` datagrams from whatever input registers the caller has set.

use hqm_core::eventlog::{Event, Team, NAME_LEN};
use hqm_core::match_state::MAX_SESSIONS;
use hqm_core::session::PlayerInput;
use hqm_core::wire::{ChatFragment, ClientMessage, ServerMessage, PROTOCOL_VERSION};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    /// Sent at least one `JOIN`, waiting for the match to fully catch us up.
    Joining,
    InMatch,
}

/// A roster entry as seen from a connected client's point of view (§4.7):
/// name, team, and the running goal/assist tally, kept current purely from
/// applied `JoinExit`/`Goal` events.
#[derive(Debug, Clone)]
pub struct RosterEntry {
    pub name: [u8; NAME_LEN],
    pub team: Team,
    pub goals: u16,
    pub assists: u16,
}

pub struct ClientSession {
    name: [u8; 32],
    state: ClientState,
    game_id: Option<u32>,
    your_slot: Option<u8>,
    last_acked_packet: Option<u32>,
    msg_index: u16,
    chat_rep_index: u8,
    pending_chat: Option<Vec<u8>>,
    pub input: PlayerInput,
    roster: Box<[Option<RosterEntry>; MAX_SESSIONS]>,
}

impl ClientSession {
    pub fn new(name: [u8; 32]) -> Self {
        Self {
            name,
            state: ClientState::Joining,
            game_id: None,
            your_slot: None,
            last_acked_packet: None,
            msg_index: 0,
            chat_rep_index: 0,
            pending_chat: None,
            input: PlayerInput::default(),
            roster: Box::new(std::array::from_fn(|_| None)),
        }
    }

    pub fn state(&self) -> ClientState {
        self.state
    }

    pub fn your_slot(&self) -> Option<u8> {
        self.your_slot
    }

    pub fn roster(&self, slot: u8) -> Option<&RosterEntry> {
        self.roster.get(slot as usize)?.as_ref()
    }

    /// Queues a chat fragment to ride along on the next `UPDATE`. A no-op
    /// while still `Joining`, since there's no `UPDATE` to carry it on yet.
    pub fn say(&mut self, text: Vec<u8>) {
        self.pending_chat = Some(text);
    }

    /// Builds this tick's outgoing datagram: a repeated `JOIN` while
    /// catching up, an `UPDATE` carrying the current input registers
    /// otherwise.
    pub fn outgoing(&mut self) -> ClientMessage {
        match self.state {
            ClientState::Joining => ClientMessage::Join { version: PROTOCOL_VERSION, name: self.name },
            ClientState::InMatch => {
                let chat = self.pending_chat.take().map(|text| {
                    let rep_index = self.chat_rep_index;
                    self.chat_rep_index = self.chat_rep_index.wrapping_add(1) % 8;
                    ChatFragment { rep_index, text }
                });
                ClientMessage::Update {
                    game_id: self.game_id.unwrap_or(0),
                    stick_angle: self.input.stick_angle,
                    turn: self.input.turn,
                    reserved: 0.0,
                    fwd_back: self.input.fwd_back,
                    stick_x: self.input.stick_x,
                    stick_y: self.input.stick_y,
                    head_rot: self.input.head_rot,
                    body_rot: self.input.body_rot,
                    keys: self.input.keys.bits(),
                    last_acked_packet: self.last_acked_packet.unwrap_or(u32::MAX),
                    last_seen_msg_index: self.msg_index,
                    chat,
                }
            }
        }
    }

    /// Applies one incoming datagram, advancing the state machine and
    /// roster per §4.5/§4.7.
    pub fn handle(&mut self, msg: &ServerMessage) {
        match msg {
            ServerMessage::InfoResponse(_) => {}
            ServerMessage::GameUpdate(update) => {
                self.game_id = Some(update.game_id);
                self.your_slot = Some(update.your_slot);
                self.last_acked_packet = Some(update.packet_id);

                // The server keeps re-sending the same event window until
                // the ack round-trips, so only events at or past the
                // high-water mark we've already consumed are new (§4.7,
                // idempotence of re-transmitted ranges).
                let old_msg_index = self.msg_index;
                for (i, event) in update.events.iter().enumerate() {
                    let index = update.base_msg_index.wrapping_add(i as u16);
                    if index >= old_msg_index {
                        self.apply_event(event);
                    }
                }
                self.msg_index = update.base_msg_index.wrapping_add(update.events.len() as u16);

                if self.state == ClientState::Joining && update.events.is_empty() {
                    self.state = ClientState::InMatch;
                }
            }
            ServerMessage::NewMatch { game_id } => {
                if self.game_id != Some(*game_id) {
                    self.last_acked_packet = None;
                    self.msg_index = 0;
                    self.roster = Box::new(std::array::from_fn(|_| None));
                }
                self.game_id = Some(*game_id);
            }
        }
    }

    fn apply_event(&mut self, event: &Event) {
        match event {
            Event::JoinExit { slot, joined, team, name, .. } => {
                let slot = *slot as usize;
                if *joined {
                    let entry = self.roster[slot].get_or_insert_with(|| RosterEntry {
                        name: *name,
                        team: Team::Spectator,
                        goals: 0,
                        assists: 0,
                    });
                    entry.name = *name;
                    entry.team = team.unwrap_or(Team::Spectator);
                } else {
                    self.roster[slot] = None;
                }
            }
            Event::Goal { scorer, assister, .. } => {
                if let Some(slot) = scorer {
                    if let Some(entry) = self.roster[*slot as usize].as_mut() {
                        entry.goals += 1;
                    }
                }
                if let Some(slot) = assister {
                    if let Some(entry) = self.roster[*slot as usize].as_mut() {
                        entry.assists += 1;
                    }
                }
            }
            Event::Chat { .. } => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hqm_core::wire::server_message::GameUpdate;

    fn name(bytes: &[u8]) -> [u8; 32] {
        let mut n = [0u8; 32];
        n[..bytes.len()].copy_from_slice(bytes);
        n
    }

    fn empty_update(game_id: u32, packet_id: u32, your_slot: u8) -> GameUpdate {
        update_at(game_id, packet_id, your_slot, 0)
    }

    fn update_at(game_id: u32, packet_id: u32, your_slot: u8, base_msg_index: u16) -> GameUpdate {
        GameUpdate {
            game_id,
            simstep: 0,
            gameover: false,
            red_score: 0,
            blue_score: 0,
            timeleft: 30000,
            timeout: 0,
            period: 0,
            your_slot,
            packet_id,
            previous_packet_id: None,
            objects: std::array::from_fn(|_| None),
            base_msg_index,
            events: Vec::new(),
        }
    }

    #[test]
    fn starts_joining_and_repeats_join_until_caught_up() {
        let mut session = ClientSession::new(name(b"Alice"));
        assert_eq!(session.state(), ClientState::Joining);
        match session.outgoing() {
            ClientMessage::Join { version, name: n } => {
                assert_eq!(version, PROTOCOL_VERSION);
                assert_eq!(&n[..5], b"Alice");
            }
            other => panic!("expected Join, got {other:?}"),
        }
    }

    #[test]
    fn first_empty_game_update_transitions_to_in_match() {
        let mut session = ClientSession::new(name(b"Alice"));
        session.handle(&ServerMessage::GameUpdate(empty_update(1, 0, 3)));
        assert_eq!(session.state(), ClientState::InMatch);
        assert_eq!(session.your_slot(), Some(3));
        match session.outgoing() {
            ClientMessage::Update { last_acked_packet, .. } => assert_eq!(last_acked_packet, 0),
            other => panic!("expected Update, got {other:?}"),
        }
    }

    #[test]
    fn game_update_carrying_events_does_not_yet_transition() {
        let mut session = ClientSession::new(name(b"Alice"));
        let mut update = empty_update(1, 0, 0);
        update.events.push(Event::JoinExit { slot: 1, joined: true, team: Some(Team::Red), object_slot: None, name: [0u8; 31] });
        session.handle(&ServerMessage::GameUpdate(update));
        assert_eq!(session.state(), ClientState::Joining);
    }

    #[test]
    fn new_match_with_different_game_id_resets_ack_and_roster() {
        let mut session = ClientSession::new(name(b"Alice"));
        session.handle(&ServerMessage::GameUpdate(empty_update(1, 5, 0)));
        let mut update = empty_update(1, 6, 0);
        update.events.push(Event::JoinExit { slot: 2, joined: true, team: Some(Team::Blue), object_slot: None, name: [0u8; 31] });
        session.handle(&ServerMessage::GameUpdate(update));
        assert!(session.roster(2).is_some());

        session.handle(&ServerMessage::NewMatch { game_id: 2 });
        assert!(session.roster(2).is_none());
        match session.outgoing() {
            ClientMessage::Update { last_acked_packet, last_seen_msg_index, .. } => {
                assert_eq!(last_acked_packet, u32::MAX);
                assert_eq!(last_seen_msg_index, 0);
            }
            other => panic!("expected Update, got {other:?}"),
        }
    }

    #[test]
    fn goal_event_increments_scorer_and_assister() {
        let mut session = ClientSession::new(name(b"Alice"));
        session.handle(&ServerMessage::GameUpdate(empty_update(1, 0, 0)));
        let mut update = update_at(1, 1, 0, 0);
        update.events.push(Event::JoinExit { slot: 4, joined: true, team: Some(Team::Red), object_slot: None, name: [0u8; 31] });
        session.handle(&ServerMessage::GameUpdate(update));
        let mut update = update_at(1, 2, 0, 1);
        update.events.push(Event::Goal { team: Team::Red, scorer: Some(4), assister: None });
        session.handle(&ServerMessage::GameUpdate(update));
        assert_eq!(session.roster(4).unwrap().goals, 1);
    }

    #[test]
    fn redelivered_event_window_is_applied_only_once() {
        // The server keeps re-sending the same `base_msg_index` window
        // until the client's ack round-trips (§4.7, §8 property 4): a
        // Goal event can arrive in several consecutive GAME_UPDATEs before
        // that happens, and must only count once.
        let mut session = ClientSession::new(name(b"Alice"));
        session.handle(&ServerMessage::GameUpdate(empty_update(1, 0, 0)));

        let mut update = update_at(1, 1, 0, 0);
        update.events.push(Event::JoinExit { slot: 4, joined: true, team: Some(Team::Red), object_slot: None, name: [0u8; 31] });
        update.events.push(Event::Goal { team: Team::Red, scorer: Some(4), assister: None });

        // Same window delivered three times in a row, as it would be
        // while the client's ack hasn't caught up yet.
        session.handle(&ServerMessage::GameUpdate(update.clone()));
        session.handle(&ServerMessage::GameUpdate(update.clone()));
        session.handle(&ServerMessage::GameUpdate(update));

        assert_eq!(session.roster(4).unwrap().goals, 1);
    }
}
