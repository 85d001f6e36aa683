//! Append-only join/exit/goal/chat event log (§4.7) delivered to clients as
//! a sliding window inside each `GAME_UPDATE`, addressed by a 16-bit
//! absolute index so repeated delivery of the same range is idempotent.

use crate::bitio::{BitReader, BitWriter};

pub const MAX_EVENTS_PER_FRAME: usize = 15;
pub const NAME_LEN: usize = 31;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Team {
    Spectator = 0,
    Red = 1,
    Blue = 2,
}

impl Team {
    fn code(self) -> u32 {
        self as u32
    }

    fn from_code(code: u32) -> Team {
        match code {
            1 => Team::Red,
            2 => Team::Blue,
            _ => Team::Spectator,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    JoinExit {
        slot: u8,
        joined: bool,
        team: Option<Team>,
        object_slot: Option<u8>,
        name: [u8; NAME_LEN],
    },
    Goal {
        team: Team,
        scorer: Option<u8>,
        assister: Option<u8>,
    },
    Chat {
        /// `None` means the message was generated by the server itself.
        author: Option<u8>,
        text: Vec<u8>,
    },
}

impl Event {
    pub fn encode(&self, w: &mut BitWriter) {
        match self {
            Event::JoinExit { slot, joined, team, object_slot, name } => {
                w.write_unsigned(6, 0);
                w.write_unsigned(6, *slot as u32);
                w.write_unsigned(1, *joined as u32);
                match team {
                    Some(t) => w.write_unsigned(2, t.code()),
                    None => w.write_unsigned(2, 0x3),
                }
                match object_slot {
                    Some(s) => w.write_unsigned(6, *s as u32),
                    None => w.write_unsigned(6, 0x3F),
                }
                w.write_ascii7(name);
            }
            Event::Goal { team, scorer, assister } => {
                w.write_unsigned(6, 1);
                w.write_unsigned(2, team.code());
                write_optional_slot(w, *scorer);
                write_optional_slot(w, *assister);
            }
            Event::Chat { author, text } => {
                w.write_unsigned(6, 2);
                write_optional_slot(w, *author);
                w.write_unsigned(6, text.len() as u32);
                w.write_ascii7(text);
            }
        }
    }

    pub fn decode(r: &mut BitReader) -> Option<Event> {
        match r.read_unsigned(6) {
            0 => {
                let slot = r.read_unsigned(6) as u8;
                let joined = r.read_unsigned(1) != 0;
                let team = read_optional_team(r);
                let object_slot = read_optional_slot(r);
                let name_bytes = r.read_ascii7(NAME_LEN);
                let mut name = [0u8; NAME_LEN];
                name.copy_from_slice(&name_bytes);
                Some(Event::JoinExit { slot, joined, team, object_slot, name })
            }
            1 => {
                let team = Team::from_code(r.read_unsigned(2));
                let scorer = read_optional_slot(r);
                let assister = read_optional_slot(r);
                Some(Event::Goal { team, scorer, assister })
            }
            2 => {
                let author = read_optional_slot(r);
                let len = r.read_unsigned(6) as usize;
                let text = r.read_ascii7(len);
                Some(Event::Chat { author, text })
            }
            _ => None,
        }
    }
}

fn write_optional_slot(w: &mut BitWriter, slot: Option<u8>) {
    match slot {
        Some(s) => w.write_unsigned(6, s as u32),
        None => w.write_unsigned(6, 0x3F),
    }
}

fn read_optional_slot(r: &mut BitReader) -> Option<u8> {
    match r.read_unsigned_or_minus_one(6) {
        -1 => None,
        v => Some(v as u8),
    }
}

fn read_optional_team(r: &mut BitReader) -> Option<Team> {
    match r.read_unsigned_or_minus_one(2) {
        -1 => None,
        v => Some(Team::from_code(v as u32)),
    }
}

/// Append-only sequence of events. The index of an event within the log is
/// its absolute position, truncated to 16 bits on the wire.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, event: Event) -> u16 {
        let index = self.events.len() as u16;
        self.events.push(event);
        index
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events starting at `from_index`, capped at `MAX_EVENTS_PER_FRAME`.
    /// Returns the base index actually used (clamped into range) and the
    /// slice of events from there.
    pub fn window(&self, from_index: u16) -> (u16, &[Event]) {
        let from = (from_index as usize).min(self.events.len());
        let to = (from + MAX_EVENTS_PER_FRAME).min(self.events.len());
        (from as u16, &self.events[from..to])
    }
}
