//! Authoritative game core for the HQM server and its symmetric client peer
//! (§1). No networking I/O lives here: the wire codec turns bytes into
//! typed messages, `Match` turns messages into state transitions, and the
//! caller (a UDP reactor) owns the socket.

pub mod bitio;
pub mod eventlog;
pub mod keys;
pub mod match_state;
pub mod math;
pub mod object;
pub mod physics;
pub mod ring;
pub mod rink;
pub mod rotation;
pub mod scheduler;
pub mod session;
pub mod wire;

pub use match_state::Match;
pub use scheduler::TickScheduler;
