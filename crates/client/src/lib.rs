//! Symmetric client peer for the wire protocol (§4.5): the half of a
//! connection that speaks for a human player rather than the authoritative
//! match. No rendering, no input devices, no prediction/interpolation —
//! just the state machine that turns outgoing input into `UPDATE`/`JOIN`
//! datagrams and incoming `GAME_UPDATE`/`NEW_MATCH` datagrams into roster
//! and acknowledgement state.

pub mod session;

pub use session::ClientSession;
