//! Typed decode failures for embedders that want more than "drop it"
//! (§7 names the taxonomy; the reactor itself only ever acts on the
//! silent-drop `Option` returned by `decode`, never this type directly).

use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum WireError {
    #[error("datagram shorter than the 4-byte magic")]
    Truncated,
    #[error("bad magic bytes, not an HQM datagram")]
    BadMagic,
    #[error("unrecognized command byte {0}")]
    UnknownCommand(u8),
    #[error("datagram body ended before the message was fully decoded")]
    Overran,
}
