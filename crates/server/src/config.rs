pub use hqm_core::match_state::DEFAULT_TEAM_SIZE;
pub use hqm_core::rink::{DEFAULT_CORNER_RADIUS as DEFAULT_RINK_CORNER, DEFAULT_LENGTH as DEFAULT_RINK_LENGTH, DEFAULT_WIDTH as DEFAULT_RINK_WIDTH};

/// Port the reference implementation has always listened on (§6).
pub const DEFAULT_PORT: u16 = 27585;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
    pub name: [u8; 32],
    pub public: bool,
    pub team_size: u8,
    pub rink_width: f32,
    pub rink_length: f32,
    pub rink_corner: f32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            name: pad_name(b"HQM Rust Server"),
            public: false,
            team_size: DEFAULT_TEAM_SIZE,
            rink_width: DEFAULT_RINK_WIDTH,
            rink_length: DEFAULT_RINK_LENGTH,
            rink_corner: DEFAULT_RINK_CORNER,
        }
    }
}

/// Truncates to 31 bytes and NUL-pads to 32, matching the wire's session
/// name encoding (§3).
pub fn pad_name(bytes: &[u8]) -> [u8; 32] {
    let mut name = [0u8; 32];
    let len = bytes.len().min(31);
    name[..len].copy_from_slice(&bytes[..len]);
    name
}
