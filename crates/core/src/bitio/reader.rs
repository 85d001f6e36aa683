/// Bit-level reader over a borrowed byte slice. Reads past the end of the
/// buffer return zero bits and latch `overran`, so a caller can decode
/// optimistically and check `overran()` once at the end of a datagram
/// instead of threading `Result` through every field (truncated datagrams
/// are a silent drop per §7, not a recoverable error).
#[derive(Debug)]
pub struct BitReader<'a> {
    data: &'a [u8],
    pos: usize,
    overran: bool,
}

impl<'a> BitReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0, overran: false }
    }

    pub fn overran(&self) -> bool {
        self.overran
    }

    pub fn pad_to_byte(&mut self) {
        if self.pos % 8 != 0 {
            self.pos += 8 - (self.pos % 8);
        }
    }

    pub fn read_bytes_aligned(&mut self, len: usize) -> &'a [u8] {
        self.pad_to_byte();
        let start = self.pos / 8;
        let end = start + len;
        self.pos += len * 8;
        if end > self.data.len() {
            self.overran = true;
            &[]
        } else {
            &self.data[start..end]
        }
    }

    pub fn read_unsigned(&mut self, len: u8) -> u32 {
        let mut result: u32 = 0;
        let mut got: u8 = 0;
        while got < len {
            let byte_idx = self.pos / 8;
            let byte = if byte_idx < self.data.len() {
                self.data[byte_idx]
            } else {
                self.overran = true;
                0
            };
            let bit_off = (self.pos % 8) as u8;
            let bits_left_in_byte = 8 - bit_off;
            let take = (len - got).min(bits_left_in_byte);
            let mask = ((1u16 << take) - 1) as u8;
            let chunk = (byte >> bit_off) & mask;
            result |= (chunk as u32) << got;
            self.pos += take as usize;
            got += take;
        }
        result
    }

    pub fn read_signed(&mut self, len: u8) -> i32 {
        let raw = self.read_unsigned(len);
        if len == 32 {
            return raw as i32;
        }
        let sign_bit = 1u32 << (len - 1);
        if raw & sign_bit != 0 {
            (raw as i32) - ((1i32) << len)
        } else {
            raw as i32
        }
    }

    /// Returns `-1` when the field holds all-ones, used for optional small
    /// indices (player/object slots).
    pub fn read_unsigned_or_minus_one(&mut self, len: u8) -> i32 {
        let raw = self.read_unsigned(len);
        if raw == (1u32 << len) - 1 {
            -1
        } else {
            raw as i32
        }
    }

    pub fn read_unsigned_aligned(&mut self, len: u8) -> u32 {
        debug_assert!(len % 8 == 0);
        self.pad_to_byte();
        self.read_unsigned(len)
    }

    pub fn read_u8_aligned(&mut self) -> u8 {
        self.read_bytes_aligned(1).first().copied().unwrap_or(0)
    }

    pub fn read_u16_aligned(&mut self) -> u16 {
        let b = self.read_bytes_aligned(2);
        if b.len() == 2 { u16::from_le_bytes([b[0], b[1]]) } else { 0 }
    }

    pub fn read_u32_aligned(&mut self) -> u32 {
        let b = self.read_bytes_aligned(4);
        if b.len() == 4 { u32::from_le_bytes([b[0], b[1], b[2], b[3]]) } else { 0 }
    }

    pub fn read_f32_aligned(&mut self) -> f32 {
        let b = self.read_bytes_aligned(4);
        if b.len() == 4 { f32::from_le_bytes([b[0], b[1], b[2], b[3]]) } else { 0.0 }
    }

    /// Reads `len` unaligned 7-bit ASCII fields, the inverse of
    /// `BitWriter::write_ascii7`.
    pub fn read_ascii7(&mut self, len: usize) -> Vec<u8> {
        (0..len).map(|_| self.read_unsigned(7) as u8).collect()
    }

    /// Delta-position codec (§4.1). `old` is the previously known value for
    /// this field (from the referenced ring entry, if any). Returns `None`
    /// when a relative encoding is received with no reference available —
    /// the `UnreferencedDelta` case in §7, which leaves the prior value in
    /// place rather than producing a bogus position.
    pub fn read_pos(&mut self, len: u8, old: Option<i32>) -> Option<i32> {
        match self.read_unsigned(2) {
            // The payload is always consumed to keep the bit cursor in
            // sync, even when `old` is absent and the result is discarded.
            0 => {
                let delta = self.read_signed(3);
                old.map(|o| o + delta)
            }
            1 => {
                let delta = self.read_signed(6);
                old.map(|o| o + delta)
            }
            2 => {
                let delta = self.read_signed(12);
                old.map(|o| o + delta)
            }
            3 => Some(self.read_unsigned(len) as i32),
            _ => unreachable!("2-bit field"),
        }
    }
}
