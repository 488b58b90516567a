//! Intel HEX line checksum.
//!
//! The checksum is the two's complement of the 8-bit sum of every byte on
//! the line before it: byte count, address high, address low, record type,
//! and each data byte. Summing the whole line including the checksum
//! therefore yields zero.

/// Running 8-bit sum over the bytes of one line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Checksum {
    sum: u8,
}

impl Checksum {
    /// An empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one byte, truncating to 8 bits.
    pub fn push(&mut self, byte: u8) {
        self.sum = self.sum.wrapping_add(byte);
    }

    /// Add both bytes of a big-endian address.
    pub fn push_address(&mut self, address: u16) {
        for byte in address.to_be_bytes() {
            self.push(byte);
        }
    }

    /// Add every byte of `bytes`.
    pub fn push_bytes(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.push(byte);
        }
    }

    /// Decode `digits` as hex byte pairs and add each byte.
    pub fn push_hex(&mut self, digits: &str) -> Result<(), hex::FromHexError> {
        self.push_bytes(&hex::decode(digits)?);
        Ok(())
    }

    /// The checksum byte: `(!sum + 1) mod 256`.
    pub fn finish(self) -> u8 {
        (!self.sum).wrapping_add(1)
    }
}

/// Checksum of one line with the given header fields and payload.
///
/// `byte_count` is taken mod 256, matching the single byte it occupies on
/// the wire.
pub fn line_checksum(byte_count: usize, address: u16, kind_code: u8, data: &[u8]) -> u8 {
    let mut sum = Checksum::new();
    sum.push(byte_count as u8);
    sum.push_address(address);
    sum.push(kind_code);
    sum.push_bytes(data);
    sum.finish()
}
