use std::fmt;

use crc::{Algorithm, Crc};

pub const CRC_64_ECMA: Algorithm<u64> = crc::CRC_64_ECMA_182;

/// CRC-64 over an accumulated byte buffer.
///
/// Used both to seed codeword generation from attribute values and to
/// checksum the relation header.
#[derive(Clone)]
pub struct Hasher {
    crc64: Crc<u64>,
    buffer: Vec<u8>,
}

impl fmt::Debug for Hasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hasher")
    }
}

impl Hasher {
    pub fn new() -> Self {
        Self {
            crc64: Crc::<u64>::new(&CRC_64_ECMA),
            buffer: Vec::new(),
        }
    }

    pub fn write(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    pub fn checksum(&self) -> u64 {
        self.crc64.checksum(&self.buffer)
    }

    pub fn reset(&mut self) {
        self.buffer.clear();
    }
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new()
    }
}

/// One-shot hash of a value's raw bytes.
pub fn hash_bytes(data: &[u8]) -> u64 {
    Crc::<u64>::new(&CRC_64_ECMA).checksum(data)
}
