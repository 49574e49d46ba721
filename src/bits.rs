//! Fixed-width bit vectors.
//!
//! Every signature, codeword and bit-slice in a relation is a `Bits`. The
//! width is fixed at construction and storage is a whole number of bytes,
//! which is exactly the on-page representation: bit `i` lives in byte
//! `i / 8` under mask `1 << (i % 8)`.

use std::fmt;

#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Bits {
    nbits: usize,
    bytes: Vec<u8>,
}

impl Bits {
    /// An all-zero vector of `nbits` bits.
    pub fn new(nbits: usize) -> Self {
        Self {
            nbits,
            bytes: vec![0u8; nbits.div_ceil(8)],
        }
    }

    /// An all-ones vector of `nbits` bits.
    pub fn all_ones(nbits: usize) -> Self {
        let mut bits = Self::new(nbits);
        bits.set_all();
        bits
    }

    /// Rebuilds a vector from its byte representation. Bits past `nbits`
    /// in the final byte are cleared.
    pub fn from_bytes(nbits: usize, data: &[u8]) -> Self {
        let mut bits = Self::new(nbits);
        let n = bits.bytes.len();
        bits.bytes.copy_from_slice(&data[..n]);
        bits.clear_tail();
        bits
    }

    pub fn nbits(&self) -> usize {
        self.nbits
    }

    pub fn nbytes(&self) -> usize {
        self.bytes.len()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[inline]
    pub fn is_set(&self, pos: usize) -> bool {
        debug_assert!(pos < self.nbits, "bit {} out of range {}", pos, self.nbits);
        self.bytes[pos / 8] & (1 << (pos % 8)) != 0
    }

    #[inline]
    pub fn set(&mut self, pos: usize) {
        debug_assert!(pos < self.nbits, "bit {} out of range {}", pos, self.nbits);
        self.bytes[pos / 8] |= 1 << (pos % 8);
    }

    #[inline]
    pub fn unset(&mut self, pos: usize) {
        debug_assert!(pos < self.nbits, "bit {} out of range {}", pos, self.nbits);
        self.bytes[pos / 8] &= !(1 << (pos % 8));
    }

    pub fn set_all(&mut self) {
        self.bytes.fill(0xff);
        self.clear_tail();
    }

    pub fn unset_all(&mut self) {
        self.bytes.fill(0);
    }

    /// Sets every bit in `[0, end)`.
    pub fn set_prefix(&mut self, end: usize) {
        let end = end.min(self.nbits);
        let full = end / 8;
        self.bytes[..full].fill(0xff);
        for pos in full * 8..end {
            self.set(pos);
        }
    }

    /// `self |= other`. Widths must match.
    pub fn or_with(&mut self, other: &Bits) {
        debug_assert_eq!(self.nbits, other.nbits);
        for (dst, src) in self.bytes.iter_mut().zip(&other.bytes) {
            *dst |= *src;
        }
    }

    /// `self &= other`. Widths must match.
    pub fn and_with(&mut self, other: &Bits) {
        debug_assert_eq!(self.nbits, other.nbits);
        for (dst, src) in self.bytes.iter_mut().zip(&other.bytes) {
            *dst &= *src;
        }
    }

    /// True if every bit set in `self` is also set in `other`.
    pub fn is_subset_of(&self, other: &Bits) -> bool {
        debug_assert_eq!(self.nbits, other.nbits);
        self.bytes
            .iter()
            .zip(&other.bytes)
            .all(|(a, b)| a & !b == 0)
    }

    pub fn count_ones(&self) -> usize {
        self.bytes.iter().map(|b| b.count_ones() as usize).sum()
    }

    pub fn is_zero(&self) -> bool {
        self.bytes.iter().all(|&b| b == 0)
    }

    /// Positions of the set bits, ascending.
    pub fn iter_ones(&self) -> impl Iterator<Item = usize> + '_ {
        self.bytes
            .iter()
            .enumerate()
            .filter(|&(_, &b)| b != 0)
            .flat_map(|(i, &b)| {
                (0..8usize)
                    .filter(move |&j| b & (1u8 << j) != 0)
                    .map(move |j| i * 8 + j)
            })
    }

    fn clear_tail(&mut self) {
        let tail = self.nbits % 8;
        if tail != 0 {
            if let Some(last) = self.bytes.last_mut() {
                *last &= (1u8 << tail) - 1;
            }
        }
    }
}

/// Bit 0 first, one character per bit.
impl fmt::Display for Bits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in 0..self.nbits {
            f.write_str(if self.is_set(i) { "1" } else { "0" })?;
        }
        Ok(())
    }
}

impl fmt::Debug for Bits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Bits({}: {})", self.nbits, self)
    }
}
