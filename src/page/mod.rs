//! Fixed-size pages of fixed-size items.
//!
//! ## Page Layout
//!
//! ```text
//! +----------------------+ offset 0
//! | Item count (u32, BE) |
//! +----------------------+ offset COUNT_SIZE
//! | Item 0               |
//! | Item 1               |
//! | ...                  |
//! +----------------------+
//! | Unused               |
//! +----------------------+ offset PAGE_SIZE
//! ```
//!
//! Items on a page all share one size (a tuple, a tuple signature, a page
//! signature or a bit-slice), so slot `n` starts at `COUNT_SIZE + n * size`.

mod file;

pub use file::PageFile;

use crate::bits::Bits;
use byteorder::{BigEndian, ByteOrder};

pub const PAGE_SIZE: usize = 4096;
pub const COUNT_SIZE: usize = 4;

/// Bytes available for items on one page.
pub const PAGE_AVAILABLE: usize = PAGE_SIZE - COUNT_SIZE;

pub type PageId = u32;
pub type Count = u32;

#[derive(Clone)]
pub struct Page {
    data: Vec<u8>,
}

impl Default for Page {
    fn default() -> Self {
        Self::new()
    }
}

impl Page {
    /// An empty page: zero items, zeroed slots.
    pub fn new() -> Self {
        Self {
            data: vec![0u8; PAGE_SIZE],
        }
    }

    pub(crate) fn from_vec(data: Vec<u8>) -> Self {
        debug_assert_eq!(data.len(), PAGE_SIZE);
        Self { data }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn nitems(&self) -> Count {
        BigEndian::read_u32(&self.data[..COUNT_SIZE])
    }

    pub fn set_nitems(&mut self, n: Count) {
        BigEndian::write_u32(&mut self.data[..COUNT_SIZE], n);
    }

    pub fn add_one_item(&mut self) {
        let n = self.nitems();
        self.set_nitems(n + 1);
    }

    /// Raw bytes of slot `slot` for items of `size` bytes.
    pub fn item(&self, slot: usize, size: usize) -> &[u8] {
        let start = Self::offset(slot, size);
        &self.data[start..start + size]
    }

    pub fn put_item(&mut self, slot: usize, item: &[u8]) {
        let start = Self::offset(slot, item.len());
        self.data[start..start + item.len()].copy_from_slice(item);
    }

    /// Reads the bit vector stored in `slot` into `bits`, using its width.
    pub fn get_bits(&self, slot: usize, bits: &mut Bits) {
        *bits = Bits::from_bytes(bits.nbits(), self.item(slot, bits.nbytes()));
    }

    pub fn put_bits(&mut self, slot: usize, bits: &Bits) {
        self.put_item(slot, bits.as_bytes());
    }

    fn offset(slot: usize, size: usize) -> usize {
        let start = COUNT_SIZE + slot * size;
        debug_assert!(
            start + size <= PAGE_SIZE,
            "slot {} of size {} overflows page",
            slot,
            size
        );
        start
    }
}
