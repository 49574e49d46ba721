//! Superimposed-coding signatures.
//!
//! Every bound attribute value is turned into a fixed-weight codeword and the
//! codewords are OR-ed together. Tuple signatures (`tm` bits) are kept as an
//! append log, one per tuple. Page signatures (`pm` bits) aggregate every
//! tuple on a data page and are additionally stored transposed as bit-slices,
//! one `bm`-bit slice per page-signature bit.
//!
//! A stored signature can only match a query if it is a superset of the
//! query's signature, so every evaluator over-approximates: candidate pages
//! still need to be checked against the actual tuples.

pub mod bsig;
pub mod codeword;
pub mod psig;
pub mod tsig;

pub use bsig::{find_pages_using_page_sigs, read_bit_slice};
pub use codeword::codeword;
pub use psig::{make_page_sig, read_page_sig, scan_page_sigs};
pub use tsig::{find_pages_using_tup_sigs, make_tuple_sig};

use crate::bits::Bits;
use crate::tuple::bound_vals;

/// OR of the `width`-bit codewords of every non-wildcard attribute in `tuple`.
pub(crate) fn superimpose(tuple: &str, width: usize, weight: usize) -> Bits {
    let mut sig = Bits::new(width);
    for value in bound_vals(tuple) {
        sig.or_with(&codeword(value, width, weight));
    }
    sig
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_superimpose_contains_codewords() {
        let sig = superimpose("alpha,beta,gamma", 64, 3);
        for value in ["alpha", "beta", "gamma"] {
            assert!(codeword(value, 64, 3).is_subset_of(&sig));
        }
        assert!(sig.count_ones() <= 9);
    }

    #[test]
    fn test_superimpose_skips_wildcards() {
        assert!(superimpose("?,?", 32, 4).is_zero());
        assert_eq!(superimpose("?,beta", 32, 4), codeword("beta", 32, 4));
    }

    #[test]
    fn test_superimpose_order_independent() {
        assert_eq!(superimpose("a,b", 48, 5), superimpose("b,a", 48, 5));
    }
}
