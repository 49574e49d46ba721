use crate::bits::Bits;
use crate::hasher::hash_bytes;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Builds the `width`-bit codeword for `value` with exactly `weight` bits set.
///
/// The bit positions come from a generator seeded by the hash of the value's
/// bytes, so the result depends only on `(value, width, weight)`. Each call
/// owns its generator.
///
/// # Panics
///
/// Panics if `weight > width`; relation configuration rejects such widths.
pub fn codeword(value: &str, width: usize, weight: usize) -> Bits {
    assert!(
        weight <= width,
        "codeword weight {} exceeds width {}",
        weight,
        width
    );
    let mut rng = ChaCha8Rng::seed_from_u64(hash_bytes(value.as_bytes()));
    let mut cword = Bits::new(width);
    let mut nbits = 0;
    while nbits < weight {
        let i = rng.gen_range(0..width);
        if !cword.is_set(i) {
            cword.set(i);
            nbits += 1;
        }
    }
    cword
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codeword_deterministic() {
        for value in ["a", "b", "hello", "1000042", ""] {
            assert_eq!(codeword(value, 64, 5), codeword(value, 64, 5));
        }
    }

    #[test]
    fn test_codeword_weight() {
        for (width, weight) in [(8, 2), (8, 8), (8, 0), (32, 10), (600, 7), (1, 1)] {
            for value in ["x", "y", "zz", "12345"] {
                let cword = codeword(value, width, weight);
                assert_eq!(cword.nbits(), width);
                assert_eq!(
                    cword.count_ones(),
                    weight,
                    "codeword({:?}, {}, {})",
                    value,
                    width,
                    weight
                );
            }
        }
    }

    #[test]
    fn test_codeword_independent_of_call_order() {
        let first = codeword("a", 64, 4);
        let _ = codeword("b", 64, 4);
        let _ = codeword("c", 128, 9);
        assert_eq!(codeword("a", 64, 4), first);
    }

    #[test]
    fn test_codewords_differ() {
        let distinct = (0..50)
            .map(|i| codeword(&format!("value{}", i), 256, 4))
            .collect::<std::collections::HashSet<_>>();
        assert!(distinct.len() > 45);
    }

    #[test]
    #[should_panic(expected = "exceeds width")]
    fn test_weight_above_width_panics() {
        codeword("a", 4, 5);
    }
}
