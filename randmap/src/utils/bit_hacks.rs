/// Extract the top `num_bits` bits from a 64-bit value.
///
/// Useful as a faster alternative to the division of this kind: `value / 2 ** (64 - num_bits)`.
#[inline]
pub const fn extract_bits_64<const SOURCE_BITS: u32>(value: u64, num_bits: u32) -> u32 {
    debug_assert!(num_bits <= 32, r#""num_bits" must be <= 32"#);
    debug_assert!(num_bits > 0, r#""num_bits" must be > 0"#);

    (value >> (SOURCE_BITS - num_bits)) as u32
}

/// Calculate the number of buckets addressable by the given number of bits.
#[inline]
pub const fn num_buckets_for_bits(num_bits: u8) -> usize {
    1 << num_bits
}

/// Bijective 64-bit finalizer from MurmurHash3 ([Appleby (2011)]).
///
/// Every input bit affects every output bit, which makes it suitable for deriving
/// independent-looking ranks from hashes that share their low bits.
///
/// [Appleby (2011)]: https://github.com/aappleby/smhasher/wiki/MurmurHash3
#[inline]
pub const fn mix64(mut x: u64) -> u64 {
    x ^= x >> 33;
    x = x.wrapping_mul(0xff51_afd7_ed55_8ccd);
    x ^= x >> 33;
    x = x.wrapping_mul(0xc4ce_b9fe_1a85_ec53);
    x ^= x >> 33;
    x
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_extract_bits_64_takes_top_bits() {
        assert_eq!(extract_bits_64::<{ u64::BITS }>(u64::MAX, 3), 0b111);
        assert_eq!(extract_bits_64::<{ u64::BITS }>(1 << 61, 3), 0b001);
        assert_eq!(extract_bits_64::<{ u64::BITS }>((1 << 61) - 1, 3), 0);
    }

    #[test]
    fn test_mix64_is_injective_on_low_bit_patterns() {
        // Keys that differ only in their high bits must not collapse onto each other.
        let mixed: HashSet<u64> = (0..4096_u64).map(|i| mix64(i << 40)).collect();
        assert_eq!(mixed.len(), 4096);
        assert_ne!(mix64(1), 1);
    }
}
