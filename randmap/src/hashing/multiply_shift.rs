//! Seeded hashing based on the pair-multiply-shift scheme from [Thorup (2015)].
//!
//! Every 64-bit word written into the hasher is combined with the running state by a
//! pair-multiply-shift step. Multiply-shift concentrates its entropy in the high bits of the
//! product while the bucket array is addressed by the low bits, so the state is passed through the
//! MurmurHash3 finalizer before it is returned.
//!
//! [Thorup (2015)]: https://doi.org/10.48550/arXiv.1504.06804
use crate::utils::bit_hacks::mix64;
use rand::Rng;
use std::hash::{BuildHasher, Hasher};

/// One pair-multiply-shift step over a 64-bit value, keeping all 64 bits of the result.
#[inline]
pub const fn pair_multiply_shift_64(value: u64, seed: &[u64; 3]) -> u64 {
    seed[0]
        .wrapping_add(value)
        .wrapping_mul(seed[1].wrapping_add(value >> 32))
        .wrapping_add(seed[2])
}

/// A [`BuildHasher`] producing [`MultiplyShiftHasher`]s that share one random seed.
///
/// Best suited for integer keys, which are hashed in a single step.
///
/// # Examples
///
/// ```rust
/// use randmap::hashing::MultiplyShiftBuilder;
/// use randmap::RandMap;
///
/// let mut map = RandMap::with_hasher(MultiplyShiftBuilder::new());
/// map.insert(42_u64, "answer");
/// assert_eq!(map.get(&42), Some(&"answer"));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MultiplyShiftBuilder {
    seed: [u64; 3],
}

impl MultiplyShiftBuilder {
    /// Creates a builder seeded from a cryptographically secure generator.
    pub fn new() -> Self {
        Self::from_rng(&mut rand::rng())
    }

    pub fn from_rng<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::with_seed(rng.random())
    }

    pub const fn with_seed(seed: [u64; 3]) -> Self {
        Self { seed }
    }

    #[inline]
    pub const fn seed(&self) -> &[u64; 3] {
        &self.seed
    }
}

impl Default for MultiplyShiftBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl BuildHasher for MultiplyShiftBuilder {
    type Hasher = MultiplyShiftHasher;

    #[inline]
    fn build_hasher(&self) -> Self::Hasher {
        MultiplyShiftHasher {
            seed: self.seed,
            state: self.seed[2],
        }
    }
}

#[derive(Clone, Debug)]
pub struct MultiplyShiftHasher {
    seed: [u64; 3],
    state: u64,
}

impl Hasher for MultiplyShiftHasher {
    #[inline]
    fn finish(&self) -> u64 {
        mix64(self.state)
    }

    fn write(&mut self, bytes: &[u8]) {
        let mut chunks = bytes.chunks_exact(8);
        for chunk in chunks.by_ref() {
            let mut word = [0; 8];
            word.copy_from_slice(chunk);
            self.write_u64(u64::from_le_bytes(word));
        }
        let rest = chunks.remainder();
        if !rest.is_empty() {
            let mut word = [0; 8];
            word[..rest.len()].copy_from_slice(rest);
            // Tag the padded word with its length so that trailing zeroes are significant.
            self.write_u64(u64::from_le_bytes(word) ^ ((rest.len() as u64) << 59));
        }
    }

    #[inline]
    fn write_u8(&mut self, value: u8) {
        self.write_u64(value as u64);
    }

    #[inline]
    fn write_u16(&mut self, value: u16) {
        self.write_u64(value as u64);
    }

    #[inline]
    fn write_u32(&mut self, value: u32) {
        self.write_u64(value as u64);
    }

    #[inline]
    fn write_u64(&mut self, value: u64) {
        let seed = [self.seed[0] ^ self.state, self.seed[1], self.seed[2]];
        self.state = pair_multiply_shift_64(value, &seed);
    }

    #[inline]
    fn write_u128(&mut self, value: u128) {
        self.write_u64(value as u64);
        self.write_u64((value >> 64) as u64);
    }

    #[inline]
    fn write_usize(&mut self, value: usize) {
        self.write_u64(value as u64);
    }
}
