//! Deliberately weak hashers that make the bucket layout predictable in tests.
use std::hash::{BuildHasher, Hasher};

/// Builds [`IdentityHasher`]s.
///
/// With integer keys, the key itself becomes the hash, so tests can place entries into chosen
/// buckets and provoke collisions at will.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IdentityBuildHasher;

impl BuildHasher for IdentityBuildHasher {
    type Hasher = IdentityHasher;

    #[inline]
    fn build_hasher(&self) -> Self::Hasher {
        IdentityHasher::default()
    }
}

/// Hashes a single integer to itself.
///
/// Every write is folded into the state, which keeps composite and string keys usable but poorly
/// spread.
#[derive(Clone, Copy, Debug, Default)]
pub struct IdentityHasher(u64);

impl IdentityHasher {
    #[inline]
    fn fold(&mut self, value: u64) {
        self.0 = self.0.rotate_left(8) ^ value;
    }
}

impl Hasher for IdentityHasher {
    #[inline]
    fn finish(&self) -> u64 {
        self.0
    }

    fn write(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.fold(byte as u64);
        }
    }

    fn write_u8(&mut self, value: u8) {
        self.fold(value as u64);
    }

    fn write_u16(&mut self, value: u16) {
        self.fold(value as u64);
    }

    fn write_u32(&mut self, value: u32) {
        self.fold(value as u64);
    }

    fn write_u64(&mut self, value: u64) {
        self.fold(value);
    }

    fn write_usize(&mut self, value: usize) {
        self.fold(value as u64);
    }
}

/// Builds [`ConstantHasher`]s.
///
/// Every key gets the same hash, so all entries share one chain and tie on every hash-derived
/// ordering.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ConstantBuildHasher;

impl BuildHasher for ConstantBuildHasher {
    type Hasher = ConstantHasher;

    #[inline]
    fn build_hasher(&self) -> Self::Hasher {
        ConstantHasher
    }
}

/// Hashes every key to zero.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConstantHasher;

impl Hasher for ConstantHasher {
    #[inline]
    fn finish(&self) -> u64 {
        0
    }

    #[inline]
    fn write(&mut self, _bytes: &[u8]) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity() {
        let builder = IdentityBuildHasher;
        assert_eq!(builder.hash_one(5_u64), 5);
        assert_eq!(builder.hash_one(7_u32), 7);
        assert_eq!(builder.hash_one(1_usize << 40), 1 << 40);
        assert_ne!(builder.hash_one("ab"), builder.hash_one("ba"));
    }

    #[test]
    fn test_constant() {
        let builder = ConstantBuildHasher;
        assert_eq!(builder.hash_one(5_u64), builder.hash_one("five"));
    }
}
