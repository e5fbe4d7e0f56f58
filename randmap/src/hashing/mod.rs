//! Hash builders for [`RandMap`](crate::RandMap).
//!
//! Any [`BuildHasher`](std::hash::BuildHasher) works, but sampling and iteration are only as
//! uniform as the low bits of the hashes.
mod multiply_shift;
pub use multiply_shift::*;

#[cfg(feature = "xxh3")]
pub use xxhash_rust::xxh3::Xxh3Builder;
