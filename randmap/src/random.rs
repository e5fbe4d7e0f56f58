//! Sources of randomness for the sampler and the iterator.
//!
//! The regular API draws from [`rand::rng()`], a cryptographically secure generator. The "fast"
//! API draws from a per-thread [`Xoshiro256PlusPlus`] seeded once from it, so concurrent readers
//! never contend on a shared generator.
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use std::cell::RefCell;

thread_local! {
    static FAST_RNG: RefCell<Xoshiro256PlusPlus> =
        RefCell::new(Xoshiro256PlusPlus::from_rng(&mut rand::rng()));
}

/// Runs `f` with the fast generator of the current thread.
///
/// `f` must not call back into this function.
#[inline]
pub fn with_fast_rng<T>(f: impl FnOnce(&mut Xoshiro256PlusPlus) -> T) -> T {
    FAST_RNG.with_borrow_mut(f)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::RngCore;
    use std::collections::HashSet;

    #[test]
    fn test_fast_rng_is_seeded_per_thread() {
        let here = with_fast_rng(|rng| rng.next_u64());
        let there = std::thread::spawn(|| with_fast_rng(|rng| rng.next_u64()))
            .join()
            .unwrap();
        assert_ne!(here, there);

        let values: HashSet<u64> = (0..64).map(|_| with_fast_rng(|rng| rng.next_u64())).collect();
        assert_eq!(values.len(), 64);
    }
}
