//! Implements random sampling of [`RandMap`] entries.
//!
//! The sampler draws positions from a logical address space of `buckets x depth x BUCKET_SIZE`
//! cells, where `depth` is the longest chain of both tables. Every live entry is reachable from
//! exactly one cell, so a hit is uniformly distributed over the entries and a miss is retried.
//! While a resize is in progress, a cell of the table of record is resolved through the old table
//! whenever its old bucket has not been evacuated yet.
use crate::map::RandMap;
use crate::random::with_fast_rng;
use crate::table::{Entry, BUCKET_BITS, BUCKET_SIZE};
use crate::utils::bit_hacks::extract_bits_64;
use rand::Rng;
use randmap_core::{RandMapError, Sample};
use tracing::trace;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Strategy {
    /// Exactly uniform, falls back to a scan for the n-th entry.
    Uniform,
    /// Falls back to the nearest non-empty bucket, which is slightly biased but O(buckets) at
    /// worst and usually O(1).
    Fast,
}

/// A cell of the logical address space.
#[derive(Clone, Copy, Debug, Default)]
struct Cell {
    bucket: usize,
    depth: usize,
    slot: usize,
}

impl Cell {
    /// Draws a cell, taking the bucket from the low bits and the slot from the top bits of a
    /// single random word.
    #[inline]
    fn draw<R: Rng + ?Sized>(rng: &mut R, mask: usize, depth: usize) -> Self {
        let bits: u64 = rng.random();
        Self {
            bucket: bits as usize & mask,
            slot: extract_bits_64::<{ u64::BITS }>(bits, BUCKET_BITS) as usize,
            depth: if depth > 1 {
                rng.random_range(0..depth)
            } else {
                0
            },
        }
    }
}

impl<K, V, S> RandMap<K, V, S> {
    /// Sample a key-value pair uniformly at random.
    ///
    /// Uses a cryptographically secure generator.
    ///
    /// # Errors
    ///
    /// [`RandMapError::EmptyCollection`] if the map is empty.
    #[inline]
    pub fn sample_entry(&self) -> Result<(&K, &V), RandMapError> {
        self.sample_entry_with(&mut rand::rng())
    }

    /// Sample a key uniformly at random.
    #[inline]
    pub fn sample_key(&self) -> Result<&K, RandMapError> {
        self.sample_entry().map(|(k, _)| k)
    }

    /// Sample a value uniformly at random.
    #[inline]
    pub fn sample_value(&self) -> Result<&V, RandMapError> {
        self.sample_entry().map(|(_, v)| v)
    }

    /// Like [`RandMap::sample_entry`], but draws from `rng`.
    pub fn sample_entry_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<(&K, &V), RandMapError> {
        self.sample(rng, Strategy::Uniform)
    }

    /// Sample a key-value pair using the fast thread-local generator.
    ///
    /// Gives up on exact uniformity after a few misses in very sparse tables.
    #[inline]
    pub fn fast_sample_entry(&self) -> Result<(&K, &V), RandMapError> {
        with_fast_rng(|rng| self.fast_sample_entry_with(rng))
    }

    #[inline]
    pub fn fast_sample_key(&self) -> Result<&K, RandMapError> {
        self.fast_sample_entry().map(|(k, _)| k)
    }

    #[inline]
    pub fn fast_sample_value(&self) -> Result<&V, RandMapError> {
        self.fast_sample_entry().map(|(_, v)| v)
    }

    pub fn fast_sample_entry_with<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
    ) -> Result<(&K, &V), RandMapError> {
        self.sample(rng, Strategy::Fast)
    }

    fn sample<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        strategy: Strategy,
    ) -> Result<(&K, &V), RandMapError> {
        if self.is_empty() {
            return Err(RandMapError::EmptyCollection);
        }

        let mask = self.table.mask();
        let depth = self.longest_chain();
        let retries = match strategy {
            Strategy::Uniform => self.config.retry_cap,
            Strategy::Fast => self.config.fast_retry_cap,
        };

        let mut cell = Cell::default();
        for _ in 0..retries {
            cell = Cell::draw(rng, mask, depth);
            if let Some(entry) = self.resolve(cell) {
                return Ok((&entry.key, &entry.value));
            }
        }

        trace!(
            ?strategy,
            retries,
            len = self.len,
            buckets = mask + 1,
            depth,
            "Sampler fell back to a scan"
        );
        let entry = match strategy {
            Strategy::Uniform => {
                self.nth_entry(rng.random_range(0..=mask), rng.random_range(0..self.len))
            }
            Strategy::Fast => self.nearest_entry(cell),
        };
        entry
            .map(|entry| (&entry.key, &entry.value))
            .ok_or(RandMapError::EmptyCollection)
    }

    /// Get the entry stored in `cell`, if any.
    #[inline]
    fn resolve(&self, cell: Cell) -> Option<&Entry<K, V>> {
        let (table, idx) = match &self.resize {
            Some(rs) if !rs.is_evacuated(cell.bucket & rs.old.mask()) => {
                (&rs.old, cell.bucket & rs.old.mask())
            }
            _ => (&self.table, cell.bucket),
        };
        let entry = table.chain(idx).nth(cell.depth)?.slots[cell.slot].entry()?;
        // An unevacuated old chain of a growing table holds the entries of two logical buckets.
        (entry.hash as usize & self.table.mask() == cell.bucket).then_some(entry)
    }

    /// Get the `n`-th live entry, counting logical buckets from `start` with wrap-around.
    fn nth_entry(&self, start: usize, n: usize) -> Option<&Entry<K, V>> {
        let mask = self.table.mask();
        (0..=mask)
            .flat_map(|k| self.logical_entries((start + k) & mask, mask))
            .nth(n)
    }

    /// Get an entry of the first non-empty logical bucket at or after the bucket of `cell`.
    fn nearest_entry(&self, cell: Cell) -> Option<&Entry<K, V>> {
        let mask = self.table.mask();
        for k in 0..=mask {
            let bucket = (cell.bucket + k) & mask;
            let count = self.logical_entries(bucket, mask).count();
            if count > 0 {
                let offset = (cell.depth * BUCKET_SIZE + cell.slot) % count;
                return self.logical_entries(bucket, mask).nth(offset);
            }
        }
        None
    }
}

impl<K, V, S> Sample<K, V> for RandMap<K, V, S> {
    fn sample_entry<'a>(&'a self) -> Result<(&'a K, &'a V), RandMapError>
    where
        K: 'a,
        V: 'a,
    {
        RandMap::sample_entry(self)
    }

    fn fast_sample_entry<'a>(&'a self) -> Result<(&'a K, &'a V), RandMapError>
    where
        K: 'a,
        V: 'a,
    {
        RandMap::fast_sample_entry(self)
    }
}

#[cfg(test)]
mod tests {
    use crate::{Config, RandMap};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use randmap_core::{RandMapError, Sample};
    use randmap_testing::*;
    use std::collections::{HashMap, HashSet};

    #[test]
    fn test_empty_map_cannot_be_sampled() {
        let mut map: RandMap<u64, u64> = RandMap::new();
        assert_eq!(map.sample_key(), Err(RandMapError::EmptyCollection));
        assert_eq!(map.sample_value(), Err(RandMapError::EmptyCollection));
        assert_eq!(map.fast_sample_key(), Err(RandMapError::EmptyCollection));
        assert_eq!(map.fast_sample_value(), Err(RandMapError::EmptyCollection));

        map.insert(1, 1);
        map.remove(&1);
        assert_eq!(map.sample_entry(), Err(RandMapError::EmptyCollection));
        assert_eq!(map.fast_sample_entry(), Err(RandMapError::EmptyCollection));
    }

    #[test]
    fn test_sample_trait_defaults() {
        fn draw<M: Sample<String, usize>>(map: &M) -> (&String, &usize, &String, &usize) {
            (
                map.sample_key().unwrap(),
                map.sample_value().unwrap(),
                map.fast_sample_key().unwrap(),
                map.fast_sample_value().unwrap(),
            )
        }
        let map: RandMap<String, usize> = (0..10).map(|i| (i.to_string(), i)).collect();
        let (key, value, fast_key, fast_value) = draw(&map);
        assert!(map.contains_key(key) && map.contains_key(fast_key));
        assert!(*value < 10 && *fast_value < 10);

        let empty: RandMap<String, usize> = RandMap::new();
        assert_eq!(
            Sample::sample_key(&empty),
            Err(RandMapError::EmptyCollection)
        );
    }

    #[test]
    fn test_sample_key_is_uniform() {
        let map: RandMap<u64, u64> = (0..10).map(|i| (i, i)).collect();
        let freqs = key_frequencies(&map, Flavour::Uniform, 100_000);
        assert_frequencies_within_band(&freqs, 0..10, 10_000.0, 2.0);
    }

    #[test]
    fn test_sample_value_is_uniform() {
        let map: RandMap<u64, u64> = (0..10).map(|i| (i, i + 100)).collect();
        let freqs = value_frequencies(&map, Flavour::Uniform, 100_000);
        assert_frequencies_within_band(&freqs, 100..110, 10_000.0, 2.0);
    }

    #[test]
    fn test_fast_sample_key_is_roughly_uniform() {
        let map: RandMap<u64, u64> = (0..10).map(|i| (i, i)).collect();
        let freqs = key_frequencies(&map, Flavour::Fast, 100_000);
        assert_frequencies_within_band(&freqs, 0..10, 10_000.0, 2.0);
    }

    #[test]
    fn test_fast_sample_value_is_roughly_uniform() {
        let map: RandMap<u64, u64> = (0..5).map(|i| (i, i + 100)).collect();
        let freqs = value_frequencies(&map, Flavour::Fast, 50_000);
        assert_frequencies_within_band(&freqs, 100..105, 10_000.0, 2.0);
    }

    #[test]
    fn test_sample_is_uniform_over_long_chains_mid_resize() {
        // Multiples of 8 under the identity hash pile up in a few long chains.
        let mut map = RandMap::with_hasher(IdentityBuildHasher::default());
        for i in 0..200_u64 {
            map.insert(i * 8, i);
        }
        assert!(map.stats().longest_chain > 2);

        let freqs = key_frequencies(&map, Flavour::Uniform, 200_000);
        assert_uniform_frequencies(&freqs, (0..200).map(|i| i * 8), 1e-4);

        // 417 sequential keys leave the table half way through doubling.
        let mut map = RandMap::with_hasher(IdentityBuildHasher::default());
        for key in 0..417_u64 {
            map.insert(key, key);
        }
        assert!(map.stats().resize.is_some());
        let freqs = key_frequencies(&map, Flavour::Uniform, 417 * 200);
        assert_uniform_frequencies(&freqs, 0..417, 1e-4);
    }

    #[test]
    fn test_sparse_table_falls_back_to_a_scan() {
        let mut map = RandMap::with_capacity(2_000);
        for i in 0..5_u64 {
            map.insert(i, i);
        }
        assert_eq!(map.stats().buckets, 512);

        let freqs = key_frequencies(&map, Flavour::Uniform, 10_000);
        assert_frequencies_within_band(&freqs, 0..5, 2_000.0, 2.0);

        // The fast fallback is biased, but every key must still show up.
        let freqs = key_frequencies(&map, Flavour::Fast, 10_000);
        assert_eq!(freqs.len(), 5);
    }

    #[test]
    fn test_no_ghost_keys() {
        let num_outer = if cfg!(feature = "_slow-tests") { 1000 } else { 100 };
        for _ in 0..num_outer {
            let map: RandMap<u64, ()> = (0..9).map(|i| (i, ())).collect();
            let seen: HashSet<u64> = (0..1000)
                .map(|_| *map.fast_sample_key().unwrap())
                .collect();
            assert_eq!(seen.len(), 9, "Some keys were never sampled: {seen:?}");
        }
    }

    #[test]
    fn test_every_key_is_reachable_while_growing() {
        let mut map = RandMap::new();
        for n in 1..=100_u64 {
            map.insert(n, n);
            let mut counts: HashMap<u64, usize> = HashMap::new();
            for _ in 0..(100 * n) {
                *counts.entry(*map.fast_sample_key().unwrap()).or_default() += 1;
            }
            assert_eq!(counts.len() as u64, n, "Missing keys after {n} inserts");
            assert!(
                counts.values().all(|&count| count >= 20),
                "A key is starved after {n} inserts: {counts:?}"
            );
        }
    }

    #[test]
    fn test_sampling_never_fails_on_a_churning_map() {
        let mut map = RandMap::new();
        for i in 0..10_000_u64 {
            map.insert(i, i);
            if i % 3 == 0 && i > 0 {
                map.remove(&(i / 2));
            }
            let key = *map.fast_sample_key().unwrap();
            assert!(map.contains_key(&key));
            let (key, value) = map.sample_entry().unwrap();
            assert_eq!(map.get(key), Some(value));
        }
    }

    #[test]
    fn test_fast_sample_has_high_entropy() {
        let mut map = RandMap::new();
        for key in 0..=(6.5 * 64.0) as u64 {
            map.insert(key, ());
        }
        let bytes: Vec<u8> = (0..10_000)
            .map(|_| *map.fast_sample_key().unwrap() as u8)
            .collect();
        let compressed = gzip_len(&bytes);
        assert!(
            compressed >= bytes.len(),
            "Samples compress to {compressed} of {} bytes",
            bytes.len()
        );
    }

    #[test]
    fn test_concurrent_readers() {
        let map: RandMap<u64, u64> = (0..1000).map(|i| (i, i * 2)).collect();
        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    for _ in 0..10_000 {
                        let (key, value) = map.fast_sample_entry().unwrap();
                        assert_eq!(*value, key * 2);
                        let (key, value) = map.sample_entry().unwrap();
                        assert_eq!(*value, key * 2);
                    }
                });
            }
        });
    }

    #[test]
    fn test_seeded_sampling_is_reproducible() {
        let map: RandMap<u64, u64> = (0..1000).map(|i| (i, i)).collect();
        let draw = |seed: u64| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            (0..100)
                .map(|_| *map.sample_entry_with(&mut rng).unwrap().0)
                .collect::<Vec<_>>()
        };
        assert_eq!(draw(1), draw(1));
        assert_ne!(draw(1), draw(2));
    }

    #[test]
    fn test_fast_retry_cap_of_one_still_samples() {
        let config = Config {
            fast_retry_cap: 1,
            retry_cap: 1,
            ..Config::default()
        };
        let mut map = RandMap::with_config(config, 10_000).unwrap();
        map.insert("only", 1);
        for _ in 0..100 {
            assert_eq!(map.fast_sample_key(), Ok(&"only"));
            assert_eq!(map.sample_key(), Ok(&"only"));
        }
    }
}
