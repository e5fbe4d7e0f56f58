//! Implements randomized traversal of [`RandMap`].
//!
//! Every entry gets a rank `mix64(hash ^ seed)` whose top bits select one of [`BUCKET_SIZE`]
//! virtual slots. A traversal performs one round per virtual slot, starting from a random one. A
//! round walks the logical buckets from a random start and yields, in rank order, the entries of
//! each bucket that fall into the virtual slot of the round.
//!
//! Logical buckets are defined by the mask captured when the traversal starts. The position of an
//! entry in the order therefore depends only on its hash and on the seed, never on where the entry
//! is physically stored, and evacuation between two steps cannot make the traversal skip or repeat
//! an entry.
use crate::map::RandMap;
use crate::random::with_fast_rng;
use crate::table::{Entry, BUCKET_BITS, BUCKET_SIZE};
use crate::utils::bit_hacks::{extract_bits_64, mix64};
use rand::Rng;
use randmap_core::{RandMapError, Traverse};
use std::any::{type_name, Any};
use std::iter::FusedIterator;

/// Position of a randomized traversal, detached from the map.
///
/// A cursor holds no borrow, so the map may be modified between two calls of
/// [`Cursor::next_entry`]. Every entry that stays in the map for the whole traversal is returned
/// exactly once. Entries inserted after the cursor was created may or may not be returned, removed
/// entries are not returned after their removal.
///
/// Every step rescans the current logical bucket, so a logical bucket of `m` entries costs
/// O(m²) per traversal. Under the default load factor `m` stays small, but a hasher that piles
/// keys into a few buckets makes traversal quadratic in the length of those chains.
///
/// # Examples
///
/// ```rust
/// use randmap::RandMap;
///
/// let mut map: RandMap<u32, u32> = (0..100).map(|i| (i, i)).collect();
/// let mut cursor = map.cursor();
/// let mut seen = 0;
/// while let Some(key) = cursor.next_entry(&map).map(|(k, _)| *k) {
///     // Writes between the steps are allowed and may trigger a resize.
///     map.insert(1000 + key, key);
///     seen += 1;
/// }
/// assert!(seen >= 100);
/// ```
#[derive(Clone, Debug)]
pub struct Cursor {
    mask: usize,
    seed: u64,
    start: usize,
    first_slot: u32,
    round: u32,
    step: usize,
    /// `(rank, seq)` of the last returned entry of the current cell.
    last: Option<(u64, u64)>,
}

impl Cursor {
    fn new<R: Rng + ?Sized>(rng: &mut R, mask: usize) -> Self {
        Self {
            mask,
            seed: rng.random(),
            start: rng.random_range(0..=mask),
            first_slot: rng.random_range(0..BUCKET_SIZE as u32),
            round: 0,
            step: 0,
            last: None,
        }
    }

    #[inline]
    fn rank(&self, hash: u64) -> u64 {
        mix64(hash ^ self.seed)
    }

    #[inline]
    fn is_done(&self) -> bool {
        self.round >= BUCKET_SIZE as u32
    }

    /// Advance the cursor, returning the next entry of the traversal.
    pub fn next_entry<'a, K, V, S>(
        &mut self,
        map: &'a RandMap<K, V, S>,
    ) -> Option<(&'a K, &'a V)> {
        if map.is_empty() {
            self.round = BUCKET_SIZE as u32;
        }

        while !self.is_done() {
            let virtual_slot = (self.first_slot + self.round) % BUCKET_SIZE as u32;
            let bucket = (self.start + self.step) & self.mask;

            let entries = map.logical_entries(bucket, self.mask);
            if let Some((entry, order)) = self.select(entries, virtual_slot) {
                self.last = Some(order);
                return Some((&entry.key, &entry.value));
            }

            self.last = None;
            self.step += 1;
            if self.step > self.mask {
                self.step = 0;
                self.round += 1;
            }
        }
        None
    }

    /// Pick the entry that follows the last returned one in the current cell.
    ///
    /// Entries are ordered by `(rank, seq)`. Sequence numbers are unique and survive evacuation,
    /// so entries with equal hashes keep their relative order across writes.
    fn select<'a, K: 'a, V: 'a>(
        &self,
        entries: impl Iterator<Item = &'a Entry<K, V>>,
        virtual_slot: u32,
    ) -> Option<(&'a Entry<K, V>, (u64, u64))> {
        let mut best: Option<(&Entry<K, V>, (u64, u64))> = None;
        for entry in entries {
            let rank = self.rank(entry.hash);
            if extract_bits_64::<{ u64::BITS }>(rank, BUCKET_BITS) != virtual_slot {
                continue;
            }
            let order = (rank, entry.seq);
            if self.last.is_some_and(|last| order <= last) {
                continue;
            }
            if best.map_or(true, |(_, best_order)| order < best_order) {
                best = Some((entry, order));
            }
        }
        best
    }

    /// Advance the cursor, cloning the next entry into `key` and `value`.
    ///
    /// Returns `false` once the traversal is exhausted, leaving the outputs untouched.
    pub fn advance_into<K: Clone, V: Clone, S>(
        &mut self,
        map: &RandMap<K, V, S>,
        key: &mut K,
        value: &mut V,
    ) -> bool {
        match self.next_entry(map) {
            Some((k, v)) => {
                key.clone_from(k);
                value.clone_from(v);
                true
            }
            None => false,
        }
    }
}

/// Randomized-order iterator over the entries of a [`RandMap`].
///
/// Created by [`RandMap::iter`], [`RandMap::fast_iter`] or [`RandMap::iter_with`].
pub struct Iter<'a, K, V, S> {
    map: &'a RandMap<K, V, S>,
    cursor: Cursor,
    remaining: usize,
}

impl<'a, K, V, S> Iterator for Iter<'a, K, V, S> {
    type Item = (&'a K, &'a V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let item = self.cursor.next_entry(self.map)?;
        self.remaining -= 1;
        Some(item)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V, S> ExactSizeIterator for Iter<'_, K, V, S> {}

impl<K, V, S> FusedIterator for Iter<'_, K, V, S> {}

impl<K, V, S> Clone for Iter<'_, K, V, S> {
    fn clone(&self) -> Self {
        Self {
            map: self.map,
            cursor: self.cursor.clone(),
            remaining: self.remaining,
        }
    }
}

/// Randomized-order iterator over the keys of a [`RandMap`].
pub struct Keys<'a, K, V, S>(Iter<'a, K, V, S>);

impl<'a, K, V, S> Iterator for Keys<'a, K, V, S> {
    type Item = &'a K;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|(k, _)| k)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl<K, V, S> ExactSizeIterator for Keys<'_, K, V, S> {}

/// Randomized-order iterator over the values of a [`RandMap`].
pub struct Values<'a, K, V, S>(Iter<'a, K, V, S>);

impl<'a, K, V, S> Iterator for Values<'a, K, V, S> {
    type Item = &'a V;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|(_, v)| v)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl<K, V, S> ExactSizeIterator for Values<'_, K, V, S> {}

/// A traversal that writes every visited entry into caller-owned storage.
///
/// Created by [`RandMap::iter_into`].
pub struct BoundIter<'a, 'o, K, V, S> {
    iter: Iter<'a, K, V, S>,
    key: &'o mut K,
    value: &'o mut V,
}

impl<K: Clone, V: Clone, S> BoundIter<'_, '_, K, V, S> {
    /// Clone the next entry into the bound outputs, returning `false` once exhausted.
    pub fn advance(&mut self) -> bool {
        match self.iter.next() {
            Some((k, v)) => {
                self.key.clone_from(k);
                self.value.clone_from(v);
                true
            }
            None => false,
        }
    }
}

impl<K, V, S> RandMap<K, V, S> {
    /// Iterate over the entries in a random order seeded from a cryptographically secure
    /// generator.
    #[inline]
    pub fn iter(&self) -> Iter<'_, K, V, S> {
        self.iter_with(&mut rand::rng())
    }

    /// Iterate over the entries in a random order seeded from the fast thread-local generator.
    #[inline]
    pub fn fast_iter(&self) -> Iter<'_, K, V, S> {
        with_fast_rng(|rng| self.iter_with(rng))
    }

    /// Iterate over the entries in a random order seeded from `rng`.
    pub fn iter_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Iter<'_, K, V, S> {
        Iter {
            map: self,
            cursor: self.cursor_with(rng),
            remaining: self.len,
        }
    }

    #[inline]
    pub fn keys(&self) -> Keys<'_, K, V, S> {
        Keys(self.iter())
    }

    #[inline]
    pub fn values(&self) -> Values<'_, K, V, S> {
        Values(self.iter())
    }

    /// Start a randomized traversal that does not borrow the map.
    #[inline]
    pub fn cursor(&self) -> Cursor {
        self.cursor_with(&mut rand::rng())
    }

    pub fn cursor_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Cursor {
        Cursor::new(rng, self.table.mask())
    }

    /// Start a randomized traversal that clones every visited entry into `key` and `value`.
    ///
    /// # Errors
    ///
    /// [`RandMapError::TypeMismatch`] if the outputs are not of the key and value types of the
    /// map.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use randmap::{RandMap, RandMapError};
    ///
    /// let map: RandMap<u64, String> = (0..3).map(|i| (i, i.to_string())).collect();
    ///
    /// let (mut key, mut value) = (0_u64, String::new());
    /// let mut iter = map.iter_into(&mut key, &mut value).unwrap();
    /// let mut count = 0;
    /// while iter.advance() {
    ///     count += 1;
    /// }
    /// assert_eq!(count, 3);
    ///
    /// let mut wrong = 0_u8;
    /// assert!(matches!(
    ///     map.iter_into(&mut wrong, &mut value),
    ///     Err(RandMapError::TypeMismatch { .. })
    /// ));
    /// ```
    pub fn iter_into<'o, KO: Any, VO: Any>(
        &self,
        key: &'o mut KO,
        value: &'o mut VO,
    ) -> Result<BoundIter<'_, 'o, K, V, S>, RandMapError>
    where
        K: Any,
        V: Any,
    {
        let key = (key as &mut dyn Any).downcast_mut::<K>();
        let value = (value as &mut dyn Any).downcast_mut::<V>();
        match (key, value) {
            (Some(key), Some(value)) => Ok(BoundIter {
                iter: self.iter(),
                key,
                value,
            }),
            _ => Err(RandMapError::TypeMismatch {
                expected_key: type_name::<K>(),
                expected_value: type_name::<V>(),
            }),
        }
    }
}

impl<'a, K, V, S> IntoIterator for &'a RandMap<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V, S>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, V, S> Traverse<K, V> for RandMap<K, V, S> {
    type Iter<'a>
        = Iter<'a, K, V, S>
    where
        Self: 'a,
        K: 'a,
        V: 'a;

    fn iter(&self) -> Self::Iter<'_> {
        RandMap::iter(self)
    }

    fn fast_iter(&self) -> Self::Iter<'_> {
        RandMap::fast_iter(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use randmap_testing::*;
    use std::collections::{HashMap, HashSet};

    #[test]
    fn test_iter_visits_every_entry_exactly_once() {
        let map: RandMap<u64, u64> = (0..1000).map(|i| (i, i * 3)).collect();
        assert_visits_exactly_once(map.iter().map(|(k, _)| *k), 0..1000);
        assert_visits_exactly_once(map.fast_iter().map(|(k, _)| *k), 0..1000);
        assert_visits_exactly_once(map.keys().copied(), 0..1000);
        assert_visits_exactly_once(map.values().map(|v| v / 3), 0..1000);
        assert!(map.iter().all(|(k, v)| *v == k * 3));
    }

    #[test]
    fn test_iter_mid_resize_and_over_long_chains() {
        let mut map = RandMap::with_hasher(IdentityBuildHasher::default());
        for key in 0..417_u64 {
            map.insert(key, ());
        }
        assert!(map.stats().resize.is_some());
        assert_visits_exactly_once(map.iter().map(|(k, _)| *k), 0..417);

        let mut map = RandMap::with_hasher(IdentityBuildHasher::default());
        for i in 0..300_u64 {
            map.insert(i << 16, ());
        }
        assert_visits_exactly_once(map.iter().map(|(k, _)| *k), (0..300).map(|i| i << 16));
    }

    #[test]
    fn test_iter_on_empty_map() {
        let mut map: RandMap<u64, u64> = RandMap::with_capacity(1000);
        assert_eq!(map.iter().next(), None);
        assert_eq!(map.fast_iter().len(), 0);

        let mut cursor = map.cursor();
        assert_eq!(cursor.next_entry(&map), None);
        map.insert(1, 1);
        assert_eq!(cursor.next_entry(&map), None);
    }

    #[test]
    fn test_iter_is_exact_size() {
        let map: RandMap<u64, u64> = (0..50).map(|i| (i, i)).collect();
        let mut iter = map.iter();
        assert_eq!(iter.len(), 50);
        iter.next();
        assert_eq!(iter.size_hint(), (49, Some(49)));
        assert_eq!(iter.count(), 49);
    }

    #[test]
    fn test_cursor_survives_writes_between_steps() {
        let mut map = RandMap::new();
        for key in 0..500_u64 {
            map.insert(key, key);
        }
        let epoch = map.stats().epoch;

        let mut cursor = map.cursor();
        let mut seen: HashMap<u64, usize> = HashMap::new();
        let mut removed = HashSet::new();
        let mut next_key = 10_000_u64;
        while let Some(key) = cursor.next_entry(&map).map(|(k, _)| *k) {
            *seen.entry(key).or_default() += 1;
            // Grow the map enough to go through several resizes.
            for _ in 0..2 {
                map.insert(next_key, next_key);
                next_key += 1;
            }
            // Remove some of the initial keys that might not have been visited yet.
            let victim = (key * 7) % 100;
            if map.remove(&victim).is_some() {
                removed.insert(victim);
            }
        }

        assert!(map.stats().epoch >= epoch + 2, "No resize happened");
        assert!(seen.values().all(|&count| count == 1), "An entry was repeated");
        for key in 0..500 {
            if !removed.contains(&key) {
                assert_eq!(seen.get(&key), Some(&1), "Key {key} was skipped");
            }
        }
    }

    #[test]
    fn test_cursor_with_colliding_hashes_survives_removal() {
        let mut map = RandMap::with_hasher(ConstantBuildHasher);
        for key in 0..3_u64 {
            map.insert(key, key);
        }

        let mut cursor = map.cursor();
        let first = *cursor.next_entry(&map).unwrap().0;
        map.remove(&first);
        let mut rest = Vec::new();
        while let Some((key, _)) = cursor.next_entry(&map) {
            rest.push(*key);
        }

        rest.push(first);
        assert_visits_exactly_once(rest, 0..3);
    }

    #[test]
    fn test_cursor_with_colliding_hashes_survives_slot_reuse() {
        let mut map = RandMap::with_hasher(ConstantBuildHasher);
        for key in 0..6_u64 {
            map.insert(key, key);
        }

        let mut cursor = map.cursor_with(&mut ChaCha8Rng::seed_from_u64(11));
        let mut seen = vec![*cursor.next_entry(&map).unwrap().0];
        seen.push(*cursor.next_entry(&map).unwrap().0);
        // Free a slot in front of the remaining entries and fill it with a new key.
        let removed = (0..6_u64).find(|key| !seen.contains(key)).unwrap();
        map.remove(&removed);
        map.insert(100, 100);
        while let Some((key, _)) = cursor.next_entry(&map) {
            seen.push(*key);
        }

        let distinct: HashSet<u64> = seen.iter().copied().collect();
        assert_eq!(distinct.len(), seen.len(), "An entry was repeated: {seen:?}");
        for key in (0..6).filter(|&key| key != removed) {
            assert!(distinct.contains(&key), "Key {key} was skipped: {seen:?}");
        }
        assert!(!distinct.contains(&removed));
    }

    #[test]
    fn test_cursor_advance_into() {
        let map: RandMap<u64, String> = (0..20).map(|i| (i, format!("v{i}"))).collect();
        let mut cursor = map.cursor_with(&mut ChaCha8Rng::seed_from_u64(3));
        let (mut key, mut value) = (0, String::new());
        let mut seen = HashSet::new();
        while cursor.advance_into(&map, &mut key, &mut value) {
            assert_eq!(value, format!("v{key}"));
            seen.insert(key);
        }
        assert_eq!(seen.len(), 20);
        assert!(!cursor.advance_into(&map, &mut key, &mut value));
    }

    #[test]
    fn test_iter_into() {
        let map: RandMap<u64, u64> = (0..100).map(|i| (i, i + 1)).collect();

        let (mut key, mut value) = (0_u64, 0_u64);
        let mut bound = map.iter_into(&mut key, &mut value).unwrap();
        let mut visited = Vec::new();
        while bound.advance() {
            visited.push((*bound.key, *bound.value));
        }
        assert_eq!(visited.len(), 100);
        assert!(visited.iter().all(|(k, v)| *v == k + 1));
        drop(bound);
        assert_eq!(value, key + 1);
    }

    #[test]
    fn test_iter_into_rejects_mismatched_types() {
        let map: RandMap<u64, u64> = (0..10).map(|i| (i, i)).collect();
        let (mut small_key, mut small_value) = (0_u8, 0_u8);
        assert!(matches!(
            map.iter_into(&mut small_key, &mut small_value),
            Err(RandMapError::TypeMismatch { .. })
        ));

        let (mut key, mut value) = (0_u64, String::new());
        match map.iter_into(&mut key, &mut value) {
            Err(RandMapError::TypeMismatch {
                expected_key,
                expected_value,
            }) => {
                assert_eq!(expected_key, "u64");
                assert_eq!(expected_value, "u64");
            }
            _ => panic!("Expected a type mismatch"),
        }
    }

    #[test]
    fn test_seeded_traversal_is_reproducible() {
        let map: RandMap<u64, u64> = (0..100).map(|i| (i, i)).collect();
        let order = |seed: u64| {
            map.iter_with(&mut ChaCha8Rng::seed_from_u64(seed))
                .map(|(k, _)| *k)
                .collect::<Vec<_>>()
        };
        assert_eq!(order(5), order(5));
        assert_ne!(order(5), order(6));
    }

    #[test]
    fn test_iter_positions_are_uniform() {
        let map: RandMap<u64, u64> = (0..10).map(|i| (i, i)).collect();
        let keys: Vec<u64> = (0..10).collect();

        for flavour in [Flavour::Uniform, Flavour::Fast] {
            let positions = traversal_positions(&map, &keys, flavour, 1000);
            assert_positions_within_band(&positions, 50.0, 200.0);
            let statistic = chi2_independence(&positions);
            assert!(
                statistic.p_value > 1e-6,
                "Positions depend on keys ({flavour:?}): {statistic:?}"
            );
        }
    }

    #[test]
    fn test_traverse_trait() {
        fn sum<M: Traverse<u64, u64>>(map: &M) -> u64 {
            map.iter().map(|(_, v)| *v).sum::<u64>() + map.fast_iter().map(|(k, _)| *k).sum::<u64>()
        }
        let map: RandMap<u64, u64> = (0..10).map(|i| (i, i)).collect();
        assert_eq!(sum(&map), 90);
        assert_eq!((&map).into_iter().count(), 10);
    }
}
