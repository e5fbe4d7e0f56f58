//! Core trait declarations for the whole project.
use crate::error::RandMapError;

/// Read-only side of a hash map.
pub trait HashMap<K, V> {
    /// Get the value associated with the given `key`.
    fn get(&self, key: &K) -> Option<&V>;

    /// Get the number of elements in the map.
    fn len(&self) -> usize;

    /// Check if the map is empty.
    fn is_empty(&self) -> bool;

    /// Get the load factor of the map - the average number of entries per primary bucket.
    fn load_factor(&self) -> f64;

    /// Get the number of overflow buckets currently allocated by the map.
    fn num_overflow_buckets(&self) -> usize;
}

/// A collection capable of returning a random entry without enumerating its contents.
///
/// Two flavours are provided:
///
/// - The regular one is exactly uniform over the live entries.
/// - The "fast" one trades a small, statistically bounded bias for lower latency.
///
/// Both fail with [`RandMapError::EmptyCollection`] when the collection is empty.
pub trait Sample<K, V> {
    /// Get a uniformly random entry.
    fn sample_entry<'a>(&'a self) -> Result<(&'a K, &'a V), RandMapError>
    where
        K: 'a,
        V: 'a;

    /// Get a random entry using the low-latency sampling path.
    fn fast_sample_entry<'a>(&'a self) -> Result<(&'a K, &'a V), RandMapError>
    where
        K: 'a,
        V: 'a;

    /// Get a uniformly random key.
    fn sample_key<'a>(&'a self) -> Result<&'a K, RandMapError>
    where
        K: 'a,
        V: 'a,
    {
        self.sample_entry().map(|(k, _)| k)
    }

    /// Get a uniformly random value.
    fn sample_value<'a>(&'a self) -> Result<&'a V, RandMapError>
    where
        K: 'a,
        V: 'a,
    {
        self.sample_entry().map(|(_, v)| v)
    }

    /// Get a random key using the low-latency sampling path.
    fn fast_sample_key<'a>(&'a self) -> Result<&'a K, RandMapError>
    where
        K: 'a,
        V: 'a,
    {
        self.fast_sample_entry().map(|(k, _)| k)
    }

    /// Get a random value using the low-latency sampling path.
    fn fast_sample_value<'a>(&'a self) -> Result<&'a V, RandMapError>
    where
        K: 'a,
        V: 'a,
    {
        self.fast_sample_entry().map(|(_, v)| v)
    }
}

/// A collection that can be traversed in a randomized order.
///
/// Every traversal visits each entry exactly once, and the order differs between traversals.
pub trait Traverse<K, V> {
    type Iter<'a>: Iterator<Item = (&'a K, &'a V)>
    where
        Self: 'a,
        K: 'a,
        V: 'a;

    /// Start a randomized traversal seeded from a cryptographically secure generator.
    fn iter(&self) -> Self::Iter<'_>;

    /// Start a randomized traversal seeded from the fast thread-local generator.
    fn fast_iter(&self) -> Self::Iter<'_>;
}
