//! Implements constructors for [`RandMap`].
use crate::config::Config;
use crate::map::resize::over_load;
use crate::map::RandMap;
use crate::table::Table;
use randmap_core::RandMapError;
use std::collections::hash_map::RandomState;
use std::hash::{BuildHasher, Hash};

impl<K, V> RandMap<K, V, RandomState> {
    /// Creates an empty map with a single bucket.
    pub fn new() -> Self {
        Self::with_hasher(RandomState::new())
    }

    /// Creates an empty map that can hold `capacity` entries without resizing.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, RandomState::new())
    }

    /// Creates an empty map with custom parameters.
    ///
    /// # Parameters
    ///
    /// - `config`: Parameters of the resize controller and of the sampler.
    /// - `capacity`: The number of entries the map can hold without resizing.
    pub fn with_config(config: Config, capacity: usize) -> Result<Self, RandMapError> {
        Self::with_config_and_hasher(config, capacity, RandomState::new())
    }
}

impl<K, V, S> RandMap<K, V, S> {
    pub fn with_hasher(hash_builder: S) -> Self {
        Self::with_capacity_and_hasher(0, hash_builder)
    }

    pub fn with_capacity_and_hasher(capacity: usize, hash_builder: S) -> Self {
        Self::build(Config::default(), capacity, hash_builder)
    }

    /// Creates an empty map with custom parameters and a custom hasher.
    ///
    /// # Parameters
    ///
    /// - `config`: Parameters of the resize controller and of the sampler.
    /// - `capacity`: The number of entries the map can hold without resizing.
    /// - `hash_builder`: The hasher of the keys.
    pub fn with_config_and_hasher(
        config: Config,
        capacity: usize,
        hash_builder: S,
    ) -> Result<Self, RandMapError> {
        config.validate()?;
        Ok(Self::build(config, capacity, hash_builder))
    }

    fn build(config: Config, capacity: usize, hash_builder: S) -> Self {
        debug_assert!(config.validate().is_ok(), "Invalid config: {config:?}");

        let mut log2 = 0;
        while over_load(capacity, log2, config.max_load_factor) {
            log2 += 1;
        }

        Self {
            hash_builder,
            table: Table::new(log2),
            resize: None,
            len: 0,
            epoch: 0,
            next_seq: 0,
            config,
        }
    }
}

impl<K, V, S: Default> Default for RandMap<K, V, S> {
    fn default() -> Self {
        Self::with_hasher(S::default())
    }
}

impl<K, V, S> FromIterator<(K, V)> for RandMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let iter = iter.into_iter();
        let mut map = Self::with_capacity_and_hasher(iter.size_hint().0, S::default());
        map.extend(iter);
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_capacity_avoids_resizing() {
        let mut map = RandMap::with_capacity(1000);
        let buckets = map.stats().buckets;
        assert_eq!(buckets, 256);
        for i in 0..1000 {
            map.insert(i, i);
        }
        assert_eq!(map.stats().epoch, 0);
        assert_eq!(map.stats().buckets, buckets);
    }

    #[test]
    fn test_with_config_rejects_invalid_values() {
        let config = Config {
            retry_cap: 0,
            ..Config::default()
        };
        assert!(matches!(
            RandMap::<u8, u8>::with_config(config, 0),
            Err(RandMapError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_new_is_empty() {
        let map: RandMap<String, String> = RandMap::new();
        assert!(map.is_empty());
        assert_eq!(map.stats().buckets, 1);
        assert_eq!(map.load_factor(), 0.0);
    }
}
