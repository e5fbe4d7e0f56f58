//! Declares core types for [`RandMap`].
use crate::config::Config;
use crate::map::resize::{ResizeKind, ResizeState};
use crate::table::{Entry, Table};
use std::collections::hash_map::RandomState;
use std::fmt::{Debug, Formatter};
use std::hash::{BuildHasher, Hash};

/// Hash map with O(1) expected-time random sampling and randomized-order iteration.
///
/// # Guarantees
///
/// - [`RandMap::sample_entry`] returns every live entry with equal probability in O(1) expected
///   time as long as the load factor is not pathologically low.
/// - [`RandMap::iter`] visits every live entry exactly once, in an order that is different for
///   every traversal.
/// - Resizing is incremental: every mutating call moves at most a small constant number of
///   buckets from the old table into the new one.
///
/// # Examples
///
/// ```rust
/// use randmap::RandMap;
///
/// let mut tasks = RandMap::new();
/// tasks.insert("compact", 3);
/// tasks.insert("flush", 1);
/// tasks.insert("evict", 7);
///
/// // Pick a random victim.
/// let victim = *tasks.sample_key().unwrap();
/// assert!(tasks.contains_key(victim));
///
/// // Visit everything in a shuffled order.
/// assert_eq!(tasks.iter().count(), 3);
/// ```
pub struct RandMap<K, V, S = RandomState> {
    pub(crate) hash_builder: S,
    /// The table of record. While a resize is in progress it is the table being filled.
    pub(crate) table: Table<K, V>,
    pub(crate) resize: Option<ResizeState<K, V>>,
    pub(crate) len: usize,
    /// Number of resizes started since construction.
    pub(crate) epoch: u64,
    /// Sequence number of the next inserted entry.
    pub(crate) next_seq: u64,
    pub(crate) config: Config,
}

/// A snapshot of the physical layout of a [`RandMap`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TableStats {
    pub len: usize,
    /// Number of primary buckets of the table of record.
    pub buckets: usize,
    /// Number of overflow buckets of both tables.
    pub overflow_buckets: usize,
    /// The longest chain of both tables, measured in buckets.
    pub longest_chain: usize,
    /// The kind of the resize in progress, if any.
    pub resize: Option<ResizeKind>,
    pub epoch: u64,
}

impl<K, V, S> RandMap<K, V, S> {
    /// Get the number of elements in the map.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if the map is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Get the average number of entries per primary bucket of the table of record.
    #[inline]
    pub fn load_factor(&self) -> f64 {
        self.len as f64 / self.table.num_buckets() as f64
    }

    /// Get the number of overflow buckets currently allocated, old table included.
    pub fn num_overflow_buckets(&self) -> usize {
        self.table.num_overflow() + self.resize.as_ref().map_or(0, |rs| rs.old.num_overflow())
    }

    pub fn stats(&self) -> TableStats {
        TableStats {
            len: self.len,
            buckets: self.table.num_buckets(),
            overflow_buckets: self.num_overflow_buckets(),
            longest_chain: self.longest_chain(),
            resize: self.resize.as_ref().map(|rs| rs.kind),
            epoch: self.epoch,
        }
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[inline]
    pub fn hasher(&self) -> &S {
        &self.hash_builder
    }

    /// The longest chain of both tables - the depth of the logical address space of the sampler.
    #[inline]
    pub(crate) fn longest_chain(&self) -> usize {
        let old = self.resize.as_ref().map_or(0, |rs| rs.old.longest_chain());
        self.table.longest_chain().max(old)
    }

    /// Iterate over the live entries of the `logical` bucket of the address space described by
    /// `mask`, wherever they currently are: in the old table if their bucket has not been
    /// evacuated yet, in the table of record otherwise.
    pub(crate) fn logical_entries(
        &self,
        logical: usize,
        mask: usize,
    ) -> impl Iterator<Item = &Entry<K, V>> {
        self.resize
            .iter()
            .flat_map(move |rs| {
                rs.old
                    .logical_entries(logical, mask, Some(rs.evacuated.as_bitslice()))
            })
            .chain(self.table.logical_entries(logical, mask, None))
    }

    /// Iterate over all live entries in their physical order.
    pub(crate) fn physical_entries(&self) -> impl Iterator<Item = &Entry<K, V>> {
        self.resize
            .iter()
            .flat_map(|rs| rs.old.entries())
            .chain(self.table.entries())
    }
}

impl<K, V, S: BuildHasher> RandMap<K, V, S> {
    #[inline]
    pub(crate) fn hash_key<Q: Hash + ?Sized>(&self, key: &Q) -> u64 {
        self.hash_builder.hash_one(key)
    }
}

impl<K: Debug, V: Debug, S> Debug for RandMap<K, V, S> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.physical_entries().map(|entry| (&entry.key, &entry.value)))
            .finish()
    }
}

impl<K: Clone, V: Clone, S: Clone> Clone for RandMap<K, V, S> {
    fn clone(&self) -> Self {
        Self {
            hash_builder: self.hash_builder.clone(),
            table: self.table.clone(),
            resize: self.resize.clone(),
            len: self.len,
            epoch: self.epoch,
            next_seq: self.next_seq,
            config: self.config,
        }
    }
}
