//! Declares the storage units of the bucket array.
use std::fmt::{Debug, Formatter};

/// Number of bits needed to address a slot inside a bucket.
pub const BUCKET_BITS: u32 = 3;
/// Number of slots in every bucket, including overflow buckets.
pub const BUCKET_SIZE: usize = 1 << BUCKET_BITS;

/// A live key-value pair together with its full hash.
///
/// The hash is kept so that evacuation, sampling and iteration never need to re-hash keys.
#[derive(Clone, Debug)]
pub struct Entry<K, V> {
    pub hash: u64,
    /// Insertion sequence number, unique within a map. Orders entries with equal hashes.
    pub seq: u64,
    pub key: K,
    pub value: V,
}

/// Occupancy marker of a single slot.
#[derive(Clone)]
pub enum Slot<K, V> {
    /// This slot and every later slot of the chain (overflow buckets included) are empty.
    EmptyRest,
    /// This slot is empty, but later slots of the chain may be occupied.
    Empty,
    Occupied(Entry<K, V>),
    /// The entry has been moved to the same bucket index of the new table.
    EvacuatedLow,
    /// The entry has been moved to `index + old_len` of the new (doubled) table.
    EvacuatedHigh,
}

impl<K, V> Slot<K, V> {
    #[inline]
    pub fn entry(&self) -> Option<&Entry<K, V>> {
        match self {
            Slot::Occupied(entry) => Some(entry),
            _ => None,
        }
    }

    #[inline]
    pub fn entry_mut(&mut self) -> Option<&mut Entry<K, V>> {
        match self {
            Slot::Occupied(entry) => Some(entry),
            _ => None,
        }
    }

    #[inline]
    pub fn is_free(&self) -> bool {
        matches!(self, Slot::Empty | Slot::EmptyRest)
    }
}

impl<K: Debug, V: Debug> Debug for Slot<K, V> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Slot::EmptyRest => f.write_str("EmptyRest"),
            Slot::Empty => f.write_str("Empty"),
            Slot::Occupied(entry) => f.debug_tuple("Occupied").field(entry).finish(),
            Slot::EvacuatedLow => f.write_str("EvacuatedLow"),
            Slot::EvacuatedHigh => f.write_str("EvacuatedHigh"),
        }
    }
}

/// A bucket of the hash table.
///
/// Holds [`BUCKET_SIZE`] slots and optionally links an overflow bucket by its index in the arena
/// of the owning table.
#[derive(Clone, Debug)]
pub struct Bucket<K, V> {
    pub slots: [Slot<K, V>; BUCKET_SIZE],
    pub overflow: Option<usize>,
}

impl<K, V> Bucket<K, V> {
    /// Iterate over the live entries of this bucket alone, in slot order.
    #[inline]
    pub fn entries(&self) -> impl Iterator<Item = &Entry<K, V>> {
        self.slots.iter().filter_map(Slot::entry)
    }
}

impl<K, V> Default for Bucket<K, V> {
    fn default() -> Self {
        Self {
            slots: std::array::from_fn(|_| Slot::EmptyRest),
            overflow: None,
        }
    }
}
