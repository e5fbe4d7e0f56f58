//! The bucket array: an arena of fixed-capacity buckets with singly linked overflow chains.
//!
//! The first `2 ** log2` buckets of the arena are the primary buckets addressed by the low bits of a
//! hash, overflow buckets are appended behind them and are referenced by their arena index. The
//! table is the sole owner of every bucket - overflow buckets live exactly as long as the table.
mod bucket;
pub use bucket::*;

use crate::utils::bit_hacks::num_buckets_for_bits;
use bitvec::slice::BitSlice;
use std::borrow::Borrow;
use std::mem;

#[derive(Clone, Debug)]
pub struct Table<K, V> {
    buckets: Vec<Bucket<K, V>>,
    log2: u8,
    num_overflow: usize,
    /// Length of the longest chain ever built in this table, measured in buckets.
    ///
    /// Overflow buckets are never released before the table itself, so this value never shrinks.
    longest_chain: usize,
}

/// Iterator over the buckets of a single chain, primary bucket first.
pub struct Chain<'a, K, V> {
    table: &'a Table<K, V>,
    next: Option<usize>,
}

impl<'a, K, V> Iterator for Chain<'a, K, V> {
    type Item = &'a Bucket<K, V>;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let bucket = &self.table.buckets[self.next?];
        self.next = bucket.overflow;
        Some(bucket)
    }
}

impl<K, V> Table<K, V> {
    pub fn new(log2: u8) -> Self {
        let num_buckets = num_buckets_for_bits(log2);
        let mut buckets = Vec::with_capacity(num_buckets);
        buckets.resize_with(num_buckets, Bucket::default);
        Self {
            buckets,
            log2,
            num_overflow: 0,
            longest_chain: 1,
        }
    }

    #[inline]
    pub fn log2(&self) -> u8 {
        self.log2
    }

    /// Number of primary buckets.
    #[inline]
    pub fn num_buckets(&self) -> usize {
        num_buckets_for_bits(self.log2)
    }

    #[inline]
    pub fn mask(&self) -> usize {
        self.num_buckets() - 1
    }

    #[inline]
    pub fn num_overflow(&self) -> usize {
        self.num_overflow
    }

    #[inline]
    pub fn longest_chain(&self) -> usize {
        self.longest_chain
    }

    /// Iterate over the chain that starts at the primary bucket `idx`.
    #[inline]
    pub fn chain(&self, idx: usize) -> Chain<'_, K, V> {
        debug_assert!(idx < self.num_buckets(), "Not a primary bucket: {idx}");
        Chain {
            table: self,
            next: Some(idx),
        }
    }

    /// Iterate over the live entries that belong to `logical` bucket of an address space described
    /// by `mask`.
    ///
    /// The address space may be smaller or larger than the table itself: a smaller one spreads
    /// over several primary buckets, a larger one covers only a part of a single chain. Primary
    /// buckets flagged in `evacuated` are skipped.
    pub fn logical_entries<'a>(
        &'a self,
        logical: usize,
        mask: usize,
        evacuated: Option<&'a BitSlice>,
    ) -> impl Iterator<Item = &'a Entry<K, V>> + 'a {
        let stride = mask + 1;
        let (first, count) = if self.num_buckets() > stride {
            (logical, self.num_buckets() / stride)
        } else {
            (logical & self.mask(), 1)
        };
        (0..count)
            .map(move |k| first + k * stride)
            .filter(move |&idx| evacuated.map_or(true, |bits| !bits[idx]))
            .flat_map(move |idx| self.chain(idx).flat_map(|bucket| bucket.entries()))
            .filter(move |entry| entry.hash as usize & mask == logical)
    }

    /// Locate the `(arena index, slot index)` of the entry with the given key.
    fn position<Q>(&self, hash: u64, key: &Q) -> Option<(usize, usize)>
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        let mut next = Some(hash as usize & self.mask());
        while let Some(idx) = next {
            let bucket = &self.buckets[idx];
            for (slot_idx, slot) in bucket.slots.iter().enumerate() {
                match slot {
                    Slot::EmptyRest => return None,
                    Slot::Occupied(entry) if entry.hash == hash && entry.key.borrow() == key => {
                        return Some((idx, slot_idx));
                    }
                    _ => {}
                }
            }
            next = bucket.overflow;
        }
        None
    }

    pub fn find<Q>(&self, hash: u64, key: &Q) -> Option<&Entry<K, V>>
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        let (idx, slot_idx) = self.position(hash, key)?;
        self.buckets[idx].slots[slot_idx].entry()
    }

    pub fn find_mut<Q>(&mut self, hash: u64, key: &Q) -> Option<&mut Entry<K, V>>
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        let (idx, slot_idx) = self.position(hash, key)?;
        self.buckets[idx].slots[slot_idx].entry_mut()
    }

    /// Put the entry into the first free slot of its chain, growing the chain if it is full.
    ///
    /// The caller guarantees that the key is not present in the table.
    pub fn place(&mut self, entry: Entry<K, V>) {
        let mut idx = entry.hash as usize & self.mask();
        let mut depth = 1;
        loop {
            let bucket = &mut self.buckets[idx];
            if let Some(slot) = bucket.slots.iter_mut().find(|slot| slot.is_free()) {
                *slot = Slot::Occupied(entry);
                return;
            }
            match bucket.overflow {
                Some(next) => {
                    idx = next;
                    depth += 1;
                }
                None => break,
            }
        }

        let mut overflow = Bucket::default();
        overflow.slots[0] = Slot::Occupied(entry);
        let overflow_idx = self.buckets.len();
        self.buckets.push(overflow);
        self.buckets[idx].overflow = Some(overflow_idx);
        self.num_overflow += 1;
        self.longest_chain = self.longest_chain.max(depth + 1);
    }

    pub fn remove<Q>(&mut self, hash: u64, key: &Q) -> Option<Entry<K, V>>
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        let (idx, slot_idx) = self.position(hash, key)?;
        let removed = mem::replace(&mut self.buckets[idx].slots[slot_idx], Slot::Empty);
        self.normalize_tail(hash as usize & self.mask());
        match removed {
            Slot::Occupied(entry) => Some(entry),
            _ => None,
        }
    }

    /// Turns every free slot behind the last occupied one of the chain into [`Slot::EmptyRest`].
    fn normalize_tail(&mut self, head: usize) {
        let mut last_occupied = None;
        for (depth, bucket) in self.chain(head).enumerate() {
            for (slot_idx, slot) in bucket.slots.iter().enumerate() {
                if !slot.is_free() {
                    last_occupied = Some((depth, slot_idx));
                }
            }
        }

        let mut next = Some(head);
        let mut depth = 0;
        while let Some(idx) = next {
            let bucket = &mut self.buckets[idx];
            for (slot_idx, slot) in bucket.slots.iter_mut().enumerate() {
                if slot.is_free() && last_occupied.map_or(true, |last| (depth, slot_idx) > last) {
                    *slot = Slot::EmptyRest;
                }
            }
            next = bucket.overflow;
            depth += 1;
        }
    }

    /// Moves every live entry out of the chain at primary bucket `idx`.
    ///
    /// `sink` consumes each entry and returns the marker that should be left in its slot.
    pub fn drain_chain(&mut self, idx: usize, mut sink: impl FnMut(Entry<K, V>) -> Slot<K, V>) {
        let mut next = Some(idx);
        while let Some(idx) = next {
            let bucket = &mut self.buckets[idx];
            for slot in bucket.slots.iter_mut() {
                if let Slot::Occupied(_) = slot {
                    if let Slot::Occupied(entry) = mem::replace(slot, Slot::Empty) {
                        *slot = sink(entry);
                    }
                }
            }
            next = bucket.overflow;
        }
    }

    /// Iterate over the live entries of the whole table in arena order.
    pub fn entries(&self) -> impl Iterator<Item = &Entry<K, V>> {
        self.buckets.iter().flat_map(|bucket| bucket.entries())
    }
}
