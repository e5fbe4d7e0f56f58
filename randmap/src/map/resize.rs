//! Implements the incremental resize controller of [`RandMap`].
//!
//! A resize never moves all the entries at once. It only allocates the new table and records the
//! old one in a [`ResizeState`]; afterwards every mutating call evacuates a few old buckets until
//! none is left and the old table is dropped as a whole.
use crate::map::RandMap;
use crate::table::{Slot, Table};
use bitvec::prelude::*;
use tracing::debug;

/// The reason a resize was started.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResizeKind {
    /// The load factor has been exceeded - the number of buckets doubles.
    Grow,
    /// Overflow chains have become too fragmented - the buckets are re-packed into a table of the
    /// same size.
    SameSize,
}

/// Bookkeeping of an in-progress resize.
#[derive(Clone, Debug)]
pub(crate) struct ResizeState<K, V> {
    pub kind: ResizeKind,
    /// The table being drained.
    pub old: Table<K, V>,
    /// One bit per primary bucket of the old table, set once the bucket has been evacuated.
    pub evacuated: BitVec,
    /// All old buckets below this index are evacuated.
    pub next: usize,
    pub remaining: usize,
}

impl<K, V> ResizeState<K, V> {
    fn new(old: Table<K, V>, kind: ResizeKind) -> Self {
        let num_buckets = old.num_buckets();
        Self {
            kind,
            old,
            evacuated: bitvec![0; num_buckets],
            next: 0,
            remaining: num_buckets,
        }
    }

    #[inline]
    pub fn is_evacuated(&self, old_idx: usize) -> bool {
        self.evacuated[old_idx]
    }

    #[inline]
    pub fn is_complete(&self) -> bool {
        self.remaining == 0
    }

    /// Moves the live entries of the old bucket `old_idx` into `new`.
    ///
    /// When growing, an entry either stays at the same index or moves to `old_idx + old_len`,
    /// depending on the hash bit that the doubled mask adds.
    ///
    /// Returns `false` if the bucket had already been evacuated.
    fn evacuate(&mut self, old_idx: usize, new: &mut Table<K, V>) -> bool {
        if self.evacuated[old_idx] {
            return false;
        }

        let old_len = self.old.num_buckets();
        let kind = self.kind;
        self.old.drain_chain(old_idx, |entry| {
            let marker = match kind {
                ResizeKind::Grow if entry.hash as usize & old_len != 0 => Slot::EvacuatedHigh,
                _ => Slot::EvacuatedLow,
            };
            debug_assert!(
                entry.hash as usize & new.mask()
                    == old_idx + if matches!(marker, Slot::EvacuatedHigh) { old_len } else { 0 },
                "Entry evacuated into a wrong bucket"
            );
            new.place(entry);
            marker
        });

        self.evacuated.set(old_idx, true);
        self.remaining -= 1;
        while self.next < old_len && self.evacuated[self.next] {
            self.next += 1;
        }
        true
    }
}

/// Whether `count` entries overload a table of `2 ** log2` buckets.
#[inline]
pub(crate) fn over_load(count: usize, log2: u8, max_load_factor: f32) -> bool {
    count > crate::table::BUCKET_SIZE
        && count as f64 > max_load_factor as f64 * (1_usize << log2) as f64
}

/// Whether the table has more overflow buckets than it is worth keeping.
///
/// The threshold is capped so that very large tables still get compacted.
#[inline]
pub(crate) fn too_many_overflow(num_overflow: usize, log2: u8) -> bool {
    num_overflow >= 1 << log2.min(15)
}

impl<K, V, S> RandMap<K, V, S> {
    /// Starts a resize if inserting one more entry requires it.
    ///
    /// Must only be called while no resize is in progress.
    pub(crate) fn maybe_start_resize(&mut self) -> bool {
        debug_assert!(self.resize.is_none(), "A resize is already in progress");

        let log2 = self.table.log2();
        let kind = if over_load(self.len + 1, log2, self.config.max_load_factor) {
            ResizeKind::Grow
        } else if too_many_overflow(self.table.num_overflow(), log2) {
            ResizeKind::SameSize
        } else {
            return false;
        };

        let new_log2 = match kind {
            ResizeKind::Grow => log2 + 1,
            ResizeKind::SameSize => log2,
        };
        let old = std::mem::replace(&mut self.table, Table::new(new_log2));
        debug!(
            kind = ?kind,
            old_buckets = old.num_buckets(),
            new_buckets = self.table.num_buckets(),
            old_overflow = old.num_overflow(),
            len = self.len,
            epoch = self.epoch + 1,
            "Resize started"
        );
        self.resize = Some(ResizeState::new(old, kind));
        self.epoch += 1;
        true
    }

    /// Performs the evacuation work owed by a mutating call that touches `hash`.
    ///
    /// The old bucket that `hash` belongs to is evacuated first, so that the caller can operate on
    /// the table of record alone, followed by further buckets in index order. The key's own bucket
    /// only counts towards `evacuations_per_write` if it had not been evacuated yet, so every call
    /// makes progress.
    pub(crate) fn grow_work(&mut self, hash: u64) {
        let Some(rs) = self.resize.as_mut() else {
            return;
        };

        let mut budget = self.config.evacuations_per_write;
        if rs.evacuate(hash as usize & rs.old.mask(), &mut self.table) {
            budget -= 1;
        }
        for _ in 0..budget {
            if rs.is_complete() {
                break;
            }
            let next = rs.next;
            rs.evacuate(next, &mut self.table);
        }

        if rs.is_complete() {
            debug!(
                kind = ?rs.kind,
                buckets = self.table.num_buckets(),
                overflow = self.table.num_overflow(),
                epoch = self.epoch,
                "Resize complete"
            );
            self.resize = None;
        }
    }

    /// Evacuates every remaining old bucket at once.
    pub fn finish_resize(&mut self) {
        while let Some(rs) = self.resize.as_ref() {
            let old_len = rs.old.num_buckets();
            let next = rs.next.min(old_len - 1);
            self.grow_work(next as u64);
        }
    }
}
