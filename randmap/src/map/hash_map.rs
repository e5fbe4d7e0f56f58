//! Implements the ordinary map operations of [`RandMap`].
use crate::map::RandMap;
use crate::table::{Entry, Table};
use std::borrow::Borrow;
use std::hash::{BuildHasher, Hash};

impl<K, V, S> RandMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    /// The table that currently holds the chain of `hash`.
    #[inline]
    fn table_for(&self, hash: u64) -> &Table<K, V> {
        match &self.resize {
            Some(rs) if !rs.is_evacuated(hash as usize & rs.old.mask()) => &rs.old,
            _ => &self.table,
        }
    }

    /// Get the value associated with the given `key`.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get_key_value(key).map(|(_, v)| v)
    }

    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        if self.is_empty() {
            return None;
        }
        let hash = self.hash_key(key);
        self.table_for(hash)
            .find(hash, key)
            .map(|entry| (&entry.key, &entry.value))
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        if self.is_empty() {
            return None;
        }
        let hash = self.hash_key(key);
        let table = match &mut self.resize {
            Some(rs) if !rs.is_evacuated(hash as usize & rs.old.mask()) => &mut rs.old,
            _ => &mut self.table,
        };
        table.find_mut(hash, key).map(|entry| &mut entry.value)
    }

    #[inline]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get(key).is_some()
    }

    /// Insert a key-value pair, returning the previous value of the key if it was present.
    ///
    /// While a resize is in progress, the call first evacuates the old bucket of `key` and a few
    /// more.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let hash = self.hash_key(&key);
        self.grow_work(hash);

        if let Some(entry) = self.table.find_mut(hash, &key) {
            return Some(std::mem::replace(&mut entry.value, value));
        }

        if self.resize.is_none() && self.maybe_start_resize() {
            self.grow_work(hash);
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        self.table.place(Entry {
            hash,
            seq,
            key,
            value,
        });
        self.len += 1;
        None
    }

    /// Remove a key from the map, returning its value if it was present.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.remove_entry(key).map(|(_, v)| v)
    }

    pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        if self.is_empty() {
            return None;
        }
        let hash = self.hash_key(key);
        self.grow_work(hash);

        let entry = self.table.remove(hash, key)?;
        self.len -= 1;
        Some((entry.key, entry.value))
    }
}

impl<K, V, S> RandMap<K, V, S> {
    /// Remove every entry, keeping the current number of primary buckets.
    ///
    /// An in-progress resize is abandoned together with the old table.
    pub fn clear(&mut self) {
        self.table = Table::new(self.table.log2());
        self.resize = None;
        self.len = 0;
    }
}

impl<K, V, S> randmap_core::HashMap<K, V> for RandMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn get(&self, key: &K) -> Option<&V> {
        RandMap::get(self, key)
    }

    fn len(&self) -> usize {
        RandMap::len(self)
    }

    fn is_empty(&self) -> bool {
        RandMap::is_empty(self)
    }

    fn load_factor(&self) -> f64 {
        RandMap::load_factor(self)
    }

    fn num_overflow_buckets(&self) -> usize {
        RandMap::num_overflow_buckets(self)
    }
}

impl<K, V, S> Extend<(K, V)> for RandMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}
