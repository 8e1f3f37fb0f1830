//! Dict: chained hash table over two bucket arrays.
//!
//! Table 0 is the active table. While a rehash is in progress table 1 is the
//! migration target and both tables are part of the keyspace: lookups and
//! removals search table 0 then table 1, insertions go to table 1 only. Every
//! lookup or mutation first migrates one bucket (see [`Dict::rehash`]) so the
//! cost of growing is spread over many calls instead of paid at once.

use crate::config::DictConfig;
use crate::dict_type::DictType;
use crate::error::DictError;
use crate::table::{next_power, Entry, EntryId, Table};
use core::fmt;
use slotmap::SlotMap;

/// Outcome of [`Dict::replace`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Replaced {
    /// The key was absent and a new entry was added.
    Inserted,
    /// The key was present and its value was overwritten.
    Replaced,
}

/// Incrementally rehashing dictionary parameterized by a [`DictType`].
pub struct Dict<T: DictType> {
    pub(crate) entries: SlotMap<EntryId, Entry<T::Key, T::Value>>,
    pub(crate) tables: [Table; 2],
    /// Next bucket of table 0 to migrate; `None` when no rehash is running.
    pub(crate) rehash_idx: Option<usize>,
    /// Outstanding safe iterators. Rehash steps are paused while non-zero.
    pub(crate) safe_iterators: usize,
    pub(crate) ctx: T::Context,
    pub(crate) config: DictConfig,
}

impl<T: DictType> Dict<T> {
    /// Creates an empty dictionary. No buckets are allocated until the first
    /// insertion.
    pub fn new(ctx: T::Context) -> Self {
        Self::with_config(ctx, DictConfig::default())
    }

    pub fn with_config(ctx: T::Context, config: DictConfig) -> Self {
        Self {
            entries: SlotMap::with_key(),
            tables: [Table::default(), Table::default()],
            rehash_idx: None,
            safe_iterators: 0,
            ctx,
            config,
        }
    }

    /// Creates a dictionary whose active table already has room for
    /// `capacity` entries before its first growth.
    pub fn with_capacity(ctx: T::Context, capacity: usize) -> Self {
        let mut d = Self::new(ctx);
        if capacity > 0 {
            d.tables[0] = Table::with_size(next_power(capacity.saturating_add(1)));
        }
        d
    }

    /// Number of entries across both tables.
    #[inline]
    pub fn len(&self) -> usize {
        self.tables[0].used + self.tables[1].used
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of buckets across both tables.
    pub fn slots(&self) -> usize {
        self.tables[0].size() + self.tables[1].size()
    }

    #[inline]
    pub fn is_rehashing(&self) -> bool {
        self.rehash_idx.is_some()
    }

    /// Next bucket of table 0 the rehash will migrate, if one is running.
    pub fn rehash_index(&self) -> Option<usize> {
        self.rehash_idx
    }

    /// Bucket count of table `0` or `1`; zero when unallocated.
    ///
    /// # Panics
    ///
    /// Panics if `table > 1`.
    pub fn table_size(&self, table: usize) -> usize {
        self.tables[table].size()
    }

    /// Entries held by table `0` or `1`.
    ///
    /// # Panics
    ///
    /// Panics if `table > 1`.
    pub fn table_used(&self, table: usize) -> usize {
        self.tables[table].used
    }

    pub fn config(&self) -> &DictConfig {
        &self.config
    }

    pub fn context(&self) -> &T::Context {
        &self.ctx
    }

    /// Number of safe iterators created and not yet released.
    pub fn safe_iterators(&self) -> usize {
        self.safe_iterators
    }

    /// Adds `key` with `value`. Fails with [`DictError::KeyExists`] if an
    /// equal key is already present, in which case both are handed to the
    /// destroy callbacks.
    pub fn add(&mut self, key: T::Key, value: T::Value) -> Result<EntryId, DictError> {
        self.rehash_step_if_needed();
        let hash = T::hash(&self.ctx, &key);
        self.expand_if_needed();
        if self.locate(&key, hash).is_some() {
            T::key_destroy(&self.ctx, key);
            T::val_destroy(&self.ctx, value);
            return Err(DictError::KeyExists);
        }
        Ok(self.insert_new(key, value, hash))
    }

    /// Adds `key` or overwrites the value of the existing equal key.
    ///
    /// The new value is stored before the old one is handed to
    /// [`DictType::val_destroy`], so a new value derived from the old one
    /// stays valid. The stored key is kept; the one passed in goes to
    /// [`DictType::key_destroy`].
    pub fn replace(&mut self, key: T::Key, value: T::Value) -> Replaced {
        self.rehash_step_if_needed();
        let hash = T::hash(&self.ctx, &key);
        self.expand_if_needed();
        match self.locate(&key, hash) {
            Some(id) => {
                let value = T::val_dup(&self.ctx, value);
                let old = self.entries[id].replace_value(value);
                T::val_destroy(&self.ctx, old);
                T::key_destroy(&self.ctx, key);
                Replaced::Replaced
            }
            None => {
                self.insert_new(key, value, hash);
                Replaced::Inserted
            }
        }
    }

    /// Id of the entry for `key`, if present.
    pub fn find_id(&mut self, key: &T::Key) -> Option<EntryId> {
        if self.is_empty() {
            return None;
        }
        self.rehash_step_if_needed();
        let hash = T::hash(&self.ctx, key);
        self.locate(key, hash)
    }

    pub fn find(&mut self, key: &T::Key) -> Option<&Entry<T::Key, T::Value>> {
        let id = self.find_id(key)?;
        self.entries.get(id)
    }

    pub fn find_mut(&mut self, key: &T::Key) -> Option<&mut Entry<T::Key, T::Value>> {
        let id = self.find_id(key)?;
        self.entries.get_mut(id)
    }

    /// Value stored under `key`, if present.
    pub fn fetch_value(&mut self, key: &T::Key) -> Option<&T::Value> {
        self.find(key).map(Entry::value)
    }

    pub fn contains_key(&mut self, key: &T::Key) -> bool {
        self.find_id(key).is_some()
    }

    /// Entry named by `id`. Does not advance a running rehash.
    pub fn entry(&self, id: EntryId) -> Option<&Entry<T::Key, T::Value>> {
        self.entries.get(id)
    }

    pub fn entry_mut(&mut self, id: EntryId) -> Option<&mut Entry<T::Key, T::Value>> {
        self.entries.get_mut(id)
    }

    /// Removes `key`, passing its key and value to the destroy callbacks.
    pub fn remove(&mut self, key: &T::Key) -> Result<(), DictError> {
        let entry = self.unlink(key)?;
        self.free_unlinked_entry(entry);
        Ok(())
    }

    /// Removes `key` without running the destroy callbacks and hands the
    /// detached entry to the caller.
    pub fn unlink(&mut self, key: &T::Key) -> Result<Entry<T::Key, T::Value>, DictError> {
        if self.is_empty() {
            return Err(DictError::KeyNotFound);
        }
        self.rehash_step_if_needed();
        let hash = T::hash(&self.ctx, key);
        let id = self
            .unlink_where(hash, |ctx, _, e| T::key_compare(ctx, e.key(), key))
            .ok_or(DictError::KeyNotFound)?;
        self.take_entry(id)
    }

    /// Removes the entry named by `id`, running the destroy callbacks.
    ///
    /// Meant for removing the entry a safe iterator just returned without
    /// cloning its key. Does not advance a running rehash.
    pub fn remove_by_id(&mut self, id: EntryId) -> Result<(), DictError> {
        let hash = self.entries.get(id).ok_or(DictError::KeyNotFound)?.hash();
        self.unlink_where(hash, |_, cand, _| cand == id)
            .ok_or(DictError::KeyNotFound)?;
        let entry = self.take_entry(id)?;
        self.free_unlinked_entry(entry);
        Ok(())
    }

    /// Runs the destroy callbacks on an entry previously detached with
    /// [`Dict::unlink`].
    pub fn free_unlinked_entry(&self, entry: Entry<T::Key, T::Value>) {
        let (key, value) = entry.into_parts();
        T::key_destroy(&self.ctx, key);
        T::val_destroy(&self.ctx, value);
    }

    /// Destroys every entry and returns both tables to the unallocated state.
    pub fn clear(&mut self) {
        for (_, entry) in self.entries.drain() {
            let (key, value) = entry.into_parts();
            T::key_destroy(&self.ctx, key);
            T::val_destroy(&self.ctx, value);
        }
        self.tables[0].reset();
        self.tables[1].reset();
        self.rehash_idx = None;
    }

    /// Borrowing iterator over `(key, value)` pairs.
    pub fn iter(&self) -> crate::iter::Iter<'_, T> {
        crate::iter::Iter::new(self)
    }

    pub(crate) fn rehash_step_if_needed(&mut self) {
        if self.rehash_idx.is_some() && self.safe_iterators == 0 {
            self.rehash(1);
        }
    }

    /// Searches the live tables for `key` without side effects.
    pub(crate) fn locate(&self, key: &T::Key, hash: u64) -> Option<EntryId> {
        for t in 0..=1 {
            let table = &self.tables[t];
            if table.is_allocated() {
                let mut cur = table.head(table.bucket_of(hash));
                while let Some(id) = cur {
                    let e = &self.entries[id];
                    if e.hash() == hash && T::key_compare(&self.ctx, e.key(), key) {
                        return Some(id);
                    }
                    cur = e.next;
                }
            }
            if !self.is_rehashing() {
                break;
            }
        }
        None
    }

    fn insert_new(&mut self, key: T::Key, value: T::Value, hash: u64) -> EntryId {
        let t = if self.is_rehashing() { 1 } else { 0 };
        let key = T::key_dup(&self.ctx, key);
        let value = T::val_dup(&self.ctx, value);
        let table = &mut self.tables[t];
        let bucket = table.bucket_of(hash);
        let id = self
            .entries
            .insert(Entry::new(key, value, hash, table.buckets[bucket]));
        table.buckets[bucket] = Some(id);
        table.used += 1;
        id
    }

    /// Unlinks the first entry in the chain for `hash` matching `pred` from
    /// whichever live table holds it. The entry stays in the arena.
    fn unlink_where<F>(&mut self, hash: u64, mut pred: F) -> Option<EntryId>
    where
        F: FnMut(&T::Context, EntryId, &Entry<T::Key, T::Value>) -> bool,
    {
        let rehashing = self.is_rehashing();
        for t in 0..=1 {
            let table = &mut self.tables[t];
            if table.is_allocated() {
                let bucket = table.bucket_of(hash);
                let mut prev: Option<EntryId> = None;
                let mut cur = table.buckets[bucket];
                while let Some(id) = cur {
                    let e = &self.entries[id];
                    let next = e.next;
                    if e.hash() == hash && pred(&self.ctx, id, e) {
                        match prev {
                            Some(p) => self.entries[p].next = next,
                            None => table.buckets[bucket] = next,
                        }
                        table.used -= 1;
                        return Some(id);
                    }
                    prev = cur;
                    cur = next;
                }
            }
            if !rehashing {
                break;
            }
        }
        None
    }

    fn take_entry(&mut self, id: EntryId) -> Result<Entry<T::Key, T::Value>, DictError> {
        let mut entry = self.entries.remove(id).ok_or(DictError::KeyNotFound)?;
        entry.next = None;
        Ok(entry)
    }

    /// Checks the structural invariants; used by the tests.
    #[cfg(test)]
    pub(crate) fn assert_invariants(&self) {
        let mut seen = 0;
        for (t, table) in self.tables.iter().enumerate() {
            let mut chained = 0;
            for (bucket, head) in table.buckets.iter().enumerate() {
                let mut cur = *head;
                while let Some(id) = cur {
                    let e = &self.entries[id];
                    assert_eq!(table.bucket_of(e.hash()), bucket, "entry in wrong bucket of table {t}");
                    chained += 1;
                    cur = e.next;
                }
            }
            assert_eq!(chained, table.used, "table {t} used count mismatch");
            seen += chained;
        }
        assert_eq!(seen, self.entries.len());
        match self.rehash_idx {
            None => {
                assert!(!self.tables[1].is_allocated());
                assert_eq!(self.tables[1].used, 0);
            }
            Some(idx) => {
                assert!(self.tables[1].is_allocated());
                assert!(idx <= self.tables[0].size());
                assert!(self.tables[0].buckets[..idx].iter().all(Option::is_none));
            }
        }
        if self.tables[0].is_allocated() {
            assert!(self.tables[0].size() >= crate::table::INITIAL_SIZE);
        }
    }
}

impl<T: DictType> Drop for Dict<T> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<T: DictType> fmt::Debug for Dict<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dict")
            .field("len", &self.len())
            .field("sizes", &[self.tables[0].size(), self.tables[1].size()])
            .field("rehash_idx", &self.rehash_idx)
            .field("safe_iterators", &self.safe_iterators)
            .finish()
    }
}
