//! Entries and the bucket arrays that chain them together.
//!
//! Entries live in one generational arena owned by the dictionary; a table
//! only holds the head id of each bucket chain and every entry links to the
//! next one in its bucket. An entry belongs to exactly one chain of exactly
//! one table at any time.

use slotmap::new_key_type;

new_key_type! {
    /// Stable name of a live entry.
    ///
    /// Ids stay valid while the entry is in the dictionary, including across
    /// rehashing, and never alias a later entry once it has been removed.
    pub struct EntryId;
}

/// Smallest allocated table size.
pub(crate) const INITIAL_SIZE: usize = 4;

/// Largest table size we ever ask for; further growth saturates here.
const MAX_SIZE: usize = 1 << (usize::BITS - 2);

/// One key/value pair plus the link to the next entry of its bucket.
#[derive(Debug)]
pub struct Entry<K, V> {
    key: K,
    value: V,
    hash: u64,
    pub(crate) next: Option<EntryId>,
}

impl<K, V> Entry<K, V> {
    pub(crate) fn new(key: K, value: V, hash: u64, next: Option<EntryId>) -> Self {
        Self {
            key,
            value,
            hash,
            next,
        }
    }

    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn value(&self) -> &V {
        &self.value
    }

    pub fn value_mut(&mut self) -> &mut V {
        &mut self.value
    }

    /// Hash computed for the key when it was inserted; rehashing reuses it
    /// instead of calling back into the descriptor.
    pub fn hash(&self) -> u64 {
        self.hash
    }

    pub fn into_parts(self) -> (K, V) {
        (self.key, self.value)
    }

    pub(crate) fn replace_value(&mut self, value: V) -> V {
        core::mem::replace(&mut self.value, value)
    }
}

/// A power-of-two array of bucket heads.
#[derive(Debug, Default)]
pub(crate) struct Table {
    pub(crate) buckets: Box<[Option<EntryId>]>,
    pub(crate) size_mask: usize,
    pub(crate) used: usize,
}

impl Table {
    pub(crate) fn with_size(size: usize) -> Self {
        debug_assert!(size.is_power_of_two());
        Self {
            buckets: vec![None; size].into_boxed_slice(),
            size_mask: size - 1,
            used: 0,
        }
    }

    #[inline]
    pub(crate) fn size(&self) -> usize {
        self.buckets.len()
    }

    #[inline]
    pub(crate) fn is_allocated(&self) -> bool {
        !self.buckets.is_empty()
    }

    #[inline]
    pub(crate) fn bucket_of(&self, hash: u64) -> usize {
        (hash as usize) & self.size_mask
    }

    #[inline]
    pub(crate) fn head(&self, bucket: usize) -> Option<EntryId> {
        self.buckets[bucket]
    }

    /// Releases the bucket array. The caller is responsible for the entries.
    pub(crate) fn reset(&mut self) {
        *self = Table::default();
    }

    /// Address of the bucket array, used for fingerprinting.
    pub(crate) fn addr(&self) -> usize {
        self.buckets.as_ptr() as usize
    }
}

/// Smallest power of two that is at least `size`, and at least
/// [`INITIAL_SIZE`].
pub(crate) fn next_power(size: usize) -> usize {
    if size >= MAX_SIZE {
        return MAX_SIZE;
    }
    size.max(INITIAL_SIZE).next_power_of_two()
}
