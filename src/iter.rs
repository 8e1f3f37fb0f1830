//! Iteration over a dictionary.
//!
//! [`Iter`] is the ordinary borrowing iterator: while it lives the dictionary
//! cannot be touched, so nothing can go wrong.
//!
//! [`DictIterator`] is a detached cursor for callers that need to interleave
//! iteration with other calls on the same dictionary. It comes in two modes:
//!
//! - *safe* ([`Dict::safe_iterator`]): the dictionary counts it as live and
//!   pauses incremental rehashing until it is released, so the caller may
//!   add, look up and remove entries between steps. Removing the entry just
//!   returned is always fine; every entry present for the whole iteration is
//!   returned exactly once.
//! - *unsafe* ([`Dict::iterator`]): only [`DictIterator::next`] may be called
//!   until release. A fingerprint of the table layout is taken at creation
//!   and compared on release, which reports misuse as
//!   [`DictError::ConcurrentModification`].
//!
//! A cursor must be handed back with [`DictIterator::release`]; dropping it
//! unreleased panics.

use crate::dict::Dict;
use crate::dict_type::DictType;
use crate::error::DictError;
use crate::hash::fold_mix64;
use crate::table::{Entry, EntryId};
use log::error;

/// Borrowing iterator over `(key, value)` pairs, in no particular order.
pub struct Iter<'a, T: DictType> {
    it: slotmap::basic::Iter<'a, EntryId, Entry<T::Key, T::Value>>,
}

impl<'a, T: DictType> Iter<'a, T> {
    pub(crate) fn new(dict: &'a Dict<T>) -> Self {
        Self {
            it: dict.entries.iter(),
        }
    }
}

impl<'a, T: DictType> Iterator for Iter<'a, T> {
    type Item = (&'a T::Key, &'a T::Value);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|(_, e)| (e.key(), e.value()))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<'a, T: DictType> IntoIterator for &'a Dict<T> {
    type Item = (&'a T::Key, &'a T::Value);
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Cursor walking table 0 bucket by bucket, then table 1 when a rehash is
/// in progress.
#[derive(Debug)]
pub struct DictIterator {
    table: usize,
    /// Bucket being walked; `None` before the first step.
    bucket: Option<usize>,
    current: Option<EntryId>,
    /// Successor of `current`, read before `current` is handed out so the
    /// caller may remove it.
    next: Option<EntryId>,
    /// Entries of the current bucket already handed out by a safe cursor.
    yielded: Vec<EntryId>,
    safe: bool,
    fingerprint: u64,
    released: bool,
}

impl DictIterator {
    fn new(safe: bool, fingerprint: u64) -> Self {
        Self {
            table: 0,
            bucket: None,
            current: None,
            next: None,
            yielded: Vec::new(),
            safe,
            fingerprint,
            released: false,
        }
    }

    pub fn is_safe(&self) -> bool {
        self.safe
    }

    /// Id of the next entry, or `None` once both tables are exhausted.
    ///
    /// If the prefetched successor was removed since the previous step the
    /// current bucket is walked again from its head and the first entry not
    /// yet returned comes next.
    pub fn next<T: DictType>(&mut self, dict: &Dict<T>) -> Option<EntryId> {
        loop {
            if self.current.is_some() {
                let mut cand = match self.next {
                    Some(id) if dict.entries.contains_key(id) => Some(id),
                    Some(_) => self.bucket_head(dict),
                    None => None,
                };
                // a re-walk can surface a newer head whose successors were
                // already returned
                while let Some(id) = cand.filter(|id| self.yielded.contains(id)) {
                    cand = dict.entries.get(id).and_then(|e| e.next);
                }
                self.current = cand;
            }
            if self.current.is_none() {
                let bucket = self.bucket.map_or(0, |b| b + 1);
                let table = &dict.tables[self.table];
                self.yielded.clear();
                // bounds are re-read every step; a clear may have shrunk them
                if bucket >= table.size() {
                    if self.table == 0 && dict.is_rehashing() {
                        self.table = 1;
                        self.bucket = None;
                        continue;
                    }
                    return None;
                }
                self.bucket = Some(bucket);
                self.current = table.head(bucket);
            }
            if let Some(id) = self.current {
                self.next = dict.entries.get(id).and_then(|e| e.next);
                if self.safe {
                    self.yielded.push(id);
                }
                return Some(id);
            }
        }
    }

    // Rehashing is paused and insertions prepend, so the entries left in the
    // bucket keep their relative order.
    fn bucket_head<T: DictType>(&self, dict: &Dict<T>) -> Option<EntryId> {
        let bucket = self.bucket?;
        let table = &dict.tables[self.table];
        if bucket >= table.size() {
            return None;
        }
        table.head(bucket)
    }

    /// Like [`DictIterator::next`] but returns the entry itself.
    pub fn next_entry<'a, T: DictType>(
        &mut self,
        dict: &'a Dict<T>,
    ) -> Option<&'a Entry<T::Key, T::Value>> {
        loop {
            let id = self.next(dict)?;
            if let Some(e) = dict.entries.get(id) {
                return Some(e);
            }
        }
    }

    /// Hands the cursor back. Safe cursors resume rehashing once the last one
    /// is released; unsafe cursors verify the dictionary was not modified.
    pub fn release<T: DictType>(mut self, dict: &mut Dict<T>) -> Result<(), DictError> {
        self.released = true;
        if self.safe {
            dict.safe_iterators = dict.safe_iterators.saturating_sub(1);
            return Ok(());
        }
        let found = dict.fingerprint();
        if found != self.fingerprint {
            error!(
                "dict modified during unsafe iteration: fingerprint {:#x} != {:#x}",
                found, self.fingerprint
            );
            return Err(DictError::ConcurrentModification {
                expected: self.fingerprint,
                found,
            });
        }
        Ok(())
    }
}

impl Drop for DictIterator {
    fn drop(&mut self) {
        if !self.released && !std::thread::panicking() {
            panic!("DictIterator dropped without release");
        }
    }
}

impl<T: DictType> Dict<T> {
    /// Unsafe-mode cursor: only [`DictIterator::next`] may be called on the
    /// dictionary until the cursor is released.
    pub fn iterator(&self) -> DictIterator {
        DictIterator::new(false, self.fingerprint())
    }

    /// Safe-mode cursor: the dictionary may be modified between steps.
    /// Rehashing is paused until the cursor is released.
    pub fn safe_iterator(&mut self) -> DictIterator {
        self.safe_iterators += 1;
        DictIterator::new(true, self.fingerprint())
    }

    /// Checksum of the table layout: both bucket arrays' addresses, sizes and
    /// used counts plus the rehash cursor. Any insertion, removal or rehash
    /// step changes it. Best effort: a sequence of changes that restores all
    /// of these goes unnoticed.
    pub fn fingerprint(&self) -> u64 {
        let [t0, t1] = &self.tables;
        fold_mix64(&[
            self.rehash_idx.map_or(u64::MAX, |i| i as u64),
            t0.addr() as u64,
            t0.size() as u64,
            t0.used as u64,
            t1.addr() as u64,
            t1.size() as u64,
            t1.used as u64,
        ])
    }
}
