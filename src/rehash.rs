//! Resize policy and incremental migration between the two tables.

use crate::dict::Dict;
use crate::dict_type::DictType;
use crate::error::DictError;
use crate::table::{next_power, Table, INITIAL_SIZE};
use log::{debug, trace, warn};
use std::time::{Duration, Instant};

/// Buckets migrated per batch by [`Dict::rehash_for`].
const REHASH_BATCH: usize = 100;

impl<T: DictType> Dict<T> {
    /// Grows or shrinks the dictionary towards the smallest power of two that
    /// holds `size` buckets.
    ///
    /// On a dictionary that has never been allocated this installs the
    /// active table directly. Otherwise it allocates the target table and
    /// starts an incremental rehash. Asking for the current size is a no-op.
    pub fn expand(&mut self, size: usize) -> Result<(), DictError> {
        if self.is_rehashing() {
            return Err(DictError::Rehashing);
        }
        let used = self.tables[0].used;
        if used > size {
            return Err(DictError::ExpandTooSmall {
                requested: size,
                used,
            });
        }
        let target = next_power(size);
        if target != self.tables[0].size() {
            self.start_resize(target);
        }
        Ok(())
    }

    /// Shrinks the active table to the smallest size that holds its entries,
    /// never below the minimum table size.
    pub fn resize(&mut self) -> Result<(), DictError> {
        if !self.config.resize.is_enabled() {
            return Err(DictError::ResizeDisabled);
        }
        if self.is_rehashing() {
            return Err(DictError::Rehashing);
        }
        if !self.tables[0].is_allocated() {
            return Ok(());
        }
        self.expand(self.tables[0].used.max(INITIAL_SIZE))
    }

    /// Whether the active table is large and mostly empty.
    pub fn needs_shrink(&self) -> bool {
        let size = self.tables[0].size();
        !self.is_rehashing()
            && size > INITIAL_SIZE
            && self.tables[0].used * 100 / size < self.config.min_fill_percent
    }

    /// Starts a shrink if [`Dict::needs_shrink`] and the resize policy
    /// allows it. Returns whether a shrink was started.
    pub fn shrink_if_needed(&mut self) -> bool {
        if !self.needs_shrink() {
            return false;
        }
        let from = self.tables[0].size();
        match self.resize() {
            Ok(()) => {
                debug!(
                    "shrinking dict from {} buckets ({} entries)",
                    from, self.tables[0].used
                );
                self.is_rehashing()
            }
            Err(_) => false,
        }
    }

    /// Migrates up to `n` non-empty buckets from table 0 to table 1.
    ///
    /// At most `n * rehash_empty_visits` empty buckets are skipped per call,
    /// so one call stays bounded even on a sparse table. Returns `true` while
    /// entries remain to be moved. While safe iterators are outstanding no
    /// work is done.
    pub fn rehash(&mut self, n: usize) -> bool {
        let Some(mut idx) = self.rehash_idx else {
            return false;
        };
        if self.safe_iterators > 0 {
            return true;
        }

        let mut empty_visits = n.saturating_mul(self.config.rehash_empty_visits);
        let mut n = n;
        while n > 0 && self.tables[0].used != 0 {
            n -= 1;
            // used != 0 guarantees a non-empty bucket at or after idx
            while self.tables[0].buckets[idx].is_none() {
                idx += 1;
                empty_visits = empty_visits.saturating_sub(1);
                if empty_visits == 0 {
                    self.rehash_idx = Some(idx);
                    return true;
                }
            }

            let mut cur = self.tables[0].buckets[idx].take();
            while let Some(id) = cur {
                let entry = &mut self.entries[id];
                cur = entry.next;
                let dst = self.tables[1].bucket_of(entry.hash());
                entry.next = self.tables[1].buckets[dst];
                self.tables[1].buckets[dst] = Some(id);
                self.tables[0].used -= 1;
                self.tables[1].used += 1;
            }
            idx += 1;
        }

        if self.tables[0].used == 0 {
            self.tables[0] = core::mem::take(&mut self.tables[1]);
            self.rehash_idx = None;
            debug!(
                "rehash complete: {} buckets, {} entries",
                self.tables[0].size(),
                self.tables[0].used
            );
            return false;
        }

        self.rehash_idx = Some(idx);
        true
    }

    /// Rehashes in batches until done or until `budget` has elapsed. Returns
    /// the number of bucket steps requested, counting the batch that finished
    /// the rehash.
    pub fn rehash_for(&mut self, budget: Duration) -> usize {
        if !self.is_rehashing() || self.safe_iterators > 0 {
            return 0;
        }
        let start = Instant::now();
        let mut steps = 0;
        loop {
            let more = self.rehash(REHASH_BATCH);
            steps += REHASH_BATCH;
            if !more || start.elapsed() >= budget {
                break;
            }
        }
        trace!(
            "rehashed {} steps in {:?}, rehashing: {}",
            steps,
            start.elapsed(),
            self.is_rehashing()
        );
        steps
    }

    /// Grows the table before an insertion when needed.
    ///
    /// The check counts the entry about to be inserted: a table grows on the
    /// insertion that would fill it. While resizing is disabled growth only
    /// happens once `used / size` exceeds the force ratio.
    pub(crate) fn expand_if_needed(&mut self) {
        if self.is_rehashing() {
            return;
        }
        let size = self.tables[0].size();
        if size == 0 {
            self.start_resize(INITIAL_SIZE);
            return;
        }
        let used = self.tables[0].used;
        let allowed = self.config.resize.is_enabled();
        let forced = used / size > self.config.force_resize_ratio;
        if used + 1 >= size && (allowed || forced) {
            if !allowed {
                warn!(
                    "forcing dict growth while resize is disabled: {} entries in {} buckets",
                    used, size
                );
            }
            self.start_resize(next_power(used.saturating_mul(2)));
        }
    }

    fn start_resize(&mut self, size: usize) {
        if !self.tables[0].is_allocated() {
            self.tables[0] = Table::with_size(size);
            return;
        }
        debug!(
            "rehash started: {} -> {} buckets ({} entries)",
            self.tables[0].size(),
            size,
            self.tables[0].used
        );
        self.tables[1] = Table::with_size(size);
        self.rehash_idx = Some(0);
    }
}
