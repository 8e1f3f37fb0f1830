//! Stateless cursor scan.
//!
//! The cursor is the bucket index with its bits reversed, incremented from
//! the high end. Because tables are powers of two, a bucket of a smaller
//! table maps to a fixed set of buckets of a larger one that all share the
//! same low bits, and advancing the reversed cursor visits each such set
//! contiguously. This is what lets a scan survive resizes between calls:
//! every entry present for the whole scan is reported at least once. Entries
//! may be reported more than once when the table shrinks in the middle.

use crate::dict::Dict;
use crate::dict_type::DictType;
use crate::table::Table;

/// Advances a reversed-bit cursor over the bits in `mask`.
#[inline]
fn next_cursor(mut v: u64, mask: u64) -> u64 {
    v |= !mask;
    v = v.reverse_bits();
    v = v.wrapping_add(1);
    v.reverse_bits()
}

impl<T: DictType> Dict<T> {
    /// Reports the entries of one bucket (or, while rehashing, of one bucket
    /// of the smaller table and all its expansions in the larger one) to `f`
    /// and returns the cursor for the next call.
    ///
    /// Start with cursor 0; the scan is complete when 0 is returned again.
    /// Does not advance a running rehash.
    pub fn scan<F>(&self, cursor: u64, mut f: F) -> u64
    where
        F: FnMut(&T::Key, &T::Value),
    {
        if self.is_empty() {
            return 0;
        }
        let mut v = cursor;

        if !self.is_rehashing() {
            let t0 = &self.tables[0];
            let m0 = t0.size_mask as u64;
            self.emit_bucket(t0, (v & m0) as usize, &mut f);
            return next_cursor(v, m0);
        }

        let (small, large) = if self.tables[0].size() <= self.tables[1].size() {
            (&self.tables[0], &self.tables[1])
        } else {
            (&self.tables[1], &self.tables[0])
        };
        let m0 = small.size_mask as u64;
        let m1 = large.size_mask as u64;

        self.emit_bucket(small, (v & m0) as usize, &mut f);
        loop {
            self.emit_bucket(large, (v & m1) as usize, &mut f);
            v = next_cursor(v, m1);
            if v & (m0 ^ m1) == 0 {
                break;
            }
        }
        v
    }

    fn emit_bucket<F>(&self, table: &Table, bucket: usize, f: &mut F)
    where
        F: FnMut(&T::Key, &T::Value),
    {
        let mut cur = table.head(bucket);
        while let Some(id) = cur {
            let e = &self.entries[id];
            f(e.key(), e.value());
            cur = e.next;
        }
    }
}
