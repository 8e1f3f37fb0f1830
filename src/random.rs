//! Random sampling of entries.
//!
//! Neither operation is uniform over entries: a bucket is picked first and
//! then an element of its chain, so entries in long chains are less likely
//! to come up. That is good enough for eviction sampling, which is the use
//! these exist for.

use crate::dict::Dict;
use crate::dict_type::DictType;
use crate::table::{Entry, EntryId};
use hashbrown::HashSet;
use rand::Rng;

/// A run of empty buckets at least this long (and longer than the requested
/// count) makes [`Dict::sample_entries`] jump to a new random position.
const EMPTY_RUN_JUMP: usize = 5;

impl<T: DictType> Dict<T> {
    /// A random entry, or `None` when the dictionary is empty.
    pub fn random_entry(&mut self) -> Option<&Entry<T::Key, T::Value>> {
        self.random_entry_with(&mut rand::thread_rng())
    }

    /// [`Dict::random_entry`] drawing from the given generator.
    pub fn random_entry_with<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
    ) -> Option<&Entry<T::Key, T::Value>> {
        if self.is_empty() {
            return None;
        }
        self.rehash_step_if_needed();

        let head = match self.rehash_idx {
            Some(idx) => {
                // buckets below idx in table 0 are already migrated
                let s0 = self.tables[0].size();
                let slots = s0 + self.tables[1].size();
                loop {
                    let h = rng.gen_range(idx..slots);
                    let head = if h >= s0 {
                        self.tables[1].head(h - s0)
                    } else {
                        self.tables[0].head(h)
                    };
                    if head.is_some() {
                        break head;
                    }
                }
            }
            None => {
                let t = &self.tables[0];
                loop {
                    let head = t.head(rng.gen::<usize>() & t.size_mask);
                    if head.is_some() {
                        break head;
                    }
                }
            }
        };

        let mut len = 0;
        let mut cur = head;
        while let Some(id) = cur {
            len += 1;
            cur = self.entries[id].next;
        }
        let mut pick = rng.gen_range(0..len);
        let mut cur = head;
        while let Some(id) = cur {
            if pick == 0 {
                return self.entries.get(id);
            }
            pick -= 1;
            cur = self.entries[id].next;
        }
        None
    }

    /// Up to `count` distinct entries gathered from a random position.
    ///
    /// Walks consecutive buckets of both tables, visiting at most
    /// `count * 10` positions, so it may return fewer entries than asked for
    /// even when the dictionary holds more.
    pub fn sample_entries(&mut self, count: usize) -> Vec<EntryId> {
        self.sample_entries_with(&mut rand::thread_rng(), count)
    }

    /// [`Dict::sample_entries`] drawing from the given generator.
    pub fn sample_entries_with<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        count: usize,
    ) -> Vec<EntryId> {
        let count = count.min(self.len());
        if count == 0 {
            return Vec::new();
        }
        for _ in 0..count {
            if !self.is_rehashing() {
                break;
            }
            self.rehash_step_if_needed();
        }

        let tables = if self.is_rehashing() { 2 } else { 1 };
        let rehash_idx = self.rehash_idx.unwrap_or(0);
        let mask = self.tables[0].size_mask.max(self.tables[1].size_mask);
        let mut steps = count.saturating_mul(10);
        let mut i = rng.gen::<usize>() & mask;
        let mut empty_run = 0;
        let mut seen = HashSet::with_capacity(count);
        let mut out = Vec::with_capacity(count);

        while out.len() < count && steps > 0 {
            steps -= 1;
            for t in 0..tables {
                if tables == 2 && t == 0 && i < rehash_idx {
                    // already migrated; when table 1 is too small to hold
                    // this index either, resume from the rehash position
                    if i >= self.tables[1].size() {
                        i = rehash_idx;
                    } else {
                        continue;
                    }
                }
                let table = &self.tables[t];
                if i >= table.size() {
                    continue;
                }
                let mut cur = table.head(i);
                if cur.is_none() {
                    empty_run += 1;
                    if empty_run >= EMPTY_RUN_JUMP && empty_run > count {
                        i = rng.gen::<usize>() & mask;
                        empty_run = 0;
                    }
                    continue;
                }
                empty_run = 0;
                while let Some(id) = cur {
                    if seen.insert(id) {
                        out.push(id);
                        if out.len() == count {
                            return out;
                        }
                    }
                    cur = self.entries[id].next;
                }
            }
            i = (i + 1) & mask;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use crate::dict_type::IntType;
    use crate::Dict;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn filled(n: u32) -> Dict<IntType<u32>> {
        let mut d = Dict::new(());
        for k in 0..n {
            d.add(k, k + 1).unwrap();
        }
        d
    }

    #[test]
    fn random_entry_on_empty_is_none() {
        let mut d: Dict<IntType<u32>> = Dict::new(());
        assert!(d.random_entry().is_none());
    }

    #[test]
    fn random_entry_returns_present_keys() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut d = filled(200);
        for _ in 0..500 {
            let e = d.random_entry_with(&mut rng).unwrap();
            let (k, v) = (*e.key(), *e.value());
            assert!(k < 200);
            assert_eq!(v, k + 1);
        }
    }

    /// Invariant: Sampling during a rehash only returns live entries and
    /// never looks at the migrated prefix of table 0.
    #[test]
    fn random_entry_during_rehash() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut d = filled(64);
        while d.rehash(100) {}
        d.expand(1024).unwrap();
        d.rehash(10);
        assert!(d.is_rehashing());
        for _ in 0..100 {
            assert!(d.random_entry_with(&mut rng).is_some());
        }
        d.assert_invariants();
    }

    #[test]
    fn single_entry_is_always_chosen() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut d = filled(1);
        for _ in 0..20 {
            assert_eq!(d.random_entry_with(&mut rng).map(|e| *e.key()), Some(0));
        }
    }

    /// Invariant: Samples are distinct, present, and never more than asked.
    #[test]
    fn sample_entries_distinct_and_bounded() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut d = filled(500);
        for count in [1, 5, 16, 100] {
            let ids = d.sample_entries_with(&mut rng, count);
            assert!(ids.len() <= count);
            if count >= 16 {
                assert!(!ids.is_empty());
            }
            let mut keys: Vec<u32> = ids.iter().map(|id| *d.entry(*id).unwrap().key()).collect();
            keys.sort_unstable();
            keys.dedup();
            assert_eq!(keys.len(), ids.len());
        }
    }

    #[test]
    fn sample_more_than_len_is_capped() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut d = filled(3);
        while d.rehash(100) {}
        let ids = d.sample_entries_with(&mut rng, 50);
        assert!(ids.len() <= 3);
        let mut empty: Dict<IntType<u32>> = Dict::new(());
        assert!(empty.sample_entries(4).is_empty());
    }

    #[test]
    fn sample_entries_during_rehash() {
        let mut rng = StdRng::seed_from_u64(99);
        let mut d = filled(300);
        while d.rehash(100) {}
        d.expand(4096).unwrap();
        d.rehash(20);
        for _ in 0..50 {
            let ids = d.sample_entries_with(&mut rng, 10);
            assert!(ids.len() <= 10);
            assert!(ids.iter().all(|id| d.entry(*id).is_some()));
        }
        d.assert_invariants();
    }
}
