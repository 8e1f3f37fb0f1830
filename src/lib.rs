//! rehash-dict: a single-owner, separately chained hash table that grows
//! and shrinks by rehashing incrementally instead of all at once.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: the key/value core of an in-memory database, where a resize must
//!   never stall the caller for time proportional to the table size.
//! - Layers:
//!   - `DictType`: a type-level descriptor of callbacks (hash, dup,
//!     compare, destroy) plus a context value the dictionary passes to
//!     every callback.
//!   - `Table`: a power-of-two array of bucket heads. Entries live in one
//!     `slotmap` arena per dictionary and chain through `EntryId` links.
//!   - `Dict<T>`: two tables and a rehash cursor. Table 0 is active; while
//!     rehashing, table 1 receives new entries and buckets migrate from 0
//!     to 1 a few at a time.
//!   - Iteration, sampling, scanning, statistics and periodic maintenance
//!     are built on top of `Dict` in their own modules.
//!
//! Constraints
//! - Single owner: every mutating or rehash-stepping call takes
//!   `&mut self`; there is no locking and no atomics.
//! - Keys are unique under the descriptor's comparison; `add` of a present
//!   key fails.
//! - Each entry stores the hash computed at insertion. Rehashing uses the
//!   stored hash and never calls back into the descriptor.
//! - Table sizes are zero (unallocated) or a power of two, at least 4.
//!
//! Growth and shrinking
//! - Before an insertion the table grows to twice the entry count once the
//!   new entry would bring the load factor to 1. A shared `ResizePolicy`
//!   can disable this; growth is then forced only past
//!   `DictConfig::force_resize_ratio`.
//! - Shrinking is never automatic: the owner calls `resize`, or
//!   `shrink_if_needed`, or lets `Maintenance` do it.
//! - Every lookup, insertion and removal migrates one bucket while a rehash
//!   is in progress. `rehash_for` spends a time budget on it explicitly.
//!
//! Iteration
//! - `iter()` borrows the dictionary.
//! - Detached `DictIterator` cursors allow interleaving. Safe cursors pause
//!   rehashing until released so removals of the returned entry are fine;
//!   unsafe cursors detect modification through a layout fingerprint.
//! - `scan` is a stateless cursor walk that reports every entry present
//!   for the whole scan even across resizes.
//!
//! Notes and non-goals
//! - No persistence, no concurrent access, no expiration.
//! - Allocation failure aborts through the global allocator.

mod config;
mod dict;
mod dict_proptest;
pub mod dict_type;
mod error;
pub mod hash;
mod iter;
mod maintenance;
mod random;
mod rehash;
mod scan;
mod stats;
mod table;

// Public surface
pub use config::{DictConfig, MaintenanceConfig, ResizePolicy};
pub use dict::{Dict, Replaced};
pub use dict_type::{BytesType, CaseInsensitiveType, DictType, IntType, StdType};
pub use error::DictError;
pub use iter::{DictIterator, Iter};
pub use maintenance::{Maintain, Maintenance, TickReport};
pub use stats::{DictStats, TableStats, CHAIN_HISTOGRAM_LEN};
pub use table::{Entry, EntryId};
