//! Error type shared by every dictionary operation.

use thiserror::Error;

/// Failure of a dictionary operation.
///
/// `KeyExists` and `KeyNotFound` are ordinary outcomes. `ConcurrentModification`
/// signals misuse of an unsafe iterator and should be treated as a bug in the
/// caller rather than handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DictError {
    /// `add` found the key already present.
    #[error("key already exists")]
    KeyExists,

    /// The key is not present in any live table.
    #[error("key not found")]
    KeyNotFound,

    /// A resize was requested while a rehash is still migrating entries.
    #[error("a rehash is already in progress")]
    Rehashing,

    /// `expand` asked for fewer buckets than there are live entries.
    #[error("cannot expand to {requested} buckets with {used} entries")]
    ExpandTooSmall {
        /// Requested number of buckets.
        requested: usize,
        /// Live entries in the active table.
        used: usize,
    },

    /// Shrinking is refused while the resize policy is disabled.
    #[error("resizing is disabled")]
    ResizeDisabled,

    /// The dictionary was mutated while an unsafe iterator was outstanding.
    #[error("dictionary modified during unsafe iteration (fingerprint {expected:#x} != {found:#x})")]
    ConcurrentModification {
        /// Fingerprint captured when the iterator was created.
        expected: u64,
        /// Fingerprint observed at release.
        found: u64,
    },
}
