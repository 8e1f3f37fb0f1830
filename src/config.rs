//! Resize policy and tuning knobs.

use core::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

/// Shared switch that allows or forbids voluntary resizing.
///
/// Clones share the same switch, so a host can hand one policy to every
/// dictionary it owns and flip them together, for example while a
/// copy-on-write snapshot of the process is being written. Growth still
/// happens while disabled once a table's load factor exceeds
/// [`DictConfig::force_resize_ratio`].
#[derive(Debug, Clone)]
pub struct ResizePolicy {
    enabled: Rc<Cell<bool>>,
}

impl ResizePolicy {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled: Rc::new(Cell::new(enabled)),
        }
    }

    pub fn enable(&self) {
        self.enabled.set(true);
    }

    pub fn disable(&self) {
        self.enabled.set(false);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.get()
    }
}

impl Default for ResizePolicy {
    fn default() -> Self {
        Self::new(true)
    }
}

/// Per-dictionary configuration.
#[derive(Debug, Clone)]
pub struct DictConfig {
    /// Whether voluntary growth and shrinking are currently allowed.
    pub resize: ResizePolicy,
    /// `used / size` ratio above which the table grows even when `resize` is
    /// disabled.
    pub force_resize_ratio: usize,
    /// Fill percentage under which [`Dict::needs_shrink`] reports true.
    ///
    /// [`Dict::needs_shrink`]: crate::Dict::needs_shrink
    pub min_fill_percent: usize,
    /// Empty buckets a rehash step may skip per non-empty bucket it is asked
    /// to migrate.
    pub rehash_empty_visits: usize,
}

impl DictConfig {
    pub const DEFAULT_FORCE_RESIZE_RATIO: usize = 5;
    pub const DEFAULT_MIN_FILL_PERCENT: usize = 10;
    pub const DEFAULT_REHASH_EMPTY_VISITS: usize = 10;

    pub fn with_resize_policy(mut self, resize: ResizePolicy) -> Self {
        self.resize = resize;
        self
    }

    pub fn with_force_resize_ratio(mut self, ratio: usize) -> Self {
        self.force_resize_ratio = ratio;
        self
    }

    pub fn with_min_fill_percent(mut self, percent: usize) -> Self {
        self.min_fill_percent = percent;
        self
    }

    pub fn with_rehash_empty_visits(mut self, visits: usize) -> Self {
        self.rehash_empty_visits = visits.max(1);
        self
    }
}

impl Default for DictConfig {
    fn default() -> Self {
        Self {
            resize: ResizePolicy::default(),
            force_resize_ratio: Self::DEFAULT_FORCE_RESIZE_RATIO,
            min_fill_percent: Self::DEFAULT_MIN_FILL_PERCENT,
            rehash_empty_visits: Self::DEFAULT_REHASH_EMPTY_VISITS,
        }
    }
}

/// Settings for [`Maintenance`](crate::Maintenance).
#[derive(Debug, Clone)]
pub struct MaintenanceConfig {
    /// Time each rehashing dictionary may spend migrating buckets per tick.
    pub rehash_budget: Duration,
    /// Whether ticks shrink underutilized dictionaries.
    pub shrink: bool,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            rehash_budget: Duration::from_millis(1),
            shrink: true,
        }
    }
}
