//! Periodic housekeeping for a set of dictionaries.
//!
//! Lazy rehashing only makes progress while a dictionary is being used. A
//! host that owns many dictionaries calls [`Maintenance::tick`] from its
//! periodic timer so idle dictionaries still finish their rehash and
//! underfilled ones give memory back.

use crate::config::MaintenanceConfig;
use crate::dict::Dict;
use crate::dict_type::DictType;
use log::debug;
use std::time::Duration;

/// Housekeeping operations a [`Maintenance`] tick needs, object safe so one
/// tick can cover dictionaries of different descriptor types.
pub trait Maintain {
    fn rehash_for(&mut self, budget: Duration) -> usize;
    fn shrink_if_needed(&mut self) -> bool;
    fn is_rehashing(&self) -> bool;
}

impl<T: DictType> Maintain for Dict<T> {
    #[inline]
    fn rehash_for(&mut self, budget: Duration) -> usize {
        Dict::rehash_for(self, budget)
    }

    #[inline]
    fn shrink_if_needed(&mut self) -> bool {
        Dict::shrink_if_needed(self)
    }

    #[inline]
    fn is_rehashing(&self) -> bool {
        Dict::is_rehashing(self)
    }
}

/// What one tick did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    /// Dictionaries that started shrinking.
    pub shrunk: usize,
    /// Dictionaries that received a rehash budget.
    pub rehashed: usize,
    /// Rehash steps performed across all dictionaries.
    pub steps: usize,
    /// Dictionaries still rehashing after the tick.
    pub pending: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Maintenance {
    config: MaintenanceConfig,
}

impl Maintenance {
    pub fn new(config: MaintenanceConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MaintenanceConfig {
        &self.config
    }

    /// Shrinks underfilled dictionaries (when enabled), then gives every
    /// rehashing one the configured time budget.
    pub fn tick(&self, dicts: &mut [&mut dyn Maintain]) -> TickReport {
        let mut report = TickReport::default();
        for d in dicts.iter_mut() {
            if self.config.shrink && d.shrink_if_needed() {
                report.shrunk += 1;
            }
            if d.is_rehashing() {
                report.rehashed += 1;
                report.steps += d.rehash_for(self.config.rehash_budget);
            }
            if d.is_rehashing() {
                report.pending += 1;
            }
        }
        if report.shrunk > 0 || report.rehashed > 0 {
            debug!(
                "maintenance tick: shrunk {}, rehashed {} ({} steps), pending {}",
                report.shrunk, report.rehashed, report.steps, report.pending
            );
        }
        report
    }
}
