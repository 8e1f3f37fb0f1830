//! Chain length statistics for diagnosing hash quality.

use crate::dict::Dict;
use crate::dict_type::DictType;
use crate::table::Table;
use core::fmt;

/// Histogram length; the last slot counts chains of this length minus one
/// or longer.
pub const CHAIN_HISTOGRAM_LEN: usize = 50;

/// Statistics of one allocated table.
#[derive(Debug, Clone, PartialEq)]
pub struct TableStats {
    /// `0` for the active table, `1` for the rehash target.
    pub table: usize,
    pub size: usize,
    pub used: usize,
    pub non_empty_buckets: usize,
    pub max_chain: usize,
    /// Sum of chain lengths over non-empty buckets.
    pub total_chain: usize,
    /// `histogram[n]` is the number of buckets holding `n` entries.
    pub histogram: [usize; CHAIN_HISTOGRAM_LEN],
}

impl TableStats {
    fn collect<T: DictType>(dict: &Dict<T>, index: usize, table: &Table) -> Self {
        let mut stats = TableStats {
            table: index,
            size: table.size(),
            used: table.used,
            non_empty_buckets: 0,
            max_chain: 0,
            total_chain: 0,
            histogram: [0; CHAIN_HISTOGRAM_LEN],
        };
        for bucket in 0..table.size() {
            let mut len = 0;
            let mut cur = table.head(bucket);
            while let Some(id) = cur {
                len += 1;
                cur = dict.entries[id].next;
            }
            stats.histogram[len.min(CHAIN_HISTOGRAM_LEN - 1)] += 1;
            if len > 0 {
                stats.non_empty_buckets += 1;
                stats.total_chain += len;
                stats.max_chain = stats.max_chain.max(len);
            }
        }
        stats
    }

    /// Mean length of the non-empty chains, as walked.
    pub fn avg_chain_counted(&self) -> f64 {
        if self.non_empty_buckets == 0 {
            return 0.0;
        }
        self.total_chain as f64 / self.non_empty_buckets as f64
    }

    /// Mean length of the non-empty chains, from the used counter.
    pub fn avg_chain_computed(&self) -> f64 {
        if self.non_empty_buckets == 0 {
            return 0.0;
        }
        self.used as f64 / self.non_empty_buckets as f64
    }
}

impl fmt::Display for TableStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let title = if self.table == 0 {
            "main hash table"
        } else {
            "rehashing target"
        };
        writeln!(f, "Hash table {} stats ({}):", self.table, title)?;
        if self.used == 0 {
            return writeln!(f, " No stats available for empty dictionaries");
        }
        writeln!(f, " table size: {}", self.size)?;
        writeln!(f, " number of elements: {}", self.used)?;
        writeln!(f, " different slots: {}", self.non_empty_buckets)?;
        writeln!(f, " max chain length: {}", self.max_chain)?;
        writeln!(f, " avg chain length (counted): {:.2}", self.avg_chain_counted())?;
        writeln!(f, " avg chain length (computed): {:.2}", self.avg_chain_computed())?;
        writeln!(f, " Chain length distribution:")?;
        for (len, &count) in self.histogram.iter().enumerate() {
            if count == 0 {
                continue;
            }
            let pct = count as f64 * 100.0 / self.size as f64;
            let marker = if len == CHAIN_HISTOGRAM_LEN - 1 { "+" } else { "" };
            writeln!(f, "   {}{}: {} ({:.2}%)", len, marker, count, pct)?;
        }
        Ok(())
    }
}

/// Statistics of every allocated table of a dictionary.
#[derive(Debug, Clone, PartialEq)]
pub struct DictStats {
    pub tables: Vec<TableStats>,
}

impl fmt::Display for DictStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.tables.is_empty() {
            return writeln!(f, "No stats available for empty dictionaries");
        }
        for t in &self.tables {
            write!(f, "{}", t)?;
        }
        Ok(())
    }
}

impl<T: DictType> Dict<T> {
    /// Walks every allocated table and reports its chain statistics.
    pub fn stats(&self) -> DictStats {
        let tables = self
            .tables
            .iter()
            .enumerate()
            .filter(|(_, t)| t.is_allocated())
            .map(|(i, t)| TableStats::collect(self, i, t))
            .collect();
        DictStats { tables }
    }
}
