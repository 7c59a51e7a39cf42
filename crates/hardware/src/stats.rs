//! Translation statistics collection and reporting.
//!
//! This module tracks the counters produced by the translation engine. It
//! provides:
//! 1. **Path Breakdown:** One counter per translation path (L1/L2 TLB hit,
//!    PMD/PUD/PGD PWC hit, full walk); exactly one is incremented per
//!    reference and their sum equals the reference count.
//! 2. **Walk Memory Traffic:** Data-cache hits and misses for page-table
//!    entry fetches, and the walk's main-memory access count.
//! 3. **Per-Level Activity:** Accesses, table allocations, and entries used
//!    for each page-table level.

use std::io::{self, Write};

/// Counters for the six translation paths and the walk's cache traffic.
#[derive(Clone, Copy, Debug, Default)]
pub struct TranslationStats {
    /// Translations resolved by the L1 TLB.
    pub l1_tlb_hits: u64,
    /// Translations resolved by the L2 TLB.
    pub l2_tlb_hits: u64,
    /// Translations resolved by the PMD page-walk cache.
    pub pmd_pwc_hits: u64,
    /// Translations resolved by the PUD page-walk cache.
    pub pud_pwc_hits: u64,
    /// Translations resolved by the PGD page-walk cache.
    pub pgd_pwc_hits: u64,
    /// Translations that required a full four-level walk.
    pub full_walks: u64,
    /// Page-table entry fetches that hit in the data-cache hierarchy.
    pub pte_dcache_hits: u64,
    /// Page-table entry fetches that missed in the data-cache hierarchy.
    pub pte_dcache_misses: u64,
    /// Page-table entry fetches that went to main memory (every fetch when
    /// entries are not cacheable).
    pub page_walk_mem_accesses: u64,
}

impl TranslationStats {
    /// Total translations across all six paths.
    pub fn total_translations(&self) -> u64 {
        self.l1_tlb_hits
            + self.l2_tlb_hits
            + self.pmd_pwc_hits
            + self.pud_pwc_hits
            + self.pgd_pwc_hits
            + self.full_walks
    }

    /// Fraction of translations absorbed by either TLB level.
    pub fn tlb_efficiency(&self) -> f64 {
        let total = self.total_translations();
        if total > 0 {
            (self.l1_tlb_hits + self.l2_tlb_hits) as f64 / total as f64
        } else {
            0.0
        }
    }

    /// Hit ratio of page-table entry fetches in the data caches.
    pub fn pte_cache_hit_ratio(&self) -> f64 {
        let total = self.pte_dcache_hits + self.pte_dcache_misses;
        if total > 0 {
            self.pte_dcache_hits as f64 / total as f64
        } else {
            0.0
        }
    }

    /// Writes the translation-path breakdown table.
    pub fn write_summary(&self, w: &mut dyn Write) -> io::Result<()> {
        let total = self.total_translations();
        let pct = |count: u64| {
            if total > 0 {
                count as f64 / total as f64 * 100.0
            } else {
                0.0
            }
        };

        writeln!(w, "\nTranslation Statistics:")?;
        writeln!(w, "======================")?;
        writeln!(w, "{:<30}{:>15}{:>12}", "Path", "Count", "Percent")?;
        writeln!(w, "{}", "-".repeat(57))?;
        let rows = [
            ("L1 TLB Hits", self.l1_tlb_hits),
            ("L2 TLB Hits", self.l2_tlb_hits),
            ("PMD PWC Hits", self.pmd_pwc_hits),
            ("PUD PWC Hits", self.pud_pwc_hits),
            ("PGD PWC Hits", self.pgd_pwc_hits),
            ("Full Page Table Walks", self.full_walks),
        ];
        for (label, count) in rows {
            writeln!(w, "{:<30}{:>15}{:>11.2}%", label, count, pct(count))?;
        }
        writeln!(w, "{:<30}{:>15}", "Total Translations", total)?;
        writeln!(
            w,
            "{:<30}{:>14.2}%",
            "TLB Efficiency",
            self.tlb_efficiency() * 100.0
        )?;
        Ok(())
    }

    /// Writes the translation-path data-cache statistics.
    pub fn write_memory_stats(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(w, "\nCache Access Statistics (from Page Table):")?;
        writeln!(w, "=========================================")?;
        writeln!(
            w,
            "{:<35}{:>10}",
            "Page Table Entry data Cache Hits", self.pte_dcache_hits
        )?;
        writeln!(
            w,
            "{:<35}{:>10}",
            "Page Table Entry data Cache Misses", self.pte_dcache_misses
        )?;
        writeln!(
            w,
            "{:<35}{:>10}",
            "Page Walk Memory Accesses", self.page_walk_mem_accesses
        )?;
        writeln!(
            w,
            "{:<35}{:>9.2}%",
            "Page Table Entry Cache hits ratio",
            self.pte_cache_hit_ratio() * 100.0
        )?;
        Ok(())
    }
}

/// Activity counters for one page-table level.
#[derive(Clone, Copy, Debug)]
pub struct LevelStats {
    /// Display name of the level.
    pub name: &'static str,
    /// Entries per table at this level.
    pub capacity: u64,
    /// Entry fetches that reached memory at this level.
    pub accesses: u64,
    /// Tables allocated at this level.
    pub allocations: u64,
    /// Entries marked present at this level.
    pub entries: u64,
}

impl LevelStats {
    /// Creates zeroed counters for a level with `capacity` entries per table.
    pub fn new(name: &'static str, capacity: u64) -> Self {
        Self {
            name,
            capacity,
            accesses: 0,
            allocations: 0,
            entries: 0,
        }
    }

    /// Average fill percentage across all allocated tables of this level.
    pub fn avg_fill_pct(&self) -> f64 {
        if self.allocations > 0 {
            (self.entries as f64 / self.allocations as f64) / self.capacity as f64 * 100.0
        } else {
            0.0
        }
    }
}
