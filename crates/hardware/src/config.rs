//! Configuration system for the memory hierarchy simulator.
//!
//! This module defines all configuration structures used to parameterize the
//! simulator. It provides:
//! 1. **Defaults:** Baseline hardware constants (TLBs, PWCs, caches, page
//!    table geometry, physical memory).
//! 2. **Structures:** Hierarchical config for memory, TLB, PWC, cache, and
//!    page-table settings.
//! 3. **Validation:** Structural invariants checked once at construction —
//!    power-of-two entry counts, the 48-bit shift invariant, TOC sizing, and
//!    allocator compatibility.
//!
//! Configuration is supplied by the CLI flags or deserialized from JSON; use
//! `Config::default()` as the baseline.

use serde::Deserialize;

use crate::common::constants::{PAGE_SIZE, PAGE_SHIFT, PWC_HIGH_BIT, VADDR_BITS};
use crate::common::{SimError, SimResult};

/// Default configuration constants for the simulator.
mod defaults {
    /// Physical memory size in GiB.
    pub const PHYS_MEM_GB: u64 = 1;

    /// Records per processing batch.
    pub const BATCH_SIZE: usize = 4096;

    /// Seed for the tiny-pointer hash pair.
    pub const TINY_PTR_SEED: u64 = 0x9E37_79B9_7F4A_7C15;

    /// L1 TLB entry count.
    pub const L1_TLB_ENTRIES: u64 = 64;

    /// L1 TLB associativity.
    pub const L1_TLB_WAYS: u64 = 4;

    /// L2 TLB entry count.
    pub const L2_TLB_ENTRIES: u64 = 1024;

    /// L2 TLB associativity.
    pub const L2_TLB_WAYS: u64 = 8;

    /// Page-walk cache entry count (per level).
    pub const PWC_ENTRIES: u64 = 16;

    /// Page-walk cache associativity (per level).
    pub const PWC_WAYS: u64 = 4;

    /// L1 data cache size in bytes (32 KiB).
    pub const L1_CACHE_BYTES: u64 = 32 * 1024;

    /// L1 data cache associativity.
    pub const L1_CACHE_WAYS: u64 = 8;

    /// L2 data cache size in bytes (256 KiB).
    pub const L2_CACHE_BYTES: u64 = 256 * 1024;

    /// L2 data cache associativity.
    pub const L2_CACHE_WAYS: u64 = 16;

    /// L3 data cache size in bytes (8 MiB).
    pub const L3_CACHE_BYTES: u64 = 8 * 1024 * 1024;

    /// L3 data cache associativity.
    pub const L3_CACHE_WAYS: u64 = 16;

    /// Cache line size in bytes (all levels).
    pub const CACHE_LINE_BYTES: u64 = 64;

    /// Entries per page-table level.
    pub const PT_ENTRIES: u64 = 512;
}

/// Physical-frame allocator implementations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AllocatorKind {
    /// Monotonic next-frame allocator.
    #[default]
    Linear,
    /// Power-of-two-choices bin allocator producing tiny pointers.
    #[serde(alias = "tiny_ptr", alias = "tiny")]
    TinyPtr,
}

/// Root configuration structure containing all simulator settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Physical memory and batching.
    #[serde(default)]
    pub memory: MemoryConfig,
    /// Two-level TLB sizing.
    #[serde(default)]
    pub tlb: TlbConfig,
    /// Per-level page-walk cache sizing.
    #[serde(default)]
    pub pwc: PwcConfig,
    /// Data-cache hierarchy sizing.
    #[serde(default)]
    pub cache: CacheHierarchyConfig,
    /// Page-table geometry and walk options.
    #[serde(default)]
    pub page_table: PageTableConfig,
}

/// Physical memory and trace-batching configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MemoryConfig {
    /// Physical memory size in GiB.
    #[serde(default = "MemoryConfig::default_phys_mem_gb")]
    pub phys_mem_gb: u64,

    /// Number of trace records processed per batch.
    #[serde(default = "MemoryConfig::default_batch_size")]
    pub batch_size: usize,

    /// Frame allocator variant.
    #[serde(default)]
    pub allocator: AllocatorKind,

    /// Seed for the tiny-pointer hash pair; the second hash derives from it.
    #[serde(default = "MemoryConfig::default_seed")]
    pub seed: u64,
}

impl MemoryConfig {
    fn default_phys_mem_gb() -> u64 {
        defaults::PHYS_MEM_GB
    }

    fn default_batch_size() -> usize {
        defaults::BATCH_SIZE
    }

    fn default_seed() -> u64 {
        defaults::TINY_PTR_SEED
    }

    /// Physical memory size in bytes.
    pub fn phys_mem_bytes(&self) -> u64 {
        self.phys_mem_gb << 30
    }

    /// The two hash seeds used by the tiny-pointer allocator.
    pub fn hash_seeds(&self) -> [u64; 2] {
        [self.seed, self.seed ^ 0xA5A5_A5A5_A5A5_A5A5]
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            phys_mem_gb: defaults::PHYS_MEM_GB,
            batch_size: defaults::BATCH_SIZE,
            allocator: AllocatorKind::default(),
            seed: defaults::TINY_PTR_SEED,
        }
    }
}

/// Two-level TLB configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct TlbConfig {
    /// L1 TLB entry count.
    #[serde(default = "TlbConfig::default_l1_entries")]
    pub l1_entries: u64,

    /// L1 TLB associativity.
    #[serde(default = "TlbConfig::default_l1_ways")]
    pub l1_ways: u64,

    /// L2 TLB entry count.
    #[serde(default = "TlbConfig::default_l2_entries")]
    pub l2_entries: u64,

    /// L2 TLB associativity.
    #[serde(default = "TlbConfig::default_l2_ways")]
    pub l2_ways: u64,
}

impl TlbConfig {
    fn default_l1_entries() -> u64 {
        defaults::L1_TLB_ENTRIES
    }

    fn default_l1_ways() -> u64 {
        defaults::L1_TLB_WAYS
    }

    fn default_l2_entries() -> u64 {
        defaults::L2_TLB_ENTRIES
    }

    fn default_l2_ways() -> u64 {
        defaults::L2_TLB_WAYS
    }
}

impl Default for TlbConfig {
    fn default() -> Self {
        Self {
            l1_entries: defaults::L1_TLB_ENTRIES,
            l1_ways: defaults::L1_TLB_WAYS,
            l2_entries: defaults::L2_TLB_ENTRIES,
            l2_ways: defaults::L2_TLB_WAYS,
        }
    }
}

/// Per-level page-walk cache configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PwcConfig {
    /// PGD-level PWC entry count.
    #[serde(default = "PwcConfig::default_entries")]
    pub pgd_entries: u64,

    /// PGD-level PWC associativity.
    #[serde(default = "PwcConfig::default_ways")]
    pub pgd_ways: u64,

    /// PUD-level PWC entry count.
    #[serde(default = "PwcConfig::default_entries")]
    pub pud_entries: u64,

    /// PUD-level PWC associativity.
    #[serde(default = "PwcConfig::default_ways")]
    pub pud_ways: u64,

    /// PMD-level PWC entry count.
    #[serde(default = "PwcConfig::default_entries")]
    pub pmd_entries: u64,

    /// PMD-level PWC associativity.
    #[serde(default = "PwcConfig::default_ways")]
    pub pmd_ways: u64,
}

impl PwcConfig {
    fn default_entries() -> u64 {
        defaults::PWC_ENTRIES
    }

    fn default_ways() -> u64 {
        defaults::PWC_WAYS
    }
}

impl Default for PwcConfig {
    fn default() -> Self {
        Self {
            pgd_entries: defaults::PWC_ENTRIES,
            pgd_ways: defaults::PWC_WAYS,
            pud_entries: defaults::PWC_ENTRIES,
            pud_ways: defaults::PWC_WAYS,
            pmd_entries: defaults::PWC_ENTRIES,
            pmd_ways: defaults::PWC_WAYS,
        }
    }
}

/// One data-cache level.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheLevelConfig {
    /// Total cache size in bytes.
    pub size_bytes: u64,
    /// Associativity (number of ways).
    pub ways: u64,
    /// Cache line size in bytes.
    pub line_bytes: u64,
}

impl CacheLevelConfig {
    /// `(size, ways, line)` triple for hierarchy construction.
    pub fn as_tuple(&self) -> (u64, u64, u64) {
        (self.size_bytes, self.ways, self.line_bytes)
    }
}

/// Data-cache hierarchy configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheHierarchyConfig {
    /// L1 data cache.
    #[serde(default = "CacheHierarchyConfig::default_l1")]
    pub l1: CacheLevelConfig,
    /// Unified L2 cache.
    #[serde(default = "CacheHierarchyConfig::default_l2")]
    pub l2: CacheLevelConfig,
    /// Unified L3 cache.
    #[serde(default = "CacheHierarchyConfig::default_l3")]
    pub l3: CacheLevelConfig,
}

impl CacheHierarchyConfig {
    fn default_l1() -> CacheLevelConfig {
        CacheLevelConfig {
            size_bytes: defaults::L1_CACHE_BYTES,
            ways: defaults::L1_CACHE_WAYS,
            line_bytes: defaults::CACHE_LINE_BYTES,
        }
    }

    fn default_l2() -> CacheLevelConfig {
        CacheLevelConfig {
            size_bytes: defaults::L2_CACHE_BYTES,
            ways: defaults::L2_CACHE_WAYS,
            line_bytes: defaults::CACHE_LINE_BYTES,
        }
    }

    fn default_l3() -> CacheLevelConfig {
        CacheLevelConfig {
            size_bytes: defaults::L3_CACHE_BYTES,
            ways: defaults::L3_CACHE_WAYS,
            line_bytes: defaults::CACHE_LINE_BYTES,
        }
    }
}

impl Default for CacheHierarchyConfig {
    fn default() -> Self {
        Self {
            l1: Self::default_l1(),
            l2: Self::default_l2(),
            l3: Self::default_l3(),
        }
    }
}

/// Page-table geometry and walk options.
#[derive(Debug, Clone, Deserialize)]
pub struct PageTableConfig {
    /// Whether page-table entry fetches go through the data caches.
    #[serde(default)]
    pub pte_cachable: bool,

    /// Whether the page-walk caches use Table-of-Contents sub-indexing.
    #[serde(default)]
    pub toc_enabled: bool,

    /// TOC sub-entries per way; must be a power of two when enabled and zero
    /// when disabled.
    #[serde(default)]
    pub toc_size: u64,

    /// PGD entry count.
    #[serde(default = "PageTableConfig::default_entries")]
    pub pgd_entries: u64,

    /// PUD entry count.
    #[serde(default = "PageTableConfig::default_entries")]
    pub pud_entries: u64,

    /// PMD entry count.
    #[serde(default = "PageTableConfig::default_entries")]
    pub pmd_entries: u64,

    /// PTE entry count.
    #[serde(default = "PageTableConfig::default_entries")]
    pub pte_entries: u64,
}

impl PageTableConfig {
    fn default_entries() -> u64 {
        defaults::PT_ENTRIES
    }
}

impl Default for PageTableConfig {
    fn default() -> Self {
        Self {
            pte_cachable: false,
            toc_enabled: false,
            toc_size: 0,
            pgd_entries: defaults::PT_ENTRIES,
            pud_entries: defaults::PT_ENTRIES,
            pmd_entries: defaults::PT_ENTRIES,
            pte_entries: defaults::PT_ENTRIES,
        }
    }
}

impl Config {
    /// Checks every structural invariant the simulator relies on.
    ///
    /// Fails on: non-power-of-two entry counts, entry counts outside
    /// `1..=4096`, a broken 48-bit shift invariant, a root shift past the
    /// PWC tag range, TOC sizing violations, TOC bits overflowing the PGD
    /// tag range, and narrow page-table entries combined with the linear
    /// allocator.
    ///
    /// # Returns
    ///
    /// `Ok(())` when the configuration can be simulated, otherwise a
    /// `SimError::Config` naming the violated invariant. A configuration
    /// that passes here constructs without panicking.
    pub fn validate(&self) -> SimResult<()> {
        let pt = &self.page_table;
        let levels = [
            ("pgd", pt.pgd_entries),
            ("pud", pt.pud_entries),
            ("pmd", pt.pmd_entries),
            ("pte", pt.pte_entries),
        ];
        for (name, entries) in levels {
            if entries == 0 || !entries.is_power_of_two() {
                return Err(SimError::Config(format!(
                    "{}_size must be a power of two, got {}",
                    name, entries
                )));
            }
            if entries > PAGE_SIZE {
                return Err(SimError::Config(format!(
                    "{}_size must not exceed {} entries, got {}",
                    name, PAGE_SIZE, entries
                )));
            }
        }

        let pgd_shift = PAGE_SHIFT
            + pt.pte_entries.trailing_zeros()
            + pt.pmd_entries.trailing_zeros()
            + pt.pud_entries.trailing_zeros();
        if pgd_shift + pt.pgd_entries.trailing_zeros() != VADDR_BITS {
            return Err(SimError::Config(format!(
                "level entry counts must cover {} address bits, got {}",
                VADDR_BITS,
                pgd_shift + pt.pgd_entries.trailing_zeros()
            )));
        }

        // The PGD-level PWC tags address bits [pgd_shift..=47]; a root shift
        // past bit 47 leaves it nothing to tag.
        if pgd_shift > PWC_HIGH_BIT {
            return Err(SimError::Config(format!(
                "pud/pmd/pte entry counts push the root shift to bit {}, past the bit-{} PWC tag range",
                pgd_shift, PWC_HIGH_BIT
            )));
        }

        if pt.toc_enabled {
            if pt.toc_size == 0 || !pt.toc_size.is_power_of_two() {
                return Err(SimError::Config(format!(
                    "toc_size must be a power of two when TOC is enabled, got {}",
                    pt.toc_size
                )));
            }
            if pgd_shift + pt.toc_size.trailing_zeros() > PWC_HIGH_BIT {
                return Err(SimError::Config(format!(
                    "toc_size {} leaves no tag bits for the PGD-level PWC",
                    pt.toc_size
                )));
            }
        } else if pt.toc_size != 0 {
            return Err(SimError::Config(
                "toc_size must be zero when TOC is disabled".into(),
            ));
        }

        let narrow = pt.pud_entries > 512 || pt.pmd_entries > 512 || pt.pte_entries > 512;
        if narrow && self.memory.allocator != AllocatorKind::TinyPtr {
            return Err(SimError::Config(
                "narrow page-table entries require the tiny-pointer allocator".into(),
            ));
        }

        for (name, cache) in [
            ("l1", &self.cache.l1),
            ("l2", &self.cache.l2),
            ("l3", &self.cache.l3),
        ] {
            if cache.ways == 0
                || !cache.line_bytes.is_power_of_two()
                || cache.size_bytes < cache.ways * cache.line_bytes
            {
                return Err(SimError::Config(format!(
                    "{} cache geometry invalid: {} bytes, {} ways, {} byte lines",
                    name, cache.size_bytes, cache.ways, cache.line_bytes
                )));
            }
        }

        Ok(())
    }

    /// Writes a human-readable configuration summary.
    pub fn write_summary(&self, w: &mut dyn std::io::Write) -> std::io::Result<()> {
        writeln!(w, "Simulation Configuration:")?;
        writeln!(w, "========================")?;
        writeln!(w, "Physical Memory:     {} GB", self.memory.phys_mem_gb)?;
        writeln!(
            w,
            "L1 TLB:              {} entries, {}-way",
            self.tlb.l1_entries, self.tlb.l1_ways
        )?;
        writeln!(
            w,
            "L2 TLB:              {} entries, {}-way",
            self.tlb.l2_entries, self.tlb.l2_ways
        )?;
        writeln!(
            w,
            "PWC (PGD/PUD/PMD):   {}/{}/{} entries, {}/{}/{}-way",
            self.pwc.pgd_entries,
            self.pwc.pud_entries,
            self.pwc.pmd_entries,
            self.pwc.pgd_ways,
            self.pwc.pud_ways,
            self.pwc.pmd_ways
        )?;
        writeln!(
            w,
            "L1 Cache:            {}KB, {}-way, {}B line",
            self.cache.l1.size_bytes / 1024,
            self.cache.l1.ways,
            self.cache.l1.line_bytes
        )?;
        writeln!(
            w,
            "L2 Cache:            {}KB, {}-way, {}B line",
            self.cache.l2.size_bytes / 1024,
            self.cache.l2.ways,
            self.cache.l2.line_bytes
        )?;
        writeln!(
            w,
            "L3 Cache:            {}MB, {}-way, {}B line",
            self.cache.l3.size_bytes / (1024 * 1024),
            self.cache.l3.ways,
            self.cache.l3.line_bytes
        )?;
        writeln!(
            w,
            "Page Table:          {}/{}/{}/{} entries, pte_cachable={}, toc={}",
            self.page_table.pgd_entries,
            self.page_table.pud_entries,
            self.page_table.pmd_entries,
            self.page_table.pte_entries,
            self.page_table.pte_cachable,
            if self.page_table.toc_enabled {
                self.page_table.toc_size.to_string()
            } else {
                "off".to_string()
            }
        )?;
        writeln!(w)?;
        Ok(())
    }
}
