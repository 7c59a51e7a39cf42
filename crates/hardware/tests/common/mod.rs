//! Shared test helpers.
//!
//! Small deterministic configurations used across the unit tests. The
//! defaults in `Config::default()` match the production baseline; the
//! builders here shrink individual structures so tests can force evictions
//! and capacity effects with a handful of references.

use memsim_core::config::{AllocatorKind, Config};

/// The production baseline: 512-entry levels, linear allocator,
/// non-cacheable entries.
pub fn default_config() -> Config {
    Config::default()
}

/// Baseline with tiny TLBs (L1: 4 entries 4-way, L2: 8 entries 8-way) so a
/// few references overflow them.
pub fn tiny_tlb_config() -> Config {
    let mut config = Config::default();
    config.tlb.l1_entries = 4;
    config.tlb.l1_ways = 4;
    config.tlb.l2_entries = 8;
    config.tlb.l2_ways = 8;
    config
}

/// Geometry with one level shrunk to a single entry and the other three at
/// 4096 so the 48 address bits stay covered. The 4096-entry levels force
/// 1-byte entries, so these run on the tiny-pointer allocator.
fn single_entry_level_config(pgd: u64, pud: u64, pmd: u64, pte: u64) -> Config {
    let mut config = Config::default();
    config.page_table.pgd_entries = pgd;
    config.page_table.pud_entries = pud;
    config.page_table.pmd_entries = pmd;
    config.page_table.pte_entries = pte;
    config.memory.allocator = AllocatorKind::TinyPtr;
    config
}

/// Single-entry PTE level: `4096/4096/4096/1`.
pub fn single_entry_pte_config() -> Config {
    single_entry_level_config(4096, 4096, 4096, 1)
}

/// Single-entry PMD level: `4096/4096/1/4096`.
pub fn single_entry_pmd_config() -> Config {
    single_entry_level_config(4096, 4096, 1, 4096)
}

/// Single-entry PUD level: `4096/1/4096/4096`.
pub fn single_entry_pud_config() -> Config {
    single_entry_level_config(4096, 1, 4096, 4096)
}

/// Single-entry PGD level: `1/4096/4096/4096`. The 48 bits are covered, but
/// the root shift lands on bit 48 — past the bit-47 PWC tag range — so this
/// geometry must be rejected at validation, not panic later.
pub fn single_entry_pgd_config() -> Config {
    single_entry_level_config(1, 4096, 4096, 4096)
}
