//! Configuration Unit Tests.
//!
//! Verifies defaults, JSON deserialization, and every validation failure
//! class: non-power-of-two entry counts, the 48-bit shift invariant, TOC
//! sizing, and allocator compatibility with narrow entries.

use memsim_core::common::SimError;
use memsim_core::config::{AllocatorKind, Config};

// ══════════════════════════════════════════════════════════
// 1. Defaults
// ══════════════════════════════════════════════════════════

#[test]
fn defaults_are_the_documented_baseline() {
    let config = Config::default();

    assert_eq!(config.memory.phys_mem_gb, 1);
    assert_eq!(config.memory.batch_size, 4096);
    assert_eq!(config.memory.allocator, AllocatorKind::Linear);
    assert_eq!(config.tlb.l1_entries, 64);
    assert_eq!(config.tlb.l1_ways, 4);
    assert_eq!(config.tlb.l2_entries, 1024);
    assert_eq!(config.tlb.l2_ways, 8);
    assert_eq!(config.pwc.pmd_entries, 16);
    assert_eq!(config.cache.l1.size_bytes, 32 * 1024);
    assert_eq!(config.cache.l2.size_bytes, 256 * 1024);
    assert_eq!(config.cache.l3.size_bytes, 8 * 1024 * 1024);
    assert_eq!(config.page_table.pgd_entries, 512);
    assert!(!config.page_table.pte_cachable);
    assert!(!config.page_table.toc_enabled);

    config.validate().expect("defaults must validate");
}

#[test]
fn deserializes_from_json() {
    let json = r#"{
        "memory": { "phys_mem_gb": 4, "allocator": "tinyptr" },
        "tlb": { "l1_entries": 32 },
        "cache": {
            "l1": { "size_bytes": 16384, "ways": 4, "line_bytes": 64 }
        },
        "page_table": { "pte_cachable": true, "pte_entries": 1024 }
    }"#;

    let config: Config = serde_json::from_str(json).unwrap();
    assert_eq!(config.memory.phys_mem_gb, 4);
    assert_eq!(config.memory.allocator, AllocatorKind::TinyPtr);
    assert_eq!(config.tlb.l1_entries, 32);
    assert_eq!(config.tlb.l2_entries, 1024, "unset fields keep defaults");
    assert_eq!(config.cache.l1.size_bytes, 16384);
    assert_eq!(config.cache.l2.size_bytes, 256 * 1024);
    assert!(config.page_table.pte_cachable);
    assert_eq!(config.page_table.pte_entries, 1024);
}

// ══════════════════════════════════════════════════════════
// 2. Validation Failures
// ══════════════════════════════════════════════════════════

fn expect_config_error(config: &Config, needle: &str) {
    match config.validate() {
        Err(SimError::Config(msg)) => {
            assert!(msg.contains(needle), "unexpected message: {}", msg)
        }
        Ok(()) => panic!("validation should fail ({})", needle),
        Err(other) => panic!("expected Config error, got {}", other),
    }
}

#[test]
fn rejects_non_power_of_two_entries() {
    let mut config = Config::default();
    config.page_table.pmd_entries = 300;
    expect_config_error(&config, "power of two");
}

#[test]
fn rejects_broken_shift_invariant() {
    let mut config = Config::default();
    config.page_table.pte_entries = 256; // 12 + 8 + 9 + 9 + 9 = 47 bits
    expect_config_error(&config, "48");
}

/// Covering 48 bits is not enough: the root shift itself must stay inside
/// the bit-47 PWC tag range.
#[test]
fn rejects_root_shift_past_pwc_range() {
    let mut config = Config::default();
    config.page_table.pgd_entries = 1;
    config.page_table.pud_entries = 4096;
    config.page_table.pmd_entries = 4096;
    config.page_table.pte_entries = 4096;
    config.memory.allocator = AllocatorKind::TinyPtr;
    expect_config_error(&config, "root shift");
}

#[test]
fn rejects_oversized_level() {
    let mut config = Config::default();
    config.page_table.pte_entries = 8192;
    expect_config_error(&config, "exceed");
}

#[test]
fn rejects_toc_size_without_toc() {
    let mut config = Config::default();
    config.page_table.toc_size = 4;
    expect_config_error(&config, "disabled");
}

#[test]
fn rejects_non_power_of_two_toc() {
    let mut config = Config::default();
    config.page_table.toc_enabled = true;
    config.page_table.toc_size = 3;
    expect_config_error(&config, "toc_size");
}

#[test]
fn rejects_zero_toc_size_when_enabled() {
    let mut config = Config::default();
    config.page_table.toc_enabled = true;
    config.page_table.toc_size = 0;
    expect_config_error(&config, "toc_size");
}

#[test]
fn rejects_narrow_entries_on_linear_allocator() {
    let mut config = Config::default();
    // 1024-entry PTE level (4-byte entries) needs tiny pointers; rebalance
    // the PMD level to keep 48 bits covered.
    config.page_table.pte_entries = 1024;
    config.page_table.pmd_entries = 256;
    expect_config_error(&config, "tiny-pointer");

    config.memory.allocator = AllocatorKind::TinyPtr;
    config.validate().expect("tinyptr allocator accepts narrow entries");
}

#[test]
fn accepts_toc_configuration() {
    let mut config = Config::default();
    config.page_table.toc_enabled = true;
    config.page_table.toc_size = 4;
    config.validate().expect("power-of-two TOC validates");
}
