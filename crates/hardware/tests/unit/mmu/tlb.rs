//! TLB Unit Tests.
//!
//! Verifies functionality of the Translation Lookaside Buffer:
//! - Basic lookup and insertion
//! - Set indexing by VPN modulo
//! - Aliasing eviction within a set
//! - Non-counting residency probes

use memsim_core::mmu::Tlb;

// ══════════════════════════════════════════════════════════
// 1. Basic Operations
// ══════════════════════════════════════════════════════════

#[test]
fn lookup_miss_on_empty() {
    let mut tlb = Tlb::new("L1 TLB", 16, 4);
    assert_eq!(tlb.lookup(0x100), None);
}

#[test]
fn insert_and_lookup_hit() {
    let mut tlb = Tlb::new("L1 TLB", 16, 4);
    tlb.insert(0xABC, 0x123);
    assert_eq!(tlb.lookup(0xABC), Some(0x123));
}

#[test]
fn counters_track_lookups() {
    let mut tlb = Tlb::new("L1 TLB", 16, 4);
    tlb.insert(1, 10);
    tlb.lookup(1);
    tlb.lookup(2);
    assert_eq!(tlb.stats().accesses(), 2);
    assert_eq!(tlb.stats().hits(), 1);
}

// ══════════════════════════════════════════════════════════
// 2. Set Indexing and Eviction
// ══════════════════════════════════════════════════════════

/// 4 entries, 2-way: 2 sets, set = vpn % 2. Three VPNs in the same set force
/// an LRU eviction.
#[test]
fn aliasing_evicts_lru_within_set() {
    let mut tlb = Tlb::new("L1 TLB", 4, 2);

    tlb.insert(0, 0x100); // set 0
    tlb.insert(2, 0x200); // set 0
    tlb.lookup(0); // make vpn 2 the LRU entry
    tlb.insert(4, 0x300); // set 0, evicts vpn 2

    assert!(tlb.contains(0));
    assert!(!tlb.contains(2));
    assert!(tlb.contains(4));
}

#[test]
fn different_sets_do_not_interfere() {
    let mut tlb = Tlb::new("L1 TLB", 4, 2);

    tlb.insert(0, 0x100); // set 0
    tlb.insert(1, 0x200); // set 1
    tlb.insert(2, 0x300); // set 0
    tlb.insert(3, 0x400); // set 1

    for vpn in 0..4 {
        assert!(tlb.contains(vpn), "vpn {} should be resident", vpn);
    }
}

// ══════════════════════════════════════════════════════════
// 3. Probes
// ══════════════════════════════════════════════════════════

#[test]
fn contains_does_not_count() {
    let mut tlb = Tlb::new("L1 TLB", 16, 4);
    tlb.insert(7, 70);
    assert!(tlb.contains(7));
    assert!(!tlb.contains(8));
    assert_eq!(tlb.stats().accesses(), 0);
}
