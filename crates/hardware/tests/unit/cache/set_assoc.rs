//! Set-Associative Engine Unit Tests.
//!
//! Verifies the generic cache engine shared by the TLBs, page-walk caches,
//! and data caches:
//! - Lookup hit/miss accounting
//! - LRU victim selection and invalid-way preference
//! - In-place update on re-insertion and dirty-bit stickiness
//! - Eviction surfacing (clean and dirty victims)
//! - Non-counting probes

use memsim_core::cache::SetAssocCache;

/// 2 sets, 2 ways; tests index sets directly.
fn test_cache() -> SetAssocCache<u64> {
    SetAssocCache::new("test", 2, 2)
}

// ══════════════════════════════════════════════════════════
// 1. Lookup
// ══════════════════════════════════════════════════════════

#[test]
fn lookup_miss_on_empty() {
    let mut cache = test_cache();
    assert_eq!(cache.lookup(0, 0x10), None);
    assert_eq!(cache.accesses(), 1);
    assert_eq!(cache.hits(), 0);
}

#[test]
fn lookup_hit_after_insert() {
    let mut cache = test_cache();
    cache.insert(0, 0x10, 99, false);
    assert_eq!(cache.lookup(0, 0x10), Some(99));
    assert_eq!(cache.hits(), 1);
}

#[test]
fn lookup_respects_set_boundaries() {
    let mut cache = test_cache();
    cache.insert(0, 0x10, 1, false);
    // Same tag in a different set misses.
    assert_eq!(cache.lookup(1, 0x10), None);
}

// ══════════════════════════════════════════════════════════
// 2. LRU Replacement
// ══════════════════════════════════════════════════════════

#[test]
fn lru_victim_is_least_recently_touched() {
    let mut cache = test_cache();
    cache.insert(0, 0xA, 1, false);
    cache.insert(0, 0xB, 2, false);

    // Touch A so B becomes LRU.
    cache.lookup(0, 0xA);

    let evicted = cache.insert(0, 0xC, 3, false).expect("set was full");
    assert_eq!(evicted.tag, 0xB);
    assert!(cache.probe(0, 0xA).is_some());
    assert!(cache.probe(0, 0xB).is_none());
    assert!(cache.probe(0, 0xC).is_some());
}

#[test]
fn invalid_way_preferred_over_valid_lru() {
    let mut cache = test_cache();
    cache.insert(0, 0xA, 1, false);
    // One way still invalid: no eviction even though A is LRU.
    assert!(cache.insert(0, 0xB, 2, false).is_none());
}

// ══════════════════════════════════════════════════════════
// 3. Update and Dirty Bits
// ══════════════════════════════════════════════════════════

#[test]
fn reinsert_updates_value_in_place() {
    let mut cache = test_cache();
    cache.insert(0, 0xA, 1, false);
    assert!(cache.insert(0, 0xA, 7, false).is_none());
    assert_eq!(cache.lookup(0, 0xA), Some(7));
}

#[test]
fn dirty_bit_sticks_across_clean_reinsert() {
    let mut cache = test_cache();
    cache.insert(0, 0xA, 1, true);
    // A clean re-insert must not clear the dirty bit.
    cache.insert(0, 0xA, 2, false);
    let (_, dirty) = cache.probe(0, 0xA).unwrap();
    assert!(dirty, "dirty bit should persist until eviction");
}

// ══════════════════════════════════════════════════════════
// 4. Eviction Surfacing
// ══════════════════════════════════════════════════════════

#[test]
fn dirty_victim_reported_with_value() {
    let mut cache = test_cache();
    cache.insert(0, 0xA, 11, true);
    cache.insert(0, 0xB, 22, false);
    cache.lookup(0, 0xB);
    cache.lookup(0, 0xB); // keep B hot; A is the victim

    let evicted = cache.insert(0, 0xC, 33, false).expect("set was full");
    assert_eq!(evicted.tag, 0xA);
    assert_eq!(evicted.value, 11);
    assert!(evicted.dirty);
}

#[test]
fn clean_victim_reported_not_dirty() {
    let mut cache = test_cache();
    cache.insert(0, 0xA, 1, false);
    cache.insert(0, 0xB, 2, false);
    cache.lookup(0, 0xB);

    let evicted = cache.insert(0, 0xC, 3, false).expect("set was full");
    assert_eq!(evicted.tag, 0xA);
    assert!(!evicted.dirty);
}

// ══════════════════════════════════════════════════════════
// 5. Probes
// ══════════════════════════════════════════════════════════

#[test]
fn probe_does_not_count_or_touch() {
    let mut cache = test_cache();
    cache.insert(0, 0xA, 1, false);
    cache.insert(0, 0xB, 2, false);

    let accesses = cache.accesses();
    // Probing A must not refresh its LRU position...
    assert!(cache.probe(0, 0xA).is_some());
    assert_eq!(cache.accesses(), accesses);

    // ...so A is still the victim.
    let evicted = cache.insert(0, 0xC, 3, false).expect("set was full");
    assert_eq!(evicted.tag, 0xA);
}
