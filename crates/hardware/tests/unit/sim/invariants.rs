//! Simulation Invariant Tests.
//!
//! Properties that must hold after any run, checked over a mixed workload:
//! - Exactly one translation path per reference
//! - Cache counter consistency (hits ≤ accesses, read/write split)
//! - Memory-access accounting against L3 misses and write-backs
//! - TLB efficiency bounds

use memsim_core::common::MemRef;
use memsim_core::Simulator;

use crate::common::default_config;

/// A deterministic mix of reads and writes over a few dozen pages, with
/// enough reuse to exercise every translation path.
fn mixed_workload() -> Vec<MemRef> {
    let mut refs = Vec::new();
    for round in 0..4u64 {
        for page in 0..40u64 {
            let ea = (page * 0x3000) ^ (round * 0x40_0000);
            refs.push(MemRef {
                pc: round,
                ea,
                size: 8,
                is_read: (page + round) % 3 != 0,
            });
        }
    }
    refs
}

#[test]
fn translation_paths_partition_the_references() {
    let mut sim = Simulator::new(default_config()).unwrap();
    let refs = mixed_workload();
    sim.process_batch(&refs).unwrap();

    let stats = sim.page_table().translation_stats();
    assert_eq!(stats.total_translations(), refs.len() as u64);
    assert_eq!(sim.access_count(), refs.len() as u64);
}

#[test]
fn cache_counters_are_consistent() {
    let mut sim = Simulator::new(default_config()).unwrap();
    sim.process_batch(&mixed_workload()).unwrap();

    for cache in sim.hierarchy().levels() {
        assert!(cache.hits() <= cache.accesses(), "{}", cache.name());
        assert_eq!(
            cache.hits(),
            cache.read_hits() + cache.write_hits(),
            "{}",
            cache.name()
        );
        assert_eq!(
            cache.accesses(),
            cache.read_accesses() + cache.write_accesses(),
            "{}",
            cache.name()
        );
        assert_eq!(
            cache.misses(),
            cache.cold_misses() + cache.capacity_misses() + cache.conflict_misses(),
            "{}",
            cache.name()
        );
    }

    let tlb = sim.page_table().l1_tlb().stats();
    assert!(tlb.hits() <= tlb.accesses());
}

#[test]
fn memory_accesses_match_l3_traffic() {
    let mut sim = Simulator::new(default_config()).unwrap();
    sim.process_batch(&mixed_workload()).unwrap();

    let l3 = sim.hierarchy().l3();
    assert_eq!(sim.hierarchy().mem_accesses(), l3.misses() + l3.writebacks());
}

#[test]
fn tlb_efficiency_is_a_ratio() {
    let mut sim = Simulator::new(default_config()).unwrap();
    sim.process_batch(&mixed_workload()).unwrap();

    let eff = sim.page_table().translation_stats().tlb_efficiency();
    assert!((0.0..=1.0).contains(&eff));
}

#[test]
fn batching_does_not_change_semantics() {
    let refs = mixed_workload();

    let mut one = Simulator::new(default_config()).unwrap();
    one.process_batch(&refs).unwrap();

    let mut many = Simulator::new(default_config()).unwrap();
    for chunk in refs.chunks(7) {
        many.process_batch(chunk).unwrap();
    }

    let a = one.page_table().translation_stats();
    let b = many.page_table().translation_stats();
    assert_eq!(a.l1_tlb_hits, b.l1_tlb_hits);
    assert_eq!(a.full_walks, b.full_walks);
    assert_eq!(
        one.hierarchy().mem_accesses(),
        many.hierarchy().mem_accesses()
    );
}
