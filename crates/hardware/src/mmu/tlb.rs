//! Translation Lookaside Buffer (TLB).
//!
//! A set-associative cache of complete translations, mapping Virtual Page
//! Numbers (VPN) to Physical Frame Numbers (PFN). The simulator keeps two of
//! these: a small L1 and a larger L2, both refilled whenever any translation
//! path completes. TLB entries are never written back, so eviction victims
//! are simply dropped.

use crate::cache::SetAssocCache;

/// A VPN-to-PFN translation cache.
pub struct Tlb {
    cache: SetAssocCache<u64>,
}

impl Tlb {
    /// Creates a TLB with `entries` total entries split into
    /// `entries / ways` sets.
    ///
    /// # Arguments
    ///
    /// * `name` - TLB name used in reports (e.g. "L1 TLB").
    /// * `entries` - Total entry count.
    /// * `ways` - Associativity (clamped to at least 1).
    pub fn new(name: impl Into<String>, entries: u64, ways: u64) -> Self {
        let ways = ways.max(1);
        let num_sets = (entries / ways).max(1) as usize;
        Self {
            cache: SetAssocCache::new(name, num_sets, ways as usize),
        }
    }

    #[inline]
    fn set_index(&self, vpn: u64) -> usize {
        (vpn % self.cache.num_sets() as u64) as usize
    }

    /// Looks up the PFN for `vpn`, counting the access.
    ///
    /// # Arguments
    ///
    /// * `vpn` - Virtual page number to look up.
    ///
    /// # Returns
    ///
    /// `Some(pfn)` if the translation is resident, otherwise `None`.
    ///
    /// # Panics
    ///
    /// This function will not panic. The set index is `vpn % num_sets`,
    /// which is always in range.
    pub fn lookup(&mut self, vpn: u64) -> Option<u64> {
        let set = self.set_index(vpn);
        self.cache.lookup(set, vpn)
    }

    /// Installs a translation. A displaced victim is discarded.
    ///
    /// # Arguments
    ///
    /// * `vpn` - Virtual page number (tag).
    /// * `pfn` - Physical frame number (value).
    pub fn insert(&mut self, vpn: u64, pfn: u64) {
        let set = self.set_index(vpn);
        self.cache.insert(set, vpn, pfn, false);
    }

    /// Whether `vpn` is currently resident. Does not disturb statistics.
    pub fn contains(&self, vpn: u64) -> bool {
        self.cache.probe(self.set_index(vpn), vpn).is_some()
    }

    /// The underlying cache, for structure-summary reporting.
    pub fn stats(&self) -> &SetAssocCache<u64> {
        &self.cache
    }
}
