//! Page Walk Cache (PWC).
//!
//! A small set-associative cache of partial translations. The tag is a
//! contiguous bit slice `[low_bit..=high_bit]` of the virtual address and the
//! value is the frame number of the child page-table page that slice resolves
//! to, letting the walker skip every level above it.
//!
//! In Table-of-Contents (TOC) mode a way covers `T` neighbouring slices at
//! once: the low `log2(T)` bits of the original tag become a sub-index into a
//! lazily allocated sequence of `T` (valid, frame) cells owned by the way.
//! The sequence is allocated on the way's first use and dropped when the way
//! is evicted; no write-back is ever generated.

use crate::cache::SetAssocCache;

#[derive(Clone, Copy, Default)]
struct TocCell {
    valid: bool,
    pfn: u64,
}

struct Toc {
    size: u32,
    /// Mask selecting the sub-index bits in the original virtual address.
    index_mask: u64,
    /// Original (pre-raise) low bit; shifts the masked bits down.
    index_shift: u32,
    /// One optional cell sequence per way, indexed `set * ways + way`.
    ways: Vec<Option<Box<[TocCell]>>>,
}

/// A partial-translation cache for one page-table level.
pub struct PageWalkCache {
    cache: SetAssocCache<u64>,
    low_bit: u32,
    high_bit: u32,
    toc: Option<Toc>,
}

impl PageWalkCache {
    /// Creates a PWC of `entries / ways` sets tagging virtual-address bits
    /// `[low_bit..=high_bit]`.
    ///
    /// # Arguments
    ///
    /// * `name` - Cache name used in reports.
    /// * `entries` - Total entry count.
    /// * `ways` - Associativity (clamped to at least 1).
    /// * `low_bit` - Lowest virtual-address bit of the tag slice.
    /// * `high_bit` - Highest virtual-address bit of the tag slice.
    /// * `toc_size` - `Some(T)` (T a power of two) raises `low_bit` by
    ///   `log2(T)` and lets the displaced bits select one of `T` sub-entries
    ///   per way. A TOC of size 1 degenerates to plain behavior.
    ///
    /// # Returns
    ///
    /// A new `PageWalkCache`. The caller must keep the (possibly raised)
    /// `low_bit` at or below `high_bit`; configuration validation enforces
    /// this for every cache the page table builds.
    pub fn new(
        name: impl Into<String>,
        entries: u64,
        ways: u64,
        low_bit: u32,
        high_bit: u32,
        toc_size: Option<u32>,
    ) -> Self {
        let ways = ways.max(1);
        let num_sets = (entries / ways).max(1) as usize;
        let cache = SetAssocCache::new(name, num_sets, ways as usize);

        let (low_bit, toc) = match toc_size {
            Some(size) => {
                debug_assert!(size.is_power_of_two());
                let shift = size.trailing_zeros();
                let toc = Toc {
                    size,
                    index_mask: (u64::from(size) - 1) << low_bit,
                    index_shift: low_bit,
                    ways: vec![None; num_sets * ways as usize],
                };
                (low_bit + shift, Some(toc))
            }
            None => (low_bit, None),
        };
        debug_assert!(low_bit <= high_bit);

        Self {
            cache,
            low_bit,
            high_bit,
            toc,
        }
    }

    /// Extracts this cache's tag from a virtual address.
    ///
    /// # Arguments
    ///
    /// * `vaddr` - Virtual address to slice.
    ///
    /// # Returns
    ///
    /// Bits `[low_bit..=high_bit]` of `vaddr`, shifted down to bit 0.
    #[inline]
    pub fn tag(&self, vaddr: u64) -> u64 {
        (vaddr >> self.low_bit) & ((1u64 << (self.high_bit - self.low_bit + 1)) - 1)
    }

    #[inline]
    fn set_index(&self, tag: u64) -> usize {
        (tag % self.cache.num_sets() as u64) as usize
    }

    /// Looks up the child-table frame for `vaddr`.
    ///
    /// # Returns
    ///
    /// `Some(pfn)` when the tag (and, in TOC mode, the sub-entry) is valid;
    /// `None` otherwise. A miss on an invalid sub-entry does not refresh the
    /// way's LRU position.
    ///
    /// # Panics
    ///
    /// This function will not panic. Indexing is guaranteed safe because:
    /// - the set index is `tag % num_sets`
    /// - `find_way` only yields ways below the associativity, so
    ///   `set * ways + way` is within the TOC slot vector
    /// - the sub-index is masked to `toc_size - 1` cells
    pub fn lookup(&mut self, vaddr: u64) -> Option<u64> {
        let tag = self.tag(vaddr);
        let set = self.set_index(tag);

        let Some(toc) = &self.toc else {
            return self.cache.lookup(set, tag);
        };

        self.cache.note_access();
        let sub = ((vaddr & toc.index_mask) >> toc.index_shift) as usize;
        let ways = self.cache.ways();
        let way = self.cache.find_way(set, tag)?;
        let cell = toc.ways[set * ways + way].as_ref()?[sub];
        if !cell.valid {
            return None;
        }
        self.cache.note_hit();
        self.cache.touch(set, way);
        Some(cell.pfn)
    }

    /// Installs the child-table frame resolved for `vaddr`.
    ///
    /// # Arguments
    ///
    /// * `vaddr` - Virtual address whose tag (and sub-index) select the slot.
    /// * `pfn` - Frame number of the child page-table page.
    pub fn insert(&mut self, vaddr: u64, pfn: u64) {
        let tag = self.tag(vaddr);
        let set = self.set_index(tag);

        let Some(toc) = &mut self.toc else {
            self.cache.insert(set, tag, pfn, false);
            return;
        };

        let sub = ((vaddr & toc.index_mask) >> toc.index_shift) as usize;
        let size = toc.size as usize;
        let ways = self.cache.ways();
        if let Some(way) = self.cache.find_way(set, tag) {
            let cells = toc.ways[set * ways + way]
                .get_or_insert_with(|| vec![TocCell::default(); size].into_boxed_slice());
            cells[sub] = TocCell { valid: true, pfn };
            self.cache.touch(set, way);
            return;
        }

        let way = self.cache.victim_way(set);
        let mut cells = vec![TocCell::default(); size].into_boxed_slice();
        cells[sub] = TocCell { valid: true, pfn };
        // Replacing the slot drops the evicted way's sequence.
        toc.ways[set * ways + way] = Some(cells);
        self.cache.install(set, way, tag, 0, false);
    }

    /// Lowest virtual-address bit of the tag (after any TOC raise).
    pub fn low_bit(&self) -> u32 {
        self.low_bit
    }

    /// Highest virtual-address bit of the tag.
    pub fn high_bit(&self) -> u32 {
        self.high_bit
    }

    /// The underlying cache, for structure-summary reporting.
    pub fn stats(&self) -> &SetAssocCache<u64> {
        &self.cache
    }
}
