//! Three-level inclusive cache hierarchy.
//!
//! Composes the L1/L2/L3 data caches and the virtual main-memory access
//! counter into one write-back, write-allocate stack. It provides:
//! 1. **Data Path:** `access` walks L1 → L2 → L3 → memory, filling inner
//!    levels on outer hits and marking lines dirty on writes.
//! 2. **Translation Path:** `translate_lookup` enters at L2 — the TLBs and
//!    page-walk caches already absorb the L1-grade temporal locality of
//!    translation traffic.
//! 3. **Write-Back Cascade:** A dirty victim at any level is inserted one
//!    level down under that level's own tag; a dirty L3 victim counts one
//!    main-memory access.
//!
//! The pass ordering L1 → L2 → L3 → memory is fixed at construction and never
//! changes. Lines filled at outer levels are also inserted into inner levels
//! on hits; no back-invalidation is modeled, so inner LRU state may drift — an
//! accepted simulator simplification.

use std::io::{self, Write};

use super::DataCache;

/// Number of data-cache levels in the stack.
pub const NUM_LEVELS: usize = 3;

/// Relative access cost per level, in cycles, for the advisory cost figure.
const LEVEL_COST: [u64; NUM_LEVELS] = [1, 4, 10];

/// Cost of one main-memory access, in cycles.
const MEM_COST: u64 = 100;

/// The L1/L2/L3 data-cache stack plus the main-memory access counter.
pub struct CacheHierarchy {
    levels: [DataCache; NUM_LEVELS],
    mem_accesses: u64,
}

impl CacheHierarchy {
    /// Builds the stack from per-level geometry triples.
    ///
    /// # Arguments
    ///
    /// * `l1` - L1 `(total_bytes, ways, line_bytes)`.
    /// * `l2` - L2 `(total_bytes, ways, line_bytes)`.
    /// * `l3` - L3 `(total_bytes, ways, line_bytes)`.
    ///
    /// # Returns
    ///
    /// A new `CacheHierarchy` with empty caches and a zero memory-access
    /// counter.
    pub fn new(l1: (u64, u64, u64), l2: (u64, u64, u64), l3: (u64, u64, u64)) -> Self {
        Self {
            levels: [
                DataCache::new("L1 Cache", l1.0, l1.1, l1.2),
                DataCache::new("L2 Cache", l2.0, l2.1, l2.2),
                DataCache::new("L3 Cache", l3.0, l3.1, l3.2),
            ],
            mem_accesses: 0,
        }
    }

    /// One data access at `paddr`.
    ///
    /// On a write the innermost copy is marked dirty; outer copies filled
    /// along the way stay clean except the level that already held the line.
    ///
    /// # Arguments
    ///
    /// * `paddr` - Physical address of the access.
    /// * `is_write` - Whether this is a write operation.
    ///
    /// # Returns
    ///
    /// `true` if any level hit, `false` if the block came from memory.
    pub fn access(&mut self, paddr: u64, is_write: bool) -> bool {
        let t1 = self.levels[0].line_tag(paddr);
        if self.levels[0].lookup(t1, is_write) {
            if is_write {
                self.fill(0, t1, true);
            }
            return true;
        }

        let t2 = self.levels[1].line_tag(paddr);
        if self.levels[1].lookup(t2, is_write) {
            self.fill(0, t1, is_write);
            if is_write {
                self.fill(1, t2, true);
            }
            return true;
        }

        let t3 = self.levels[2].line_tag(paddr);
        if self.levels[2].lookup(t3, is_write) {
            if is_write {
                self.fill(2, t3, true);
            }
            self.fill(1, t2, false);
            self.fill(0, t1, is_write);
            return true;
        }

        // Miss everywhere: fetch the block from memory and fill all levels.
        self.mem_accesses += 1;
        self.fill(2, t3, false);
        self.fill(1, t2, false);
        self.fill(0, t1, is_write);
        false
    }

    /// One page-walker access at `paddr`, entering the stack at L2.
    ///
    /// # Arguments
    ///
    /// * `paddr` - Physical address of the page-table entry being fetched.
    ///
    /// # Returns
    ///
    /// `true` when L2 or L3 held the entry's line; on a full miss the block
    /// is fetched from memory, filled into L3 and L2 clean, and `false` is
    /// returned.
    pub fn translate_lookup(&mut self, paddr: u64) -> bool {
        let t2 = self.levels[1].line_tag(paddr);
        if self.levels[1].lookup(t2, false) {
            return true;
        }

        let t3 = self.levels[2].line_tag(paddr);
        if self.levels[2].lookup(t3, false) {
            self.fill(1, t2, false);
            return true;
        }

        self.mem_accesses += 1;
        self.fill(2, t3, false);
        self.fill(1, t2, false);
        false
    }

    /// Inserts a line at `level`, cascading any dirty victim down the stack
    /// under the target level's own tag. A dirty victim leaving L3 is one
    /// main-memory access.
    fn fill(&mut self, level: usize, tag: u64, is_write: bool) {
        let mut level = level;
        let mut tag = tag;
        let mut is_write = is_write;
        loop {
            let Some(victim_tag) = self.levels[level].insert(tag, is_write) else {
                return;
            };
            if level + 1 == NUM_LEVELS {
                self.mem_accesses += 1;
                return;
            }
            let own_bits = self.levels[level].offset_bits();
            let next_bits = self.levels[level + 1].offset_bits();
            tag = (victim_tag << own_bits) >> next_bits;
            level += 1;
            is_write = true;
        }
    }

    /// The L1 data cache.
    pub fn l1(&self) -> &DataCache {
        &self.levels[0]
    }

    /// The L2 data cache.
    pub fn l2(&self) -> &DataCache {
        &self.levels[1]
    }

    /// The L3 data cache.
    pub fn l3(&self) -> &DataCache {
        &self.levels[2]
    }

    /// All levels, L1 first.
    pub fn levels(&self) -> &[DataCache; NUM_LEVELS] {
        &self.levels
    }

    /// Main-memory accesses (fills plus dirty L3 write-backs).
    pub fn mem_accesses(&self) -> u64 {
        self.mem_accesses
    }

    /// Advisory total access cost in cycles:
    /// `L1 × 1 + L2 × 4 + L3 × 10 + memory × 100`.
    pub fn total_cost_cycles(&self) -> u64 {
        self.levels
            .iter()
            .zip(LEVEL_COST)
            .map(|(c, cost)| c.accesses() * cost)
            .sum::<u64>()
            + self.mem_accesses * MEM_COST
    }

    /// Writes the per-level cache blocks, the memory-access total, and the
    /// advisory cycle cost.
    pub fn write_stats(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(w, "\n=== Cache Hierarchy Statistics ===")?;
        for cache in &self.levels {
            writeln!(w, "[{}]", cache.name())?;
            writeln!(w, "Size: {}KB", cache.total_bytes() / 1024)?;
            writeln!(w, "Ways: {}", cache.ways())?;
            writeln!(w, "Hit Rate: {:.2}%", cache.hit_rate() * 100.0)?;
            writeln!(w, "Accesses: {}", cache.accesses())?;
            writeln!(w, "Misses: {}", cache.misses())?;
            cache.write_detailed_stats(w)?;
            writeln!(w, "---------------------------------")?;
            writeln!(w)?;
        }
        writeln!(w, "Memory Accesses: {}", self.mem_accesses)?;
        writeln!(
            w,
            "Total Access Cost (cycles): {}",
            self.total_cost_cycles()
        )?;
        Ok(())
    }
}
