//! Four-level hierarchical page table.
//!
//! This module implements the translation engine itself. It traverses (and
//! lazily builds) the PGD → PUD → PMD → PTE radix tree and coordinates every
//! structure that can short-circuit the walk:
//!
//! ```text
//!   L1 TLB → L2 TLB → PMD PWC → PUD PWC → PGD PWC → full walk
//! ```
//!
//! Whenever a stage completes, every page-walk cache from that stage downward
//! is refilled with the intermediate frame it learned, and the final mapping
//! lands in both TLBs.
//!
//! Page-table pages are 4KB and zero-initialized on allocation. Entry width is
//! chosen per level from the entry count (`512×8B`, `1024×4B`, `2048×2B`,
//! `4096×1B`; counts of 512 or fewer keep the 8-byte layout and leave the page
//! partially occupied). The root is always 8-byte-wide. 8-byte entries carry
//! the child frame number directly; narrower entries store a tiny pointer that
//! the physical-memory allocator resolves against the entry's own physical
//! address. `present` is bit 0 in every width, and a non-present entry is
//! all-zero.

use std::collections::HashMap;
use std::io::{self, Write};

use crate::cache::{CacheHierarchy, SetAssocCache};
use crate::common::constants::{PAGE_SIZE, PAGE_SHIFT, PWC_HIGH_BIT, VADDR_BITS};
use crate::common::{PhysAddr, SimResult, VirtAddr};
use crate::config::Config;
use crate::mmu::{PageWalkCache, Tlb};
use crate::phys::PhysicalMemory;
use crate::stats::{LevelStats, TranslationStats};

/// The four page-table levels, outermost first.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    /// Page Global Directory (root).
    Pgd = 0,
    /// Page Upper Directory.
    Pud = 1,
    /// Page Middle Directory.
    Pmd = 2,
    /// Page Table (leaf).
    Pte = 3,
}

impl Level {
    const ALL: [Level; 4] = [Level::Pgd, Level::Pud, Level::Pmd, Level::Pte];

    fn child(self) -> Level {
        match self {
            Level::Pgd => Level::Pud,
            Level::Pud => Level::Pmd,
            Level::Pmd => Level::Pte,
            Level::Pte => Level::Pte,
        }
    }
}

/// Storage width of one page-table entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryWidth {
    /// 8-byte entry with a direct frame number.
    W8,
    /// 4-byte entry with an 8-bit tiny pointer.
    W4,
    /// 2-byte entry with an 8-bit tiny pointer.
    W2,
    /// 1-byte entry with a 6-bit tiny pointer.
    W1,
}

impl EntryWidth {
    /// Width chosen from the per-level entry count. Counts of 512 or fewer
    /// keep the full 8-byte layout.
    pub fn for_entries(entries: u64) -> EntryWidth {
        match PAGE_SIZE / entries {
            4 => EntryWidth::W4,
            2 => EntryWidth::W2,
            1 => EntryWidth::W1,
            _ => EntryWidth::W8,
        }
    }

    /// Entry size in bytes.
    pub fn bytes(self) -> u64 {
        match self {
            EntryWidth::W8 => 8,
            EntryWidth::W4 => 4,
            EntryWidth::W2 => 2,
            EntryWidth::W1 => 1,
        }
    }

    /// Bit width of the tiny-pointer field for narrow entries.
    pub fn tiny_bits(self) -> u8 {
        match self {
            EntryWidth::W1 => 6,
            _ => 8,
        }
    }

    fn tiny_shift(self) -> u32 {
        match self {
            EntryWidth::W8 => 0,
            EntryWidth::W4 => 24,
            EntryWidth::W2 => 8,
            EntryWidth::W1 => 2,
        }
    }
}

/// A raw entry value paired with its width, giving typed access to the
/// present bit and the frame or tiny-pointer field.
#[derive(Clone, Copy)]
struct Entry {
    raw: u64,
    width: EntryWidth,
}

/// Present bit (bit 0 in every width).
const ENTRY_PRESENT: u64 = 1;

/// Writable bit of an 8-byte entry.
const ENTRY_WRITABLE: u64 = 1 << 1;

/// Frame-number field position and width in an 8-byte entry.
const ENTRY_PFN_SHIFT: u32 = 3;
const ENTRY_PFN_MASK: u64 = (1 << 52) - 1;

impl Entry {
    fn is_present(&self) -> bool {
        self.raw & ENTRY_PRESENT != 0
    }

    fn pfn(&self) -> u64 {
        debug_assert_eq!(self.width, EntryWidth::W8);
        (self.raw >> ENTRY_PFN_SHIFT) & ENTRY_PFN_MASK
    }

    fn tiny(&self) -> u8 {
        let mask = (1u64 << self.width.tiny_bits()) - 1;
        ((self.raw >> self.width.tiny_shift()) & mask) as u8
    }

    fn direct(pfn: u64) -> u64 {
        ENTRY_PRESENT | ENTRY_WRITABLE | (pfn << ENTRY_PFN_SHIFT)
    }

    fn narrow(width: EntryWidth, tiny: u8) -> u64 {
        ENTRY_PRESENT | (u64::from(tiny) << width.tiny_shift())
    }
}

/// One zero-initialized page-table page. Sized `entries × width`, with a 4KB
/// floor; the root may exceed one page when configured with more than 512
/// entries.
struct PtPage(Vec<u8>);

impl PtPage {
    fn new(entries: u64, width: EntryWidth) -> Self {
        Self(vec![0u8; (entries * width.bytes()).max(PAGE_SIZE) as usize])
    }

    fn read(&self, width: EntryWidth, index: u64) -> Entry {
        let off = (index * width.bytes()) as usize;
        let raw = match width {
            EntryWidth::W8 => u64::from_le_bytes(self.0[off..off + 8].try_into().unwrap()),
            EntryWidth::W4 => u32::from_le_bytes(self.0[off..off + 4].try_into().unwrap()).into(),
            EntryWidth::W2 => u16::from_le_bytes(self.0[off..off + 2].try_into().unwrap()).into(),
            EntryWidth::W1 => self.0[off].into(),
        };
        Entry { raw, width }
    }

    fn write(&mut self, width: EntryWidth, index: u64, raw: u64) {
        let off = (index * width.bytes()) as usize;
        match width {
            EntryWidth::W8 => self.0[off..off + 8].copy_from_slice(&raw.to_le_bytes()),
            EntryWidth::W4 => self.0[off..off + 4].copy_from_slice(&(raw as u32).to_le_bytes()),
            EntryWidth::W2 => self.0[off..off + 2].copy_from_slice(&(raw as u16).to_le_bytes()),
            EntryWidth::W1 => self.0[off] = raw as u8,
        }
    }
}

/// The four-level page table with its TLBs and page-walk caches.
pub struct PageTable {
    /// Page-table pages keyed by their physical byte address (`pfn << 12`).
    pages: HashMap<u64, PtPage>,
    /// Physical address of the root (PGD) page.
    cr3: u64,
    pte_cachable: bool,

    l1_tlb: Tlb,
    l2_tlb: Tlb,
    pgd_pwc: PageWalkCache,
    pud_pwc: PageWalkCache,
    pmd_pwc: PageWalkCache,

    entries: [u64; 4],
    widths: [EntryWidth; 4],
    shifts: [u32; 4],

    stats: TranslationStats,
    level_stats: [LevelStats; 4],
}

impl PageTable {
    /// Builds the table from the validated configuration and allocates the
    /// root page.
    ///
    /// # Arguments
    ///
    /// * `config` - A configuration that passed `Config::validate`; the
    ///   geometry invariants (power-of-two counts, 48-bit coverage, root
    ///   shift within the PWC tag range) are assumed here.
    /// * `phys` - Physical memory to allocate the root frame from.
    ///
    /// # Returns
    ///
    /// The constructed `PageTable`, or the allocation error if physical
    /// memory could not supply the root frame.
    pub fn new(config: &Config, phys: &mut PhysicalMemory) -> SimResult<Self> {
        let pt = &config.page_table;
        let entries = [
            pt.pgd_entries,
            pt.pud_entries,
            pt.pmd_entries,
            pt.pte_entries,
        ];
        // The root is always 8-byte-wide; inner levels narrow with their
        // entry count.
        let widths = [
            EntryWidth::W8,
            EntryWidth::for_entries(pt.pud_entries),
            EntryWidth::for_entries(pt.pmd_entries),
            EntryWidth::for_entries(pt.pte_entries),
        ];

        let log2 = |n: u64| n.trailing_zeros();
        let pte_shift = PAGE_SHIFT;
        let pmd_shift = pte_shift + log2(pt.pte_entries);
        let pud_shift = pmd_shift + log2(pt.pmd_entries);
        let pgd_shift = pud_shift + log2(pt.pud_entries);
        let shifts = [pgd_shift, pud_shift, pmd_shift, pte_shift];
        debug_assert_eq!(pgd_shift + log2(pt.pgd_entries), VADDR_BITS);

        let toc = pt.toc_enabled.then_some(pt.toc_size as u32);
        let pwc = &config.pwc;

        let cr3 = phys.allocate_frame(0)? << PAGE_SHIFT;
        let mut pages = HashMap::new();
        pages.insert(cr3, PtPage::new(entries[0], widths[0]));

        let mut level_stats = [
            LevelStats::new("PGD (Page Global Directory)", pt.pgd_entries),
            LevelStats::new("PUD (Page Upper Directory)", pt.pud_entries),
            LevelStats::new("PMD (Page Middle Directory)", pt.pmd_entries),
            LevelStats::new("PTE (Page Table Entry)", pt.pte_entries),
        ];
        level_stats[Level::Pgd as usize].allocations = 1;

        Ok(Self {
            pages,
            cr3,
            pte_cachable: pt.pte_cachable,
            l1_tlb: Tlb::new("L1 TLB", config.tlb.l1_entries, config.tlb.l1_ways),
            l2_tlb: Tlb::new("L2 TLB", config.tlb.l2_entries, config.tlb.l2_ways),
            pgd_pwc: PageWalkCache::new(
                "PML4E Cache (PGD)",
                pwc.pgd_entries,
                pwc.pgd_ways,
                pgd_shift,
                PWC_HIGH_BIT,
                toc,
            ),
            pud_pwc: PageWalkCache::new(
                "PDPTE Cache (PUD)",
                pwc.pud_entries,
                pwc.pud_ways,
                pud_shift,
                PWC_HIGH_BIT,
                toc,
            ),
            pmd_pwc: PageWalkCache::new(
                "PDE Cache (PMD)",
                pwc.pmd_entries,
                pwc.pmd_ways,
                pmd_shift,
                PWC_HIGH_BIT,
                toc,
            ),
            entries,
            widths,
            shifts,
            stats: TranslationStats::default(),
            level_stats,
        })
    }

    /// Entry index of `vaddr` within `level`'s table.
    ///
    /// # Panics
    ///
    /// This function will not panic, and the result is always a valid entry
    /// index: entry counts are powers of two, so masking with
    /// `entries - 1` keeps the index below the level's entry count.
    #[inline]
    fn index(&self, level: Level, vaddr: u64) -> u64 {
        (vaddr >> self.shifts[level as usize]) & (self.entries[level as usize] - 1)
    }

    /// Translates a virtual address, updating every structure along the path.
    ///
    /// # Arguments
    ///
    /// * `vaddr` - Virtual address to translate.
    /// * `caches` - Data-cache hierarchy for page-table entry fetches
    ///   (entered at L2, and only when entries are cacheable).
    /// * `phys` - Physical memory for on-demand child-table and data-frame
    ///   allocation.
    ///
    /// # Returns
    ///
    /// The physical address, with the page offset of `vaddr` preserved, or
    /// the allocation error that ended the walk (exhausted memory,
    /// impossible tiny-pointer placement).
    pub fn translate(
        &mut self,
        vaddr: VirtAddr,
        caches: &mut CacheHierarchy,
        phys: &mut PhysicalMemory,
    ) -> SimResult<PhysAddr> {
        let v = vaddr.val();
        let vpn = vaddr.vpn();
        let offset = vaddr.page_offset();

        if let Some(pfn) = self.l1_tlb.lookup(vpn) {
            self.stats.l1_tlb_hits += 1;
            return Ok(PhysAddr::new(pfn << PAGE_SHIFT | offset));
        }

        if let Some(pfn) = self.l2_tlb.lookup(vpn) {
            self.stats.l2_tlb_hits += 1;
            self.l1_tlb.insert(vpn, pfn);
            return Ok(PhysAddr::new(pfn << PAGE_SHIFT | offset));
        }

        let paddr = if let Some(pte_table) = self.pmd_pwc.lookup(v) {
            self.stats.pmd_pwc_hits += 1;
            self.complete_from_pte(v, pte_table, caches, phys)?
        } else if let Some(pmd_table) = self.pud_pwc.lookup(v) {
            self.stats.pud_pwc_hits += 1;
            self.complete_from_pmd(v, pmd_table, caches, phys)?
        } else if let Some(pud_table) = self.pgd_pwc.lookup(v) {
            self.stats.pgd_pwc_hits += 1;
            self.complete_from_pud(v, pud_table, caches, phys)?
        } else {
            self.stats.full_walks += 1;
            self.full_walk(v, caches, phys)?
        };

        self.l1_tlb.insert(vpn, paddr >> PAGE_SHIFT);
        self.l2_tlb.insert(vpn, paddr >> PAGE_SHIFT);
        Ok(PhysAddr::new(paddr))
    }

    /// Full walk: read the root, then fall through the PUD path.
    fn full_walk(
        &mut self,
        vaddr: u64,
        caches: &mut CacheHierarchy,
        phys: &mut PhysicalMemory,
    ) -> SimResult<u64> {
        let index = self.index(Level::Pgd, vaddr);
        let entry_addr = self.cr3 + index * self.widths[Level::Pgd as usize].bytes();

        let hit = self.entry_cache_lookup(entry_addr, caches);
        let pud_table = self.child_pfn(Level::Pgd, self.cr3, index, entry_addr, phys)?;
        self.note_entry_fetch(Level::Pgd, hit);

        self.pgd_pwc.insert(vaddr, pud_table);
        self.complete_from_pud(vaddr, pud_table, caches, phys)
    }

    /// Resume below a PGD PWC hit: read the PUD table.
    fn complete_from_pud(
        &mut self,
        vaddr: u64,
        pud_table: u64,
        caches: &mut CacheHierarchy,
        phys: &mut PhysicalMemory,
    ) -> SimResult<u64> {
        let table_addr = pud_table << PAGE_SHIFT;
        let index = self.index(Level::Pud, vaddr);
        let entry_addr = table_addr + index * self.widths[Level::Pud as usize].bytes();

        let hit = self.entry_cache_lookup(entry_addr, caches);
        let pmd_table = self.child_pfn(Level::Pud, table_addr, index, entry_addr, phys)?;
        self.note_entry_fetch(Level::Pud, hit);

        self.pud_pwc.insert(vaddr, pmd_table);
        self.complete_from_pmd(vaddr, pmd_table, caches, phys)
    }

    /// Resume below a PUD PWC hit: read the PMD table.
    fn complete_from_pmd(
        &mut self,
        vaddr: u64,
        pmd_table: u64,
        caches: &mut CacheHierarchy,
        phys: &mut PhysicalMemory,
    ) -> SimResult<u64> {
        let table_addr = pmd_table << PAGE_SHIFT;
        let index = self.index(Level::Pmd, vaddr);
        let entry_addr = table_addr + index * self.widths[Level::Pmd as usize].bytes();

        let hit = self.entry_cache_lookup(entry_addr, caches);
        let pte_table = self.child_pfn(Level::Pmd, table_addr, index, entry_addr, phys)?;
        self.note_entry_fetch(Level::Pmd, hit);

        self.pmd_pwc.insert(vaddr, pte_table);
        self.complete_from_pte(vaddr, pte_table, caches, phys)
    }

    /// Resume below a PMD PWC hit: read the PTE table and form the address.
    fn complete_from_pte(
        &mut self,
        vaddr: u64,
        pte_table: u64,
        caches: &mut CacheHierarchy,
        phys: &mut PhysicalMemory,
    ) -> SimResult<u64> {
        let table_addr = pte_table << PAGE_SHIFT;
        let index = self.index(Level::Pte, vaddr);
        let entry_addr = table_addr + index * self.widths[Level::Pte as usize].bytes();

        let hit = self.entry_cache_lookup(entry_addr, caches);
        let pfn = self.leaf_pfn(table_addr, index, entry_addr, phys)?;
        self.note_entry_fetch(Level::Pte, hit);

        Ok(pfn << PAGE_SHIFT | (vaddr & (PAGE_SIZE - 1)))
    }

    /// Issues the page-walker's data-cache access for one entry fetch.
    fn entry_cache_lookup(&self, entry_addr: u64, caches: &mut CacheHierarchy) -> bool {
        self.pte_cachable && caches.translate_lookup(entry_addr)
    }

    /// Books one entry fetch against the translation and level counters.
    fn note_entry_fetch(&mut self, level: Level, cache_hit: bool) {
        if cache_hit {
            self.stats.pte_dcache_hits += 1;
        } else {
            if self.pte_cachable {
                self.stats.pte_dcache_misses += 1;
            }
            self.stats.page_walk_mem_accesses += 1;
            self.level_stats[level as usize].accesses += 1;
        }
    }

    /// Reads the entry `index` of the table at `table_addr` (owned by
    /// `level`), allocating the child table on first touch, and returns the
    /// child table's frame number.
    fn child_pfn(
        &mut self,
        level: Level,
        table_addr: u64,
        index: u64,
        entry_addr: u64,
        phys: &mut PhysicalMemory,
    ) -> SimResult<u64> {
        let width = self.widths[level as usize];
        let entry = self.page(table_addr).read(width, index);

        if entry.is_present() {
            return Ok(match width {
                EntryWidth::W8 => entry.pfn(),
                _ => phys.decode_frame(entry_addr, entry.tiny(), width.tiny_bits()),
            });
        }

        let (raw, child_pfn) = match width {
            EntryWidth::W8 => {
                let pfn = phys.allocate_frame(entry_addr)?;
                (Entry::direct(pfn), pfn)
            }
            _ => {
                let (tiny, pfn) = phys.allocate_tiny_frame(entry_addr, width.tiny_bits())?;
                (Entry::narrow(width, tiny), pfn)
            }
        };
        self.page_mut(table_addr).write(width, index, raw);

        let child = level.child();
        self.pages.insert(
            child_pfn << PAGE_SHIFT,
            PtPage::new(self.entries[child as usize], self.widths[child as usize]),
        );
        self.level_stats[child as usize].allocations += 1;
        self.level_stats[level as usize].entries += 1;
        Ok(child_pfn)
    }

    /// Reads the leaf entry, allocating the data frame on first touch.
    ///
    /// Unlike `child_pfn`, the allocated frame holds program data, not a
    /// page-table page: it joins the physical-memory bitmap and the PTE
    /// level's `entries` count, but no table is created for it.
    fn leaf_pfn(
        &mut self,
        table_addr: u64,
        index: u64,
        entry_addr: u64,
        phys: &mut PhysicalMemory,
    ) -> SimResult<u64> {
        let width = self.widths[Level::Pte as usize];
        let entry = self.page(table_addr).read(width, index);

        if entry.is_present() {
            return Ok(match width {
                EntryWidth::W8 => entry.pfn(),
                _ => phys.decode_frame(entry_addr, entry.tiny(), width.tiny_bits()),
            });
        }

        let (raw, pfn) = match width {
            EntryWidth::W8 => {
                let pfn = phys.allocate_frame(entry_addr)?;
                (Entry::direct(pfn), pfn)
            }
            _ => {
                let (tiny, pfn) = phys.allocate_tiny_frame(entry_addr, width.tiny_bits())?;
                (Entry::narrow(width, tiny), pfn)
            }
        };
        self.page_mut(table_addr).write(width, index, raw);
        self.level_stats[Level::Pte as usize].entries += 1;
        Ok(pfn)
    }

    fn page(&self, table_addr: u64) -> &PtPage {
        // Table pages are created before any path can reference them and are
        // never freed.
        self.pages
            .get(&table_addr)
            .expect("page-table page missing")
    }

    fn page_mut(&mut self, table_addr: u64) -> &mut PtPage {
        self.pages
            .get_mut(&table_addr)
            .expect("page-table page missing")
    }

    /// Whether the full path for `vaddr` is present without allocating
    /// anything. Used by tests to check the lazy-allocation invariant.
    ///
    /// # Returns
    ///
    /// `true` once every entry on the path has been walked (for narrow
    /// entries, the check stops at the first present bit, since descending
    /// further would need the allocator).
    pub fn path_present(&self, vaddr: u64) -> bool {
        let mut table_addr = self.cr3;
        for level in Level::ALL {
            let width = self.widths[level as usize];
            let index = self.index(level, vaddr);
            let entry = self.page(table_addr).read(width, index);
            if !entry.is_present() {
                return false;
            }
            if level == Level::Pte {
                return true;
            }
            // Only needed to descend; narrow entries require the allocator to
            // resolve, so stop at the present bit for them.
            match width {
                EntryWidth::W8 => table_addr = entry.pfn() << PAGE_SHIFT,
                _ => return true,
            }
        }
        true
    }

    /// Translation-path counters.
    pub fn translation_stats(&self) -> &TranslationStats {
        &self.stats
    }

    /// Per-level page-table counters, PGD first.
    pub fn level_stats(&self) -> &[LevelStats; 4] {
        &self.level_stats
    }

    /// The L1 TLB.
    pub fn l1_tlb(&self) -> &Tlb {
        &self.l1_tlb
    }

    /// The L2 TLB.
    pub fn l2_tlb(&self) -> &Tlb {
        &self.l2_tlb
    }

    /// Number of live page-table pages (all levels).
    pub fn num_page_tables(&self) -> usize {
        self.pages.len()
    }

    /// Physical address of the root page.
    pub fn cr3(&self) -> u64 {
        self.cr3
    }

    /// Writes the cache-structure summary, PWC tag ranges, and the per-level
    /// page-table activity table.
    pub fn write_detailed_stats(&self, w: &mut dyn Write) -> io::Result<()> {
        self.stats.write_summary(w)?;

        writeln!(w, "\nCache Statistics:")?;
        writeln!(w, "================")?;
        writeln!(
            w,
            "{:<30}{:<10}{:<10}{:<10}{:>15}{:>15}{:>15}",
            "Cache", "Entries", "Sets", "Ways", "Accesses", "Hits", "Hit Rate"
        )?;
        writeln!(w, "{}", "-".repeat(105))?;
        write_cache_row(w, self.l1_tlb.stats())?;
        write_cache_row(w, self.l2_tlb.stats())?;
        write_cache_row(w, self.pgd_pwc.stats())?;
        write_cache_row(w, self.pud_pwc.stats())?;
        write_cache_row(w, self.pmd_pwc.stats())?;

        writeln!(w, "\nVirtual Address Bit Ranges Used for PWC Tags:")?;
        for pwc in [&self.pgd_pwc, &self.pud_pwc, &self.pmd_pwc] {
            writeln!(
                w,
                "{:<30}[{}:{}]",
                pwc.stats().name(),
                pwc.high_bit(),
                pwc.low_bit()
            )?;
        }

        writeln!(w, "\nPage Table Statistics by Level:")?;
        writeln!(w, "==============================")?;
        writeln!(
            w,
            "{:<30}{:>15}{:>15}{:>15}{:>15}",
            "Level", "Accesses", "Tables", "Entries", "Avg Fill %"
        )?;
        writeln!(w, "{}", "-".repeat(90))?;
        for level in &self.level_stats {
            writeln!(
                w,
                "{:<30}{:>15}{:>15}{:>15}{:>15.2}",
                level.name,
                level.accesses,
                level.allocations,
                level.entries,
                level.avg_fill_pct()
            )?;
        }

        writeln!(w, "\nTotal page tables: {}", self.pages.len())?;
        writeln!(
            w,
            "Total memory for page tables: {:.2} MB",
            (self.pages.len() as u64 * PAGE_SIZE) as f64 / (1024.0 * 1024.0)
        )?;
        Ok(())
    }

    /// Writes the translation-path data-cache statistics.
    pub fn write_memory_stats(&self, w: &mut dyn Write) -> io::Result<()> {
        self.stats.write_memory_stats(w)
    }
}

fn write_cache_row(w: &mut dyn Write, cache: &SetAssocCache<u64>) -> io::Result<()> {
    writeln!(
        w,
        "{:<30}{:<10}{:<10}{:<10}{:>15}{:>15}{:>14.2}%",
        cache.name(),
        cache.capacity(),
        cache.num_sets(),
        cache.ways(),
        cache.accesses(),
        cache.hits(),
        cache.hit_rate() * 100.0
    )?;
    Ok(())
}
