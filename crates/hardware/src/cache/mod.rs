//! Set-associative LRU cache engine.
//!
//! This module implements the generic N-way set-associative store that backs
//! every cache-like structure in the simulator (TLBs, page-walk caches, and
//! the data-cache levels). It provides:
//! 1. **Storage:** A fixed `[set][way]` grid of entries carrying tag, value,
//!    valid, dirty, and an LRU stamp.
//! 2. **LRU Policy:** A per-cache 64-bit counter, pre-incremented on every
//!    touch; the victim is the valid entry with the smallest stamp, with
//!    invalid ways preferred.
//! 3. **Eviction Surfacing:** `insert` returns the displaced victim so each
//!    specialization decides what a write-back means (the TLB and PWC discard
//!    it, the data cache propagates it down the hierarchy).
//!
//! Set selection is left to the wrapping structure: the TLB indexes by
//! `vpn % sets`, the PWC by a virtual-address bit slice, and the data cache by
//! `tag & (sets - 1)`.

/// Data-cache specialization (line tags, read/write split, miss classes).
pub mod data;

/// Three-level inclusive cache hierarchy.
pub mod hierarchy;

pub use data::DataCache;
pub use hierarchy::CacheHierarchy;

/// A single cache entry.
#[derive(Clone, Default)]
struct Entry<V> {
    tag: u64,
    value: V,
    valid: bool,
    dirty: bool,
    stamp: u64,
}

/// A valid entry displaced by an insertion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Evicted<V> {
    /// Tag of the displaced entry.
    pub tag: u64,
    /// Stored value of the displaced entry.
    pub value: V,
    /// Whether the entry was modified and needs writing back.
    pub dirty: bool,
}

/// Generic N-way set-associative cache with per-set LRU replacement.
pub struct SetAssocCache<V> {
    name: String,
    num_sets: usize,
    ways: usize,
    accesses: u64,
    hits: u64,
    stamp: u64,
    sets: Vec<Vec<Entry<V>>>,
}

impl<V: Clone + Default> SetAssocCache<V> {
    /// Creates a cache of `num_sets` sets with `ways` entries each, all
    /// initially invalid.
    ///
    /// # Arguments
    ///
    /// * `name` - Cache name used in reports.
    /// * `num_sets` - Number of sets (clamped to at least 1).
    /// * `ways` - Associativity (clamped to at least 1).
    ///
    /// # Returns
    ///
    /// A new `SetAssocCache` with every entry invalid and all counters zero.
    pub fn new(name: impl Into<String>, num_sets: usize, ways: usize) -> Self {
        let num_sets = num_sets.max(1);
        let ways = ways.max(1);
        Self {
            name: name.into(),
            num_sets,
            ways,
            accesses: 0,
            hits: 0,
            stamp: 0,
            sets: vec![vec![Entry::default(); ways]; num_sets],
        }
    }

    /// Looks up `tag` within `set`.
    ///
    /// Counts the access; on a match counts the hit, refreshes the entry's
    /// LRU stamp, and returns a copy of the stored value.
    ///
    /// # Arguments
    ///
    /// * `set` - Set index; must be below `num_sets()`.
    /// * `tag` - Tag to match against the set's valid entries.
    ///
    /// # Returns
    ///
    /// `Some(value)` on a hit, `None` on a miss.
    ///
    /// # Panics
    ///
    /// This function will not panic from in-crate callers. Set indexing is
    /// guaranteed safe because every wrapper derives `set` from the tag by
    /// modulo (`TLB`, `PageWalkCache`) or by masking with `num_sets - 1`
    /// (`DataCache`), both of which stay below `num_sets`.
    pub fn lookup(&mut self, set: usize, tag: u64) -> Option<V> {
        self.accesses += 1;
        let way = self.find_way(set, tag)?;
        self.hits += 1;
        self.touch(set, way);
        Some(self.sets[set][way].value.clone())
    }

    /// Inserts `(tag, value)` into `set`.
    ///
    /// If the tag is already present its value is overwritten and the dirty
    /// bit is set when `is_write` is true. Otherwise the LRU way is replaced.
    ///
    /// # Arguments
    ///
    /// * `set` - Set index; must be below `num_sets()`.
    /// * `tag` - Tag to install.
    /// * `value` - Value to store alongside the tag.
    /// * `is_write` - Marks the entry dirty when true.
    ///
    /// # Returns
    ///
    /// The displaced valid entry, if the installation evicted one, for the
    /// caller to write back or discard. `None` on an in-place update or when
    /// the victim way was invalid.
    pub fn insert(&mut self, set: usize, tag: u64, value: V, is_write: bool) -> Option<Evicted<V>> {
        if let Some(way) = self.find_way(set, tag) {
            let entry = &mut self.sets[set][way];
            entry.value = value;
            if is_write {
                entry.dirty = true;
            }
            self.touch(set, way);
            return None;
        }

        let way = self.victim_way(set);
        let victim = std::mem::replace(
            &mut self.sets[set][way],
            Entry {
                tag,
                value,
                valid: true,
                dirty: is_write,
                stamp: 0,
            },
        );
        self.touch(set, way);

        victim.valid.then_some(Evicted {
            tag: victim.tag,
            value: victim.value,
            dirty: victim.dirty,
        })
    }

    /// Non-counting lookup for inspection.
    ///
    /// # Returns
    ///
    /// The stored value and dirty bit, without touching LRU state or
    /// statistics; `None` when the tag is not resident.
    pub fn probe(&self, set: usize, tag: u64) -> Option<(V, bool)> {
        let way = self.find_way(set, tag)?;
        let entry = &self.sets[set][way];
        Some((entry.value.clone(), entry.dirty))
    }

    /// Index of the way holding `tag`, if present and valid.
    pub(crate) fn find_way(&self, set: usize, tag: u64) -> Option<usize> {
        self.sets[set]
            .iter()
            .position(|e| e.valid && e.tag == tag)
    }

    /// Selects the replacement victim for `set`: the first invalid way if
    /// any, otherwise the valid way with the smallest LRU stamp.
    pub(crate) fn victim_way(&self, set: usize) -> usize {
        let mut victim = 0;
        let mut min_stamp = self.sets[set][0].stamp;
        for (way, entry) in self.sets[set].iter().enumerate() {
            if !entry.valid {
                return way;
            }
            if entry.stamp < min_stamp {
                min_stamp = entry.stamp;
                victim = way;
            }
        }
        victim
    }

    /// Marks `(set, way)` as most recently used.
    pub(crate) fn touch(&mut self, set: usize, way: usize) {
        self.stamp += 1;
        self.sets[set][way].stamp = self.stamp;
    }

    /// Installs an entry directly into `(set, way)`, replacing whatever was
    /// there. Used by the TOC insert path, which manages its own sub-entries.
    pub(crate) fn install(&mut self, set: usize, way: usize, tag: u64, value: V, dirty: bool) {
        self.sets[set][way] = Entry {
            tag,
            value,
            valid: true,
            dirty,
            stamp: 0,
        };
        self.touch(set, way);
    }

    /// Counts one access without going through `lookup` (TOC path).
    pub(crate) fn note_access(&mut self) {
        self.accesses += 1;
    }

    /// Counts one hit without going through `lookup` (TOC path).
    pub(crate) fn note_hit(&mut self) {
        self.hits += 1;
    }

    /// Cache name for reporting.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of sets.
    pub fn num_sets(&self) -> usize {
        self.num_sets
    }

    /// Associativity.
    pub fn ways(&self) -> usize {
        self.ways
    }

    /// Total entry capacity (`sets * ways`).
    pub fn capacity(&self) -> u64 {
        (self.num_sets * self.ways) as u64
    }

    /// Total lookups performed.
    pub fn accesses(&self) -> u64 {
        self.accesses
    }

    /// Lookups that matched.
    pub fn hits(&self) -> u64 {
        self.hits
    }

    /// Hit ratio in [0, 1]; zero when nothing was accessed.
    pub fn hit_rate(&self) -> f64 {
        if self.accesses > 0 {
            self.hits as f64 / self.accesses as f64
        } else {
            0.0
        }
    }

    /// Current value of the global LRU counter.
    pub(crate) fn stamp(&self) -> u64 {
        self.stamp
    }
}
