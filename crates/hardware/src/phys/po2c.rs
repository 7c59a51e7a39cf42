//! Power-of-two-choices tiny-pointer bin table.
//!
//! Physical frames are partitioned into bins of 127 slots. Two independent
//! seeded XxHash64 functions map a caller-supplied key (the parent page-table
//! entry's physical address) to two candidate bins; an allocation goes to the
//! less-full one. The returned tiny pointer packs the chosen-bin selector bit
//! together with the 7-bit slot index, so the frame can later be recovered
//! from nothing but the key and the tiny pointer.
//!
//! When the tiny pointer is stored in a field narrower than 8 bits, the slot
//! space shrinks to `2^(key_width - 1)` and the selector bit moves down to bit
//! `key_width - 1`; the free list is walked from its head until a slot inside
//! the narrowed range turns up.

use std::hash::Hasher;

use twox_hash::XxHash64;

use crate::common::{SimError, SimResult};

/// Frames per bin. Slots are 1-based (1..=127) so that 0 never encodes a
/// valid tiny pointer.
pub const BIN_SIZE: u64 = 127;

/// One bin: a singly linked free list embedded in a 127-slot array.
///
/// `next[i]` holds the successor slot of slot `i + 1`; a successor beyond
/// `BIN_SIZE` terminates the list. Slots are handed out in ascending order
/// because frames, once allocated, are never returned.
#[derive(Clone)]
struct Bin {
    next: [u8; BIN_SIZE as usize],
    head: u8,
    count: u8,
}

impl Bin {
    fn new() -> Self {
        let mut next = [0u8; BIN_SIZE as usize];
        for (i, slot) in next.iter_mut().enumerate() {
            *slot = i as u8 + 2;
        }
        Self {
            next,
            head: 1,
            count: 0,
        }
    }

    fn is_full(&self) -> bool {
        u64::from(self.count) == BIN_SIZE
    }

    /// Takes a free slot, restricted to slot indices below
    /// `2^(key_width - 1)`. Returns the 1-based slot, or `None` when the bin
    /// is full or no slot fits the narrowed range.
    fn take(&mut self, key_width: u8) -> Option<u8> {
        if self.is_full() {
            return None;
        }
        let limit = 1u16 << (key_width - 1);

        if key_width == 8 || u16::from(self.head) < limit {
            let slot = self.head;
            self.head = self.next[slot as usize - 1];
            self.count += 1;
            return Some(slot);
        }

        // Head is outside the narrowed range: walk the chain for a slot that
        // still fits, unlinking it in place.
        let mut prev = self.head;
        let mut cur = self.next[prev as usize - 1];
        while u64::from(cur) <= BIN_SIZE && cur != 0 {
            if u16::from(cur) < limit {
                self.next[prev as usize - 1] = self.next[cur as usize - 1];
                self.count += 1;
                return Some(cur);
            }
            prev = cur;
            cur = self.next[cur as usize - 1];
        }
        None
    }
}

/// The two-choice bin allocator producing `(tiny pointer, frame)` pairs.
pub struct Po2cTable {
    bins: Vec<Bin>,
    seeds: [u64; 2],
}

impl Po2cTable {
    /// Builds a table covering `num_frames` frames.
    ///
    /// Slot 1 of bin 0 corresponds to frame 0, which is reserved; that slot
    /// is consumed here so no allocation can ever produce it.
    ///
    /// # Arguments
    ///
    /// * `num_frames` - Frames to cover; the table holds
    ///   `num_frames / 127` bins (at least one).
    /// * `seeds` - Seeds for the two independent hash functions.
    pub fn new(num_frames: u64, seeds: [u64; 2]) -> Self {
        let num_bins = (num_frames / BIN_SIZE).max(1);
        let mut bins = vec![Bin::new(); num_bins as usize];
        let reserved = bins[0].take(8);
        debug_assert_eq!(reserved, Some(1));
        Self { bins, seeds }
    }

    fn bin_of(&self, key: u64, which: usize) -> u64 {
        let mut hasher = XxHash64::with_seed(self.seeds[which]);
        hasher.write(&key.to_le_bytes());
        hasher.finish() % self.bins.len() as u64
    }

    /// Allocates a frame for `key`.
    ///
    /// Hashes the key to its two candidate bins and inserts into the
    /// less-full one.
    ///
    /// # Arguments
    ///
    /// * `key` - Caller-supplied hash key (the parent entry's physical
    ///   address).
    /// * `key_width` - Bit width of the stored tiny pointer, between 2
    ///   and 8; slots are restricted to `2^(key_width - 1) - 1` values.
    ///
    /// # Returns
    ///
    /// The tiny pointer (selector bit at `key_width - 1`, slot in the low
    /// bits) together with the frame number `bin * 127 + slot - 1`, or
    /// `SimError::TinyPtrPlacement` when the chosen bin has no usable slot.
    ///
    /// # Panics
    ///
    /// This function will not panic. Bin indices come from a hash reduced
    /// modulo the bin count, and slot arithmetic is bounded by `BIN_SIZE`.
    pub fn allocate(&mut self, key: u64, key_width: u8) -> SimResult<(u8, u64)> {
        let b0 = self.bin_of(key, 0);
        let b1 = self.bin_of(key, 1);
        let (bin, selector) = if self.bins[b1 as usize].count < self.bins[b0 as usize].count {
            (b1, 1u8)
        } else {
            (b0, 0u8)
        };

        let slot = self.bins[bin as usize]
            .take(key_width)
            .ok_or(SimError::TinyPtrPlacement { key, key_width })?;

        let tiny = (selector << (key_width - 1)) | slot;
        let frame = bin * BIN_SIZE + u64::from(slot) - 1;
        Ok((tiny, frame))
    }

    /// Recovers the frame number from a key and tiny pointer by rehashing
    /// the key with the selector's seed.
    ///
    /// # Arguments
    ///
    /// * `key` - The same key the tiny pointer was allocated under.
    /// * `tiny` - The stored tiny pointer.
    /// * `key_width` - The width used at allocation, between 2 and 8.
    ///
    /// # Returns
    ///
    /// `bin * 127 + slot - 1` for the encoded bin selector and slot. For
    /// every successful `allocate(key, w) -> (tiny, frame)`,
    /// `decode(key, tiny, w) == frame`.
    pub fn decode(&self, key: u64, tiny: u8, key_width: u8) -> u64 {
        let selector = (tiny >> (key_width - 1)) & 1;
        let slot = tiny & ((1u8 << (key_width - 1)) - 1);
        let bin = self.bin_of(key, selector as usize);
        bin * BIN_SIZE + u64::from(slot) - 1
    }

    /// Number of bins in the table.
    pub fn num_bins(&self) -> usize {
        self.bins.len()
    }

    /// Occupancy of one bin, for inspection.
    pub fn bin_count(&self, bin: usize) -> u8 {
        self.bins[bin].count
    }
}
