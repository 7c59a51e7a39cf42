//! Physical memory frame allocation.
//!
//! This module models the physical-memory pool backing the simulator. It
//! provides:
//! 1. **Frame Bitmap:** One allocation bit per 4KB frame; frame 0 is reserved
//!    at construction to catch null frame numbers.
//! 2. **Linear Allocator:** A monotonically increasing next-frame counter;
//!    frames are never reused.
//! 3. **Tiny-Pointer Allocator:** The power-of-two-choices bin table, which
//!    additionally yields a compact pointer that narrow page-table entries can
//!    store in place of a full frame number.
//!
//! Exhaustion is fatal to the run: the error propagates out of the failing
//! allocation site.

/// Power-of-two-choices tiny-pointer bin table.
pub mod po2c;

pub use po2c::Po2cTable;

use crate::common::constants::PAGE_SIZE;
use crate::common::{SimError, SimResult};

/// Width of a full 8-bit tiny pointer (selector bit plus 7-bit slot).
pub const FULL_TINY_WIDTH: u8 = 8;

enum Allocator {
    Linear { next: u64 },
    TinyPtr(Po2cTable),
}

/// The physical-memory pool: an allocation bitmap plus one of the two frame
/// allocators.
pub struct PhysicalMemory {
    frames: Vec<bool>,
    allocated: u64,
    allocator: Allocator,
}

impl PhysicalMemory {
    /// Creates a pool of `total_bytes` with the linear allocator.
    pub fn new_linear(total_bytes: u64) -> Self {
        Self::with_allocator(total_bytes, Allocator::Linear { next: 1 })
    }

    /// Creates a pool of `total_bytes` with the tiny-pointer allocator,
    /// hashing with the two given seeds.
    pub fn new_tiny(total_bytes: u64, seeds: [u64; 2]) -> Self {
        let num_frames = total_bytes / PAGE_SIZE;
        Self::with_allocator(total_bytes, Allocator::TinyPtr(Po2cTable::new(num_frames, seeds)))
    }

    fn with_allocator(total_bytes: u64, allocator: Allocator) -> Self {
        let num_frames = (total_bytes / PAGE_SIZE).max(1) as usize;
        let mut frames = vec![false; num_frames];
        // Frame 0 is reserved to catch null frame numbers; it is not counted
        // as an allocation.
        frames[0] = true;
        Self {
            frames,
            allocated: 0,
            allocator,
        }
    }

    /// Allocates one frame.
    ///
    /// # Arguments
    ///
    /// * `key` - Feeds the tiny-pointer hash when that allocator is active;
    ///   the linear allocator ignores it.
    ///
    /// # Returns
    ///
    /// The allocated frame number (never 0, never repeated), or
    /// `SimError::OutOfMemory` / `SimError::TinyPtrPlacement` when no frame
    /// can be produced.
    pub fn allocate_frame(&mut self, key: u64) -> SimResult<u64> {
        let total = self.frames.len() as u64;
        let allocated = self.allocated;
        let frame = match &mut self.allocator {
            Allocator::Linear { next } => {
                if *next >= total {
                    return Err(SimError::OutOfMemory { allocated, total });
                }
                let frame = *next;
                *next += 1;
                frame
            }
            Allocator::TinyPtr(table) => table.allocate(key, FULL_TINY_WIDTH)?.1,
        };
        self.mark(frame)?;
        Ok(frame)
    }

    /// Allocates one frame through the tiny-pointer table.
    ///
    /// # Arguments
    ///
    /// * `key` - Hash key, the physical address of the parent page-table
    ///   entry.
    /// * `key_width` - Bit width of the page-table field the tiny pointer
    ///   will be stored in (6 or 8).
    ///
    /// # Returns
    ///
    /// The `(tiny pointer, frame)` pair, or an error when the linear
    /// allocator is active or no slot fits the narrowed range.
    pub fn allocate_tiny_frame(&mut self, key: u64, key_width: u8) -> SimResult<(u8, u64)> {
        let Allocator::TinyPtr(table) = &mut self.allocator else {
            return Err(SimError::Config(
                "narrow page-table entries require the tiny-pointer allocator".into(),
            ));
        };
        let (tiny, frame) = table.allocate(key, key_width)?;
        self.mark(frame)?;
        Ok((tiny, frame))
    }

    /// Resolves a stored tiny pointer back to its frame number.
    ///
    /// # Arguments
    ///
    /// * `key` - The same key the frame was allocated under.
    /// * `tiny` - The stored tiny pointer.
    /// * `key_width` - The field width used at allocation (6 or 8).
    ///
    /// # Returns
    ///
    /// The frame number the pair encodes.
    ///
    /// # Panics
    ///
    /// Panics if called under the linear allocator. That is a program error:
    /// configuration validation guarantees narrow entries never appear with
    /// the linear allocator, and wide entries store frame numbers directly.
    pub fn decode_frame(&self, key: u64, tiny: u8, key_width: u8) -> u64 {
        match &self.allocator {
            Allocator::TinyPtr(table) => table.decode(key, tiny, key_width),
            Allocator::Linear { .. } => unreachable!("tiny pointers require the tiny-pointer allocator"),
        }
    }

    fn mark(&mut self, frame: u64) -> SimResult<()> {
        if frame >= self.frames.len() as u64 {
            return Err(self.out_of_memory());
        }
        // Frames are never freed, so handing out the same frame twice is a
        // program error, not a runtime condition.
        assert!(!self.frames[frame as usize], "frame {} allocated twice", frame);
        self.frames[frame as usize] = true;
        self.allocated += 1;
        Ok(())
    }

    fn out_of_memory(&self) -> SimError {
        SimError::OutOfMemory {
            allocated: self.allocated,
            total: self.frames.len() as u64,
        }
    }

    /// Whether `frame` is currently allocated.
    pub fn is_allocated(&self, frame: u64) -> bool {
        self.frames.get(frame as usize).copied().unwrap_or(false)
    }

    /// Number of allocated frames, excluding reserved frame 0.
    pub fn allocated_frames(&self) -> u64 {
        self.allocated
    }

    /// Total number of frames in the pool.
    pub fn total_frames(&self) -> u64 {
        self.frames.len() as u64
    }

    /// Fraction of the pool that is allocated.
    pub fn utilization(&self) -> f64 {
        self.allocated as f64 / self.frames.len() as f64
    }
}
