//! Global system constants.
//!
//! This module defines system-wide constants used across the simulator. It includes:
//! 1. **Page Geometry:** Page size, shift, and offset mask for 4KB pages.
//! 2. **Address Space:** Canonical virtual-address width.
//! 3. **Simulation Constants:** Progress-reporting interval.

/// Page size in bytes (4KB).
pub const PAGE_SIZE: u64 = 4096;

/// Number of bits to shift to convert between byte addresses and page numbers.
pub const PAGE_SHIFT: u32 = 12;

/// Mask for extracting the byte offset within a page.
pub const PAGE_MASK: u64 = PAGE_SIZE - 1;

/// Number of translated bits in a canonical x86-64 virtual address.
pub const VADDR_BITS: u32 = 48;

/// Highest virtual-address bit covered by a page-walk-cache tag.
pub const PWC_HIGH_BIT: u32 = 47;

/// Number of references between progress updates during simulation.
pub const PROGRESS_INTERVAL: u64 = 10_000_000;
