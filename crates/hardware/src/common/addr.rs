//! Physical and Virtual Address types.
//!
//! This module defines strong types for physical and virtual addresses to prevent
//! accidental mixing of address spaces. It provides the following:
//! 1. **Type Safety:** Distinguishes between virtual and physical address spaces at compile time.
//! 2. **Address Manipulation:** Helper methods for page numbers and page offsets.

use super::constants::{PAGE_MASK, PAGE_SHIFT};

/// A virtual address as supplied by the trace.
///
/// Virtual addresses are what the traced program references; they must be
/// translated through the TLBs and page table before touching the cache
/// hierarchy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct VirtAddr(pub u64);

/// A physical address produced by translation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct PhysAddr(pub u64);

impl VirtAddr {
    /// Creates a new virtual address from a raw 64-bit value.
    ///
    /// # Arguments
    ///
    /// * `addr` - The raw 64-bit address value.
    ///
    /// # Returns
    ///
    /// A new `VirtAddr` wrapping the provided address.
    #[inline(always)]
    pub fn new(addr: u64) -> Self {
        Self(addr)
    }

    /// Returns the raw 64-bit address value.
    #[inline(always)]
    pub fn val(&self) -> u64 {
        self.0
    }

    /// Returns the virtual page number (address >> 12).
    #[inline(always)]
    pub fn vpn(&self) -> u64 {
        self.0 >> PAGE_SHIFT
    }

    /// Returns the byte offset within the 4KB page (0-4095).
    #[inline(always)]
    pub fn page_offset(&self) -> u64 {
        self.0 & PAGE_MASK
    }
}

impl PhysAddr {
    /// Creates a new physical address from a raw 64-bit value.
    ///
    /// # Arguments
    ///
    /// * `addr` - The raw 64-bit address value.
    ///
    /// # Returns
    ///
    /// A new `PhysAddr` wrapping the provided address.
    #[inline(always)]
    pub fn new(addr: u64) -> Self {
        Self(addr)
    }

    /// Returns the raw 64-bit address value.
    #[inline(always)]
    pub fn val(&self) -> u64 {
        self.0
    }

    /// Returns the physical frame number (address >> 12).
    #[inline(always)]
    pub fn pfn(&self) -> u64 {
        self.0 >> PAGE_SHIFT
    }
}
