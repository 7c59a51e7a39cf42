//! Memory hierarchy simulator library.
//!
//! This crate implements a trace-driven simulator of the x86-style
//! virtual-memory translation and data-cache subsystem of a modern CPU, with
//! the following:
//! 1. **Translation:** Two-level TLB, per-level page-walk caches (optionally
//!    with Table-of-Contents sub-indexing), and a four-level page table with
//!    on-demand allocation and variable per-level entry widths.
//! 2. **Caches:** An inclusive, write-back, write-allocate L1/L2/L3 data
//!    hierarchy with write-back propagation to a virtual main memory.
//! 3. **Physical Memory:** A frame bitmap with either a linear allocator or
//!    the power-of-two-choices tiny-pointer allocator backing narrow
//!    page-table entries.
//! 4. **Simulation:** Trace-record loader, configuration, driver API, and
//!    statistics reporting.

/// Set-associative cache engine and the data-cache hierarchy.
pub mod cache;
/// Common types and constants (addresses, records, errors).
pub mod common;
/// Simulator configuration (defaults, validation, hierarchical structures).
pub mod config;
/// Address translation (TLB, page-walk caches, page table).
pub mod mmu;
/// Physical memory and frame allocators.
pub mod phys;
/// Driver surface (simulator, trace reader).
pub mod sim;
/// Translation statistics collection and reporting.
pub mod stats;

/// Root configuration type; use `Config::default()` or deserialize from JSON.
pub use crate::config::Config;
/// One trace record (pc, effective address, size, read flag).
pub use crate::common::MemRef;
/// Main simulator type; construct with `Simulator::new`.
pub use crate::sim::Simulator;
