//! Common utilities and types used throughout the memory hierarchy simulator.
//!
//! This module provides fundamental building blocks that are shared across all
//! components of the simulator. It includes:
//! 1. **Address Types:** Strong types for virtual and physical addresses.
//! 2. **Constants:** Page geometry and trace-record layout constants.
//! 3. **Trace Records:** The fixed 24-byte memory-reference record.
//! 4. **Error Handling:** The simulator-wide error type.

/// Address type definitions (physical and virtual addresses).
pub mod addr;

/// Common constants used throughout the simulator.
pub mod constants;

/// Simulator error types.
pub mod error;

/// Memory-reference trace record definitions.
pub mod record;

pub use addr::{PhysAddr, VirtAddr};
pub use constants::{PAGE_MASK, PAGE_SHIFT, PAGE_SIZE, VADDR_BITS};
pub use error::{SimError, SimResult};
pub use record::MemRef;
