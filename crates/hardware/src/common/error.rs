//! Simulator error definitions.
//!
//! This module defines the error handling surface of the simulator. It provides:
//! 1. **Error Kinds:** Configuration, trace I/O, and resource-exhaustion failures.
//! 2. **Error Handling:** Integration with the standard Rust error traits so the
//!    driver can report any failure with a single diagnostic line.
//!
//! There is no in-core recovery: the simulator either runs the entire trace or
//! the error propagates synchronously out of the triggering call.

use std::fmt;
use std::io;

/// Result alias used by all fallible simulator operations.
pub type SimResult<T> = Result<T, SimError>;

/// Errors that terminate a simulation run.
#[derive(Debug)]
pub enum SimError {
    /// The supplied configuration violates a structural invariant
    /// (non-power-of-two entry counts, broken shift invariant, bad TOC size).
    Config(String),

    /// The trace file could not be opened or read.
    TraceIo { path: String, source: io::Error },

    /// Physical memory has no free frame left for an allocation.
    OutOfMemory { allocated: u64, total: u64 },

    /// The tiny-pointer allocator could not place a new entry: both candidate
    /// bins are full, or no free slot fits the narrowed key width.
    TinyPtrPlacement { key: u64, key_width: u8 },
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimError::Config(msg) => write!(f, "invalid configuration: {}", msg),
            SimError::TraceIo { path, source } => {
                write!(f, "trace file '{}': {}", path, source)
            }
            SimError::OutOfMemory { allocated, total } => write!(
                f,
                "physical memory exhausted ({} of {} frames allocated)",
                allocated, total
            ),
            SimError::TinyPtrPlacement { key, key_width } => write!(
                f,
                "tiny-pointer placement failed for key {:#x} (key width {} bits)",
                key, key_width
            ),
        }
    }
}

impl std::error::Error for SimError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SimError::TraceIo { source, .. } => Some(source),
            _ => None,
        }
    }
}
