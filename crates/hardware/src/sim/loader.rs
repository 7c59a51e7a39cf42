//! Trace file reading.
//!
//! This module streams memory-reference records out of a trace file. It
//! performs:
//! 1. **Batched reads:** Records are pulled in driver-sized batches to keep
//!    file I/O off the per-reference path.
//! 2. **Record decoding:** Each 24-byte little-endian record becomes a
//!    `MemRef`.
//! 3. **Tail handling:** A trailing partial record is skipped with a warning;
//!    it is not an error.

use std::fs::File;
use std::io::{BufReader, ErrorKind, Read};

use crate::common::{MemRef, SimError, SimResult};

/// A batched reader over a binary trace file.
pub struct TraceReader {
    path: String,
    file: BufReader<File>,
    buf: Vec<u8>,
}

impl TraceReader {
    /// Opens a trace file.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the binary trace file.
    ///
    /// # Returns
    ///
    /// A reader positioned at the first record, or `SimError::TraceIo` when
    /// the file cannot be opened (fatal to the run).
    pub fn open(path: &str) -> SimResult<Self> {
        let file = File::open(path).map_err(|source| SimError::TraceIo {
            path: path.to_string(),
            source,
        })?;
        Ok(Self {
            path: path.to_string(),
            file: BufReader::new(file),
            buf: Vec::new(),
        })
    }

    /// Reads up to `max_records` records into `out` (which is cleared
    /// first).
    ///
    /// # Arguments
    ///
    /// * `max_records` - Batch size limit.
    /// * `out` - Destination vector, overwritten with the decoded records.
    ///
    /// # Returns
    ///
    /// How many complete records were read; zero means end of trace. A
    /// partial trailing record is skipped with a warning, not an error.
    pub fn read_batch(&mut self, max_records: usize, out: &mut Vec<MemRef>) -> SimResult<usize> {
        out.clear();
        self.buf.resize(max_records.max(1) * MemRef::BYTES, 0);

        let mut filled = 0;
        while filled < self.buf.len() {
            match self.file.read(&mut self.buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(source) => {
                    return Err(SimError::TraceIo {
                        path: self.path.clone(),
                        source,
                    });
                }
            }
        }

        let complete = filled / MemRef::BYTES;
        if filled % MemRef::BYTES != 0 {
            log::warn!(
                "trace '{}': partial record at end of file, skipping",
                self.path
            );
        }

        for chunk in self.buf[..complete * MemRef::BYTES].chunks_exact(MemRef::BYTES) {
            out.push(MemRef::from_le_bytes(chunk.try_into().unwrap()));
        }
        Ok(complete)
    }
}
