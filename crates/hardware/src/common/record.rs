//! Memory-reference trace records.
//!
//! A trace file is a flat sequence of fixed 24-byte little-endian records with
//! no header and no framing. The layout is a bit-exact external contract:
//! `pc: u64`, `ea: u64`, `size: u32`, `is_read: u32` (0 = write, non-zero =
//! read).

/// One memory reference from the trace.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MemRef {
    /// Program counter of the referencing instruction (opaque).
    pub pc: u64,
    /// Effective virtual address of the access.
    pub ea: u64,
    /// Access size in bytes.
    pub size: u32,
    /// True for a read, false for a write.
    pub is_read: bool,
}

impl MemRef {
    /// On-disk record size in bytes.
    pub const BYTES: usize = 24;

    /// Decodes one record from its fixed little-endian layout.
    ///
    /// # Arguments
    ///
    /// * `raw` - Exactly 24 bytes: `pc: u64`, `ea: u64`, `size: u32`,
    ///   `is_read: u32` (0 = write, non-zero = read).
    ///
    /// # Returns
    ///
    /// The decoded record.
    ///
    /// # Panics
    ///
    /// This function will not panic. The slice-to-array conversions are over
    /// fixed ranges of the 24-byte input array.
    pub fn from_le_bytes(raw: &[u8; Self::BYTES]) -> Self {
        let pc = u64::from_le_bytes(raw[0..8].try_into().unwrap());
        let ea = u64::from_le_bytes(raw[8..16].try_into().unwrap());
        let size = u32::from_le_bytes(raw[16..20].try_into().unwrap());
        let read = u32::from_le_bytes(raw[20..24].try_into().unwrap());
        Self {
            pc,
            ea,
            size,
            is_read: read != 0,
        }
    }

    /// Encodes the record back into its on-disk layout.
    pub fn to_le_bytes(&self) -> [u8; Self::BYTES] {
        let mut raw = [0u8; Self::BYTES];
        raw[0..8].copy_from_slice(&self.pc.to_le_bytes());
        raw[8..16].copy_from_slice(&self.ea.to_le_bytes());
        raw[16..20].copy_from_slice(&self.size.to_le_bytes());
        raw[20..24].copy_from_slice(&u32::from(self.is_read).to_le_bytes());
        raw
    }
}
