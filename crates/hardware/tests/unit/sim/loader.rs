//! Trace Reader Unit Tests.
//!
//! Verifies the binary trace reader:
//! - Record decoding from the fixed 24-byte little-endian layout
//! - Batched reads and batch-size limits
//! - Partial trailing records being skipped
//! - Open failures surfacing as errors

use std::io::Write;

use memsim_core::common::{MemRef, SimError};
use memsim_core::sim::TraceReader;

/// Writes `records` (plus `extra` raw bytes) to a temp trace file.
fn write_trace(records: &[MemRef], extra: &[u8]) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    for record in records {
        file.write_all(&record.to_le_bytes()).unwrap();
    }
    file.write_all(extra).unwrap();
    file.flush().unwrap();
    file
}

fn sample(n: u64) -> Vec<MemRef> {
    (0..n)
        .map(|i| MemRef {
            pc: 0x40_0000 + i * 4,
            ea: 0x1000 + i * 8,
            size: 8,
            is_read: i % 2 == 0,
        })
        .collect()
}

// ══════════════════════════════════════════════════════════
// 1. Decoding
// ══════════════════════════════════════════════════════════

#[test]
fn record_layout_round_trips() {
    let record = MemRef {
        pc: 0x1122_3344_5566_7788,
        ea: 0x99AA_BBCC_DDEE_FF00,
        size: 16,
        is_read: true,
    };
    let raw = record.to_le_bytes();
    assert_eq!(raw.len(), 24);
    assert_eq!(MemRef::from_le_bytes(&raw), record);

    // is_read is "non-zero means read".
    let mut raw = record.to_le_bytes();
    raw[20..24].copy_from_slice(&7u32.to_le_bytes());
    assert!(MemRef::from_le_bytes(&raw).is_read);
}

#[test]
fn reads_all_complete_records() {
    let records = sample(5);
    let file = write_trace(&records, &[]);

    let mut reader = TraceReader::open(file.path().to_str().unwrap()).unwrap();
    let mut batch = Vec::new();
    assert_eq!(reader.read_batch(100, &mut batch).unwrap(), 5);
    assert_eq!(batch, records);
    assert_eq!(reader.read_batch(100, &mut batch).unwrap(), 0);
}

// ══════════════════════════════════════════════════════════
// 2. Batching
// ══════════════════════════════════════════════════════════

#[test]
fn honors_batch_size() {
    let records = sample(7);
    let file = write_trace(&records, &[]);

    let mut reader = TraceReader::open(file.path().to_str().unwrap()).unwrap();
    let mut batch = Vec::new();
    assert_eq!(reader.read_batch(3, &mut batch).unwrap(), 3);
    assert_eq!(batch, records[0..3]);
    assert_eq!(reader.read_batch(3, &mut batch).unwrap(), 3);
    assert_eq!(batch, records[3..6]);
    assert_eq!(reader.read_batch(3, &mut batch).unwrap(), 1);
    assert_eq!(batch, records[6..7]);
}

// ══════════════════════════════════════════════════════════
// 3. Partial Tail
// ══════════════════════════════════════════════════════════

#[test]
fn partial_trailing_record_is_skipped() {
    let records = sample(3);
    let file = write_trace(&records, &[0xAB; 10]);

    let mut reader = TraceReader::open(file.path().to_str().unwrap()).unwrap();
    let mut batch = Vec::new();
    assert_eq!(reader.read_batch(100, &mut batch).unwrap(), 3);
    assert_eq!(batch, records);
    assert_eq!(reader.read_batch(100, &mut batch).unwrap(), 0);
}

// ══════════════════════════════════════════════════════════
// 4. Open Failure
// ══════════════════════════════════════════════════════════

#[test]
fn missing_file_is_an_error() {
    match TraceReader::open("/nonexistent/trace.bin") {
        Err(SimError::TraceIo { path, .. }) => assert_eq!(path, "/nonexistent/trace.bin"),
        other => panic!("expected TraceIo, got {:?}", other.map(|_| "reader")),
    }
}
