//! Shared helpers for log integration tests.

#![allow(dead_code)]

use ferrite_fs::InMemoryFilesystem;
use ferrite_wal::{Log, Options};
use std::sync::Arc;

/// Directory all in-memory test logs live in.
pub const WAL_DIR: &str = "/wal";

/// Opens a log in `WAL_DIR` against a shared in-memory filesystem, so a
/// test can close the log and reopen it over the same files.
pub fn open_shared(fs: &InMemoryFilesystem, options: Options) -> Log {
    Log::open_with_filesystem(Arc::new(fs.clone()), WAL_DIR, options).unwrap()
}

/// Deterministic payload for offset `i`.
pub fn payload(i: i64) -> Vec<u8> {
    format!("payload-{i:04}").into_bytes()
}

/// Appends `payload(i)` for every offset in `0..n`.
pub fn fill(log: &Log, n: i64) {
    for i in 0..n {
        log.write(i, &payload(i)).unwrap();
    }
}

/// Frames `data` the way segment files store it.
pub fn frame(data: &[u8]) -> Vec<u8> {
    let mut buf = Vec::new();
    ferrite_wal::codec::append_entry(&mut buf, data);
    buf
}

/// The 20-digit zero-padded segment file name for `offset`.
pub fn segment_file_name(offset: i64) -> String {
    format!("{offset:020}")
}
