//! # Ferrite WAL
//!
//! Segmented write-ahead log for the Ferrite key-value store.
//!
//! The log is an append-only sequence of opaque entries, addressed by a
//! caller-assigned monotonically increasing 64-bit offset. On disk it is a
//! directory of segment files; in memory it keeps the tail segment and a
//! small LRU of recently read segments materialized.
//!
//! This crate provides:
//! - Durable, offset-addressed appends with batching
//! - Random reads by offset, with an optional zero-copy path
//! - Front and back truncation with crash-safe, rename-based commits
//! - Recovery on open from any interrupted truncation
//!
//! ## Example
//!
//! ```rust
//! use ferrite_wal::{Batch, Log, Options};
//!
//! let log = Log::open("/wal/shard-0", Options::new().in_memory(true)).unwrap();
//!
//! let mut batch = Batch::new();
//! batch.write(0, b"put k1 v1");
//! batch.write(1, b"put k2 v2");
//! log.write_batch(&mut batch).unwrap();
//!
//! assert_eq!(log.read(1).unwrap(), b"put k2 v2");
//! log.truncate_front(1).unwrap();
//! assert_eq!(log.first_index().unwrap(), 1);
//! ```
//!
//! ## Concurrency
//!
//! A [`Log`] is shared by reference across threads. Reads run in parallel
//! under a shared lock; writes, truncations, and syncs are exclusive. The
//! log has no background threads - every operation completes before its
//! call returns.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod batch;
mod cache;
pub mod codec;
mod error;
mod log;
mod options;
mod segment;

pub use batch::Batch;
pub use error::{WalError, WalResult};
pub use log::{Log, DEFAULT_NAMESPACE};
pub use options::{
    Options, DEFAULT_DIR_PERMS, DEFAULT_FILE_PERMS, DEFAULT_SEGMENT_CACHE_SIZE,
    DEFAULT_SEGMENT_SIZE,
};
