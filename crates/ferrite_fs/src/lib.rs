//! # Ferrite FS
//!
//! Filesystem abstraction for the Ferrite storage engine.
//!
//! This crate provides the lowest-level I/O abstraction for Ferrite. The
//! storage layers above it never touch `std::fs` directly; they go through
//! the [`Filesystem`] trait so that the same code can run against the real
//! operating system or against a volatile in-memory filesystem in tests.
//!
//! ## Design Principles
//!
//! - Filesystems are plain byte stores with directory-level primitives
//!   (create, append, rename, remove, readdir, fsync)
//! - No knowledge of Ferrite file formats; the storage layers own all
//!   format interpretation
//! - Must be `Send + Sync` for concurrent access
//! - Errors are raw [`std::io::Error`] values, surfaced verbatim
//!
//! ## Available Filesystems
//!
//! - [`OsFilesystem`] - Persistent storage using OS file APIs
//! - [`InMemoryFilesystem`] - For testing and ephemeral storage
//!
//! ## Example
//!
//! ```rust
//! use ferrite_fs::{Filesystem, InMemoryFilesystem};
//! use std::path::Path;
//!
//! let fs = InMemoryFilesystem::new();
//! fs.create_dir_all(Path::new("/wal"), 0o750).unwrap();
//! let mut file = fs.create(Path::new("/wal/data"), 0o640).unwrap();
//! file.write_all(b"hello").unwrap();
//! file.sync().unwrap();
//! drop(file);
//! assert_eq!(fs.read_file(Path::new("/wal/data")).unwrap(), b"hello");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod fs;
mod memory;
mod os;

pub use fs::{FileHandle, Filesystem};
pub use memory::InMemoryFilesystem;
pub use os::OsFilesystem;
