//! Filesystem trait definitions.

use std::io;
use std::path::{Path, PathBuf};

/// An open file handle produced by a [`Filesystem`].
///
/// Handles are append-oriented: every write lands at the end of the file.
/// This matches how the storage layers use files (logs are append-only and
/// rewrites go through a fresh temporary file). The handle is closed when
/// dropped; callers that need the close to be durable call [`sync`] first.
///
/// [`sync`]: FileHandle::sync
pub trait FileHandle: Send {
    /// Writes all of `data` at the end of the file.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying write fails or the file has been
    /// removed from under the handle.
    fn write_all(&mut self, data: &[u8]) -> io::Result<()>;

    /// Flushes file data and metadata to durable storage (fsync).
    ///
    /// # Errors
    ///
    /// Returns an error if the sync operation fails.
    fn sync(&mut self) -> io::Result<()>;

    /// Positions the handle at the end of the file and returns the file
    /// length in bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the seek fails.
    fn seek_to_end(&mut self) -> io::Result<u64>;
}

/// A low-level filesystem for Ferrite storage.
///
/// Filesystems are **opaque byte stores** with directory-level primitives.
/// They provide the operations the storage layers need - create, append,
/// read, rename, remove, readdir, fsync - and nothing else. Ferrite owns
/// all file format interpretation; filesystems do not understand segments
/// or log records.
///
/// # Invariants
///
/// - `read_file` returns exactly the bytes previously written to that path
/// - `rename` replaces the destination atomically where the platform allows
/// - `read_dir` returns file basenames in lexicographic order
/// - Implementations must be `Send + Sync` for concurrent access
///
/// # Implementors
///
/// - [`super::InMemoryFilesystem`] - For testing
/// - [`super::OsFilesystem`] - For persistent storage
pub trait Filesystem: Send + Sync {
    /// Resolves `path` to an absolute path without requiring it to exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the current working directory cannot be
    /// determined.
    fn absolute(&self, path: &Path) -> io::Result<PathBuf>;

    /// Creates a directory and all of its parents with the given mode bits.
    ///
    /// Succeeds if the directory already exists.
    ///
    /// # Errors
    ///
    /// Returns an error if a component cannot be created.
    fn create_dir_all(&self, path: &Path, mode: u32) -> io::Result<()>;

    /// Returns the basenames of the regular files in `path`, sorted
    /// lexicographically.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be read.
    fn read_dir(&self, path: &Path) -> io::Result<Vec<String>>;

    /// Reads the entire contents of the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist or cannot be read.
    fn read_file(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Creates (or truncates) the file at `path` with the given mode bits
    /// and opens it for writing.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created.
    fn create(&self, path: &Path, mode: u32) -> io::Result<Box<dyn FileHandle>>;

    /// Opens the existing file at `path` for appending.
    ///
    /// The file must already exist. The handle starts at position zero;
    /// callers seek to the end via [`FileHandle::seek_to_end`] before
    /// writing.
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist or cannot be opened.
    fn open_append(&self, path: &Path, mode: u32) -> io::Result<Box<dyn FileHandle>>;

    /// Removes the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist or cannot be removed.
    fn remove(&self, path: &Path) -> io::Result<()>;

    /// Renames `from` to `to`, replacing `to` if it exists.
    ///
    /// This is the atomic commit primitive the storage layers build on.
    ///
    /// # Errors
    ///
    /// Returns an error if the rename fails.
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;

    /// Syncs the directory at `path` so that recent entry creations,
    /// renames, and removals are durable.
    ///
    /// A no-op on platforms (and filesystems) where directory fsync is not
    /// meaningful.
    ///
    /// # Errors
    ///
    /// Returns an error if the sync operation fails.
    fn sync_dir(&self, path: &Path) -> io::Result<()>;
}
