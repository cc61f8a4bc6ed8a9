//! In-memory filesystem for testing.

use crate::fs::{FileHandle, Filesystem};
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// An in-memory filesystem.
///
/// All state lives in memory and is lost when the last clone is dropped.
/// Suitable for:
/// - Unit and integration tests
/// - Ephemeral logs that do not need persistence
///
/// # Thread Safety
///
/// The filesystem is thread-safe. Clones share the same state, so a test
/// can hand one clone to a log, close the log, and reopen it against the
/// same files through another clone.
///
/// # Example
///
/// ```rust
/// use ferrite_fs::{Filesystem, InMemoryFilesystem};
/// use std::path::Path;
///
/// let fs = InMemoryFilesystem::new();
/// fs.create_dir_all(Path::new("/logs"), 0o750).unwrap();
/// let mut file = fs.create(Path::new("/logs/a"), 0o640).unwrap();
/// file.write_all(b"bytes").unwrap();
/// drop(file);
/// assert_eq!(fs.read_dir(Path::new("/logs")).unwrap(), vec!["a"]);
/// ```
#[derive(Debug, Default, Clone)]
pub struct InMemoryFilesystem {
    state: Arc<RwLock<State>>,
}

#[derive(Debug, Default)]
struct State {
    dirs: BTreeSet<PathBuf>,
    files: BTreeMap<PathBuf, Vec<u8>>,
}

impl InMemoryFilesystem {
    /// Creates a new empty in-memory filesystem.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the contents of `path`, if the file exists.
    ///
    /// Useful for crash-scenario tests that need to inspect or clone raw
    /// file bytes.
    #[must_use]
    pub fn snapshot(&self, path: &Path) -> Option<Vec<u8>> {
        self.state.read().files.get(path).cloned()
    }

    /// Overwrites (or creates) the file at `path` with `data`.
    ///
    /// Useful for planting crafted files in recovery tests.
    pub fn plant(&self, path: &Path, data: Vec<u8>) {
        self.state.write().files.insert(path.to_path_buf(), data);
    }
}

struct MemoryFile {
    state: Arc<RwLock<State>>,
    path: PathBuf,
}

impl FileHandle for MemoryFile {
    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        let mut state = self.state.write();
        let file = state
            .files
            .get_mut(&self.path)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "file removed"))?;
        file.extend_from_slice(data);
        Ok(())
    }

    fn sync(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn seek_to_end(&mut self) -> io::Result<u64> {
        let state = self.state.read();
        let file = state
            .files
            .get(&self.path)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "file removed"))?;
        Ok(file.len() as u64)
    }
}

impl Filesystem for InMemoryFilesystem {
    fn absolute(&self, path: &Path) -> io::Result<PathBuf> {
        Ok(path.to_path_buf())
    }

    fn create_dir_all(&self, path: &Path, _mode: u32) -> io::Result<()> {
        let mut state = self.state.write();
        for ancestor in path.ancestors() {
            state.dirs.insert(ancestor.to_path_buf());
        }
        Ok(())
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<String>> {
        let state = self.state.read();
        if !state.dirs.contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                "directory not found",
            ));
        }
        let mut names: Vec<String> = state
            .files
            .keys()
            .filter(|p| p.parent() == Some(path))
            .filter_map(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .collect();
        names.sort();
        Ok(names)
    }

    fn read_file(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.state
            .read()
            .files
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "file not found"))
    }

    fn create(&self, path: &Path, _mode: u32) -> io::Result<Box<dyn FileHandle>> {
        self.state
            .write()
            .files
            .insert(path.to_path_buf(), Vec::new());
        Ok(Box::new(MemoryFile {
            state: Arc::clone(&self.state),
            path: path.to_path_buf(),
        }))
    }

    fn open_append(&self, path: &Path, _mode: u32) -> io::Result<Box<dyn FileHandle>> {
        if !self.state.read().files.contains_key(path) {
            return Err(io::Error::new(io::ErrorKind::NotFound, "file not found"));
        }
        Ok(Box::new(MemoryFile {
            state: Arc::clone(&self.state),
            path: path.to_path_buf(),
        }))
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        self.state
            .write()
            .files
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "file not found"))
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        let mut state = self.state.write();
        let data = state
            .files
            .remove(from)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "file not found"))?;
        state.files.insert(to.to_path_buf(), data);
        Ok(())
    }

    fn sync_dir(&self, _path: &Path) -> io::Result<()> {
        Ok(())
    }
}
