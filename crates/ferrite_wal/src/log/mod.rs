//! The write-ahead log.
//!
//! A log is a directory of segment files, each named by the 20-digit
//! zero-padded offset of its first entry:
//!
//! ```text
//! <log_path>/
//! ├─ 00000000000000000000            # first segment
//! ├─ 00000000000000004215            # next segment
//! └─ 00000000000000009417            # tail segment, open for appending
//! ```
//!
//! Entries are framed with a uvarint length prefix and addressed by a
//! caller-assigned, monotonically increasing `i64` offset. The tail
//! segment is open for appending; older segments are immutable until a
//! truncation deletes them.
//!
//! ## Recovery
//!
//! Truncation rewrites a boundary segment through a `TEMP` file and an
//! atomic rename to a marker name (`.START`, `.END`, or `.TRUNCATE`).
//! The rename is the commit point: if the process dies at any moment, the
//! next open finds at most one marker and replays the remaining cleanup.
//!
//! ## Locking
//!
//! The log is a passive object guarded by one reader/writer lock. Appends,
//! truncations, and syncs hold it exclusively; reads and index queries
//! share it. A read that has to materialize a dormant segment re-acquires
//! the lock exclusively to load it through the segment cache.

mod truncate;

use crate::batch::Batch;
use crate::cache::SegmentCache;
use crate::codec::{self, EntryPos};
use crate::error::{WalError, WalResult};
use crate::options::Options;
use crate::segment::{parse_segment_name, segment_name, Segment, SegmentMarker};
use ferrite_fs::{FileHandle, Filesystem, InMemoryFilesystem, OsFilesystem};
use metrics::{histogram, Histogram};
use parking_lot::RwLock;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Namespace label attached to metrics by [`Log::open`].
pub const DEFAULT_NAMESPACE: &str = "default";

/// A segmented write-ahead log.
///
/// Entries are opaque byte blobs addressed by caller-assigned offsets.
/// The log stores entries exactly for the offsets in
/// `[first_index, last_index]`; an empty log has
/// `last_index == first_index - 1`.
///
/// # Example
///
/// ```rust
/// use ferrite_wal::{Log, Options};
///
/// let log = Log::open("/wal/shard-0", Options::new().in_memory(true)).unwrap();
/// log.write(0, b"first entry").unwrap();
/// assert_eq!(log.read(0).unwrap(), b"first entry");
/// assert_eq!(log.last_index().unwrap(), 0);
/// ```
pub struct Log {
    inner: RwLock<LogInner>,
}

pub(crate) struct LogInner {
    /// Filesystem all I/O goes through.
    pub(crate) fs: Arc<dyn Filesystem>,
    /// Absolute path of the log directory.
    pub(crate) path: PathBuf,
    pub(crate) opts: Options,
    pub(crate) closed: bool,
    /// Sticky until the log is closed and reopened.
    pub(crate) corrupt: bool,
    /// All known segments, ordered by base offset.
    pub(crate) segments: Vec<Segment>,
    pub(crate) first_offset: i64,
    pub(crate) last_offset: i64,
    /// Open handle to the tail segment file.
    pub(crate) tail_file: Option<Box<dyn FileHandle>>,
    pub(crate) cache: SegmentCache,
    /// Reusable batch backing [`Log::write`].
    wbatch: Batch,
    sync_latency: Histogram,
}

impl Log {
    /// Opens the log at `path`, creating it if missing.
    ///
    /// # Errors
    ///
    /// Returns [`WalError::Corrupt`] if the directory holds conflicting
    /// truncation markers or a segment fails to decode, or an I/O error if
    /// the directory cannot be read.
    pub fn open(path: impl AsRef<Path>, options: Options) -> WalResult<Self> {
        Self::open_sharded(path, DEFAULT_NAMESPACE, 0, options)
    }

    /// Opens the log for one shard of a namespace.
    ///
    /// Identical to [`open`](Self::open) except that the sync-latency
    /// histogram is labelled with `namespace` and `shard`, so a node
    /// hosting many shards can tell their logs apart.
    ///
    /// # Errors
    ///
    /// As for [`open`](Self::open).
    pub fn open_sharded(
        path: impl AsRef<Path>,
        namespace: &str,
        shard: i64,
        options: Options,
    ) -> WalResult<Self> {
        let options = options.normalized();
        let fs: Arc<dyn Filesystem> = if options.in_memory {
            Arc::new(InMemoryFilesystem::new())
        } else {
            Arc::new(OsFilesystem::new())
        };
        Self::open_inner(fs, path.as_ref(), namespace, shard, options)
    }

    /// Opens the log against a caller-supplied filesystem.
    ///
    /// Lets tests share one [`InMemoryFilesystem`] across close/reopen
    /// cycles, and embedders plug in custom storage. The `in_memory`
    /// option is ignored on this path.
    ///
    /// # Errors
    ///
    /// As for [`open`](Self::open).
    pub fn open_with_filesystem(
        fs: Arc<dyn Filesystem>,
        path: impl AsRef<Path>,
        options: Options,
    ) -> WalResult<Self> {
        Self::open_inner(
            fs,
            path.as_ref(),
            DEFAULT_NAMESPACE,
            0,
            options.normalized(),
        )
    }

    fn open_inner(
        fs: Arc<dyn Filesystem>,
        path: &Path,
        namespace: &str,
        shard: i64,
        options: Options,
    ) -> WalResult<Self> {
        let path = fs.absolute(path)?;
        fs.create_dir_all(&path, options.dir_perms)?;

        let sync_latency = histogram!(
            "ferrite_wal_sync_duration_seconds",
            "namespace" => namespace.to_owned(),
            "shard" => shard.to_string()
        );

        let cache = SegmentCache::new(options.segment_cache_size);
        let mut inner = LogInner {
            fs,
            path,
            opts: options,
            closed: false,
            corrupt: false,
            segments: Vec::new(),
            first_offset: 0,
            last_offset: -1,
            tail_file: None,
            cache,
            wbatch: Batch::new(),
            sync_latency,
        };
        inner.load()?;
        debug!(
            path = %inner.path.display(),
            first_offset = inner.first_offset,
            last_offset = inner.last_offset,
            segments = inner.segments.len(),
            "opened log"
        );
        Ok(Self {
            inner: RwLock::new(inner),
        })
    }

    /// Closes the log, syncing the tail segment first.
    ///
    /// # Errors
    ///
    /// Returns [`WalError::Closed`] if already closed, or
    /// [`WalError::Corrupt`] if the log was marked corrupt - closing is
    /// how a corrupt log is reset before reopening.
    pub fn close(&self) -> WalResult<()> {
        let mut inner = self.inner.write();
        if inner.closed {
            return Err(if inner.corrupt {
                WalError::Corrupt
            } else {
                WalError::Closed
            });
        }
        // A corrupt log may have lost its tail handle mid-truncation;
        // closing must still succeed so the caller can reopen and recover.
        if inner.tail_file.is_some() {
            inner.sync_tail()?;
        }
        inner.tail_file = None;
        inner.closed = true;
        if inner.corrupt {
            return Err(WalError::Corrupt);
        }
        Ok(())
    }

    /// Appends a single entry at `offset`.
    ///
    /// `offset` must be `last_index() + 1` to continue the log, or greater
    /// to jump ahead; jumping cycles to a fresh segment based at `offset`.
    ///
    /// # Errors
    ///
    /// Returns [`WalError::Corrupt`] or [`WalError::Closed`] per the log
    /// state, or an I/O error from the filesystem.
    pub fn write(&self, offset: i64, data: &[u8]) -> WalResult<()> {
        let mut inner = self.inner.write();
        inner.check_open()?;
        let mut batch = std::mem::take(&mut inner.wbatch);
        batch.clear();
        batch.write(offset, data);
        let result = inner.write_batch_inner(&mut batch);
        inner.wbatch = batch;
        result
    }

    /// Appends all entries queued in `batch`, in order.
    ///
    /// Offsets in the batch must be strictly increasing, and the first may
    /// continue the log or jump ahead as for [`write`](Self::write). The
    /// batch is cleared on success so it can be refilled and reused.
    ///
    /// # Errors
    ///
    /// As for [`write`](Self::write).
    pub fn write_batch(&self, batch: &mut Batch) -> WalResult<()> {
        let mut inner = self.inner.write();
        inner.check_open()?;
        if batch.is_empty() {
            return Ok(());
        }
        inner.write_batch_inner(batch)
    }

    /// Reads the entry at `offset`, returning a fresh copy of its payload.
    ///
    /// # Errors
    ///
    /// Returns [`WalError::NotFound`] if `offset` is outside
    /// `[first_index, last_index]`, [`WalError::Corrupt`] if the entry
    /// fails to decode, or the usual state errors.
    pub fn read(&self, offset: i64) -> WalResult<Vec<u8>> {
        self.read_with(offset, |data| data.to_vec())
    }

    /// Reads the entry at `offset` and passes its payload to `f`.
    ///
    /// With the `no_copy` option set (the default) the slice borrows the
    /// segment's cached buffer directly, so the read allocates nothing;
    /// otherwise `f` receives a fresh copy. Either way the slice is only
    /// valid for the duration of the callback.
    ///
    /// # Errors
    ///
    /// As for [`read`](Self::read).
    pub fn read_with<T>(&self, offset: i64, f: impl FnOnce(&[u8]) -> T) -> WalResult<T> {
        {
            let inner = self.inner.read();
            inner.check_open()?;
            if offset < inner.first_offset || offset > inner.last_offset {
                return Err(WalError::NotFound);
            }
            if let Some(idx) = inner.find_materialized(offset) {
                return inner.read_entry(idx, offset, f);
            }
        }
        // The owning segment is dormant; take the lock exclusively to
        // materialize it through the cache, then re-check the state in
        // case it changed while the lock was released.
        let mut inner = self.inner.write();
        inner.check_open()?;
        if offset < inner.first_offset || offset > inner.last_offset {
            return Err(WalError::NotFound);
        }
        let idx = inner.load_segment(offset)?;
        inner.read_entry(idx, offset, f)
    }

    /// Returns the offset of the first entry in the log.
    ///
    /// For an empty log this is the anchor offset the next entry is
    /// expected at.
    ///
    /// # Errors
    ///
    /// Returns [`WalError::Corrupt`] or [`WalError::Closed`] per the log
    /// state.
    pub fn first_index(&self) -> WalResult<i64> {
        let inner = self.inner.read();
        inner.check_open()?;
        Ok(inner.first_offset)
    }

    /// Returns the offset of the last entry in the log, or
    /// `first_index() - 1` if the log is empty.
    ///
    /// # Errors
    ///
    /// Returns [`WalError::Corrupt`] or [`WalError::Closed`] per the log
    /// state.
    pub fn last_index(&self) -> WalResult<i64> {
        let inner = self.inner.read();
        inner.check_open()?;
        Ok(inner.last_offset)
    }

    /// Fsyncs the tail segment.
    ///
    /// Only needed with the `no_sync` option; otherwise every write batch
    /// syncs before returning.
    ///
    /// # Errors
    ///
    /// Returns the usual state errors or an I/O error from the fsync.
    pub fn sync(&self) -> WalResult<()> {
        let mut inner = self.inner.write();
        inner.check_open()?;
        inner.sync_tail()
    }

    /// Demotes every cached non-tail segment, dropping its buffers.
    ///
    /// # Errors
    ///
    /// Returns [`WalError::Corrupt`] or [`WalError::Closed`] per the log
    /// state.
    pub fn clear_cache(&self) -> WalResult<()> {
        let mut inner = self.inner.write();
        inner.check_open()?;
        inner.clear_cache_inner();
        Ok(())
    }
}

impl fmt::Debug for Log {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.try_read() {
            Some(inner) => f
                .debug_struct("Log")
                .field("path", &inner.path)
                .field("first_offset", &inner.first_offset)
                .field("last_offset", &inner.last_offset)
                .field("segments", &inner.segments.len())
                .finish_non_exhaustive(),
            None => f.debug_struct("Log").finish_non_exhaustive(),
        }
    }
}

impl LogInner {
    pub(crate) fn check_open(&self) -> WalResult<()> {
        if self.corrupt {
            Err(WalError::Corrupt)
        } else if self.closed {
            Err(WalError::Closed)
        } else {
            Ok(())
        }
    }

    fn tail_idx(&self) -> usize {
        self.segments.len() - 1
    }

    fn tail_file_mut(&mut self) -> WalResult<&mut Box<dyn FileHandle>> {
        self.tail_file.as_mut().ok_or_else(|| {
            WalError::Io(io::Error::new(
                io::ErrorKind::Other,
                "tail segment file is not open",
            ))
        })
    }

    /// Enumerates the log directory and reconstructs the segment list,
    /// replaying any truncation marker left behind by a crash.
    fn load(&mut self) -> WalResult<()> {
        let names = self.fs.read_dir(&self.path)?;

        let mut start_idx = None;
        let mut end_idx = None;
        let mut truncate_idx = None;
        for name in &names {
            let Some((base_offset, marker)) = parse_segment_name(name) else {
                continue;
            };
            match marker {
                SegmentMarker::None => {}
                SegmentMarker::Start => start_idx = Some(self.segments.len()),
                SegmentMarker::End => {
                    if end_idx.is_none() {
                        end_idx = Some(self.segments.len());
                    }
                }
                SegmentMarker::Truncate => {
                    if truncate_idx.is_some() {
                        return Err(WalError::Corrupt);
                    }
                    truncate_idx = Some(self.segments.len());
                }
            }
            self.segments
                .push(Segment::new(self.path.join(name), base_offset));
        }

        if self.segments.is_empty() {
            return self.create_initial_segment(0);
        }

        let markers = usize::from(start_idx.is_some())
            + usize::from(end_idx.is_some())
            + usize::from(truncate_idx.is_some());
        if markers > 1 {
            return Err(WalError::Corrupt);
        }

        if let Some(idx) = start_idx {
            self.replay_start(idx)?;
        }
        if let Some(idx) = end_idx {
            self.replay_end(idx)?;
        }
        if let Some(idx) = truncate_idx {
            self.replay_truncate(idx)?;
        }

        self.first_offset = self.segments[0].base_offset;

        // Open the tail segment for appending and load its entries.
        let tail = self.tail_idx();
        let mut file = self
            .fs
            .open_append(&self.segments[tail].path, self.opts.file_perms)?;
        file.seek_to_end()?;
        self.tail_file = Some(file);
        self.load_segment_entries(tail)?;
        self.last_offset =
            self.segments[tail].base_offset + self.segments[tail].positions.len() as i64 - 1;
        Ok(())
    }

    /// Finishes an interrupted front truncation: everything before the
    /// `.START` segment is stale.
    fn replay_start(&mut self, idx: usize) -> WalResult<()> {
        debug!(path = %self.segments[idx].path.display(), "replaying front-truncation marker");
        for i in 0..idx {
            self.fs.remove(&self.segments[i].path)?;
        }
        self.segments.drain(..idx);
        let final_path = self.path.join(segment_name(self.segments[0].base_offset));
        self.fs.rename(&self.segments[0].path, &final_path)?;
        self.fs.sync_dir(&self.path)?;
        self.segments[0].path = final_path;
        Ok(())
    }

    /// Finishes an interrupted back truncation: everything after the
    /// `.END` segment is stale, as is a predecessor sharing its base
    /// offset (the pre-truncation version of the same segment).
    fn replay_end(&mut self, idx: usize) -> WalResult<()> {
        debug!(path = %self.segments[idx].path.display(), "replaying back-truncation marker");
        for i in (idx + 1..self.segments.len()).rev() {
            self.fs.remove(&self.segments[i].path)?;
        }
        self.segments.truncate(idx + 1);

        let len = self.segments.len();
        if len > 1 && self.segments[len - 2].base_offset == self.segments[len - 1].base_offset {
            // The rename below clobbers the stale file; only the list
            // entry needs dropping.
            self.segments.remove(len - 2);
        }

        let tail = self.tail_idx();
        let final_path = self
            .path
            .join(segment_name(self.segments[tail].base_offset));
        self.fs.rename(&self.segments[tail].path, &final_path)?;
        self.fs.sync_dir(&self.path)?;
        self.segments[tail].path = final_path;
        Ok(())
    }

    /// Finishes an interrupted truncate-all: the `.TRUNCATE` segment is
    /// the only survivor.
    fn replay_truncate(&mut self, idx: usize) -> WalResult<()> {
        debug!(path = %self.segments[idx].path.display(), "replaying truncate-all marker");
        for (i, seg) in self.segments.iter().enumerate() {
            if i != idx {
                self.fs.remove(&seg.path)?;
            }
        }
        let mut keep = self.segments.remove(idx);
        self.segments.clear();

        let final_path = self.path.join(segment_name(keep.base_offset));
        self.fs.rename(&keep.path, &final_path)?;
        self.fs.sync_dir(&self.path)?;
        keep.path = final_path;
        self.segments.push(keep);
        Ok(())
    }

    /// Creates a fresh empty segment and makes it the whole log.
    pub(crate) fn create_initial_segment(&mut self, offset: i64) -> WalResult<()> {
        let path = self.path.join(segment_name(offset));
        self.segments.push(Segment::new(path.clone(), offset));
        self.first_offset = offset;
        self.last_offset = offset - 1;
        self.tail_file = Some(self.fs.create(&path, self.opts.file_perms)?);
        Ok(())
    }

    /// Reads a segment file and rebuilds its in-memory buffer and
    /// position index.
    ///
    /// A decode failure marks the log corrupt: the segment bytes on disk
    /// are not a valid sequence of frames.
    pub(crate) fn load_segment_entries(&mut self, idx: usize) -> WalResult<()> {
        let data = self.fs.read_file(&self.segments[idx].path)?;
        let mut positions = Vec::new();
        let mut pos = 0;
        while pos < data.len() {
            let frame_len = match codec::frame_len(&data[pos..]) {
                Ok(len) => len,
                Err(err) => {
                    self.corrupt = true;
                    return Err(err);
                }
            };
            positions.push(EntryPos {
                start: pos,
                end: pos + frame_len,
            });
            pos += frame_len;
        }
        let seg = &mut self.segments[idx];
        seg.buf = data;
        seg.positions = positions;
        Ok(())
    }

    /// Binary-searches the segment list for the segment owning `offset`.
    ///
    /// The caller guarantees `offset >= segments[0].base_offset`.
    pub(crate) fn find_segment(&self, offset: i64) -> usize {
        let (mut lo, mut hi) = (0, self.segments.len());
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if offset >= self.segments[mid].base_offset {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        lo - 1
    }

    /// Returns the index of a segment that already has `offset` in memory:
    /// the tail, or the most recently used cache entry.
    fn find_materialized(&self, offset: i64) -> Option<usize> {
        let tail = self.tail_idx();
        if offset >= self.segments[tail].base_offset {
            return Some(tail);
        }
        if let Some(idx) = self.cache.most_recent() {
            if self.segments.get(idx).is_some_and(|seg| seg.covers(offset)) {
                return Some(idx);
            }
        }
        None
    }

    /// Returns the index of the segment owning `offset`, materializing it
    /// and promoting it in the cache if necessary.
    pub(crate) fn load_segment(&mut self, offset: i64) -> WalResult<usize> {
        let tail = self.tail_idx();
        if offset >= self.segments[tail].base_offset {
            return Ok(tail);
        }
        if let Some(idx) = self.cache.most_recent() {
            if self.segments.get(idx).is_some_and(|seg| seg.covers(offset)) {
                return Ok(idx);
            }
        }
        let idx = self.find_segment(offset);
        if self.segments[idx].is_dormant() {
            self.load_segment_entries(idx)?;
        }
        self.push_cache(idx);
        Ok(idx)
    }

    /// Decodes the entry at `offset` out of segment `idx` and hands its
    /// payload to `f`.
    fn read_entry<T>(&self, idx: usize, offset: i64, f: impl FnOnce(&[u8]) -> T) -> WalResult<T> {
        let seg = &self.segments[idx];
        let pos = seg
            .positions
            .get((offset - seg.base_offset) as usize)
            .copied()
            .ok_or(WalError::Corrupt)?;
        let frame = &seg.buf[pos.start..pos.end];
        let data = codec::payload(frame)?;
        if self.opts.no_copy {
            Ok(f(data))
        } else {
            let copied = data.to_vec();
            Ok(f(&copied))
        }
    }

    /// Marks `idx` most recently used, demoting whatever the cache evicts.
    pub(crate) fn push_cache(&mut self, idx: usize) {
        if let Some(evicted) = self.cache.insert(idx) {
            if let Some(seg) = self.segments.get_mut(evicted) {
                seg.dematerialize();
            }
        }
    }

    /// Demotes every cached segment and empties the cache.
    pub(crate) fn clear_cache_inner(&mut self) {
        for idx in self.cache.drain() {
            if let Some(seg) = self.segments.get_mut(idx) {
                seg.dematerialize();
            }
        }
    }

    /// Fsyncs the tail segment file, recording the latency.
    pub(crate) fn sync_tail(&mut self) -> WalResult<()> {
        let started = Instant::now();
        let result = self.tail_file_mut()?.sync();
        self.sync_latency.record(started.elapsed().as_secs_f64());
        result?;
        Ok(())
    }

    /// Closes the tail segment and opens a fresh one based at
    /// `next_offset`.
    fn cycle(&mut self, next_offset: i64) -> WalResult<()> {
        self.sync_tail()?;
        self.tail_file = None;

        let tail = self.tail_idx();
        if self.segments[tail].base_offset == 0 && self.segments[tail].buf.is_empty() {
            // Jumping away from the initial empty segment; it never held
            // entries, so the log simply begins at the new offset.
            if let Some(old) = self.segments.pop() {
                self.fs.remove(&old.path)?;
            }
            self.first_offset = next_offset;
        } else {
            self.push_cache(tail);
        }

        let path = self.path.join(segment_name(next_offset));
        self.tail_file = Some(self.fs.create(&path, self.opts.file_perms)?);
        self.segments.push(Segment::new(path, next_offset));
        Ok(())
    }

    /// Writes `buf[mark..]` of the tail segment to its file.
    fn flush_tail(&mut self, mark: usize) -> WalResult<()> {
        let tail = self.segments.len() - 1;
        let Self {
            segments,
            tail_file,
            ..
        } = self;
        let file = tail_file.as_mut().ok_or_else(|| {
            WalError::Io(io::Error::new(
                io::ErrorKind::Other,
                "tail segment file is not open",
            ))
        })?;
        file.write_all(&segments[tail].buf[mark..])?;
        Ok(())
    }

    /// Appends every entry in `batch` to the log, cycling segments as the
    /// tail fills. The batch is cleared on success.
    fn write_batch_inner(&mut self, batch: &mut Batch) -> WalResult<()> {
        let first_offset_in_batch = batch.entries[0].offset;
        if first_offset_in_batch > self.last_offset + 1
            || self.segments[self.tail_idx()].buf.len() > self.opts.segment_size
        {
            // The batch jumps ahead, or the tail is at capacity.
            self.cycle(first_offset_in_batch)?;
        }

        let mut mark = self.segments[self.tail_idx()].buf.len();
        let mut consumed = 0;
        for i in 0..batch.entries.len() {
            let entry = batch.entries[i];
            {
                let tail = self.tail_idx();
                let seg = &mut self.segments[tail];
                let data = &batch.data[consumed..consumed + entry.size];
                let pos = codec::append_entry(&mut seg.buf, data);
                seg.positions.push(pos);
            }
            consumed += entry.size;
            if self.segments[self.tail_idx()].buf.len() >= self.opts.segment_size {
                // Mid-batch capacity: flush what this segment got and
                // continue the batch in a fresh tail.
                self.flush_tail(mark)?;
                self.last_offset = entry.offset;
                self.cycle(entry.offset + 1)?;
                mark = 0;
            }
        }
        if self.segments[self.tail_idx()].buf.len() > mark {
            self.flush_tail(mark)?;
            self.last_offset = batch.entries[batch.entries.len() - 1].offset;
        }
        if !self.opts.no_sync {
            self.sync_tail()?;
        }
        batch.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_mem() -> Log {
        Log::open("/wal", Options::new().in_memory(true)).unwrap()
    }

    #[test]
    fn fresh_log_is_empty() {
        let log = open_mem();
        assert_eq!(log.first_index().unwrap(), 0);
        assert_eq!(log.last_index().unwrap(), -1);
        assert!(matches!(log.read(0), Err(WalError::NotFound)));
    }

    #[test]
    fn write_then_read() {
        let log = open_mem();
        log.write(0, b"alpha").unwrap();
        log.write(1, b"beta").unwrap();

        assert_eq!(log.read(0).unwrap(), b"alpha");
        assert_eq!(log.read(1).unwrap(), b"beta");
        assert_eq!(log.last_index().unwrap(), 1);
    }

    #[test]
    fn read_with_borrows_payload() {
        let log = open_mem();
        log.write(0, b"borrowed").unwrap();

        let len = log.read_with(0, |data| data.len()).unwrap();
        assert_eq!(len, 8);
    }

    #[test]
    fn empty_payloads_round_trip() {
        let log = open_mem();
        log.write(0, b"").unwrap();
        log.write(1, b"x").unwrap();
        assert_eq!(log.read(0).unwrap(), b"");
        assert_eq!(log.read(1).unwrap(), b"x");
    }

    #[test]
    fn batch_write_is_ordered() {
        let log = open_mem();
        let mut batch = Batch::new();
        for i in 0..5 {
            batch.write(i, format!("entry-{i}").as_bytes());
        }
        log.write_batch(&mut batch).unwrap();

        assert!(batch.is_empty(), "batch is cleared on success");
        assert_eq!(log.last_index().unwrap(), 4);
        for i in 0..5 {
            assert_eq!(log.read(i).unwrap(), format!("entry-{i}").as_bytes());
        }
    }

    #[test]
    fn empty_batch_is_a_no_op() {
        let log = open_mem();
        let mut batch = Batch::new();
        log.write_batch(&mut batch).unwrap();
        assert_eq!(log.last_index().unwrap(), -1);
    }

    #[test]
    fn offset_jump_rebases_empty_log() {
        let log = open_mem();
        log.write(100, b"first").unwrap();

        assert_eq!(log.first_index().unwrap(), 100);
        assert_eq!(log.last_index().unwrap(), 100);
        assert!(matches!(log.read(0), Err(WalError::NotFound)));
        assert_eq!(log.read(100).unwrap(), b"first");
    }

    #[test]
    fn offset_jump_mid_log_keeps_earlier_entries() {
        let log = open_mem();
        log.write(0, b"zero").unwrap();
        log.write(1, b"one").unwrap();
        log.write(10, b"ten").unwrap();

        assert_eq!(log.first_index().unwrap(), 0);
        assert_eq!(log.last_index().unwrap(), 10);
        assert_eq!(log.read(1).unwrap(), b"one");
        assert_eq!(log.read(10).unwrap(), b"ten");
    }

    #[test]
    fn segment_cycling_keeps_all_entries_readable() {
        let log = Log::open("/wal", Options::new().in_memory(true).segment_size(16)).unwrap();
        for i in 0..32 {
            log.write(i, format!("payload-{i:02}").as_bytes()).unwrap();
        }
        for i in 0..32 {
            assert_eq!(log.read(i).unwrap(), format!("payload-{i:02}").as_bytes());
        }
    }

    #[test]
    fn operations_fail_after_close() {
        let log = open_mem();
        log.write(0, b"entry").unwrap();
        log.close().unwrap();

        assert!(matches!(log.write(1, b"late"), Err(WalError::Closed)));
        assert!(matches!(log.read(0), Err(WalError::Closed)));
        assert!(matches!(log.first_index(), Err(WalError::Closed)));
        assert!(matches!(log.sync(), Err(WalError::Closed)));
        assert!(matches!(log.close(), Err(WalError::Closed)));
    }

    #[test]
    fn explicit_sync_with_no_sync_option() {
        let log = Log::open("/wal", Options::new().in_memory(true).no_sync(true)).unwrap();
        log.write(0, b"buffered").unwrap();
        log.sync().unwrap();
        assert_eq!(log.read(0).unwrap(), b"buffered");
    }

    #[test]
    fn clear_cache_keeps_entries_readable() {
        let log = Log::open("/wal", Options::new().in_memory(true).segment_size(8)).unwrap();
        for i in 0..16 {
            log.write(i, b"abcdef").unwrap();
        }
        log.clear_cache().unwrap();
        for i in 0..16 {
            assert_eq!(log.read(i).unwrap(), b"abcdef");
        }
    }
}
