//! Truncation protocols.
//!
//! All three variants follow the same two-phase shape:
//!
//! 1. Write the surviving slice of the boundary segment to `TEMP` and
//!    fsync it.
//! 2. Rename `TEMP` to a marker name - `<offset>.START`, `<offset>.END`,
//!    or `<offset>.TRUNCATE`. **This rename is the commit point.**
//! 3. Delete the superseded segment files.
//! 4. Rename the marker to its final (suffix-less) segment name.
//!
//! A crash between steps 2 and 4 leaves the marker in place, and the next
//! open replays the remaining cleanup from it. An I/O failure between
//! steps 2 and 4 in a live log cannot corrupt the on-disk state, but it
//! can leave the in-memory view inconsistent with the directory, so the
//! log marks itself corrupt; closing and reopening recovers through the
//! marker exactly as a crash would.

use super::{Log, LogInner};
use crate::error::{WalError, WalResult};
use crate::segment::{
    segment_name, Segment, END_SUFFIX, START_SUFFIX, TEMP_FILE_NAME, TRUNCATE_SUFFIX,
};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, error};

impl Log {
    /// Discards every entry before `index`; the entry at `index` becomes
    /// the first entry of the log.
    ///
    /// Calling with `index == first_index()` is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`WalError::OutOfRange`] if `index` is outside
    /// `[first_index, last_index]`, [`WalError::Corrupt`] if cleanup after
    /// the commit point fails (close and reopen to recover), or the usual
    /// state errors.
    pub fn truncate_front(&self, index: i64) -> WalResult<()> {
        let mut inner = self.inner.write();
        inner.check_open()?;
        inner.truncate_front(index)
    }

    /// Discards every entry after `index`; the entry at `index` becomes
    /// the last entry of the log.
    ///
    /// Calling with `index == last_index()` is a no-op. Calling with
    /// `index == first_index() - 1` empties the log while keeping it
    /// anchored at the current first offset.
    ///
    /// # Errors
    ///
    /// As for [`truncate_front`](Self::truncate_front).
    pub fn truncate_back(&self, index: i64) -> WalResult<()> {
        let mut inner = self.inner.write();
        inner.check_open()?;
        inner.truncate_back(index)
    }

    /// Resets the log to a single empty segment at offset zero.
    ///
    /// Unlike truncating back past the first entry, this does not preserve
    /// offset continuity. File removal is best-effort.
    ///
    /// # Errors
    ///
    /// Returns the usual state errors, or an I/O error if the fresh
    /// initial segment cannot be created.
    pub fn clear(&self) -> WalResult<()> {
        let mut inner = self.inner.write();
        inner.check_open()?;
        inner.clear()
    }
}

impl LogInner {
    fn truncate_front(&mut self, index: i64) -> WalResult<()> {
        if index < self.first_offset || index > self.last_offset {
            return Err(WalError::OutOfRange);
        }
        if index == self.first_offset {
            return Ok(());
        }

        let seg_idx = self.load_segment(index)?;
        let kept = {
            let seg = &self.segments[seg_idx];
            let keep_from = seg
                .positions
                .get((index - seg.base_offset) as usize)
                .copied()
                .ok_or(WalError::Corrupt)?
                .start;
            seg.buf[keep_from..].to_vec()
        };

        self.write_temp(&kept)?;
        let start_path = self
            .path
            .join(format!("{}{}", segment_name(index), START_SUFFIX));
        self.fs
            .rename(&self.path.join(TEMP_FILE_NAME), &start_path)?;
        debug!(index, "committed front truncation");

        self.post_commit(move |inner| {
            inner.truncate_front_cleanup(seg_idx, index, kept.len(), &start_path)
        })
    }

    fn truncate_front_cleanup(
        &mut self,
        seg_idx: usize,
        index: i64,
        kept_len: usize,
        start_path: &Path,
    ) -> WalResult<()> {
        self.fs.sync_dir(&self.path)?;

        let was_tail = seg_idx == self.segments.len() - 1;
        if was_tail {
            self.tail_file = None;
        }
        for i in 0..=seg_idx {
            self.fs.remove(&self.segments[i].path)?;
        }
        let final_path = self.path.join(segment_name(index));
        self.fs.rename(start_path, &final_path)?;
        self.fs.sync_dir(&self.path)?;

        self.clear_cache_inner();
        {
            let seg = &mut self.segments[seg_idx];
            seg.path = final_path.clone();
            seg.base_offset = index;
            seg.dematerialize();
        }
        self.segments.drain(..seg_idx);
        self.first_offset = index;

        if was_tail {
            let mut file = self.fs.open_append(&final_path, self.opts.file_perms)?;
            let len = file.seek_to_end()?;
            if len != kept_len as u64 {
                return Err(WalError::Io(io::Error::new(
                    io::ErrorKind::InvalidData,
                    "invalid seek",
                )));
            }
            self.tail_file = Some(file);
            let tail = self.segments.len() - 1;
            self.load_segment_entries(tail)?;
        }
        Ok(())
    }

    fn truncate_back(&mut self, index: i64) -> WalResult<()> {
        if index == self.first_offset - 1 {
            return self.truncate_back_all(self.first_offset);
        }
        if index < self.first_offset || index > self.last_offset {
            return Err(WalError::OutOfRange);
        }
        if index == self.last_offset {
            return Ok(());
        }

        let seg_idx = self.load_segment(index)?;
        let (base_offset, kept) = {
            let seg = &self.segments[seg_idx];
            let kept_end = seg
                .positions
                .get((index - seg.base_offset) as usize)
                .copied()
                .ok_or(WalError::Corrupt)?
                .end;
            (seg.base_offset, seg.buf[..kept_end].to_vec())
        };

        self.write_temp(&kept)?;
        let end_path = self
            .path
            .join(format!("{}{}", segment_name(base_offset), END_SUFFIX));
        self.fs.rename(&self.path.join(TEMP_FILE_NAME), &end_path)?;
        debug!(index, "committed back truncation");

        self.post_commit(move |inner| {
            inner.truncate_back_cleanup(seg_idx, index, base_offset, kept.len(), &end_path)
        })
    }

    fn truncate_back_cleanup(
        &mut self,
        seg_idx: usize,
        index: i64,
        base_offset: i64,
        kept_len: usize,
        end_path: &Path,
    ) -> WalResult<()> {
        self.fs.sync_dir(&self.path)?;

        self.tail_file = None;
        for i in seg_idx..self.segments.len() {
            self.fs.remove(&self.segments[i].path)?;
        }
        let final_path = self.path.join(segment_name(base_offset));
        self.fs.rename(end_path, &final_path)?;
        self.fs.sync_dir(&self.path)?;

        let mut file = self.fs.open_append(&final_path, self.opts.file_perms)?;
        let len = file.seek_to_end()?;
        if len != kept_len as u64 {
            return Err(WalError::Io(io::Error::new(
                io::ErrorKind::InvalidData,
                "invalid seek",
            )));
        }
        self.tail_file = Some(file);

        self.clear_cache_inner();
        self.segments.truncate(seg_idx + 1);
        let tail = self.segments.len() - 1;
        {
            let seg = &mut self.segments[tail];
            seg.path = final_path;
            seg.dematerialize();
        }
        self.last_offset = index;
        self.load_segment_entries(tail)?;
        Ok(())
    }

    /// Empties the log, anchoring it at `new_first`. Used when back
    /// truncation reaches past the first entry; offset continuity is
    /// preserved.
    fn truncate_back_all(&mut self, new_first: i64) -> WalResult<()> {
        if new_first == self.last_offset {
            return Ok(());
        }

        // The empty marker file is itself the surviving segment content,
        // so there is no TEMP step; creating it is the commit.
        let marker_path = self
            .path
            .join(format!("{}{}", segment_name(new_first), TRUNCATE_SUFFIX));
        drop(self.fs.create(&marker_path, self.opts.file_perms)?);
        debug!(new_first, "committed truncate-all");

        self.post_commit(move |inner| inner.truncate_all_cleanup(new_first, &marker_path))
    }

    fn truncate_all_cleanup(&mut self, new_first: i64, marker_path: &Path) -> WalResult<()> {
        self.fs.sync_dir(&self.path)?;

        self.tail_file = None;
        for seg in &self.segments {
            self.fs.remove(&seg.path)?;
        }
        let final_path = self.path.join(segment_name(new_first));
        self.fs.rename(marker_path, &final_path)?;
        self.fs.sync_dir(&self.path)?;
        self.tail_file = Some(self.fs.open_append(&final_path, self.opts.file_perms)?);

        self.clear_cache_inner();
        self.segments.clear();
        self.segments.push(Segment::new(final_path, new_first));
        self.first_offset = new_first;
        self.last_offset = new_first - 1;
        self.load_segment_entries(0)?;
        Ok(())
    }

    fn clear(&mut self) -> WalResult<()> {
        self.clear_cache_inner();
        self.tail_file = None;
        for seg in &self.segments {
            // Best-effort: a fresh initial segment replaces everything.
            let _ = self.fs.remove(&seg.path);
        }
        self.segments.clear();
        self.create_initial_segment(0)
    }

    /// Writes the surviving segment slice to the `TEMP` scratch file and
    /// fsyncs it, ready for the commit rename.
    fn write_temp(&mut self, data: &[u8]) -> WalResult<PathBuf> {
        let temp_path = self.path.join(TEMP_FILE_NAME);
        let mut file = self.fs.create(&temp_path, self.opts.file_perms)?;
        file.write_all(data)?;
        file.sync()?;
        Ok(temp_path)
    }

    /// Runs the cleanup phase of a committed truncation. Cleanup failures
    /// cannot lose committed data, but they leave the in-memory state out
    /// of step with the directory, so the log goes sticky-corrupt and the
    /// caller is told to close and reopen.
    fn post_commit<F>(&mut self, cleanup: F) -> WalResult<()>
    where
        F: FnOnce(&mut Self) -> WalResult<()>,
    {
        match cleanup(self) {
            Ok(()) => Ok(()),
            Err(err) => {
                error!(%err, "cleanup after truncation commit failed; log marked corrupt");
                self.corrupt = true;
                Err(WalError::Corrupt)
            }
        }
    }
}
