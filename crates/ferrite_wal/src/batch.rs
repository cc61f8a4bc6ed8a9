//! Reusable multi-entry write batch.

/// One queued entry: its target offset and payload length. Payloads live
/// concatenated in [`Batch::data`] to keep the accumulator to two
/// allocations regardless of entry count.
#[derive(Debug, Clone, Copy)]
pub(crate) struct BatchEntry {
    pub offset: i64,
    pub size: usize,
}

/// An accumulator of entries to be written in one call to
/// [`Log::write_batch`](crate::Log::write_batch).
///
/// A batch is reusable: it is cleared on a successful write and keeps its
/// allocations, so a long-lived writer can hold one batch and refill it.
///
/// Offsets within a batch must be strictly increasing; the log does not
/// re-order entries.
///
/// # Example
///
/// ```rust
/// use ferrite_wal::Batch;
///
/// let mut batch = Batch::new();
/// batch.write(0, b"first");
/// batch.write(1, b"second");
/// assert_eq!(batch.len(), 2);
/// ```
#[derive(Debug, Default)]
pub struct Batch {
    pub(crate) entries: Vec<BatchEntry>,
    pub(crate) data: Vec<u8>,
}

impl Batch {
    /// Creates an empty batch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues an entry at `offset` with the given payload.
    pub fn write(&mut self, offset: i64, data: &[u8]) {
        self.entries.push(BatchEntry {
            offset,
            size: data.len(),
        });
        self.data.extend_from_slice(data);
    }

    /// Clears the batch for reuse, keeping its allocations.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.data.clear();
    }

    /// Returns the number of queued entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no entries are queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
