//! Bounded LRU over materialized non-tail segments.

use lru::LruCache;
use std::num::NonZeroUsize;

/// Tracks which non-tail segments are currently materialized.
///
/// The cache stores segment *indices* into the log's ordered segment list;
/// the segments themselves stay owned by the log. When an insertion evicts
/// the least-recently-used index, the caller is handed that index so it
/// can demote the segment back to dormant. The tail segment is never
/// inserted; it stays materialized independently.
#[derive(Debug)]
pub(crate) struct SegmentCache {
    lru: LruCache<usize, ()>,
}

impl SegmentCache {
    /// Creates a cache holding at most `capacity` segment indices.
    /// Capacities below one are clamped to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            lru: LruCache::new(capacity),
        }
    }

    /// Inserts `idx` as the most recently used entry.
    ///
    /// Returns the index evicted to make room, if any. Re-inserting an
    /// index that is already cached refreshes its recency and evicts
    /// nothing.
    pub fn insert(&mut self, idx: usize) -> Option<usize> {
        self.lru
            .push(idx, ())
            .map(|(evicted, ())| evicted)
            .filter(|&evicted| evicted != idx)
    }

    /// Returns the most recently used index without touching recency.
    pub fn most_recent(&self) -> Option<usize> {
        self.lru.iter().next().map(|(&idx, _)| idx)
    }

    /// Removes every entry, returning the indices that were cached so the
    /// caller can demote the corresponding segments.
    pub fn drain(&mut self) -> Vec<usize> {
        let indices: Vec<usize> = self.lru.iter().map(|(&idx, _)| idx).collect();
        self.lru.clear();
        indices
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evicts_least_recently_used() {
        let mut cache = SegmentCache::new(2);
        assert_eq!(cache.insert(1), None);
        assert_eq!(cache.insert(2), None);
        assert_eq!(cache.insert(3), Some(1));
        assert_eq!(cache.most_recent(), Some(3));
    }

    #[test]
    fn reinserting_refreshes_without_evicting() {
        let mut cache = SegmentCache::new(2);
        cache.insert(1);
        cache.insert(2);
        assert_eq!(cache.insert(1), None);
        // 2 is now the least recently used.
        assert_eq!(cache.insert(3), Some(2));
    }

    #[test]
    fn capacity_is_clamped_to_one() {
        let mut cache = SegmentCache::new(0);
        assert_eq!(cache.insert(1), None);
        assert_eq!(cache.insert(2), Some(1));
    }

    #[test]
    fn drain_returns_all_cached_indices() {
        let mut cache = SegmentCache::new(3);
        cache.insert(4);
        cache.insert(5);

        let mut drained = cache.drain();
        drained.sort_unstable();
        assert_eq!(drained, vec![4, 5]);
        assert_eq!(cache.most_recent(), None);
        assert!(cache.drain().is_empty());
    }
}
