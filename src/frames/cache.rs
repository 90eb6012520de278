use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard};

use lru::LruCache;

use crate::image_pipeline::RenderedFrame;

/// Bounded LRU map from frame index to decoded frame.
///
/// Shared between the UI thread and the prefetch worker; every operation takes
/// the single internal lock for bookkeeping only.
pub struct FrameCache {
    entries: Mutex<LruCache<u32, Arc<RenderedFrame>>>,
}

impl FrameCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<u32, Arc<RenderedFrame>>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Looks up `index` and marks it most recently used.
    pub fn get(&self, index: u32) -> Option<Arc<RenderedFrame>> {
        self.lock().get(&index).cloned()
    }

    /// Membership test that leaves the recency order untouched.
    pub fn contains(&self, index: u32) -> bool {
        self.lock().contains(&index)
    }

    /// Inserts or replaces `index` as most recently used, evicting the least
    /// recently used entry when full.
    pub fn insert(&self, index: u32, frame: Arc<RenderedFrame>) {
        if let Some((evicted, _)) = self.lock().push(index, frame) {
            if evicted != index {
                log::trace!("Evicted frame {evicted} from cache");
            }
        }
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Cached indices, most recently used first.
    pub fn indices(&self) -> Vec<u32> {
        self.lock().iter().map(|(index, _)| *index).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(marker: u8) -> Arc<RenderedFrame> {
        Arc::new(RenderedFrame {
            width: 1,
            height: 1,
            rgba: vec![marker, marker, marker, 255],
        })
    }

    #[test]
    fn evicts_least_recently_used() {
        let cache = FrameCache::new(2);
        cache.insert(0, frame(0));
        cache.insert(1, frame(1));
        assert!(cache.get(0).is_some());
        cache.insert(2, frame(2));

        assert_eq!(cache.indices(), vec![2, 0]);
        assert!(!cache.contains(1));
    }

    #[test]
    fn contains_does_not_promote() {
        let cache = FrameCache::new(2);
        cache.insert(0, frame(0));
        cache.insert(1, frame(1));
        assert!(cache.contains(0));
        cache.insert(2, frame(2));

        assert!(!cache.contains(0));
        assert_eq!(cache.indices().len(), 2);
    }

    #[test]
    fn reinsert_replaces_without_growing() {
        let cache = FrameCache::new(3);
        cache.insert(4, frame(1));
        cache.insert(4, frame(9));
        assert_eq!(cache.indices(), vec![4]);
        assert_eq!(cache.get(4).map(|f| f.rgba[0]), Some(9));
    }

    #[test]
    fn zero_capacity_still_holds_one_frame() {
        let cache = FrameCache::new(0);
        cache.insert(7, frame(7));
        assert!(cache.contains(7));
        cache.insert(8, frame(8));
        assert_eq!(cache.indices(), vec![8]);
    }
}
