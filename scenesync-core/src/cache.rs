//! Run-scoped scene descriptor cache.

use std::sync::{Arc, OnceLock};

use dashmap::DashMap;

use crate::error::ExtractionError;
use crate::features::DescriptorSet;
use crate::reconcile::DescriptorProvider;

type Slot = Arc<OnceLock<Result<Arc<DescriptorSet>, ExtractionError>>>;

/// Memoizes another [`DescriptorProvider`], per photo.
///
/// Each photo is computed at most once even when many workers ask for it at
/// the same time: the first caller extracts, the rest block on the same slot
/// and observe its result. Failures are cached too.
pub struct SceneCache<P> {
    inner: P,
    slots: DashMap<String, Slot>,
}

impl<P: DescriptorProvider> SceneCache<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            slots: DashMap::new(),
        }
    }

    /// Number of photos computed (or being computed).
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Cached failures, sorted by photo.
    pub fn failures(&self) -> Vec<ExtractionError> {
        let mut failures: Vec<ExtractionError> = self
            .slots
            .iter()
            .filter_map(|slot| match slot.value().get() {
                Some(Err(e)) => Some(e.clone()),
                _ => None,
            })
            .collect();
        failures.sort_by(|a, b| a.photo().cmp(b.photo()));
        failures
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }
}

impl<P: DescriptorProvider> DescriptorProvider for SceneCache<P> {
    fn descriptors(&self, photo: &str) -> Result<Arc<DescriptorSet>, ExtractionError> {
        // Clone the slot out so the shard lock is released before extracting.
        let slot = self
            .slots
            .entry(photo.to_string())
            .or_insert_with(|| Arc::new(OnceLock::new()))
            .value()
            .clone();

        slot.get_or_init(|| self.inner.descriptors(photo)).clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use rayon::prelude::*;

    struct Counting {
        calls: AtomicUsize,
    }

    impl DescriptorProvider for Counting {
        fn descriptors(&self, photo: &str) -> Result<Arc<DescriptorSet>, ExtractionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if photo.starts_with("bad") {
                Err(ExtractionError::image_read(photo, "corrupt"))
            } else {
                Ok(Arc::new(DescriptorSet::empty()))
            }
        }
    }

    fn counting() -> Counting {
        Counting {
            calls: AtomicUsize::new(0),
        }
    }

    #[test]
    fn test_computes_once_per_photo() {
        let cache = SceneCache::new(counting());
        let a1 = cache.descriptors("a.jpg").unwrap();
        let a2 = cache.descriptors("a.jpg").unwrap();
        cache.descriptors("b.jpg").unwrap();

        assert!(Arc::ptr_eq(&a1, &a2));
        assert_eq!(cache.inner().calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_failures_are_cached() {
        let cache = SceneCache::new(counting());
        assert!(cache.descriptors("bad.jpg").is_err());
        assert!(cache.descriptors("bad.jpg").is_err());
        assert_eq!(cache.inner().calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.failures().len(), 1);
        assert_eq!(cache.failures()[0].photo(), "bad.jpg");
    }

    #[test]
    fn test_concurrent_requests_extract_once() {
        let cache = SceneCache::new(counting());
        (0..64).into_par_iter().for_each(|i| {
            let photo = format!("s{}.jpg", i % 4);
            cache.descriptors(&photo).unwrap();
        });
        assert_eq!(cache.inner().calls.load(Ordering::SeqCst), 4);
    }
}
