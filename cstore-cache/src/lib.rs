//! Read-through snapshot cache.
//!
//! Loading and validating the source tables is expensive relative to
//! querying them, so snapshots are cached behind an explicit key of
//! (data directory, store allowlist). The cache guarantees single-flight
//! loading: sessions that ask for a key while its load is in flight wait for
//! and share that load instead of starting their own. Entries are immutable
//! `Arc<Snapshot>` values; invalidation is time-based (TTL) or manual, since
//! no write path exists to invalidate for.

#![forbid(unsafe_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use cstore_load::Snapshot;
use cstore_result::{Error, Result};

/// Cache key: where the data came from and which stores were kept.
///
/// The allowlist is lowercased and sorted so equivalent configurations hit
/// the same entry regardless of spelling or order.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    data_dir: PathBuf,
    allowlist: Vec<String>,
}

impl CacheKey {
    pub fn new(data_dir: impl Into<PathBuf>, allowlist: &[String]) -> Self {
        let mut allowlist: Vec<String> = allowlist
            .iter()
            .map(|c| c.trim().to_ascii_lowercase())
            .collect();
        allowlist.sort();
        allowlist.dedup();
        Self {
            data_dir: data_dir.into(),
            allowlist,
        }
    }

    pub fn data_dir(&self) -> &PathBuf {
        &self.data_dir
    }

    pub fn allowlist(&self) -> &[String] {
        &self.allowlist
    }
}

/// TTL'd snapshot cache with single-flight loads.
pub struct SnapshotCache {
    inner: moka::sync::Cache<CacheKey, Arc<Snapshot>>,
}

impl SnapshotCache {
    /// A cache whose entries expire `ttl` after being loaded.
    pub fn new(ttl: Duration) -> Self {
        let inner = moka::sync::Cache::builder()
            .max_capacity(8)
            .time_to_live(ttl)
            .build();
        Self { inner }
    }

    /// Return the cached snapshot for `key`, running `load` at most once per
    /// epoch even under concurrent first requests. A failed load is handed to
    /// every waiter and is not cached, so the next request retries.
    pub fn get_or_load<F>(&self, key: &CacheKey, load: F) -> Result<Arc<Snapshot>>
    where
        F: FnOnce() -> Result<Snapshot>,
    {
        self.inner
            .try_get_with_by_ref(key, || {
                tracing::debug!(data_dir = %key.data_dir.display(), "loading snapshot");
                load().map(Arc::new)
            })
            .map_err(|shared: Arc<Error>| shared.duplicate())
    }

    /// Drop one entry ahead of its TTL.
    pub fn invalidate(&self, key: &CacheKey) {
        self.inner.invalidate(key);
    }

    /// Drop everything, forcing fresh loads on the next request.
    pub fn invalidate_all(&self) {
        self.inner.invalidate_all();
    }

    /// Entries currently resident (after pending maintenance).
    pub fn len(&self) -> u64 {
        self.inner.run_pending_tasks();
        self.inner.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cstore_test_utils::SnapshotFixture;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn key(tag: &str) -> CacheKey {
        CacheKey::new(format!("/data/{tag}"), &["Rigby".into(), "rexburg".into()])
    }

    #[test]
    fn keys_normalize_allowlist_case_and_order() {
        let a = CacheKey::new("/data", &["Rexburg".into(), "rigby".into()]);
        let b = CacheKey::new("/data", &["RIGBY".into(), "rexburg".into()]);
        assert_eq!(a, b);
    }

    #[test]
    fn second_request_reuses_the_cached_snapshot() {
        let cache = SnapshotCache::new(Duration::from_secs(60));
        let loads = AtomicUsize::new(0);
        let load = || {
            loads.fetch_add(1, Ordering::SeqCst);
            Ok(SnapshotFixture::two_stores().build())
        };

        let first = cache.get_or_load(&key("a"), load).unwrap();
        let second = cache
            .get_or_load(&key("a"), || {
                loads.fetch_add(1, Ordering::SeqCst);
                Ok(SnapshotFixture::two_stores().build())
            })
            .unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failed_loads_are_not_cached() {
        let cache = SnapshotCache::new(Duration::from_secs(60));
        let err = cache
            .get_or_load(&key("b"), || {
                Err(Error::DataSource("missing file".into()))
            })
            .unwrap_err();
        assert!(matches!(err, Error::DataSource(_)));

        let recovered = cache
            .get_or_load(&key("b"), || Ok(SnapshotFixture::two_stores().build()))
            .unwrap();
        assert_eq!(recovered.stores.num_rows(), 2);
    }

    #[test]
    fn manual_invalidation_forces_a_fresh_load() {
        let cache = SnapshotCache::new(Duration::from_secs(60));
        let loads = AtomicUsize::new(0);
        let load = || {
            loads.fetch_add(1, Ordering::SeqCst);
            Ok(SnapshotFixture::two_stores().build())
        };
        cache.get_or_load(&key("c"), load).unwrap();
        cache.invalidate(&key("c"));
        cache
            .get_or_load(&key("c"), || {
                loads.fetch_add(1, Ordering::SeqCst);
                Ok(SnapshotFixture::two_stores().build())
            })
            .unwrap();
        assert_eq!(loads.load(Ordering::SeqCst), 2);
    }
}
