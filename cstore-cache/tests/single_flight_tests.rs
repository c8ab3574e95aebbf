//! Single-flight behavior under concurrent first requests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use cstore_cache::{CacheKey, SnapshotCache};
use cstore_load::{LoadOptions, Loader};
use cstore_test_utils::SnapshotFixture;
use tempfile::TempDir;

#[test]
fn n_simultaneous_first_requests_run_exactly_one_load() {
    let dir = TempDir::new().unwrap();
    SnapshotFixture::two_stores().write_data_dir(dir.path());

    let cache = SnapshotCache::new(Duration::from_secs(60));
    let key = CacheKey::new(dir.path(), &["rigby".into(), "rexburg".into()]);
    let loads = AtomicUsize::new(0);

    std::thread::scope(|scope| {
        for _ in 0..8 {
            scope.spawn(|| {
                let snapshot = cache
                    .get_or_load(&key, || {
                        loads.fetch_add(1, Ordering::SeqCst);
                        // Real disk load, slow enough for the other threads
                        // to arrive while it is in flight.
                        std::thread::sleep(Duration::from_millis(50));
                        Loader::new(
                            LoadOptions::new(dir.path())
                                .with_allowlist(vec!["rigby".into(), "rexburg".into()]),
                        )
                        .load()
                    })
                    .unwrap();
                assert_eq!(snapshot.stores.num_rows(), 2);
            });
        }
    });

    assert_eq!(loads.load(Ordering::SeqCst), 1);
    assert_eq!(cache.len(), 1);
}

#[test]
fn distinct_keys_load_independently() {
    let dir_a = TempDir::new().unwrap();
    let dir_b = TempDir::new().unwrap();
    SnapshotFixture::two_stores().write_data_dir(dir_a.path());
    SnapshotFixture::two_stores().write_data_dir(dir_b.path());

    let cache = SnapshotCache::new(Duration::from_secs(60));
    let loads = AtomicUsize::new(0);
    for dir in [&dir_a, &dir_b] {
        let key = CacheKey::new(dir.path(), &["rigby".into(), "rexburg".into()]);
        cache
            .get_or_load(&key, || {
                loads.fetch_add(1, Ordering::SeqCst);
                Loader::new(
                    LoadOptions::new(dir.path())
                        .with_allowlist(vec!["rigby".into(), "rexburg".into()]),
                )
                .load()
            })
            .unwrap();
    }
    assert_eq!(loads.load(Ordering::SeqCst), 2);
    assert_eq!(cache.len(), 2);
}
