use das2_graph::cache::{CacheTag, DataSetCache};
use das2_graph::data_types::{DataSet, DenseDataSet};
use std::sync::Arc;

fn dataset(v: f64) -> Arc<dyn DataSet> {
    Arc::new(DenseDataSet::rank1(vec![v]))
}

#[test]
fn test_cache_tag_coverage() {
    let stored = CacheTag::new("wav", (0.0, 100.0), Some(1.0));
    assert!(stored.contains(&CacheTag::new("wav", (10.0, 20.0), Some(2.0))));
    assert!(stored.contains(&CacheTag::new("wav", (0.0, 100.0), Some(1.0))));
    // Coarser stored data cannot serve a finer request.
    assert!(!stored.contains(&CacheTag::new("wav", (10.0, 20.0), Some(0.5))));
    assert!(!stored.contains(&CacheTag::new("wav", (10.0, 120.0), Some(2.0))));
    assert!(!stored.contains(&CacheTag::new("mag", (10.0, 20.0), Some(2.0))));
    // Full resolution is finer than anything.
    assert!(!stored.contains(&CacheTag::new("wav", (10.0, 20.0), None)));
    assert!(CacheTag::new("wav", (0.0, 100.0), None).contains(&CacheTag::new("wav", (1.0, 2.0), Some(5.0))));
}

#[test]
fn test_store_and_retrieve() {
    let cache = DataSetCache::new();
    let tag = CacheTag::new("wav", (0.0, 100.0), Some(1.0));
    assert!(!cache.have_stored(&tag));
    assert!(cache.retrieve(&tag).is_none());

    cache.store(tag.clone(), dataset(1.0));
    assert!(cache.have_stored(&CacheTag::new("wav", (5.0, 50.0), Some(1.0))));
    let got = cache.retrieve(&CacheTag::new("wav", (5.0, 50.0), Some(3.0))).unwrap();
    assert_eq!(got.value(&[0]), 1.0);

    let stats = cache.stats();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.entries, 1);
}

#[test]
fn test_store_keeps_existing_covering_entry() {
    let cache = DataSetCache::new();
    cache.store(CacheTag::new("wav", (0.0, 100.0), Some(1.0)), dataset(1.0));
    let kept = cache.store(CacheTag::new("wav", (10.0, 20.0), Some(1.0)), dataset(2.0));
    assert_eq!(kept.value(&[0]), 1.0);
    assert_eq!(cache.stats().entries, 1);

    cache.clear();
    assert_eq!(cache.stats().entries, 0);
}

#[test]
fn test_concurrent_stores() {
    let cache = Arc::new(DataSetCache::new());
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let cache = cache.clone();
            std::thread::spawn(move || {
                let start = i as f64 * 10.0;
                cache.store(
                    CacheTag::new("wav", (start, start + 10.0), Some(1.0)),
                    dataset(i as f64),
                );
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
    assert_eq!(cache.stats().entries, 8);
    let got = cache
        .retrieve(&CacheTag::new("wav", (31.0, 39.0), Some(1.0)))
        .unwrap();
    assert_eq!(got.value(&[0]), 3.0);
}
