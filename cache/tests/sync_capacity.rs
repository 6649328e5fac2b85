mod common;

use coconut_cache::policy::{FifoPolicy, Filtered, LfuPolicy, MruPolicy};
use coconut_cache::{Cache, CacheBuilder, PolicyKind};
use pretty_assertions::assert_eq;

#[test]
fn test_size_limit_is_never_exceeded() {
  common::init_tracing();
  let mut kinds = vec![PolicyKind::Fifo, PolicyKind::Lru, PolicyKind::Mru, PolicyKind::Lfu];
  #[cfg(feature = "random")]
  kinds.push(PolicyKind::Random);
  for kind in kinds {
    let cache: Cache<u32, u32> = CacheBuilder::new()
      .maximum_size(10)
      .policy_kind(kind)
      .build()
      .unwrap();

    for i in 0..100 {
      assert_eq!(cache.insert(i, i), Ok(true), "{kind}");
      if i % 3 == 0 {
        cache.get(&(i / 2));
      }
      assert!(cache.len() <= 10, "{kind}: {} entries", cache.len());
    }
    assert_eq!(cache.len(), 10, "{kind}");
    assert_eq!(cache.metrics().evicted_by_capacity, 90, "{kind}");
  }
}

#[test]
fn test_volume_limit_evicts_several_entries_for_one_large_entry() {
  let cache: Cache<&str, Vec<u8>> = CacheBuilder::new()
    .maximum_volume(100)
    .policy(FifoPolicy::new(8))
    .build()
    .unwrap();

  for key in ["a", "b", "c", "d"] {
    cache.insert_with_cost(key, vec![0; 25], 25).unwrap();
  }
  assert_eq!(cache.volume(), 100);

  assert_eq!(cache.insert_with_cost("big", vec![0; 60], 60), Ok(true));
  assert_eq!(cache.volume(), 85);
  assert_eq!(cache.len(), 2);
  assert!(cache.contains_key("d"));
  assert!(cache.contains_key("big"));
}

#[test]
fn test_both_limits_apply_together() {
  let cache: Cache<u32, ()> = CacheBuilder::new()
    .maximum_size(3)
    .maximum_volume(10)
    .policy(FifoPolicy::new(4))
    .build()
    .unwrap();

  cache.insert_with_cost(1, (), 1).unwrap();
  cache.insert_with_cost(2, (), 1).unwrap();
  cache.insert_with_cost(3, (), 1).unwrap();
  cache.insert_with_cost(4, (), 1).unwrap();
  assert_eq!(cache.len(), 3, "size limit");

  cache.insert_with_cost(5, (), 9).unwrap();
  assert_eq!(cache.volume(), 10, "volume limit");
  assert_eq!(cache.eviction_candidates(10), vec![4, 5]);
}

#[test]
fn test_mru_cache_evicts_most_recent_access() {
  let cache: Cache<u32, u32> = CacheBuilder::new()
    .maximum_size(3)
    .policy(MruPolicy::new(3))
    .build()
    .unwrap();
  cache.insert(1, 1).unwrap();
  cache.insert(2, 2).unwrap();
  cache.insert(3, 3).unwrap();
  cache.get(&1);

  cache.insert(4, 4).unwrap();
  assert!(!cache.contains_key(&1));
  assert!(cache.contains_key(&2));
  assert!(cache.contains_key(&3));
}

#[test]
fn test_lfu_cache_keeps_frequently_read_entries() {
  let cache: Cache<u32, u32> = CacheBuilder::new()
    .maximum_size(4)
    .policy(LfuPolicy::new(4))
    .build()
    .unwrap();
  for i in 0..4 {
    cache.insert(i, i).unwrap();
  }
  for _ in 0..5 {
    cache.get(&0);
    cache.get(&2);
  }
  cache.get(&3);

  cache.insert(10, 10).unwrap();
  cache.insert(11, 11).unwrap();
  assert!(cache.contains_key(&0));
  assert!(cache.contains_key(&2));
  assert!(!cache.contains_key(&1));
}

#[test]
fn test_filtered_policy_rejects_in_cache() {
  let cache: Cache<String, String> = CacheBuilder::new()
    .maximum_size(8)
    .policy(Filtered::max_cost(FifoPolicy::new(8), 5, |key: &String| key.len() as u64))
    .build()
    .unwrap();

  assert_eq!(cache.insert("short".into(), "ok".into()), Ok(true));
  assert_eq!(cache.insert("much-too-long".into(), "no".into()), Ok(false));
  assert_eq!(cache.len(), 1);
  assert_eq!(cache.metrics().keys_rejected, 1);
  assert_eq!(cache.metrics().keys_admitted, 1);
}

#[test]
fn test_refused_entry_does_not_evict_residents() {
  let cache: Cache<String, String> = CacheBuilder::new()
    .maximum_size(1)
    .policy(Filtered::max_cost(FifoPolicy::new(1), 5, |key: &String| key.len() as u64))
    .build()
    .unwrap();

  assert_eq!(cache.insert("ok".into(), "kept".into()), Ok(true));
  assert_eq!(cache.insert("much-too-long".into(), "no".into()), Ok(false));
  assert_eq!(cache.peek("ok").as_deref().map(String::as_str), Some("kept"));
  assert_eq!(cache.len(), 1);
  assert_eq!(cache.metrics().evicted_by_capacity, 0);
  assert_eq!(cache.metrics().keys_rejected, 1);
}

#[test]
fn test_zero_volume_cache_admits_only_free_entries() {
  let cache: Cache<u32, u32> = CacheBuilder::new()
    .maximum_volume(0)
    .policy(FifoPolicy::new(1))
    .build()
    .unwrap();

  assert_eq!(cache.insert(1, 1), Ok(false));
  assert_eq!(cache.insert_with_cost(2, 2, 0), Ok(true));
  assert_eq!(cache.len(), 1);
}
