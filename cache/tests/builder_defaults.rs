use coconut_cache::{BuildError, Cache, CacheBuilder, CacheConfig, PolicyKind};
use pretty_assertions::assert_eq;

#[test]
fn test_default_builder_is_unbounded() {
  let cache: Cache<u32, u32> = CacheBuilder::default().build().unwrap();
  for i in 0..1_000 {
    cache.insert(i, i).unwrap();
  }
  assert_eq!(cache.len(), 1_000);
}

#[test]
fn test_volume_without_policy_is_rejected() {
  let err = CacheBuilder::<u32, u32>::new()
    .maximum_volume(1024)
    .build()
    .unwrap_err();
  assert_eq!(
    err,
    BuildError::PolicyRequired {
      maximum_size: usize::MAX,
      maximum_volume: 1024,
    }
  );
}

#[cfg(feature = "serde")]
#[test]
fn test_config_from_json() {
  let json = r#"{
    "maximum_size": 3,
    "policy": "fifo"
  }"#;
  let config: CacheConfig = serde_json::from_str(json).unwrap();
  assert_eq!(
    config,
    CacheConfig {
      maximum_size: 3,
      policy: Some(PolicyKind::Fifo),
      ..Default::default()
    }
  );

  let cache: Cache<&str, u32> = CacheBuilder::from_config(config).build().unwrap();
  for (i, key) in ["a", "b", "c", "d"].into_iter().enumerate() {
    cache.insert(key, i as u32).unwrap();
  }
  assert!(!cache.contains_key("a"));
  assert_eq!(cache.len(), 3);
}

#[cfg(feature = "serde")]
#[test]
fn test_config_without_policy_fails_when_bounded() {
  let config: CacheConfig = serde_json::from_str(r#"{"maximum_volume": 0}"#).unwrap();
  let result = CacheBuilder::<String, String>::from_config(config).build();
  assert!(matches!(result, Err(BuildError::PolicyRequired { .. })));
}

#[test]
fn test_unknown_policy_name() {
  assert_eq!(
    "arc".parse::<PolicyKind>(),
    Err(BuildError::UnknownPolicy("arc".to_string()))
  );
  #[cfg(feature = "serde")]
  assert!(serde_json::from_str::<CacheConfig>(r#"{"policy": "arc"}"#).is_err());
}

#[cfg(feature = "serde")]
#[test]
fn test_metrics_snapshot_serializes() {
  let cache: Cache<u32, u32> = CacheBuilder::new()
    .maximum_size(1)
    .policy_kind(PolicyKind::Lru)
    .build()
    .unwrap();
  cache.insert(1, 1).unwrap();
  cache.insert(2, 2).unwrap();
  cache.get(&2);

  let json = serde_json::to_value(cache.metrics()).unwrap();
  assert_eq!(json["hits"], 1);
  assert_eq!(json["evicted_by_capacity"], 1);
  assert_eq!(json["current_size"], 1);
}
