use crate::policy::slots::DEFAULT_INITIAL_CAPACITY;
use crate::policy::PolicyKind;

/// Capacity and policy settings for a cache.
///
/// `usize::MAX` and `u64::MAX` mean "no limit". Zero is a legal limit and
/// yields a cache that never retains anything.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CacheConfig {
  /// Maximum number of entries.
  pub maximum_size: usize,
  /// Maximum summed cost of all entries.
  pub maximum_volume: u64,
  /// Number of slots the policy reserves up front.
  pub initial_capacity: usize,
  /// Replacement policy to build when none is supplied programmatically.
  pub policy: Option<PolicyKind>,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      maximum_size: usize::MAX,
      maximum_volume: u64::MAX,
      initial_capacity: DEFAULT_INITIAL_CAPACITY,
      policy: None,
    }
  }
}

impl CacheConfig {
  /// Whether any capacity limit is configured.
  pub fn is_bounded(&self) -> bool {
    self.maximum_size != usize::MAX || self.maximum_volume != u64::MAX
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn default_is_unbounded() {
    let config = CacheConfig::default();
    assert!(!config.is_bounded());
    assert_eq!(config.initial_capacity, 16);
    assert_eq!(config.policy, None);
  }

  #[test]
  fn any_limit_makes_it_bounded() {
    let size = CacheConfig {
      maximum_size: 10,
      ..Default::default()
    };
    let volume = CacheConfig {
      maximum_volume: 0,
      ..Default::default()
    };
    assert!(size.is_bounded());
    assert!(volume.is_bounded());
  }

  #[cfg(feature = "serde")]
  #[test]
  fn missing_fields_take_defaults() {
    let config: CacheConfig = serde_json::from_str(r#"{"maximum_size": 100, "policy": "lru"}"#).unwrap();
    assert_eq!(config.maximum_size, 100);
    assert_eq!(config.maximum_volume, u64::MAX);
    assert_eq!(config.policy, Some(PolicyKind::Lru));
  }
}
