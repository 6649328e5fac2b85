use std::fmt;
use std::sync::Arc;

/// Describes the reason an entry left the cache, or never entered it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EvictionReason {
  /// The replacement policy chose the entry to make room.
  Capacity,
  /// The entry was removed by `invalidate`.
  Invalidated,
  /// The entry was refused admission, either because it can never fit or
  /// because the policy declined it.
  Rejected,
}

impl fmt::Display for EvictionReason {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      EvictionReason::Capacity => write!(f, "evicted due to capacity"),
      EvictionReason::Invalidated => write!(f, "manually invalidated"),
      EvictionReason::Rejected => write!(f, "rejected by admission"),
    }
  }
}

/// A listener that can be registered with the cache to receive notifications
/// when entries are evicted, invalidated or rejected.
///
/// `on_evict` is called on the thread that performed the cache operation,
/// after the cache lock has been released.
pub trait EvictionListener<K, V>: Send + Sync {
  fn on_evict(&self, key: K, value: Arc<V>, reason: EvictionReason);
}

impl<K, V, F> EvictionListener<K, V> for F
where
  F: Fn(K, Arc<V>, EvictionReason) + Send + Sync,
{
  fn on_evict(&self, key: K, value: Arc<V>, reason: EvictionReason) {
    self(key, value, reason)
  }
}
