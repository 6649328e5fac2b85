//! The concurrent cache that consumes the replacement-policy engine.

use crate::builder::CacheBuilder;
use crate::error::{CacheError, EvictionError, Result, ServiceError};
use crate::eviction::EvictionSupport;
use crate::handle::Handle;
use crate::listener::{EvictionListener, EvictionReason};
use crate::metrics::{Metrics, MetricsSnapshot};
use crate::service::{ActiveGuard, RunState, ServiceLifecycle};

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

struct CacheEntry<V> {
  value: Arc<V>,
  cost: u64,
  // `None` while the cache is unbounded.
  handle: Option<Handle>,
}

type Notification<K, V> = (K, Arc<V>, EvictionReason);

/// Everything guarded by the cache lock: the key map, its total volume and
/// the policy tracking the keys.
struct Inner<K, V, H> {
  map: HashMap<K, CacheEntry<V>, H>,
  volume: u64,
  eviction: EvictionSupport<K>,
}

impl<K, V, H> Inner<K, V, H>
where
  K: Eq + Hash + Clone,
  H: BuildHasher,
{
  fn insert(
    &mut self,
    key: K,
    value: Arc<V>,
    cost: u64,
    hits: u64,
    metrics: &Metrics,
    events: &mut Vec<Notification<K, V>>,
  ) -> Result<bool> {
    let result = if self.map.contains_key(&key) {
      self.replace(key, value, cost, metrics, events)
    } else {
      self.admit(key, value, cost, hits, metrics, events)
    };
    metrics.record_occupancy(self.map.len(), self.volume);
    result
  }

  fn admit(
    &mut self,
    key: K,
    value: Arc<V>,
    cost: u64,
    hits: u64,
    metrics: &Metrics,
    events: &mut Vec<Notification<K, V>>,
  ) -> Result<bool> {
    if !self.eviction.admits(&key) {
      tracing::debug!(cost, "policy refused entry");
      Self::reject(key, value, metrics, events);
      return Ok(false);
    }

    let mut victims = Vec::new();
    let room = {
      let Inner { map, volume, eviction } = self;
      eviction.make_room(map.len(), *volume, cost, |k| map.get(k).map_or(0, |e| e.cost), &mut victims)
    };
    self.discard(victims, metrics, events);
    if !room? {
      tracing::warn!(cost, maximum_volume = self.eviction.maximum_volume(), "entry can never fit, rejected");
      Self::reject(key, value, metrics, events);
      return Ok(false);
    }

    let handle = self.eviction.add_with_hits(key.clone(), hits);
    if self.eviction.is_enabled() && handle.is_none() {
      tracing::debug!(cost, "policy refused entry");
      Self::reject(key, value, metrics, events);
      return Ok(false);
    }

    self.map.insert(key, CacheEntry { value, cost, handle });
    self.volume = self.volume.saturating_add(cost);
    Metrics::incr(&metrics.inserts, 1);
    Metrics::incr(&metrics.keys_admitted, 1);
    Metrics::incr(&metrics.total_volume_added, cost);
    Ok(true)
  }

  fn replace(
    &mut self,
    key: K,
    value: Arc<V>,
    cost: u64,
    metrics: &Metrics,
    events: &mut Vec<Notification<K, V>>,
  ) -> Result<bool> {
    let (handle, old_cost) = match self.map.get(&key) {
      Some(entry) => (entry.handle, entry.cost),
      None => return Ok(false),
    };

    let tracked = match handle {
      Some(handle) => self.eviction.update(handle, key.clone()),
      None => true,
    };
    if !tracked || !self.eviction.can_ever_hold(cost) {
      // The old value goes too; the cache never holds an entry the policy
      // no longer tracks.
      if tracked {
        if let Some(handle) = handle {
          self.eviction.remove(handle);
        }
      }
      if let Some(old) = self.map.remove(&key) {
        self.volume = self.volume.saturating_sub(old.cost);
        events.push((key.clone(), old.value, EvictionReason::Invalidated));
      }
      tracing::debug!(cost, "replacement value refused, entry dropped");
      Self::reject(key, value, metrics, events);
      return Ok(false);
    }

    if let Some(entry) = self.map.get_mut(&key) {
      entry.value = value;
      entry.cost = cost;
    }
    self.volume = self.volume.saturating_sub(old_cost).saturating_add(cost);
    Metrics::incr(&metrics.updates, 1);
    Metrics::incr(&metrics.total_volume_added, cost);

    // A grown value may push the cache over its volume limit.
    let mut victims = Vec::new();
    let trimmed = {
      let Inner { map, volume, eviction } = self;
      eviction.trim(map.len(), *volume, |k| map.get(k).map_or(0, |e| e.cost), &mut victims)
    };
    self.discard(victims, metrics, events);
    trimmed?;
    Ok(self.map.contains_key(&key))
  }

  fn reject(key: K, value: Arc<V>, metrics: &Metrics, events: &mut Vec<Notification<K, V>>) {
    Metrics::incr(&metrics.keys_rejected, 1);
    events.push((key, value, EvictionReason::Rejected));
  }

  /// Drops keys the policy has already given up.
  fn discard(&mut self, victims: Vec<K>, metrics: &Metrics, events: &mut Vec<Notification<K, V>>) {
    for key in victims {
      if let Some(entry) = self.map.remove(&key) {
        self.volume = self.volume.saturating_sub(entry.cost);
        Metrics::incr(&metrics.evicted_by_capacity, 1);
        events.push((key, entry.value, EvictionReason::Capacity));
      }
    }
  }

  /// Evicts entries until at most `size` remain. Returns how many went.
  fn shrink_to(
    &mut self,
    size: usize,
    metrics: &Metrics,
    events: &mut Vec<Notification<K, V>>,
  ) -> Result<usize> {
    let mut evicted = 0;
    while self.map.len() > size && self.eviction.is_enabled() {
      match self.eviction.evict_next() {
        Some(key) => {
          self.discard(vec![key], metrics, events);
          evicted += 1;
        }
        None => {
          return Err(
            EvictionError::PolicyExhausted {
              cache_len: self.map.len(),
              cache_volume: self.volume,
              policy_len: self.eviction.len(),
            }
            .into(),
          );
        }
      }
    }
    Ok(evicted)
  }
}

pub(crate) struct CacheShared<K, V, H> {
  inner: Mutex<Inner<K, V, H>>,
  metrics: Metrics,
  lifecycle: ServiceLifecycle,
  listener: Option<Arc<dyn EvictionListener<K, V>>>,
}

/// A thread-safe, bounded in-memory cache.
///
/// The cache is a cheap handle; clones share the same storage. All access to
/// the key map and the replacement policy is serialized by one lock, and
/// eviction notifications are delivered after that lock is released.
///
/// Once shut down the cache is frozen: operations that would change its
/// contents return [`CacheError::ShutDown`], while reads keep serving stored
/// values without touching the policy or the metrics.
pub struct Cache<K, V, H = ahash::RandomState> {
  shared: Arc<CacheShared<K, V, H>>,
}

impl<K, V, H> Clone for Cache<K, V, H> {
  fn clone(&self) -> Self {
    Self {
      shared: self.shared.clone(),
    }
  }
}

impl<K, V, H> fmt::Debug for Cache<K, V, H> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Cache")
      .field("state", &self.shared.lifecycle.state())
      .field("metrics", &self.shared.metrics.snapshot())
      .finish_non_exhaustive()
  }
}

impl<K, V> Cache<K, V>
where
  K: Eq + Hash + Clone + Send + 'static,
  V: Send + Sync + 'static,
{
  /// Returns a builder for a cache using the default hasher.
  pub fn builder() -> CacheBuilder<K, V> {
    CacheBuilder::new()
  }
}

impl<K, V, H> Cache<K, V, H>
where
  K: Eq + Hash + Clone,
  H: BuildHasher,
{
  pub(crate) fn from_parts(
    hasher: H,
    initial_capacity: usize,
    eviction: EvictionSupport<K>,
    lifecycle: ServiceLifecycle,
    listener: Option<Arc<dyn EvictionListener<K, V>>>,
  ) -> Self {
    let inner = Inner {
      map: HashMap::with_capacity_and_hasher(initial_capacity, hasher),
      volume: 0,
      eviction,
    };
    Self {
      shared: Arc::new(CacheShared {
        inner: Mutex::new(inner),
        metrics: Metrics::new(),
        lifecycle,
        listener,
      }),
    }
  }

  pub(crate) fn start(&self) -> std::result::Result<bool, ServiceError> {
    self.shared.lifecycle.try_start()
  }

  fn enter(&self) -> Result<ActiveGuard<'_>> {
    self
      .shared
      .lifecycle
      .enter()
      .ok_or_else(|| CacheError::ShutDown(self.shared.lifecycle.state()))
  }

  fn notify(&self, events: Vec<Notification<K, V>>) {
    if let Some(listener) = &self.shared.listener {
      for (key, value, reason) in events {
        listener.on_evict(key, value, reason);
      }
    }
  }

  /// Inserts an entry of cost 1. Returns whether the value is retained.
  pub fn insert(&self, key: K, value: V) -> Result<bool> {
    self.insert_with_hits(key, value, 1, 0)
  }

  /// Inserts an entry counting `cost` towards the maximum volume.
  pub fn insert_with_cost(&self, key: K, value: V, cost: u64) -> Result<bool> {
    self.insert_with_hits(key, value, cost, 0)
  }

  /// Inserts an entry that has already been hit `hits` times elsewhere.
  /// Frequency based policies rank it accordingly.
  ///
  /// Inserting an existing key replaces its value in place. The policy
  /// decides what to evict if the new value does not fit, and that may be
  /// the key itself.
  pub fn insert_with_hits(&self, key: K, value: V, cost: u64, hits: u64) -> Result<bool> {
    let _active = self.enter()?;
    let mut events = Vec::new();
    let result = self
      .shared
      .inner
      .lock()
      .insert(key, Arc::new(value), cost, hits, &self.shared.metrics, &mut events);
    self.notify(events);
    result
  }

  /// Inserts every entry at cost 1 under a single lock acquisition.
  /// Returns how many were admitted.
  pub fn insert_all<I>(&self, entries: I) -> Result<usize>
  where
    I: IntoIterator<Item = (K, V)>,
  {
    let _active = self.enter()?;
    let mut events = Vec::new();
    let result = {
      let mut inner = self.shared.inner.lock();
      let mut admitted = 0;
      let mut failure = None;
      for (key, value) in entries {
        match inner.insert(key, Arc::new(value), 1, 0, &self.shared.metrics, &mut events) {
          Ok(true) => admitted += 1,
          Ok(false) => {}
          Err(err) => {
            failure = Some(err);
            break;
          }
        }
      }
      match failure {
        Some(err) => Err(err),
        None => Ok(admitted),
      }
    };
    self.notify(events);
    result
  }

  /// Looks up a value, recording a hit or a miss.
  pub fn get<Q>(&self, key: &Q) -> Option<Arc<V>>
  where
    K: Borrow<Q>,
    Q: Hash + Eq + ?Sized,
  {
    let Some(_active) = self.shared.lifecycle.enter() else {
      return self.peek(key);
    };

    let mut guard = self.shared.inner.lock();
    let inner = &mut *guard;
    match inner.map.get(key) {
      Some(entry) => {
        let value = entry.value.clone();
        if let Some(handle) = entry.handle {
          inner.eviction.touch(handle);
        }
        Metrics::incr(&self.shared.metrics.hits, 1);
        Some(value)
      }
      None => {
        Metrics::incr(&self.shared.metrics.misses, 1);
        None
      }
    }
  }

  /// Looks up several keys under a single lock acquisition.
  pub fn get_all<'a, Q, I>(&self, keys: I) -> HashMap<K, Arc<V>>
  where
    K: Borrow<Q>,
    Q: Hash + Eq + ?Sized + 'a,
    I: IntoIterator<Item = &'a Q>,
  {
    let active = self.shared.lifecycle.enter();
    let mut guard = self.shared.inner.lock();
    let inner = &mut *guard;
    let mut found = HashMap::new();
    for key in keys {
      match inner.map.get_key_value(key) {
        Some((k, entry)) => {
          found.insert(k.clone(), entry.value.clone());
          if active.is_some() {
            if let Some(handle) = entry.handle {
              inner.eviction.touch(handle);
            }
            Metrics::incr(&self.shared.metrics.hits, 1);
          }
        }
        None if active.is_some() => Metrics::incr(&self.shared.metrics.misses, 1),
        None => {}
      }
    }
    found
  }

  /// Reads a value without touching the policy or the metrics.
  pub fn peek<Q>(&self, key: &Q) -> Option<Arc<V>>
  where
    K: Borrow<Q>,
    Q: Hash + Eq + ?Sized,
  {
    self.shared.inner.lock().map.get(key).map(|e| e.value.clone())
  }

  pub fn contains_key<Q>(&self, key: &Q) -> bool
  where
    K: Borrow<Q>,
    Q: Hash + Eq + ?Sized,
  {
    self.shared.inner.lock().map.contains_key(key)
  }

  /// Removes an entry and returns its value.
  pub fn invalidate<Q>(&self, key: &Q) -> Result<Option<Arc<V>>>
  where
    K: Borrow<Q>,
    Q: Hash + Eq + ?Sized,
  {
    let _active = self.enter()?;
    let removed = {
      let mut guard = self.shared.inner.lock();
      let inner = &mut *guard;
      let removed = inner.map.remove_entry(key);
      if let Some((_, entry)) = &removed {
        if let Some(handle) = entry.handle {
          inner.eviction.remove(handle);
        }
        inner.volume = inner.volume.saturating_sub(entry.cost);
        Metrics::incr(&self.shared.metrics.invalidations, 1);
      }
      self.shared.metrics.record_occupancy(inner.map.len(), inner.volume);
      removed
    };

    Ok(removed.map(|(key, entry)| {
      let value = entry.value;
      self.notify(vec![(key, value.clone(), EvictionReason::Invalidated)]);
      value
    }))
  }

  /// Removes every entry. No notifications are sent.
  pub fn clear(&self) -> Result<()> {
    let _active = self.enter()?;
    let mut inner = self.shared.inner.lock();
    inner.eviction.clear();
    inner.map.clear();
    inner.volume = 0;
    self.shared.metrics.record_occupancy(0, 0);
    Ok(())
  }

  /// Forces up to `count` evictions chosen by the policy. Returns how many
  /// entries were evicted; an unbounded cache never evicts.
  pub fn evict(&self, count: usize) -> Result<usize> {
    let _active = self.enter()?;
    let mut events = Vec::new();
    let result = {
      let mut inner = self.shared.inner.lock();
      let target = inner.map.len().saturating_sub(count);
      let result = inner.shrink_to(target, &self.shared.metrics, &mut events);
      self.shared.metrics.record_occupancy(inner.map.len(), inner.volume);
      result
    };
    self.notify(events);
    result
  }

  /// Evicts until at most `size` entries remain.
  pub fn trim_to_size(&self, size: usize) -> Result<usize> {
    let _active = self.enter()?;
    let mut events = Vec::new();
    let result = {
      let mut inner = self.shared.inner.lock();
      let result = inner.shrink_to(size, &self.shared.metrics, &mut events);
      self.shared.metrics.record_occupancy(inner.map.len(), inner.volume);
      result
    };
    self.notify(events);
    result
  }

  /// The next `n` keys the policy would evict, in eviction order where the
  /// policy has one.
  pub fn eviction_candidates(&self, n: usize) -> Vec<K> {
    let inner = self.shared.inner.lock();
    inner.eviction.peek_all().into_iter().take(n).cloned().collect()
  }

  pub fn len(&self) -> usize {
    self.shared.inner.lock().map.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// The summed cost of all entries.
  pub fn volume(&self) -> u64 {
    self.shared.inner.lock().volume
  }

  pub fn metrics(&self) -> MetricsSnapshot {
    self.shared.metrics.snapshot()
  }

  pub fn state(&self) -> RunState {
    self.shared.lifecycle.state()
  }

  /// Stops accepting changes. In-flight operations complete first.
  pub fn shutdown(&self) -> std::result::Result<(), ServiceError> {
    self.shared.lifecycle.shutdown()
  }

  pub fn shutdown_now(&self) -> std::result::Result<(), ServiceError> {
    self.shared.lifecycle.shutdown_now()
  }

  pub fn await_termination(&self, timeout: Duration) -> bool {
    self.shared.lifecycle.await_termination(timeout)
  }

  pub fn is_shutdown(&self) -> bool {
    self.shared.lifecycle.is_shutdown()
  }

  pub fn is_terminated(&self) -> bool {
    self.shared.lifecycle.is_terminated()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::policy::{FifoPolicy, LfuPolicy, LruPolicy, PolicyKind};

  use std::sync::atomic::{AtomicUsize, Ordering};

  fn lru(maximum_size: usize) -> Cache<String, u32> {
    Cache::builder()
      .maximum_size(maximum_size)
      .policy(LruPolicy::new(maximum_size))
      .build()
      .unwrap()
  }

  #[test]
  fn cache_is_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Cache<String, u32>>();
  }

  #[test]
  fn insert_and_get() {
    let cache = lru(4);
    assert_eq!(cache.insert("a".to_string(), 1), Ok(true));
    assert_eq!(cache.get("a").as_deref(), Some(&1));
    assert_eq!(cache.get("missing"), None);

    let metrics = cache.metrics();
    assert_eq!(metrics.hits, 1);
    assert_eq!(metrics.misses, 1);
    assert_eq!(metrics.inserts, 1);
    assert_eq!(metrics.current_size, 1);
  }

  #[test]
  fn lru_keeps_recently_read_entries() {
    let cache = lru(2);
    cache.insert("a".to_string(), 1).unwrap();
    cache.insert("b".to_string(), 2).unwrap();
    cache.get("a");
    cache.insert("c".to_string(), 3).unwrap();

    assert!(cache.contains_key("a"));
    assert!(!cache.contains_key("b"));
    assert!(cache.contains_key("c"));
    assert_eq!(cache.metrics().evicted_by_capacity, 1);
  }

  #[test]
  fn peek_does_not_touch_policy() {
    let cache = lru(2);
    cache.insert("a".to_string(), 1).unwrap();
    cache.insert("b".to_string(), 2).unwrap();
    cache.peek("a");
    cache.insert("c".to_string(), 3).unwrap();

    assert!(!cache.contains_key("a"));
    assert_eq!(cache.metrics().hits, 0);
  }

  #[test]
  fn replace_updates_value_and_volume() {
    let cache: Cache<&str, &str> = Cache::builder()
      .maximum_volume(10)
      .policy(FifoPolicy::new(4))
      .build()
      .unwrap();
    cache.insert_with_cost("a", "small", 2).unwrap();
    cache.insert_with_cost("a", "bigger", 5).unwrap();

    assert_eq!(cache.len(), 1);
    assert_eq!(cache.volume(), 5);
    assert_eq!(cache.peek("a").as_deref(), Some(&"bigger"));
    assert_eq!(cache.metrics().updates, 1);
  }

  #[test]
  fn growing_in_place_evicts_others() {
    let cache: Cache<&str, ()> = Cache::builder()
      .maximum_volume(10)
      .policy(FifoPolicy::new(4))
      .build()
      .unwrap();
    cache.insert_with_cost("a", (), 4).unwrap();
    cache.insert_with_cost("b", (), 4).unwrap();
    assert_eq!(cache.insert_with_cost("b", (), 8), Ok(true));

    assert!(!cache.contains_key("a"));
    assert_eq!(cache.volume(), 8);
  }

  #[test]
  fn oversize_entries_are_rejected() {
    let rejected = Arc::new(AtomicUsize::new(0));
    let counter = rejected.clone();
    let cache = Cache::<&str, ()>::builder()
      .maximum_volume(10)
      .policy(FifoPolicy::new(4))
      .eviction_listener(move |_key: &str, _value: Arc<()>, reason: EvictionReason| {
        if reason == EvictionReason::Rejected {
          counter.fetch_add(1, Ordering::SeqCst);
        }
      })
      .build()
      .unwrap();
    cache.insert_with_cost("keep", (), 5).unwrap();

    assert_eq!(cache.insert_with_cost("huge", (), 11), Ok(false));
    assert!(cache.contains_key("keep"));
    assert_eq!(rejected.load(Ordering::SeqCst), 1);
    assert_eq!(cache.metrics().keys_rejected, 1);
  }

  #[test]
  fn zero_size_cache_retains_nothing() {
    let cache: Cache<u32, u32> = Cache::builder()
      .maximum_size(0)
      .policy_kind(PolicyKind::Fifo)
      .build()
      .unwrap();
    assert_eq!(cache.insert(1, 1), Ok(false));
    assert!(cache.is_empty());
  }

  #[test]
  fn lfu_seeded_hits_survive_eviction() {
    let cache: Cache<&str, ()> = Cache::builder()
      .maximum_size(2)
      .policy(LfuPolicy::new(2))
      .build()
      .unwrap();
    cache.insert_with_hits("popular", (), 1, 10).unwrap();
    cache.insert("cold", ()).unwrap();
    cache.insert("new", ()).unwrap();

    assert!(cache.contains_key("popular"));
    assert!(!cache.contains_key("cold"));
  }

  #[test]
  fn invalidate_removes_from_policy() {
    let cache = lru(2);
    cache.insert("a".to_string(), 1).unwrap();
    assert_eq!(cache.invalidate("a").unwrap().as_deref(), Some(&1));
    assert_eq!(cache.invalidate("a"), Ok(None));
    assert!(cache.eviction_candidates(8).is_empty());
  }

  #[test]
  fn evict_and_trim() {
    let cache: Cache<u32, u32> = Cache::builder()
      .maximum_size(10)
      .policy(FifoPolicy::new(10))
      .build()
      .unwrap();
    for i in 0..6 {
      cache.insert(i, i).unwrap();
    }

    assert_eq!(cache.eviction_candidates(2), vec![0, 1]);
    assert_eq!(cache.evict(2), Ok(2));
    assert_eq!(cache.trim_to_size(1), Ok(3));
    assert_eq!(cache.len(), 1);
    assert!(cache.contains_key(&5));
    assert_eq!(cache.evict(5), Ok(1));
  }

  #[test]
  fn unbounded_cache_needs_no_policy() {
    let cache: Cache<u32, u32> = Cache::builder().build().unwrap();
    for i in 0..100 {
      cache.insert(i, i).unwrap();
    }
    assert_eq!(cache.len(), 100);
    assert_eq!(cache.evict(10), Ok(0));
    assert!(cache.eviction_candidates(10).is_empty());
  }

  #[test]
  fn bulk_operations() {
    let cache = lru(8);
    let admitted = cache
      .insert_all((0..5).map(|i| (format!("k{i}"), i)))
      .unwrap();
    assert_eq!(admitted, 5);

    let found = cache.get_all(["k1", "k3", "nope"]);
    assert_eq!(found.len(), 2);
    assert_eq!(found.get("k3").map(|v| **v), Some(3));
    assert_eq!(cache.metrics().misses, 1);
  }

  #[test]
  fn shut_down_cache_is_frozen() {
    let cache = lru(2);
    cache.insert("a".to_string(), 1).unwrap();
    cache.shutdown().unwrap();

    assert!(cache.is_terminated());
    assert_eq!(
      cache.insert("b".to_string(), 2),
      Err(CacheError::ShutDown(RunState::Terminated))
    );
    assert!(cache.invalidate("a").is_err());
    assert!(cache.clear().is_err());

    assert_eq!(cache.get("a").as_deref(), Some(&1));
    assert_eq!(cache.metrics().hits, 0);
  }
}
