//! Bridges a cache's capacity limits to its replacement policy.

use crate::config::CacheConfig;
use crate::error::{BuildError, EvictionError};
use crate::handle::Handle;
use crate::policy::BoxedPolicy;

use std::fmt;

/// Decides when the policy must give up entries so a cache stays within its
/// limits.
///
/// An unbounded cache has no policy; every operation is then a no-op and
/// [`is_enabled`](Self::is_enabled) reports `false`.
pub struct EvictionSupport<T> {
  policy: Option<BoxedPolicy<T>>,
  maximum_size: usize,
  maximum_volume: u64,
}

impl<T> fmt::Debug for EvictionSupport<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("EvictionSupport")
      .field("enabled", &self.is_enabled())
      .field("tracked", &self.len())
      .field("maximum_size", &self.maximum_size)
      .field("maximum_volume", &self.maximum_volume)
      .finish()
  }
}

impl<T> EvictionSupport<T> {
  /// Fails with [`BuildError::PolicyRequired`] if a limit is configured
  /// without a policy to enforce it.
  pub fn new(config: &CacheConfig, policy: Option<BoxedPolicy<T>>) -> Result<Self, BuildError> {
    if config.is_bounded() && policy.is_none() {
      return Err(BuildError::PolicyRequired {
        maximum_size: config.maximum_size,
        maximum_volume: config.maximum_volume,
      });
    }
    Ok(Self {
      policy,
      maximum_size: config.maximum_size,
      maximum_volume: config.maximum_volume,
    })
  }

  pub fn is_enabled(&self) -> bool {
    self.policy.is_some()
  }

  pub fn maximum_size(&self) -> usize {
    self.maximum_size
  }

  pub fn maximum_volume(&self) -> u64 {
    self.maximum_volume
  }

  pub fn is_capacity_reached(&self, current_size: usize) -> bool {
    current_size >= self.maximum_size
  }

  /// Whether an entry of `cost` could be held even by an empty cache.
  pub fn can_ever_hold(&self, cost: u64) -> bool {
    self.maximum_size > 0 && cost <= self.maximum_volume
  }

  /// Always `None` when disabled.
  pub fn add(&mut self, data: T) -> Option<Handle> {
    self.policy.as_mut().and_then(|p| p.add(data))
  }

  /// Whether the policy would admit `data`. Always `true` without a policy.
  pub fn admits(&self, data: &T) -> bool {
    self.policy.as_ref().map_or(true, |p| p.admits(data))
  }

  pub fn add_with_hits(&mut self, data: T, hits: u64) -> Option<Handle> {
    self.policy.as_mut().and_then(|p| p.add_with_hits(data, hits))
  }

  pub fn touch(&mut self, handle: Handle) {
    if let Some(policy) = self.policy.as_mut() {
      policy.touch(handle);
    }
  }

  /// Returns `false` if the policy no longer tracks the entry. Always `true`
  /// when disabled.
  pub fn update(&mut self, handle: Handle, data: T) -> bool {
    match self.policy.as_mut() {
      Some(policy) => policy.update(handle, data),
      None => true,
    }
  }

  pub fn remove(&mut self, handle: Handle) -> Option<T> {
    self.policy.as_mut().and_then(|p| p.remove(handle))
  }

  pub fn evict_next(&mut self) -> Option<T> {
    let victim = self.policy.as_mut().and_then(|p| p.evict_next());
    if victim.is_some() {
      tracing::trace!(remaining = self.len(), "policy evicted an entry");
    }
    victim
  }

  /// Evicts until a new entry of `cost` fits next to `current_size` entries
  /// totalling `current_volume`.
  ///
  /// Victims are appended to `victims` as they are taken from the policy,
  /// including when an error is returned, so the caller can always drop them
  /// from its own store. `weigh` reports the cost of a victim.
  ///
  /// Returns `Ok(false)` without evicting anything if the entry can never
  /// fit.
  pub fn make_room(
    &mut self,
    current_size: usize,
    current_volume: u64,
    cost: u64,
    mut weigh: impl FnMut(&T) -> u64,
    victims: &mut Vec<T>,
  ) -> Result<bool, EvictionError> {
    if !self.is_enabled() {
      return Ok(true);
    }
    if !self.can_ever_hold(cost) {
      return Ok(false);
    }

    let mut size = current_size;
    let mut volume = current_volume;
    while self.is_capacity_reached(size) || volume.saturating_add(cost) > self.maximum_volume {
      let victim = self.next_victim(size, volume)?;
      size = size.saturating_sub(1);
      volume = volume.saturating_sub(weigh(&victim));
      victims.push(victim);
    }
    Ok(true)
  }

  /// Evicts until the store is back within both limits, e.g. after an
  /// existing entry grew in place.
  pub fn trim(
    &mut self,
    current_size: usize,
    current_volume: u64,
    mut weigh: impl FnMut(&T) -> u64,
    victims: &mut Vec<T>,
  ) -> Result<(), EvictionError> {
    if !self.is_enabled() {
      return Ok(());
    }

    let mut size = current_size;
    let mut volume = current_volume;
    while size > self.maximum_size || volume > self.maximum_volume {
      let victim = self.next_victim(size, volume)?;
      size = size.saturating_sub(1);
      volume = volume.saturating_sub(weigh(&victim));
      victims.push(victim);
    }
    Ok(())
  }

  fn next_victim(&mut self, size: usize, volume: u64) -> Result<T, EvictionError> {
    match self.evict_next() {
      Some(victim) => Ok(victim),
      None => {
        let err = EvictionError::PolicyExhausted {
          cache_len: size,
          cache_volume: volume,
          policy_len: self.len(),
        };
        tracing::error!(error = %err, "eviction bookkeeping diverged");
        Err(err)
      }
    }
  }

  pub fn peek_all(&self) -> Vec<&T> {
    self.policy.as_ref().map(|p| p.peek_all()).unwrap_or_default()
  }

  pub fn len(&self) -> usize {
    self.policy.as_ref().map_or(0, |p| p.len())
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  pub fn clear(&mut self) {
    if let Some(policy) = self.policy.as_mut() {
      policy.clear();
    }
  }
}
