use crate::cache::Cache;
use crate::config::CacheConfig;
use crate::error::BuildError;
use crate::eviction::EvictionSupport;
use crate::policy::{BoxedPolicy, PolicyKind, ReplacementPolicy};
use crate::service::{LifecycleHooks, ServiceLifecycle, ShutdownPermission};
use crate::EvictionListener;

use core::fmt;
use std::hash::{BuildHasher, Hash};
use std::sync::Arc;

const DEFAULT_NAME: &str = "cache";

/// A builder for creating `Cache` instances.
pub struct CacheBuilder<K, V, H = ahash::RandomState> {
  config: CacheConfig,
  name: String,
  hasher: H,
  policy: Option<BoxedPolicy<K>>,
  listener: Option<Arc<dyn EvictionListener<K, V>>>,
  hooks: Option<Arc<dyn LifecycleHooks>>,
  permission: Option<Arc<dyn ShutdownPermission>>,
}

// Manual Debug implementation for CacheBuilder.
impl<K, V, H> fmt::Debug for CacheBuilder<K, V, H> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("CacheBuilder")
      .field("config", &self.config)
      .field("name", &self.name)
      .field("has_policy", &self.policy.is_some())
      .field("has_listener", &self.listener.is_some())
      .field("has_hooks", &self.hooks.is_some())
      .field("has_permission", &self.permission.is_some())
      .finish_non_exhaustive()
  }
}

impl<K, V> CacheBuilder<K, V, ahash::RandomState> {
  /// Creates a builder for an unbounded cache.
  pub fn new() -> Self {
    Self::from_config(CacheConfig::default())
  }

  /// Starts from settings loaded elsewhere, e.g. a configuration file.
  pub fn from_config(config: CacheConfig) -> Self {
    Self {
      config,
      name: DEFAULT_NAME.to_string(),
      hasher: ahash::RandomState::new(),
      policy: None,
      listener: None,
      hooks: None,
      permission: None,
    }
  }
}

impl<K, V> Default for CacheBuilder<K, V, ahash::RandomState> {
  fn default() -> Self {
    Self::new()
  }
}

// --- General Configuration Methods ---
// This impl block has no restrictive bounds on K or V.
impl<K, V, H> CacheBuilder<K, V, H> {
  /// Sets the maximum number of entries.
  pub fn maximum_size(mut self, maximum_size: usize) -> Self {
    self.config.maximum_size = maximum_size;
    self
  }

  /// Sets the maximum summed cost of all entries.
  pub fn maximum_volume(mut self, maximum_volume: u64) -> Self {
    self.config.maximum_volume = maximum_volume;
    self
  }

  /// Removes both limits.
  pub fn unbounded(mut self) -> Self {
    self.config.maximum_size = usize::MAX;
    self.config.maximum_volume = u64::MAX;
    self
  }

  /// Sets how many entries the key map and a policy built from
  /// [`policy_kind`](Self::policy_kind) reserve up front.
  pub fn initial_capacity(mut self, initial_capacity: usize) -> Self {
    self.config.initial_capacity = initial_capacity;
    self
  }

  /// Sets the replacement policy. Takes precedence over `policy_kind`.
  pub fn policy<P>(mut self, policy: P) -> Self
  where
    P: ReplacementPolicy<K> + Send + 'static,
  {
    self.policy = Some(Box::new(policy));
    self
  }

  pub fn boxed_policy(mut self, policy: BoxedPolicy<K>) -> Self {
    self.policy = Some(policy);
    self
  }

  /// Selects a built-in replacement policy, built at `build` time.
  pub fn policy_kind(mut self, kind: PolicyKind) -> Self {
    self.config.policy = Some(kind);
    self
  }

  /// Names the cache in log output.
  pub fn name(mut self, name: impl Into<String>) -> Self {
    self.name = name.into();
    self
  }

  /// Sets the eviction listener for the cache.
  pub fn eviction_listener<Listener>(mut self, listener: Listener) -> Self
  where
    Listener: EvictionListener<K, V> + 'static,
  {
    self.listener = Some(Arc::new(listener));
    self
  }

  pub fn lifecycle_hooks<Hooks>(mut self, hooks: Hooks) -> Self
  where
    Hooks: LifecycleHooks + 'static,
  {
    self.hooks = Some(Arc::new(hooks));
    self
  }

  /// Sets a gate that must approve every shutdown request.
  pub fn shutdown_permission<Permission>(mut self, permission: Permission) -> Self
  where
    Permission: ShutdownPermission + 'static,
  {
    self.permission = Some(Arc::new(permission));
    self
  }

  /// Uses a custom hasher for the key map.
  pub fn hasher<H2>(self, hasher: H2) -> CacheBuilder<K, V, H2> {
    CacheBuilder {
      config: self.config,
      name: self.name,
      hasher,
      policy: self.policy,
      listener: self.listener,
      hooks: self.hooks,
      permission: self.permission,
    }
  }

  pub fn config(&self) -> &CacheConfig {
    &self.config
  }
}

// This impl block contains the full set of trait bounds required to actually
// build and run the cache.
impl<K, V, H> CacheBuilder<K, V, H>
where
  K: Eq + Hash + Clone + Send + 'static,
  V: Send + Sync + 'static,
  H: BuildHasher,
{
  /// Validates the configuration and starts the cache.
  pub fn build(self) -> Result<Cache<K, V, H>, BuildError> {
    let CacheBuilder {
      config,
      name,
      hasher,
      policy,
      listener,
      hooks,
      permission,
    } = self;

    let policy = policy.or_else(|| config.policy.map(|kind| kind.build(config.initial_capacity)));
    let eviction = EvictionSupport::new(&config, policy)?;

    let mut lifecycle = ServiceLifecycle::new(name);
    if let Some(hooks) = hooks {
      lifecycle = lifecycle.with_hooks(hooks);
    }
    if let Some(permission) = permission {
      lifecycle = lifecycle.with_permission(permission);
    }

    let cache = Cache::from_parts(hasher, config.initial_capacity, eviction, lifecycle, listener);
    cache.start()?;
    tracing::debug!(
      maximum_size = config.maximum_size,
      maximum_volume = config.maximum_volume,
      "cache built"
    );
    Ok(cache)
  }
}
