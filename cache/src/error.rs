use crate::service::RunState;

use thiserror::Error;

/// Errors that can occur when building a cache.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
  /// A maximum size or volume was configured but no replacement policy was
  /// given to enforce it.
  #[error(
    "must define a cache policy for a bounded cache (maximum_size = {maximum_size}, maximum_volume = {maximum_volume})"
  )]
  PolicyRequired {
    maximum_size: usize,
    maximum_volume: u64,
  },

  /// A policy name in the configuration does not match any built-in policy.
  #[error("unknown replacement policy '{0}'")]
  UnknownPolicy(String),

  /// The cache service could not be started.
  #[error("failed to start cache service: {0}")]
  Service(#[from] ServiceError),
}

/// Errors raised by the service lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
  /// `try_start` was called after a shutdown had begun.
  #[error("cannot restart service (state: {0})")]
  CannotRestart(RunState),

  /// The configured shutdown permission refused the request.
  #[error("shutdown permission denied: {0}")]
  PermissionDenied(String),
}

/// Errors raised while making room in a bounded cache.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvictionError {
  /// The cache reports itself full but the policy has nothing left to evict.
  /// The cache's bookkeeping and the policy's have diverged.
  #[error(
    "cache is full ({cache_len} entries, volume {cache_volume}) but the policy has nothing to evict ({policy_len} tracked)"
  )]
  PolicyExhausted {
    cache_len: usize,
    cache_volume: u64,
    policy_len: usize,
  },
}

/// Errors returned by cache operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
  /// The cache service is not running; its contents are frozen.
  #[error("cache is not running (state: {0})")]
  ShutDown(RunState),

  #[error(transparent)]
  Eviction(#[from] EvictionError),
}

/// A specialized `Result` type for cache operations.
pub type Result<T, E = CacheError> = std::result::Result<T, E>;
