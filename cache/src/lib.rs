//! An in-memory cache built around pluggable replacement policies.
//!
//! # Features
//! - **Replacement Policies**: FIFO, LRU, MRU, LFU and Random, all behind one
//!   object-safe [`ReplacementPolicy`] trait with generation-stamped handles.
//! - **Admission Filtering**: wrap any policy in [`policy::Filtered`] to refuse
//!   entries by content, e.g. by cost.
//! - **Size & Volume Limits**: bound a cache by entry count, by summed cost,
//!   or both. Zero is a legal limit.
//! - **Service Lifecycle**: caches start on build and can be shut down
//!   gracefully, after which their contents are frozen.
//! - **Observability**: eviction listeners, `tracing` output and metrics.
//! - **Configuration**: optional `serde` support for [`CacheConfig`].

// Public modules that form the API
pub mod builder;
pub mod cache;
pub mod config;
pub mod error;
pub mod eviction;
pub mod handle;
pub mod listener;
pub mod metrics;
pub mod policy;
pub mod service;

// Re-export the primary user-facing types for convenience
pub use builder::CacheBuilder;
pub use cache::Cache;
pub use config::CacheConfig;
pub use error::{BuildError, CacheError, EvictionError, ServiceError};
pub use eviction::EvictionSupport;
pub use handle::Handle;
pub use listener::{EvictionListener, EvictionReason};
pub use metrics::MetricsSnapshot;
pub use policy::{BoxedPolicy, Hitable, PolicyKind, ReplacementPolicy};
pub use service::{LifecycleHooks, RunState, ServiceLifecycle, ShutdownPermission};
