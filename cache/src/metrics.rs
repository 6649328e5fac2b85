use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use crossbeam_utils::CachePadded;

/// One counter per cache line, so writers on different counters do not
/// contend.
type Counter = CachePadded<AtomicU64>;

#[inline]
fn read(counter: &Counter) -> u64 {
  counter.load(Ordering::Relaxed)
}

/// Live counters of one cache. Updated with relaxed atomics; readers take a
/// [`MetricsSnapshot`].
#[derive(Debug)]
pub struct Metrics {
  // reads
  pub(crate) hits: Counter,
  pub(crate) misses: Counter,

  // writes
  pub(crate) inserts: Counter,
  pub(crate) updates: Counter,
  pub(crate) invalidations: Counter,

  // policy outcomes
  pub(crate) evicted_by_capacity: Counter,
  pub(crate) keys_admitted: Counter,
  pub(crate) keys_rejected: Counter,

  // occupancy, rewritten after every insert
  pub(crate) current_size: Counter,
  pub(crate) current_volume: Counter,
  pub(crate) total_volume_added: Counter,

  started: Instant,
}

impl Metrics {
  pub(crate) fn new() -> Self {
    Self {
      hits: Counter::default(),
      misses: Counter::default(),
      inserts: Counter::default(),
      updates: Counter::default(),
      invalidations: Counter::default(),
      evicted_by_capacity: Counter::default(),
      keys_admitted: Counter::default(),
      keys_rejected: Counter::default(),
      current_size: Counter::default(),
      current_volume: Counter::default(),
      total_volume_added: Counter::default(),
      started: Instant::now(),
    }
  }

  #[inline]
  pub(crate) fn incr(counter: &AtomicU64, by: u64) {
    counter.fetch_add(by, Ordering::Relaxed);
  }

  /// Publishes the cache's current size and volume. Called with the cache
  /// lock held so the two values are consistent with each other.
  pub(crate) fn record_occupancy(&self, size: usize, volume: u64) {
    self.current_size.store(size as u64, Ordering::Relaxed);
    self.current_volume.store(volume, Ordering::Relaxed);
  }

  pub(crate) fn snapshot(&self) -> MetricsSnapshot {
    let (hits, misses) = (read(&self.hits), read(&self.misses));
    let lookups = hits.saturating_add(misses);
    let hit_ratio = match lookups {
      0 => 0.0,
      n => hits as f64 / n as f64,
    };

    MetricsSnapshot {
      hits,
      misses,
      hit_ratio,
      inserts: read(&self.inserts),
      updates: read(&self.updates),
      invalidations: read(&self.invalidations),
      evicted_by_capacity: read(&self.evicted_by_capacity),
      keys_admitted: read(&self.keys_admitted),
      keys_rejected: read(&self.keys_rejected),
      current_size: read(&self.current_size),
      current_volume: read(&self.current_volume),
      total_volume_added: read(&self.total_volume_added),
      uptime_secs: self.started.elapsed().as_secs(),
    }
  }
}

impl Default for Metrics {
  fn default() -> Self {
    Self::new()
  }
}

/// Counter values read at one moment. Counters are read one by one, so a
/// snapshot taken during writes may mix values from neighbouring instants.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MetricsSnapshot {
  /// `get` calls that found their key.
  pub hits: u64,
  /// `get` calls that did not.
  pub misses: u64,
  /// `hits / (hits + misses)`, or `0.0` before the first lookup.
  pub hit_ratio: f64,
  /// Keys stored that were not present before.
  pub inserts: u64,
  /// Values stored over an existing key.
  pub updates: u64,
  /// Entries removed through `invalidate`.
  pub invalidations: u64,
  /// Entries given up by the replacement policy to stay within limits.
  pub evicted_by_capacity: u64,
  pub keys_admitted: u64,
  /// Entries refused, either because they can never fit or because the policy declined them.
  pub keys_rejected: u64,
  /// Entries held after the last insert.
  pub current_size: u64,
  /// Summed cost of the entries held after the last insert.
  pub current_volume: u64,
  /// Summed cost of every value ever stored, replacements included.
  pub total_volume_added: u64,
  pub uptime_secs: u64,
}
