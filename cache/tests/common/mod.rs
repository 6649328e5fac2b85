#![allow(dead_code)]

use std::sync::{Arc, Once};

use coconut_cache::{EvictionListener, EvictionReason};
use parking_lot::Mutex;

static TRACING: Once = Once::new();

/// Routes library logs to the test harness. Honors `RUST_LOG`.
pub fn init_tracing() {
  TRACING.call_once(|| {
    let _ = tracing_subscriber::fmt()
      .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
      .with_test_writer()
      .try_init();
  });
}

/// Records every notification in delivery order.
pub struct RecordingListener<K, V> {
  pub events: Arc<Mutex<Vec<(K, Arc<V>, EvictionReason)>>>,
}

impl<K, V> RecordingListener<K, V> {
  pub fn new() -> (Self, Arc<Mutex<Vec<(K, Arc<V>, EvictionReason)>>>) {
    let events = Arc::new(Mutex::new(Vec::new()));
    (
      Self {
        events: events.clone(),
      },
      events,
    )
  }
}

impl<K: Send, V: Send + Sync> EvictionListener<K, V> for RecordingListener<K, V> {
  fn on_evict(&self, key: K, value: Arc<V>, reason: EvictionReason) {
    self.events.lock().push((key, value, reason));
  }
}
