use coconut_cache::policy::{Filtered, LfuPolicy};
use coconut_cache::{CacheBuilder, EvictionListener, EvictionReason};
use std::sync::Arc;

// A simple listener that just prints evicted entries.
struct MyListener;

impl EvictionListener<String, Vec<u8>> for MyListener {
  fn on_evict(&self, key: String, value: Arc<Vec<u8>>, reason: EvictionReason) {
    println!(
      "[Listener] Key: {}, {} bytes, Reason: {}",
      key,
      value.len(),
      reason
    );
  }
}

fn main() {
  println!("--- LFU Cache with an Admission Filter and Eviction Listener ---");

  // Keys longer than 16 bytes are never admitted.
  let policy = Filtered::max_cost(LfuPolicy::new(16), 16, |key: &String| key.len() as u64);

  let cache = CacheBuilder::default()
    .maximum_volume(1024)
    .policy(policy)
    .eviction_listener(MyListener)
    .build()
    .expect("Failed to build cache");

  cache.insert_with_cost("logo.png".to_string(), vec![0; 400], 400).unwrap();
  cache.insert_with_cost("style.css".to_string(), vec![0; 300], 300).unwrap();
  // Popular elsewhere already; LFU ranks it accordingly.
  cache
    .insert_with_hits("index.html".to_string(), vec![0; 200], 200, 25)
    .unwrap();

  for _ in 0..3 {
    cache.get("style.css");
  }

  println!("\nInserting a 500 byte entry. Something has to go.");
  cache.insert_with_cost("hero.jpg".to_string(), vec![0; 500], 500).unwrap();

  println!("\nInserting an entry with a key that is too long.");
  let admitted = cache
    .insert("assets/fonts/very-long-name.woff2".to_string(), vec![0; 10])
    .unwrap();
  println!("Admitted: {admitted}");

  println!("\nVolume: {} / 1024", cache.volume());
  println!("Metrics: {:#?}", cache.metrics());
}
