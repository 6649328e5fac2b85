use coconut_cache::policy::PolicyKind;
use coconut_cache::CacheBuilder;

fn main() {
  println!("--- Bounded LRU Cache ---");

  let cache = CacheBuilder::default()
    .maximum_size(3)
    .policy_kind(PolicyKind::Lru)
    .build()
    .expect("Failed to build cache");

  cache.insert("apple", 1).unwrap();
  cache.insert("banana", 2).unwrap();
  cache.insert("cherry", 3).unwrap();
  println!("Inserted apple, banana, cherry. Size: {}", cache.len());

  // Reading apple makes banana the least recently used entry.
  cache.get("apple");
  println!("Next to go: {:?}", cache.eviction_candidates(1));

  cache.insert("date", 4).unwrap();
  println!("Inserted date. banana still cached? {}", cache.contains_key("banana"));

  println!("\nFinal metrics: {:#?}", cache.metrics());
}
