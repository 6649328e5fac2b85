#![cfg(feature = "random")]

use coconut_cache::policy::{RandomPolicy, ReplacementPolicy};
use rand::SeedableRng;
use rand_pcg::Pcg64;

const ENTRIES: usize = 8;
const TRIALS: u64 = 8_000;

// Critical value for 7 degrees of freedom is 24.3 at p = 0.001.
const CHI_SQUARE_LIMIT: f64 = 30.0;

fn chi_square(counts: &[u64], expected: f64) -> f64 {
  counts
    .iter()
    .map(|&observed| {
      let diff = observed as f64 - expected;
      diff * diff / expected
    })
    .sum()
}

#[test]
fn test_first_eviction_is_uniform() {
  let mut counts = [0u64; ENTRIES];
  for trial in 0..TRIALS {
    let mut policy = RandomPolicy::with_rng(ENTRIES, Pcg64::seed_from_u64(trial));
    for i in 0..ENTRIES {
      policy.add(i);
    }
    let victim = policy.evict_next().unwrap();
    counts[victim] += 1;
  }

  let stat = chi_square(&counts, TRIALS as f64 / ENTRIES as f64);
  assert!(stat < CHI_SQUARE_LIMIT, "chi-square {stat:.2} for {counts:?}");
}

#[test]
fn test_eviction_stays_uniform_after_removals() {
  // Removing entries reshuffles the dense index; later picks must stay fair.
  let mut counts = [0u64; ENTRIES];
  let mut policy = RandomPolicy::with_rng(ENTRIES, Pcg64::seed_from_u64(99));
  for _ in 0..TRIALS {
    let handles: Vec<_> = (0..ENTRIES * 2).map(|i| policy.add(i).unwrap()).collect();
    for handle in &handles[ENTRIES..] {
      policy.remove(*handle);
    }
    let victim = policy.evict_next().unwrap();
    counts[victim] += 1;
    policy.clear();
  }

  let stat = chi_square(&counts, TRIALS as f64 / ENTRIES as f64);
  assert!(stat < CHI_SQUARE_LIMIT, "chi-square {stat:.2} for {counts:?}");
}
