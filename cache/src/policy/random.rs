#![cfg(feature = "random")]

use super::slots::{IndexedStore, DEFAULT_INITIAL_CAPACITY};
use super::ReplacementPolicy;
use crate::handle::Handle;

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::cell::RefCell;

#[derive(Debug, Clone)]
struct Slot<T> {
  data: T,
  // Position of this slot's handle in `RandomPolicy::live`.
  position: usize,
}

/// A replacement policy that evicts a uniformly random entry.
///
/// Live handles are kept in a dense array next to the slot store. Eviction
/// draws a position from that array and removes it with swap-remove, so
/// `add`, `remove` and `evict_next` are O(1).
#[derive(Debug, Clone)]
pub struct RandomPolicy<T, R = SmallRng> {
  slots: IndexedStore<Slot<T>>,
  live: Vec<Handle>,
  // `peek` draws from the generator through `&self`.
  rng: RefCell<R>,
}

impl<T> RandomPolicy<T> {
  pub fn new(initial_capacity: usize) -> Self {
    Self::with_rng(initial_capacity, SmallRng::from_rng(&mut rand::rng()))
  }
}

impl<T> Default for RandomPolicy<T> {
  fn default() -> Self {
    Self::new(DEFAULT_INITIAL_CAPACITY)
  }
}

impl<T, R: Rng> RandomPolicy<T, R> {
  /// Creates a policy that draws its victims from `rng`.
  pub fn with_rng(initial_capacity: usize, rng: R) -> Self {
    Self {
      slots: IndexedStore::with_capacity(initial_capacity),
      live: Vec::with_capacity(initial_capacity),
      rng: RefCell::new(rng),
    }
  }

  fn random_position(&self) -> Option<usize> {
    match self.live.len() {
      0 => None,
      // No need to ask the generator.
      1 => Some(0),
      len => Some(self.rng.borrow_mut().random_range(0..len)),
    }
  }
}

impl<T, R: Rng> ReplacementPolicy<T> for RandomPolicy<T, R> {
  fn add(&mut self, data: T) -> Option<Handle> {
    let position = self.live.len();
    let handle = self.slots.insert(Slot { data, position });
    self.live.push(handle);
    Some(handle)
  }

  /// A random policy does not care about access patterns. This is a no-op.
  fn touch(&mut self, _handle: Handle) {}

  /// Random never rejects a payload; only stale handles fail.
  fn update(&mut self, handle: Handle, data: T) -> bool {
    match self.slots.get_mut(handle) {
      Some(slot) => {
        slot.data = data;
        true
      }
      None => false,
    }
  }

  fn remove(&mut self, handle: Handle) -> Option<T> {
    let slot = self.slots.remove(handle)?;
    self.live.swap_remove(slot.position);
    // The former last handle now sits at the freed position.
    if let Some(&moved) = self.live.get(slot.position) {
      if let Some(moved_slot) = self.slots.get_mut(moved) {
        moved_slot.position = slot.position;
      }
    }
    Some(slot.data)
  }

  fn evict_next(&mut self) -> Option<T> {
    let position = self.random_position()?;
    let victim = self.live[position];
    self.remove(victim)
  }

  /// A random live entry. Not necessarily the one the next `evict_next` picks.
  fn peek(&self) -> Option<&T> {
    let position = self.random_position()?;
    self.get(self.live[position])
  }

  /// Current contents in shuffled order. This is not an eviction order.
  fn peek_all(&self) -> Vec<&T> {
    let mut all: Vec<&T> = self
      .live
      .iter()
      .filter_map(|handle| self.slots.get(*handle))
      .map(|slot| &slot.data)
      .collect();
    all.shuffle(&mut *self.rng.borrow_mut());
    all
  }

  fn get(&self, handle: Handle) -> Option<&T> {
    self.slots.get(handle).map(|slot| &slot.data)
  }

  fn len(&self) -> usize {
    self.live.len()
  }

  fn clear(&mut self) {
    self.slots.clear();
    self.live.clear();
  }
}
