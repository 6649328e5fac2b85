use super::indexed_heap::IndexedHeap;
use super::ReplacementPolicy;
use crate::handle::Handle;

/// A replacement policy that evicts the least frequently used entry.
///
/// Every entry carries a hit count kept in a min-heap. `touch` adds exactly
/// one hit; `evict_next` polls the entry with the lowest count. Entries added
/// through [`ReplacementPolicy::add_with_hits`] start at the supplied count,
/// all others at zero. Ties are broken by heap structure.
#[derive(Debug, Clone)]
pub struct LfuPolicy<T> {
  heap: IndexedHeap<T>,
}

impl<T> LfuPolicy<T> {
  pub fn new(initial_capacity: usize) -> Self {
    Self {
      heap: IndexedHeap::with_capacity(initial_capacity),
    }
  }

  /// The current hit count of a live entry.
  pub fn hits(&self, handle: Handle) -> Option<u64> {
    self.heap.priority(handle)
  }

  /// Overwrites the hit count of a live entry.
  pub fn set_hits(&mut self, handle: Handle, hits: u64) -> bool {
    self.heap.set_priority(handle, hits).is_some()
  }
}

impl<T> Default for LfuPolicy<T> {
  fn default() -> Self {
    Self::new(super::slots::DEFAULT_INITIAL_CAPACITY)
  }
}

impl<T> ReplacementPolicy<T> for LfuPolicy<T> {
  fn add(&mut self, data: T) -> Option<Handle> {
    Some(self.heap.push(data, 0))
  }

  fn add_with_hits(&mut self, data: T, hits: u64) -> Option<Handle> {
    Some(self.heap.push(data, hits))
  }

  fn touch(&mut self, handle: Handle) {
    self.heap.change_priority_delta(handle, 1);
  }

  fn update(&mut self, handle: Handle, data: T) -> bool {
    self.heap.replace(handle, data)
  }

  fn remove(&mut self, handle: Handle) -> Option<T> {
    self.heap.remove(handle)
  }

  fn evict_next(&mut self) -> Option<T> {
    self.heap.poll().map(|(data, _)| data)
  }

  fn peek(&self) -> Option<&T> {
    self.heap.peek().map(|(data, _)| data)
  }

  /// Heap order: the first entry is the next victim, the rest is only
  /// partially ordered.
  fn peek_all(&self) -> Vec<&T> {
    self.heap.iter().map(|(data, _)| data).collect()
  }

  fn get(&self, handle: Handle) -> Option<&T> {
    self.heap.get(handle)
  }

  fn len(&self) -> usize {
    self.heap.len()
  }

  fn clear(&mut self) {
    self.heap.clear();
  }
}
