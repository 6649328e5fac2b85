use super::order_list::OrderList;
use super::ReplacementPolicy;
use crate::handle::Handle;

/// A replacement policy that evicts entries in First-In, First-Out (FIFO) order.
///
/// Accesses do not change the order. An entry only moves to the back of the
/// queue when it is removed and added again.
#[derive(Debug, Clone)]
pub struct FifoPolicy<T> {
  queue: OrderList<T>,
}

impl<T> FifoPolicy<T> {
  /// Creates an empty policy with room for `initial_capacity` entries before
  /// its storage has to grow.
  pub fn new(initial_capacity: usize) -> Self {
    Self {
      queue: OrderList::with_capacity(initial_capacity),
    }
  }
}

impl<T> Default for FifoPolicy<T> {
  fn default() -> Self {
    Self::new(super::slots::DEFAULT_INITIAL_CAPACITY)
  }
}

impl<T> ReplacementPolicy<T> for FifoPolicy<T> {
  fn add(&mut self, data: T) -> Option<Handle> {
    Some(self.queue.push_front(data))
  }

  /// A FIFO policy does not care about access patterns. This is a no-op.
  fn touch(&mut self, _handle: Handle) {}

  fn update(&mut self, handle: Handle, data: T) -> bool {
    self.queue.replace(handle, data)
  }

  fn remove(&mut self, handle: Handle) -> Option<T> {
    self.queue.remove(handle)
  }

  fn evict_next(&mut self) -> Option<T> {
    self.queue.pop_back()
  }

  fn peek(&self) -> Option<&T> {
    self.queue.back()
  }

  /// Oldest entry first.
  fn peek_all(&self) -> Vec<&T> {
    self.queue.iter_from_back().collect()
  }

  fn get(&self, handle: Handle) -> Option<&T> {
    self.queue.get(handle)
  }

  fn len(&self) -> usize {
    self.queue.len()
  }

  fn clear(&mut self) {
    self.queue.clear();
  }
}
