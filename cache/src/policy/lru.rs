use super::order_list::OrderList;
use super::ReplacementPolicy;
use crate::handle::Handle;

/// A replacement policy that evicts the least recently used entry.
#[derive(Debug, Clone)]
pub struct LruPolicy<T> {
  // Front is the most recently used entry, back the least recently used one.
  order: OrderList<T>,
}

impl<T> LruPolicy<T> {
  pub fn new(initial_capacity: usize) -> Self {
    Self {
      order: OrderList::with_capacity(initial_capacity),
    }
  }
}

impl<T> Default for LruPolicy<T> {
  fn default() -> Self {
    Self::new(super::slots::DEFAULT_INITIAL_CAPACITY)
  }
}

impl<T> ReplacementPolicy<T> for LruPolicy<T> {
  fn add(&mut self, data: T) -> Option<Handle> {
    Some(self.order.push_front(data))
  }

  /// When an entry is accessed, it becomes the most recently used one.
  fn touch(&mut self, handle: Handle) {
    self.order.move_to_front(handle);
  }

  fn update(&mut self, handle: Handle, data: T) -> bool {
    self.order.replace(handle, data)
  }

  fn remove(&mut self, handle: Handle) -> Option<T> {
    self.order.remove(handle)
  }

  fn evict_next(&mut self) -> Option<T> {
    self.order.pop_back()
  }

  fn peek(&self) -> Option<&T> {
    self.order.back()
  }

  /// Least recently used first.
  fn peek_all(&self) -> Vec<&T> {
    self.order.iter_from_back().collect()
  }

  fn get(&self, handle: Handle) -> Option<&T> {
    self.order.get(handle)
  }

  fn len(&self) -> usize {
    self.order.len()
  }

  fn clear(&mut self) {
    self.order.clear();
  }
}
