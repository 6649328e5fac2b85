use super::order_list::OrderList;
use super::ReplacementPolicy;
use crate::handle::Handle;

/// A replacement policy that evicts the most recently used entry.
///
/// Useful for cyclic scans larger than the cache, where the entry just used
/// is the one needed furthest in the future.
#[derive(Debug, Clone)]
pub struct MruPolicy<T> {
  order: OrderList<T>,
}

impl<T> MruPolicy<T> {
  pub fn new(initial_capacity: usize) -> Self {
    Self {
      order: OrderList::with_capacity(initial_capacity),
    }
  }
}

impl<T> Default for MruPolicy<T> {
  fn default() -> Self {
    Self::new(super::slots::DEFAULT_INITIAL_CAPACITY)
  }
}

impl<T> ReplacementPolicy<T> for MruPolicy<T> {
  fn add(&mut self, data: T) -> Option<Handle> {
    Some(self.order.push_front(data))
  }

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
    self.order.pop_front()
  }

  fn peek(&self) -> Option<&T> {
    self.order.front()
  }

  /// Most recently used first.
  fn peek_all(&self) -> Vec<&T> {
    self.order.iter_from_front().collect()
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

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn evicts_most_recently_used() {
    let mut policy = MruPolicy::new(4);
    let a = policy.add("a").expect("admitted");
    policy.add("b");
    policy.add("c");

    assert_eq!(policy.peek(), Some(&"c"));
    policy.touch(a);
    assert_eq!(policy.evict_next(), Some("a"));
    assert_eq!(policy.evict_next(), Some("c"));
    assert_eq!(policy.evict_next(), Some("b"));
  }

  #[test]
  fn peek_all_lists_most_recent_first() {
    let mut policy = MruPolicy::new(4);
    policy.add(1);
    policy.add(2);
    assert_eq!(policy.peek_all(), vec![&2, &1]);
  }
}
