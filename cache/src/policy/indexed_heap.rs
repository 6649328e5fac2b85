use super::slots::IndexedStore;
use crate::handle::Handle;

#[derive(Debug, Clone)]
struct HeapNode<T> {
  data: T,
  priority: u64,
  // Current position of this node inside `IndexedHeap::heap`.
  position: usize,
}

/// A binary min-heap whose entries can be addressed, re-prioritized and
/// removed through the [`Handle`] returned on insertion.
///
/// Each node records its own position in the heap array, so `remove` and
/// priority changes are O(log n) without searching. Entries with equal
/// priority are ordered by heap structure only.
#[derive(Debug, Clone)]
pub(crate) struct IndexedHeap<T> {
  nodes: IndexedStore<HeapNode<T>>,
  heap: Vec<Handle>,
}

impl<T> IndexedHeap<T> {
  pub(crate) fn with_capacity(capacity: usize) -> Self {
    Self {
      nodes: IndexedStore::with_capacity(capacity),
      heap: Vec::with_capacity(capacity),
    }
  }

  pub(crate) fn push(&mut self, data: T, priority: u64) -> Handle {
    let position = self.heap.len();
    let handle = self.nodes.insert(HeapNode {
      data,
      priority,
      position,
    });
    self.heap.push(handle);
    self.sift_up(position);
    handle
  }

  /// The entry with the lowest priority, together with that priority.
  pub(crate) fn peek(&self) -> Option<(&T, u64)> {
    let top = *self.heap.first()?;
    self.nodes.get(top).map(|node| (&node.data, node.priority))
  }

  /// Removes and returns the entry with the lowest priority.
  pub(crate) fn poll(&mut self) -> Option<(T, u64)> {
    if self.heap.is_empty() {
      return None;
    }
    self.remove_at(0)
  }

  pub(crate) fn remove(&mut self, handle: Handle) -> Option<T> {
    let position = self.nodes.get(handle)?.position;
    self.remove_at(position).map(|(data, _)| data)
  }

  pub(crate) fn get(&self, handle: Handle) -> Option<&T> {
    self.nodes.get(handle).map(|node| &node.data)
  }

  pub(crate) fn priority(&self, handle: Handle) -> Option<u64> {
    self.nodes.get(handle).map(|node| node.priority)
  }

  /// Adds `delta` to the priority of a live entry and restores heap order.
  /// Returns the new priority, or `None` for a stale handle.
  pub(crate) fn change_priority_delta(&mut self, handle: Handle, delta: i64) -> Option<u64> {
    let current = self.priority(handle)?;
    let updated = if delta >= 0 {
      current.saturating_add(delta.unsigned_abs())
    } else {
      current.saturating_sub(delta.unsigned_abs())
    };
    self.set_priority(handle, updated)
  }

  pub(crate) fn set_priority(&mut self, handle: Handle, priority: u64) -> Option<u64> {
    let node = self.nodes.get_mut(handle)?;
    node.priority = priority;
    let position = node.position;
    self.restore(position);
    Some(priority)
  }

  /// Swaps the payload of a live entry, keeping its priority and position.
  pub(crate) fn replace(&mut self, handle: Handle, data: T) -> bool {
    match self.nodes.get_mut(handle) {
      Some(node) => {
        node.data = data;
        true
      }
      None => false,
    }
  }

  #[inline]
  pub(crate) fn len(&self) -> usize {
    self.heap.len()
  }

  pub(crate) fn clear(&mut self) {
    self.nodes.clear();
    self.heap.clear();
  }

  /// Entries in heap-array order. The first item is the minimum; the rest is
  /// only partially ordered.
  pub(crate) fn iter(&self) -> impl Iterator<Item = (&T, u64)> {
    self
      .heap
      .iter()
      .filter_map(move |handle| self.nodes.get(*handle))
      .map(|node| (&node.data, node.priority))
  }

  fn remove_at(&mut self, position: usize) -> Option<(T, u64)> {
    let last = self.heap.len().checked_sub(1)?;
    if position > last {
      return None;
    }
    self.swap(position, last);
    let handle = self.heap.pop()?;
    if position < self.heap.len() {
      self.restore(position);
    }
    self
      .nodes
      .remove(handle)
      .map(|node| (node.data, node.priority))
  }

  fn restore(&mut self, position: usize) {
    if self.sift_up(position) == position {
      self.sift_down(position);
    }
  }

  fn priority_at(&self, position: usize) -> u64 {
    self
      .heap
      .get(position)
      .and_then(|handle| self.nodes.get(*handle))
      .map_or(u64::MAX, |node| node.priority)
  }

  fn swap(&mut self, a: usize, b: usize) {
    self.heap.swap(a, b);
    for position in [a, b] {
      let handle = self.heap[position];
      if let Some(node) = self.nodes.get_mut(handle) {
        node.position = position;
      }
    }
  }

  fn sift_up(&mut self, mut position: usize) -> usize {
    while position > 0 {
      let parent = (position - 1) / 2;
      if self.priority_at(position) < self.priority_at(parent) {
        self.swap(position, parent);
        position = parent;
      } else {
        break;
      }
    }
    position
  }

  fn sift_down(&mut self, mut position: usize) {
    let len = self.heap.len();
    loop {
      let left = 2 * position + 1;
      let right = left + 1;
      let mut smallest = position;
      if left < len && self.priority_at(left) < self.priority_at(smallest) {
        smallest = left;
      }
      if right < len && self.priority_at(right) < self.priority_at(smallest) {
        smallest = right;
      }
      if smallest == position {
        break;
      }
      self.swap(position, smallest);
      position = smallest;
    }
  }

  #[cfg(test)]
  fn assert_heap_invariants(&self) {
    for position in 0..self.heap.len() {
      let node = self.nodes.get(self.heap[position]).expect("live node");
      assert_eq!(node.position, position, "node position out of sync");
      if position > 0 {
        let parent = (position - 1) / 2;
        assert!(self.priority_at(parent) <= node.priority, "heap order violated");
      }
    }
    assert_eq!(self.nodes.len(), self.heap.len());
  }
}
