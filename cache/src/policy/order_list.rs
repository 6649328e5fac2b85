use super::slots::IndexedStore;
use crate::handle::Handle;

#[derive(Debug, Clone)]
struct Node<T> {
  data: T,
  next: Option<Handle>,
  prev: Option<Handle>,
}

/// A handle-addressed doubly linked list used by the order-based policies.
///
/// The head is the most recently inserted (or moved) entry, the tail the
/// oldest one. All operations are O(1); nodes live in an [`IndexedStore`] so
/// the handle returned by [`OrderList::push_front`] addresses the node
/// directly.
#[derive(Debug, Clone)]
pub(crate) struct OrderList<T> {
  nodes: IndexedStore<Node<T>>,
  head: Option<Handle>,
  tail: Option<Handle>,
}

impl<T> OrderList<T> {
  pub(crate) fn with_capacity(capacity: usize) -> Self {
    Self {
      nodes: IndexedStore::with_capacity(capacity),
      head: None,
      tail: None,
    }
  }

  // Detaches a live node from its neighbours without freeing it.
  fn unlink(&mut self, handle: Handle) {
    let (prev, next) = match self.nodes.get(handle) {
      Some(node) => (node.prev, node.next),
      None => return,
    };

    match prev {
      Some(prev) => {
        if let Some(node) = self.nodes.get_mut(prev) {
          node.next = next;
        }
      }
      None => self.head = next,
    }

    match next {
      Some(next) => {
        if let Some(node) = self.nodes.get_mut(next) {
          node.prev = prev;
        }
      }
      None => self.tail = prev,
    }
  }

  // Links a live, detached node in as the new head.
  fn link_front(&mut self, handle: Handle) {
    let old_head = self.head;
    if let Some(node) = self.nodes.get_mut(handle) {
      node.next = old_head;
      node.prev = None;
    }
    if let Some(old_head) = old_head {
      if let Some(node) = self.nodes.get_mut(old_head) {
        node.prev = Some(handle);
      }
    }
    self.head = Some(handle);
    if self.tail.is_none() {
      self.tail = Some(handle);
    }
  }

  pub(crate) fn push_front(&mut self, data: T) -> Handle {
    let handle = self.nodes.insert(Node {
      data,
      next: None,
      prev: None,
    });
    self.link_front(handle);
    handle
  }

  /// Moves a live entry to the head. Returns `false` for a stale handle.
  pub(crate) fn move_to_front(&mut self, handle: Handle) -> bool {
    if !self.nodes.contains(handle) {
      return false;
    }
    if self.head != Some(handle) {
      self.unlink(handle);
      self.link_front(handle);
    }
    true
  }

  pub(crate) fn remove(&mut self, handle: Handle) -> Option<T> {
    if !self.nodes.contains(handle) {
      return None;
    }
    self.unlink(handle);
    self.nodes.remove(handle).map(|node| node.data)
  }

  pub(crate) fn pop_back(&mut self) -> Option<T> {
    let tail = self.tail?;
    self.remove(tail)
  }

  pub(crate) fn pop_front(&mut self) -> Option<T> {
    let head = self.head?;
    self.remove(head)
  }

  pub(crate) fn back(&self) -> Option<&T> {
    self.tail.and_then(|tail| self.get(tail))
  }

  pub(crate) fn front(&self) -> Option<&T> {
    self.head.and_then(|head| self.get(head))
  }

  pub(crate) fn get(&self, handle: Handle) -> Option<&T> {
    self.nodes.get(handle).map(|node| &node.data)
  }

  /// Swaps the payload of a live entry, keeping its position.
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
    self.nodes.len()
  }

  pub(crate) fn clear(&mut self) {
    self.nodes.clear();
    self.head = None;
    self.tail = None;
  }

  /// Iterates from the tail (oldest) to the head (newest).
  pub(crate) fn iter_from_back(&self) -> OrderIter<'_, T> {
    OrderIter {
      list: self,
      cursor: self.tail,
      forward: false,
    }
  }

  /// Iterates from the head (newest) to the tail (oldest).
  pub(crate) fn iter_from_front(&self) -> OrderIter<'_, T> {
    OrderIter {
      list: self,
      cursor: self.head,
      forward: true,
    }
  }
}

pub(crate) struct OrderIter<'a, T> {
  list: &'a OrderList<T>,
  cursor: Option<Handle>,
  forward: bool,
}

impl<'a, T> Iterator for OrderIter<'a, T> {
  type Item = &'a T;

  fn next(&mut self) -> Option<Self::Item> {
    let node = self.list.nodes.get(self.cursor?)?;
    self.cursor = if self.forward { node.next } else { node.prev };
    Some(&node.data)
  }
}
