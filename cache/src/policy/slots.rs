use crate::handle::Handle;

use std::sync::atomic::{AtomicU64, Ordering};

use generational_arena::Arena;

/// The initial number of slots when a policy is created without a size hint.
pub(crate) const DEFAULT_INITIAL_CAPACITY: usize = 16;

/// A resizable, slot-addressed store shared by every policy variant.
///
/// Values live in a generational arena. Freed slots are recycled by later
/// inserts, and handles to freed slots are rejected because the slot's
/// generation has moved on. When the store is full the next insert doubles
/// the number of slots.
///
/// Each store draws a process-unique id on creation and stamps it into every
/// handle it issues, so handles from another store never resolve here.
#[derive(Debug, Clone)]
pub(crate) struct IndexedStore<T> {
  id: u64,
  slots: Arena<T>,
}

static NEXT_STORE_ID: AtomicU64 = AtomicU64::new(1);

impl<T> IndexedStore<T> {
  pub(crate) fn with_capacity(capacity: usize) -> Self {
    Self {
      id: NEXT_STORE_ID.fetch_add(1, Ordering::Relaxed),
      slots: Arena::with_capacity(capacity.max(1)),
    }
  }

  /// Stores `value`, growing the store first if every slot is occupied.
  pub(crate) fn insert(&mut self, value: T) -> Handle {
    let capacity = self.capacity();
    if self.len() >= capacity {
      // Double the current threshold.
      self.slots.reserve(capacity.max(1));
      tracing::trace!(
        from = capacity,
        to = self.capacity(),
        "grew policy slot store"
      );
    }
    Handle {
      store: self.id,
      index: self.slots.insert(value),
    }
  }

  #[inline]
  fn owns(&self, handle: Handle) -> bool {
    handle.store == self.id
  }

  #[inline]
  pub(crate) fn get(&self, handle: Handle) -> Option<&T> {
    if !self.owns(handle) {
      return None;
    }
    self.slots.get(handle.index)
  }

  #[inline]
  pub(crate) fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
    if !self.owns(handle) {
      return None;
    }
    self.slots.get_mut(handle.index)
  }

  #[inline]
  pub(crate) fn contains(&self, handle: Handle) -> bool {
    self.owns(handle) && self.slots.contains(handle.index)
  }

  pub(crate) fn remove(&mut self, handle: Handle) -> Option<T> {
    if !self.owns(handle) {
      return None;
    }
    self.slots.remove(handle.index)
  }

  #[inline]
  pub(crate) fn len(&self) -> usize {
    self.slots.len()
  }

  pub(crate) fn capacity(&self) -> usize {
    self.slots.capacity()
  }

  /// Drops every value. Handles issued before the call become stale.
  pub(crate) fn clear(&mut self) {
    // Removing one by one moves every slot's generation on; a bulk clear of
    // the arena would let old handles match recycled slots.
    self.slots.retain(|_, _| false);
  }
}

impl<T> Default for IndexedStore<T> {
  fn default() -> Self {
    Self::with_capacity(DEFAULT_INITIAL_CAPACITY)
  }
}
