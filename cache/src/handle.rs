use std::fmt;

use generational_arena::Index;

/// A stable reference to an entry held by a replacement policy.
///
/// Handles are returned by [`ReplacementPolicy::add`](crate::policy::ReplacementPolicy::add)
/// and stay valid until the entry is removed, replaced through a rejected
/// update, or evicted. Every handle carries the generation of the slot it was
/// issued for, so a handle that outlived its entry is recognized as stale even
/// after the slot has been reused. It also carries the id of the store that
/// issued it; no other policy resolves it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle {
  pub(crate) store: u64,
  pub(crate) index: Index,
}

impl Handle {
  /// The id of the policy store that issued this handle.
  #[inline]
  pub fn store(&self) -> u64 {
    self.store
  }

  /// The slot number inside the policy's backing store.
  #[inline]
  pub fn slot(&self) -> usize {
    self.index.into_raw_parts().0
  }

  /// The generation of the slot at the time this handle was issued.
  #[inline]
  pub fn generation(&self) -> u64 {
    self.index.into_raw_parts().1
  }

  /// Rebuilds a handle from its raw parts, e.g. after it was stored outside the process.
  pub fn from_raw_parts(store: u64, slot: usize, generation: u64) -> Self {
    Handle {
      store,
      index: Index::from_raw_parts(slot, generation),
    }
  }
}

impl fmt::Debug for Handle {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Handle({}v{}@{})", self.slot(), self.generation(), self.store)
  }
}

impl fmt::Display for Handle {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "#{}v{}@{}", self.slot(), self.generation(), self.store)
  }
}
