use super::ReplacementPolicy;
use crate::handle::Handle;

use std::fmt;

/// A decorator that puts an admission predicate in front of another policy.
///
/// Payloads for which the predicate returns `false` are not admitted: `add`
/// returns `None`, and an `update` to such a payload removes the entry and
/// returns `false`. Everything else is forwarded unchanged.
#[derive(Clone)]
pub struct Filtered<P, F> {
  inner: P,
  admit: F,
}

impl<P, F> Filtered<P, F> {
  pub fn new(inner: P, admit: F) -> Self {
    Self { inner, admit }
  }

  pub fn inner(&self) -> &P {
    &self.inner
  }

  pub fn into_inner(self) -> P {
    self.inner
  }
}

impl<P> Filtered<P, ()> {
  /// Refuses payloads whose cost, as reported by `cost`, is above `limit`.
  pub fn max_cost<T, C>(inner: P, limit: u64, cost: C) -> Filtered<P, impl Fn(&T) -> bool>
  where
    C: Fn(&T) -> u64,
  {
    Filtered::new(inner, move |data: &T| cost(data) <= limit)
  }
}

impl<P: fmt::Debug, F> fmt::Debug for Filtered<P, F> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Filtered")
      .field("inner", &self.inner)
      .finish_non_exhaustive()
  }
}

impl<T, P, F> ReplacementPolicy<T> for Filtered<P, F>
where
  P: ReplacementPolicy<T>,
  F: Fn(&T) -> bool,
{
  fn admits(&self, data: &T) -> bool {
    (self.admit)(data) && self.inner.admits(data)
  }

  fn add(&mut self, data: T) -> Option<Handle> {
    if (self.admit)(&data) {
      self.inner.add(data)
    } else {
      None
    }
  }

  fn add_with_hits(&mut self, data: T, hits: u64) -> Option<Handle> {
    if (self.admit)(&data) {
      self.inner.add_with_hits(data, hits)
    } else {
      None
    }
  }

  fn touch(&mut self, handle: Handle) {
    self.inner.touch(handle);
  }

  fn update(&mut self, handle: Handle, data: T) -> bool {
    if (self.admit)(&data) {
      self.inner.update(handle, data)
    } else {
      self.inner.remove(handle);
      false
    }
  }

  fn remove(&mut self, handle: Handle) -> Option<T> {
    self.inner.remove(handle)
  }

  fn evict_next(&mut self) -> Option<T> {
    self.inner.evict_next()
  }

  fn peek(&self) -> Option<&T> {
    self.inner.peek()
  }

  fn peek_all(&self) -> Vec<&T> {
    self.inner.peek_all()
  }

  fn get(&self, handle: Handle) -> Option<&T> {
    self.inner.get(handle)
  }

  fn len(&self) -> usize {
    self.inner.len()
  }

  fn clear(&mut self) {
    self.inner.clear();
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::policy::{FifoPolicy, LfuPolicy};

  #[derive(Debug, Clone, PartialEq)]
  struct Blob {
    name: &'static str,
    size: u64,
  }

  fn blob(name: &'static str, size: u64) -> Blob {
    Blob { name, size }
  }

  #[test]
  fn oversize_payloads_are_not_admitted() {
    let mut policy = Filtered::max_cost(FifoPolicy::new(4), 10, |b: &Blob| b.size);
    assert!(policy.add(blob("small", 3)).is_some());
    assert!(policy.add(blob("exact", 10)).is_some());
    assert_eq!(policy.add(blob("huge", 11)), None);
    assert_eq!(policy.len(), 2);
  }

  #[test]
  fn admission_check_leaves_state_alone() {
    let inner = Filtered::new(FifoPolicy::new(4), |b: &Blob| b.name != "banned");
    let policy = Filtered::max_cost(inner, 10, |b: &Blob| b.size);
    assert!(policy.admits(&blob("small", 3)));
    assert!(!policy.admits(&blob("huge", 11)));
    assert!(!policy.admits(&blob("banned", 1)));
    assert!(policy.is_empty());

    let boxed: crate::policy::BoxedPolicy<Blob> = Box::new(policy);
    assert!(!boxed.admits(&blob("huge", 11)));
    assert!(boxed.admits(&blob("fine", 10)));
  }

  #[test]
  fn rejected_update_removes_the_entry() {
    let mut policy = Filtered::max_cost(FifoPolicy::new(4), 10, |b: &Blob| b.size);
    let handle = policy.add(blob("a", 1)).expect("admitted");
    policy.add(blob("b", 1));

    assert!(policy.update(handle, blob("a", 5)));
    assert_eq!(policy.get(handle), Some(&blob("a", 5)));

    assert!(!policy.update(handle, blob("a", 50)));
    assert_eq!(policy.get(handle), None);
    assert_eq!(policy.len(), 1);
    assert_eq!(policy.evict_next(), Some(blob("b", 1)));
  }

  #[test]
  fn forwards_hits_to_inner_policy() {
    let mut policy = Filtered::new(LfuPolicy::new(4), |_: &&str| true);
    policy.add_with_hits("warm", 3);
    policy.add_with_hits("cold", 0);
    assert_eq!(policy.inner().len(), 2);
    assert_eq!(policy.evict_next(), Some("cold"));
  }
}
