pub mod fifo;
pub mod filtered;
pub mod lfu;
pub mod lru;
pub mod mru;
#[cfg(feature = "random")]
pub mod random;

pub(crate) mod indexed_heap;
pub(crate) mod order_list;
pub(crate) mod slots;

pub use fifo::FifoPolicy;
pub use filtered::Filtered;
pub use lfu::LfuPolicy;
pub use lru::LruPolicy;
pub use mru::MruPolicy;
#[cfg(feature = "random")]
pub use random::RandomPolicy;

use crate::error::BuildError;
use crate::handle::Handle;

use std::fmt;
use std::str::FromStr;

/// An optional capability of a policy payload: a pre-existing hit count.
///
/// Frequency based policies seed the priority of a new entry from it when the
/// entry is added through [`ReplacementPolicy::add_hitable`].
pub trait Hitable {
  fn hits(&self) -> u64;
}

/// The contract shared by every replacement policy.
///
/// A policy keeps its own bookkeeping of the entries a cache holds and decides
/// which one to give up when the cache needs room. Entries are addressed by the
/// [`Handle`] returned from `add`; a handle stays valid until its entry is
/// removed or evicted, and stale handles are ignored rather than corrupting
/// state.
///
/// Policies are not thread-safe. The owning cache serializes all calls.
pub trait ReplacementPolicy<T> {
  /// Starts tracking `data`.
  ///
  /// Returns `None` if the entry was not admitted. Plain policies admit every
  /// entry; only admission decorators such as [`Filtered`] refuse.
  fn add(&mut self, data: T) -> Option<Handle>;

  /// Whether `add` would admit `data`, without changing any state.
  fn admits(&self, data: &T) -> bool {
    let _ = data;
    true
  }

  /// Starts tracking `data` whose payload has already been hit `hits` times.
  ///
  /// Policies that do not rank by frequency ignore the count.
  fn add_with_hits(&mut self, data: T, hits: u64) -> Option<Handle> {
    let _ = hits;
    self.add(data)
  }

  /// Convenience for payloads that carry their own hit count.
  fn add_hitable(&mut self, data: T) -> Option<Handle>
  where
    T: Hitable,
    Self: Sized,
  {
    let hits = data.hits();
    self.add_with_hits(data, hits)
  }

  /// Records an access to the entry behind `handle`.
  fn touch(&mut self, handle: Handle);

  /// Replaces the payload behind `handle` in place, keeping its position.
  ///
  /// Returns `false` if the handle is stale or the new payload was refused.
  fn update(&mut self, handle: Handle, data: T) -> bool;

  /// Stops tracking the entry behind `handle` and returns its payload.
  fn remove(&mut self, handle: Handle) -> Option<T>;

  /// Picks one entry according to the policy's ordering, stops tracking it and
  /// returns its payload. Returns `None` only when the policy is empty.
  fn evict_next(&mut self) -> Option<T>;

  /// The next eviction candidate, without removing it.
  fn peek(&self) -> Option<&T>;

  /// All tracked payloads, in a policy specific order.
  fn peek_all(&self) -> Vec<&T>;

  /// The payload behind `handle`, if the handle is still live.
  fn get(&self, handle: Handle) -> Option<&T>;

  fn len(&self) -> usize;

  fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Stops tracking every entry.
  fn clear(&mut self) {
    while self.evict_next().is_some() {}
  }
}

impl<T, P> ReplacementPolicy<T> for Box<P>
where
  P: ReplacementPolicy<T> + ?Sized,
{
  fn add(&mut self, data: T) -> Option<Handle> {
    (**self).add(data)
  }

  fn admits(&self, data: &T) -> bool {
    (**self).admits(data)
  }

  fn add_with_hits(&mut self, data: T, hits: u64) -> Option<Handle> {
    (**self).add_with_hits(data, hits)
  }

  fn touch(&mut self, handle: Handle) {
    (**self).touch(handle)
  }

  fn update(&mut self, handle: Handle, data: T) -> bool {
    (**self).update(handle, data)
  }

  fn remove(&mut self, handle: Handle) -> Option<T> {
    (**self).remove(handle)
  }

  fn evict_next(&mut self) -> Option<T> {
    (**self).evict_next()
  }

  fn peek(&self) -> Option<&T> {
    (**self).peek()
  }

  fn peek_all(&self) -> Vec<&T> {
    (**self).peek_all()
  }

  fn get(&self, handle: Handle) -> Option<&T> {
    (**self).get(handle)
  }

  fn len(&self) -> usize {
    (**self).len()
  }

  fn clear(&mut self) {
    (**self).clear()
  }
}

/// A boxed policy as held by a cache.
pub type BoxedPolicy<T> = Box<dyn ReplacementPolicy<T> + Send>;

/// Names one of the built-in policies, e.g. in a configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum PolicyKind {
  /// Evicts the oldest inserted entry.
  Fifo,
  /// Evicts the least recently used entry.
  Lru,
  /// Evicts the most recently used entry.
  Mru,
  /// Evicts the least frequently used entry.
  Lfu,
  /// Evicts a uniformly random entry.
  #[cfg(feature = "random")]
  Random,
}

impl PolicyKind {
  /// Creates an empty policy of this kind.
  pub fn build<T>(self, initial_capacity: usize) -> BoxedPolicy<T>
  where
    T: Send + 'static,
  {
    tracing::debug!(policy = %self, initial_capacity, "creating replacement policy");
    match self {
      PolicyKind::Fifo => Box::new(FifoPolicy::new(initial_capacity)),
      PolicyKind::Lru => Box::new(LruPolicy::new(initial_capacity)),
      PolicyKind::Mru => Box::new(MruPolicy::new(initial_capacity)),
      PolicyKind::Lfu => Box::new(LfuPolicy::new(initial_capacity)),
      #[cfg(feature = "random")]
      PolicyKind::Random => Box::new(RandomPolicy::new(initial_capacity)),
    }
  }
}

impl fmt::Display for PolicyKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      PolicyKind::Fifo => write!(f, "fifo"),
      PolicyKind::Lru => write!(f, "lru"),
      PolicyKind::Mru => write!(f, "mru"),
      PolicyKind::Lfu => write!(f, "lfu"),
      #[cfg(feature = "random")]
      PolicyKind::Random => write!(f, "random"),
    }
  }
}

impl FromStr for PolicyKind {
  type Err = BuildError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "fifo" => Ok(PolicyKind::Fifo),
      "lru" => Ok(PolicyKind::Lru),
      "mru" => Ok(PolicyKind::Mru),
      "lfu" => Ok(PolicyKind::Lfu),
      #[cfg(feature = "random")]
      "random" => Ok(PolicyKind::Random),
      _ => Err(BuildError::UnknownPolicy(s.to_string())),
    }
  }
}
