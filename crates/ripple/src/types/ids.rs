/*! Branded ID types for listeners and registrations. */

use derive_more::{Display, From, Into};
use std::sync::atomic::{AtomicU64, Ordering};

/// Identity of a reusable [`Listener`](crate::Listener).
///
/// Clones of a listener share its id, so `off` removes every entry registered from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, From, Into)]
pub struct ListenerId(pub u64);

/// Identity of a single registration in a listener list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, From, Into)]
pub struct EntryId(pub u64);

/// Global counters. Start at 1 (0 could be confused with "null").
static LISTENER_COUNTER: AtomicU64 = AtomicU64::new(1);
static ENTRY_COUNTER: AtomicU64 = AtomicU64::new(1);

impl ListenerId {
  /// Generate a new unique `ListenerId`.
  pub fn new() -> Self {
    Self(LISTENER_COUNTER.fetch_add(1, Ordering::Relaxed))
  }
}

impl Default for ListenerId {
  fn default() -> Self {
    Self::new()
  }
}

impl EntryId {
  /// Generate a new unique `EntryId`.
  pub fn new() -> Self {
    Self(ENTRY_COUNTER.fetch_add(1, Ordering::Relaxed))
  }
}

impl Default for EntryId {
  fn default() -> Self {
    Self::new()
  }
}
