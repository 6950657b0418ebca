/*!
Registry - per-key listener lists.

Every list is kept sorted by non-increasing priority; equal priorities keep
registration order. Lists are created on first registration and may be left
empty after removals.
*/

use std::any::Any;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::context::EventContext;
use crate::types::{DispatchResult, EntryId, EventKey, ListenerId, ListenerOptions};

/// Type-erased listener. Downcasts the payload and runs the typed callback.
pub(crate) type ErasedCallback =
  Arc<dyn Fn(&dyn Any, &mut EventContext) -> DispatchResult<()> + Send + Sync>;

/// One registration in a listener list.
#[derive(Clone)]
pub(crate) struct Entry {
  pub(crate) id: EntryId,
  pub(crate) listener: ListenerId,
  pub(crate) priority: i32,
  pub(crate) once: bool,
  /// Set when a once-entry has been handed to a dispatch. Shared with snapshots.
  fired: Arc<AtomicBool>,
  pub(crate) callback: ErasedCallback,
}

impl Entry {
  pub(crate) fn new(listener: ListenerId, options: ListenerOptions, callback: ErasedCallback) -> Self {
    Self {
      id: EntryId::new(),
      listener,
      priority: options.priority,
      once: options.once,
      fired: Arc::new(AtomicBool::new(false)),
      callback,
    }
  }

  /// Claim a once-entry for invocation. Only the first claim succeeds.
  pub(crate) fn claim(&self) -> bool {
    !self.fired.swap(true, Ordering::SeqCst)
  }
}

#[derive(Default)]
pub(crate) struct Registry {
  lists: HashMap<EventKey, Vec<Entry>>,
}

impl Registry {
  /// Insert before the first entry with strictly lower priority. Returns the position.
  pub(crate) fn insert(&mut self, key: EventKey, entry: Entry) -> usize {
    let list = self.lists.entry(key).or_default();
    let index = list
      .iter()
      .position(|existing| existing.priority < entry.priority)
      .unwrap_or(list.len());
    list.insert(index, entry);
    index
  }

  /// Remove one registration, handing it back to the caller.
  ///
  /// Callers must drop the returned entry only after releasing the registry
  /// borrow: a callback's captures may unsubscribe from this dispatcher.
  pub(crate) fn remove_entry(&mut self, key: &EventKey, id: EntryId) -> Option<Entry> {
    let list = self.lists.get_mut(key)?;
    let index = list.iter().position(|entry| entry.id == id)?;
    Some(list.remove(index))
  }

  /// Remove every registration made from `listener`, handing them back in list order.
  pub(crate) fn remove_listener(&mut self, key: &EventKey, listener: ListenerId) -> Vec<Entry> {
    let Some(list) = self.lists.get_mut(key) else {
      return Vec::new();
    };
    let (removed, kept) = std::mem::take(list)
      .into_iter()
      .partition(|entry| entry.listener == listener);
    *list = kept;
    removed
  }

  /// Shallow copy of the live list, taken before any callback runs.
  pub(crate) fn snapshot(&self, key: &EventKey) -> Vec<Entry> {
    self.lists.get(key).cloned().unwrap_or_default()
  }

  pub(crate) fn len(&self, key: &EventKey) -> usize {
    self.lists.get(key).map_or(0, Vec::len)
  }

  pub(crate) fn contains(&self, key: &EventKey, id: EntryId) -> bool {
    self
      .lists
      .get(key)
      .is_some_and(|list| list.iter().any(|entry| entry.id == id))
  }

  #[cfg(test)]
  pub(crate) fn priorities(&self, key: &EventKey) -> Vec<i32> {
    self
      .lists
      .get(key)
      .map(|list| list.iter().map(|entry| entry.priority).collect())
      .unwrap_or_default()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn noop() -> ErasedCallback {
    Arc::new(|_: &dyn Any, _: &mut EventContext| -> DispatchResult<()> { Ok(()) })
  }

  fn entry(priority: i32) -> Entry {
    Entry::new(ListenerId::new(), ListenerOptions::new().priority(priority), noop())
  }

  fn key() -> EventKey {
    EventKey::from_static("count")
  }

  mod insert {
    use super::*;

    #[test]
    fn higher_priority_goes_first() {
      let mut registry = Registry::default();
      registry.insert(key(), entry(0));
      let index = registry.insert(key(), entry(10));
      assert_eq!(index, 0, "priority 10 should be inserted ahead of priority 0");
      assert_eq!(registry.priorities(&key()), vec![10, 0]);
    }

    #[test]
    fn equal_priority_appends_after_existing() {
      let mut registry = Registry::default();
      let first = entry(5);
      let second = entry(5);
      let (first_id, second_id) = (first.id, second.id);
      registry.insert(key(), first);
      let index = registry.insert(key(), second);
      assert_eq!(index, 1, "ties keep earlier registrations ahead");

      let ids: Vec<_> = registry.snapshot(&key()).iter().map(|e| e.id).collect();
      assert_eq!(ids, vec![first_id, second_id]);
    }

    #[test]
    fn negative_priorities_sort_last() {
      let mut registry = Registry::default();
      registry.insert(key(), entry(-5));
      registry.insert(key(), entry(0));
      registry.insert(key(), entry(-1));
      assert_eq!(registry.priorities(&key()), vec![0, -1, -5]);
    }
  }

  mod removal {
    use super::*;

    #[test]
    fn remove_entry_is_idempotent() {
      let mut registry = Registry::default();
      let e = entry(0);
      let id = e.id;
      registry.insert(key(), e);

      assert_eq!(registry.remove_entry(&key(), id).map(|e| e.id), Some(id));
      assert!(registry.remove_entry(&key(), id).is_none(), "second removal should be a no-op");
      assert_eq!(registry.len(&key()), 0);
    }

    #[test]
    fn remove_from_unknown_key_is_noop() {
      let mut registry = Registry::default();
      assert!(registry.remove_entry(&key(), EntryId::new()).is_none());
      assert!(registry.remove_listener(&key(), ListenerId::new()).is_empty());
    }

    #[test]
    fn remove_listener_drops_every_registration() {
      let mut registry = Registry::default();
      let shared = ListenerId::new();
      let options = ListenerOptions::new();
      registry.insert(key(), Entry::new(shared, options, noop()));
      registry.insert(key(), entry(0));
      registry.insert(key(), Entry::new(shared, options.priority(3), noop()));

      let removed = registry.remove_listener(&key(), shared);
      assert_eq!(removed.iter().map(|e| e.priority).collect::<Vec<_>>(), vec![3, 0]);
      assert_eq!(registry.priorities(&key()), vec![0], "the unrelated entry stays");
    }
  }

  mod snapshot {
    use super::*;

    #[test]
    fn snapshot_is_independent_of_live_list() {
      let mut registry = Registry::default();
      let e = entry(0);
      let id = e.id;
      registry.insert(key(), e);

      let snapshot = registry.snapshot(&key());
      registry.remove_entry(&key(), id);
      registry.insert(key(), entry(1));

      assert_eq!(snapshot.len(), 1);
      assert_eq!(snapshot.first().map(|e| e.id), Some(id));
      assert!(!registry.contains(&key(), id));
    }

    #[test]
    fn claim_is_shared_with_snapshot() {
      let mut registry = Registry::default();
      registry.insert(key(), entry(0));
      let a = registry.snapshot(&key());
      let b = registry.snapshot(&key());

      let first = a.first().map(Entry::claim);
      let second = b.first().map(Entry::claim);
      assert_eq!(first, Some(true));
      assert_eq!(second, Some(false), "clones share the fired flag");
    }
  }
}
