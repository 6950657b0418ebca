/*!
Reactive bindings.

[`EventCell`] mirrors the latest payload of a key so UI or state code can read
it at any time. [`EventAccessor`] additionally writes back through the
dispatcher, so other subscribers and modifiers see local writes.

```
use ripple::{add_modifier, Dispatcher, EventAccessor, Key};

const ZOOM: Key<u32> = Key::new("zoom");

let dispatcher = Dispatcher::new();
add_modifier(&dispatcher, &ZOOM, |z| Ok((*z).clamp(25, 400)));

let zoom = EventAccessor::bind_with_default(&dispatcher, &ZOOM, 100);
zoom.set(1000)?;
assert_eq!(zoom.get(), Some(400));
# Ok::<(), ripple::DispatchError>(())
```
*/

use parking_lot::RwLock;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use crate::context::EventContext;
use crate::core::{Dispatcher, Subscription};
use crate::types::{DispatchResult, Key, ListenerOptions};

struct Slot<T> {
  value: RwLock<Option<T>>,
  version: AtomicU64,
}

impl<T> Slot<T> {
  fn store(&self, value: T) {
    *self.value.write() = Some(value);
    self.version.fetch_add(1, Ordering::SeqCst);
  }
}

/// Latest payload observed on a key. Unsubscribes on drop.
pub struct EventCell<T> {
  slot: Arc<Slot<T>>,
  subscription: Subscription,
}

impl<T> EventCell<T>
where
  T: Clone + Send + Sync + 'static,
{
  /// Bind with no initial value.
  pub fn bind(dispatcher: &Dispatcher, key: &Key<T>) -> Self {
    Self::bind_with(dispatcher, key, ListenerOptions::new(), None)
  }

  /// Bind with an initial value returned until the first event arrives.
  pub fn bind_with_default(dispatcher: &Dispatcher, key: &Key<T>, default: T) -> Self {
    Self::bind_with(dispatcher, key, ListenerOptions::new(), Some(default))
  }

  /// Bind with explicit listener options.
  pub fn bind_with(
    dispatcher: &Dispatcher,
    key: &Key<T>,
    options: ListenerOptions,
    default: Option<T>,
  ) -> Self {
    let slot = Arc::new(Slot {
      value: RwLock::new(default),
      version: AtomicU64::new(0),
    });
    let sink = Arc::clone(&slot);
    let subscription = dispatcher.on_with(key, options, move |value: &T, _: &mut EventContext| {
      sink.store(value.clone());
      Ok(())
    });
    Self { slot, subscription }
  }
}

impl<T: Clone> EventCell<T> {
  /// Latest observed payload, or the default if nothing arrived yet.
  pub fn get(&self) -> Option<T> {
    self.slot.value.read().clone()
  }
}

impl<T> EventCell<T> {
  /// Number of payloads stored since binding. Starts at 0.
  pub fn version(&self) -> u64 {
    self.slot.version.load(Ordering::SeqCst)
  }

  /// Stop following the key. The last value stays readable.
  pub fn unsubscribe(&self) {
    self.subscription.unsubscribe();
  }

  /// Whether the cell still follows its key.
  pub fn is_bound(&self) -> bool {
    self.subscription.is_active()
  }
}

impl<T> Drop for EventCell<T> {
  fn drop(&mut self) {
    self.subscription.unsubscribe();
  }
}

impl<T: fmt::Debug> fmt::Debug for EventCell<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("EventCell")
      .field("value", &*self.slot.value.read())
      .field("version", &self.slot.version.load(Ordering::SeqCst))
      .finish_non_exhaustive()
  }
}

/// Two-way binding: reads like an [`EventCell`], writes emit on the key.
pub struct EventAccessor<T> {
  slot: Arc<Slot<T>>,
  /// Held while `set` dispatches, so the local write is not recorded twice.
  writing: Arc<AtomicBool>,
  subscription: Subscription,
  dispatcher: Dispatcher,
  key: Key<T>,
}

impl<T> EventAccessor<T>
where
  T: Clone + PartialEq + Send + Sync + 'static,
{
  /// Bind with no initial value.
  pub fn bind(dispatcher: &Dispatcher, key: &Key<T>) -> Self {
    Self::bind_with(dispatcher, key, ListenerOptions::new(), None)
  }

  /// Bind with an initial value returned until the first event or write.
  pub fn bind_with_default(dispatcher: &Dispatcher, key: &Key<T>, default: T) -> Self {
    Self::bind_with(dispatcher, key, ListenerOptions::new(), Some(default))
  }

  /// Bind with explicit listener options.
  pub fn bind_with(
    dispatcher: &Dispatcher,
    key: &Key<T>,
    options: ListenerOptions,
    default: Option<T>,
  ) -> Self {
    let slot = Arc::new(Slot {
      value: RwLock::new(default),
      version: AtomicU64::new(0),
    });
    let writing = Arc::new(AtomicBool::new(false));

    let sink = Arc::clone(&slot);
    let guard = Arc::clone(&writing);
    let subscription = dispatcher.on_with(key, options, move |value: &T, _: &mut EventContext| {
      // Echo of our own write. A rewritten value (from a modifier) still lands.
      if guard.load(Ordering::SeqCst) && sink.value.read().as_ref() == Some(value) {
        return Ok(());
      }
      sink.store(value.clone());
      Ok(())
    });

    Self {
      slot,
      writing,
      subscription,
      dispatcher: dispatcher.clone(),
      key: key.clone(),
    }
  }

  /// Store `value` locally, then emit it so every subscriber observes it.
  pub fn set(&self, value: T) -> DispatchResult<EventContext> {
    self.slot.store(value.clone());

    let previous = self.writing.swap(true, Ordering::SeqCst);
    let _release = scopeguard::guard(&self.writing, move |flag| {
      flag.store(previous, Ordering::SeqCst);
    });
    self.dispatcher.emit(&self.key, value)
  }
}

impl<T: Clone> EventAccessor<T> {
  /// Latest value, local or observed.
  pub fn get(&self) -> Option<T> {
    self.slot.value.read().clone()
  }
}

impl<T> EventAccessor<T> {
  /// Number of values stored since binding, local writes included.
  pub fn version(&self) -> u64 {
    self.slot.version.load(Ordering::SeqCst)
  }

  /// Stop following the key. `set` still emits.
  pub fn unsubscribe(&self) {
    self.subscription.unsubscribe();
  }

  /// Whether the accessor still follows its key.
  pub fn is_bound(&self) -> bool {
    self.subscription.is_active()
  }

  /// Key this accessor reads and writes.
  pub const fn key(&self) -> &Key<T> {
    &self.key
  }
}

impl<T> Drop for EventAccessor<T> {
  fn drop(&mut self) {
    self.subscription.unsubscribe();
  }
}

impl<T: fmt::Debug> fmt::Debug for EventAccessor<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("EventAccessor")
      .field("key", &self.key)
      .field("value", &*self.slot.value.read())
      .field("version", &self.slot.version.load(Ordering::SeqCst))
      .finish_non_exhaustive()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::add_modifier;
  use parking_lot::Mutex;

  const TITLE: Key<String> = Key::new("title");
  const LEVEL: Key<i32> = Key::new("level");

  mod cell {
    use super::*;

    #[test]
    fn starts_empty_without_default() {
      let dispatcher = Dispatcher::new();
      let cell = EventCell::bind(&dispatcher, &TITLE);
      assert_eq!(cell.get(), None);
      assert_eq!(cell.version(), 0);
    }

    #[test]
    fn default_until_first_event() {
      let dispatcher = Dispatcher::new();
      let cell = EventCell::bind_with_default(&dispatcher, &LEVEL, 3);
      assert_eq!(cell.get(), Some(3));

      dispatcher.emit(&LEVEL, 8).unwrap();
      assert_eq!(cell.get(), Some(8));
      assert_eq!(cell.version(), 1);
    }

    #[test]
    fn follows_latest_payload() {
      let dispatcher = Dispatcher::new();
      let cell = EventCell::bind(&dispatcher, &TITLE);
      dispatcher.emit(&TITLE, "one".to_owned()).unwrap();
      dispatcher.emit(&TITLE, "two".to_owned()).unwrap();
      assert_eq!(cell.get().as_deref(), Some("two"));
      assert_eq!(cell.version(), 2);
    }

    #[test]
    fn unsubscribe_freezes_value() {
      let dispatcher = Dispatcher::new();
      let cell = EventCell::bind(&dispatcher, &LEVEL);
      dispatcher.emit(&LEVEL, 1).unwrap();
      cell.unsubscribe();
      dispatcher.emit(&LEVEL, 2).unwrap();
      assert_eq!(cell.get(), Some(1));
      assert!(!cell.is_bound());
    }

    #[test]
    fn drop_removes_listener() {
      let dispatcher = Dispatcher::new();
      let cell = EventCell::bind(&dispatcher, &LEVEL);
      assert_eq!(dispatcher.listener_count(&LEVEL), 1);
      drop(cell);
      assert_eq!(dispatcher.listener_count(&LEVEL), 0);
    }

    #[test]
    fn priority_controls_when_it_updates() {
      let dispatcher = Dispatcher::new();
      let cell = Arc::new(EventCell::bind_with(
        &dispatcher,
        &LEVEL,
        ListenerOptions::new().priority(10),
        None,
      ));
      let seen = Arc::new(Mutex::new(None));
      let (probe, sink) = (Arc::clone(&cell), Arc::clone(&seen));
      dispatcher.on(&LEVEL, move |_, _| {
        *sink.lock() = probe.get();
        Ok(())
      });

      dispatcher.emit(&LEVEL, 5).unwrap();
      assert_eq!(*seen.lock(), Some(5), "higher-priority cell updated before the probe ran");
    }
  }

  mod accessor {
    use super::*;

    #[test]
    fn set_updates_and_emits() {
      let dispatcher = Dispatcher::new();
      let accessor = EventAccessor::bind(&dispatcher, &LEVEL);
      let observer = EventCell::bind(&dispatcher, &LEVEL);

      accessor.set(4).unwrap();
      assert_eq!(accessor.get(), Some(4));
      assert_eq!(observer.get(), Some(4));
    }

    #[test]
    fn own_write_is_recorded_once() {
      let dispatcher = Dispatcher::new();
      let accessor = EventAccessor::bind(&dispatcher, &LEVEL);
      accessor.set(1).unwrap();
      assert_eq!(accessor.version(), 1, "echo of the local write is ignored");
    }

    #[test]
    fn external_emits_are_observed() {
      let dispatcher = Dispatcher::new();
      let accessor = EventAccessor::bind_with_default(&dispatcher, &LEVEL, 0);
      dispatcher.emit(&LEVEL, 9).unwrap();
      assert_eq!(accessor.get(), Some(9));
      assert_eq!(accessor.version(), 1);
    }

    #[test]
    fn modifier_rewrite_reaches_accessor() {
      let dispatcher = Dispatcher::new();
      add_modifier(&dispatcher, &LEVEL, |v| Ok((*v).clamp(0, 10)));
      let accessor = EventAccessor::bind(&dispatcher, &LEVEL);

      let ctx = accessor.set(50).unwrap();
      assert!(ctx.is_propagation_stopped());
      assert_eq!(accessor.get(), Some(10));
      assert_eq!(accessor.version(), 2, "local write, then the rewritten value");
    }

    #[test]
    fn set_after_unsubscribe_still_emits() {
      let dispatcher = Dispatcher::new();
      let accessor = EventAccessor::bind(&dispatcher, &TITLE);
      let observer = EventCell::bind(&dispatcher, &TITLE);
      accessor.unsubscribe();

      accessor.set("hello".to_owned()).unwrap();
      assert_eq!(observer.get().as_deref(), Some("hello"));
      assert_eq!(accessor.key().name().as_str(), "title");
    }
  }
}
