/*!
Observed fields.

[`Observed`] wraps a value and emits on its key whenever the value is assigned.
The dispatcher is injected at construction; nothing is looked up by name.

```
use ripple::{Dispatcher, EventCell, Key, Observed};

let dispatcher = Dispatcher::new();
let mut volume = Observed::for_field(&dispatcher, "volume", 50u8);
let mirror = EventCell::bind(&dispatcher, &Key::<u8>::changed("volume"));

volume.set(70)?;
assert_eq!(*volume.get(), 70);
assert_eq!(mirror.get(), Some(70));
# Ok::<(), ripple::DispatchError>(())
```
*/

use std::fmt;

use crate::context::EventContext;
use crate::core::Dispatcher;
use crate::types::{DispatchResult, Key};

/// A value that announces every assignment.
pub struct Observed<T> {
  value: T,
  key: Key<T>,
  dispatcher: Dispatcher,
}

impl<T: Clone + 'static> Observed<T> {
  /// Wrap `initial`, emitting on `key` when assigned.
  pub fn new(dispatcher: &Dispatcher, key: Key<T>, initial: T) -> Self {
    Self {
      value: initial,
      key,
      dispatcher: dispatcher.clone(),
    }
  }

  /// Wrap `initial`, emitting on `<field>-changed` when assigned.
  pub fn for_field(dispatcher: &Dispatcher, field: &str, initial: T) -> Self {
    Self::new(dispatcher, Key::changed(field), initial)
  }

  /// Assign, then emit the new value.
  ///
  /// The assignment sticks even if a listener fails.
  pub fn set(&mut self, value: T) -> DispatchResult<EventContext> {
    self.value = value;
    self.dispatcher.emit(&self.key, self.value.clone())
  }

  /// Update in place through a closure, then emit.
  pub fn update(&mut self, f: impl FnOnce(&mut T)) -> DispatchResult<EventContext> {
    f(&mut self.value);
    self.dispatcher.emit(&self.key, self.value.clone())
  }
}

impl<T> Observed<T> {
  /// Current value.
  pub const fn get(&self) -> &T {
    &self.value
  }

  /// Key assignments are announced on.
  pub const fn key(&self) -> &Key<T> {
    &self.key
  }

  /// Unwrap the value.
  pub fn into_inner(self) -> T {
    self.value
  }
}

impl<T: fmt::Debug> fmt::Debug for Observed<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Observed")
      .field("key", &self.key)
      .field("value", &self.value)
      .finish_non_exhaustive()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use parking_lot::Mutex;
  use std::sync::Arc;

  fn recorder<T: Clone + Send + 'static>(dispatcher: &Dispatcher, key: &Key<T>) -> Arc<Mutex<Vec<T>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    dispatcher.on(key, move |v: &T, _| {
      sink.lock().push(v.clone());
      Ok(())
    });
    seen
  }

  #[test]
  fn for_field_uses_changed_key() {
    let dispatcher = Dispatcher::new();
    let field = Observed::for_field(&dispatcher, "title", String::new());
    assert_eq!(field.key().name().as_str(), "title-changed");
  }

  #[test]
  fn set_assigns_then_emits() {
    let dispatcher = Dispatcher::new();
    let key: Key<i32> = Key::new("count-changed");
    let seen = recorder(&dispatcher, &key);
    let mut count = Observed::new(&dispatcher, key, 0);

    count.set(1).unwrap();
    count.set(2).unwrap();
    assert_eq!(*count.get(), 2);
    assert_eq!(*seen.lock(), vec![1, 2]);
  }

  #[test]
  fn update_emits_mutated_value() {
    let dispatcher = Dispatcher::new();
    let key: Key<Vec<&'static str>> = Key::changed("items");
    let seen = recorder(&dispatcher, &key);
    let mut items = Observed::new(&dispatcher, key, vec!["a"]);

    items.update(|v| v.push("b")).unwrap();
    assert_eq!(*seen.lock(), vec![vec!["a", "b"]]);
    assert_eq!(items.into_inner(), vec!["a", "b"]);
  }

  #[test]
  fn assignment_sticks_when_listener_fails() {
    let dispatcher = Dispatcher::new();
    let mut field = Observed::for_field(&dispatcher, "mode", 0u8);
    dispatcher.on(field.key(), |_, _| Err("rejected".into()));

    assert!(field.set(3).is_err());
    assert_eq!(*field.get(), 3);
  }

  #[test]
  fn without_listeners_set_is_silent() {
    let dispatcher = Dispatcher::new();
    let mut field = Observed::for_field(&dispatcher, "flag", false);
    let ctx = field.set(true).unwrap();
    assert_eq!(ctx, EventContext::new());
  }
}
