/*!
Listener registration and removal.

Closures registered with `on` are only removable through the returned
[`Subscription`]. A [`Listener`] carries a stable identity, so the same value can
be registered several times and removed everywhere at once with `off`.
*/

use std::any::{type_name, Any};
use std::fmt;
use std::sync::Arc;

use super::registry::{Entry, ErasedCallback};
use super::{Dispatcher, WeakDispatcher};
use crate::context::EventContext;
use crate::types::{
  DispatchError, DispatchResult, EntryId, EventKey, Key, ListenerId, ListenerOptions,
  ListenerResult,
};

type Callback<T> = Arc<dyn Fn(&T, &mut EventContext) -> ListenerResult + Send + Sync>;

/// A reusable listener with a stable identity.
///
/// ```
/// use ripple::{Dispatcher, Key, Listener, ListenerOptions};
///
/// const SAVED: Key<String> = Key::new("saved");
///
/// let dispatcher = Dispatcher::new();
/// let log = Listener::new(|path: &String, _| {
///   println!("saved {path}");
///   Ok(())
/// });
///
/// dispatcher.subscribe(&SAVED, &log, ListenerOptions::new());
/// dispatcher.subscribe(&SAVED, &log, ListenerOptions::new().priority(5));
/// assert_eq!(dispatcher.listener_count(&SAVED), 2);
///
/// dispatcher.off(&SAVED, &log);
/// assert_eq!(dispatcher.listener_count(&SAVED), 0);
/// ```
pub struct Listener<T> {
  id: ListenerId,
  callback: Callback<T>,
}

impl<T: 'static> Listener<T> {
  /// Wrap a callback. Clones share the same identity.
  pub fn new<F>(callback: F) -> Self
  where
    F: Fn(&T, &mut EventContext) -> ListenerResult + Send + Sync + 'static,
  {
    Self {
      id: ListenerId::new(),
      callback: Arc::new(callback),
    }
  }
}

impl<T> Listener<T> {
  /// Identity used by `off`.
  pub const fn id(&self) -> ListenerId {
    self.id
  }
}

impl<T> Clone for Listener<T> {
  fn clone(&self) -> Self {
    Self {
      id: self.id,
      callback: Arc::clone(&self.callback),
    }
  }
}

impl<T> fmt::Debug for Listener<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Listener").field("id", &self.id).finish_non_exhaustive()
  }
}

/// Removes exactly one registration.
///
/// Unsubscribing is idempotent: calling it twice, after a once-listener fired,
/// after `off`, or after the dispatcher was dropped does nothing. Dropping a
/// `Subscription` does *not* unsubscribe.
#[derive(Clone)]
pub struct Subscription {
  dispatcher: WeakDispatcher,
  key: EventKey,
  entry: EntryId,
}

impl Subscription {
  /// Remove this registration from its listener list.
  pub fn unsubscribe(&self) {
    let Some(dispatcher) = self.dispatcher.upgrade() else {
      return;
    };
    // Dropped after `write` returns, outside the registry borrow.
    let removed = dispatcher.write(|r| r.remove_entry(&self.key, self.entry));
    if removed.is_some() {
      log::debug!("Unsubscribed entry {} from '{}'", self.entry, self.key);
    }
  }

  /// Whether the registration is still in its listener list.
  pub fn is_active(&self) -> bool {
    self
      .dispatcher
      .upgrade()
      .is_some_and(|d| d.read(|r| r.contains(&self.key, self.entry)))
  }

  /// Key this registration listens on.
  pub const fn key(&self) -> &EventKey {
    &self.key
  }

  /// Registration identity.
  pub const fn entry_id(&self) -> EntryId {
    self.entry
  }
}

impl fmt::Debug for Subscription {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Subscription")
      .field("key", &self.key)
      .field("entry", &self.entry)
      .finish()
  }
}

/// Downcast the payload and run the typed callback.
fn erase<T, F>(key: EventKey, callback: F) -> ErasedCallback
where
  T: 'static,
  F: Fn(&T, &mut EventContext) -> DispatchResult<()> + Send + Sync + 'static,
{
  Arc::new(move |payload: &dyn Any, ctx: &mut EventContext| -> DispatchResult<()> {
    let value = payload
      .downcast_ref::<T>()
      .ok_or_else(|| DispatchError::PayloadMismatch {
        key: key.clone(),
        expected: type_name::<T>(),
      })?;
    callback(value, ctx)
  })
}

impl Dispatcher {
  /// Register a listener with default options (priority 0, persistent).
  pub fn on<T, F>(&self, key: &Key<T>, listener: F) -> Subscription
  where
    T: 'static,
    F: Fn(&T, &mut EventContext) -> ListenerResult + Send + Sync + 'static,
  {
    self.on_with(key, ListenerOptions::new(), listener)
  }

  /// Register a listener with explicit priority and once flag.
  pub fn on_with<T, F>(
    &self,
    key: &Key<T>,
    options: impl Into<ListenerOptions>,
    listener: F,
  ) -> Subscription
  where
    T: 'static,
    F: Fn(&T, &mut EventContext) -> ListenerResult + Send + Sync + 'static,
  {
    self.subscribe(key, &Listener::new(listener), options.into())
  }

  /// Register a reusable [`Listener`]. May be called repeatedly with the same listener.
  pub fn subscribe<T: 'static>(
    &self,
    key: &Key<T>,
    listener: &Listener<T>,
    options: ListenerOptions,
  ) -> Subscription {
    let callback = Arc::clone(&listener.callback);
    let name = key.name().clone();
    self.register(key, listener.id, options, move |value: &T, ctx: &mut EventContext| {
      callback(value, ctx).map_err(|source| DispatchError::Listener {
        key: name.clone(),
        source,
      })
    })
  }

  /// Remove every registration of `listener` under `key`. No-op if none exist.
  pub fn off<T>(&self, key: &Key<T>, listener: &Listener<T>) {
    let removed = self.write(|r| r.remove_listener(key.name(), listener.id));
    if !removed.is_empty() {
      log::debug!(
        "Removed {} registration(s) of listener {} from '{key}'",
        removed.len(),
        listener.id
      );
    }
  }

  /// Number of live registrations under `key`.
  pub fn listener_count<T>(&self, key: &Key<T>) -> usize {
    self.read(|r| r.len(key.name()))
  }

  /// Register a callback whose errors are already dispatch errors.
  pub(crate) fn register<T, F>(
    &self,
    key: &Key<T>,
    listener: ListenerId,
    options: ListenerOptions,
    callback: F,
  ) -> Subscription
  where
    T: 'static,
    F: Fn(&T, &mut EventContext) -> DispatchResult<()> + Send + Sync + 'static,
  {
    let entry = Entry::new(listener, options, erase(key.name().clone(), callback));
    let entry_id = entry.id;
    let position = self.write(|r| r.insert(key.name().clone(), entry));

    log::debug!(
      "Registered entry {entry_id} on '{key}' (priority={}, once={}, position={position})",
      options.priority,
      options.once,
    );

    Subscription {
      dispatcher: self.downgrade(),
      key: key.name().clone(),
      entry: entry_id,
    }
  }
}
