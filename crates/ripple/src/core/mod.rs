/*!
Core dispatcher - owns the listener registry and runs dispatches.

# Module Structure

- `mod.rs` - `Dispatcher` struct, construction, registry access
- `registry.rs` - per-key listener lists and ordering
- `subscriptions.rs` - `on`/`off`, `Listener`, `Subscription`
- `dispatch.rs` - `emit` and the propagation/default protocol

# Example

```
use ripple::{Dispatcher, Key, ListenerOptions};

const COUNT: Key<i32> = Key::new("count");

let dispatcher = Dispatcher::new();
dispatcher.on_with(&COUNT, ListenerOptions::new().priority(10), |value, ctx| {
  if *value < 0 {
    ctx.stop_propagation();
  }
  Ok(())
});

let ctx = dispatcher.emit(&COUNT, 1)?;
assert!(!ctx.is_propagation_stopped());
# Ok::<(), ripple::DispatchError>(())
```
*/

mod dispatch;
mod registry;
mod subscriptions;

pub(crate) use registry::Registry;
pub use subscriptions::{Listener, Subscription};

use parking_lot::ReentrantMutex;
use std::cell::{Cell, RefCell};
use std::sync::{Arc, Weak};

use crate::config::{DispatchConfig, ErrorPolicy};

/// Registry plus nesting depth, guarded as one unit.
struct State {
  registry: RefCell<Registry>,
  depth: Cell<usize>,
}

pub(crate) struct Shared {
  /// Held for the whole of `emit`. Reentrant so listeners on the dispatching
  /// thread can call `on`/`off`/`emit`; other threads wait.
  state: ReentrantMutex<State>,
  config: DispatchConfig,
}

/// Typed publish/subscribe dispatcher.
///
/// Clone is cheap (Arc bump) and clones share one registry. Separate
/// `Dispatcher::new()` instances share nothing.
#[derive(Clone)]
pub struct Dispatcher {
  shared: Arc<Shared>,
}

impl std::fmt::Debug for Dispatcher {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Dispatcher")
      .field("config", &self.shared.config)
      .finish_non_exhaustive()
  }
}

impl Default for Dispatcher {
  fn default() -> Self {
    Self::new()
  }
}

/// Builder for configuring a Dispatcher.
///
/// # Example
///
/// ```
/// use ripple::{Dispatcher, ErrorPolicy};
///
/// let dispatcher = Dispatcher::builder()
///   .error_policy(ErrorPolicy::LogAndContinue)
///   .max_depth(64)
///   .build();
/// assert_eq!(dispatcher.config().max_depth, Some(64));
/// ```
#[derive(Debug, Default, Clone, Copy)]
#[must_use = "Builder does nothing until .build() is called"]
pub struct DispatcherBuilder {
  config: DispatchConfig,
}

impl DispatcherBuilder {
  /// How listener failures are handled. Default: propagate.
  pub const fn error_policy(mut self, policy: ErrorPolicy) -> Self {
    self.config.error_policy = policy;
    self
  }

  /// Bound nested dispatch depth. Default: unbounded.
  pub const fn max_depth(mut self, depth: usize) -> Self {
    self.config.max_depth = Some(depth);
    self
  }

  /// Build the Dispatcher with the configured options.
  pub fn build(self) -> Dispatcher {
    Dispatcher::with_config(self.config)
  }
}

impl Dispatcher {
  /// Create a dispatcher with default options.
  pub fn new() -> Self {
    Self::with_config(DispatchConfig::default())
  }

  /// Create a builder for configuring a new Dispatcher.
  pub fn builder() -> DispatcherBuilder {
    DispatcherBuilder::default()
  }

  /// Create a dispatcher from a loaded configuration.
  pub fn with_config(config: DispatchConfig) -> Self {
    Self {
      shared: Arc::new(Shared {
        state: ReentrantMutex::new(State {
          registry: RefCell::new(Registry::default()),
          depth: Cell::new(0),
        }),
        config,
      }),
    }
  }

  /// Active configuration.
  pub fn config(&self) -> &DispatchConfig {
    &self.shared.config
  }

  /// Read the registry. Never invoke listeners inside the closure.
  #[inline]
  pub(crate) fn read<R>(&self, f: impl FnOnce(&Registry) -> R) -> R {
    let state = self.shared.state.lock();
    let registry = state.registry.borrow();
    f(&registry)
  }

  /// Write the registry. Never invoke listeners inside the closure.
  #[inline]
  pub(crate) fn write<R>(&self, f: impl FnOnce(&mut Registry) -> R) -> R {
    let state = self.shared.state.lock();
    let mut registry = state.registry.borrow_mut();
    f(&mut registry)
  }

  /// Handle that does not keep the registry alive.
  pub(crate) fn downgrade(&self) -> WeakDispatcher {
    WeakDispatcher(Arc::downgrade(&self.shared))
  }
}

/// Non-owning dispatcher reference, held by listeners that must not form a cycle
/// with the registry that stores them.
#[derive(Clone)]
pub(crate) struct WeakDispatcher(Weak<Shared>);

impl WeakDispatcher {
  pub(crate) fn upgrade(&self) -> Option<Dispatcher> {
    self.0.upgrade().map(|shared| Dispatcher { shared })
  }
}
