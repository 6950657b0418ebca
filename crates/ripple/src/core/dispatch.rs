/*!
Synchronous dispatch.

`emit` snapshots the key's listener list, runs the snapshot in priority order,
then runs the default callback unless a listener prevented it. Registrations
and removals made by listeners only affect later dispatches.
*/

use std::any::Any;

use super::Dispatcher;
use crate::config::ErrorPolicy;
use crate::context::EventContext;
use crate::types::{DispatchError, DispatchResult, Key, ListenerResult};

type NoDefault<T> = fn(&T, &mut EventContext) -> ListenerResult;

impl Dispatcher {
  /// Deliver `value` to every listener on `key`.
  ///
  /// Returns the dispatch context so the caller can inspect whether
  /// propagation was stopped or the default action prevented.
  pub fn emit<T: 'static>(&self, key: &Key<T>, value: T) -> DispatchResult<EventContext> {
    self.dispatch(key, &value, None::<NoDefault<T>>)
  }

  /// Deliver `value`, then run `default` unless a listener called `prevent_default`.
  ///
  /// With no listeners registered, `default` always runs and the returned
  /// context has both flags cleared.
  ///
  /// ```
  /// use ripple::{Dispatcher, Key};
  ///
  /// const CLOSE: Key<u32> = Key::new("close");
  ///
  /// let dispatcher = Dispatcher::new();
  /// dispatcher.on(&CLOSE, |_, ctx| {
  ///   ctx.prevent_default();
  ///   Ok(())
  /// });
  ///
  /// let ctx = dispatcher.emit_with_default(&CLOSE, 7, |id, _| {
  ///   panic!("window {id} should stay open");
  /// })?;
  /// assert!(ctx.is_default_prevented());
  /// # Ok::<(), ripple::DispatchError>(())
  /// ```
  pub fn emit_with_default<T, D>(
    &self,
    key: &Key<T>,
    value: T,
    default: D,
  ) -> DispatchResult<EventContext>
  where
    T: 'static,
    D: FnOnce(&T, &mut EventContext) -> ListenerResult,
  {
    self.dispatch(key, &value, Some(default))
  }

  fn dispatch<T, D>(&self, key: &Key<T>, value: &T, default: Option<D>) -> DispatchResult<EventContext>
  where
    T: 'static,
    D: FnOnce(&T, &mut EventContext) -> ListenerResult,
  {
    let state = self.shared.state.lock();

    let depth = state.depth.get().saturating_add(1);
    if let Some(limit) = self.shared.config.max_depth {
      if depth > limit {
        return Err(DispatchError::DepthExceeded {
          key: key.name().clone(),
          limit,
        });
      }
    }
    state.depth.set(depth);
    let _depth = scopeguard::guard(&state.depth, |d| d.set(d.get().saturating_sub(1)));

    let snapshot = state.registry.borrow().snapshot(key.name());
    let payload: &dyn Any = value;
    let mut ctx = EventContext::new();

    log::trace!("Dispatching '{key}' to {} listener(s) at depth {depth}", snapshot.len());

    if snapshot.is_empty() {
      // The default gets a scratch context; its actions never reach the caller.
      if let Some(default) = default {
        self.run_default(key, value, default, &mut EventContext::new())?;
      }
      return Ok(ctx);
    }

    for entry in &snapshot {
      // A reentrant dispatch may already have run this once-entry.
      if entry.once && !entry.claim() {
        continue;
      }

      let outcome = {
        let _removal = entry.once.then(|| {
          scopeguard::guard((), |()| {
            let removed = state.registry.borrow_mut().remove_entry(key.name(), entry.id);
            drop(removed);
          })
        });
        (entry.callback)(payload, &mut ctx)
      };

      if let Err(error) = outcome {
        self.absorb(error)?;
      }

      if ctx.is_propagation_stopped() {
        log::trace!("Propagation of '{key}' stopped by entry {}", entry.id);
        break;
      }
    }

    if !ctx.is_default_prevented() {
      if let Some(default) = default {
        self.run_default(key, value, default, &mut ctx)?;
      }
    }

    Ok(ctx)
  }

  fn run_default<T, D>(
    &self,
    key: &Key<T>,
    value: &T,
    default: D,
    ctx: &mut EventContext,
  ) -> DispatchResult<()>
  where
    D: FnOnce(&T, &mut EventContext) -> ListenerResult,
  {
    match default(value, ctx) {
      Ok(()) => Ok(()),
      Err(source) => self.absorb(DispatchError::Listener {
        key: key.name().clone(),
        source,
      }),
    }
  }

  /// Apply the error policy to a failed callback.
  fn absorb(&self, error: DispatchError) -> DispatchResult<()> {
    match self.shared.config.error_policy {
      ErrorPolicy::Propagate => Err(error),
      ErrorPolicy::LogAndContinue => {
        log::error!("{error}");
        Ok(())
      }
    }
  }
}
