/*!
Payload modifiers.

A modifier is a high-priority listener that owns the canonical form of a
payload (clamping, normalization, validation). When its transform yields a
value different from the one being dispatched, it stops the current dispatch,
prevents its default action, and emits the new value as a fresh dispatch.
An unchanged value costs one comparison and otherwise behaves as if the
modifier were absent.

Equality is `PartialEq`, which is structural for collections, derived structs
and `serde_json::Value`.

```
use ripple::{add_modifier, Dispatcher, Key};

const VOLUME: Key<u8> = Key::new("volume");

let dispatcher = Dispatcher::new();
add_modifier(&dispatcher, &VOLUME, |v| Ok((*v).min(100)));

dispatcher.on(&VOLUME, |v, _| {
  assert!(*v <= 100);
  Ok(())
});
dispatcher.emit(&VOLUME, 250)?;
# Ok::<(), ripple::DispatchError>(())
```

A modifier does not see its own re-emission: the guard is held until the
nested dispatch returns, so the rewritten value reaches the remaining listeners
as-is. Transforms should be idempotent (`f(f(x)) == f(x)`). Listeners that emit
back onto the same key can still recurse without bound; set
[`DispatchConfig::max_depth`](crate::DispatchConfig::max_depth) to turn that
into an error.
*/

use std::sync::atomic::{AtomicBool, Ordering};

use crate::context::EventContext;
use crate::core::{Dispatcher, Subscription};
use crate::types::{BoxError, DispatchError, DispatchResult, Key, ListenerId, ListenerOptions};

/// Priority modifiers register at unless told otherwise.
pub const DEFAULT_MODIFIER_PRIORITY: i32 = 1000;

/// Return type of modifier transforms.
pub type TransformResult<T> = Result<T, BoxError>;

/// Install a modifier at [`DEFAULT_MODIFIER_PRIORITY`].
pub fn add_modifier<T, F>(dispatcher: &Dispatcher, key: &Key<T>, transform: F) -> Subscription
where
  T: PartialEq + 'static,
  F: Fn(&T) -> TransformResult<T> + Send + Sync + 'static,
{
  add_modifier_with_priority(dispatcher, key, DEFAULT_MODIFIER_PRIORITY, transform)
}

/// Install a modifier at an explicit priority.
///
/// The returned subscription removes the modifier; later emits deliver raw values.
pub fn add_modifier_with_priority<T, F>(
  dispatcher: &Dispatcher,
  key: &Key<T>,
  priority: i32,
  transform: F,
) -> Subscription
where
  T: PartialEq + 'static,
  F: Fn(&T) -> TransformResult<T> + Send + Sync + 'static,
{
  // Scoped to this registration only.
  let active = AtomicBool::new(false);
  let weak = dispatcher.downgrade();
  let rekey = key.clone();

  dispatcher.register(
    key,
    ListenerId::new(),
    ListenerOptions::new().priority(priority),
    move |value: &T, ctx: &mut EventContext| -> DispatchResult<()> {
      if active.swap(true, Ordering::SeqCst) {
        return Ok(());
      }
      let _release = scopeguard::guard(&active, |flag| flag.store(false, Ordering::SeqCst));

      let modified = transform(value).map_err(|source| DispatchError::Listener {
        key: rekey.name().clone(),
        source,
      })?;
      if modified == *value {
        return Ok(());
      }

      ctx.stop_propagation();
      ctx.prevent_default();

      let Some(dispatcher) = weak.upgrade() else {
        return Ok(());
      };
      log::debug!("Modifier on '{rekey}' rewrote payload, re-emitting");
      dispatcher.emit(&rekey, modified)?;
      Ok(())
    },
  )
}
