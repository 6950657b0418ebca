/*!
Ripple - typed in-process event dispatcher

```
use ripple::{add_modifier, Dispatcher, Key, ListenerOptions};

const COUNT: Key<i32> = Key::new("count");

let dispatcher = Dispatcher::new();

// Higher priority runs first; ties run in registration order.
dispatcher.on_with(&COUNT, ListenerOptions::new().priority(10), |value, ctx| {
  if *value > 100 {
    ctx.stop_propagation();
  }
  Ok(())
});

// One-shot listener.
dispatcher.on_with(&COUNT, ListenerOptions::new().once(), |value, _| {
  println!("first count: {value}");
  Ok(())
});

// Canonicalize payloads before ordinary listeners see them.
add_modifier(&dispatcher, &COUNT, |value| Ok((*value).max(0)));

// Default action runs unless a listener prevents it.
let ctx = dispatcher.emit_with_default(&COUNT, -3, |value, _| {
  println!("default for {value}");
  Ok(())
})?;
assert!(ctx.is_default_prevented(), "modifier replaced the payload");
# Ok::<(), ripple::DispatchError>(())
```
*/

mod binding;
mod config;
mod context;
mod core;
mod field;
mod modify;

mod types;
pub use types::*;

pub use crate::binding::{EventAccessor, EventCell};
pub use crate::config::{DispatchConfig, ErrorPolicy};
pub use crate::context::EventContext;
pub use crate::core::{Dispatcher, DispatcherBuilder, Listener, Subscription};
pub use crate::field::Observed;
pub use crate::modify::{
  add_modifier, add_modifier_with_priority, TransformResult, DEFAULT_MODIFIER_PRIORITY,
};
