/*!
Per-dispatch context.

One [`EventContext`] is created for every `emit` call, handed by `&mut` to each
listener and the default callback, then returned to the caller.
*/

/// Propagation and default-action flags for a single dispatch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventContext {
  propagation_stopped: bool,
  default_prevented: bool,
}

impl EventContext {
  /// Fresh context with both flags cleared.
  pub const fn new() -> Self {
    Self {
      propagation_stopped: false,
      default_prevented: false,
    }
  }

  /// Skip the remaining listeners of this dispatch.
  pub const fn stop_propagation(&mut self) {
    self.propagation_stopped = true;
  }

  /// Skip the default callback of this dispatch.
  pub const fn prevent_default(&mut self) {
    self.default_prevented = true;
  }

  /// True if a listener called [`stop_propagation`](Self::stop_propagation).
  pub const fn is_propagation_stopped(&self) -> bool {
    self.propagation_stopped
  }

  /// True if a listener called [`prevent_default`](Self::prevent_default).
  pub const fn is_default_prevented(&self) -> bool {
    self.default_prevented
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn new_context_has_no_flags() {
    let ctx = EventContext::new();
    assert!(!ctx.is_propagation_stopped());
    assert!(!ctx.is_default_prevented());
    assert_eq!(ctx, EventContext::default());
  }

  #[test]
  fn flags_are_independent() {
    let mut ctx = EventContext::new();
    ctx.stop_propagation();
    assert!(ctx.is_propagation_stopped());
    assert!(!ctx.is_default_prevented(), "stopping propagation must not prevent default");

    let mut ctx = EventContext::new();
    ctx.prevent_default();
    assert!(ctx.is_default_prevented());
    assert!(!ctx.is_propagation_stopped(), "preventing default must not stop propagation");
  }

  #[test]
  fn setting_twice_is_idempotent() {
    let mut once = EventContext::new();
    once.stop_propagation();
    once.prevent_default();

    let mut twice = EventContext::new();
    twice.stop_propagation();
    twice.stop_propagation();
    twice.prevent_default();
    twice.prevent_default();

    assert_eq!(once, twice);
  }
}
