/*! Per-registration listener options. */

/// Options for registering a listener.
///
/// ```
/// use ripple::ListenerOptions;
///
/// let options = ListenerOptions::new().priority(10).once();
/// assert_eq!(options.priority, 10);
/// assert!(options.once);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[must_use]
pub struct ListenerOptions {
  /// Higher runs earlier. Ties run in registration order.
  pub priority: i32,
  /// Remove the listener after its first invocation.
  pub once: bool,
}

impl ListenerOptions {
  /// Default options: priority 0, persistent.
  pub const fn new() -> Self {
    Self {
      priority: 0,
      once: false,
    }
  }

  /// Set the priority.
  pub const fn priority(mut self, priority: i32) -> Self {
    self.priority = priority;
    self
  }

  /// Mark as a once-listener.
  pub const fn once(mut self) -> Self {
    self.once = true;
    self
  }
}

impl From<i32> for ListenerOptions {
  fn from(priority: i32) -> Self {
    Self::new().priority(priority)
  }
}
