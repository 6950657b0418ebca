/*!
Dispatcher configuration.

Defaults match the plain contract: the first listener error aborts the dispatch,
and nested dispatch depth is unbounded.
*/

use serde::Deserialize;

/// What to do when a listener, modifier transform or default callback fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
  /// Abort the dispatch and return the error to the `emit` caller.
  #[default]
  Propagate,
  /// Log the error and keep dispatching.
  LogAndContinue,
}

/// Configuration for a [`Dispatcher`](crate::Dispatcher).
///
/// ```
/// use ripple::{DispatchConfig, ErrorPolicy};
///
/// let config: DispatchConfig =
///   serde_json::from_str(r#"{ "error_policy": "log_and_continue", "max_depth": 32 }"#).unwrap();
/// assert_eq!(config.error_policy, ErrorPolicy::LogAndContinue);
/// assert_eq!(config.max_depth, Some(32));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
  /// Listener failure handling. Default: [`ErrorPolicy::Propagate`].
  pub error_policy: ErrorPolicy,
  /// Maximum nesting of `emit` calls on one dispatcher. None = unbounded.
  ///
  /// Listeners that emit back onto their own key without reaching a fixed point
  /// recurse forever; with a limit set the dispatch fails with
  /// [`DispatchError::DepthExceeded`](crate::DispatchError::DepthExceeded) instead.
  pub max_depth: Option<usize>,
}
