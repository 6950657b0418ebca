/*! Error types for dispatch operations. */

use super::EventKey;

/// Boxed error returned by listeners, transforms and default callbacks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Return type of listener and default callbacks.
pub type ListenerResult = Result<(), BoxError>;

/// Errors that abort a dispatch.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
  #[error("Listener for '{key}' failed: {source}")]
  Listener { key: EventKey, source: BoxError },

  #[error("Payload type mismatch on '{key}': listener expects {expected}")]
  PayloadMismatch {
    key: EventKey,
    expected: &'static str,
  },

  #[error("Dispatch depth limit of {limit} exceeded on '{key}'")]
  DepthExceeded { key: EventKey, limit: usize },
}

impl DispatchError {
  /// The key whose dispatch failed.
  pub const fn key(&self) -> &EventKey {
    match self {
      Self::Listener { key, .. }
      | Self::PayloadMismatch { key, .. }
      | Self::DepthExceeded { key, .. } => key,
    }
  }
}

/// Result type for dispatch operations.
pub type DispatchResult<T> = Result<T, DispatchError>;
