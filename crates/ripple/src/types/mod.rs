/*! Core types for ripple. */

#![allow(missing_docs)]

mod error;
mod ids;
mod key;
mod options;

pub use error::{BoxError, DispatchError, DispatchResult, ListenerResult};
pub use ids::{EntryId, ListenerId};
pub use key::{DynamicKey, EventKey, Key};
pub use options::ListenerOptions;
