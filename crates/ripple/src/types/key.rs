/*!
Event keys.

The dispatcher core is untyped: listener lists are indexed by [`EventKey`].
[`Key<T>`] layers a payload type on top, so a typed registry is just a set of constants:

```
use ripple::Key;

const COUNT: Key<i32> = Key::new("count");
const TITLE: Key<String> = Key::new("title");
```

Runtime-named keys go through [`Key::custom`].
*/

use derive_more::Display;
use std::borrow::Cow;
use std::fmt;
use std::marker::PhantomData;

/// Untyped channel name. Keys are independent: no hierarchy, no wildcards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Display)]
pub struct EventKey(Cow<'static, str>);

impl EventKey {
  /// Create a key from a static string without allocating.
  pub const fn from_static(name: &'static str) -> Self {
    Self(Cow::Borrowed(name))
  }

  /// The key as a string slice.
  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl From<&'static str> for EventKey {
  fn from(name: &'static str) -> Self {
    Self::from_static(name)
  }
}

impl From<String> for EventKey {
  fn from(name: String) -> Self {
    Self(Cow::Owned(name))
  }
}

/// Typed handle for a channel carrying payloads of type `T`.
///
/// Two keys with the same name address the same listener list even if their
/// payload types differ; a mismatch surfaces as
/// [`DispatchError::PayloadMismatch`](crate::DispatchError::PayloadMismatch) at dispatch time.
pub struct Key<T> {
  name: EventKey,
  _payload: PhantomData<fn() -> T>,
}

impl<T> Key<T> {
  /// Declare a key with a static name. Usable in `const` items.
  pub const fn new(name: &'static str) -> Self {
    Self {
      name: EventKey::from_static(name),
      _payload: PhantomData,
    }
  }

  /// Key with a runtime-provided name.
  pub fn custom(name: impl Into<String>) -> Self {
    Self {
      name: EventKey::from(name.into()),
      _payload: PhantomData,
    }
  }

  /// Key for change notifications of a field: `<field>-changed`.
  ///
  /// ```
  /// use ripple::Key;
  ///
  /// let key: Key<u32> = Key::changed("volume");
  /// assert_eq!(key.name().as_str(), "volume-changed");
  /// ```
  pub fn changed(field: &str) -> Self {
    Self::custom(format!("{field}-changed"))
  }

  /// The untyped channel name.
  pub const fn name(&self) -> &EventKey {
    &self.name
  }
}

impl<T> Clone for Key<T> {
  fn clone(&self) -> Self {
    Self {
      name: self.name.clone(),
      _payload: PhantomData,
    }
  }
}

impl<T> PartialEq for Key<T> {
  fn eq(&self, other: &Self) -> bool {
    self.name == other.name
  }
}

impl<T> Eq for Key<T> {}

impl<T> fmt::Debug for Key<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Key")
      .field("name", &self.name.as_str())
      .field("payload", &std::any::type_name::<T>())
      .finish()
  }
}

impl<T> fmt::Display for Key<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    fmt::Display::fmt(&self.name, f)
  }
}

/// Key whose payload has no fixed shape. Equality is structural.
pub type DynamicKey = Key<serde_json::Value>;
