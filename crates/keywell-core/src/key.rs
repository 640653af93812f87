use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// A reserved, globally-unique short-alias token.
///
/// Keys are opaque: identity is value-equality and no structure is assumed
/// beyond "non-empty string". The remote key source guarantees it never
/// returns the same key twice, so a `Key` held locally never conflicts with
/// one held by another service replica. Once a key is handed to a consumer
/// it is gone; nothing in the system puts an issued key back into
/// circulation.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Key(String);

impl Key {
    /// Creates a new `Key`, rejecting the empty string.
    pub fn new(token: impl Into<String>) -> Result<Self, CoreError> {
        let token = token.into();
        if token.is_empty() {
            return Err(CoreError::EmptyKey);
        }
        Ok(Self(token))
    }

    /// Creates a `Key` without validation.
    ///
    /// Use this only for tokens produced by trusted internal sources; the
    /// fetch layer validates everything that crosses the wire.
    pub fn new_unchecked(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the key, returning the underlying token.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Key {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
