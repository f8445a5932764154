//! Backend-qualified keys.
//!
//! Every value lives under a [`NamespacedKey`]: a name paired with the
//! [`BackendTag`] of the medium it belongs to. Applications usually declare
//! their keys once as constants:
//!
//! ```rust
//! use kvstorage_core::NamespacedKey;
//!
//! const SESSION_TOKEN: NamespacedKey = NamespacedKey::secure("session-token");
//! const LAUNCH_COUNT: NamespacedKey = NamespacedKey::preferences("launch-count");
//!
//! assert_eq!(SESSION_TOKEN.to_string(), "secure:session-token");
//! assert_ne!(SESSION_TOKEN, NamespacedKey::volatile("session-token"));
//! # let _ = LAUNCH_COUNT;
//! ```

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};
use thiserror::Error;

/// The storage medium a key is routed to.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[cfg_attr(feature = "ffi", derive(uniffi::Enum))]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BackendTag {
    /// Confidential credential storage (Keychain, Android Keystore).
    Secure,
    /// Plain application preferences (`UserDefaults`, `SharedPreferences`).
    Preferences,
    /// In-process memory, lost when the process exits.
    Volatile,
}

/// An immutable `(backend, name)` pair.
///
/// Equality and hashing cover both fields, so the same name under two
/// backends addresses two distinct slots. Any string is a legal name,
/// including the empty string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NamespacedKey {
    backend: BackendTag,
    name: Cow<'static, str>,
}

impl NamespacedKey {
    /// Creates a key from a static name. Usable in `const` items.
    #[must_use]
    pub const fn new(backend: BackendTag, name: &'static str) -> Self {
        Self {
            backend,
            name: Cow::Borrowed(name),
        }
    }

    /// Creates a key from a runtime name.
    #[must_use]
    pub fn owned(backend: BackendTag, name: impl Into<String>) -> Self {
        Self {
            backend,
            name: Cow::Owned(name.into()),
        }
    }

    /// Creates a key routed to the secure backend.
    #[must_use]
    pub const fn secure(name: &'static str) -> Self {
        Self::new(BackendTag::Secure, name)
    }

    /// Creates a key routed to the preferences backend.
    #[must_use]
    pub const fn preferences(name: &'static str) -> Self {
        Self::new(BackendTag::Preferences, name)
    }

    /// Creates a key routed to the volatile backend.
    #[must_use]
    pub const fn volatile(name: &'static str) -> Self {
        Self::new(BackendTag::Volatile, name)
    }

    /// Returns the backend this key is declared for.
    #[must_use]
    pub const fn backend(&self) -> BackendTag {
        self.backend
    }

    /// Returns the key name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for NamespacedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.backend, self.name)
    }
}

/// Error returned when parsing a `backend:name` string fails.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseKeyError {
    /// The input has no `:` separating backend and name.
    #[error("missing ':' separator in key '{0}'")]
    MissingSeparator(String),
    /// The backend prefix is not one of `secure`, `preferences`, `volatile`.
    #[error("unknown backend '{0}'")]
    UnknownBackend(String),
}

impl FromStr for NamespacedKey {
    type Err = ParseKeyError;

    /// Parses the `backend:name` form produced by `Display`.
    ///
    /// Only the first `:` separates the backend, so names may contain colons.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (backend, name) = s
            .split_once(':')
            .ok_or_else(|| ParseKeyError::MissingSeparator(s.to_string()))?;
        let backend = BackendTag::from_str(backend)
            .map_err(|_| ParseKeyError::UnknownBackend(backend.to_string()))?;
        Ok(Self::owned(backend, name))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn test_equality_covers_both_fields() {
        let a = NamespacedKey::secure("token");
        let b = NamespacedKey::owned(BackendTag::Secure, String::from("token"));
        let c = NamespacedKey::preferences("token");

        assert_eq!(a, b);
        assert_ne!(a, c);

        let set: HashSet<_> = [a, b, c].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_empty_name_is_legal() {
        let key = NamespacedKey::volatile("");
        assert_eq!(key.name(), "");
        assert_eq!(key.to_string(), "volatile:");
        assert_eq!("volatile:".parse::<NamespacedKey>().unwrap(), key);
    }

    #[test]
    fn test_parse_keeps_colons_in_name() {
        let key: NamespacedKey = "preferences:ui:theme".parse().unwrap();
        assert_eq!(key.backend(), BackendTag::Preferences);
        assert_eq!(key.name(), "ui:theme");
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            "token".parse::<NamespacedKey>(),
            Err(ParseKeyError::MissingSeparator("token".to_string()))
        );
        assert_eq!(
            "disk:token".parse::<NamespacedKey>(),
            Err(ParseKeyError::UnknownBackend("disk".to_string()))
        );
    }

    #[test]
    fn test_backend_tag_names_round_trip() {
        for tag in BackendTag::iter() {
            assert_eq!(BackendTag::from_str(&tag.to_string()).unwrap(), tag);
        }
        assert_eq!(BackendTag::Preferences.to_string(), "preferences");
        assert_eq!(
            serde_json::to_string(&BackendTag::Secure).unwrap(),
            "\"secure\""
        );
    }
}
