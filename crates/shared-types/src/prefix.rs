// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Provider prefix tokens
//!
//! A [`ProviderPrefix`] names one data provider inside a prefixed experiment
//! identifier (`prefix:local-id`). Prefixes are validated once, when the
//! registry is built, so routing never has to re-check them.
//!
//! # Validation Rules
//!
//! - Empty or whitespace-only prefixes are rejected
//! - Prefixes containing the separator (`:`) are rejected, since the first
//!   colon of an identifier always ends the prefix
//! - Case and surrounding whitespace are preserved; matching is exact
//!
//! ```rust
//! use shared_types::ProviderPrefix;
//!
//! let prefix = ProviderPrefix::new("gcs").expect("valid prefix");
//! assert_eq!(prefix.as_str(), "gcs");
//!
//! assert!(ProviderPrefix::new("").is_err());
//! assert!(ProviderPrefix::new("a:b").is_err());
//! ```

use std::{borrow::Borrow, fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::experiment_id::PREFIX_SEPARATOR;

/// Errors produced when validating a prefix token
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[allow(missing_docs)]
pub enum PrefixError {
    /// The prefix was empty or contained only whitespace
    #[error("provider prefix cannot be empty or whitespace-only")]
    Empty,

    /// The prefix contained the identifier separator
    #[error("provider prefix '{prefix}' must not contain ':'")]
    ContainsSeparator { prefix: String },
}

/// A validated, case-sensitive provider prefix
///
/// Ordering is lexicographic on the underlying string, which is the order the
/// blob resolver tries registered providers in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProviderPrefix(Box<str>);

impl ProviderPrefix {
    /// Create a new `ProviderPrefix`, validating the token
    ///
    /// # Errors
    ///
    /// Returns [`PrefixError::Empty`] for empty or whitespace-only input and
    /// [`PrefixError::ContainsSeparator`] if the input contains `:`.
    pub fn new(s: impl Into<String>) -> Result<Self, PrefixError> {
        let s = s.into();
        if s.trim().is_empty() {
            return Err(PrefixError::Empty);
        }
        if s.contains(PREFIX_SEPARATOR) {
            return Err(PrefixError::ContainsSeparator { prefix: s });
        }
        Ok(Self(s.into_boxed_str()))
    }

    /// Get the prefix as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProviderPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ProviderPrefix {
    type Err = PrefixError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for ProviderPrefix {
    type Error = PrefixError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for ProviderPrefix {
    type Error = PrefixError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl AsRef<str> for ProviderPrefix {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// Lets keyed collections of prefixes be queried with a plain `&str`.
impl Borrow<str> for ProviderPrefix {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl Serialize for ProviderPrefix {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ProviderPrefix {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::new(raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn accepts_plain_tokens() {
        assert!(ProviderPrefix::new("foo").is_ok());
        assert!(ProviderPrefix::new("Bar").is_ok());
        assert!(ProviderPrefix::new("gs-bucket_1").is_ok());
        assert!(ProviderPrefix::new("@").is_ok());
    }

    #[test]
    fn rejects_empty_and_whitespace() {
        assert_eq!(ProviderPrefix::new(""), Err(PrefixError::Empty));
        assert_eq!(ProviderPrefix::new("  \t"), Err(PrefixError::Empty));
    }

    #[test]
    fn rejects_separator() {
        let err = ProviderPrefix::new("a:b").unwrap_err();
        assert_eq!(
            err,
            PrefixError::ContainsSeparator {
                prefix: "a:b".to_string()
            }
        );
        assert_eq!(
            err.to_string(),
            "provider prefix 'a:b' must not contain ':'"
        );
        assert!(ProviderPrefix::new(":").is_err());
    }

    #[test]
    fn preserves_case_and_whitespace() {
        let prefix = ProviderPrefix::new(" Foo ").unwrap();
        assert_eq!(prefix.as_str(), " Foo ");
        assert_ne!(prefix, ProviderPrefix::new("foo").unwrap());
    }

    #[test]
    fn orders_lexicographically() {
        let mut prefixes = vec![
            ProviderPrefix::new("foo").unwrap(),
            ProviderPrefix::new("Bar").unwrap(),
            ProviderPrefix::new("bar").unwrap(),
        ];
        prefixes.sort();
        let names: Vec<&str> = prefixes.iter().map(ProviderPrefix::as_str).collect();
        assert_eq!(names, vec!["Bar", "bar", "foo"]);
    }

    #[test]
    fn map_lookup_by_str() {
        let mut map = BTreeMap::new();
        map.insert(ProviderPrefix::new("foo").unwrap(), 1);
        assert_eq!(map.get("foo"), Some(&1));
        assert_eq!(map.get("FOO"), None);
    }

    #[test]
    fn serde_as_plain_string() {
        let prefix = ProviderPrefix::new("foo").unwrap();
        assert_eq!(serde_json::to_string(&prefix).unwrap(), "\"foo\"");

        let parsed: ProviderPrefix = serde_json::from_str("\"bar\"").unwrap();
        assert_eq!(parsed.as_str(), "bar");

        assert!(serde_json::from_str::<ProviderPrefix>("\"x:y\"").is_err());
        assert!(serde_json::from_str::<ProviderPrefix>("\"\"").is_err());
    }
}
