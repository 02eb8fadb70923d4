// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Experiment identifier grammar
//!
//! An experiment identifier takes one of two shapes:
//!
//! - `prefix:local-id`: the text before the **first** colon selects a
//!   provider; everything after it (further colons included) is the local id
//! - `local-id`: no colon at all, handled by the unprefixed provider if any
//!
//! Parsing never fails. Whether a prefix is known, or whether a local id is
//! meaningful, is decided by whoever consumes the parsed value.

use std::fmt;

/// Separator between the provider prefix and the local experiment id
pub const PREFIX_SEPARATOR: char = ':';

/// A parsed, borrowed view of an experiment identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExperimentId<'a> {
    raw: &'a str,
    prefix: Option<&'a str>,
    local_id: &'a str,
}

impl<'a> ExperimentId<'a> {
    /// Split an identifier on its first colon
    ///
    /// ```rust
    /// use shared_types::ExperimentId;
    ///
    /// let id = ExperimentId::parse("bar:a:b:c");
    /// assert_eq!(id.prefix(), Some("bar"));
    /// assert_eq!(id.local_id(), "a:b:c");
    ///
    /// let id = ExperimentId::parse("baz");
    /// assert_eq!(id.prefix(), None);
    /// assert_eq!(id.local_id(), "baz");
    /// ```
    pub fn parse(raw: &'a str) -> Self {
        match raw.split_once(PREFIX_SEPARATOR) {
            Some((prefix, local_id)) => Self {
                raw,
                prefix: Some(prefix),
                local_id,
            },
            None => Self {
                raw,
                prefix: None,
                local_id: raw,
            },
        }
    }

    /// The candidate prefix, or `None` for an unprefixed identifier
    pub fn prefix(&self) -> Option<&'a str> {
        self.prefix
    }

    /// The identifier with the prefix and separator stripped
    pub fn local_id(&self) -> &'a str {
        self.local_id
    }

    /// The full identifier as given
    pub fn as_str(&self) -> &'a str {
        self.raw
    }

}

impl fmt::Display for ExperimentId<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.raw)
    }
}
