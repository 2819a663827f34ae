//! Newtype wrappers for string identifiers.
//!
//! Both newtypes serialize as plain strings so they can be written directly
//! into the JSON handed back to the orchestrator.

use crate::RequestError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;

macro_rules! string_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Return the inner string as a slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume self and return the inner `String`.
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl Deref for $name {
            type Target = str;
            fn deref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }
    };
}

string_newtype!(
    /// Lowercase 64-character hex SHA-256 digest of a build's input files.
    BuildHash
);

impl BuildHash {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }
}

string_newtype!(
    /// Identifier of a target function runtime, e.g. `python3.12`.
    ///
    /// The value is interpolated into a container image reference, so only
    /// ASCII alphanumerics and `.`, `-`, `_` are accepted.
    RuntimeId
);

impl RuntimeId {
    pub fn parse(s: &str) -> Result<Self, RequestError> {
        let valid = !s.is_empty()
            && s
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'));
        if valid {
            Ok(Self(s.to_owned()))
        } else {
            Err(RequestError::InvalidRuntime(s.to_owned()))
        }
    }
}
