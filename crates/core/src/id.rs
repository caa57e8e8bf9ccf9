// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Prefixed random identifiers for envelopes and connections.

use smol_str::SmolStr;

/// Random part of a generated id. With a 4 character prefix the whole id is
/// 23 bytes, which `SmolStr` stores inline.
const RANDOM_LEN: usize = 19;

fn generate(prefix: &str) -> SmolStr {
    let mut id = String::with_capacity(prefix.len() + RANDOM_LEN);
    id.push_str(prefix);
    id.push_str(&nanoid::nanoid!(RANDOM_LEN));
    SmolStr::new(id)
}

/// Declare a string id newtype.
///
/// `new()` generates `{prefix}{random}`. Ids parsed from the wire are kept
/// as-is, so peers that use other id schemes still round-trip.
macro_rules! prefixed_id {
    ($(#[$meta:meta])* $name:ident => $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[derive(serde::Serialize, serde::Deserialize)]
        #[serde(transparent)]
        pub struct $name(SmolStr);

        impl $name {
            pub const PREFIX: &'static str = $prefix;

            pub fn new() -> Self {
                Self(generate(Self::PREFIX))
            }

            /// Wrap an id received from elsewhere.
            pub fn from_string(id: impl Into<SmolStr>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// The random part, or the whole id if it lacks our prefix.
            pub fn suffix(&self) -> &str {
                self.0.strip_prefix(Self::PREFIX).unwrap_or(&self.0)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self::from_string(id)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self::from_string(id)
            }
        }

        impl std::ops::Deref for $name {
            type Target = str;

            fn deref(&self) -> &str {
                &self.0
            }
        }

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }
    };
}

prefixed_id! {
    /// Unique identifier of one envelope, assigned at construction.
    MessageId => "msg-"
}

prefixed_id! {
    /// Server-assigned identifier of one attached socket connection.
    ClientId => "cli-"
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
