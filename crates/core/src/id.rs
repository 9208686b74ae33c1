//! Strongly-typed identifiers used across the workspace.
//!
//! Records are keyed by database-style integer ids.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Identifier of a user account (also the subject of issued tokens).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(i64);

/// Identifier of a blog entry.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(i64);

/// Untyped reference to a protected resource, as named by a request parameter.
///
/// Ownership checks resolve this against a concrete store; the auth core never
/// interprets it beyond that.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(i64);

macro_rules! impl_int_newtype {
    ($t:ty, $name:literal) => {
        impl $t {
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<i64> for $t {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl From<$t> for i64 {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let value = i64::from_str(s.trim())
                    .map_err(|e| DomainError::invalid_id(format!("{}: {}", $name, e)))?;
                Ok(Self(value))
            }
        }
    };
}

impl_int_newtype!(UserId, "UserId");
impl_int_newtype!(EntryId, "EntryId");
impl_int_newtype!(ResourceId, "ResourceId");

impl From<UserId> for ResourceId {
    fn from(value: UserId) -> Self {
        Self(value.0)
    }
}

impl From<EntryId> for ResourceId {
    fn from(value: EntryId) -> Self {
        Self(value.0)
    }
}

impl From<ResourceId> for UserId {
    fn from(value: ResourceId) -> Self {
        Self(value.0)
    }
}

impl From<ResourceId> for EntryId {
    fn from(value: ResourceId) -> Self {
        Self(value.0)
    }
}
