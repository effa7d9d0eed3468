//! Subject identity as seen by the token subsystem.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of the principal a token represents
///
/// Account ids are numeric in the user store but travel as strings inside
/// the signed envelope, so the subsystem keeps them opaque.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectId(String);

impl SubjectId {
    /// Creates a subject id from any string-like value
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

macro_rules! subject_id_from_integer {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for SubjectId {
                fn from(id: $ty) -> Self {
                    Self(id.to_string())
                }
            }
        )*
    };
}

subject_id_from_integer!(i32, i64, u32, u64);

impl From<&str> for SubjectId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for SubjectId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Minimal view of a user account needed to honour a token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    /// Account identifier
    pub id: SubjectId,

    /// Whether the account may still authenticate
    pub is_active: bool,
}

impl Subject {
    /// Creates an active subject
    pub fn active(id: impl Into<SubjectId>) -> Self {
        Self {
            id: id.into(),
            is_active: true,
        }
    }

    /// Creates a deactivated subject
    pub fn inactive(id: impl Into<SubjectId>) -> Self {
        Self {
            id: id.into(),
            is_active: false,
        }
    }
}
