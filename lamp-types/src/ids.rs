//! Identity types for lampsync.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::IdError;

/// Number of characters in an external resource identifier.
pub const EXTERNAL_ID_LEN: usize = 4;

/// A resource identifier assigned by the remote platform (e.g. `L026`).
///
/// Always exactly [`EXTERNAL_ID_LEN`] characters. Comparison is exact and
/// case-sensitive; no normalization is ever applied.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ExternalId(String);

impl ExternalId {
    /// Create an ExternalId, checking that it is exactly four characters.
    pub fn new(id: &str) -> Result<Self, IdError> {
        let len = id.chars().count();
        if len != EXTERNAL_ID_LEN {
            return Err(IdError::InvalidLength {
                id: id.to_string(),
                len,
            });
        }
        Ok(Self(id.to_string()))
    }

    /// Wrap a prefix the codec has already cut to four characters.
    pub(crate) fn from_prefix(prefix: &str) -> Self {
        debug_assert_eq!(prefix.chars().count(), EXTERNAL_ID_LEN);
        Self(prefix.to_string())
    }

    /// Get the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ExternalId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<ExternalId> for String {
    fn from(id: ExternalId) -> Self {
        id.0
    }
}

impl FromStr for ExternalId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for ExternalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for ExternalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ExternalId({})", self.0)
    }
}

/// Opaque handle for one physical output line (a GPIO number on the board).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActuatorHandle(u32);

impl ActuatorHandle {
    /// Create a handle for the given output line.
    pub const fn new(line: u32) -> Self {
        Self(line)
    }

    /// Get the output line number.
    pub const fn line(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for ActuatorHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GPIO{}", self.0)
    }
}

impl fmt::Debug for ActuatorHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ActuatorHandle({})", self.0)
    }
}
