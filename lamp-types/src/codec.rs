//! State Codec - the compact `con` encoding.
//!
//! The platform packs an actuator identifier and its desired state into a
//! single string with no delimiter: the first four characters are the
//! identifier, the trimmed remainder is the state token.
//!
//! ```text
//! "L026   OFF"  ->  StateRecord { external_id: "L026", token: Off }
//! "L001ON"      ->  StateRecord { external_id: "L001", token: On }
//! ```
//!
//! Both the pull and the push channel decode through [`decode`]; nothing else
//! in the workspace splits a payload.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{DecodeError, ExternalId, EXTERNAL_ID_LEN};

/// Normalized state token carried after the identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StateToken {
    /// Exact `ON`.
    On,
    /// Exact `OFF`.
    Off,
    /// Anything else. Holds the trimmed text for diagnostics.
    Unrecognized(String),
}

impl StateToken {
    /// Classify an already-trimmed token. Matching is exact and case-sensitive.
    pub fn classify(raw: &str) -> Self {
        match raw {
            "ON" => Self::On,
            "OFF" => Self::Off,
            other => Self::Unrecognized(other.to_string()),
        }
    }

    /// The output level this token asks for, or `None` if it is not actionable.
    pub fn level(&self) -> Option<bool> {
        match self {
            Self::On => Some(true),
            Self::Off => Some(false),
            Self::Unrecognized(_) => None,
        }
    }

    /// Text form of the token as it appears on the wire.
    pub fn as_str(&self) -> &str {
        match self {
            Self::On => "ON",
            Self::Off => "OFF",
            Self::Unrecognized(raw) => raw,
        }
    }
}

impl From<bool> for StateToken {
    fn from(level: bool) -> Self {
        if level {
            Self::On
        } else {
            Self::Off
        }
    }
}

impl fmt::Display for StateToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The decoded form of one `con` payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StateRecord {
    /// Identifier taken verbatim from the first four characters.
    pub external_id: ExternalId,
    /// Classified state token.
    pub token: StateToken,
}

impl StateRecord {
    /// Create a record.
    pub fn new(external_id: ExternalId, token: StateToken) -> Self {
        Self { external_id, token }
    }
}

impl fmt::Display for StateRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.external_id, self.token)
    }
}

/// Decode a compact `con` payload.
///
/// # Errors
///
/// Returns [`DecodeError::Truncated`] if the payload has fewer than four
/// characters. An unknown token is not an error; it decodes to
/// [`StateToken::Unrecognized`].
pub fn decode(payload: &str) -> Result<StateRecord, DecodeError> {
    let split = match payload.char_indices().nth(EXTERNAL_ID_LEN) {
        Some((idx, _)) => idx,
        None => {
            let len = payload.chars().count();
            if len < EXTERNAL_ID_LEN {
                return Err(DecodeError::Truncated { len });
            }
            payload.len()
        }
    };

    let (id, rest) = payload.split_at(split);
    Ok(StateRecord {
        external_id: ExternalId::from_prefix(id),
        token: StateToken::classify(rest.trim()),
    })
}

/// Encode a record back into its compact form (`<id><token>`).
pub fn encode(record: &StateRecord) -> String {
    format!("{}{}", record.external_id, record.token)
}
