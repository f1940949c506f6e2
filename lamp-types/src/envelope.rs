//! oneM2M JSON envelopes that carry the compact `con` string.
//!
//! The pull channel reads the latest content instance of a container:
//!
//! ```json
//! { "m2m:cin": { "con": "L026ON", "rn": "cin_123", ... } }
//! ```
//!
//! The push channel receives a subscription notification that nests the same
//! content instance four levels deep:
//!
//! ```json
//! { "m2m:sgn": { "m2m:nev": { "m2m:rep": { "m2m:cin": { "con": "L026ON" } } } } }
//! ```
//!
//! Extraction navigates by JSON pointer so that unknown sibling fields and
//! unexpected shapes at any level degrade to [`EnvelopeError::MissingContent`]
//! rather than a parse failure.
//!
//! Only the first JSON document in a body is read; trailing bytes after it
//! are ignored. A scalar `con` (number or boolean) is taken in its JSON text
//! form, so `"con": 42` yields `"42"`. Null, object and array values count as
//! missing.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::EnvelopeError;

/// Location of `con` in a pull (GET latest) response body.
pub const PULL_CONTENT_PATH: &str = "/m2m:cin/con";

/// Location of `con` in a push notification body.
pub const PUSH_CONTENT_PATH: &str = "/m2m:sgn/m2m:nev/m2m:rep/m2m:cin/con";

/// Extract the `con` string from a pull response body.
pub fn pull_content(body: &[u8]) -> Result<String, EnvelopeError> {
    extract(body, PULL_CONTENT_PATH)
}

/// Extract the `con` string from a push notification body.
pub fn push_content(body: &[u8]) -> Result<String, EnvelopeError> {
    extract(body, PUSH_CONTENT_PATH)
}

fn extract(body: &[u8], path: &'static str) -> Result<String, EnvelopeError> {
    let mut de = serde_json::Deserializer::from_slice(body);
    let doc = Value::deserialize(&mut de).map_err(EnvelopeError::InvalidJson)?;

    match doc.pointer(path) {
        Some(Value::String(con)) => Ok(con.clone()),
        Some(scalar @ (Value::Number(_) | Value::Bool(_))) => Ok(scalar.to_string()),
        _ => Err(EnvelopeError::MissingContent { path }),
    }
}

/// A oneM2M content instance (`m2m:cin`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentInstance {
    /// The content string.
    pub con: String,
    /// Resource name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rn: Option<String>,
    /// Resource identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ri: Option<String>,
    /// Creation time (oneM2M basic format, e.g. `20241017T101500`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ct: Option<String>,
}

impl ContentInstance {
    /// Create a content instance holding only `con`.
    pub fn new(con: impl Into<String>) -> Self {
        Self {
            con: con.into(),
            rn: None,
            ri: None,
            ct: None,
        }
    }
}

/// Body returned by a GET on a container's latest instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentResponse {
    /// The content instance.
    #[serde(rename = "m2m:cin")]
    pub cin: ContentInstance,
}

impl ContentResponse {
    /// Wrap a `con` string in a pull response body.
    pub fn new(con: impl Into<String>) -> Self {
        Self {
            cin: ContentInstance::new(con),
        }
    }

    /// Serialize to JSON bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, EnvelopeError> {
        serde_json::to_vec(self).map_err(EnvelopeError::InvalidJson)
    }
}

/// A subscription notification (`m2m:sgn`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Notification body.
    #[serde(rename = "m2m:sgn")]
    pub sgn: NotificationBody,
}

/// Contents of `m2m:sgn`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationBody {
    /// Notification event.
    #[serde(rename = "m2m:nev")]
    pub nev: NotificationEvent,
    /// Subscription reference that triggered the notification.
    #[serde(rename = "m2m:sur", default, skip_serializing_if = "Option::is_none")]
    pub sur: Option<String>,
}

/// Contents of `m2m:nev`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationEvent {
    /// Representation of the changed resource.
    #[serde(rename = "m2m:rep")]
    pub rep: Representation,
    /// Notification event type (3 = create of direct child).
    #[serde(rename = "m2m:net", default, skip_serializing_if = "Option::is_none")]
    pub net: Option<u8>,
}

/// Contents of `m2m:rep`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Representation {
    /// The new content instance.
    #[serde(rename = "m2m:cin")]
    pub cin: ContentInstance,
}

impl Notification {
    /// Wrap a `con` string in a push notification body.
    pub fn new(con: impl Into<String>) -> Self {
        Self {
            sgn: NotificationBody {
                nev: NotificationEvent {
                    rep: Representation {
                        cin: ContentInstance::new(con),
                    },
                    net: Some(3),
                },
                sur: None,
            },
        }
    }

    /// Serialize to JSON bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, EnvelopeError> {
        serde_json::to_vec(self).map_err(EnvelopeError::InvalidJson)
    }
}
