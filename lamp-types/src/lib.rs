//! # lamp-types
//!
//! Wire format types for the lampsync bridge.
//!
//! This crate provides the foundational types used across all lampsync crates:
//! - [`ExternalId`], [`ActuatorHandle`] - Identity types for remote resources and local outputs
//! - [`StateToken`], [`StateRecord`] - The decoded form of a compact `con` payload
//! - [`decode`], [`encode`] - The State Codec shared by the pull and push channels
//! - [`ContentInstance`], [`Notification`] - oneM2M JSON envelopes
//! - [`DecodeError`], [`EnvelopeError`], [`IdError`] - Error types

#![warn(missing_docs)]
#![warn(clippy::all)]

mod codec;
mod envelope;
mod error;
mod ids;

pub use codec::{decode, encode, StateRecord, StateToken};
pub use envelope::{
    pull_content, push_content, ContentInstance, ContentResponse, Notification,
    PULL_CONTENT_PATH, PUSH_CONTENT_PATH,
};
pub use error::{DecodeError, EnvelopeError, IdError};
pub use ids::{ActuatorHandle, ExternalId, EXTERNAL_ID_LEN};
