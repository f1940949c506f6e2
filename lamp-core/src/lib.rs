//! # lamp-core
//!
//! Reconciliation logic for lampsync (no network I/O, instant tests).
//!
//! This crate owns the state that both synchronization channels write to:
//! - [`IdentifierRegistry`] maps platform identifiers to output lines
//! - [`ActuatorBank`] is the idempotent facade over an [`OutputDriver`]
//! - [`Reconciler`] ties the two together behind a single mutation lock
//!
//! Both channels enter through the [`Reconciler`]:
//! - [`Reconciler::apply_pulled`] handles one item of the boot-time sweep
//! - [`Reconciler::handle_notification`] handles one pushed notification
//!
//! Fetching, pacing and the HTTP boundary live in `lamp-bridge`, which
//! drives these entry points.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod actuator;
pub mod engine;
pub mod pull;
pub mod push;
pub mod registry;

pub use actuator::{ActuatorBank, ActuatorState, OutputDriver, RecordingDriver, Transition};
pub use engine::{Channel, Disposition, Reconciler};
pub use pull::{IdentityPolicy, ItemOutcome, PullItem, PullReport, PullTarget, SkipReason};
pub use push::{PushOutcome, RejectReason};
pub use registry::{Binding, IdentifierRegistry, RegistryError};
