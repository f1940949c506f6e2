//! Reconciliation Engine.
//!
//! The [`Reconciler`] owns the registry and the actuator bank for the life of
//! the process. Every mutation, from either channel, goes through
//! [`Reconciler::apply_record`] under one lock, so at most one
//! decode-and-apply is in flight at any instant.

use lamp_types::{encode, ActuatorHandle, ExternalId, StateRecord, StateToken};
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::actuator::{ActuatorBank, ActuatorState, OutputDriver, Transition};
use crate::registry::IdentifierRegistry;

/// Which synchronization channel delivered a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// Boot-time bulk fetch.
    Pull,
    /// Server-initiated notification.
    Push,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pull => f.write_str("pull"),
            Self::Push => f.write_str("push"),
        }
    }
}

/// What happened when a decoded record was offered to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// The record resolved and its level was applied.
    Applied {
        /// Identifier from the record.
        external_id: ExternalId,
        /// Resolved output line.
        handle: ActuatorHandle,
        /// Whether the output moved.
        transition: Transition,
    },
    /// No actuator is registered under this identifier.
    UnknownIdentifier(ExternalId),
    /// The token was neither `ON` nor `OFF`.
    UnrecognizedToken {
        /// Identifier from the record.
        external_id: ExternalId,
        /// Trimmed token text.
        raw: String,
    },
}

/// Owner of all actuator state.
pub struct Reconciler {
    registry: IdentifierRegistry,
    bank: Mutex<ActuatorBank>,
}

impl fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reconciler")
            .field("actuators", &self.registry.len())
            .finish_non_exhaustive()
    }
}

impl Reconciler {
    /// Create the engine. Every registered output is driven low.
    pub fn new(registry: IdentifierRegistry, driver: Box<dyn OutputDriver>) -> Self {
        let bank = ActuatorBank::new(registry.iter().map(|b| b.handle), driver);
        let ids: Vec<&str> = registry.ids().map(ExternalId::as_str).collect();
        tracing::info!("Reconciler ready, all low: {}", ids.join(", "));
        Self {
            registry,
            bank: Mutex::new(bank),
        }
    }

    /// The identifier registry.
    pub fn registry(&self) -> &IdentifierRegistry {
        &self.registry
    }

    /// Apply a decoded record.
    ///
    /// Unknown identifiers and unrecognized tokens are logged and leave every
    /// output untouched.
    pub fn apply_record(&self, record: &StateRecord, channel: Channel) -> Disposition {
        let Some(handle) = self.registry.resolve(&record.external_id) else {
            tracing::warn!(
                "[{}] unknown identifier {:?}, ignoring",
                channel,
                record.external_id.as_str()
            );
            return Disposition::UnknownIdentifier(record.external_id.clone());
        };

        let level = match &record.token {
            StateToken::On => true,
            StateToken::Off => false,
            StateToken::Unrecognized(raw) => {
                tracing::warn!(
                    "[{}] {}: unrecognized state token {:?}, no change",
                    channel,
                    record.external_id,
                    raw
                );
                return Disposition::UnrecognizedToken {
                    external_id: record.external_id.clone(),
                    raw: raw.clone(),
                };
            }
        };

        let transition = self.lock_bank().apply(handle, level);
        match transition {
            Transition::Changed { to } => {
                let applied = StateRecord::new(record.external_id.clone(), StateToken::from(to));
                tracing::info!("[{}] {} applied to {}", channel, encode(&applied), handle)
            }
            Transition::Unchanged { level } => tracing::debug!(
                "[{}] {} on {} already {}",
                channel,
                record.external_id,
                handle,
                StateToken::from(level)
            ),
        }

        Disposition::Applied {
            external_id: record.external_id.clone(),
            handle,
            transition,
        }
    }

    /// Last applied level for an identifier.
    pub fn state_of(&self, external_id: &ExternalId) -> Option<bool> {
        let handle = self.registry.resolve(external_id)?;
        self.lock_bank().level(handle)
    }

    /// Current state of every actuator, in configuration order.
    pub fn snapshot(&self) -> Vec<ActuatorState> {
        let bank = self.lock_bank();
        self.registry
            .iter()
            .map(|binding| ActuatorState {
                external_id: binding.external_id.clone(),
                handle: binding.handle,
                state: bank.level(binding.handle).unwrap_or(false),
            })
            .collect()
    }

    fn lock_bank(&self) -> MutexGuard<'_, ActuatorBank> {
        // Levels are plain bools, so a poisoned lock is still usable.
        self.bank.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
