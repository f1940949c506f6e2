//! Pull channel: one step of the boot-time sweep.
//!
//! The sweep itself (fetching, pacing, ordering) is driven by `lamp-bridge`.
//! This module decides what a fetched body means for the requested actuator
//! and collects the per-item outcomes into a [`PullReport`].

use lamp_types::{decode, pull_content, DecodeError, EnvelopeError, ExternalId, StateRecord};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::actuator::Transition;
use crate::engine::{Channel, Disposition, Reconciler};

/// One actuator to fetch at boot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullTarget {
    /// Actuator the fetch is for.
    pub external_id: ExternalId,
    /// URL of its latest content instance.
    pub url: String,
}

/// How to treat a pulled record whose embedded identifier differs from the
/// identifier that was requested.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IdentityPolicy {
    /// Skip the item as [`SkipReason::IdentifierMismatch`].
    #[default]
    Strict,
    /// Apply the token to the requested actuator whatever the payload says.
    TrustPosition,
}

/// Why a pulled item did not change state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// The fetch collaborator failed or returned a non-success status.
    Transport {
        /// Collaborator error text.
        error: String,
    },
    /// Body was not valid JSON.
    InvalidEnvelope,
    /// Body had no `m2m:cin.con` string.
    MissingField,
    /// `con` was shorter than four characters.
    Truncated {
        /// Length in characters.
        len: usize,
    },
    /// Decoded identifier is not registered.
    UnknownIdentifier {
        /// The identifier found in the payload.
        found: ExternalId,
    },
    /// Token was neither `ON` nor `OFF`.
    UnrecognizedToken {
        /// Trimmed token text.
        raw: String,
    },
    /// Payload named a different actuator than the one requested.
    IdentifierMismatch {
        /// The identifier found in the payload.
        found: ExternalId,
    },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport { error } => write!(f, "fetch failed: {error}"),
            Self::InvalidEnvelope => f.write_str("invalid JSON"),
            Self::MissingField => f.write_str("missing 'con' field"),
            Self::Truncated { len } => write!(f, "payload truncated ({len} chars)"),
            Self::UnknownIdentifier { found } => write!(f, "unknown identifier {found}"),
            Self::UnrecognizedToken { raw } => write!(f, "unrecognized token {raw:?}"),
            Self::IdentifierMismatch { found } => write!(f, "payload is for {found}"),
        }
    }
}

/// Outcome of one pulled item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ItemOutcome {
    /// State was applied (possibly already matching).
    Applied {
        /// The transition.
        transition: Transition,
    },
    /// Item was skipped.
    Skipped {
        /// Why.
        #[serde(flatten)]
        reason: SkipReason,
    },
}

impl ItemOutcome {
    /// Build the outcome for a fetch collaborator failure.
    pub fn transport_failure(error: impl fmt::Display) -> Self {
        Self::Skipped {
            reason: SkipReason::Transport {
                error: error.to_string(),
            },
        }
    }

    fn skipped(reason: SkipReason) -> Self {
        Self::Skipped { reason }
    }
}

/// Outcome for one actuator in the sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PullItem {
    /// Actuator that was fetched.
    pub external_id: ExternalId,
    /// What happened.
    #[serde(flatten)]
    pub outcome: ItemOutcome,
}

/// Per-item results of a full sweep, in the order processed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PullReport {
    /// Items in processing order.
    pub items: Vec<PullItem>,
}

impl PullReport {
    /// Create an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one item.
    pub fn record(&mut self, external_id: ExternalId, outcome: ItemOutcome) {
        self.items.push(PullItem {
            external_id,
            outcome,
        });
    }

    /// Number of items whose state was applied.
    pub fn applied(&self) -> usize {
        self.items
            .iter()
            .filter(|i| matches!(i.outcome, ItemOutcome::Applied { .. }))
            .count()
    }

    /// Number of items that actually moved an output.
    pub fn changed(&self) -> usize {
        self.items
            .iter()
            .filter(|i| {
                matches!(i.outcome, ItemOutcome::Applied { transition } if transition.is_change())
            })
            .count()
    }

    /// Number of skipped items.
    pub fn skipped(&self) -> usize {
        self.items.len() - self.applied()
    }

    /// Number of items lost to fetch failures.
    pub fn transport_failures(&self) -> usize {
        self.items
            .iter()
            .filter(|i| {
                matches!(
                    i.outcome,
                    ItemOutcome::Skipped {
                        reason: SkipReason::Transport { .. }
                    }
                )
            })
            .count()
    }
}

impl Reconciler {
    /// Apply one fetched pull body for the actuator `requested`.
    ///
    /// Every failure is absorbed into the returned [`ItemOutcome`]; nothing
    /// here aborts the sweep.
    pub fn apply_pulled(
        &self,
        requested: &ExternalId,
        body: &[u8],
        policy: IdentityPolicy,
    ) -> ItemOutcome {
        let con = match pull_content(body) {
            Ok(con) => con,
            Err(EnvelopeError::InvalidJson(e)) => {
                tracing::warn!("[pull] {}: JSON parsing error: {}", requested, e);
                return ItemOutcome::skipped(SkipReason::InvalidEnvelope);
            }
            Err(EnvelopeError::MissingContent { .. }) => {
                tracing::warn!("[pull] {}: response has no 'con' field", requested);
                return ItemOutcome::skipped(SkipReason::MissingField);
            }
        };
        tracing::debug!("[pull] {}: extracted con {:?}", requested, con);

        let record = match decode(&con) {
            Ok(record) => record,
            Err(DecodeError::Truncated { len }) => {
                tracing::warn!("[pull] {}: con {:?} too short to decode", requested, con);
                return ItemOutcome::skipped(SkipReason::Truncated { len });
            }
        };

        let record = if record.external_id == *requested {
            record
        } else {
            match policy {
                IdentityPolicy::Strict => {
                    tracing::warn!(
                        "[pull] {}: payload names {}, skipping",
                        requested,
                        record.external_id
                    );
                    return ItemOutcome::skipped(SkipReason::IdentifierMismatch {
                        found: record.external_id,
                    });
                }
                IdentityPolicy::TrustPosition => {
                    tracing::debug!(
                        "[pull] {}: payload names {}, applying by position",
                        requested,
                        record.external_id
                    );
                    StateRecord::new(requested.clone(), record.token)
                }
            }
        };

        match self.apply_record(&record, Channel::Pull) {
            Disposition::Applied { transition, .. } => ItemOutcome::Applied { transition },
            Disposition::UnknownIdentifier(found) => {
                ItemOutcome::skipped(SkipReason::UnknownIdentifier { found })
            }
            Disposition::UnrecognizedToken { raw, .. } => {
                ItemOutcome::skipped(SkipReason::UnrecognizedToken { raw })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::tests::{engine, id, H0, H1};
    use lamp_types::ContentResponse;

    fn body(con: &str) -> Vec<u8> {
        ContentResponse::new(con).to_bytes().unwrap()
    }

    #[test]
    fn applies_matching_record() {
        let (engine, driver) = engine();
        let outcome = engine.apply_pulled(&id("L001"), &body("L001ON"), IdentityPolicy::Strict);
        assert_eq!(
            outcome,
            ItemOutcome::Applied {
                transition: Transition::Changed { to: true }
            }
        );
        assert_eq!(driver.writes(), vec![(H1, true)]);
    }

    #[test]
    fn strict_policy_skips_mismatch() {
        let (engine, driver) = engine();
        let outcome = engine.apply_pulled(&id("L026"), &body("L001ON"), IdentityPolicy::Strict);
        assert_eq!(
            outcome,
            ItemOutcome::Skipped {
                reason: SkipReason::IdentifierMismatch { found: id("L001") }
            }
        );
        assert!(driver.writes().is_empty());
    }

    #[test]
    fn trust_position_applies_to_requested() {
        let (engine, driver) = engine();
        let outcome = engine.apply_pulled(
            &id("L026"),
            &body("L001ON"),
            IdentityPolicy::TrustPosition,
        );
        assert!(matches!(outcome, ItemOutcome::Applied { .. }));
        assert_eq!(driver.writes(), vec![(H0, true)]);
        assert_eq!(engine.state_of(&id("L001")), Some(false));
    }

    #[test]
    fn invalid_json_skips() {
        let (engine, _) = engine();
        let outcome = engine.apply_pulled(&id("L026"), b"<html>", IdentityPolicy::Strict);
        assert_eq!(
            outcome,
            ItemOutcome::Skipped {
                reason: SkipReason::InvalidEnvelope
            }
        );
    }

    #[test]
    fn missing_con_skips() {
        let (engine, _) = engine();
        let outcome = engine.apply_pulled(&id("L026"), br#"{"m2m:cin":{}}"#, IdentityPolicy::Strict);
        assert_eq!(
            outcome,
            ItemOutcome::Skipped {
                reason: SkipReason::MissingField
            }
        );
    }

    #[test]
    fn truncated_payload_skips() {
        let (engine, driver) = engine();
        let outcome = engine.apply_pulled(&id("L026"), &body("ON"), IdentityPolicy::Strict);
        assert_eq!(
            outcome,
            ItemOutcome::Skipped {
                reason: SkipReason::Truncated { len: 2 }
            }
        );
        assert!(driver.writes().is_empty());
    }

    #[test]
    fn unrecognized_token_skips() {
        let (engine, _) = engine();
        let outcome = engine.apply_pulled(&id("L026"), &body("L026 50%"), IdentityPolicy::Strict);
        assert_eq!(
            outcome,
            ItemOutcome::Skipped {
                reason: SkipReason::UnrecognizedToken { raw: "50%".into() }
            }
        );
    }

    #[test]
    fn unknown_identifier_under_trust_position() {
        let (engine, _) = engine();
        let outcome = engine.apply_pulled(
            &id("L999"),
            &body("L999ON"),
            IdentityPolicy::TrustPosition,
        );
        assert_eq!(
            outcome,
            ItemOutcome::Skipped {
                reason: SkipReason::UnknownIdentifier { found: id("L999") }
            }
        );
    }

    #[test]
    fn report_counts() {
        let mut report = PullReport::new();
        report.record(
            id("L026"),
            ItemOutcome::Applied {
                transition: Transition::Changed { to: true },
            },
        );
        report.record(
            id("L001"),
            ItemOutcome::Applied {
                transition: Transition::Unchanged { level: false },
            },
        );
        report.record(id("L002"), ItemOutcome::transport_failure("HTTP 404"));

        assert_eq!(report.applied(), 2);
        assert_eq!(report.changed(), 1);
        assert_eq!(report.skipped(), 1);
        assert_eq!(report.transport_failures(), 1);
    }

    #[test]
    fn report_serializes_flat() {
        let mut report = PullReport::new();
        report.record(id("L002"), ItemOutcome::transport_failure("timeout"));
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "items": [{
                    "external_id": "L002",
                    "outcome": "skipped",
                    "reason": "transport",
                    "error": "timeout"
                }]
            })
        );
    }

    #[test]
    fn policy_deserializes_kebab_case() {
        let policy: IdentityPolicy = serde_json::from_str("\"trust-position\"").unwrap();
        assert_eq!(policy, IdentityPolicy::TrustPosition);
        assert_eq!(IdentityPolicy::default(), IdentityPolicy::Strict);
    }
}
