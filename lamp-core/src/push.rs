//! Push channel: notifications delivered by the platform.
//!
//! [`Reconciler::handle_notification`] never fails. Envelope problems come
//! back as [`PushOutcome::Rejected`]; everything past the envelope, including
//! payloads that decode to nothing actionable, is [`PushOutcome::Accepted`].

use lamp_types::{decode, push_content, DecodeError, EnvelopeError};

use crate::engine::{Channel, Disposition, Reconciler};

/// Why a notification was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Body is not valid JSON.
    InvalidEnvelope,
    /// Body has no `m2m:sgn.m2m:nev.m2m:rep.m2m:cin.con` string.
    MissingField,
}

/// Result of handling one notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushOutcome {
    /// Notification was taken. `None` when `con` was too short to decode.
    Accepted(Option<Disposition>),
    /// Notification was refused.
    Rejected(RejectReason),
}

impl PushOutcome {
    /// Whether the notification was accepted.
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted(_))
    }

    /// Whether an output actually moved.
    pub fn changed_output(&self) -> bool {
        matches!(
            self,
            Self::Accepted(Some(Disposition::Applied { transition, .. })) if transition.is_change()
        )
    }
}

impl Reconciler {
    /// Handle one raw notification body.
    pub fn handle_notification(&self, body: &[u8]) -> PushOutcome {
        let con = match push_content(body) {
            Ok(con) => con,
            Err(EnvelopeError::InvalidJson(e)) => {
                tracing::warn!("[push] JSON parse failed: {}", e);
                return PushOutcome::Rejected(RejectReason::InvalidEnvelope);
            }
            Err(EnvelopeError::MissingContent { .. }) => {
                tracing::warn!("[push] 'con' field not found");
                return PushOutcome::Rejected(RejectReason::MissingField);
            }
        };
        tracing::debug!("[push] received con {:?}", con);

        match decode(&con) {
            Ok(record) => PushOutcome::Accepted(Some(self.apply_record(&record, Channel::Push))),
            Err(DecodeError::Truncated { len }) => {
                tracing::warn!("[push] con {:?} too short to decode ({} chars)", con, len);
                PushOutcome::Accepted(None)
            }
        }
    }
}
