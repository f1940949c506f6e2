//! Boot-time pull sweep.
//!
//! Fetches each configured actuator's latest content instance, strictly one
//! at a time and in configuration order, pausing between fetches. Each fetched
//! body is handed to [`Reconciler::apply_pulled`]. A failed fetch is recorded
//! and the sweep moves on.

use crate::fetch::Fetcher;
use lamp_core::{IdentityPolicy, ItemOutcome, PullReport, PullTarget, Reconciler};
use std::sync::Arc;
use std::time::Duration;

/// Drives one sweep over the configured pull targets.
#[derive(Clone)]
pub struct PullSynchronizer {
    fetcher: Arc<dyn Fetcher>,
    pace: Duration,
    policy: IdentityPolicy,
}

impl std::fmt::Debug for PullSynchronizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PullSynchronizer")
            .field("pace", &self.pace)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl PullSynchronizer {
    /// Create a synchronizer.
    pub fn new(fetcher: Arc<dyn Fetcher>, pace: Duration, policy: IdentityPolicy) -> Self {
        Self {
            fetcher,
            pace,
            policy,
        }
    }

    /// Fetch and apply every target, in order.
    ///
    /// Never fails: every per-item problem is recorded in the report.
    pub async fn synchronize_all(&self, engine: &Reconciler, targets: &[PullTarget]) -> PullReport {
        tracing::info!("Boot sync: fetching {} actuators", targets.len());
        let mut report = PullReport::new();

        for (i, target) in targets.iter().enumerate() {
            if i > 0 && !self.pace.is_zero() {
                tokio::time::sleep(self.pace).await;
            }

            let outcome = match self.fetcher.get(&target.url).await {
                Ok(body) => engine.apply_pulled(&target.external_id, &body, self.policy),
                Err(e) => {
                    tracing::warn!("[pull] {}: {} ({})", target.external_id, e, target.url);
                    ItemOutcome::transport_failure(e)
                }
            };

            report.record(target.external_id.clone(), outcome);
        }

        tracing::info!(
            "Boot sync complete: {} applied ({} changed), {} skipped",
            report.applied(),
            report.changed(),
            report.skipped()
        );
        report
    }
}
