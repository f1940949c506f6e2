//! Health check endpoint.

use crate::server::{BootSync, Bridge};
use axum::{Extension, Json};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

/// Global start time for uptime calculation.
static START_TIME: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();

/// Initialize the start time (call once at startup).
pub fn init_start_time() {
    START_TIME.get_or_init(Instant::now);
}

/// Health status response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    /// Overall status.
    pub status: String,
    /// Bridge version.
    pub version: String,
    /// Number of configured actuators.
    pub actuators: usize,
    /// Boot sweep state: `complete`, `skipped` or `pending`.
    pub boot_sync: String,
    /// Uptime in seconds.
    pub uptime_seconds: u64,
}

/// Health check handler.
pub async fn health_handler(Extension(bridge): Extension<Arc<Bridge>>) -> Json<HealthStatus> {
    let uptime = START_TIME
        .get()
        .map(|start| start.elapsed().as_secs())
        .unwrap_or(0);

    let boot_sync = match bridge.boot().map(|(state, _)| *state) {
        Some(BootSync::Complete) => "complete",
        Some(BootSync::Skipped) => "skipped",
        None => "pending",
    };

    Json(HealthStatus {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        actuators: bridge.engine().registry().len(),
        boot_sync: boot_sync.to_string(),
        uptime_seconds: uptime,
    })
}
