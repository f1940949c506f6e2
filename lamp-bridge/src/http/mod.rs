//! HTTP endpoints for lampsync-bridge.
//!
//! Provides the push notification endpoint plus health, metrics and an
//! actuator listing for operators.

pub mod health;
mod metrics;
pub mod notify;

use crate::server::Bridge;
use axum::{
    routing::{get, post},
    Extension, Json, Router,
};
use lamp_core::ActuatorState;
use std::sync::Arc;

pub use health::HealthStatus;

/// Build the HTTP router with all endpoints.
pub fn build_router(bridge: Arc<Bridge>) -> Router {
    health::init_start_time();

    let mut router = Router::new()
        .route(
            &bridge.config().server.notify_path,
            post(notify::notify_handler),
        )
        .route("/health", get(health::health_handler))
        .route("/actuators", get(actuators_handler));

    if bridge.config().http.metrics_enabled {
        router = router.route("/metrics", get(metrics::metrics_handler));
    }

    router.layer(Extension(bridge))
}

/// Current state of every actuator.
async fn actuators_handler(Extension(bridge): Extension<Arc<Bridge>>) -> Json<Vec<ActuatorState>> {
    Json(bridge.engine().snapshot())
}
