//! Prometheus metrics endpoint.

use crate::server::Bridge;
use axum::{http::header::CONTENT_TYPE, response::IntoResponse, Extension};
use std::fmt::Write;
use std::sync::atomic::Ordering;
use std::sync::Arc;

/// Prometheus metrics handler.
///
/// Returns metrics in Prometheus text format: counters since startup plus
/// one gauge per actuator holding its last applied level.
pub async fn metrics_handler(Extension(bridge): Extension<Arc<Bridge>>) -> impl IntoResponse {
    let m = bridge.metrics();

    let accepted = m.notifications_accepted.load(Ordering::Relaxed);
    let rejected = m.notifications_rejected.load(Ordering::Relaxed);
    let transitions = m.transitions_total.load(Ordering::Relaxed);
    let pull_applied = m.pull_applied.load(Ordering::Relaxed);
    let pull_skipped = m.pull_skipped.load(Ordering::Relaxed);
    let fetch_failures = m.fetch_failures.load(Ordering::Relaxed);

    let mut body = format!(
        r#"# HELP lampsync_info Bridge information
# TYPE lampsync_info gauge
lampsync_info{{version="{version}"}} 1

# HELP lampsync_notifications_accepted_total Notifications answered with 200
# TYPE lampsync_notifications_accepted_total counter
lampsync_notifications_accepted_total {accepted}

# HELP lampsync_notifications_rejected_total Notifications answered with 400
# TYPE lampsync_notifications_rejected_total counter
lampsync_notifications_rejected_total {rejected}

# HELP lampsync_transitions_total Output level changes from either channel
# TYPE lampsync_transitions_total counter
lampsync_transitions_total {transitions}

# HELP lampsync_pull_applied_total Boot items whose state was applied
# TYPE lampsync_pull_applied_total counter
lampsync_pull_applied_total {pull_applied}

# HELP lampsync_pull_skipped_total Boot items skipped
# TYPE lampsync_pull_skipped_total counter
lampsync_pull_skipped_total {pull_skipped}

# HELP lampsync_fetch_failures_total Boot fetches that failed
# TYPE lampsync_fetch_failures_total counter
lampsync_fetch_failures_total {fetch_failures}

# HELP lampsync_actuator_state Last applied level (1 = on)
# TYPE lampsync_actuator_state gauge
"#,
        version = env!("CARGO_PKG_VERSION"),
    );

    for actuator in bridge.engine().snapshot() {
        let _ = writeln!(
            body,
            "lampsync_actuator_state{{id=\"{}\",gpio=\"{}\"}} {}",
            escape_label(actuator.external_id.as_str()),
            actuator.handle.line(),
            u8::from(actuator.state)
        );
    }

    (
        [(CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        body,
    )
}

/// Escape a Prometheus label value (backslash, double quote, newline).
fn escape_label(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            c => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_values_are_escaped() {
        assert_eq!(escape_label("L026"), "L026");
        assert_eq!(escape_label(r#"L"\1"#), r#"L\"\\1"#);
        assert_eq!(escape_label("L\n01"), "L\\n01");
    }
}
