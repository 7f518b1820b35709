// ABOUTME: Prometheus metrics initialization and counter helpers
// ABOUTME: Tracks classified messages, session lifecycle, and presence poll failures

use anyhow::{Context, Result};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus recorder and return a handle for the /metrics
/// endpoint. Call once at startup.
pub fn init_metrics() -> Result<PrometheusHandle> {
    PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus recorder")
}

pub fn record_message_classified(intent: &'static str) {
    metrics::counter!("burpla_messages_classified_total", "intent" => intent).increment(1);
}

pub fn record_session_created() {
    metrics::counter!("burpla_sessions_created_total").increment(1);
}

pub fn record_session_join() {
    metrics::counter!("burpla_session_joins_total").increment(1);
}

pub fn record_presence_poll_failure() {
    metrics::counter!("burpla_presence_poll_failures_total").increment(1);
}
