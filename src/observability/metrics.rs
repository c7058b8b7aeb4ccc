//! # Metrics Collection
//!
//! Counters and histograms for bundle provisioning, recorded through the
//! `metrics` facade. No exporter is installed here; the embedding process
//! decides where they go.

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use std::sync::Once;

static DESCRIBE: Once = Once::new();

/// Metrics recorder for workflow and key-manager activity
#[derive(Debug, Clone)]
pub struct MetricsRecorder;

impl MetricsRecorder {
    /// Create a new metrics recorder instance
    pub fn new() -> Self {
        DESCRIBE.call_once(register_metrics);
        Self
    }

    /// Record the terminal outcome of one `submit()`
    pub fn record_workflow_outcome(&self, outcome: &str, duration: f64) {
        let labels = [("outcome", outcome.to_string())];
        counter!("certbundle_workflows_total", &labels).increment(1);
        histogram!("certbundle_workflow_duration_seconds", &labels).record(duration);
    }

    /// Record one secret-creation call made by the workflow
    pub fn record_secret_call(&self, role: &str, success: bool) {
        let status = if success { "success" } else { "error" };
        let labels = [("role", role.to_string()), ("status", status.to_string())];
        counter!("certbundle_secret_calls_total", &labels).increment(1);
    }

    /// Record a key-manager API call
    pub fn record_store_call(&self, operation: &str, success: bool) {
        let status = if success { "success" } else { "error" };
        let labels = [("operation", operation.to_string()), ("status", status.to_string())];
        counter!("certbundle_store_calls_total", &labels).increment(1);
    }

    /// Record secrets that were left behind by a failed workflow
    pub fn record_orphaned_secrets(&self, count: usize) {
        if count > 0 {
            counter!("certbundle_orphaned_secrets_total").increment(count as u64);
        }
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}

fn register_metrics() {
    describe_counter!(
        "certbundle_workflows_total",
        Unit::Count,
        "Certificate bundle workflows by terminal outcome"
    );
    describe_histogram!(
        "certbundle_workflow_duration_seconds",
        Unit::Seconds,
        "Time from submit to terminal state"
    );
    describe_counter!(
        "certbundle_secret_calls_total",
        Unit::Count,
        "Secret creation calls issued by the workflow"
    );
    describe_counter!("certbundle_store_calls_total", Unit::Count, "Key manager API calls");
    describe_counter!(
        "certbundle_orphaned_secrets_total",
        Unit::Count,
        "Secrets created by workflows that did not produce a container"
    );
}
