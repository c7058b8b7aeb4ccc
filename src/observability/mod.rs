//! # Observability Infrastructure
//!
//! Structured logging and metrics for the certificate workflow and the
//! key-manager client.

pub mod logging;
pub mod metrics;

pub use logging::{init_logging, log_config_info};
pub use metrics::MetricsRecorder;
