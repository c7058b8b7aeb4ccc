//! # Structured Logging
//!
//! Subscriber setup and span macros. Logs go to stderr so command output on
//! stdout stays machine-readable; `--json` style output switches the
//! subscriber to one JSON object per line.

use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::{AppConfig, ObservabilityConfig};
use crate::errors::{Error, Result};

/// Create a tracing span for one workflow invocation.
///
/// Every span carries a fresh `workflow_id`; extra fields may follow:
///
/// ```rust,ignore
/// let span = workflow_span!("submit", "web.example.com");
/// let span = workflow_span!("submit", "web.example.com", dry_run = true);
/// ```
#[macro_export]
macro_rules! workflow_span {
    ($operation:expr, $certificate:expr) => {
        tracing::info_span!(
            "certificate_workflow",
            operation = %$operation,
            certificate = %$certificate,
            workflow_id = %uuid::Uuid::new_v4()
        )
    };
    ($operation:expr, $certificate:expr, $($field:tt)*) => {
        tracing::info_span!(
            "certificate_workflow",
            operation = %$operation,
            certificate = %$certificate,
            workflow_id = %uuid::Uuid::new_v4(),
            $($field)*
        )
    };
}

/// Install the global subscriber.
///
/// `RUST_LOG` wins over the configured level; `verbose` raises the configured
/// level to `debug`. Installing twice is not an error.
pub fn init_logging(config: &ObservabilityConfig, verbose: bool) -> Result<()> {
    let default_level = if verbose { "debug" } else { config.log_level.as_str() };
    let filter = match std::env::var("RUST_LOG") {
        Ok(value) if !value.is_empty() => EnvFilter::try_new(value),
        _ => EnvFilter::try_new(default_level),
    }
    .map_err(|e| Error::config(format!("invalid log filter: {e}")))?;

    let builder = fmt().with_env_filter(filter).with_writer(std::io::stderr);
    let installed = if config.json_logging {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    match installed {
        Ok(()) => debug!("Logging initialized"),
        Err(e) => debug!(error = %e, "Global subscriber already set, keeping it"),
    }
    Ok(())
}

/// Log configuration at startup
pub fn log_config_info(config: &AppConfig) {
    tracing::debug!(
        key_manager = %config.key_manager.endpoint,
        project_id = ?config.key_manager.project_id,
        timeout_seconds = config.key_manager.timeout_seconds,
        identity_endpoint = ?config.catalog.identity_endpoint,
        enabled_services = ?config.catalog.enabled_services,
        "certbundle configuration"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_macros_compile() {
        let _span = workflow_span!("submit", "web");
        let _span = workflow_span!("submit", "web", dry_run = true);
    }

    #[test]
    fn test_log_config_info() {
        log_config_info(&AppConfig::default());
    }
}
