use anyhow::Result;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

use crate::config::ObservabilityConfig;

/// Initialize structured logging.
///
/// `RUST_LOG` takes precedence over the configured level. JSON output carries
/// the current span and span list so correlation ids follow every event.
/// Logs go to stderr; stdout is reserved for command output.
pub fn init_telemetry(observability: &ObservabilityConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&observability.log_level));
    let registry = tracing_subscriber::registry().with(filter);

    if observability.json_logs {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()?;
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init()?;
    }

    tracing::debug!("workload lifecycle telemetry initialized");
    Ok(())
}

/// Generate a correlation ID for linking related operations
pub fn generate_correlation_id() -> String {
    Uuid::new_v4().to_string()
}

/// Create a span with common workload lifecycle attributes
pub fn create_lifecycle_span(
    operation: &str,
    workload_id: Option<&str>,
    dataplane_id: Option<&str>,
    correlation_id: Option<&str>,
) -> tracing::Span {
    tracing::info_span!(
        "workload_lifecycle",
        operation = operation,
        workload.id = workload_id,
        dataplane.id = dataplane_id,
        correlation.id = correlation_id,
        otel.kind = "internal"
    )
}
