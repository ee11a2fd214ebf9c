//! Structured logging configuration.
//!
//! The library logs through the `log` facade; the subscriber installed here
//! also receives those records, so one filter covers both.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "info,sqlx=warn,hyper=warn";

/// Initialize structured logging
///
/// Log levels are configurable via the `RUST_LOG` env var.
///
/// # Example
///
/// ```no_run
/// use tourney_server::logging;
///
/// #[tokio::main]
/// async fn main() {
///     logging::init();
///     tracing::info!("Server starting");
/// }
/// ```
pub fn init() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    // Console layer for development
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::info!("Structured logging initialized");
}

/// Log API request/response
///
/// # Arguments
///
/// * `method` - HTTP method
/// * `path` - Request path
/// * `status_code` - Response status code
/// * `duration_ms` - Request duration in milliseconds
/// * `request_id` - Correlation id of the request
///
pub fn log_api_request(
    method: &str,
    path: &str,
    status_code: u16,
    duration_ms: u64,
    request_id: &str,
) {
    if status_code >= 500 {
        tracing::warn!(
            http_method = method,
            http_path = path,
            http_status = status_code,
            duration_ms = duration_ms,
            request_id = request_id,
            "API request failed"
        );
    } else {
        tracing::info!(
            http_method = method,
            http_path = path,
            http_status = status_code,
            duration_ms = duration_ms,
            request_id = request_id,
            "API request completed"
        );
    }
}

/// Log an operation rejected with a domain error
///
/// Storage failures are logged at error level with the full detail that the
/// client response leaves out.
pub fn log_api_error(kind: &str, detail: &str) {
    if kind == "storage_error" {
        tracing::error!(error_kind = kind, "Storage failure: {}", detail);
    } else {
        tracing::debug!(error_kind = kind, "Request rejected: {}", detail);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_parses() {
        let filter = EnvFilter::new(DEFAULT_FILTER);
        assert!(filter.to_string().contains("sqlx=warn"));
    }

    #[test]
    fn test_log_api_request() {
        // Just ensure it doesn't panic
        log_api_request("GET", "/api/v1/players", 200, 45, "req-1");
        log_api_request("POST", "/api/v1/matches", 500, 120, "req-2");
    }

    #[test]
    fn test_log_api_error() {
        log_api_error("validation_error", "nickname is required");
        log_api_error("storage_error", "connection reset");
    }
}
