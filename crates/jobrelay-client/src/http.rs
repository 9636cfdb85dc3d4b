//! Shared reqwest plumbing for adapters and the ingest client.

use std::time::Duration;

use jobrelay_core::AppError;
use reqwest::{Client, Response};

pub(crate) const HTTP_TIMEOUT: Duration = Duration::from_secs(30);
pub(crate) const USER_AGENT: &str = concat!("jobrelay/", env!("CARGO_PKG_VERSION"));

/// Default wait when a 429 arrives without a `Retry-After` header.
pub(crate) const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Build an HTTP client with the standard User-Agent and timeout.
pub(crate) fn build_client() -> Result<Client, AppError> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(HTTP_TIMEOUT)
        .build()
        .map_err(|e| AppError::HttpError(e.to_string()))
}

/// Map a reqwest transport failure onto the error taxonomy.
pub(crate) fn map_transport_error(e: reqwest::Error) -> AppError {
    if e.is_timeout() {
        AppError::Timeout(HTTP_TIMEOUT.as_secs())
    } else if e.is_connect() {
        AppError::NetworkError(format!("Connection failed: {e}"))
    } else {
        AppError::HttpError(e.to_string())
    }
}

/// Seconds to wait from a 429 response's `Retry-After` header.
pub(crate) fn retry_after_secs(response: &Response) -> u64 {
    response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(DEFAULT_RETRY_AFTER_SECS)
}

/// Convert 429 and non-success statuses into retryable/terminal errors.
pub(crate) fn check_status(response: Response, context: &str) -> Result<Response, AppError> {
    let status = response.status();

    if status.as_u16() == 429 {
        let retry_after = retry_after_secs(&response);
        tracing::warn!(context, retry_after, "Rate limited");
        return Err(AppError::RateLimited {
            retry_after_secs: retry_after,
        });
    }

    if !status.is_success() {
        return Err(AppError::StatusError {
            status: status.as_u16(),
            message: format!("{context} returned {status}"),
        });
    }

    Ok(response)
}
