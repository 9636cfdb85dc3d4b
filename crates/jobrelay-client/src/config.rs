use jobrelay_core::AppError;

/// Read an optional credential from the environment.
///
/// Unset or empty values both count as absent — an adapter with no
/// credentials degrades to empty fetches instead of failing.
pub fn optional_env(name: &str) -> Option<String> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Some(value),
        _ => None,
    }
}

/// Configuration for the downstream ingest service.
///
/// Unlike adapter credentials, these are required: a run with no ingest
/// endpoint must stop before any provider is invoked.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    pub api_url: String,
    pub api_token: String,
}

impl IngestConfig {
    /// Read configuration from environment variables.
    ///
    /// - `ARCHGEE_API_URL` (required)
    /// - `ARCHGEE_API_TOKEN` (required)
    pub fn from_env() -> Result<Self, AppError> {
        let api_url = optional_env("ARCHGEE_API_URL").ok_or_else(|| {
            AppError::ConfigError("ARCHGEE_API_URL not set. Required for ingest.".into())
        })?;
        let api_token = optional_env("ARCHGEE_API_TOKEN").ok_or_else(|| {
            AppError::ConfigError("ARCHGEE_API_TOKEN not set. Required for ingest.".into())
        })?;

        Ok(Self { api_url, api_token })
    }

    pub fn new(api_url: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            api_token: api_token.into(),
        }
    }
}
