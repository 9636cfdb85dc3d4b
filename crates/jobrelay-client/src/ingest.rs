//! HTTP client for the downstream ingest service.

use jobrelay_core::job::{IngestJobPayload, ScrapedJob};
use jobrelay_core::retry::{RetryPolicy, retry};
use jobrelay_core::traits::{BatchOutcome, IngestReceipt, IngestSink};
use jobrelay_core::AppError;
use reqwest::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Serialize;

use crate::config::IngestConfig;
use crate::http::{HTTP_TIMEOUT, USER_AGENT, check_status, map_transport_error};

#[derive(Serialize)]
struct SingleJobBody<'a> {
    source: &'a str,
    #[serde(flatten)]
    job: IngestJobPayload<'a>,
}

#[derive(Serialize)]
struct BatchBody<'a> {
    source: &'a str,
    jobs: Vec<IngestJobPayload<'a>>,
}

/// Authenticated client for the ingest endpoints.
///
/// The bearer token rides in a default header so every request carries
/// it; transport failures are retried per [`RetryPolicy::ingest`], but
/// HTTP status rejections other than 429 are terminal.
pub struct IngestClient {
    base_url: String,
    client: Client,
    policy: RetryPolicy,
}

impl IngestClient {
    pub fn new(config: &IngestConfig) -> Result<Self, AppError> {
        let mut headers = HeaderMap::new();
        let bearer = format!("Bearer {}", config.api_token);
        let mut auth = HeaderValue::from_str(&bearer)
            .map_err(|_| AppError::ConfigError("API token contains invalid characters".into()))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(HTTP_TIMEOUT)
            .default_headers(headers)
            .build()
            .map_err(|e| AppError::HttpError(e.to_string()))?;

        Ok(Self {
            base_url: config.api_url.trim_end_matches('/').to_string(),
            client,
            policy: RetryPolicy::ingest(),
        })
    }

    pub fn from_env() -> Result<Self, AppError> {
        Self::new(&IngestConfig::from_env()?)
    }

    async fn post_single(&self, body: &SingleJobBody<'_>) -> Result<IngestReceipt, AppError> {
        let url = format!("{}/api/ingest/job", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(map_transport_error)?;
        let response = check_status(response, "ingest")?;
        response
            .json()
            .await
            .map_err(|e| AppError::HttpError(format!("Failed to parse ingest response: {e}")))
    }

    async fn post_batch(&self, body: &BatchBody<'_>) -> Result<BatchOutcome, AppError> {
        let url = format!("{}/api/ingest/jobs", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(map_transport_error)?;
        let response = check_status(response, "ingest")?;
        response
            .json()
            .await
            .map_err(|e| AppError::HttpError(format!("Failed to parse ingest response: {e}")))
    }
}

impl IngestSink for IngestClient {
    async fn send_one(&self, source: &str, job: &ScrapedJob) -> Result<IngestReceipt, AppError> {
        let body = SingleJobBody {
            source,
            job: job.ingest_payload(),
        };
        retry(&self.policy, AppError::is_retryable, || {
            self.post_single(&body)
        })
        .await
    }

    async fn send_batch(&self, source: &str, jobs: &[ScrapedJob]) -> Result<BatchOutcome, AppError> {
        let body = BatchBody {
            source,
            jobs: jobs.iter().map(ScrapedJob::ingest_payload).collect(),
        };
        let outcome = retry(&self.policy, AppError::is_retryable, || {
            self.post_batch(&body)
        })
        .await?;
        tracing::debug!(
            source,
            accepted = outcome.accepted,
            duplicates = outcome.duplicates,
            errors = outcome.errors,
            "Batch delivered"
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(url: &str) -> IngestConfig {
        IngestConfig::new(url, "token-123")
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let client = IngestClient::new(&config("https://api.example.com/")).unwrap();
        assert_eq!(client.base_url, "https://api.example.com");

        let bare = IngestClient::new(&config("https://api.example.com")).unwrap();
        assert_eq!(bare.base_url, "https://api.example.com");
    }

    #[test]
    fn invalid_token_is_rejected() {
        let bad = IngestConfig::new("https://api.example.com", "tok\nen");
        assert!(matches!(
            IngestClient::new(&bad),
            Err(AppError::ConfigError(_))
        ));
    }

    #[test]
    fn batch_body_wraps_source_and_jobs() {
        let job = jobrelay_core::testutil::make_test_job("Architect");
        let body = BatchBody {
            source: "adzuna",
            jobs: vec![job.ingest_payload()],
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["source"], "adzuna");
        assert_eq!(value["jobs"].as_array().unwrap().len(), 1);
        assert_eq!(value["jobs"][0]["title"], "Architect");
    }

    #[test]
    fn single_body_flattens_job_fields() {
        let job = jobrelay_core::testutil::make_test_job("Architect");
        let body = SingleJobBody {
            source: "jooble",
            job: job.ingest_payload(),
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["source"], "jooble");
        assert_eq!(value["title"], "Architect");
        assert!(value.get("jobs").is_none());
    }
}
