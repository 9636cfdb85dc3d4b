//! CareerJet adapter.
//!
//! CareerJet's search API authenticates with HTTP basic auth (key as
//! username, empty password) and requires the caller's IP and user agent
//! as query parameters.

use std::net::UdpSocket;
use std::time::Duration;

use jobrelay_core::job::ScrapedJob;
use jobrelay_core::retry::{RetryPolicy, retry};
use jobrelay_core::traits::{FetchQuery, JobSource};
use jobrelay_core::AppError;
use reqwest::Client;
use serde_json::Value;

use crate::config::optional_env;
use crate::http::{USER_AGENT, build_client, check_status, map_transport_error};

const BASE_URL: &str = "https://search.api.careerjet.net/v4/query";
const MAX_PAGE_SIZE: usize = 100;
// The v4 API rejects deep pagination; stop before it starts erroring.
const MAX_PAGE: usize = 10;
const PAGE_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug)]
pub struct CareerJetAdapter {
    api_key: Option<String>,
    client: Client,
    policy: RetryPolicy,
}

impl CareerJetAdapter {
    pub fn new(api_key: Option<String>) -> Result<Self, AppError> {
        Ok(Self {
            api_key,
            client: build_client()?,
            policy: RetryPolicy::fetch(),
        })
    }

    /// Credentials from `CAREERJET_API_KEY`.
    pub fn from_env() -> Result<Self, AppError> {
        Self::new(optional_env("CAREERJET_API_KEY"))
    }

    async fn fetch_page(
        &self,
        api_key: &str,
        query: &str,
        location: &str,
        user_ip: &str,
        page: usize,
        page_size: usize,
    ) -> Result<Vec<Value>, AppError> {
        let mut request = self
            .client
            .get(BASE_URL)
            .basic_auth(api_key, Some(""))
            .query(&[
                ("keywords", query),
                ("page", &page.to_string()),
                ("page_size", &page_size.to_string()),
                ("sort", "date"),
                ("user_ip", user_ip),
                ("user_agent", USER_AGENT),
                ("locale_code", "en_GB"),
            ]);
        if !location.is_empty() {
            request = request.query(&[("location", location)]);
        }

        let response = request.send().await.map_err(map_transport_error)?;
        let response = check_status(response, "careerjet")?;

        let data: Value = response
            .json()
            .await
            .map_err(|e| AppError::HttpError(format!("Failed to parse CareerJet response: {e}")))?;

        Ok(data
            .get("jobs")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default())
    }
}

impl JobSource for CareerJetAdapter {
    fn source_name(&self) -> &'static str {
        "careerjet"
    }

    async fn fetch(&self, query: &FetchQuery) -> Result<Vec<ScrapedJob>, AppError> {
        let Some(api_key) = self.api_key.as_deref() else {
            tracing::warn!("[careerjet] No API key configured, skipping");
            return Ok(Vec::new());
        };

        let query_string = query.query_string();
        let user_ip = local_ip();
        let page_size = MAX_PAGE_SIZE.min(query.max_results.max(1));
        let mut jobs: Vec<ScrapedJob> = Vec::new();
        let mut page = 1;

        while jobs.len() < query.max_results && page <= MAX_PAGE {
            let result = retry(&self.policy, AppError::is_retryable_fetch, || {
                self.fetch_page(
                    api_key,
                    &query_string,
                    &query.location,
                    &user_ip,
                    page,
                    page_size,
                )
            })
            .await;

            match result {
                Ok(results) => {
                    if results.is_empty() {
                        break;
                    }
                    let page_count = results.len();
                    for raw in &results {
                        if let Some(job) = parse_result(raw) {
                            jobs.push(job);
                        }
                    }
                    if page_count < page_size {
                        break;
                    }
                    page += 1;
                    tokio::time::sleep(PAGE_DELAY).await;
                }
                Err(e) => {
                    tracing::warn!(page, error = %e, "[careerjet] Page fetch failed, truncating");
                    break;
                }
            }
        }

        jobs.truncate(query.max_results);
        tracing::info!(count = jobs.len(), "[careerjet] Fetch complete");
        Ok(jobs)
    }
}

/// The outbound address the OS would route through; CareerJet wants it
/// for abuse attribution. No packet is sent.
fn local_ip() -> String {
    UdpSocket::bind("0.0.0.0:0")
        .and_then(|socket| {
            socket.connect("8.8.8.8:80")?;
            socket.local_addr()
        })
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|_| "127.0.0.1".to_string())
}

/// Map one CareerJet result onto the normalized record. CareerJet
/// exposes no employment type or posting date in its search payload.
fn parse_result(result: &Value) -> Option<ScrapedJob> {
    let title = result.get("title").and_then(Value::as_str)?.trim();
    let description = result.get("description").and_then(Value::as_str)?.trim();
    if title.is_empty() || description.is_empty() {
        return None;
    }

    let company = result
        .get("company")
        .and_then(Value::as_str)
        .filter(|c| !c.trim().is_empty())
        .unwrap_or("Unknown");

    let location = result.get("locations").and_then(Value::as_str).unwrap_or("");

    let url = result.get("url").and_then(Value::as_str).map(str::to_string);

    let salary_text = result
        .get("salary")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    match ScrapedJob::new(title, description, company) {
        Ok(job) => Some(
            job.with_location(location)
                .with_url(url.clone())
                .with_apply_url(url)
                .with_salary_text(salary_text),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "[careerjet] Failed to parse result");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn sample_result() -> Value {
        json!({
            "title": "Landscape Architect",
            "description": "Public-realm schemes across the Midlands.",
            "company": "Greenfield Partners",
            "locations": "Birmingham",
            "url": "https://careerjet.example/j/abc",
            "salary": "£38,000 - £45,000 per annum"
        })
    }

    #[test]
    fn parses_full_result() {
        let job = parse_result(&sample_result()).unwrap();
        assert_eq!(job.title(), "Landscape Architect");
        assert_eq!(job.company(), "Greenfield Partners");
        assert_eq!(job.location(), "Birmingham");
        assert_eq!(job.url(), Some("https://careerjet.example/j/abc"));
        assert_eq!(job.salary_text(), Some("£38,000 - £45,000 per annum"));
        assert_eq!(job.employment_type(), None);
        assert!(job.posted_at().is_none());
        assert_eq!(job.source_job_id(), None);
    }

    #[test]
    fn blank_company_falls_back_to_unknown() {
        let mut result = sample_result();
        result["company"] = json!("  ");
        assert_eq!(parse_result(&result).unwrap().company(), "Unknown");
    }

    #[test]
    fn missing_description_drops_result() {
        let mut result = sample_result();
        result.as_object_mut().unwrap().remove("description");
        assert!(parse_result(&result).is_none());
    }

    #[test]
    fn blank_salary_is_omitted() {
        let mut result = sample_result();
        result["salary"] = json!("");
        assert!(parse_result(&result).unwrap().salary_text().is_none());
    }

    #[test]
    fn local_ip_is_nonempty() {
        assert!(!local_ip().is_empty());
    }

    #[tokio::test]
    async fn missing_key_yields_empty_fetch() {
        let adapter = CareerJetAdapter::new(None).unwrap();
        let query = FetchQuery::new(vec!["architect".into()]);
        assert!(adapter.fetch(&query).await.unwrap().is_empty());
    }
}
