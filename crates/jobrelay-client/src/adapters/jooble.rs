//! Jooble adapter.
//!
//! Jooble takes a POST with a JSON body and embeds the API key in the
//! URL path rather than a header.

use jobrelay_core::job::{EmploymentType, ScrapedJob, parse_posted_at};
use jobrelay_core::retry::{RetryPolicy, retry};
use jobrelay_core::traits::{FetchQuery, JobSource};
use jobrelay_core::AppError;
use reqwest::Client;
use serde_json::{Value, json};

use crate::config::optional_env;
use crate::http::{build_client, check_status, map_transport_error};

const BASE_URL: &str = "https://jooble.org/api";

#[derive(Debug)]
pub struct JoobleAdapter {
    api_key: Option<String>,
    client: Client,
    policy: RetryPolicy,
}

impl JoobleAdapter {
    pub fn new(api_key: Option<String>) -> Result<Self, AppError> {
        Ok(Self {
            api_key,
            client: build_client()?,
            policy: RetryPolicy::fetch(),
        })
    }

    /// Credentials from `JOOBLE_API_KEY`.
    pub fn from_env() -> Result<Self, AppError> {
        Self::new(optional_env("JOOBLE_API_KEY"))
    }

    async fn fetch_page(
        &self,
        api_key: &str,
        query: &str,
        location: &str,
        page: usize,
    ) -> Result<Vec<Value>, AppError> {
        let url = format!("{BASE_URL}/{api_key}");

        let mut body = json!({
            "keywords": query,
            "page": page.to_string(),
        });
        if !location.is_empty() {
            body["location"] = json!(location);
        }

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(map_transport_error)?;
        let response = check_status(response, "jooble")?;

        let data: Value = response
            .json()
            .await
            .map_err(|e| AppError::HttpError(format!("Failed to parse Jooble response: {e}")))?;

        Ok(data
            .get("jobs")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default())
    }
}

impl JobSource for JoobleAdapter {
    fn source_name(&self) -> &'static str {
        "jooble"
    }

    async fn fetch(&self, query: &FetchQuery) -> Result<Vec<ScrapedJob>, AppError> {
        let Some(api_key) = self.api_key.as_deref() else {
            tracing::warn!("[jooble] No API key configured, skipping");
            return Ok(Vec::new());
        };

        let query_string = query.query_string();
        let mut jobs: Vec<ScrapedJob> = Vec::new();
        let mut page = 1;

        while jobs.len() < query.max_results {
            let result = retry(&self.policy, AppError::is_retryable_fetch, || {
                self.fetch_page(api_key, &query_string, &query.location, page)
            })
            .await;

            match result {
                Ok(results) => {
                    if results.is_empty() {
                        break;
                    }
                    for raw in &results {
                        if let Some(job) = parse_result(raw) {
                            jobs.push(job);
                        }
                    }
                    page += 1;
                }
                Err(e) => {
                    tracing::warn!(page, error = %e, "[jooble] Page fetch failed, truncating");
                    break;
                }
            }
        }

        jobs.truncate(query.max_results);
        tracing::info!(count = jobs.len(), "[jooble] Fetch complete");
        Ok(jobs)
    }
}

/// Jooble's type vocabulary differs from the canonical one; unmapped
/// values are left unset rather than coerced.
fn employment_type(raw: &str) -> Option<EmploymentType> {
    match raw.to_lowercase().as_str() {
        "full-time" => Some(EmploymentType::FullTime),
        "part-time" => Some(EmploymentType::PartTime),
        "contract" | "temporary" => Some(EmploymentType::Contract),
        "freelance" => Some(EmploymentType::Freelance),
        "internship" => Some(EmploymentType::Internship),
        _ => None,
    }
}

fn parse_result(result: &Value) -> Option<ScrapedJob> {
    let title = result.get("title").and_then(Value::as_str)?.trim();
    let description = result.get("snippet").and_then(Value::as_str)?.trim();
    if title.is_empty() || description.is_empty() {
        return None;
    }

    let company = result
        .get("company")
        .and_then(Value::as_str)
        .filter(|c| !c.trim().is_empty())
        .unwrap_or("Unknown");

    let location = result.get("location").and_then(Value::as_str).unwrap_or("");

    let link = result.get("link").and_then(Value::as_str).map(str::to_string);

    let salary_text = result
        .get("salary")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    let employment = result
        .get("type")
        .and_then(Value::as_str)
        .and_then(employment_type);

    let source_job_id = result.get("id").map(|id| match id {
        Value::String(s) => format!("jooble_{s}"),
        other => format!("jooble_{other}"),
    });

    let posted_at = result
        .get("updated")
        .and_then(Value::as_str)
        .and_then(parse_posted_at);

    match ScrapedJob::new(title, description, company) {
        Ok(job) => Some(
            job.with_location(location)
                .with_url(link.clone())
                .with_apply_url(link)
                .with_source_job_id(source_job_id)
                .with_salary_text(salary_text)
                .with_employment_type(employment)
                .with_posted_at(posted_at),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "[jooble] Failed to parse result");
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
            "id": 991000222,
            "title": "Urban Designer",
            "snippet": "Masterplanning role within a multidisciplinary practice.",
            "company": "Cityform Studio",
            "location": "Leeds",
            "link": "https://jooble.example/j/991000222",
            "salary": "£42k",
            "type": "Full-time",
            "updated": "2024-02-01T00:00:00.0000000"
        })
    }

    #[test]
    fn parses_full_result() {
        let job = parse_result(&sample_result()).unwrap();
        assert_eq!(job.title(), "Urban Designer");
        assert_eq!(
            job.description(),
            "Masterplanning role within a multidisciplinary practice."
        );
        assert_eq!(job.company(), "Cityform Studio");
        assert_eq!(job.location(), "Leeds");
        assert_eq!(job.source_job_id(), Some("jooble_991000222"));
        assert_eq!(job.url(), Some("https://jooble.example/j/991000222"));
        assert_eq!(job.salary_text(), Some("£42k"));
        assert_eq!(job.employment_type(), Some(EmploymentType::FullTime));
    }

    #[test]
    fn vocabulary_mapping() {
        assert_eq!(employment_type("Full-time"), Some(EmploymentType::FullTime));
        assert_eq!(employment_type("TEMPORARY"), Some(EmploymentType::Contract));
        assert_eq!(employment_type("Internship"), Some(EmploymentType::Internship));
        assert_eq!(employment_type("zero hours"), None);
    }

    #[test]
    fn unmapped_type_left_unset() {
        let mut result = sample_result();
        result["type"] = json!("Graduate scheme");
        assert!(parse_result(&result).unwrap().employment_type().is_none());
    }

    #[test]
    fn missing_snippet_drops_result() {
        let mut result = sample_result();
        result.as_object_mut().unwrap().remove("snippet");
        assert!(parse_result(&result).is_none());
    }

    #[test]
    fn missing_company_falls_back_to_unknown() {
        let mut result = sample_result();
        result.as_object_mut().unwrap().remove("company");
        assert_eq!(parse_result(&result).unwrap().company(), "Unknown");
    }

    #[tokio::test]
    async fn missing_key_yields_empty_fetch() {
        let adapter = JoobleAdapter::new(None).unwrap();
        let query = FetchQuery::new(vec!["architect".into()]);
        assert!(adapter.fetch(&query).await.unwrap().is_empty());
    }
}
