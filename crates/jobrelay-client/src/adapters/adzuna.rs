//! Adzuna adapter.
//!
//! Adzuna partitions its catalog per country and authenticates with an
//! app_id/app_key pair passed as query parameters.
//! Docs: https://developer.adzuna.com/docs/search

use jobrelay_core::job::{EmploymentType, ScrapedJob, format_salary, parse_posted_at};
use jobrelay_core::market::{Market, resolve_markets};
use jobrelay_core::retry::{RetryPolicy, retry};
use jobrelay_core::traits::{FetchQuery, JobSource};
use jobrelay_core::AppError;
use reqwest::Client;
use serde_json::Value;

use crate::config::optional_env;
use crate::http::{build_client, check_status, map_transport_error};

const BASE_URL: &str = "https://api.adzuna.com/v1/api/jobs";
const MAX_PAGE_SIZE: usize = 50;

/// Fetches jobs from the Adzuna API across regional markets.
#[derive(Debug)]
pub struct AdzunaAdapter {
    app_id: Option<String>,
    app_key: Option<String>,
    client: Client,
    policy: RetryPolicy,
}

impl AdzunaAdapter {
    pub fn new(app_id: Option<String>, app_key: Option<String>) -> Result<Self, AppError> {
        Ok(Self {
            app_id,
            app_key,
            client: build_client()?,
            policy: RetryPolicy::fetch(),
        })
    }

    /// Credentials from `ADZUNA_APP_ID` / `ADZUNA_APP_KEY`.
    pub fn from_env() -> Result<Self, AppError> {
        Self::new(optional_env("ADZUNA_APP_ID"), optional_env("ADZUNA_APP_KEY"))
    }

    /// Fetch one market, paginating until the provider is exhausted or
    /// `max_results` is reached. An unrecoverable page error truncates
    /// at the last successful page.
    async fn fetch_market(
        &self,
        app_id: &str,
        app_key: &str,
        query: &str,
        location: &str,
        market: &'static Market,
        max_results: usize,
    ) -> Vec<ScrapedJob> {
        let mut jobs: Vec<ScrapedJob> = Vec::new();
        let per_page = MAX_PAGE_SIZE.min(max_results.max(1));
        let mut page = 1;

        while jobs.len() < max_results {
            let result = retry(&self.policy, AppError::is_retryable_fetch, || {
                self.fetch_page(app_id, app_key, query, location, market.code, page, per_page)
            })
            .await;

            match result {
                Ok(results) => {
                    if results.is_empty() {
                        break;
                    }
                    let page_count = results.len();
                    for raw in &results {
                        if let Some(job) = parse_result(raw, market) {
                            jobs.push(job);
                        }
                    }
                    if page_count < per_page {
                        break;
                    }
                    page += 1;
                }
                Err(e) => {
                    tracing::warn!(
                        market = market.code,
                        page,
                        error = %e,
                        "Adzuna page fetch failed, truncating market"
                    );
                    break;
                }
            }
        }

        jobs.truncate(max_results);
        jobs
    }

    async fn fetch_page(
        &self,
        app_id: &str,
        app_key: &str,
        query: &str,
        location: &str,
        market_code: &str,
        page: usize,
        per_page: usize,
    ) -> Result<Vec<Value>, AppError> {
        let url = format!("{BASE_URL}/{market_code}/search/{page}");

        let mut request = self.client.get(&url).query(&[
            ("app_id", app_id),
            ("app_key", app_key),
            ("results_per_page", &per_page.to_string()),
            ("what", query),
            ("content-type", "application/json"),
        ]);
        if !location.is_empty() {
            request = request.query(&[("where", location)]);
        }

        let response = request.send().await.map_err(map_transport_error)?;
        let response = check_status(response, &format!("adzuna:{market_code}"))?;

        let data: Value = response
            .json()
            .await
            .map_err(|e| AppError::HttpError(format!("Failed to parse Adzuna response: {e}")))?;

        Ok(data
            .get("results")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default())
    }
}

impl JobSource for AdzunaAdapter {
    fn source_name(&self) -> &'static str {
        "adzuna"
    }

    fn supports_market_fanout(&self) -> bool {
        true
    }

    async fn fetch(&self, query: &FetchQuery) -> Result<Vec<ScrapedJob>, AppError> {
        let (Some(app_id), Some(app_key)) = (self.app_id.as_deref(), self.app_key.as_deref())
        else {
            tracing::warn!("[adzuna] No API credentials configured, skipping");
            return Ok(Vec::new());
        };

        let markets = resolve_markets(query.market.as_deref().unwrap_or("all"));

        // A location filter is ambiguous across markets; honor it only
        // when exactly one market is selected.
        let location = if markets.len() == 1 {
            query.location.as_str()
        } else {
            ""
        };

        let query_string = query.query_string();
        let mut all_jobs = Vec::new();

        for market in markets {
            tracing::info!(market = market.code, name = market.name, "[adzuna] Fetching market");
            let market_jobs = self
                .fetch_market(
                    app_id,
                    app_key,
                    &query_string,
                    location,
                    market,
                    query.max_results,
                )
                .await;
            tracing::info!(
                market = market.code,
                count = market_jobs.len(),
                "[adzuna] Market fetched"
            );
            all_jobs.extend(market_jobs);
        }

        tracing::info!(count = all_jobs.len(), "[adzuna] Fetch complete");
        Ok(all_jobs)
    }
}

/// Map one Adzuna result onto the normalized record.
///
/// Missing title or description drops the candidate; any other mapping
/// problem degrades that field rather than the job.
fn parse_result(result: &Value, market: &'static Market) -> Option<ScrapedJob> {
    let title = result.get("title").and_then(Value::as_str)?.trim();
    let description = result.get("description").and_then(Value::as_str)?.trim();
    if title.is_empty() || description.is_empty() {
        return None;
    }

    let company = result
        .pointer("/company/display_name")
        .and_then(Value::as_str)
        .filter(|c| !c.trim().is_empty())
        .unwrap_or("Unknown");

    let location = result
        .pointer("/location/display_name")
        .and_then(Value::as_str)
        .unwrap_or("");

    let salary_text = format_salary(
        market.currency,
        result.get("salary_min").and_then(Value::as_f64),
        result.get("salary_max").and_then(Value::as_f64),
    );

    let posted_at = result
        .get("created")
        .and_then(Value::as_str)
        .and_then(parse_posted_at);

    // Adzuna signals contract arrangements through two separate fields;
    // anything unmarked is treated as a full-time position.
    let contract_type = result.get("contract_type").and_then(Value::as_str);
    let contract_time = result.get("contract_time").and_then(Value::as_str);
    let employment_type = if contract_type == Some("contract") {
        EmploymentType::Contract
    } else if contract_time == Some("part_time") {
        EmploymentType::PartTime
    } else {
        EmploymentType::FullTime
    };

    let source_job_id = result.get("id").map(|id| match id {
        Value::String(s) => format!("adzuna_{s}"),
        other => format!("adzuna_{other}"),
    });

    let redirect_url = result
        .get("redirect_url")
        .and_then(Value::as_str)
        .map(str::to_string);

    match ScrapedJob::new(title, description, company) {
        Ok(job) => Some(
            job.with_location(location)
                .with_url(redirect_url.clone())
                .with_apply_url(redirect_url)
                .with_source_job_id(source_job_id)
                .with_salary_text(salary_text)
                .with_employment_type(Some(employment_type))
                .with_posted_at(posted_at),
        ),
        Err(e) => {
            tracing::warn!(market = market.code, error = %e, "[adzuna] Failed to parse result");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use jobrelay_core::market::find_market;
    use serde_json::json;

    use super::*;

    fn gb() -> &'static Market {
        find_market("gb").unwrap()
    }

    fn sample_result() -> Value {
        json!({
            "id": 4444555,
            "title": "Project Architect",
            "description": "Run residential projects from concept to completion.",
            "company": {"display_name": "Atelier North"},
            "location": {"display_name": "Manchester, UK"},
            "redirect_url": "https://adzuna.example/j/4444555",
            "salary_min": 40000.0,
            "salary_max": 52000.0,
            "contract_time": "full_time",
            "created": "2024-02-10T08:00:00Z"
        })
    }

    #[test]
    fn parses_full_result() {
        let job = parse_result(&sample_result(), gb()).unwrap();
        assert_eq!(job.title(), "Project Architect");
        assert_eq!(job.company(), "Atelier North");
        assert_eq!(job.location(), "Manchester, UK");
        assert_eq!(job.source_job_id(), Some("adzuna_4444555"));
        assert_eq!(job.salary_text(), Some("GBP 40,000 - 52,000"));
        assert_eq!(job.employment_type(), Some(EmploymentType::FullTime));
        assert!(job.posted_at().is_some());
    }

    #[test]
    fn missing_title_or_description_drops_result() {
        let mut no_title = sample_result();
        no_title.as_object_mut().unwrap().remove("title");
        assert!(parse_result(&no_title, gb()).is_none());

        let mut blank_description = sample_result();
        blank_description["description"] = json!("   ");
        assert!(parse_result(&blank_description, gb()).is_none());
    }

    #[test]
    fn missing_company_falls_back_to_unknown() {
        let mut result = sample_result();
        result.as_object_mut().unwrap().remove("company");
        assert_eq!(parse_result(&result, gb()).unwrap().company(), "Unknown");
    }

    #[test]
    fn contract_signals_map_to_employment_type() {
        let mut contract = sample_result();
        contract["contract_type"] = json!("contract");
        assert_eq!(
            parse_result(&contract, gb()).unwrap().employment_type(),
            Some(EmploymentType::Contract)
        );

        let mut part_time = sample_result();
        part_time["contract_time"] = json!("part_time");
        assert_eq!(
            parse_result(&part_time, gb()).unwrap().employment_type(),
            Some(EmploymentType::PartTime)
        );
    }

    #[test]
    fn salary_uses_market_currency() {
        let job = parse_result(&sample_result(), find_market("de").unwrap()).unwrap();
        assert_eq!(job.salary_text(), Some("EUR 40,000 - 52,000"));
    }

    #[test]
    fn unparsable_date_is_dropped_not_fatal() {
        let mut result = sample_result();
        result["created"] = json!("sometime in February");
        let job = parse_result(&result, gb()).unwrap();
        assert!(job.posted_at().is_none());
    }

    #[tokio::test]
    async fn missing_credentials_yield_empty_fetch() {
        let adapter = AdzunaAdapter::new(None, None).unwrap();
        let query = FetchQuery::new(vec!["architect".into()]).with_market("gb");
        let jobs = adapter.fetch(&query).await.unwrap();
        assert!(jobs.is_empty());
    }
}
