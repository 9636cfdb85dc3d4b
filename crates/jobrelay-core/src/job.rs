use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::AppError;

/// Canonical employment type vocabulary shared by all providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmploymentType {
    FullTime,
    PartTime,
    Contract,
    Freelance,
    Internship,
}

impl EmploymentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmploymentType::FullTime => "full_time",
            EmploymentType::PartTime => "part_time",
            EmploymentType::Contract => "contract",
            EmploymentType::Freelance => "freelance",
            EmploymentType::Internship => "internship",
        }
    }

    /// Coerce a raw provider value to the canonical set.
    ///
    /// Values outside the set become `FullTime` rather than an error;
    /// providers disagree wildly about vocabulary and a wrong-but-plausible
    /// type beats a dropped job.
    pub fn from_raw(raw: &str) -> EmploymentType {
        match raw {
            "part_time" => EmploymentType::PartTime,
            "contract" => EmploymentType::Contract,
            "freelance" => EmploymentType::Freelance,
            "internship" => EmploymentType::Internship,
            _ => EmploymentType::FullTime,
        }
    }

    /// Option-preserving variant of [`from_raw`](Self::from_raw):
    /// `None` stays `None`, any `Some` is coerced.
    pub fn coerce(raw: Option<&str>) -> Option<EmploymentType> {
        raw.map(EmploymentType::from_raw)
    }
}

/// A job normalized from an external source.
///
/// Every adapter must produce jobs in this shape before they enter the
/// filter/dedup/delivery stages. `title`, `description`, and `company` are
/// validated non-empty at construction and the record is read-only
/// afterwards — downstream stages never mutate it.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrapedJob {
    title: String,
    description: String,
    company: String,
    company_website: Option<String>,
    location: String,
    url: Option<String>,
    source_job_id: Option<String>,
    apply_url: Option<String>,
    salary_text: Option<String>,
    employment_type: Option<EmploymentType>,
    posted_at: Option<DateTime<Utc>>,
}

impl ScrapedJob {
    /// Construct a job from the three required fields.
    ///
    /// Fails when any of them is empty or whitespace-only; surrounding
    /// whitespace is trimmed.
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        company: impl Into<String>,
    ) -> Result<Self, AppError> {
        let title = require_non_empty("title", title.into())?;
        let description = require_non_empty("description", description.into())?;
        let company = require_non_empty("company", company.into())?;

        Ok(Self {
            title,
            description,
            company,
            company_website: None,
            location: String::new(),
            url: None,
            source_job_id: None,
            apply_url: None,
            salary_text: None,
            employment_type: None,
            posted_at: None,
        })
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    pub fn with_company_website(mut self, website: Option<String>) -> Self {
        self.company_website = website;
        self
    }

    pub fn with_url(mut self, url: Option<String>) -> Self {
        self.url = url;
        self
    }

    pub fn with_source_job_id(mut self, id: Option<String>) -> Self {
        self.source_job_id = id;
        self
    }

    pub fn with_apply_url(mut self, url: Option<String>) -> Self {
        self.apply_url = url;
        self
    }

    pub fn with_salary_text(mut self, salary: Option<String>) -> Self {
        self.salary_text = salary;
        self
    }

    pub fn with_employment_type(mut self, employment_type: Option<EmploymentType>) -> Self {
        self.employment_type = employment_type;
        self
    }

    pub fn with_posted_at(mut self, posted_at: Option<DateTime<Utc>>) -> Self {
        self.posted_at = posted_at;
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn company(&self) -> &str {
        &self.company
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn source_job_id(&self) -> Option<&str> {
        self.source_job_id.as_deref()
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn salary_text(&self) -> Option<&str> {
        self.salary_text.as_deref()
    }

    pub fn employment_type(&self) -> Option<EmploymentType> {
        self.employment_type
    }

    pub fn posted_at(&self) -> Option<DateTime<Utc>> {
        self.posted_at
    }

    /// SHA-256 over the case-folded, trimmed `title|company|location`
    /// triple — the durable identity used by the dedup store when the
    /// provider id is absent or differs between duplicate listings.
    pub fn content_hash(&self) -> String {
        let key = format!(
            "{}|{}|{}",
            self.title.to_lowercase().trim(),
            self.company.to_lowercase().trim(),
            self.location.to_lowercase().trim(),
        );
        let mut hasher = Sha256::new();
        hasher.update(key.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// The wire shape the ingest service expects for one job.
    ///
    /// Absent optional fields are omitted entirely, never sent as null.
    pub fn ingest_payload(&self) -> IngestJobPayload<'_> {
        IngestJobPayload {
            title: &self.title,
            description: &self.description,
            company: &self.company,
            location: &self.location,
            company_website: self.company_website.as_deref(),
            url: self.url.as_deref(),
            source_job_id: self.source_job_id.as_deref(),
            apply_url: self.apply_url.as_deref(),
            salary_text: self.salary_text.as_deref(),
            employment_type: self.employment_type.map(|t| t.as_str()),
            posted_at: self.posted_at.map(|t| t.to_rfc3339()),
        }
    }
}

fn require_non_empty(field: &str, value: String) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::InvalidJob(format!("{field} must not be empty")));
    }
    Ok(trimmed.to_string())
}

/// Serialized job body for the ingest endpoints.
#[derive(Debug, Serialize)]
pub struct IngestJobPayload<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub company: &'a str,
    pub location: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_website: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_job_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apply_url: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary_text: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employment_type: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub posted_at: Option<String>,
}

/// Render a human-readable, currency-qualified salary line.
///
/// `"GBP 55,000 - 75,000"` when both bounds are present, a single figure
/// when only one is, `None` when neither.
pub fn format_salary(currency: &str, min: Option<f64>, max: Option<f64>) -> Option<String> {
    match (min, max) {
        (Some(min), Some(max)) => Some(format!(
            "{currency} {} - {}",
            group_thousands(min as i64),
            group_thousands(max as i64)
        )),
        (Some(min), None) => Some(format!("{currency} {}", group_thousands(min as i64))),
        (None, Some(max)) => Some(format!("{currency} {}", group_thousands(max as i64))),
        (None, None) => None,
    }
}

fn group_thousands(n: i64) -> String {
    let digits = n.abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if n < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

/// Parse a provider timestamp, tolerating the ISO-8601 `Z` suffix and
/// missing offsets. Unparsable input yields `None` — the job is kept,
/// only the date is dropped.
pub fn parse_posted_at(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_required_fields_fail_construction() {
        assert!(ScrapedJob::new("", "A fine role.", "Studio A").is_err());
        assert!(ScrapedJob::new("Architect", "   ", "Studio A").is_err());
        assert!(ScrapedJob::new("Architect", "A fine role.", "\t").is_err());
    }

    #[test]
    fn required_fields_are_trimmed() {
        let job = ScrapedJob::new("  Architect  ", " A fine role. ", " Studio A ").unwrap();
        assert_eq!(job.title(), "Architect");
        assert_eq!(job.description(), "A fine role.");
        assert_eq!(job.company(), "Studio A");
    }

    #[test]
    fn unknown_employment_type_coerces_to_full_time() {
        assert_eq!(
            EmploymentType::coerce(Some("zero_hours")),
            Some(EmploymentType::FullTime)
        );
        assert_eq!(
            EmploymentType::coerce(Some("contract")),
            Some(EmploymentType::Contract)
        );
        assert_eq!(EmploymentType::coerce(None), None);
    }

    #[test]
    fn salary_formatting() {
        assert_eq!(
            format_salary("GBP", Some(40000.0), None),
            Some("GBP 40,000".to_string())
        );
        assert_eq!(
            format_salary("GBP", Some(55000.0), Some(75000.0)),
            Some("GBP 55,000 - 75,000".to_string())
        );
        assert_eq!(
            format_salary("EUR", None, Some(1234567.0)),
            Some("EUR 1,234,567".to_string())
        );
        assert_eq!(format_salary("USD", None, None), None);
    }

    #[test]
    fn grouping_small_numbers() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
    }

    #[test]
    fn posted_at_accepts_z_suffix() {
        let parsed = parse_posted_at("2024-03-01T12:30:00Z").unwrap();
        assert_eq!(parsed.to_rfc3339(), "2024-03-01T12:30:00+00:00");

        let offset = parse_posted_at("2024-03-01T12:30:00+02:00").unwrap();
        assert_eq!(offset.to_rfc3339(), "2024-03-01T10:30:00+00:00");

        let naive = parse_posted_at("2024-03-01T12:30:00").unwrap();
        assert_eq!(naive.to_rfc3339(), "2024-03-01T12:30:00+00:00");

        let fractional = parse_posted_at("2024-03-01T12:30:00.0000000").unwrap();
        assert_eq!(fractional.to_rfc3339(), "2024-03-01T12:30:00+00:00");

        assert!(parse_posted_at("last Tuesday").is_none());
    }

    #[test]
    fn content_hash_is_case_and_whitespace_insensitive() {
        let a = ScrapedJob::new("Architect", "Role.", "Studio A")
            .unwrap()
            .with_location("London");
        let b = ScrapedJob::new("ARCHITECT", "Different text entirely.", "studio a")
            .unwrap()
            .with_location("LONDON");
        assert_eq!(a.content_hash(), b.content_hash());
        assert_eq!(a.content_hash().len(), 64);

        let c = ScrapedJob::new("Architect", "Role.", "Studio B")
            .unwrap()
            .with_location("London");
        assert_ne!(a.content_hash(), c.content_hash());
    }

    #[test]
    fn ingest_payload_omits_absent_optionals() {
        let job = ScrapedJob::new("Architect", "Role.", "Studio A").unwrap();
        let value = serde_json::to_value(job.ingest_payload()).unwrap();
        let obj = value.as_object().unwrap();

        assert_eq!(obj["title"], "Architect");
        assert_eq!(obj["location"], "");
        assert!(!obj.contains_key("url"));
        assert!(!obj.contains_key("salary_text"));
        assert!(!obj.contains_key("posted_at"));
    }

    #[test]
    fn ingest_payload_includes_present_optionals() {
        let job = ScrapedJob::new("Architect", "Role.", "Studio A")
            .unwrap()
            .with_location("London")
            .with_url(Some("https://example.com/j/1".into()))
            .with_employment_type(Some(EmploymentType::Contract))
            .with_posted_at(parse_posted_at("2024-03-01T12:30:00Z"));
        let value = serde_json::to_value(job.ingest_payload()).unwrap();
        let obj = value.as_object().unwrap();

        assert_eq!(obj["url"], "https://example.com/j/1");
        assert_eq!(obj["employment_type"], "contract");
        assert_eq!(obj["posted_at"], "2024-03-01T12:30:00+00:00");
    }
}
