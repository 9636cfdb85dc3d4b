use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::job::ScrapedJob;

/// Search parameters handed to a provider for one run.
#[derive(Debug, Clone)]
pub struct FetchQuery {
    /// Search keywords, joined into one query string per provider rules.
    pub keywords: Vec<String>,
    /// Location filter; only honored in single-market fetches.
    pub location: String,
    /// Upper bound on results per provider (per market for fan-out
    /// providers).
    pub max_results: usize,
    /// Market selector for providers with regional catalogs. The
    /// orchestrator sets this only for sources that declare
    /// [`JobSource::supports_market_fanout`].
    pub market: Option<String>,
}

impl FetchQuery {
    pub fn new(keywords: Vec<String>) -> Self {
        Self {
            keywords,
            location: String::new(),
            max_results: 100,
            market: None,
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn with_market(mut self, market: impl Into<String>) -> Self {
        self.market = Some(market.into());
        self
    }

    /// Keywords joined the way every provider expects them.
    pub fn query_string(&self) -> String {
        self.keywords.join(" ")
    }
}

/// One external job source.
///
/// Fetch is best-effort per provider: missing credentials yield an empty
/// result set with a warning, and partial pagination failures truncate
/// rather than discard.
pub trait JobSource: Send + Sync {
    /// Unique source identifier (e.g. "adzuna").
    fn source_name(&self) -> &'static str;

    /// Whether this source fans out across regional markets. Sources
    /// declaring this receive the query's market selector; others are
    /// never handed one.
    fn supports_market_fanout(&self) -> bool {
        false
    }

    fn fetch(
        &self,
        query: &FetchQuery,
    ) -> impl Future<Output = Result<Vec<ScrapedJob>, AppError>> + Send;
}

/// Persistent record of previously-delivered jobs.
pub trait DedupStore: Send + Sync {
    /// True when either the provider job id or the content hash matches
    /// an existing entry.
    fn is_seen(&self, job: &ScrapedJob) -> impl Future<Output = Result<bool, AppError>> + Send;

    fn mark_seen(
        &self,
        job: &ScrapedJob,
        source: &str,
    ) -> impl Future<Output = Result<(), AppError>> + Send;

    /// Drop already-seen jobs, preserving order.
    fn filter_new(
        &self,
        jobs: Vec<ScrapedJob>,
    ) -> impl Future<Output = Result<Vec<ScrapedJob>, AppError>> + Send;

    fn mark_batch_seen(
        &self,
        jobs: &[ScrapedJob],
        source: &str,
    ) -> impl Future<Output = Result<(), AppError>> + Send;

    /// Delete entries older than the expiry window; returns rows removed.
    fn cleanup_expired(&self) -> impl Future<Output = Result<u64, AppError>> + Send;

    fn count(&self) -> impl Future<Output = Result<i64, AppError>> + Send;
}

/// Aggregate counts returned by the ingest service for one batch call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchOutcome {
    #[serde(default)]
    pub accepted: u64,
    #[serde(default)]
    pub duplicates: u64,
    #[serde(default)]
    pub errors: u64,
}

/// Response to a single-job submission.
#[derive(Debug, Clone, Deserialize)]
pub struct IngestReceipt {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub duplicate: bool,
}

/// Downstream ingestion endpoint.
pub trait IngestSink: Send + Sync {
    fn send_one(
        &self,
        source: &str,
        job: &ScrapedJob,
    ) -> impl Future<Output = Result<IngestReceipt, AppError>> + Send;

    fn send_batch(
        &self,
        source: &str,
        jobs: &[ScrapedJob],
    ) -> impl Future<Output = Result<BatchOutcome, AppError>> + Send;
}
