//! Test utilities: mock implementations of the pipeline traits.
//!
//! Handwritten mocks for dependency injection in unit tests. All mocks
//! use `Arc<Mutex<_>>` for interior mutability, allowing assertions on
//! recorded calls.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use crate::error::AppError;
use crate::job::ScrapedJob;
use crate::traits::{BatchOutcome, DedupStore, FetchQuery, IngestReceipt, IngestSink, JobSource};

/// Create a relevant, valid job for tests.
pub fn make_test_job(title: &str) -> ScrapedJob {
    ScrapedJob::new(title, "An architecture practice role.", "Test Studio")
        .unwrap()
        .with_location("London")
}

// ---------------------------------------------------------------------------
// MockSource
// ---------------------------------------------------------------------------

/// Mock job source with a queue of scripted fetch responses.
#[derive(Clone)]
pub struct MockSource {
    name: &'static str,
    fanout: bool,
    responses: Arc<Mutex<Vec<Result<Vec<ScrapedJob>, AppError>>>>,
    /// Queries received, for assertions on what the orchestrator passed.
    pub queries: Arc<Mutex<Vec<FetchQuery>>>,
}

impl MockSource {
    pub fn new(name: &'static str, jobs: Vec<ScrapedJob>) -> Self {
        Self {
            name,
            fanout: false,
            responses: Arc::new(Mutex::new(vec![Ok(jobs)])),
            queries: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_error(name: &'static str, error: AppError) -> Self {
        Self {
            name,
            fanout: false,
            responses: Arc::new(Mutex::new(vec![Err(error)])),
            queries: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_fanout(mut self) -> Self {
        self.fanout = true;
        self
    }
}

impl JobSource for MockSource {
    fn source_name(&self) -> &'static str {
        self.name
    }

    fn supports_market_fanout(&self) -> bool {
        self.fanout
    }

    async fn fetch(&self, query: &FetchQuery) -> Result<Vec<ScrapedJob>, AppError> {
        self.queries.lock().unwrap().push(query.clone());
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Ok(Vec::new())
        } else {
            responses.remove(0)
        }
    }
}

// ---------------------------------------------------------------------------
// MockDedup
// ---------------------------------------------------------------------------

/// In-memory dedup store tracking hashes and provider ids.
#[derive(Clone, Default)]
pub struct MockDedup {
    seen_hashes: Arc<Mutex<HashSet<String>>>,
    seen_ids: Arc<Mutex<HashSet<String>>>,
    filter_error: Arc<Mutex<Option<AppError>>>,
    /// (title, source) pairs recorded by mark_seen.
    pub marked: Arc<Mutex<Vec<(String, String)>>>,
}

impl MockDedup {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Store pre-seeded with the given jobs already seen.
    pub fn with_seen(jobs: &[ScrapedJob]) -> Self {
        let store = Self::default();
        {
            let mut hashes = store.seen_hashes.lock().unwrap();
            let mut ids = store.seen_ids.lock().unwrap();
            for job in jobs {
                hashes.insert(job.content_hash());
                if let Some(id) = job.source_job_id() {
                    ids.insert(id.to_string());
                }
            }
        }
        store
    }

    pub fn with_filter_error(error: AppError) -> Self {
        Self {
            filter_error: Arc::new(Mutex::new(Some(error))),
            ..Self::default()
        }
    }
}

impl DedupStore for MockDedup {
    async fn is_seen(&self, job: &ScrapedJob) -> Result<bool, AppError> {
        if let Some(id) = job.source_job_id()
            && self.seen_ids.lock().unwrap().contains(id)
        {
            return Ok(true);
        }
        Ok(self
            .seen_hashes
            .lock()
            .unwrap()
            .contains(&job.content_hash()))
    }

    async fn mark_seen(&self, job: &ScrapedJob, source: &str) -> Result<(), AppError> {
        self.seen_hashes.lock().unwrap().insert(job.content_hash());
        if let Some(id) = job.source_job_id() {
            self.seen_ids.lock().unwrap().insert(id.to_string());
        }
        self.marked
            .lock()
            .unwrap()
            .push((job.title().to_string(), source.to_string()));
        Ok(())
    }

    async fn filter_new(&self, jobs: Vec<ScrapedJob>) -> Result<Vec<ScrapedJob>, AppError> {
        if let Some(e) = self.filter_error.lock().unwrap().take() {
            return Err(e);
        }
        let mut new_jobs = Vec::new();
        for job in jobs {
            if !self.is_seen(&job).await? {
                new_jobs.push(job);
            }
        }
        Ok(new_jobs)
    }

    async fn mark_batch_seen(&self, jobs: &[ScrapedJob], source: &str) -> Result<(), AppError> {
        for job in jobs {
            self.mark_seen(job, source).await?;
        }
        Ok(())
    }

    async fn cleanup_expired(&self) -> Result<u64, AppError> {
        Ok(0)
    }

    async fn count(&self) -> Result<i64, AppError> {
        Ok(self.seen_hashes.lock().unwrap().len() as i64)
    }
}

// ---------------------------------------------------------------------------
// MockSink
// ---------------------------------------------------------------------------

/// Mock ingest sink recording batch calls, with optional scripted
/// per-call outcomes.
#[derive(Clone)]
pub struct MockSink {
    scripted: Arc<Mutex<Vec<Result<BatchOutcome, AppError>>>>,
    /// (source, chunk size) per send_batch call.
    pub batch_calls: Arc<Mutex<Vec<(String, usize)>>>,
}

impl MockSink {
    /// Sink that accepts every chunk in full.
    pub fn accept_all() -> Self {
        Self {
            scripted: Arc::new(Mutex::new(Vec::new())),
            batch_calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Sink that answers each call with the next scripted outcome,
    /// then falls back to accepting everything.
    pub fn scripted(outcomes: Vec<Result<BatchOutcome, AppError>>) -> Self {
        Self {
            scripted: Arc::new(Mutex::new(outcomes)),
            batch_calls: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl IngestSink for MockSink {
    async fn send_one(&self, source: &str, _job: &ScrapedJob) -> Result<IngestReceipt, AppError> {
        self.batch_calls
            .lock()
            .unwrap()
            .push((source.to_string(), 1));
        Ok(IngestReceipt {
            id: Some(1),
            status: "created".into(),
            duplicate: false,
        })
    }

    async fn send_batch(&self, source: &str, jobs: &[ScrapedJob]) -> Result<BatchOutcome, AppError> {
        self.batch_calls
            .lock()
            .unwrap()
            .push((source.to_string(), jobs.len()));

        let mut scripted = self.scripted.lock().unwrap();
        if scripted.is_empty() {
            Ok(BatchOutcome {
                accepted: jobs.len() as u64,
                duplicates: 0,
                errors: 0,
            })
        } else {
            scripted.remove(0)
        }
    }
}
