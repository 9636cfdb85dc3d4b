use crate::counters::RunCounters;
use crate::filter::KeywordFilter;
use crate::job::ScrapedJob;
use crate::traits::{BatchOutcome, DedupStore, FetchQuery, IngestSink, JobSource};

/// Default number of jobs per batch submission.
pub const DEFAULT_BATCH_SIZE: usize = 50;

/// Send jobs to the sink in fixed-size chunks.
///
/// A chunk whose send fails (after the sink's own retry budget) is
/// counted entirely as errors and does not abort subsequent chunks.
/// There is no orchestration-level retry.
pub async fn send_in_batches<K: IngestSink>(
    sink: &K,
    source: &str,
    jobs: &[ScrapedJob],
    batch_size: usize,
) -> BatchOutcome {
    let mut total = BatchOutcome::default();

    for (index, chunk) in jobs.chunks(batch_size.max(1)).enumerate() {
        match sink.send_batch(source, chunk).await {
            Ok(outcome) => {
                total.accepted += outcome.accepted;
                total.duplicates += outcome.duplicates;
                total.errors += outcome.errors;
                tracing::info!(
                    source,
                    batch = index + 1,
                    accepted = outcome.accepted,
                    duplicates = outcome.duplicates,
                    errors = outcome.errors,
                    "Batch sent"
                );
            }
            Err(e) => {
                tracing::error!(source, batch = index + 1, error = %e, "Batch send failed");
                total.errors += chunk.len() as u64;
            }
        }
    }

    total
}

/// Orchestrates the per-provider pipeline:
/// fetch → relevance filter → dedup → deliver → mark seen.
///
/// Generic over the sink and dedup store via traits, enabling dependency
/// injection and testability without real HTTP or a real database.
pub struct Pipeline<K, D>
where
    K: IngestSink,
    D: DedupStore,
{
    sink: K,
    dedup: D,
    filter: KeywordFilter,
    batch_size: usize,
}

impl<K, D> Pipeline<K, D>
where
    K: IngestSink,
    D: DedupStore,
{
    pub fn new(sink: K, dedup: D, filter: KeywordFilter) -> Self {
        Self {
            sink,
            dedup,
            filter,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Run one provider through the full pipeline.
    ///
    /// Nothing escapes this boundary: every failure is absorbed into the
    /// returned counters so one provider cannot abort the others.
    pub async fn run_source<S: JobSource>(&self, source: &S, query: &FetchQuery) -> RunCounters {
        let name = source.source_name();

        // Market selection is only meaningful for fan-out providers.
        let mut query = query.clone();
        if !source.supports_market_fanout() {
            query.market = None;
        }

        tracing::info!(
            source = name,
            market = query.market.as_deref().unwrap_or("-"),
            "Starting provider run"
        );

        let jobs = match source.fetch(&query).await {
            Ok(jobs) => jobs,
            Err(e) => {
                tracing::error!(source = name, error = %e, "Provider fetch failed");
                return RunCounters::error_unit();
            }
        };

        let fetched = jobs.len() as u64;
        tracing::info!(source = name, fetched, "Fetch complete");

        if jobs.is_empty() {
            return RunCounters::default();
        }

        let relevant = self.filter.filter_jobs(jobs);
        let filtered = fetched - relevant.len() as u64;
        let relevant_count = relevant.len() as u64;

        let new_jobs = match self.dedup.filter_new(relevant).await {
            Ok(new_jobs) => new_jobs,
            Err(e) => {
                tracing::error!(source = name, error = %e, "Dedup lookup failed");
                return RunCounters {
                    fetched,
                    filtered,
                    errors: 1,
                    ..RunCounters::default()
                };
            }
        };

        let local_duplicates = relevant_count - new_jobs.len() as u64;
        if local_duplicates > 0 {
            tracing::info!(source = name, duplicates = local_duplicates, "Dedup cache hit");
        }

        if new_jobs.is_empty() {
            tracing::info!(source = name, "No new jobs to deliver");
            return RunCounters {
                fetched,
                filtered,
                duplicates: relevant_count,
                ..RunCounters::default()
            };
        }

        let outcome = send_in_batches(&self.sink, name, &new_jobs, self.batch_size).await;

        // Marking after delivery: a crash between send and mark re-sends
        // on the next run, which the ingest service absorbs as a
        // duplicate. The reverse order would silently lose jobs.
        let mut errors = outcome.errors;
        if let Err(e) = self.dedup.mark_batch_seen(&new_jobs, name).await {
            tracing::error!(source = name, error = %e, "Failed to record delivered jobs");
            errors += 1;
        }

        let counters = RunCounters {
            fetched,
            filtered,
            accepted: outcome.accepted,
            duplicates: local_duplicates + outcome.duplicates,
            errors,
        };

        tracing::info!(source = name, %counters, "Provider run complete");
        counters
    }

    /// Run every provider independently and sum the counters.
    ///
    /// A failing provider contributes one error unit and never aborts
    /// the remaining providers.
    pub async fn run_all<S: JobSource>(&self, sources: &[S], query: &FetchQuery) -> RunCounters {
        let mut total = RunCounters::default();

        for source in sources {
            total += self.run_source(source, query).await;
        }

        tracing::info!(%total, "All providers complete");
        total
    }
}
