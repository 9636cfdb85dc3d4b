pub mod counters;
pub mod error;
pub mod filter;
pub mod job;
pub mod market;
pub mod pipeline;
pub mod retry;
pub mod testutil;
pub mod traits;

pub use counters::RunCounters;
pub use error::AppError;
pub use filter::KeywordFilter;
pub use job::{EmploymentType, ScrapedJob};
pub use pipeline::Pipeline;
pub use traits::{DedupStore, FetchQuery, IngestSink, JobSource};
