//! Persistence layer: the SQLite deduplication cache.

pub mod dedup;

pub use dedup::DedupCache;
