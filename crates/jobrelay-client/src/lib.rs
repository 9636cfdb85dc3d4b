//! HTTP surface: provider adapters and the ingest delivery client.

pub mod adapters;
pub mod config;
mod http;
pub mod ingest;

pub use adapters::{Adapter, AdzunaAdapter, CareerJetAdapter, JoobleAdapter};
pub use config::IngestConfig;
pub use ingest::IngestClient;
