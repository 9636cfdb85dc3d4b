//! Provider adapters and their dispatch.

pub mod adzuna;
pub mod careerjet;
pub mod jooble;

use jobrelay_core::job::ScrapedJob;
use jobrelay_core::traits::{FetchQuery, JobSource};
use jobrelay_core::AppError;

pub use adzuna::AdzunaAdapter;
pub use careerjet::CareerJetAdapter;
pub use jooble::JoobleAdapter;

/// Closed set of providers, dispatched by enum rather than trait object
/// so the `JobSource` futures stay nameable and `Send`.
#[derive(Debug)]
pub enum Adapter {
    Adzuna(AdzunaAdapter),
    CareerJet(CareerJetAdapter),
    Jooble(JoobleAdapter),
}

impl Adapter {
    /// Instantiate every provider from its environment credentials.
    ///
    /// Providers without credentials are still constructed; they fetch
    /// empty with a warning, so a partially-configured deployment runs
    /// the sources it can.
    pub fn all_from_env() -> Result<Vec<Adapter>, AppError> {
        Ok(vec![
            Adapter::Adzuna(AdzunaAdapter::from_env()?),
            Adapter::CareerJet(CareerJetAdapter::from_env()?),
            Adapter::Jooble(JoobleAdapter::from_env()?),
        ])
    }

    /// Instantiate a single provider by its source name.
    pub fn by_name(name: &str) -> Result<Adapter, AppError> {
        match name.to_lowercase().as_str() {
            "adzuna" => Ok(Adapter::Adzuna(AdzunaAdapter::from_env()?)),
            "careerjet" => Ok(Adapter::CareerJet(CareerJetAdapter::from_env()?)),
            "jooble" => Ok(Adapter::Jooble(JoobleAdapter::from_env()?)),
            other => Err(AppError::ConfigError(format!(
                "Unknown source '{other}' (expected adzuna, careerjet, or jooble)"
            ))),
        }
    }
}

impl JobSource for Adapter {
    fn source_name(&self) -> &'static str {
        match self {
            Adapter::Adzuna(a) => a.source_name(),
            Adapter::CareerJet(a) => a.source_name(),
            Adapter::Jooble(a) => a.source_name(),
        }
    }

    fn supports_market_fanout(&self) -> bool {
        match self {
            Adapter::Adzuna(a) => a.supports_market_fanout(),
            Adapter::CareerJet(a) => a.supports_market_fanout(),
            Adapter::Jooble(a) => a.supports_market_fanout(),
        }
    }

    async fn fetch(&self, query: &FetchQuery) -> Result<Vec<ScrapedJob>, AppError> {
        match self {
            Adapter::Adzuna(a) => a.fetch(query).await,
            Adapter::CareerJet(a) => a.fetch(query).await,
            Adapter::Jooble(a) => a.fetch(query).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn by_name_rejects_unknown_source() {
        let err = Adapter::by_name("linkedin").unwrap_err();
        assert!(matches!(err, AppError::ConfigError(_)));
    }

    #[test]
    fn by_name_is_case_insensitive() {
        let adapter = Adapter::by_name("Adzuna").unwrap();
        assert_eq!(adapter.source_name(), "adzuna");
        assert!(adapter.supports_market_fanout());
    }

    #[test]
    fn only_adzuna_fans_out_across_markets() {
        let all = Adapter::all_from_env().unwrap();
        assert_eq!(all.len(), 3);
        for adapter in &all {
            assert_eq!(
                adapter.supports_market_fanout(),
                adapter.source_name() == "adzuna"
            );
        }
    }
}
