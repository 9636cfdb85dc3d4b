use std::fmt;
use std::ops::{Add, AddAssign};

/// Transient per-run aggregate. Produced per provider run and summed
/// across providers; never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunCounters {
    /// Raw results fetched from the provider.
    pub fetched: u64,
    /// Dropped by the relevance filter.
    pub filtered: u64,
    /// Accepted by the ingest service.
    pub accepted: u64,
    /// Previously seen (dedup store) or rejected as duplicates downstream.
    pub duplicates: u64,
    /// Failed deliveries plus provider-level failures.
    pub errors: u64,
}

impl RunCounters {
    /// Counters for a provider run that failed before producing anything.
    pub fn error_unit() -> Self {
        Self {
            errors: 1,
            ..Self::default()
        }
    }
}

impl Add for RunCounters {
    type Output = RunCounters;

    fn add(self, rhs: RunCounters) -> RunCounters {
        RunCounters {
            fetched: self.fetched + rhs.fetched,
            filtered: self.filtered + rhs.filtered,
            accepted: self.accepted + rhs.accepted,
            duplicates: self.duplicates + rhs.duplicates,
            errors: self.errors + rhs.errors,
        }
    }
}

impl AddAssign for RunCounters {
    fn add_assign(&mut self, rhs: RunCounters) {
        *self = *self + rhs;
    }
}

impl fmt::Display for RunCounters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "fetched={}, filtered={}, accepted={}, duplicates={}, errors={}",
            self.fetched, self.filtered, self.accepted, self.duplicates, self.errors
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_sum_fieldwise() {
        let mut total = RunCounters::default();
        total += RunCounters {
            fetched: 10,
            filtered: 3,
            accepted: 5,
            duplicates: 2,
            errors: 0,
        };
        total += RunCounters::error_unit();

        assert_eq!(total.fetched, 10);
        assert_eq!(total.accepted, 5);
        assert_eq!(total.errors, 1);
    }
}
