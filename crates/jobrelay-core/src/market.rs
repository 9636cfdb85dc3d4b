//! Regional market catalog for providers partitioned by country.
//!
//! Each market carries the currency used to render salary text for jobs
//! fetched under it. The table is fixed, version-controlled data — never
//! mutated at runtime.

/// One regional partition of a provider catalog.
#[derive(Debug, PartialEq, Eq)]
pub struct Market {
    /// Two-letter market code (lowercase).
    pub code: &'static str,
    /// Display name for logging.
    pub name: &'static str,
    /// ISO 4217 currency code for salary rendering.
    pub currency: &'static str,
}

/// All supported markets.
pub const MARKETS: &[Market] = &[
    Market { code: "gb", name: "Great Britain", currency: "GBP" },
    Market { code: "us", name: "United States", currency: "USD" },
    Market { code: "au", name: "Australia", currency: "AUD" },
    Market { code: "ca", name: "Canada", currency: "CAD" },
    Market { code: "de", name: "Germany", currency: "EUR" },
    Market { code: "fr", name: "France", currency: "EUR" },
    Market { code: "in", name: "India", currency: "INR" },
    Market { code: "nl", name: "Netherlands", currency: "EUR" },
    Market { code: "nz", name: "New Zealand", currency: "NZD" },
    Market { code: "sg", name: "Singapore", currency: "SGD" },
    Market { code: "za", name: "South Africa", currency: "ZAR" },
    Market { code: "at", name: "Austria", currency: "EUR" },
    Market { code: "br", name: "Brazil", currency: "BRL" },
    Market { code: "it", name: "Italy", currency: "EUR" },
    Market { code: "pl", name: "Poland", currency: "PLN" },
];

/// Look up a market by its lowercase code.
pub fn find_market(code: &str) -> Option<&'static Market> {
    MARKETS.iter().find(|m| m.code == code)
}

/// Resolve a market selector into a concrete fan-out set.
///
/// `"all"` (case-insensitive) yields every configured market. A
/// comma-separated list is lower-cased, trimmed per entry, and filtered
/// to configured codes. An empty filtered set falls back to all markets
/// rather than an empty fan-out.
pub fn resolve_markets(selector: &str) -> Vec<&'static Market> {
    if selector.trim().eq_ignore_ascii_case("all") {
        return MARKETS.iter().collect();
    }

    let resolved: Vec<&'static Market> = selector
        .split(',')
        .map(|code| code.trim().to_lowercase())
        .filter_map(|code| find_market(&code))
        .collect();

    if resolved.is_empty() {
        tracing::warn!(%selector, "No valid market codes in selector, using all markets");
        return MARKETS.iter().collect();
    }

    resolved
}
