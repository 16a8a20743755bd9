use nabi_shared_models::{PriceQuote, UNAVAILABLE};
use std::collections::BTreeMap;

/// Percent change of `current` against `previous`.
pub fn percent_change(previous: f64, current: f64) -> f64 {
    (current - previous) / previous * 100.0
}

/// Render a percent change with explicit sign and 5 decimals, e.g. `+0.15366`.
/// Rounding follows Rust's standard float formatting: the exact binary value
/// is rounded to the nearest 5-decimal string, ties to even.
pub fn format_change(change_pct: f64) -> String {
    format!("{change_pct:+.5}")
}

/// One asset observation for one cycle. Created once, never mutated; the
/// persisted log is append-only at the row level.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceReading {
    pub timestamp: String,
    pub asset: String,
    pub price: PriceQuote,
    pub change_pct: Option<f64>,
}

impl PriceReading {
    /// Build a reading from the current quote and the previous numeric price.
    /// The change is computed only for a numeric-to-numeric transition with a
    /// non-zero previous price; in every other case it stays unavailable.
    pub fn observe(
        timestamp: String,
        asset: String,
        quote: PriceQuote,
        previous: Option<f64>,
    ) -> Self {
        let change_pct = match (previous, quote) {
            (Some(prev), PriceQuote::Price(current)) if prev != 0.0 => {
                Some(percent_change(prev, current))
            }
            _ => None,
        };

        Self {
            timestamp,
            asset,
            price: quote,
            change_pct,
        }
    }

    /// `Price (USD)` cell: 5 fixed decimals or the unavailable sentinel.
    pub fn price_cell(&self) -> String {
        self.price.to_string()
    }

    /// `Change (%)` cell: signed 5 fixed decimals or the unavailable sentinel.
    pub fn change_cell(&self) -> String {
        match self.change_pct {
            Some(change) => format_change(change),
            None => UNAVAILABLE.to_string(),
        }
    }
}

/// Most recently observed numeric price per asset. Lives only in process
/// memory for one run; an unavailable quote never displaces a stored price.
#[derive(Debug, Default, Clone)]
pub struct LastPriceTable(BTreeMap<String, f64>);

impl LastPriceTable {
    pub fn previous(&self, asset: &str) -> Option<f64> {
        self.0.get(asset).copied()
    }

    pub fn record(&mut self, asset: &str, quote: PriceQuote) {
        if let Some(value) = quote.as_price() {
            self.0.insert(asset.to_string(), value);
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn observe(quote: PriceQuote, previous: Option<f64>) -> PriceReading {
        PriceReading::observe(
            "2026-08-24 12:00:00".to_string(),
            "bitcoin".to_string(),
            quote,
            previous,
        )
    }

    #[test]
    fn first_observation_has_no_change() {
        let reading = observe(PriceQuote::Price(65000.12345), None);

        assert_eq!(reading.price_cell(), "65000.12345");
        assert_eq!(reading.change_cell(), "N/A");
    }

    #[test]
    fn numeric_transition_formats_signed_five_decimals() {
        let reading = observe(PriceQuote::Price(65100.0), Some(65000.12345));

        // (65100 - 65000.12345) / 65000.12345 * 100 = 0.15365594...
        assert_eq!(reading.change_cell(), "+0.15366");
    }

    #[test]
    fn negative_change_carries_its_sign() {
        let reading = observe(PriceQuote::Price(99.0), Some(100.0));

        assert_eq!(reading.change_cell(), "-1.00000");
    }

    #[test]
    fn unavailable_quote_yields_unavailable_change_despite_history() {
        let reading = observe(PriceQuote::Unavailable, Some(65000.12345));

        assert_eq!(reading.price_cell(), "N/A");
        assert_eq!(reading.change_cell(), "N/A");
    }

    #[test]
    fn zero_previous_price_yields_unavailable_change() {
        let reading = observe(PriceQuote::Price(1.0), Some(0.0));

        assert_eq!(reading.change_cell(), "N/A");
    }

    #[test]
    fn table_keeps_last_numeric_price_across_gaps() {
        let mut table = LastPriceTable::default();
        assert!(table.is_empty());

        table.record("bitcoin", PriceQuote::Price(65000.12345));
        table.record("bitcoin", PriceQuote::Unavailable);

        assert_eq!(table.previous("bitcoin"), Some(65000.12345));
        assert_eq!(table.previous("ethereum"), None);
        assert_eq!(table.len(), 1);
    }
}
