use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholder cell for an asset with no numeric price this cycle.
pub const UNAVAILABLE: &str = "N/A";

/// A single quote returned by the price provider. Unavailability is a
/// distinct variant so it can never be fed into fixed-point formatting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PriceQuote {
    Price(f64),
    Unavailable,
}

impl PriceQuote {
    pub fn as_price(&self) -> Option<f64> {
        match self {
            PriceQuote::Price(value) => Some(*value),
            PriceQuote::Unavailable => None,
        }
    }
}

impl fmt::Display for PriceQuote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PriceQuote::Price(value) => write!(f, "{value:.5}"),
            PriceQuote::Unavailable => write!(f, "{UNAVAILABLE}"),
        }
    }
}
