//! Token/fiat market and cache key types.

use crate::Side;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A P2P market: the traded token and the fiat currency it is quoted in.
///
/// Symbols are uppercased on construction, including when deserialized.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "MarketFields")]
pub struct Market {
    /// Traded asset symbol (e.g. "USDT")
    pub token: String,
    /// Fiat currency symbol (e.g. "KZT")
    pub currency: String,
}

impl Default for Market {
    fn default() -> Self {
        Self::new("USDT", "KZT")
    }
}

#[derive(Deserialize)]
#[serde(default)]
struct MarketFields {
    token: String,
    currency: String,
}

impl Default for MarketFields {
    fn default() -> Self {
        let Market { token, currency } = Market::default();
        Self { token, currency }
    }
}

impl From<MarketFields> for Market {
    fn from(fields: MarketFields) -> Self {
        Market::new(fields.token, fields.currency)
    }
}

impl Market {
    pub fn new(token: impl Into<String>, currency: impl Into<String>) -> Self {
        Self {
            token: token.into().to_uppercase(),
            currency: currency.into().to_uppercase(),
        }
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.token, self.currency)
    }
}

/// Exact parameter tuple of an offer fetch.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QuoteKey {
    pub side: Side,
    pub market: Market,
}

impl QuoteKey {
    pub fn new(side: Side, market: Market) -> Self {
        Self { side, market }
    }
}

impl fmt::Display for QuoteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.side, self.market)
    }
}
