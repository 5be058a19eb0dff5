//! P2P offer data as returned by the upstream listing.

use crate::QuoteKey;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One P2P advertisement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Offer {
    /// Quoted price in fiat per token
    pub price: Decimal,
    /// Token quantity available
    pub quantity: Decimal,
    /// Advertiser display name
    pub advertiser: String,
    /// Number of orders the advertiser has completed
    pub completed_orders: u64,
    /// Completion rate in percent, when the upstream reports it
    pub completion_rate: Option<Decimal>,
}

/// Offers for one fetch key, in upstream order (best price first).
#[derive(Debug, Clone, PartialEq)]
pub struct OfferBook {
    pub key: QuoteKey,
    pub offers: Vec<Offer>,
    pub fetched_at: DateTime<Utc>,
}

impl OfferBook {
    pub fn new(key: QuoteKey, offers: Vec<Offer>) -> Self {
        Self {
            key,
            offers,
            fetched_at: Utc::now(),
        }
    }

    /// First offer as ranked by the upstream. Not re-sorted locally.
    pub fn best(&self) -> Option<&Offer> {
        self.offers.first()
    }

    pub fn best_price(&self) -> Option<Decimal> {
        self.best().map(|o| o.price)
    }

    /// Up to `n` leading offers.
    pub fn top(&self, n: usize) -> &[Offer] {
        &self.offers[..self.offers.len().min(n)]
    }

    pub fn is_empty(&self) -> bool {
        self.offers.is_empty()
    }
}

/// Buy/sell spread: buy price minus sell price.
/// Negative when the sell side quotes above the buy side.
pub fn spread(buy: &Offer, sell: &Offer) -> Decimal {
    buy.price - sell.price
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Market, Side};
    use std::str::FromStr;

    fn offer(price: &str) -> Offer {
        Offer {
            price: Decimal::from_str(price).unwrap(),
            quantity: Decimal::from(1000),
            advertiser: "trader".to_string(),
            completed_orders: 42,
            completion_rate: None,
        }
    }

    fn book(side: Side, prices: &[&str]) -> OfferBook {
        OfferBook::new(
            QuoteKey::new(side, Market::default()),
            prices.iter().map(|p| offer(p)).collect(),
        )
    }

    #[test]
    fn test_best_keeps_upstream_order() {
        // Upstream order wins even if a later offer is cheaper
        let book = book(Side::Buy, &["532", "531", "533"]);
        assert_eq!(book.best_price(), Some(Decimal::from(532)));
    }

    #[test]
    fn test_top_clamps_to_len() {
        let book = book(Side::Buy, &["1", "2", "3"]);
        assert_eq!(book.top(5).len(), 3);
        assert_eq!(book.top(2).len(), 2);
        assert!(book.top(0).is_empty());
    }

    #[test]
    fn test_empty_book_has_no_best() {
        let book = book(Side::Buy, &[]);
        assert!(book.is_empty());
        assert_eq!(book.best_price(), None);
    }

    #[test]
    fn test_spread() {
        let spread = spread(&offer("535.10"), &offer("533.00"));
        assert_eq!(spread, Decimal::from_str("2.10").unwrap());
    }

    #[test]
    fn test_spread_can_be_negative() {
        assert_eq!(spread(&offer("530"), &offer("531.5")), Decimal::from_str("-1.5").unwrap());
    }
}
