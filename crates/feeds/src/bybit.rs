//! Bybit P2P listing REST client.
//!
//! Queries `POST /fiat/otc/item/online` and maps `result.items[]` to [`Offer`]s.

use crate::{FeedError, OfferSource};
use async_trait::async_trait;
use p2p_core::{Offer, QuoteKey};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, warn};

/// Client settings for the Bybit P2P endpoint.
#[derive(Debug, Clone)]
pub struct BybitConfig {
    /// Full listing URL
    pub endpoint: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Result page to request
    pub page: u32,
    /// Fiat amount filter sent with the query
    pub amount: String,
}

impl Default for BybitConfig {
    fn default() -> Self {
        Self {
            endpoint: BybitP2pClient::DEFAULT_ENDPOINT.to_string(),
            timeout: Duration::from_secs(10),
            page: 1,
            amount: "1000".to_string(),
        }
    }
}

/// Request body. Bybit expects every field as a string.
#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ListingRequest<'a> {
    token_id: &'a str,
    currency_id: &'a str,
    side: &'a str,
    page: String,
    amount: &'a str,
}

#[derive(Debug, Deserialize)]
struct ListingResponse {
    #[serde(default, alias = "retCode")]
    ret_code: i64,
    #[serde(default, alias = "retMsg")]
    ret_msg: String,
    result: Option<ListingResult>,
}

#[derive(Debug, Deserialize)]
struct ListingResult {
    // Decoded one by one so a single bad item does not sink the listing
    #[serde(default)]
    items: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListingItem {
    #[serde(deserialize_with = "decimal_lenient")]
    price: Decimal,
    #[serde(deserialize_with = "decimal_lenient")]
    quantity: Decimal,
    #[serde(default)]
    nick_name: String,
    #[serde(default, deserialize_with = "count_lenient")]
    completed_order_num: u64,
    #[serde(default, deserialize_with = "optional_decimal_lenient")]
    completed_rate: Option<Decimal>,
}

impl From<ListingItem> for Offer {
    fn from(item: ListingItem) -> Self {
        Offer {
            price: item.price,
            quantity: item.quantity,
            advertiser: item.nick_name,
            completed_orders: item.completed_order_num,
            completion_rate: item.completed_rate,
        }
    }
}

/// Number fields arrive either as JSON strings or JSON numbers.
#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(serde_json::Number),
    String(String),
}

impl NumberOrString {
    fn as_text(&self) -> String {
        match self {
            NumberOrString::Number(n) => n.to_string(),
            NumberOrString::String(s) => s.trim().to_string(),
        }
    }
}

fn parse_decimal(text: &str) -> Option<Decimal> {
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
}

fn decimal_lenient<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Decimal, D::Error> {
    let raw = NumberOrString::deserialize(deserializer)?;
    let text = raw.as_text();
    parse_decimal(&text)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid decimal: {text:?}")))
}

fn optional_decimal_lenient<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Decimal>, D::Error> {
    let raw = Option::<NumberOrString>::deserialize(deserializer)?;
    Ok(raw.and_then(|r| parse_decimal(&r.as_text())))
}

fn count_lenient<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    let raw = Option::<NumberOrString>::deserialize(deserializer)?;
    match raw {
        None => Ok(0),
        Some(r) => {
            let text = r.as_text();
            if text.is_empty() {
                return Ok(0);
            }
            text.parse::<u64>()
                .map_err(|_| serde::de::Error::custom(format!("invalid count: {text:?}")))
        }
    }
}

/// Parse a listing response body into offers.
///
/// Malformed items are skipped. The listing fails only when it has no
/// items or none of them decode.
pub fn parse_listing(body: &str) -> Result<Vec<Offer>, FeedError> {
    let response: ListingResponse = serde_json::from_str(body)?;

    if response.ret_code != 0 {
        return Err(FeedError::Upstream {
            code: response.ret_code,
            message: response.ret_msg,
        });
    }

    let result = response
        .result
        .ok_or_else(|| FeedError::Parse("missing result".to_string()))?;

    if result.items.is_empty() {
        return Err(FeedError::NoOffers);
    }

    let total = result.items.len();
    let mut last_error = None;
    let offers: Vec<Offer> = result
        .items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<ListingItem>(item) {
            Ok(item) => Some(Offer::from(item)),
            Err(e) => {
                warn!(error = %e, "Bybit: Skipping malformed listing item");
                last_error = Some(e);
                None
            }
        })
        .collect();

    match last_error {
        Some(e) if offers.is_empty() => Err(e.into()),
        _ => {
            if offers.len() < total {
                debug!("Bybit: Kept {} of {} listing items", offers.len(), total);
            }
            Ok(offers)
        }
    }
}

/// Bybit P2P REST client.
pub struct BybitP2pClient {
    http: reqwest::Client,
    config: BybitConfig,
}

impl BybitP2pClient {
    pub const DEFAULT_ENDPOINT: &'static str = "https://api2.bybit.com/fiat/otc/item/online";

    pub fn new(config: BybitConfig) -> Result<Self, FeedError> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { http, config })
    }

    pub(crate) fn request_body<'a>(&'a self, key: &'a QuoteKey) -> ListingRequest<'a> {
        ListingRequest {
            token_id: &key.market.token,
            currency_id: &key.market.currency,
            side: key.side.upstream_code(),
            page: self.config.page.to_string(),
            amount: &self.config.amount,
        }
    }
}

#[async_trait]
impl OfferSource for BybitP2pClient {
    async fn fetch_offers(&self, key: &QuoteKey) -> Result<Vec<Offer>, FeedError> {
        debug!("Bybit: Fetching {} offers", key);

        let response = self
            .http
            .post(&self.config.endpoint)
            .json(&self.request_body(key))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::HttpStatus(status.as_u16()));
        }

        let body = response.text().await?;
        let offers = parse_listing(&body)?;

        debug!("Bybit: Received {} offers for {}", offers.len(), key);
        Ok(offers)
    }

    fn name(&self) -> &str {
        "bybit"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use p2p_core::{Market, Side};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_request_body() {
        let client = BybitP2pClient::new(BybitConfig::default()).unwrap();
        let key = QuoteKey::new(Side::Buy, Market::default());
        let body = serde_json::to_value(client.request_body(&key)).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "tokenId": "USDT",
                "currencyId": "KZT",
                "side": "1",
                "page": "1",
                "amount": "1000"
            })
        );
    }

    #[test]
    fn test_parse_listing() {
        let body = r#"{
            "ret_code": 0,
            "ret_msg": "SUCCESS",
            "result": {
                "count": 2,
                "items": [
                    {"price": "532.50", "quantity": "1500.25", "nickName": "alpha",
                     "completedOrderNum": 812, "completedRate": "98.5"},
                    {"price": 533, "quantity": 10, "nickName": "beta",
                     "completedOrderNum": "15"}
                ]
            }
        }"#;

        let offers = parse_listing(body).unwrap();
        assert_eq!(offers.len(), 2);
        assert_eq!(
            offers[0],
            Offer {
                price: Decimal::from_str("532.50").unwrap(),
                quantity: Decimal::from_str("1500.25").unwrap(),
                advertiser: "alpha".to_string(),
                completed_orders: 812,
                completion_rate: Some(Decimal::from_str("98.5").unwrap()),
            }
        );
        assert_eq!(offers[1].price, Decimal::from(533));
        assert_eq!(offers[1].completed_orders, 15);
        assert_eq!(offers[1].completion_rate, None);
    }

    #[test]
    fn test_parse_listing_missing_result() {
        let err = parse_listing(r#"{"ret_code": 0, "ret_msg": "ok"}"#).unwrap_err();
        assert!(matches!(err, FeedError::Parse(_)));
    }

    #[test]
    fn test_parse_listing_empty_items() {
        let err = parse_listing(r#"{"ret_code": 0, "result": {"items": []}}"#).unwrap_err();
        assert!(matches!(err, FeedError::NoOffers));
    }

    #[test]
    fn test_parse_listing_upstream_error() {
        let err = parse_listing(r#"{"ret_code": 10001, "ret_msg": "params error", "result": null}"#)
            .unwrap_err();
        match err {
            FeedError::Upstream { code, message } => {
                assert_eq!(code, 10001);
                assert_eq!(message, "params error");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_parse_listing_skips_bad_items() {
        let body = r#"{
            "ret_code": 0,
            "result": {
                "items": [
                    {"price": "531", "quantity": "5", "nickName": "broken", "completedOrderNum": -1},
                    {"price": "532", "quantity": "20", "nickName": "alpha", "completedOrderNum": 40},
                    {"price": "oops", "quantity": "1"},
                    {"price": "533", "quantity": "30", "nickName": "beta"}
                ]
            }
        }"#;

        let offers = parse_listing(body).unwrap();
        let names: Vec<&str> = offers.iter().map(|o| o.advertiser.as_str()).collect();
        assert_eq!(names, vec!["alpha", "beta"]);
        assert_eq!(offers[0].price, Decimal::from(532));
    }

    #[test]
    fn test_parse_listing_malformed() {
        assert!(matches!(parse_listing("<html>"), Err(FeedError::Parse(_))));
        let bad_price = r#"{"result": {"items": [{"price": "abc", "quantity": "1"}]}}"#;
        assert!(matches!(parse_listing(bad_price), Err(FeedError::Parse(_))));
    }
}
