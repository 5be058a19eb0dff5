//! P2P offer fetching.
//!
//! ## Architecture
//!
//! - `source` - [`OfferSource`] trait implemented by upstream clients
//! - `bybit` - Bybit P2P listing REST client
//! - `cache` - single-slot [`QuoteCache`] with an explicit [`CachePolicy`]
//! - `fetcher` - [`OfferFetcher`], the cached, never-failing entry point

pub mod bybit;
pub mod cache;
pub mod error;
pub mod fetcher;
pub mod source;

pub use bybit::{parse_listing, BybitConfig, BybitP2pClient};
pub use cache::{CachePolicy, QuoteCache};
pub use error::*;
pub use fetcher::{FetchStats, FetchStatsSummary, OfferFetcher};
pub use source::OfferSource;
