//! Upstream offer source abstraction.

use crate::FeedError;
use async_trait::async_trait;
use p2p_core::{Offer, QuoteKey};

/// Something that can list P2P offers for a side and market.
#[async_trait]
pub trait OfferSource: Send + Sync {
    /// Fetch offers in upstream order. An empty listing is `FeedError::NoOffers`.
    async fn fetch_offers(&self, key: &QuoteKey) -> Result<Vec<Offer>, FeedError>;

    /// Short name used in log output.
    fn name(&self) -> &str;
}
