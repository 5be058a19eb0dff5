//! Cached offer fetching.
//!
//! [`OfferFetcher`] is the only path to upstream data. It never returns an
//! error: failures are logged and reported as `None` (no data).

use crate::{CachePolicy, OfferSource, QuoteCache};
use p2p_core::{Market, OfferBook, QuoteKey, Side};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, warn};

/// Fetch counters.
#[derive(Debug, Default)]
pub struct FetchStats {
    pub upstream_calls: AtomicU64,
    pub cache_hits: AtomicU64,
    pub failures: AtomicU64,
}

/// Snapshot of [`FetchStats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchStatsSummary {
    pub upstream_calls: u64,
    pub cache_hits: u64,
    pub failures: u64,
}

impl FetchStats {
    pub fn summary(&self) -> FetchStatsSummary {
        FetchStatsSummary {
            upstream_calls: self.upstream_calls.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }
}

/// Upstream source behind a single-slot cache.
pub struct OfferFetcher {
    source: Arc<dyn OfferSource>,
    // Held across the upstream call so concurrent fetches are single-flight.
    cache: Mutex<QuoteCache>,
    stats: FetchStats,
}

impl OfferFetcher {
    pub fn new(source: Arc<dyn OfferSource>, policy: CachePolicy) -> Self {
        Self {
            source,
            cache: Mutex::new(QuoteCache::new(policy)),
            stats: FetchStats::default(),
        }
    }

    /// Current offers for `side` on `market`, or `None` if the upstream is unavailable.
    pub async fn fetch(&self, side: Side, market: &Market) -> Option<Arc<OfferBook>> {
        let key = QuoteKey::new(side, market.clone());
        let mut cache = self.cache.lock().await;

        if let Some(book) = cache.get(&key) {
            self.stats.cache_hits.fetch_add(1, Ordering::Relaxed);
            debug!("Serving cached {} offers", key);
            return Some(book);
        }

        self.stats.upstream_calls.fetch_add(1, Ordering::Relaxed);

        match self.source.fetch_offers(&key).await {
            Ok(offers) if offers.is_empty() => {
                self.stats.failures.fetch_add(1, Ordering::Relaxed);
                warn!(source = self.source.name(), key = %key, "Upstream returned no offers");
                None
            }
            Ok(offers) => {
                let book = Arc::new(OfferBook::new(key, offers));
                cache.put(Arc::clone(&book));
                Some(book)
            }
            Err(e) => {
                self.stats.failures.fetch_add(1, Ordering::Relaxed);
                if e.is_transient() {
                    warn!(
                        source = self.source.name(),
                        key = %key,
                        error = %e,
                        retry_after = ?e.suggested_retry_delay(),
                        "Offer fetch failed"
                    );
                } else {
                    error!(source = self.source.name(), key = %key, error = %e, "Offer fetch failed");
                }
                None
            }
        }
    }

    /// Drop any cached quote.
    pub async fn invalidate(&self) {
        self.cache.lock().await.invalidate();
    }

    pub fn stats(&self) -> FetchStatsSummary {
        self.stats.summary()
    }
}
