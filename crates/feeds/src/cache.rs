//! Single-slot quote cache.
//!
//! Holds the most recent [`OfferBook`]. A fetch for a different key
//! overwrites the slot, so at most one quote is ever cached.

use p2p_core::{OfferBook, QuoteKey};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// How long a cached quote may be served.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// Serve the cached quote until the slot is overwritten or invalidated.
    Forever,
    /// Serve the cached quote while it is younger than the given age.
    Ttl(Duration),
    /// Never serve from cache.
    Disabled,
}

impl Default for CachePolicy {
    fn default() -> Self {
        CachePolicy::Ttl(Duration::from_secs(30))
    }
}

impl CachePolicy {
    /// `None` keeps quotes forever, `Some(0)` disables caching.
    pub fn from_ttl_secs(ttl_secs: Option<u64>) -> Self {
        match ttl_secs {
            None => CachePolicy::Forever,
            Some(0) => CachePolicy::Disabled,
            Some(secs) => CachePolicy::Ttl(Duration::from_secs(secs)),
        }
    }

    fn is_fresh(&self, age: Duration) -> bool {
        match self {
            CachePolicy::Forever => true,
            CachePolicy::Ttl(ttl) => age < *ttl,
            CachePolicy::Disabled => false,
        }
    }
}

#[derive(Debug)]
struct CachedQuote {
    book: Arc<OfferBook>,
    stored_at: Instant,
}

/// Single-slot cache keyed by the exact fetch parameters.
///
/// Not synchronized; the owner guards it.
#[derive(Debug, Default)]
pub struct QuoteCache {
    policy: CachePolicy,
    slot: Option<CachedQuote>,
}

impl QuoteCache {
    pub fn new(policy: CachePolicy) -> Self {
        Self { policy, slot: None }
    }

    /// Cached book for `key`, if present and fresh.
    pub fn get(&self, key: &QuoteKey) -> Option<Arc<OfferBook>> {
        self.get_at(key, Instant::now())
    }

    pub(crate) fn get_at(&self, key: &QuoteKey, now: Instant) -> Option<Arc<OfferBook>> {
        let cached = self.slot.as_ref()?;
        if cached.book.key != *key {
            return None;
        }
        let age = now.saturating_duration_since(cached.stored_at);
        self.policy.is_fresh(age).then(|| Arc::clone(&cached.book))
    }

    /// Store `book`, replacing whatever the slot held.
    pub fn put(&mut self, book: Arc<OfferBook>) {
        self.put_at(book, Instant::now());
    }

    pub(crate) fn put_at(&mut self, book: Arc<OfferBook>, now: Instant) {
        if self.policy == CachePolicy::Disabled {
            return;
        }
        self.slot = Some(CachedQuote {
            book,
            stored_at: now,
        });
    }

    /// Drop the cached quote, forcing the next fetch upstream.
    pub fn invalidate(&mut self) {
        self.slot = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use p2p_core::{Market, Offer, Side};
    use rust_decimal::Decimal;

    fn book(side: Side) -> Arc<OfferBook> {
        let offer = Offer {
            price: Decimal::from(532),
            quantity: Decimal::from(100),
            advertiser: "alpha".to_string(),
            completed_orders: 1,
            completion_rate: None,
        };
        Arc::new(OfferBook::new(
            QuoteKey::new(side, Market::default()),
            vec![offer],
        ))
    }

    fn key(side: Side) -> QuoteKey {
        QuoteKey::new(side, Market::default())
    }

    #[test]
    fn test_policy_from_ttl_secs() {
        assert_eq!(CachePolicy::from_ttl_secs(None), CachePolicy::Forever);
        assert_eq!(CachePolicy::from_ttl_secs(Some(0)), CachePolicy::Disabled);
        assert_eq!(
            CachePolicy::from_ttl_secs(Some(30)),
            CachePolicy::Ttl(Duration::from_secs(30))
        );
    }

    #[test]
    fn test_hit_returns_same_arc() {
        let mut cache = QuoteCache::new(CachePolicy::Forever);
        let stored = book(Side::Buy);
        cache.put(Arc::clone(&stored));

        let hit = cache.get(&key(Side::Buy)).unwrap();
        assert!(Arc::ptr_eq(&hit, &stored));
    }

    #[test]
    fn test_other_key_misses_and_overwrites() {
        let mut cache = QuoteCache::new(CachePolicy::Forever);
        cache.put(book(Side::Buy));
        assert!(cache.get(&key(Side::Sell)).is_none());

        cache.put(book(Side::Sell));
        assert!(cache.get(&key(Side::Buy)).is_none());
        assert!(cache.get(&key(Side::Sell)).is_some());
    }

    #[test]
    fn test_ttl_expiry() {
        let mut cache = QuoteCache::new(CachePolicy::Ttl(Duration::from_secs(30)));
        let start = Instant::now();
        cache.put_at(book(Side::Buy), start);

        assert!(cache
            .get_at(&key(Side::Buy), start + Duration::from_secs(29))
            .is_some());
        assert!(cache
            .get_at(&key(Side::Buy), start + Duration::from_secs(30))
            .is_none());
    }

    #[test]
    fn test_forever_never_expires() {
        let mut cache = QuoteCache::new(CachePolicy::Forever);
        let start = Instant::now();
        cache.put_at(book(Side::Buy), start);
        assert!(cache
            .get_at(&key(Side::Buy), start + Duration::from_secs(86_400))
            .is_some());
    }

    #[test]
    fn test_disabled_never_stores() {
        let mut cache = QuoteCache::new(CachePolicy::Disabled);
        cache.put(book(Side::Buy));
        assert!(cache.get(&key(Side::Buy)).is_none());
        assert!(cache.slot.is_none());
    }

    #[test]
    fn test_invalidate() {
        let mut cache = QuoteCache::new(CachePolicy::Forever);
        cache.put(book(Side::Buy));
        cache.invalidate();
        assert!(cache.get(&key(Side::Buy)).is_none());
    }
}
