//! Periodic price check that fires and clears user alerts.

use crate::format::render_alert_triggered;
use crate::{AlertRegistry, AlertSink};
use p2p_core::{Market, Side};
use p2p_feeds::OfferFetcher;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

/// Result of one price check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Upstream unavailable; registry untouched.
    Skipped,
    Checked {
        price: Decimal,
        delivered: usize,
        failed: usize,
    },
}

/// Fetches the best buy price and notifies every user whose target it reaches.
pub struct PriceChecker {
    fetcher: Arc<OfferFetcher>,
    registry: Arc<AlertRegistry>,
    sink: Arc<dyn AlertSink>,
    market: Market,
}

impl PriceChecker {
    pub fn new(
        fetcher: Arc<OfferFetcher>,
        registry: Arc<AlertRegistry>,
        sink: Arc<dyn AlertSink>,
        market: Market,
    ) -> Self {
        Self {
            fetcher,
            registry,
            sink,
            market,
        }
    }

    /// Run a single check.
    pub async fn tick(&self) -> TickOutcome {
        let Some(price) = self
            .fetcher
            .fetch(Side::Buy, &self.market)
            .await
            .and_then(|book| book.best_price())
        else {
            debug!("No price data, skipping alert check");
            return TickOutcome::Skipped;
        };

        let matched = self.registry.scan_and_consume(price);
        if matched.is_empty() {
            debug!(price = %price, pending = self.registry.len(), "No alerts triggered");
            return TickOutcome::Checked {
                price,
                delivered: 0,
                failed: 0,
            };
        }

        let message = render_alert_triggered(price, &self.market);
        let mut delivered = 0;
        let mut failed = 0;

        // Entries are already removed; a failed delivery drops the alert.
        for entry in matched {
            match self.sink.deliver(entry.user, &message).await {
                Ok(()) => {
                    info!(
                        user = %entry.user,
                        target = %entry.target_price,
                        price = %price,
                        "Alert sent"
                    );
                    delivered += 1;
                }
                Err(e) => {
                    error!(user = %entry.user, error = %e, "Failed to send alert");
                    failed += 1;
                }
            }
        }

        TickOutcome::Checked {
            price,
            delivered,
            failed,
        }
    }

    /// Check every `period` until `shutdown` flips to true or its sender is dropped.
    ///
    /// Checks run one after another; a slow upstream delays the next check
    /// instead of overlapping it.
    pub async fn run(self, period: Duration, mut shutdown: watch::Receiver<bool>) {
        info!("Starting price checker (every {:?})", period);

        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // First tick completes immediately; the first check runs one period after start.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let TickOutcome::Checked { price, delivered, failed } = self.tick().await {
                        if delivered + failed > 0 {
                            info!(price = %price, delivered, failed, "Alert check complete");
                        }
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Price checker stopped");
    }
}
