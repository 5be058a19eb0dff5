//! In-memory per-user price alert registry.

use dashmap::DashMap;
use p2p_core::{AlertEntry, UserId};
use rust_decimal::Decimal;
use std::str::FromStr;
use thiserror::Error;

/// Rejected `/set_alert` argument.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AlertError {
    #[error("missing target price")]
    MissingArgument,
    #[error("not a number: {0:?}")]
    MalformedArgument(String),
    #[error("target price must be positive, got {0}")]
    NotPositive(Decimal),
}

/// Parse a user-supplied target price.
///
/// Only the first whitespace-separated token is read. Accepts plain and
/// scientific notation; the value must be strictly positive.
pub fn parse_target(arg: &str) -> Result<Decimal, AlertError> {
    let token = arg
        .split_whitespace()
        .next()
        .ok_or(AlertError::MissingArgument)?;

    let value = Decimal::from_str(token)
        .or_else(|_| Decimal::from_scientific(token))
        .map_err(|_| AlertError::MalformedArgument(token.to_string()))?;

    if value <= Decimal::ZERO {
        return Err(AlertError::NotPositive(value));
    }
    Ok(value)
}

/// One target price per user. Shared between command handlers and the price checker.
#[derive(Debug, Default)]
pub struct AlertRegistry {
    alerts: DashMap<UserId, Decimal>,
}

impl AlertRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the user's alert. Returns the previous target.
    pub fn set_alert(&self, user: UserId, target_price: Decimal) -> Option<Decimal> {
        self.alerts.insert(user, target_price)
    }

    pub fn get(&self, user: UserId) -> Option<Decimal> {
        self.alerts.get(&user).map(|t| *t)
    }

    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }

    /// Remove and return every alert triggered by `current_price`
    /// (`target_price >= current_price`), ordered by user.
    ///
    /// Entries are removed before the caller delivers anything, so each
    /// alert is handed out at most once.
    pub fn scan_and_consume(&self, current_price: Decimal) -> Vec<AlertEntry> {
        let candidates: Vec<UserId> = self
            .alerts
            .iter()
            .filter(|e| AlertEntry::new(*e.key(), *e.value()).is_triggered_by(current_price))
            .map(|e| *e.key())
            .collect();

        // Re-check on removal: the target may have been replaced since the scan.
        let mut consumed: Vec<AlertEntry> = candidates
            .into_iter()
            .filter_map(|user| {
                self.alerts
                    .remove_if(&user, |user, target| {
                        AlertEntry::new(*user, *target).is_triggered_by(current_price)
                    })
                    .map(|(user, target)| AlertEntry::new(user, target))
            })
            .collect();

        consumed.sort_by_key(|e| e.user);
        consumed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_parse_target() {
        assert_eq!(parse_target("535"), Ok(dec("535")));
        assert_eq!(parse_target("  530.25 "), Ok(dec("530.25")));
        assert_eq!(parse_target("535 extra words"), Ok(dec("535")));
        assert_eq!(parse_target("5.3e2"), Ok(dec("530")));
    }

    #[test]
    fn test_parse_target_rejects_bad_input() {
        assert_eq!(parse_target(""), Err(AlertError::MissingArgument));
        assert_eq!(parse_target("   "), Err(AlertError::MissingArgument));
        assert_eq!(
            parse_target("cheap"),
            Err(AlertError::MalformedArgument("cheap".to_string()))
        );
        assert!(matches!(parse_target("nan"), Err(AlertError::MalformedArgument(_))));
        assert!(matches!(parse_target("12abc"), Err(AlertError::MalformedArgument(_))));
        assert_eq!(parse_target("0"), Err(AlertError::NotPositive(Decimal::ZERO)));
        assert!(matches!(parse_target("-5"), Err(AlertError::NotPositive(_))));
    }

    #[test]
    fn test_set_alert_overwrites() {
        let registry = AlertRegistry::new();
        assert_eq!(registry.set_alert(UserId(1), dec("530")), None);
        assert_eq!(registry.set_alert(UserId(1), dec("525")), Some(dec("530")));
        assert_eq!(registry.get(UserId(1)), Some(dec("525")));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_scan_consumes_exactly_once() {
        let registry = AlertRegistry::new();
        registry.set_alert(UserId(1), parse_target("530").unwrap());

        let matched = registry.scan_and_consume(dec("528"));
        assert_eq!(matched, vec![AlertEntry::new(UserId(1), dec("530"))]);

        assert!(registry.scan_and_consume(dec("528")).is_empty());
        assert!(registry.scan_and_consume(dec("1")).is_empty());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_scan_is_inclusive_at_target() {
        let registry = AlertRegistry::new();
        registry.set_alert(UserId(1), dec("530"));
        assert_eq!(registry.scan_and_consume(dec("530")).len(), 1);
    }

    #[test]
    fn test_scan_never_returns_targets_below_price() {
        let registry = AlertRegistry::new();
        for (user, target) in [(1, "520"), (2, "530"), (3, "531"), (4, "540"), (5, "529.99")] {
            registry.set_alert(UserId(user), dec(target));
        }

        let price = dec("530");
        let matched = registry.scan_and_consume(price);

        assert!(matched.iter().all(|e| e.target_price >= price));
        let users: Vec<i64> = matched.iter().map(|e| e.user.0).collect();
        assert_eq!(users, vec![2, 3, 4]);
        assert_eq!(registry.get(UserId(1)), Some(dec("520")));
        assert_eq!(registry.get(UserId(5)), Some(dec("529.99")));
    }
}
