//! Alert registry entry types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque chat user identifier (Telegram user id).
///
/// Alerts for a user are delivered to their private chat, whose id equals the user id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A one-shot price alert: fires once the best buy price is at or below `target_price`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertEntry {
    pub user: UserId,
    pub target_price: Decimal,
}

impl AlertEntry {
    pub fn new(user: UserId, target_price: Decimal) -> Self {
        Self { user, target_price }
    }

    /// Whether `price` satisfies this alert.
    #[inline]
    pub fn is_triggered_by(&self, price: Decimal) -> bool {
        price <= self.target_price
    }
}
