//! Trade side of a P2P listing query.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of trade from the bot user's point of view.
///
/// `Buy` lists advertisers selling the token (the user buys),
/// `Sell` lists advertisers buying it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Side code understood by the Bybit P2P listing endpoint.
    #[inline]
    pub fn upstream_code(self) -> &'static str {
        match self {
            Side::Buy => "1",
            Side::Sell => "0",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "buy"),
            Side::Sell => write!(f, "sell"),
        }
    }
}
