//! User-facing message rendering (Telegram HTML parse mode).

use chrono::{DateTime, FixedOffset, Offset, Utc};
use p2p_core::{spread, Market, Offer};
use rust_decimal::Decimal;
use teloxide::utils::html::escape;

/// Display options shared by every rendered view.
#[derive(Debug, Clone)]
pub struct DisplaySettings {
    pub market: Market,
    /// Offers shown by the top offers view
    pub top_offers: usize,
    /// Timezone for timestamps
    pub utc_offset: FixedOffset,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            market: Market::default(),
            top_offers: 5,
            // Asia/Almaty
            utc_offset: FixedOffset::east_opt(5 * 3600).unwrap_or_else(|| Utc.fix()),
        }
    }
}

impl DisplaySettings {
    /// Build from a whole-hour UTC offset; out-of-range offsets fall back to UTC.
    pub fn with_offset_hours(market: Market, top_offers: usize, hours: i32) -> Self {
        let utc_offset = FixedOffset::east_opt(hours * 3600).unwrap_or_else(|| Utc.fix());
        Self {
            market,
            top_offers,
            utc_offset,
        }
    }
}

/// `HH:MM DD.MM.YYYY` in the given offset.
pub fn format_timestamp(at: DateTime<Utc>, offset: FixedOffset) -> String {
    at.with_timezone(&offset).format("%H:%M %d.%m.%Y").to_string()
}

/// Difference with exactly two decimals.
pub fn format_spread(spread: Decimal) -> String {
    format!("{:.2}", spread.round_dp(2))
}

pub fn main_menu_text() -> String {
    "🏦 <b>Bybit P2P arbitrage bot</b>\nChoose an action:".to_string()
}

/// Best offer with a timestamp.
pub fn render_price(offer: &Offer, market: &Market, at: DateTime<Utc>, offset: FixedOffset) -> String {
    format!(
        "💰 <b>1 {token} = {price} {currency}</b>\n\
         • Available: {quantity} {token}\n\
         • Advertiser: {name} ({orders} orders)\n\
         ⏱ {time}",
        token = escape(&market.token),
        currency = escape(&market.currency),
        price = offer.price,
        quantity = offer.quantity,
        name = escape(&offer.advertiser),
        orders = offer.completed_orders,
        time = format_timestamp(at, offset),
    )
}

/// Best buy and sell prices with their difference.
pub fn render_spread(buy: &Offer, sell: &Offer, market: &Market) -> String {
    let currency = escape(&market.currency);
    format!(
        "📊 <b>P2P spread</b>\n\
         • Buy: {buy} {currency}\n\
         • Sell: {sell} {currency}\n\
         🔸 Difference: {diff} {currency}",
        buy = buy.price,
        sell = sell.price,
        diff = format_spread(spread(buy, sell)),
    )
}

/// Numbered list of buy offers.
pub fn render_top_offers(offers: &[Offer], market: &Market) -> String {
    let token = escape(&market.token);
    let currency = escape(&market.currency);
    let mut msg = format!("🏆 <b>Top {} offers to buy {}</b>\n\n", offers.len(), token);

    for (i, offer) in offers.iter().enumerate() {
        let rating = offer
            .completion_rate
            .map(|r| format!("{}%", r.normalize()))
            .unwrap_or_else(|| "N/A".to_string());
        msg.push_str(&format!(
            "{}. {} {}\n   • {} {} available\n   • Rating: {}\n\n",
            i + 1,
            offer.price,
            currency,
            offer.quantity,
            token,
            rating
        ));
    }

    msg.trim_end().to_string()
}

pub fn render_alert_set(target: Decimal, previous: Option<Decimal>, market: &Market) -> String {
    let currency = escape(&market.currency);
    match previous {
        Some(prev) => format!(
            "✅ Alert updated: I will notify you when the price is &lt;= {target} {currency} (was {prev})"
        ),
        None => format!("✅ Alert set: I will notify you when the price is &lt;= {target} {currency}"),
    }
}

pub fn render_alert_usage() -> String {
    "⚠️ Usage: /set_alert 535".to_string()
}

pub fn render_alert_triggered(price: Decimal, market: &Market) -> String {
    format!("📉 Price dropped to <b>{} {}</b>!", price, escape(&market.currency))
}

pub fn render_unavailable() -> String {
    "⚠️ No data from the P2P market right now. Try again in a minute.".to_string()
}
