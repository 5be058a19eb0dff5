//! Price alerts and the Telegram front end.
//!
//! This crate provides:
//! - An in-memory per-user alert registry
//! - A periodic price checker that fires and clears alerts
//! - Message rendering and Telegram bot handlers

pub mod checker;
pub mod format;
pub mod notifier;
pub mod registry;
pub mod telegram;

pub use checker::{PriceChecker, TickOutcome};
pub use format::DisplaySettings;
pub use notifier::{AlertSink, DeliveryError};
pub use registry::{parse_target, AlertError, AlertRegistry};
pub use telegram::{Command, MenuAction, TelegramBot};
