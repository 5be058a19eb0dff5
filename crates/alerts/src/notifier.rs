//! Alert delivery.

use async_trait::async_trait;
use p2p_core::UserId;
use teloxide::prelude::*;
use teloxide::types::ParseMode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("Telegram API error: {0}")]
    Api(#[from] teloxide::RequestError),
    #[error("Delivery rejected: {0}")]
    Rejected(String),
}

/// Delivers a rendered alert message to one user.
#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn deliver(&self, user: UserId, text: &str) -> Result<(), DeliveryError>;
}

#[async_trait]
impl AlertSink for Bot {
    async fn deliver(&self, user: UserId, text: &str) -> Result<(), DeliveryError> {
        self.send_message(ChatId(user.0), text)
            .parse_mode(ParseMode::Html)
            .await?;
        Ok(())
    }
}
