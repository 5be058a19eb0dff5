//! Telegram bot handlers.

use crate::format::{
    main_menu_text, render_alert_set, render_alert_usage, render_price, render_spread,
    render_top_offers, render_unavailable, DisplaySettings,
};
use crate::registry::{parse_target, AlertRegistry};
use chrono::Utc;
use p2p_core::{Side, UserId};
use p2p_feeds::OfferFetcher;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, ParseMode};
use teloxide::utils::command::BotCommands;
use teloxide::{ApiError, RequestError};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum TelegramError {
    #[error("Telegram API error: {0}")]
    Api(#[from] RequestError),
}

/// Bot commands.
#[derive(BotCommands, Clone, Debug, PartialEq)]
#[command(rename_rule = "snake_case", description = "Available commands:")]
pub enum Command {
    #[command(description = "Show the main menu")]
    Start,
    #[command(description = "Notify me once the buy price is at or below a target. Usage: /set_alert 535")]
    SetAlert(String),
    #[command(description = "Show help")]
    Help,
}

/// Inline keyboard buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    GetPrice,
    GetSpread,
    ShowOffers,
    BackToMain,
}

impl MenuAction {
    /// Callback data carried by the button.
    pub fn data(self) -> &'static str {
        match self {
            MenuAction::GetPrice => "get_price",
            MenuAction::GetSpread => "get_spread",
            MenuAction::ShowOffers => "show_offers",
            MenuAction::BackToMain => "back_to_main",
        }
    }

    pub fn from_data(data: &str) -> Option<Self> {
        match data {
            "get_price" => Some(MenuAction::GetPrice),
            "get_spread" => Some(MenuAction::GetSpread),
            "show_offers" => Some(MenuAction::ShowOffers),
            "back_to_main" => Some(MenuAction::BackToMain),
            _ => None,
        }
    }

    fn button(self, label: &str) -> InlineKeyboardButton {
        InlineKeyboardButton::callback(label, self.data())
    }
}

pub fn main_menu_keyboard(settings: &DisplaySettings) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![MenuAction::GetPrice.button(&format!("💰 {} rate", settings.market.token))],
        vec![MenuAction::GetSpread.button("📊 P2P spread")],
        vec![MenuAction::ShowOffers.button("🔍 Best offers")],
    ])
}

pub fn back_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![MenuAction::BackToMain.button("🔙 Back")]])
}

/// A rendered screen: message text plus its keyboard.
#[derive(Debug, Clone)]
pub struct View {
    pub text: String,
    pub keyboard: InlineKeyboardMarkup,
}

impl View {
    fn with_back(text: String) -> Self {
        Self {
            text,
            keyboard: back_keyboard(),
        }
    }
}

/// Render the screen for a menu button.
pub async fn render_action(
    action: MenuAction,
    fetcher: &OfferFetcher,
    settings: &DisplaySettings,
) -> View {
    let market = &settings.market;

    match action {
        MenuAction::GetPrice => match fetcher.fetch(Side::Buy, market).await {
            Some(book) => match book.best() {
                Some(offer) => View::with_back(render_price(
                    offer,
                    market,
                    Utc::now(),
                    settings.utc_offset,
                )),
                None => View::with_back(render_unavailable()),
            },
            None => View::with_back(render_unavailable()),
        },
        MenuAction::GetSpread => {
            let buy = fetcher.fetch(Side::Buy, market).await;
            let sell = fetcher.fetch(Side::Sell, market).await;
            let best = buy
                .as_deref()
                .and_then(|b| b.best())
                .zip(sell.as_deref().and_then(|s| s.best()));
            match best {
                Some((buy, sell)) => View::with_back(render_spread(buy, sell, market)),
                None => View::with_back(render_unavailable()),
            }
        }
        MenuAction::ShowOffers => match fetcher.fetch(Side::Buy, market).await {
            Some(book) if !book.is_empty() => {
                View::with_back(render_top_offers(book.top(settings.top_offers), market))
            }
            _ => View::with_back(render_unavailable()),
        },
        MenuAction::BackToMain => View {
            text: main_menu_text(),
            keyboard: main_menu_keyboard(settings),
        },
    }
}

/// Alert owner of a command message: the sending user, not the chat.
///
/// `None` for messages without a sender, such as channel posts.
pub fn alert_owner(msg: &Message) -> Option<UserId> {
    msg.from.as_ref().map(|u| UserId(u.id.0 as i64))
}

/// Handle a `/set_alert` argument and return the reply text.
pub fn set_alert_reply(
    registry: &AlertRegistry,
    user: UserId,
    arg: &str,
    settings: &DisplaySettings,
) -> String {
    match parse_target(arg) {
        Ok(target) => {
            let previous = registry.set_alert(user, target);
            info!(user = %user, target = %target, "Alert set");
            render_alert_set(target, previous, &settings.market)
        }
        Err(e) => {
            debug!(user = %user, arg = arg, error = %e, "Rejected alert argument");
            render_alert_usage()
        }
    }
}

/// Telegram bot wrapper.
pub struct TelegramBot {
    bot: Bot,
    fetcher: Arc<OfferFetcher>,
    registry: Arc<AlertRegistry>,
    settings: DisplaySettings,
}

impl TelegramBot {
    pub fn new(
        bot: Bot,
        fetcher: Arc<OfferFetcher>,
        registry: Arc<AlertRegistry>,
        settings: DisplaySettings,
    ) -> Self {
        Self {
            bot,
            fetcher,
            registry,
            settings,
        }
    }

    /// Run the update dispatcher until Ctrl+C.
    pub async fn run(self: Arc<Self>) {
        if let Err(e) = self.bot.set_my_commands(Command::bot_commands()).await {
            warn!("Failed to register bot commands: {}", e);
        }

        let bot = self.bot.clone();
        let on_command = Arc::clone(&self);
        let on_callback = Arc::clone(&self);

        let handler = dptree::entry()
            .branch(Update::filter_message().filter_command::<Command>().endpoint(
                move |bot: Bot, msg: Message, cmd: Command| {
                    let this = Arc::clone(&on_command);
                    async move { this.handle_command(bot, msg, cmd).await }
                },
            ))
            .branch(Update::filter_callback_query().endpoint(
                move |bot: Bot, query: CallbackQuery| {
                    let this = Arc::clone(&on_callback);
                    async move { this.handle_callback(bot, query).await }
                },
            ));

        info!("Telegram bot started");

        Dispatcher::builder(bot, handler)
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;

        info!("Telegram bot stopped");
    }

    async fn handle_command(
        &self,
        bot: Bot,
        msg: Message,
        cmd: Command,
    ) -> Result<(), TelegramError> {
        match cmd {
            Command::Start => {
                bot.send_message(msg.chat.id, main_menu_text())
                    .parse_mode(ParseMode::Html)
                    .reply_markup(main_menu_keyboard(&self.settings))
                    .await?;
            }

            Command::SetAlert(arg) => {
                let reply = match alert_owner(&msg) {
                    Some(user) => set_alert_reply(&self.registry, user, &arg, &self.settings),
                    None => {
                        debug!(chat = %msg.chat.id, "Alert request without a sender");
                        render_alert_usage()
                    }
                };
                bot.send_message(msg.chat.id, reply)
                    .parse_mode(ParseMode::Html)
                    .await?;
            }

            Command::Help => {
                bot.send_message(msg.chat.id, Command::descriptions().to_string())
                    .await?;
            }
        }

        Ok(())
    }

    async fn handle_callback(&self, bot: Bot, query: CallbackQuery) -> Result<(), TelegramError> {
        bot.answer_callback_query(query.id.clone()).await?;

        let Some(action) = query.data.as_deref().and_then(MenuAction::from_data) else {
            debug!("Ignoring unknown callback data: {:?}", query.data);
            return Ok(());
        };
        let Some(message) = query.message.as_ref() else {
            debug!("Callback without message, nothing to edit");
            return Ok(());
        };

        let view = render_action(action, &self.fetcher, &self.settings).await;

        let edited = bot
            .edit_message_text(message.chat().id, message.id(), view.text)
            .parse_mode(ParseMode::Html)
            .reply_markup(view.keyboard)
            .await;

        match edited {
            // Same content as before, e.g. a double tap on a cached view
            Err(RequestError::Api(ApiError::MessageNotModified)) => Ok(()),
            Err(e) => Err(e.into()),
            Ok(_) => Ok(()),
        }
    }
}
