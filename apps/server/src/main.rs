//! P2P Rate Bot
//!
//! Telegram bot relaying Bybit P2P offers with one-shot price alerts.

mod config;
mod keep_alive;

use clap::Parser;
use config::{bot_token_from_env, AppConfig};
use keep_alive::KeepAliveState;
use p2p_alerts::{AlertRegistry, AlertSink, PriceChecker, TelegramBot};
use p2p_feeds::{BybitP2pClient, CachePolicy, OfferFetcher};
use std::sync::Arc;
use std::time::Duration;
use teloxide::Bot;
use tokio::sync::watch;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// P2P Rate Bot CLI
#[derive(Parser, Debug)]
#[command(name = "p2p-bot")]
#[command(about = "Telegram bot for Bybit P2P rates and price alerts", long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config.json")]
    config: String,

    /// Log level: trace, debug, info, warn, error
    #[arg(short, long)]
    log_level: Option<String>,

    /// Seconds between alert checks
    #[arg(short, long)]
    poll_interval: Option<u64>,

    /// Keep-alive HTTP port
    #[arg(long)]
    keep_alive_port: Option<u16>,

    /// Disable the keep-alive HTTP server
    #[arg(long, default_value_t = false)]
    no_keep_alive: bool,
}

fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

fn init_logging(level: &str) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(parse_level(level))
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Apply CLI overrides on top of the file configuration.
fn apply_args(mut config: AppConfig, args: &Args) -> AppConfig {
    if let Some(level) = &args.log_level {
        config.log_level = level.clone();
    }
    if let Some(secs) = args.poll_interval {
        config.poll_interval_secs = secs;
    }
    if let Some(port) = args.keep_alive_port {
        config.keep_alive_port = Some(port);
    }
    if args.no_keep_alive {
        config.keep_alive_port = None;
    }
    config
}

#[tokio::main]
async fn main() {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    // Logging is not up yet; report config errors after init with defaults
    let (config, config_error) = match AppConfig::load(&args.config) {
        Ok(config) => (config, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };
    let config = apply_args(config, &args);

    init_logging(&config.log_level);

    if let Some(e) = config_error {
        error!("{} ({})", e, args.config);
        std::process::exit(1);
    }

    let token = match bot_token_from_env() {
        Ok(token) => token,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    let cache_policy = CachePolicy::from(&config.cache);

    info!("🚀 P2P Rate Bot starting...");
    info!("  Market: {}", config.market);
    info!("  Poll interval: {} s", config.poll_interval().as_secs());
    info!("  Upstream: {}", config.upstream.endpoint);
    info!("  Cache policy: {:?}", cache_policy);

    let client = match BybitP2pClient::new((&config.upstream).into()) {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to build HTTP client: {}", e);
            std::process::exit(1);
        }
    };

    let fetcher = Arc::new(OfferFetcher::new(Arc::new(client), cache_policy));
    let registry = Arc::new(AlertRegistry::new());
    let bot = Bot::new(token);

    let keep_alive_handle = match config.keep_alive_port {
        Some(port) => {
            let state = KeepAliveState::new(registry.clone(), fetcher.clone());
            match keep_alive::start_keep_alive_server(state, port).await {
                Ok(handle) => Some(handle),
                Err(e) => {
                    warn!("Keep-alive server disabled: {}", e);
                    None
                }
            }
        }
        None => None,
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sink: Arc<dyn AlertSink> = Arc::new(bot.clone());
    let checker = PriceChecker::new(
        fetcher.clone(),
        registry.clone(),
        sink,
        config.market.clone(),
    );
    let checker_handle = tokio::spawn(checker.run(config.poll_interval(), shutdown_rx));

    let telegram = Arc::new(TelegramBot::new(
        bot,
        fetcher.clone(),
        registry.clone(),
        config.display_settings(),
    ));

    info!("Press Ctrl+C to stop...");

    // Returns once the dispatcher has handled Ctrl+C
    telegram.run().await;

    warn!("Shutdown signal received");
    let _ = shutdown_tx.send(true);
    let _ = tokio::time::timeout(Duration::from_secs(2), checker_handle).await;

    if let Some(handle) = keep_alive_handle {
        handle.abort();
    }

    let stats = fetcher.stats();
    info!("📈 Final Stats:");
    info!("  Upstream calls: {}", stats.upstream_calls);
    info!("  Cache hits: {}", stats.cache_hits);
    info!("  Failures: {}", stats.failures);
    info!("  Pending alerts dropped: {}", registry.len());
    info!("👋 Goodbye!");
}
