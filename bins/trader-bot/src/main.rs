use std::fs;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use anyhow::Context;
use binance::BinanceRestClient;
use bot_core::config::CONFIG;
use telegram::{TelegramBotClient, LONG_POLL_TIMEOUT_SECS};
use tracing::{error, info, Level};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::RollingFileAppender;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, Registry};
use trade_engine::PendingOrderStore;

mod handlers;
mod history;

use history::MessageLog;

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

const POLL_RETRY_SECS: u64 = 5;

#[derive(Clone)]
struct BotState {
    exchange: Arc<BinanceRestClient>,
    telegram: Arc<TelegramBotClient>,
    orders: Arc<PendingOrderStore>,
    history: Arc<MessageLog>,
    bot_username: Arc<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let exchange =
        BinanceRestClient::from_config(&CONFIG).context("Binance client initialisation failed")?;
    let telegram = TelegramBotClient::from_config(&CONFIG)
        .context("Telegram client initialisation failed")?;

    let me = telegram
        .get_me()
        .await
        .context("getMe failed, check TELEGRAM_TOKEN")?;
    let bot_username = me.username.unwrap_or_default();
    info!(bot = %bot_username, "Telegram bot authenticated");

    let state = BotState {
        exchange: Arc::new(exchange),
        telegram: Arc::new(telegram),
        orders: Arc::new(PendingOrderStore::new()),
        history: Arc::new(MessageLog::new()),
        bot_username: Arc::new(bot_username),
    };

    info!("Starting update loop");
    tokio::select! {
        _ = run_update_loop(state) => {}
        result = tokio::signal::ctrl_c() => {
            result.context("failed to listen for the shutdown signal")?;
            info!("Shutdown signal received, stopping");
        }
    }

    Ok(())
}

async fn run_update_loop(state: BotState) {
    let mut offset: Option<i64> = None;

    loop {
        match state
            .telegram
            .get_updates(offset, LONG_POLL_TIMEOUT_SECS)
            .await
        {
            Ok(updates) => {
                for update in updates {
                    let next = update.update_id + 1;
                    offset = Some(offset.map_or(next, |current| current.max(next)));
                    tokio::spawn(handlers::handle_update(state.clone(), update));
                }
            }
            Err(err) => {
                error!(%err, "getUpdates failed, retrying in {}s", POLL_RETRY_SECS);
                tokio::time::sleep(Duration::from_secs(POLL_RETRY_SECS)).await;
            }
        }
    }
}

fn init_tracing() {
    let log_dir = std::path::Path::new("logs");
    if let Err(err) = fs::create_dir_all(log_dir) {
        eprintln!("failed to create log directory {log_dir:?}: {err}");
    }

    let file_appender: RollingFileAppender =
        tracing_appender::rolling::daily(log_dir, "trader-bot.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let _ = LOG_GUARD.set(guard);

    let env_filter = EnvFilter::from_default_env().add_directive(Level::INFO.into());

    let fmt_stdout = tracing_subscriber::fmt::layer().with_writer(std::io::stdout);
    let fmt_file = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false);

    let subscriber = Registry::default()
        .with(env_filter)
        .with(fmt_stdout)
        .with(fmt_file);

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        tracing::warn!("tracing already initialised");
    }
}
