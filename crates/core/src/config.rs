use anyhow::{ensure, Context, Result};
use dotenvy::dotenv;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Global configuration accessor to keep the rest of the application stateless.
pub static CONFIG: Lazy<AppConfig> = Lazy::new(|| {
    AppConfig::load_from_env().expect("failed to load configuration from environment")
});

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BinanceCredentials {
    pub api_key: String,
    pub api_secret: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramSettings {
    pub bot_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_binance_rest_endpoint")]
    pub binance_rest_endpoint: String,
    #[serde(default = "default_telegram_api_endpoint")]
    pub telegram_api_endpoint: String,
    pub binance_credentials: Option<BinanceCredentials>,
    pub telegram: Option<TelegramSettings>,
}

impl AppConfig {
    /// Build configuration from well-known environment variables.
    pub fn load_from_env() -> Result<Self> {
        preload_env_files();

        let binance_credentials = match (
            env_var_non_empty("BINANCE_API_KEY"),
            env_var_non_empty("BINANCE_API_SECRET"),
        ) {
            (Ok(api_key), Ok(api_secret)) => Some(BinanceCredentials {
                api_key,
                api_secret,
            }),
            _ => None,
        };

        let telegram = match env_var_non_empty("TELEGRAM_TOKEN") {
            Ok(bot_token) => Some(TelegramSettings { bot_token }),
            Err(_) => None,
        };

        let binance_rest_endpoint =
            env::var("BINANCE_REST_ENDPOINT").unwrap_or_else(|_| default_binance_rest_endpoint());
        let telegram_api_endpoint =
            env::var("TELEGRAM_API_ENDPOINT").unwrap_or_else(|_| default_telegram_api_endpoint());

        Ok(Self {
            binance_rest_endpoint,
            telegram_api_endpoint,
            binance_credentials,
            telegram,
        })
    }

    /// Helper that forces the presence of Binance credentials.
    pub fn require_binance_credentials(&self) -> Result<&BinanceCredentials> {
        let credentials = self.binance_credentials.as_ref().context(
            "Binance credentials not found: create a .env in the working directory and set BINANCE_API_KEY and BINANCE_API_SECRET",
        )?;

        ensure!(
            !credentials.api_key.trim().is_empty() && !credentials.api_secret.trim().is_empty(),
            "Binance credentials must not be empty: fill in BINANCE_API_KEY and BINANCE_API_SECRET in .env"
        );

        Ok(credentials)
    }

    /// Helper that forces the presence of the Telegram bot token.
    pub fn require_telegram_settings(&self) -> Result<&TelegramSettings> {
        let settings = self.telegram.as_ref().context(
            "Telegram settings not found: create a .env in the working directory and set TELEGRAM_TOKEN",
        )?;

        ensure!(
            !settings.bot_token.trim().is_empty(),
            "TELEGRAM_TOKEN must not be empty: fill in the bot token issued by BotFather"
        );

        Ok(settings)
    }
}

fn env_var_non_empty(key: &str) -> Result<String, env::VarError> {
    let value = env::var(key)?;
    if value.trim().is_empty() {
        return Err(env::VarError::NotPresent);
    }
    Ok(value)
}

fn default_binance_rest_endpoint() -> String {
    "https://api.binance.com".to_string()
}

fn default_telegram_api_endpoint() -> String {
    "https://api.telegram.org".to_string()
}

fn preload_env_files() {
    // Load .env from the current directory, then the workspace root if present.
    let _ = dotenv();

    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let candidate_files = [manifest_dir.join("../../.env")];

    for path in candidate_files {
        if path.exists() {
            let _ = dotenvy::from_path(path);
        }
    }
}
