pub mod config;

pub use config::{AppConfig, BinanceCredentials, TelegramSettings, CONFIG};
