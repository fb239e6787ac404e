pub mod client;
pub mod error;
pub mod models;

pub use client::{TelegramBotClient, LONG_POLL_TIMEOUT_SECS};
pub use error::TelegramError;
