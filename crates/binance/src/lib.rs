pub mod client;
pub mod error;
pub mod models;

pub use client::BinanceRestClient;
pub use error::BinanceError;
