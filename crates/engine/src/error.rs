use rust_decimal::Decimal;
use thiserror::Error;

use crate::exchange::ExchangeError;

/// Everything a chat command can fail with. Turned into user-facing text in
/// exactly one place, `format::describe_error`.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("insufficient {asset} balance, {available} available")]
    InsufficientBalance { asset: String, available: Decimal },

    #[error("adjusted quantity is below the exchange minimum of {min}")]
    QuantityTooSmall { min: Decimal },

    #[error("trading rules unavailable for {0}")]
    RuleUnavailable(String),

    #[error("order rejected by the exchange: {0}")]
    ExchangeRejected(String),

    #[error("no matching pending order")]
    StateMismatch,

    #[error("exchange request failed: {0}")]
    UpstreamUnavailable(String),
}

impl CommandError {
    /// Classify a failed price lookup. A rejection means the exchange refused
    /// the symbol itself, which is the caller's mistake; anything else is an
    /// upstream problem.
    pub(crate) fn from_read_error(symbol: &str, err: ExchangeError) -> Self {
        match err {
            ExchangeError::Rejected { .. } => {
                CommandError::InvalidArgument(format!("unknown trading pair {symbol}"))
            }
            ExchangeError::Unavailable(reason) => CommandError::UpstreamUnavailable(reason),
        }
    }

    pub(crate) fn upstream(err: ExchangeError) -> Self {
        CommandError::UpstreamUnavailable(err.to_string())
    }
}
