use rust_decimal::Decimal;

use crate::error::CommandError;
use crate::exchange::SpotExchange;
use crate::trade::split_symbol;

#[derive(Debug, Clone, PartialEq)]
pub struct PriceQuote {
    pub symbol: String,
    pub price: Decimal,
}

/// Current price for a pair, restricted to the supported quote assets the
/// same way buy and sell are.
pub async fn price_lookup(
    exchange: &dyn SpotExchange,
    args: &[&str],
) -> Result<PriceQuote, CommandError> {
    let [pair_raw] = args else {
        return Err(CommandError::InvalidArgument(
            "expected exactly one argument: <pair>".to_string(),
        ));
    };

    let symbol = pair_raw.to_uppercase();
    split_symbol(&symbol)?;

    let price = exchange
        .latest_price(&symbol)
        .await
        .map_err(|err| CommandError::from_read_error(&symbol, err))?;

    Ok(PriceQuote { symbol, price })
}
