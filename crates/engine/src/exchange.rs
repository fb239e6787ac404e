use async_trait::async_trait;
use binance::{BinanceError, BinanceRestClient};
use rust_decimal::Decimal;
use thiserror::Error;

/// Which way an order moves the base asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderSide::Buy => "BUY",
            OrderSide::Sell => "SELL",
        }
    }
}

impl std::fmt::Display for OrderSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Free (spendable) balance for one asset.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetBalance {
    pub asset: String,
    pub free: Decimal,
}

/// LOT_SIZE trading rule for a symbol. Both values are strictly positive;
/// the adapter refuses anything degenerate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SymbolRules {
    pub min_qty: Decimal,
    pub step_size: Decimal,
}

/// Outcome of a submitted market order.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderReceipt {
    pub symbol: String,
    pub side: OrderSide,
    pub executed_qty: Decimal,
    /// Price of the first fill, when the exchange reports fills.
    pub fill_price: Option<Decimal>,
    /// Cumulative amount paid or received in the quote asset.
    pub quote_total: Decimal,
}

#[derive(Debug, Error)]
pub enum ExchangeError {
    /// The exchange understood the request and refused it.
    #[error("rejected by exchange (code {code}): {message}")]
    Rejected { code: i64, message: String },

    /// Anything that is not an explicit rejection: transport failures,
    /// malformed payloads.
    #[error("exchange unavailable: {0}")]
    Unavailable(String),
}

/// The spot-exchange operations the command workflows need. One production
/// implementation exists (Binance); tests script their own.
#[async_trait]
pub trait SpotExchange: Send + Sync {
    /// Latest traded price for a symbol.
    async fn latest_price(&self, symbol: &str) -> Result<Decimal, ExchangeError>;

    /// Free balance for one asset, zero when the account holds none.
    async fn free_balance(&self, asset: &str) -> Result<Decimal, ExchangeError>;

    /// Free balances for every asset on the account.
    async fn balances(&self) -> Result<Vec<AssetBalance>, ExchangeError>;

    /// LOT_SIZE rules for a symbol, fetched fresh on every call.
    async fn symbol_rules(&self, symbol: &str) -> Result<SymbolRules, ExchangeError>;

    /// Submit a market order for an already-adjusted quantity.
    async fn market_order(
        &self,
        symbol: &str,
        side: OrderSide,
        quantity: Decimal,
    ) -> Result<OrderReceipt, ExchangeError>;
}

#[async_trait]
impl SpotExchange for BinanceRestClient {
    async fn latest_price(&self, symbol: &str) -> Result<Decimal, ExchangeError> {
        let ticker = self.get_symbol_price(symbol).await.map_err(classify)?;
        let price = parse_field("price", &ticker.price)?;
        if price <= Decimal::ZERO {
            return Err(ExchangeError::Unavailable(format!(
                "non-positive price {price} for {symbol}"
            )));
        }
        Ok(price)
    }

    async fn free_balance(&self, asset: &str) -> Result<Decimal, ExchangeError> {
        match self.get_asset_balance(asset).await.map_err(classify)? {
            Some(entry) => parse_field("free", &entry.free),
            None => Ok(Decimal::ZERO),
        }
    }

    async fn balances(&self) -> Result<Vec<AssetBalance>, ExchangeError> {
        let account = self.get_account().await.map_err(classify)?;
        let mut balances = Vec::with_capacity(account.balances.len());
        for entry in account.balances {
            let free = parse_field("free", &entry.free)?;
            balances.push(AssetBalance {
                asset: entry.asset,
                free,
            });
        }
        Ok(balances)
    }

    async fn symbol_rules(&self, symbol: &str) -> Result<SymbolRules, ExchangeError> {
        let info = self.get_symbol_info(symbol).await.map_err(classify)?;
        let lot_size = info
            .lot_size()
            .ok_or_else(|| ExchangeError::Unavailable(format!("no LOT_SIZE filter for {symbol}")))?;

        let min_qty = parse_field(
            "minQty",
            require_filter_value(symbol, "minQty", lot_size.min_qty.as_deref())?,
        )?;
        let step_size = parse_field(
            "stepSize",
            require_filter_value(symbol, "stepSize", lot_size.step_size.as_deref())?,
        )?;
        if min_qty <= Decimal::ZERO || step_size <= Decimal::ZERO {
            return Err(ExchangeError::Unavailable(format!(
                "degenerate LOT_SIZE for {symbol}: minQty {min_qty}, stepSize {step_size}"
            )));
        }

        Ok(SymbolRules { min_qty, step_size })
    }

    async fn market_order(
        &self,
        symbol: &str,
        side: OrderSide,
        quantity: Decimal,
    ) -> Result<OrderReceipt, ExchangeError> {
        let order = self
            .place_market_order(symbol, side.as_str(), &quantity.to_string())
            .await
            .map_err(classify)?;

        let executed_qty = parse_field("executedQty", &order.executed_qty)?;
        let quote_total = parse_field("cummulativeQuoteQty", &order.cummulative_quote_qty)?;
        let fill_price = match order.fills.first() {
            Some(fill) => Some(parse_field("fills[0].price", &fill.price)?),
            None => None,
        };

        Ok(OrderReceipt {
            symbol: order.symbol,
            side,
            executed_qty,
            fill_price,
            quote_total,
        })
    }
}

fn classify(err: BinanceError) -> ExchangeError {
    match err {
        BinanceError::Api { code, message } => ExchangeError::Rejected { code, message },
        other => ExchangeError::Unavailable(other.to_string()),
    }
}

fn parse_field(field: &str, raw: &str) -> Result<Decimal, ExchangeError> {
    raw.parse::<Decimal>()
        .map_err(|err| ExchangeError::Unavailable(format!("malformed {field} value {raw:?}: {err}")))
}

fn require_filter_value<'a>(
    symbol: &str,
    name: &str,
    value: Option<&'a str>,
) -> Result<&'a str, ExchangeError> {
    value.ok_or_else(|| {
        ExchangeError::Unavailable(format!("LOT_SIZE filter for {symbol} is missing {name}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn side_maps_to_wire_strings() {
        assert_eq!(OrderSide::Buy.as_str(), "BUY");
        assert_eq!(OrderSide::Sell.as_str(), "SELL");
    }

    #[test]
    fn parse_field_accepts_exchange_decimal_strings() {
        assert_eq!(parse_field("free", "0.00300000").unwrap(), dec!(0.003));
        assert_eq!(parse_field("price", "50000.01").unwrap(), dec!(50000.01));
    }

    #[test]
    fn parse_field_reports_the_field_name() {
        let err = parse_field("stepSize", "not-a-number").unwrap_err();
        assert!(err.to_string().contains("stepSize"));
    }

    #[test]
    fn rejection_classification_keeps_code_and_message() {
        let err = classify(BinanceError::Api {
            code: -2010,
            message: "insufficient balance".to_string(),
        });
        match err {
            ExchangeError::Rejected { code, message } => {
                assert_eq!(code, -2010);
                assert_eq!(message, "insufficient balance");
            }
            other => panic!("expected rejection, got {other}"),
        }
    }
}
