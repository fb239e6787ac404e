use rust_decimal::{Decimal, RoundingStrategy};
use tracing::{debug, info, warn};

use crate::error::CommandError;
use crate::exchange::{ExchangeError, OrderReceipt, OrderSide, SpotExchange};
use crate::quantity::adjust_quantity;
use crate::store::{PendingOrder, PendingOrderStore};

/// Quote assets a trading pair may end in, in valuation preference order.
pub const QUOTE_ASSETS: &[&str] = &["USDT", "USDC"];

/// Base-asset quantities are capped at eight fractional digits, the finest
/// granularity Binance accepts.
const MAX_QUANTITY_SCALE: u32 = 8;

pub const CANCEL_CALLBACK_DATA: &str = "cancel";

/// What the user is asked to confirm.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeProposal {
    pub symbol: String,
    pub side: OrderSide,
    pub quantity: Decimal,
    /// Indicative price at prompt time. Execution happens at market price,
    /// which may differ.
    pub price: Decimal,
    pub estimated_total: Decimal,
}

/// Decoded inline-button payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackAction {
    Confirm { symbol: String },
    Cancel,
    Unknown,
}

pub fn confirm_callback_data(symbol: &str) -> String {
    format!("confirm_{symbol}")
}

pub fn parse_callback_data(data: &str) -> CallbackAction {
    if data == CANCEL_CALLBACK_DATA {
        return CallbackAction::Cancel;
    }
    match data.strip_prefix("confirm_") {
        Some(symbol) if !symbol.is_empty() => CallbackAction::Confirm {
            symbol: symbol.to_string(),
        },
        _ => CallbackAction::Unknown,
    }
}

/// Split a pair into base and quote, accepting only supported quote assets.
pub fn split_symbol(symbol: &str) -> Result<(&str, &str), CommandError> {
    for quote in QUOTE_ASSETS {
        if let Some(base) = symbol.strip_suffix(quote) {
            if !base.is_empty() {
                return Ok((base, quote));
            }
        }
    }
    Err(CommandError::InvalidArgument(format!(
        "{symbol} must end in one of {}",
        QUOTE_ASSETS.join(", ")
    )))
}

/// Validate the `<amount> <pair>` arguments shared by buy and sell.
pub fn parse_trade_args(args: &[&str]) -> Result<(Decimal, String), CommandError> {
    let [amount_raw, pair_raw] = args else {
        return Err(CommandError::InvalidArgument(
            "expected exactly two arguments: <amount> <pair>".to_string(),
        ));
    };

    let amount: Decimal = amount_raw.parse().map_err(|_| {
        CommandError::InvalidArgument(format!("{amount_raw} is not a valid amount"))
    })?;
    if amount <= Decimal::ZERO {
        return Err(CommandError::InvalidArgument(
            "amount must be positive".to_string(),
        ));
    }

    let pair = pair_raw.to_uppercase();
    split_symbol(&pair)?;

    Ok((amount, pair))
}

/// First half of the handshake: validate the request, derive the base-asset
/// quantity, store it as the user's pending order and describe what there is
/// to confirm. For buys the amount is spent in the quote currency; for sells
/// it is the base-asset quantity itself.
pub async fn prepare_trade(
    exchange: &dyn SpotExchange,
    store: &PendingOrderStore,
    user_id: i64,
    side: OrderSide,
    args: &[&str],
) -> Result<TradeProposal, CommandError> {
    let (amount, symbol) = parse_trade_args(args)?;
    let (base, _quote) = split_symbol(&symbol)?;

    let quantity = match side {
        OrderSide::Buy => {
            let price = exchange
                .latest_price(&symbol)
                .await
                .map_err(|err| CommandError::from_read_error(&symbol, err))?;
            derive_buy_quantity(amount, price)?
        }
        OrderSide::Sell => {
            let available = exchange
                .free_balance(base)
                .await
                .map_err(CommandError::upstream)?;
            if amount > available {
                return Err(CommandError::InsufficientBalance {
                    asset: base.to_string(),
                    available,
                });
            }
            amount
        }
    };

    let replaced = store
        .put(
            user_id,
            PendingOrder {
                symbol: symbol.clone(),
                quantity,
                side,
            },
        )
        .await;
    if let Some(previous) = replaced {
        debug!(user_id, previous = %previous.symbol, "replaced pending order");
    }
    info!(user_id, %symbol, %side, %quantity, "pending order stored");

    // Priced again at prompt time; the estimate the user confirms may lag
    // the eventual execution price.
    let price = exchange
        .latest_price(&symbol)
        .await
        .map_err(|err| CommandError::from_read_error(&symbol, err))?;
    let estimated_total = quantity
        .checked_mul(price)
        .ok_or_else(|| CommandError::InvalidArgument("amount out of range".to_string()))?;

    Ok(TradeProposal {
        symbol,
        side,
        quantity,
        price,
        estimated_total,
    })
}

fn derive_buy_quantity(amount: Decimal, price: Decimal) -> Result<Decimal, CommandError> {
    let quantity = amount
        .checked_div(price)
        .ok_or_else(|| CommandError::InvalidArgument("amount out of range".to_string()))?
        .round_dp_with_strategy(MAX_QUANTITY_SCALE, RoundingStrategy::ToZero);
    if quantity <= Decimal::ZERO {
        return Err(CommandError::InvalidArgument(
            "amount too small to buy any quantity at the current price".to_string(),
        ));
    }
    Ok(quantity)
}

/// Second half of the handshake. Single-shot: the pending order is removed
/// before any exchange call, and a repeated confirmation is a state mismatch.
pub async fn confirm_trade(
    exchange: &dyn SpotExchange,
    store: &PendingOrderStore,
    user_id: i64,
    symbol: &str,
) -> Result<OrderReceipt, CommandError> {
    let Some(order) = store.take_matching(user_id, symbol).await else {
        debug!(user_id, symbol, "confirmation without a matching pending order");
        return Err(CommandError::StateMismatch);
    };

    let rules = exchange.symbol_rules(&order.symbol).await.map_err(|err| {
        warn!(user_id, symbol = %order.symbol, %err, "trading rule fetch failed");
        CommandError::RuleUnavailable(order.symbol.clone())
    })?;

    let quantity = adjust_quantity(order.quantity, &rules)?;
    info!(
        user_id,
        symbol = %order.symbol,
        side = %order.side,
        requested = %order.quantity,
        adjusted = %quantity,
        "submitting market order"
    );

    let receipt = exchange
        .market_order(&order.symbol, order.side, quantity)
        .await
        .map_err(|err| match err {
            ExchangeError::Rejected { message, .. } => CommandError::ExchangeRejected(message),
            ExchangeError::Unavailable(reason) => CommandError::UpstreamUnavailable(reason),
        })?;

    info!(
        user_id,
        symbol = %receipt.symbol,
        executed = %receipt.executed_qty,
        quote_total = %receipt.quote_total,
        "market order executed"
    );
    Ok(receipt)
}

/// Cancelling is unconditional: removing a missing entry is a no-op that
/// still reads as cancelled to the user.
pub async fn cancel_trade(store: &PendingOrderStore, user_id: i64) -> Option<PendingOrder> {
    let removed = store.remove(user_id).await;
    if let Some(order) = &removed {
        info!(user_id, symbol = %order.symbol, "pending order cancelled");
    }
    removed
}
