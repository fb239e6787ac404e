//! The one place engine results turn into chat text. Messages use
//! Telegram's HTML parse mode, so anything user- or exchange-originated is
//! escaped before interpolation.

use rust_decimal::Decimal;

use crate::account::PortfolioView;
use crate::error::CommandError;
use crate::exchange::{OrderReceipt, OrderSide};
use crate::market::PriceQuote;
use crate::trade::{split_symbol, TradeProposal, QUOTE_ASSETS};

pub fn help_text() -> &'static str {
    "🤖 <b>Trading bot commands</b>\n\n\
     /balance - show your portfolio\n\
     /buy AMOUNT PAIR - buy for an amount of USDT or USDC (example: /buy 100 BTCUSDT)\n\
     /sell QUANTITY PAIR - sell a quantity of the base asset (example: /sell 0.5 ETHUSDT)\n\
     /info PAIR - current price of a pair (example: /info BTCUSDT)\n\
     /reset - clean up this chat\n\
     /help - show this message"
}

pub fn portfolio_message(view: &PortfolioView) -> String {
    if view.entries.is_empty() {
        return "💰 Your portfolio is empty.".to_string();
    }

    let mut lines = vec!["💰 <b>Your portfolio</b>".to_string(), String::new()];
    for entry in &view.entries {
        let asset = escape_html(&entry.asset);
        let amount = format_quantity(entry.amount);
        if QUOTE_ASSETS.contains(&entry.asset.as_str()) {
            lines.push(format!("• {amount} {asset}"));
        } else {
            lines.push(format!(
                "• {amount} {asset} (≈ {} USDT)",
                format_value(entry.value)
            ));
        }
    }
    lines.push(String::new());
    lines.push(format!("<b>Total ≈ {} USDT</b>", format_value(view.total)));
    lines.join("\n")
}

pub fn price_message(quote: &PriceQuote) -> String {
    format!(
        "💱 <b>{}</b>: {}",
        escape_html(&quote.symbol),
        format_price(quote.price)
    )
}

pub fn trade_prompt(proposal: &TradeProposal) -> String {
    let (emoji, heading) = match proposal.side {
        OrderSide::Buy => ("🛒", "Confirm buy"),
        OrderSide::Sell => ("💸", "Confirm sell"),
    };
    let quote = quote_asset(&proposal.symbol);
    format!(
        "{emoji} <b>{heading}</b>\n\n\
         Pair: {}\n\
         Quantity: {}\n\
         Price: {} {quote}\n\
         Estimated total: {} {quote}",
        escape_html(&proposal.symbol),
        format_quantity(proposal.quantity),
        format_price(proposal.price),
        format_value(proposal.estimated_total),
    )
}

pub fn confirm_button_label(side: OrderSide) -> &'static str {
    match side {
        OrderSide::Buy => "✅ CONFIRM BUY",
        OrderSide::Sell => "✅ CONFIRM SELL",
    }
}

pub fn cancel_button_label() -> &'static str {
    "❌ CANCEL"
}

pub fn processing_message() -> &'static str {
    "🔄 Processing your order..."
}

pub fn execution_message(receipt: &OrderReceipt) -> String {
    let (heading, total_label) = match receipt.side {
        OrderSide::Buy => ("Buy executed", "Total spent"),
        OrderSide::Sell => ("Sell executed", "Total received"),
    };
    let price = match receipt.fill_price {
        Some(price) => price.to_string(),
        None => "unavailable".to_string(),
    };
    let quote = quote_asset(&receipt.symbol);
    format!(
        "✅ <b>{heading}</b>\n\n\
         Pair: {}\n\
         Quantity: {}\n\
         Price: {price}\n\
         {total_label}: {} {quote}",
        escape_html(&receipt.symbol),
        receipt.executed_qty,
        receipt.quote_total,
    )
}

pub fn cancellation_message() -> &'static str {
    "❌ Operation cancelled."
}

pub fn describe_error(error: &CommandError) -> String {
    match error {
        CommandError::InvalidArgument(message) => {
            format!("❌ {}", escape_html(message))
        }
        CommandError::InsufficientBalance { asset, available } => format!(
            "❌ Insufficient {} balance: {} available.",
            escape_html(asset),
            format_quantity(*available)
        ),
        CommandError::QuantityTooSmall { min } => format!(
            "❌ Quantity too small: the exchange minimum is {}.",
            format_quantity(*min)
        ),
        CommandError::RuleUnavailable(symbol) => format!(
            "❌ Trading rules for {} are unavailable right now, please retry later.",
            escape_html(symbol)
        ),
        CommandError::ExchangeRejected(message) => {
            format!("❌ Order rejected: {}", escape_html(message))
        }
        CommandError::StateMismatch => {
            "❌ This operation has expired. Start again with /buy or /sell.".to_string()
        }
        CommandError::UpstreamUnavailable(_) => {
            "❌ The exchange did not respond, please try again later.".to_string()
        }
    }
}

/// Price display precision scales with magnitude: 2 decimals above 100,
/// 4 above 1, 6 otherwise.
pub fn format_price(price: Decimal) -> String {
    let decimals = if price > Decimal::ONE_HUNDRED {
        2
    } else if price > Decimal::ONE {
        4
    } else {
        6
    };
    let mut rounded = price.round_dp(decimals);
    rounded.rescale(decimals);
    rounded.to_string()
}

/// Quote-currency values always show two decimals.
fn format_value(value: Decimal) -> String {
    let mut rounded = value.round_dp(2);
    rounded.rescale(2);
    rounded.to_string()
}

/// Quantities drop trailing zeros so 0.0020 reads as 0.002.
fn format_quantity(quantity: Decimal) -> String {
    quantity.normalize().to_string()
}

fn quote_asset(symbol: &str) -> &str {
    split_symbol(symbol).map(|(_, quote)| quote).unwrap_or("")
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
