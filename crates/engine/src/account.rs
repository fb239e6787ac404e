use rust_decimal::Decimal;
use tracing::debug;

use crate::error::CommandError;
use crate::exchange::SpotExchange;
use crate::trade::QUOTE_ASSETS;

/// One priced line of the portfolio listing.
#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioEntry {
    pub asset: String,
    pub amount: Decimal,
    /// Valuation in the reference currency, zero when no pair resolves.
    pub value: Decimal,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PortfolioView {
    /// Entries sorted by descending value.
    pub entries: Vec<PortfolioEntry>,
    pub total: Decimal,
}

/// Balances below this are dust and left out of the listing.
fn dust_threshold() -> Decimal {
    Decimal::new(1, 4)
}

/// Value every held asset in the reference currency. Quote stablecoins count
/// at face value; everything else is priced through the first quote pair
/// that resolves, or zero when none does. A single unpriceable asset must
/// not sink the whole listing.
pub async fn portfolio_valuation(
    exchange: &dyn SpotExchange,
) -> Result<PortfolioView, CommandError> {
    let balances = exchange.balances().await.map_err(CommandError::upstream)?;

    let mut entries = Vec::new();
    let mut total = Decimal::ZERO;

    for balance in balances {
        if balance.free <= dust_threshold() {
            continue;
        }

        let value = if QUOTE_ASSETS.contains(&balance.asset.as_str()) {
            balance.free
        } else {
            resolve_value(exchange, &balance.asset, balance.free).await
        };

        total = total.saturating_add(value);
        entries.push(PortfolioEntry {
            asset: balance.asset,
            amount: balance.free,
            value,
        });
    }

    entries.sort_by(|a, b| b.value.cmp(&a.value));

    Ok(PortfolioView { entries, total })
}

async fn resolve_value(exchange: &dyn SpotExchange, asset: &str, amount: Decimal) -> Decimal {
    for quote in QUOTE_ASSETS {
        match exchange.latest_price(&format!("{asset}{quote}")).await {
            Ok(price) => return amount.checked_mul(price).unwrap_or(Decimal::ZERO),
            Err(err) => {
                debug!(asset, %quote, %err, "valuation lookup failed, trying next quote");
            }
        }
    }
    Decimal::ZERO
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockExchange;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn stablecoins_count_at_face_value() {
        let exchange = MockExchange::new()
            .with_free_balance("USDT", dec!(1200))
            .with_free_balance("USDC", dec!(50));

        let view = portfolio_valuation(&exchange).await.unwrap();

        assert_eq!(view.total, dec!(1250));
        assert_eq!(view.entries[0].asset, "USDT");
        assert_eq!(view.entries[0].value, dec!(1200));
        assert_eq!(view.entries[1].asset, "USDC");
        assert_eq!(view.entries[1].value, dec!(50));
    }

    #[tokio::test]
    async fn entries_are_priced_and_sorted_by_descending_value() {
        let exchange = MockExchange::new()
            .with_free_balance("BTC", dec!(0.5))
            .with_free_balance("ETH", dec!(2))
            .with_free_balance("USDT", dec!(1200))
            .with_price("BTCUSDT", dec!(50000))
            .with_price("ETHUSDT", dec!(2500));

        let view = portfolio_valuation(&exchange).await.unwrap();

        let assets: Vec<&str> = view.entries.iter().map(|e| e.asset.as_str()).collect();
        assert_eq!(assets, ["BTC", "ETH", "USDT"]);
        assert_eq!(view.entries[0].value, dec!(25000));
        assert_eq!(view.entries[1].value, dec!(5000));
        assert_eq!(view.total, dec!(31200));
    }

    #[tokio::test]
    async fn dust_balances_are_left_out() {
        let exchange = MockExchange::new()
            .with_free_balance("SHIB", dec!(0.0001))
            .with_free_balance("DOGE", dec!(0.00009))
            .with_free_balance("USDT", dec!(10));

        let view = portfolio_valuation(&exchange).await.unwrap();

        assert_eq!(view.entries.len(), 1);
        assert_eq!(view.entries[0].asset, "USDT");
    }

    #[tokio::test]
    async fn valuation_falls_back_to_the_second_quote() {
        // No ARBUSDT price on the mock, only ARBUSDC.
        let exchange = MockExchange::new()
            .with_free_balance("ARB", dec!(10))
            .with_price("ARBUSDC", dec!(0.8));

        let view = portfolio_valuation(&exchange).await.unwrap();

        assert_eq!(view.entries[0].value, dec!(8));
        assert_eq!(view.total, dec!(8));
    }

    #[tokio::test]
    async fn unpriceable_assets_stay_listed_at_zero() {
        let exchange = MockExchange::new()
            .with_free_balance("MYSTERY", dec!(3))
            .with_free_balance("USDT", dec!(10));

        let view = portfolio_valuation(&exchange).await.unwrap();

        assert_eq!(view.entries.len(), 2);
        assert_eq!(view.entries[0].asset, "USDT");
        assert_eq!(view.entries[1].asset, "MYSTERY");
        assert_eq!(view.entries[1].value, Decimal::ZERO);
        assert_eq!(view.total, dec!(10));
    }

    #[tokio::test]
    async fn account_failure_is_reported_upstream() {
        let exchange = MockExchange::new().without_account_endpoint();

        let err = portfolio_valuation(&exchange).await.unwrap_err();
        assert!(matches!(err, CommandError::UpstreamUnavailable(_)));
    }
}
