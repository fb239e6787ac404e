//! Scripted exchange double for workflow tests. Prices, balances and rules
//! are preset; orders are recorded instead of sent anywhere.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::exchange::{
    AssetBalance, ExchangeError, OrderReceipt, OrderSide, SpotExchange, SymbolRules,
};

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedOrder {
    pub symbol: String,
    pub side: OrderSide,
    pub quantity: Decimal,
}

#[derive(Default)]
pub struct MockExchange {
    prices: HashMap<String, Decimal>,
    free: HashMap<String, Decimal>,
    rules: HashMap<String, SymbolRules>,
    orders: Mutex<Vec<RecordedOrder>>,
    reject_orders_with: Option<String>,
    rules_unavailable: bool,
    account_unavailable: bool,
}

impl MockExchange {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_price(mut self, symbol: &str, price: Decimal) -> Self {
        self.prices.insert(symbol.to_string(), price);
        self
    }

    pub fn with_free_balance(mut self, asset: &str, amount: Decimal) -> Self {
        self.free.insert(asset.to_string(), amount);
        self
    }

    pub fn with_rules(mut self, symbol: &str, min_qty: Decimal, step_size: Decimal) -> Self {
        self.rules
            .insert(symbol.to_string(), SymbolRules { min_qty, step_size });
        self
    }

    pub fn rejecting_orders(mut self, message: &str) -> Self {
        self.reject_orders_with = Some(message.to_string());
        self
    }

    pub fn without_rules_endpoint(mut self) -> Self {
        self.rules_unavailable = true;
        self
    }

    pub fn without_account_endpoint(mut self) -> Self {
        self.account_unavailable = true;
        self
    }

    pub fn recorded_orders(&self) -> Vec<RecordedOrder> {
        self.orders.lock().unwrap().clone()
    }
}

#[async_trait]
impl SpotExchange for MockExchange {
    async fn latest_price(&self, symbol: &str) -> Result<Decimal, ExchangeError> {
        self.prices
            .get(symbol)
            .copied()
            .ok_or_else(|| ExchangeError::Rejected {
                code: -1121,
                message: format!("Invalid symbol: {symbol}"),
            })
    }

    async fn free_balance(&self, asset: &str) -> Result<Decimal, ExchangeError> {
        if self.account_unavailable {
            return Err(ExchangeError::Unavailable("account unreachable".to_string()));
        }
        Ok(self.free.get(asset).copied().unwrap_or_default())
    }

    async fn balances(&self) -> Result<Vec<AssetBalance>, ExchangeError> {
        if self.account_unavailable {
            return Err(ExchangeError::Unavailable("account unreachable".to_string()));
        }
        let mut balances: Vec<AssetBalance> = self
            .free
            .iter()
            .map(|(asset, free)| AssetBalance {
                asset: asset.clone(),
                free: *free,
            })
            .collect();
        balances.sort_by(|a, b| a.asset.cmp(&b.asset));
        Ok(balances)
    }

    async fn symbol_rules(&self, symbol: &str) -> Result<SymbolRules, ExchangeError> {
        if self.rules_unavailable {
            return Err(ExchangeError::Unavailable(
                "exchangeInfo unreachable".to_string(),
            ));
        }
        self.rules
            .get(symbol)
            .copied()
            .ok_or_else(|| ExchangeError::Unavailable(format!("no rules for {symbol}")))
    }

    async fn market_order(
        &self,
        symbol: &str,
        side: OrderSide,
        quantity: Decimal,
    ) -> Result<OrderReceipt, ExchangeError> {
        if let Some(message) = &self.reject_orders_with {
            return Err(ExchangeError::Rejected {
                code: -2010,
                message: message.clone(),
            });
        }

        self.orders.lock().unwrap().push(RecordedOrder {
            symbol: symbol.to_string(),
            side,
            quantity,
        });

        let price = self.prices.get(symbol).copied().unwrap_or_default();
        Ok(OrderReceipt {
            symbol: symbol.to_string(),
            side,
            executed_qty: quantity,
            fill_price: Some(price),
            quote_total: quantity * price,
        })
    }
}
