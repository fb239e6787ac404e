use std::collections::HashMap;

use rust_decimal::Decimal;
use tokio::sync::Mutex;

use crate::exchange::OrderSide;

/// A trade waiting for the user to press confirm.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingOrder {
    pub symbol: String,
    pub quantity: Decimal,
    pub side: OrderSide,
}

/// In-memory pending orders, one slot per user. A new request overwrites
/// whatever the user had pending. Process-lifetime only: a restart drops
/// every entry, and the confirm path reports those as expired.
#[derive(Debug, Default)]
pub struct PendingOrderStore {
    inner: Mutex<HashMap<i64, PendingOrder>>,
}

impl PendingOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the user's pending order, returning the one it replaced.
    pub async fn put(&self, user_id: i64, order: PendingOrder) -> Option<PendingOrder> {
        self.inner.lock().await.insert(user_id, order)
    }

    pub async fn get(&self, user_id: i64) -> Option<PendingOrder> {
        self.inner.lock().await.get(&user_id).cloned()
    }

    pub async fn remove(&self, user_id: i64) -> Option<PendingOrder> {
        self.inner.lock().await.remove(&user_id)
    }

    /// Atomically take the user's pending order if it is for `symbol`. A
    /// mismatched symbol leaves the stored order untouched.
    pub async fn take_matching(&self, user_id: i64, symbol: &str) -> Option<PendingOrder> {
        let mut orders = self.inner.lock().await;
        match orders.get(&user_id) {
            Some(order) if order.symbol == symbol => orders.remove(&user_id),
            _ => None,
        }
    }
}
