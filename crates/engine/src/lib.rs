pub mod account;
pub mod error;
pub mod exchange;
pub mod format;
pub mod market;
pub mod quantity;
pub mod store;
pub mod trade;

#[cfg(test)]
pub(crate) mod testing;

pub use error::CommandError;
pub use exchange::{
    AssetBalance, ExchangeError, OrderReceipt, OrderSide, SpotExchange, SymbolRules,
};
pub use store::{PendingOrder, PendingOrderStore};
