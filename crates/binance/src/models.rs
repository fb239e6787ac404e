use crate::error::BinanceError;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Sign a query string the way Binance signed endpoints require.
///
/// Returns the hex-encoded HMAC-SHA256 signature to append as `signature`.
pub fn sign_query(query: &str, secret_key: &str) -> Result<String, BinanceError> {
    let mut mac = HmacSha256::new_from_slice(secret_key.as_bytes())
        .map_err(|err| BinanceError::Signature(err.to_string()))?;
    mac.update(query.as_bytes());
    let signature = mac.finalize().into_bytes();
    Ok(hex::encode(signature))
}

#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerTime {
    pub server_time: u64,
}

#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TickerPrice {
    pub symbol: String,
    pub price: String,
}

#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountInformation {
    #[serde(default)]
    pub can_trade: bool,
    #[serde(default)]
    pub balances: Vec<BalanceEntry>,
}

#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceEntry {
    pub asset: String,
    pub free: String,
    pub locked: String,
}

#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeInfo {
    #[serde(default)]
    pub symbols: Vec<SymbolInfo>,
}

#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolInfo {
    pub symbol: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub filters: Vec<SymbolFilter>,
}

impl SymbolInfo {
    /// The LOT_SIZE filter carries the minimum order quantity and step size.
    pub fn lot_size(&self) -> Option<&SymbolFilter> {
        self.filters
            .iter()
            .find(|filter| filter.filter_type == "LOT_SIZE")
    }
}

#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolFilter {
    pub filter_type: String,
    #[serde(default)]
    pub min_qty: Option<String>,
    #[serde(default)]
    pub max_qty: Option<String>,
    #[serde(default)]
    pub step_size: Option<String>,
}

#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub symbol: String,
    pub order_id: u64,
    #[serde(default)]
    pub client_order_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub executed_qty: String,
    /// Binance spells this field with the doubled "m".
    #[serde(default)]
    pub cummulative_quote_qty: String,
    #[serde(default)]
    pub fills: Vec<OrderFill>,
}

#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderFill {
    pub price: String,
    pub qty: String,
    #[serde(default)]
    pub commission: Option<String>,
    #[serde(default)]
    pub commission_asset: Option<String>,
}

/// Error payload Binance returns alongside non-2xx statuses.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct ApiErrorBody {
    pub code: i64,
    pub msg: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_query_matches_documented_vector() {
        // Example request from the Binance API signing documentation.
        let query = "symbol=LTCBTC&side=BUY&type=LIMIT&timeInForce=GTC&quantity=1&price=0.1&recvWindow=5000&timestamp=1499827319559";
        let secret = "NhqPtmdSJYdKjVHjA7PZj4Mge3R5YNiP1e3UZjInClVN65XAbvqqM6A7H5fATj0j";
        let signature = sign_query(query, secret).unwrap();
        assert_eq!(
            signature,
            "c8db56825ae71d6d79447849e617115f4a920fa2acdcab2b053c4b2838bd6b71"
        );
    }

    #[test]
    fn parses_ticker_price() {
        let body = r#"{"symbol":"BTCUSDT","price":"50000.01000000"}"#;
        let ticker: TickerPrice = serde_json::from_str(body).unwrap();
        assert_eq!(ticker.symbol, "BTCUSDT");
        assert_eq!(ticker.price, "50000.01000000");
    }

    #[test]
    fn parses_exchange_info_lot_size() {
        let body = r#"{
            "timezone": "UTC",
            "symbols": [{
                "symbol": "BTCUSDT",
                "status": "TRADING",
                "filters": [
                    {"filterType": "PRICE_FILTER", "minPrice": "0.01"},
                    {"filterType": "LOT_SIZE", "minQty": "0.00010000", "maxQty": "9000.00000000", "stepSize": "0.00010000"}
                ]
            }]
        }"#;
        let info: ExchangeInfo = serde_json::from_str(body).unwrap();
        let symbol = &info.symbols[0];
        let lot_size = symbol.lot_size().unwrap();
        assert_eq!(lot_size.min_qty.as_deref(), Some("0.00010000"));
        assert_eq!(lot_size.step_size.as_deref(), Some("0.00010000"));
    }

    #[test]
    fn parses_market_order_response_with_fills() {
        let body = r#"{
            "symbol": "BTCUSDT",
            "orderId": 28,
            "orderListId": -1,
            "clientOrderId": "6gCrw2kRUAF9CvJDGP16IP",
            "transactTime": 1507725176595,
            "price": "0.00000000",
            "origQty": "0.00200000",
            "executedQty": "0.00200000",
            "cummulativeQuoteQty": "100.00000000",
            "status": "FILLED",
            "timeInForce": "GTC",
            "type": "MARKET",
            "side": "BUY",
            "fills": [
                {"price": "50000.00000000", "qty": "0.00200000", "commission": "0.00000200", "commissionAsset": "BTC"}
            ]
        }"#;
        let order: OrderResponse = serde_json::from_str(body).unwrap();
        assert_eq!(order.order_id, 28);
        assert_eq!(order.executed_qty, "0.00200000");
        assert_eq!(order.cummulative_quote_qty, "100.00000000");
        assert_eq!(order.fills[0].price, "50000.00000000");
    }

    #[test]
    fn parses_api_error_body() {
        let body = r#"{"code":-2010,"msg":"Account has insufficient balance for requested action."}"#;
        let error: ApiErrorBody = serde_json::from_str(body).unwrap();
        assert_eq!(error.code, -2010);
        assert!(error.msg.contains("insufficient balance"));
    }
}
