use crate::error::BinanceError;
use crate::models::{
    AccountInformation, ApiErrorBody, BalanceEntry, ExchangeInfo, OrderResponse, ServerTime,
    SymbolInfo, TickerPrice,
};
use bot_core::config::{AppConfig, BinanceCredentials};
use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::instrument;

const API_PREFIX: &str = "/api/v3";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone)]
pub struct BinanceRestClient {
    http: Client,
    base_url: String,
    credentials: BinanceCredentials,
}

impl BinanceRestClient {
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let credentials = config.require_binance_credentials()?.clone();
        Ok(Self::new(config.binance_rest_endpoint.clone(), credentials)?)
    }

    pub fn new(
        base_url: impl Into<String>,
        credentials: BinanceCredentials,
    ) -> Result<Self, BinanceError> {
        let http = Client::builder()
            .user_agent("trader-bot/0.1")
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into(),
            credentials,
        })
    }

    #[instrument(skip(self))]
    pub async fn get_server_time(&self) -> Result<u64, BinanceError> {
        let path = format!("{API_PREFIX}/time");
        let response: ServerTime = self.public_get(&path).await?;
        Ok(response.server_time)
    }

    #[instrument(skip(self), fields(symbol = %symbol))]
    pub async fn get_symbol_price(&self, symbol: &str) -> Result<TickerPrice, BinanceError> {
        let path = format!("{API_PREFIX}/ticker/price?symbol={symbol}");
        self.public_get(&path).await
    }

    /// Symbol metadata including the trading filters (LOT_SIZE among them).
    #[instrument(skip(self), fields(symbol = %symbol))]
    pub async fn get_symbol_info(&self, symbol: &str) -> Result<SymbolInfo, BinanceError> {
        let path = format!("{API_PREFIX}/exchangeInfo?symbol={symbol}");
        let response: ExchangeInfo = self.public_get(&path).await?;
        response
            .symbols
            .into_iter()
            .next()
            .ok_or_else(|| BinanceError::EmptyResponse("exchangeInfo".into()))
    }

    #[instrument(skip(self))]
    pub async fn get_account(&self) -> Result<AccountInformation, BinanceError> {
        let path = format!("{API_PREFIX}/account");
        self.signed_request(Method::GET, &path, Vec::new()).await
    }

    #[instrument(skip(self), fields(asset = %asset))]
    pub async fn get_asset_balance(
        &self,
        asset: &str,
    ) -> Result<Option<BalanceEntry>, BinanceError> {
        let account = self.get_account().await?;
        Ok(account
            .balances
            .into_iter()
            .find(|entry| entry.asset.eq_ignore_ascii_case(asset)))
    }

    /// Submit a market order. `quantity` is a decimal string so the caller
    /// keeps full control of precision.
    #[instrument(skip(self), fields(symbol = %symbol, side = %side, quantity = %quantity))]
    pub async fn place_market_order(
        &self,
        symbol: &str,
        side: &str,
        quantity: &str,
    ) -> Result<OrderResponse, BinanceError> {
        let params = vec![
            ("symbol".to_string(), symbol.to_string()),
            ("side".to_string(), side.to_string()),
            ("type".to_string(), "MARKET".to_string()),
            ("quantity".to_string(), quantity.to_string()),
        ];
        let path = format!("{API_PREFIX}/order");
        self.signed_request(Method::POST, &path, params).await
    }

    async fn public_get<T>(&self, path_and_query: &str) -> Result<T, BinanceError>
    where
        T: DeserializeOwned,
    {
        tracing::debug!("Binance GET {path_and_query}");
        let builder = self
            .http
            .get(format!("{}{}", self.base_url, path_and_query));
        self.execute(builder, path_and_query).await
    }

    async fn signed_request<T>(
        &self,
        method: Method,
        path: &str,
        mut params: Vec<(String, String)>,
    ) -> Result<T, BinanceError>
    where
        T: DeserializeOwned,
    {
        params.push((
            "timestamp".to_string(),
            Utc::now().timestamp_millis().to_string(),
        ));

        let query = params
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join("&");
        let signature = crate::models::sign_query(&query, &self.credentials.api_secret)?;
        let signed_query = format!("{query}&signature={signature}");

        let mut headers = HeaderMap::new();
        headers.insert(
            "X-MBX-APIKEY",
            HeaderValue::from_str(&self.credentials.api_key)?,
        );

        let builder = match method {
            // Order submission carries the signed query as a form body.
            Method::POST => self
                .http
                .post(format!("{}{}", self.base_url, path))
                .headers(headers)
                .header(
                    CONTENT_TYPE,
                    HeaderValue::from_static("application/x-www-form-urlencoded"),
                )
                .body(signed_query),
            _ => self
                .http
                .request(
                    method,
                    format!("{}{}?{}", self.base_url, path, signed_query),
                )
                .headers(headers),
        };

        self.execute(builder, path).await
    }

    async fn execute<T>(&self, builder: RequestBuilder, endpoint: &str) -> Result<T, BinanceError>
    where
        T: DeserializeOwned,
    {
        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            // Rejections come back as {"code":-2010,"msg":"..."}.
            if let Ok(api_error) = serde_json::from_str::<ApiErrorBody>(&body) {
                return Err(BinanceError::Api {
                    code: api_error.code,
                    message: api_error.msg,
                });
            }
            return Err(BinanceError::HttpStatusWithBody { status, body });
        }

        serde_json::from_str(&body).map_err(|source| BinanceError::Decode {
            endpoint: endpoint.to_string(),
            source,
        })
    }
}
