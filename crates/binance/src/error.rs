use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BinanceError {
    #[error("http client error: {0}")]
    HttpClient(#[from] reqwest::Error),
    #[error("unexpected http status {status}: {body}")]
    HttpStatusWithBody { status: StatusCode, body: String },
    #[error("binance api error {code}: {message}")]
    Api { code: i64, message: String },
    #[error("failed to decode response from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("empty response from {0}")]
    EmptyResponse(String),
    #[error("signature error: {0}")]
    Signature(String),
    #[error("invalid header value: {0}")]
    Header(#[from] reqwest::header::InvalidHeaderValue),
}
