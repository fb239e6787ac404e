use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("http client error: {0}")]
    HttpClient(#[from] reqwest::Error),
    #[error("unexpected http status {status}: {body}")]
    HttpStatusWithBody { status: StatusCode, body: String },
    #[error("telegram api error {code} on {method}: {description}")]
    Api {
        method: String,
        code: i64,
        description: String,
    },
    #[error("failed to decode response from {method}: {source}")]
    Decode {
        method: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("empty response from {0}")]
    EmptyResponse(String),
}
