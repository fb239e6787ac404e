use crate::error::TelegramError;
use crate::models::{
    AnswerCallbackQueryRequest, ApiResponse, DeleteMessageRequest, EditMessageTextRequest,
    GetUpdatesRequest, InlineKeyboardMarkup, Message, SendMessageRequest, Update, User,
};
use bot_core::config::AppConfig;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::instrument;

/// How long a getUpdates call is allowed to hold the connection open.
pub const LONG_POLL_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct TelegramBotClient {
    http: Client,
    base_url: String,
    token: String,
}

impl TelegramBotClient {
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let settings = config.require_telegram_settings()?;
        Ok(Self::new(
            config.telegram_api_endpoint.clone(),
            settings.bot_token.clone(),
        )?)
    }

    pub fn new(
        base_url: impl Into<String>,
        token: impl Into<String>,
    ) -> Result<Self, TelegramError> {
        // Client timeout must outlive the long poll.
        let http = Client::builder()
            .user_agent("trader-bot/0.1")
            .timeout(Duration::from_secs(LONG_POLL_TIMEOUT_SECS + 10))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into(),
            token: token.into(),
        })
    }

    #[instrument(skip(self))]
    pub async fn get_me(&self) -> Result<User, TelegramError> {
        self.call("getMe", &serde_json::json!({})).await
    }

    #[instrument(skip(self), fields(offset = ?offset))]
    pub async fn get_updates(
        &self,
        offset: Option<i64>,
        timeout_secs: u64,
    ) -> Result<Vec<Update>, TelegramError> {
        let request = GetUpdatesRequest {
            offset,
            timeout: timeout_secs,
            allowed_updates: vec!["message".to_string(), "callback_query".to_string()],
        };
        self.call("getUpdates", &request).await
    }

    #[instrument(skip(self, text, keyboard), fields(chat_id = chat_id))]
    pub async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<Message, TelegramError> {
        let request = SendMessageRequest {
            chat_id,
            text: text.to_string(),
            parse_mode: Some("HTML".to_string()),
            reply_markup: keyboard,
        };
        self.call("sendMessage", &request).await
    }

    #[instrument(skip(self, text), fields(chat_id = chat_id, message_id = message_id))]
    pub async fn edit_message_text(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
    ) -> Result<Message, TelegramError> {
        let request = EditMessageTextRequest {
            chat_id,
            message_id,
            text: text.to_string(),
            parse_mode: Some("HTML".to_string()),
        };
        self.call("editMessageText", &request).await
    }

    #[instrument(skip(self, callback_query_id))]
    pub async fn answer_callback_query(
        &self,
        callback_query_id: &str,
    ) -> Result<bool, TelegramError> {
        let request = AnswerCallbackQueryRequest {
            callback_query_id: callback_query_id.to_string(),
        };
        self.call("answerCallbackQuery", &request).await
    }

    #[instrument(skip(self), fields(chat_id = chat_id, message_id = message_id))]
    pub async fn delete_message(
        &self,
        chat_id: i64,
        message_id: i64,
    ) -> Result<bool, TelegramError> {
        let request = DeleteMessageRequest {
            chat_id,
            message_id,
        };
        self.call("deleteMessage", &request).await
    }

    async fn call<R, T>(&self, method: &str, payload: &R) -> Result<T, TelegramError>
    where
        R: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        tracing::debug!("Telegram call {method}");
        let url = format!("{}/bot{}/{}", self.base_url, self.token, method);
        let response = self.http.post(url).json(payload).send().await?;
        let status = response.status();
        let body = response.text().await?;

        // The Bot API reports failures inside the envelope, usually alongside
        // a non-2xx status; fall back to the raw body when it is not JSON.
        let envelope: ApiResponse<T> = match serde_json::from_str(&body) {
            Ok(envelope) => envelope,
            Err(source) => {
                if !status.is_success() {
                    return Err(TelegramError::HttpStatusWithBody { status, body });
                }
                return Err(TelegramError::Decode {
                    method: method.to_string(),
                    source,
                });
            }
        };

        envelope.into_result(method)
    }
}
