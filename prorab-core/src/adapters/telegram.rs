//! Telegram Bot API push relay
//!
//! Sends `sendMessage` requests for the notification outbox. Credentials come
//! from `TELEGRAM_BOT_TOKEN` and `TELEGRAM_CHAT_ID`; without both the relay is
//! not configured and notifications are only recorded.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use crate::domain::result::{Error, Result};
use crate::ports::PushRelay;

const DEFAULT_API_BASE: &str = "https://api.telegram.org";

pub const TOKEN_ENV: &str = "TELEGRAM_BOT_TOKEN";
pub const CHAT_ID_ENV: &str = "TELEGRAM_CHAT_ID";

/// `sendMessage` request body
#[derive(Debug, Serialize)]
pub struct SendMessageRequest<'a> {
    pub chat_id: &'a str,
    pub text: &'a str,
    pub parse_mode: &'a str,
}

#[derive(Debug)]
pub struct TelegramRelay {
    client: Client,
    api_base: String,
    token: String,
    chat_id: String,
}

impl TelegramRelay {
    pub fn new(token: impl Into<String>, chat_id: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| Error::relay(e.to_string()))?;

        Ok(Self {
            client,
            api_base: DEFAULT_API_BASE.to_string(),
            token: token.into(),
            chat_id: chat_id.into(),
        })
    }

    /// Build from the environment; `None` when either variable is unset or empty
    pub fn from_env() -> Option<Result<Self>> {
        let token = std::env::var(TOKEN_ENV).ok().filter(|v| !v.is_empty())?;
        let chat_id = std::env::var(CHAT_ID_ENV).ok().filter(|v| !v.is_empty())?;
        Some(Self::new(token, chat_id))
    }

    /// Point the relay at another Bot API host (self-hosted server, tests)
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/bot{}/sendMessage", self.api_base, self.token)
    }

    pub fn request<'a>(&'a self, text: &'a str) -> SendMessageRequest<'a> {
        SendMessageRequest {
            chat_id: &self.chat_id,
            text,
            parse_mode: "HTML",
        }
    }
}

#[async_trait]
impl PushRelay for TelegramRelay {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn send(&self, text: &str) -> Result<()> {
        let response = self
            .client
            .post(self.endpoint())
            .json(&self.request(text))
            .send()
            .await
            // The token is part of the URL; keep it out of error messages
            .map_err(|e| Error::relay(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::relay(format!("sendMessage returned {}: {}", status, body)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body() {
        let relay = TelegramRelay::new("123:abc", "-100200").unwrap();
        let body = serde_json::to_value(relay.request("Склад\n\nМало цемента")).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "chat_id": "-100200",
                "text": "Склад\n\nМало цемента",
                "parse_mode": "HTML"
            })
        );
    }

    #[test]
    fn test_endpoint() {
        let relay = TelegramRelay::new("123:abc", "1")
            .unwrap()
            .with_api_base("http://127.0.0.1:8081/");
        assert_eq!(relay.endpoint(), "http://127.0.0.1:8081/bot123:abc/sendMessage");
    }

    #[tokio::test]
    async fn test_unreachable_host_is_relay_error() {
        let relay = TelegramRelay::new("123:abc", "1")
            .unwrap()
            .with_api_base("http://127.0.0.1:9");
        let err = relay.send("ping").await.unwrap_err();
        assert!(matches!(err, Error::Relay(_)));
        assert!(!err.to_string().contains("123:abc"));
    }
}
