//! Telegram notification channel
//!
//! Delivers messages through the Telegram Bot API's `sendMessage` endpoint
//! with HTML parse mode. The channel carries its own bounded retry: transient
//! delivery problems are retried a few times, 4xx responses are not, and any
//! final failure is reported as a failed [`DeliveryStatus`] rather than an
//! error, since the monitoring loop must keep running when Telegram is down.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use super::{Channel, ChannelError, ChannelResult, DeliveryStatus};
use crate::config::TelegramSettings;

/// Default Bot API origin; overridable for tests
const TELEGRAM_API_URL: &str = "https://api.telegram.org";

/// Telegram Bot API channel
pub struct TelegramChannel {
    settings: TelegramSettings,
    client: Client,
    api_base: String,
}

impl TelegramChannel {
    /// Create a new Telegram channel
    pub fn new(settings: TelegramSettings) -> ChannelResult<Self> {
        Self::with_api_base(settings, TELEGRAM_API_URL)
    }

    /// Create a channel against a custom API origin (mock servers in tests)
    pub fn with_api_base(settings: TelegramSettings, api_base: &str) -> ChannelResult<Self> {
        validate_settings(&settings).map_err(ChannelError::InvalidConfig)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| ChannelError::Other(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            settings,
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
        })
    }

    /// Full sendMessage endpoint URL
    fn send_url(&self) -> String {
        format!(
            "{}/bot{}/sendMessage",
            self.api_base, self.settings.bot_token
        )
    }

    /// Build the sendMessage payload
    fn build_payload(&self, text: &str) -> serde_json::Value {
        serde_json::json!({
            "chat_id": self.settings.chat_id,
            "text": text,
            "parse_mode": "HTML",
            "disable_web_page_preview": true,
        })
    }

    /// Send the request with retry logic
    async fn send_with_retry(&self, payload: &serde_json::Value) -> ChannelResult<()> {
        let mut last_error = None;
        let url = self.send_url();

        for attempt in 0..=self.settings.max_retries {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s, 4s...
                let delay = Duration::from_secs(2_u64.pow(attempt - 1));
                tokio::time::sleep(delay).await;
                tracing::debug!(
                    "Retrying Telegram delivery (attempt {}/{})",
                    attempt + 1,
                    self.settings.max_retries + 1
                );
            }

            match self.client.post(&url).json(payload).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        tracing::info!(status = %status, "Telegram message delivered");
                        return Ok(());
                    }

                    let body = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Unable to read response body".to_string());
                    last_error = Some(ChannelError::Other(format!("HTTP {status}: {body}")));

                    // Don't retry on client errors (bad token, bad chat_id)
                    if status.is_client_error() {
                        break;
                    }
                }
                Err(e) => {
                    last_error = Some(ChannelError::HttpError(e));
                }
            }
        }

        Err(last_error.unwrap_or_else(|| ChannelError::Other("Unknown error".to_string())))
    }
}

/// Validate Telegram settings
fn validate_settings(settings: &TelegramSettings) -> Result<(), String> {
    if settings.bot_token.is_empty() {
        return Err("Telegram bot token cannot be empty".to_string());
    }

    if settings.chat_id.is_empty() {
        return Err("Telegram chat ID cannot be empty".to_string());
    }

    if settings.timeout_secs == 0 {
        return Err("Timeout must be greater than 0".to_string());
    }

    Ok(())
}

#[async_trait]
impl Channel for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn send_text(&self, text: &str) -> ChannelResult<DeliveryStatus> {
        let payload = self.build_payload(text);

        match self.send_with_retry(&payload).await {
            Ok(()) => Ok(DeliveryStatus::success("telegram")),
            Err(e) => {
                tracing::error!("Failed to deliver Telegram message: {e}");
                Ok(DeliveryStatus::failure("telegram", e.to_string()))
            }
        }
    }
}
