use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

use crate::{
    config::Config,
    error::{AppError, Result},
    models::PaymentMethod,
};

const TELEGRAM_API_URL: &str = "https://api.telegram.org";
const TELEGRAM_TIMEOUT_SECS: u64 = 10;

/// Best-effort outbound message to the operations channel.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, message: &str) -> Result<()>;
}

pub fn order_message(method: PaymentMethod, number_order: &str) -> String {
    format!(
        "new order ({}) {}",
        method.as_str().to_uppercase(),
        number_order
    )
}

/// Sends and swallows the error; a failed notification never undoes an order.
pub async fn notify_best_effort(notifier: &dyn Notifier, message: &str) {
    if let Err(e) = notifier.notify(message).await {
        tracing::warn!("Order notification failed: {}", e);
    }
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
}

pub struct TelegramNotifier {
    client: reqwest::Client,
    bot_token: Option<String>,
    chat_id: Option<String>,
}

impl TelegramNotifier {
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(TELEGRAM_TIMEOUT_SECS))
            .build()
            .map_err(|e| AppError::Internal(format!("Telegram HTTP client init failed: {}", e)))?;

        Ok(Self {
            client,
            bot_token: config.telegram_bot_token.clone().filter(|t| !t.trim().is_empty()),
            chat_id: config.telegram_chat_id.clone().filter(|c| !c.trim().is_empty()),
        })
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, message: &str) -> Result<()> {
        let (Some(token), Some(chat_id)) = (&self.bot_token, &self.chat_id) else {
            tracing::debug!("Telegram not configured, skipping: {}", message);
            return Ok(());
        };

        let url = format!("{}/bot{}/sendMessage", TELEGRAM_API_URL, token);
        let response = self
            .client
            .post(url)
            .json(&SendMessage {
                chat_id,
                text: message,
            })
            .send()
            .await
            .map_err(|e| AppError::Internal(format!("Telegram request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Internal(format!(
                "Telegram sendMessage returned {}",
                response.status()
            )));
        }

        tracing::info!("Telegram notification sent: {}", message);
        Ok(())
    }
}
