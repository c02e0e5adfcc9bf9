use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // Server
    pub host: String,
    pub port: u16,
    pub environment: String,

    // Database
    pub database_url: String,
    pub database_max_connections: u32,

    // JWT
    pub jwt_secret: String,

    // Payment gateway (VA / QRIS)
    pub payment_gateway_url: String,
    pub payment_merchant_va: String,
    pub payment_api_key: String,
    pub payment_callback_url: String,
    pub payment_timeout_secs: u64,

    // Ops notification channel
    pub telegram_bot_token: Option<String>,
    pub telegram_chat_id: Option<String>,

    // CORS
    pub cors_allowed_origins: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();

        Ok(Config {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()?,
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),

            database_url: env::var("DATABASE_URL")?,
            database_max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "20".to_string())
                .parse()?,

            jwt_secret: env::var("JWT_SECRET")?,

            payment_gateway_url: env::var("PAYMENT_GATEWAY_URL")?,
            payment_merchant_va: env::var("PAYMENT_MERCHANT_VA")?,
            payment_api_key: env::var("PAYMENT_API_KEY")?,
            payment_callback_url: env::var("PAYMENT_CALLBACK_URL")?,
            payment_timeout_secs: env::var("PAYMENT_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()?,

            telegram_bot_token: env::var("TELEGRAM_BOT_TOKEN").ok(),
            telegram_chat_id: env::var("TELEGRAM_CHAT_ID").ok(),

            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "*".to_string()),
        })
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.database_url.trim().is_empty() {
            anyhow::bail!("DATABASE_URL is empty");
        }
        if self.jwt_secret.trim().is_empty() {
            anyhow::bail!("JWT_SECRET is empty");
        }
        if self.payment_gateway_url.trim().is_empty() {
            anyhow::bail!("PAYMENT_GATEWAY_URL is empty");
        }
        if self.payment_merchant_va.trim().is_empty() || self.payment_api_key.trim().is_empty() {
            anyhow::bail!("Payment gateway credentials are missing");
        }
        if self.payment_callback_url.trim().is_empty() {
            anyhow::bail!("PAYMENT_CALLBACK_URL is empty");
        }
        if self.payment_timeout_secs == 0 {
            anyhow::bail!("PAYMENT_TIMEOUT_SECS must be > 0");
        }

        if self.payment_gateway_url.contains("sandbox") && !self.is_development() {
            tracing::warn!("Sandbox payment gateway configured outside development");
        }
        if self.jwt_secret.contains("secret") {
            tracing::warn!("Detected dev credentials in config");
        }
        if self.telegram_bot_token.is_none() || self.telegram_chat_id.is_none() {
            tracing::warn!("Telegram not configured; order notifications are disabled");
        }
        if self.cors_allowed_origins.trim().is_empty() {
            tracing::warn!("CORS_ALLOWED_ORIGINS is empty; requests may be blocked");
        }

        Ok(())
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development" || self.environment == "staging"
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config {
        host: "0.0.0.0".to_string(),
        port: 3000,
        environment: "development".to_string(),
        database_url: "postgres://localhost/bunda_test".to_string(),
        database_max_connections: 1,
        jwt_secret: "test_jwt_key".to_string(),
        payment_gateway_url: "https://sandbox.gateway.test/api/v2/payment/direct".to_string(),
        payment_merchant_va: "0000001234567890".to_string(),
        payment_api_key: "SANDBOX-KEY".to_string(),
        payment_callback_url: "https://api.example.test/api/v1/order/update".to_string(),
        payment_timeout_secs: 5,
        telegram_bot_token: None,
        telegram_chat_id: None,
        cors_allowed_origins: "*".to_string(),
    }
}
