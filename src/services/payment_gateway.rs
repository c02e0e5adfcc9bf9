use async_trait::async_trait;
use hmac::{Hmac, Mac};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::time::Duration;

use crate::{
    config::Config,
    constants::{GATEWAY_SUCCESS_STATUS, PAYMENT_EXPIRY_HOURS},
    error::{AppError, Result},
    models::{Order, PaymentDetails},
};

type HmacSha256 = Hmac<Sha256>;

// ==================== WIRE TYPES ====================

/// Body of a direct-payment request (VA or QRIS).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayPaymentRequest {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub amount: Decimal,
    pub notify_url: String,
    pub expired: u32,
    pub expired_type: String,
    pub reference_id: String,
    pub payment_method: String,
    pub payment_channel: String,
}

impl GatewayPaymentRequest {
    pub fn for_order(order: &Order, notify_url: &str) -> Self {
        Self {
            name: order.full_name.clone(),
            phone: order.phone.clone(),
            email: order.email.clone(),
            amount: order.payment_by_cash,
            notify_url: notify_url.to_string(),
            expired: PAYMENT_EXPIRY_HOURS,
            expired_type: "hours".to_string(),
            reference_id: order.number_order.clone(),
            payment_method: order.payment_method.as_str().to_string(),
            payment_channel: order.payment_channel.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GatewayResponse {
    pub status: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: Option<GatewayPaymentData>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct GatewayPaymentData {
    #[serde(deserialize_with = "string_or_number")]
    pub session_id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub transaction_id: String,
    pub reference_id: String,
    pub via: String,
    pub channel: String,
    #[serde(deserialize_with = "string_or_number")]
    pub payment_no: String,
    pub payment_name: String,
    pub total: Decimal,
    pub fee: Decimal,
    pub expired: String,
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

/// An accepted payment: the typed response plus the raw body for the payment log
/// and the client response.
#[derive(Debug, Clone)]
pub struct GatewayCharge {
    pub response: GatewayResponse,
    pub raw: Value,
}

impl GatewayCharge {
    /// Parses a gateway body; any status other than 200 is a rejection.
    pub fn from_body(raw: Value) -> Result<Self> {
        let response: GatewayResponse = serde_json::from_value(raw.clone())
            .map_err(|e| AppError::Gateway(format!("Unreadable gateway response: {}", e)))?;

        if response.status != GATEWAY_SUCCESS_STATUS {
            return Err(AppError::Gateway(format!(
                "Gateway rejected payment ({}): {}",
                response.status, response.message
            )));
        }

        Ok(Self { response, raw })
    }

    pub fn data(&self) -> GatewayPaymentData {
        self.response.data.clone().unwrap_or_default()
    }

    pub fn payment_details(&self) -> PaymentDetails {
        let data = self.data();
        PaymentDetails {
            payment_no: Some(data.payment_no),
            payment_name: Some(data.payment_name),
            payment_expired: Some(data.expired),
            payment_total: Some(data.total),
            trx_id: Some(data.transaction_id),
        }
    }
}

// ==================== SIGNING ====================

/// `hex(HMAC_SHA256(key, "POST:" + va + ":" + lower(hex(sha256(body))) + ":" + key))`
pub fn sign_request(va: &str, api_key: &str, body: &[u8]) -> Result<String> {
    let body_hash = hex::encode(Sha256::digest(body)).to_lowercase();
    let string_to_sign = format!("POST:{}:{}:{}", va, body_hash, api_key);

    let mut mac = HmacSha256::new_from_slice(api_key.as_bytes())
        .map_err(|e| AppError::Internal(format!("Invalid gateway key: {}", e)))?;
    mac.update(string_to_sign.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

// ==================== CLIENT ====================

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// One signed attempt; no retry.
    async fn create_payment(&self, request: &GatewayPaymentRequest) -> Result<GatewayCharge>;
}

pub struct HttpPaymentGateway {
    client: reqwest::Client,
    url: String,
    merchant_va: String,
    api_key: String,
}

impl HttpPaymentGateway {
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.payment_timeout_secs))
            .build()
            .map_err(|e| AppError::Internal(format!("Gateway HTTP client init failed: {}", e)))?;

        Ok(Self {
            client,
            url: config.payment_gateway_url.clone(),
            merchant_va: config.payment_merchant_va.clone(),
            api_key: config.payment_api_key.clone(),
        })
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    async fn create_payment(&self, request: &GatewayPaymentRequest) -> Result<GatewayCharge> {
        let body = serde_json::to_vec(request)
            .map_err(|e| AppError::Internal(format!("Gateway request encode failed: {}", e)))?;
        let signature = sign_request(&self.merchant_va, &self.api_key, &body)?;

        tracing::debug!(
            "Sending {} payment for {} to gateway",
            request.payment_method,
            request.reference_id
        );

        let response = self
            .client
            .post(&self.url)
            .header("Content-Type", "application/json")
            .header("va", &self.merchant_va)
            .header("signature", signature)
            .body(body)
            .send()
            .await
            .map_err(|e| AppError::Gateway(format!("Gateway request failed: {}", e)))?;

        let http_status = response.status();
        let raw: Value = response.json().await.map_err(|e| {
            AppError::Gateway(format!(
                "Gateway response parse failed (HTTP {}): {}",
                http_status, e
            ))
        })?;

        GatewayCharge::from_body(raw)
    }
}
