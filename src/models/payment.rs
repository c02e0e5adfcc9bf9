use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::order::{Order, PaymentMethod, UnknownVariant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentLogType {
    CreateTransaction,
    Callback,
}

impl PaymentLogType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreateTransaction => "create_transaction",
            Self::Callback => "callback",
        }
    }
}

impl TryFrom<String> for PaymentLogType {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "create_transaction" => Ok(Self::CreateTransaction),
            "callback" => Ok(Self::Callback),
            _ => Err(UnknownVariant {
                kind: "payment log type",
                value,
            }),
        }
    }
}

/// Append-only trace of a gateway interaction.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PaymentLog {
    pub id: Uuid,
    pub order_id: Uuid,
    pub number_order: String,
    #[sqlx(try_from = "String")]
    pub type_log: PaymentLogType,
    #[sqlx(try_from = "String")]
    pub payment_method: PaymentMethod,
    pub payment_channel: String,
    pub log: String,
    pub created_at: DateTime<Utc>,
}

impl PaymentLog {
    pub fn for_order(order: &Order, type_log: PaymentLogType, log: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            order_id: order.id,
            number_order: order.number_order.clone(),
            type_log,
            payment_method: order.payment_method,
            payment_channel: order.payment_channel.clone(),
            log,
            created_at: Utc::now(),
        }
    }
}

// ==================== BANKS ====================
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BankTransfer {
    pub id: Uuid,
    pub bank_code: String,
    pub bank_name: String,
    pub bank_logo: String,
    pub no_account: String,
    pub account_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BankVa {
    pub id: Uuid,
    pub bank_code: String,
    pub bank_name: String,
    pub bank_logo: String,
}
