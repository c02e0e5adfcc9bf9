use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::order::UnknownVariant;

// ==================== BALANCE POINT ====================
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BalancePoint {
    pub id: Uuid,
    pub user_id: Uuid,
    pub balance_points: Decimal,
    pub updated_at: DateTime<Utc>,
}

/// Ledger row kinds. `Credit` moves points out of the balance (spent on an
/// order); `Debit` and `Referral` move points into it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointTxType {
    Credit,
    Debit,
    Referral,
}

impl PointTxType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Credit => "credit",
            Self::Debit => "debit",
            Self::Referral => "referral",
        }
    }

    /// +1 when the row increases the balance, -1 when it decreases it.
    pub fn sign(&self) -> Decimal {
        match self {
            Self::Credit => Decimal::NEGATIVE_ONE,
            Self::Debit | Self::Referral => Decimal::ONE,
        }
    }
}

impl TryFrom<String> for PointTxType {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "credit" => Ok(Self::Credit),
            "debit" => Ok(Self::Debit),
            "referral" => Ok(Self::Referral),
            _ => Err(UnknownVariant {
                kind: "point tx type",
                value,
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BalancePointTx {
    pub id: Uuid,
    pub balance_point_id: Uuid,
    pub no_order: String,
    #[sqlx(try_from = "String")]
    pub tx_type: PointTxType,
    pub tx_date: DateTime<Utc>,
    pub tx_nominal: Decimal,
    pub last_point_balance: Decimal,
    pub new_point_balance: Decimal,
    pub description: String,
}

// ==================== PRODUCT STOCK ====================
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Product {
    pub id: Uuid,
    pub no_sku: String,
    pub product_name: String,
    pub price: Decimal,
    pub stock: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ProductStockHistory {
    pub id: Uuid,
    pub product_id: Uuid,
    pub no_order: String,
    pub tx_date: DateTime<Utc>,
    pub stock_opening: i32,
    pub stock_out: i32,
    pub stock_final: i32,
    pub description: String,
}
