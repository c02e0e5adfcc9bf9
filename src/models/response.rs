use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use super::ledger::{BalancePoint, BalancePointTx};
use super::order::{Order, OrderItem};
use super::payment::{BankTransfer, BankVa};
use super::user::CartLine;

/// Method-specific payment instructions shown after checkout.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PaymentInstruction {
    VirtualAccount {
        bank_code: String,
        bank_name: Option<String>,
        bank_logo: Option<String>,
        payment_no: Option<String>,
        payment_name: Option<String>,
        expired: Option<String>,
        trx_id: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        gateway: Option<serde_json::Value>,
    },
    Transfer {
        bank_code: String,
        bank_name: String,
        bank_logo: String,
        no_account: String,
        account_name: String,
        total: Option<Decimal>,
        reference_id: String,
    },
    CashOnDelivery,
    Point,
}

impl PaymentInstruction {
    pub fn virtual_account(
        order: &Order,
        bank: Option<&BankVa>,
        gateway: Option<serde_json::Value>,
    ) -> Self {
        Self::VirtualAccount {
            bank_code: order.payment_channel.clone(),
            bank_name: bank.map(|b| b.bank_name.clone()),
            bank_logo: bank.map(|b| b.bank_logo.clone()),
            payment_no: order.payment_no.clone(),
            payment_name: order.payment_name.clone(),
            expired: order.payment_expired.clone(),
            trx_id: order.trx_id.clone(),
            gateway,
        }
    }

    pub fn transfer(order: &Order, bank: &BankTransfer) -> Self {
        Self::Transfer {
            bank_code: bank.bank_code.clone(),
            bank_name: bank.bank_name.clone(),
            bank_logo: bank.bank_logo.clone(),
            no_account: bank.no_account.clone(),
            account_name: bank.account_name.clone(),
            total: order.payment_total,
            reference_id: order.number_order.clone(),
        }
    }
}

/// Common order projection plus optional payment instructions.
#[derive(Debug, Clone, Serialize)]
pub struct OrderResponse {
    #[serde(flatten)]
    pub order: Order,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment: Option<PaymentInstruction>,
}

impl OrderResponse {
    pub fn plain(order: Order) -> Self {
        Self {
            order,
            payment: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderDetailResponse {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

// ==================== CART ====================
#[derive(Debug, Clone, Serialize)]
pub struct CartEntry {
    #[serde(flatten)]
    pub line: CartLine,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct CartResponse {
    pub items: Vec<CartEntry>,
    pub sub_total: Decimal,
}

impl CartResponse {
    pub fn from_lines(lines: Vec<CartLine>) -> Self {
        let items: Vec<CartEntry> = lines
            .into_iter()
            .map(|line| CartEntry {
                unit_price: line.unit_price(),
                line_total: line.line_total(),
                line,
            })
            .collect();
        let sub_total = items.iter().map(|entry| entry.line_total).sum();
        Self { items, sub_total }
    }
}

// ==================== POINTS ====================
#[derive(Debug, Clone, Serialize)]
pub struct BalancePointResponse {
    pub balance_points: Decimal,
    pub updated_at: DateTime<Utc>,
}

impl From<BalancePoint> for BalancePointResponse {
    fn from(balance: BalancePoint) -> Self {
        Self {
            balance_points: balance.balance_points,
            updated_at: balance.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PointHistoryResponse {
    pub balance_points: Decimal,
    pub ledger_consistent: bool,
    pub entries: Vec<BalancePointTx>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PointCheckAmountResponse {
    pub balance_points: Decimal,
    pub amount: Decimal,
    pub sufficient: bool,
}

/// Ledger rows a user's balance holds for one order.
#[derive(Debug, Clone, Serialize)]
pub struct PointOrderTxResponse {
    pub number_order: String,
    pub recorded: bool,
    pub entries: Vec<BalancePointTx>,
}
