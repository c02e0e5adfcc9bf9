use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::user::CartLine;

/// Raised when a stored status column holds a value no variant maps to.
#[derive(Debug, thiserror::Error)]
#[error("unknown {kind} value: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

// ==================== STATUS ====================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    AwaitingPayment,
    AwaitingConfirmation,
    Completed,
    Canceled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AwaitingPayment => "awaiting_payment",
            Self::AwaitingConfirmation => "awaiting_confirmation",
            Self::Completed => "completed",
            Self::Canceled => "canceled",
        }
    }

    /// Cancel is allowed from every state before completion.
    pub fn can_cancel(&self) -> bool {
        matches!(self, Self::AwaitingPayment | Self::AwaitingConfirmation)
    }

    pub fn can_complete(&self) -> bool {
        matches!(self, Self::AwaitingPayment | Self::AwaitingConfirmation)
    }
}

impl FromStr for OrderStatus {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "awaiting_payment" => Ok(Self::AwaitingPayment),
            "awaiting_confirmation" => Ok(Self::AwaitingConfirmation),
            "completed" => Ok(Self::Completed),
            "canceled" => Ok(Self::Canceled),
            other => Err(UnknownVariant {
                kind: "order status",
                value: other.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for OrderStatus {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Unpaid,
    Paid,
    Pending,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unpaid => "unpaid",
            Self::Paid => "paid",
            Self::Pending => "pending",
        }
    }
}

impl TryFrom<String> for PaymentStatus {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "unpaid" => Ok(Self::Unpaid),
            "paid" => Ok(Self::Paid),
            "pending" => Ok(Self::Pending),
            _ => Err(UnknownVariant {
                kind: "payment status",
                value,
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShippingStatus {
    Waiting,
    Shipped,
    Delivered,
}

impl ShippingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
        }
    }
}

impl TryFrom<String> for ShippingStatus {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "waiting" => Ok(Self::Waiting),
            "shipped" => Ok(Self::Shipped),
            "delivered" => Ok(Self::Delivered),
            _ => Err(UnknownVariant {
                kind: "shipping status",
                value,
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Va,
    Qris,
    Trf,
    Cod,
    Point,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Va => "va",
            Self::Qris => "qris",
            Self::Trf => "trf",
            Self::Cod => "cod",
            Self::Point => "point",
        }
    }

    /// VA and QRIS are both settled through the payment gateway.
    pub fn uses_gateway(&self) -> bool {
        matches!(self, Self::Va | Self::Qris)
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "va" => Ok(Self::Va),
            "qris" => Ok(Self::Qris),
            "trf" => Ok(Self::Trf),
            "cod" => Ok(Self::Cod),
            "point" => Ok(Self::Point),
            _ => Err(UnknownVariant {
                kind: "payment method",
                value: value.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for PaymentMethod {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

// ==================== ORDER ====================
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub number_order: String,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub courier_note: String,
    pub total_bill: Decimal,
    pub shipping_cost: Decimal,
    pub payment_by_cash: Decimal,
    pub payment_by_point: Decimal,
    #[sqlx(try_from = "String")]
    pub order_status: OrderStatus,
    #[sqlx(try_from = "String")]
    pub payment_status: PaymentStatus,
    #[sqlx(try_from = "String")]
    pub shipping_status: ShippingStatus,
    #[sqlx(try_from = "String")]
    pub payment_method: PaymentMethod,
    pub payment_channel: String,
    pub payment_no: Option<String>,
    pub payment_name: Option<String>,
    pub payment_expired: Option<String>,
    pub payment_total: Option<Decimal>,
    pub trx_id: Option<String>,
    pub ordered_at: DateTime<Utc>,
    pub payment_success_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub canceled_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Completion needs collected money: a paid order, or a COD order the
    /// buyer confirmed on delivery.
    pub fn can_complete(&self) -> bool {
        if !self.order_status.can_complete() {
            return false;
        }
        self.payment_status == PaymentStatus::Paid
            || (self.payment_method == PaymentMethod::Cod
                && self.order_status == OrderStatus::AwaitingConfirmation)
    }
}

/// Partial status update; `None` leaves the column untouched and timestamps
/// are only written when the column is still empty.
#[derive(Debug, Clone, Default)]
pub struct StatusChange {
    pub order_status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub payment_success_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub canceled_at: Option<DateTime<Utc>>,
}

impl StatusChange {
    #[cfg(test)]
    pub fn apply(&self, order: &mut Order) {
        if let Some(status) = self.order_status {
            order.order_status = status;
        }
        if let Some(status) = self.payment_status {
            order.payment_status = status;
        }
        order.payment_success_at = order.payment_success_at.or(self.payment_success_at);
        order.completed_at = order.completed_at.or(self.completed_at);
        order.canceled_at = order.canceled_at.or(self.canceled_at);
    }
}

/// Payment instructions written back onto an order after the payment branch ran.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PaymentDetails {
    pub payment_no: Option<String>,
    pub payment_name: Option<String>,
    pub payment_expired: Option<String>,
    pub payment_total: Option<Decimal>,
    pub trx_id: Option<String>,
}

impl PaymentDetails {
    #[cfg(test)]
    pub fn apply(&self, order: &mut Order) {
        order.payment_no = self.payment_no.clone();
        order.payment_name = self.payment_name.clone();
        order.payment_expired = self.payment_expired.clone();
        order.payment_total = self.payment_total;
        order.trx_id = self.trx_id.clone();
    }
}

// ==================== ORDER ITEM ====================
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub no_sku: String,
    pub product_name: String,
    pub picture_url: String,
    pub thumbnail: String,
    pub description: String,
    pub weight: Decimal,
    pub volume: Decimal,
    pub qty: i32,
    pub price: Decimal,
    pub total_price: Decimal,
    pub flag_promo: bool,
    pub created_at: DateTime<Utc>,
}

impl OrderItem {
    /// Freezes a cart line into an order line; later catalog edits do not touch it.
    pub fn snapshot(order_id: Uuid, line: &CartLine, now: DateTime<Utc>) -> Self {
        let price = line.unit_price();
        Self {
            id: Uuid::new_v4(),
            order_id,
            product_id: line.product_id,
            no_sku: line.no_sku.clone(),
            product_name: line.product_name.clone(),
            picture_url: line.picture_url.clone(),
            thumbnail: line.thumbnail.clone(),
            description: line.description.clone(),
            weight: line.weight,
            volume: line.volume,
            qty: line.qty,
            price,
            total_price: price * Decimal::from(line.qty),
            flag_promo: line.flag_promo,
            created_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures;

    #[test]
    fn payment_method_parses_known_values() {
        assert_eq!("VA".parse::<PaymentMethod>().unwrap(), PaymentMethod::Va);
        assert_eq!(" trf ".parse::<PaymentMethod>().unwrap(), PaymentMethod::Trf);
        assert!("card".parse::<PaymentMethod>().is_err());
        assert!(PaymentMethod::Qris.uses_gateway());
        assert!(!PaymentMethod::Cod.uses_gateway());
    }

    #[test]
    fn order_status_round_trips_through_column_value() {
        for status in [
            OrderStatus::AwaitingPayment,
            OrderStatus::AwaitingConfirmation,
            OrderStatus::Completed,
            OrderStatus::Canceled,
        ] {
            assert_eq!(OrderStatus::try_from(status.as_str().to_string()).unwrap(), status);
        }
        assert!(!OrderStatus::Completed.can_cancel());
        assert!(!OrderStatus::Canceled.can_complete());
    }

    #[test]
    fn only_collected_orders_can_complete() {
        // Memastikan order yang belum dibayar tidak bisa diselesaikan
        let mut order = fixtures::order();
        order.payment_method = PaymentMethod::Va;
        assert!(!order.can_complete());

        order.order_status = OrderStatus::AwaitingConfirmation;
        order.payment_status = PaymentStatus::Pending;
        assert!(!order.can_complete());

        order.payment_status = PaymentStatus::Paid;
        assert!(order.can_complete());

        let mut cod = fixtures::order();
        assert!(!cod.can_complete());
        cod.order_status = OrderStatus::AwaitingConfirmation;
        assert!(cod.can_complete());

        cod.order_status = OrderStatus::Completed;
        cod.payment_status = PaymentStatus::Paid;
        assert!(!cod.can_complete());
    }

    #[test]
    fn snapshot_uses_promo_price_when_flag_active() {
        // Harga promo dipakai hanya jika flag promo aktif
        let mut line = fixtures::cart_line(Decimal::new(15000, 0), 3);
        line.flag_promo = true;
        line.promo_price = Decimal::new(12000, 0);

        let item = OrderItem::snapshot(Uuid::new_v4(), &line, Utc::now());
        assert_eq!(item.price, Decimal::new(12000, 0));
        assert_eq!(item.total_price, Decimal::new(36000, 0));
        assert!(item.flag_promo);

        line.flag_promo = false;
        let item = OrderItem::snapshot(Uuid::new_v4(), &line, Utc::now());
        assert_eq!(item.total_price, Decimal::new(45000, 0));
    }

    #[test]
    fn status_change_never_overwrites_timestamps() {
        let first = Utc::now() - chrono::Duration::hours(1);
        let mut order = fixtures::order();
        order.payment_success_at = Some(first);

        StatusChange {
            order_status: Some(OrderStatus::AwaitingConfirmation),
            payment_success_at: Some(Utc::now()),
            ..Default::default()
        }
        .apply(&mut order);

        assert_eq!(order.payment_success_at, Some(first));
        assert_eq!(order.order_status, OrderStatus::AwaitingConfirmation);
    }
}
