use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::order::PaymentMethod;
use crate::error::{AppError, Result};

fn non_negative(value: &Decimal) -> std::result::Result<(), ValidationError> {
    if *value < Decimal::ZERO {
        return Err(ValidationError::new("non_negative"));
    }
    Ok(())
}

// ==================== ORDER ====================
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateOrderRequest {
    #[validate(required)]
    pub total_bill: Option<Decimal>,
    #[validate(required, length(min = 1))]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub payment_channel: String,
    #[serde(default)]
    #[validate(custom(function = "non_negative"))]
    pub payment_by_point: Decimal,
    #[serde(default)]
    #[validate(custom(function = "non_negative"))]
    pub payment_by_cash: Decimal,
    #[validate(required, length(min = 1))]
    pub address: Option<String>,
    #[serde(default)]
    pub courier_note: String,
    #[validate(required)]
    pub shipping_cost: Option<Decimal>,
}

/// A create-order request that passed validation.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub total_bill: Decimal,
    pub payment_method: PaymentMethod,
    pub payment_channel: String,
    pub payment_by_point: Decimal,
    pub payment_by_cash: Decimal,
    pub address: String,
    pub courier_note: String,
    pub shipping_cost: Decimal,
}

impl CreateOrderRequest {
    pub fn into_new_order(self) -> Result<NewOrder> {
        self.validate()?;

        let payment_method = self
            .payment_method
            .as_deref()
            .unwrap_or_default()
            .parse::<PaymentMethod>()
            .map_err(|_| AppError::BadRequest("payment method not found".to_string()))?;

        if payment_method == PaymentMethod::Point
            && (self.payment_by_point <= Decimal::ZERO || !self.payment_by_cash.is_zero())
        {
            return Err(AppError::BadRequest(
                "point payment must be fully funded by points".to_string(),
            ));
        }

        Ok(NewOrder {
            total_bill: self.total_bill.unwrap_or_default(),
            payment_method,
            payment_channel: self.payment_channel.trim().to_string(),
            payment_by_point: self.payment_by_point,
            payment_by_cash: self.payment_by_cash,
            address: self.address.unwrap_or_default(),
            courier_note: self.courier_note,
            shipping_cost: self.shipping_cost.unwrap_or_default(),
        })
    }
}

/// Asynchronous notification posted by the payment gateway.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PaymentCallbackRequest {
    #[validate(required, length(min = 1))]
    pub reference_id: Option<String>,
    #[validate(required, length(min = 1))]
    pub status_code: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub trx_id: Option<serde_json::Value>,
    #[serde(default)]
    pub sid: Option<String>,
}

impl PaymentCallbackRequest {
    pub fn reference_id(&self) -> &str {
        self.reference_id.as_deref().unwrap_or_default()
    }

    pub fn status_code(&self) -> &str {
        self.status_code.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
pub struct FindOrdersQuery {
    pub order_status: Option<String>,
}

// ==================== CART ====================
#[derive(Debug, Deserialize, Validate)]
pub struct AddToCartRequest {
    pub product_id: Uuid,
    #[validate(range(min = 1))]
    pub qty: i32,
}

/// Identifies the cart line to step up or down by one.
#[derive(Debug, Deserialize)]
pub struct CartQtyRequest {
    pub product_id: Uuid,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCartQtyRequest {
    pub product_id: Uuid,
    #[validate(range(min = 1))]
    pub qty: i32,
}

// ==================== POINTS ====================
#[derive(Debug, Deserialize)]
pub struct PointAmountQuery {
    pub amount: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct PointOrderTxQuery {
    pub number_order: String,
}
