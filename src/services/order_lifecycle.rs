use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::{ledger, order_service::OrderService};
use crate::{
    constants::{POINT_DESC_PURCHASE_BONUS, POINT_DESC_REFERRAL_BONUS, POINT_DESC_REFUND},
    error::{AppError, Result},
    models::*,
};

impl OrderService {
    /// PUT /api/v1/order/cancel/{id}
    pub async fn cancel_order_by_id(&self, user_id: Uuid, id: Uuid) -> Result<OrderResponse> {
        let mut uow = self.repo.begin().await?;
        let order = uow
            .lock_order_by_id(id)
            .await?
            .filter(|order| order.user_id == user_id)
            .ok_or_else(|| AppError::NotFound("order not found".to_string()))?;

        if !order.order_status.can_cancel() {
            return Err(AppError::BadRequest(format!(
                "order is {} and cannot be canceled",
                order.order_status.as_str()
            )));
        }

        let now = Utc::now();
        if order.payment_by_point > Decimal::ZERO {
            let balance = uow
                .lock_balance_point(order.user_id)
                .await?
                .ok_or_else(|| AppError::NotFound("balance point not found".to_string()))?;
            // Refund only what the ledger shows was spent.
            if uow
                .point_tx_exists(balance.id, &order.number_order, PointTxType::Credit)
                .await?
            {
                ledger::apply_points(
                    uow.as_mut(),
                    order.user_id,
                    PointTxType::Debit,
                    order.payment_by_point,
                    &order.number_order,
                    POINT_DESC_REFUND,
                    now,
                )
                .await?;
            }
        }

        let change = StatusChange {
            order_status: Some(OrderStatus::Canceled),
            canceled_at: Some(now),
            ..Default::default()
        };
        let updated = uow.update_order_status(order.id, &change).await?;
        uow.commit().await?;

        tracing::info!(
            "Order canceled: {} (refunded {} points)",
            updated.number_order,
            updated.payment_by_point
        );
        Ok(OrderResponse::plain(updated))
    }

    /// PUT /api/v1/order/complete/{id}
    ///
    /// Awards `payment_by_cash * bonus_percentage / 100` to the buyer and the
    /// same amount to whoever referred them.
    pub async fn complete_order_by_id(&self, user_id: Uuid, id: Uuid) -> Result<OrderResponse> {
        let buyer = self
            .repo
            .find_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("user not found".to_string()))?;
        let referrer = match buyer.referred_by() {
            Some(code) => {
                let referrer = self.repo.find_user_by_referral_code(code).await?;
                if referrer.is_none() {
                    tracing::warn!("Referral code {} of {} has no owner", code, buyer.username);
                }
                referrer
            }
            None => None,
        };

        let mut uow = self.repo.begin().await?;
        let order = uow
            .lock_order_by_id(id)
            .await?
            .filter(|order| order.user_id == user_id)
            .ok_or_else(|| AppError::NotFound("order not found".to_string()))?;

        if !order.order_status.can_complete() {
            return Err(AppError::BadRequest(format!(
                "order is {} and cannot be completed",
                order.order_status.as_str()
            )));
        }
        if !order.can_complete() {
            return Err(AppError::BadRequest("order has not been paid".to_string()));
        }

        let now = Utc::now();
        let change = StatusChange {
            order_status: Some(OrderStatus::Completed),
            completed_at: Some(now),
            ..Default::default()
        };
        let updated = uow.update_order_status(order.id, &change).await?;

        let bonus = purchase_bonus(order.payment_by_cash, buyer.bonus_percentage);
        ledger::apply_points(
            uow.as_mut(),
            buyer.id,
            PointTxType::Debit,
            bonus,
            &order.number_order,
            POINT_DESC_PURCHASE_BONUS,
            now,
        )
        .await?;

        if let Some(referrer) = referrer.filter(|_| !bonus.is_zero()) {
            if uow.lock_balance_point(referrer.id).await?.is_some() {
                ledger::apply_points(
                    uow.as_mut(),
                    referrer.id,
                    PointTxType::Referral,
                    bonus,
                    &order.number_order,
                    POINT_DESC_REFERRAL_BONUS,
                    now,
                )
                .await?;
            } else {
                tracing::warn!("Referrer {} has no point balance", referrer.username);
            }
        }

        uow.commit().await?;

        tracing::info!("Order completed: {} (bonus {})", updated.number_order, bonus);
        Ok(OrderResponse::plain(updated))
    }
}

/// Bonus points for the cash part of an order, rounded to cents.
pub fn purchase_bonus(payment_by_cash: Decimal, bonus_percentage: Decimal) -> Decimal {
    (payment_by_cash * bonus_percentage / Decimal::ONE_HUNDRED).round_dp(2)
}
