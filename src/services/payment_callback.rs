use chrono::Utc;
use validator::Validate;

use super::{ledger, order_service::OrderService};
use crate::{
    constants::{CALLBACK_SUCCESS_CODE, POINT_DESC_ORDER_PAYMENT, STOCK_DESC_ORDER_PAID},
    error::{AppError, Result},
    models::*,
};

impl OrderService {
    /// POST /api/v1/order/update
    ///
    /// Gateway callback. Safe to deliver more than once: a paid order is
    /// returned as-is without touching stock or points.
    pub async fn update_status_order(
        &self,
        callback: PaymentCallbackRequest,
    ) -> Result<OrderResponse> {
        callback.validate()?;
        let reference_id = callback.reference_id().to_string();

        let mut uow = self.repo.begin().await?;
        let order = uow
            .lock_order_by_number(&reference_id)
            .await?
            .ok_or_else(|| AppError::NotFound("order not found".to_string()))?;

        if order.payment_status == PaymentStatus::Paid {
            tracing::info!("Callback for {} ignored, order already paid", reference_id);
            return Ok(OrderResponse::plain(order));
        }
        if matches!(
            order.order_status,
            OrderStatus::Canceled | OrderStatus::Completed
        ) {
            return Err(AppError::BadRequest(format!(
                "order is {} and cannot take payment",
                order.order_status.as_str()
            )));
        }

        let now = Utc::now();
        let paid = callback.status_code() == CALLBACK_SUCCESS_CODE;
        let change = StatusChange {
            order_status: Some(OrderStatus::AwaitingConfirmation),
            payment_status: Some(if paid {
                PaymentStatus::Paid
            } else {
                PaymentStatus::Pending
            }),
            payment_success_at: paid.then_some(now),
            ..Default::default()
        };
        let updated = uow.update_order_status(order.id, &change).await?;

        // Stock leaves once, on the first callback for the order.
        if order.payment_status == PaymentStatus::Unpaid {
            for item in uow.order_items(order.id).await? {
                let product = uow.lock_product(item.product_id).await?.ok_or_else(|| {
                    AppError::NotFound(format!("product {} not found", item.product_id))
                })?;
                let entry = ledger::stock_out(
                    &product,
                    item.qty,
                    &order.number_order,
                    STOCK_DESC_ORDER_PAID,
                    now,
                );
                if entry.stock_final < 0 {
                    tracing::warn!(
                        "Stock of {} goes negative ({}) for {}",
                        product.no_sku,
                        entry.stock_final,
                        order.number_order
                    );
                }
                uow.record_stock_out(&entry).await?;
            }
        }

        if ledger::charge_points_once(
            uow.as_mut(),
            order.user_id,
            order.payment_by_point,
            &order.number_order,
            POINT_DESC_ORDER_PAYMENT,
            now,
        )
        .await?
        {
            tracing::info!("Point consumption recorded on callback for {}", reference_id);
        }

        let raw = serde_json::to_string(&callback)
            .map_err(|e| AppError::Internal(format!("Callback encode failed: {}", e)))?;
        uow.insert_payment_log(&PaymentLog::for_order(&order, PaymentLogType::Callback, raw))
            .await?;

        uow.commit().await?;

        tracing::info!(
            "Payment callback applied: {} -> {}",
            reference_id,
            updated.payment_status.as_str()
        );
        Ok(OrderResponse::plain(updated))
    }
}
