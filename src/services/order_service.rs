use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

use super::{
    ledger,
    notification_service::{notify_best_effort, order_message, Notifier},
    payment_gateway::{GatewayPaymentRequest, PaymentGateway},
    reference::ReferenceGenerator,
};
use crate::{
    config::Config,
    constants::POINT_DESC_ORDER_PAYMENT,
    db::Repository,
    error::{AppError, Result},
    models::*,
};

/// Lookups a payment branch needs, resolved before the transaction opens.
enum PaymentTarget {
    Gateway(Option<BankVa>),
    Transfer(BankTransfer),
    Direct,
}

pub struct OrderService {
    pub(super) repo: Arc<dyn Repository>,
    gateway: Arc<dyn PaymentGateway>,
    pub(super) notifier: Arc<dyn Notifier>,
    refs: Arc<ReferenceGenerator>,
    callback_url: String,
}

impl OrderService {
    pub fn new(
        repo: Arc<dyn Repository>,
        gateway: Arc<dyn PaymentGateway>,
        notifier: Arc<dyn Notifier>,
        refs: Arc<ReferenceGenerator>,
        config: &Config,
    ) -> Self {
        Self {
            repo,
            gateway,
            notifier,
            refs,
            callback_url: config.payment_callback_url.clone(),
        }
    }

    /// Draws order numbers until one is unused.
    async fn generate_number_order(&self) -> Result<String> {
        loop {
            let candidate = self.refs.order_number(Utc::now().date_naive());
            if !self.repo.order_number_exists(&candidate).await? {
                return Ok(candidate);
            }
            tracing::debug!("Order number {} already taken, drawing again", candidate);
        }
    }

    async fn resolve_payment_target(
        &self,
        method: PaymentMethod,
        channel: &str,
    ) -> Result<PaymentTarget> {
        match method {
            m if m.uses_gateway() => {
                Ok(PaymentTarget::Gateway(self.repo.find_bank_va(channel).await?))
            }
            PaymentMethod::Trf => self
                .repo
                .find_bank_transfer(channel)
                .await?
                .map(PaymentTarget::Transfer)
                .ok_or_else(|| AppError::NotFound("bank not found".to_string())),
            _ => Ok(PaymentTarget::Direct),
        }
    }

    /// POST /api/v1/order/create
    ///
    /// Everything from the order insert to the payment branch runs in one unit
    /// of work; any error drops it and nothing is persisted. The notification
    /// goes out only after commit.
    pub async fn create_order(
        &self,
        user_id: Uuid,
        request: CreateOrderRequest,
    ) -> Result<OrderResponse> {
        let new_order = request.into_new_order()?;
        let user = self
            .repo
            .find_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("user not found".to_string()))?;
        let target = self
            .resolve_payment_target(new_order.payment_method, &new_order.payment_channel)
            .await?;
        let number_order = self.generate_number_order().await?;
        let now = Utc::now();

        let order = Order {
            id: Uuid::new_v4(),
            user_id,
            number_order: number_order.clone(),
            full_name: user.full_name,
            email: user.email,
            phone: user.phone,
            address: new_order.address,
            courier_note: new_order.courier_note,
            total_bill: new_order.total_bill,
            shipping_cost: new_order.shipping_cost,
            payment_by_cash: new_order.payment_by_cash,
            payment_by_point: new_order.payment_by_point,
            order_status: OrderStatus::AwaitingPayment,
            payment_status: PaymentStatus::Unpaid,
            shipping_status: ShippingStatus::Waiting,
            payment_method: new_order.payment_method,
            payment_channel: new_order.payment_channel,
            payment_no: None,
            payment_name: None,
            payment_expired: None,
            payment_total: None,
            trx_id: None,
            ordered_at: now,
            payment_success_at: None,
            completed_at: None,
            canceled_at: None,
        };

        let mut uow = self.repo.begin().await?;

        let lines = uow.cart_lines(user_id).await?;
        if lines.is_empty() {
            return Err(AppError::NotFound("cart is empty".to_string()));
        }

        uow.insert_order(&order).await?;

        if order.payment_by_point > Decimal::ZERO {
            ledger::apply_points(
                uow.as_mut(),
                user_id,
                PointTxType::Credit,
                order.payment_by_point,
                &number_order,
                POINT_DESC_ORDER_PAYMENT,
                now,
            )
            .await?;
        }

        let items: Vec<OrderItem> = lines
            .iter()
            .map(|line| OrderItem::snapshot(order.id, line, now))
            .collect();
        uow.insert_order_items(&items).await?;
        uow.clear_cart(user_id).await?;

        let response = match (order.payment_method, target) {
            (_, PaymentTarget::Gateway(bank)) => {
                let request = GatewayPaymentRequest::for_order(&order, &self.callback_url);
                // Runs while the unit of work holds the balance and order locks.
                tracing::debug!(
                    "Requesting gateway payment for {} ({} {})",
                    number_order,
                    request.payment_method,
                    request.payment_channel
                );
                let charge = self.gateway.create_payment(&request).await?;
                let data = charge.data();
                tracing::debug!(
                    "Gateway accepted {}: session {}, ref {}, via {}/{}, fee {}",
                    number_order,
                    data.session_id,
                    data.reference_id,
                    data.via,
                    data.channel,
                    data.fee
                );

                uow.insert_payment_log(&PaymentLog::for_order(
                    &order,
                    PaymentLogType::CreateTransaction,
                    charge.raw.to_string(),
                ))
                .await?;
                let updated = uow
                    .update_order_payment(order.id, &charge.payment_details())
                    .await?;
                uow.commit().await?;

                OrderResponse {
                    payment: Some(PaymentInstruction::virtual_account(
                        &updated,
                        bank.as_ref(),
                        Some(charge.raw),
                    )),
                    order: updated,
                }
            }
            (_, PaymentTarget::Transfer(bank)) => {
                let details = PaymentDetails {
                    payment_no: Some(bank.no_account.clone()),
                    payment_name: Some(bank.bank_name.clone()),
                    payment_expired: None,
                    payment_total: Some(self.refs.transfer_total(order.payment_by_cash)),
                    trx_id: None,
                };
                let updated = uow.update_order_payment(order.id, &details).await?;
                uow.commit().await?;

                OrderResponse {
                    payment: Some(PaymentInstruction::transfer(&updated, &bank)),
                    order: updated,
                }
            }
            (PaymentMethod::Point, PaymentTarget::Direct) => {
                let change = StatusChange {
                    order_status: Some(OrderStatus::AwaitingConfirmation),
                    payment_status: Some(PaymentStatus::Paid),
                    payment_success_at: Some(now),
                    ..Default::default()
                };
                let updated = uow.update_order_status(order.id, &change).await?;
                uow.commit().await?;

                OrderResponse {
                    order: updated,
                    payment: Some(PaymentInstruction::Point),
                }
            }
            (_, PaymentTarget::Direct) => {
                let change = StatusChange {
                    order_status: Some(OrderStatus::AwaitingConfirmation),
                    ..Default::default()
                };
                let updated = uow.update_order_status(order.id, &change).await?;
                uow.commit().await?;

                OrderResponse {
                    order: updated,
                    payment: Some(PaymentInstruction::CashOnDelivery),
                }
            }
        };

        tracing::info!(
            "Order created: {} ({}, {} items)",
            number_order,
            order.payment_method,
            items.len()
        );
        notify_best_effort(
            self.notifier.as_ref(),
            &order_message(order.payment_method, &number_order),
        )
        .await;

        Ok(response)
    }

    /// GET /api/v1/order
    pub async fn find_order_by_user(
        &self,
        user_id: Uuid,
        order_status: Option<&str>,
    ) -> Result<Vec<Order>> {
        let status = match order_status.map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => Some(
                raw.parse::<OrderStatus>()
                    .map_err(|e| AppError::BadRequest(e.to_string()))?,
            ),
            None => None,
        };
        self.repo.find_orders_by_user(user_id, status).await
    }

    /// Orders belonging to someone else are reported as missing.
    pub(super) async fn owned_order(&self, user_id: Uuid, id: Uuid) -> Result<Order> {
        self.repo
            .find_order_by_id(id)
            .await?
            .filter(|order| order.user_id == user_id)
            .ok_or_else(|| AppError::NotFound("order not found".to_string()))
    }

    /// GET /api/v1/order/detail/{id}
    pub async fn find_order_by_id(&self, user_id: Uuid, id: Uuid) -> Result<OrderDetailResponse> {
        let order = self.owned_order(user_id, id).await?;
        let items = self.repo.find_order_items(order.id).await?;
        Ok(OrderDetailResponse { order, items })
    }

    /// GET /api/v1/order/check-payment/{id}
    pub async fn order_check_payment(&self, user_id: Uuid, id: Uuid) -> Result<OrderResponse> {
        let order = self.owned_order(user_id, id).await?;

        let payment = match order.payment_method {
            PaymentMethod::Va | PaymentMethod::Qris => {
                let bank = self.repo.find_bank_va(&order.payment_channel).await?;
                PaymentInstruction::virtual_account(&order, bank.as_ref(), None)
            }
            PaymentMethod::Trf => {
                let bank = self
                    .repo
                    .find_bank_transfer(&order.payment_channel)
                    .await?
                    .ok_or_else(|| AppError::NotFound("bank not found".to_string()))?;
                PaymentInstruction::transfer(&order, &bank)
            }
            PaymentMethod::Cod => PaymentInstruction::CashOnDelivery,
            PaymentMethod::Point => PaymentInstruction::Point,
        };

        Ok(OrderResponse {
            order,
            payment: Some(payment),
        })
    }
}
