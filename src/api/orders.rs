use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    Json,
};
use uuid::Uuid;

use super::{require_user, AppState};
use crate::{
    error::Result,
    models::{
        ApiResponse, CreateOrderRequest, FindOrdersQuery, Order, OrderDetailResponse,
        OrderResponse, PaymentCallbackRequest,
    },
};

/// POST /api/v1/order/create
pub async fn create_order(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateOrderRequest>,
) -> Result<Json<ApiResponse<OrderResponse>>> {
    let user_id = require_user(&headers, &state.config).await?;
    let response = state.orders.create_order(user_id, req).await?;
    Ok(Json(ApiResponse::success(response)))
}

/// POST /api/v1/order/update
///
/// Called by the payment gateway, so no bearer token.
pub async fn update_status_order(
    State(state): State<AppState>,
    Json(req): Json<PaymentCallbackRequest>,
) -> Result<Json<ApiResponse<OrderResponse>>> {
    let response = state.orders.update_status_order(req).await?;
    Ok(Json(ApiResponse::success(response)))
}

/// GET /api/v1/order?order_status=
pub async fn find_orders(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<FindOrdersQuery>,
) -> Result<Json<ApiResponse<Vec<Order>>>> {
    let user_id = require_user(&headers, &state.config).await?;
    let orders = state
        .orders
        .find_order_by_user(user_id, query.order_status.as_deref())
        .await?;
    Ok(Json(ApiResponse::success(orders)))
}

/// GET /api/v1/order/detail/{id}
pub async fn find_order_by_id(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<OrderDetailResponse>>> {
    let user_id = require_user(&headers, &state.config).await?;
    let detail = state.orders.find_order_by_id(user_id, id).await?;
    Ok(Json(ApiResponse::success(detail)))
}

/// PUT /api/v1/order/cancel/{id}
pub async fn cancel_order(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<OrderResponse>>> {
    let user_id = require_user(&headers, &state.config).await?;
    let response = state.orders.cancel_order_by_id(user_id, id).await?;
    Ok(Json(ApiResponse::success(response)))
}

/// PUT /api/v1/order/complete/{id}
pub async fn complete_order(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<OrderResponse>>> {
    let user_id = require_user(&headers, &state.config).await?;
    let response = state.orders.complete_order_by_id(user_id, id).await?;
    Ok(Json(ApiResponse::success(response)))
}

/// GET /api/v1/order/check-payment/{id}
pub async fn check_payment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<OrderResponse>>> {
    let user_id = require_user(&headers, &state.config).await?;
    let response = state.orders.order_check_payment(user_id, id).await?;
    Ok(Json(ApiResponse::success(response)))
}
