use axum::{
    extract::{Query, State},
    http::HeaderMap,
    Json,
};

use super::{require_user, AppState};
use crate::{
    error::Result,
    models::{
        ApiResponse, BalancePointResponse, PointAmountQuery, PointCheckAmountResponse,
        PointHistoryResponse, PointOrderTxQuery, PointOrderTxResponse,
    },
};

/// GET /api/v1/balance_point
pub async fn get_balance(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<BalancePointResponse>>> {
    let user_id = require_user(&headers, &state.config).await?;
    let balance = state.points.get_balance(user_id).await?;
    Ok(Json(ApiResponse::success(balance)))
}

/// GET /api/v1/balance_point_tx
pub async fn get_history(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<PointHistoryResponse>>> {
    let user_id = require_user(&headers, &state.config).await?;
    let history = state.points.get_history(user_id).await?;
    Ok(Json(ApiResponse::success(history)))
}

/// GET /api/v1/balance_point/check/amount?amount=
pub async fn check_amount(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<PointAmountQuery>,
) -> Result<Json<ApiResponse<PointCheckAmountResponse>>> {
    let user_id = require_user(&headers, &state.config).await?;
    let check = state.points.check_amount(user_id, query.amount).await?;
    Ok(Json(ApiResponse::success(check)))
}

/// GET /api/v1/balance_point/check/order_tx?number_order=
pub async fn check_order_tx(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<PointOrderTxQuery>,
) -> Result<Json<ApiResponse<PointOrderTxResponse>>> {
    let user_id = require_user(&headers, &state.config).await?;
    let check = state
        .points
        .check_order_tx(user_id, &query.number_order)
        .await?;
    Ok(Json(ApiResponse::success(check)))
}
