use axum::{extract::State, http::HeaderMap, Json};

use super::{require_user, AppState};
use crate::{
    error::Result,
    models::{AddToCartRequest, ApiResponse, CartQtyRequest, CartResponse, UpdateCartQtyRequest},
};

/// GET /api/v1/cart
pub async fn get_cart(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<CartResponse>>> {
    let user_id = require_user(&headers, &state.config).await?;
    let cart = state.carts.get_cart(user_id).await?;
    Ok(Json(ApiResponse::success(cart)))
}

/// POST /api/v1/cart
pub async fn add_to_cart(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<AddToCartRequest>,
) -> Result<Json<ApiResponse<CartResponse>>> {
    let user_id = require_user(&headers, &state.config).await?;
    let cart = state.carts.add_to_cart(user_id, req).await?;
    Ok(Json(ApiResponse::success(cart)))
}

/// PUT /api/v1/cart/plus_qty
pub async fn plus_qty(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CartQtyRequest>,
) -> Result<Json<ApiResponse<CartResponse>>> {
    let user_id = require_user(&headers, &state.config).await?;
    let cart = state.carts.plus_qty(user_id, req).await?;
    Ok(Json(ApiResponse::success(cart)))
}

/// PUT /api/v1/cart/min_qty
pub async fn min_qty(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CartQtyRequest>,
) -> Result<Json<ApiResponse<CartResponse>>> {
    let user_id = require_user(&headers, &state.config).await?;
    let cart = state.carts.min_qty(user_id, req).await?;
    Ok(Json(ApiResponse::success(cart)))
}

/// PUT /api/v1/cart/update_qty
pub async fn update_qty(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<UpdateCartQtyRequest>,
) -> Result<Json<ApiResponse<CartResponse>>> {
    let user_id = require_user(&headers, &state.config).await?;
    let cart = state.carts.update_qty(user_id, req).await?;
    Ok(Json(ApiResponse::success(cart)))
}
