// src/api/mod.rs

pub mod auth;
pub mod cart;
pub mod health;
pub mod orders;
pub mod points;

use axum::http::{header::AUTHORIZATION, HeaderMap};
use std::sync::Arc;
use uuid::Uuid;

use crate::config::Config;
use crate::db::Database;
use crate::error::{AppError, Result};
use crate::services::{CartService, OrderService, PointService};

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Config,
    pub orders: Arc<OrderService>,
    pub carts: Arc<CartService>,
    pub points: Arc<PointService>,
}

/// Resolves the bearer token to the caller's user id.
pub async fn require_user(headers: &HeaderMap, config: &Config) -> Result<Uuid> {
    let auth_header = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| AppError::AuthError("Missing Authorization header".to_string()))?;
    let auth_str = auth_header
        .to_str()
        .map_err(|_| AppError::AuthError("Invalid Authorization header".to_string()))?;
    let token = auth_str
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::AuthError("Invalid Authorization scheme".to_string()))?;

    auth::extract_user_from_token(token, &config.jwt_secret).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use axum::http::HeaderValue;

    #[tokio::test]
    async fn require_user_reads_bearer_token() {
        let config = test_config();
        let user_id = Uuid::new_v4();
        let token = auth::issue_test_token(&user_id.to_string(), &config.jwt_secret, 600);

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        );

        assert_eq!(require_user(&headers, &config).await.unwrap(), user_id);
    }

    #[tokio::test]
    async fn require_user_rejects_missing_or_wrong_scheme() {
        let config = test_config();
        let empty = HeaderMap::new();
        assert!(matches!(
            require_user(&empty, &config).await,
            Err(AppError::AuthError(_))
        ));

        let mut basic = HeaderMap::new();
        basic.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert!(matches!(
            require_user(&basic, &config).await,
            Err(AppError::AuthError(msg)) if msg == "Invalid Authorization scheme"
        ));
    }
}
