use axum::http::HeaderValue;
use axum::{
    routing::{get, post, put},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod config;
mod constants;
mod db;
mod error;
mod models;
mod services;

use config::Config;
use constants::API_VERSION;
use db::{Database, Repository};
use services::{
    CartService, HttpPaymentGateway, OrderService, PointService, ReferenceGenerator,
    TelegramNotifier,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bunda_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    config.validate()?;

    tracing::info!("Starting Bunda Backend Server");
    tracing::info!("Environment: {}", config.environment);
    tracing::info!("API Version: {}", API_VERSION);

    // Initialize database
    let db = Database::new(&config).await?;

    // Run migrations
    tracing::info!("Running database migrations...");
    db.run_migrations().await?;

    // Wire services
    let repo: Arc<dyn Repository> = Arc::new(db.clone());
    let gateway = Arc::new(HttpPaymentGateway::new(&config)?);
    let notifier = Arc::new(TelegramNotifier::new(&config)?);
    let refs = Arc::new(ReferenceGenerator::from_os_rng());

    let app_state = api::AppState {
        db: db.clone(),
        config: config.clone(),
        orders: Arc::new(OrderService::new(
            repo.clone(),
            gateway,
            notifier,
            refs,
            &config,
        )),
        carts: Arc::new(CartService::new(repo.clone())),
        points: Arc::new(PointService::new(repo)),
    };

    // Build router
    let app = build_router(app_state);

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn build_router(state: api::AppState) -> Router {
    // CORS configuration
    let cors = cors_from_config(&state.config);

    Router::new()
        // Health check
        .route("/health", get(api::health::health_check))
        // Orders
        .route("/api/v1/order", get(api::orders::find_orders))
        .route("/api/v1/order/create", post(api::orders::create_order))
        .route("/api/v1/order/update", post(api::orders::update_status_order))
        .route(
            "/api/v1/order/detail/{id}",
            get(api::orders::find_order_by_id),
        )
        .route("/api/v1/order/cancel/{id}", put(api::orders::cancel_order))
        .route(
            "/api/v1/order/complete/{id}",
            put(api::orders::complete_order),
        )
        .route(
            "/api/v1/order/check-payment/{id}",
            get(api::orders::check_payment),
        )
        // Cart
        .route(
            "/api/v1/cart",
            get(api::cart::get_cart).post(api::cart::add_to_cart),
        )
        .route("/api/v1/cart/plus_qty", put(api::cart::plus_qty))
        .route("/api/v1/cart/min_qty", put(api::cart::min_qty))
        .route("/api/v1/cart/update_qty", put(api::cart::update_qty))
        // Points
        .route("/api/v1/balance_point", get(api::points::get_balance))
        .route(
            "/api/v1/balance_point/check/amount",
            get(api::points::check_amount),
        )
        .route(
            "/api/v1/balance_point/check/order_tx",
            get(api::points::check_order_tx),
        )
        .route("/api/v1/balance_point_tx", get(api::points::get_history))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn cors_from_config(config: &Config) -> CorsLayer {
    let raw = config.cors_allowed_origins.trim();
    if raw.is_empty() || raw == "*" {
        return CorsLayer::very_permissive();
    }

    let allowed: Vec<HeaderValue> = raw
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse::<HeaderValue>().ok())
        .collect();

    if allowed.is_empty() {
        tracing::warn!("No valid CORS origins parsed; falling back to permissive");
        return CorsLayer::very_permissive();
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(Any)
        .allow_headers(Any)
}
