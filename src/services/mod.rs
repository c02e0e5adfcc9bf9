// All service modules
pub mod cart_service;
pub mod ledger;
pub mod notification_service;
pub mod order_lifecycle;
pub mod order_service;
pub mod payment_callback;
pub mod payment_gateway;
pub mod point_service;
pub mod reference;

// Re-export for convenience
pub use cart_service::CartService;
pub use notification_service::TelegramNotifier;
pub use order_service::OrderService;
pub use payment_gateway::HttpPaymentGateway;
pub use point_service::PointService;
pub use reference::ReferenceGenerator;
