// src/models/mod.rs
pub mod ledger;
pub mod order;
pub mod payment;
pub mod request;
pub mod response;
pub mod user;

pub use ledger::{BalancePoint, BalancePointTx, PointTxType, Product, ProductStockHistory};
pub use order::{
    Order, OrderItem, OrderStatus, PaymentDetails, PaymentMethod, PaymentStatus, ShippingStatus,
    StatusChange,
};
pub use payment::{BankTransfer, BankVa, PaymentLog, PaymentLogType};
pub use request::{
    AddToCartRequest, CartQtyRequest, CreateOrderRequest, FindOrdersQuery,
    PaymentCallbackRequest, PointAmountQuery, PointOrderTxQuery, UpdateCartQtyRequest,
};
pub use response::{
    BalancePointResponse, CartResponse, OrderDetailResponse, OrderResponse, PaymentInstruction,
    PointCheckAmountResponse, PointHistoryResponse, PointOrderTxResponse,
};
pub use user::{CartLine, User};

use serde::Serialize;

// ==================== API RESPONSE ====================
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}
