use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    error::Result,
    models::{
        BalancePoint, BalancePointTx, BankTransfer, BankVa, CartLine, Order, OrderItem,
        OrderStatus, PaymentDetails, PaymentLog, PointTxType, Product, ProductStockHistory,
        StatusChange, User,
    },
};

/// Pool-level reads plus the entry point into a transaction.
#[async_trait]
pub trait Repository: Send + Sync {
    /// Opens a transaction. Dropping the returned unit without `commit` rolls it back.
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>>;

    async fn find_user(&self, id: Uuid) -> Result<Option<User>>;
    async fn find_user_by_referral_code(&self, code: &str) -> Result<Option<User>>;

    async fn order_number_exists(&self, number_order: &str) -> Result<bool>;
    async fn find_order_by_id(&self, id: Uuid) -> Result<Option<Order>>;
    async fn find_orders_by_user(
        &self,
        user_id: Uuid,
        status: Option<OrderStatus>,
    ) -> Result<Vec<Order>>;
    async fn find_order_items(&self, order_id: Uuid) -> Result<Vec<OrderItem>>;

    async fn find_cart(&self, user_id: Uuid) -> Result<Vec<CartLine>>;
    async fn find_product(&self, product_id: Uuid) -> Result<Option<Product>>;

    async fn find_bank_transfer(&self, bank_code: &str) -> Result<Option<BankTransfer>>;
    async fn find_bank_va(&self, bank_code: &str) -> Result<Option<BankVa>>;

    async fn find_balance_point(&self, user_id: Uuid) -> Result<Option<BalancePoint>>;
    async fn find_point_ledger(&self, balance_point_id: Uuid) -> Result<Vec<BalancePointTx>>;
}

/// Transaction-scoped reads and writes. `lock_*` reads hold the row until the
/// unit commits or is dropped.
#[async_trait]
pub trait UnitOfWork: Send {
    async fn cart_lines(&mut self, user_id: Uuid) -> Result<Vec<CartLine>>;
    async fn clear_cart(&mut self, user_id: Uuid) -> Result<u64>;
    async fn upsert_cart_item(&mut self, user_id: Uuid, product_id: Uuid, qty: i32) -> Result<()>;
    async fn set_cart_qty(&mut self, user_id: Uuid, product_id: Uuid, qty: i32) -> Result<u64>;
    async fn remove_cart_item(&mut self, user_id: Uuid, product_id: Uuid) -> Result<u64>;

    async fn insert_order(&mut self, order: &Order) -> Result<()>;
    async fn insert_order_items(&mut self, items: &[OrderItem]) -> Result<()>;
    async fn order_items(&mut self, order_id: Uuid) -> Result<Vec<OrderItem>>;
    async fn lock_order_by_id(&mut self, id: Uuid) -> Result<Option<Order>>;
    async fn lock_order_by_number(&mut self, number_order: &str) -> Result<Option<Order>>;
    async fn update_order_status(&mut self, id: Uuid, change: &StatusChange) -> Result<Order>;
    async fn update_order_payment(&mut self, id: Uuid, details: &PaymentDetails) -> Result<Order>;

    async fn lock_balance_point(&mut self, user_id: Uuid) -> Result<Option<BalancePoint>>;
    async fn point_tx_exists(
        &mut self,
        balance_point_id: Uuid,
        no_order: &str,
        tx_type: PointTxType,
    ) -> Result<bool>;
    /// Appends the ledger row and moves the cached balance to its `new_point_balance`.
    async fn record_point_tx(&mut self, entry: &BalancePointTx) -> Result<()>;

    async fn lock_product(&mut self, product_id: Uuid) -> Result<Option<Product>>;
    /// Appends the stock history row and moves the product stock to `stock_final`.
    async fn record_stock_out(&mut self, entry: &ProductStockHistory) -> Result<()>;

    async fn insert_payment_log(&mut self, log: &PaymentLog) -> Result<()>;

    async fn commit(self: Box<Self>) -> Result<()>;
}
