//! In-memory `Repository` used by service tests. A unit of work stages a copy
//! of the whole state and swaps it in on commit, so dropping it is a rollback.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use super::repository::{Repository, UnitOfWork};
use crate::{
    error::{AppError, Result},
    models::*,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailPoint {
    InsertOrderItems,
    InsertPaymentLog,
    UpdateOrderPayment,
    RecordStockOut,
    RecordPointTx,
    Commit,
}

#[derive(Debug, Clone, Default)]
pub struct State {
    pub users: Vec<User>,
    pub products: Vec<Product>,
    pub cart: Vec<CartLine>,
    pub orders: Vec<Order>,
    pub order_items: Vec<OrderItem>,
    pub balances: Vec<BalancePoint>,
    pub point_txs: Vec<BalancePointTx>,
    pub stock_history: Vec<ProductStockHistory>,
    pub payment_logs: Vec<PaymentLog>,
    pub bank_transfers: Vec<BankTransfer>,
    pub bank_vas: Vec<BankVa>,
}

impl State {
    pub fn add_balance(&mut self, user_id: Uuid, amount: Decimal) -> BalancePoint {
        let balance = BalancePoint {
            id: Uuid::new_v4(),
            user_id,
            balance_points: amount,
            updated_at: Utc::now(),
        };
        self.balances.push(balance.clone());
        balance
    }

    /// Puts `qty` of `product` into the user's cart.
    pub fn add_to_cart(&mut self, user_id: Uuid, product: &Product, qty: i32) {
        self.cart.push(cart_line_for(user_id, product, qty));
    }

    pub fn balance_of(&self, user_id: Uuid) -> Option<Decimal> {
        self.balances
            .iter()
            .find(|b| b.user_id == user_id)
            .map(|b| b.balance_points)
    }

    pub fn stock_of(&self, product_id: Uuid) -> Option<i32> {
        self.products
            .iter()
            .find(|p| p.id == product_id)
            .map(|p| p.stock)
    }

    pub fn point_txs_for(&self, no_order: &str) -> Vec<&BalancePointTx> {
        self.point_txs
            .iter()
            .filter(|tx| tx.no_order == no_order)
            .collect()
    }
}

fn cart_line_for(user_id: Uuid, product: &Product, qty: i32) -> CartLine {
    CartLine {
        id: Uuid::new_v4(),
        user_id,
        product_id: product.id,
        qty,
        no_sku: product.no_sku.clone(),
        product_name: product.product_name.clone(),
        picture_url: String::new(),
        thumbnail: String::new(),
        description: String::new(),
        weight: Decimal::ZERO,
        volume: Decimal::ZERO,
        price: product.price,
        stock: product.stock,
        flag_promo: false,
        promo_price: Decimal::ZERO,
    }
}

fn injected(point: FailPoint) -> AppError {
    AppError::Database(sqlx::Error::Protocol(format!("injected failure at {:?}", point)))
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
    fail_points: Arc<std::sync::Mutex<HashSet<FailPoint>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn seed<F: FnOnce(&mut State)>(&self, f: F) {
        let mut state = self.state.lock().await;
        f(&mut state);
    }

    pub async fn snapshot(&self) -> State {
        self.state.lock().await.clone()
    }

    pub fn fail_on(&self, point: FailPoint) {
        self.fail_points
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(point);
    }
}

#[async_trait]
impl Repository for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>> {
        let guard = self.state.clone().lock_owned().await;
        let staged = guard.clone();
        let fail_points = self
            .fail_points
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        Ok(Box::new(MemoryUnitOfWork {
            guard,
            staged,
            fail_points,
        }))
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>> {
        let state = self.state.lock().await;
        Ok(state.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_referral_code(&self, code: &str) -> Result<Option<User>> {
        let state = self.state.lock().await;
        Ok(state.users.iter().find(|u| u.referral_code == code).cloned())
    }

    async fn order_number_exists(&self, number_order: &str) -> Result<bool> {
        let state = self.state.lock().await;
        Ok(state.orders.iter().any(|o| o.number_order == number_order))
    }

    async fn find_order_by_id(&self, id: Uuid) -> Result<Option<Order>> {
        let state = self.state.lock().await;
        Ok(state.orders.iter().find(|o| o.id == id).cloned())
    }

    async fn find_orders_by_user(
        &self,
        user_id: Uuid,
        status: Option<OrderStatus>,
    ) -> Result<Vec<Order>> {
        let state = self.state.lock().await;
        let mut orders: Vec<Order> = state
            .orders
            .iter()
            .filter(|o| o.user_id == user_id)
            .filter(|o| status.map_or(true, |s| o.order_status == s))
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.ordered_at.cmp(&a.ordered_at));
        Ok(orders)
    }

    async fn find_order_items(&self, order_id: Uuid) -> Result<Vec<OrderItem>> {
        let state = self.state.lock().await;
        Ok(state
            .order_items
            .iter()
            .filter(|i| i.order_id == order_id)
            .cloned()
            .collect())
    }

    async fn find_cart(&self, user_id: Uuid) -> Result<Vec<CartLine>> {
        let state = self.state.lock().await;
        Ok(state
            .cart
            .iter()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn find_product(&self, product_id: Uuid) -> Result<Option<Product>> {
        let state = self.state.lock().await;
        Ok(state.products.iter().find(|p| p.id == product_id).cloned())
    }

    async fn find_bank_transfer(&self, bank_code: &str) -> Result<Option<BankTransfer>> {
        let state = self.state.lock().await;
        Ok(state
            .bank_transfers
            .iter()
            .find(|b| b.bank_code == bank_code)
            .cloned())
    }

    async fn find_bank_va(&self, bank_code: &str) -> Result<Option<BankVa>> {
        let state = self.state.lock().await;
        Ok(state.bank_vas.iter().find(|b| b.bank_code == bank_code).cloned())
    }

    async fn find_balance_point(&self, user_id: Uuid) -> Result<Option<BalancePoint>> {
        let state = self.state.lock().await;
        Ok(state.balances.iter().find(|b| b.user_id == user_id).cloned())
    }

    async fn find_point_ledger(&self, balance_point_id: Uuid) -> Result<Vec<BalancePointTx>> {
        let state = self.state.lock().await;
        Ok(state
            .point_txs
            .iter()
            .filter(|tx| tx.balance_point_id == balance_point_id)
            .cloned()
            .collect())
    }
}

pub struct MemoryUnitOfWork {
    guard: OwnedMutexGuard<State>,
    staged: State,
    fail_points: HashSet<FailPoint>,
}

impl MemoryUnitOfWork {
    fn check(&self, point: FailPoint) -> Result<()> {
        if self.fail_points.contains(&point) {
            return Err(injected(point));
        }
        Ok(())
    }

    fn order_mut(&mut self, id: Uuid) -> Result<&mut Order> {
        self.staged
            .orders
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or_else(|| AppError::NotFound("order not found".to_string()))
    }
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    async fn cart_lines(&mut self, user_id: Uuid) -> Result<Vec<CartLine>> {
        Ok(self
            .staged
            .cart
            .iter()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn clear_cart(&mut self, user_id: Uuid) -> Result<u64> {
        let before = self.staged.cart.len();
        self.staged.cart.retain(|c| c.user_id != user_id);
        Ok((before - self.staged.cart.len()) as u64)
    }

    async fn upsert_cart_item(&mut self, user_id: Uuid, product_id: Uuid, qty: i32) -> Result<()> {
        if let Some(line) = self
            .staged
            .cart
            .iter_mut()
            .find(|c| c.user_id == user_id && c.product_id == product_id)
        {
            line.qty += qty;
            return Ok(());
        }

        let product = self
            .staged
            .products
            .iter()
            .find(|p| p.id == product_id)
            .cloned()
            .ok_or_else(|| AppError::Database(sqlx::Error::RowNotFound))?;
        self.staged.add_to_cart(user_id, &product, qty);
        Ok(())
    }

    async fn set_cart_qty(&mut self, user_id: Uuid, product_id: Uuid, qty: i32) -> Result<u64> {
        let mut changed = 0;
        for line in self
            .staged
            .cart
            .iter_mut()
            .filter(|c| c.user_id == user_id && c.product_id == product_id)
        {
            line.qty = qty;
            changed += 1;
        }
        Ok(changed)
    }

    async fn remove_cart_item(&mut self, user_id: Uuid, product_id: Uuid) -> Result<u64> {
        let before = self.staged.cart.len();
        self.staged
            .cart
            .retain(|c| !(c.user_id == user_id && c.product_id == product_id));
        Ok((before - self.staged.cart.len()) as u64)
    }

    async fn insert_order(&mut self, order: &Order) -> Result<()> {
        if self
            .staged
            .orders
            .iter()
            .any(|o| o.number_order == order.number_order)
        {
            return Err(AppError::Database(sqlx::Error::Protocol(
                "duplicate key value violates unique constraint \"orders_number_order_key\""
                    .to_string(),
            )));
        }
        self.staged.orders.push(order.clone());
        Ok(())
    }

    async fn insert_order_items(&mut self, items: &[OrderItem]) -> Result<()> {
        self.check(FailPoint::InsertOrderItems)?;
        self.staged.order_items.extend_from_slice(items);
        Ok(())
    }

    async fn order_items(&mut self, order_id: Uuid) -> Result<Vec<OrderItem>> {
        Ok(self
            .staged
            .order_items
            .iter()
            .filter(|i| i.order_id == order_id)
            .cloned()
            .collect())
    }

    async fn lock_order_by_id(&mut self, id: Uuid) -> Result<Option<Order>> {
        Ok(self.staged.orders.iter().find(|o| o.id == id).cloned())
    }

    async fn lock_order_by_number(&mut self, number_order: &str) -> Result<Option<Order>> {
        Ok(self
            .staged
            .orders
            .iter()
            .find(|o| o.number_order == number_order)
            .cloned())
    }

    async fn update_order_status(&mut self, id: Uuid, change: &StatusChange) -> Result<Order> {
        let order = self.order_mut(id)?;
        change.apply(order);
        Ok(order.clone())
    }

    async fn update_order_payment(&mut self, id: Uuid, details: &PaymentDetails) -> Result<Order> {
        self.check(FailPoint::UpdateOrderPayment)?;
        let order = self.order_mut(id)?;
        details.apply(order);
        Ok(order.clone())
    }

    async fn lock_balance_point(&mut self, user_id: Uuid) -> Result<Option<BalancePoint>> {
        Ok(self
            .staged
            .balances
            .iter()
            .find(|b| b.user_id == user_id)
            .cloned())
    }

    async fn point_tx_exists(
        &mut self,
        balance_point_id: Uuid,
        no_order: &str,
        tx_type: PointTxType,
    ) -> Result<bool> {
        Ok(self.staged.point_txs.iter().any(|tx| {
            tx.balance_point_id == balance_point_id
                && tx.no_order == no_order
                && tx.tx_type == tx_type
        }))
    }

    async fn record_point_tx(&mut self, entry: &BalancePointTx) -> Result<()> {
        self.check(FailPoint::RecordPointTx)?;
        let balance = self
            .staged
            .balances
            .iter_mut()
            .find(|b| b.id == entry.balance_point_id && b.balance_points == entry.last_point_balance)
            .ok_or_else(|| AppError::Conflict("point balance changed concurrently".to_string()))?;
        balance.balance_points = entry.new_point_balance;
        balance.updated_at = entry.tx_date;
        self.staged.point_txs.push(entry.clone());
        Ok(())
    }

    async fn lock_product(&mut self, product_id: Uuid) -> Result<Option<Product>> {
        Ok(self
            .staged
            .products
            .iter()
            .find(|p| p.id == product_id)
            .cloned())
    }

    async fn record_stock_out(&mut self, entry: &ProductStockHistory) -> Result<()> {
        self.check(FailPoint::RecordStockOut)?;
        let product = self
            .staged
            .products
            .iter_mut()
            .find(|p| p.id == entry.product_id && p.stock == entry.stock_opening)
            .ok_or_else(|| AppError::Conflict("product stock changed concurrently".to_string()))?;
        product.stock = entry.stock_final;
        self.staged.stock_history.push(entry.clone());
        Ok(())
    }

    async fn insert_payment_log(&mut self, log: &PaymentLog) -> Result<()> {
        self.check(FailPoint::InsertPaymentLog)?;
        self.staged.payment_logs.push(log.clone());
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.check(FailPoint::Commit)?;
        let MemoryUnitOfWork {
            mut guard, staged, ..
        } = *self;
        *guard = staged;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures;

    #[tokio::test]
    async fn dropped_unit_of_work_leaves_state_untouched() {
        let store = MemoryStore::new();
        let user = fixtures::user(Decimal::ZERO);
        let product = fixtures::product(Decimal::new(1000, 0), 5);
        store
            .seed(|s| {
                s.products.push(product.clone());
                s.add_to_cart(user.id, &product, 2);
            })
            .await;

        {
            let mut uow = store.begin().await.unwrap();
            assert_eq!(uow.clear_cart(user.id).await.unwrap(), 1);
        }

        assert_eq!(store.find_cart(user.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn committed_unit_of_work_is_visible() {
        let store = MemoryStore::new();
        let user = fixtures::user(Decimal::ZERO);
        let product = fixtures::product(Decimal::new(1000, 0), 5);
        store.seed(|s| s.products.push(product.clone())).await;

        let mut uow = store.begin().await.unwrap();
        uow.upsert_cart_item(user.id, product.id, 1).await.unwrap();
        uow.upsert_cart_item(user.id, product.id, 2).await.unwrap();
        uow.commit().await.unwrap();

        let cart = store.find_cart(user.id).await.unwrap();
        assert_eq!(cart.len(), 1);
        assert_eq!(cart[0].qty, 3);
    }

    #[tokio::test]
    async fn stale_balance_is_rejected_as_conflict() {
        let store = MemoryStore::new();
        let user = fixtures::user(Decimal::ZERO);
        let mut balance = BalancePoint {
            id: Uuid::nil(),
            user_id: user.id,
            balance_points: Decimal::ZERO,
            updated_at: Utc::now(),
        };
        store
            .seed(|s| balance = s.add_balance(user.id, Decimal::new(500, 0)))
            .await;

        let entry = BalancePointTx {
            id: Uuid::new_v4(),
            balance_point_id: balance.id,
            no_order: "ORDER/20240101/0000001".to_string(),
            tx_type: PointTxType::Debit,
            tx_date: Utc::now(),
            tx_nominal: Decimal::new(100, 0),
            last_point_balance: Decimal::new(400, 0),
            new_point_balance: Decimal::new(500, 0),
            description: String::new(),
        };
        let mut uow = store.begin().await.unwrap();
        let result = uow.record_point_tx(&entry).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }
}
