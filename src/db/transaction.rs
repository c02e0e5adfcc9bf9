use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder, Transaction};
use uuid::Uuid;

use super::{repository::UnitOfWork, CART_LINE_SELECT};
use crate::{
    error::{AppError, Result},
    models::*,
};

/// A PostgreSQL transaction. Row reads prefixed with `lock_` take `FOR UPDATE`
/// locks; the transaction rolls back when dropped uncommitted.
pub struct PgUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

impl PgUnitOfWork {
    pub fn new(tx: Transaction<'static, Postgres>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    // ==================== CART ====================

    async fn cart_lines(&mut self, user_id: Uuid) -> Result<Vec<CartLine>> {
        let lines = sqlx::query_as::<_, CartLine>(CART_LINE_SELECT)
            .bind(user_id)
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(lines)
    }

    async fn clear_cart(&mut self, user_id: Uuid) -> Result<u64> {
        let result = sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected())
    }

    async fn upsert_cart_item(&mut self, user_id: Uuid, product_id: Uuid, qty: i32) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO cart_items (id, user_id, product_id, qty, created_at)
            VALUES ($1, $2, $3, $4, NOW())
            ON CONFLICT (user_id, product_id)
            DO UPDATE SET qty = cart_items.qty + EXCLUDED.qty
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(product_id)
        .bind(qty)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn set_cart_qty(&mut self, user_id: Uuid, product_id: Uuid, qty: i32) -> Result<u64> {
        let result =
            sqlx::query("UPDATE cart_items SET qty = $3 WHERE user_id = $1 AND product_id = $2")
                .bind(user_id)
                .bind(product_id)
                .bind(qty)
                .execute(&mut *self.tx)
                .await?;
        Ok(result.rows_affected())
    }

    async fn remove_cart_item(&mut self, user_id: Uuid, product_id: Uuid) -> Result<u64> {
        let result = sqlx::query("DELETE FROM cart_items WHERE user_id = $1 AND product_id = $2")
            .bind(user_id)
            .bind(product_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected())
    }

    // ==================== ORDERS ====================

    async fn insert_order(&mut self, order: &Order) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO orders (
                id, user_id, number_order, full_name, email, phone, address,
                courier_note, total_bill, shipping_cost, payment_by_cash,
                payment_by_point, order_status, payment_status, shipping_status,
                payment_method, payment_channel, ordered_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
            "#,
        )
        .bind(order.id)
        .bind(order.user_id)
        .bind(&order.number_order)
        .bind(&order.full_name)
        .bind(&order.email)
        .bind(&order.phone)
        .bind(&order.address)
        .bind(&order.courier_note)
        .bind(order.total_bill)
        .bind(order.shipping_cost)
        .bind(order.payment_by_cash)
        .bind(order.payment_by_point)
        .bind(order.order_status.as_str())
        .bind(order.payment_status.as_str())
        .bind(order.shipping_status.as_str())
        .bind(order.payment_method.as_str())
        .bind(&order.payment_channel)
        .bind(order.ordered_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn insert_order_items(&mut self, items: &[OrderItem]) -> Result<()> {
        if items.is_empty() {
            return Ok(());
        }

        let mut builder = QueryBuilder::<Postgres>::new(
            "INSERT INTO order_items (id, order_id, product_id, no_sku, product_name, \
             picture_url, thumbnail, description, weight, volume, qty, price, total_price, \
             flag_promo, created_at) ",
        );
        builder.push_values(items, |mut row, item| {
            row.push_bind(item.id)
                .push_bind(item.order_id)
                .push_bind(item.product_id)
                .push_bind(item.no_sku.clone())
                .push_bind(item.product_name.clone())
                .push_bind(item.picture_url.clone())
                .push_bind(item.thumbnail.clone())
                .push_bind(item.description.clone())
                .push_bind(item.weight)
                .push_bind(item.volume)
                .push_bind(item.qty)
                .push_bind(item.price)
                .push_bind(item.total_price)
                .push_bind(item.flag_promo)
                .push_bind(item.created_at);
        });
        builder.build().execute(&mut *self.tx).await?;
        Ok(())
    }

    async fn order_items(&mut self, order_id: Uuid) -> Result<Vec<OrderItem>> {
        let items = sqlx::query_as::<_, OrderItem>(
            "SELECT * FROM order_items WHERE order_id = $1 ORDER BY created_at ASC",
        )
        .bind(order_id)
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(items)
    }

    async fn lock_order_by_id(&mut self, id: Uuid) -> Result<Option<Order>> {
        let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(order)
    }

    async fn lock_order_by_number(&mut self, number_order: &str) -> Result<Option<Order>> {
        let order =
            sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE number_order = $1 FOR UPDATE")
                .bind(number_order)
                .fetch_optional(&mut *self.tx)
                .await?;
        Ok(order)
    }

    async fn update_order_status(&mut self, id: Uuid, change: &StatusChange) -> Result<Order> {
        let order = sqlx::query_as::<_, Order>(
            r#"
            UPDATE orders SET
                order_status = COALESCE($2, order_status),
                payment_status = COALESCE($3, payment_status),
                payment_success_at = COALESCE(payment_success_at, $4),
                completed_at = COALESCE(completed_at, $5),
                canceled_at = COALESCE(canceled_at, $6)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(change.order_status.map(|s| s.as_str()))
        .bind(change.payment_status.map(|s| s.as_str()))
        .bind(change.payment_success_at)
        .bind(change.completed_at)
        .bind(change.canceled_at)
        .fetch_optional(&mut *self.tx)
        .await?;

        order.ok_or_else(|| AppError::NotFound("order not found".to_string()))
    }

    async fn update_order_payment(&mut self, id: Uuid, details: &PaymentDetails) -> Result<Order> {
        let order = sqlx::query_as::<_, Order>(
            r#"
            UPDATE orders SET
                payment_no = $2,
                payment_name = $3,
                payment_expired = $4,
                payment_total = $5,
                trx_id = $6
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&details.payment_no)
        .bind(&details.payment_name)
        .bind(&details.payment_expired)
        .bind(details.payment_total)
        .bind(&details.trx_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        order.ok_or_else(|| AppError::NotFound("order not found".to_string()))
    }

    // ==================== POINT LEDGER ====================

    async fn lock_balance_point(&mut self, user_id: Uuid) -> Result<Option<BalancePoint>> {
        let balance = sqlx::query_as::<_, BalancePoint>(
            "SELECT * FROM balance_points WHERE user_id = $1 FOR UPDATE",
        )
        .bind(user_id)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(balance)
    }

    async fn point_tx_exists(
        &mut self,
        balance_point_id: Uuid,
        no_order: &str,
        tx_type: PointTxType,
    ) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM balance_point_tx
                WHERE balance_point_id = $1 AND no_order = $2 AND tx_type = $3
            )
            "#,
        )
        .bind(balance_point_id)
        .bind(no_order)
        .bind(tx_type.as_str())
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(exists)
    }

    async fn record_point_tx(&mut self, entry: &BalancePointTx) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO balance_point_tx (
                id, balance_point_id, no_order, tx_type, tx_date, tx_nominal,
                last_point_balance, new_point_balance, description
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(entry.id)
        .bind(entry.balance_point_id)
        .bind(&entry.no_order)
        .bind(entry.tx_type.as_str())
        .bind(entry.tx_date)
        .bind(entry.tx_nominal)
        .bind(entry.last_point_balance)
        .bind(entry.new_point_balance)
        .bind(&entry.description)
        .execute(&mut *self.tx)
        .await?;

        let updated = sqlx::query(
            r#"
            UPDATE balance_points
            SET balance_points = $1, updated_at = $2
            WHERE id = $3 AND balance_points = $4
            "#,
        )
        .bind(entry.new_point_balance)
        .bind(entry.tx_date)
        .bind(entry.balance_point_id)
        .bind(entry.last_point_balance)
        .execute(&mut *self.tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(AppError::Conflict(
                "point balance changed concurrently".to_string(),
            ));
        }
        Ok(())
    }

    // ==================== STOCK LEDGER ====================

    async fn lock_product(&mut self, product_id: Uuid) -> Result<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            "SELECT id, no_sku, product_name, price, stock FROM products WHERE id = $1 FOR UPDATE",
        )
        .bind(product_id)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(product)
    }

    async fn record_stock_out(&mut self, entry: &ProductStockHistory) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO product_stock_history (
                id, product_id, no_order, tx_date, stock_opening, stock_out,
                stock_final, description
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(entry.id)
        .bind(entry.product_id)
        .bind(&entry.no_order)
        .bind(entry.tx_date)
        .bind(entry.stock_opening)
        .bind(entry.stock_out)
        .bind(entry.stock_final)
        .bind(&entry.description)
        .execute(&mut *self.tx)
        .await?;

        let updated = sqlx::query(
            r#"
            UPDATE products
            SET stock = $1, updated_at = $2
            WHERE id = $3 AND stock = $4
            "#,
        )
        .bind(entry.stock_final)
        .bind(entry.tx_date)
        .bind(entry.product_id)
        .bind(entry.stock_opening)
        .execute(&mut *self.tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(AppError::Conflict("product stock changed concurrently".to_string()));
        }
        Ok(())
    }

    // ==================== PAYMENT LOG ====================

    async fn insert_payment_log(&mut self, log: &PaymentLog) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO payment_logs (
                id, order_id, number_order, type_log, payment_method,
                payment_channel, log, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(log.id)
        .bind(log.order_id)
        .bind(&log.number_order)
        .bind(log.type_log.as_str())
        .bind(log.payment_method.as_str())
        .bind(&log.payment_channel)
        .bind(&log.log)
        .bind(log.created_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
