mod repository;
mod transaction;

#[cfg(test)]
pub mod memory;

pub use repository::{Repository, UnitOfWork};
pub use transaction::PgUnitOfWork;

use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};
use uuid::Uuid;

use crate::{config::Config, error::Result, models::*};

/// Cart rows joined with product and discount, shared by the pool and the
/// transaction readers.
pub(crate) const CART_LINE_SELECT: &str = r#"
    SELECT c.id, c.user_id, c.product_id, c.qty,
           p.no_sku, p.product_name, p.picture_url, p.thumbnail, p.description,
           p.weight, p.volume, p.price, p.stock,
           COALESCE(d.flag_promo, FALSE) AS flag_promo,
           COALESCE(d.nominal, 0) AS promo_price
    FROM cart_items c
    JOIN products p ON p.id = c.product_id
    LEFT JOIN product_discounts d ON d.product_id = p.id
    WHERE c.user_id = $1
    ORDER BY c.created_at ASC
"#;

const USER_SELECT: &str = r#"
    SELECT u.id, u.username, u.full_name, u.email, u.phone, u.referral_code,
           u.registration_referral_code,
           COALESCE(l.bonus_percentage, 0) AS bonus_percentage
    FROM users u
    LEFT JOIN user_levels l ON l.id = u.user_level_id
"#;

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .connect(&config.database_url)
            .await?;

        Ok(Self { pool })
    }

    pub async fn run_migrations(&self) -> anyhow::Result<()> {
        // migrations harus berada di crate root: ./migrations
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Repository for Database {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgUnitOfWork::new(tx)))
    }

    // ==================== USER QUERIES ====================

    async fn find_user(&self, id: Uuid) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!("{} WHERE u.id = $1", USER_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_user_by_referral_code(&self, code: &str) -> Result<Option<User>> {
        let user =
            sqlx::query_as::<_, User>(&format!("{} WHERE u.referral_code = $1", USER_SELECT))
                .bind(code)
                .fetch_optional(&self.pool)
                .await?;
        Ok(user)
    }

    // ==================== ORDER QUERIES ====================

    async fn order_number_exists(&self, number_order: &str) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM orders WHERE number_order = $1)")
                .bind(number_order)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn find_order_by_id(&self, id: Uuid) -> Result<Option<Order>> {
        let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(order)
    }

    async fn find_orders_by_user(
        &self,
        user_id: Uuid,
        status: Option<OrderStatus>,
    ) -> Result<Vec<Order>> {
        let orders = sqlx::query_as::<_, Order>(
            r#"
            SELECT * FROM orders
            WHERE user_id = $1 AND ($2::TEXT IS NULL OR order_status = $2)
            ORDER BY ordered_at DESC
            "#,
        )
        .bind(user_id)
        .bind(status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await?;
        Ok(orders)
    }

    async fn find_order_items(&self, order_id: Uuid) -> Result<Vec<OrderItem>> {
        let items = sqlx::query_as::<_, OrderItem>(
            "SELECT * FROM order_items WHERE order_id = $1 ORDER BY created_at ASC",
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    // ==================== CART QUERIES ====================

    async fn find_cart(&self, user_id: Uuid) -> Result<Vec<CartLine>> {
        let lines = sqlx::query_as::<_, CartLine>(CART_LINE_SELECT)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(lines)
    }

    async fn find_product(&self, product_id: Uuid) -> Result<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            "SELECT id, no_sku, product_name, price, stock FROM products WHERE id = $1",
        )
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(product)
    }

    // ==================== BANK QUERIES ====================

    async fn find_bank_transfer(&self, bank_code: &str) -> Result<Option<BankTransfer>> {
        let bank =
            sqlx::query_as::<_, BankTransfer>("SELECT * FROM bank_transfer WHERE bank_code = $1")
                .bind(bank_code)
                .fetch_optional(&self.pool)
                .await?;
        Ok(bank)
    }

    async fn find_bank_va(&self, bank_code: &str) -> Result<Option<BankVa>> {
        let bank = sqlx::query_as::<_, BankVa>("SELECT * FROM bank_va WHERE bank_code = $1")
            .bind(bank_code)
            .fetch_optional(&self.pool)
            .await?;
        Ok(bank)
    }

    // ==================== POINT QUERIES ====================

    async fn find_balance_point(&self, user_id: Uuid) -> Result<Option<BalancePoint>> {
        let balance =
            sqlx::query_as::<_, BalancePoint>("SELECT * FROM balance_points WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(balance)
    }

    async fn find_point_ledger(&self, balance_point_id: Uuid) -> Result<Vec<BalancePointTx>> {
        let entries = sqlx::query_as::<_, BalancePointTx>(
            r#"
            SELECT * FROM balance_point_tx
            WHERE balance_point_id = $1
            ORDER BY seq ASC
            "#,
        )
        .bind(balance_point_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn database_new_returns_error_on_invalid_url() {
        let mut config = crate::config::test_config();
        config.database_url = "not-a-url".to_string();
        let result = Database::new(&config).await;
        assert!(result.is_err());
    }
}
