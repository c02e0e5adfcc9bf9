use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::Repository,
    error::{AppError, Result},
    models::{AddToCartRequest, CartQtyRequest, CartResponse, UpdateCartQtyRequest},
};

pub struct CartService {
    repo: Arc<dyn Repository>,
}

impl CartService {
    pub fn new(repo: Arc<dyn Repository>) -> Self {
        Self { repo }
    }

    pub async fn get_cart(&self, user_id: Uuid) -> Result<CartResponse> {
        let lines = self.repo.find_cart(user_id).await?;
        Ok(CartResponse::from_lines(lines))
    }

    /// Adds `qty` to the existing line for the product or opens a new one.
    pub async fn add_to_cart(&self, user_id: Uuid, request: AddToCartRequest) -> Result<CartResponse> {
        request.validate()?;
        let product = self
            .repo
            .find_product(request.product_id)
            .await?
            .ok_or_else(|| AppError::NotFound("product not found".to_string()))?;

        let mut uow = self.repo.begin().await?;
        uow.upsert_cart_item(user_id, product.id, request.qty).await?;
        uow.commit().await?;

        tracing::debug!("Added {} x {} to cart of {}", request.qty, product.no_sku, user_id);
        self.get_cart(user_id).await
    }

    /// Moves the quantity of an existing line by `delta`; a line that reaches
    /// zero is removed from the cart.
    async fn step_qty(&self, user_id: Uuid, product_id: Uuid, delta: i32) -> Result<CartResponse> {
        let mut uow = self.repo.begin().await?;
        let line = uow
            .cart_lines(user_id)
            .await?
            .into_iter()
            .find(|line| line.product_id == product_id)
            .ok_or_else(|| AppError::NotFound("cart item not found".to_string()))?;

        let qty = line.qty + delta;
        if qty <= 0 {
            uow.remove_cart_item(user_id, product_id).await?;
        } else {
            uow.set_cart_qty(user_id, product_id, qty).await?;
        }
        uow.commit().await?;

        self.get_cart(user_id).await
    }

    /// PUT /api/v1/cart/plus_qty
    pub async fn plus_qty(&self, user_id: Uuid, request: CartQtyRequest) -> Result<CartResponse> {
        self.step_qty(user_id, request.product_id, 1).await
    }

    /// PUT /api/v1/cart/min_qty
    pub async fn min_qty(&self, user_id: Uuid, request: CartQtyRequest) -> Result<CartResponse> {
        self.step_qty(user_id, request.product_id, -1).await
    }

    /// PUT /api/v1/cart/update_qty
    pub async fn update_qty(
        &self,
        user_id: Uuid,
        request: UpdateCartQtyRequest,
    ) -> Result<CartResponse> {
        request.validate()?;

        let mut uow = self.repo.begin().await?;
        if uow
            .set_cart_qty(user_id, request.product_id, request.qty)
            .await?
            == 0
        {
            return Err(AppError::NotFound("cart item not found".to_string()));
        }
        uow.commit().await?;

        self.get_cart(user_id).await
    }
}
