use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

use super::ledger;
use crate::{
    db::Repository,
    error::{AppError, Result},
    models::{
        BalancePoint, BalancePointResponse, PointCheckAmountResponse, PointHistoryResponse,
        PointOrderTxResponse,
    },
};

pub struct PointService {
    repo: Arc<dyn Repository>,
}

impl PointService {
    pub fn new(repo: Arc<dyn Repository>) -> Self {
        Self { repo }
    }

    async fn balance_of(&self, user_id: Uuid) -> Result<BalancePoint> {
        self.repo
            .find_balance_point(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("balance point not found".to_string()))
    }

    pub async fn get_balance(&self, user_id: Uuid) -> Result<BalancePointResponse> {
        Ok(self.balance_of(user_id).await?.into())
    }

    /// Ledger rows oldest first, plus whether the cached balance matches a replay.
    pub async fn get_history(&self, user_id: Uuid) -> Result<PointHistoryResponse> {
        let balance = self.balance_of(user_id).await?;
        let entries = self.repo.find_point_ledger(balance.id).await?;
        let ledger_consistent = ledger::is_consistent(&balance, &entries);
        if !ledger_consistent {
            tracing::warn!("Point ledger of {} does not match cached balance", user_id);
        }

        Ok(PointHistoryResponse {
            balance_points: balance.balance_points,
            ledger_consistent,
            entries,
        })
    }

    /// GET /api/v1/balance_point/check/amount
    pub async fn check_amount(
        &self,
        user_id: Uuid,
        amount: Decimal,
    ) -> Result<PointCheckAmountResponse> {
        if amount < Decimal::ZERO {
            return Err(AppError::BadRequest(
                "amount cannot be negative".to_string(),
            ));
        }
        let balance = self.balance_of(user_id).await?;
        Ok(PointCheckAmountResponse {
            balance_points: balance.balance_points,
            amount,
            sufficient: balance.balance_points >= amount,
        })
    }

    /// GET /api/v1/balance_point/check/order_tx
    pub async fn check_order_tx(
        &self,
        user_id: Uuid,
        number_order: &str,
    ) -> Result<PointOrderTxResponse> {
        let balance = self.balance_of(user_id).await?;
        let entries: Vec<_> = self
            .repo
            .find_point_ledger(balance.id)
            .await?
            .into_iter()
            .filter(|tx| tx.no_order == number_order)
            .collect();

        Ok(PointOrderTxResponse {
            number_order: number_order.to_string(),
            recorded: !entries.is_empty(),
            entries,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::order_service::test_support::*;

    #[tokio::test]
    async fn history_replays_to_cached_balance() {
        let h = Harness::new().await;
        let order = h.place_order(2_500, 47_500).await;
        h.service.cancel_order_by_id(h.buyer.id, order.id).await.unwrap();

        let service = PointService::new(Arc::new(h.store.clone()));
        let history = service.get_history(h.buyer.id).await.unwrap();

        assert_eq!(history.entries.len(), 2);
        assert_eq!(history.balance_points, Decimal::from(10_000));
        assert!(history.ledger_consistent);
    }

    #[tokio::test]
    async fn tampered_cache_is_reported() {
        let h = Harness::new().await;
        h.place_order(2_500, 47_500).await;
        let buyer_id = h.buyer.id;
        h.store
            .seed(|s| {
                if let Some(b) = s.balances.iter_mut().find(|b| b.user_id == buyer_id) {
                    b.balance_points += Decimal::ONE;
                }
            })
            .await;

        let service = PointService::new(Arc::new(h.store.clone()));
        assert!(!service.get_history(h.buyer.id).await.unwrap().ledger_consistent);
        assert_eq!(
            service.get_balance(h.buyer.id).await.unwrap().balance_points,
            Decimal::from(7_501)
        );
    }

    #[tokio::test]
    async fn check_amount_compares_with_balance() {
        let h = Harness::new().await;
        let service = PointService::new(Arc::new(h.store.clone()));

        let enough = service
            .check_amount(h.buyer.id, Decimal::from(10_000))
            .await
            .unwrap();
        assert!(enough.sufficient);

        let short = service
            .check_amount(h.buyer.id, Decimal::from(10_001))
            .await
            .unwrap();
        assert!(!short.sufficient);
        assert_eq!(short.balance_points, Decimal::from(10_000));

        let negative = service.check_amount(h.buyer.id, Decimal::from(-1)).await;
        assert!(matches!(negative, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn check_order_tx_lists_rows_of_one_order() {
        // Memastikan hanya baris ledger milik order tersebut yang dikembalikan
        let h = Harness::new().await;
        let spent = h.place_order(1_500, 48_500).await;
        let cash_only = h.place_order(0, 50_000).await;
        let service = PointService::new(Arc::new(h.store.clone()));

        let found = service
            .check_order_tx(h.buyer.id, &spent.number_order)
            .await
            .unwrap();
        assert!(found.recorded);
        assert_eq!(found.entries.len(), 1);
        assert_eq!(found.entries[0].tx_nominal, Decimal::from(1_500));

        let none = service
            .check_order_tx(h.buyer.id, &cash_only.number_order)
            .await
            .unwrap();
        assert!(!none.recorded);
        assert!(none.entries.is_empty());
    }

    #[tokio::test]
    async fn missing_balance_is_not_found() {
        let h = Harness::new().await;
        let service = PointService::new(Arc::new(h.store.clone()));
        let result = service.get_balance(Uuid::new_v4()).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
