use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    db::UnitOfWork,
    error::{AppError, Result},
    models::{BalancePoint, BalancePointTx, PointTxType, Product, ProductStockHistory},
};

/// Builds the next ledger row for `balance`. The caller persists it together
/// with the cached balance via `UnitOfWork::record_point_tx`.
pub fn post_points(
    balance: &BalancePoint,
    tx_type: PointTxType,
    nominal: Decimal,
    no_order: &str,
    description: &str,
    now: DateTime<Utc>,
) -> Result<BalancePointTx> {
    if nominal < Decimal::ZERO {
        return Err(AppError::BadRequest(
            "point nominal cannot be negative".to_string(),
        ));
    }

    let last = balance.balance_points;
    let new = last + tx_type.sign() * nominal;
    if new < Decimal::ZERO {
        return Err(AppError::InsufficientBalance);
    }

    Ok(BalancePointTx {
        id: Uuid::new_v4(),
        balance_point_id: balance.id,
        no_order: no_order.to_string(),
        tx_type,
        tx_date: now,
        tx_nominal: nominal,
        last_point_balance: last,
        new_point_balance: new,
        description: description.to_string(),
    })
}

/// Locks the user's balance, appends a ledger row and moves the cached balance
/// in the same unit of work. Zero amounts write nothing.
pub async fn apply_points(
    uow: &mut dyn UnitOfWork,
    user_id: Uuid,
    tx_type: PointTxType,
    nominal: Decimal,
    no_order: &str,
    description: &str,
    now: DateTime<Utc>,
) -> Result<Option<BalancePointTx>> {
    if nominal.is_zero() {
        return Ok(None);
    }

    let balance = uow
        .lock_balance_point(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("balance point not found".to_string()))?;
    let entry = post_points(&balance, tx_type, nominal, no_order, description, now)?;
    uow.record_point_tx(&entry).await?;
    Ok(Some(entry))
}

/// Writes the point-consumption row for an order unless it is already on the ledger.
pub async fn charge_points_once(
    uow: &mut dyn UnitOfWork,
    user_id: Uuid,
    nominal: Decimal,
    no_order: &str,
    description: &str,
    now: DateTime<Utc>,
) -> Result<bool> {
    if nominal.is_zero() {
        return Ok(false);
    }

    let balance = uow
        .lock_balance_point(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("balance point not found".to_string()))?;
    if uow
        .point_tx_exists(balance.id, no_order, PointTxType::Credit)
        .await?
    {
        return Ok(false);
    }

    let entry = post_points(&balance, PointTxType::Credit, nominal, no_order, description, now)?;
    uow.record_point_tx(&entry).await?;
    Ok(true)
}

/// Stock history row for `qty` units leaving `product`.
pub fn stock_out(
    product: &Product,
    qty: i32,
    no_order: &str,
    description: &str,
    now: DateTime<Utc>,
) -> ProductStockHistory {
    ProductStockHistory {
        id: Uuid::new_v4(),
        product_id: product.id,
        no_order: no_order.to_string(),
        tx_date: now,
        stock_opening: product.stock,
        stock_out: qty,
        stock_final: product.stock - qty,
        description: description.to_string(),
    }
}

/// True when every row satisfies `new == last ± nominal` with the sign of its
/// type and each row starts where the previous one ended.
pub fn verify_chain(entries: &[BalancePointTx]) -> bool {
    let rows_balance = entries.iter().all(|tx| {
        tx.tx_nominal >= Decimal::ZERO
            && tx.new_point_balance == tx.last_point_balance + tx.tx_type.sign() * tx.tx_nominal
    });
    let rows_link = entries
        .windows(2)
        .all(|pair| pair[0].new_point_balance == pair[1].last_point_balance);
    rows_balance && rows_link
}

/// Balance implied by replaying the ledger, or `None` when it is empty.
pub fn replay(entries: &[BalancePointTx]) -> Option<Decimal> {
    let first = entries.first()?;
    Some(
        entries
            .iter()
            .fold(first.last_point_balance, |acc, tx| acc + tx.tx_type.sign() * tx.tx_nominal),
    )
}

/// The cached balance agrees with its ledger.
pub fn is_consistent(balance: &BalancePoint, entries: &[BalancePointTx]) -> bool {
    if !verify_chain(entries) {
        return false;
    }
    match replay(entries) {
        Some(replayed) => replayed == balance.balance_points,
        None => true,
    }
}
