//! # Stock Ledger
//!
//! The only code that moves `quantity` and `reserved_quantity`.
//!
//! ## Operations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stock Ledger                                     │
//! │                                                                         │
//! │  operation   quantity   reserved    guard                               │
//! │  ─────────   ────────   ────────    ─────────────────────────────────   │
//! │  reserve        =         + q       quantity - reserved >= q            │
//! │  release        =         - q       none (floored at 0)                 │
//! │  deduct       - q           =       quantity - reserved >= q            │
//! │  finalize     - q         - q       reserved >= q AND quantity >= q     │
//! │  adjust       + d           =       quantity + d >= reserved, >= 0      │
//! │                                                                         │
//! │  Guard rejected? re-read the row:                                       │
//! │    missing  ──► ProductNotFound                                         │
//! │    present  ──► InsufficientStock { available: observed }               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The free functions run on a caller's connection so they compose inside
//! one transaction. [`StockLedger`] wraps each of them in its own
//! `BEGIN IMMEDIATE` transaction for standalone use.

use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use std::collections::BTreeMap;

use storehold_core::{CoreError, StockLevel, ValidationError};
use storehold_db::repository::stock;

use crate::error::EngineResult;
use crate::Engine;

// =============================================================================
// Connection-level operations
// =============================================================================

fn ensure_positive(qty: i64) -> EngineResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        }
        .into());
    }
    Ok(())
}

/// Turns a guarded update's outcome into a level or a domain error.
///
/// `observed` picks the figure reported as "available" when the guard
/// rejected the update.
async fn settle(
    conn: &mut SqliteConnection,
    product_id: &str,
    requested: i64,
    outcome: Option<StockLevel>,
    observed: fn(&StockLevel) -> i64,
) -> EngineResult<StockLevel> {
    if let Some(level) = outcome {
        return Ok(level);
    }

    match stock::level(conn, product_id).await? {
        None => Err(CoreError::ProductNotFound(product_id.to_string()).into()),
        Some(level) => Err(CoreError::insufficient(product_id, observed(&level), requested).into()),
    }
}

/// `quantity - reserved_quantity` for a product.
pub async fn available_stock(conn: &mut SqliteConnection, product_id: &str) -> EngineResult<i64> {
    stock::level(conn, product_id)
        .await?
        .map(|level| level.available())
        .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()).into())
}

/// Fails with `InsufficientStock` unless `qty` units are available.
pub async fn assert_availability(
    conn: &mut SqliteConnection,
    product_id: &str,
    qty: i64,
) -> EngineResult<()> {
    let available = available_stock(conn, product_id).await?;
    if available < qty {
        return Err(CoreError::insufficient(product_id, available, qty).into());
    }
    Ok(())
}

/// Asserts every per-product total before anything is mutated.
pub async fn assert_all(
    conn: &mut SqliteConnection,
    totals: &BTreeMap<String, i64>,
) -> EngineResult<()> {
    for (product_id, qty) in totals {
        assert_availability(conn, product_id, *qty).await?;
    }
    Ok(())
}

pub async fn reserve(
    conn: &mut SqliteConnection,
    product_id: &str,
    qty: i64,
    now: DateTime<Utc>,
) -> EngineResult<StockLevel> {
    ensure_positive(qty)?;
    let outcome = stock::reserve(conn, product_id, qty, now).await?;
    settle(conn, product_id, qty, outcome, StockLevel::available).await
}

/// Never fails for an existing product; over-release floors at zero.
pub async fn release(
    conn: &mut SqliteConnection,
    product_id: &str,
    qty: i64,
    now: DateTime<Utc>,
) -> EngineResult<StockLevel> {
    ensure_positive(qty)?;
    let outcome = stock::release(conn, product_id, qty, now).await?;
    settle(conn, product_id, qty, outcome, StockLevel::available).await
}

pub async fn deduct(
    conn: &mut SqliteConnection,
    product_id: &str,
    qty: i64,
    now: DateTime<Utc>,
) -> EngineResult<StockLevel> {
    ensure_positive(qty)?;
    let outcome = stock::deduct(conn, product_id, qty, now).await?;
    settle(conn, product_id, qty, outcome, StockLevel::available).await
}

/// Converts `qty` reserved units into sold units.
pub async fn finalize(
    conn: &mut SqliteConnection,
    product_id: &str,
    qty: i64,
    now: DateTime<Utc>,
) -> EngineResult<StockLevel> {
    ensure_positive(qty)?;
    let outcome = stock::finalize(conn, product_id, qty, now).await?;
    settle(conn, product_id, qty, outcome, |level: &StockLevel| {
        level.reserved_quantity.min(level.quantity)
    })
    .await
}

/// Restock (`delta > 0`) or write-off (`delta < 0`) of on-hand units.
///
/// A write-off may not eat into reserved units.
pub async fn adjust(
    conn: &mut SqliteConnection,
    product_id: &str,
    delta: i64,
    now: DateTime<Utc>,
) -> EngineResult<StockLevel> {
    if delta == 0 {
        return Err(ValidationError::inconsistent("restock", "delta must not be zero").into());
    }
    let outcome = stock::adjust(conn, product_id, delta, now).await?;
    settle(conn, product_id, -delta, outcome, StockLevel::available).await
}

/// Sums quantities per product, so a product on two lines is checked once
/// against its combined demand.
pub fn aggregate<'a, I>(lines: I) -> BTreeMap<String, i64>
where
    I: IntoIterator<Item = (&'a str, i64)>,
{
    let mut totals = BTreeMap::new();
    for (product_id, qty) in lines {
        *totals.entry(product_id.to_string()).or_insert(0) += qty;
    }
    totals
}

// =============================================================================
// Standalone ledger
// =============================================================================

/// Ledger operations that each commit on their own.
#[derive(Debug, Clone, Copy)]
pub struct StockLedger<'a> {
    engine: &'a Engine,
}

impl<'a> StockLedger<'a> {
    pub(crate) fn new(engine: &'a Engine) -> Self {
        StockLedger { engine }
    }

    pub async fn level(&self, product_id: &str) -> EngineResult<StockLevel> {
        self.engine
            .db()
            .stock()
            .level(product_id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()).into())
    }

    pub async fn available_stock(&self, product_id: &str) -> EngineResult<i64> {
        let mut conn = self.engine.db().pool().acquire().await?;
        available_stock(&mut conn, product_id).await
    }

    pub async fn assert_availability(&self, product_id: &str, qty: i64) -> EngineResult<()> {
        let mut conn = self.engine.db().pool().acquire().await?;
        assert_availability(&mut conn, product_id, qty).await
    }

    pub async fn reserve(&self, product_id: &str, qty: i64) -> EngineResult<StockLevel> {
        let now = self.engine.now();
        let mut tx = self.engine.db().begin_immediate().await?;
        let level = reserve(&mut tx, product_id, qty, now).await?;
        tx.commit().await?;
        Ok(level)
    }

    pub async fn release(&self, product_id: &str, qty: i64) -> EngineResult<StockLevel> {
        let now = self.engine.now();
        let mut tx = self.engine.db().begin_immediate().await?;
        let level = release(&mut tx, product_id, qty, now).await?;
        tx.commit().await?;
        Ok(level)
    }

    pub async fn deduct(&self, product_id: &str, qty: i64) -> EngineResult<StockLevel> {
        let now = self.engine.now();
        let mut tx = self.engine.db().begin_immediate().await?;
        let level = deduct(&mut tx, product_id, qty, now).await?;
        tx.commit().await?;
        Ok(level)
    }

    pub async fn finalize(&self, product_id: &str, qty: i64) -> EngineResult<StockLevel> {
        let now = self.engine.now();
        let mut tx = self.engine.db().begin_immediate().await?;
        let level = finalize(&mut tx, product_id, qty, now).await?;
        tx.commit().await?;
        Ok(level)
    }
}
