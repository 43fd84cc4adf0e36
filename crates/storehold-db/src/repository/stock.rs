//! # Stock Repository
//!
//! The only SQL that moves `quantity` and `reserved_quantity`.
//!
//! ## Delta Updates With a Guard
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Stock Update Strategy                                │
//! │                                                                         │
//! │  ❌ WRONG: read, check in Rust, write an absolute value                │
//! │     SELECT quantity ...;  UPDATE products SET quantity = 7              │
//! │                                                                         │
//! │  ✅ CORRECT: one conditional delta statement                           │
//! │     UPDATE products SET reserved_quantity = reserved_quantity + 3       │
//! │     WHERE id = ? AND quantity - reserved_quantity >= 3                  │
//! │     RETURNING ...                                                       │
//! │                                                                         │
//! │  No row back means the guard rejected it (or the id is unknown).       │
//! │  The caller re-reads the product to tell the two apart.                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every function returns `Ok(None)` when the guard rejected the update.
//! Quantities are expected to be positive; callers validate first.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use storehold_core::StockLevel;

const RETURNING_LEVEL: &str = "RETURNING id AS product_id, quantity, reserved_quantity";

async fn apply(
    conn: &mut SqliteConnection,
    statement: &str,
    product_id: &str,
    qty: i64,
    now: DateTime<Utc>,
) -> DbResult<Option<StockLevel>> {
    let sql = format!("{statement} {RETURNING_LEVEL}");
    let level = sqlx::query_as::<_, StockLevel>(&sql)
        .bind(now)
        .bind(product_id)
        .bind(qty)
        .fetch_optional(conn)
        .await?;
    Ok(level)
}

/// Current counters for a product.
pub async fn level(conn: &mut SqliteConnection, product_id: &str) -> DbResult<Option<StockLevel>> {
    let level = sqlx::query_as::<_, StockLevel>(
        "SELECT id AS product_id, quantity, reserved_quantity FROM products WHERE id = ?",
    )
    .bind(product_id)
    .fetch_optional(conn)
    .await?;
    Ok(level)
}

/// `reserved_quantity += qty` when at least `qty` units are available.
pub async fn reserve(
    conn: &mut SqliteConnection,
    product_id: &str,
    qty: i64,
    now: DateTime<Utc>,
) -> DbResult<Option<StockLevel>> {
    debug!(product_id = %product_id, qty, "Reserving stock");
    apply(
        conn,
        r#"
        UPDATE products
        SET reserved_quantity = reserved_quantity + ?3, updated_at = ?1
        WHERE id = ?2 AND quantity - reserved_quantity >= ?3
        "#,
        product_id,
        qty,
        now,
    )
    .await
}

/// `reserved_quantity -= qty`, floored at zero. Only fails for unknown ids.
pub async fn release(
    conn: &mut SqliteConnection,
    product_id: &str,
    qty: i64,
    now: DateTime<Utc>,
) -> DbResult<Option<StockLevel>> {
    debug!(product_id = %product_id, qty, "Releasing stock");
    apply(
        conn,
        r#"
        UPDATE products
        SET reserved_quantity = MAX(reserved_quantity - ?3, 0), updated_at = ?1
        WHERE id = ?2
        "#,
        product_id,
        qty,
        now,
    )
    .await
}

/// `quantity -= qty` when at least `qty` units are available. Reservations
/// held by pending orders are left intact.
pub async fn deduct(
    conn: &mut SqliteConnection,
    product_id: &str,
    qty: i64,
    now: DateTime<Utc>,
) -> DbResult<Option<StockLevel>> {
    debug!(product_id = %product_id, qty, "Deducting stock");
    apply(
        conn,
        r#"
        UPDATE products
        SET quantity = quantity - ?3, updated_at = ?1
        WHERE id = ?2 AND quantity - reserved_quantity >= ?3
        "#,
        product_id,
        qty,
        now,
    )
    .await
}

/// Converts a reservation into a sale: both counters drop by `qty`.
pub async fn finalize(
    conn: &mut SqliteConnection,
    product_id: &str,
    qty: i64,
    now: DateTime<Utc>,
) -> DbResult<Option<StockLevel>> {
    debug!(product_id = %product_id, qty, "Finalizing reserved stock");
    apply(
        conn,
        r#"
        UPDATE products
        SET quantity = quantity - ?3,
            reserved_quantity = reserved_quantity - ?3,
            updated_at = ?1
        WHERE id = ?2 AND reserved_quantity >= ?3 AND quantity >= ?3
        "#,
        product_id,
        qty,
        now,
    )
    .await
}

/// `quantity += delta` (delta may be negative) as long as the result stays
/// at or above `reserved_quantity`.
pub async fn adjust(
    conn: &mut SqliteConnection,
    product_id: &str,
    delta: i64,
    now: DateTime<Utc>,
) -> DbResult<Option<StockLevel>> {
    debug!(product_id = %product_id, delta, "Adjusting on-hand stock");
    apply(
        conn,
        r#"
        UPDATE products
        SET quantity = quantity + ?3, updated_at = ?1
        WHERE id = ?2 AND quantity + ?3 >= reserved_quantity AND quantity + ?3 >= 0
        "#,
        product_id,
        delta,
        now,
    )
    .await
}

/// Repository wrapper for single-statement stock calls outside a larger
/// transaction. Each call is atomic on its own.
#[derive(Debug, Clone)]
pub struct StockRepository {
    pool: SqlitePool,
}

impl StockRepository {
    pub fn new(pool: SqlitePool) -> Self {
        StockRepository { pool }
    }

    pub async fn level(&self, product_id: &str) -> DbResult<Option<StockLevel>> {
        let mut conn = self.pool.acquire().await?;
        level(&mut conn, product_id).await
    }

    pub async fn reserve(
        &self,
        product_id: &str,
        qty: i64,
        now: DateTime<Utc>,
    ) -> DbResult<Option<StockLevel>> {
        let mut conn = self.pool.acquire().await?;
        reserve(&mut conn, product_id, qty, now).await
    }

    pub async fn release(
        &self,
        product_id: &str,
        qty: i64,
        now: DateTime<Utc>,
    ) -> DbResult<Option<StockLevel>> {
        let mut conn = self.pool.acquire().await?;
        release(&mut conn, product_id, qty, now).await
    }

    pub async fn deduct(
        &self,
        product_id: &str,
        qty: i64,
        now: DateTime<Utc>,
    ) -> DbResult<Option<StockLevel>> {
        let mut conn = self.pool.acquire().await?;
        deduct(&mut conn, product_id, qty, now).await
    }

    pub async fn finalize(
        &self,
        product_id: &str,
        qty: i64,
        now: DateTime<Utc>,
    ) -> DbResult<Option<StockLevel>> {
        let mut conn = self.pool.acquire().await?;
        finalize(&mut conn, product_id, qty, now).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::testing::{insert_product, memory_db};

    #[tokio::test]
    async fn test_reserve_respects_availability() {
        let db = memory_db().await;
        insert_product(&db, "p-1", 5).await;
        let stock = db.stock();
        let now = Utc::now();

        let level = stock.reserve("p-1", 3, now).await.unwrap().unwrap();
        assert_eq!(level.reserved_quantity, 3);
        assert_eq!(level.available(), 2);

        assert!(stock.reserve("p-1", 3, now).await.unwrap().is_none());
        assert!(stock.reserve("missing", 1, now).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_release_floors_at_zero() {
        let db = memory_db().await;
        insert_product(&db, "p-1", 5).await;
        let stock = db.stock();
        let now = Utc::now();

        stock.reserve("p-1", 2, now).await.unwrap();
        let level = stock.release("p-1", 10, now).await.unwrap().unwrap();
        assert_eq!(level.reserved_quantity, 0);
        assert_eq!(level.quantity, 5);
    }

    #[tokio::test]
    async fn test_deduct_keeps_reservations() {
        let db = memory_db().await;
        insert_product(&db, "p-1", 5).await;
        let stock = db.stock();
        let now = Utc::now();

        stock.reserve("p-1", 3, now).await.unwrap();
        assert!(stock.deduct("p-1", 3, now).await.unwrap().is_none());

        let level = stock.deduct("p-1", 2, now).await.unwrap().unwrap();
        assert_eq!(level.quantity, 3);
        assert_eq!(level.reserved_quantity, 3);
    }

    #[tokio::test]
    async fn test_finalize_moves_both_counters() {
        let db = memory_db().await;
        insert_product(&db, "p-1", 5).await;
        let stock = db.stock();
        let now = Utc::now();

        stock.reserve("p-1", 2, now).await.unwrap();
        let level = stock.finalize("p-1", 2, now).await.unwrap().unwrap();
        assert_eq!(level.quantity, 3);
        assert_eq!(level.reserved_quantity, 0);

        assert!(stock.finalize("p-1", 1, now).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_adjust_cannot_undercut_reservations() {
        let db = memory_db().await;
        insert_product(&db, "p-1", 5).await;
        let now = Utc::now();
        db.stock().reserve("p-1", 4, now).await.unwrap();

        let mut conn = db.pool().acquire().await.unwrap();
        assert!(adjust(&mut conn, "p-1", -2, now).await.unwrap().is_none());

        let level = adjust(&mut conn, "p-1", 10, now).await.unwrap().unwrap();
        assert_eq!(level.quantity, 15);
        assert_eq!(level.reserved_quantity, 4);
    }
}
