//! # Sequence Repository
//!
//! Per-day counters behind order and receipt numbers.
//!
//! ```text
//! daily_sequences
//! ┌─────────┬──────────────┬────────────┐
//! │ scope   │ business_day │ last_value │
//! ├─────────┼──────────────┼────────────┤
//! │ ORDER   │ 2026-02-07   │ 12         │ → next order  ORD-20260207-0013
//! │ RECEIPT │ 2026-02-07   │ 40         │ → next receipt RCPT-20260207-0041
//! └─────────┴──────────────┴────────────┘
//! ```
//!
//! The bump runs inside the caller's write transaction, so a rolled-back
//! checkout gives its number back.

use chrono::NaiveDate;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use storehold_core::numbering::SequenceScope;

/// Increments and returns the counter for `(scope, day)`, starting at 1.
pub async fn next_value(
    conn: &mut SqliteConnection,
    scope: SequenceScope,
    day: NaiveDate,
) -> DbResult<i64> {
    let value: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO daily_sequences (scope, business_day, last_value)
        VALUES (?, ?, 1)
        ON CONFLICT (scope, business_day)
        DO UPDATE SET last_value = last_value + 1
        RETURNING last_value
        "#,
    )
    .bind(scope.as_str())
    .bind(day)
    .fetch_one(conn)
    .await?;

    debug!(scope = scope.as_str(), %day, value, "Issued sequence value");
    Ok(value)
}

/// Read-only access to the counters (diagnostics).
#[derive(Debug, Clone)]
pub struct SequenceRepository {
    pool: SqlitePool,
}

impl SequenceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SequenceRepository { pool }
    }

    /// Last issued value for `(scope, day)`, zero when none was issued.
    pub async fn current(&self, scope: SequenceScope, day: NaiveDate) -> DbResult<i64> {
        let value: Option<i64> = sqlx::query_scalar(
            "SELECT last_value FROM daily_sequences WHERE scope = ? AND business_day = ?",
        )
        .bind(scope.as_str())
        .bind(day)
        .fetch_optional(&self.pool)
        .await?;

        Ok(value.unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::testing::memory_db;

    #[tokio::test]
    async fn test_counters_are_scoped_by_kind_and_day() {
        let db = memory_db().await;
        let day = NaiveDate::from_ymd_opt(2026, 2, 7).unwrap();
        let next_day = day.succ_opt().unwrap();

        {
            let mut conn = db.pool().acquire().await.unwrap();
            assert_eq!(next_value(&mut conn, SequenceScope::Order, day).await.unwrap(), 1);
            assert_eq!(next_value(&mut conn, SequenceScope::Order, day).await.unwrap(), 2);
            assert_eq!(next_value(&mut conn, SequenceScope::Receipt, day).await.unwrap(), 1);
            assert_eq!(next_value(&mut conn, SequenceScope::Order, next_day).await.unwrap(), 1);
        }

        let repo = db.sequences();
        assert_eq!(repo.current(SequenceScope::Order, day).await.unwrap(), 2);
        assert_eq!(repo.current(SequenceScope::Receipt, next_day).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_rolled_back_bump_is_not_consumed() {
        let db = memory_db().await;
        let day = NaiveDate::from_ymd_opt(2026, 2, 7).unwrap();

        {
            let mut tx = db.begin_immediate().await.unwrap();
            next_value(&mut tx, SequenceScope::Receipt, day).await.unwrap();
            tx.rollback().await.unwrap();
        }

        let mut conn = db.pool().acquire().await.unwrap();
        assert_eq!(next_value(&mut conn, SequenceScope::Receipt, day).await.unwrap(), 1);
    }
}
