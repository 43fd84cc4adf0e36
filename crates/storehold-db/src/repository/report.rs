//! # Report Repository
//!
//! Aggregations over the sales ledger. Every figure is computed from the
//! frozen sale snapshots, never from current product prices.

use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use super::push_time_range;
use crate::error::DbResult;
use storehold_core::report::{BreakdownRow, LowStockItem, SalesTotals};
use storehold_core::TimeRange;

/// Repository for report queries.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    /// Revenue, profit and sale count inside `range`.
    pub async fn totals(&self, range: TimeRange) -> DbResult<SalesTotals> {
        let mut query = QueryBuilder::<Sqlite>::new(
            r#"
            SELECT
                COALESCE(SUM(total_amount), 0) AS revenue,
                COALESCE(SUM(profit), 0) AS profit,
                COUNT(*) AS transactions
            FROM sales
            WHERE 1 = 1
            "#,
        );
        push_time_range(&mut query, "created_at", range);

        let totals = query
            .build_query_as::<SalesTotals>()
            .fetch_one(&self.pool)
            .await?;

        debug!(?range, revenue = totals.revenue, "Computed sales totals");
        Ok(totals)
    }

    /// Totals grouped by sale source.
    pub async fn by_source(&self, range: TimeRange) -> DbResult<Vec<BreakdownRow>> {
        self.grouped("source", range).await
    }

    /// Totals grouped by payment method.
    pub async fn by_payment_method(&self, range: TimeRange) -> DbResult<Vec<BreakdownRow>> {
        self.grouped("payment_method", range).await
    }

    async fn grouped(&self, column: &str, range: TimeRange) -> DbResult<Vec<BreakdownRow>> {
        let mut query = QueryBuilder::<Sqlite>::new(format!(
            r#"
            SELECT
                {column} AS "key",
                SUM(total_amount) AS revenue,
                SUM(profit) AS profit,
                COUNT(*) AS transactions
            FROM sales
            WHERE 1 = 1
            "#
        ));
        push_time_range(&mut query, "created_at", range);
        query.push(format!(" GROUP BY {column} ORDER BY revenue DESC, \"key\""));

        let rows = query
            .build_query_as::<BreakdownRow>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Line revenue and profit grouped by the product's category.
    ///
    /// `transactions` counts distinct sales that contained the category.
    pub async fn by_category(&self, range: TimeRange) -> DbResult<Vec<BreakdownRow>> {
        let mut query = QueryBuilder::<Sqlite>::new(
            r#"
            SELECT
                p.category AS "key",
                SUM(si.selling_price * si.quantity) AS revenue,
                SUM((si.selling_price - si.cost_price) * si.quantity) AS profit,
                COUNT(DISTINCT s.id) AS transactions
            FROM sale_items si
            INNER JOIN sales s ON s.id = si.sale_id
            INNER JOIN products p ON p.id = si.product_id
            WHERE 1 = 1
            "#,
        );
        push_time_range(&mut query, "s.created_at", range);
        query.push(" GROUP BY p.category ORDER BY revenue DESC, \"key\"");

        let rows = query
            .build_query_as::<BreakdownRow>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Non-archived products with at most `threshold` available units,
    /// scarcest first.
    pub async fn low_stock(&self, threshold: i64) -> DbResult<Vec<LowStockItem>> {
        let items = sqlx::query_as::<_, LowStockItem>(
            r#"
            SELECT
                id AS product_id,
                name,
                category,
                quantity,
                reserved_quantity,
                quantity - reserved_quantity AS available
            FROM products
            WHERE is_archived = 0 AND quantity - reserved_quantity <= ?
            ORDER BY available, name
            "#,
        )
        .bind(threshold)
        .fetch_all(&self.pool)
        .await?;

        debug!(threshold, count = items.len(), "Loaded low-stock products");
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::sale;
    use crate::repository::testing::{insert_product, memory_db};
    use chrono::Utc;
    use storehold_core::{PaymentMethod, Sale, SaleItem, SaleSource};

    fn sale_of(id: &str, source: SaleSource, method: PaymentMethod, qty: i64) -> Sale {
        Sale {
            id: id.to_string(),
            receipt_number: format!("RCPT-{id}"),
            source,
            order_number: None,
            payment_method: method,
            total_amount: 18000 * qty,
            profit: 6000 * qty,
            created_at: Utc::now(),
            items: vec![SaleItem {
                id: format!("{id}-1"),
                sale_id: id.to_string(),
                product_id: "p-1".into(),
                quantity: qty,
                selling_price: 18000,
                cost_price: 12000,
            }],
        }
    }

    #[tokio::test]
    async fn test_totals_and_breakdowns() {
        let db = memory_db().await;
        insert_product(&db, "p-1", 10).await;
        {
            let mut conn = db.pool().acquire().await.unwrap();
            sale::insert(&mut conn, &sale_of("s-1", SaleSource::WalkIn, PaymentMethod::Cash, 1))
                .await
                .unwrap();
            sale::insert(&mut conn, &sale_of("s-2", SaleSource::WalkIn, PaymentMethod::Pos, 2))
                .await
                .unwrap();
        }

        let reports = db.reports();
        let totals = reports.totals(TimeRange::unbounded()).await.unwrap();
        assert_eq!(totals.revenue, 54000);
        assert_eq!(totals.profit, 18000);
        assert_eq!(totals.transactions, 2);

        let by_method = reports.by_payment_method(TimeRange::unbounded()).await.unwrap();
        assert_eq!(by_method.len(), 2);
        assert_eq!(by_method[0].key, "POS");
        assert_eq!(by_method[0].revenue, 36000);

        let by_category = reports.by_category(TimeRange::unbounded()).await.unwrap();
        assert_eq!(by_category.len(), 1);
        assert_eq!(by_category[0].key, "PERFUMES");
        assert_eq!(by_category[0].profit, 18000);
        assert_eq!(by_category[0].transactions, 2);
    }

    #[tokio::test]
    async fn test_empty_totals_are_zero() {
        let db = memory_db().await;
        let totals = db.reports().totals(TimeRange::unbounded()).await.unwrap();
        assert_eq!(totals, SalesTotals::default());
    }

    #[tokio::test]
    async fn test_low_stock() {
        let db = memory_db().await;
        insert_product(&db, "p-low", 2).await;
        insert_product(&db, "p-high", 50).await;

        let items = db.reports().low_stock(5).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].product_id, "p-low");
        assert_eq!(items[0].available, 2);
    }
}
