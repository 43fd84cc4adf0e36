//! # Sale Repository
//!
//! The immutable sales ledger.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sale Lifecycle                                    │
//! │                                                                         │
//! │  WALK_IN                              WEBSITE                           │
//! │  record_walk_in()                     mark_paid(order)                  │
//! │     │ deduct stock                       │ claim PAID, finalize stock   │
//! │     ▼                                    ▼                              │
//! │  next receipt number  ◄── shared per-day RECEIPT counter ──►           │
//! │     │                                    │                              │
//! │     ▼                                    ▼                              │
//! │  sale::insert(sale + items)           sale::insert(sale + items)        │
//! │     │                                    │  (UNIQUE order_number)       │
//! │     └────────────── commit ──────────────┘                              │
//! │                                                                         │
//! │  No UPDATE or DELETE is ever issued against sales or sale_items.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::debug;

use super::{push_search, push_time_range};
use crate::error::DbResult;
use storehold_core::{Sale, SaleFilter, SaleItem, TimeRange};

const SALE_COLUMNS: &str = r#"
    s.id AS id, s.receipt_number AS receipt_number, s.source AS source,
    s.order_number AS order_number, s.payment_method AS payment_method,
    s.total_amount AS total_amount, s.profit AS profit, s.created_at AS created_at
"#;

// =============================================================================
// Connection-level operations
// =============================================================================

/// Inserts a sale and its items.
///
/// ## Returns
/// * `Err(DbError::UniqueViolation)` - receipt number reused, or a second
///   sale for the same order number
pub async fn insert(conn: &mut SqliteConnection, sale: &Sale) -> DbResult<()> {
    debug!(
        id = %sale.id,
        receipt_number = %sale.receipt_number,
        source = %sale.source,
        "Inserting sale"
    );

    sqlx::query(
        r#"
        INSERT INTO sales (
            id, receipt_number, source, order_number, payment_method,
            total_amount, profit, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&sale.id)
    .bind(&sale.receipt_number)
    .bind(sale.source)
    .bind(&sale.order_number)
    .bind(sale.payment_method)
    .bind(sale.total_amount)
    .bind(sale.profit)
    .bind(sale.created_at)
    .execute(&mut *conn)
    .await?;

    for (position, item) in sale.items.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO sale_items (
                id, sale_id, product_id, quantity, selling_price, cost_price, position
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&item.id)
        .bind(&item.sale_id)
        .bind(&item.product_id)
        .bind(item.quantity)
        .bind(item.selling_price)
        .bind(item.cost_price)
        .bind(position as i64)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

/// Items of one sale, in checkout order.
pub async fn items(conn: &mut SqliteConnection, sale_id: &str) -> DbResult<Vec<SaleItem>> {
    let items = sqlx::query_as::<_, SaleItem>(
        r#"
        SELECT id, sale_id, product_id, quantity, selling_price, cost_price
        FROM sale_items
        WHERE sale_id = ?
        ORDER BY position
        "#,
    )
    .bind(sale_id)
    .fetch_all(conn)
    .await?;
    Ok(items)
}

async fn fetch_where(
    conn: &mut SqliteConnection,
    column: &str,
    value: &str,
) -> DbResult<Option<Sale>> {
    let sql = format!("SELECT {SALE_COLUMNS} FROM sales s WHERE s.{column} = ?");
    let sale = sqlx::query_as::<_, Sale>(&sql)
        .bind(value)
        .fetch_optional(&mut *conn)
        .await?;

    match sale {
        Some(mut sale) => {
            sale.items = items(conn, &sale.id).await?;
            Ok(Some(sale))
        }
        None => Ok(None),
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for sale reads.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Gets a sale (with items) by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let mut conn = self.pool.acquire().await?;
        fetch_where(&mut conn, "id", id).await
    }

    /// Gets a sale (with items) by receipt number.
    pub async fn get_by_receipt_number(&self, receipt_number: &str) -> DbResult<Option<Sale>> {
        let mut conn = self.pool.acquire().await?;
        fetch_where(&mut conn, "receipt_number", receipt_number).await
    }

    /// Gets the website sale recorded for an order, if it was paid.
    pub async fn get_by_order_number(&self, order_number: &str) -> DbResult<Option<Sale>> {
        let mut conn = self.pool.acquire().await?;
        fetch_where(&mut conn, "order_number", order_number).await
    }

    /// Lists sales newest first, with items.
    ///
    /// `search` matches receipt number, order number or the customer phone
    /// of the originating order.
    pub async fn list(&self, filter: &SaleFilter, range: TimeRange) -> DbResult<(Vec<Sale>, i64)> {
        let page = filter.page.normalized();
        debug!(?filter, ?range, "Listing sales");

        let mut count = QueryBuilder::<Sqlite>::new(
            "SELECT COUNT(*) FROM sales s LEFT JOIN orders o ON o.order_number = s.order_number WHERE 1 = 1",
        );
        push_sale_filter(&mut count, filter, range);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut query = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {SALE_COLUMNS} FROM sales s LEFT JOIN orders o ON o.order_number = s.order_number WHERE 1 = 1"
        ));
        push_sale_filter(&mut query, filter, range);
        query
            .push(" ORDER BY s.created_at DESC, s.receipt_number DESC LIMIT ")
            .push_bind(page.limit as i64)
            .push(" OFFSET ")
            .push_bind(page.offset());

        let sales = query.build_query_as::<Sale>().fetch_all(&self.pool).await?;

        let mut conn = self.pool.acquire().await?;
        let mut loaded = Vec::with_capacity(sales.len());
        for mut sale in sales {
            sale.items = items(&mut conn, &sale.id).await?;
            loaded.push(sale);
        }

        Ok((loaded, total))
    }

    /// Customer name of the order behind a website sale.
    pub async fn customer_name(&self, order_number: &str) -> DbResult<Option<String>> {
        let name: Option<String> =
            sqlx::query_scalar("SELECT customer_name FROM orders WHERE order_number = ?")
                .bind(order_number)
                .fetch_optional(&self.pool)
                .await?;
        Ok(name)
    }
}

fn push_sale_filter<'a>(
    query: &mut QueryBuilder<'a, Sqlite>,
    filter: &'a SaleFilter,
    range: TimeRange,
) {
    if let Some(source) = filter.source {
        query.push(" AND s.source = ").push_bind(source);
    }

    if let Some(method) = filter.payment_method {
        query.push(" AND s.payment_method = ").push_bind(method);
    }

    push_search(
        query,
        &["s.receipt_number", "s.order_number", "o.customer_phone"],
        filter.search.as_deref(),
    );

    push_time_range(query, "s.created_at", range);
}
