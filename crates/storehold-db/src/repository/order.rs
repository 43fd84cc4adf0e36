//! # Order Repository
//!
//! Website orders and their frozen line snapshots.
//!
//! ## Status Claims
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Every transition is an UPDATE guarded by the current status:           │
//! │                                                                         │
//! │     UPDATE orders SET status = 'PAID', paid_at = ?                      │
//! │     WHERE id = ? AND status = 'PENDING_PAYMENT'                         │
//! │                                                                         │
//! │  rows_affected == 1  → this caller owns the transition                  │
//! │  rows_affected == 0  → someone else got there first (or unknown id)     │
//! │                                                                         │
//! │  Run inside the same transaction as the stock moves, so the claim and   │
//! │  the counters commit or roll back together.                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::debug;

use super::{push_search, push_time_range};
use crate::error::DbResult;
use storehold_core::{CancelReason, Order, OrderFilter, OrderItem, OrderStatus, TimeRange};

const ORDER_COLUMNS: &str = r#"
    id, order_number, customer_name, customer_phone, customer_email,
    delivery_address, total_amount, status, cancel_reason,
    created_at, updated_at, paid_at, cancelled_at
"#;

// =============================================================================
// Connection-level operations
// =============================================================================

/// Inserts the order row followed by its items, in item order.
pub async fn insert(conn: &mut SqliteConnection, order: &Order) -> DbResult<()> {
    debug!(
        id = %order.id,
        order_number = %order.order_number,
        items = order.items.len(),
        "Inserting order"
    );

    sqlx::query(
        r#"
        INSERT INTO orders (
            id, order_number, customer_name, customer_phone, customer_email,
            delivery_address, total_amount, status, cancel_reason,
            created_at, updated_at, paid_at, cancelled_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&order.id)
    .bind(&order.order_number)
    .bind(&order.customer_name)
    .bind(&order.customer_phone)
    .bind(&order.customer_email)
    .bind(&order.delivery_address)
    .bind(order.total_amount)
    .bind(order.status)
    .bind(order.cancel_reason)
    .bind(order.created_at)
    .bind(order.updated_at)
    .bind(order.paid_at)
    .bind(order.cancelled_at)
    .execute(&mut *conn)
    .await?;

    for (position, item) in order.items.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO order_items (id, order_id, product_id, quantity, price_at_order, position)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&item.id)
        .bind(&item.order_id)
        .bind(&item.product_id)
        .bind(item.quantity)
        .bind(item.price_at_order)
        .bind(position as i64)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

/// Loads an order with its items.
pub async fn fetch(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Order>> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?");
    let order = sqlx::query_as::<_, Order>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    with_items(conn, order).await
}

/// Loads an order by its human-readable number.
pub async fn fetch_by_number(
    conn: &mut SqliteConnection,
    order_number: &str,
) -> DbResult<Option<Order>> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE order_number = ?");
    let order = sqlx::query_as::<_, Order>(&sql)
        .bind(order_number)
        .fetch_optional(&mut *conn)
        .await?;

    with_items(conn, order).await
}

async fn with_items(conn: &mut SqliteConnection, order: Option<Order>) -> DbResult<Option<Order>> {
    match order {
        Some(mut order) => {
            order.items = items(conn, &order.id).await?;
            Ok(Some(order))
        }
        None => Ok(None),
    }
}

/// Items of one order, in the order they were placed.
pub async fn items(conn: &mut SqliteConnection, order_id: &str) -> DbResult<Vec<OrderItem>> {
    let items = sqlx::query_as::<_, OrderItem>(
        r#"
        SELECT id, order_id, product_id, quantity, price_at_order
        FROM order_items
        WHERE order_id = ?
        ORDER BY position
        "#,
    )
    .bind(order_id)
    .fetch_all(conn)
    .await?;
    Ok(items)
}

/// Claims `PENDING_PAYMENT → PAID`. Returns `false` if the order was not
/// pending (or does not exist).
pub async fn claim_paid(conn: &mut SqliteConnection, id: &str, now: DateTime<Utc>) -> DbResult<bool> {
    let result = sqlx::query(
        r#"
        UPDATE orders
        SET status = ?, paid_at = ?, updated_at = ?
        WHERE id = ? AND status = ?
        "#,
    )
    .bind(OrderStatus::Paid)
    .bind(now)
    .bind(now)
    .bind(id)
    .bind(OrderStatus::PendingPayment)
    .execute(conn)
    .await?;

    debug!(id = %id, claimed = result.rows_affected() == 1, "Claim PAID");
    Ok(result.rows_affected() == 1)
}

/// Claims `PENDING_PAYMENT → CANCELLED`. Returns `false` if the order was
/// not pending (or does not exist).
pub async fn claim_cancelled(
    conn: &mut SqliteConnection,
    id: &str,
    reason: CancelReason,
    now: DateTime<Utc>,
) -> DbResult<bool> {
    let result = sqlx::query(
        r#"
        UPDATE orders
        SET status = ?, cancel_reason = ?, cancelled_at = ?, updated_at = ?
        WHERE id = ? AND status = ?
        "#,
    )
    .bind(OrderStatus::Cancelled)
    .bind(reason)
    .bind(now)
    .bind(now)
    .bind(id)
    .bind(OrderStatus::PendingPayment)
    .execute(conn)
    .await?;

    debug!(id = %id, ?reason, claimed = result.rows_affected() == 1, "Claim CANCELLED");
    Ok(result.rows_affected() == 1)
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for order reads.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Gets an order (with items) by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Order>> {
        let mut conn = self.pool.acquire().await?;
        fetch(&mut conn, id).await
    }

    /// Gets an order (with items) by order number.
    pub async fn get_by_number(&self, order_number: &str) -> DbResult<Option<Order>> {
        let mut conn = self.pool.acquire().await?;
        fetch_by_number(&mut conn, order_number).await
    }

    /// Lists orders newest first, with items.
    ///
    /// `range` is the already-resolved date filter; the rest of `filter`
    /// (status, search, page) is applied here.
    pub async fn list(&self, filter: &OrderFilter, range: TimeRange) -> DbResult<(Vec<Order>, i64)> {
        let page = filter.page.normalized();
        debug!(?filter, ?range, "Listing orders");

        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM orders WHERE 1 = 1");
        push_order_filter(&mut count, filter, range);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut query =
            QueryBuilder::<Sqlite>::new(format!("SELECT {ORDER_COLUMNS} FROM orders WHERE 1 = 1"));
        push_order_filter(&mut query, filter, range);
        query
            .push(" ORDER BY created_at DESC, order_number DESC LIMIT ")
            .push_bind(page.limit as i64)
            .push(" OFFSET ")
            .push_bind(page.offset());

        let orders = query.build_query_as::<Order>().fetch_all(&self.pool).await?;

        let mut conn = self.pool.acquire().await?;
        let mut loaded = Vec::with_capacity(orders.len());
        for mut order in orders {
            order.items = items(&mut conn, &order.id).await?;
            loaded.push(order);
        }

        Ok((loaded, total))
    }

    /// IDs of pending orders created strictly before `cutoff`, oldest first.
    pub async fn expired_pending_ids(&self, cutoff: DateTime<Utc>) -> DbResult<Vec<String>> {
        let ids: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT id FROM orders
            WHERE status = ? AND created_at < ?
            ORDER BY created_at, order_number
            "#,
        )
        .bind(OrderStatus::PendingPayment)
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;

        debug!(count = ids.len(), %cutoff, "Found expired pending orders");
        Ok(ids)
    }

    /// Number of orders awaiting payment.
    pub async fn count_pending(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE status = ?")
            .bind(OrderStatus::PendingPayment)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

fn push_order_filter<'a>(
    query: &mut QueryBuilder<'a, Sqlite>,
    filter: &'a OrderFilter,
    range: TimeRange,
) {
    if let Some(status) = filter.status {
        query.push(" AND status = ").push_bind(status);
    }

    push_search(query, &["order_number", "customer_name"], filter.search.as_deref());

    push_time_range(query, "created_at", range);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::testing::{insert_product, memory_db};
    use chrono::Duration;

    fn order(id: &str, number: &str, created_at: DateTime<Utc>) -> Order {
        Order {
            id: id.to_string(),
            order_number: number.to_string(),
            customer_name: "Ada Obi".into(),
            customer_phone: "08035550101".into(),
            customer_email: None,
            delivery_address: Some("12 Marina Rd".into()),
            total_amount: 36000,
            status: OrderStatus::PendingPayment,
            cancel_reason: None,
            created_at,
            updated_at: created_at,
            paid_at: None,
            cancelled_at: None,
            items: vec![OrderItem {
                id: format!("{id}-1"),
                order_id: id.to_string(),
                product_id: "p-1".into(),
                quantity: 2,
                price_at_order: 18000,
            }],
        }
    }

    #[tokio::test]
    async fn test_insert_and_fetch_with_items() {
        let db = memory_db().await;
        insert_product(&db, "p-1", 5).await;
        {
            let mut conn = db.pool().acquire().await.unwrap();
            insert(&mut conn, &order("o-1", "ORD-20260207-0001", Utc::now()))
                .await
                .unwrap();
        }

        let loaded = db.orders().get_by_number("ORD-20260207-0001").await.unwrap().unwrap();
        assert_eq!(loaded.id, "o-1");
        assert_eq!(loaded.items.len(), 1);
        assert_eq!(loaded.items[0].price_at_order, 18000);
        assert!(db.orders().get_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_claims_only_succeed_once() {
        let db = memory_db().await;
        insert_product(&db, "p-1", 5).await;
        let mut conn = db.pool().acquire().await.unwrap();
        insert(&mut conn, &order("o-1", "ORD-20260207-0001", Utc::now()))
            .await
            .unwrap();

        let now = Utc::now();
        assert!(claim_cancelled(&mut conn, "o-1", CancelReason::Manual, now).await.unwrap());
        assert!(!claim_cancelled(&mut conn, "o-1", CancelReason::Manual, now).await.unwrap());
        assert!(!claim_paid(&mut conn, "o-1", now).await.unwrap());

        let loaded = fetch(&mut conn, "o-1").await.unwrap().unwrap();
        assert_eq!(loaded.status, OrderStatus::Cancelled);
        assert_eq!(loaded.cancel_reason, Some(CancelReason::Manual));
    }

    #[tokio::test]
    async fn test_expired_pending_ids_oldest_first() {
        let db = memory_db().await;
        insert_product(&db, "p-1", 5).await;
        let now = Utc::now();
        {
            let mut conn = db.pool().acquire().await.unwrap();
            insert(&mut conn, &order("o-new", "ORD-2", now - Duration::hours(1)))
                .await
                .unwrap();
            insert(&mut conn, &order("o-old", "ORD-1", now - Duration::hours(30)))
                .await
                .unwrap();
            insert(&mut conn, &order("o-mid", "ORD-3", now - Duration::hours(25)))
                .await
                .unwrap();
        }

        let ids = db
            .orders()
            .expired_pending_ids(now - Duration::hours(24))
            .await
            .unwrap();
        assert_eq!(ids, vec!["o-old".to_string(), "o-mid".to_string()]);
        assert_eq!(db.orders().count_pending().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_list_filters_by_status_and_search() {
        let db = memory_db().await;
        insert_product(&db, "p-1", 5).await;
        {
            let mut conn = db.pool().acquire().await.unwrap();
            insert(&mut conn, &order("o-1", "ORD-20260207-0001", Utc::now()))
                .await
                .unwrap();
            let mut other = order("o-2", "ORD-20260207-0002", Utc::now());
            other.customer_name = "Bola Ade".into();
            insert(&mut conn, &other).await.unwrap();
            claim_paid(&mut conn, "o-2", Utc::now()).await.unwrap();
        }

        let filter = OrderFilter {
            status: Some(OrderStatus::PendingPayment),
            ..Default::default()
        };
        let (orders, total) = db.orders().list(&filter, TimeRange::unbounded()).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(orders[0].id, "o-1");
        assert_eq!(orders[0].items.len(), 1);

        let filter = OrderFilter {
            search: Some("bola".into()),
            ..Default::default()
        };
        let (orders, _) = db.orders().list(&filter, TimeRange::unbounded()).await.unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].status, OrderStatus::Paid);
    }
}
