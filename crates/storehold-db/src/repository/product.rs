//! # Product Repository
//!
//! Catalog rows, media counts and the archive guard.
//!
//! Stock counters are never written here; see [`super::stock`]. The only
//! exception is the initial `quantity` set on insert.
//!
//! ## Two Calling Styles
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Pool-level (reads, single statements)                                  │
//! │     db.products().get_by_id("p-1")                                      │
//! │                                                                         │
//! │  Connection-level (inside an engine transaction)                        │
//! │     let mut tx = db.begin_immediate().await?;                           │
//! │     product::fetch(&mut tx, "p-1")                                      │
//! │     product::archive(&mut tx, "p-1", now)                               │
//! │     tx.commit()                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

use super::push_search;
use crate::error::{DbError, DbResult};
use storehold_core::{OrderStatus, PricingUpdate, Product, ProductFilter, ProductMedia};

/// Column list shared by every product SELECT.
pub(crate) const PRODUCT_COLUMNS: &str = r#"
    id, name, description, category,
    cost_price, selling_price, quantity, reserved_quantity,
    discount_type, discount_value, discount_start_at, discount_end_at,
    visible_on_website, is_archived, archived_at,
    created_at, updated_at
"#;

// =============================================================================
// Connection-level operations
// =============================================================================

/// Loads one product, archived or not.
pub async fn fetch(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Product>> {
    let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?");
    let product = sqlx::query_as::<_, Product>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(product)
}

/// Inserts a fully-populated product row.
pub async fn insert(conn: &mut SqliteConnection, product: &Product) -> DbResult<()> {
    debug!(id = %product.id, name = %product.name, "Inserting product");

    sqlx::query(
        r#"
        INSERT INTO products (
            id, name, description, category,
            cost_price, selling_price, quantity, reserved_quantity,
            discount_type, discount_value, discount_start_at, discount_end_at,
            visible_on_website, is_archived, archived_at,
            created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&product.id)
    .bind(&product.name)
    .bind(&product.description)
    .bind(&product.category)
    .bind(product.cost_price)
    .bind(product.selling_price)
    .bind(product.quantity)
    .bind(product.reserved_quantity)
    .bind(product.discount_type)
    .bind(product.discount_value)
    .bind(product.discount_start_at)
    .bind(product.discount_end_at)
    .bind(product.visible_on_website)
    .bind(product.is_archived)
    .bind(product.archived_at)
    .bind(product.created_at)
    .bind(product.updated_at)
    .execute(conn)
    .await?;

    Ok(())
}

/// Replaces prices and the discount descriptor.
///
/// Order and sale items carry their own price snapshots, so history is
/// unaffected.
pub async fn update_pricing(
    conn: &mut SqliteConnection,
    id: &str,
    pricing: &PricingUpdate,
    now: DateTime<Utc>,
) -> DbResult<()> {
    debug!(id = %id, selling_price = pricing.selling_price, "Updating pricing");

    let discount = pricing.discount.as_ref();
    let result = sqlx::query(
        r#"
        UPDATE products SET
            cost_price = ?,
            selling_price = ?,
            discount_type = ?,
            discount_value = ?,
            discount_start_at = ?,
            discount_end_at = ?,
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(pricing.cost_price)
    .bind(pricing.selling_price)
    .bind(discount.map(|d| d.kind))
    .bind(discount.map(|d| d.value))
    .bind(discount.and_then(|d| d.start_at))
    .bind(discount.and_then(|d| d.end_at))
    .bind(now)
    .bind(id)
    .execute(conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Product", id));
    }

    Ok(())
}

/// Shows or hides a product on the storefront.
pub async fn set_visibility(
    conn: &mut SqliteConnection,
    id: &str,
    visible: bool,
    now: DateTime<Utc>,
) -> DbResult<()> {
    debug!(id = %id, visible, "Setting product visibility");

    let result =
        sqlx::query("UPDATE products SET visible_on_website = ?, updated_at = ? WHERE id = ?")
            .bind(visible)
            .bind(now)
            .bind(id)
            .execute(conn)
            .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Product", id));
    }

    Ok(())
}

/// Soft-deletes a product. Returns `false` when it was already archived.
pub async fn archive(conn: &mut SqliteConnection, id: &str, now: DateTime<Utc>) -> DbResult<bool> {
    debug!(id = %id, "Archiving product");

    let result = sqlx::query(
        r#"
        UPDATE products
        SET is_archived = 1, archived_at = ?, updated_at = ?
        WHERE id = ? AND is_archived = 0
        "#,
    )
    .bind(now)
    .bind(now)
    .bind(id)
    .execute(conn)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Counts pending orders that still hold a reservation on the product.
pub async fn count_pending_references(conn: &mut SqliteConnection, id: &str) -> DbResult<i64> {
    let count: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(DISTINCT o.id)
        FROM order_items oi
        INNER JOIN orders o ON o.id = oi.order_id
        WHERE oi.product_id = ? AND o.status = ?
        "#,
    )
    .bind(id)
    .bind(OrderStatus::PendingPayment)
    .fetch_one(conn)
    .await?;

    Ok(count)
}

/// Number of media files attached to a product.
pub async fn count_media(conn: &mut SqliteConnection, product_id: &str) -> DbResult<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM product_media WHERE product_id = ?")
        .bind(product_id)
        .fetch_one(conn)
        .await?;
    Ok(count)
}

/// Records a media reference.
pub async fn insert_media(conn: &mut SqliteConnection, media: &ProductMedia) -> DbResult<()> {
    debug!(product_id = %media.product_id, kind = ?media.kind, "Attaching media");

    sqlx::query(
        "INSERT INTO product_media (id, product_id, url, kind, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&media.id)
    .bind(&media.product_id)
    .bind(&media.url)
    .bind(media.kind)
    .bind(media.created_at)
    .execute(conn)
    .await?;

    Ok(())
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for product reads.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found (possibly archived)
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let mut conn = self.pool.acquire().await?;
        fetch(&mut conn, id).await
    }

    /// Lists products for the back office, newest first.
    ///
    /// `search` matches name or description, case-insensitively.
    /// Returns the page plus the total number of matches.
    pub async fn list(&self, filter: &ProductFilter) -> DbResult<(Vec<Product>, i64)> {
        let page = filter.page.normalized();
        debug!(?filter, "Listing products");

        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM products WHERE 1 = 1");
        push_product_filter(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut query = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE 1 = 1"
        ));
        push_product_filter(&mut query, filter);
        query
            .push(" ORDER BY created_at DESC, id LIMIT ")
            .push_bind(page.limit as i64)
            .push(" OFFSET ")
            .push_bind(page.offset());

        let products = query.build_query_as::<Product>().fetch_all(&self.pool).await?;
        Ok((products, total))
    }

    /// Visible, non-archived products, newest first. Out-of-stock products
    /// are included so the storefront can label them.
    pub async fn list_storefront(&self) -> DbResult<Vec<Product>> {
        let sql = format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM products
            WHERE visible_on_website = 1 AND is_archived = 0
            ORDER BY created_at DESC, id
            "#
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = products.len(), "Loaded storefront products");
        Ok(products)
    }

    /// Media attached to a product, oldest first.
    pub async fn media(&self, product_id: &str) -> DbResult<Vec<ProductMedia>> {
        let media = sqlx::query_as::<_, ProductMedia>(
            r#"
            SELECT id, product_id, url, kind, created_at
            FROM product_media
            WHERE product_id = ?
            ORDER BY created_at, id
            "#,
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(media)
    }

    /// Display names for a set of product ids (archived products included).
    pub async fn names(&self, ids: &[String]) -> DbResult<HashMap<String, String>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut query = QueryBuilder::<Sqlite>::new("SELECT id, name FROM products WHERE id IN (");
        let mut separated = query.separated(", ");
        for id in ids {
            separated.push_bind(id);
        }
        separated.push_unseparated(")");

        let rows: Vec<(String, String)> = query.build_query_as().fetch_all(&self.pool).await?;
        Ok(rows.into_iter().collect())
    }

    /// Counts non-archived products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_archived = 0")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

fn push_product_filter<'a>(query: &mut QueryBuilder<'a, Sqlite>, filter: &'a ProductFilter) {
    if !filter.include_archived {
        query.push(" AND is_archived = 0");
    }

    if let Some(category) = filter.category.as_deref() {
        query.push(" AND category = ").push_bind(category);
    }

    push_search(query, &["name", "description"], filter.search.as_deref());
}

/// Generates a new product ID.
pub fn generate_product_id() -> String {
    Uuid::new_v4().to_string()
}
