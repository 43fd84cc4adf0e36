//! # Repository Module
//!
//! Database repository implementations for Storehold.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Each module exposes two layers:                                        │
//! │                                                                         │
//! │  free functions  fn(&mut SqliteConnection, ..)                          │
//! │       │          composable inside one BEGIN IMMEDIATE transaction      │
//! │       │                                                                 │
//! │  XxxRepository   holds a SqlitePool, acquires a connection per call    │
//! │                  and delegates to the free functions for reads          │
//! │                                                                         │
//! │  Engine services own the transaction boundaries; repositories never    │
//! │  commit on their own except for single-statement calls.                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - Catalog reads, media, archive guard
//! - [`StockRepository`](stock::StockRepository) - Conditional stock deltas
//! - [`OrderRepository`](order::OrderRepository) - Orders and order items
//! - [`SaleRepository`](sale::SaleRepository) - Immutable sales ledger
//! - [`SequenceRepository`](sequence::SequenceRepository) - Daily counters
//! - [`ReportRepository`](report::ReportRepository) - Ledger aggregations

pub mod order;
pub mod product;
pub mod report;
pub mod sale;
pub mod sequence;
pub mod stock;

use sqlx::{QueryBuilder, Sqlite};
use storehold_core::TimeRange;

/// Appends `AND column >= from AND column < until` for the bounded ends.
pub(crate) fn push_time_range(query: &mut QueryBuilder<'_, Sqlite>, column: &str, range: TimeRange) {
    if let Some(from) = range.from {
        query.push(format!(" AND {column} >= ")).push_bind(from);
    }
    if let Some(until) = range.until {
        query.push(format!(" AND {column} < ")).push_bind(until);
    }
}

/// `%text%` with LIKE wildcards in `text` escaped by `\`.
pub(crate) fn like_pattern(text: &str) -> String {
    let mut pattern = String::with_capacity(text.len() + 2);
    pattern.push('%');
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Appends `AND (col LIKE ? OR ...)` matching `search` literally in any of
/// `columns`. Blank searches add nothing.
pub(crate) fn push_search(
    query: &mut QueryBuilder<'_, Sqlite>,
    columns: &[&str],
    search: Option<&str>,
) {
    let Some(search) = search.map(str::trim).filter(|s| !s.is_empty()) else {
        return;
    };
    let pattern = like_pattern(search);

    query.push(" AND (");
    for (i, column) in columns.iter().enumerate() {
        if i > 0 {
            query.push(" OR ");
        }
        query
            .push(format!("{column} LIKE "))
            .push_bind(pattern.clone())
            .push(r" ESCAPE '\'");
    }
    query.push(")");
}


#[cfg(test)]
pub(crate) mod testing {
    use chrono::{DateTime, Utc};
    use storehold_core::Product;

    use crate::{Database, DbConfig};

    pub async fn memory_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    pub fn product(id: &str, quantity: i64, created_at: DateTime<Utc>) -> Product {
        Product {
            id: id.to_string(),
            name: format!("Product {id}"),
            description: Some("Eau de parfum".into()),
            category: "PERFUMES".into(),
            cost_price: 12000,
            selling_price: 18000,
            quantity,
            reserved_quantity: 0,
            discount_type: None,
            discount_value: None,
            discount_start_at: None,
            discount_end_at: None,
            visible_on_website: true,
            is_archived: false,
            archived_at: None,
            created_at,
            updated_at: created_at,
        }
    }

    pub async fn insert_product(db: &Database, id: &str, quantity: i64) {
        let mut conn = db.pool().acquire().await.unwrap();
        crate::repository::product::insert(&mut conn, &product(id, quantity, Utc::now()))
            .await
            .unwrap();
    }
}
