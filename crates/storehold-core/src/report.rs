//! # Report Shapes
//!
//! Financial summaries built from the immutable sales ledger. Aggregation
//! happens in SQL; this module defines the shapes and the margin math.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Which window a report covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportPeriod {
    /// Today.
    Daily,
    /// The last 7 business days, today included.
    Weekly,
    /// The current calendar month.
    Monthly,
    /// Caller-supplied inclusive date range.
    Custom,
}

/// Revenue/profit/count totals for a slice of sales.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SalesTotals {
    pub revenue: i64,
    pub profit: i64,
    pub transactions: i64,
}

/// Totals for one group (a source, a payment method or a category).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct BreakdownRow {
    pub key: String,
    pub revenue: i64,
    pub profit: i64,
    pub transactions: i64,
}

/// A period summary.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SalesReport {
    pub period: ReportPeriod,
    #[ts(as = "String")]
    pub from: DateTime<Utc>,
    /// Exclusive upper bound.
    #[ts(as = "String")]
    pub until: DateTime<Utc>,
    pub revenue: i64,
    pub profit: i64,
    /// Profit as a share of revenue in basis points (2500 = 25.00%).
    pub margin_bps: i64,
    pub transactions: i64,
    pub by_source: Vec<BreakdownRow>,
    pub by_payment_method: Vec<BreakdownRow>,
    pub by_category: Vec<BreakdownRow>,
}

/// A product whose available units are at or below the low-stock threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct LowStockItem {
    pub product_id: String,
    pub name: String,
    pub category: String,
    pub quantity: i64,
    pub reserved_quantity: i64,
    pub available: i64,
}

/// What the admin dashboard shows at a glance.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DashboardSnapshot {
    #[ts(as = "String")]
    pub generated_at: DateTime<Utc>,
    pub today: SalesTotals,
    pub pending_orders: i64,
    pub low_stock: Vec<LowStockItem>,
}

/// `profit / revenue` in basis points, rounded half away from zero.
/// Zero revenue yields zero.
///
/// ## Example
/// ```rust
/// use storehold_core::report::margin_bps;
///
/// assert_eq!(margin_bps(12000, 36000), 3333);
/// assert_eq!(margin_bps(500, 0), 0);
/// ```
pub fn margin_bps(profit: i64, revenue: i64) -> i64 {
    if revenue <= 0 {
        return 0;
    }
    let scaled = profit as i128 * 10_000;
    let revenue = revenue as i128;
    let rounded = if scaled >= 0 {
        (scaled + revenue / 2) / revenue
    } else {
        (scaled - revenue / 2) / revenue
    };
    rounded as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_margin_bps() {
        assert_eq!(margin_bps(12000, 36000), 3333);
        assert_eq!(margin_bps(1, 3), 3333);
        assert_eq!(margin_bps(2, 3), 6667);
        assert_eq!(margin_bps(-2000, 10000), -2000);
        assert_eq!(margin_bps(0, 0), 0);
    }
}
