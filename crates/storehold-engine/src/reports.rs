//! # Reports
//!
//! Period summaries and the dashboard snapshot, computed from the sales
//! ledger. Every window is expressed in business days and evaluated against
//! the engine's clock.

use chrono::NaiveDate;
use tracing::debug;

use storehold_core::report::{margin_bps, DashboardSnapshot, ReportPeriod, SalesReport};
use storehold_core::TimeRange;

use crate::error::EngineResult;
use crate::Engine;

/// Report operations. Obtain one through [`Engine::reports`].
#[derive(Debug, Clone, Copy)]
pub struct ReportService<'a> {
    engine: &'a Engine,
}

impl<'a> ReportService<'a> {
    pub(crate) fn new(engine: &'a Engine) -> Self {
        ReportService { engine }
    }

    /// Today so far.
    pub async fn daily(&self) -> EngineResult<SalesReport> {
        let range = self.engine.calendar().today_bounds(self.engine.now());
        self.build(ReportPeriod::Daily, range).await
    }

    /// The last 7 business days, today included.
    pub async fn weekly(&self) -> EngineResult<SalesReport> {
        let range = self.engine.calendar().trailing_days(self.engine.now(), 7);
        self.build(ReportPeriod::Weekly, range).await
    }

    /// The current calendar month.
    pub async fn monthly(&self) -> EngineResult<SalesReport> {
        let range = self.engine.calendar().month_bounds(self.engine.now());
        self.build(ReportPeriod::Monthly, range).await
    }

    /// An inclusive range of business days.
    pub async fn custom(&self, start: NaiveDate, end: NaiveDate) -> EngineResult<SalesReport> {
        let range = self.engine.calendar().range_bounds(start, end)?;
        self.build(ReportPeriod::Custom, range).await
    }

    /// Today's totals, pending orders and low-stock products.
    pub async fn dashboard(&self) -> EngineResult<DashboardSnapshot> {
        let now = self.engine.now();
        let db = self.engine.db();
        let today = self.engine.calendar().today_bounds(now);
        let threshold = self.engine.config().catalog.low_stock_threshold;

        let snapshot = DashboardSnapshot {
            generated_at: now,
            today: db.reports().totals(today).await?,
            pending_orders: db.orders().count_pending().await?,
            low_stock: db.reports().low_stock(threshold).await?,
        };

        debug!(
            pending = snapshot.pending_orders,
            low_stock = snapshot.low_stock.len(),
            "Dashboard computed"
        );
        Ok(snapshot)
    }

    async fn build(&self, period: ReportPeriod, range: TimeRange) -> EngineResult<SalesReport> {
        let reports = self.engine.db().reports();
        let totals = reports.totals(range).await?;

        let report = SalesReport {
            period,
            from: range.from.unwrap_or_default(),
            until: range.until.unwrap_or_default(),
            revenue: totals.revenue,
            profit: totals.profit,
            margin_bps: margin_bps(totals.profit, totals.revenue),
            transactions: totals.transactions,
            by_source: reports.by_source(range).await?,
            by_payment_method: reports.by_payment_method(range).await?,
            by_category: reports.by_category(range).await?,
        };

        debug!(
            ?period,
            revenue = report.revenue,
            transactions = report.transactions,
            "Report computed"
        );
        Ok(report)
    }
}
