//! # Sale Recorder
//!
//! Immutable sales and their receipt numbers.
//!
//! ## Two Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  WALK_IN   counter checkout      ledger::deduct     price from caller   │
//! │  WEBSITE   OrderService paid     ledger::finalize   price_at_order      │
//! │                                                                         │
//! │  Both:  cost_price read from the product at sale time                   │
//! │         receipt number from the shared per-day RECEIPT sequence         │
//! │         profit = Σ (selling_price − cost_price) × quantity              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use std::collections::HashMap;
use tracing::{debug, info};
use uuid::Uuid;

use storehold_core::numbering::{format_sequence_number, SequenceScope};
use storehold_core::validation::{validate_line_count, validate_price, validate_quantity};
use storehold_core::{
    CoreError, Money, Order, Page, PaymentMethod, Sale, SaleFilter, SaleItem, SaleSource,
    WalkInLine,
};
use storehold_db::repository::{product, sale, sequence};

use crate::error::EngineResult;
use crate::ledger;
use crate::Engine;

// =============================================================================
// Transaction steps
// =============================================================================

/// Issues the next receipt number for the business day of `now`.
async fn next_receipt_number(
    conn: &mut SqliteConnection,
    engine: &Engine,
    now: DateTime<Utc>,
) -> EngineResult<String> {
    let day = engine.calendar().day_of(now);
    let seq = sequence::next_value(conn, SequenceScope::Receipt, day).await?;
    Ok(format_sequence_number(
        &engine.config().sales.receipt_prefix,
        day,
        seq,
    ))
}

/// Assembles a sale from its lines; totals and profit are derived here.
fn build_sale(
    sale_id: String,
    receipt_number: String,
    source: SaleSource,
    order_number: Option<String>,
    payment_method: PaymentMethod,
    items: Vec<SaleItem>,
    now: DateTime<Utc>,
) -> Sale {
    let total: Money = items.iter().map(SaleItem::line_total).sum();
    let profit: Money = items.iter().map(SaleItem::profit).sum();

    Sale {
        id: sale_id,
        receipt_number,
        source,
        order_number,
        payment_method,
        total_amount: total.minor(),
        profit: profit.minor(),
        created_at: now,
        items,
    }
}

/// Records the WEBSITE sale for an order whose PAID claim just succeeded.
///
/// Runs on the caller's transaction: finalizes each line, then inserts the
/// sale. Selling prices are the order's frozen snapshots.
pub(crate) async fn record_website_sale(
    conn: &mut SqliteConnection,
    engine: &Engine,
    order: &Order,
    payment_method: PaymentMethod,
    now: DateTime<Utc>,
) -> EngineResult<Sale> {
    let sale_id = Uuid::new_v4().to_string();
    let mut items = Vec::with_capacity(order.items.len());

    for line in &order.items {
        let current = product::fetch(conn, &line.product_id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(line.product_id.clone()))?;
        ledger::finalize(conn, &line.product_id, line.quantity, now).await?;

        items.push(SaleItem {
            id: Uuid::new_v4().to_string(),
            sale_id: sale_id.clone(),
            product_id: line.product_id.clone(),
            quantity: line.quantity,
            selling_price: line.price_at_order,
            cost_price: current.cost_price,
        });
    }

    let receipt_number = next_receipt_number(conn, engine, now).await?;
    let sale = build_sale(
        sale_id,
        receipt_number,
        SaleSource::Website,
        Some(order.order_number.clone()),
        payment_method,
        items,
        now,
    );

    sale::insert(conn, &sale).await?;
    debug!(
        order_number = %order.order_number,
        receipt_number = %sale.receipt_number,
        "Website sale recorded"
    );
    Ok(sale)
}

// =============================================================================
// Service
// =============================================================================

/// Sale operations. Obtain one through [`Engine::sales`].
#[derive(Debug, Clone, Copy)]
pub struct SaleService<'a> {
    engine: &'a Engine,
}

impl<'a> SaleService<'a> {
    pub(crate) fn new(engine: &'a Engine) -> Self {
        SaleService { engine }
    }

    /// Records an in-store sale and deducts its stock.
    ///
    /// Hidden products may be sold at the counter; archived ones may not.
    ///
    /// ## Errors
    /// - `EmptySale` when `lines` is empty
    /// - `Validation` for bad quantities or negative prices
    /// - `ProductNotFound` for missing or archived products
    /// - `InsufficientStock` when any product's combined demand exceeds
    ///   what is available; nothing is deducted in that case
    pub async fn record_walk_in(
        &self,
        payment_method: PaymentMethod,
        lines: Vec<WalkInLine>,
    ) -> EngineResult<Sale> {
        if lines.is_empty() {
            return Err(CoreError::EmptySale.into());
        }
        validate_line_count(lines.len())?;
        for line in &lines {
            validate_quantity(line.quantity)?;
            validate_price("selling price", line.selling_price)?;
        }

        let now = self.engine.now();
        let totals = ledger::aggregate(lines.iter().map(|l| (l.product_id.as_str(), l.quantity)));

        let mut tx = self.engine.db().begin_immediate().await?;

        let mut costs = HashMap::with_capacity(totals.len());
        for product_id in totals.keys() {
            let product = product::fetch(&mut tx, product_id)
                .await?
                .filter(|p| !p.is_archived)
                .ok_or_else(|| CoreError::ProductNotFound(product_id.clone()))?;
            costs.insert(product.id, product.cost_price);
        }

        ledger::assert_all(&mut tx, &totals).await?;

        let sale_id = Uuid::new_v4().to_string();
        let mut items = Vec::with_capacity(lines.len());
        for line in &lines {
            ledger::deduct(&mut tx, &line.product_id, line.quantity, now).await?;
            items.push(SaleItem {
                id: Uuid::new_v4().to_string(),
                sale_id: sale_id.clone(),
                product_id: line.product_id.clone(),
                quantity: line.quantity,
                selling_price: line.selling_price,
                cost_price: costs.get(&line.product_id).copied().unwrap_or_default(),
            });
        }

        let receipt_number = next_receipt_number(&mut tx, self.engine, now).await?;
        let sale = build_sale(
            sale_id,
            receipt_number,
            SaleSource::WalkIn,
            None,
            payment_method,
            items,
            now,
        );

        sale::insert(&mut tx, &sale).await?;
        tx.commit().await?;

        info!(
            receipt_number = %sale.receipt_number,
            payment_method = %sale.payment_method,
            total = %sale.total(),
            "Walk-in sale recorded"
        );

        self.engine.dispatch_receipt(&sale);
        Ok(sale)
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub async fn get(&self, sale_id: &str) -> EngineResult<Sale> {
        self.engine
            .db()
            .sales()
            .get_by_id(sale_id)
            .await?
            .ok_or_else(|| CoreError::SaleNotFound(sale_id.to_string()).into())
    }

    pub async fn get_by_receipt_number(&self, receipt_number: &str) -> EngineResult<Sale> {
        self.engine
            .db()
            .sales()
            .get_by_receipt_number(receipt_number)
            .await?
            .ok_or_else(|| CoreError::SaleNotFound(receipt_number.to_string()).into())
    }

    /// The sale created when the given order was paid.
    pub async fn get_by_order_number(&self, order_number: &str) -> EngineResult<Sale> {
        self.engine
            .db()
            .sales()
            .get_by_order_number(order_number)
            .await?
            .ok_or_else(|| CoreError::SaleNotFound(order_number.to_string()).into())
    }

    /// Newest first. Date filters are interpreted as business days.
    pub async fn list(&self, filter: &SaleFilter) -> EngineResult<Page<Sale>> {
        let range = self
            .engine
            .calendar()
            .resolve(&filter.dates, self.engine.now())?;
        let page = filter.page.normalized();

        let (items, total) = self.engine.db().sales().list(filter, range).await?;
        debug!(total, page = page.page, "Listed sales");

        Ok(Page {
            items,
            total,
            page: page.page,
            limit: page.limit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn item(selling_price: i64, cost_price: i64, quantity: i64) -> SaleItem {
        SaleItem {
            id: Uuid::new_v4().to_string(),
            sale_id: "s-1".into(),
            product_id: "p-1".into(),
            quantity,
            selling_price,
            cost_price,
        }
    }

    #[test]
    fn test_build_sale_totals_and_profit() {
        let now = Utc.with_ymd_and_hms(2026, 2, 7, 9, 0, 0).unwrap();
        let sale = build_sale(
            "s-1".into(),
            "RCPT-20260207-0001".into(),
            SaleSource::WalkIn,
            None,
            PaymentMethod::Cash,
            vec![item(18000, 12000, 2), item(5000, 6000, 1)],
            now,
        );

        assert_eq!(sale.total_amount, 41000);
        // 2 × 6000 − 1000 sold below cost
        assert_eq!(sale.profit, 11000);
        assert_eq!(sale.created_at, now);
    }
}
