//! # Order State Machine
//!
//! Website orders from checkout to a terminal state.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Order Lifecycle                                  │
//! │                                                                         │
//! │  create ──► PENDING_PAYMENT ──── mark_paid ────► PAID                   │
//! │   │              │                  │                                   │
//! │   │              │                  ├─ finalize every line              │
//! │   │              │                  ├─ insert WEBSITE sale              │
//! │   │              │                  └─ (after commit) dispatch receipt  │
//! │   │              │                                                      │
//! │   │              └──── cancel / sweep ──► CANCELLED                     │
//! │   │                          │                                          │
//! │   │                          └─ release every line                      │
//! │   │                                                                     │
//! │   └─ assert all lines, reserve all lines, snapshot prices               │
//! │                                                                         │
//! │  Each arrow is one BEGIN IMMEDIATE transaction. The status claim is a  │
//! │  guarded UPDATE, so two racing callers cannot both win.                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;
use tracing::{debug, info, warn};
use uuid::Uuid;

use storehold_core::lifecycle::ensure_transition;
use storehold_core::numbering::{format_sequence_number, SequenceScope};
use storehold_core::validation::{validate_customer, validate_line_count, validate_quantity};
use storehold_core::{
    CancelReason, CoreError, CustomerContact, Money, Order, OrderFilter, OrderItem, OrderLine,
    OrderStatus, Page, PaymentMethod,
};
use storehold_db::repository::{order, product, sequence};

use crate::error::EngineResult;
use crate::ledger;
use crate::sales;
use crate::Engine;

/// Order operations. Obtain one through [`Engine::orders`].
#[derive(Debug, Clone, Copy)]
pub struct OrderService<'a> {
    engine: &'a Engine,
}

impl<'a> OrderService<'a> {
    pub(crate) fn new(engine: &'a Engine) -> Self {
        OrderService { engine }
    }

    // =========================================================================
    // Create
    // =========================================================================

    /// Places a website order and reserves its stock.
    ///
    /// ## Errors
    /// - `EmptyOrder` when `lines` is empty
    /// - `Validation` for bad quantities or contact details
    /// - `ProductNotFound` for missing, archived or hidden products
    /// - `InsufficientStock` when any product's combined demand exceeds
    ///   what is available; nothing is reserved in that case
    pub async fn create(
        &self,
        customer: CustomerContact,
        lines: Vec<OrderLine>,
    ) -> EngineResult<Order> {
        if lines.is_empty() {
            return Err(CoreError::EmptyOrder.into());
        }
        validate_line_count(lines.len())?;
        for line in &lines {
            validate_quantity(line.quantity)?;
        }
        validate_customer(&customer)?;

        let now = self.engine.now();
        let totals = ledger::aggregate(lines.iter().map(|l| (l.product_id.as_str(), l.quantity)));

        let mut tx = self.engine.db().begin_immediate().await?;

        let mut prices = HashMap::with_capacity(totals.len());
        for product_id in totals.keys() {
            let product = product::fetch(&mut tx, product_id)
                .await?
                .filter(|p| p.is_purchasable_online())
                .ok_or_else(|| CoreError::ProductNotFound(product_id.clone()))?;
            prices.insert(product.id.clone(), product.effective_price(now));
        }

        ledger::assert_all(&mut tx, &totals).await?;
        for (product_id, qty) in &totals {
            ledger::reserve(&mut tx, product_id, *qty, now).await?;
        }

        let day = self.engine.calendar().day_of(now);
        let seq = sequence::next_value(&mut tx, SequenceScope::Order, day).await?;
        let order_number =
            format_sequence_number(&self.engine.config().orders.number_prefix, day, seq);

        let order_id = Uuid::new_v4().to_string();
        let items: Vec<OrderItem> = lines
            .iter()
            .map(|line| {
                let price = prices.get(&line.product_id).copied().unwrap_or_default();
                OrderItem {
                    id: Uuid::new_v4().to_string(),
                    order_id: order_id.clone(),
                    product_id: line.product_id.clone(),
                    quantity: line.quantity,
                    price_at_order: price.minor(),
                }
            })
            .collect();
        let total: Money = items.iter().map(OrderItem::line_total).sum();

        let order = Order {
            id: order_id,
            order_number,
            customer_name: customer.name.trim().to_string(),
            customer_phone: customer.phone.trim().to_string(),
            customer_email: non_blank(customer.email),
            delivery_address: non_blank(customer.address),
            total_amount: total.minor(),
            status: OrderStatus::PendingPayment,
            cancel_reason: None,
            created_at: now,
            updated_at: now,
            paid_at: None,
            cancelled_at: None,
            items,
        };

        order::insert(&mut tx, &order).await?;
        tx.commit().await?;

        info!(
            order_number = %order.order_number,
            items = order.items.len(),
            total = %order.total(),
            "Order created"
        );
        Ok(order)
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// Routes a requested status change to the matching transition.
    ///
    /// `PENDING_PAYMENT` is never a valid target.
    pub async fn set_status(&self, order_id: &str, target: OrderStatus) -> EngineResult<Order> {
        match target {
            OrderStatus::Paid => self.mark_paid(order_id, None).await,
            OrderStatus::Cancelled => self.cancel(order_id).await,
            OrderStatus::PendingPayment => {
                let order = self.get(order_id).await?;
                Err(CoreError::InvalidTransition {
                    order_id: order.id,
                    from: order.status,
                    to: target,
                }
                .into())
            }
        }
    }

    /// Cancels a pending order by hand and releases its reservations.
    pub async fn cancel(&self, order_id: &str) -> EngineResult<Order> {
        self.cancel_with_reason(order_id, CancelReason::Manual).await
    }

    /// The cancellation path shared with the expiry sweep.
    pub(crate) async fn cancel_with_reason(
        &self,
        order_id: &str,
        reason: CancelReason,
    ) -> EngineResult<Order> {
        let now = self.engine.now();
        let mut tx = self.engine.db().begin_immediate().await?;

        let current = order::fetch(&mut tx, order_id)
            .await?
            .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()))?;
        ensure_transition(order_id, current.status, OrderStatus::Cancelled)?;

        if !order::claim_cancelled(&mut tx, order_id, reason, now).await? {
            return Err(lost_claim(&current, OrderStatus::Cancelled).into());
        }

        for item in &current.items {
            ledger::release(&mut tx, &item.product_id, item.quantity, now).await?;
        }

        let cancelled = order::fetch(&mut tx, order_id)
            .await?
            .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()))?;
        tx.commit().await?;

        match reason {
            CancelReason::Expired => warn!(
                order_number = %cancelled.order_number,
                created_at = %cancelled.created_at,
                "Order expired, reservations released"
            ),
            CancelReason::Manual => info!(
                order_number = %cancelled.order_number,
                "Order cancelled"
            ),
        }
        Ok(cancelled)
    }

    /// Confirms payment: finalizes stock and records the website sale.
    ///
    /// `method` defaults to the configured website payment method. The
    /// receipt is dispatched only after the transaction commits.
    pub async fn mark_paid(
        &self,
        order_id: &str,
        method: Option<PaymentMethod>,
    ) -> EngineResult<Order> {
        let now = self.engine.now();
        let method = method.unwrap_or(self.engine.config().sales.default_website_payment);
        let mut tx = self.engine.db().begin_immediate().await?;

        let current = order::fetch(&mut tx, order_id)
            .await?
            .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()))?;
        ensure_transition(order_id, current.status, OrderStatus::Paid)?;

        if !order::claim_paid(&mut tx, order_id, now).await? {
            return Err(lost_claim(&current, OrderStatus::Paid).into());
        }

        let sale = sales::record_website_sale(&mut tx, self.engine, &current, method, now).await?;

        let paid = order::fetch(&mut tx, order_id)
            .await?
            .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()))?;
        tx.commit().await?;

        info!(
            order_number = %paid.order_number,
            receipt_number = %sale.receipt_number,
            total = %sale.total(),
            profit = %Money::from_minor(sale.profit),
            "Order paid"
        );

        self.engine.dispatch_receipt(&sale);
        Ok(paid)
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub async fn get(&self, order_id: &str) -> EngineResult<Order> {
        self.engine
            .db()
            .orders()
            .get_by_id(order_id)
            .await?
            .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()).into())
    }

    pub async fn get_by_number(&self, order_number: &str) -> EngineResult<Order> {
        self.engine
            .db()
            .orders()
            .get_by_number(order_number)
            .await?
            .ok_or_else(|| CoreError::OrderNotFound(order_number.to_string()).into())
    }

    /// Newest first. Date filters are interpreted as business days.
    pub async fn list(&self, filter: &OrderFilter) -> EngineResult<Page<Order>> {
        let range = self
            .engine
            .calendar()
            .resolve(&filter.dates, self.engine.now())?;
        let page = filter.page.normalized();

        let (items, total) = self.engine.db().orders().list(filter, range).await?;
        debug!(total, page = page.page, "Listed orders");

        Ok(Page {
            items,
            total,
            page: page.page,
            limit: page.limit,
        })
    }
}

/// The order was pending when read but another writer claimed it first.
fn lost_claim(current: &Order, target: OrderStatus) -> CoreError {
    CoreError::InvalidTransition {
        order_id: current.id.clone(),
        from: current.status,
        to: target,
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(None), None);
        assert_eq!(non_blank(Some("   ".into())), None);
        assert_eq!(non_blank(Some(" 12 Allen Ave ".into())), Some("12 Allen Ave".into()));
    }
}
