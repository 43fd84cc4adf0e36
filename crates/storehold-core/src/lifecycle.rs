//! # Order Lifecycle
//!
//! Which status changes an order may make.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │                      ┌── mark paid ──► PAID        (terminal)           │
//! │  PENDING_PAYMENT ────┤                                                  │
//! │                      └── cancel / ───► CANCELLED   (terminal)           │
//! │                          expire                                         │
//! │                                                                         │
//! │  Anything else ──► InvalidTransition                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The engine checks these rules before touching stock, and repeats the
//! check in SQL (`WHERE status = 'PENDING_PAYMENT'`) when claiming the order
//! inside its transaction.

use crate::error::{CoreError, CoreResult};
use crate::types::OrderStatus;

impl OrderStatus {
    /// PAID and CANCELLED never change again.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, OrderStatus::PendingPayment)
    }

    /// Whether `self → target` is a legal transition.
    #[inline]
    pub fn can_transition_to(&self, target: OrderStatus) -> bool {
        matches!(
            (self, target),
            (OrderStatus::PendingPayment, OrderStatus::Paid)
                | (OrderStatus::PendingPayment, OrderStatus::Cancelled)
        )
    }
}

/// Returns `InvalidTransition` unless `from → to` is legal.
pub fn ensure_transition(order_id: &str, from: OrderStatus, to: OrderStatus) -> CoreResult<()> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(CoreError::InvalidTransition {
            order_id: order_id.to_string(),
            from,
            to,
        })
    }
}
