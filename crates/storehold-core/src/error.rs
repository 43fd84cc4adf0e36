//! # Error Types
//!
//! Domain-specific error types for storehold-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  storehold-core errors (this file)                                     │
//! │  ├── CoreError        - Business rule and lookup failures              │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  storehold-db errors (separate crate)                                  │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  storehold-engine errors                                               │
//! │  └── EngineError      - What callers see, with an ErrorKind            │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError ─┐                                  │
//! │                          DbError ───┴─► EngineError → caller           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::types::OrderStatus;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations and lookups that came back empty.
///
/// Every variant is raised before a mutation happens, or inside a
/// transaction that is then rolled back, so the caller never sees a
/// half-applied change.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product cannot be found.
    ///
    /// ## When This Occurs
    /// - Product ID doesn't exist
    /// - Product is archived
    /// - Website checkout for a product hidden from the website
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Order cannot be found by id or order number.
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    /// Sale cannot be found by id or order number.
    #[error("Sale not found: {0}")]
    SaleNotFound(String),

    /// Requested quantity exceeds what is available to sell.
    ///
    /// ## When This Occurs
    /// - Website checkout asks for more than `quantity - reserved_quantity`
    /// - Walk-in sale asks for more than is available
    /// - A conditional stock update lost a race to a concurrent request
    ///
    /// ## User Workflow
    /// ```text
    /// Checkout (qty: 5)
    ///      │
    ///      ▼
    /// Check stock: available=3
    ///      │
    ///      ▼
    /// InsufficientStock { product_id, available: 3, requested: 5 }
    ///      │
    ///      ▼
    /// Storefront shows: "Only 3 left"
    /// ```
    #[error("Insufficient stock for {product_id}: only {available} left, requested {requested}")]
    InsufficientStock {
        product_id: String,
        available: i64,
        requested: i64,
    },

    /// Order status change not permitted from its current state.
    ///
    /// ## When This Occurs
    /// - Paying or cancelling an order that is already PAID or CANCELLED
    /// - Requesting PENDING_PAYMENT as a target
    #[error("Order {order_id} cannot move from {from} to {to}")]
    InvalidTransition {
        order_id: String,
        from: OrderStatus,
        to: OrderStatus,
    },

    /// Website checkout without any lines.
    #[error("Order must contain at least one item")]
    EmptyOrder,

    /// Walk-in checkout without any lines.
    #[error("Sale must contain at least one item")]
    EmptySale,

    /// Archiving a product that a pending order still references.
    #[error("Cannot archive product {0} with pending orders")]
    ArchiveBlocked(String),

    /// Product already carries the maximum number of media files.
    #[error("Product {product_id} already has the maximum of {max} media files")]
    MediaLimitReached { product_id: String, max: i64 },

    /// Item quantity exceeds maximum allowed.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Shorthand for an insufficient stock error.
    pub fn insufficient(product_id: impl Into<String>, available: i64, requested: i64) -> Self {
        CoreError::InsufficientStock {
            product_id: product_id.into(),
            available: available.max(0),
            requested,
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised by [`crate::validation`] and by discount/filter parsing before any
/// storage work starts.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must be zero or greater.
    #[error("{field} must not be negative")]
    Negative { field: String },

    /// Invalid format (e.g., malformed phone number).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Fields that only make sense together disagree with each other.
    ///
    /// ## When This Occurs
    /// - Discount type without a value (or the reverse)
    /// - Discount window ending before it starts
    /// - Date filter whose start is after its end
    #[error("{field} is inconsistent: {reason}")]
    Inconsistent { field: String, reason: String },
}

impl ValidationError {
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }

    pub fn inconsistent(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::Inconsistent {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            product_id: "p-1".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for p-1: only 3 left, requested 5"
        );

        let err = CoreError::InvalidTransition {
            order_id: "o-1".to_string(),
            from: OrderStatus::Paid,
            to: OrderStatus::Cancelled,
        };
        assert_eq!(err.to_string(), "Order o-1 cannot move from PAID to CANCELLED");
    }

    #[test]
    fn test_insufficient_floors_available() {
        let err = CoreError::insufficient("p-1", -2, 1);
        assert!(matches!(
            err,
            CoreError::InsufficientStock { available: 0, .. }
        ));
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let core_err: CoreError = ValidationError::required("customer name").into();
        assert!(matches!(core_err, CoreError::Validation(_)));
        assert_eq!(core_err.to_string(), "Validation error: customer name is required");
    }
}
