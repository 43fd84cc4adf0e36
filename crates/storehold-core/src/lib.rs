//! # storehold-core: Pure Domain Logic for Storehold
//!
//! Everything the fulfillment engine decides without touching storage:
//! what a product costs right now, whether an order may change state, how a
//! receipt number is spelled, and which inputs are acceptable.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Storehold Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │          Callers (admin API, storefront API, scheduler)         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    storehold-engine                             │   │
//! │  │    ledger, orders, sales, receipts, reports, sweeper           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ storehold-core (THIS CRATE) ★                   │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │ discount  │  │ lifecycle │  │ numbering │  │   │
//! │  │   │  Product  │  │ effective │  │  PENDING  │  │ ORD-2026  │  │   │
//! │  │   │   Order   │  │  price    │  │  → PAID   │  │ 0207-0001 │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  storehold-db (Database Layer)                  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Products, orders, sales and the inputs/filters that act on them
//! - [`money`] - Integer money in the smallest currency unit
//! - [`discount`] - Discount descriptors, effective price, countdowns
//! - [`lifecycle`] - Order status transition rules
//! - [`calendar`] - Business-day arithmetic for numbering and filters
//! - [`numbering`] - Daily sequential order/receipt numbers
//! - [`clock`] - Injectable time source
//! - [`receipt`] - Renderer-independent receipt documents
//! - [`report`] - Report and dashboard shapes
//! - [`validation`] - Input validation rules
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use chrono::Utc;
//! use storehold_core::discount::{effective_price, Discount};
//! use storehold_core::{DiscountType, Money};
//!
//! let ten_percent = Discount::new(DiscountType::Percentage, 10);
//! let price = effective_price(Money::from_minor(18000), Some(&ten_percent), Utc::now());
//! assert_eq!(price.minor(), 16200);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod calendar;
pub mod clock;
pub mod discount;
pub mod error;
pub mod lifecycle;
pub mod money;
pub mod numbering;
pub mod receipt;
pub mod report;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use calendar::{BusinessCalendar, TimeRange};
pub use clock::{Clock, FixedClock, SystemClock};
pub use discount::{Discount, DiscountCountdown};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum quantity of a single line on an order or sale.
///
/// ## Business Reason
/// Catches fat-finger entries (1000 instead of 10) before they reserve or
/// deduct a whole shelf.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Maximum unit price (cost or selling) in minor units: ₦10,000,000,000.
///
/// With `MAX_ITEM_QUANTITY` and `MAX_LINE_ITEMS` this keeps every line
/// total, profit and order total well inside `i64`.
pub const MAX_PRICE: i64 = 1_000_000_000_000;

/// Maximum number of lines on a single order or sale.
pub const MAX_LINE_ITEMS: usize = 100;

/// Maximum media files attached to one product.
pub const MAX_PRODUCT_MEDIA: i64 = 3;

/// Available units at or below which a product is reported as low stock.
pub const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 5;

/// Hours a website order may stay unpaid before the sweeper cancels it.
pub const DEFAULT_ORDER_EXPIRY_HOURS: i64 = 24;

/// Prefix for website order numbers (`ORD-20260207-0001`).
pub const DEFAULT_ORDER_PREFIX: &str = "ORD";

/// Prefix for receipt numbers (`RCPT-20260207-0001`).
pub const DEFAULT_RECEIPT_PREFIX: &str = "RCPT";
