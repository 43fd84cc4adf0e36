//! # Domain Types
//!
//! Core domain types used throughout Storehold.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌──────────────────┐   ┌──────────────────┐   ┌──────────────────┐    │
//! │  │     Product      │   │      Order       │   │       Sale       │    │
//! │  │  ──────────────  │   │  ──────────────  │   │  ──────────────  │    │
//! │  │  cost_price      │   │  order_number    │   │  receipt_number  │    │
//! │  │  selling_price   │   │  status          │   │  source          │    │
//! │  │  quantity        │   │  total_amount    │   │  total_amount    │    │
//! │  │  reserved_qty    │   │  items ──┐       │   │  profit          │    │
//! │  │  discount_*      │   └──────────┼───────┘   │  items ──┐       │    │
//! │  └──────────────────┘              ▼           └──────────┼───────┘    │
//! │                           ┌──────────────────┐            ▼            │
//! │                           │    OrderItem     │  ┌──────────────────┐   │
//! │                           │  price_at_order  │  │     SaleItem     │   │
//! │                           └──────────────────┘  │  selling/cost    │   │
//! │                                                 └──────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Rule
//! `OrderItem.price_at_order`, `SaleItem.selling_price` and
//! `SaleItem.cost_price` are copied at creation time. Later price or
//! discount changes on the product never reach them.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::discount::{self, Discount, DiscountCountdown};
use crate::money::Money;

// =============================================================================
// Discount Type
// =============================================================================

/// How a discount value is applied to a base price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscountType {
    /// `value` is a whole percentage (10 = 10%).
    Percentage,
    /// `value` is an amount in the smallest currency unit.
    Fixed,
}

// =============================================================================
// Product
// =============================================================================

/// A product in the catalog, with its live stock counters.
///
/// `quantity` and `reserved_quantity` are only ever changed by conditional
/// delta updates in the database; this struct is a snapshot of them.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    pub name: String,

    pub description: Option<String>,

    /// Category code (e.g. `PERFUMES`).
    pub category: String,

    /// What the store paid per unit.
    pub cost_price: i64,

    /// Undiscounted shelf price per unit.
    pub selling_price: i64,

    /// Units on hand.
    pub quantity: i64,

    /// Units promised to pending website orders.
    pub reserved_quantity: i64,

    pub discount_type: Option<DiscountType>,

    pub discount_value: Option<i64>,

    #[ts(as = "Option<String>")]
    pub discount_start_at: Option<DateTime<Utc>>,

    #[ts(as = "Option<String>")]
    pub discount_end_at: Option<DateTime<Utc>>,

    /// Whether the storefront lists this product.
    pub visible_on_website: bool,

    /// Soft delete flag.
    pub is_archived: bool,

    #[ts(as = "Option<String>")]
    pub archived_at: Option<DateTime<Utc>>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Units that can still be promised or sold.
    #[inline]
    pub fn available(&self) -> i64 {
        (self.quantity - self.reserved_quantity).max(0)
    }

    #[inline]
    pub fn price(&self) -> Money {
        Money::from_minor(self.selling_price)
    }

    #[inline]
    pub fn cost(&self) -> Money {
        Money::from_minor(self.cost_price)
    }

    /// The discount descriptor, when both type and value are set.
    pub fn discount(&self) -> Option<Discount> {
        match (self.discount_type, self.discount_value) {
            (Some(kind), Some(value)) => Some(Discount {
                kind,
                value,
                start_at: self.discount_start_at,
                end_at: self.discount_end_at,
            }),
            _ => None,
        }
    }

    /// Price a customer pays at `now`.
    pub fn effective_price(&self, now: DateTime<Utc>) -> Money {
        discount::effective_price(self.price(), self.discount().as_ref(), now)
    }

    /// Countdown metadata for the storefront badge.
    pub fn countdown(&self, now: DateTime<Utc>) -> DiscountCountdown {
        discount::discount_countdown(self.discount_start_at, self.discount_end_at, now)
    }

    /// Whether website checkout may reserve this product.
    #[inline]
    pub fn is_purchasable_online(&self) -> bool {
        self.visible_on_website && !self.is_archived
    }
}

/// Input for creating a product.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub cost_price: i64,
    pub selling_price: i64,
    pub quantity: i64,
    pub discount: Option<Discount>,
    #[serde(default = "default_visible")]
    pub visible_on_website: bool,
}

fn default_visible() -> bool {
    true
}

/// Price change for an existing product. `discount: None` clears it.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PricingUpdate {
    pub cost_price: i64,
    pub selling_price: i64,
    pub discount: Option<Discount>,
}

/// The stock counters of one product, as returned by ledger updates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct StockLevel {
    pub product_id: String,
    pub quantity: i64,
    pub reserved_quantity: i64,
}

impl StockLevel {
    #[inline]
    pub fn available(&self) -> i64 {
        (self.quantity - self.reserved_quantity).max(0)
    }
}

/// Product as listed on the storefront at a given instant.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StorefrontProduct {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub selling_price: i64,
    pub effective_price: i64,
    pub available: i64,
    pub discount: Option<Discount>,
    pub countdown: DiscountCountdown,
}

impl StorefrontProduct {
    pub fn from_product(product: &Product, now: DateTime<Utc>) -> Self {
        StorefrontProduct {
            id: product.id.clone(),
            name: product.name.clone(),
            description: product.description.clone(),
            category: product.category.clone(),
            selling_price: product.selling_price,
            effective_price: product.effective_price(now).minor(),
            available: product.available(),
            discount: product.discount(),
            countdown: product.countdown(now),
        }
    }
}

/// Kind of media attached to a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MediaKind {
    Image,
    Video,
}

/// A media file reference attached to a product. Storage lives elsewhere.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ProductMedia {
    pub id: String,
    pub product_id: String,
    pub url: String,
    pub kind: MediaKind,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Order Status
// =============================================================================

/// Lifecycle state of a website order.
///
/// ```text
///                 ┌──────────► PAID
/// PENDING_PAYMENT ┤
///                 └──────────► CANCELLED
/// ```
/// Transition rules live in [`crate::lifecycle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    PendingPayment,
    Paid,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::PendingPayment => "PENDING_PAYMENT",
            OrderStatus::Paid => "PAID",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::PendingPayment
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why an order ended up CANCELLED.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CancelReason {
    /// An admin cancelled it.
    Manual,
    /// The expiry sweeper cancelled it.
    Expired,
}

// =============================================================================
// Order
// =============================================================================

/// Customer details captured at website checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CustomerContact {
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub address: Option<String>,
}

impl CustomerContact {
    pub fn new(name: impl Into<String>, phone: impl Into<String>) -> Self {
        CustomerContact {
            name: name.into(),
            phone: phone.into(),
            email: None,
            address: None,
        }
    }
}

/// One requested line of a website checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderLine {
    pub product_id: String,
    pub quantity: i64,
}

impl OrderLine {
    pub fn new(product_id: impl Into<String>, quantity: i64) -> Self {
        OrderLine {
            product_id: product_id.into(),
            quantity,
        }
    }
}

/// A website order.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Order {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Human-readable per-day number (`ORD-20260207-0001`).
    pub order_number: String,

    pub customer_name: String,

    pub customer_phone: String,

    pub customer_email: Option<String>,

    pub delivery_address: Option<String>,

    /// Sum of `price_at_order × quantity` over all items.
    pub total_amount: i64,

    pub status: OrderStatus,

    pub cancel_reason: Option<CancelReason>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,

    #[ts(as = "Option<String>")]
    pub paid_at: Option<DateTime<Utc>>,

    #[ts(as = "Option<String>")]
    pub cancelled_at: Option<DateTime<Utc>>,

    /// Lines of the order (loaded separately from `order_items`).
    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    #[serde(default)]
    pub items: Vec<OrderItem>,
}

impl Order {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_minor(self.total_amount)
    }
}

/// Frozen snapshot of one order line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct OrderItem {
    pub id: String,
    pub order_id: String,
    pub product_id: String,
    pub quantity: i64,
    /// Effective unit price at the moment the order was created.
    pub price_at_order: i64,
}

impl OrderItem {
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_minor(self.price_at_order).times(self.quantity)
    }
}

// =============================================================================
// Sale Source & Payment Method
// =============================================================================

/// Where a sale came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SaleSource {
    /// In-person checkout at the counter.
    WalkIn,
    /// A website order that was marked paid.
    Website,
}

impl SaleSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            SaleSource::WalkIn => "WALK_IN",
            SaleSource::Website => "WEBSITE",
        }
    }
}

impl fmt::Display for SaleSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the customer paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Cash,
    /// Bank transfer (the default for website orders).
    Transfer,
    /// Card on a POS terminal.
    Pos,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "CASH",
            PaymentMethod::Transfer => "TRANSFER",
            PaymentMethod::Pos => "POS",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CASH" => Ok(PaymentMethod::Cash),
            "TRANSFER" => Ok(PaymentMethod::Transfer),
            "POS" => Ok(PaymentMethod::Pos),
            other => Err(format!("unknown payment method: {}", other)),
        }
    }
}

// =============================================================================
// Sale
// =============================================================================

/// One requested line of a walk-in checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct WalkInLine {
    pub product_id: String,
    pub quantity: i64,
    /// Unit price agreed at the counter.
    pub selling_price: i64,
}

impl WalkInLine {
    pub fn new(product_id: impl Into<String>, quantity: i64, selling_price: i64) -> Self {
        WalkInLine {
            product_id: product_id.into(),
            quantity,
            selling_price,
        }
    }
}

/// An immutable financial record of a completed sale.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Sale {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Human-readable per-day number (`RCPT-20260207-0001`).
    pub receipt_number: String,

    pub source: SaleSource,

    /// Set for WEBSITE sales only.
    pub order_number: Option<String>,

    pub payment_method: PaymentMethod,

    pub total_amount: i64,

    /// `Σ (selling_price − cost_price) × quantity`.
    pub profit: i64,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    #[serde(default)]
    pub items: Vec<SaleItem>,
}

impl Sale {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_minor(self.total_amount)
    }
}

/// Frozen snapshot of one sale line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,
    pub quantity: i64,
    pub selling_price: i64,
    pub cost_price: i64,
}

impl SaleItem {
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_minor(self.selling_price).times(self.quantity)
    }

    /// `(selling_price − cost_price) × quantity`; negative when sold below cost.
    #[inline]
    pub fn profit(&self) -> Money {
        Money::from_minor(self.selling_price - self.cost_price).times(self.quantity)
    }
}

// =============================================================================
// Listing Filters
// =============================================================================

/// Maximum page size for list operations.
pub const MAX_PAGE_LIMIT: u32 = 100;

/// Page size used when none is given.
pub const DEFAULT_PAGE_LIMIT: u32 = 20;

/// Page request for list operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Pagination {
    /// 1-based page number.
    pub page: u32,
    pub limit: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Pagination {
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl Pagination {
    pub fn new(page: u32, limit: u32) -> Self {
        Pagination { page, limit }.normalized()
    }

    /// Clamps page to ≥ 1 and limit to `1..=MAX_PAGE_LIMIT`.
    pub fn normalized(self) -> Self {
        Pagination {
            page: self.page.max(1),
            limit: self.limit.clamp(1, MAX_PAGE_LIMIT),
        }
    }

    pub fn offset(&self) -> i64 {
        let p = self.normalized();
        (p.page as i64 - 1) * p.limit as i64
    }
}

/// One page of results plus the total number of matches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub limit: u32,
}

impl<T> Page<T> {
    pub fn total_pages(&self) -> i64 {
        if self.limit == 0 {
            return 0;
        }
        (self.total + self.limit as i64 - 1) / self.limit as i64
    }
}

/// Date selection shared by order and sale listings.
///
/// Precedence: `today`, then `date`, then `start_date`/`end_date` (both
/// inclusive, either may be open). Dates are business days; see
/// [`crate::calendar::BusinessCalendar::resolve`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DateFilter {
    #[serde(default)]
    pub today: bool,
    #[ts(as = "Option<String>")]
    pub date: Option<NaiveDate>,
    #[ts(as = "Option<String>")]
    pub start_date: Option<NaiveDate>,
    #[ts(as = "Option<String>")]
    pub end_date: Option<NaiveDate>,
}

/// Filters for listing orders.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    /// Matches order number or customer name, case-insensitive.
    pub search: Option<String>,
    #[serde(default)]
    pub dates: DateFilter,
    #[serde(default)]
    pub page: Pagination,
}

/// Filters for listing sales.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleFilter {
    pub source: Option<SaleSource>,
    pub payment_method: Option<PaymentMethod>,
    /// Matches receipt number, order number or the order's customer phone.
    pub search: Option<String>,
    #[serde(default)]
    pub dates: DateFilter,
    #[serde(default)]
    pub page: Pagination,
}

/// Filters for listing catalog products.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductFilter {
    pub category: Option<String>,
    /// Matches product name or description, case-insensitive.
    pub search: Option<String>,
    #[serde(default)]
    pub include_archived: bool,
    #[serde(default)]
    pub page: Pagination,
}

// =============================================================================
// Unit Tests
// =============================================================================
