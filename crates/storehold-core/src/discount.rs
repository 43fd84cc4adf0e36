//! # Discount Evaluator
//!
//! Time-windowed discounts and the prices they produce.
//!
//! ## Evaluation Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  effective_price(base, discount, now)                                   │
//! │                                                                         │
//! │  no discount / value ≤ 0 ─────────────────────────────► base            │
//! │  now < start_at ──────────────────────────────────────► base            │
//! │  now > end_at ────────────────────────────────────────► base            │
//! │  PERCENTAGE ───► max(base − round(base × value / 100), 0)              │
//! │  FIXED ────────► max(base − value, 0)                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Storefront listings, product detail and order pricing all call the same
//! function with the same clock reading, so they agree for a given instant.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::DiscountType;
use crate::validation::ValidationResult;

// =============================================================================
// Discount Descriptor
// =============================================================================

/// A discount attached to a product, optionally limited to a window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Discount {
    pub kind: DiscountType,

    /// Percent for [`DiscountType::Percentage`], minor units for
    /// [`DiscountType::Fixed`].
    pub value: i64,

    #[ts(as = "Option<String>")]
    pub start_at: Option<DateTime<Utc>>,

    #[ts(as = "Option<String>")]
    pub end_at: Option<DateTime<Utc>>,
}

impl Discount {
    /// An open-ended discount with no window.
    pub fn new(kind: DiscountType, value: i64) -> Self {
        Discount {
            kind,
            value,
            start_at: None,
            end_at: None,
        }
    }

    /// Limits the discount to `[start_at, end_at]`.
    pub fn with_window(
        mut self,
        start_at: Option<DateTime<Utc>>,
        end_at: Option<DateTime<Utc>>,
    ) -> Self {
        self.start_at = start_at;
        self.end_at = end_at;
        self
    }

    /// Whether the discount changes the price at `now`.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        if self.value <= 0 {
            return false;
        }
        if matches!(self.start_at, Some(start) if now < start) {
            return false;
        }
        if matches!(self.end_at, Some(end) if now > end) {
            return false;
        }
        true
    }

    /// Checks the descriptor before it is persisted.
    ///
    /// ## Rules
    /// - value must be positive
    /// - a percentage cannot exceed 100
    /// - the window must not end before it starts
    pub fn validate(&self) -> ValidationResult<()> {
        if self.value <= 0 {
            return Err(ValidationError::MustBePositive {
                field: "discount value".to_string(),
            });
        }

        if self.kind == DiscountType::Percentage && self.value > 100 {
            return Err(ValidationError::OutOfRange {
                field: "discount percentage".to_string(),
                min: 1,
                max: 100,
            });
        }

        if let (Some(start), Some(end)) = (self.start_at, self.end_at) {
            if start > end {
                return Err(ValidationError::inconsistent(
                    "discount window",
                    "start must not be after end",
                ));
            }
        }

        Ok(())
    }
}

/// Builds a validated discount from the four loose product columns.
///
/// Type and value must arrive together; window bounds without a discount
/// are rejected rather than silently dropped.
///
/// ## Example
/// ```rust
/// use storehold_core::discount::discount_from_parts;
/// use storehold_core::DiscountType;
///
/// assert!(discount_from_parts(None, None, None, None).unwrap().is_none());
/// assert!(discount_from_parts(Some(DiscountType::Fixed), Some(500), None, None).unwrap().is_some());
/// assert!(discount_from_parts(Some(DiscountType::Fixed), None, None, None).is_err());
/// ```
pub fn discount_from_parts(
    kind: Option<DiscountType>,
    value: Option<i64>,
    start_at: Option<DateTime<Utc>>,
    end_at: Option<DateTime<Utc>>,
) -> ValidationResult<Option<Discount>> {
    match (kind, value) {
        (Some(kind), Some(value)) => {
            let discount = Discount::new(kind, value).with_window(start_at, end_at);
            discount.validate()?;
            Ok(Some(discount))
        }
        (None, None) => {
            if start_at.is_some() || end_at.is_some() {
                return Err(ValidationError::inconsistent(
                    "discount",
                    "a window requires a discount type and value",
                ));
            }
            Ok(None)
        }
        _ => Err(ValidationError::inconsistent(
            "discount",
            "type and value must be provided together",
        )),
    }
}

// =============================================================================
// Effective Price
// =============================================================================

/// Price after applying `discount` at `now`. Never negative.
pub fn effective_price(base: Money, discount: Option<&Discount>, now: DateTime<Utc>) -> Money {
    let Some(discount) = discount else {
        return base;
    };

    if !discount.is_active_at(now) {
        return base;
    }

    let reduction = match discount.kind {
        DiscountType::Percentage => base.percentage(discount.value),
        DiscountType::Fixed => Money::from_minor(discount.value),
    };

    (base - reduction).floor_zero()
}

// =============================================================================
// Countdown
// =============================================================================

/// Countdown metadata shown next to a discounted price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DiscountCountdown {
    pub active: bool,

    #[ts(as = "Option<String>")]
    pub ends_at: Option<DateTime<Utc>>,

    /// Whole seconds until `ends_at`, `None` when there is nothing to count.
    pub remaining_seconds: Option<i64>,
}

/// Computes the countdown for a discount window at `now`.
///
/// ```text
/// window            now position        active  ends_at  remaining
/// ───────────────   ─────────────────   ──────  ───────  ─────────────
/// none              any                 true    None     None
/// [s, -]            before s            false   None     None
/// [s, e]            before s            false   e        secs to e
/// [-/s, -]          at/after s          true    None     None
/// [-/s, e]          at/before e         true    e        secs to e
/// [-/s, e]          after e             false   e        0
/// ```
///
/// Remaining seconds round up. `active` matches the end bound of
/// [`Discount::is_active_at`].
pub fn discount_countdown(
    start_at: Option<DateTime<Utc>>,
    end_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> DiscountCountdown {
    if let Some(start) = start_at {
        if now < start {
            return DiscountCountdown {
                active: false,
                ends_at: end_at,
                remaining_seconds: end_at.map(|end| seconds_until(end, now)),
            };
        }
    }

    let Some(end) = end_at else {
        return DiscountCountdown {
            active: true,
            ends_at: None,
            remaining_seconds: None,
        };
    };

    DiscountCountdown {
        active: now <= end,
        ends_at: Some(end),
        remaining_seconds: Some(seconds_until(end, now)),
    }
}

/// Whole seconds from `now` to `end`, rounded up; 0 once `end` has passed.
fn seconds_until(end: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let millis = (end - now).num_milliseconds();
    if millis <= 0 {
        0
    } else {
        (millis + 999) / 1000
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 7, h, 0, 0).unwrap()
    }

    #[test]
    fn test_percentage_discount() {
        let d = Discount::new(DiscountType::Percentage, 10);
        assert_eq!(
            effective_price(Money::from_minor(18000), Some(&d), at(12)).minor(),
            16200
        );
    }

    #[test]
    fn test_fixed_discount_floors_at_zero() {
        let d = Discount::new(DiscountType::Fixed, 2500);
        assert_eq!(effective_price(Money::from_minor(18000), Some(&d), at(12)).minor(), 15500);
        assert_eq!(effective_price(Money::from_minor(2000), Some(&d), at(12)).minor(), 0);
    }

    #[test]
    fn test_no_discount_or_non_positive_value() {
        let base = Money::from_minor(18000);
        assert_eq!(effective_price(base, None, at(12)), base);

        let zero = Discount::new(DiscountType::Percentage, 0);
        assert_eq!(effective_price(base, Some(&zero), at(12)), base);

        let negative = Discount::new(DiscountType::Fixed, -100);
        assert_eq!(effective_price(base, Some(&negative), at(12)), base);
    }

    #[test]
    fn test_window_boundaries() {
        let base = Money::from_minor(18000);
        let d = Discount::new(DiscountType::Percentage, 10).with_window(Some(at(10)), Some(at(14)));

        assert_eq!(effective_price(base, Some(&d), at(9)).minor(), 18000);
        assert_eq!(effective_price(base, Some(&d), at(10)).minor(), 16200);
        assert_eq!(effective_price(base, Some(&d), at(14)).minor(), 16200);
        assert_eq!(effective_price(base, Some(&d), at(15)).minor(), 18000);
    }

    #[test]
    fn test_validate() {
        assert!(Discount::new(DiscountType::Percentage, 10).validate().is_ok());
        assert!(Discount::new(DiscountType::Percentage, 101).validate().is_err());
        assert!(Discount::new(DiscountType::Fixed, 0).validate().is_err());
        assert!(Discount::new(DiscountType::Fixed, 500)
            .with_window(Some(at(14)), Some(at(10)))
            .validate()
            .is_err());
    }

    #[test]
    fn test_from_parts_pairing() {
        assert!(discount_from_parts(None, Some(10), None, None).is_err());
        assert!(discount_from_parts(Some(DiscountType::Percentage), None, None, None).is_err());
        assert!(discount_from_parts(None, None, Some(at(1)), None).is_err());

        let d = discount_from_parts(Some(DiscountType::Percentage), Some(10), Some(at(1)), Some(at(2)))
            .unwrap()
            .unwrap();
        assert_eq!(d.start_at, Some(at(1)));
    }

    #[test]
    fn test_countdown_without_window() {
        let c = discount_countdown(None, None, at(12));
        assert!(c.active);
        assert_eq!(c.ends_at, None);
        assert_eq!(c.remaining_seconds, None);
    }

    #[test]
    fn test_countdown_before_start() {
        let c = discount_countdown(Some(at(13)), Some(at(14)), at(12));
        assert!(!c.active);
        assert_eq!(c.ends_at, Some(at(14)));
        assert_eq!(c.remaining_seconds, Some(7200));

        let open = discount_countdown(Some(at(13)), None, at(12));
        assert!(!open.active);
        assert_eq!(open.remaining_seconds, None);
    }

    #[test]
    fn test_countdown_running_and_expired() {
        let running = discount_countdown(Some(at(10)), Some(at(14)), at(12) + Duration::seconds(30));
        assert!(running.active);
        assert_eq!(running.remaining_seconds, Some(7170));

        let expired = discount_countdown(Some(at(10)), Some(at(14)), at(15));
        assert!(!expired.active);
        assert_eq!(expired.remaining_seconds, Some(0));

        let after_start_open = discount_countdown(Some(at(10)), None, at(12));
        assert!(after_start_open.active);
        assert_eq!(after_start_open.ends_at, None);
    }

    #[test]
    fn test_countdown_agrees_with_price_near_the_end() {
        let d = Discount::new(DiscountType::Percentage, 10).with_window(Some(at(10)), Some(at(14)));
        let base = Money::from_minor(18000);

        let last_moment = at(14) - Duration::milliseconds(500);
        let c = discount_countdown(d.start_at, d.end_at, last_moment);
        assert!(c.active);
        assert_eq!(c.remaining_seconds, Some(1));
        assert_eq!(effective_price(base, Some(&d), last_moment).minor(), 16200);

        let at_end = discount_countdown(d.start_at, d.end_at, at(14));
        assert!(at_end.active);
        assert_eq!(at_end.remaining_seconds, Some(0));
        assert!(d.is_active_at(at(14)));

        let just_after = at(14) + Duration::milliseconds(1);
        assert!(!discount_countdown(d.start_at, d.end_at, just_after).active);
        assert!(!d.is_active_at(just_after));
    }
}
