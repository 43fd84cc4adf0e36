//! # Validation Module
//!
//! Input validation rules for Storehold.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Caller (admin API / storefront API)                          │
//! │  └── Deserialization, basic shape checks                               │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE (before any transaction starts)                  │
//! │  ├── Quantities, prices, names, customer contact                       │
//! │  └── Discount pairing (see crate::discount)                            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK (0 <= reserved_quantity <= quantity)                        │
//! │  ├── UNIQUE order_number / receipt_number                              │
//! │  └── Foreign keys                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::types::CustomerContact;
use crate::{MAX_ITEM_QUANTITY, MAX_LINE_ITEMS, MAX_PRICE};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity.
///
/// ## Rules
/// - Must be positive
/// - Must not exceed `MAX_ITEM_QUANTITY` (999)
///
/// ## Example
/// ```rust
/// use storehold_core::validation::validate_quantity;
///
/// assert!(validate_quantity(2).is_ok());
/// assert!(validate_quantity(0).is_err());
/// assert!(validate_quantity(1000).is_err());
/// ```
pub fn validate_quantity(quantity: i64) -> CoreResult<()> {
    if quantity <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        }
        .into());
    }

    if quantity > MAX_ITEM_QUANTITY {
        return Err(CoreError::QuantityTooLarge {
            requested: quantity,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price in minor units. Zero is allowed (giveaways); anything
/// above `MAX_PRICE` is rejected.
pub fn validate_price(field: &str, amount: i64) -> ValidationResult<()> {
    if amount < 0 {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }
    if amount > MAX_PRICE {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_PRICE,
        });
    }
    Ok(())
}

/// Validates an on-hand stock count.
pub fn validate_stock_quantity(quantity: i64) -> ValidationResult<()> {
    if quantity < 0 {
        return Err(ValidationError::Negative {
            field: "quantity".to_string(),
        });
    }
    Ok(())
}

/// Validates how many lines a checkout carries (emptiness is checked by the
/// caller, which knows whether it is an order or a sale).
pub fn validate_line_count(count: usize) -> ValidationResult<()> {
    if count > MAX_LINE_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "items".to_string(),
            min: 1,
            max: MAX_LINE_ITEMS as i64,
        });
    }
    Ok(())
}

/// Fails when a product already has `max` media files.
pub fn validate_media_capacity(product_id: &str, existing: i64, max: i64) -> CoreResult<()> {
    if existing >= max {
        return Err(CoreError::MediaLimitReached {
            product_id: product_id.to_string(),
            max,
        });
    }
    Ok(())
}

// =============================================================================
// String Validators
// =============================================================================

fn required_trimmed<'a>(field: &str, value: &'a str, max: usize) -> ValidationResult<&'a str> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::required(field));
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(value)
}

/// Validates a product name (1-200 characters).
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    required_trimmed("name", name, 200).map(|_| ())
}

/// Validates a category code such as `PERFUMES` or `BODY_SPRAY`.
///
/// ## Example
/// ```rust
/// use storehold_core::validation::validate_category;
///
/// assert!(validate_category("BODY_SPRAY").is_ok());
/// assert!(validate_category("body spray").is_err());
/// ```
pub fn validate_category(category: &str) -> ValidationResult<()> {
    let category = required_trimmed("category", category, 50)?;

    if !category
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "category".to_string(),
            reason: "must contain only upper-case letters, digits and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates checkout contact details.
///
/// ## Rules
/// - Name: required, at most 120 characters
/// - Phone: 7-20 characters of digits, spaces, `+`, `-`, `(`, `)`
/// - Email (optional): must contain `@`
pub fn validate_customer(contact: &CustomerContact) -> ValidationResult<()> {
    required_trimmed("customer name", &contact.name, 120)?;

    let phone = required_trimmed("customer phone", &contact.phone, 20)?;
    let digits = phone.chars().filter(|c| c.is_ascii_digit()).count();
    let allowed = phone
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | ' ' | '(' | ')'));
    if !allowed || digits < 7 {
        return Err(ValidationError::InvalidFormat {
            field: "customer phone".to_string(),
            reason: "must contain at least 7 digits".to_string(),
        });
    }

    if let Some(email) = contact.email.as_deref() {
        let email = email.trim();
        if !email.is_empty() && !email.contains('@') {
            return Err(ValidationError::InvalidFormat {
                field: "customer email".to_string(),
                reason: "must contain '@'".to_string(),
            });
        }
    }

    Ok(())
}

/// Validates an order/receipt number prefix (`ORD`, `JD-RCPT`).
pub fn validate_number_prefix(field: &str, prefix: &str) -> ValidationResult<()> {
    let prefix = required_trimmed(field, prefix, 12)?;

    if !prefix.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must contain only letters, digits and dashes".to_string(),
        });
    }

    Ok(())
}

/// Validates a media URL reference.
pub fn validate_media_url(url: &str) -> ValidationResult<()> {
    required_trimmed("media url", url, 2048).map(|_| ())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());
        assert!(matches!(validate_quantity(0), Err(CoreError::Validation(_))));
        assert!(matches!(
            validate_quantity(1000),
            Err(CoreError::QuantityTooLarge { requested: 1000, .. })
        ));
    }

    #[test]
    fn test_validate_price() {
        assert!(validate_price("selling price", 0).is_ok());
        assert!(validate_price("selling price", -1).is_err());
        assert!(validate_price("selling price", MAX_PRICE).is_ok());
        assert!(matches!(
            validate_price("selling price", MAX_PRICE + 1),
            Err(ValidationError::OutOfRange { .. })
        ));
        assert!(validate_price("cost price", i64::MAX).is_err());
    }

    #[test]
    fn test_validate_customer() {
        let ok = CustomerContact::new("Ada Obi", "+234 803 555 0101");
        assert!(validate_customer(&ok).is_ok());

        let no_name = CustomerContact::new("  ", "08035550101");
        assert!(matches!(
            validate_customer(&no_name),
            Err(ValidationError::Required { .. })
        ));

        let bad_phone = CustomerContact::new("Ada", "call me");
        assert!(validate_customer(&bad_phone).is_err());

        let mut bad_email = ok.clone();
        bad_email.email = Some("ada.example.com".into());
        assert!(validate_customer(&bad_email).is_err());
    }

    #[test]
    fn test_validate_line_count_and_media() {
        assert!(validate_line_count(MAX_LINE_ITEMS).is_ok());
        assert!(validate_line_count(MAX_LINE_ITEMS + 1).is_err());

        assert!(validate_media_capacity("p", 2, 3).is_ok());
        assert!(matches!(
            validate_media_capacity("p", 3, 3),
            Err(CoreError::MediaLimitReached { max: 3, .. })
        ));
    }

    #[test]
    fn test_validate_prefix_and_names() {
        assert!(validate_number_prefix("order prefix", "JD-RCPT").is_ok());
        assert!(validate_number_prefix("order prefix", "").is_err());
        assert!(validate_number_prefix("order prefix", "OR D").is_err());
        assert!(validate_product_name("Oud Wood 100ml").is_ok());
        assert!(validate_product_name(&"x".repeat(201)).is_err());
        assert!(validate_media_url("").is_err());
    }
}
