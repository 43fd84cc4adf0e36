//! # Sequence Numbering
//!
//! Human-readable per-day identifiers for orders and receipts.
//!
//! ```text
//!   ORD-20260207-0001      RCPT-20260207-0003
//!   ─┬─ ───┬──── ─┬──      ─┬── ───┬──── ─┬──
//!    │     │      └ seq      │     │      └ seq (shared by walk-in + website)
//!    │     └ business day    │     └ business day
//!    └ prefix                └ prefix
//! ```
//!
//! The sequence value itself comes from storage (one counter row per scope
//! and day, bumped inside the transaction that inserts the record). This
//! module only spells and parses the result.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Which daily counter a number is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SequenceScope {
    /// Website order numbers.
    Order,
    /// Receipt numbers, shared by every sale source.
    Receipt,
}

impl SequenceScope {
    /// Key stored in the `daily_sequences` table.
    pub fn as_str(&self) -> &'static str {
        match self {
            SequenceScope::Order => "ORDER",
            SequenceScope::Receipt => "RECEIPT",
        }
    }
}

/// Formats `PREFIX-YYYYMMDD-NNNN`. Sequences past 9999 keep growing.
///
/// ## Example
/// ```rust
/// use chrono::NaiveDate;
/// use storehold_core::numbering::format_sequence_number;
///
/// let day = NaiveDate::from_ymd_opt(2026, 2, 7).unwrap();
/// assert_eq!(format_sequence_number("RCPT", day, 12), "RCPT-20260207-0012");
/// ```
pub fn format_sequence_number(prefix: &str, day: NaiveDate, seq: i64) -> String {
    format!("{}-{}-{:04}", prefix, day.format("%Y%m%d"), seq)
}

/// A number split back into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceNumber {
    pub prefix: String,
    pub day: NaiveDate,
    pub seq: i64,
}

/// Parses a number produced by [`format_sequence_number`].
///
/// The prefix may itself contain dashes (`JD-RCPT-20260207-0001`), so the
/// string is split from the right.
pub fn parse_sequence_number(value: &str) -> Option<SequenceNumber> {
    let mut parts = value.rsplitn(3, '-');
    let seq = parts.next()?.parse::<i64>().ok()?;
    let day = NaiveDate::parse_from_str(parts.next()?, "%Y%m%d").ok()?;
    let prefix = parts.next()?;

    if prefix.is_empty() || seq < 1 {
        return None;
    }

    Some(SequenceNumber {
        prefix: prefix.to_string(),
        day,
        seq,
    })
}
