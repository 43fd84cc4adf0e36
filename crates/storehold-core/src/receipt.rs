//! # Receipt Documents
//!
//! A renderer-independent view of a sale, built from the immutable sale
//! record plus product names. Renderers (plain text, PDF) only ever see this
//! struct.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use ts_rs::TS;

use crate::money::Money;
use crate::types::{PaymentMethod, Sale, SaleSource};

/// One printed line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReceiptLine {
    pub name: String,
    pub quantity: i64,
    pub unit_price: i64,
    pub total: i64,
}

/// Everything a receipt shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReceiptDocument {
    pub store_name: String,
    pub receipt_number: String,
    #[ts(as = "String")]
    pub issued_at: DateTime<Utc>,
    pub payment_method: PaymentMethod,
    pub source: SaleSource,
    pub order_number: Option<String>,
    pub customer_name: Option<String>,
    pub lines: Vec<ReceiptLine>,
    pub total_amount: i64,
}

impl ReceiptDocument {
    /// Builds the document for `sale`.
    ///
    /// `product_names` maps product id to display name; unknown ids print as
    /// the id so a receipt never fails on a renamed or archived product.
    pub fn from_sale(
        store_name: &str,
        sale: &Sale,
        product_names: &HashMap<String, String>,
        customer_name: Option<String>,
    ) -> Self {
        let lines = sale
            .items
            .iter()
            .map(|item| ReceiptLine {
                name: product_names
                    .get(&item.product_id)
                    .cloned()
                    .unwrap_or_else(|| item.product_id.clone()),
                quantity: item.quantity,
                unit_price: item.selling_price,
                total: item.line_total().minor(),
            })
            .collect();

        ReceiptDocument {
            store_name: store_name.to_string(),
            receipt_number: sale.receipt_number.clone(),
            issued_at: sale.created_at,
            payment_method: sale.payment_method,
            source: sale.source,
            order_number: sale.order_number.clone(),
            customer_name,
            lines,
            total_amount: sale.total_amount,
        }
    }

    pub fn total(&self) -> Money {
        Money::from_minor(self.total_amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SaleItem;
    use chrono::TimeZone;

    #[test]
    fn test_from_sale_uses_names_and_falls_back_to_id() {
        let sale = Sale {
            id: "s-1".into(),
            receipt_number: "RCPT-20260207-0001".into(),
            source: SaleSource::WalkIn,
            order_number: None,
            payment_method: PaymentMethod::Cash,
            total_amount: 41000,
            profit: 13000,
            created_at: Utc.with_ymd_and_hms(2026, 2, 7, 10, 0, 0).unwrap(),
            items: vec![
                SaleItem {
                    id: "si-1".into(),
                    sale_id: "s-1".into(),
                    product_id: "p-1".into(),
                    quantity: 2,
                    selling_price: 18000,
                    cost_price: 12000,
                },
                SaleItem {
                    id: "si-2".into(),
                    sale_id: "s-1".into(),
                    product_id: "p-gone".into(),
                    quantity: 1,
                    selling_price: 5000,
                    cost_price: 4000,
                },
            ],
        };

        let names = HashMap::from([("p-1".to_string(), "Oud Wood".to_string())]);
        let doc = ReceiptDocument::from_sale("Storehold", &sale, &names, None);

        assert_eq!(doc.lines.len(), 2);
        assert_eq!(doc.lines[0].name, "Oud Wood");
        assert_eq!(doc.lines[0].total, 36000);
        assert_eq!(doc.lines[1].name, "p-gone");
        assert_eq!(doc.total().minor(), 41000);
    }
}
