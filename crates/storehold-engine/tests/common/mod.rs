//! Shared fixtures for engine behaviour tests.

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use std::sync::Arc;
use tempfile::TempDir;

use storehold_core::receipt::ReceiptDocument;
use storehold_core::{Clock, CustomerContact, FixedClock, NewProduct, Product};
use storehold_db::{Database, DbConfig};
use storehold_engine::{Engine, EngineConfig, ReceiptRenderer, RenderError};

/// Saturday 2026-02-07 09:00 UTC.
pub fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 2, 7, 9, 0, 0).unwrap()
}

/// An engine over a fresh file-backed database with a hand-driven clock.
pub struct TestEngine {
    pub engine: Engine,
    pub clock: Arc<FixedClock>,
    _dir: TempDir,
}

impl TestEngine {
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    pub async fn with_config(adjust: impl FnOnce(&mut EngineConfig)) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storehold.db");

        let mut config = EngineConfig::default();
        config.database.path = path.clone();
        adjust(&mut config);

        let db = Database::new(DbConfig::new(path).max_connections(4))
            .await
            .unwrap();
        let clock = Arc::new(FixedClock::new(start()));
        let engine = Engine::new(db, config)
            .unwrap()
            .with_clock(clock.clone() as Arc<dyn Clock>);

        TestEngine {
            engine,
            clock,
            _dir: dir,
        }
    }

    /// A visible PERFUMES product costing 120.00 and selling at 180.00.
    pub async fn product(&self, name: &str, quantity: i64) -> Product {
        self.product_priced(name, quantity, 12000, 18000).await
    }

    pub async fn product_priced(
        &self,
        name: &str,
        quantity: i64,
        cost_price: i64,
        selling_price: i64,
    ) -> Product {
        self.engine
            .catalog()
            .create_product(NewProduct {
                name: name.to_string(),
                description: None,
                category: "PERFUMES".to_string(),
                cost_price,
                selling_price,
                quantity,
                discount: None,
                visible_on_website: true,
            })
            .await
            .unwrap()
    }

    /// Current `(quantity, reserved_quantity)` of a product.
    pub async fn counters(&self, product_id: &str) -> (i64, i64) {
        let level = self.engine.ledger().level(product_id).await.unwrap();
        assert!(
            0 <= level.reserved_quantity && level.reserved_quantity <= level.quantity,
            "reserved {} outside 0..={}",
            level.reserved_quantity,
            level.quantity
        );
        (level.quantity, level.reserved_quantity)
    }
}

pub fn customer() -> CustomerContact {
    CustomerContact {
        name: "Ada Obi".to_string(),
        phone: "08012345678".to_string(),
        email: Some("ada@example.com".to_string()),
        address: Some("12 Allen Avenue, Ikeja".to_string()),
    }
}

/// A renderer that always fails, standing in for an offline printer.
#[derive(Debug, Default)]
pub struct FailingRenderer;

impl ReceiptRenderer for FailingRenderer {
    fn render(&self, _document: &ReceiptDocument) -> Result<Vec<u8>, RenderError> {
        Err(RenderError::new("printer offline"))
    }
}
