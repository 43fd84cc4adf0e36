//! # storehold-engine: Fulfillment Engine for Storehold
//!
//! Keeps `quantity` and `reserved_quantity` consistent across the three
//! flows that consume stock, drives orders through their lifecycle, records
//! sales, and reclaims stock from abandoned orders.
//!
//! ## Data Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Fulfillment Flows                                │
//! │                                                                         │
//! │  Website checkout ──► OrderService::create ──► ledger::reserve         │
//! │                                                                         │
//! │  Admin marks PAID ──► OrderService::mark_paid ─► ledger::finalize      │
//! │                                        │                                │
//! │                                        └──► website sale + receipt no. │
//! │                                                                         │
//! │  Walk-in checkout ──► SaleService::record_walk_in ─► ledger::deduct    │
//! │                                                                         │
//! │  ExpirySweeper ─────► OrderService cancel path ──► ledger::release     │
//! │                                                                         │
//! │  After every committed sale: ReceiptQueue ──► ReceiptWorker            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust,ignore
//! use storehold_engine::{Engine, EngineConfig};
//! use storehold_core::{CustomerContact, OrderLine};
//!
//! let engine = Engine::open(EngineConfig::load_or_default(None)).await?;
//! let order = engine
//!     .orders()
//!     .create(CustomerContact::new("Ada", "08012345678"), vec![OrderLine::new("p-1", 2)])
//!     .await?;
//! engine.orders().mark_paid(&order.id, None).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod catalog;
pub mod config;
pub mod error;
pub mod ledger;
pub mod orders;
pub mod receipts;
pub mod reports;
pub mod sales;
pub mod sweeper;

// =============================================================================
// Re-exports
// =============================================================================

pub use catalog::CatalogService;
pub use config::EngineConfig;
pub use error::{ConfigError, EngineError, EngineResult, ErrorKind, RenderError};
pub use ledger::StockLedger;
pub use orders::OrderService;
pub use receipts::{
    ReceiptJobs, ReceiptQueue, ReceiptRenderer, ReceiptService, ReceiptWorker,
    ReceiptWorkerHandle, RenderedReceipt, TextReceiptRenderer,
};
pub use reports::ReportService;
pub use sales::SaleService;
pub use sweeper::{ExpirySweeper, ExpirySweeperHandle};

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info};

use storehold_core::{BusinessCalendar, Clock, Sale, SystemClock};
use storehold_db::Database;

// =============================================================================
// Engine
// =============================================================================

/// Shared handle to the engine. Cheap to clone.
///
/// ## Collaborators
/// - `Database`: the single source of truth for stock, orders and sales
/// - `Clock`: every "now" the engine uses
/// - `ReceiptRenderer`: turns receipt documents into bytes
/// - `ReceiptQueue` (optional): where committed sales are sent for rendering
#[derive(Debug, Clone)]
pub struct Engine {
    db: Database,
    config: Arc<EngineConfig>,
    calendar: BusinessCalendar,
    clock: Arc<dyn Clock>,
    renderer: Arc<dyn ReceiptRenderer>,
    receipts: Option<ReceiptQueue>,
}

impl Engine {
    /// Builds an engine over an open database.
    ///
    /// Uses the system clock and the plain-text renderer; swap either with
    /// [`Engine::with_clock`] and [`Engine::with_renderer`].
    pub fn new(db: Database, config: EngineConfig) -> EngineResult<Self> {
        config.validate()?;
        let calendar = config.calendar.calendar()?;

        Ok(Engine {
            db,
            config: Arc::new(config),
            calendar,
            clock: Arc::new(SystemClock),
            renderer: Arc::new(TextReceiptRenderer),
            receipts: None,
        })
    }

    /// Opens (and migrates) the configured database, then builds the engine.
    pub async fn open(config: EngineConfig) -> EngineResult<Self> {
        config.validate()?;

        if let Some(parent) = config.database.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(ConfigError::from)?;
            }
        }

        let db = Database::new(config.database.db_config()).await?;
        info!(path = %config.database.path.display(), "Engine database ready");
        Engine::new(db, config)
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn ReceiptRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    /// Routes committed sales to a background [`ReceiptWorker`].
    pub fn with_receipt_queue(mut self, queue: ReceiptQueue) -> Self {
        self.receipts = Some(queue);
        self
    }

    // =========================================================================
    // Services
    // =========================================================================

    pub fn ledger(&self) -> StockLedger<'_> {
        StockLedger::new(self)
    }

    pub fn orders(&self) -> OrderService<'_> {
        OrderService::new(self)
    }

    pub fn sales(&self) -> SaleService<'_> {
        SaleService::new(self)
    }

    pub fn catalog(&self) -> CatalogService<'_> {
        CatalogService::new(self)
    }

    pub fn receipts(&self) -> ReceiptService<'_> {
        ReceiptService::new(self)
    }

    pub fn reports(&self) -> ReportService<'_> {
        ReportService::new(self)
    }

    /// Cancels every order pending longer than the configured expiry.
    ///
    /// Returns how many orders this sweep cancelled.
    pub async fn run_expiry_sweep(&self) -> EngineResult<usize> {
        sweeper::sweep_expired(self).await
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn calendar(&self) -> BusinessCalendar {
        self.calendar
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub(crate) fn renderer(&self) -> &dyn ReceiptRenderer {
        self.renderer.as_ref()
    }

    /// Hands a committed sale to the receipt worker, if one is attached.
    ///
    /// Never fails: a full or closed queue is logged and the receipt can be
    /// produced later through [`ReceiptService`].
    pub(crate) fn dispatch_receipt(&self, sale: &Sale) {
        match &self.receipts {
            Some(queue) => {
                queue.enqueue(&sale.id, &sale.receipt_number);
            }
            None => debug!(
                receipt_number = %sale.receipt_number,
                "No receipt worker attached, skipping dispatch"
            ),
        }
    }
}
