//! # Receipts
//!
//! Receipt documents, rendering, and background dispatch after commit.
//!
//! ## Dispatch
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Receipt Dispatch                                 │
//! │                                                                         │
//! │  sale committed                                                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ReceiptQueue::enqueue ── try_send ──► bounded channel                  │
//! │       │  full / closed: warn! and drop; the receipt can still be        │
//! │       │  produced later through ReceiptService                          │
//! │       ▼                                                                 │
//! │  ReceiptWorker::run                                                     │
//! │       ├─ load sale + product names ──► ReceiptDocument                  │
//! │       ├─ ReceiptRenderer::render ──► bytes                              │
//! │       └─ info! on success, error! on failure (never retried here)       │
//! │                                                                         │
//! │  Shutdown: the worker drains whatever is already queued, then stops.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::fmt::{self, Write as _};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use storehold_core::receipt::ReceiptDocument;
use storehold_core::{CoreError, Money, Sale, SaleSource};

use crate::error::{EngineResult, RenderError};
use crate::Engine;

// =============================================================================
// Rendering
// =============================================================================

/// Turns a receipt document into printable bytes (text, PDF, ESC/POS).
pub trait ReceiptRenderer: Send + Sync + fmt::Debug {
    fn render(&self, document: &ReceiptDocument) -> Result<Vec<u8>, RenderError>;
}

/// Fixed-width plain-text receipt.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextReceiptRenderer;

impl TextReceiptRenderer {
    const WIDTH: usize = 40;
}

impl ReceiptRenderer for TextReceiptRenderer {
    fn render(&self, doc: &ReceiptDocument) -> Result<Vec<u8>, RenderError> {
        let width = Self::WIDTH;
        let rule = "-".repeat(width);
        let mut out = String::new();

        let mut line = |text: String| -> Result<(), RenderError> {
            writeln!(out, "{text}").map_err(|e| RenderError::new(e.to_string()))
        };

        line(format!("{:^width$}", doc.store_name))?;
        line(doc.receipt_number.clone())?;
        line(doc.issued_at.format("%Y-%m-%d %H:%M UTC").to_string())?;
        if let Some(order_number) = &doc.order_number {
            line(format!("Order: {order_number}"))?;
        }
        if let Some(customer) = &doc.customer_name {
            line(format!("Customer: {customer}"))?;
        }
        line(rule.clone())?;

        for item in &doc.lines {
            let name: String = item.name.chars().take(18).collect();
            let qty = format!("{} x {}", item.quantity, Money::from_minor(item.unit_price));
            let total = Money::from_minor(item.total).to_string();
            line(format!("{name:<18}{qty:>12}{total:>10}"))?;
        }

        line(rule)?;
        line(format!("{:<20}{:>20}", "TOTAL", doc.total().to_string()))?;
        line(format!("Paid by: {}", doc.payment_method))?;
        if doc.source == SaleSource::Website {
            line("Website order".to_string())?;
        }

        Ok(out.into_bytes())
    }
}

/// Bytes produced by the background worker for one sale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedReceipt {
    pub sale_id: String,
    pub receipt_number: String,
    pub bytes: Vec<u8>,
}

// =============================================================================
// Lookup Service
// =============================================================================

/// Receipt lookups. Obtain one through [`Engine::receipts`].
#[derive(Debug, Clone, Copy)]
pub struct ReceiptService<'a> {
    engine: &'a Engine,
}

impl<'a> ReceiptService<'a> {
    pub(crate) fn new(engine: &'a Engine) -> Self {
        ReceiptService { engine }
    }

    /// Assembles the receipt document of a sale.
    ///
    /// A sale without items has nothing to print and is `SaleNotFound`.
    pub async fn document_for_sale(&self, sale_id: &str) -> EngineResult<ReceiptDocument> {
        let sale = self
            .engine
            .db()
            .sales()
            .get_by_id(sale_id)
            .await?
            .ok_or_else(|| CoreError::SaleNotFound(sale_id.to_string()))?;
        self.document(&sale).await
    }

    /// The receipt document of the sale behind a paid order.
    pub async fn document_for_order(&self, order_number: &str) -> EngineResult<ReceiptDocument> {
        let sale = self.sale_for_order(order_number).await?;
        self.document(&sale).await
    }

    pub async fn render_for_sale(&self, sale_id: &str) -> EngineResult<Vec<u8>> {
        let document = self.document_for_sale(sale_id).await?;
        Ok(self.engine.renderer().render(&document)?)
    }

    /// Renders the receipt of a paid order.
    ///
    /// Unknown order numbers are `OrderNotFound`; orders that were never
    /// paid have no sale and are `SaleNotFound`.
    pub async fn render_for_order(&self, order_number: &str) -> EngineResult<Vec<u8>> {
        let document = self.document_for_order(order_number).await?;
        Ok(self.engine.renderer().render(&document)?)
    }

    async fn sale_for_order(&self, order_number: &str) -> EngineResult<Sale> {
        let db = self.engine.db();
        if db.orders().get_by_number(order_number).await?.is_none() {
            return Err(CoreError::OrderNotFound(order_number.to_string()).into());
        }

        db.sales()
            .get_by_order_number(order_number)
            .await?
            .ok_or_else(|| CoreError::SaleNotFound(order_number.to_string()).into())
    }

    async fn document(&self, sale: &Sale) -> EngineResult<ReceiptDocument> {
        if sale.items.is_empty() {
            return Err(CoreError::SaleNotFound(sale.id.clone()).into());
        }

        let db = self.engine.db();
        let ids: Vec<String> = sale.items.iter().map(|i| i.product_id.clone()).collect();
        let names = db.products().names(&ids).await?;

        let customer_name = match &sale.order_number {
            Some(order_number) => db.sales().customer_name(order_number).await?,
            None => None,
        };

        Ok(ReceiptDocument::from_sale(
            &self.engine.config().receipts.store_name,
            sale,
            &names,
            customer_name,
        ))
    }
}

// =============================================================================
// Queue
// =============================================================================

/// One sale waiting for its receipt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptJob {
    pub sale_id: String,
    pub receipt_number: String,
}

/// Sending side of the receipt channel. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ReceiptQueue {
    tx: mpsc::Sender<ReceiptJob>,
}

/// Receiving side of the receipt channel, consumed by [`ReceiptWorker`].
#[derive(Debug)]
pub struct ReceiptJobs {
    rx: mpsc::Receiver<ReceiptJob>,
}

impl ReceiptQueue {
    /// Creates a bounded queue holding at most `capacity` pending jobs.
    pub fn channel(capacity: usize) -> (ReceiptQueue, ReceiptJobs) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (ReceiptQueue { tx }, ReceiptJobs { rx })
    }

    /// Queues a job without waiting. Returns `false` if it was dropped.
    pub fn enqueue(&self, sale_id: &str, receipt_number: &str) -> bool {
        let job = ReceiptJob {
            sale_id: sale_id.to_string(),
            receipt_number: receipt_number.to_string(),
        };

        match self.tx.try_send(job) {
            Ok(()) => {
                debug!(receipt_number = %receipt_number, "Receipt queued");
                true
            }
            Err(mpsc::error::TrySendError::Full(job)) => {
                warn!(receipt_number = %job.receipt_number, "Receipt queue full, job dropped");
                false
            }
            Err(mpsc::error::TrySendError::Closed(job)) => {
                warn!(receipt_number = %job.receipt_number, "Receipt worker gone, job dropped");
                false
            }
        }
    }
}

// =============================================================================
// Worker
// =============================================================================

/// Background task rendering queued receipts.
pub struct ReceiptWorker {
    engine: Engine,
    jobs: mpsc::Receiver<ReceiptJob>,
    output: Option<mpsc::Sender<RenderedReceipt>>,
    shutdown_rx: mpsc::Receiver<()>,
}

/// Handle for stopping a [`ReceiptWorker`].
#[derive(Debug, Clone)]
pub struct ReceiptWorkerHandle {
    shutdown_tx: mpsc::Sender<()>,
}

impl ReceiptWorkerHandle {
    /// Asks the worker to finish the queued jobs and stop.
    pub async fn shutdown(&self) {
        if self.shutdown_tx.send(()).await.is_err() {
            debug!("Receipt worker already stopped");
        }
    }
}

impl ReceiptWorker {
    pub fn new(engine: Engine, jobs: ReceiptJobs) -> (Self, ReceiptWorkerHandle) {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let worker = ReceiptWorker {
            engine,
            jobs: jobs.rx,
            output: None,
            shutdown_rx,
        };

        (worker, ReceiptWorkerHandle { shutdown_tx })
    }

    /// Forwards every rendered receipt to `output` (a printer spooler, a
    /// mailer, a test).
    pub fn with_output(mut self, output: mpsc::Sender<RenderedReceipt>) -> Self {
        self.output = Some(output);
        self
    }

    /// Runs until shutdown is requested or every queue sender is gone.
    ///
    /// This should be spawned as a background task.
    pub async fn run(mut self) {
        info!("Receipt worker starting");

        loop {
            tokio::select! {
                job = self.jobs.recv() => match job {
                    Some(job) => self.process(job).await,
                    None => {
                        info!("Receipt queue closed");
                        break;
                    }
                },

                _ = self.shutdown_rx.recv() => {
                    info!("Receipt worker shutting down");
                    while let Ok(job) = self.jobs.try_recv() {
                        self.process(job).await;
                    }
                    break;
                }
            }
        }

        info!("Receipt worker stopped");
    }

    async fn process(&self, job: ReceiptJob) {
        match self.engine.receipts().render_for_sale(&job.sale_id).await {
            Ok(bytes) => {
                info!(
                    receipt_number = %job.receipt_number,
                    bytes = bytes.len(),
                    "Receipt rendered"
                );

                if let Some(output) = &self.output {
                    let rendered = RenderedReceipt {
                        sale_id: job.sale_id,
                        receipt_number: job.receipt_number,
                        bytes,
                    };
                    if output.send(rendered).await.is_err() {
                        debug!("Receipt output closed");
                    }
                }
            }
            Err(e) => {
                error!(
                    receipt_number = %job.receipt_number,
                    error = %e,
                    "Receipt rendering failed"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use storehold_core::receipt::ReceiptLine;
    use storehold_core::PaymentMethod;

    fn document() -> ReceiptDocument {
        ReceiptDocument {
            store_name: "Storehold".into(),
            receipt_number: "RCPT-20260207-0001".into(),
            issued_at: Utc.with_ymd_and_hms(2026, 2, 7, 9, 30, 0).unwrap(),
            payment_method: PaymentMethod::Transfer,
            source: SaleSource::Website,
            order_number: Some("ORD-20260207-0001".into()),
            customer_name: Some("Ada Obi".into()),
            lines: vec![ReceiptLine {
                name: "Oud Wood".into(),
                quantity: 2,
                unit_price: 18000,
                total: 36000,
            }],
            total_amount: 36000,
        }
    }

    #[test]
    fn test_text_renderer_layout() {
        let bytes = TextReceiptRenderer.render(&document()).unwrap();
        let text = String::from_utf8(bytes).unwrap();

        assert!(text.contains("RCPT-20260207-0001"));
        assert!(text.contains("Order: ORD-20260207-0001"));
        assert!(text.contains("Customer: Ada Obi"));
        assert!(text.contains("Oud Wood"));
        assert!(text.contains("2 x 180.00"));
        assert!(text.contains("360.00"));
        assert!(text.contains("Paid by: TRANSFER"));
        assert!(text.lines().all(|l| l.chars().count() <= TextReceiptRenderer::WIDTH));
    }

    #[tokio::test]
    async fn test_enqueue_drops_when_full() {
        let (queue, mut jobs) = ReceiptQueue::channel(1);

        assert!(queue.enqueue("s-1", "RCPT-20260207-0001"));
        assert!(!queue.enqueue("s-2", "RCPT-20260207-0002"));

        let job = jobs.rx.recv().await.unwrap();
        assert_eq!(job.sale_id, "s-1");
    }

    #[tokio::test]
    async fn test_enqueue_after_worker_gone() {
        let (queue, jobs) = ReceiptQueue::channel(4);
        drop(jobs);
        assert!(!queue.enqueue("s-1", "RCPT-20260207-0001"));
    }
}
