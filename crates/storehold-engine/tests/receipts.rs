mod common;

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use common::{customer, FailingRenderer, TestEngine};
use storehold_core::{CoreError, OrderLine, OrderStatus, PaymentMethod, WalkInLine};
use storehold_engine::{EngineError, ErrorKind, ReceiptQueue, ReceiptWorker};

#[tokio::test]
async fn test_render_for_order_and_sale() {
    let t = TestEngine::new().await;
    let p = t.product("Oud Wood", 5).await;

    let order = t
        .engine
        .orders()
        .create(customer(), vec![OrderLine::new(&p.id, 2)])
        .await
        .unwrap();

    let err = t
        .engine
        .receipts()
        .render_for_order(&order.order_number)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Core(CoreError::SaleNotFound(_))));

    let err = t
        .engine
        .receipts()
        .render_for_order("ORD-20260207-9999")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Core(CoreError::OrderNotFound(_))));

    t.engine.orders().mark_paid(&order.id, None).await.unwrap();

    let bytes = t
        .engine
        .receipts()
        .render_for_order(&order.order_number)
        .await
        .unwrap();
    let text = String::from_utf8(bytes).unwrap();
    assert!(text.contains("RCPT-20260207-0001"));
    assert!(text.contains(&order.order_number));
    assert!(text.contains("Customer: Ada Obi"));
    assert!(text.contains("Oud Wood"));
    assert!(text.contains("360.00"));

    let document = t
        .engine
        .receipts()
        .document_for_order(&order.order_number)
        .await
        .unwrap();
    assert_eq!(document.total_amount, 36000);
    assert_eq!(document.lines[0].name, "Oud Wood");

    let err = t.engine.receipts().render_for_sale("missing").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_failing_renderer_never_blocks_payment() {
    let t = TestEngine::new().await;
    let engine = t.engine.clone().with_renderer(Arc::new(FailingRenderer));
    let p = t.product("Oud Wood", 5).await;

    let (queue, jobs) = ReceiptQueue::channel(8);
    let engine = engine.with_receipt_queue(queue);
    let (worker, handle) = ReceiptWorker::new(engine.clone(), jobs);
    let task = tokio::spawn(worker.run());

    let order = engine
        .orders()
        .create(customer(), vec![OrderLine::new(&p.id, 1)])
        .await
        .unwrap();
    let paid = engine.orders().mark_paid(&order.id, None).await.unwrap();
    assert_eq!(paid.status, OrderStatus::Paid);
    assert_eq!(t.counters(&p.id).await, (4, 0));

    let err = engine
        .receipts()
        .render_for_order(&order.order_number)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DependencyFailure);

    handle.shutdown().await;
    tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn test_worker_renders_committed_sales() {
    let t = TestEngine::new().await;
    let p = t.product("Oud Wood", 5).await;

    let (queue, jobs) = ReceiptQueue::channel(8);
    let engine = t.engine.clone().with_receipt_queue(queue);
    let (output_tx, mut output_rx) = mpsc::channel(8);
    let (worker, handle) = ReceiptWorker::new(engine.clone(), jobs);
    let task = tokio::spawn(worker.with_output(output_tx).run());

    let sale = engine
        .sales()
        .record_walk_in(PaymentMethod::Cash, vec![WalkInLine::new(&p.id, 1, 18000)])
        .await
        .unwrap();

    let rendered = tokio::time::timeout(Duration::from_secs(5), output_rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(rendered.sale_id, sale.id);
    assert_eq!(rendered.receipt_number, "RCPT-20260207-0001");
    let text = String::from_utf8(rendered.bytes).unwrap();
    assert!(text.contains("Paid by: CASH"));

    handle.shutdown().await;
    tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn test_worker_drains_queue_on_shutdown() {
    let t = TestEngine::new().await;
    let p = t.product("Oud Wood", 5).await;

    let (queue, jobs) = ReceiptQueue::channel(8);
    let engine = t.engine.clone().with_receipt_queue(queue);

    let first = engine
        .sales()
        .record_walk_in(PaymentMethod::Cash, vec![WalkInLine::new(&p.id, 1, 18000)])
        .await
        .unwrap();
    let second = engine
        .sales()
        .record_walk_in(PaymentMethod::Pos, vec![WalkInLine::new(&p.id, 1, 18000)])
        .await
        .unwrap();

    let (output_tx, mut output_rx) = mpsc::channel(8);
    let (worker, handle) = ReceiptWorker::new(engine.clone(), jobs);
    handle.shutdown().await;
    worker.with_output(output_tx).run().await;

    let mut rendered = Vec::new();
    while let Ok(receipt) = output_rx.try_recv() {
        rendered.push(receipt.sale_id);
    }
    assert_eq!(rendered, vec![first.id, second.id]);
}
