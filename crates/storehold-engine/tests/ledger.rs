mod common;

use common::TestEngine;
use storehold_core::CoreError;
use storehold_engine::{EngineError, ErrorKind};

#[tokio::test]
async fn test_reserve_then_release_restores_counters() {
    let t = TestEngine::new().await;
    let p = t.product("Oud Wood", 10).await;
    let ledger = t.engine.ledger();

    let level = ledger.reserve(&p.id, 4).await.unwrap();
    assert_eq!((level.quantity, level.reserved_quantity), (10, 4));
    assert_eq!(ledger.available_stock(&p.id).await.unwrap(), 6);

    let level = ledger.release(&p.id, 4).await.unwrap();
    assert_eq!((level.quantity, level.reserved_quantity), (10, 0));

    // Over-release floors at zero.
    ledger.reserve(&p.id, 1).await.unwrap();
    let level = ledger.release(&p.id, 5).await.unwrap();
    assert_eq!(level.reserved_quantity, 0);
}

#[tokio::test]
async fn test_reserve_then_finalize_moves_both_counters() {
    let t = TestEngine::new().await;
    let p = t.product("Oud Wood", 10).await;
    let ledger = t.engine.ledger();

    ledger.reserve(&p.id, 3).await.unwrap();
    let level = ledger.finalize(&p.id, 3).await.unwrap();
    assert_eq!((level.quantity, level.reserved_quantity), (7, 0));

    let err = ledger.finalize(&p.id, 1).await.unwrap_err();
    assert!(matches!(
        err,
        EngineError::Core(CoreError::InsufficientStock {
            available: 0,
            requested: 1,
            ..
        })
    ));
}

#[tokio::test]
async fn test_deduct_respects_reservations() {
    let t = TestEngine::new().await;
    let p = t.product("Oud Wood", 5).await;
    let ledger = t.engine.ledger();

    ledger.reserve(&p.id, 3).await.unwrap();

    let err = ledger.deduct(&p.id, 3).await.unwrap_err();
    assert!(matches!(
        err,
        EngineError::Core(CoreError::InsufficientStock {
            available: 2,
            requested: 3,
            ..
        })
    ));
    assert_eq!(t.counters(&p.id).await, (5, 3));

    let level = ledger.deduct(&p.id, 2).await.unwrap();
    assert_eq!((level.quantity, level.reserved_quantity), (3, 3));
    assert_eq!(ledger.available_stock(&p.id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_assert_availability() {
    let t = TestEngine::new().await;
    let p = t.product("Oud Wood", 2).await;
    let ledger = t.engine.ledger();

    ledger.assert_availability(&p.id, 2).await.unwrap();

    let err = ledger.assert_availability(&p.id, 3).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InsufficientStock);

    let err = ledger.assert_availability("missing", 1).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_rejects_non_positive_quantities() {
    let t = TestEngine::new().await;
    let p = t.product("Oud Wood", 5).await;
    let ledger = t.engine.ledger();

    for qty in [0, -2] {
        let err = ledger.reserve(&p.id, qty).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
    assert_eq!(t.counters(&p.id).await, (5, 0));

    let err = ledger.reserve("missing", 1).await.unwrap_err();
    assert!(matches!(err, EngineError::Core(CoreError::ProductNotFound(_))));
}
