mod common;

use chrono::{Duration, NaiveDate};

use common::{customer, start, TestEngine};
use storehold_core::report::ReportPeriod;
use storehold_core::{OrderLine, PaymentMethod, WalkInLine};
use storehold_engine::ErrorKind;

#[tokio::test]
async fn test_daily_report_breakdowns() {
    let t = TestEngine::new().await;
    let p = t.product("Oud Wood", 10).await;

    t.engine
        .sales()
        .record_walk_in(PaymentMethod::Cash, vec![WalkInLine::new(&p.id, 1, 18000)])
        .await
        .unwrap();

    let order = t
        .engine
        .orders()
        .create(customer(), vec![OrderLine::new(&p.id, 2)])
        .await
        .unwrap();
    t.engine.orders().mark_paid(&order.id, None).await.unwrap();

    let report = t.engine.reports().daily().await.unwrap();
    assert_eq!(report.period, ReportPeriod::Daily);
    assert_eq!(report.from, start() - Duration::hours(9));
    assert_eq!(report.until, start() + Duration::hours(15));
    assert_eq!(report.revenue, 54000);
    assert_eq!(report.profit, 18000);
    assert_eq!(report.margin_bps, 3333);
    assert_eq!(report.transactions, 2);

    assert_eq!(report.by_source.len(), 2);
    assert_eq!(report.by_source[0].key, "WEBSITE");
    assert_eq!(report.by_source[0].revenue, 36000);
    assert_eq!(report.by_source[1].key, "WALK_IN");

    assert_eq!(report.by_payment_method[0].key, "TRANSFER");
    assert_eq!(report.by_category.len(), 1);
    assert_eq!(report.by_category[0].key, "PERFUMES");
    assert_eq!(report.by_category[0].transactions, 2);
}

#[tokio::test]
async fn test_report_windows() {
    let t = TestEngine::new().await;
    let p = t.product("Oud Wood", 10).await;

    // Sold five days before "today".
    t.engine
        .sales()
        .record_walk_in(PaymentMethod::Cash, vec![WalkInLine::new(&p.id, 1, 18000)])
        .await
        .unwrap();
    t.clock.advance(Duration::days(5));

    assert_eq!(t.engine.reports().daily().await.unwrap().transactions, 0);
    assert_eq!(t.engine.reports().weekly().await.unwrap().transactions, 1);
    assert_eq!(t.engine.reports().monthly().await.unwrap().transactions, 1);

    let day = |d| NaiveDate::from_ymd_opt(2026, 2, d).unwrap();
    let custom = t.engine.reports().custom(day(7), day(7)).await.unwrap();
    assert_eq!(custom.period, ReportPeriod::Custom);
    assert_eq!(custom.revenue, 18000);
    assert_eq!(t.engine.reports().custom(day(8), day(12)).await.unwrap().revenue, 0);

    let err = t.engine.reports().custom(day(12), day(8)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    // 2026-03-01: a new month, and more than a week later.
    t.clock.advance(Duration::days(17));
    assert_eq!(t.engine.reports().weekly().await.unwrap().transactions, 0);
    assert_eq!(t.engine.reports().monthly().await.unwrap().transactions, 0);
}

#[tokio::test]
async fn test_dashboard_snapshot() {
    let t = TestEngine::new().await;
    let scarce = t.product("Oud Wood", 6).await;
    let plenty = t.product("Santal 33", 50).await;

    t.engine
        .orders()
        .create(customer(), vec![OrderLine::new(&scarce.id, 2)])
        .await
        .unwrap();
    t.engine
        .sales()
        .record_walk_in(PaymentMethod::Pos, vec![WalkInLine::new(&plenty.id, 1, 20000)])
        .await
        .unwrap();

    let dashboard = t.engine.reports().dashboard().await.unwrap();
    assert_eq!(dashboard.generated_at, start());
    assert_eq!(dashboard.pending_orders, 1);
    assert_eq!(dashboard.today.revenue, 20000);
    assert_eq!(dashboard.today.transactions, 1);

    assert_eq!(dashboard.low_stock.len(), 1);
    assert_eq!(dashboard.low_stock[0].product_id, scarce.id);
    assert_eq!(dashboard.low_stock[0].available, 4);
}
