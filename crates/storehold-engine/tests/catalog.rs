mod common;

use chrono::Duration;

use common::{customer, start, TestEngine};
use storehold_core::{
    CoreError, Discount, DiscountType, MediaKind, NewProduct, OrderLine, PricingUpdate,
    ProductFilter, MAX_PRICE,
};
use storehold_engine::{EngineError, ErrorKind};

#[tokio::test]
async fn test_archive_blocked_by_pending_order() {
    let t = TestEngine::new().await;
    let p = t.product("Oud Wood", 5).await;

    let order = t
        .engine
        .orders()
        .create(customer(), vec![OrderLine::new(&p.id, 1)])
        .await
        .unwrap();

    let err = t.engine.catalog().archive(&p.id).await.unwrap_err();
    assert!(matches!(err, EngineError::Core(CoreError::ArchiveBlocked(_))));
    assert_eq!(err.kind(), ErrorKind::BusinessRule);
    assert!(!t.engine.catalog().get(&p.id).await.unwrap().is_archived);

    t.engine.orders().cancel(&order.id).await.unwrap();

    let archived = t.engine.catalog().archive(&p.id).await.unwrap();
    assert!(archived.is_archived);
    assert!(archived.archived_at.is_some());

    // Archiving again is a no-op.
    let again = t.engine.catalog().archive(&p.id).await.unwrap();
    assert_eq!(again.archived_at, archived.archived_at);
}

#[tokio::test]
async fn test_paid_orders_do_not_block_archive() {
    let t = TestEngine::new().await;
    let p = t.product("Oud Wood", 5).await;

    let order = t
        .engine
        .orders()
        .create(customer(), vec![OrderLine::new(&p.id, 1)])
        .await
        .unwrap();
    t.engine.orders().mark_paid(&order.id, None).await.unwrap();

    assert!(t.engine.catalog().archive(&p.id).await.unwrap().is_archived);
}

#[tokio::test]
async fn test_restock_and_write_off() {
    let t = TestEngine::new().await;
    let p = t.product("Oud Wood", 5).await;

    t.engine
        .orders()
        .create(customer(), vec![OrderLine::new(&p.id, 3)])
        .await
        .unwrap();

    let level = t.engine.catalog().restock(&p.id, 4).await.unwrap();
    assert_eq!((level.quantity, level.reserved_quantity), (9, 3));

    let level = t.engine.catalog().restock(&p.id, -6).await.unwrap();
    assert_eq!((level.quantity, level.reserved_quantity), (3, 3));

    // Reserved units cannot be written off.
    let err = t.engine.catalog().restock(&p.id, -1).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InsufficientStock);
    assert_eq!(t.counters(&p.id).await, (3, 3));

    let err = t.engine.catalog().restock(&p.id, 0).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let err = t.engine.catalog().restock("missing", 1).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_create_product_validation() {
    let t = TestEngine::new().await;
    let catalog = t.engine.catalog();

    let valid = NewProduct {
        name: "  Oud Wood ".into(),
        description: Some("".into()),
        category: "PERFUMES".into(),
        cost_price: 12000,
        selling_price: 18000,
        quantity: 5,
        discount: None,
        visible_on_website: true,
    };

    let created = catalog.create_product(valid.clone()).await.unwrap();
    assert_eq!(created.name, "Oud Wood");
    assert_eq!(created.description, None);
    assert_eq!(created.reserved_quantity, 0);

    let cases = [
        NewProduct {
            name: " ".into(),
            ..valid.clone()
        },
        NewProduct {
            category: "perfumes".into(),
            ..valid.clone()
        },
        NewProduct {
            selling_price: -1,
            ..valid.clone()
        },
        NewProduct {
            cost_price: MAX_PRICE + 1,
            ..valid.clone()
        },
        NewProduct {
            quantity: -1,
            ..valid.clone()
        },
        NewProduct {
            discount: Some(Discount::new(DiscountType::Percentage, 101)),
            ..valid.clone()
        },
        NewProduct {
            discount: Some(
                Discount::new(DiscountType::Fixed, 500)
                    .with_window(Some(start()), Some(start() - Duration::days(1))),
            ),
            ..valid.clone()
        },
    ];

    for input in cases {
        let err = catalog.create_product(input).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation, "{err}");
    }
}

#[tokio::test]
async fn test_storefront_prices_and_visibility() {
    let t = TestEngine::new().await;
    let on_sale = t.product("Oud Wood", 5).await;
    let hidden = t.product("Santal 33", 5).await;
    let sold_out = t.product("Baccarat Rouge", 0).await;

    t.engine
        .catalog()
        .update_pricing(
            &on_sale.id,
            PricingUpdate {
                cost_price: 12000,
                selling_price: 18000,
                discount: Some(
                    Discount::new(DiscountType::Percentage, 10)
                        .with_window(None, Some(start() + Duration::hours(2))),
                ),
            },
        )
        .await
        .unwrap();
    t.engine.catalog().set_visibility(&hidden.id, false).await.unwrap();

    let listed = t.engine.catalog().storefront().await.unwrap();
    assert_eq!(listed.len(), 2);
    assert!(listed.iter().all(|p| p.id != hidden.id));

    let discounted = listed.iter().find(|p| p.id == on_sale.id).unwrap();
    assert_eq!(discounted.effective_price, 16200);
    assert_eq!(discounted.available, 5);
    assert!(discounted.countdown.active);
    assert_eq!(discounted.countdown.remaining_seconds, Some(7200));

    let empty = listed.iter().find(|p| p.id == sold_out.id).unwrap();
    assert_eq!(empty.available, 0);

    t.clock.advance(Duration::hours(3));
    let later = t.engine.catalog().storefront().await.unwrap();
    let expired = later.iter().find(|p| p.id == on_sale.id).unwrap();
    assert_eq!(expired.effective_price, 18000);
    assert!(!expired.countdown.active);
}

#[tokio::test]
async fn test_media_limit() {
    let t = TestEngine::new().await;
    let p = t.product("Oud Wood", 5).await;
    let catalog = t.engine.catalog();

    for i in 0..3 {
        catalog
            .attach_media(&p.id, &format!("media/oud-{i}.jpg"), MediaKind::Image)
            .await
            .unwrap();
    }

    let err = catalog
        .attach_media(&p.id, "media/oud.mp4", MediaKind::Video)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Core(CoreError::MediaLimitReached { max: 3, .. })
    ));
    assert_eq!(catalog.media(&p.id).await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_list_products() {
    let t = TestEngine::new().await;
    let oud = t.product("Oud Wood", 5).await;
    let santal = t.product("Santal 33", 5).await;
    t.engine.catalog().archive(&santal.id).await.unwrap();

    let active = t.engine.catalog().list(&ProductFilter::default()).await.unwrap();
    assert_eq!(active.total, 1);
    assert_eq!(active.items[0].id, oud.id);

    let all = t
        .engine
        .catalog()
        .list(&ProductFilter {
            include_archived: true,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(all.total, 2);

    let search = t
        .engine
        .catalog()
        .list(&ProductFilter {
            search: Some("oud".into()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(search.total, 1);

    let wildcard = t
        .engine
        .catalog()
        .list(&ProductFilter {
            search: Some("_".into()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(wildcard.total, 0);
}
