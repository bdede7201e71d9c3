mod common;

use assert_matches::assert_matches;
use common::{assert_lot_invariants, days, now, LotSeed, TestApp};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use warehouse_api::errors::ServiceError;
use warehouse_api::events::Event;

#[tokio::test]
async fn earliest_expiry_is_reserved_first() {
    let mut app = TestApp::new().await;
    let product = app.product("5000000000011").await;
    let shelf = app.location("A-01-01").await;
    let lot_a = app.lot(LotSeed::new(product.id, shelf.id, dec!(10), 10)).await;
    let lot_b = app.lot(LotSeed::new(product.id, shelf.id, dec!(5), 5)).await;

    let report = app
        .state
        .services
        .allocation
        .allocate(product.id, dec!(12), "0-100", now())
        .await
        .expect("allocation succeeds");

    let taken: Vec<_> = report
        .allocations
        .iter()
        .map(|a| (a.inventory_lot_id, a.quantity))
        .collect();
    assert_eq!(taken, vec![(lot_b.id, dec!(5)), (lot_a.id, dec!(7))]);
    assert_eq!(report.shortfall, Decimal::ZERO);
    assert_eq!(report.reason, None);

    assert_eq!(app.find_lot(lot_b.id).await.unwrap().reserved_quantity, dec!(5));
    assert_eq!(app.find_lot(lot_a.id).await.unwrap().reserved_quantity, dec!(7));
    assert_lot_invariants(&app).await;

    assert_matches!(
        app.drain_events().as_slice(),
        [Event::StockAllocated { allocated, .. }] if *allocated == dec!(12)
    );
}

#[tokio::test]
async fn shortfall_keeps_partial_reservations() {
    let app = TestApp::new().await;
    let product = app.product("5000000000028").await;
    let shelf = app.location("A-01-02").await;
    let lot = app.lot(LotSeed::new(product.id, shelf.id, dec!(4), 30)).await;

    let report = app
        .state
        .services
        .allocation
        .allocate(product.id, dec!(10), "0-100", now())
        .await
        .unwrap();

    assert_eq!(report.allocated, dec!(4));
    assert_eq!(report.shortfall, dec!(6));
    assert_eq!(report.reason.as_deref(), Some("Shortfall of 6"));
    assert_eq!(app.find_lot(lot.id).await.unwrap().reserved_quantity, dec!(4));
}

#[tokio::test]
async fn fully_reserved_stock_is_out_of_stock() {
    let app = TestApp::new().await;
    let product = app.product("5000000000035").await;
    let shelf = app.location("A-01-03").await;
    app.lot(LotSeed::new(product.id, shelf.id, dec!(3), 30).reserved(dec!(3)))
        .await;

    let report = app
        .state
        .services
        .allocation
        .allocate(product.id, dec!(1), "0-100", now())
        .await
        .unwrap();

    assert!(report.allocations.is_empty());
    assert_eq!(report.shortfall, dec!(1));
    assert_eq!(report.reason.as_deref(), Some("Out of Stock"));
}

#[tokio::test]
async fn window_excludes_too_fresh_stock() {
    let app = TestApp::new().await;
    let product = app.product("5000000000042").await;
    let shelf = app.location("A-01-04").await;
    // Made yesterday, expires in 19 days: 95% shelf life left.
    let lot = app
        .lot(LotSeed::new(product.id, shelf.id, dec!(8), 19).made(days(-1)))
        .await;

    let candidates = app
        .state
        .services
        .allocation
        .candidate_lots(product.id, "40-90", now())
        .await
        .unwrap();
    assert!(candidates.is_empty());

    let report = app
        .state
        .services
        .allocation
        .allocate(product.id, dec!(2), "40-90", now())
        .await
        .unwrap();
    assert_eq!(report.reason.as_deref(), Some("Low Shelf Life"));
    assert_eq!(app.find_lot(lot.id).await.unwrap().reserved_quantity, Decimal::ZERO);
}

#[tokio::test]
async fn malformed_window_fails_before_reserving() {
    let app = TestApp::new().await;
    let product = app.product("5000000000059").await;
    let shelf = app.location("A-01-05").await;
    let lot = app.lot(LotSeed::new(product.id, shelf.id, dec!(8), 19)).await;

    for window in ["", "80", "90-40", "a-b", "-5-10"] {
        let result = app
            .state
            .services
            .allocation
            .allocate(product.id, dec!(2), window, now())
            .await;
        assert_matches!(result, Err(ServiceError::ParseError(_)), "window {window:?}");
    }
    assert_eq!(app.find_lot(lot.id).await.unwrap().reserved_quantity, Decimal::ZERO);
}

#[tokio::test]
async fn non_positive_request_is_rejected() {
    let app = TestApp::new().await;
    let product = app.product("5000000000066").await;

    for quantity in [Decimal::ZERO, dec!(-3)] {
        let result = app
            .state
            .services
            .allocation
            .allocate(product.id, quantity, "0-100", now())
            .await;
        assert_matches!(result, Err(ServiceError::QuantityViolation(_)));
    }
}

#[tokio::test]
async fn unknown_product_is_not_found() {
    let app = TestApp::new().await;

    let result = app
        .state
        .services
        .allocation
        .allocate(404, dec!(1), "0-100", now())
        .await;
    assert_matches!(result, Err(ServiceError::NotFound(_)));

    let result = app
        .state
        .services
        .allocation
        .candidate_lots(404, "0-100", now())
        .await;
    assert_matches!(result, Err(ServiceError::NotFound(_)));
}

#[tokio::test]
async fn candidate_lots_are_stable_and_skip_reserved_stock() {
    let app = TestApp::new().await;
    let product = app.product("5000000000073").await;
    let shelf = app.location("A-01-06").await;
    let big = app.lot(LotSeed::new(product.id, shelf.id, dec!(9), 20)).await;
    let small = app
        .lot(LotSeed::new(product.id, shelf.id, dec!(2), 20).batch("SMALL"))
        .await;
    app.lot(LotSeed::new(product.id, shelf.id, dec!(6), 3).reserved(dec!(6)))
        .await;

    let service = &app.state.services.allocation;
    let first = service.candidate_lots(product.id, "0-100", now()).await.unwrap();
    let second = service.candidate_lots(product.id, "0-100", now()).await.unwrap();

    let ids: Vec<_> = first.iter().map(|l| l.id).collect();
    assert_eq!(ids, vec![small.id, big.id]);
    assert_eq!(first, second);
}

#[tokio::test]
async fn successive_allocations_see_earlier_reservations() {
    let app = TestApp::new().await;
    let product = app.product("5000000000080").await;
    let shelf = app.location("A-01-07").await;
    let lot = app.lot(LotSeed::new(product.id, shelf.id, dec!(5), 15)).await;

    let service = &app.state.services.allocation;
    let first = service.allocate(product.id, dec!(3), "0-100", now()).await.unwrap();
    let second = service.allocate(product.id, dec!(3), "0-100", now()).await.unwrap();

    assert_eq!(first.allocated, dec!(3));
    assert_eq!(second.allocated, dec!(2));
    assert_eq!(second.shortfall, dec!(1));
    assert_eq!(app.find_lot(lot.id).await.unwrap().reserved_quantity, dec!(5));
    assert_lot_invariants(&app).await;
}
