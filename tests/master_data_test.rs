mod common;

use assert_matches::assert_matches;
use common::{now, LotSeed, TestApp};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::json;
use warehouse_api::{
    entities::{location::LocationType, product::UnitOfMeasure},
    errors::ServiceError,
    services::master_data::{CreateLocation, CreateProduct, Page, UpdateLocation, UpdateProduct},
};

fn product_input(ean: &str, material_code: &str) -> CreateProduct {
    CreateProduct {
        ean: ean.to_string(),
        material_code: material_code.to_string(),
        name: "Greek Yoghurt 500g".to_string(),
        brand: "Olympus".to_string(),
        uom: UnitOfMeasure::Case,
        mrp: dec!(3.49),
        case_size: 12,
        min_qty: dec!(24),
        max_qty: dec!(240),
    }
}

fn location_input(code: &str) -> CreateLocation {
    CreateLocation {
        code: code.to_string(),
        location_type: LocationType::default(),
        description: None,
        max_weight: None,
        max_volume: None,
    }
}

#[tokio::test]
async fn product_keeps_every_catalogue_field() {
    let app = TestApp::new().await;
    let service = &app.state.services.master_data;

    let product = service
        .create_product(product_input(" 5201054025017 ", " MAT-7781 "), now())
        .await
        .unwrap();

    assert_eq!(product.ean, "5201054025017");
    assert_eq!(product.material_code, "MAT-7781");
    assert_eq!(product.brand, "Olympus");
    assert_eq!(product.uom, UnitOfMeasure::Case);
    assert_eq!(product.mrp, dec!(3.49));
    assert_eq!(product.case_size, 12);
    assert_eq!((product.min_qty, product.max_qty), (dec!(24), dec!(240)));
    assert_eq!(
        service.find_product_by_ean("5201054025017").await.unwrap(),
        product
    );
}

#[tokio::test]
async fn product_defaults_apply_when_omitted() {
    let input: CreateProduct = serde_json::from_value(json!({
        "ean": "5201054025024",
        "material_code": "MAT-7782",
        "name": "Feta 200g",
        "brand": "Olympus",
        "mrp": "2.10"
    }))
    .unwrap();

    assert_eq!(input.uom, UnitOfMeasure::Each);
    assert_eq!(input.case_size, 1);
    assert_eq!((input.min_qty, input.max_qty), (Decimal::ZERO, Decimal::ZERO));
}

#[tokio::test]
async fn ean_and_material_code_are_each_unique() {
    let app = TestApp::new().await;
    let service = &app.state.services.master_data;
    service
        .create_product(product_input("5201054025031", "MAT-7783"), now())
        .await
        .unwrap();

    let same_ean = service
        .create_product(product_input("5201054025031", "MAT-9999"), now())
        .await;
    assert_matches!(same_ean, Err(ServiceError::Conflict(msg)) if msg.contains("EAN"));

    let same_material = service
        .create_product(product_input("5201054025048", "MAT-7783"), now())
        .await;
    assert_matches!(same_material, Err(ServiceError::Conflict(msg)) if msg.contains("Material code"));

    assert_eq!(service.list_products(Page::default()).await.unwrap().len(), 1);
}

#[tokio::test]
async fn product_fields_are_validated() {
    let app = TestApp::new().await;
    let service = &app.state.services.master_data;

    let cases = [
        CreateProduct {
            material_code: "  ".to_string(),
            ..product_input("5201054025055", "x")
        },
        CreateProduct {
            mrp: dec!(-0.01),
            ..product_input("5201054025055", "MAT-1")
        },
        CreateProduct {
            case_size: 0,
            ..product_input("5201054025055", "MAT-1")
        },
        CreateProduct {
            min_qty: dec!(50),
            max_qty: dec!(10),
            ..product_input("5201054025055", "MAT-1")
        },
    ];
    for input in cases {
        assert_matches!(
            service.create_product(input, now()).await,
            Err(ServiceError::ValidationError(_))
        );
    }
    assert!(service.list_products(Page::default()).await.unwrap().is_empty());
}

#[tokio::test]
async fn products_list_in_id_order_by_page() {
    let app = TestApp::new().await;
    let mut seeded = Vec::new();
    for ean in ["4000000000011", "4000000000028", "4000000000035", "4000000000042"] {
        seeded.push(app.product(ean).await.id);
    }
    let service = &app.state.services.master_data;

    let all = service.list_products(Page::default()).await.unwrap();
    assert_eq!(all.iter().map(|p| p.id).collect::<Vec<_>>(), seeded);

    let page = service
        .list_products(Page {
            offset: Some(1),
            limit: Some(2),
        })
        .await
        .unwrap();
    assert_eq!(page.iter().map(|p| p.id).collect::<Vec<_>>(), seeded[1..3].to_vec());
}

#[tokio::test]
async fn product_update_touches_only_given_fields() {
    let app = TestApp::new().await;
    let service = &app.state.services.master_data;
    let product = service
        .create_product(product_input("5201054025062", "MAT-7784"), now())
        .await
        .unwrap();

    let updated = service
        .update_product(
            product.id,
            UpdateProduct {
                name: Some(" Greek Yoghurt 1kg ".to_string()),
                mrp: Some(dec!(5.99)),
                ..UpdateProduct::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.name, "Greek Yoghurt 1kg");
    assert_eq!(updated.mrp, dec!(5.99));
    assert_eq!(updated.brand, product.brand);
    assert_eq!(updated.case_size, product.case_size);
    assert_eq!(updated.ean, product.ean);

    // New min checked against the stored max.
    let too_high = UpdateProduct {
        min_qty: Some(dec!(500)),
        ..UpdateProduct::default()
    };
    assert_matches!(
        service.update_product(product.id, too_high).await,
        Err(ServiceError::ValidationError(_))
    );
    assert_matches!(
        service
            .update_product(
                product.id,
                UpdateProduct {
                    brand: Some(" ".to_string()),
                    ..UpdateProduct::default()
                }
            )
            .await,
        Err(ServiceError::ValidationError(_))
    );
    assert_matches!(
        service.update_product(9090, UpdateProduct::default()).await,
        Err(ServiceError::NotFound(_))
    );
}

#[tokio::test]
async fn product_with_stock_or_receipts_cannot_be_deleted() {
    let app = TestApp::new().await;
    let service = &app.state.services.master_data;
    let idle = app.product("5201054025079").await;
    let stocked = app.product("5201054025086").await;
    let received = app.product("5201054025093").await;
    let shelf = app.location("G-07-01").await;
    app.lot(LotSeed::new(stocked.id, shelf.id, dec!(3), 30)).await;
    app.receipt(&[("5201054025093", dec!(8))]).await;

    for product_id in [stocked.id, received.id] {
        assert_matches!(
            service.delete_product(product_id).await,
            Err(ServiceError::Conflict(_))
        );
    }

    service.delete_product(idle.id).await.unwrap();
    assert_matches!(
        service.delete_product(idle.id).await,
        Err(ServiceError::NotFound(_))
    );
    let left: Vec<i32> = service
        .list_products(Page::default())
        .await
        .unwrap()
        .iter()
        .map(|p| p.id)
        .collect();
    assert_eq!(left, vec![stocked.id, received.id]);
}

#[tokio::test]
async fn location_type_defaults_to_storage_bin() {
    let app = TestApp::new().await;
    let service = &app.state.services.master_data;

    let bin = service
        .create_location(
            CreateLocation {
                description: Some("   ".to_string()),
                ..location_input(" G-07-02 ")
            },
            now(),
        )
        .await
        .unwrap();
    assert_eq!(bin.code, "G-07-02");
    assert_eq!(bin.location_type, LocationType::StorageBin);
    assert_eq!(bin.description, None);

    let dock = service
        .create_location(
            CreateLocation {
                location_type: LocationType::ReceivingDock,
                max_weight: Some(dec!(1500)),
                ..location_input("DOCK-1")
            },
            now(),
        )
        .await
        .unwrap();
    assert_eq!(dock.location_type, LocationType::ReceivingDock);

    assert_matches!(
        service.create_location(location_input("G-07-02"), now()).await,
        Err(ServiceError::Conflict(_))
    );
    assert_matches!(
        service
            .create_location(
                CreateLocation {
                    max_volume: Some(dec!(-1)),
                    ..location_input("G-07-03")
                },
                now()
            )
            .await,
        Err(ServiceError::ValidationError(_))
    );

    let codes: Vec<String> = service
        .list_locations()
        .await
        .unwrap()
        .into_iter()
        .map(|l| l.code)
        .collect();
    assert_eq!(codes, vec!["DOCK-1", "G-07-02"]);
}

#[tokio::test]
async fn location_update_clears_with_null_and_keeps_absent_fields() {
    let app = TestApp::new().await;
    let service = &app.state.services.master_data;
    let location = service
        .create_location(
            CreateLocation {
                description: Some("Chiller aisle".to_string()),
                max_weight: Some(dec!(800)),
                ..location_input("G-07-04")
            },
            now(),
        )
        .await
        .unwrap();

    let update: UpdateLocation = serde_json::from_value(json!({
        "location_type": "QC Area",
        "description": null
    }))
    .unwrap();
    let updated = service.update_location(location.id, update).await.unwrap();

    assert_eq!(updated.location_type, LocationType::QcArea);
    assert_eq!(updated.description, None);
    assert_eq!(updated.max_weight, Some(dec!(800)));
    assert_eq!(updated.code, "G-07-04");

    assert_matches!(
        service
            .update_location(
                location.id,
                UpdateLocation {
                    max_weight: Some(Some(dec!(-5))),
                    ..UpdateLocation::default()
                }
            )
            .await,
        Err(ServiceError::ValidationError(_))
    );
    assert_matches!(
        service.update_location(7070, UpdateLocation::default()).await,
        Err(ServiceError::NotFound(_))
    );
}

#[tokio::test]
async fn location_holding_stock_cannot_be_deleted() {
    let app = TestApp::new().await;
    let service = &app.state.services.master_data;
    let product = app.product("5201054025109").await;
    let full = app.location("G-07-05").await;
    let empty = app.location("G-07-06").await;
    let lot = app.lot(LotSeed::new(product.id, full.id, dec!(2), 30)).await;

    assert_matches!(
        service.delete_location(full.id).await,
        Err(ServiceError::Conflict(msg)) if msg.contains("G-07-05")
    );
    service.delete_location(empty.id).await.unwrap();

    app.state
        .services
        .corrections
        .delete_lot(lot.id)
        .await
        .unwrap();
    service.delete_location(full.id).await.unwrap();
    assert!(service.list_locations().await.unwrap().is_empty());
}
