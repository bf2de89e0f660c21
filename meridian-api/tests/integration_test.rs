use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use meridian_api::{app, AppState};
use meridian_catalog::{CoefficientType, CustomerSectorAssignment, SectorCoefficient};
use meridian_market::{MarketplacePricing, PricingCache, SectorAdmin};
use meridian_shared::Sector;
use meridian_store::app_config::{PricingRules, ShippingRules};
use meridian_store::{InMemoryCacheStore, InMemoryCoefficientStore, ListPriceProvider, StaticPromotionTable};
use serde_json::{json, Value};
use tower::ServiceExt;

async fn test_app() -> Router {
    let prices = Arc::new(ListPriceProvider::new());
    prices.set_price("acme", "ipe-200", 100.0).await;
    prices.set_price("acme", "bolt-m12", 2.0).await;

    let coefficients = Arc::new(InMemoryCoefficientStore::seeded(
        vec![SectorCoefficient::new("acme", Some(Sector::Construction), CoefficientType::Discount, 10.0, 1)],
        vec![CustomerSectorAssignment::new("acme", "builder", Sector::Construction)],
    ));
    let cache = PricingCache::new(
        Arc::new(InMemoryCacheStore::new()),
        Duration::from_secs(300),
        Duration::from_millis(250),
    );

    let pricing = MarketplacePricing::new(
        prices,
        coefficients.clone(),
        cache.clone(),
        Arc::new(StaticPromotionTable::new(Vec::new())),
        PricingRules::default(),
        ShippingRules::default(),
    );

    app(AppState {
        pricing: Arc::new(pricing),
        admin: Arc::new(SectorAdmin::new(coefficients, cache)),
    })
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("x-tenant-id", "acme")
        .body(Body::empty())
        .unwrap()
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("x-tenant-id", "acme")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_health() {
    let app = test_app().await;
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_get_price_for_classified_customer() {
    let app = test_app().await;
    let (status, body) = send(&app, get("/v1/prices/ipe-200?quantity=2&customer_id=builder")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["final_price"], 90.0);
    assert_eq!(body["display_price"], 108.0);
    assert_eq!(body["original_price"], 120.0);
    assert_eq!(body["savings"], 12.0);
    assert_eq!(body["customer_sector"], "CONSTRUCTION");
}

#[tokio::test]
async fn test_price_errors() {
    let app = test_app().await;

    let request = Request::builder().uri("/v1/prices/ipe-200").body(Body::empty()).unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "tenant_id");

    let (status, body) = send(&app, get("/v1/prices/ipe-200?quantity=0")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "quantity");

    let (status, _) = send(&app, get("/v1/prices/unknown")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_bulk_price() {
    let app = test_app().await;
    let (status, body) = send(
        &app,
        post(
            "/v1/prices/bulk",
            json!({
                "customer_id": "builder",
                "items": [
                    { "article_id": "ipe-200", "quantity": 1 },
                    { "article_id": "bolt-m12", "quantity": 10 }
                ]
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"].as_array().unwrap().len(), 2);
    assert_eq!(body["summary"]["subtotal"], 108.0);
    assert_eq!(body["summary"]["total"], 129.6);
}

#[tokio::test]
async fn test_shipping_and_promotion() {
    let app = test_app().await;
    let (status, body) = send(
        &app,
        post(
            "/v1/shipping/cost",
            json!({
                "items": [{ "article_id": "ipe-200", "quantity": 5, "weight_kg": 12.0 }],
                "destination_postal_code": "69002"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["free_shipping"], true);
    assert_eq!(body["shipping_cost"], 0.0);
    assert_eq!(body["estimated_delivery_days"], 4);

    let (status, body) = send(
        &app,
        post(
            "/v1/promotions/apply",
            json!({ "code": "UNKNOWN", "current_price": 50.0, "article_id": "ipe-200" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_reassignment_invalidates_cached_prices() {
    let app = test_app().await;
    let (_, first) = send(&app, get("/v1/prices/ipe-200?customer_id=builder")).await;
    assert_eq!(first["final_price"], 90.0);

    let (status, _) = send(
        &app,
        post("/v1/admin/sectors/assign", json!({ "customer_id": "builder", "sector": "NAVAL" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, second) = send(&app, get("/v1/prices/ipe-200?customer_id=builder")).await;
    assert_eq!(second["final_price"], 100.0);
    assert_eq!(second["customer_sector"], "NAVAL");
}

#[tokio::test]
async fn test_coefficient_lifecycle() {
    let app = test_app().await;
    let (status, created) = send(
        &app,
        post(
            "/v1/admin/coefficients",
            json!({ "coefficient_type": "MARGIN", "coefficient": 1.5, "priority": 20 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, priced) = send(&app, get("/v1/prices/bolt-m12")).await;
    assert_eq!(priced["final_price"], 3.0);

    let id = created["id"].as_str().unwrap();
    let request = Request::builder()
        .method("DELETE")
        .uri(format!("/v1/admin/coefficients/{}", id))
        .header("x-tenant-id", "acme")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, priced) = send(&app, get("/v1/prices/bolt-m12")).await;
    assert_eq!(priced["final_price"], 2.0);

    let (status, invalidated) = send(&app, post("/v1/cache/invalidate-tenant", json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(invalidated["invalidated"], 1);
}

#[tokio::test]
async fn test_list_and_update_coefficients() {
    let app = test_app().await;
    let (status, listed) = send(&app, get("/v1/admin/coefficients?sector=CONSTRUCTION")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);
    let id = listed[0]["id"].as_str().unwrap().to_string();

    let (_, before) = send(&app, get("/v1/prices/ipe-200?customer_id=builder")).await;
    assert_eq!(before["final_price"], 90.0);

    let request = Request::builder()
        .method("PATCH")
        .uri(format!("/v1/admin/coefficients/{}", id))
        .header("x-tenant-id", "acme")
        .header("content-type", "application/json")
        .body(Body::from(json!({ "coefficient": 20.0 }).to_string()))
        .unwrap();
    let (status, updated) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["coefficient"], 20.0);

    let (_, after) = send(&app, get("/v1/prices/ipe-200?customer_id=builder")).await;
    assert_eq!(after["final_price"], 80.0);

    let (_, naval) = send(&app, get("/v1/admin/coefficients?sector=NAVAL")).await;
    assert!(naval.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_price_with_region_bypasses_cache() {
    let app = test_app().await;
    let (status, _) = send(&app, get("/v1/prices/bolt-m12?region=IDF")).await;
    assert_eq!(status, StatusCode::OK);

    let (_, invalidated) = send(&app, post("/v1/cache/invalidate-tenant", json!({}))).await;
    assert_eq!(invalidated["invalidated"], 0);
}
