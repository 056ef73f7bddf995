use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
    response::Response,
};
use quickcart::cache::CacheConfig;
use quickcart::domain::ids::RecordId;
use quickcart::infra::http::{AppState, build_router};
use quickcart::infra::memory::InMemoryRepositories;
use serde_json::{Value, json};
use tower::ServiceExt;

fn app() -> (Arc<InMemoryRepositories>, Router) {
    let repos = Arc::new(InMemoryRepositories::new());
    let state =
        AppState::from_repositories(repos.clone(), CacheConfig::default(), Duration::from_secs(5));
    (repos, build_router(state))
}

async fn send(router: &Router, method: Method, uri: &str, body: Option<Value>) -> Response {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("request");

    router.clone().oneshot(request).await.expect("response")
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("json body")
}

fn header_value<'a>(response: &'a Response, name: &str) -> &'a str {
    response
        .headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
}

#[tokio::test]
async fn listing_headers_follow_cache_state() {
    let (_, router) = app();
    let created = send(
        &router,
        Method::POST,
        "/api/admin/categories",
        Some(json!({ "name": "Fruits & Vegetables" })),
    )
    .await;
    assert_eq!(created.status(), StatusCode::CREATED);
    assert_eq!(json_body(created).await["slug"], "fruits-vegetables");

    let first = send(&router, Method::GET, "/api/categories", None).await;
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(header_value(&first, "x-cache"), "miss");
    assert_eq!(
        header_value(&first, "cache-control"),
        "public, max-age=300"
    );
    let items = json_body(first).await;
    assert_eq!(items.as_array().map(Vec::len), Some(1));
    assert_eq!(items[0]["description"], "");

    let second = send(&router, Method::GET, "/api/categories", None).await;
    assert_eq!(header_value(&second, "x-cache"), "hit");

    let searched = send(&router, Method::GET, "/api/products?search=apple", None).await;
    assert_eq!(header_value(&searched, "x-cache"), "bypass");
    assert_eq!(
        header_value(&searched, "cache-control"),
        "public, max-age=120"
    );
}

#[tokio::test]
async fn degraded_listing_is_short_lived_empty_list() {
    let (repos, router) = app();
    repos.set_unavailable(true);

    let response = send(&router, Method::GET, "/api/banners", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header_value(&response, "x-cache"), "miss");
    assert_eq!(
        header_value(&response, "cache-control"),
        "public, max-age=10"
    );
    assert_eq!(json_body(response).await, json!([]));
}

#[tokio::test]
async fn error_bodies_carry_code_and_message() {
    let (repos, router) = app();

    let blank = send(
        &router,
        Method::POST,
        "/api/admin/categories",
        Some(json!({ "name": "  " })),
    )
    .await;
    assert_eq!(blank.status(), StatusCode::BAD_REQUEST);
    let body = json_body(blank).await;
    assert_eq!(body["error"], "validation");
    assert!(body["message"].as_str().is_some_and(|m| m.contains("name")));

    for uri in [
        "/api/products?featured=maybe",
        "/api/admin/audit?limit=lots",
        "/api/admin/inventory/snapshots?limit=-1",
    ] {
        let rejected = send(&router, Method::GET, uri, None).await;
        assert_eq!(rejected.status(), StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(json_body(rejected).await["error"], "validation", "{uri}");
    }

    let malformed = send(&router, Method::GET, "/api/products/xyz", None).await;
    assert_eq!(malformed.status(), StatusCode::BAD_REQUEST);

    let missing_uri = format!("/api/products/{}", RecordId::generate());
    let missing = send(&router, Method::GET, &missing_uri, None).await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(missing).await["error"], "not_found");

    let bad_json = send(
        &router,
        Method::POST,
        "/api/admin/banners",
        Some(json!({ "image": "hero.png" })),
    )
    .await;
    assert_eq!(bad_json.status(), StatusCode::BAD_REQUEST);

    repos.set_unavailable(true);
    let outage = send(
        &router,
        Method::POST,
        "/api/admin/categories",
        Some(json!({ "name": "Dairy" })),
    )
    .await;
    assert_eq!(outage.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json_body(outage).await["error"], "internal");
}

#[tokio::test]
async fn product_lifecycle_over_http() {
    let (_, router) = app();
    let category = json_body(
        send(
            &router,
            Method::POST,
            "/api/admin/categories",
            Some(json!({ "name": "Snacks" })),
        )
        .await,
    )
    .await;

    let created = send(
        &router,
        Method::POST,
        "/api/admin/products",
        Some(json!({
            "name": "Potato Chips",
            "category_id": category["id"],
            "price": 80.0,
            "original_price": 100.0,
        })),
    )
    .await;
    assert_eq!(created.status(), StatusCode::CREATED);
    let product = json_body(created).await;
    assert_eq!(product["discount"], 20);
    assert_eq!(product["unit"], "1 pc");
    let product_uri = format!("/api/admin/products/{}", product["id"].as_str().expect("id"));

    let warm = send(&router, Method::GET, "/api/products", None).await;
    assert_eq!(header_value(&warm, "x-cache"), "miss");
    assert_eq!(json_body(warm).await.as_array().map(Vec::len), Some(1));

    let cleared = send(
        &router,
        Method::PATCH,
        &product_uri,
        Some(json!({ "original_price": null })),
    )
    .await;
    assert_eq!(cleared.status(), StatusCode::OK);
    assert!(json_body(cleared).await["discount"].is_null());

    let deleted = send(&router, Method::DELETE, &product_uri, None).await;
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);

    let listed = send(&router, Method::GET, "/api/products", None).await;
    assert_eq!(header_value(&listed, "x-cache"), "miss");
    assert_eq!(json_body(listed).await, json!([]));

    let again = send(&router, Method::DELETE, &product_uri, None).await;
    assert_eq!(again.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn snapshot_and_rollback_endpoints() {
    let (_, router) = app();
    let category = json_body(
        send(
            &router,
            Method::POST,
            "/api/admin/categories",
            Some(json!({ "name": "Dairy" })),
        )
        .await,
    )
    .await;
    send(
        &router,
        Method::POST,
        "/api/admin/products",
        Some(json!({ "name": "Curd", "category_id": category["id"], "price": 25.0 })),
    )
    .await;

    let created = send(&router, Method::POST, "/api/admin/inventory/snapshots", None).await;
    assert_eq!(created.status(), StatusCode::CREATED);
    let snapshot = json_body(created).await;
    assert_eq!(snapshot["product_count"], 1);
    let id = snapshot["id"].as_str().expect("snapshot id").to_string();

    let detail = send(
        &router,
        Method::GET,
        &format!("/api/admin/inventory/snapshots/{id}"),
        None,
    )
    .await;
    assert_eq!(detail.status(), StatusCode::OK);
    let detail = json_body(detail).await;
    assert_eq!(detail["products"][0]["name"], "Curd");
    assert_eq!(detail["products"][0]["category_name"], "Dairy");

    let rollback = send(
        &router,
        Method::POST,
        &format!("/api/admin/inventory/snapshots/{id}/rollback"),
        None,
    )
    .await;
    assert_eq!(rollback.status(), StatusCode::OK);
    let report = json_body(rollback).await;
    assert_eq!(report["success"], true);
    assert_eq!(report["stats"]["restored"], 1);
    assert_eq!(report["stats"]["created"], 0);
    assert!(report.get("errors").is_none());

    let listed = json_body(
        send(
            &router,
            Method::GET,
            "/api/admin/inventory/snapshots?limit=10",
            None,
        )
        .await,
    )
    .await;
    assert_eq!(listed.as_array().map(Vec::len), Some(2));

    let unknown = send(
        &router,
        Method::POST,
        &format!(
            "/api/admin/inventory/snapshots/{}/rollback",
            RecordId::generate()
        ),
        None,
    )
    .await;
    assert_eq!(unknown.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn cache_purge_reports_evicted_entries() {
    let (_, router) = app();
    send(&router, Method::GET, "/api/categories", None).await;
    send(&router, Method::GET, "/api/banners", None).await;

    let purged = send(
        &router,
        Method::POST,
        "/api/admin/cache/purge",
        Some(json!({ "pattern": "categories" })),
    )
    .await;
    assert_eq!(purged.status(), StatusCode::OK);
    assert_eq!(json_body(purged).await, json!({ "evicted": 1 }));

    let everything = send(&router, Method::POST, "/api/admin/cache/purge", None).await;
    assert_eq!(json_body(everything).await, json!({ "evicted": 1 }));

    let audit = json_body(send(&router, Method::GET, "/api/admin/audit", None).await).await;
    assert_eq!(audit[0]["action"], "cache.purge");
}

#[tokio::test]
async fn health_reflects_store_availability() {
    let (repos, router) = app();
    let healthy = send(&router, Method::GET, "/health", None).await;
    assert_eq!(healthy.status(), StatusCode::OK);

    repos.set_unavailable(true);
    let unhealthy = send(&router, Method::GET, "/health", None).await;
    assert_eq!(unhealthy.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn address_routes_keep_one_default() {
    let (_, router) = app();
    let home = json_body(
        send(
            &router,
            Method::POST,
            "/api/users/u-1/addresses",
            Some(json!({
                "label": "Home",
                "line1": "12 Lake Road",
                "city": "Pune",
                "postal_code": "411001",
            })),
        )
        .await,
    )
    .await;
    assert_eq!(home["is_default"], true);

    let work = json_body(
        send(
            &router,
            Method::POST,
            "/api/users/u-1/addresses",
            Some(json!({
                "label": "Work",
                "line1": "4 MG Road",
                "city": "Pune",
                "postal_code": "411002",
            })),
        )
        .await,
    )
    .await;
    assert_eq!(work["is_default"], false);

    let switched = send(
        &router,
        Method::POST,
        &format!(
            "/api/users/u-1/addresses/{}/default",
            work["id"].as_str().expect("id")
        ),
        None,
    )
    .await;
    assert_eq!(switched.status(), StatusCode::OK);

    let listed = json_body(send(&router, Method::GET, "/api/users/u-1/addresses", None).await).await;
    let defaults: Vec<&str> = listed
        .as_array()
        .expect("array")
        .iter()
        .filter(|address| address["is_default"] == true)
        .filter_map(|address| address["label"].as_str())
        .collect();
    assert_eq!(defaults, vec!["Work"]);
}
