use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::Request;
use serde_json::{json, Value};
use tower::ServiceExt;
use vendorsync_core::{Environment, SubStepPolicy};
use vendorsync_shopify::{BatchConfig, RetryPolicy};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::*;

const API: &str = "/admin/api/2024-10";

fn test_config(env: Environment, api_keys: Vec<String>) -> AppConfig {
    AppConfig {
        shop_domain: "acme.myshopify.com".into(),
        access_token: "shpat_test".into(),
        api_version: "2024-10".into(),
        env,
        bind_addr: "127.0.0.1:0".parse().expect("socket addr"),
        log_level: "info".into(),
        api_keys,
        request_timeout_secs: 5,
        inter_request_delay_ms: 0,
        max_attempts: 3,
        default_retry_after_secs: 0,
        max_retry_after_secs: 0,
        max_batch_size: 3,
        page_size: 250,
        sub_step_policy: SubStepPolicy::FailSoft,
    }
}

fn app_with(server: &MockServer, env: Environment, auth: AuthState) -> Router {
    let shopify = ShopifyClient::new(&format!("{}{API}", server.uri()), "shpat_test", 5)
        .expect("client")
        .with_retry(RetryPolicy::immediate(3))
        .with_paging(250, Duration::ZERO);
    let batch = BatchProcessor::new(
        BatchConfig {
            max_batch_size: 3,
            inter_item_delay: Duration::ZERO,
        },
        RetryPolicy::immediate(3),
    );
    build_app(
        AppState {
            shopify: Arc::new(shopify),
            batch,
            config: Arc::new(test_config(env, Vec::new())),
        },
        auth,
    )
}

fn app(server: &MockServer) -> Router {
    app_with(server, Environment::Test, AuthState::disabled())
}

async fn call(app: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    call_raw(app, method, uri, body.map(|b| b.to_string())).await
}

async fn call_raw(app: Router, method: &str, uri: &str, body: Option<String>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    let body = body.map_or_else(Body::empty, Body::from);
    let response = app
        .oneshot(request.body(body).expect("request"))
        .await
        .expect("response");

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json parse")
    };
    (status, json)
}

fn indices(entries: &Value) -> Vec<u64> {
    entries
        .as_array()
        .expect("array")
        .iter()
        .map(|e| e["index"].as_u64().expect("index"))
        .collect()
}

async fn mount_inventory_ok(server: &MockServer, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path(format!("{API}/inventory_levels/set.json")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "inventory_level": { "location_id": 1, "inventory_item_id": 2, "available": 5 }
        })))
        .expect(expected_calls)
        .mount(server)
        .await;
}

// -------------------------------------------------------------------------
// Envelope, health and auth
// -------------------------------------------------------------------------

#[test]
fn api_error_validation_error_maps_to_bad_request() {
    let response = ApiError::new("req-1", "validation_error", "invalid input").into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[test]
fn api_error_rate_limited_maps_to_429() {
    let response = ApiError::new("req-1", "rate_limited", "slow down").into_response();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[test]
fn shopify_error_detail_is_only_exposed_in_development() {
    let err = ShopifyError::UnexpectedStatus {
        status: 422,
        url: "products.json".into(),
        body: Some(json!({ "errors": { "title": ["can't be blank"] } })),
    };
    assert!(map_shopify_error("r", &err, false).error.detail.is_none());
    assert!(map_shopify_error("r", &err, true).error.detail.is_some());
}

#[test]
fn batch_status_codes() {
    assert_eq!(batch::status_code(vendorsync_shopify::BatchStatus::Success), StatusCode::OK);
    assert_eq!(
        batch::status_code(vendorsync_shopify::BatchStatus::Partial),
        StatusCode::MULTI_STATUS
    );
    assert_eq!(
        batch::status_code(vendorsync_shopify::BatchStatus::Failure),
        StatusCode::BAD_REQUEST
    );
}

#[tokio::test]
async fn health_is_public_and_echoes_request_id() {
    let server = MockServer::start().await;
    let app = app_with(
        &server,
        Environment::Production,
        AuthState::with_keys(vec!["k".into()]),
    );

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .header("x-request-id", "req-abc")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("x-request-id").and_then(|v| v.to_str().ok()),
        Some("req-abc")
    );
}

#[tokio::test]
async fn protected_routes_require_bearer_token() {
    let server = MockServer::start().await;
    mount_inventory_ok(&server, 1).await;
    let auth = AuthState::with_keys(vec!["secret".into()]);
    let body = json!({ "inventory_updates": [
        { "shopify_location_id": 1, "shopify_inventory_item_id": 2, "quantity": 5 }
    ] });

    let (status, json) = call(
        app_with(&server, Environment::Test, auth.clone()),
        "PUT",
        "/api/vendor/inventory",
        Some(body.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["success"], false);

    let response = app_with(&server, Environment::Test, auth)
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/api/vendor/inventory")
                .header(header::CONTENT_TYPE, "application/json")
                .header(header::AUTHORIZATION, "Bearer secret")
                .body(Body::from(body.to_string()))
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
}

#[test]
fn auth_is_required_outside_development() {
    let prod = test_config(Environment::Production, Vec::new());
    assert!(AuthState::from_config(&prod).is_err());

    let dev = test_config(Environment::Development, Vec::new());
    assert!(!AuthState::from_config(&dev).expect("dev allows no keys").enabled);

    let keyed = test_config(Environment::Production, vec!["k".into()]);
    assert!(AuthState::from_config(&keyed).expect("keys set").enabled);
}

// -------------------------------------------------------------------------
// Batch outcomes
// -------------------------------------------------------------------------

#[tokio::test]
async fn invalid_middle_item_returns_207_with_both_partitions() {
    let server = MockServer::start().await;
    mount_inventory_ok(&server, 2).await;

    let (status, json) = call(
        app(&server),
        "PUT",
        "/api/inventory/graphql",
        Some(json!({ "inventory_updates": [
            { "shopify_location_id": 1, "shopify_inventory_item_id": 2, "quantity": 5 },
            { "shopify_location_id": 1, "shopify_inventory_item_id": 3 },
            { "shopify_location_id": "1", "shopify_inventory_item_id": "4", "quantity": "7" }
        ] })),
    )
    .await;

    assert_eq!(status, StatusCode::MULTI_STATUS);
    assert_eq!(json["success"], false);
    assert_eq!(json["status"], "partial");
    assert_eq!(json["total"], 3);
    assert_eq!(json["successful"], 2);
    assert_eq!(json["failed"], 1);
    assert_eq!(indices(&json["results"]), vec![0, 2]);
    assert_eq!(indices(&json["errors"]), vec![1]);
    assert_eq!(json["errors"][0]["kind"], "validation_error");
    assert_eq!(json["errors"][0]["shopify_inventory_item_id"], 3);
    assert_eq!(json["errors"][0]["error"], "missing required field: quantity");
}

#[tokio::test]
async fn single_invalid_item_returns_400_without_calling_shopify() {
    let server = MockServer::start().await;
    mount_inventory_ok(&server, 0).await;

    let (status, json) = call(
        app(&server),
        "PUT",
        "/api/vendor/inventory",
        Some(json!({ "inventory_updates": [{ "shopify_location_id": 1 }] })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["status"], "failure");
    assert_eq!(json["results"], json!([]));
    assert_eq!(indices(&json["errors"]), vec![0]);
}

#[tokio::test]
async fn oversized_batch_is_rejected_before_any_call() {
    let server = MockServer::start().await;
    mount_inventory_ok(&server, 0).await;
    let update = json!({ "shopify_location_id": 1, "shopify_inventory_item_id": 2, "quantity": 5 });

    let (status, json) = call(
        app(&server),
        "PUT",
        "/api/vendor/inventory",
        Some(json!({ "inventory_updates": [update.clone(), update.clone(), update.clone(), update] })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "validation_error");
    let message = json["error"]["message"].as_str().expect("message");
    assert!(message.contains("limit of 3"), "message: {message}");
    assert!(message.contains('4'), "message: {message}");
}

#[tokio::test]
async fn missing_or_empty_array_is_rejected() {
    let server = MockServer::start().await;

    let (status, json) = call(app(&server), "PUT", "/api/vendor/prices", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "validation_error");

    let (status, _) = call(
        app(&server),
        "PUT",
        "/api/vendor/prices",
        Some(json!({ "price_updates": [] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn throttled_price_update_is_retried_to_success() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path(format!("{API}/variants/11.json")))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(format!("{API}/variants/11.json")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "variant": { "id": 11, "price": "12.00", "compare_at_price": "15.00" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (status, json) = call(
        app(&server),
        "PUT",
        "/api/vendor/prices",
        Some(json!({ "price_updates": [
            { "shopify_variant_id": 11, "new_price": 12, "compare_at_price": "15.00" }
        ] })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["results"][0]["result"]["price"], "12.00");
}

#[tokio::test]
async fn persistent_throttling_fails_only_that_item() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path(format!("{API}/products/1.json")))
        .respond_with(ResponseTemplate::new(429))
        .expect(3)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(format!("{API}/products/2.json")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "product": { "id": 2, "title": "Two", "status": "archived" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (status, json) = call(
        app(&server),
        "PUT",
        "/api/vendor/products/disable",
        Some(json!({ "disable_requests": [
            { "shopify_product_id": 1 },
            { "shopify_product_id": 2 }
        ] })),
    )
    .await;

    assert_eq!(status, StatusCode::MULTI_STATUS);
    assert_eq!(json["errors"][0]["kind"], "rate_limited");
    assert_eq!(json["errors"][0]["shopify_product_id"], 1);
    assert_eq!(json["results"][0]["result"]["status"], "archived");
}

// -------------------------------------------------------------------------
// Item parsing and body rejection
// -------------------------------------------------------------------------

#[tokio::test]
async fn non_object_item_fails_alone() {
    let server = MockServer::start().await;
    mount_inventory_ok(&server, 1).await;

    let (status, json) = call(
        app(&server),
        "PUT",
        "/api/inventory/graphql",
        Some(json!({
            "inventory_updates": [
                { "shopify_location_id": 1, "shopify_inventory_item_id": 2, "quantity": 5 },
                "not-an-object"
            ]
        })),
    )
    .await;

    assert_eq!(status, StatusCode::MULTI_STATUS);
    assert_eq!(indices(&json["results"]), vec![0]);
    assert_eq!(indices(&json["errors"]), vec![1]);
    assert_eq!(json["errors"][0]["kind"], "validation_error");
    assert_eq!(json["errors"][0]["error"], "item must be a JSON object");
}

#[tokio::test]
async fn mistyped_nested_field_fails_only_its_product() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{API}/products.json")))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "product": { "id": 600, "title": "Cap", "variants": [{ "id": 601, "price": "9.00", "sku": "C-1" }] }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (status, json) = call(
        app(&server),
        "POST",
        "/api/vendor/products",
        Some(json!({
            "vendor_id": "acme",
            "products": [
                { "title": "Cap", "variants": [{ "price": "9.00", "sku": "C-1", "option1": "Red" }] },
                { "title": "Scarf", "variants": [{ "price": "12.00", "sku": "S-1", "option1": 5 }] }
            ]
        })),
    )
    .await;

    assert_eq!(status, StatusCode::MULTI_STATUS);
    assert_eq!(json["results"][0]["result"]["shopify_id"], 600);
    assert_eq!(json["errors"][0]["index"], 1);
    assert_eq!(json["errors"][0]["kind"], "validation_error");
    let message = json["errors"][0]["error"].as_str().expect("message");
    assert!(message.starts_with("invalid item:"), "{message}");
}

#[tokio::test]
async fn malformed_body_uses_error_envelope() {
    let server = MockServer::start().await;

    let (status, json) = call_raw(
        app(&server),
        "PUT",
        "/api/vendor/prices",
        Some("{\"price_updates\": [".to_owned()),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["success"], false);
    assert_eq!(json["error"]["code"], "validation_error");
    assert!(json["meta"]["request_id"].is_string());
}

#[tokio::test]
async fn wrongly_typed_array_field_uses_error_envelope() {
    let server = MockServer::start().await;

    let (status, json) = call(
        app(&server),
        "PUT",
        "/api/vendor/inventory",
        Some(json!({ "inventory_updates": "everything" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "validation_error");
}

#[test]
fn local_faults_map_to_fatal_error() {
    let error = ShopifyError::PaginationLimit {
        path: "products.json".into(),
        max_pages: 10,
    };
    let api = map_shopify_error("req-1", &error, false);
    assert_eq!(api.error.code, "fatal_error");
    assert!(api.error.detail.is_none());
    assert_eq!(api.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);

    let error = ShopifyError::InvalidShopUrl {
        shop: "bad shop".into(),
        reason: "not a host".into(),
    };
    assert_eq!(map_shopify_error("req-1", &error, true).error.code, "fatal_error");

    let error = ShopifyError::NotFound { url: "x".into() };
    assert_eq!(map_shopify_error("req-1", &error, true).error.code, "not_found");
}

// -------------------------------------------------------------------------
// Products
// -------------------------------------------------------------------------

#[tokio::test]
async fn create_requires_vendor_id() {
    let server = MockServer::start().await;

    let (status, json) = call(
        app(&server),
        "POST",
        "/api/vendor/products",
        Some(json!({ "products": [{ "title": "Tote", "variants": [{ "price": "1", "sku": "T" }] }] })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["message"], "vendor_id is required");
}

#[tokio::test]
async fn create_sends_vendor_and_validates_variants() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("{API}/products.json")))
        .and(wiremock::matchers::body_partial_json(json!({
            "product": { "title": "Tote", "vendor": "acme", "tags": "bags, summer" }
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "product": { "id": 500, "title": "Tote", "variants": [{ "id": 501, "price": "20.00", "sku": "T-1" }] }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (status, json) = call(
        app(&server),
        "POST",
        "/api/vendor/products",
        Some(json!({
            "vendor_id": "acme",
            "products": [
                {
                    "title": "Tote",
                    "tags": ["bags", "summer"],
                    "variants": [{ "price": "20.00", "sku": "T-1" }],
                    "images": [{ "url": "https://cdn.example.com/tote.jpg" }]
                },
                { "title": "Bad", "variants": [{ "price": "5.00" }] }
            ]
        })),
    )
    .await;

    assert_eq!(status, StatusCode::MULTI_STATUS);
    assert_eq!(json["results"][0]["result"]["shopify_id"], 500);
    assert_eq!(json["results"][0]["result"]["variants"][0]["shopify_variant_id"], 501);
    assert_eq!(json["errors"][0]["index"], 1);
    assert_eq!(
        json["errors"][0]["error"],
        "variants[0]: missing required field: sku"
    );
}

#[tokio::test]
async fn product_query_reports_missing_ids_inline() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("{API}/products/1.json")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "product": { "id": 1, "title": "One", "tags": "x" }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{API}/products/2.json")))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let (status, json) = call(
        app(&server),
        "GET",
        "/api/vendor/products/query?product_ids=1,2,abc",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::MULTI_STATUS);
    assert_eq!(indices(&json["results"]), vec![0]);
    assert_eq!(indices(&json["errors"]), vec![1, 2]);
    assert_eq!(json["errors"][0]["kind"], "upstream_error");
    assert_eq!(json["errors"][1]["kind"], "validation_error");
    assert_eq!(json["results"][0]["result"]["tags"], json!(["x"]));
}

#[tokio::test]
async fn list_products_walks_pages() {
    let server = MockServer::start().await;
    let next_link = format!(
        "<{base}{API}/products.json?limit=250&page_info=p2>; rel=\"next\"",
        base = server.uri()
    );

    Mock::given(method("GET"))
        .and(path(format!("{API}/products.json")))
        .and(wiremock::matchers::query_param_is_missing("page_info"))
        .and(wiremock::matchers::query_param("status", "active"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "products": [{ "id": 1, "title": "One" }] }))
                .insert_header("Link", next_link.as_str()),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{API}/products.json")))
        .and(wiremock::matchers::query_param("page_info", "p2"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "products": [{ "id": 2, "title": "Two" }] })),
        )
        .mount(&server)
        .await;

    let (status, json) = call(app(&server), "GET", "/api/products?status=active", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["count"], 2);
    assert_eq!(json["data"]["products"][1]["shopify_id"], 2);
}

// -------------------------------------------------------------------------
// Variants and customers
// -------------------------------------------------------------------------

#[tokio::test]
async fn variant_delete_rejects_malformed_gid() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (status, json) = call(
        app(&server),
        "POST",
        "/api/products/variant/delete",
        Some(json!({ "variants": [{ "variant_id": "gid://shopify/Product/9" }] })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["errors"][0]["kind"], "validation_error");
    assert_eq!(json["errors"][0]["variant_id"], "gid://shopify/Product/9");
}

#[tokio::test]
async fn default_variant_cleanup_reports_each_product() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("{API}/products/8/variants.json")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "variants": [
            { "id": 80, "product_id": 8, "title": "Default Title" },
            { "id": 81, "product_id": 8, "title": "Large" }
        ] })))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(format!("{API}/products/8/variants/80.json")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let (status, json) = call(
        app(&server),
        "POST",
        "/api/products/graphql/deleteDefaultVariants",
        Some(json!({ "product_ids": ["gid://shopify/Product/8"] })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["results"][0]["result"]["deleted_variant_id"], 80);
}

#[tokio::test]
async fn unknown_customer_maps_to_404() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{API}/customers/77.json")))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let (status, json) = call(app(&server), "GET", "/api/vendor/customers/77", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"]["code"], "not_found");
    assert_eq!(json["success"], false);
}

#[tokio::test]
async fn malformed_customer_id_is_a_validation_error() {
    let server = MockServer::start().await;

    let (status, json) = call(app(&server), "GET", "/api/vendor/customers/abc", None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "validation_error");
}

// -------------------------------------------------------------------------
// Orders and customer listings
// -------------------------------------------------------------------------

#[tokio::test]
async fn unmatched_order_number_is_404() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{API}/orders.json")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "orders": [] })))
        .mount(&server)
        .await;

    let (status, json) = call(app(&server), "GET", "/api/orders?order_number=1001", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"]["code"], "not_found");
    assert_eq!(json["error"]["message"], "order 1001 not found");
}

#[tokio::test]
async fn order_listing_rejects_out_of_range_limit() {
    let server = MockServer::start().await;

    let (status, json) = call(app(&server), "GET", "/api/orders?limit=500", None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "validation_error");
}

#[tokio::test]
async fn order_listing_counts_orders() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{API}/orders.json")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "orders": [{ "id": 1 }, { "id": 2 }, { "id": 3 }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (status, json) = call(app(&server), "GET", "/api/orders?financial_status=paid", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["count"], 3);
}

#[tokio::test]
async fn mark_paid_rejects_zero_amount_without_calling_shopify() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let (status, json) = call(
        app(&server),
        "POST",
        "/api/orders/7/mark-paid",
        Some(json!({ "payment_details": { "amount": 0, "currency": "usd" } })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        json["error"]["message"],
        "payment_details.amount must be greater than zero"
    );
}

#[tokio::test]
async fn mark_paid_records_capture_in_upper_case_currency() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{API}/orders/7/transactions.json")))
        .and(wiremock::matchers::body_partial_json(json!({
            "transaction": { "kind": "capture", "currency": "USD", "amount": "40.50" }
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "transaction": { "id": 900, "status": "success" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (status, json) = call(
        app(&server),
        "POST",
        "/api/orders/7/mark-paid",
        Some(json!({ "payment_details": { "amount": "40.50", "currency": "usd" } })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["order_id"], 7);
    assert_eq!(json["data"]["transaction"]["id"], 900);
}

#[tokio::test]
async fn customer_listing_counts_customers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{API}/customers.json")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "customers": [{ "id": 1 }, { "id": 2 }]
        })))
        .mount(&server)
        .await;

    let (status, json) = call(app(&server), "GET", "/api/customers?limit=2", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["count"], 2);
}

#[tokio::test]
async fn default_address_of_unknown_customer_is_404() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{API}/graphql.json")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": { "customer": null } })))
        .mount(&server)
        .await;

    let (status, json) = call(
        app(&server),
        "GET",
        "/api/customers/graphql/default-address/8",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"]["code"], "not_found");
}

// -------------------------------------------------------------------------
// Product and variant flows
// -------------------------------------------------------------------------

#[tokio::test]
async fn product_delete_returns_deleted_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{API}/graphql.json")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": { "productDelete": {
            "deletedProductId": "gid://shopify/Product/4", "userErrors": []
        } } })))
        .expect(1)
        .mount(&server)
        .await;

    let (status, json) = call(
        app(&server),
        "DELETE",
        "/api/products/graphql/delete",
        Some(json!({ "product_id": "gid://shopify/Product/4" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["deleted_product_id"], "gid://shopify/Product/4");
}

#[tokio::test]
async fn graphql_user_errors_map_to_validation_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{API}/graphql.json")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": { "productDelete": {
            "deletedProductId": null,
            "userErrors": [{ "field": ["id"], "message": "Product does not exist" }]
        } } })))
        .mount(&server)
        .await;

    let (status, json) = call(
        app(&server),
        "DELETE",
        "/api/products/graphql/delete",
        Some(json!({ "product_id": 4 })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "validation_error");
    assert_eq!(
        json["error"]["message"],
        "productDelete rejected: id: Product does not exist"
    );
}

#[tokio::test]
async fn full_creation_requires_variants() {
    let server = MockServer::start().await;

    let (status, json) = call(
        app(&server),
        "POST",
        "/api/products/graphql/create-full",
        Some(json!({ "input": { "title": "Tote", "variants": [] } })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["message"], "at least one variant is required");
}

#[tokio::test]
async fn full_creation_with_one_variant_rewrites_placeholder() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{API}/products.json")))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "product": {
            "id": 5, "title": "Tote",
            "variants": [{ "id": 50, "product_id": 5, "title": "Default Title" }]
        } })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(format!("{API}/variants/50.json")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "variant": {
            "id": 50, "product_id": 5, "title": "Default Title", "sku": "TOTE", "price": "19.99"
        } })))
        .expect(1)
        .mount(&server)
        .await;

    let (status, json) = call(
        app(&server),
        "POST",
        "/api/products/graphql/create-full",
        Some(json!({ "input": {
            "title": "Tote",
            "status": "ACTIVE",
            "variants": [{ "price": "19.99", "sku": "TOTE" }]
        } })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["product_id"], 5);
    assert_eq!(json["data"]["variants"][0]["sku"], "TOTE");
}

#[tokio::test]
async fn variant_update_requires_a_change() {
    let server = MockServer::start().await;

    let (status, json) = call(
        app(&server),
        "POST",
        "/api/products/graphql/variant/update",
        Some(json!({ "shopify_id": 1, "variant_id": 20 })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"]["message"]
        .as_str()
        .expect("message")
        .starts_with("nothing to update"));
}

#[tokio::test]
async fn variant_update_applies_price() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path(format!("{API}/variants/20.json")))
        .and(wiremock::matchers::body_partial_json(json!({ "variant": { "id": 20, "price": "12.50" } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "variant": {
            "id": 20, "product_id": 1, "title": "Small", "price": "12.50"
        } })))
        .expect(1)
        .mount(&server)
        .await;

    let (status, json) = call(
        app(&server),
        "POST",
        "/api/products/graphql/variant/update",
        Some(json!({ "shopify_id": "1", "variant_id": "gid://shopify/ProductVariant/20", "price": "12.50" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["updated_fields"], json!(["price"]));
}

#[tokio::test]
async fn variant_media_requires_images_array() {
    let server = MockServer::start().await;

    let (status, json) = call(
        app(&server),
        "POST",
        "/api/products/variant/update-media",
        Some(json!({ "variant_id": 20 })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["message"], "images must be an array");
}

#[tokio::test]
async fn variant_creation_reports_missing_fields_together() {
    let server = MockServer::start().await;

    let (status, json) = call(
        app(&server),
        "POST",
        "/api/products/variant/graphql",
        Some(json!({ "variant": { "sku": "V-1" } })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        json["error"]["message"],
        "missing required field: product_id; missing required field: variant.price"
    );
}
