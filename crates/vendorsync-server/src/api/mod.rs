mod batch;
mod customers;
mod extract;
mod fields;
mod inventory;
mod orders;
mod prices;
mod product_flows;
mod products;
mod variants;

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{delete, get, post, put},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use vendorsync_core::AppConfig;
use vendorsync_shopify::{BatchProcessor, ShopifyClient, ShopifyError};

use crate::middleware::{request_id, require_bearer_auth, AuthState, RequestId};

#[derive(Clone)]
pub struct AppState {
    pub shopify: Arc<ShopifyClient>,
    pub batch: BatchProcessor,
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Whether upstream error payloads may be echoed to callers.
    pub(super) fn expose_detail(&self) -> bool {
        self.config.env.is_development()
    }
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
    pub meta: ResponseMeta,
}

impl<T: Serialize> ApiResponse<T> {
    pub(super) fn ok(request_id: String, data: T) -> Self {
        Self {
            success: true,
            data,
            meta: ResponseMeta::new(request_id),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub success: bool,
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<serde_json::Value>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    shop: String,
    api_version: String,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            success: false,
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
                detail: None,
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }

    #[must_use]
    pub fn with_detail(mut self, detail: Option<serde_json::Value>) -> Self {
        self.error.detail = detail;
        self
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "forbidden" => StatusCode::FORBIDDEN,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

/// Maps a failed standalone Shopify call (outside a batch) to an API error.
pub(super) fn map_shopify_error(
    request_id: &str,
    error: &ShopifyError,
    expose_detail: bool,
) -> ApiError {
    let code = match error {
        ShopifyError::RateLimited { .. } => "rate_limited",
        ShopifyError::NotFound { .. } => "not_found",
        ShopifyError::Refused { .. } | ShopifyError::UserErrors { .. } => "validation_error",
        ShopifyError::UnexpectedStatus { status: 401, .. } => "unauthorized",
        ShopifyError::UnexpectedStatus { status: 403, .. } => "forbidden",
        ShopifyError::Deserialize { .. }
        | ShopifyError::InvalidShopUrl { .. }
        | ShopifyError::PaginationLimit { .. } => "fatal_error",
        _ => "upstream_error",
    };
    if matches!(code, "upstream_error" | "fatal_error") {
        tracing::error!(error = %error, code, "Shopify request failed");
    } else {
        tracing::warn!(error = %error, code, "Shopify request rejected");
    }

    let detail = if expose_detail { error.details() } else { None };
    ApiError::new(request_id, code, error.to_string()).with_detail(detail)
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-request-id"),
        ])
}

fn protected_router(auth: AuthState) -> Router<AppState> {
    Router::new()
        .route("/api/inventory/graphql", put(inventory::set_inventory_levels))
        .route("/api/vendor/inventory", put(inventory::set_inventory_levels))
        .route("/api/vendor/prices", put(prices::update_prices))
        .route(
            "/api/products/prices/graphql",
            put(prices::update_compare_at_prices),
        )
        .route(
            "/api/vendor/products",
            post(products::create_products).put(products::update_products),
        )
        .route(
            "/api/vendor/products/disable",
            put(products::disable_products),
        )
        .route(
            "/api/vendor/products/query",
            get(products::query_products),
        )
        .route("/api/products", get(products::list_products))
        .route(
            "/api/products/graphql/create-full",
            post(product_flows::create_full),
        )
        .route(
            "/api/products/graphql/create-with-media",
            post(product_flows::create_with_media),
        )
        .route(
            "/api/products/graphql/delete",
            delete(product_flows::delete_product),
        )
        .route(
            "/api/products/variant/graphql",
            post(variants::create_variant),
        )
        .route(
            "/api/products/graphql/variant/update",
            post(variants::update_variant),
        )
        .route(
            "/api/products/variant/update-media",
            post(variants::update_variant_media),
        )
        .route(
            "/api/products/variant/delete",
            post(variants::delete_variants),
        )
        .route(
            "/api/products/graphql/deleteDefaultVariants",
            post(variants::delete_default_variants),
        )
        .route(
            "/api/vendor/customers/{customer_id}",
            get(customers::get_customer),
        )
        .route("/api/customers", get(customers::list_customers))
        .route(
            "/api/customers/graphql/default-address/{customer_id}",
            get(customers::get_default_address),
        )
        .route("/api/orders", get(orders::list_orders))
        .route(
            "/api/orders/{order_id}/mark-paid",
            post(orders::mark_paid),
        )
        .layer(axum::middleware::from_fn_with_state(
            auth,
            require_bearer_auth,
        ))
}

pub fn build_app(state: AppState, auth: AuthState) -> Router {
    let public_routes = Router::new().route("/api/health", get(health));

    Router::new()
        .merge(public_routes)
        .merge(protected_router(auth))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    Json(ApiResponse::ok(
        req_id.0,
        HealthData {
            status: "ok",
            shop: state.config.shop_domain.clone(),
            api_version: state.config.api_version.clone(),
        },
    ))
}

#[cfg(test)]
mod tests;
