//! Customer lookups.

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use vendorsync_shopify::client::DEFAULT_CUSTOMER_LIMIT;
use vendorsync_shopify::types::{CustomerAddress, CustomerDetails};

use crate::middleware::RequestId;

use super::fields::{page_limit, required_id};
use super::{map_shopify_error, ApiError, ApiResponse, AppState};

fn customer_id(request_id: &str, raw: String) -> Result<u64, ApiError> {
    required_id(Some(&Value::String(raw)), "customer_id", "Customer")
        .map_err(|message| ApiError::new(request_id, "validation_error", message))
}

/// GET /api/vendor/customers/{customer_id}: customer, metafields and the
/// five most recent orders.
pub(super) async fn get_customer(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(customer_id_raw): Path<String>,
) -> Result<Json<ApiResponse<CustomerDetails>>, ApiError> {
    let customer_id = customer_id(&req_id.0, customer_id_raw)?;

    let client = &*state.shopify;
    let details = client
        .retrying(|| client.get_customer_details(customer_id))
        .await
        .map_err(|e| map_shopify_error(&req_id.0, &e, state.expose_detail()))?;

    Ok(Json(ApiResponse::ok(req_id.0, details)))
}

#[derive(Debug, Deserialize)]
pub(super) struct CustomersQuery {
    limit: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct CustomerList {
    count: usize,
    customers: Vec<Map<String, Value>>,
}

/// GET /api/customers: one page of customers with their addresses.
pub(super) async fn list_customers(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<CustomersQuery>,
) -> Result<Json<ApiResponse<CustomerList>>, ApiError> {
    let limit = page_limit(query.limit.as_deref(), DEFAULT_CUSTOMER_LIMIT)
        .map_err(|message| ApiError::new(&req_id.0, "validation_error", message))?;

    let client = &*state.shopify;
    let customers = client
        .retrying(|| client.list_customers(limit))
        .await
        .map_err(|e| map_shopify_error(&req_id.0, &e, state.expose_detail()))?;
    tracing::info!(count = customers.len(), limit, "listed customers");

    Ok(Json(ApiResponse::ok(
        req_id.0,
        CustomerList {
            count: customers.len(),
            customers,
        },
    )))
}

/// GET /api/customers/graphql/default-address/{customer_id}
pub(super) async fn get_default_address(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(customer_id_raw): Path<String>,
) -> Result<Json<ApiResponse<CustomerAddress>>, ApiError> {
    let customer_id = customer_id(&req_id.0, customer_id_raw)?;

    let client = &*state.shopify;
    let address = client
        .retrying(|| client.get_customer_default_address(customer_id))
        .await
        .map_err(|e| map_shopify_error(&req_id.0, &e, state.expose_detail()))?;

    Ok(Json(ApiResponse::ok(req_id.0, address)))
}
