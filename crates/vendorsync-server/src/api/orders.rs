//! Order lookup and external payment capture.

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use vendorsync_shopify::client::DEFAULT_ORDER_LIMIT;
use vendorsync_shopify::types::NewTransaction;
use vendorsync_shopify::{OrderFilter, ShopifyError};

use crate::middleware::RequestId;

use super::extract::ApiJson;
use super::fields::{collect_errors, optional_text, page_limit, required_id, required_price, required_text};
use super::{map_shopify_error, ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct OrdersQuery {
    id: Option<String>,
    order_number: Option<String>,
    status: Option<String>,
    financial_status: Option<String>,
    limit: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct OrderList {
    count: usize,
    orders: Vec<Map<String, Value>>,
}

/// `?id=` fetches one order, `?order_number=` resolves an order name, and
/// otherwise a page of orders is listed with the optional `status`,
/// `financial_status` and `limit` filters.
pub(super) async fn list_orders(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<OrdersQuery>,
) -> Result<Json<ApiResponse<OrderList>>, ApiError> {
    let client = &*state.shopify;
    let shopify_error = |e: ShopifyError| map_shopify_error(&req_id.0, &e, state.expose_detail());

    let orders = if let Some(id) = query.id.as_deref().filter(|s| !s.trim().is_empty()) {
        let order_id = required_id(Some(&Value::String(id.to_owned())), "id", "Order")
            .map_err(|message| ApiError::new(&req_id.0, "validation_error", message))?;
        let order = client
            .retrying(|| client.get_order(order_id))
            .await
            .map_err(shopify_error)?;
        vec![order]
    } else if let Some(name) = query.order_number.as_deref().filter(|s| !s.trim().is_empty()) {
        let order_id = client
            .retrying(|| client.find_order_id_by_name(name))
            .await
            .map_err(shopify_error)?
            .ok_or_else(|| {
                ApiError::new(&req_id.0, "not_found", format!("order {name} not found"))
            })?;
        let order = client
            .retrying(|| client.get_order(order_id))
            .await
            .map_err(shopify_error)?;
        vec![order]
    } else {
        let limit = page_limit(query.limit.as_deref(), DEFAULT_ORDER_LIMIT)
            .map_err(|message| ApiError::new(&req_id.0, "validation_error", message))?;
        let filter = OrderFilter {
            status: query
                .status
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| OrderFilter::default().status),
            financial_status: query.financial_status,
            limit,
        };
        let orders = client
            .retrying(|| client.list_orders(&filter))
            .await
            .map_err(shopify_error)?;
        tracing::info!(count = orders.len(), ?filter, "listed orders");
        orders
    };

    Ok(Json(ApiResponse::ok(
        req_id.0.clone(),
        OrderList {
            count: orders.len(),
            orders,
        },
    )))
}

#[derive(Debug, Deserialize)]
pub(super) struct MarkPaidRequest {
    payment_details: Option<PaymentDetails>,
}

#[derive(Debug, Deserialize)]
pub(super) struct PaymentDetails {
    amount: Option<Value>,
    currency: Option<Value>,
    gateway: Option<Value>,
    message: Option<Value>,
}

impl PaymentDetails {
    fn transaction(&self) -> Result<NewTransaction, String> {
        let amount = required_price(self.amount.as_ref(), "payment_details.amount").and_then(|a| {
            if a.is_zero() {
                Err("payment_details.amount must be greater than zero".to_owned())
            } else {
                Ok(a)
            }
        });
        let currency = required_text(self.currency.as_ref(), "payment_details.currency");

        match (amount, currency) {
            (Ok(amount), Ok(currency)) => Ok(NewTransaction::external_capture(
                amount,
                currency.to_uppercase(),
                optional_text(self.gateway.as_ref()),
                optional_text(self.message.as_ref()),
            )),
            (amount, currency) => Err(collect_errors([amount.err(), currency.err()])),
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct MarkedPaid {
    order_id: u64,
    transaction: Map<String, Value>,
}

/// Records a successful capture for a payment collected outside Shopify.
pub(super) async fn mark_paid(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(order_id): Path<String>,
    ApiJson(body): ApiJson<MarkPaidRequest>,
) -> Result<Json<ApiResponse<MarkedPaid>>, ApiError> {
    let validation = |message: String| ApiError::new(&req_id.0, "validation_error", message);

    let order_id = required_id(Some(&Value::String(order_id)), "order_id", "Order").map_err(validation)?;
    let transaction = body
        .payment_details
        .ok_or_else(|| "payment_details is required".to_owned())
        .and_then(|details| details.transaction())
        .map_err(validation)?;

    let client = &*state.shopify;
    let recorded = client
        .retrying(|| client.create_transaction(order_id, &transaction))
        .await
        .map_err(|e| map_shopify_error(&req_id.0, &e, state.expose_detail()))?;

    Ok(Json(ApiResponse::ok(
        req_id.0.clone(),
        MarkedPaid {
            order_id,
            transaction: recorded,
        },
    )))
}
