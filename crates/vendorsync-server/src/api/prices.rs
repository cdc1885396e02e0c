//! Price endpoints: REST price updates and GraphQL compare-at updates.

use axum::{extract::State, response::Response, Extension};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{Map, Value};
use vendorsync_shopify::types::VariantPriceChange;
use vendorsync_shopify::BatchPayload;

use crate::middleware::RequestId;

use super::batch::{batch_rejected, batch_response, require_items, RawItem};
use super::extract::ApiJson;
use super::fields::{collect_errors, identity, optional_price, required_id, required_price};
use super::{ApiError, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct PriceUpdateRequest {
    price_updates: Option<Vec<Value>>,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct PriceUpdate {
    shopify_variant_id: Option<Value>,
    new_price: Option<Value>,
    compare_at_price: Option<Value>,
}

impl BatchPayload for PriceUpdate {
    type Valid = VariantPriceChange;

    fn validate(&self) -> Result<VariantPriceChange, String> {
        let id = required_id(self.shopify_variant_id.as_ref(), "shopify_variant_id", "ProductVariant");
        let price = required_price(self.new_price.as_ref(), "new_price");
        let compare_at = optional_price(self.compare_at_price.as_ref(), "compare_at_price");

        match (id, price, compare_at) {
            (Ok(id), Ok(price), Ok(compare_at_price)) => Ok(VariantPriceChange {
                id,
                price,
                compare_at_price,
            }),
            (id, price, compare_at) => Err(collect_errors([id.err(), price.err(), compare_at.err()])),
        }
    }

    fn identity(&self) -> Map<String, Value> {
        identity(&[("shopify_variant_id", self.shopify_variant_id.as_ref())])
    }
}

#[derive(Debug, serde::Serialize)]
pub(super) struct PriceUpdated {
    shopify_variant_id: u64,
    price: Option<String>,
    compare_at_price: Option<String>,
}

/// Sets the price (and optional compare-at price) of each variant.
pub(super) async fn update_prices(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    ApiJson(body): ApiJson<PriceUpdateRequest>,
) -> Result<Response, ApiError> {
    let items = require_items(
        &req_id.0,
        body.price_updates,
        "price_updates",
        RawItem::<PriceUpdate>::parse,
    )?;
    let client = &*state.shopify;

    let result = state
        .batch
        .run(items, move |change| async move {
            let variant = client.update_variant_price(&change).await?;
            Ok::<_, vendorsync_shopify::ShopifyError>(PriceUpdated {
                shopify_variant_id: variant.id,
                price: variant.price,
                compare_at_price: variant.compare_at_price,
            })
        })
        .await
        .map_err(|e| batch_rejected(&req_id.0, &e))?;

    Ok(batch_response(req_id.0, result))
}

#[derive(Debug, Deserialize)]
pub(super) struct CompareAtRequest {
    price_updates: Option<Vec<Value>>,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct CompareAtUpdate {
    shopify_variant_id: Option<Value>,
    shopify_product_id: Option<Value>,
    compare_at_price: Option<Value>,
}

#[derive(Debug, Clone, Copy)]
pub(super) struct CompareAtChange {
    product_id: u64,
    variant_id: u64,
    compare_at_price: Option<Decimal>,
}

impl BatchPayload for CompareAtUpdate {
    type Valid = CompareAtChange;

    /// A missing or `null` compare-at price clears it.
    fn validate(&self) -> Result<CompareAtChange, String> {
        let variant = required_id(self.shopify_variant_id.as_ref(), "shopify_variant_id", "ProductVariant");
        let product = required_id(self.shopify_product_id.as_ref(), "shopify_product_id", "Product");
        let compare_at = optional_price(self.compare_at_price.as_ref(), "compare_at_price");

        match (variant, product, compare_at) {
            (Ok(variant_id), Ok(product_id), Ok(compare_at_price)) => Ok(CompareAtChange {
                product_id,
                variant_id,
                compare_at_price,
            }),
            (variant, product, compare_at) => Err(collect_errors([
                variant.err(),
                product.err(),
                compare_at.err(),
            ])),
        }
    }

    fn identity(&self) -> Map<String, Value> {
        identity(&[
            ("shopify_variant_id", self.shopify_variant_id.as_ref()),
            ("shopify_product_id", self.shopify_product_id.as_ref()),
        ])
    }
}

/// Sets compare-at prices through the GraphQL bulk variant mutation, one
/// variant per call.
pub(super) async fn update_compare_at_prices(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    ApiJson(body): ApiJson<CompareAtRequest>,
) -> Result<Response, ApiError> {
    let items = require_items(
        &req_id.0,
        body.price_updates,
        "price_updates",
        RawItem::<CompareAtUpdate>::parse,
    )?;
    let client = &*state.shopify;

    let result = state
        .batch
        .run(items, move |change| async move {
            client
                .update_compare_at_price(
                    change.product_id,
                    change.variant_id,
                    change.compare_at_price,
                )
                .await
        })
        .await
        .map_err(|e| batch_rejected(&req_id.0, &e))?;

    Ok(batch_response(req_id.0, result))
}
