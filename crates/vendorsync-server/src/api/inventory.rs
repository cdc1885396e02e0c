//! `PUT /api/inventory/graphql` and `PUT /api/vendor/inventory`.

use axum::{extract::State, response::Response, Extension};
use serde::Deserialize;
use serde_json::{Map, Value};
use vendorsync_shopify::types::InventoryLevelSet;
use vendorsync_shopify::BatchPayload;

use crate::middleware::RequestId;

use super::batch::{batch_rejected, batch_response, require_items, RawItem};
use super::extract::ApiJson;
use super::fields::{collect_errors, identity, required_id, required_integer};
use super::{ApiError, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct InventoryRequest {
    inventory_updates: Option<Vec<Value>>,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct InventoryUpdate {
    shopify_location_id: Option<Value>,
    shopify_inventory_item_id: Option<Value>,
    quantity: Option<Value>,
    product_id: Option<Value>,
}

impl BatchPayload for InventoryUpdate {
    type Valid = InventoryLevelSet;

    fn validate(&self) -> Result<InventoryLevelSet, String> {
        let location = required_id(self.shopify_location_id.as_ref(), "shopify_location_id", "Location");
        let item = required_id(
            self.shopify_inventory_item_id.as_ref(),
            "shopify_inventory_item_id",
            "InventoryItem",
        );
        let quantity = required_integer(self.quantity.as_ref(), "quantity");

        match (location, item, quantity) {
            (Ok(location_id), Ok(inventory_item_id), Ok(available)) => Ok(InventoryLevelSet {
                location_id,
                inventory_item_id,
                available,
            }),
            (location, item, quantity) => Err(collect_errors([
                location.err(),
                item.err(),
                quantity.err(),
            ])),
        }
    }

    fn identity(&self) -> Map<String, Value> {
        identity(&[
            ("shopify_location_id", self.shopify_location_id.as_ref()),
            ("shopify_inventory_item_id", self.shopify_inventory_item_id.as_ref()),
            ("product_id", self.product_id.as_ref()),
        ])
    }
}

/// Sets the available quantity for each (location, inventory item) pair.
pub(super) async fn set_inventory_levels(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    ApiJson(body): ApiJson<InventoryRequest>,
) -> Result<Response, ApiError> {
    let items = require_items(
        &req_id.0,
        body.inventory_updates,
        "inventory_updates",
        RawItem::<InventoryUpdate>::parse,
    )?;
    let client = &*state.shopify;

    let result = state
        .batch
        .run(items, move |level| async move {
            client.set_inventory_level(&level).await
        })
        .await
        .map_err(|e| batch_rejected(&req_id.0, &e))?;

    Ok(batch_response(req_id.0, result))
}
