//! Admin GraphQL endpoint.
//!
//! GraphQL throttling arrives as HTTP 200 with an `errors` entry whose
//! `extensions.code` is `THROTTLED`. It is mapped to
//! [`ShopifyError::RateLimited`] so the same retry wrapper handles both APIs.

use std::time::Duration;

use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ShopifyError;
use crate::types::{gid, GraphQlVariant, UserError};

use super::ShopifyClient;

const VARIANTS_BULK_UPDATE: &str = r"
mutation productVariantsBulkUpdate($productId: ID!, $variants: [ProductVariantsBulkInput!]!) {
  productVariantsBulkUpdate(productId: $productId, variants: $variants) {
    productVariants { id price compareAtPrice sku }
    userErrors { field message }
  }
}";

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Option<Value>,
    #[serde(default)]
    extensions: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BulkUpdateData {
    product_variants_bulk_update: Option<BulkUpdatePayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BulkUpdatePayload {
    #[serde(default)]
    product_variants: Option<Vec<GraphQlVariant>>,
    #[serde(default)]
    user_errors: Vec<UserError>,
}

impl ShopifyClient {
    /// Posts a query and returns its `data`.
    ///
    /// # Errors
    ///
    /// [`ShopifyError::RateLimited`] when throttled, [`ShopifyError::GraphQl`]
    /// for any other top-level error or a missing `data`, or any transport,
    /// status, or decoding failure.
    pub async fn graphql<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: Value,
    ) -> Result<T, ShopifyError> {
        let url = self.endpoint("graphql.json")?;
        let body = json!({ "query": query, "variables": variables });
        let response: GraphQlResponse<T> = self.post_json(url.clone(), &body).await?;

        if let Some(errors) = response.errors.filter(has_entries) {
            if is_throttled(&errors) {
                return Err(ShopifyError::RateLimited {
                    url: url.to_string(),
                    retry_after: response.extensions.as_ref().and_then(throttle_wait),
                });
            }
            return Err(ShopifyError::GraphQl {
                message: first_message(&errors),
                errors,
            });
        }

        response.data.ok_or_else(|| ShopifyError::GraphQl {
            message: "response carried neither data nor errors".into(),
            errors: Value::Null,
        })
    }

    /// Sets (or clears, with `None`) a variant's compare-at price through
    /// `productVariantsBulkUpdate`.
    ///
    /// # Errors
    ///
    /// [`ShopifyError::UserErrors`] when the mutation reports `userErrors`,
    /// otherwise as [`Self::graphql`].
    pub async fn update_compare_at_price(
        &self,
        product_id: u64,
        variant_id: u64,
        compare_at_price: Option<Decimal>,
    ) -> Result<GraphQlVariant, ShopifyError> {
        let variant = json!({
            "id": gid("ProductVariant", variant_id),
            "compareAtPrice": compare_at_price.map(|p| p.to_string()),
        });
        self.bulk_update_variants(&gid("Product", product_id), vec![variant])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| empty_payload("productVariantsBulkUpdate returned no variants"))
    }

    /// Runs `productVariantsBulkUpdate` with prebuilt `ProductVariantsBulkInput`
    /// objects.
    pub(super) async fn bulk_update_variants(
        &self,
        product_gid: &str,
        variants: Vec<Value>,
    ) -> Result<Vec<GraphQlVariant>, ShopifyError> {
        let variables = json!({ "productId": product_gid, "variants": variants });
        let data: BulkUpdateData = self.graphql(VARIANTS_BULK_UPDATE, variables).await?;
        let payload = require_payload(
            "productVariantsBulkUpdate",
            data.product_variants_bulk_update,
        )?;
        check_user_errors("productVariantsBulkUpdate", payload.user_errors)?;
        Ok(payload.product_variants.unwrap_or_default())
    }
}

/// A mutation payload that came back `null`.
pub(super) fn require_payload<P>(operation: &str, payload: Option<P>) -> Result<P, ShopifyError> {
    payload.ok_or_else(|| empty_payload(&format!("{operation} returned null")))
}

pub(super) fn check_user_errors(operation: &str, errors: Vec<UserError>) -> Result<(), ShopifyError> {
    if errors.is_empty() {
        return Ok(());
    }
    Err(ShopifyError::UserErrors {
        operation: operation.to_owned(),
        errors,
    })
}

fn empty_payload(message: &str) -> ShopifyError {
    ShopifyError::GraphQl {
        message: message.to_owned(),
        errors: Value::Null,
    }
}

/// A connection read through its `nodes` shortcut.
#[derive(Debug, Deserialize)]
pub(super) struct Nodes<T> {
    pub nodes: Vec<T>,
}

fn has_entries(errors: &Value) -> bool {
    match errors {
        Value::Array(entries) => !entries.is_empty(),
        Value::Null => false,
        _ => true,
    }
}

fn is_throttled(errors: &Value) -> bool {
    errors.as_array().is_some_and(|entries| {
        entries.iter().any(|e| {
            e.pointer("/extensions/code").and_then(Value::as_str) == Some("THROTTLED")
        })
    })
}

fn first_message(errors: &Value) -> String {
    errors
        .as_array()
        .and_then(|entries| entries.first())
        .and_then(|e| e.get("message"))
        .and_then(Value::as_str)
        .map_or_else(|| errors.to_string(), str::to_owned)
}

/// Time until the bucket refills enough for the rejected query, from
/// `extensions.cost`. `None` when the numbers are missing or nonsensical.
fn throttle_wait(extensions: &Value) -> Option<Duration> {
    let cost = extensions.get("cost")?;
    let requested = cost.get("requestedQueryCost")?.as_f64()?;
    let status = cost.get("throttleStatus")?;
    let available = status.get("currentlyAvailable")?.as_f64()?;
    let restore_rate = status.get("restoreRate")?.as_f64()?;
    if restore_rate <= 0.0 {
        return None;
    }
    let secs = ((requested - available) / restore_rate).max(0.0);
    Duration::try_from_secs_f64(secs).ok()
}
