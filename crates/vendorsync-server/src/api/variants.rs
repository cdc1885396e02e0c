//! Variant endpoints: creation, updates, media and deletion.

use axum::{extract::State, response::Response, Extension, Json};
use serde::Deserialize;
use serde_json::{Map, Value};
use vendorsync_shopify::flows::{
    create_variant_for_product, delete_default_title_variant, delete_variant_with_image,
    update_variant_media as replace_variant_media, update_variant_with_image,
};
use vendorsync_shopify::types::{NewMedia, VariantChanges};
use vendorsync_shopify::{
    BatchPayload, UpdatedVariant, VariantCreation, VariantMediaUpdate, VariantSpec, VariantUpdate,
};

use crate::middleware::RequestId;

use super::batch::{batch_rejected, batch_response, require_items, RawItem};
use super::extract::ApiJson;
use super::fields::{
    collect_errors, identity, optional_price, optional_text, required_id, required_price,
    required_text,
};
use super::products::{convert_images, ImageInput};
use super::{map_shopify_error, ApiError, ApiResponse, AppState};

fn validation_error(request_id: &str) -> impl Fn(String) -> ApiError + '_ {
    move |message| ApiError::new(request_id, "validation_error", message)
}

fn text_list(values: &[Value]) -> Vec<String> {
    values
        .iter()
        .filter_map(|v| optional_text(Some(v)))
        .collect()
}

#[derive(Debug, Deserialize)]
pub(super) struct DeleteVariantsRequest {
    variants: Option<Vec<Value>>,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct VariantRef {
    variant_id: Option<Value>,
}

impl BatchPayload for VariantRef {
    type Valid = u64;

    fn validate(&self) -> Result<u64, String> {
        required_id(self.variant_id.as_ref(), "variant_id", "ProductVariant")
    }

    fn identity(&self) -> Map<String, Value> {
        identity(&[("variant_id", self.variant_id.as_ref())])
    }
}

/// Deletes each variant and, when nothing else uses it, its image.
pub(super) async fn delete_variants(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    ApiJson(body): ApiJson<DeleteVariantsRequest>,
) -> Result<Response, ApiError> {
    let items = require_items(
        &req_id.0,
        body.variants,
        "variants",
        RawItem::<VariantRef>::parse,
    )?;
    let client = &*state.shopify;
    let policy = state.config.sub_step_policy;

    let result = state
        .batch
        .run(items, move |variant_id| {
            delete_variant_with_image(client, variant_id, policy)
        })
        .await
        .map_err(|e| batch_rejected(&req_id.0, &e))?;

    Ok(batch_response(req_id.0, result))
}

#[derive(Debug, Deserialize)]
pub(super) struct DeleteDefaultVariantsRequest {
    product_ids: Option<Vec<Value>>,
}

#[derive(Debug, Clone)]
pub(super) struct ProductRef {
    product_id: Value,
}

impl BatchPayload for ProductRef {
    type Valid = u64;

    fn validate(&self) -> Result<u64, String> {
        required_id(Some(&self.product_id), "product_id", "Product")
    }

    fn identity(&self) -> Map<String, Value> {
        identity(&[("product_id", Some(&self.product_id))])
    }
}

/// Removes the placeholder `Default Title` variant from each product.
pub(super) async fn delete_default_variants(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    ApiJson(body): ApiJson<DeleteDefaultVariantsRequest>,
) -> Result<Response, ApiError> {
    let items = require_items(&req_id.0, body.product_ids, "product_ids", |product_id| {
        ProductRef { product_id }
    })?;
    let client = &*state.shopify;

    let result = state
        .batch
        .run(items, move |product_id| {
            delete_default_title_variant(client, product_id)
        })
        .await
        .map_err(|e| batch_rejected(&req_id.0, &e))?;

    Ok(batch_response(req_id.0, result))
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(super) struct CreateVariantRequest {
    product_id: Option<Value>,
    variant: Option<NewVariantInput>,
    #[serde(default)]
    images: Vec<ImageInput>,
}

#[derive(Debug, Deserialize)]
pub(super) struct NewVariantInput {
    price: Option<Value>,
    compare_at_price: Option<Value>,
    sku: Option<Value>,
    barcode: Option<Value>,
    option1: Option<Value>,
    option2: Option<Value>,
    option3: Option<Value>,
    #[serde(default)]
    options: Vec<Value>,
}

impl NewVariantInput {
    fn spec(&self) -> Result<VariantSpec, String> {
        let price = required_price(self.price.as_ref(), "variant.price");
        let sku = required_text(self.sku.as_ref(), "variant.sku");
        let compare_at = optional_price(self.compare_at_price.as_ref(), "variant.compare_at_price");
        let options = if self.options.is_empty() {
            [&self.option1, &self.option2, &self.option3]
                .into_iter()
                .map_while(|o| optional_text(o.as_ref()))
                .collect()
        } else {
            text_list(&self.options)
        };

        match (price, sku, compare_at) {
            (Ok(price), Ok(sku), Ok(compare_at_price)) => Ok(VariantSpec {
                price,
                compare_at_price,
                sku,
                barcode: optional_text(self.barcode.as_ref()),
                options,
                image_src: None,
            }),
            (price, sku, compare_at) => {
                Err(collect_errors([price.err(), sku.err(), compare_at.err()]))
            }
        }
    }
}

/// Adds a variant to an existing product, replacing its placeholder
/// variant, and uploads the given images attached to it.
pub(super) async fn create_variant(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    ApiJson(body): ApiJson<CreateVariantRequest>,
) -> Result<Json<ApiResponse<VariantCreation>>, ApiError> {
    let invalid = validation_error(&req_id.0);
    let product_id = required_id(body.product_id.as_ref(), "product_id", "Product");
    let spec = body
        .variant
        .as_ref()
        .ok_or_else(|| "missing required field: variant".to_owned())
        .and_then(NewVariantInput::spec);
    let images = convert_images(&body.images);
    let (product_id, spec, images) = match (product_id, spec, images) {
        (Ok(product_id), Ok(spec), Ok(images)) => (product_id, spec, images),
        (product_id, spec, images) => {
            return Err(invalid(collect_errors([
                product_id.err(),
                spec.err(),
                images.err(),
            ])))
        }
    };

    let client = &*state.shopify;
    let policy = state.config.sub_step_policy;
    let creation = client
        .retrying(|| create_variant_for_product(client, product_id, &spec, &images, policy))
        .await
        .map_err(|e| map_shopify_error(&req_id.0, &e, state.expose_detail()))?;

    Ok(Json(ApiResponse::ok(req_id.0.clone(), creation)))
}

// ---------------------------------------------------------------------------
// Update
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(super) struct UpdateVariantRequest {
    #[serde(alias = "shopify_id")]
    product_id: Option<Value>,
    variant_id: Option<Value>,
    price: Option<Value>,
    compare_at_price: Option<Value>,
    sku: Option<Value>,
    options: Option<Vec<Value>>,
    #[serde(default, alias = "imageUrls")]
    image_urls: Vec<Value>,
}

impl UpdateVariantRequest {
    fn update(&self) -> Result<VariantUpdate, String> {
        let product_id = required_id(self.product_id.as_ref(), "product_id", "Product");
        let variant_id = required_id(self.variant_id.as_ref(), "variant_id", "ProductVariant");
        let price = self
            .price
            .as_ref()
            .map(|p| required_price(Some(p), "price"))
            .transpose();
        let compare_at = optional_price(self.compare_at_price.as_ref(), "compare_at_price");

        let (product_id, variant_id, price, compare_at_price) =
            match (product_id, variant_id, price, compare_at) {
                (Ok(p), Ok(v), Ok(price), Ok(compare_at)) => (p, v, price, compare_at),
                (p, v, price, compare_at) => {
                    return Err(collect_errors([p.err(), v.err(), price.err(), compare_at.err()]))
                }
            };

        let mut changes = VariantChanges {
            id: variant_id,
            price,
            compare_at_price,
            sku: optional_text(self.sku.as_ref()),
            ..VariantChanges::default()
        };
        if let Some(options) = &self.options {
            changes = changes.with_options(&text_list(options));
        }
        let image_src = text_list(&self.image_urls).into_iter().next();

        let unchanged = VariantChanges {
            id: variant_id,
            ..VariantChanges::default()
        };
        if image_src.is_none() && changes == unchanged {
            return Err(
                "nothing to update: send price, compare_at_price, sku, options or image_urls"
                    .to_owned(),
            );
        }

        Ok(VariantUpdate {
            product_id,
            changes,
            image_src,
        })
    }
}

/// Updates a variant's price, SKU or option values and optionally the image
/// shown for it.
pub(super) async fn update_variant(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    ApiJson(body): ApiJson<UpdateVariantRequest>,
) -> Result<Json<ApiResponse<UpdatedVariant>>, ApiError> {
    let update = body.update().map_err(validation_error(&req_id.0))?;
    let client = &*state.shopify;
    let policy = state.config.sub_step_policy;

    let updated = client
        .retrying(|| update_variant_with_image(client, &update, policy))
        .await
        .map_err(|e| map_shopify_error(&req_id.0, &e, state.expose_detail()))?;

    Ok(Json(ApiResponse::ok(req_id.0.clone(), updated)))
}

// ---------------------------------------------------------------------------
// Media
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(super) struct UpdateVariantMediaRequest {
    variant_id: Option<Value>,
    images: Option<Vec<ImageInput>>,
}

/// Replaces the media shown for a variant. An empty `images` array removes
/// the variant's media.
pub(super) async fn update_variant_media(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    ApiJson(body): ApiJson<UpdateVariantMediaRequest>,
) -> Result<Json<ApiResponse<VariantMediaUpdate>>, ApiError> {
    let invalid = validation_error(&req_id.0);
    let variant_id =
        required_id(body.variant_id.as_ref(), "variant_id", "ProductVariant").map_err(&invalid)?;
    let images = body
        .images
        .as_deref()
        .ok_or_else(|| "images must be an array".to_owned())
        .and_then(convert_images)
        .map_err(&invalid)?;
    let media: Vec<NewMedia> = images
        .into_iter()
        .map(|image| NewMedia {
            original_source: image.src,
            alt: image.alt,
        })
        .collect();

    let client = &*state.shopify;
    let policy = state.config.sub_step_policy;
    let update = client
        .retrying(|| replace_variant_media(client, variant_id, &media, policy))
        .await
        .map_err(|e| map_shopify_error(&req_id.0, &e, state.expose_detail()))?;

    Ok(Json(ApiResponse::ok(req_id.0.clone(), update)))
}
