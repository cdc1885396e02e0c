//! Single-product endpoints built on multi-step flows: full creation,
//! creation with media through GraphQL, and deletion.

use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use vendorsync_shopify::flows::{create_product_full, create_product_with_media};
use vendorsync_shopify::normalize::join_tags;
use vendorsync_shopify::types::{
    CreatedProduct, NewMedia, NewOption, ProductWithMedia, VariantWithMedia,
};
use vendorsync_shopify::{FullProduct, FullProductCreation, VariantSpec};

use crate::middleware::RequestId;

use super::extract::ApiJson;
use super::fields::{
    collect_errors, optional_price, optional_text, required_id, required_price, required_text,
    tag_list,
};
use super::products::{convert_images, ImageInput};
use super::{map_shopify_error, ApiError, ApiResponse, AppState};

fn text_list(values: &[Value]) -> Vec<String> {
    values
        .iter()
        .filter_map(|v| optional_text(Some(v)))
        .collect()
}

// ---------------------------------------------------------------------------
// Full creation
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(super) struct CreateFullRequest {
    input: Option<FullProductInput>,
    #[serde(default)]
    media: Vec<ImageInput>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct FullProductInput {
    title: Option<Value>,
    description_html: Option<Value>,
    vendor: Option<Value>,
    product_type: Option<Value>,
    status: Option<Value>,
    tags: Option<Value>,
    #[serde(default)]
    options: Vec<Value>,
    #[serde(default)]
    variants: Vec<FullVariantInput>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct FullVariantInput {
    price: Option<Value>,
    compare_at_price: Option<Value>,
    sku: Option<Value>,
    barcode: Option<Value>,
    #[serde(default)]
    options: Vec<Value>,
    #[serde(default)]
    media_src: Vec<Value>,
}

impl FullVariantInput {
    fn spec(&self, index: usize) -> Result<VariantSpec, String> {
        let price = required_price(self.price.as_ref(), "price");
        let sku = required_text(self.sku.as_ref(), "sku");
        let compare_at = optional_price(self.compare_at_price.as_ref(), "compareAtPrice");

        match (price, sku, compare_at) {
            (Ok(price), Ok(sku), Ok(compare_at_price)) => Ok(VariantSpec {
                price,
                compare_at_price,
                sku,
                barcode: optional_text(self.barcode.as_ref()),
                options: text_list(&self.options),
                image_src: text_list(&self.media_src).into_iter().next(),
            }),
            (price, sku, compare_at) => Err(format!(
                "variants[{index}]: {}",
                collect_errors([price.err(), sku.err(), compare_at.err()])
            )),
        }
    }
}

impl CreateFullRequest {
    fn full_product(&self) -> Result<FullProduct, String> {
        let input = self
            .input
            .as_ref()
            .ok_or_else(|| "missing required field: input".to_owned())?;

        let title = required_text(input.title.as_ref(), "input.title");
        let variants = if input.variants.is_empty() {
            Err("at least one variant is required".to_owned())
        } else {
            input
                .variants
                .iter()
                .enumerate()
                .map(|(i, v)| v.spec(i))
                .collect::<Result<Vec<_>, _>>()
        };
        let images = convert_images(&self.media);

        match (title, variants, images) {
            (Ok(title), Ok(variants), Ok(images)) => Ok(FullProduct {
                title,
                body_html: optional_text(input.description_html.as_ref()),
                vendor: optional_text(input.vendor.as_ref()),
                product_type: optional_text(input.product_type.as_ref()),
                tags: join_tags(&tag_list(input.tags.as_ref()).unwrap_or_default()),
                status: optional_text(input.status.as_ref()).map(|s| s.to_lowercase()),
                option_names: text_list(&input.options),
                variants,
                images,
            }),
            (title, variants, images) => {
                Err(collect_errors([title.err(), variants.err(), images.err()]))
            }
        }
    }
}

/// Creates one product with its images, options and variants, then removes
/// the placeholder variant.
pub(super) async fn create_full(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    ApiJson(body): ApiJson<CreateFullRequest>,
) -> Result<Json<ApiResponse<FullProductCreation>>, ApiError> {
    let input = body
        .full_product()
        .map_err(|message| ApiError::new(&req_id.0, "validation_error", message))?;
    let client = &*state.shopify;
    let policy = state.config.sub_step_policy;

    let creation = client
        .retrying(|| create_product_full(client, &input, policy))
        .await
        .map_err(|e| map_shopify_error(&req_id.0, &e, state.expose_detail()))?;

    Ok(Json(ApiResponse::ok(req_id.0, creation)))
}

// ---------------------------------------------------------------------------
// Creation with media
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(super) struct CreateWithMediaRequest {
    product: Option<MediaProductInput>,
}

#[derive(Debug, Deserialize)]
pub(super) struct MediaProductInput {
    title: Option<Value>,
    description: Option<Value>,
    vendor: Option<Value>,
    category: Option<Value>,
    tags: Option<Value>,
    #[serde(default)]
    options: Vec<Value>,
    #[serde(default)]
    images: Vec<ImageInput>,
    #[serde(default)]
    variants: Vec<MediaVariantInput>,
}

#[derive(Debug, Deserialize)]
pub(super) struct MediaVariantInput {
    price: Option<Value>,
    compare_at_price: Option<Value>,
    sku: Option<Value>,
    #[serde(default)]
    options: Vec<Value>,
    #[serde(default, alias = "imageUrls")]
    image_urls: Vec<Value>,
}

/// An option given as a bare name or as `{ "name", "values" }`.
fn option_input(index: usize, value: &Value) -> Result<NewOption, String> {
    let (name, values) = match value {
        Value::Object(map) => (
            optional_text(map.get("name")),
            map.get("values")
                .and_then(Value::as_array)
                .map(|values| text_list(values))
                .unwrap_or_default(),
        ),
        other => (optional_text(Some(other)), Vec::new()),
    };
    name.map(|name| NewOption { name, values })
        .ok_or_else(|| format!("options[{index}]: missing required field: name"))
}

impl MediaVariantInput {
    fn variant(&self, index: usize) -> Result<VariantWithMedia, String> {
        let price = required_price(self.price.as_ref(), "price");
        let compare_at = optional_price(self.compare_at_price.as_ref(), "compare_at_price");

        match (price, compare_at) {
            (Ok(price), Ok(compare_at_price)) => Ok(VariantWithMedia {
                price,
                compare_at_price,
                sku: optional_text(self.sku.as_ref()),
                option_values: text_list(&self.options),
                media_src: text_list(&self.image_urls),
            }),
            (price, compare_at) => Err(format!(
                "variants[{index}]: {}",
                collect_errors([price.err(), compare_at.err()])
            )),
        }
    }
}

impl CreateWithMediaRequest {
    fn product(&self) -> Result<ProductWithMedia, String> {
        let product = self
            .product
            .as_ref()
            .ok_or_else(|| "missing required field: product".to_owned())?;

        let title = required_text(product.title.as_ref(), "title");
        let options = product
            .options
            .iter()
            .enumerate()
            .map(|(i, o)| option_input(i, o))
            .collect::<Result<Vec<_>, _>>();
        let variants = product
            .variants
            .iter()
            .enumerate()
            .map(|(i, v)| v.variant(i))
            .collect::<Result<Vec<_>, _>>();
        let media = convert_images(&product.images).map(|images| {
            images
                .into_iter()
                .map(|image| NewMedia {
                    original_source: image.src,
                    alt: image.alt,
                })
                .collect::<Vec<_>>()
        });

        match (title, options, variants, media) {
            (Ok(title), Ok(options), Ok(variants), Ok(media)) => Ok(ProductWithMedia {
                title,
                description_html: optional_text(product.description.as_ref()),
                vendor: optional_text(product.vendor.as_ref()),
                product_type: optional_text(product.category.as_ref()),
                tags: tag_list(product.tags.as_ref()).unwrap_or_default(),
                options,
                variants,
                media,
            }),
            (title, options, variants, media) => Err(collect_errors([
                title.err(),
                options.err(),
                variants.err(),
                media.err(),
            ])),
        }
    }
}

/// Creates a product, its options and its media in one `productCreate`, then
/// its variants.
pub(super) async fn create_with_media(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    ApiJson(body): ApiJson<CreateWithMediaRequest>,
) -> Result<Json<ApiResponse<CreatedProduct>>, ApiError> {
    let input = body
        .product()
        .map_err(|message| ApiError::new(&req_id.0, "validation_error", message))?;
    let client = &*state.shopify;

    let created = client
        .retrying(|| create_product_with_media(client, &input))
        .await
        .map_err(|e| map_shopify_error(&req_id.0, &e, state.expose_detail()))?;
    tracing::info!(product = %created.product.id, variants = created.variants.len(), "created product with media");

    Ok(Json(ApiResponse::ok(req_id.0, created)))
}

// ---------------------------------------------------------------------------
// Delete
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(super) struct DeleteProductRequest {
    product_id: Option<Value>,
}

#[derive(Debug, Serialize)]
pub(super) struct DeletedProduct {
    deleted_product_id: String,
}

/// Deletes a product with all its variants and media.
pub(super) async fn delete_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    ApiJson(body): ApiJson<DeleteProductRequest>,
) -> Result<Json<ApiResponse<DeletedProduct>>, ApiError> {
    let product_id = required_id(body.product_id.as_ref(), "product_id", "Product")
        .map_err(|message| ApiError::new(&req_id.0, "validation_error", message))?;
    let client = &*state.shopify;

    let deleted = client
        .retrying(|| client.delete_product(product_id))
        .await
        .map_err(|e| map_shopify_error(&req_id.0, &e, state.expose_detail()))?;

    Ok(Json(ApiResponse::ok(
        req_id.0,
        DeletedProduct {
            deleted_product_id: deleted,
        },
    )))
}
