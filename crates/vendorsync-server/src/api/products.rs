//! Vendor product endpoints: create, update, disable, lookup and listing.

use axum::{
    extract::{Query, State},
    response::Response,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use vendorsync_shopify::normalize::{join_tags, normalize_product};
use vendorsync_shopify::types::{NewImage, NewOption, NewProduct, NewVariant, ProductChanges};
use vendorsync_shopify::{BatchPayload, ProductFilter, VendorProduct};

use crate::middleware::RequestId;

use super::batch::{batch_rejected, batch_response, require_items, RawItem};
use super::extract::ApiJson;
use super::fields::{
    collect_errors, identity, optional_price, optional_text, required_id, required_price,
    required_text, tag_list,
};
use super::{map_shopify_error, ApiError, ApiResponse, AppState};

/// `vendor_id` is mandatory on vendor write endpoints and becomes the
/// Shopify `vendor` of every product in the request.
fn require_vendor(request_id: &str, vendor_id: Option<&Value>) -> Result<String, ApiError> {
    required_text(vendor_id, "vendor_id")
        .map_err(|_| ApiError::new(request_id, "validation_error", "vendor_id is required"))
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ImageInput {
    url: Option<String>,
    #[serde(alias = "originalSource")]
    src: Option<String>,
    alt: Option<String>,
    position: Option<u32>,
}

pub(super) fn convert_images(images: &[ImageInput]) -> Result<Vec<NewImage>, String> {
    images
        .iter()
        .enumerate()
        .map(|(i, img)| {
            let src = img
                .url
                .as_deref()
                .or(img.src.as_deref())
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .ok_or_else(|| format!("images[{i}]: missing required field: url"))?;
            Ok(NewImage {
                src: src.to_owned(),
                alt: img.alt.clone().filter(|a| !a.is_empty()),
                position: img.position,
                variant_ids: Vec::new(),
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(super) struct CreateProductsRequest {
    vendor_id: Option<Value>,
    products: Option<Vec<Value>>,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ProductInput {
    title: Option<Value>,
    description: Option<Value>,
    category: Option<Value>,
    tags: Option<Value>,
    #[serde(default)]
    options: Vec<OptionInput>,
    #[serde(default)]
    variants: Vec<VariantInput>,
    #[serde(default)]
    images: Vec<ImageInput>,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct OptionInput {
    name: String,
    #[serde(default)]
    values: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct VariantInput {
    price: Option<Value>,
    sku: Option<Value>,
    compare_at_price: Option<Value>,
    option1: Option<String>,
    option2: Option<String>,
    option3: Option<String>,
    barcode: Option<String>,
}

/// A product from a create request paired with the request's vendor.
#[derive(Debug, Clone)]
pub(super) struct VendorProductInput {
    vendor: String,
    product: RawItem<ProductInput>,
}

fn convert_variant(index: usize, variant: &VariantInput) -> Result<NewVariant, String> {
    let price = required_price(variant.price.as_ref(), "price");
    let sku = required_text(variant.sku.as_ref(), "sku");
    let compare_at = optional_price(variant.compare_at_price.as_ref(), "compare_at_price");

    match (price, sku, compare_at) {
        (Ok(price), Ok(sku), Ok(compare_at_price)) => Ok(NewVariant {
            price,
            sku,
            compare_at_price,
            option1: variant.option1.clone(),
            option2: variant.option2.clone(),
            option3: variant.option3.clone(),
            barcode: variant.barcode.clone(),
            image_id: None,
            inventory_management: "shopify".to_owned(),
            inventory_policy: "deny".to_owned(),
        }),
        (price, sku, compare_at) => Err(format!(
            "variants[{index}]: {}",
            collect_errors([price.err(), sku.err(), compare_at.err()])
        )),
    }
}

impl BatchPayload for VendorProductInput {
    type Valid = NewProduct;

    fn validate(&self) -> Result<NewProduct, String> {
        let product = self.product.get()?;
        let title = required_text(product.title.as_ref(), "title");
        let variants = if product.variants.is_empty() {
            Err("at least one variant with a price and sku is required".to_owned())
        } else {
            product
                .variants
                .iter()
                .enumerate()
                .map(|(i, v)| convert_variant(i, v))
                .collect::<Result<Vec<_>, _>>()
        };
        let images = convert_images(&product.images);

        match (title, variants, images) {
            (Ok(title), Ok(variants), Ok(images)) => Ok(NewProduct {
                title,
                body_html: optional_text(product.description.as_ref()),
                vendor: Some(self.vendor.clone()),
                product_type: optional_text(product.category.as_ref()),
                tags: join_tags(&tag_list(product.tags.as_ref()).unwrap_or_default()),
                options: product
                    .options
                    .iter()
                    .map(|o| NewOption {
                        name: o.name.clone(),
                        values: o.values.clone(),
                    })
                    .collect(),
                variants,
                images,
                status: None,
            }),
            (title, variants, images) => {
                Err(collect_errors([title.err(), variants.err(), images.err()]))
            }
        }
    }

    fn identity(&self) -> Map<String, Value> {
        let Ok(product) = self.product.get() else {
            return Map::new();
        };
        let first_sku = product.variants.first().and_then(|v| v.sku.as_ref());
        identity(&[("title", product.title.as_ref()), ("sku", first_sku)])
    }
}

/// Creates each product, with its variants and images, under the vendor.
pub(super) async fn create_products(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    ApiJson(body): ApiJson<CreateProductsRequest>,
) -> Result<Response, ApiError> {
    let vendor = require_vendor(&req_id.0, body.vendor_id.as_ref())?;
    let items = require_items(&req_id.0, body.products, "products", |raw| {
        VendorProductInput {
            vendor: vendor.clone(),
            product: RawItem::parse(raw),
        }
    })?;
    let client = &*state.shopify;

    let result = state
        .batch
        .run(items, move |product| async move {
            client.create_product(&product).await.map(normalize_product)
        })
        .await
        .map_err(|e| batch_rejected(&req_id.0, &e))?;

    Ok(batch_response(req_id.0, result))
}

// ---------------------------------------------------------------------------
// Update
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(super) struct UpdateProductsRequest {
    vendor_id: Option<Value>,
    updates: Option<Vec<Value>>,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ProductUpdateInput {
    shopify_product_id: Option<Value>,
    name: Option<Value>,
    description: Option<Value>,
    category: Option<Value>,
    tags: Option<Value>,
    images: Option<Vec<ImageInput>>,
}

#[derive(Debug, Clone)]
pub(super) struct VendorProductUpdate {
    vendor: String,
    update: RawItem<ProductUpdateInput>,
}

impl BatchPayload for VendorProductUpdate {
    type Valid = ProductChanges;

    fn validate(&self) -> Result<ProductChanges, String> {
        let update = self.update.get()?;
        let id = required_id(update.shopify_product_id.as_ref(), "shopify_product_id", "Product");
        let images = update.images.as_deref().map(convert_images).transpose();

        match (id, images) {
            (Ok(id), Ok(images)) => Ok(ProductChanges {
                id,
                title: optional_text(update.name.as_ref()),
                body_html: optional_text(update.description.as_ref()),
                vendor: Some(self.vendor.clone()),
                product_type: optional_text(update.category.as_ref()),
                tags: tag_list(update.tags.as_ref()).map(|tags| join_tags(&tags)),
                images,
                ..ProductChanges::default()
            }),
            (id, images) => Err(collect_errors([id.err(), images.err()])),
        }
    }

    fn identity(&self) -> Map<String, Value> {
        self.update
            .get()
            .map(|update| identity(&[("shopify_product_id", update.shopify_product_id.as_ref())]))
            .unwrap_or_default()
    }
}

/// Applies partial updates; fields left out of an update are unchanged.
pub(super) async fn update_products(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    ApiJson(body): ApiJson<UpdateProductsRequest>,
) -> Result<Response, ApiError> {
    let vendor = require_vendor(&req_id.0, body.vendor_id.as_ref())?;
    let items = require_items(&req_id.0, body.updates, "updates", |raw| VendorProductUpdate {
        vendor: vendor.clone(),
        update: RawItem::parse(raw),
    })?;
    let client = &*state.shopify;

    let result = state
        .batch
        .run(items, move |changes| async move {
            client.update_product(&changes).await.map(normalize_product)
        })
        .await
        .map_err(|e| batch_rejected(&req_id.0, &e))?;

    Ok(batch_response(req_id.0, result))
}

// ---------------------------------------------------------------------------
// Disable
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(super) struct DisableRequest {
    disable_requests: Option<Vec<Value>>,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct DisableItem {
    shopify_product_id: Option<Value>,
}

impl BatchPayload for DisableItem {
    type Valid = u64;

    fn validate(&self) -> Result<u64, String> {
        required_id(self.shopify_product_id.as_ref(), "shopify_product_id", "Product")
    }

    fn identity(&self) -> Map<String, Value> {
        identity(&[("shopify_product_id", self.shopify_product_id.as_ref())])
    }
}

#[derive(Debug, Serialize)]
pub(super) struct ProductStatus {
    shopify_product_id: u64,
    status: Option<String>,
}

/// Archives each product so it no longer shows on any sales channel.
pub(super) async fn disable_products(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    ApiJson(body): ApiJson<DisableRequest>,
) -> Result<Response, ApiError> {
    let items = require_items(
        &req_id.0,
        body.disable_requests,
        "disable_requests",
        RawItem::<DisableItem>::parse,
    )?;
    let client = &*state.shopify;

    let result = state
        .batch
        .run(items, move |product_id| async move {
            let product = client.archive_product(product_id).await?;
            Ok::<_, vendorsync_shopify::ShopifyError>(ProductStatus {
                shopify_product_id: product.id,
                status: product.status,
            })
        })
        .await
        .map_err(|e| batch_rejected(&req_id.0, &e))?;

    Ok(batch_response(req_id.0, result))
}

// ---------------------------------------------------------------------------
// Lookup
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(super) struct ProductQuery {
    product_ids: Option<String>,
}

#[derive(Debug, Clone)]
pub(super) struct ProductLookup {
    product_id: Value,
}

impl BatchPayload for ProductLookup {
    type Valid = u64;

    fn validate(&self) -> Result<u64, String> {
        required_id(Some(&self.product_id), "product_id", "Product")
    }

    fn identity(&self) -> Map<String, Value> {
        identity(&[("product_id", Some(&self.product_id))])
    }
}

/// Looks up each id in `?product_ids=1,2,3`. Unknown or malformed ids are
/// reported per id alongside the products that were found.
pub(super) async fn query_products(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<ProductQuery>,
) -> Result<Response, ApiError> {
    let ids = query
        .product_ids
        .filter(|raw| !raw.trim().is_empty())
        .map(|raw| {
            raw.split(',')
                .map(|id| Value::String(id.trim().to_owned()))
                .collect::<Vec<_>>()
        });
    let items = require_items(&req_id.0, ids, "product_ids", |product_id| ProductLookup {
        product_id,
    })?;
    let client = &*state.shopify;

    let result = state
        .batch
        .run(items, move |product_id| async move {
            client.get_product(product_id).await.map(normalize_product)
        })
        .await
        .map_err(|e| batch_rejected(&req_id.0, &e))?;

    Ok(batch_response(req_id.0, result))
}

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(super) struct ListProductsQuery {
    status: Option<String>,
    vendor: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct ProductList {
    count: usize,
    products: Vec<VendorProduct>,
}

/// Walks every page of the product listing. All-or-nothing: a page that
/// keeps failing fails the request.
pub(super) async fn list_products(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<ListProductsQuery>,
) -> Result<Json<ApiResponse<ProductList>>, ApiError> {
    let filter = ProductFilter {
        status: query.status,
        vendor: query.vendor,
    };

    let products = state
        .shopify
        .list_all_products(&filter)
        .await
        .map_err(|e| map_shopify_error(&req_id.0, &e, state.expose_detail()))?;

    let products: Vec<VendorProduct> = products.into_iter().map(normalize_product).collect();
    tracing::info!(count = products.len(), ?filter, "listed products");

    Ok(Json(ApiResponse::ok(
        req_id.0,
        ProductList {
            count: products.len(),
            products,
        },
    )))
}
