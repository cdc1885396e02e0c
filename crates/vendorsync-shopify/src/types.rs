//! Shopify Admin API wire types.
//!
//! Only the fields this service reads or writes are modelled. The REST Admin
//! API returns `tags` as a single comma-separated string (unlike the public
//! storefront `products.json`, which returns an array), numeric ids as JSON
//! numbers, and prices as decimal strings such as `"12.99"`.
//!
//! Customers, orders and transactions are passed through as raw JSON maps:
//! their shape is owned by Shopify and this service only forwards them.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Products
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body_html: Option<String>,
    #[serde(default)]
    pub vendor: Option<String>,
    #[serde(default)]
    pub product_type: Option<String>,
    #[serde(default)]
    pub handle: Option<String>,
    /// Comma-separated, e.g. `"summer, sale"`.
    #[serde(default)]
    pub tags: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub variants: Vec<Variant>,
    #[serde(default)]
    pub images: Vec<ProductImage>,
    #[serde(default)]
    pub options: Vec<ProductOption>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Variant {
    pub id: u64,
    #[serde(default)]
    pub product_id: Option<u64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub compare_at_price: Option<String>,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub inventory_quantity: Option<i64>,
    #[serde(default)]
    pub old_inventory_quantity: Option<i64>,
    #[serde(default)]
    pub barcode: Option<String>,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub weight_unit: Option<String>,
    #[serde(default)]
    pub inventory_item_id: Option<u64>,
    #[serde(default)]
    pub image_id: Option<u64>,
    #[serde(default)]
    pub option1: Option<String>,
    #[serde(default)]
    pub option2: Option<String>,
    #[serde(default)]
    pub option3: Option<String>,
}

impl Variant {
    /// Set option values in position order.
    #[must_use]
    pub fn option_values(&self) -> Vec<String> {
        [&self.option1, &self.option2, &self.option3]
            .into_iter()
            .flatten()
            .cloned()
            .collect()
    }

    /// The placeholder variant Shopify creates for products without options.
    #[must_use]
    pub fn is_default_title(&self) -> bool {
        self.title.as_deref() == Some(DEFAULT_VARIANT_TITLE)
    }
}

pub const DEFAULT_VARIANT_TITLE: &str = "Default Title";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductImage {
    pub id: u64,
    #[serde(default)]
    pub src: Option<String>,
    #[serde(default)]
    pub alt: Option<String>,
    #[serde(default)]
    pub position: Option<i64>,
    #[serde(default)]
    pub variant_ids: Vec<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductOption {
    #[serde(default)]
    pub id: Option<u64>,
    pub name: String,
    #[serde(default)]
    pub values: Vec<String>,
}

/// Body for `POST products.json`.
#[derive(Debug, Clone, Serialize)]
pub struct NewProduct {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_html: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_type: Option<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub tags: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<NewOption>,
    pub variants: Vec<NewVariant>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<NewImage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewOption {
    pub name: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewVariant {
    pub price: Decimal,
    pub sku: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compare_at_price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub option1: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub option2: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub option3: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub barcode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_id: Option<u64>,
    pub inventory_management: String,
    pub inventory_policy: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewImage {
    pub src: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<u32>,
    /// Variants the image is attached to on upload.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub variant_ids: Vec<u64>,
}

impl NewImage {
    #[must_use]
    pub fn from_src(src: impl Into<String>, alt: Option<String>) -> Self {
        Self {
            src: src.into(),
            alt,
            position: None,
            variant_ids: Vec::new(),
        }
    }
}

/// Body for `PUT products/{id}.json`. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProductChanges {
    pub id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_html: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<NewImage>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<NewOption>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl ProductChanges {
    #[must_use]
    pub fn archive(id: u64) -> Self {
        Self {
            id,
            status: Some("archived".to_string()),
            ..Self::default()
        }
    }
}

/// Body for `PUT variants/{id}.json` price changes.
#[derive(Debug, Clone, Serialize)]
pub struct VariantPriceChange {
    pub id: u64,
    pub price: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compare_at_price: Option<Decimal>,
}

/// Body for `PUT variants/{id}.json`. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VariantChanges {
    pub id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compare_at_price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub option1: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub option2: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub option3: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inventory_management: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inventory_policy: Option<String>,
}

impl VariantChanges {
    /// Sets `option1..option3` from positional option values.
    #[must_use]
    pub fn with_options(mut self, options: &[String]) -> Self {
        let mut values = options.iter().cloned();
        self.option1 = values.next();
        self.option2 = values.next();
        self.option3 = values.next();
        self
    }
}

// ---------------------------------------------------------------------------
// Inventory
// ---------------------------------------------------------------------------

/// Body for `POST inventory_levels/set.json`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InventoryLevelSet {
    pub location_id: u64,
    pub inventory_item_id: u64,
    pub available: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryLevel {
    pub inventory_item_id: u64,
    pub location_id: u64,
    #[serde(default)]
    pub available: Option<i64>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

// ---------------------------------------------------------------------------
// Customers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metafield {
    pub id: u64,
    pub namespace: String,
    pub key: String,
    #[serde(default)]
    pub value: serde_json::Value,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderSummary {
    pub id: u64,
    #[serde(default)]
    pub order_number: Option<u64>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub total_price: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub financial_status: Option<String>,
    #[serde(default)]
    pub fulfillment_status: Option<String>,
}

/// Customer record with the metafields and recent orders fetched alongside it.
#[derive(Debug, Clone, Serialize)]
pub struct CustomerDetails {
    #[serde(flatten)]
    pub customer: serde_json::Map<String, serde_json::Value>,
    pub recent_orders: Vec<OrderSummary>,
    pub last_order_id: Option<u64>,
    pub last_order_date: Option<String>,
    pub metafields: Vec<Metafield>,
}

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

/// Body for `POST orders/{id}/transactions.json`.
#[derive(Debug, Clone, Serialize)]
pub struct NewTransaction {
    pub kind: String,
    pub status: String,
    pub amount: Decimal,
    pub currency: String,
    pub gateway: String,
    pub source: String,
    pub message: String,
}

impl NewTransaction {
    pub const DEFAULT_GATEWAY: &'static str = "manual";
    pub const DEFAULT_MESSAGE: &'static str = "Payment processed externally";

    /// A successful capture recorded for a payment taken outside Shopify.
    #[must_use]
    pub fn external_capture(
        amount: Decimal,
        currency: impl Into<String>,
        gateway: Option<String>,
        message: Option<String>,
    ) -> Self {
        Self {
            kind: "capture".to_owned(),
            status: "success".to_owned(),
            amount,
            currency: currency.into(),
            gateway: gateway.unwrap_or_else(|| Self::DEFAULT_GATEWAY.to_owned()),
            source: "external".to_owned(),
            message: message.unwrap_or_else(|| Self::DEFAULT_MESSAGE.to_owned()),
        }
    }
}

// ---------------------------------------------------------------------------
// REST envelopes
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct ProductEnvelope {
    pub product: Product,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProductsEnvelope {
    pub products: Vec<Product>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VariantEnvelope {
    pub variant: Variant,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VariantsEnvelope {
    pub variants: Vec<Variant>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct InventoryLevelEnvelope {
    pub inventory_level: InventoryLevel,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CustomerEnvelope {
    pub customer: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MetafieldsEnvelope {
    pub metafields: Vec<Metafield>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CustomersEnvelope {
    pub customers: Vec<serde_json::Map<String, serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OrdersEnvelope {
    pub orders: Vec<OrderSummary>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawOrdersEnvelope {
    pub orders: Vec<serde_json::Map<String, serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OrderEnvelope {
    pub order: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TransactionEnvelope {
    pub transaction: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ImageEnvelope {
    pub image: ProductImage,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ImagesEnvelope {
    pub images: Vec<ProductImage>,
}

// ---------------------------------------------------------------------------
// GraphQL
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserError {
    #[serde(default)]
    pub field: Option<Vec<String>>,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphQlVariant {
    pub id: String,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub compare_at_price: Option<String>,
    #[serde(default)]
    pub sku: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphQlProduct {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub handle: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// A `MediaImage` node. Non-image media come back as empty objects, so every
/// field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphQlMedia {
    #[serde(default)]
    pub id: Option<String>,
    /// `UPLOADED`, `PROCESSING`, `READY` or `FAILED`.
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub image: Option<GraphQlImage>,
}

impl GraphQlMedia {
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.status.as_deref() == Some("READY")
    }

    #[must_use]
    pub fn has_failed(&self) -> bool {
        self.status.as_deref() == Some("FAILED")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphQlImage {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// An image to attach as product media, fetched by Shopify from `original_source`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMedia {
    pub original_source: String,
    pub alt: Option<String>,
}

/// Input for creating a product, its variants and its media through GraphQL.
#[derive(Debug, Clone, Default)]
pub struct ProductWithMedia {
    pub title: String,
    pub description_html: Option<String>,
    pub vendor: Option<String>,
    pub product_type: Option<String>,
    pub tags: Vec<String>,
    pub options: Vec<NewOption>,
    pub variants: Vec<VariantWithMedia>,
    pub media: Vec<NewMedia>,
}

#[derive(Debug, Clone)]
pub struct VariantWithMedia {
    pub price: Decimal,
    pub compare_at_price: Option<Decimal>,
    pub sku: Option<String>,
    /// Positional values matching [`ProductWithMedia::options`].
    pub option_values: Vec<String>,
    /// `original_source` of the media shown for this variant.
    pub media_src: Vec<String>,
}

/// A product created through GraphQL with the media attached to it.
#[derive(Debug, Clone, Serialize)]
pub struct CreatedProduct {
    pub product: GraphQlProduct,
    pub variants: Vec<GraphQlVariant>,
    pub media: Vec<GraphQlMedia>,
}

/// A variant's product and the media currently shown for it.
#[derive(Debug, Clone, Serialize)]
pub struct VariantMedia {
    pub variant_id: String,
    pub product_id: String,
    pub media: Vec<GraphQlMedia>,
}

/// A customer's id and default address, as returned by GraphQL.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerAddress {
    pub id: String,
    #[serde(default)]
    pub default_address: Option<serde_json::Map<String, serde_json::Value>>,
}

// ---------------------------------------------------------------------------
// Global ids
// ---------------------------------------------------------------------------

/// Formats a GraphQL global id, e.g. `gid://shopify/ProductVariant/42`.
#[must_use]
pub fn gid(resource: &str, id: u64) -> String {
    format!("gid://shopify/{resource}/{id}")
}

/// Extracts the numeric id from a global id of the given resource type.
#[must_use]
pub fn parse_gid(resource: &str, value: &str) -> Option<u64> {
    value
        .strip_prefix("gid://shopify/")?
        .strip_prefix(resource)?
        .strip_prefix('/')?
        .parse()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_gid_extracts_numeric_id() {
        assert_eq!(
            parse_gid("ProductVariant", "gid://shopify/ProductVariant/42"),
            Some(42)
        );
    }

    #[test]
    fn parse_gid_rejects_other_resources_and_garbage() {
        assert_eq!(parse_gid("ProductVariant", "gid://shopify/Product/42"), None);
        assert_eq!(parse_gid("Product", "gid://shopify/ProductVariant/42"), None);
        assert_eq!(parse_gid("Product", "42"), None);
        assert_eq!(parse_gid("Product", "gid://shopify/Product/abc"), None);
    }

    #[test]
    fn variant_changes_fill_option_slots_in_order() {
        let changes = VariantChanges {
            id: 1,
            ..VariantChanges::default()
        }
        .with_options(&["Red".to_owned(), "L".to_owned()]);
        assert_eq!(changes.option1.as_deref(), Some("Red"));
        assert_eq!(changes.option2.as_deref(), Some("L"));
        assert_eq!(changes.option3, None);

        let body = serde_json::to_value(&changes).expect("serialize");
        assert_eq!(body, serde_json::json!({ "id": 1, "option1": "Red", "option2": "L" }));
    }

    #[test]
    fn external_capture_defaults_gateway_and_message() {
        let tx = NewTransaction::external_capture(Decimal::new(1050, 2), "EUR", None, None);
        let body = serde_json::to_value(&tx).expect("serialize");
        assert_eq!(body["kind"], "capture");
        assert_eq!(body["source"], "external");
        assert_eq!(body["amount"], "10.50");
        assert_eq!(body["gateway"], "manual");
        assert_eq!(body["message"], "Payment processed externally");
    }

    #[test]
    fn gid_formats_resource_path() {
        assert_eq!(gid("Product", 7), "gid://shopify/Product/7");
    }

    #[test]
    fn product_deserializes_admin_shape() {
        let product: Product = serde_json::from_value(serde_json::json!({
            "id": 632_910_392,
            "title": "IPod Nano - 8GB",
            "tags": "Emotive, Flash Memory",
            "status": "active",
            "variants": [{
                "id": 808_950_810,
                "product_id": 632_910_392,
                "title": "Pink",
                "price": "199.00",
                "sku": "IPOD2008PINK",
                "inventory_item_id": 808_950_810,
                "image_id": null
            }],
            "images": [{ "id": 850_703_190, "src": "https://cdn.shopify.com/a.jpg", "variant_ids": [] }],
            "options": [{ "id": 594_680_422, "name": "Color", "values": ["Pink"] }]
        }))
        .expect("admin product should deserialize");

        assert_eq!(product.tags.as_deref(), Some("Emotive, Flash Memory"));
        assert_eq!(product.variants[0].sku.as_deref(), Some("IPOD2008PINK"));
        assert_eq!(product.options[0].values, vec!["Pink".to_string()]);
    }

    #[test]
    fn archive_changes_only_serialize_status() {
        let body = serde_json::to_value(ProductChanges::archive(9)).unwrap();
        assert_eq!(body, serde_json::json!({ "id": 9, "status": "archived" }));
    }

    #[test]
    fn default_title_variant_is_detected() {
        let variant: Variant =
            serde_json::from_value(serde_json::json!({ "id": 1, "title": "Default Title" }))
                .unwrap();
        assert!(variant.is_default_title());
    }
}
