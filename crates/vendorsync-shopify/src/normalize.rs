//! Conversion from Admin API products to the vendor-facing shape.
//!
//! Vendors see Shopify ids under explicit `shopify_*` names, tags as a list,
//! and prices as decimals. Unparseable prices become `None` rather than
//! failing the whole product.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::types::{Product, ProductImage, Variant};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VendorProduct {
    pub shopify_id: u64,
    pub title: String,
    pub body_html: Option<String>,
    pub vendor: Option<String>,
    pub product_type: Option<String>,
    pub handle: Option<String>,
    pub tags: Vec<String>,
    pub status: String,
    pub shopify_created_at: Option<String>,
    pub shopify_updated_at: Option<String>,
    pub variants: Vec<VendorVariant>,
    pub images: Vec<VendorImage>,
    pub options: Vec<VendorOption>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VendorVariant {
    pub shopify_variant_id: u64,
    pub shopify_inventory_item_id: Option<u64>,
    pub title: Option<String>,
    pub sku: Option<String>,
    pub barcode: Option<String>,
    pub price: Option<Decimal>,
    pub compare_at_price: Option<Decimal>,
    pub inventory_quantity: Option<i64>,
    pub shopify_image_id: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VendorImage {
    pub shopify_image_id: u64,
    pub src: Option<String>,
    pub alt: Option<String>,
    pub position: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VendorOption {
    pub name: String,
    pub values: Vec<String>,
}

#[must_use]
pub fn normalize_product(product: Product) -> VendorProduct {
    VendorProduct {
        shopify_id: product.id,
        title: product.title,
        body_html: product.body_html.filter(|s| !s.is_empty()),
        vendor: product.vendor.filter(|s| !s.is_empty()),
        // Treat empty string as absent.
        product_type: product.product_type.filter(|s| !s.is_empty()),
        handle: product.handle,
        tags: split_tags(product.tags.as_deref()),
        status: product.status.unwrap_or_else(|| "active".to_string()),
        shopify_created_at: product.created_at,
        shopify_updated_at: product.updated_at,
        variants: product.variants.into_iter().map(normalize_variant).collect(),
        images: product.images.into_iter().map(normalize_image).collect(),
        options: product
            .options
            .into_iter()
            .map(|o| VendorOption {
                name: o.name,
                values: o.values,
            })
            .collect(),
    }
}

fn normalize_variant(variant: Variant) -> VendorVariant {
    VendorVariant {
        shopify_variant_id: variant.id,
        shopify_inventory_item_id: variant.inventory_item_id,
        title: variant.title,
        sku: variant.sku.filter(|s| !s.is_empty()),
        barcode: variant.barcode.filter(|s| !s.is_empty()),
        price: parse_price(variant.price.as_deref()),
        compare_at_price: parse_price(variant.compare_at_price.as_deref()),
        inventory_quantity: variant.inventory_quantity,
        shopify_image_id: variant.image_id,
    }
}

fn normalize_image(image: ProductImage) -> VendorImage {
    VendorImage {
        shopify_image_id: image.id,
        src: image.src,
        alt: image.alt,
        position: image.position,
    }
}

/// Splits Shopify's comma-separated tag string, trimming and dropping blanks.
#[must_use]
pub fn split_tags(tags: Option<&str>) -> Vec<String> {
    tags.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Joins tags into the comma-separated form Shopify expects on writes.
#[must_use]
pub fn join_tags(tags: &[String]) -> String {
    tags.iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

fn parse_price(raw: Option<&str>) -> Option<Decimal> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| Decimal::from_str(s).ok())
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
