//! Product mutations that only the GraphQL API offers: creation with media
//! in a single call, bulk variant creation, and deletion.

use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::ShopifyError;
use crate::types::{
    gid, CreatedProduct, GraphQlMedia, GraphQlProduct, GraphQlVariant, NewMedia, ProductWithMedia,
    UserError, VariantWithMedia,
};

use super::graphql::{check_user_errors, require_payload, Nodes};
use super::ShopifyClient;

const PRODUCT_CREATE: &str = r"
mutation productCreate($input: ProductInput!, $media: [CreateMediaInput!]) {
  productCreate(input: $input, media: $media) {
    product {
      id
      title
      handle
      status
      variants(first: 1) { nodes { id price compareAtPrice sku } }
      media(first: 50) { nodes { ... on MediaImage { id status image { id url } } } }
    }
    userErrors { field message }
  }
}";

const VARIANTS_BULK_CREATE: &str = r"
mutation productVariantsBulkCreate(
  $productId: ID!
  $variants: [ProductVariantsBulkInput!]!
  $strategy: ProductVariantsBulkCreateStrategy
) {
  productVariantsBulkCreate(productId: $productId, variants: $variants, strategy: $strategy) {
    productVariants { id price compareAtPrice sku }
    userErrors { field message }
  }
}";

const PRODUCT_DELETE: &str = r"
mutation productDelete($input: ProductDeleteInput!) {
  productDelete(input: $input) {
    deletedProductId
    userErrors { field message }
  }
}";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductCreateData {
    product_create: Option<ProductCreatePayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductCreatePayload {
    #[serde(default)]
    product: Option<CreatedProductNode>,
    #[serde(default)]
    user_errors: Vec<UserError>,
}

#[derive(Debug, Deserialize)]
struct CreatedProductNode {
    #[serde(flatten)]
    product: GraphQlProduct,
    #[serde(default)]
    variants: Option<Nodes<GraphQlVariant>>,
    #[serde(default)]
    media: Option<Nodes<GraphQlMedia>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BulkCreateData {
    product_variants_bulk_create: Option<BulkCreatePayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BulkCreatePayload {
    #[serde(default)]
    product_variants: Option<Vec<GraphQlVariant>>,
    #[serde(default)]
    user_errors: Vec<UserError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductDeleteData {
    product_delete: Option<ProductDeletePayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductDeletePayload {
    #[serde(default)]
    deleted_product_id: Option<String>,
    #[serde(default)]
    user_errors: Vec<UserError>,
}

impl ShopifyClient {
    /// Creates an active product with its options and media through
    /// `productCreate`. Shopify gives it one standalone variant, returned in
    /// [`CreatedProduct::variants`]; real variants are added afterwards with
    /// [`Self::create_variants_graphql`].
    ///
    /// # Errors
    ///
    /// [`ShopifyError::UserErrors`] when Shopify rejects the input, otherwise
    /// as [`Self::graphql`].
    pub async fn create_product_graphql(
        &self,
        input: &ProductWithMedia,
    ) -> Result<CreatedProduct, ShopifyError> {
        let media: Vec<Value> = input.media.iter().map(media_input).collect();
        let variables = json!({ "input": product_input(input), "media": media });

        let data: ProductCreateData = self.graphql(PRODUCT_CREATE, variables).await?;
        let payload = require_payload("productCreate", data.product_create)?;
        check_user_errors("productCreate", payload.user_errors)?;
        let node = require_payload("productCreate product", payload.product)?;

        tracing::info!(product = %node.product.id, title = %node.product.title, "created product via GraphQL");
        Ok(CreatedProduct {
            product: node.product,
            variants: node.variants.map(|v| v.nodes).unwrap_or_default(),
            media: node.media.map(|m| m.nodes).unwrap_or_default(),
        })
    }

    /// Adds variants to a product, replacing its standalone placeholder
    /// variant. `option_names` pairs positionally with each variant's
    /// [`VariantWithMedia::option_values`].
    ///
    /// # Errors
    ///
    /// [`ShopifyError::UserErrors`] when Shopify rejects a variant, otherwise
    /// as [`Self::graphql`].
    pub async fn create_variants_graphql(
        &self,
        product_gid: &str,
        option_names: &[String],
        variants: &[VariantWithMedia],
    ) -> Result<Vec<GraphQlVariant>, ShopifyError> {
        let variables = json!({
            "productId": product_gid,
            "variants": variants
                .iter()
                .map(|v| variant_input(v, option_names))
                .collect::<Vec<_>>(),
            "strategy": "REMOVE_STANDALONE_VARIANT",
        });

        let data: BulkCreateData = self.graphql(VARIANTS_BULK_CREATE, variables).await?;
        let payload = require_payload("productVariantsBulkCreate", data.product_variants_bulk_create)?;
        check_user_errors("productVariantsBulkCreate", payload.user_errors)?;
        Ok(payload.product_variants.unwrap_or_default())
    }

    /// Overwrites price, compare-at price, SKU and media of an existing
    /// variant, e.g. the standalone variant of a product without options.
    ///
    /// # Errors
    ///
    /// As [`Self::create_variants_graphql`].
    pub async fn update_variant_graphql(
        &self,
        product_gid: &str,
        variant_gid: &str,
        variant: &VariantWithMedia,
    ) -> Result<GraphQlVariant, ShopifyError> {
        let mut input = variant_input(variant, &[]);
        if let Some(fields) = input.as_object_mut() {
            fields.remove("optionValues");
            fields.insert("id".to_owned(), Value::String(variant_gid.to_owned()));
        }
        self.bulk_update_variants(product_gid, vec![input])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ShopifyError::GraphQl {
                message: "productVariantsBulkUpdate returned no variants".into(),
                errors: Value::Null,
            })
    }

    /// Deletes a product with its variants and media. Returns the deleted
    /// product's global id.
    ///
    /// # Errors
    ///
    /// [`ShopifyError::UserErrors`] for an unknown product, otherwise as
    /// [`Self::graphql`].
    pub async fn delete_product(&self, product_id: u64) -> Result<String, ShopifyError> {
        let product_gid = gid("Product", product_id);
        let variables = json!({ "input": { "id": product_gid } });

        let data: ProductDeleteData = self.graphql(PRODUCT_DELETE, variables).await?;
        let payload = require_payload("productDelete", data.product_delete)?;
        check_user_errors("productDelete", payload.user_errors)?;
        tracing::info!(product_id, "deleted product");
        Ok(payload.deleted_product_id.unwrap_or(product_gid))
    }
}

fn product_input(input: &ProductWithMedia) -> Value {
    let options: Vec<Value> = input
        .options
        .iter()
        .map(|o| {
            json!({
                "name": o.name,
                "values": o.values.iter().map(|v| json!({ "name": v })).collect::<Vec<_>>(),
            })
        })
        .collect();

    let mut product = json!({
        "title": input.title,
        "status": "ACTIVE",
        "tags": input.tags,
    });
    if let Some(fields) = product.as_object_mut() {
        let optional = [
            ("descriptionHtml", input.description_html.as_ref()),
            ("vendor", input.vendor.as_ref()),
            ("productType", input.product_type.as_ref()),
        ];
        for (key, value) in optional {
            if let Some(value) = value {
                fields.insert(key.to_owned(), Value::String(value.clone()));
            }
        }
        if !options.is_empty() {
            fields.insert("productOptions".to_owned(), Value::Array(options));
        }
    }
    product
}

pub(super) fn media_input(media: &NewMedia) -> Value {
    json!({
        "originalSource": media.original_source,
        "alt": media.alt,
        "mediaContentType": "IMAGE",
    })
}

fn variant_input(variant: &VariantWithMedia, option_names: &[String]) -> Value {
    let option_values: Vec<Value> = option_names
        .iter()
        .zip(&variant.option_values)
        .map(|(name, value)| json!({ "optionName": name, "name": value }))
        .collect();

    let mut input = json!({
        "price": variant.price.to_string(),
        "inventoryPolicy": "DENY",
        "inventoryItem": { "sku": variant.sku, "tracked": true },
        "optionValues": option_values,
    });
    if let Some(fields) = input.as_object_mut() {
        if let Some(compare_at) = variant.compare_at_price {
            fields.insert("compareAtPrice".to_owned(), Value::String(compare_at.to_string()));
        }
        if !variant.media_src.is_empty() {
            fields.insert("mediaSrc".to_owned(), json!(variant.media_src));
        }
    }
    input
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::types::NewOption;

    fn tote() -> ProductWithMedia {
        ProductWithMedia {
            title: "Tote".into(),
            vendor: Some("acme".into()),
            tags: vec!["bags".into()],
            options: vec![NewOption {
                name: "Color".into(),
                values: vec!["Red".into(), "Blue".into()],
            }],
            ..ProductWithMedia::default()
        }
    }

    #[test]
    fn product_input_skips_absent_fields() {
        let input = product_input(&tote());
        assert_eq!(input["title"], "Tote");
        assert_eq!(input["vendor"], "acme");
        assert_eq!(input["status"], "ACTIVE");
        assert!(input.get("descriptionHtml").is_none());
        assert_eq!(input["productOptions"][0]["values"][1]["name"], "Blue");
    }

    #[test]
    fn variant_input_pairs_option_names_with_values() {
        let variant = VariantWithMedia {
            price: Decimal::new(2000, 2),
            compare_at_price: None,
            sku: Some("T-RED".into()),
            option_values: vec!["Red".into()],
            media_src: vec!["https://cdn.example.com/red.jpg".into()],
        };
        let input = variant_input(&variant, &["Color".to_owned()]);
        assert_eq!(input["price"], "20.00");
        assert_eq!(input["inventoryItem"]["sku"], "T-RED");
        assert_eq!(input["optionValues"], json!([{ "optionName": "Color", "name": "Red" }]));
        assert_eq!(input["mediaSrc"][0], "https://cdn.example.com/red.jpg");
        assert!(input.get("compareAtPrice").is_none());
    }
}
