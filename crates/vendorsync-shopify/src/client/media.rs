//! Product media through GraphQL: upload, status, deletion and attaching
//! media to a variant.

use serde::Deserialize;
use serde_json::json;

use crate::error::ShopifyError;
use crate::types::{gid, GraphQlMedia, NewMedia, UserError, VariantMedia};

use super::graphql::{check_user_errors, require_payload, Nodes};
use super::product_mutations::media_input;
use super::ShopifyClient;

const VARIANT_MEDIA: &str = r"
query variantMedia($id: ID!) {
  productVariant(id: $id) {
    id
    product { id }
    media(first: 20) { nodes { ... on MediaImage { id status image { id url } } } }
  }
}";

const MEDIA_NODE: &str = r"
query mediaNode($id: ID!) {
  node(id: $id) { ... on MediaImage { id status image { id url } } }
}";

const PRODUCT_CREATE_MEDIA: &str = r"
mutation productCreateMedia($productId: ID!, $media: [CreateMediaInput!]!) {
  productCreateMedia(productId: $productId, media: $media) {
    media { ... on MediaImage { id status image { id url } } }
    mediaUserErrors { field message }
  }
}";

const PRODUCT_DELETE_MEDIA: &str = r"
mutation productDeleteMedia($productId: ID!, $mediaIds: [ID!]!) {
  productDeleteMedia(productId: $productId, mediaIds: $mediaIds) {
    deletedMediaIds
    mediaUserErrors { field message }
  }
}";

const VARIANT_APPEND_MEDIA: &str = r"
mutation productVariantAppendMedia($productId: ID!, $variantMedia: [ProductVariantAppendMediaInput!]!) {
  productVariantAppendMedia(productId: $productId, variantMedia: $variantMedia) {
    productVariants { id }
    userErrors { field message }
  }
}";

#[derive(Debug, Deserialize)]
struct ProductRef {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VariantMediaData {
    product_variant: Option<VariantMediaNode>,
}

#[derive(Debug, Deserialize)]
struct VariantMediaNode {
    id: String,
    product: ProductRef,
    media: Nodes<GraphQlMedia>,
}

#[derive(Debug, Deserialize)]
struct MediaNodeData {
    node: Option<GraphQlMedia>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateMediaData {
    product_create_media: Option<CreateMediaPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateMediaPayload {
    #[serde(default)]
    media: Option<Vec<GraphQlMedia>>,
    #[serde(default)]
    media_user_errors: Vec<UserError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeleteMediaData {
    product_delete_media: Option<DeleteMediaPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeleteMediaPayload {
    #[serde(default)]
    deleted_media_ids: Option<Vec<String>>,
    #[serde(default)]
    media_user_errors: Vec<UserError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppendMediaData {
    product_variant_append_media: Option<AppendMediaPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppendMediaPayload {
    #[serde(default)]
    user_errors: Vec<UserError>,
}

impl ShopifyClient {
    /// Looks up a variant's product and the media shown for it.
    ///
    /// # Errors
    ///
    /// [`ShopifyError::NotFound`] for an unknown variant, otherwise as
    /// [`Self::graphql`].
    pub async fn variant_media(&self, variant_id: u64) -> Result<VariantMedia, ShopifyError> {
        let variant_gid = gid("ProductVariant", variant_id);
        let data: VariantMediaData = self
            .graphql(VARIANT_MEDIA, json!({ "id": variant_gid }))
            .await?;
        let node = data
            .product_variant
            .ok_or(ShopifyError::NotFound { url: variant_gid })?;

        Ok(VariantMedia {
            variant_id: node.id,
            product_id: node.product.id,
            media: node.media.nodes.into_iter().filter(|m| m.id.is_some()).collect(),
        })
    }

    /// Reads one media item, mainly to poll its processing `status`.
    ///
    /// # Errors
    ///
    /// [`ShopifyError::NotFound`] when the id resolves to nothing, otherwise
    /// as [`Self::graphql`].
    pub async fn get_media(&self, media_id: &str) -> Result<GraphQlMedia, ShopifyError> {
        let data: MediaNodeData = self.graphql(MEDIA_NODE, json!({ "id": media_id })).await?;
        data.node.ok_or_else(|| ShopifyError::NotFound {
            url: media_id.to_owned(),
        })
    }

    /// Uploads images to a product. Shopify fetches each `original_source`
    /// asynchronously, so new media usually start out `UPLOADED`.
    ///
    /// # Errors
    ///
    /// [`ShopifyError::UserErrors`] when Shopify rejects a source, otherwise
    /// as [`Self::graphql`].
    pub async fn create_product_media(
        &self,
        product_gid: &str,
        media: &[NewMedia],
    ) -> Result<Vec<GraphQlMedia>, ShopifyError> {
        let variables = json!({
            "productId": product_gid,
            "media": media.iter().map(media_input).collect::<Vec<_>>(),
        });
        let data: CreateMediaData = self.graphql(PRODUCT_CREATE_MEDIA, variables).await?;
        let payload = require_payload("productCreateMedia", data.product_create_media)?;
        check_user_errors("productCreateMedia", payload.media_user_errors)?;
        Ok(payload.media.unwrap_or_default())
    }

    /// Removes media from a product. Returns the ids Shopify deleted.
    ///
    /// # Errors
    ///
    /// As [`Self::create_product_media`].
    pub async fn delete_product_media(
        &self,
        product_gid: &str,
        media_ids: &[String],
    ) -> Result<Vec<String>, ShopifyError> {
        let variables = json!({ "productId": product_gid, "mediaIds": media_ids });
        let data: DeleteMediaData = self.graphql(PRODUCT_DELETE_MEDIA, variables).await?;
        let payload = require_payload("productDeleteMedia", data.product_delete_media)?;
        check_user_errors("productDeleteMedia", payload.media_user_errors)?;
        Ok(payload.deleted_media_ids.unwrap_or_default())
    }

    /// Shows a processed media item for a variant.
    ///
    /// # Errors
    ///
    /// [`ShopifyError::UserErrors`] when the media is not `READY` or does not
    /// belong to the product, otherwise as [`Self::graphql`].
    pub async fn append_variant_media(
        &self,
        product_gid: &str,
        variant_gid: &str,
        media_id: &str,
    ) -> Result<(), ShopifyError> {
        let variables = json!({
            "productId": product_gid,
            "variantMedia": [{ "variantId": variant_gid, "mediaIds": [media_id] }],
        });
        let data: AppendMediaData = self.graphql(VARIANT_APPEND_MEDIA, variables).await?;
        let payload = require_payload("productVariantAppendMedia", data.product_variant_append_media)?;
        check_user_errors("productVariantAppendMedia", payload.user_errors)
    }
}
