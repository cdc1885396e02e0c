//! Variant flows: deletion with image cleanup, creation on an existing
//! product, updates with an image, and media replacement.

use serde::Serialize;
use vendorsync_core::SubStepPolicy;

use crate::client::ShopifyClient;
use crate::error::ShopifyError;
use crate::pacing::pause;
use crate::types::{NewImage, NewMedia, NewOption, ProductChanges, VariantChanges};

use super::products::VariantSpec;
use super::{generated_option_names, handle_sub_step_failure, VariantSummary};

/// How many times new media is polled for `READY` before giving up on
/// showing it for a variant.
pub const MEDIA_READY_CHECKS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariantDeletion {
    pub variant_id: u64,
    pub product_id: u64,
    /// Image removed because no remaining variant referenced it.
    pub deleted_image_id: Option<u64>,
    /// Sub-step failures tolerated under [`SubStepPolicy::FailSoft`].
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DefaultVariantRemoval {
    pub product_id: u64,
    /// `None` when the product had no `Default Title` variant.
    pub deleted_variant_id: Option<u64>,
    pub remaining_variants: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariantCreation {
    pub product_id: u64,
    pub variant: VariantSummary,
    pub deleted_default_variant_id: Option<u64>,
    pub image_ids: Vec<u64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Input for [`update_variant_with_image`].
#[derive(Debug, Clone)]
pub struct VariantUpdate {
    pub product_id: u64,
    pub changes: VariantChanges,
    /// Image to show for the variant; reused when the product already has
    /// an image with this source, uploaded otherwise.
    pub image_src: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdatedVariant {
    pub product_id: u64,
    pub variant: VariantSummary,
    pub updated_fields: Vec<&'static str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariantMediaUpdate {
    pub variant_id: String,
    pub product_id: String,
    pub removed_media_ids: Vec<String>,
    pub created_media_ids: Vec<String>,
    pub attached_media_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Deletes a variant, then its image if no other variant of the product
/// still uses it.
///
/// Refuses to delete a product's only variant: Shopify would reject it, and
/// the product would be left without a sellable variant.
///
/// # Errors
///
/// - [`ShopifyError::NotFound`] if the variant does not exist.
/// - [`ShopifyError::Refused`] for the only variant of a product.
/// - [`ShopifyError::SubStep`] when the image cleanup fails under
///   [`SubStepPolicy::FailHard`].
/// - Any failure from the lookups or the delete itself.
pub async fn delete_variant_with_image(
    client: &ShopifyClient,
    variant_id: u64,
    policy: SubStepPolicy,
) -> Result<VariantDeletion, ShopifyError> {
    let variant = client.get_variant(variant_id).await?;
    let product_id = variant.product_id.ok_or_else(|| ShopifyError::Refused {
        reason: format!("variant {variant_id} is not attached to a product"),
    })?;

    pause(client.request_delay).await;
    let siblings = client.list_variants(product_id).await?;
    if siblings.iter().all(|v| v.id == variant_id) {
        return Err(ShopifyError::Refused {
            reason: format!(
                "variant {variant_id} is the only variant of product {product_id}; \
                 delete or archive the product instead"
            ),
        });
    }

    pause(client.request_delay).await;
    client.delete_variant(product_id, variant_id).await?;
    tracing::info!(variant_id, product_id, "deleted variant");

    let mut deletion = VariantDeletion {
        variant_id,
        product_id,
        deleted_image_id: None,
        warnings: Vec::new(),
    };

    let Some(image_id) = variant.image_id else {
        return Ok(deletion);
    };
    let still_used = siblings
        .iter()
        .any(|v| v.id != variant_id && v.image_id == Some(image_id));
    if still_used {
        return Ok(deletion);
    }

    pause(client.request_delay).await;
    match client
        .retrying(|| client.delete_product_image(product_id, image_id))
        .await
    {
        Ok(()) => deletion.deleted_image_id = Some(image_id),
        Err(err) => handle_sub_step_failure(
            policy,
            "delete orphaned variant image",
            err,
            &mut deletion.warnings,
        )?,
    }

    Ok(deletion)
}

/// Removes the placeholder `Default Title` variant from a product that has
/// since gained real variants.
///
/// # Errors
///
/// - [`ShopifyError::Refused`] when the default variant is the only one.
/// - Any failure from listing or deleting variants.
pub async fn delete_default_title_variant(
    client: &ShopifyClient,
    product_id: u64,
) -> Result<DefaultVariantRemoval, ShopifyError> {
    let variants = client.list_variants(product_id).await?;

    let Some(default) = variants.iter().find(|v| v.is_default_title()) else {
        return Ok(DefaultVariantRemoval {
            product_id,
            deleted_variant_id: None,
            remaining_variants: variants.len(),
        });
    };

    if variants.len() < 2 {
        return Err(ShopifyError::Refused {
            reason: format!(
                "product {product_id} has only its Default Title variant; add variants first"
            ),
        });
    }

    pause(client.request_delay).await;
    client.delete_variant(product_id, default.id).await?;
    tracing::info!(product_id, variant_id = default.id, "deleted Default Title variant");

    Ok(DefaultVariantRemoval {
        product_id,
        deleted_variant_id: Some(default.id),
        remaining_variants: variants.len() - 1,
    })
}

/// Adds a variant to an existing product.
///
/// A product that still only has its `Default Title` variant first gets
/// generic option names (`Option 1`, ...) so the new values have somewhere to
/// go, and loses the placeholder once the new variant exists. `images` are
/// uploaded attached to the new variant.
///
/// # Errors
///
/// - [`ShopifyError::NotFound`] for an unknown product.
/// - [`ShopifyError::SubStep`] when placeholder removal or an image upload
///   fails under [`SubStepPolicy::FailHard`].
/// - Any failure from the lookup, option naming, or the create itself.
pub async fn create_variant_for_product(
    client: &ShopifyClient,
    product_id: u64,
    spec: &VariantSpec,
    images: &[NewImage],
    policy: SubStepPolicy,
) -> Result<VariantCreation, ShopifyError> {
    let product = client.get_product(product_id).await?;
    let default = product
        .variants
        .iter()
        .find(|v| v.is_default_title())
        .map(|v| v.id);

    let untitled_options = product.options.iter().all(|o| o.name == "Title");
    if default.is_some() && untitled_options && !spec.options.is_empty() {
        let changes = ProductChanges {
            id: product_id,
            options: Some(
                generated_option_names(spec.options.len())
                    .into_iter()
                    .map(|name| NewOption {
                        name,
                        values: Vec::new(),
                    })
                    .collect(),
            ),
            ..ProductChanges::default()
        };
        pause(client.request_delay).await;
        client.update_product(&changes).await?;
    }

    pause(client.request_delay).await;
    let variant = client
        .create_variant(product_id, &spec.new_variant(None))
        .await?;
    tracing::info!(product_id, variant_id = variant.id, "created variant");

    let mut creation = VariantCreation {
        product_id,
        variant: VariantSummary::from(&variant),
        deleted_default_variant_id: None,
        image_ids: Vec::new(),
        warnings: Vec::new(),
    };

    if let Some(default_id) = default {
        pause(client.request_delay).await;
        match client
            .retrying(|| client.delete_variant(product_id, default_id))
            .await
        {
            Ok(()) => creation.deleted_default_variant_id = Some(default_id),
            Err(err) => handle_sub_step_failure(
                policy,
                "delete Default Title variant",
                err,
                &mut creation.warnings,
            )?,
        }
    }

    for image in images {
        let image = NewImage {
            variant_ids: vec![variant.id],
            ..image.clone()
        };
        pause(client.request_delay).await;
        match client
            .retrying(|| client.create_product_image(product_id, &image))
            .await
        {
            Ok(uploaded) => {
                creation.image_ids.push(uploaded.id);
                creation.variant.image_id.get_or_insert(uploaded.id);
            }
            Err(err) => handle_sub_step_failure(
                policy,
                &format!("attach image {}", image.src),
                err,
                &mut creation.warnings,
            )?,
        }
    }

    Ok(creation)
}

/// Applies `update.changes` to a variant, first resolving
/// `update.image_src` to a product image.
///
/// The image step runs before the update and follows `policy`: under
/// [`SubStepPolicy::FailSoft`] the variant is still updated, without the image.
///
/// # Errors
///
/// - [`ShopifyError::SubStep`] when the image step fails under
///   [`SubStepPolicy::FailHard`].
/// - Any failure from the variant update itself.
pub async fn update_variant_with_image(
    client: &ShopifyClient,
    update: &VariantUpdate,
    policy: SubStepPolicy,
) -> Result<UpdatedVariant, ShopifyError> {
    let mut changes = update.changes.clone();
    let mut warnings = Vec::new();

    if let Some(src) = update.image_src.as_deref() {
        let alt = changes.sku.clone();
        match find_or_upload_image(client, update.product_id, src, alt).await {
            Ok(image_id) => changes.image_id = Some(image_id),
            Err(err) => handle_sub_step_failure(policy, "attach image", err, &mut warnings)?,
        }
        pause(client.request_delay).await;
    }

    let variant = client.update_variant(&changes).await?;
    tracing::info!(product_id = update.product_id, variant_id = variant.id, "updated variant");

    Ok(UpdatedVariant {
        product_id: update.product_id,
        variant: VariantSummary::from(&variant),
        updated_fields: updated_fields(&changes),
        warnings,
    })
}

/// Replaces the media shown for a variant.
///
/// With no `images`, the variant's current media are removed from the
/// product. Otherwise the images are uploaded to the product (the primary
/// change) and the first one is shown for the variant once Shopify has
/// processed it; that association follows `policy`.
///
/// # Errors
///
/// - [`ShopifyError::NotFound`] for an unknown variant.
/// - [`ShopifyError::SubStep`] when the association fails under
///   [`SubStepPolicy::FailHard`].
/// - Any failure from the lookup, upload, or removal.
pub async fn update_variant_media(
    client: &ShopifyClient,
    variant_id: u64,
    images: &[NewMedia],
    policy: SubStepPolicy,
) -> Result<VariantMediaUpdate, ShopifyError> {
    let current = client.variant_media(variant_id).await?;
    let mut update = VariantMediaUpdate {
        variant_id: current.variant_id.clone(),
        product_id: current.product_id.clone(),
        removed_media_ids: Vec::new(),
        created_media_ids: Vec::new(),
        attached_media_id: None,
        warnings: Vec::new(),
    };

    if images.is_empty() {
        let media_ids: Vec<String> = current.media.iter().filter_map(|m| m.id.clone()).collect();
        if !media_ids.is_empty() {
            pause(client.request_delay).await;
            update.removed_media_ids = client
                .delete_product_media(&current.product_id, &media_ids)
                .await?;
            tracing::info!(variant_id, removed = update.removed_media_ids.len(), "removed variant media");
        }
        return Ok(update);
    }

    pause(client.request_delay).await;
    let created = client
        .create_product_media(&current.product_id, images)
        .await?;
    update.created_media_ids = created.iter().filter_map(|m| m.id.clone()).collect();
    tracing::info!(variant_id, created = update.created_media_ids.len(), "uploaded variant media");

    let attached = match update.created_media_ids.first() {
        Some(media_id) => {
            attach_when_ready(client, &current.product_id, &current.variant_id, media_id)
                .await
                .map(|()| media_id.clone())
        }
        None => Err(ShopifyError::GraphQl {
            message: "productCreateMedia returned no image media".into(),
            errors: serde_json::Value::Null,
        }),
    };
    match attached {
        Ok(media_id) => update.attached_media_id = Some(media_id),
        Err(err) => handle_sub_step_failure(
            policy,
            "attach media to variant",
            err,
            &mut update.warnings,
        )?,
    }

    Ok(update)
}

/// Polls new media until Shopify has processed it, then shows it for the
/// variant.
async fn attach_when_ready(
    client: &ShopifyClient,
    product_gid: &str,
    variant_gid: &str,
    media_id: &str,
) -> Result<(), ShopifyError> {
    let mut status = String::from("UNKNOWN");
    for _ in 0..MEDIA_READY_CHECKS {
        pause(client.request_delay).await;
        let media = client.retrying(|| client.get_media(media_id)).await?;
        if media.is_ready() {
            return client
                .retrying(|| client.append_variant_media(product_gid, variant_gid, media_id))
                .await;
        }
        if media.has_failed() {
            status = "FAILED".to_owned();
            break;
        }
        if let Some(current) = media.status {
            status = current;
        }
    }
    Err(ShopifyError::MediaNotReady {
        media_id: media_id.to_owned(),
        checks: MEDIA_READY_CHECKS,
        status,
    })
}

/// Id of the product image whose source is `src`, uploading it when the
/// product has none.
async fn find_or_upload_image(
    client: &ShopifyClient,
    product_id: u64,
    src: &str,
    alt: Option<String>,
) -> Result<u64, ShopifyError> {
    let images = client
        .retrying(|| client.list_product_images(product_id))
        .await?;
    if let Some(existing) = images
        .iter()
        .find(|image| image.src.as_deref().is_some_and(|s| same_source(s, src)))
    {
        return Ok(existing.id);
    }

    pause(client.request_delay).await;
    let image = NewImage::from_src(src, alt);
    let uploaded = client
        .retrying(|| client.create_product_image(product_id, &image))
        .await?;
    Ok(uploaded.id)
}

/// Shopify appends a `?v=` cache buster to image URLs it serves.
fn same_source(stored: &str, requested: &str) -> bool {
    let strip = |url: &str| url.split('?').next().unwrap_or(url).to_owned();
    strip(stored) == strip(requested)
}

fn updated_fields(changes: &VariantChanges) -> Vec<&'static str> {
    [
        ("price", changes.price.is_some()),
        ("compare_at_price", changes.compare_at_price.is_some()),
        ("sku", changes.sku.is_some()),
        ("options", changes.option1.is_some()),
        ("image", changes.image_id.is_some()),
    ]
    .into_iter()
    .filter_map(|(field, set)| set.then_some(field))
    .collect()
}
