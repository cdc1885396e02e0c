//! Product creation flows that go beyond a single `POST products.json`.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::Serialize;
use vendorsync_core::SubStepPolicy;

use crate::client::ShopifyClient;
use crate::error::ShopifyError;
use crate::pacing::pause;
use crate::types::{
    gid, CreatedProduct, NewImage, NewOption, NewProduct, NewVariant, ProductChanges,
    ProductWithMedia, VariantChanges,
};

use super::{generated_option_names, handle_sub_step_failure, required_step, VariantSummary};

/// One variant to create: price and SKU plus positional option values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantSpec {
    pub price: Decimal,
    pub compare_at_price: Option<Decimal>,
    pub sku: String,
    pub barcode: Option<String>,
    pub options: Vec<String>,
    /// Source of an image in the same request to show for this variant.
    pub image_src: Option<String>,
}

impl VariantSpec {
    pub(super) fn new_variant(&self, image_id: Option<u64>) -> NewVariant {
        let mut options = self.options.iter().cloned();
        NewVariant {
            price: self.price,
            sku: self.sku.clone(),
            compare_at_price: self.compare_at_price,
            option1: options.next(),
            option2: options.next(),
            option3: options.next(),
            barcode: self.barcode.clone(),
            image_id,
            inventory_management: "shopify".to_owned(),
            inventory_policy: "deny".to_owned(),
        }
    }

    fn changes(&self, variant_id: u64, image_id: Option<u64>) -> VariantChanges {
        VariantChanges {
            id: variant_id,
            price: Some(self.price),
            compare_at_price: self.compare_at_price,
            sku: Some(self.sku.clone()),
            image_id,
            inventory_management: Some("shopify".to_owned()),
            inventory_policy: Some("deny".to_owned()),
            ..VariantChanges::default()
        }
        .with_options(&self.options)
    }
}

/// Input for [`create_product_full`].
#[derive(Debug, Clone, Default)]
pub struct FullProduct {
    pub title: String,
    pub body_html: Option<String>,
    pub vendor: Option<String>,
    pub product_type: Option<String>,
    /// Comma-separated.
    pub tags: String,
    pub status: Option<String>,
    /// Generated as `Option 1`, `Option 2`, ... when empty and a variant
    /// carries option values.
    pub option_names: Vec<String>,
    pub variants: Vec<VariantSpec>,
    pub images: Vec<NewImage>,
}

impl FullProduct {
    fn option_names(&self) -> Vec<String> {
        if !self.option_names.is_empty() {
            return self.option_names.clone();
        }
        let widest = self.variants.iter().map(|v| v.options.len()).max().unwrap_or(0);
        generated_option_names(widest)
    }

    /// The bare product: variants, images and options follow in later steps.
    fn new_product(&self) -> NewProduct {
        NewProduct {
            title: self.title.clone(),
            body_html: self.body_html.clone(),
            vendor: self.vendor.clone(),
            product_type: self.product_type.clone(),
            tags: self.tags.clone(),
            options: Vec::new(),
            variants: Vec::new(),
            images: Vec::new(),
            status: self.status.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FullProductCreation {
    pub product_id: u64,
    pub product_gid: String,
    pub title: String,
    pub variants: Vec<VariantSummary>,
    pub images_uploaded: usize,
    pub deleted_default_variant_id: Option<u64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Creates a product step by step: the product, its images, its option
/// names, its variants (each showing its image), and finally removal of the
/// `Default Title` placeholder.
///
/// A single variant is written onto the placeholder instead of being added
/// next to it. Image uploads, option naming and placeholder removal follow
/// `policy`; variant writes are required.
///
/// # Errors
///
/// - [`ShopifyError::SubStep`] when a variant write fails, or an optional
///   step fails under [`SubStepPolicy::FailHard`].
/// - Any failure from the product create itself.
pub async fn create_product_full(
    client: &ShopifyClient,
    input: &FullProduct,
    policy: SubStepPolicy,
) -> Result<FullProductCreation, ShopifyError> {
    let product = client.create_product(&input.new_product()).await?;
    let product_id = product.id;
    tracing::info!(product_id, title = %product.title, "created product");

    let mut creation = FullProductCreation {
        product_id,
        product_gid: gid("Product", product_id),
        title: product.title.clone(),
        variants: Vec::new(),
        images_uploaded: 0,
        deleted_default_variant_id: None,
        warnings: Vec::new(),
    };

    let mut image_ids: HashMap<&str, u64> = HashMap::new();
    for image in &input.images {
        pause(client.request_delay).await;
        match client
            .retrying(|| client.create_product_image(product_id, image))
            .await
        {
            Ok(uploaded) => {
                image_ids.insert(image.src.as_str(), uploaded.id);
                creation.images_uploaded += 1;
            }
            Err(err) => handle_sub_step_failure(
                policy,
                &format!("upload image {}", image.src),
                err,
                &mut creation.warnings,
            )?,
        }
    }

    let option_names = input.option_names();
    if !option_names.is_empty() {
        let changes = ProductChanges {
            id: product_id,
            options: Some(
                option_names
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
        if let Err(err) = client.retrying(|| client.update_product(&changes)).await {
            handle_sub_step_failure(policy, "configure options", err, &mut creation.warnings)?;
        }
    }

    let image_for = |spec: &VariantSpec| {
        spec.image_src
            .as_deref()
            .and_then(|src| image_ids.get(src).copied())
    };
    let default = product
        .variants
        .iter()
        .find(|v| v.is_default_title())
        .map(|v| v.id);

    if let (Some(default_id), [only]) = (default, input.variants.as_slice()) {
        let changes = only.changes(default_id, image_for(only));
        pause(client.request_delay).await;
        let variant = required_step(
            "update default variant",
            client.retrying(|| client.update_variant(&changes)).await,
        )?;
        creation.variants.push(VariantSummary::from(&variant));
        return Ok(creation);
    }

    for (index, spec) in input.variants.iter().enumerate() {
        let new_variant = spec.new_variant(image_for(spec));
        pause(client.request_delay).await;
        let variant = required_step(
            &format!("create variant {index} ({})", spec.sku),
            client
                .retrying(|| client.create_variant(product_id, &new_variant))
                .await,
        )?;
        creation.variants.push(VariantSummary::from(&variant));
    }

    if let Some(default_id) = default.filter(|_| !creation.variants.is_empty()) {
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

    tracing::info!(
        product_id,
        variants = creation.variants.len(),
        images = creation.images_uploaded,
        "finished product creation"
    );
    Ok(creation)
}

/// Creates a product with its options and media in one GraphQL call, then
/// its variants.
///
/// Without options a product can only have one variant, which is written
/// onto the standalone variant Shopify created.
///
/// # Errors
///
/// - [`ShopifyError::Refused`] for several variants without options,
///   before anything is created.
/// - [`ShopifyError::SubStep`] when the variant step fails.
/// - Any failure from `productCreate` itself.
pub async fn create_product_with_media(
    client: &ShopifyClient,
    input: &ProductWithMedia,
) -> Result<CreatedProduct, ShopifyError> {
    if input.options.is_empty() && input.variants.len() > 1 {
        return Err(ShopifyError::Refused {
            reason: "options are required to create more than one variant".into(),
        });
    }

    let mut created = client.create_product_graphql(input).await?;
    let Some(first) = input.variants.first() else {
        return Ok(created);
    };
    let product_gid = created.product.id.clone();
    let standalone = created.variants.first().map(|v| v.id.clone());

    pause(client.request_delay).await;
    let variants = if input.options.is_empty() {
        let updated = match standalone.as_deref() {
            Some(variant_gid) => {
                client
                    .retrying(|| client.update_variant_graphql(&product_gid, variant_gid, first))
                    .await
            }
            None => Err(ShopifyError::GraphQl {
                message: "productCreate returned no variant to update".into(),
                errors: serde_json::Value::Null,
            }),
        };
        required_step("update standalone variant", updated.map(|v| vec![v]))?
    } else {
        let option_names: Vec<String> = input.options.iter().map(|o| o.name.clone()).collect();
        required_step(
            "create variants",
            client
                .retrying(|| client.create_variants_graphql(&product_gid, &option_names, &input.variants))
                .await,
        )?
    };

    created.variants = variants;
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(sku: &str, options: &[&str]) -> VariantSpec {
        VariantSpec {
            price: Decimal::new(1000, 2),
            compare_at_price: None,
            sku: sku.to_owned(),
            barcode: None,
            options: options.iter().map(|o| (*o).to_owned()).collect(),
            image_src: None,
        }
    }

    #[test]
    fn option_names_are_generated_from_widest_variant() {
        let product = FullProduct {
            title: "Tote".into(),
            variants: vec![spec("A", &["Red"]), spec("B", &["Blue", "L"])],
            ..FullProduct::default()
        };
        assert_eq!(product.option_names(), vec!["Option 1", "Option 2"]);
    }

    #[test]
    fn given_option_names_win() {
        let product = FullProduct {
            option_names: vec!["Color".into()],
            variants: vec![spec("A", &["Red"])],
            ..FullProduct::default()
        };
        assert_eq!(product.option_names(), vec!["Color"]);
    }

    #[test]
    fn new_product_leaves_variants_for_later_steps() {
        let product = FullProduct {
            title: "Tote".into(),
            variants: vec![spec("A", &[])],
            images: vec![NewImage::from_src("https://cdn.example.com/a.jpg", None)],
            ..FullProduct::default()
        };
        let body = serde_json::to_value(product.new_product()).expect("serialize");
        assert_eq!(body["variants"], serde_json::json!([]));
        assert!(body.get("images").is_none());
    }

    #[test]
    fn spec_changes_carry_options_and_image() {
        let changes = spec("A", &["Red", "L"]).changes(7, Some(70));
        assert_eq!(changes.option2.as_deref(), Some("L"));
        assert_eq!(changes.image_id, Some(70));
        assert_eq!(changes.sku.as_deref(), Some("A"));
    }
}
