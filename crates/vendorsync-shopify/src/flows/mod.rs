//! Multi-call operations built on [`ShopifyClient`].
//!
//! Each flow runs as one retryable unit: a batch item, or a standalone call
//! wrapped in [`ShopifyClient::retrying`]. A flow therefore only ever fails
//! with a rate limit *before* its primary mutation lands. Steps after the
//! mutation retry on their own and never surface a rate limit:
//!
//! - optional steps (image cleanup, media association, option naming,
//!   placeholder variant removal) are reported through [`SubStepPolicy`];
//! - required steps (the variants of a new product) always fail with
//!   [`ShopifyError::SubStep`].

mod products;
mod variants;

use serde::Serialize;
use vendorsync_core::SubStepPolicy;

use crate::client::ShopifyClient;
use crate::error::ShopifyError;
use crate::types::{gid, Variant};

pub use products::{create_product_full, create_product_with_media, FullProduct, FullProductCreation, VariantSpec};
pub use variants::{
    create_variant_for_product, delete_default_title_variant, delete_variant_with_image,
    update_variant_media, update_variant_with_image, DefaultVariantRemoval, UpdatedVariant,
    VariantCreation, VariantDeletion, VariantMediaUpdate, VariantUpdate, MEDIA_READY_CHECKS,
};

/// The caller-facing view of a variant a flow created or changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariantSummary {
    pub id: u64,
    pub gid: String,
    pub sku: Option<String>,
    pub price: Option<String>,
    pub image_id: Option<u64>,
    pub inventory_item_id: Option<u64>,
    pub options: Vec<String>,
}

impl From<&Variant> for VariantSummary {
    fn from(variant: &Variant) -> Self {
        Self {
            id: variant.id,
            gid: gid("ProductVariant", variant.id),
            sku: variant.sku.clone(),
            price: variant.price.clone(),
            image_id: variant.image_id,
            inventory_item_id: variant.inventory_item_id,
            options: variant.option_values(),
        }
    }
}

/// Option names for positional values when the caller gave none.
fn generated_option_names(count: usize) -> Vec<String> {
    (1..=count.min(3)).map(|n| format!("Option {n}")).collect()
}

/// Applies `policy` to a failed optional step.
///
/// # Errors
///
/// [`ShopifyError::SubStep`] under [`SubStepPolicy::FailHard`]. The wrapper
/// is never rate-limited, so an enclosing retry will not repeat the primary
/// mutation.
fn handle_sub_step_failure(
    policy: SubStepPolicy,
    step: &str,
    err: ShopifyError,
    warnings: &mut Vec<String>,
) -> Result<(), ShopifyError> {
    match policy {
        SubStepPolicy::FailSoft => {
            tracing::warn!(step, error = %err, "sub-step failed; continuing");
            warnings.push(format!("{step}: {err}"));
            Ok(())
        }
        SubStepPolicy::FailHard => Err(sub_step(step, err)),
    }
}

/// Wraps the failure of a step the operation cannot complete without.
fn required_step<T>(step: &str, result: Result<T, ShopifyError>) -> Result<T, ShopifyError> {
    result.map_err(|err| {
        tracing::error!(step, error = %err, "required step failed after the primary change");
        sub_step(step, err)
    })
}

fn sub_step(step: &str, err: ShopifyError) -> ShopifyError {
    ShopifyError::SubStep {
        step: step.to_owned(),
        source: Box::new(err),
    }
}
