//! Variant reads and writes.

use crate::error::ShopifyError;
use crate::types::{
    NewVariant, Variant, VariantChanges, VariantEnvelope, VariantPriceChange, VariantsEnvelope,
};

use super::ShopifyClient;

#[derive(serde::Serialize)]
struct VariantBody<'a, T: serde::Serialize> {
    variant: &'a T,
}

impl ShopifyClient {
    /// # Errors
    ///
    /// [`ShopifyError::NotFound`] for an unknown id, or any other request
    /// failure.
    pub async fn get_variant(&self, variant_id: u64) -> Result<Variant, ShopifyError> {
        let url = self.endpoint(&format!("variants/{variant_id}.json"))?;
        let (envelope, _) = self.get_json::<VariantEnvelope>(url).await?;
        Ok(envelope.variant)
    }

    /// Lists a product's variants. A product has at most 100, so this is a
    /// single request.
    ///
    /// # Errors
    ///
    /// [`ShopifyError::NotFound`] for an unknown product, or any other
    /// request failure.
    pub async fn list_variants(&self, product_id: u64) -> Result<Vec<Variant>, ShopifyError> {
        let mut url = self.endpoint(&format!("products/{product_id}/variants.json"))?;
        url.query_pairs_mut().append_pair("limit", "250");
        let (envelope, _) = self.get_json::<VariantsEnvelope>(url).await?;
        Ok(envelope.variants)
    }

    /// Sets a variant's price and, when given, its compare-at price.
    ///
    /// # Errors
    ///
    /// [`ShopifyError::NotFound`] for an unknown variant,
    /// [`ShopifyError::UnexpectedStatus`] for a rejected price, or any other
    /// request failure.
    pub async fn update_variant_price(
        &self,
        change: &VariantPriceChange,
    ) -> Result<Variant, ShopifyError> {
        let url = self.endpoint(&format!("variants/{}.json", change.id))?;
        let envelope: VariantEnvelope = self.put_json(url, &VariantBody { variant: change }).await?;
        Ok(envelope.variant)
    }

    /// Applies the fields set in `changes`; absent fields are left untouched.
    ///
    /// # Errors
    ///
    /// [`ShopifyError::NotFound`] for an unknown variant,
    /// [`ShopifyError::UnexpectedStatus`] when Shopify rejects a value, or
    /// any other request failure.
    pub async fn update_variant(&self, changes: &VariantChanges) -> Result<Variant, ShopifyError> {
        let url = self.endpoint(&format!("variants/{}.json", changes.id))?;
        let envelope: VariantEnvelope = self.put_json(url, &VariantBody { variant: changes }).await?;
        Ok(envelope.variant)
    }

    /// # Errors
    ///
    /// [`ShopifyError::NotFound`] for an unknown product,
    /// [`ShopifyError::UnexpectedStatus`] (typically 422, e.g. a duplicate
    /// option combination), or any other request failure.
    pub async fn create_variant(
        &self,
        product_id: u64,
        variant: &NewVariant,
    ) -> Result<Variant, ShopifyError> {
        let url = self.endpoint(&format!("products/{product_id}/variants.json"))?;
        let envelope: VariantEnvelope = self.post_json(url, &VariantBody { variant }).await?;
        Ok(envelope.variant)
    }

    /// # Errors
    ///
    /// [`ShopifyError::NotFound`] if the variant or product is gone, or any
    /// other request failure.
    pub async fn delete_variant(&self, product_id: u64, variant_id: u64) -> Result<(), ShopifyError> {
        let url = self.endpoint(&format!("products/{product_id}/variants/{variant_id}.json"))?;
        self.delete(url).await
    }
}
