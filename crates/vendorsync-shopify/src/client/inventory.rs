use crate::error::ShopifyError;
use crate::types::{InventoryLevel, InventoryLevelEnvelope, InventoryLevelSet};

use super::ShopifyClient;

impl ShopifyClient {
    /// Sets the available quantity of an inventory item at a location,
    /// overwriting whatever was there.
    ///
    /// # Errors
    ///
    /// [`ShopifyError::UnexpectedStatus`] when Shopify rejects the item or
    /// location (422), or any other request failure.
    pub async fn set_inventory_level(
        &self,
        level: &InventoryLevelSet,
    ) -> Result<InventoryLevel, ShopifyError> {
        let url = self.endpoint("inventory_levels/set.json")?;
        let envelope: InventoryLevelEnvelope = self.post_json(url, level).await?;
        Ok(envelope.inventory_level)
    }
}
