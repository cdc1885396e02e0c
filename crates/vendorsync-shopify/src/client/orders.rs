//! Order reads and payment capture.

use serde_json::{Map, Value};

use crate::error::ShopifyError;
use crate::types::{
    NewTransaction, OrderEnvelope, OrdersEnvelope, RawOrdersEnvelope, TransactionEnvelope,
};

use super::{ShopifyClient, MAX_PAGE_SIZE};

/// Orders returned by a listing when no limit is given.
pub const DEFAULT_ORDER_LIMIT: u32 = 50;

/// Filters for `orders.json`. Shopify only returns open orders unless
/// `status` says otherwise, so the default asks for `any`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderFilter {
    pub status: String,
    pub financial_status: Option<String>,
    pub limit: u32,
}

impl Default for OrderFilter {
    fn default() -> Self {
        Self {
            status: "any".to_owned(),
            financial_status: None,
            limit: DEFAULT_ORDER_LIMIT,
        }
    }
}

#[derive(serde::Serialize)]
struct TransactionBody<'a> {
    transaction: &'a NewTransaction,
}

impl ShopifyClient {
    /// One page of orders, newest first. `limit` is clamped to 1..=250.
    ///
    /// # Errors
    ///
    /// Any transport, status, or decoding failure.
    pub async fn list_orders(
        &self,
        filter: &OrderFilter,
    ) -> Result<Vec<Map<String, Value>>, ShopifyError> {
        let mut url = self.endpoint("orders.json")?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("status", &filter.status)
                .append_pair("limit", &filter.limit.clamp(1, MAX_PAGE_SIZE).to_string());
            if let Some(financial) = filter.financial_status.as_deref().filter(|s| !s.is_empty()) {
                query.append_pair("financial_status", financial);
            }
        }
        let (envelope, _) = self.get_json::<RawOrdersEnvelope>(url).await?;
        Ok(envelope.orders)
    }

    /// # Errors
    ///
    /// [`ShopifyError::NotFound`] for an unknown order, or any other request
    /// failure.
    pub async fn get_order(&self, order_id: u64) -> Result<Map<String, Value>, ShopifyError> {
        let url = self.endpoint(&format!("orders/{order_id}.json"))?;
        let (envelope, _) = self.get_json::<OrderEnvelope>(url).await?;
        Ok(envelope.order)
    }

    /// Resolves an order name such as `#1001` (or plain `1001`) to its id.
    ///
    /// # Errors
    ///
    /// Any transport, status, or decoding failure. An unmatched name is
    /// `Ok(None)`.
    pub async fn find_order_id_by_name(&self, name: &str) -> Result<Option<u64>, ShopifyError> {
        let name = name.trim();
        let name = if name.starts_with('#') {
            name.to_owned()
        } else {
            format!("#{name}")
        };

        let mut url = self.endpoint("orders.json")?;
        url.query_pairs_mut()
            .append_pair("name", &name)
            .append_pair("status", "any")
            .append_pair("limit", "1")
            .append_pair("fields", "id");
        let (envelope, _) = self.get_json::<OrdersEnvelope>(url).await?;
        Ok(envelope.orders.first().map(|o| o.id))
    }

    /// Records a transaction against an order, e.g. a capture for a payment
    /// taken outside Shopify.
    ///
    /// # Errors
    ///
    /// [`ShopifyError::NotFound`] for an unknown order,
    /// [`ShopifyError::UnexpectedStatus`] (typically 422 when the amount
    /// exceeds the outstanding balance), or any other request failure.
    pub async fn create_transaction(
        &self,
        order_id: u64,
        transaction: &NewTransaction,
    ) -> Result<Map<String, Value>, ShopifyError> {
        let url = self.endpoint(&format!("orders/{order_id}/transactions.json"))?;
        let envelope: TransactionEnvelope =
            self.post_json(url, &TransactionBody { transaction }).await?;
        tracing::info!(order_id, kind = %transaction.kind, "recorded order transaction");
        Ok(envelope.transaction)
    }
}
