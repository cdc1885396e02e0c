//! Customer reads.

use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::error::ShopifyError;
use crate::pacing::pause;
use crate::types::{
    gid, CustomerAddress, CustomerDetails, CustomerEnvelope, CustomersEnvelope,
    MetafieldsEnvelope, OrdersEnvelope,
};

use super::{ShopifyClient, MAX_PAGE_SIZE};

/// Number of recent orders returned with a customer.
pub const RECENT_ORDER_LIMIT: u32 = 5;

/// Customers returned by a listing when no limit is given.
pub const DEFAULT_CUSTOMER_LIMIT: u32 = 50;

/// Fields requested for customer listings.
const CUSTOMER_LIST_FIELDS: &str =
    "id,first_name,last_name,email,phone,orders_count,total_spent,created_at,updated_at,addresses";

const CUSTOMER_DEFAULT_ADDRESS: &str = r"
query customerDefaultAddress($id: ID!) {
  customer(id: $id) {
    id
    defaultAddress {
      id address1 address2 city province provinceCode zip country countryCodeV2
      phone company firstName lastName formatted formattedArea
    }
  }
}";

#[derive(Debug, Deserialize)]
struct DefaultAddressData {
    customer: Option<CustomerAddress>,
}

impl ShopifyClient {
    /// Fetches a customer with their metafields and most recent orders.
    ///
    /// Three requests are made in sequence, paced by the client's request
    /// delay. Orders come back newest first, so the first one supplies
    /// `last_order_id` and `last_order_date`.
    ///
    /// # Errors
    ///
    /// [`ShopifyError::NotFound`] for an unknown customer, or the first
    /// failure among the three requests.
    pub async fn get_customer_details(
        &self,
        customer_id: u64,
    ) -> Result<CustomerDetails, ShopifyError> {
        let url = self.endpoint(&format!("customers/{customer_id}.json"))?;
        let (customer, _) = self.get_json::<CustomerEnvelope>(url).await?;

        pause(self.request_delay).await;
        let url = self.endpoint(&format!("customers/{customer_id}/metafields.json"))?;
        let (metafields, _) = self.get_json::<MetafieldsEnvelope>(url).await?;

        pause(self.request_delay).await;
        let mut url = self.endpoint(&format!("customers/{customer_id}/orders.json"))?;
        url.query_pairs_mut()
            .append_pair("status", "any")
            .append_pair("limit", &RECENT_ORDER_LIMIT.to_string());
        let (orders, _) = self.get_json::<OrdersEnvelope>(url).await?;

        let latest = orders.orders.first();
        Ok(CustomerDetails {
            last_order_id: latest.map(|o| o.id),
            last_order_date: latest.and_then(|o| o.created_at.clone()),
            customer: customer.customer,
            metafields: metafields.metafields,
            recent_orders: orders.orders,
        })
    }

    /// One page of customers with contact fields and addresses. `limit` is
    /// clamped to 1..=250.
    ///
    /// # Errors
    ///
    /// Any transport, status, or decoding failure.
    pub async fn list_customers(&self, limit: u32) -> Result<Vec<Map<String, Value>>, ShopifyError> {
        let mut url = self.endpoint("customers.json")?;
        url.query_pairs_mut()
            .append_pair("limit", &limit.clamp(1, MAX_PAGE_SIZE).to_string())
            .append_pair("fields", CUSTOMER_LIST_FIELDS);
        let (envelope, _) = self.get_json::<CustomersEnvelope>(url).await?;
        Ok(envelope.customers)
    }

    /// A customer's default address through GraphQL. `default_address` is
    /// `None` when the customer has none.
    ///
    /// # Errors
    ///
    /// [`ShopifyError::NotFound`] for an unknown customer, otherwise as
    /// [`Self::graphql`].
    pub async fn get_customer_default_address(
        &self,
        customer_id: u64,
    ) -> Result<CustomerAddress, ShopifyError> {
        let customer_gid = gid("Customer", customer_id);
        let data: DefaultAddressData = self
            .graphql(CUSTOMER_DEFAULT_ADDRESS, json!({ "id": customer_gid }))
            .await?;
        data.customer
            .ok_or(ShopifyError::NotFound { url: customer_gid })
    }
}
