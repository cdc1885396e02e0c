//! Product and product image reads and writes.

use reqwest::Url;

use crate::error::ShopifyError;
use crate::pagination::{extract_next_cursor, fetch_all_pages, Page, MAX_PAGES};
use crate::types::{
    ImageEnvelope, ImagesEnvelope, NewImage, NewProduct, Product, ProductChanges, ProductEnvelope,
    ProductImage, ProductsEnvelope,
};

use super::ShopifyClient;

/// Filters for product listings. Only applied to the first page; Shopify
/// rejects filters alongside a `page_info` cursor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    pub status: Option<String>,
    pub vendor: Option<String>,
}

#[derive(serde::Serialize)]
struct ProductBody<'a, T: serde::Serialize> {
    product: &'a T,
}

impl ShopifyClient {
    /// # Errors
    ///
    /// [`ShopifyError::NotFound`] for an unknown id, or any transport,
    /// status, or decoding failure.
    pub async fn get_product(&self, product_id: u64) -> Result<Product, ShopifyError> {
        let url = self.endpoint(&format!("products/{product_id}.json"))?;
        let (envelope, _) = self.get_json::<ProductEnvelope>(url).await?;
        Ok(envelope.product)
    }

    /// Fetches one page of `products.json`. `cursor` is the opaque
    /// `page_info` from the previous page's `Link` header.
    ///
    /// # Errors
    ///
    /// Any transport, status, or decoding failure.
    pub async fn list_products_page(
        &self,
        filter: &ProductFilter,
        cursor: Option<&str>,
    ) -> Result<Page<Product>, ShopifyError> {
        let url = self.products_url(filter, cursor)?;
        let (envelope, link_header) = self.get_json::<ProductsEnvelope>(url).await?;
        Ok(Page {
            items: envelope.products,
            next_cursor: extract_next_cursor(link_header.as_deref()),
        })
    }

    /// Walks every page of `products.json`, retrying throttled pages.
    ///
    /// All-or-nothing: a page that still fails after retries discards the
    /// pages already fetched.
    ///
    /// # Errors
    ///
    /// Propagates the failing page's error, or
    /// [`ShopifyError::PaginationLimit`] after [`MAX_PAGES`] pages.
    pub async fn list_all_products(
        &self,
        filter: &ProductFilter,
    ) -> Result<Vec<Product>, ShopifyError> {
        fetch_all_pages(
            "products.json",
            &self.retry,
            self.request_delay,
            MAX_PAGES,
            |cursor| async move { self.list_products_page(filter, cursor.as_deref()).await },
        )
        .await
    }

    /// # Errors
    ///
    /// [`ShopifyError::UnexpectedStatus`] (typically 422 with Shopify's
    /// validation messages in `body`), or any transport or decoding failure.
    pub async fn create_product(&self, product: &NewProduct) -> Result<Product, ShopifyError> {
        let url = self.endpoint("products.json")?;
        let envelope: ProductEnvelope = self.post_json(url, &ProductBody { product }).await?;
        Ok(envelope.product)
    }

    /// Applies the fields set in `changes`; absent fields are left untouched.
    ///
    /// # Errors
    ///
    /// [`ShopifyError::NotFound`] for an unknown id, or any other request
    /// failure.
    pub async fn update_product(&self, changes: &ProductChanges) -> Result<Product, ShopifyError> {
        let url = self.endpoint(&format!("products/{}.json", changes.id))?;
        let envelope: ProductEnvelope = self
            .put_json(url, &ProductBody { product: changes })
            .await?;
        Ok(envelope.product)
    }

    /// Sets the product's status to `archived`, hiding it from every channel.
    ///
    /// # Errors
    ///
    /// See [`Self::update_product`].
    pub async fn archive_product(&self, product_id: u64) -> Result<Product, ShopifyError> {
        self.update_product(&ProductChanges::archive(product_id)).await
    }

    /// # Errors
    ///
    /// [`ShopifyError::NotFound`] for an unknown product, or any other
    /// request failure.
    pub async fn list_product_images(&self, product_id: u64) -> Result<Vec<ProductImage>, ShopifyError> {
        let url = self.endpoint(&format!("products/{product_id}/images.json"))?;
        let (envelope, _) = self.get_json::<ImagesEnvelope>(url).await?;
        Ok(envelope.images)
    }

    /// Uploads an image from `image.src`, attached to `image.variant_ids`.
    ///
    /// # Errors
    ///
    /// [`ShopifyError::UnexpectedStatus`] (typically 422 for an unreachable
    /// source), or any other request failure.
    pub async fn create_product_image(
        &self,
        product_id: u64,
        image: &NewImage,
    ) -> Result<ProductImage, ShopifyError> {
        #[derive(serde::Serialize)]
        struct ImageBody<'a> {
            image: &'a NewImage,
        }

        let url = self.endpoint(&format!("products/{product_id}/images.json"))?;
        let envelope: ImageEnvelope = self.post_json(url, &ImageBody { image }).await?;
        Ok(envelope.image)
    }

    /// # Errors
    ///
    /// [`ShopifyError::NotFound`] if the image is already gone, or any other
    /// request failure.
    pub async fn delete_product_image(
        &self,
        product_id: u64,
        image_id: u64,
    ) -> Result<(), ShopifyError> {
        let url = self.endpoint(&format!("products/{product_id}/images/{image_id}.json"))?;
        self.delete(url).await
    }

    /// Builds the `products.json` URL for one page.
    ///
    /// The first page carries `limit` and the filters. Cursor pages carry
    /// only `limit` and the cursor, written verbatim: it was already encoded
    /// by Shopify and must not be encoded again.
    pub(super) fn products_url(
        &self,
        filter: &ProductFilter,
        cursor: Option<&str>,
    ) -> Result<Url, ShopifyError> {
        let mut url = self.endpoint("products.json")?;
        match cursor {
            Some(cursor) => {
                url.set_query(Some(&format!("limit={}&page_info={cursor}", self.page_size)));
            }
            None => {
                let mut query = url.query_pairs_mut();
                query.append_pair("limit", &self.page_size.to_string());
                if let Some(status) = filter.status.as_deref().filter(|s| !s.is_empty()) {
                    query.append_pair("status", status);
                }
                if let Some(vendor) = filter.vendor.as_deref().filter(|s| !s.is_empty()) {
                    query.append_pair("vendor", vendor);
                }
            }
        }
        Ok(url)
    }
}
