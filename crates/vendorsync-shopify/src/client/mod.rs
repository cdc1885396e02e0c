//! HTTP client for the Shopify Admin REST and GraphQL APIs.
//!
//! Every method here makes a single attempt. Rate limits surface as
//! [`ShopifyError::RateLimited`] so callers decide where the retry boundary
//! sits: the batch processor wraps each item, pagination wraps each page, and
//! standalone reads go through [`ShopifyClient::retrying`].

mod customers;
mod graphql;
mod inventory;
mod media;
mod orders;
mod product_mutations;
mod products;
mod variants;

use std::future::Future;
use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use vendorsync_core::AppConfig;

use crate::error::ShopifyError;
use crate::retry::{parse_retry_after, retry_with_backoff, RetryPolicy};

pub use customers::{DEFAULT_CUSTOMER_LIMIT, RECENT_ORDER_LIMIT};
pub use orders::{OrderFilter, DEFAULT_ORDER_LIMIT};
pub use products::ProductFilter;

/// Header carrying the Admin API access token.
pub const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Access-Token";

/// Largest page size the Admin API accepts for REST listings.
pub const MAX_PAGE_SIZE: u32 = 250;

pub struct ShopifyClient {
    pub(super) client: Client,
    /// Admin API root, always ending in `/`, e.g.
    /// `https://shop.myshopify.com/admin/api/2024-10/`.
    pub(super) base_url: Url,
    pub(super) access_token: String,
    pub(super) retry: RetryPolicy,
    pub(super) page_size: u32,
    /// Pause between consecutive requests of one logical operation
    /// (listing pages, the steps of a multi-call flow).
    pub(super) request_delay: Duration,
}

impl std::fmt::Debug for ShopifyClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopifyClient")
            .field("base_url", &self.base_url.as_str())
            .field("access_token", &"[redacted]")
            .field("retry", &self.retry)
            .field("page_size", &self.page_size)
            .field("request_delay", &self.request_delay)
            .finish_non_exhaustive()
    }
}

impl ShopifyClient {
    /// Builds a client for the shop and API version in `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ShopifyError::InvalidShopUrl`] if the shop domain does not
    /// form a valid URL, or [`ShopifyError::Http`] if the `reqwest::Client`
    /// cannot be constructed.
    pub fn from_config(config: &AppConfig) -> Result<Self, ShopifyError> {
        let base = format!(
            "https://{}/admin/api/{}/",
            config.shop_domain, config.api_version
        );
        Ok(
            Self::new(&base, &config.access_token, config.request_timeout_secs)?
                .with_retry(RetryPolicy::from_config(config))
                .with_paging(
                    config.page_size,
                    Duration::from_millis(config.inter_request_delay_ms),
                ),
        )
    }

    /// Builds a client against an explicit Admin API root. Tests point this
    /// at a mock server.
    ///
    /// # Errors
    ///
    /// Returns [`ShopifyError::InvalidShopUrl`] if `base_url` is not a valid
    /// absolute URL, or [`ShopifyError::Http`] if the `reqwest::Client`
    /// cannot be constructed.
    pub fn new(base_url: &str, access_token: &str, timeout_secs: u64) -> Result<Self, ShopifyError> {
        let base_url = parse_base_url(base_url)?;
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("vendorsync/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url,
            access_token: access_token.to_owned(),
            retry: RetryPolicy::default(),
            page_size: MAX_PAGE_SIZE,
            request_delay: Duration::from_millis(500),
        })
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Sets the listing page size (clamped to 1..=250) and the pause between
    /// consecutive requests.
    #[must_use]
    pub fn with_paging(mut self, page_size: u32, request_delay: Duration) -> Self {
        self.page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        self.request_delay = request_delay;
        self
    }

    #[must_use]
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Runs `operation` through the retry wrapper with this client's policy.
    ///
    /// # Errors
    ///
    /// Whatever `operation` returns once retries are exhausted or a
    /// non-rate-limit failure occurs.
    pub async fn retrying<T, F, Fut>(&self, operation: F) -> Result<T, ShopifyError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ShopifyError>>,
    {
        retry_with_backoff(&self.retry, operation).await
    }

    /// Resolves a path such as `products/1.json` against the Admin API root.
    pub(super) fn endpoint(&self, path: &str) -> Result<Url, ShopifyError> {
        self.base_url
            .join(path)
            .map_err(|e| ShopifyError::InvalidShopUrl {
                shop: self.base_url.to_string(),
                reason: format!("cannot resolve \"{path}\": {e}"),
            })
    }

    /// Sends an authenticated request and maps non-2xx statuses to typed
    /// errors.
    async fn send(&self, request: RequestBuilder, url: &Url) -> Result<Response, ShopifyError> {
        let response = request
            .header(ACCESS_TOKEN_HEADER, &self.access_token)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = parse_retry_after(
                response
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok()),
            );
            return Err(ShopifyError::RateLimited {
                url: url.to_string(),
                retry_after,
            });
        }

        if status == StatusCode::NOT_FOUND {
            return Err(ShopifyError::NotFound {
                url: url.to_string(),
            });
        }

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ShopifyError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
                body: error_body(&text),
            });
        }

        Ok(response)
    }

    /// `GET`s `url` and returns the decoded body plus the raw `Link` header.
    pub(super) async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
    ) -> Result<(T, Option<String>), ShopifyError> {
        let response = self.send(self.client.get(url.clone()), &url).await?;

        // Extract the Link header before consuming the response body.
        let link_header = response
            .headers()
            .get(reqwest::header::LINK)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);

        let parsed = decode(response, &url).await?;
        Ok((parsed, link_header))
    }

    pub(super) async fn post_json<B, T>(&self, url: Url, body: &B) -> Result<T, ShopifyError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.send(self.client.post(url.clone()).json(body), &url).await?;
        decode(response, &url).await
    }

    pub(super) async fn put_json<B, T>(&self, url: Url, body: &B) -> Result<T, ShopifyError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.send(self.client.put(url.clone()).json(body), &url).await?;
        decode(response, &url).await
    }

    /// `DELETE`s `url`, discarding the (usually empty) response body.
    pub(super) async fn delete(&self, url: Url) -> Result<(), ShopifyError> {
        self.send(self.client.delete(url.clone()), &url).await?;
        Ok(())
    }
}

fn parse_base_url(base_url: &str) -> Result<Url, ShopifyError> {
    let with_slash = if base_url.ends_with('/') {
        base_url.to_owned()
    } else {
        format!("{base_url}/")
    };
    let url = Url::parse(&with_slash).map_err(|e| ShopifyError::InvalidShopUrl {
        shop: base_url.to_owned(),
        reason: e.to_string(),
    })?;
    if url.cannot_be_a_base() || url.host_str().is_none() {
        return Err(ShopifyError::InvalidShopUrl {
            shop: base_url.to_owned(),
            reason: "not an absolute http(s) URL".into(),
        });
    }
    Ok(url)
}

async fn decode<T: DeserializeOwned>(response: Response, url: &Url) -> Result<T, ShopifyError> {
    let body = response.text().await?;
    serde_json::from_str::<T>(&body).map_err(|e| ShopifyError::Deserialize {
        context: format!("response from {}", url.path()),
        source: e,
    })
}

/// Shopify error bodies are JSON (`{"errors": ...}`); anything else is kept
/// as a plain string so the caller still sees it.
fn error_body(text: &str) -> Option<serde_json::Value> {
    if text.trim().is_empty() {
        return None;
    }
    Some(
        serde_json::from_str(text)
            .unwrap_or_else(|_| serde_json::Value::String(text.to_owned())),
    )
}

#[cfg(test)]
#[path = "../client_test.rs"]
mod tests;
