//! Cursor-based pagination for Shopify REST listings.
//!
//! The Admin API exposes the cursor for adjacent pages in the `Link` response
//! header, encoded as a `page_info` query parameter:
//!
//! ```text
//! <https://shop.myshopify.com/admin/api/2024-10/products.json?limit=250&page_info=PREV>; rel="previous",
//! <https://shop.myshopify.com/admin/api/2024-10/products.json?limit=250&page_info=NEXT>; rel="next"
//! ```
//!
//! The cursor is an opaque string: it is extracted and passed back verbatim,
//! never decoded or rebuilt.

use std::future::Future;
use std::time::Duration;

use crate::error::ShopifyError;
use crate::pacing::pause;
use crate::retry::{retry_with_backoff, RetryPolicy};

/// Maximum number of pages to walk before giving up. Guards against
/// cycling cursors.
pub const MAX_PAGES: usize = 200;

/// One page of a listing plus the cursor for the next one, if any.
#[derive(Debug)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<String>,
}

/// Walks a cursor-paginated listing until the upstream stops returning a
/// next cursor, accumulating every page's items in order.
///
/// `fetch_page` receives `None` for the first page and the previous page's
/// cursor afterwards. Each call goes through [`retry_with_backoff`];
/// `inter_page_delay` is applied between pages, never before the first.
///
/// Nothing is returned until the walk completes: a failure on any page
/// discards the pages fetched so far.
///
/// # Errors
///
/// Propagates any page failure, and returns [`ShopifyError::PaginationLimit`]
/// if more than `max_pages` pages are requested.
pub async fn fetch_all_pages<T, F, Fut>(
    path: &str,
    retry: &RetryPolicy,
    inter_page_delay: Duration,
    max_pages: usize,
    mut fetch_page: F,
) -> Result<Vec<T>, ShopifyError>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Page<T>, ShopifyError>>,
{
    let mut all_items: Vec<T> = Vec::new();
    let mut cursor: Option<String> = None;
    let mut page_count = 0usize;

    loop {
        page_count += 1;
        if page_count > max_pages {
            return Err(ShopifyError::PaginationLimit {
                path: path.to_owned(),
                max_pages,
            });
        }

        if page_count > 1 {
            pause(inter_page_delay).await;
        }

        let page = retry_with_backoff(retry, || fetch_page(cursor.clone())).await?;
        tracing::debug!(
            path,
            page = page_count,
            items = page.items.len(),
            has_next = page.next_cursor.is_some(),
            "fetched listing page"
        );
        all_items.extend(page.items);

        cursor = page.next_cursor;
        if cursor.is_none() {
            break;
        }
    }

    Ok(all_items)
}

/// Parses a `Link` header value and extracts the `page_info` cursor for the
/// next page.
///
/// Returns `None` if the header is absent, has no `rel="next"` segment (last
/// page reached), or the next URL carries no `page_info` parameter.
#[must_use]
pub fn extract_next_cursor(link_header: Option<&str>) -> Option<String> {
    let header = link_header?;

    for segment in header.split(',') {
        let segment = segment.trim();

        if !segment.contains(r#"rel="next""#) {
            continue;
        }

        let url = extract_angle_bracket_url(segment)?;
        return extract_query_param(url, "page_info");
    }

    None
}

/// Extracts the URL between `<` and `>` in a link directive segment.
fn extract_angle_bracket_url(segment: &str) -> Option<&str> {
    let start = segment.find('<')? + 1;
    let end = segment.find('>')?;
    segment.get(start..end).filter(|url| !url.is_empty())
}

/// Extracts the raw value of a named query parameter from a URL string.
///
/// The value is not percent-decoded; it is handed back to Shopify as-is.
fn extract_query_param(url: &str, param: &str) -> Option<String> {
    let (_, query) = url.split_once('?')?;

    let needle = format!("{param}=");
    for pair in query.split('&') {
        if let Some(value) = pair.strip_prefix(needle.as_str()) {
            let value = value.split('#').next().unwrap_or(value);
            if !value.is_empty() {
                return Some(value.to_owned());
            }
        }
    }
    None
}
