use std::time::Duration;

use thiserror::Error;

use crate::retry::RateLimitSignal;
use crate::types::UserError;

#[derive(Debug, Error)]
pub enum ShopifyError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("rate limited by Shopify on {url}")]
    RateLimited {
        url: String,
        /// Server-indicated wait, when a usable `Retry-After` was sent.
        retry_after: Option<Duration>,
    },

    #[error("resource not found: {url}")]
    NotFound { url: String },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus {
        status: u16,
        url: String,
        body: Option<serde_json::Value>,
    },

    #[error("GraphQL errors: {message}")]
    GraphQl {
        message: String,
        errors: serde_json::Value,
    },

    #[error("{operation} rejected: {}", format_user_errors(.errors))]
    UserErrors {
        operation: String,
        errors: Vec<UserError>,
    },

    #[error("{reason}")]
    Refused { reason: String },

    #[error("{step} failed after the primary change was applied: {source}")]
    SubStep {
        step: String,
        #[source]
        source: Box<ShopifyError>,
    },

    #[error("media {media_id} was not ready after {checks} checks (status {status})")]
    MediaNotReady {
        media_id: String,
        checks: usize,
        status: String,
    },

    #[error("pagination limit reached for {path}: exceeded {max_pages} pages")]
    PaginationLimit { path: String, max_pages: usize },

    #[error("invalid shop URL \"{shop}\": {reason}")]
    InvalidShopUrl { shop: String, reason: String },
}

impl ShopifyError {
    /// Upstream payload attached to the failure, if Shopify sent one.
    #[must_use]
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            ShopifyError::UnexpectedStatus { body, .. } => body.clone(),
            ShopifyError::GraphQl { errors, .. } => Some(errors.clone()),
            ShopifyError::UserErrors { errors, .. } => serde_json::to_value(errors).ok(),
            ShopifyError::SubStep { source, .. } => source.details(),
            _ => None,
        }
    }

    /// HTTP status reported by Shopify, when the failure came from a response.
    #[must_use]
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            ShopifyError::RateLimited { .. } => Some(429),
            ShopifyError::NotFound { .. } => Some(404),
            ShopifyError::UnexpectedStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl RateLimitSignal for ShopifyError {
    fn is_rate_limited(&self) -> bool {
        matches!(self, ShopifyError::RateLimited { .. })
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            ShopifyError::RateLimited { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

fn format_user_errors(errors: &[UserError]) -> String {
    errors
        .iter()
        .map(|e| match &e.field {
            Some(field) if !field.is_empty() => format!("{}: {}", field.join("."), e.message),
            _ => e.message.clone(),
        })
        .collect::<Vec<_>>()
        .join("; ")
}
