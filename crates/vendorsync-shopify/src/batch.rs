//! Sequential batch processing with per-item isolation.
//!
//! Items are processed strictly in input order, one remote operation at a
//! time, with a fixed pause between items so a batch never bursts past the
//! Admin API's rate limit. Every item ends up in exactly one of
//! [`BatchResult::successes`] or [`BatchResult::failures`]; a failing item
//! never aborts the rest of the batch.

use std::future::Future;
use std::time::Duration;

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use vendorsync_core::AppConfig;

use crate::error::ShopifyError;
use crate::pacing::pause;
use crate::retry::{retry_with_backoff, RateLimitSignal, RetryPolicy};

/// A vendor payload that can be submitted to [`BatchProcessor::run`].
pub trait BatchPayload {
    /// The checked, Shopify-ready form of the payload handed to the operation.
    type Valid: Clone;

    /// Checks required fields. The message is reported verbatim in the
    /// item's failure entry.
    ///
    /// # Errors
    ///
    /// Returns a human-readable description of what is missing or malformed.
    fn validate(&self) -> Result<Self::Valid, String>;

    /// Fields echoed back in the item's result or error entry so callers
    /// can match outcomes to their records. Never used for control flow.
    fn identity(&self) -> Map<String, Value>;
}

/// Errors an item operation may fail with.
pub trait ItemError: RateLimitSignal + std::fmt::Display {
    /// Upstream payload worth returning to the caller alongside the message.
    fn details(&self) -> Option<Value> {
        None
    }
}

impl ItemError for ShopifyError {
    fn details(&self) -> Option<Value> {
        ShopifyError::details(self)
    }
}

/// A single unit of work: its position in the request and its payload.
#[derive(Debug, Clone)]
pub struct BatchItem<P> {
    pub index: usize,
    pub payload: P,
}

impl<P> BatchItem<P> {
    /// Numbers payloads by their position in the submitted array.
    pub fn from_payloads(payloads: impl IntoIterator<Item = P>) -> Vec<Self> {
        payloads
            .into_iter()
            .enumerate()
            .map(|(index, payload)| Self { index, payload })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Rejected before any remote call.
    ValidationError,
    /// Throttled on every allowed attempt.
    RateLimited,
    /// Any other remote failure.
    UpstreamError,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchSuccess<T> {
    pub index: usize,
    #[serde(flatten)]
    pub identity: Map<String, Value>,
    pub result: T,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchFailure {
    pub index: usize,
    #[serde(flatten)]
    pub identity: Map<String, Value>,
    pub kind: FailureKind,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    /// Every item succeeded.
    Success,
    /// At least one success and at least one failure.
    Partial,
    /// No item succeeded.
    Failure,
}

#[derive(Debug, Clone)]
pub struct BatchResult<T> {
    pub successes: Vec<BatchSuccess<T>>,
    pub failures: Vec<BatchFailure>,
}

impl<T> BatchResult<T> {
    #[must_use]
    pub fn total(&self) -> usize {
        self.successes.len() + self.failures.len()
    }

    #[must_use]
    pub fn status(&self) -> BatchStatus {
        match (self.successes.is_empty(), self.failures.is_empty()) {
            (_, true) => BatchStatus::Success,
            (false, false) => BatchStatus::Partial,
            (true, false) => BatchStatus::Failure,
        }
    }
}

/// Reasons a whole batch is refused before any item is touched.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BatchError {
    #[error("batch is empty; at least one item is required")]
    Empty,

    #[error("batch of {received} items exceeds the limit of {limit}; split it into smaller batches")]
    TooLarge { limit: usize, received: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchConfig {
    pub max_batch_size: usize,
    pub inter_item_delay: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_batch_size: 100,
            inter_item_delay: Duration::from_millis(500),
        }
    }
}

impl BatchConfig {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            max_batch_size: config.max_batch_size,
            inter_item_delay: Duration::from_millis(config.inter_request_delay_ms),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BatchProcessor {
    pub config: BatchConfig,
    pub retry: RetryPolicy,
}

impl BatchProcessor {
    #[must_use]
    pub fn new(config: BatchConfig, retry: RetryPolicy) -> Self {
        Self { config, retry }
    }

    /// Checks the batch-level limits without processing anything.
    ///
    /// # Errors
    ///
    /// [`BatchError::Empty`] for no items, [`BatchError::TooLarge`] above
    /// [`BatchConfig::max_batch_size`].
    pub fn check_size(&self, received: usize) -> Result<(), BatchError> {
        if received == 0 {
            return Err(BatchError::Empty);
        }
        if received > self.config.max_batch_size {
            return Err(BatchError::TooLarge {
                limit: self.config.max_batch_size,
                received,
            });
        }
        Ok(())
    }

    /// Validates and processes `items` in order, running `operation` on each
    /// valid payload through the retry wrapper.
    ///
    /// # Errors
    ///
    /// Only batch-level rejections ([`BatchError`]); per-item failures are
    /// recorded in the returned [`BatchResult`].
    pub async fn run<P, T, E, F, Fut>(
        &self,
        items: Vec<BatchItem<P>>,
        mut operation: F,
    ) -> Result<BatchResult<T>, BatchError>
    where
        P: BatchPayload,
        E: ItemError,
        F: FnMut(P::Valid) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.check_size(items.len())?;

        let total = items.len();
        let mut result = BatchResult {
            successes: Vec::new(),
            failures: Vec::new(),
        };

        for (position, item) in items.into_iter().enumerate() {
            let identity = item.payload.identity();

            match item.payload.validate() {
                Err(message) => {
                    tracing::info!(
                        index = item.index,
                        error = %message,
                        "batch item failed validation"
                    );
                    result.failures.push(BatchFailure {
                        index: item.index,
                        identity,
                        kind: FailureKind::ValidationError,
                        error: message,
                        details: None,
                    });
                }
                Ok(valid) => {
                    tracing::debug!(index = item.index, position = position + 1, total, "processing batch item");
                    let outcome =
                        retry_with_backoff(&self.retry, || operation(valid.clone())).await;
                    match outcome {
                        Ok(value) => result.successes.push(BatchSuccess {
                            index: item.index,
                            identity,
                            result: value,
                        }),
                        Err(err) => {
                            let kind = if err.is_rate_limited() {
                                FailureKind::RateLimited
                            } else {
                                FailureKind::UpstreamError
                            };
                            tracing::warn!(index = item.index, ?kind, error = %err, "batch item failed");
                            result.failures.push(BatchFailure {
                                index: item.index,
                                identity,
                                kind,
                                error: err.to_string(),
                                details: err.details(),
                            });
                        }
                    }
                }
            }

            if position + 1 < total {
                pause(self.config.inter_item_delay).await;
            }
        }

        tracing::info!(
            total,
            successful = result.successes.len(),
            failed = result.failures.len(),
            "batch finished"
        );
        Ok(result)
    }
}

#[cfg(test)]
#[path = "batch_test.rs"]
mod tests;
