//! Shared response shaping for batch endpoints.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use vendorsync_shopify::{
    BatchError, BatchFailure, BatchItem, BatchPayload, BatchResult, BatchStatus, BatchSuccess,
};

use super::{ApiError, ResponseMeta};

#[derive(Debug, Serialize)]
pub(super) struct BatchResponse<T: Serialize> {
    /// `true` only when every item succeeded.
    success: bool,
    status: BatchStatus,
    total: usize,
    successful: usize,
    failed: usize,
    results: Vec<BatchSuccess<T>>,
    errors: Vec<BatchFailure>,
    meta: ResponseMeta,
}

/// 200 when every item succeeded, 207 for a mix, 400 when none did.
pub(super) fn status_code(status: BatchStatus) -> StatusCode {
    match status {
        BatchStatus::Success => StatusCode::OK,
        BatchStatus::Partial => StatusCode::MULTI_STATUS,
        BatchStatus::Failure => StatusCode::BAD_REQUEST,
    }
}

pub(super) fn batch_response<T: Serialize>(request_id: String, result: BatchResult<T>) -> Response {
    let status = result.status();
    let body = BatchResponse {
        success: status == BatchStatus::Success,
        status,
        total: result.total(),
        successful: result.successes.len(),
        failed: result.failures.len(),
        results: result.successes,
        errors: result.failures,
        meta: ResponseMeta::new(request_id),
    };
    (status_code(status), Json(body)).into_response()
}

pub(super) fn batch_rejected(request_id: &str, error: &BatchError) -> ApiError {
    tracing::info!(error = %error, "batch rejected");
    ApiError::new(request_id, "validation_error", error.to_string())
}

/// Numbers the submitted array, or rejects a request that lacks it.
///
/// Elements arrive as raw JSON and `build` turns each into a payload, so a
/// malformed element becomes a failed entry rather than a rejected request.
pub(super) fn require_items<Q>(
    request_id: &str,
    items: Option<Vec<Value>>,
    field: &str,
    build: impl FnMut(Value) -> Q,
) -> Result<Vec<BatchItem<Q>>, ApiError> {
    items
        .map(|items| BatchItem::from_payloads(items.into_iter().map(build)))
        .ok_or_else(|| {
            ApiError::new(
                request_id,
                "validation_error",
                format!("{field} array is required and must not be empty"),
            )
        })
}

/// One array element, deserialized on its own.
#[derive(Debug, Clone)]
pub(super) struct RawItem<P> {
    parsed: Result<P, String>,
}

impl<P: DeserializeOwned> RawItem<P> {
    pub(super) fn parse(raw: Value) -> Self {
        let parsed = if raw.is_object() {
            serde_json::from_value(raw).map_err(|e| format!("invalid item: {e}"))
        } else {
            Err("item must be a JSON object".to_owned())
        };
        Self { parsed }
    }
}

impl<P> RawItem<P> {
    /// The parsed element, or the message its entry fails with.
    pub(super) fn get(&self) -> Result<&P, String> {
        self.parsed.as_ref().map_err(Clone::clone)
    }
}

impl<P: BatchPayload> BatchPayload for RawItem<P> {
    type Valid = P::Valid;

    fn validate(&self) -> Result<P::Valid, String> {
        self.get()?.validate()
    }

    fn identity(&self) -> Map<String, Value> {
        self.get().map(|p| p.identity()).unwrap_or_default()
    }
}
