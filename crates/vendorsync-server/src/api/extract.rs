//! Request body extraction that answers malformed JSON with the API error
//! envelope instead of axum's plain-text rejection.

use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;

use crate::middleware::RequestId;

use super::ApiError;

/// Drop-in replacement for [`Json`] on handler arguments.
#[derive(Debug)]
pub(super) struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let request_id = req
            .extensions()
            .get::<RequestId>()
            .map(|id| id.0.clone())
            .unwrap_or_default();

        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(body_rejected(request_id, &rejection)),
        }
    }
}

fn body_rejected(request_id: String, rejection: &JsonRejection) -> ApiError {
    tracing::info!(
        status = %rejection.status(),
        error = %rejection.body_text(),
        "request body rejected"
    );
    ApiError::new(request_id, "validation_error", rejection.body_text())
}
