//! API error mapping.
//!
//! Every terminal state yields either a successful response with
//! provenance or a structured error — nothing is silently dropped.
//! Recoverable per-attempt failures never reach this layer; they are
//! absorbed by the dispatcher's failover.

use super::types::{ApiErrorBody, ApiErrorEnvelope};
use crate::classifier::ClassifyError;
use crate::dispatch::DispatchError;
use crate::selector::SelectError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

/// Terminal routing failures, mapped onto HTTP statuses.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Classify(#[from] ClassifyError),

    #[error(transparent)]
    Select(#[from] SelectError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, attempts) = match &self {
            ApiError::Classify(ClassifyError::EmptyInput) => {
                (StatusCode::BAD_REQUEST, "empty_input", None)
            }
            ApiError::Classify(ClassifyError::InputTooLarge { .. }) => {
                (StatusCode::BAD_REQUEST, "input_too_large", None)
            }
            ApiError::Select(SelectError::NoCapacity { .. }) => {
                (StatusCode::SERVICE_UNAVAILABLE, "no_capacity", None)
            }
            ApiError::Dispatch(DispatchError::AllRegionsExhausted { attempts }) => (
                StatusCode::BAD_GATEWAY,
                "all_regions_exhausted",
                Some(attempts.clone()),
            ),
        };

        let error_type = if status.is_client_error() {
            "invalid_request_error"
        } else {
            "routing_error"
        };

        let envelope = ApiErrorEnvelope {
            error: ApiErrorBody {
                message: self.to_string(),
                r#type: error_type.to_string(),
                code: code.to_string(),
                attempts,
            },
        };

        (status, Json(envelope)).into_response()
    }
}
