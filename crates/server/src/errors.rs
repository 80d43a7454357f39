use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use common::envelope::{
    Envelope, CODE_INTERNAL, CODE_INVALID_VALUE, CODE_MISSING_PARAM, CODE_THROTTLED,
    CODE_VALIDATION,
};
use service::ServiceError;
use tracing::error;

/// Every failure leaves the server as one of these; the envelope carries a
/// stable `error_code` so clients can branch without parsing messages.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0}")]
    MissingParam(String),
    #[error("{0}")]
    InvalidValue(String),
    #[error("invalid credentials")]
    Unauthorized,
    #[error("request throttled")]
    Throttled,
    #[error("permission denied for {method}")]
    Forbidden { method: String },
    #[error("internal error")]
    Internal(String),
}

impl ApiError {
    pub fn not_found(entity: &str) -> Self {
        ApiError::NotFound(entity.to_string())
    }
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::Validation(msg) | ServiceError::Conflict(msg) => ApiError::Validation(msg),
            ServiceError::NotFound(entity) => ApiError::NotFound(entity),
            ServiceError::Unauthorized => ApiError::Unauthorized,
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, Envelope::error(CODE_VALIDATION, msg))
            }
            ApiError::NotFound(entity) => (
                StatusCode::NOT_FOUND,
                Envelope::error(CODE_VALIDATION, format!("{} not found", entity)),
            ),
            ApiError::MissingParam(msg) => {
                (StatusCode::BAD_REQUEST, Envelope::error(CODE_MISSING_PARAM, msg))
            }
            ApiError::InvalidValue(msg) => {
                (StatusCode::BAD_REQUEST, Envelope::error(CODE_INVALID_VALUE, msg))
            }
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                Envelope::error(CODE_VALIDATION, "Invalid credentials"),
            ),
            ApiError::Forbidden { method } => {
                (StatusCode::FORBIDDEN, Envelope::forbidden(&method))
            }
            ApiError::Throttled => (
                StatusCode::TOO_MANY_REQUESTS,
                Envelope::error(CODE_THROTTLED, "Request was throttled."),
            ),
            ApiError::Internal(detail) => {
                // internals stay in the log, never in the response body
                error!(%detail, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Envelope::error(CODE_INTERNAL, "Internal server error"),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_maps_to_404_with_validation_code() {
        let resp = ApiError::not_found("Service").into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn unauthorized_service_error_maps_to_401() {
        let api: ApiError = ServiceError::Unauthorized.into();
        let resp = api.into_response();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn internal_detail_never_reaches_the_envelope() {
        let api: ApiError = ServiceError::Db("password=hunter2".into()).into();
        let resp = api.into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
