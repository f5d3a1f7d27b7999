use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use services::ServiceError;

/// Standardized API response wrapper for all outgoing JSON responses.
///
/// ```json
/// {
///   "success": true,
///   "data": { ... },
///   "message": "Some message"
/// }
/// ```
///
/// - `T` is the type of the `data` payload.
/// - `success` is a boolean indicating operation status.
/// - `message` provides a human-readable context string.
#[derive(Serialize)]
pub struct ApiResponse<T>
where
    T: Serialize,
{
    pub success: bool,
    pub data: T,
    pub message: String,
}

impl<T> ApiResponse<T>
where
    T: Serialize,
{
    /// Constructs a success response with the given data and message.
    pub fn success(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data,
            message: message.into(),
        }
    }

    /// Constructs an error response with a message and default `data`.
    pub fn error(message: impl Into<String>) -> Self
    where
        T: Default,
    {
        Self {
            success: false,
            data: T::default(),
            message: message.into(),
        }
    }
}

/// Error half of a handler's `Result`. Converts service-layer errors into the
/// standard response envelope with the right status code, so handlers can use
/// `?` on service calls.
pub struct ApiError(pub ServiceError);

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match &self.0 {
            ServiceError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ServiceError::InvalidState(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ServiceError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ServiceError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            ServiceError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            ServiceError::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, msg.clone()),
            // Internal detail is logged, not sent to the client.
            ServiceError::Db(e) => {
                tracing::error!(error = %e, "database error while handling request");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                )
            }
            ServiceError::Storage(e) => {
                tracing::error!(error = %e, "storage error while handling request");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                )
            }
        };

        (
            status,
            Json(ApiResponse::<crate::auth::guards::Empty>::error(message)),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: ServiceError) -> StatusCode {
        ApiError(err).into_response().status()
    }

    #[test]
    fn service_errors_map_to_expected_status_codes() {
        assert_eq!(
            status_of(ServiceError::validation("bad input")),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(ServiceError::invalid_state("event has been cancelled")),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(ServiceError::not_found("event not found")),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(ServiceError::forbidden("not yours")),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_of(ServiceError::conflict("duplicate")),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(ServiceError::payload_too_large("too big")),
            StatusCode::PAYLOAD_TOO_LARGE
        );
    }

    #[test]
    fn internal_errors_do_not_leak_detail() {
        let response = ApiError(ServiceError::Storage(std::io::Error::other(
            "disk exploded at /secret/path",
        )))
        .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
