//! Conversion of marshalling errors into HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use mlserve_spec::{ErrorCode, MarshalError};
use serde::Serialize;

/// Status label for errors caused by the request payload.
pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
/// Status label for errors raised by the prediction function.
pub const SERVER_ERROR: &str = "SERVER_ERROR";

/// JSON body returned for any failed request.
#[derive(Debug, Serialize)]
pub struct ErrorResponse<'a> {
    pub status: &'static str,
    pub code: ErrorCode,
    pub error: String,
    pub details: &'a MarshalError,
}

/// A request failure.
///
/// Validation errors map to `400 Bad Request`, everything else to
/// `500 Internal Server Error`.
#[derive(Debug)]
pub struct ApiError(pub MarshalError);

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        if self.0.is_validation() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }

    pub fn status_label(&self) -> &'static str {
        if self.0.is_validation() {
            VALIDATION_ERROR
        } else {
            SERVER_ERROR
        }
    }
}

impl From<MarshalError> for ApiError {
    fn from(err: MarshalError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            status: self.status_label(),
            code: self.0.code(),
            error: self.0.to_string(),
            details: &self.0,
        };
        (self.status_code(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mlserve_spec::PayloadSection;

    #[test]
    fn test_status_mapping() {
        let err = ApiError(MarshalError::MalformedBody {
            section: PayloadSection::Body,
            found: "a list".into(),
        });
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.status_label(), "VALIDATION_ERROR");

        let err = ApiError(MarshalError::HandlerFailure {
            rule: "/x".into(),
            message: "boom".into(),
        });
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.status_label(), "SERVER_ERROR");
    }
}
