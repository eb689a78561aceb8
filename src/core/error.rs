//! 请求失败到 HTTP 响应的映射
//!
//! 400 返回逐字段的 `errors` 列表；其余失败统一返回 [`ErrorResponse`]，
//! 500 时只给出通用消息，具体原因写日志。

use axum::{
    extract::rejection::BytesRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::{debug, error};

use crate::app::product::{id::IdError, store::StoreError};
use crate::core::response::{ErrorResponse, ValidationErrorResponse};
use crate::core::validation::FieldErrors;

pub const INTERNAL_SERVER_ERROR_MESSAGE: &str = "Internal server error";

/// Every way a request can fail once it reaches a handler.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The body failed its schema; reported field by field.
    #[error("request body failed validation with {} field error(s)", .0.len())]
    BadRequest(FieldErrors),
    /// The body could not be read at all, e.g. it exceeds the size limit.
    #[error("failed to read request body: {}", .0.body_text())]
    Body(BytesRejection),
    #[error("{0}")]
    NotFound(String),
    /// A path id that is not an object id. Reported as a server fault.
    #[error("malformed product id: {0}")]
    MalformedId(#[from] IdError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// `Payload Too Large` becomes `PAYLOAD_TOO_LARGE`.
fn error_label(status: StatusCode) -> String {
    status
        .canonical_reason()
        .unwrap_or("ERROR")
        .to_uppercase()
        .replace(' ', "_")
}

impl IntoResponse for CoreError {
    fn into_response(self) -> Response {
        let (status, user_message) = match self {
            CoreError::BadRequest(errors) => {
                debug!("Rejected request body with {} field error(s)", errors.len());
                return (
                    StatusCode::BAD_REQUEST,
                    Json(ValidationErrorResponse {
                        errors: errors.into_vec(),
                    }),
                )
                    .into_response();
            }
            CoreError::Body(rejection) => {
                debug!("Unreadable request body: {}", rejection.body_text());
                (rejection.status(), rejection.body_text())
            }
            CoreError::NotFound(msg) => {
                debug!("{}", msg);
                (StatusCode::NOT_FOUND, msg)
            }
            CoreError::MalformedId(e) => {
                error!("Failed to decode product id: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    INTERNAL_SERVER_ERROR_MESSAGE.to_string(),
                )
            }
            CoreError::Store(e) => {
                error!("Store error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    INTERNAL_SERVER_ERROR_MESSAGE.to_string(),
                )
            }
        };

        let error_response = ErrorResponse {
            error: error_label(status),
            message: user_message,
            code: status.as_u16(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        (status, Json(error_response)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::validation::{FieldError, INVALID_TYPE};
    use std::error::Error as _;

    #[test]
    fn test_status_codes() {
        let bad_request = CoreError::BadRequest(FieldErrors::single(FieldError::new(
            INVALID_TYPE,
            "string",
            "undefined",
            &["body", "name"],
            "Name is required",
        )));
        assert_eq!(bad_request.into_response().status(), StatusCode::BAD_REQUEST);

        let not_found = CoreError::NotFound("Product not found".to_string());
        assert_eq!(not_found.into_response().status(), StatusCode::NOT_FOUND);

        let malformed = CoreError::from(IdError::Length(3));
        assert_eq!(
            malformed.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );

        let store = CoreError::from(StoreError::Unavailable("connection refused".to_string()));
        assert_eq!(store.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_error_labels_follow_status() {
        assert_eq!(error_label(StatusCode::NOT_FOUND), "NOT_FOUND");
        assert_eq!(
            error_label(StatusCode::INTERNAL_SERVER_ERROR),
            "INTERNAL_SERVER_ERROR"
        );
        assert_eq!(error_label(StatusCode::PAYLOAD_TOO_LARGE), "PAYLOAD_TOO_LARGE");
    }

    #[test]
    fn test_display_and_source() {
        let err = CoreError::from(IdError::Charset);
        assert_eq!(
            err.to_string(),
            "malformed product id: product id must contain only hexadecimal characters"
        );
        assert!(err.source().is_some());

        let err = CoreError::NotFound("Product not found: 63786439be8ca060c32d1c48".to_string());
        assert_eq!(err.to_string(), "Product not found: 63786439be8ca060c32d1c48");
        assert!(err.source().is_none());
    }
}
