//! API error types for sdir-web
//!
//! One taxonomy for everything a handler can surface: validation rejected
//! before any engine or store call, not-found, ownership refusals, and
//! external collaborator failures passed through verbatim.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::services::face::FaceError;
use crate::services::identity::IdentityError;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request shape (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Required field missing or malformed at submission (400)
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Missing or rejected credentials (401)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Caller is not the owning identity (403)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Conflict (409) - e.g. identity already has a registered record
    #[error("Conflict: {0}")]
    Conflict(String),

    /// External collaborator unreachable or rejected the call (502)
    #[error("{service} failure: {message}")]
    Upstream { service: &'static str, message: String },

    /// Vision matcher credentials absent (503)
    #[error("Photo search unavailable: {0}")]
    VisionUnavailable(String),

    /// Record set could not be fetched for ranking (500); wraps the cause
    #[error("Ranking failed: {0}")]
    RankingFailed(String),

    /// Vision matcher domain error
    #[error(transparent)]
    Face(#[from] FaceError),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// Generic error
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<sdir_common::Error> for ApiError {
    fn from(err: sdir_common::Error) -> Self {
        use sdir_common::Error;
        match err {
            Error::NotFound(msg) => ApiError::NotFound(msg),
            Error::External { service, message } => ApiError::Upstream { service, message },
            Error::Config(msg) => ApiError::Internal(msg),
        }
    }
}

impl From<IdentityError> for ApiError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::InvalidCredentials => {
                ApiError::Unauthorized("invalid email or password".to_string())
            }
            IdentityError::InvalidToken => ApiError::Unauthorized("invalid token".to_string()),
            IdentityError::EmailExists => {
                ApiError::Conflict("an account with this email already exists".to_string())
            }
            IdentityError::WeakPassword => {
                ApiError::Validation("password must be at least 6 characters".to_string())
            }
            other => ApiError::Upstream {
                service: "identity provider",
                message: other.to_string(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_FAILED", msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg),
            ApiError::Upstream { service, message } => (
                StatusCode::BAD_GATEWAY,
                "EXTERNAL_SERVICE_FAILURE",
                format!("{service}: {message}"),
            ),
            ApiError::VisionUnavailable(msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, "CONFIGURATION_MISSING", msg)
            }
            ApiError::RankingFailed(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "RANKING_FAILED",
                format!("ranking failed: {msg}"),
            ),
            ApiError::Face(err) => return face_error_response(err),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg),
            ApiError::Other(ref err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                err.to_string(),
            ),
        };

        error_body(status, error_code, &message)
    }
}

fn face_error_response(err: FaceError) -> Response {
    let (status, code) = match err {
        FaceError::NoFaceDetected => (StatusCode::UNPROCESSABLE_ENTITY, "NO_FACE_DETECTED"),
        FaceError::MultipleFacesDetected => {
            (StatusCode::UNPROCESSABLE_ENTITY, "MULTIPLE_FACES_DETECTED")
        }
        FaceError::InvalidImage => (StatusCode::BAD_REQUEST, "INVALID_IMAGE"),
        FaceError::NoSimilarMatch => (StatusCode::NOT_FOUND, "NO_SIMILAR_MATCH"),
        FaceError::NoRegisteredFaces => (StatusCode::NOT_FOUND, "NO_REGISTERED_FACES"),
        FaceError::Network(_) | FaceError::Api(..) | FaceError::Parse(_) => {
            (StatusCode::BAD_GATEWAY, "EXTERNAL_SERVICE_FAILURE")
        }
    };
    error_body(status, code, &err.to_string())
}

fn error_body(status: StatusCode, code: &str, message: &str) -> Response {
    let body = Json(json!({
        "error": {
            "code": code,
            "message": message,
        }
    }));
    (status, body).into_response()
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn library_errors_map_to_api_variants() {
        let err: ApiError = sdir_common::Error::NotFound("student x".to_string()).into();
        assert!(matches!(err, ApiError::NotFound(_)));

        let err: ApiError = sdir_common::Error::external("record store", "boom").into();
        assert!(matches!(err, ApiError::Upstream { service: "record store", .. }));

        let err: ApiError = sdir_common::Error::Config("bad file".to_string()).into();
        assert!(matches!(err, ApiError::Internal(_)));
    }

    #[test]
    fn face_domain_errors_pick_their_status() {
        let response = ApiError::Face(FaceError::NoFaceDetected).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let response = ApiError::Face(FaceError::NoSimilarMatch).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = ApiError::Face(FaceError::Network("down".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
