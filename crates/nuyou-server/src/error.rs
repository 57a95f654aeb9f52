//! Error types for the HTTP server.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use nuyou_media::UploadError;
use serde_json::json;

/// Server error type.
///
/// The `Display` text is the message sent to the client. Details that must
/// not leak (paths, upstream errors) are logged where the error is raised.
#[derive(Debug, thiserror::Error)]
pub(crate) enum ServerError {
    /// Not in admin mode, or the CSRF token did not match.
    #[error("Unauthorized")]
    Unauthorized,

    /// Wrong HTTP method.
    #[error("{0}")]
    MethodNotAllowed(&'static str),

    /// Invalid input.
    #[error("{0}")]
    BadRequest(String),

    /// Request refused for security reasons.
    #[error("{0}")]
    Forbidden(&'static str),

    /// Rate limit exceeded.
    #[error("{0}")]
    TooManyRequests(&'static str),

    /// Upload rejected or not stored.
    #[error(transparent)]
    Upload(#[from] UploadError),

    /// An upstream service failed; carries the message to show.
    #[error("{0}")]
    BadGateway(String),

    /// Temporarily unable to serve the request.
    #[error("{0}")]
    Unavailable(&'static str),

    /// Internal failure; carries the message to show.
    #[error("{0}")]
    Internal(&'static str),
}

impl ServerError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized | Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::TooManyRequests(_) => StatusCode::TOO_MANY_REQUESTS,
            Self::Upload(UploadError::Io(_)) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Upload(UploadError::TooLarge { .. }) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Upload(_) => StatusCode::BAD_REQUEST,
            Self::BadGateway(_) => StatusCode::BAD_GATEWAY,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let body = json!({"success": false, "message": self.to_string()});
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_status_codes() {
        assert_eq!(ServerError::Unauthorized.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            ServerError::MethodNotAllowed("Method not allowed").status(),
            StatusCode::METHOD_NOT_ALLOWED
        );
        assert_eq!(
            ServerError::Unavailable("busy").status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ServerError::Upload(UploadError::InvalidType).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServerError::Upload(UploadError::Io(std::io::Error::other("disk"))).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_message_hides_io_detail() {
        let err = ServerError::Upload(UploadError::Io(std::io::Error::other("/srv/secret/path")));
        assert_eq!(err.to_string(), "Failed to save uploaded file");
    }
}
