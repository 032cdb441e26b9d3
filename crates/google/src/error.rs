//! Error types for the Google REST transport.

use thiserror::Error;

/// Result type alias using our ApiError type.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Errors raised while talking to the Slides or Drive APIs.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The HTTP request could not be sent or its body not read.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// A response body was not the JSON we expected.
    #[error("Invalid JSON response: {0}")]
    Json(#[from] serde_json::Error),

    /// The API answered with a non-success status.
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// A service-account assertion could not be signed.
    #[error("Signing error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    /// No usable access token.
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Failed to read a key file or run an external credential helper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ApiError> for slides_core::Error {
    fn from(err: ApiError) -> Self {
        slides_core::Error::transport(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_server_error_display() {
        let err = ApiError::Server {
            status: 404,
            message: "Requested entity was not found.".into(),
        };
        assert_eq!(
            err.to_string(),
            "Server error (404): Requested entity was not found."
        );
    }

    #[test]
    fn test_converts_into_transport_error() {
        let err: slides_core::Error = ApiError::Auth("token is empty".into()).into();

        assert!(matches!(err, slides_core::Error::Transport(_)));
        let source = err.source().unwrap();
        assert_eq!(source.to_string(), "Authentication error: token is empty");
        assert!(source.downcast_ref::<ApiError>().is_some());
    }
}
