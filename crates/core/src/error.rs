//! Error types for presentation editing.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed error produced by a transport implementation.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur while editing a presentation.
///
/// A placeholder that is missing from a shape is not an error: the shape
/// simply contributes no requests.
#[derive(Error, Debug)]
pub enum Error {
    /// The remote API has no way to perform the requested operation.
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// The replacement parameters are unusable (empty placeholder, bad sizes).
    #[error("Invalid replacement: {0}")]
    InvalidReplacement(String),

    /// Network, authentication, or API failure reported by the transport.
    /// Passed through untouched; the editor never retries.
    #[error("Transport error: {0}")]
    Transport(#[source] BoxError),
}

impl Error {
    /// Wrap any transport failure.
    pub fn transport(err: impl Into<BoxError>) -> Self {
        Self::Transport(err.into())
    }
}
