//! Google Slides and Drive REST transport.
//!
//! Provides credentials (service-account keys, plain tokens, gcloud), the
//! authenticated HTTP client, a [`SlidesClient`] implementing
//! [`slides_core::SlidesApi`], and Drive folder/file helpers.

pub mod auth;
pub mod drive;
pub mod error;
pub mod http;
pub mod slides;

#[cfg(test)]
mod testing;

pub use auth::{AccessToken, ServiceAccountKey};
pub use drive::{DriveApi, DriveClient, DriveFile};
pub use error::{ApiError, Result};
pub use http::ApiClient;
pub use slides::SlidesClient;
