//! Google Slides API v1 client.

use slides_core::{BatchUpdateResponse, MutationBatch, Presentation, SlidesApi};

use crate::http::ApiClient;

/// Default Slides API endpoint.
pub const DEFAULT_SLIDES_URL: &str = "https://slides.googleapis.com";

/// Slides API transport used by [`slides_core::PresentationEditor`].
#[derive(Debug, Clone)]
pub struct SlidesClient {
    http: ApiClient,
    base_url: String,
}

impl SlidesClient {
    pub fn new(http: ApiClient) -> Self {
        Self {
            http,
            base_url: DEFAULT_SLIDES_URL.to_string(),
        }
    }

    /// Use a different endpoint, e.g. a regional or test server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn presentation_url(&self, presentation_id: &str) -> String {
        format!("{}/v1/presentations/{}", self.base_url, presentation_id)
    }
}

impl SlidesApi for SlidesClient {
    fn get_presentation(&self, presentation_id: &str) -> slides_core::Result<Presentation> {
        log::debug!("Fetching presentation {}", presentation_id);
        let presentation = self
            .http
            .get_json(&self.presentation_url(presentation_id), &[])?;
        Ok(presentation)
    }

    fn batch_update(
        &self,
        presentation_id: &str,
        batch: &MutationBatch,
    ) -> slides_core::Result<BatchUpdateResponse> {
        let url = format!("{}:batchUpdate", self.presentation_url(presentation_id));
        let response = self.http.post_json(&url, &[], batch)?;
        Ok(response)
    }
}
