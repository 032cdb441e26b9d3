//! Presentation editor: fetch, build, submit.
//!
//! Every call re-fetches the document and submits at most one batch. There
//! is no local cache and no revision check, so concurrent editors of the
//! same presentation overwrite each other at the granularity of one call.

use crate::builder::{Replacement, RequestBuilder};
use crate::error::{Error, Result};
use crate::request::{Mutation, MutationBatch, PredefinedLayout};
use crate::types::{BatchUpdateResponse, Presentation};

/// Remote access to presentations.
///
/// Implementations own authentication and networking. Errors should be
/// reported as [`Error::Transport`]; the editor passes them through.
pub trait SlidesApi {
    /// Fetch the full presentation document.
    fn get_presentation(&self, presentation_id: &str) -> Result<Presentation>;

    /// Apply `batch` in order, as one atomic update.
    fn batch_update(
        &self,
        presentation_id: &str,
        batch: &MutationBatch,
    ) -> Result<BatchUpdateResponse>;
}

impl<T: SlidesApi + ?Sized> SlidesApi for &T {
    fn get_presentation(&self, presentation_id: &str) -> Result<Presentation> {
        (**self).get_presentation(presentation_id)
    }

    fn batch_update(
        &self,
        presentation_id: &str,
        batch: &MutationBatch,
    ) -> Result<BatchUpdateResponse> {
        (**self).batch_update(presentation_id, batch)
    }
}

/// Plain text of one text shape, as listed by [`PresentationEditor::shape_texts`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeText {
    pub page_id: String,
    pub object_id: String,
    pub is_notes: bool,
    pub text: String,
}

/// Edits one presentation through a [`SlidesApi`].
#[derive(Debug, Clone)]
pub struct PresentationEditor<A> {
    api: A,
    presentation_id: String,
}

impl<A: SlidesApi> PresentationEditor<A> {
    pub fn new(api: A, presentation_id: impl Into<String>) -> Self {
        Self {
            api,
            presentation_id: presentation_id.into(),
        }
    }

    pub fn presentation_id(&self) -> &str {
        &self.presentation_id
    }

    /// Fetch the current document.
    pub fn fetch(&self) -> Result<Presentation> {
        self.api.get_presentation(&self.presentation_id)
    }

    /// Submit a batch as-is.
    pub fn submit(&self, batch: &MutationBatch) -> Result<BatchUpdateResponse> {
        log::info!(
            "Submitting {} request(s) to presentation {}",
            batch.len(),
            self.presentation_id
        );
        self.api.batch_update(&self.presentation_id, batch)
    }

    /// Substitute a placeholder in every shape of every slide and notes page.
    ///
    /// Returns the number of shapes that contained the placeholder. Nothing
    /// is submitted when no shape matches.
    pub fn replace_text(&self, replacement: &Replacement) -> Result<usize> {
        replacement.validate()?;

        let presentation = self.fetch()?;
        let builder = RequestBuilder::new(replacement);
        let mut styles = MutationBatch::new();
        let mut matched = 0;

        for shape in presentation.text_shapes() {
            let Some(requests) = builder.build_styles(shape.object_id, shape.text) else {
                continue;
            };

            log::debug!(
                "Placeholder {:?} found in {} {} (page {}): {} style request(s)",
                replacement.placeholder,
                if shape.is_notes { "notes shape" } else { "shape" },
                shape.object_id,
                shape.page_id,
                requests.len()
            );
            matched += 1;
            styles.append(requests);
        }

        if matched == 0 {
            log::info!(
                "Placeholder {:?} not found in presentation {}",
                replacement.placeholder,
                self.presentation_id
            );
            return Ok(0);
        }

        // replace-all covers every shape, so it goes in once, ahead of the styles
        let mut batch = MutationBatch::from(vec![builder.replace_mutation()]);
        batch.append(styles);
        self.submit(&batch)?;
        Ok(matched)
    }

    /// Replace every shape containing `placeholder` with the image at `image_url`.
    pub fn replace_image(&self, placeholder: &str, image_url: &str) -> Result<()> {
        let batch = MutationBatch::from(vec![Mutation::ReplaceShapesWithImage {
            placeholder: placeholder.to_string(),
            image_url: image_url.to_string(),
        }]);
        self.submit(&batch)?;
        Ok(())
    }

    /// Insert a slide and return its object id.
    ///
    /// The id is the caller's `object_id` when given, otherwise the id the
    /// server assigned (if it reported one).
    pub fn create_slide(
        &self,
        layout: PredefinedLayout,
        insertion_index: Option<usize>,
        object_id: Option<&str>,
    ) -> Result<Option<String>> {
        let batch = MutationBatch::from(vec![Mutation::CreateSlide {
            object_id: object_id.map(str::to_string),
            insertion_index,
            layout,
        }]);
        let response = self.submit(&batch)?;

        Ok(object_id
            .or_else(|| response.created_slide_id())
            .map(str::to_string))
    }

    /// Delete a slide by object id.
    pub fn delete_slide(&self, slide_object_id: &str) -> Result<()> {
        let batch = MutationBatch::from(vec![Mutation::DeleteObject {
            object_id: slide_object_id.to_string(),
        }]);
        self.submit(&batch)?;
        Ok(())
    }

    /// Always fails: the Slides API cannot change the layout of an existing slide.
    pub fn update_slide_layout(
        &self,
        slide_object_id: &str,
        layout: PredefinedLayout,
    ) -> Result<()> {
        Err(Error::Unsupported(format!(
            "Updating the layout of slide {} to {} is not supported by the Google Slides API",
            slide_object_id, layout
        )))
    }

    /// Plain text of every text shape, slides first then their notes.
    pub fn shape_texts(&self) -> Result<Vec<ShapeText>> {
        let presentation = self.fetch()?;
        Ok(presentation
            .text_shapes()
            .map(|shape| ShapeText {
                page_id: shape.page_id.to_string(),
                object_id: shape.object_id.to_string(),
                is_notes: shape.is_notes,
                text: shape.text.plain_text(),
            })
            .collect())
    }
}
