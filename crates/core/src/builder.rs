//! Placeholder substitution: turns one replacement into per-shape mutations.

use crate::error::{Error, Result};
use crate::normalize::{FormattedBody, LineKind};
use crate::request::{BulletPreset, Mutation, MutationBatch, TextRange};
use crate::types::{utf16_len, TextContent};

/// Everything needed to substitute one placeholder.
///
/// The body may contain `1. ` / `- ` / `* ` list markers and `**bold**`
/// spans; they are stripped and re-applied as native styling. The optional
/// title is inserted verbatim as a bold first line.
#[derive(Debug, Clone, PartialEq)]
pub struct Replacement {
    pub placeholder: String,
    pub body: String,
    pub title: Option<String>,
    pub hyperlink: Option<String>,
    /// Font size in points for the whole inserted text.
    pub font_size: Option<f64>,
    /// Space above each inserted paragraph, in points.
    pub paragraph_spacing: Option<f64>,
}

impl Replacement {
    /// Replace `placeholder` with `body`.
    pub fn new(placeholder: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            placeholder: placeholder.into(),
            body: body.into(),
            title: None,
            hyperlink: None,
            font_size: None,
            paragraph_spacing: None,
        }
    }

    /// Insert `title` as a bold line above the body.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Link the whole inserted text to `url`. An empty url adds no link.
    pub fn with_hyperlink(mut self, url: impl Into<String>) -> Self {
        self.hyperlink = Some(url.into());
        self
    }

    /// Set the font size (points) of the whole inserted text.
    pub fn with_font_size(mut self, size: f64) -> Self {
        self.font_size = Some(size);
        self
    }

    /// Set the space above each inserted paragraph (points).
    pub fn with_paragraph_spacing(mut self, spacing: f64) -> Self {
        self.paragraph_spacing = Some(spacing);
        self
    }

    /// Reject replacements the API would refuse or misapply.
    pub fn validate(&self) -> Result<()> {
        if self.placeholder.is_empty() {
            return Err(Error::InvalidReplacement(
                "placeholder must not be empty".to_string(),
            ));
        }
        if let Some(size) = self.font_size {
            if !size.is_finite() || size <= 0.0 {
                return Err(Error::InvalidReplacement(format!(
                    "font size must be a positive number, got {}",
                    size
                )));
            }
        }
        if let Some(spacing) = self.paragraph_spacing {
            if !spacing.is_finite() || spacing < 0.0 {
                return Err(Error::InvalidReplacement(format!(
                    "paragraph spacing must not be negative, got {}",
                    spacing
                )));
            }
        }
        Ok(())
    }

    /// The title, when it will actually be inserted.
    ///
    /// A title is only used when it is non-empty and the body has visible text.
    fn effective_title(&self) -> Option<&str> {
        self.title
            .as_deref()
            .filter(|title| !title.is_empty() && !self.body.trim().is_empty())
    }
}

/// Builds the mutations for one replacement, shape by shape.
///
/// The body markup is resolved once, when the builder is created.
#[derive(Debug, Clone)]
pub struct RequestBuilder<'a> {
    replacement: &'a Replacement,
    title: Option<&'a str>,
    body: FormattedBody,
    insertion: String,
}

impl<'a> RequestBuilder<'a> {
    pub fn new(replacement: &'a Replacement) -> Self {
        let title = replacement.effective_title();
        let body = FormattedBody::parse(&replacement.body);
        let insertion = match title {
            Some(title) => format!("{}\n{}", title, body.text),
            None => body.text.clone(),
        };

        Self {
            replacement,
            title,
            body,
            insertion,
        }
    }

    /// Text that replaces the placeholder.
    pub fn insertion_text(&self) -> &str {
        &self.insertion
    }

    /// Mutations substituting the placeholder in one shape.
    ///
    /// Returns an empty batch when the shape does not contain the
    /// placeholder. Offsets are anchored at the placeholder's first
    /// occurrence. Order: text replacement, hyperlink or font size,
    /// paragraph spacing, title bold, body bold spans, list bullets.
    pub fn build(&self, object_id: &str, text: &TextContent) -> MutationBatch {
        let mut batch = MutationBatch::new();
        if let Some(styles) = self.build_styles(object_id, text) {
            batch.push(self.replace_mutation());
            batch.append(styles);
        }
        batch
    }

    /// The presentation-wide text replacement.
    ///
    /// Emit it once per batch: a second replace-all would expand any
    /// placeholder contained in the inserted text.
    pub fn replace_mutation(&self) -> Mutation {
        Mutation::ReplaceText {
            placeholder: self.replacement.placeholder.clone(),
            replacement: self.insertion.clone(),
        }
    }

    /// Style mutations for one shape, or `None` when the shape does not
    /// contain the placeholder.
    ///
    /// Ranges assume [`Self::replace_mutation`] has been applied earlier in
    /// the same batch.
    pub fn build_styles(&self, object_id: &str, text: &TextContent) -> Option<MutationBatch> {
        let plain = text.plain_text();
        let byte_index = plain.find(&self.replacement.placeholder)?;
        let index = utf16_len(&plain[..byte_index]);
        let whole = TextRange::new(index, index + utf16_len(&self.insertion));
        let font_size = self.replacement.font_size;
        let mut batch = MutationBatch::new();

        let hyperlink = self
            .replacement
            .hyperlink
            .as_deref()
            .filter(|url| !url.is_empty());
        match hyperlink {
            Some(url) => batch.push(Mutation::SetHyperlink {
                object_id: object_id.to_string(),
                range: whole,
                url: url.to_string(),
                font_size,
            }),
            None => {
                if let Some(size) = font_size {
                    batch.push(Mutation::SetFontSize {
                        object_id: object_id.to_string(),
                        range: whole,
                        size,
                    });
                }
            }
        }

        if let Some(space_above) = self.replacement.paragraph_spacing {
            batch.push(Mutation::SetParagraphSpacing {
                object_id: object_id.to_string(),
                range: whole,
                space_above,
            });
        }

        let body_start = match self.title {
            Some(title) => {
                let title_len = utf16_len(title);
                batch.push(Mutation::SetBold {
                    object_id: object_id.to_string(),
                    range: TextRange::new(index, index + title_len),
                    font_size,
                });
                // skip the newline between title and body
                index + title_len + 1
            }
            None => index,
        };

        for span in &self.body.bold_spans {
            batch.push(Mutation::SetBold {
                object_id: object_id.to_string(),
                range: TextRange::new(span.start, span.end).shifted(body_start),
                font_size,
            });
        }

        self.push_list_bullets(&mut batch, object_id, body_start);
        Some(batch)
    }

    /// One bullet mutation per list line, walking lines from `anchor`.
    ///
    /// Every line occupies its length plus one for the newline, the last
    /// line included.
    fn push_list_bullets(&self, batch: &mut MutationBatch, object_id: &str, anchor: usize) {
        let mut offset = anchor;

        for (line, kind) in self.body.lines() {
            let occupied = utf16_len(line) + 1;
            let preset = match kind {
                LineKind::Numbered => Some(BulletPreset::NumberedDigitAlphaRoman),
                LineKind::Bulleted => Some(BulletPreset::BulletDiscCircleSquare),
                LineKind::Plain => None,
            };

            if let Some(preset) = preset {
                batch.push(Mutation::SetListBullets {
                    object_id: object_id.to_string(),
                    range: TextRange::new(offset, offset + occupied),
                    preset,
                });
            }
            offset += occupied;
        }
    }
}
