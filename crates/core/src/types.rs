//! Domain types for the presentation document returned by the Slides API.
//!
//! Only the parts of the document the editor reads are modelled. Missing
//! JSON members deserialize to `None` or an empty `Vec`.

use serde::{Deserialize, Serialize};

/// Number of UTF-16 code units in `text`.
///
/// The Slides API addresses text by UTF-16 code unit, so every offset this
/// crate emits is measured with this function.
pub fn utf16_len(text: &str) -> usize {
    text.encode_utf16().count()
}

/// An entire presentation document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Presentation {
    /// Presentation (file) id.
    pub presentation_id: String,

    /// Document title.
    pub title: Option<String>,

    /// Slides in presentation order.
    pub slides: Vec<Page>,
}

impl Presentation {
    /// Iterate every text-bearing shape on every slide and notes page.
    pub fn text_shapes(&self) -> impl Iterator<Item = TextShape<'_>> {
        self.slides.iter().flat_map(|slide| {
            let body = slide.text_shapes(false);
            let notes = slide
                .notes_page()
                .into_iter()
                .flat_map(|notes| notes.text_shapes(true));
            body.chain(notes)
        })
    }
}

/// A slide or a notes page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Page {
    /// Page object id.
    pub object_id: String,

    /// Elements placed on the page.
    pub page_elements: Vec<PageElement>,

    /// Slide-only properties; absent on notes pages.
    pub slide_properties: Option<SlideProperties>,
}

impl Page {
    /// Speaker-notes page attached to this slide, if any.
    pub fn notes_page(&self) -> Option<&Page> {
        self.slide_properties
            .as_ref()
            .and_then(|props| props.notes_page.as_deref())
    }

    fn text_shapes(&self, is_notes: bool) -> impl Iterator<Item = TextShape<'_>> {
        self.page_elements.iter().filter_map(move |element| {
            element.text().map(|text| TextShape {
                page_id: &self.object_id,
                object_id: &element.object_id,
                text,
                is_notes,
            })
        })
    }
}

/// Properties only present on slides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SlideProperties {
    /// Notes page holding the speaker notes.
    pub notes_page: Option<Box<Page>>,
}

/// Any element placed on a page. Only shapes carry editable text.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageElement {
    pub object_id: String,
    pub shape: Option<Shape>,
}

impl PageElement {
    /// Rich text of this element if it is a shape with a text body.
    pub fn text(&self) -> Option<&TextContent> {
        self.shape.as_ref().and_then(|shape| shape.text.as_ref())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Shape {
    pub text: Option<TextContent>,
}

/// Rich text of a shape: a sequence of styled fragments.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TextContent {
    pub text_elements: Vec<TextElement>,
}

impl TextContent {
    /// Build a text body from plain runs. Mostly useful in tests and tools.
    pub fn from_runs<I, S>(runs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut start = 0;
        let text_elements = runs
            .into_iter()
            .map(|run| {
                let content = run.into();
                let end = start + utf16_len(&content);
                let element = TextElement {
                    start_index: Some(start),
                    end_index: Some(end),
                    text_run: Some(TextRun {
                        content: Some(content),
                    }),
                    auto_text: None,
                };
                start = end;
                element
            })
            .collect();

        Self { text_elements }
    }

    /// Concatenate every fragment into the plain text view.
    ///
    /// Text runs and auto text both occupy index space in the API; paragraph
    /// markers carry no content of their own.
    pub fn plain_text(&self) -> String {
        self.text_elements
            .iter()
            .filter_map(TextElement::content)
            .collect()
    }
}

/// One fragment of rich text.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TextElement {
    pub start_index: Option<usize>,
    pub end_index: Option<usize>,
    pub text_run: Option<TextRun>,
    pub auto_text: Option<AutoText>,
}

impl TextElement {
    fn content(&self) -> Option<&str> {
        self.text_run
            .as_ref()
            .and_then(|run| run.content.as_deref())
            .or_else(|| self.auto_text.as_ref().and_then(|auto| auto.content.as_deref()))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TextRun {
    pub content: Option<String>,
}

/// Text generated by the API, such as a slide number.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AutoText {
    pub content: Option<String>,
}

/// A text shape located in a presentation.
#[derive(Debug, Clone, Copy)]
pub struct TextShape<'a> {
    /// Id of the slide or notes page holding the shape.
    pub page_id: &'a str,
    /// Shape object id.
    pub object_id: &'a str,
    /// The shape's rich text.
    pub text: &'a TextContent,
    /// Whether the shape sits on a speaker-notes page.
    pub is_notes: bool,
}

/// Response body of a `batchUpdate` call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BatchUpdateResponse {
    pub presentation_id: Option<String>,

    /// One reply per request, in request order.
    pub replies: Vec<Reply>,
}

impl BatchUpdateResponse {
    /// Object id assigned by the first `createSlide` reply.
    pub fn created_slide_id(&self) -> Option<&str> {
        self.replies
            .iter()
            .find_map(|reply| reply.create_slide.as_ref())
            .map(|created| created.object_id.as_str())
    }
}

/// Reply to a single request. Most requests reply with an empty object.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Reply {
    pub create_slide: Option<CreateSlideReply>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateSlideReply {
    pub object_id: String,
}
