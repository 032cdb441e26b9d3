//! Mutation operations and the ordered batch submitted to the Slides API.
//!
//! A [`MutationBatch`] is applied by the API strictly in order. Style ranges
//! emitted by the request builder are computed against the shape's text
//! *after* the placeholder replacement that precedes them in the same batch,
//! so a batch must never be reordered or split.

use serde::ser::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A half-open `[start, end)` range of UTF-16 code units within a shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextRange {
    pub start: usize,
    pub end: usize,
}

impl TextRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// The same range moved `offset` units to the right.
    pub fn shifted(self, offset: usize) -> Self {
        Self::new(self.start + offset, self.end + offset)
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Bullet glyph presets used for list lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulletPreset {
    /// 1. / a. / i. numbering by nesting level.
    NumberedDigitAlphaRoman,
    /// Disc / circle / square bullets by nesting level.
    BulletDiscCircleSquare,
}

impl BulletPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NumberedDigitAlphaRoman => "NUMBERED_DIGIT_ALPHA_ROMAN",
            Self::BulletDiscCircleSquare => "BULLET_DISC_CIRCLE_SQUARE",
        }
    }
}

/// Predefined slide layouts accepted by `createSlide`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PredefinedLayout {
    #[default]
    Blank,
    CaptionOnly,
    Title,
    TitleAndBody,
    TitleAndTwoColumns,
    TitleOnly,
    SectionHeader,
    SectionTitleAndDescription,
    OneColumnText,
    MainPoint,
    BigNumber,
}

impl PredefinedLayout {
    const ALL: [PredefinedLayout; 11] = [
        Self::Blank,
        Self::CaptionOnly,
        Self::Title,
        Self::TitleAndBody,
        Self::TitleAndTwoColumns,
        Self::TitleOnly,
        Self::SectionHeader,
        Self::SectionTitleAndDescription,
        Self::OneColumnText,
        Self::MainPoint,
        Self::BigNumber,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blank => "BLANK",
            Self::CaptionOnly => "CAPTION_ONLY",
            Self::Title => "TITLE",
            Self::TitleAndBody => "TITLE_AND_BODY",
            Self::TitleAndTwoColumns => "TITLE_AND_TWO_COLUMNS",
            Self::TitleOnly => "TITLE_ONLY",
            Self::SectionHeader => "SECTION_HEADER",
            Self::SectionTitleAndDescription => "SECTION_TITLE_AND_DESCRIPTION",
            Self::OneColumnText => "ONE_COLUMN_TEXT",
            Self::MainPoint => "MAIN_POINT",
            Self::BigNumber => "BIG_NUMBER",
        }
    }
}

impl FromStr for PredefinedLayout {
    type Err = String;

    /// Parse an API layout name, case-insensitively, with `-` or `_`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().replace('-', "_").to_uppercase();
        Self::ALL
            .into_iter()
            .find(|layout| layout.as_str() == wanted)
            .ok_or_else(|| format!("unknown slide layout: {}", s))
    }
}

impl fmt::Display for PredefinedLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single edit to a presentation.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    /// Replace every occurrence of `placeholder` (case-sensitive) with `replacement`.
    ReplaceText {
        placeholder: String,
        replacement: String,
    },
    /// Link a range, optionally also setting its font size.
    SetHyperlink {
        object_id: String,
        range: TextRange,
        url: String,
        font_size: Option<f64>,
    },
    /// Make a range bold, optionally also setting its font size.
    SetBold {
        object_id: String,
        range: TextRange,
        font_size: Option<f64>,
    },
    /// Set the font size (points) of a range.
    SetFontSize {
        object_id: String,
        range: TextRange,
        size: f64,
    },
    /// Set the space above every paragraph touching a range, in points.
    SetParagraphSpacing {
        object_id: String,
        range: TextRange,
        space_above: f64,
    },
    /// Turn the paragraphs touching a range into list items.
    SetListBullets {
        object_id: String,
        range: TextRange,
        preset: BulletPreset,
    },
    /// Replace every shape whose text contains `placeholder` with an image.
    ReplaceShapesWithImage { placeholder: String, image_url: String },
    /// Insert a new slide.
    CreateSlide {
        object_id: Option<String>,
        insertion_index: Option<usize>,
        layout: PredefinedLayout,
    },
    /// Delete a page or page element.
    DeleteObject { object_id: String },
}

impl Mutation {
    /// Range this mutation styles, if it is a ranged style operation.
    pub fn range(&self) -> Option<TextRange> {
        match self {
            Self::SetHyperlink { range, .. }
            | Self::SetBold { range, .. }
            | Self::SetFontSize { range, .. }
            | Self::SetParagraphSpacing { range, .. }
            | Self::SetListBullets { range, .. } => Some(*range),
            _ => None,
        }
    }
}

/// An ordered list of mutations, submitted together in one `batchUpdate`.
///
/// Serializes to the API request body: `{"requests": [...]}`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MutationBatch {
    requests: Vec<Mutation>,
}

impl MutationBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a mutation after every mutation already in the batch.
    pub fn push(&mut self, mutation: Mutation) {
        self.requests.push(mutation);
    }

    /// Append another batch, keeping its internal order.
    pub fn append(&mut self, other: MutationBatch) {
        self.requests.extend(other.requests);
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Mutation> {
        self.requests.iter()
    }

    pub fn as_slice(&self) -> &[Mutation] {
        &self.requests
    }
}

impl From<Vec<Mutation>> for MutationBatch {
    fn from(requests: Vec<Mutation>) -> Self {
        Self { requests }
    }
}

impl FromIterator<Mutation> for MutationBatch {
    fn from_iter<I: IntoIterator<Item = Mutation>>(iter: I) -> Self {
        Self {
            requests: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for MutationBatch {
    type Item = Mutation;
    type IntoIter = std::vec::IntoIter<Mutation>;

    fn into_iter(self) -> Self::IntoIter {
        self.requests.into_iter()
    }
}

impl<'a> IntoIterator for &'a MutationBatch {
    type Item = &'a Mutation;
    type IntoIter = std::slice::Iter<'a, Mutation>;

    fn into_iter(self) -> Self::IntoIter {
        self.requests.iter()
    }
}

impl Serialize for MutationBatch {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let requests: Vec<wire::Request<'_>> = self.requests.iter().map(Into::into).collect();
        wire::BatchUpdate { requests }.serialize(serializer)
    }
}

impl Serialize for Mutation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        wire::Request::from(self).serialize(serializer)
    }
}

/// JSON shapes of the Slides API `batchUpdate` requests.
mod wire {
    use super::{Mutation, TextRange};
    use serde::Serialize;

    #[derive(Serialize)]
    pub struct BatchUpdate<'a> {
        pub requests: Vec<Request<'a>>,
    }

    #[derive(Serialize)]
    #[serde(rename_all = "camelCase", rename_all_fields = "camelCase")]
    pub enum Request<'a> {
        ReplaceAllText {
            contains_text: SubstringMatch<'a>,
            replace_text: &'a str,
        },
        UpdateTextStyle {
            object_id: &'a str,
            text_range: Range,
            style: TextStyle<'a>,
            fields: String,
        },
        UpdateParagraphStyle {
            object_id: &'a str,
            text_range: Range,
            style: ParagraphStyle,
            fields: &'static str,
        },
        CreateParagraphBullets {
            object_id: &'a str,
            text_range: Range,
            bullet_preset: &'static str,
        },
        ReplaceAllShapesWithImage {
            image_url: &'a str,
            contains_text: SubstringMatch<'a>,
        },
        CreateSlide {
            #[serde(skip_serializing_if = "Option::is_none")]
            object_id: Option<&'a str>,
            #[serde(skip_serializing_if = "Option::is_none")]
            insertion_index: Option<usize>,
            slide_layout_reference: LayoutReference,
        },
        DeleteObject {
            object_id: &'a str,
        },
    }

    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct SubstringMatch<'a> {
        pub text: &'a str,
        pub match_case: bool,
    }

    impl<'a> SubstringMatch<'a> {
        fn exact(text: &'a str) -> Self {
            Self {
                text,
                match_case: true,
            }
        }
    }

    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Range {
        #[serde(rename = "type")]
        pub kind: &'static str,
        pub start_index: usize,
        pub end_index: usize,
    }

    impl From<TextRange> for Range {
        fn from(range: TextRange) -> Self {
            Self {
                kind: "FIXED_RANGE",
                start_index: range.start,
                end_index: range.end,
            }
        }
    }

    #[derive(Serialize)]
    pub struct Dimension {
        pub magnitude: f64,
        pub unit: &'static str,
    }

    impl Dimension {
        fn points(magnitude: f64) -> Self {
            Self {
                magnitude,
                unit: "PT",
            }
        }
    }

    #[derive(Serialize)]
    pub struct Link<'a> {
        pub url: &'a str,
    }

    #[derive(Serialize, Default)]
    #[serde(rename_all = "camelCase")]
    pub struct TextStyle<'a> {
        #[serde(skip_serializing_if = "Option::is_none")]
        pub link: Option<Link<'a>>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub bold: Option<bool>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub font_size: Option<Dimension>,
    }

    impl TextStyle<'_> {
        /// Field mask naming every populated member, in declaration order.
        fn fields(&self) -> String {
            let mut fields = Vec::new();
            if self.link.is_some() {
                fields.push("link");
            }
            if self.bold.is_some() {
                fields.push("bold");
            }
            if self.font_size.is_some() {
                fields.push("fontSize");
            }
            fields.join(",")
        }
    }

    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ParagraphStyle {
        pub space_above: Dimension,
    }

    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct LayoutReference {
        pub predefined_layout: &'static str,
    }

    fn text_style<'a>(object_id: &'a str, range: TextRange, style: TextStyle<'a>) -> Request<'a> {
        let fields = style.fields();
        Request::UpdateTextStyle {
            object_id,
            text_range: range.into(),
            style,
            fields,
        }
    }

    impl<'a> From<&'a Mutation> for Request<'a> {
        fn from(mutation: &'a Mutation) -> Self {
            match mutation {
                Mutation::ReplaceText {
                    placeholder,
                    replacement,
                } => Request::ReplaceAllText {
                    contains_text: SubstringMatch::exact(placeholder),
                    replace_text: replacement,
                },
                Mutation::SetHyperlink {
                    object_id,
                    range,
                    url,
                    font_size,
                } => text_style(
                    object_id,
                    *range,
                    TextStyle {
                        link: Some(Link { url }),
                        font_size: font_size.map(Dimension::points),
                        ..TextStyle::default()
                    },
                ),
                Mutation::SetBold {
                    object_id,
                    range,
                    font_size,
                } => text_style(
                    object_id,
                    *range,
                    TextStyle {
                        bold: Some(true),
                        font_size: font_size.map(Dimension::points),
                        ..TextStyle::default()
                    },
                ),
                Mutation::SetFontSize {
                    object_id,
                    range,
                    size,
                } => text_style(
                    object_id,
                    *range,
                    TextStyle {
                        font_size: Some(Dimension::points(*size)),
                        ..TextStyle::default()
                    },
                ),
                Mutation::SetParagraphSpacing {
                    object_id,
                    range,
                    space_above,
                } => Request::UpdateParagraphStyle {
                    object_id,
                    text_range: (*range).into(),
                    style: ParagraphStyle {
                        space_above: Dimension::points(*space_above),
                    },
                    fields: "spaceAbove",
                },
                Mutation::SetListBullets {
                    object_id,
                    range,
                    preset,
                } => Request::CreateParagraphBullets {
                    object_id,
                    text_range: (*range).into(),
                    bullet_preset: preset.as_str(),
                },
                Mutation::ReplaceShapesWithImage {
                    placeholder,
                    image_url,
                } => Request::ReplaceAllShapesWithImage {
                    image_url,
                    contains_text: SubstringMatch::exact(placeholder),
                },
                Mutation::CreateSlide {
                    object_id,
                    insertion_index,
                    layout,
                } => Request::CreateSlide {
                    object_id: object_id.as_deref(),
                    insertion_index: *insertion_index,
                    slide_layout_reference: LayoutReference {
                        predefined_layout: layout.as_str(),
                    },
                },
                Mutation::DeleteObject { object_id } => Request::DeleteObject { object_id },
            }
        }
    }
}
