//! Presentation model, placeholder substitution engine, and batch editor
//! for Google Slides.

pub mod builder;
pub mod editor;
pub mod error;
pub mod normalize;
pub mod request;
pub mod types;

pub use builder::{Replacement, RequestBuilder};
pub use editor::{PresentationEditor, ShapeText, SlidesApi};
pub use error::{BoxError, Error, Result};
pub use normalize::{BoldSpan, FormattedBody, LineKind};
pub use request::{BulletPreset, Mutation, MutationBatch, PredefinedLayout, TextRange};
pub use types::{BatchUpdateResponse, Presentation, TextContent};
