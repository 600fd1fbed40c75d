/// Parts for PowerPoint presentation documents.
///
/// Wrapper types for XML parts in a .pptx package whose content the
/// package layer interprets.
pub mod presentation;

pub use presentation::{PresentationPart, SlideId};
