use chrono::NaiveDate;
use thiserror::Error;

use crate::ooxml::OoxmlError;

/// Errors that abort a report run.
#[derive(Error, Debug)]
pub enum ReportError {
    /// A date argument is not a valid `YYYY-MM-DD` date
    #[error("invalid date {value:?}: expected YYYY-MM-DD")]
    InvalidDate { value: String },

    /// The start of the range lies after its end
    #[error("invalid date range: {from} is after {to}")]
    InvertedRange { from: NaiveDate, to: NaiveDate },

    /// The template does not have the fixed slide positions
    #[error("template has {found} slides, at least {required} are required")]
    TooFewSlides { found: usize, required: usize },

    /// No blank text placeholder to hold insights and blog links
    #[error("no blank text placeholder on {0}")]
    MissingPlaceholder(String),

    #[error(transparent)]
    Source(#[from] rusqlite::Error),

    #[error(transparent)]
    Ooxml(#[from] OoxmlError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ReportError>;
