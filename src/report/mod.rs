//! Status report generation.
//!
//! Records are aggregated into project groups and flat lists, which are
//! then laid out over the template slides. Variable-length sections are
//! paginated: tables grow by cloning their template row, and series slides
//! are duplicated until every page has a home.
//!
//! ```rust,no_run
//! use statusdeck::report::{ReportConfig, generate};
//! use statusdeck::source::{DateRange, SqliteSource};
//!
//! let config = ReportConfig::from_env();
//! let range = DateRange::parse("2025-05-01", "2025-05-31")?;
//! let summary = generate(&config, || SqliteSource::open(&config.db), &range)?;
//! println!("{} slides added", summary.slides_added());
//! # Ok::<(), statusdeck::report::ReportError>(())
//! ```

pub mod aggregate;
pub mod config;
pub mod error;
pub mod paginate;
pub mod pipeline;
pub mod populate;
pub mod record;

pub use aggregate::{Aggregate, Aggregator, FlatList, Group, GroupMap};
pub use config::ReportConfig;
pub use error::{ReportError, Result};
pub use paginate::{Page, page_at, paginate, series_len};
pub use pipeline::{ReportSummary, RunStage, generate};
pub use populate::Sampler;
pub use record::Record;
