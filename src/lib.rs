//! Statusdeck - template-driven PowerPoint status reports
//!
//! This library turns time-ranged status records into a `.pptx` report built
//! from a template presentation. Sections of variable length are paginated
//! automatically: tables grow by cloning their styled template row, and
//! series slides are duplicated until every page of data has a slide.
//!
//! # Features
//!
//! - **OPC packaging**: Read and write `.pptx` packages part by part
//! - **Lossless XML trees**: Edit slide XML in place without losing markup
//! - **Row cloning**: Grow DrawingML tables while keeping their formatting
//! - **Slide duplication**: Deep-copy slides with their relationships
//! - **Pagination**: Independent page sizes for categories sharing slides
//!
//! # Example - Generating a report
//!
//! ```no_run
//! use statusdeck::report::{ReportConfig, generate};
//! use statusdeck::source::{DateRange, SqliteSource};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ReportConfig::from_env();
//! let range = DateRange::parse("2025-05-01", "2025-05-31")?;
//! let summary = generate(&config, || SqliteSource::open(&config.db), &range)?;
//! println!("Wrote {}", summary.output.display());
//! # Ok(())
//! # }
//! ```
//!
//! # Example - Growing a table
//!
//! ```no_run
//! use statusdeck::ooxml::pptx::{Package, TableLocator};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut pkg = Package::open("template.pptx")?;
//! let first = pkg.slide_partnames()?[0].clone();
//! let mut slide = pkg.slide(&first)?;
//! if let Some(mut table) = slide.find_table_by_header_substring("project") {
//!     table.grow_rows_to(5);
//! }
//! pkg.store_slide(&slide)?;
//! pkg.save("grown.pptx")?;
//! # Ok(())
//! # }
//! ```

/// Shared helpers (XML escaping)
pub mod common;

/// OOXML (Office Open XML) packaging and PresentationML editing
///
/// This module provides the OPC package layer, an owned XML tree and the
/// slide, table and text frame operations report generation builds on.
pub mod ooxml;

/// Report generation: aggregation, pagination and slide population
pub mod report;

/// Record sources and date ranges
pub mod source;

// Re-export commonly used types for convenience
pub use report::{ReportConfig, ReportError, ReportSummary, generate};
pub use source::{DateRange, RecordSource, SqliteSource};
