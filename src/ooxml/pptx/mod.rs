//! PowerPoint (.pptx) presentation editing.
//!
//! - `Package`: the .pptx package, slide order and slide duplication
//! - `Slide`: an editable slide tree with table lookup by header text
//! - `shapes`: tables and text frames
//! - `parts`: the presentation part's slide id list
//!
//! ```rust,no_run
//! use statusdeck::ooxml::pptx::{Package, TableLocator};
//!
//! let mut pkg = Package::open("template.pptx")?;
//! let first = pkg.slide_partnames()?[0].clone();
//! let mut slide = pkg.slide(&first)?;
//! if let Some(mut table) = slide.find_table_by_header_substring("project") {
//!     table.grow_rows_to(4);
//! }
//! pkg.store_slide(&slide)?;
//! pkg.save("out.pptx")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
pub mod package;
pub mod parts;
pub mod shapes;
pub mod slide;

pub use package::Package;
pub use shapes::{GrowOutcome, ParagraphFormat, TableMut, TextFrameMut};
pub use slide::{Slide, TableLocator};
