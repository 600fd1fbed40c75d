/// Shapes module for PowerPoint presentations.
///
/// Mutable views over the shape kinds report generation edits:
/// - Tables (`a:tbl` inside graphic frames)
/// - Text frames of autoshapes and table cells
pub mod table;
pub mod textframe;

pub use table::{GrowOutcome, TableMut};
pub use textframe::{ParagraphFormat, TextFrameMut};
