//! Utilities shared across the package and report layers.

pub mod xml;

pub use xml::{escape_xml, unescape_xml};
