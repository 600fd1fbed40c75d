//! XML text helpers.

mod escape;

pub use escape::{encode_invalid_xml_chars, escape_xml, unescape_xml};
