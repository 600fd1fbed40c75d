//! Office Open XML (OOXML) support for editing presentations.
//!
//! The module is organized into layers:
//!
//! 1. **OPC Layer** (`opc`): package handling (ZIP, parts, relationships)
//! 2. **XML tree** (`xmltree`): owned element tree for editing parts in place
//! 3. **PresentationML** (`pptx`): slides, tables, text frames
pub mod error;
pub mod opc;
pub mod pptx;
pub mod xmltree;

// Re-export commonly used types from OPC layer
pub use error::{OoxmlError, Result};
pub use opc::{OpcPackage, PackURI};
