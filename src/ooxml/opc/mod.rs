/// Open Packaging Conventions (OPC) implementation.
///
/// Covers what editing a presentation needs:
///
/// - Package structure (parts, relationships)
/// - Content type management
/// - ZIP-based physical packaging, read and write
///
/// Parts are loaded by walking the relationship graph from `_rels/.rels`,
/// and written back in partname order so output is deterministic.
pub mod constants;
pub mod error;
pub mod package;
pub mod packuri;
pub mod part;
pub mod phys_pkg;
pub mod pkgreader;
pub mod pkgwriter;
pub mod rel;

// Re-export commonly used types
pub use package::OpcPackage;
pub use packuri::PackURI;
pub use part::{BlobPart, Part, XmlPart};
pub use rel::{Relationship, Relationships};
