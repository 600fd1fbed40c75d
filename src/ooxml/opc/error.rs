/// Error types for reading and writing OPC packages.
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OpcError {
    /// The package file does not exist
    #[error("package not found: {0}")]
    PackageNotFound(String),

    #[error("invalid pack URI: {0}")]
    InvalidPackUri(String),

    #[error("part not found: {0}")]
    PartNotFound(String),

    #[error("relationship not found: {0}")]
    RelationshipNotFound(String),

    /// Neither an override nor a default matches the part
    #[error("no content type for part {0}")]
    ContentTypeNotFound(String),

    #[error("invalid relationship: {0}")]
    InvalidRelationship(String),

    /// Every numbered partname for a template is taken
    #[error("no free partname for {0}")]
    PartnamesExhausted(String),

    #[error("malformed XML: {0}")]
    XmlError(String),

    #[error(transparent)]
    ZipError(#[from] zip::result::ZipError),

    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    Utf8Error(#[from] std::str::Utf8Error),
}

impl From<quick_xml::events::attributes::AttrError> for OpcError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        OpcError::XmlError(format!("bad attribute: {}", err))
    }
}

impl From<quick_xml::Error> for OpcError {
    fn from(err: quick_xml::Error) -> Self {
        OpcError::XmlError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, OpcError>;
