/// In-memory OPC package.
///
/// Holds every reachable part with its relationships, plus the package-level
/// relationships. Parts are boxed trait objects so XML and binary parts can
/// live side by side.
use crate::ooxml::opc::constants::relationship_type;
use crate::ooxml::opc::error::{OpcError, Result};
use crate::ooxml::opc::packuri::{PACKAGE_URI, PackURI};
use crate::ooxml::opc::part::{Part, PartFactory};
use crate::ooxml::opc::phys_pkg::PhysPkgReader;
use crate::ooxml::opc::pkgreader::PackageReader;
use crate::ooxml::opc::pkgwriter::PackageWriter;
use crate::ooxml::opc::rel::Relationships;
use std::collections::HashMap;
use std::io::{Read, Seek};
use std::path::Path;

/// Upper bound when probing for a free tuple partname.
const MAX_PARTNAME_INDEX: u32 = 10_000;

pub struct OpcPackage {
    /// Package-level relationships
    rels: Relationships,

    /// All parts in the package, indexed by partname
    parts: HashMap<String, Box<dyn Part>>,
}

impl OpcPackage {
    /// Create a new empty OPC package.
    pub fn new() -> Self {
        Self {
            rels: Relationships::new(PACKAGE_URI.to_string()),
            parts: HashMap::new(),
        }
    }

    /// Open an OPC package from a file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::unmarshal(PackageReader::from_phys_reader(PhysPkgReader::open(path)?)?)
    }

    /// Load an OPC package from a reader.
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        Self::unmarshal(PackageReader::from_phys_reader(PhysPkgReader::new(reader)?)?)
    }

    /// Convert serialized parts and relationships into the in-memory graph.
    fn unmarshal(mut pkg_reader: PackageReader) -> Result<Self> {
        let mut package = Self::new();

        for srel in pkg_reader.pkg_srels() {
            package.rels.add_relationship(
                srel.reltype.clone(),
                srel.target_ref.clone(),
                srel.r_id.clone(),
                srel.is_external(),
            );
        }

        for spart in pkg_reader.take_sparts() {
            let mut part = PartFactory::load(spart.partname, spart.content_type, spart.blob)?;
            for srel in spart.srels {
                let is_external = srel.is_external();
                part.rels_mut()
                    .add_relationship(srel.reltype, srel.target_ref, srel.r_id, is_external);
            }
            package.add_part(part);
        }

        Ok(package)
    }

    /// The part targeted by the package's officeDocument relationship.
    ///
    /// For PowerPoint, the presentation.xml part.
    pub fn main_document_part(&self) -> Result<&dyn Part> {
        let partname = self.main_document_partname()?;
        self.get_part(&partname)
    }

    /// Partname of the main document part.
    pub fn main_document_partname(&self) -> Result<PackURI> {
        self.rels
            .part_with_reltype(relationship_type::OFFICE_DOCUMENT)?
            .target_partname()
    }

    /// Get a part by its partname.
    pub fn get_part(&self, partname: &PackURI) -> Result<&dyn Part> {
        self.parts
            .get(partname.as_str())
            .map(|b| &**b as &dyn Part)
            .ok_or_else(|| OpcError::PartNotFound(partname.to_string()))
    }

    /// Get a mutable reference to a part by its partname.
    pub fn get_part_mut(&mut self, partname: &PackURI) -> Result<&mut dyn Part> {
        match self.parts.get_mut(partname.as_str()) {
            Some(part) => Ok(part.as_mut()),
            None => Err(OpcError::PartNotFound(partname.to_string())),
        }
    }

    /// Add a part, replacing any part with the same partname.
    pub fn add_part(&mut self, part: Box<dyn Part>) {
        self.parts.insert(part.partname().to_string(), part);
    }

    /// Iterate over all parts in partname order.
    pub fn iter_parts(&self) -> impl Iterator<Item = &dyn Part> {
        let mut parts: Vec<&dyn Part> = self.parts.values().map(|b| &**b as &dyn Part).collect();
        parts.sort_by(|a, b| a.partname().cmp(b.partname()));
        parts.into_iter()
    }

    pub fn part_count(&self) -> usize {
        self.parts.len()
    }

    /// Package-level relationships.
    pub fn rels(&self) -> &Relationships {
        &self.rels
    }

    /// Lowest free partname for a tuple template such as "/ppt/slides/slide%d.xml".
    pub fn next_partname(&self, template: &str) -> Result<PackURI> {
        (1..=MAX_PARTNAME_INDEX)
            .map(|n| template.replace("%d", &n.to_string()))
            .find(|candidate| !self.parts.contains_key(candidate))
            .ok_or_else(|| OpcError::PartnamesExhausted(template.to_string()))
            .and_then(|candidate| PackURI::new(candidate).map_err(OpcError::InvalidPackUri))
    }

    /// Serialize the package to ZIP bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        PackageWriter::to_bytes(self)
    }

    /// Serialize and write the package to `path`.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        PackageWriter::write(path, self)
    }
}

impl Default for OpcPackage {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::opc::constants::content_type as ct;
    use std::io::{Cursor, Write};
    use zip::ZipWriter;
    use zip::write::SimpleFileOptions;

    fn create_minimal_pptx() -> Vec<u8> {
        let mut zip_data = Vec::new();
        {
            let mut writer = ZipWriter::new(Cursor::new(&mut zip_data));
            let options = SimpleFileOptions::default();

            writer.start_file("[Content_Types].xml", options).unwrap();
            writer.write_all(br#"<?xml version="1.0"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
    <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
    <Default Extension="xml" ContentType="application/xml"/>
    <Override PartName="/ppt/presentation.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml"/>
    <Override PartName="/ppt/slides/slide1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slide+xml"/>
</Types>"#).unwrap();

            writer.start_file("_rels/.rels", options).unwrap();
            writer.write_all(br#"<?xml version="1.0"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
    <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="ppt/presentation.xml"/>
</Relationships>"#).unwrap();

            writer.start_file("ppt/_rels/presentation.xml.rels", options).unwrap();
            writer.write_all(br#"<?xml version="1.0"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
    <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide" Target="slides/slide1.xml"/>
</Relationships>"#).unwrap();

            writer.start_file("ppt/presentation.xml", options).unwrap();
            writer.write_all(br#"<p:presentation xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><p:sldIdLst><p:sldId id="256" r:id="rId2"/></p:sldIdLst></p:presentation>"#).unwrap();

            writer.start_file("ppt/slides/slide1.xml", options).unwrap();
            writer.write_all(br#"<p:sld xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"/>"#).unwrap();

            writer.start_file("orphan.bin", options).unwrap();
            writer.write_all(b"unreferenced").unwrap();

            writer.finish().unwrap();
        }
        zip_data
    }

    #[test]
    fn test_open_package_loads_reachable_parts() {
        let pkg = OpcPackage::from_reader(Cursor::new(create_minimal_pptx())).unwrap();

        assert_eq!(pkg.part_count(), 2);
        let main_part = pkg.main_document_part().unwrap();
        assert_eq!(main_part.content_type(), ct::PML_PRESENTATION_MAIN);
        assert_eq!(main_part.rels().len(), 1);
    }

    #[test]
    fn test_next_partname() {
        let pkg = OpcPackage::from_reader(Cursor::new(create_minimal_pptx())).unwrap();
        let next = pkg.next_partname("/ppt/slides/slide%d.xml").unwrap();
        assert_eq!(next.as_str(), "/ppt/slides/slide2.xml");
    }

    #[test]
    fn test_round_trip_through_writer() {
        let pkg = OpcPackage::from_reader(Cursor::new(create_minimal_pptx())).unwrap();
        let bytes = pkg.to_bytes().unwrap();
        let reopened = OpcPackage::from_reader(Cursor::new(bytes)).unwrap();

        assert_eq!(reopened.part_count(), 2);
        let slide = PackURI::new("/ppt/slides/slide1.xml").unwrap();
        assert_eq!(reopened.get_part(&slide).unwrap().content_type(), ct::PML_SLIDE);
    }
}
