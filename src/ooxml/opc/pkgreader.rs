//! Low-level, read-only API to a serialized Open Packaging Convention (OPC) package.
//!
//! Resolves content types and walks the relationship graph from the package
//! relationships, so only parts reachable from `_rels/.rels` are loaded.

use crate::common::xml::unescape_xml;
use crate::ooxml::opc::constants::target_mode;
use crate::ooxml::opc::error::{OpcError, Result};
use crate::ooxml::opc::packuri::{CONTENT_TYPES_URI, PACKAGE_URI, PackURI};
use crate::ooxml::opc::phys_pkg::PhysPkgReader;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use smallvec::SmallVec;
use std::collections::{HashMap, HashSet};

/// Serialized part with its content and relationships.
#[derive(Debug)]
pub struct SerializedPart {
    pub partname: PackURI,
    pub content_type: String,
    pub blob: Vec<u8>,
    /// Relationships from this part, typically only a handful
    pub srels: SmallVec<[SerializedRelationship; 8]>,
}

/// Serialized relationship as read from a .rels file.
#[derive(Debug, Clone)]
pub struct SerializedRelationship {
    /// Base URI for resolving relative references
    pub base_uri: String,
    pub r_id: String,
    pub reltype: String,
    /// Target reference (relative URI or external URL)
    pub target_ref: String,
    /// Target mode (Internal or External)
    pub target_mode: String,
}

impl SerializedRelationship {
    #[inline]
    pub fn is_external(&self) -> bool {
        self.target_mode == target_mode::EXTERNAL
    }

    /// Resolve the target reference against the base URI.
    pub fn target_partname(&self) -> Result<PackURI> {
        if self.is_external() {
            return Err(OpcError::InvalidRelationship(format!(
                "{} is external and has no target part",
                self.r_id
            )));
        }
        PackURI::from_rel_ref(&self.base_uri, &self.target_ref).map_err(OpcError::InvalidPackUri)
    }
}

/// Content type lookup built from `[Content_Types].xml`.
struct ContentTypeMap {
    /// Lowercased file extension to content type
    defaults: HashMap<String, String>,
    /// Partname to content type
    overrides: HashMap<String, String>,
}

impl ContentTypeMap {
    fn from_xml(xml: &[u8]) -> Result<Self> {
        let mut map = Self {
            defaults: HashMap::new(),
            overrides: HashMap::new(),
        };
        let mut reader = Reader::from_reader(xml);
        reader.config_mut().trim_text(true);
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) => {
                    match e.local_name().as_ref() {
                        b"Default" => {
                            if let (Some(ext), Some(ct)) =
                                (attr(e, b"Extension")?, attr(e, b"ContentType")?)
                            {
                                map.defaults.insert(ext.to_lowercase(), ct);
                            }
                        },
                        b"Override" => {
                            if let (Some(pn), Some(ct)) =
                                (attr(e, b"PartName")?, attr(e, b"ContentType")?)
                            {
                                map.overrides.insert(pn, ct);
                            }
                        },
                        _ => {},
                    }
                },
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(OpcError::XmlError(format!("Content types parse error: {}", e)));
                },
                _ => {},
            }
            buf.clear();
        }

        Ok(map)
    }

    /// Override first, then the default for the extension.
    fn get(&self, pack_uri: &PackURI) -> Result<String> {
        self.overrides
            .get(pack_uri.as_str())
            .or_else(|| self.defaults.get(&pack_uri.ext().to_lowercase()))
            .cloned()
            .ok_or_else(|| OpcError::ContentTypeNotFound(pack_uri.to_string()))
    }
}

/// Read one attribute by its qualified name, unescaped.
fn attr(element: &BytesStart<'_>, key: &[u8]) -> Result<Option<String>> {
    for attribute in element.attributes() {
        let attribute = attribute?;
        if attribute.key.as_ref() == key {
            let raw = std::str::from_utf8(&attribute.value)?;
            return Ok(Some(unescape_xml(raw)));
        }
    }
    Ok(None)
}

/// Package reader that provides access to serialized parts and relationships.
pub struct PackageReader {
    pkg_srels: SmallVec<[SerializedRelationship; 8]>,
    sparts: Vec<SerializedPart>,
}

impl PackageReader {
    /// Parse content types and relationships, then load every reachable part.
    pub fn from_phys_reader(phys_reader: PhysPkgReader) -> Result<Self> {
        let mut members = phys_reader.into_members();

        let content_types_xml = members
            .get(CONTENT_TYPES_URI.trim_start_matches('/'))
            .ok_or_else(|| OpcError::PartNotFound("[Content_Types].xml".to_string()))?;
        let content_types = ContentTypeMap::from_xml(content_types_xml)?;

        let package_uri = PackURI::new(PACKAGE_URI).map_err(OpcError::InvalidPackUri)?;
        let pkg_srels = Self::load_rels(&members, &package_uri)?;
        let sparts = Self::load_parts(&mut members, &pkg_srels, &content_types)?;

        Ok(Self { pkg_srels, sparts })
    }

    fn load_rels(
        members: &HashMap<String, Vec<u8>>,
        source_uri: &PackURI,
    ) -> Result<SmallVec<[SerializedRelationship; 8]>> {
        let rels_uri = source_uri.rels_uri().map_err(OpcError::InvalidPackUri)?;
        match members.get(rels_uri.membername()) {
            Some(xml) => Self::parse_rels_xml(xml, source_uri.base_uri()),
            None => Ok(SmallVec::new()),
        }
    }

    fn parse_rels_xml(
        rels_xml: &[u8],
        base_uri: &str,
    ) -> Result<SmallVec<[SerializedRelationship; 8]>> {
        let mut srels = SmallVec::new();
        let mut reader = Reader::from_reader(rels_xml);
        reader.config_mut().trim_text(true);
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                    if e.local_name().as_ref() == b"Relationship" =>
                {
                    let r_id = attr(e, b"Id")?;
                    let reltype = attr(e, b"Type")?;
                    let target_ref = attr(e, b"Target")?;
                    let target_mode = attr(e, b"TargetMode")?
                        .unwrap_or_else(|| target_mode::INTERNAL.to_string());

                    if let (Some(r_id), Some(reltype), Some(target_ref)) = (r_id, reltype, target_ref)
                    {
                        srels.push(SerializedRelationship {
                            base_uri: base_uri.to_string(),
                            r_id,
                            reltype,
                            target_ref,
                            target_mode,
                        });
                    }
                },
                Ok(Event::Eof) => break,
                Err(e) => return Err(OpcError::XmlError(format!("Rels parse error: {}", e))),
                _ => {},
            }
            buf.clear();
        }

        Ok(srels)
    }

    /// Walk the relationship graph, moving each reachable blob out of `members`.
    fn load_parts(
        members: &mut HashMap<String, Vec<u8>>,
        pkg_srels: &[SerializedRelationship],
        content_types: &ContentTypeMap,
    ) -> Result<Vec<SerializedPart>> {
        let mut sparts = Vec::with_capacity(members.len());
        let mut visited = HashSet::new();
        let mut work_queue: Vec<PackURI> = Vec::new();

        for srel in pkg_srels.iter().filter(|srel| !srel.is_external()) {
            let partname = srel.target_partname()?;
            if visited.insert(partname.clone()) {
                work_queue.push(partname);
            }
        }

        while let Some(partname) = work_queue.pop() {
            let srels = Self::load_rels(members, &partname)?;

            for child in srels.iter().filter(|srel| !srel.is_external()) {
                let child_partname = child.target_partname()?;
                if visited.insert(child_partname.clone()) {
                    work_queue.push(child_partname);
                }
            }

            // Dangling internal targets are common in hand-edited templates; skip them.
            let Some(blob) = members.remove(partname.membername()) else {
                log::warn!("relationship target {} is missing from the package", partname);
                continue;
            };
            let content_type = content_types.get(&partname)?;

            sparts.push(SerializedPart {
                partname,
                content_type,
                blob,
                srels,
            });
        }

        Ok(sparts)
    }

    /// Package-level relationships.
    pub fn pkg_srels(&self) -> &[SerializedRelationship] {
        &self.pkg_srels
    }

    /// Take ownership of all serialized parts.
    pub fn take_sparts(&mut self) -> Vec<SerializedPart> {
        std::mem::take(&mut self.sparts)
    }
}
