use crate::common::xml::escape_xml;
use crate::ooxml::opc::error::{OpcError, Result};
use crate::ooxml::opc::packuri::PackURI;
/// Relationship-related objects for OPC packages.
///
/// A part's relationships are what a slide's `r:id`/`r:embed` attributes
/// point at, so duplicating a slide means carrying its relationships over
/// with the same ids.
use std::collections::HashMap;
use std::fmt::Write as FmtWrite;

/// A single relationship from a source part to a target.
#[derive(Debug, Clone)]
pub struct Relationship {
    /// Relationship ID (e.g., "rId1", "rId2")
    r_id: String,

    /// Relationship type URI
    reltype: String,

    /// Target reference - either a part URI relative to `base_uri` or an external URL
    target_ref: String,

    /// Base URI for resolving relative references
    base_uri: String,

    /// Whether this is an external relationship
    is_external: bool,
}

impl Relationship {
    pub fn new(
        r_id: String,
        reltype: String,
        target_ref: String,
        base_uri: String,
        is_external: bool,
    ) -> Self {
        Self {
            r_id,
            reltype,
            target_ref,
            base_uri,
            is_external,
        }
    }

    #[inline]
    pub fn r_id(&self) -> &str {
        &self.r_id
    }

    #[inline]
    pub fn reltype(&self) -> &str {
        &self.reltype
    }

    /// Get the target reference.
    ///
    /// For internal relationships, this is a relative part reference.
    /// For external relationships, this is an absolute URL.
    #[inline]
    pub fn target_ref(&self) -> &str {
        &self.target_ref
    }

    #[inline]
    pub fn is_external(&self) -> bool {
        self.is_external
    }

    /// Get the absolute target partname for internal relationships.
    pub fn target_partname(&self) -> Result<PackURI> {
        if self.is_external {
            return Err(OpcError::InvalidRelationship(format!(
                "{} is external and has no target part",
                self.r_id
            )));
        }
        PackURI::from_rel_ref(&self.base_uri, &self.target_ref).map_err(OpcError::InvalidPackUri)
    }
}

/// Collection of relationships from a single source, keyed by rId.
#[derive(Debug)]
pub struct Relationships {
    /// Base URI for resolving relative references
    base_uri: String,

    /// Map of relationship ID to Relationship
    rels: HashMap<String, Relationship>,
}

impl Relationships {
    pub fn new(base_uri: String) -> Self {
        Self {
            base_uri,
            rels: HashMap::new(),
        }
    }

    /// Add a relationship with an explicit rId, replacing any previous one with that id.
    pub fn add_relationship(
        &mut self,
        reltype: String,
        target_ref: String,
        r_id: String,
        is_external: bool,
    ) -> &Relationship {
        let rel = Relationship::new(
            r_id.clone(),
            reltype,
            target_ref,
            self.base_uri.clone(),
            is_external,
        );
        self.rels.entry(r_id).insert_entry(rel).into_mut()
    }

    #[inline]
    pub fn get(&self, r_id: &str) -> Option<&Relationship> {
        self.rels.get(r_id)
    }

    /// Get or add an internal relationship to `target_ref`.
    ///
    /// An existing relationship of the same type and target is reused;
    /// otherwise a new one is created with the next free rId.
    pub fn get_or_add(&mut self, reltype: &str, target_ref: &str) -> &Relationship {
        let existing = self
            .rels
            .values()
            .find(|rel| {
                rel.reltype() == reltype && rel.target_ref() == target_ref && !rel.is_external()
            })
            .map(|rel| rel.r_id().to_string());

        let r_id = match existing {
            Some(r_id) => r_id,
            None => {
                let r_id = self.next_r_id();
                self.add_relationship(reltype.to_string(), target_ref.to_string(), r_id.clone(), false);
                r_id
            },
        };
        &self.rels[&r_id]
    }

    /// Lowest "rIdN" not yet in use.
    fn next_r_id(&self) -> String {
        let mut used: Vec<u32> = self
            .rels
            .keys()
            .filter_map(|r_id| r_id.strip_prefix("rId"))
            .filter_map(|digits| atoi_simd::parse::<u32>(digits.as_bytes()).ok())
            .collect();
        used.sort_unstable();

        let mut next = 1u32;
        for num in used {
            if num == next {
                next += 1;
            } else if num > next {
                break;
            }
        }
        format!("rId{}", next)
    }

    /// Get the single relationship of a specific type.
    ///
    /// Returns an error if there is none, or more than one.
    pub fn part_with_reltype(&self, reltype: &str) -> Result<&Relationship> {
        let mut matching = self.rels.values().filter(|rel| rel.reltype() == reltype);
        match (matching.next(), matching.next()) {
            (Some(rel), None) => Ok(rel),
            (None, _) => Err(OpcError::RelationshipNotFound(format!(
                "No relationship of type '{}'",
                reltype
            ))),
            (Some(_), Some(_)) => Err(OpcError::InvalidRelationship(format!(
                "Multiple relationships of type '{}'",
                reltype
            ))),
        }
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Relationship> {
        self.rels.values()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rels.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rels.is_empty()
    }

    /// Serialize to the XML of a `.rels` part, sorted by rId for stable output.
    pub fn to_xml(&self) -> String {
        let mut xml = String::with_capacity(256 + self.rels.len() * 160);

        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push('\n');
        xml.push_str(
            r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        );

        let mut rels: Vec<&Relationship> = self.rels.values().collect();
        rels.sort_by(|a, b| a.r_id().cmp(b.r_id()));

        for rel in rels {
            let target_mode = if rel.is_external() {
                r#" TargetMode="External""#
            } else {
                ""
            };
            let _ = write!(
                xml,
                r#"<Relationship Id="{}" Type="{}" Target="{}"{}/>"#,
                escape_xml(rel.r_id()),
                escape_xml(rel.reltype()),
                escape_xml(rel.target_ref()),
                target_mode
            );
        }

        xml.push_str("</Relationships>");
        xml
    }
}

impl Default for Relationships {
    fn default() -> Self {
        Self::new("/".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::opc::constants::relationship_type as rt;

    #[test]
    fn test_next_r_id_fills_gaps() {
        let mut rels = Relationships::new("/ppt/slides".to_string());
        assert_eq!(rels.next_r_id(), "rId1");

        rels.add_relationship(rt::SLIDE_LAYOUT.to_string(), "a.xml".to_string(), "rId1".to_string(), false);
        rels.add_relationship(rt::IMAGE.to_string(), "b.png".to_string(), "rId3".to_string(), false);
        assert_eq!(rels.next_r_id(), "rId2");
    }

    #[test]
    fn test_get_or_add_reuses_matching_target() {
        let mut rels = Relationships::new("/ppt".to_string());

        assert_eq!(rels.get_or_add(rt::SLIDE, "slides/slide1.xml").r_id(), "rId1");
        assert_eq!(rels.get_or_add(rt::SLIDE, "slides/slide1.xml").r_id(), "rId1");
        assert_eq!(rels.get_or_add(rt::SLIDE, "slides/slide2.xml").r_id(), "rId2");
        assert_eq!(rels.len(), 2);
    }

    #[test]
    fn test_target_partname_resolves_against_base() {
        let mut rels = Relationships::new("/ppt/slides".to_string());
        let rel = rels.get_or_add(rt::SLIDE_LAYOUT, "../slideLayouts/slideLayout2.xml");
        assert_eq!(
            rel.target_partname().unwrap().as_str(),
            "/ppt/slideLayouts/slideLayout2.xml"
        );
    }

    #[test]
    fn test_part_with_reltype() {
        let mut rels = Relationships::new("/ppt/slides".to_string());
        assert!(rels.part_with_reltype(rt::SLIDE_LAYOUT).is_err());

        rels.get_or_add(rt::SLIDE_LAYOUT, "../slideLayouts/slideLayout1.xml");
        assert!(rels.part_with_reltype(rt::SLIDE_LAYOUT).is_ok());

        rels.get_or_add(rt::SLIDE_LAYOUT, "../slideLayouts/slideLayout2.xml");
        assert!(rels.part_with_reltype(rt::SLIDE_LAYOUT).is_err());
    }

    #[test]
    fn test_to_xml_marks_external_targets() {
        let mut rels = Relationships::new("/ppt/slides".to_string());
        rels.add_relationship(
            rt::HYPERLINK.to_string(),
            "https://example.com/?a=1&b=2".to_string(),
            "rId2".to_string(),
            true,
        );

        let xml = rels.to_xml();
        assert!(xml.contains(r#"Target="https://example.com/?a=1&amp;b=2" TargetMode="External""#));
    }
}
