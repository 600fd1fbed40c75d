/// Presentation part - the main part in a .pptx package.
///
/// Corresponds to `/ppt/presentation.xml` in the package. Only the slide id
/// list is interpreted; everything else round-trips untouched.
use crate::ooxml::error::{OoxmlError, Result};
use crate::ooxml::xmltree::{XmlDocument, XmlElement, XmlNode};

/// Lowest slide id PowerPoint accepts.
pub const MIN_SLIDE_ID: u32 = 256;

/// One `p:sldId` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlideId {
    pub id: u32,
    /// Relationship id of the slide part, relative to the presentation part
    pub r_id: String,
}

/// Parsed `presentation.xml`.
#[derive(Debug, Clone)]
pub struct PresentationPart {
    doc: XmlDocument,
}

impl PresentationPart {
    pub fn parse(xml: &[u8]) -> Result<Self> {
        Ok(Self {
            doc: XmlDocument::parse(xml)?,
        })
    }

    pub fn to_xml(&self) -> String {
        self.doc.to_xml()
    }

    /// Slide ids in presentation order.
    ///
    /// Entries with a missing or non-numeric id are skipped.
    pub fn slide_ids(&self) -> Vec<SlideId> {
        let Some(list) = self.doc.root().child("sldIdLst") else {
            return Vec::new();
        };
        list.children_named("sldId")
            .filter_map(|el| {
                let id = atoi_simd::parse::<u32>(el.attr("id")?.as_bytes()).ok()?;
                let r_id = el.attr("r:id")?;
                Some(SlideId { id, r_id })
            })
            .collect()
    }

    /// Next unused slide id: one past the largest, never below [`MIN_SLIDE_ID`].
    pub fn next_slide_id(&self) -> u32 {
        self.slide_ids()
            .iter()
            .map(|slide| slide.id + 1)
            .max()
            .unwrap_or(MIN_SLIDE_ID)
            .max(MIN_SLIDE_ID)
    }

    /// Register a slide relationship in the slide list right after the entry
    /// for `anchor_r_id`, or at the end if the anchor is absent.
    ///
    /// Returns the new slide id.
    pub fn insert_slide_after(&mut self, anchor_r_id: &str, r_id: &str) -> Result<u32> {
        let id = self.next_slide_id();
        let root = self.doc.root_mut();
        if root.child("sldIdLst").is_none() {
            let list = XmlElement::new(root.sibling_name("sldIdLst"));
            // sldIdLst follows the master and notes/handout master lists.
            let after = root
                .children()
                .iter()
                .rposition(|node| {
                    matches!(node, XmlNode::Element(el)
                        if matches!(el.local_name(), "sldMasterIdLst" | "notesMasterIdLst" | "handoutMasterIdLst"))
                })
                .map_or(0, |pos| pos + 1);
            root.children_mut().insert(after, XmlNode::Element(list));
        }

        let list = root
            .child_mut("sldIdLst")
            .ok_or_else(|| OoxmlError::InvalidFormat("missing p:sldIdLst".to_string()))?;
        let entry = XmlElement::new(list.sibling_name("sldId"))
            .with_attr("id", &id.to_string())
            .with_attr("r:id", r_id);

        let anchor = list.children().iter().position(|node| {
            matches!(node, XmlNode::Element(el)
                if el.local_name() == "sldId" && el.attr("r:id").as_deref() == Some(anchor_r_id))
        });
        match anchor {
            Some(index) => list.children_mut().insert(index + 1, XmlNode::Element(entry)),
            None => list.push(entry),
        }
        Ok(id)
    }
}
