/// Editable slide trees.
///
/// A [`Slide`] is a parsed copy of one slide part. Callers take it out of the
/// [`Package`](crate::ooxml::pptx::Package), edit it and store it back.
use crate::ooxml::error::{OoxmlError, Result};
use crate::ooxml::opc::packuri::PackURI;
use crate::ooxml::pptx::shapes::table::TableMut;
use crate::ooxml::pptx::shapes::textframe::{TextFrameMut, text_of};
use crate::ooxml::xmltree::{XmlDocument, XmlElement};

/// Children of `p:spTree` that describe the group itself rather than a shape.
const NON_SHAPE_ELEMENTS: [&str; 3] = ["nvGrpSpPr", "grpSpPr", "extLst"];

/// Finds a table on a slide by the text of its header row.
pub trait TableLocator {
    /// First table with a row-0 cell containing `needle`, ignoring case.
    fn find_table_by_header_substring(&mut self, needle: &str) -> Option<TableMut<'_>>;
}

#[derive(Debug, Clone)]
pub struct Slide {
    partname: PackURI,
    doc: XmlDocument,
}

impl Slide {
    /// Parse a slide part.
    ///
    /// Fails if the XML is malformed or has no shape tree.
    pub fn parse(partname: PackURI, xml: &[u8]) -> Result<Self> {
        let doc = XmlDocument::parse(xml)
            .map_err(|e| OoxmlError::Xml(format!("{}: {}", partname, e)))?;
        let slide = Self { partname, doc };
        if slide.sp_tree().is_none() {
            return Err(OoxmlError::InvalidFormat(format!(
                "{} has no shape tree",
                slide.partname
            )));
        }
        Ok(slide)
    }

    #[inline]
    pub fn partname(&self) -> &PackURI {
        &self.partname
    }

    pub fn to_xml(&self) -> String {
        self.doc.to_xml()
    }

    fn sp_tree(&self) -> Option<&XmlElement> {
        self.doc.root().child("cSld")?.child("spTree")
    }

    fn sp_tree_mut(&mut self) -> Option<&mut XmlElement> {
        self.doc.root_mut().child_mut("cSld")?.child_mut("spTree")
    }

    /// Top-level shapes in z-order.
    pub fn shapes(&self) -> Vec<&XmlElement> {
        self.sp_tree()
            .map(|tree| tree.elements().filter(|el| is_shape(el)).collect())
            .unwrap_or_default()
    }

    /// Local names of the top-level shapes, e.g. `["sp", "graphicFrame"]`.
    pub fn shape_kinds(&self) -> Vec<&str> {
        self.shapes().into_iter().map(XmlElement::local_name).collect()
    }

    /// Every table on the slide, including those inside groups.
    pub fn tables_mut(&mut self) -> Vec<TableMut<'_>> {
        match self.sp_tree_mut() {
            Some(tree) => tree.find_all_mut("tbl").into_iter().map(TableMut::new).collect(),
            None => Vec::new(),
        }
    }

    pub fn table_count(&self) -> usize {
        self.sp_tree().map_or(0, |tree| tree.find_all("tbl").len())
    }

    /// Text frames of the top-level autoshapes that have one.
    pub fn text_frames_mut(&mut self) -> Vec<TextFrameMut<'_>> {
        match self.sp_tree_mut() {
            Some(tree) => tree
                .children_named_mut("sp")
                .filter_map(|sp| sp.child_mut("txBody"))
                .map(TextFrameMut::new)
                .collect(),
            None => Vec::new(),
        }
    }

    /// Text frame of the first autoshape whose text is blank.
    ///
    /// An autoshape without a text body counts as blank; one is added to it.
    pub fn first_blank_text_frame(&mut self) -> Option<TextFrameMut<'_>> {
        let shape = self
            .sp_tree_mut()?
            .children_named_mut("sp")
            .find(|sp| sp.child("txBody").is_none_or(|body| text_of(body).trim().is_empty()))?;

        if shape.child("txBody").is_none() {
            let body = new_shape_body(shape);
            shape.insert_before(body, "extLst");
        }
        shape.child_mut("txBody").map(TextFrameMut::new)
    }

    /// Copy of this slide's tree holding deep clones of every shape.
    ///
    /// The shape tree is emptied down to its group properties, then each
    /// shape is cloned in order and inserted before the trailing `p:extLst`,
    /// which stays last.
    pub fn duplicate_tree(&self) -> Result<XmlDocument> {
        let mut doc = self.doc.clone();
        let tree = doc
            .root_mut()
            .child_mut("cSld")
            .and_then(|c| c.child_mut("spTree"))
            .ok_or_else(|| {
                OoxmlError::InvalidFormat(format!("{} has no shape tree", self.partname))
            })?;
        tree.retain_elements(|el| !is_shape(el));

        for shape in self.shapes() {
            tree.insert_before(shape.clone(), "extLst");
        }
        Ok(doc)
    }

    pub(crate) fn from_document(partname: PackURI, doc: XmlDocument) -> Self {
        Self { partname, doc }
    }
}

impl TableLocator for Slide {
    fn find_table_by_header_substring(&mut self, needle: &str) -> Option<TableMut<'_>> {
        self.tables_mut()
            .into_iter()
            .find(|table| table.header_contains(needle))
    }
}

fn is_shape(el: &XmlElement) -> bool {
    !NON_SHAPE_ELEMENTS.contains(&el.local_name())
}

/// Empty `p:txBody` for an autoshape that has none.
fn new_shape_body(sp: &XmlElement) -> XmlElement {
    XmlElement::new(sp.sibling_name("txBody"))
        .with_child(XmlElement::new("a:bodyPr"))
        .with_child(XmlElement::new("a:lstStyle"))
        .with_child(XmlElement::new("a:p"))
}
