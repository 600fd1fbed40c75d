//! Owned XML element tree for editing DrawingML/PresentationML parts.
//!
//! Slide parts are parsed into a tree of [`XmlElement`]s, mutated in place
//! (rows appended, shapes deep-cloned, paragraphs rewritten) and serialized
//! back. Attribute values and text are stored in their escaped, on-disk form
//! so that untouched content round-trips byte for byte; accessors unescape on
//! the way out and setters escape on the way in.

use crate::common::xml::{escape_xml, unescape_xml};
use crate::ooxml::error::{OoxmlError, Result};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

/// XML declaration written in front of every serialized part.
const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

/// A node inside an element.
#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    Element(XmlElement),
    /// Character data, escaped
    Text(String),
    CData(String),
    Comment(String),
    ProcessingInstruction(String),
}

/// An element with its attributes and children, in document order.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlElement {
    /// Qualified name, e.g. "a:tbl"
    name: String,
    /// Qualified attribute names with escaped values
    attrs: Vec<(String, String)>,
    children: Vec<XmlNode>,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Builder form of [`set_attr`](Self::set_attr).
    pub fn with_attr(mut self, key: &str, value: &str) -> Self {
        self.set_attr(key, value);
        self
    }

    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.push(child);
        self
    }

    /// Builder that appends a text node; `text` is escaped.
    pub fn with_text(mut self, text: &str) -> Self {
        self.children.push(XmlNode::Text(escape_xml(text)));
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Namespace prefix of the qualified name, if any.
    pub fn prefix(&self) -> Option<&str> {
        self.name.split_once(':').map(|(prefix, _)| prefix)
    }

    /// Name without its namespace prefix.
    pub fn local_name(&self) -> &str {
        self.name
            .split_once(':')
            .map_or(self.name.as_str(), |(_, local)| local)
    }

    /// Qualify `local` with this element's prefix ("a" + "tr" -> "a:tr").
    pub fn sibling_name(&self, local: &str) -> String {
        match self.prefix() {
            Some(prefix) => format!("{}:{}", prefix, local),
            None => local.to_string(),
        }
    }

    /// Unescaped value of the attribute with the given qualified name.
    pub fn attr(&self, key: &str) -> Option<String> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| unescape_xml(v))
    }

    /// Set an attribute, keeping its position if it already exists.
    pub fn set_attr(&mut self, key: &str, value: &str) {
        let escaped = escape_xml(value);
        match self.attrs.iter_mut().find(|(k, _)| k == key) {
            Some((_, v)) => *v = escaped,
            None => self.attrs.push((key.to_string(), escaped)),
        }
    }

    pub fn remove_attr(&mut self, key: &str) {
        self.attrs.retain(|(k, _)| k != key);
    }

    #[inline]
    pub fn children(&self) -> &[XmlNode] {
        &self.children
    }

    #[inline]
    pub fn children_mut(&mut self) -> &mut Vec<XmlNode> {
        &mut self.children
    }

    /// Child elements, skipping text and other nodes.
    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|node| match node {
            XmlNode::Element(el) => Some(el),
            _ => None,
        })
    }

    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut XmlElement> {
        self.children.iter_mut().filter_map(|node| match node {
            XmlNode::Element(el) => Some(el),
            _ => None,
        })
    }

    /// Child elements with the given local name.
    pub fn children_named<'a>(&'a self, local: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.elements().filter(move |el| el.local_name() == local)
    }

    pub fn children_named_mut<'a>(
        &'a mut self,
        local: &'a str,
    ) -> impl Iterator<Item = &'a mut XmlElement> {
        self.elements_mut().filter(move |el| el.local_name() == local)
    }

    /// First child element with the given local name.
    pub fn child(&self, local: &str) -> Option<&XmlElement> {
        self.elements().find(|el| el.local_name() == local)
    }

    pub fn child_mut(&mut self, local: &str) -> Option<&mut XmlElement> {
        self.elements_mut().find(|el| el.local_name() == local)
    }

    /// First child element with the given local name, created and inserted
    /// at the front if missing.
    pub fn child_or_insert_first(&mut self, local: &str) -> &mut XmlElement {
        let position = self.children.iter().position(
            |node| matches!(node, XmlNode::Element(el) if el.local_name() == local),
        );
        let index = match position {
            Some(index) => index,
            None => {
                let name = self.sibling_name(local);
                self.children.insert(0, XmlNode::Element(XmlElement::new(name)));
                0
            },
        };
        match &mut self.children[index] {
            XmlNode::Element(el) => el,
            _ => unreachable!("index points at an element"),
        }
    }

    pub fn push(&mut self, child: XmlElement) {
        self.children.push(XmlNode::Element(child));
    }

    /// Insert `child` before the first child element named `local`, or at the
    /// end when there is none.
    pub fn insert_before(&mut self, child: XmlElement, local: &str) {
        let position = self.children.iter().position(
            |node| matches!(node, XmlNode::Element(el) if el.local_name() == local),
        );
        match position {
            Some(index) => self.children.insert(index, XmlNode::Element(child)),
            None => self.children.push(XmlNode::Element(child)),
        }
    }

    /// Keep only child elements for which `keep` returns true. Non-element
    /// nodes are left alone.
    pub fn retain_elements<F>(&mut self, mut keep: F)
    where
        F: FnMut(&XmlElement) -> bool,
    {
        self.children.retain(|node| match node {
            XmlNode::Element(el) => keep(el),
            _ => true,
        });
    }

    /// Depth-first search of descendants (not self) by local name.
    pub fn find(&self, local: &str) -> Option<&XmlElement> {
        for child in self.elements() {
            if child.local_name() == local {
                return Some(child);
            }
            if let Some(found) = child.find(local) {
                return Some(found);
            }
        }
        None
    }

    pub fn find_mut(&mut self, local: &str) -> Option<&mut XmlElement> {
        for child in self.elements_mut() {
            if child.local_name() == local {
                return Some(child);
            }
            if let Some(found) = child.find_mut(local) {
                return Some(found);
            }
        }
        None
    }

    /// All descendants with the given local name, in document order.
    pub fn find_all(&self, local: &str) -> Vec<&XmlElement> {
        let mut found = Vec::new();
        Self::collect(self, local, &mut found);
        found
    }

    fn collect<'a>(el: &'a XmlElement, local: &str, found: &mut Vec<&'a XmlElement>) {
        for child in el.elements() {
            if child.local_name() == local {
                found.push(child);
            }
            Self::collect(child, local, found);
        }
    }

    /// Mutable handles to the outermost descendants with the given local name.
    ///
    /// Matches are not searched for nested matches, which keeps the returned
    /// borrows disjoint.
    pub fn find_all_mut(&mut self, local: &str) -> Vec<&mut XmlElement> {
        let mut found = Vec::new();
        Self::collect_mut(self, local, &mut found);
        found
    }

    fn collect_mut<'a>(el: &'a mut XmlElement, local: &str, found: &mut Vec<&'a mut XmlElement>) {
        for child in el.elements_mut() {
            if child.local_name() == local {
                found.push(child);
            } else {
                Self::collect_mut(child, local, found);
            }
        }
    }

    /// Unescaped concatenation of all descendant text.
    pub fn text(&self) -> String {
        let mut text = String::new();
        self.collect_text(&mut text);
        text
    }

    fn collect_text(&self, out: &mut String) {
        for node in &self.children {
            match node {
                XmlNode::Text(raw) => out.push_str(&unescape_xml(raw)),
                XmlNode::CData(data) => out.push_str(data),
                XmlNode::Element(el) => el.collect_text(out),
                _ => {},
            }
        }
    }

    /// Replace all children with a single text node.
    pub fn set_text(&mut self, text: &str) {
        self.children.clear();
        if !text.is_empty() {
            self.children.push(XmlNode::Text(escape_xml(text)));
        }
    }

    /// Serialize this element and its subtree.
    pub fn write_into(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name);
        for (key, value) in &self.attrs {
            out.push(' ');
            out.push_str(key);
            out.push_str("=\"");
            out.push_str(value);
            out.push('"');
        }

        if self.children.is_empty() {
            out.push_str("/>");
            return;
        }

        out.push('>');
        for node in &self.children {
            match node {
                XmlNode::Element(el) => el.write_into(out),
                XmlNode::Text(raw) => out.push_str(raw),
                XmlNode::CData(data) => {
                    out.push_str("<![CDATA[");
                    out.push_str(data);
                    out.push_str("]]>");
                },
                XmlNode::Comment(comment) => {
                    out.push_str("<!--");
                    out.push_str(comment);
                    out.push_str("-->");
                },
                XmlNode::ProcessingInstruction(pi) => {
                    out.push_str("<?");
                    out.push_str(pi);
                    out.push_str("?>");
                },
            }
        }
        out.push_str("</");
        out.push_str(&self.name);
        out.push('>');
    }

    fn from_start(start: &BytesStart<'_>) -> Result<Self> {
        let name = std::str::from_utf8(start.name().as_ref())?.to_string();
        let mut attrs = Vec::new();
        for attribute in start.attributes() {
            let attribute = attribute?;
            let key = std::str::from_utf8(attribute.key.as_ref())?.to_string();
            let value = std::str::from_utf8(&attribute.value)?.to_string();
            attrs.push((key, value));
        }
        Ok(Self {
            name,
            attrs,
            children: Vec::new(),
        })
    }

    /// Append raw text, merging with a preceding text node.
    fn push_raw_text(&mut self, raw: &str) {
        if let Some(XmlNode::Text(last)) = self.children.last_mut() {
            last.push_str(raw);
        } else {
            self.children.push(XmlNode::Text(raw.to_string()));
        }
    }
}

/// A parsed XML part.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlDocument {
    root: XmlElement,
}

impl XmlDocument {
    pub fn new(root: XmlElement) -> Self {
        Self { root }
    }

    /// Parse a complete XML document.
    ///
    /// Whitespace-only text is preserved inside the root; content outside the
    /// root element (declaration, prolog comments) is dropped.
    pub fn parse(xml: &[u8]) -> Result<Self> {
        let mut reader = Reader::from_reader(xml);
        reader.config_mut().trim_text(false);
        let mut buf = Vec::new();
        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root = None;

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) => stack.push(XmlElement::from_start(e)?),
                Ok(Event::Empty(ref e)) => {
                    let element = XmlElement::from_start(e)?;
                    match stack.last_mut() {
                        Some(parent) => parent.push(element),
                        None => root = Some(element),
                    }
                },
                Ok(Event::End(_)) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| OoxmlError::Xml("unbalanced end tag".to_string()))?;
                    match stack.last_mut() {
                        Some(parent) => parent.push(element),
                        None => root = Some(element),
                    }
                },
                Ok(Event::Text(ref t)) => {
                    if let Some(current) = stack.last_mut() {
                        current.push_raw_text(std::str::from_utf8(t)?);
                    }
                },
                Ok(Event::GeneralRef(ref r)) => {
                    if let Some(current) = stack.last_mut() {
                        let name = std::str::from_utf8(r)?;
                        current.push_raw_text(&format!("&{};", name));
                    }
                },
                Ok(Event::CData(ref c)) => {
                    if let Some(current) = stack.last_mut() {
                        let data = std::str::from_utf8(c)?.to_string();
                        current.children.push(XmlNode::CData(data));
                    }
                },
                Ok(Event::Comment(ref c)) => {
                    if let Some(current) = stack.last_mut() {
                        let comment = std::str::from_utf8(c)?.to_string();
                        current.children.push(XmlNode::Comment(comment));
                    }
                },
                Ok(Event::PI(ref p)) => {
                    if let Some(current) = stack.last_mut() {
                        let pi = std::str::from_utf8(p)?.to_string();
                        current.children.push(XmlNode::ProcessingInstruction(pi));
                    }
                },
                Ok(Event::Eof) => break,
                Err(e) => return Err(e.into()),
                _ => {},
            }
            buf.clear();
        }

        if !stack.is_empty() {
            return Err(OoxmlError::Xml("unclosed element at end of input".to_string()));
        }
        root.map(Self::new)
            .ok_or_else(|| OoxmlError::Xml("no root element found".to_string()))
    }

    #[inline]
    pub fn root(&self) -> &XmlElement {
        &self.root
    }

    #[inline]
    pub fn root_mut(&mut self) -> &mut XmlElement {
        &mut self.root
    }

    /// Serialize with a standalone UTF-8 declaration.
    pub fn to_xml(&self) -> String {
        let mut out = String::with_capacity(4096);
        out.push_str(XML_DECLARATION);
        out.push('\n');
        self.root.write_into(&mut out);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CELL: &str = r#"<a:tc xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main"><a:txBody><a:bodyPr/><a:p><a:r><a:rPr lang="en-US" dirty="0"/><a:t>R&amp;D  &lt;x&gt;</a:t></a:r></a:p></a:txBody><a:tcPr/></a:tc>"#;

    #[test]
    fn test_round_trip_preserves_markup() {
        let doc = XmlDocument::parse(CELL.as_bytes()).unwrap();
        let xml = doc.to_xml();
        assert!(xml.starts_with(XML_DECLARATION));
        assert!(xml.ends_with(CELL));
    }

    #[test]
    fn test_text_is_unescaped() {
        let doc = XmlDocument::parse(CELL.as_bytes()).unwrap();
        assert_eq!(doc.root().text(), "R&D  <x>");
        assert_eq!(doc.root().find("t").unwrap().text(), "R&D  <x>");
    }

    #[test]
    fn test_names_and_lookup() {
        let doc = XmlDocument::parse(CELL.as_bytes()).unwrap();
        let root = doc.root();
        assert_eq!(root.name(), "a:tc");
        assert_eq!(root.prefix(), Some("a"));
        assert_eq!(root.local_name(), "tc");
        assert_eq!(root.sibling_name("tr"), "a:tr");
        assert!(root.child("txBody").is_some());
        assert!(root.child("p").is_none());
        assert_eq!(root.find("rPr").unwrap().attr("lang").as_deref(), Some("en-US"));
        assert_eq!(root.find_all("p").len(), 1);
    }

    #[test]
    fn test_attr_escaping() {
        let mut el = XmlElement::new("a:hlinkClick").with_attr("tooltip", "a \"b\" & c");
        let mut xml = String::new();
        el.write_into(&mut xml);
        assert_eq!(xml, r#"<a:hlinkClick tooltip="a &quot;b&quot; &amp; c"/>"#);
        assert_eq!(el.attr("tooltip").as_deref(), Some("a \"b\" & c"));

        el.set_attr("tooltip", "plain");
        el.remove_attr("missing");
        assert_eq!(el.attr("tooltip").as_deref(), Some("plain"));
    }

    #[test]
    fn test_insert_before_keeps_trailing_element_last() {
        let mut tree = XmlElement::new("p:spTree")
            .with_child(XmlElement::new("p:nvGrpSpPr"))
            .with_child(XmlElement::new("p:extLst"));
        tree.insert_before(XmlElement::new("p:sp"), "extLst");
        tree.insert_before(XmlElement::new("p:graphicFrame"), "extLst");

        let names: Vec<&str> = tree.elements().map(XmlElement::local_name).collect();
        assert_eq!(names, ["nvGrpSpPr", "sp", "graphicFrame", "extLst"]);

        let mut flat = XmlElement::new("p:spTree");
        flat.insert_before(XmlElement::new("p:sp"), "extLst");
        assert_eq!(flat.elements().count(), 1);
    }

    #[test]
    fn test_whitespace_text_survives() {
        let xml = br#"<a:p xmlns:a="x"><a:r><a:t>  leading</a:t></a:r>  <a:r><a:t> </a:t></a:r></a:p>"#;
        let doc = XmlDocument::parse(xml).unwrap();
        let texts: Vec<String> = doc.root().find_all("t").iter().map(|t| t.text()).collect();
        assert_eq!(texts, ["  leading", " "]);
        assert!(doc.to_xml().contains("</a:r>  <a:r>"));
    }

    #[test]
    fn test_find_all_mut_returns_outermost() {
        let xml = br#"<root><a:tbl><a:tr/></a:tbl><g><a:tbl><a:tr/><a:tr/></a:tbl></g></root>"#;
        let mut doc = XmlDocument::parse(xml).unwrap();
        let tables = doc.root_mut().find_all_mut("tbl");
        assert_eq!(tables.len(), 2);
        for table in tables {
            table.push(XmlElement::new("a:tr"));
        }
        let counts: Vec<usize> = doc
            .root()
            .find_all("tbl")
            .iter()
            .map(|t| t.children_named("tr").count())
            .collect();
        assert_eq!(counts, [2, 3]);
    }

    #[test]
    fn test_child_or_insert_first() {
        let mut p = XmlElement::new("a:p").with_child(XmlElement::new("a:r"));
        p.child_or_insert_first("pPr").set_attr("lvl", "1");
        p.child_or_insert_first("pPr").set_attr("algn", "l");

        let names: Vec<&str> = p.elements().map(XmlElement::name).collect();
        assert_eq!(names, ["a:pPr", "a:r"]);
        assert_eq!(p.child("pPr").unwrap().attr("algn").as_deref(), Some("l"));
    }

    #[test]
    fn test_malformed_input_is_rejected() {
        assert!(XmlDocument::parse(b"<a><b></a>").is_err());
        assert!(XmlDocument::parse(b"   ").is_err());
    }
}
