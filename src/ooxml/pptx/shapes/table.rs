/// Table shape editing for PowerPoint presentations.
///
/// Tables in PowerPoint are DrawingML tables (`a:tbl`) contained within
/// graphic frames. They contain rows (`a:tr`), which contain cells (`a:tc`),
/// each with its own text body.
use crate::ooxml::error::{OoxmlError, Result};
use crate::ooxml::pptx::shapes::textframe::{TextFrameMut, text_of};
use crate::ooxml::xmltree::{XmlElement, XmlNode};

/// Result of [`TableMut::grow_rows_to`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrowOutcome {
    /// The table already had enough rows.
    Unchanged,
    /// `added` rows were cloned from the template row.
    Grown { added: usize },
    /// The table has no rows to clone from; nothing was changed.
    NoTemplateRow,
}

/// Mutable view of an `a:tbl` element.
#[derive(Debug)]
pub struct TableMut<'a> {
    tbl: &'a mut XmlElement,
}

impl<'a> TableMut<'a> {
    pub fn new(tbl: &'a mut XmlElement) -> Self {
        Self { tbl }
    }

    pub fn row_count(&self) -> usize {
        self.tbl.children_named("tr").count()
    }

    /// Number of grid columns, or the widest row when the grid is missing.
    pub fn column_count(&self) -> usize {
        let grid = self
            .tbl
            .child("tblGrid")
            .map_or(0, |grid| grid.children_named("gridCol").count());
        if grid > 0 {
            return grid;
        }
        self.tbl
            .children_named("tr")
            .map(|tr| tr.children_named("tc").count())
            .max()
            .unwrap_or(0)
    }

    fn cell(&self, row: usize, col: usize) -> Option<&XmlElement> {
        self.tbl
            .children_named("tr")
            .nth(row)
            .and_then(|tr| tr.children_named("tc").nth(col))
    }

    pub fn cell_text(&self, row: usize, col: usize) -> Option<String> {
        self.cell(row, col)
            .map(|tc| tc.child("txBody").map(text_of).unwrap_or_default())
    }

    /// Texts of the header row (row 0).
    pub fn header_texts(&self) -> Vec<String> {
        self.tbl
            .child("tr")
            .map(|tr| {
                tr.children_named("tc")
                    .map(|tc| tc.child("txBody").map(text_of).unwrap_or_default())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Whether any header cell contains `needle`, ignoring case.
    pub fn header_contains(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.header_texts()
            .iter()
            .any(|text| text.to_lowercase().contains(&needle))
    }

    /// Replace the text of one cell, keeping its paragraph and run formatting.
    pub fn set_cell_text(&mut self, row: usize, col: usize, text: &str) -> Result<()> {
        let rows = self.row_count();
        let tc = self
            .tbl
            .children_named_mut("tr")
            .nth(row)
            .and_then(|tr| tr.children_named_mut("tc").nth(col))
            .ok_or_else(|| {
                OoxmlError::InvalidFormat(format!(
                    "cell ({}, {}) is outside a table with {} rows",
                    row, col, rows
                ))
            })?;

        if tc.child("txBody").is_none() {
            let body = new_cell_body(tc);
            tc.insert_before(body, "tcPr");
        }
        if let Some(body) = tc.child_mut("txBody") {
            TextFrameMut::new(body).set_text(text);
        }
        Ok(())
    }

    /// Grow the table to at least `target` rows by cloning the template row.
    ///
    /// The template row is row 1 when present, otherwise the header row 0.
    /// Existing rows are never removed or modified, so calling this again
    /// with the same target changes nothing.
    pub fn grow_rows_to(&mut self, target: usize) -> GrowOutcome {
        let existing = self.row_count();
        if existing == 0 {
            log::warn!("table has no rows to clone; leaving it unchanged");
            return GrowOutcome::NoTemplateRow;
        }
        if existing >= target {
            return GrowOutcome::Unchanged;
        }

        // Known quirk: a header-only table clones its header row.
        let template_index = if existing > 1 { 1 } else { 0 };
        let Some(mut template) = self.tbl.children_named("tr").nth(template_index).cloned() else {
            return GrowOutcome::NoTemplateRow;
        };
        // Row-level extensions carry a unique row id that must not be duplicated.
        template.retain_elements(|el| el.local_name() != "extLst");

        let insert_at = self
            .tbl
            .children()
            .iter()
            .rposition(|node| matches!(node, XmlNode::Element(el) if el.local_name() == "tr"))
            .map_or(self.tbl.children().len(), |pos| pos + 1);

        let added = target - existing;
        let children = self.tbl.children_mut();
        let tail = children.split_off(insert_at);
        children.extend(std::iter::repeat_n(template, added).map(XmlNode::Element));
        children.extend(tail);

        GrowOutcome::Grown { added }
    }
}

/// Minimal text body for a cell that has none.
fn new_cell_body(tc: &XmlElement) -> XmlElement {
    XmlElement::new(tc.sibling_name("txBody"))
        .with_child(XmlElement::new(tc.sibling_name("bodyPr")))
        .with_child(XmlElement::new(tc.sibling_name("lstStyle")))
        .with_child(XmlElement::new(tc.sibling_name("p")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::xmltree::XmlDocument;
    use proptest::prelude::*;

    fn row(texts: &[&str]) -> String {
        let cells: String = texts
            .iter()
            .map(|t| {
                format!(
                    r#"<a:tc><a:txBody><a:bodyPr/><a:lstStyle/><a:p><a:r><a:rPr lang="en-US" sz="1000"/><a:t>{}</a:t></a:r></a:p></a:txBody><a:tcPr/></a:tc>"#,
                    t
                )
            })
            .collect();
        format!(r#"<a:tr h="370840">{}<a:extLst><a:ext uri="x"><a16:rowId val="1"/></a:ext></a:extLst></a:tr>"#, cells)
    }

    fn table(rows: &[&[&str]]) -> XmlDocument {
        let body: String = rows.iter().map(|r| row(r)).collect();
        let xml = format!(
            r#"<a:tbl xmlns:a="a" xmlns:a16="b"><a:tblPr firstRow="1"/><a:tblGrid><a:gridCol w="1"/><a:gridCol w="2"/></a:tblGrid>{}</a:tbl>"#,
            body
        );
        XmlDocument::parse(xml.as_bytes()).unwrap()
    }

    #[test]
    fn test_shape_queries() {
        let mut doc = table(&[&["Project ID", "Status"], &["", ""]]);
        let t = TableMut::new(doc.root_mut());
        assert_eq!(t.row_count(), 2);
        assert_eq!(t.column_count(), 2);
        assert_eq!(t.header_texts(), ["Project ID", "Status"]);
        assert!(t.header_contains("project"));
        assert!(t.header_contains("STATUS"));
        assert!(!t.header_contains("teach"));
        assert_eq!(t.cell_text(0, 1).as_deref(), Some("Status"));
        assert_eq!(t.cell_text(5, 0), None);
    }

    #[test]
    fn test_grow_clones_row_one() {
        let mut doc = table(&[&["Project", "Status"], &["template", "body"]]);
        let mut t = TableMut::new(doc.root_mut());

        assert_eq!(t.grow_rows_to(4), GrowOutcome::Grown { added: 2 });
        assert_eq!(t.row_count(), 4);
        assert_eq!(t.cell_text(3, 0).as_deref(), Some("template"));
        assert_eq!(t.cell_text(0, 0).as_deref(), Some("Project"));
        assert_eq!(t.grow_rows_to(4), GrowOutcome::Unchanged);
        assert_eq!(t.grow_rows_to(2), GrowOutcome::Unchanged);

        let xml = doc.to_xml();
        assert_eq!(xml.matches("a16:rowId").count(), 2);
        assert!(xml.contains(r#"<a:tr h="370840"><a:tc>"#));
    }

    #[test]
    fn test_grow_header_only_table_clones_header() {
        let mut doc = table(&[&["Learnings", "x"]]);
        let mut t = TableMut::new(doc.root_mut());
        assert_eq!(t.grow_rows_to(3), GrowOutcome::Grown { added: 2 });
        assert_eq!(t.cell_text(2, 0).as_deref(), Some("Learnings"));
    }

    #[test]
    fn test_grow_empty_table_is_refused() {
        let mut doc = table(&[]);
        let mut t = TableMut::new(doc.root_mut());
        assert_eq!(t.grow_rows_to(3), GrowOutcome::NoTemplateRow);
        assert_eq!(t.row_count(), 0);
    }

    #[test]
    fn test_set_cell_text() {
        let mut doc = table(&[&["Project", "Status"], &["", ""]]);
        let mut t = TableMut::new(doc.root_mut());
        t.set_cell_text(1, 1, "\n- did X\n- did Y").unwrap();
        assert_eq!(t.cell_text(1, 1).as_deref(), Some("\n- did X\n- did Y"));
        assert!(t.set_cell_text(1, 2, "nope").is_err());
        assert!(t.set_cell_text(2, 0, "nope").is_err());

        let xml = doc.to_xml();
        assert!(xml.contains(r#"<a:r><a:rPr lang="en-US" sz="1000"/><a:t>- did Y</a:t></a:r>"#));
    }

    #[test]
    fn test_set_cell_text_without_body() {
        let xml = r#"<a:tbl xmlns:a="a"><a:tr><a:tc><a:tcPr/></a:tc></a:tr></a:tbl>"#;
        let mut doc = XmlDocument::parse(xml.as_bytes()).unwrap();
        let mut t = TableMut::new(doc.root_mut());
        t.set_cell_text(0, 0, "Teach").unwrap();
        assert_eq!(t.cell_text(0, 0).as_deref(), Some("Teach"));
        assert!(doc.to_xml().contains("<a:tc><a:txBody><a:bodyPr/><a:lstStyle/><a:p><a:r><a:t>Teach</a:t></a:r></a:p></a:txBody><a:tcPr/></a:tc>"));
    }

    proptest! {
        #[test]
        fn prop_grow_is_monotonic_and_idempotent(existing in 1usize..6, target in 0usize..20) {
            let rows: Vec<Vec<String>> = (0..existing)
                .map(|i| vec![format!("r{}", i), String::new()])
                .collect();
            let rows_ref: Vec<Vec<&str>> = rows.iter().map(|r| r.iter().map(String::as_str).collect()).collect();
            let slices: Vec<&[&str]> = rows_ref.iter().map(Vec::as_slice).collect();
            let mut doc = table(&slices);
            let header_before = TableMut::new(doc.root_mut()).header_texts();

            let mut t = TableMut::new(doc.root_mut());
            t.grow_rows_to(target);
            let after_first = t.row_count();
            prop_assert_eq!(after_first, existing.max(target));
            prop_assert_eq!(t.grow_rows_to(target), GrowOutcome::Unchanged);
            prop_assert_eq!(t.row_count(), after_first);
            prop_assert_eq!(t.header_texts(), header_before);
        }
    }
}
