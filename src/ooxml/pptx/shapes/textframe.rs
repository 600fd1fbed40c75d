/// Text frame editing for shapes and table cells.
///
/// A text frame is a `p:txBody` (shapes) or `a:txBody` (table cells): body
/// properties, an optional list style and one or more `a:p` paragraphs.
use crate::ooxml::xmltree::{XmlElement, XmlNode};

/// Vertical tab, the in-memory form of a soft line break (`a:br`).
const LINE_BREAK: char = '\u{b}';

/// Paragraph-level formatting applied by [`TextFrameMut::add_paragraph`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParagraphFormat {
    /// Outline level, 0 to 8
    pub level: u8,
    pub bold: bool,
    /// Font size in whole points
    pub size_pt: Option<u16>,
    /// Suppress the bullet inherited from the placeholder
    pub no_bullet: bool,
}

impl ParagraphFormat {
    pub fn level(level: u8) -> Self {
        Self {
            level,
            ..Self::default()
        }
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn size(mut self, size_pt: u16) -> Self {
        self.size_pt = Some(size_pt);
        self
    }

    pub fn no_bullet(mut self) -> Self {
        self.no_bullet = true;
        self
    }
}

/// Plain text of a text body: paragraphs joined with "\n".
pub fn text_of(body: &XmlElement) -> String {
    body.children_named("p")
        .map(paragraph_text)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Plain text of a single `a:p`.
pub fn paragraph_text(paragraph: &XmlElement) -> String {
    let mut text = String::new();
    for child in paragraph.elements() {
        match child.local_name() {
            "r" | "fld" => {
                if let Some(t) = child.child("t") {
                    text.push_str(&t.text());
                }
            },
            "br" => text.push(LINE_BREAK),
            _ => {},
        }
    }
    text
}

/// Mutable view of a text body element.
#[derive(Debug)]
pub struct TextFrameMut<'a> {
    body: &'a mut XmlElement,
}

impl<'a> TextFrameMut<'a> {
    pub fn new(body: &'a mut XmlElement) -> Self {
        Self { body }
    }

    pub fn text(&self) -> String {
        text_of(self.body)
    }

    pub fn paragraph_count(&self) -> usize {
        self.body.children_named("p").count()
    }

    /// Texts of each paragraph in order.
    pub fn paragraph_texts(&self) -> Vec<String> {
        self.body.children_named("p").map(paragraph_text).collect()
    }

    /// Replace the whole text, one paragraph per "\n"-separated line.
    ///
    /// Every new paragraph copies the first paragraph's `a:pPr` and every run
    /// the first run's `a:rPr`, so the frame keeps its look.
    pub fn set_text(&mut self, text: &str) {
        let paragraph_props = self
            .body
            .child("p")
            .and_then(|p| p.child("pPr"))
            .cloned();
        let run_props = self.body.find("r").and_then(|r| r.child("rPr")).cloned();
        let end_props = self
            .body
            .child("p")
            .and_then(|p| p.child("endParaRPr"))
            .cloned();

        self.body.retain_elements(|el| el.local_name() != "p");
        for line in text.split('\n') {
            let mut paragraph = XmlElement::new(self.dml_name("p"));
            if let Some(ppr) = &paragraph_props {
                paragraph.push(ppr.clone());
            }
            if line.is_empty() {
                if let Some(end) = &end_props {
                    paragraph.push(end.clone());
                }
            } else {
                for run in text_runs(&paragraph, line, run_props.as_ref()) {
                    paragraph.push(run);
                }
            }
            self.body.push(paragraph);
        }
    }

    /// Keep only the first paragraph, emptied of its runs but not of its
    /// paragraph properties.
    pub fn clear(&mut self) {
        let mut seen_first = false;
        self.body.retain_elements(|el| {
            if el.local_name() != "p" {
                return true;
            }
            let keep = !seen_first;
            seen_first = true;
            keep
        });

        if self.body.child("p").is_none() {
            let paragraph = XmlElement::new(self.dml_name("p"));
            self.body.push(paragraph);
        } else if let Some(first) = self.body.child_mut("p") {
            first.retain_elements(|el| el.local_name() == "pPr");
        }
    }

    /// Write `text` into the first paragraph (as left by [`clear`](Self::clear))
    /// and apply `format` to it.
    pub fn set_first_paragraph(&mut self, text: &str, format: ParagraphFormat) {
        if self.body.child("p").is_none() {
            let paragraph = XmlElement::new(self.dml_name("p"));
            self.body.push(paragraph);
        }
        if let Some(first) = self.body.child_mut("p") {
            first.retain_elements(|el| el.local_name() == "pPr");
            apply_format(first, format);
            for run in text_runs(first, text, None) {
                first.push(run);
            }
            format_run(first, format);
        }
    }

    /// Append a formatted paragraph holding `text`.
    pub fn add_paragraph(&mut self, text: &str, format: ParagraphFormat) {
        let mut paragraph = XmlElement::new(self.dml_name("p"));
        apply_format(&mut paragraph, format);
        if !text.is_empty() {
            for run in text_runs(&paragraph, text, None) {
                paragraph.push(run);
            }
            format_run(&mut paragraph, format);
        }
        self.body.push(paragraph);
    }

    /// Append an empty paragraph.
    pub fn add_empty_paragraph(&mut self) {
        let paragraph = XmlElement::new(self.dml_name("p"));
        self.body.push(paragraph);
    }

    /// Rewrite every paragraph for which `rewrite` returns a new text.
    ///
    /// A rewritten paragraph keeps its `a:pPr` and the `a:rPr` of its first
    /// run; line breaks read back as `a:br`. Returns the number of paragraphs
    /// changed.
    pub fn rewrite_paragraphs<F>(&mut self, mut rewrite: F) -> usize
    where
        F: FnMut(&str) -> Option<String>,
    {
        let mut changed = 0;

        for paragraph in self.body.children_named_mut("p") {
            let Some(new_text) = rewrite(&paragraph_text(paragraph)) else {
                continue;
            };
            let run_props = paragraph
                .child("r")
                .and_then(|r| r.child("rPr"))
                .cloned();
            paragraph.retain_elements(|el| matches!(el.local_name(), "pPr" | "endParaRPr"));

            for run in text_runs(paragraph, &new_text, run_props.as_ref()) {
                paragraph.insert_before(run, "endParaRPr");
            }
            changed += 1;
        }
        changed
    }

    /// Qualified DrawingML name, using the prefix the body's children use.
    fn dml_name(&self, local: &str) -> String {
        self.body
            .elements()
            .next()
            .map_or_else(|| format!("a:{}", local), |el| el.sibling_name(local))
    }
}

/// Runs holding `text` for a paragraph, one `a:br` per line break.
///
/// Element names take the prefix of `paragraph`; every run and break gets a
/// copy of `run_props`.
fn text_runs(paragraph: &XmlElement, text: &str, run_props: Option<&XmlElement>) -> Vec<XmlElement> {
    let mut runs = Vec::new();
    for (i, segment) in text.split(LINE_BREAK).enumerate() {
        if i > 0 {
            let mut br = XmlElement::new(paragraph.sibling_name("br"));
            if let Some(rpr) = run_props {
                br.push(rpr.clone());
            }
            runs.push(br);
        }
        if segment.is_empty() {
            continue;
        }
        let mut run = XmlElement::new(paragraph.sibling_name("r"));
        if let Some(rpr) = run_props {
            run.push(rpr.clone());
        }
        run.push(XmlElement::new(paragraph.sibling_name("t")).with_text(segment));
        runs.push(run);
    }
    runs
}

/// Set level, bullet and default run properties on a paragraph's `a:pPr`.
fn apply_format(paragraph: &mut XmlElement, format: ParagraphFormat) {
    let def_rpr_name = paragraph.sibling_name("defRPr");
    let bu_none_name = paragraph.sibling_name("buNone");
    let ppr = paragraph.child_or_insert_first("pPr");

    if format.level == 0 {
        ppr.remove_attr("lvl");
    } else {
        ppr.set_attr("lvl", &format.level.to_string());
    }

    if format.no_bullet && ppr.child("buNone").is_none() {
        ppr.children_mut()
            .insert(0, XmlNode::Element(XmlElement::new(bu_none_name)));
    }

    if format.bold || format.size_pt.is_some() {
        if ppr.child("defRPr").is_none() {
            ppr.insert_before(XmlElement::new(def_rpr_name), "extLst");
        }
        if let Some(def_rpr) = ppr.child_mut("defRPr") {
            set_font_attrs(def_rpr, format);
        }
    }
}

/// Mirror the size and weight of `format` onto the runs of a paragraph.
fn format_run(paragraph: &mut XmlElement, format: ParagraphFormat) {
    if !format.bold && format.size_pt.is_none() {
        return;
    }
    for run in paragraph.children_named_mut("r") {
        set_font_attrs(run.child_or_insert_first("rPr"), format);
    }
}

fn set_font_attrs(props: &mut XmlElement, format: ParagraphFormat) {
    if let Some(size_pt) = format.size_pt {
        props.set_attr("sz", &(u32::from(size_pt) * 100).to_string());
    }
    if format.bold {
        props.set_attr("b", "1");
    }
}
