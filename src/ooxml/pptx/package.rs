/// Package implementation for PowerPoint presentations.
use crate::ooxml::error::{OoxmlError, Result};
use crate::ooxml::opc::OpcPackage;
use crate::ooxml::opc::constants::{content_type as ct, relationship_type as rt};
use crate::ooxml::opc::packuri::PackURI;
use crate::ooxml::opc::part::{Part, XmlPart};
use crate::ooxml::pptx::parts::PresentationPart;
use crate::ooxml::pptx::slide::Slide;
use std::io::{Read, Seek};
use std::path::Path;

/// Partname template for new slide parts.
const SLIDE_PARTNAME_TEMPLATE: &str = "/ppt/slides/slide%d.xml";

/// A PowerPoint (.pptx) package.
///
/// Wraps an OPC package and adds the presentation-level operations report
/// generation needs: slide ordering, slide editing and slide duplication.
///
/// ```rust,no_run
/// use statusdeck::ooxml::pptx::Package;
///
/// let mut pkg = Package::open("template.pptx")?;
/// let slides = pkg.slide_partnames()?;
/// let copy = pkg.duplicate_slide(&slides[0], &slides[0])?;
/// pkg.save("out.pptx")?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct Package {
    /// The underlying OPC package
    opc: OpcPackage,
    /// Partname of presentation.xml
    presentation: PackURI,
}

impl Package {
    /// Open a .pptx package from a file path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_opc(OpcPackage::open(path)?)
    }

    /// Create a .pptx package from a reader.
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        Self::from_opc(OpcPackage::from_reader(reader)?)
    }

    /// Verify the main part is a presentation and wrap the package.
    fn from_opc(opc: OpcPackage) -> Result<Self> {
        let main_part = opc
            .main_document_part()
            .map_err(|e| OoxmlError::PartNotFound(format!("main presentation part: {}", e)))?;

        let content_type = main_part.content_type();
        // Support both regular and macro-enabled presentations, and templates
        if content_type != ct::PML_PRESENTATION_MAIN
            && content_type != ct::PML_PRES_MACRO_MAIN
            && content_type != ct::PML_TEMPLATE_MAIN
        {
            return Err(OoxmlError::InvalidContentType {
                expected: format!(
                    "{} or {}",
                    ct::PML_PRESENTATION_MAIN,
                    ct::PML_PRES_MACRO_MAIN
                ),
                got: content_type.to_string(),
            });
        }

        let presentation = main_part.partname().clone();
        Ok(Self { opc, presentation })
    }

    fn presentation_part(&self) -> Result<PresentationPart> {
        PresentationPart::parse(self.opc.get_part(&self.presentation)?.blob())
    }

    /// Slide partnames in presentation order.
    pub fn slide_partnames(&self) -> Result<Vec<PackURI>> {
        let pres = self.opc.get_part(&self.presentation)?;
        self.presentation_part()?
            .slide_ids()
            .iter()
            .map(|slide| pres.related_partname(&slide.r_id).map_err(OoxmlError::from))
            .collect()
    }

    pub fn slide_count(&self) -> Result<usize> {
        Ok(self.presentation_part()?.slide_ids().len())
    }

    /// Parse a slide for editing.
    pub fn slide(&self, partname: &PackURI) -> Result<Slide> {
        let part = self.opc.get_part(partname)?;
        Slide::parse(partname.clone(), part.blob())
    }

    /// Write an edited slide back into its part.
    pub fn store_slide(&mut self, slide: &Slide) -> Result<()> {
        let part = self.opc.get_part_mut(slide.partname())?;
        part.set_blob(slide.to_xml().into_bytes());
        Ok(())
    }

    /// Duplicate `source` into a new slide placed right after `after`.
    ///
    /// The new part gets a deep copy of every shape and all of the source's
    /// relationships under the same ids, except notes and comments, which
    /// belong to one slide only. Returns the new slide's partname.
    pub fn duplicate_slide(&mut self, source: &PackURI, after: &PackURI) -> Result<PackURI> {
        let source_slide = self.slide(source)?;
        let source_part = self.opc.get_part(source)?;
        let partname = self.opc.next_partname(SLIDE_PARTNAME_TEMPLATE)?;

        let tree = source_slide.duplicate_tree()?;
        let mut part = XmlPart::new(
            partname.clone(),
            ct::PML_SLIDE.to_string(),
            tree.to_xml().into_bytes(),
        );
        for rel in source_part
            .rels()
            .iter()
            .filter(|rel| rel.reltype() != rt::NOTES_SLIDE && rel.reltype() != rt::COMMENTS)
        {
            part.rels_mut().add_relationship(
                rel.reltype().to_string(),
                rel.target_ref().to_string(),
                rel.r_id().to_string(),
                rel.is_external(),
            );
        }
        self.opc.add_part(Box::new(part));

        let pres = self.opc.get_part_mut(&self.presentation)?;
        let anchor_r_id = pres
            .rels()
            .iter()
            .find(|rel| {
                rel.reltype() == rt::SLIDE
                    && rel.target_partname().is_ok_and(|target| &target == after)
            })
            .map(|rel| rel.r_id().to_string())
            .unwrap_or_default();
        let r_id = pres.relate_to(&partname, rt::SLIDE);

        let mut pres_xml = PresentationPart::parse(pres.blob())?;
        let slide_id = pres_xml.insert_slide_after(&anchor_r_id, &r_id)?;
        pres.set_blob(pres_xml.to_xml().into_bytes());

        log::debug!(
            "duplicated {} as {} (id {}, {}) after {}",
            source,
            partname,
            slide_id,
            r_id,
            after
        );
        Ok(partname)
    }

    /// Serialize the package to .pptx bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(self.opc.to_bytes()?)
    }

    /// Write the package to `path`.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        Ok(self.opc.save(path)?)
    }

    /// Get the underlying OPC package.
    #[inline]
    pub fn opc_package(&self) -> &OpcPackage {
        &self.opc
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use zip::ZipWriter;
    use zip::write::SimpleFileOptions;

    const SLIDE_WITH_TABLE: &str = r#"<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/><p:pic><p:blipFill><a:blip r:embed="rId2"/></p:blipFill></p:pic><p:graphicFrame><a:graphic><a:graphicData><a:tbl><a:tr><a:tc><a:txBody><a:bodyPr/><a:p><a:r><a:t>Project</a:t></a:r></a:p></a:txBody></a:tc></a:tr><a:tr><a:tc><a:txBody><a:bodyPr/><a:p/></a:txBody></a:tc></a:tr></a:tbl></a:graphicData></a:graphic></p:graphicFrame></p:spTree></p:cSld></p:sld>"#;

    /// Two-slide presentation: slide1 has a picture and a table, plus notes.
    fn two_slide_pptx() -> Vec<u8> {
        let mut zip_data = Vec::new();
        {
            let mut writer = ZipWriter::new(Cursor::new(&mut zip_data));
            let options = SimpleFileOptions::default();
            let mut add = |name: &str, body: &str| {
                writer.start_file(name, options).unwrap();
                writer.write_all(body.as_bytes()).unwrap();
            };

            add("[Content_Types].xml", r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Default Extension="png" ContentType="image/png"/><Override PartName="/ppt/presentation.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml"/><Override PartName="/ppt/slides/slide1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slide+xml"/><Override PartName="/ppt/slides/slide2.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slide+xml"/><Override PartName="/ppt/notesSlides/notesSlide1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.notesSlide+xml"/></Types>"#);
            add("_rels/.rels", r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="ppt/presentation.xml"/></Relationships>"#);
            add("ppt/presentation.xml", r#"<p:presentation xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><p:sldIdLst><p:sldId id="256" r:id="rId2"/><p:sldId id="257" r:id="rId3"/></p:sldIdLst></p:presentation>"#);
            add("ppt/_rels/presentation.xml.rels", r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide" Target="slides/slide1.xml"/><Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide" Target="slides/slide2.xml"/></Relationships>"#);
            add("ppt/slides/slide1.xml", SLIDE_WITH_TABLE);
            add("ppt/slides/_rels/slide1.xml.rels", r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="../media/image1.png"/><Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/notesSlide" Target="../notesSlides/notesSlide1.xml"/></Relationships>"#);
            add("ppt/slides/slide2.xml", r#"<p:sld xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><p:cSld><p:spTree><p:nvGrpSpPr/><p:grpSpPr/></p:spTree></p:cSld></p:sld>"#);
            add("ppt/media/image1.png", "png");
            add("ppt/notesSlides/notesSlide1.xml", r#"<p:notes xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"/>"#);

            writer.finish().unwrap();
        }
        zip_data
    }

    fn open() -> Package {
        Package::from_reader(Cursor::new(two_slide_pptx())).unwrap()
    }

    #[test]
    fn test_slide_partnames_follow_presentation_order() {
        let pkg = open();
        let names: Vec<String> = pkg.slide_partnames().unwrap().iter().map(|p| p.to_string()).collect();
        assert_eq!(names, ["/ppt/slides/slide1.xml", "/ppt/slides/slide2.xml"]);
        assert_eq!(pkg.slide_count().unwrap(), 2);
    }

    #[test]
    fn test_duplicate_slide_is_placed_after_anchor() {
        let mut pkg = open();
        let slides = pkg.slide_partnames().unwrap();

        let copy = pkg.duplicate_slide(&slides[0], &slides[0]).unwrap();
        assert_eq!(copy.as_str(), "/ppt/slides/slide3.xml");
        let second = pkg.duplicate_slide(&slides[0], &copy).unwrap();

        let order: Vec<String> = pkg.slide_partnames().unwrap().iter().map(|p| p.to_string()).collect();
        assert_eq!(
            order,
            ["/ppt/slides/slide1.xml", "/ppt/slides/slide3.xml", "/ppt/slides/slide4.xml", "/ppt/slides/slide2.xml"]
        );
        assert_eq!(second.as_str(), "/ppt/slides/slide4.xml");
    }

    #[test]
    fn test_duplicate_slide_copies_relationships_except_notes() {
        let mut pkg = open();
        let slides = pkg.slide_partnames().unwrap();
        let copy = pkg.duplicate_slide(&slides[0], &slides[0]).unwrap();

        let part = pkg.opc_package().get_part(&copy).unwrap();
        assert_eq!(part.rels().len(), 1);
        assert_eq!(part.related_partname("rId2").unwrap().as_str(), "/ppt/media/image1.png");
        assert!(part.rels().get("rId3").is_none());
    }

    #[test]
    fn test_duplicate_is_independent_and_survives_save() {
        use crate::ooxml::pptx::slide::TableLocator;

        let mut pkg = open();
        let slides = pkg.slide_partnames().unwrap();
        let copy = pkg.duplicate_slide(&slides[0], &slides[0]).unwrap();

        let mut dup = pkg.slide(&copy).unwrap();
        assert_eq!(dup.shape_kinds(), pkg.slide(&slides[0]).unwrap().shape_kinds());
        dup.find_table_by_header_substring("project").unwrap().grow_rows_to(6);
        pkg.store_slide(&dup).unwrap();

        let reopened = Package::from_reader(Cursor::new(pkg.to_bytes().unwrap())).unwrap();
        let mut original = reopened.slide(&slides[0]).unwrap();
        let mut duplicate = reopened.slide(&copy).unwrap();
        assert_eq!(original.find_table_by_header_substring("project").unwrap().row_count(), 2);
        assert_eq!(duplicate.find_table_by_header_substring("project").unwrap().row_count(), 6);
        assert_eq!(reopened.slide_count().unwrap(), 3);
    }

    #[test]
    fn test_rejects_non_presentation() {
        let mut zip_data = Vec::new();
        {
            let mut writer = ZipWriter::new(Cursor::new(&mut zip_data));
            let options = SimpleFileOptions::default();
            writer.start_file("[Content_Types].xml", options).unwrap();
            writer.write_all(br#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#).unwrap();
            writer.start_file("_rels/.rels", options).unwrap();
            writer.write_all(br#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#).unwrap();
            writer.start_file("word/document.xml", options).unwrap();
            writer.write_all(b"<w:document xmlns:w=\"w\"/>").unwrap();
            writer.finish().unwrap();
        }

        let result = Package::from_reader(Cursor::new(zip_data));
        assert!(matches!(result, Err(OoxmlError::InvalidContentType { .. })));
    }
}
