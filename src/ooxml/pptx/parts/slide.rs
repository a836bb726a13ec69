//! Slide parts and related types.
//!
//! This module contains read access to slides and the byte-level edits
//! composition makes to slide and slide master XML.

use crate::ooxml::error::{OoxmlError, Result};
use crate::ooxml::opc::part::Part;
use crate::ooxml::pptx::shapes::base::{ShapeTreeScan, TreeBounds, attr_u32, scan_shape_tree};
use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, Writer};
use std::collections::BTreeSet;

/// A slide part.
///
/// Corresponds to `/ppt/slides/slideN.xml` in the package.
pub struct SlidePart<'a> {
    /// The underlying OPC part
    part: &'a dyn Part,
}

impl<'a> SlidePart<'a> {
    pub fn from_part(part: &'a dyn Part) -> Result<Self> {
        Ok(Self { part })
    }

    #[inline]
    fn xml_bytes(&self) -> &[u8] {
        self.part.blob()
    }

    pub fn shape_tree(&self) -> Result<ShapeTreeOutline> {
        ShapeTreeOutline::parse(self.xml_bytes())
    }

    /// Concatenated text of every `<a:t>` run, paragraphs separated by newlines.
    pub fn text(&self) -> Result<String> {
        // no trimming: entity references split a run into several events
        let mut reader = Reader::from_reader(self.xml_bytes());

        let mut text = String::new();
        let mut in_text_element = false;

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) if e.local_name().as_ref() == b"t" => in_text_element = true,
                Ok(Event::Text(e)) if in_text_element => {
                    text.push_str(std::str::from_utf8(e.as_ref())?);
                },
                Ok(Event::GeneralRef(e)) if in_text_element => {
                    if let Some(ch) = e.resolve_char_ref()? {
                        text.push(ch);
                    } else {
                        let name = std::str::from_utf8(e.as_ref())?;
                        let resolved = resolve_predefined_entity(name).ok_or_else(|| {
                            OoxmlError::Xml(format!("unknown entity '&{name};'"))
                        })?;
                        text.push_str(resolved);
                    }
                },
                Ok(Event::End(e)) => match e.local_name().as_ref() {
                    b"t" => in_text_element = false,
                    b"p" if !text.is_empty() && !text.ends_with('\n') => text.push('\n'),
                    _ => {},
                },
                Ok(Event::Eof) => break,
                Err(e) => return Err(OoxmlError::Xml(e.to_string())),
                _ => {},
            }
        }

        Ok(text.trim_end().to_string())
    }
}

/// Location of a slide's shape tree plus the shape ids already in use.
#[derive(Debug, Clone)]
pub struct ShapeTreeOutline {
    scan: ShapeTreeScan,
    shape_ids: BTreeSet<u32>,
}

impl ShapeTreeOutline {
    /// Fails when the part has no `p:spTree`.
    pub fn parse(xml: &[u8]) -> Result<Self> {
        let scan = scan_shape_tree(xml)?
            .ok_or_else(|| OoxmlError::InvalidFormat("slide has no p:spTree".to_string()))?;
        Ok(Self {
            scan,
            shape_ids: collect_shape_ids(xml)?,
        })
    }

    /// Number of shapes that are direct children of the tree.
    #[inline]
    pub fn shape_count(&self) -> usize {
        self.scan.shapes.len()
    }

    /// Every `p:cNvPr/@id` in the part, nested groups included.
    #[inline]
    pub fn shape_ids(&self) -> &BTreeSet<u32> {
        &self.shape_ids
    }

    /// Copy of `xml` with `fragment` inserted as the last child of the tree.
    pub fn append(&self, xml: &[u8], fragment: &str) -> Vec<u8> {
        let mut out = Vec::with_capacity(xml.len() + fragment.len() + 32);

        match &self.scan.bounds {
            TreeBounds::Open { close_at } => {
                out.extend_from_slice(&xml[..*close_at]);
                out.extend_from_slice(fragment.as_bytes());
                out.extend_from_slice(&xml[*close_at..]);
            },
            TreeBounds::Empty { range, qname } => {
                out.extend_from_slice(&xml[..range.start]);
                out.push(b'<');
                out.extend_from_slice(qname.as_bytes());
                out.push(b'>');
                out.extend_from_slice(fragment.as_bytes());
                out.extend_from_slice(b"</");
                out.extend_from_slice(qname.as_bytes());
                out.push(b'>');
                out.extend_from_slice(&xml[range.end..]);
            },
        }

        out
    }
}

fn collect_shape_ids(xml: &[u8]) -> Result<BTreeSet<u32>> {
    let mut reader = Reader::from_reader(xml);
    let mut ids = BTreeSet::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) if e.local_name().as_ref() == b"cNvPr" => {
                if let Some(id) = attr_u32(&e, b"id")? {
                    ids.insert(id);
                }
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.into()),
            _ => {},
        }
    }

    Ok(ids)
}

/// Give every `p:sldLayoutId` of a slide master a new id.
///
/// Layout ids share one id space with slide master ids across the whole
/// presentation, so a master copied from another package is renumbered with
/// ids from the destination.
pub fn renumber_layout_ids(xml: &[u8], mut next_id: impl FnMut() -> u32) -> Result<Vec<u8>> {
    let mut reader = Reader::from_reader(xml);
    let mut writer = Writer::new(Vec::with_capacity(xml.len()));

    loop {
        match reader.read_event()? {
            Event::Empty(e) if e.local_name().as_ref() == b"sldLayoutId" => {
                writer.write_event(Event::Empty(with_id(&e, next_id())?))?;
            },
            Event::Start(e) if e.local_name().as_ref() == b"sldLayoutId" => {
                writer.write_event(Event::Start(with_id(&e, next_id())?))?;
            },
            Event::Eof => break,
            event => writer.write_event(event)?,
        }
    }

    Ok(writer.into_inner())
}

/// Ids of every `p:sldLayoutId` of a slide master.
pub fn layout_ids(xml: &[u8]) -> Result<Vec<u32>> {
    let mut reader = Reader::from_reader(xml);
    let mut ids = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"sldLayoutId" => {
                if let Some(id) = attr_u32(&e, b"id")? {
                    ids.push(id);
                }
            },
            Event::Eof => break,
            _ => {},
        }
    }

    Ok(ids)
}

fn with_id(e: &BytesStart<'_>, id: u32) -> Result<BytesStart<'static>> {
    let name = std::str::from_utf8(e.name().as_ref())?.to_string();
    let id = id.to_string();
    let mut out = BytesStart::new(name);

    for attr in e.attributes() {
        let attr = attr?;
        if attr.key.as_ref() == b"id" {
            out.push_attribute(("id", id.as_str()));
        } else {
            out.push_attribute(attr);
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::opc::constants::content_type as ct;
    use crate::ooxml::opc::packuri::PackURI;
    use crate::ooxml::opc::part::XmlPart;

    const SLIDE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<p:sld xmlns:a="a" xmlns:p="p"><p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/>
<p:sp><p:nvSpPr><p:cNvPr id="2" name="Title 1"/></p:nvSpPr><p:txBody><a:p><a:r><a:t>Hello &amp; welcome</a:t></a:r></a:p><a:p><a:r><a:t>second</a:t></a:r></a:p></p:txBody></p:sp>
<p:grpSp><p:nvGrpSpPr><p:cNvPr id="7" name="Group"/></p:nvGrpSpPr></p:grpSp>
</p:spTree></p:cSld></p:sld>"#;

    fn slide_part(xml: &str) -> XmlPart {
        XmlPart::new(
            PackURI::new("/ppt/slides/slide1.xml").unwrap(),
            ct::PML_SLIDE.to_string(),
            xml.as_bytes().to_vec(),
        )
    }

    #[test]
    fn test_outline() {
        let part = slide_part(SLIDE);
        let outline = SlidePart::from_part(&part).unwrap().shape_tree().unwrap();

        assert_eq!(outline.shape_count(), 2);
        assert_eq!(
            outline.shape_ids().iter().copied().collect::<Vec<_>>(),
            vec![1, 2, 7]
        );
    }

    #[test]
    fn test_append_is_last_child() {
        let outline = ShapeTreeOutline::parse(SLIDE.as_bytes()).unwrap();
        let updated = outline.append(SLIDE.as_bytes(), "<p:pic/>");
        let updated = String::from_utf8(updated).unwrap();

        assert!(updated.contains("</p:grpSp>\n<p:pic/></p:spTree>"));
        let reparsed = ShapeTreeOutline::parse(updated.as_bytes()).unwrap();
        assert_eq!(reparsed.shape_count(), 3);
    }

    #[test]
    fn test_append_to_empty_tree() {
        let xml = r#"<p:sld xmlns:p="p"><p:cSld><p:spTree/></p:cSld></p:sld>"#;
        let outline = ShapeTreeOutline::parse(xml.as_bytes()).unwrap();
        assert_eq!(outline.shape_count(), 0);

        let updated = outline.append(xml.as_bytes(), "<p:pic/>");
        assert_eq!(
            String::from_utf8(updated).unwrap(),
            r#"<p:sld xmlns:p="p"><p:cSld><p:spTree><p:pic/></p:spTree></p:cSld></p:sld>"#
        );
    }

    #[test]
    fn test_missing_tree_is_an_error() {
        assert!(matches!(
            ShapeTreeOutline::parse(b"<p:sld/>"),
            Err(OoxmlError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_text() {
        let part = slide_part(SLIDE);
        assert_eq!(
            SlidePart::from_part(&part).unwrap().text().unwrap(),
            "Hello & welcome\nsecond"
        );
    }

    #[test]
    fn test_renumber_layout_ids() {
        let master = br#"<p:sldMaster xmlns:p="p" xmlns:r="r"><p:sldLayoutIdLst><p:sldLayoutId id="2147483649" r:id="rId1"/><p:sldLayoutId id="2147483650" r:id="rId2"/></p:sldLayoutIdLst></p:sldMaster>"#;
        let mut next = 3_000_000_000u32;
        let out = renumber_layout_ids(master, || {
            next += 1;
            next
        })
        .unwrap();
        let out = String::from_utf8(out).unwrap();

        assert!(out.contains(r#"<p:sldLayoutId id="3000000001" r:id="rId1"/>"#));
        assert!(out.contains(r#"<p:sldLayoutId id="3000000002" r:id="rId2"/>"#));
        assert_eq!(
            layout_ids(out.as_bytes()).unwrap(),
            vec![3_000_000_001, 3_000_000_002]
        );
    }
}
