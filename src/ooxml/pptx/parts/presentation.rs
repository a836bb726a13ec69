//! Presentation part - the main part in a .pptx package.
//!
//! Corresponds to `/ppt/presentation.xml` in the package.

use crate::ooxml::error::{OoxmlError, Result};
use crate::ooxml::opc::constants::namespace;
use crate::ooxml::opc::part::Part;
use crate::ooxml::pptx::geometry::Size;
use crate::ooxml::pptx::shapes::base::{attr_i64, attr_u32};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::fmt::Write as _;

/// Default slide size (4:3, 10in x 7.5in).
pub const DEFAULT_SLIDE_SIZE: Size = Size {
    cx: 9_144_000,
    cy: 6_858_000,
};

/// Default notes page size (7.5in x 10in).
pub const DEFAULT_NOTES_SIZE: Size = Size {
    cx: 6_858_000,
    cy: 9_144_000,
};

/// One entry of `p:sldIdLst` or `p:sldMasterIdLst`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdListEntry {
    /// Numeric `id` attribute (0 when absent, as in `p:notesMasterId`)
    pub id: u32,
    /// `r:id` of the presentation relationship to the part
    pub r_id: String,
}

/// Read-only view of the main presentation part.
///
/// # Example
///
/// ```rust,ignore
/// let pres_part = PresentationPart::from_part(opc_part)?;
/// let slide_count = pres_part.slide_count()?;
/// ```
pub struct PresentationPart<'a> {
    /// The underlying OPC part
    part: &'a dyn Part,
}

impl<'a> PresentationPart<'a> {
    pub fn from_part(part: &'a dyn Part) -> Result<Self> {
        Ok(Self { part })
    }

    #[inline]
    fn xml_bytes(&self) -> &[u8] {
        self.part.blob()
    }

    /// Entries of an id list element (`sldId`, `sldMasterId`), in document order.
    fn id_entries(&self, element: &[u8]) -> Result<Vec<IdListEntry>> {
        let mut reader = Reader::from_reader(self.xml_bytes());
        reader.config_mut().trim_text(true);

        let mut entries = Vec::new();
        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                    if e.local_name().as_ref() == element {
                        if let Some(r_id) = relationship_attr(&e)? {
                            entries.push(IdListEntry {
                                id: attr_u32(&e, b"id")?.unwrap_or(0),
                                r_id,
                            });
                        }
                    }
                },
                Ok(Event::Eof) => break,
                Err(e) => return Err(OoxmlError::Xml(e.to_string())),
                _ => {},
            }
        }

        Ok(entries)
    }

    /// Slides in presentation order.
    pub fn slide_entries(&self) -> Result<Vec<IdListEntry>> {
        self.id_entries(b"sldId")
    }

    /// Relationship IDs of all slides in presentation order.
    pub fn slide_rids(&self) -> Result<Vec<String>> {
        Ok(self
            .slide_entries()?
            .into_iter()
            .map(|entry| entry.r_id)
            .collect())
    }

    /// Number of `<p:sldId>` elements.
    pub fn slide_count(&self) -> Result<usize> {
        Ok(self.slide_entries()?.len())
    }

    /// Slide masters in document order.
    pub fn master_entries(&self) -> Result<Vec<IdListEntry>> {
        self.id_entries(b"sldMasterId")
    }

    fn size_of(&self, element: &[u8]) -> Result<Option<Size>> {
        let mut reader = Reader::from_reader(self.xml_bytes());
        reader.config_mut().trim_text(true);

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                    if e.local_name().as_ref() == element {
                        return match (attr_i64(&e, b"cx")?, attr_i64(&e, b"cy")?) {
                            (Some(cx), Some(cy)) => Ok(Some(Size { cx, cy })),
                            _ => Ok(None),
                        };
                    }
                },
                Ok(Event::Eof) => break,
                Err(e) => return Err(OoxmlError::Xml(e.to_string())),
                _ => {},
            }
        }

        Ok(None)
    }

    /// `p:sldSz`, if present.
    pub fn slide_size(&self) -> Result<Option<Size>> {
        self.size_of(b"sldSz")
    }

    /// `p:notesSz`, if present.
    pub fn notes_size(&self) -> Result<Option<Size>> {
        self.size_of(b"notesSz")
    }
}

/// The prefixed `r:id` attribute, as opposed to the numeric unprefixed `id`.
fn relationship_attr(e: &BytesStart<'_>) -> Result<Option<String>> {
    for attr in e.attributes() {
        let attr = attr?;
        if attr.key.prefix().is_some() && attr.key.local_name().as_ref() == b"id" {
            return Ok(Some(std::str::from_utf8(&attr.value)?.to_string()));
        }
    }
    Ok(None)
}

/// Builder for the XML of a presentation part composed from scratch.
#[derive(Debug, Clone)]
pub struct PresentationXml {
    pub masters: Vec<IdListEntry>,
    /// `r:id` of the notes master relationship, if any
    pub notes_master: Option<String>,
    pub slides: Vec<IdListEntry>,
    pub slide_size: Size,
    pub notes_size: Size,
}

impl Default for PresentationXml {
    fn default() -> Self {
        Self {
            masters: Vec::new(),
            notes_master: None,
            slides: Vec::new(),
            slide_size: DEFAULT_SLIDE_SIZE,
            notes_size: DEFAULT_NOTES_SIZE,
        }
    }
}

impl PresentationXml {
    pub fn to_xml(&self) -> Result<String> {
        let mut xml = String::with_capacity(512 + 64 * (self.slides.len() + self.masters.len()));

        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push('\n');
        write!(
            xml,
            r#"<p:presentation xmlns:a="{}" xmlns:r="{}" xmlns:p="{}" saveSubsetFonts="1">"#,
            namespace::DML_MAIN,
            namespace::OFC_RELATIONSHIPS,
            namespace::PML_MAIN
        )
        .map_err(|e| OoxmlError::Xml(e.to_string()))?;

        if !self.masters.is_empty() {
            xml.push_str("<p:sldMasterIdLst>");
            for master in &self.masters {
                write!(
                    xml,
                    r#"<p:sldMasterId id="{}" r:id="{}"/>"#,
                    master.id, master.r_id
                )
                .map_err(|e| OoxmlError::Xml(e.to_string()))?;
            }
            xml.push_str("</p:sldMasterIdLst>");
        }

        if let Some(r_id) = &self.notes_master {
            write!(
                xml,
                r#"<p:notesMasterIdLst><p:notesMasterId r:id="{r_id}"/></p:notesMasterIdLst>"#
            )
            .map_err(|e| OoxmlError::Xml(e.to_string()))?;
        }

        xml.push_str("<p:sldIdLst>");
        for slide in &self.slides {
            write!(xml, r#"<p:sldId id="{}" r:id="{}"/>"#, slide.id, slide.r_id)
                .map_err(|e| OoxmlError::Xml(e.to_string()))?;
        }
        xml.push_str("</p:sldIdLst>");

        write!(
            xml,
            r#"<p:sldSz cx="{}" cy="{}"/><p:notesSz cx="{}" cy="{}"/>"#,
            self.slide_size.cx, self.slide_size.cy, self.notes_size.cx, self.notes_size.cy
        )
        .map_err(|e| OoxmlError::Xml(e.to_string()))?;

        xml.push_str("</p:presentation>");
        Ok(xml)
    }
}
