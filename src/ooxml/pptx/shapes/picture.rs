//! Picture (image) shape implementation.

use crate::ooxml::error::{OoxmlError, Result};
use crate::ooxml::opc::constants::{extension_uri, namespace};
use crate::ooxml::pptx::geometry::Transform2D;
use crate::ooxml::pptx::shapes::base::{
    NonVisualProps, ShapeType, attr_string, read_xfrm, scan_shape_tree,
};
use quick_xml::Reader;
use quick_xml::escape::escape;
use quick_xml::events::Event;
use std::fmt::Write as _;

/// A picture shape (`p:pic`) filled with an embedded image.
///
/// A picture built in memory starts unbound: it has no embed id until the
/// image part backing it exists and [`PictureShape::bind`] is called.
///
/// # Examples
///
/// ```rust,ignore
/// let mut picture = PictureShape::new(51, "Picture 1", Transform2D::new(0, 0, 10, 10));
/// picture.bind("rId102");
/// let xml = picture.to_xml()?;
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PictureShape {
    id: u32,
    name: String,
    transform: Option<Transform2D>,
    embed_id: Option<String>,
    lock_aspect: bool,
}

impl PictureShape {
    /// A new picture with its aspect ratio locked.
    pub fn new(id: u32, name: impl Into<String>, transform: Transform2D) -> Self {
        Self {
            id,
            name: name.into(),
            transform: Some(transform),
            embed_id: None,
            lock_aspect: true,
        }
    }

    #[inline]
    pub fn id(&self) -> u32 {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn transform(&self) -> Option<Transform2D> {
        self.transform
    }

    /// Relationship id of the blip, if bound.
    #[inline]
    pub fn embed_id(&self) -> Option<&str> {
        self.embed_id.as_deref()
    }

    /// `a:picLocks/@noChangeAspect`.
    #[inline]
    pub fn lock_aspect(&self) -> bool {
        self.lock_aspect
    }

    /// Point the blip fill at an image relationship.
    pub fn bind(&mut self, embed_id: impl Into<String>) {
        self.embed_id = Some(embed_id.into());
    }

    /// Serialize as a `p:pic` element that can be appended to a shape tree.
    ///
    /// The element declares the namespaces it uses, so it is valid whatever
    /// prefixes the host part declares.
    pub fn to_xml(&self) -> Result<String> {
        let embed_id = self.embed_id.as_deref().ok_or_else(|| {
            OoxmlError::InvalidRelationship(format!("picture '{}' has no embed id", self.name))
        })?;
        let transform = self.transform.ok_or_else(|| OoxmlError::MissingGeometry {
            placeholder: self.name.clone(),
        })?;

        let mut xml = String::with_capacity(1024);
        write!(
            xml,
            r#"<p:pic xmlns:p="{}" xmlns:a="{}" xmlns:r="{}">"#,
            namespace::PML_MAIN,
            namespace::DML_MAIN,
            namespace::OFC_RELATIONSHIPS
        )
        .map_err(|e| OoxmlError::Xml(e.to_string()))?;

        xml.push_str("<p:nvPicPr>");
        write!(
            xml,
            r#"<p:cNvPr id="{}" name="{}"/>"#,
            self.id,
            escape(self.name.as_str())
        )
        .map_err(|e| OoxmlError::Xml(e.to_string()))?;
        if self.lock_aspect {
            xml.push_str(r#"<p:cNvPicPr><a:picLocks noChangeAspect="1"/></p:cNvPicPr>"#);
        } else {
            xml.push_str("<p:cNvPicPr/>");
        }
        xml.push_str("<p:nvPr/>");
        xml.push_str("</p:nvPicPr>");

        xml.push_str("<p:blipFill>");
        write!(xml, r#"<a:blip r:embed="{}">"#, escape(embed_id))
            .map_err(|e| OoxmlError::Xml(e.to_string()))?;
        write!(
            xml,
            r#"<a:extLst><a:ext uri="{}"><a14:useLocalDpi xmlns:a14="{}" val="0"/></a:ext></a:extLst>"#,
            extension_uri::USE_LOCAL_DPI,
            namespace::DML_2010_MAIN
        )
        .map_err(|e| OoxmlError::Xml(e.to_string()))?;
        xml.push_str("</a:blip>");
        xml.push_str("<a:stretch><a:fillRect/></a:stretch>");
        xml.push_str("</p:blipFill>");

        xml.push_str("<p:spPr>");
        transform.write_xml(&mut xml);
        xml.push_str(r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom>"#);
        xml.push_str("</p:spPr>");
        xml.push_str("</p:pic>");

        Ok(xml)
    }

    /// Every picture among the direct children of a part's shape tree.
    pub fn parse_all(xml: &[u8]) -> Result<Vec<Self>> {
        let Some(scan) = scan_shape_tree(xml)? else {
            return Ok(Vec::new());
        };

        scan.shapes
            .iter()
            .filter(|f| f.shape_type == ShapeType::Picture)
            .map(|f| Self::parse(&xml[f.range.clone()]))
            .collect()
    }

    fn parse(xml: &[u8]) -> Result<Self> {
        let mut reader = Reader::from_reader(xml);
        reader.config_mut().trim_text(true);

        let mut props = NonVisualProps::default();
        let mut transform = None;
        let mut embed_id = None;
        let mut lock_aspect = false;
        let mut in_sp_pr = false;

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) if e.local_name().as_ref() == b"spPr" => in_sp_pr = true,
                Ok(Event::Start(e)) if in_sp_pr && e.local_name().as_ref() == b"xfrm" => {
                    transform = read_xfrm(&mut reader)?;
                },
                Ok(Event::Start(e)) | Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                    b"cNvPr" => props = NonVisualProps::from_element(&e)?,
                    b"picLocks" => {
                        lock_aspect = matches!(
                            attr_string(&e, b"noChangeAspect")?.as_deref(),
                            Some("1") | Some("true")
                        );
                    },
                    b"blip" => {
                        embed_id = e
                            .attributes()
                            .flatten()
                            .find(|attr| attr.key.local_name().as_ref() == b"embed")
                            .map(|attr| String::from_utf8_lossy(&attr.value).into_owned());
                    },
                    _ => {},
                },
                Ok(Event::End(e)) if e.local_name().as_ref() == b"spPr" => in_sp_pr = false,
                Ok(Event::Eof) => break,
                Err(e) => return Err(e.into()),
                _ => {},
            }
        }

        Ok(Self {
            id: props.id,
            name: props.name,
            transform,
            embed_id,
            lock_aspect,
        })
    }
}
