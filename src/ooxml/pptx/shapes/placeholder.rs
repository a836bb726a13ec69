//! Placeholder shapes defined on slide layouts.

use crate::ooxml::error::Result;
use crate::ooxml::pptx::geometry::Transform2D;
use crate::ooxml::pptx::shapes::base::{
    NonVisualProps, ShapeType, attr_string, attr_u32, read_xfrm, scan_shape_tree,
};
use quick_xml::Reader;
use quick_xml::events::Event;

/// Placeholder type used when `p:ph` has no `type` attribute.
pub const DEFAULT_PLACEHOLDER_TYPE: &str = "body";

/// A `p:sp` carrying a `p:ph` element.
///
/// The transform is the one written on the shape itself, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderShape {
    id: u32,
    name: String,
    kind: String,
    idx: Option<u32>,
    transform: Option<Transform2D>,
}

impl PlaceholderShape {
    pub fn new(id: u32, name: impl Into<String>, kind: impl Into<String>, idx: Option<u32>) -> Self {
        Self {
            id,
            name: name.into(),
            kind: kind.into(),
            idx,
            transform: None,
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

    /// `p:ph/@type`, such as "title", "body", "pic", "ctrTitle".
    #[inline]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// `p:ph/@idx`.
    #[inline]
    pub fn idx(&self) -> Option<u32> {
        self.idx
    }

    #[inline]
    pub fn transform(&self) -> Option<Transform2D> {
        self.transform
    }

    pub fn set_transform(&mut self, transform: Option<Transform2D>) {
        self.transform = transform;
    }

    /// Human-readable identification for error messages.
    pub fn describe(&self) -> String {
        match self.idx {
            Some(idx) => format!("{} (type={}, idx={idx})", self.name, self.kind),
            None => format!("{} (type={})", self.name, self.kind),
        }
    }

    /// Every placeholder among the direct children of a part's shape tree.
    pub fn parse_all(xml: &[u8]) -> Result<Vec<Self>> {
        let Some(scan) = scan_shape_tree(xml)? else {
            return Ok(Vec::new());
        };

        let mut placeholders = Vec::new();
        for fragment in scan
            .shapes
            .iter()
            .filter(|f| f.shape_type == ShapeType::Shape)
        {
            if let Some(placeholder) = Self::parse(&xml[fragment.range.clone()])? {
                placeholders.push(placeholder);
            }
        }
        Ok(placeholders)
    }

    /// Parse one `p:sp`; `None` if it is not a placeholder.
    fn parse(xml: &[u8]) -> Result<Option<Self>> {
        let mut reader = Reader::from_reader(xml);
        reader.config_mut().trim_text(true);

        let mut props = NonVisualProps::default();
        let mut ph: Option<(String, Option<u32>)> = None;
        let mut transform = None;
        let mut in_sp_pr = false;

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => match e.local_name().as_ref() {
                    b"cNvPr" => props = NonVisualProps::from_element(&e)?,
                    b"ph" => ph = Some(Self::ph_attrs(&e)?),
                    b"spPr" => in_sp_pr = true,
                    b"xfrm" if in_sp_pr => transform = read_xfrm(&mut reader)?,
                    // text bodies can be large and never hold placeholder data
                    b"txBody" => {
                        let end = e.to_end().into_owned();
                        reader.read_to_end(end.name())?;
                    },
                    _ => {},
                },
                Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                    b"cNvPr" => props = NonVisualProps::from_element(&e)?,
                    b"ph" => ph = Some(Self::ph_attrs(&e)?),
                    _ => {},
                },
                Ok(Event::End(e)) if e.local_name().as_ref() == b"spPr" => in_sp_pr = false,
                Ok(Event::Eof) => break,
                Err(e) => return Err(e.into()),
                _ => {},
            }
        }

        Ok(ph.map(|(kind, idx)| Self {
            id: props.id,
            name: props.name,
            kind,
            idx,
            transform,
        }))
    }

    fn ph_attrs(e: &quick_xml::events::BytesStart<'_>) -> Result<(String, Option<u32>)> {
        let kind = attr_string(e, b"type")?.unwrap_or_else(|| DEFAULT_PLACEHOLDER_TYPE.to_string());
        Ok((kind, attr_u32(e, b"idx")?))
    }
}
