//! Shared parsing for shapes in a slide or layout shape tree.
//!
//! Shapes are not materialized as a DOM. The shape tree is scanned once with
//! quick-xml and every direct child is recorded as a byte range of the part
//! content, which the typed shape readers then parse on their own.

use crate::ooxml::error::{OoxmlError, Result};
use crate::ooxml::pptx::geometry::{Point, Size, Transform2D};
use quick_xml::Reader;
use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};
use std::borrow::Cow;
use std::ops::Range;

/// Shape type enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeType {
    /// A text or placeholder shape (p:sp)
    Shape,
    /// A picture shape (p:pic)
    Picture,
    /// A graphic frame containing a table or chart (p:graphicFrame)
    GraphicFrame,
    /// A group shape (p:grpSp)
    GroupShape,
    /// A connector shape (p:cxnSp)
    Connector,
    /// A content part (p:contentPart)
    ContentPart,
}

impl ShapeType {
    fn from_local_name(name: &[u8]) -> Option<Self> {
        match name {
            b"sp" => Some(Self::Shape),
            b"pic" => Some(Self::Picture),
            b"graphicFrame" => Some(Self::GraphicFrame),
            b"grpSp" => Some(Self::GroupShape),
            b"cxnSp" => Some(Self::Connector),
            b"contentPart" => Some(Self::ContentPart),
            _ => None,
        }
    }
}

/// One direct child shape of a shape tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeFragment {
    pub shape_type: ShapeType,
    /// Byte range of the element in the part content
    pub range: Range<usize>,
}

/// Where the shape tree sits in the part content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeBounds {
    /// `<p:spTree>...</p:spTree>`; the offset is where `</p:spTree>` starts
    Open { close_at: usize },
    /// `<p:spTree/>`, with the range of the empty tag and its qualified name
    Empty { range: Range<usize>, qname: String },
}

/// Result of scanning a part for its shape tree.
#[derive(Debug, Clone)]
pub struct ShapeTreeScan {
    pub bounds: TreeBounds,
    pub shapes: Vec<ShapeFragment>,
}

#[inline]
fn position(reader: &Reader<&[u8]>) -> usize {
    reader.buffer_position() as usize
}

/// Scan the first `p:spTree` of a slide, layout or master part.
///
/// Returns `None` when the part has no shape tree.
pub fn scan_shape_tree(xml: &[u8]) -> Result<Option<ShapeTreeScan>> {
    let mut reader = Reader::from_reader(xml);
    let mut in_tree = false;
    let mut shapes = Vec::new();

    loop {
        let start = position(&reader);
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let local = e.local_name();
                if !in_tree {
                    if local.as_ref() == b"spTree" {
                        in_tree = true;
                    }
                    continue;
                }

                // every Start seen inside the tree is a direct child; its
                // subtree is skipped in one go
                let shape_type = ShapeType::from_local_name(local.as_ref());
                let end = e.to_end().into_owned();
                reader.read_to_end(end.name())?;
                if let Some(shape_type) = shape_type {
                    shapes.push(ShapeFragment {
                        shape_type,
                        range: start..position(&reader),
                    });
                }
            },
            Ok(Event::Empty(e)) => {
                let local = e.local_name();
                if !in_tree {
                    if local.as_ref() == b"spTree" {
                        let qname = std::str::from_utf8(e.name().as_ref())?.to_string();
                        return Ok(Some(ShapeTreeScan {
                            bounds: TreeBounds::Empty {
                                range: start..position(&reader),
                                qname,
                            },
                            shapes,
                        }));
                    }
                    continue;
                }

                if let Some(shape_type) = ShapeType::from_local_name(local.as_ref()) {
                    shapes.push(ShapeFragment {
                        shape_type,
                        range: start..position(&reader),
                    });
                }
            },
            Ok(Event::End(e)) if in_tree && e.local_name().as_ref() == b"spTree" => {
                return Ok(Some(ShapeTreeScan {
                    bounds: TreeBounds::Open { close_at: start },
                    shapes,
                }));
            },
            Ok(Event::Eof) => {
                if in_tree {
                    return Err(OoxmlError::Xml("unterminated p:spTree".to_string()));
                }
                return Ok(None);
            },
            Err(e) => return Err(e.into()),
            _ => {},
        }
    }
}

/// Read an attribute value, unescaping entities.
pub(crate) fn attr_string(e: &BytesStart<'_>, key: &[u8]) -> Result<Option<String>> {
    for attr in e.attributes() {
        let attr = attr?;
        if attr.key.as_ref() == key {
            let raw = std::str::from_utf8(&attr.value)?;
            let value = unescape(raw).map_err(|e| OoxmlError::Xml(e.to_string()))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

/// Raw bytes of an attribute value.
fn attr_raw<'a>(e: &'a BytesStart<'_>, key: &[u8]) -> Result<Option<Cow<'a, [u8]>>> {
    for attr in e.attributes() {
        let attr = attr?;
        if attr.key.as_ref() == key {
            return Ok(Some(attr.value));
        }
    }
    Ok(None)
}

fn not_a_number(key: &[u8], value: &[u8]) -> OoxmlError {
    OoxmlError::Xml(format!(
        "attribute '{}' is not a number: '{}'",
        String::from_utf8_lossy(key),
        String::from_utf8_lossy(value)
    ))
}

/// Read a signed coordinate attribute; malformed numbers are an XML error.
pub(crate) fn attr_i64(e: &BytesStart<'_>, key: &[u8]) -> Result<Option<i64>> {
    match attr_raw(e, key)? {
        Some(value) => atoi_simd::parse::<i64, false, false>(&value)
            .map(Some)
            .map_err(|_| not_a_number(key, &value)),
        None => Ok(None),
    }
}

/// Read an unsigned id attribute; malformed numbers are an XML error.
pub(crate) fn attr_u32(e: &BytesStart<'_>, key: &[u8]) -> Result<Option<u32>> {
    match attr_raw(e, key)? {
        Some(value) => atoi_simd::parse::<u32, false, false>(&value)
            .map(Some)
            .map_err(|_| not_a_number(key, &value)),
        None => Ok(None),
    }
}

/// Parse the children of an `a:xfrm` whose start tag was just read.
///
/// Both `a:off` and `a:ext` must be present for a transform to be returned.
pub(crate) fn read_xfrm(reader: &mut Reader<&[u8]>) -> Result<Option<Transform2D>> {
    let mut offset = None;
    let mut extents = None;

    loop {
        match reader.read_event() {
            Ok(Event::Empty(e)) | Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"off" => {
                    offset = Some(Point {
                        x: attr_i64(&e, b"x")?.unwrap_or(0),
                        y: attr_i64(&e, b"y")?.unwrap_or(0),
                    });
                },
                b"ext" => {
                    extents = Some(Size {
                        cx: attr_i64(&e, b"cx")?.unwrap_or(0),
                        cy: attr_i64(&e, b"cy")?.unwrap_or(0),
                    });
                },
                _ => {},
            },
            Ok(Event::End(e)) if e.local_name().as_ref() == b"xfrm" => break,
            Ok(Event::Eof) => return Err(OoxmlError::Xml("unterminated a:xfrm".to_string())),
            Err(e) => return Err(e.into()),
            _ => {},
        }
    }

    Ok(match (offset, extents) {
        (Some(offset), Some(extents)) => Some(Transform2D { offset, extents }),
        _ => None,
    })
}

/// Id and name of the shape's `p:cNvPr`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct NonVisualProps {
    pub id: u32,
    pub name: String,
}

impl NonVisualProps {
    pub(crate) fn from_element(e: &BytesStart<'_>) -> Result<Self> {
        Ok(Self {
            id: attr_u32(e, b"id")?.unwrap_or(0),
            name: attr_string(e, b"name")?.unwrap_or_default(),
        })
    }
}
