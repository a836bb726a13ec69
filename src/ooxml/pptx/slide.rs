//! Slide handle for edits that touch a slide and the package around it.

use crate::ooxml::error::{OoxmlError, Result};
use crate::ooxml::opc::constants::relationship_type;
use crate::ooxml::opc::{OpcPackage, PackURI};
use crate::ooxml::pptx::image::embed_image;
use crate::ooxml::pptx::parts::SlidePart;
use crate::ooxml::pptx::shapes::{PictureShape, PlaceholderShape};
use std::path::Path;

/// A slide of an open package.
///
/// Holds the package mutably, so at most one slide is edited at a time.
///
/// # Examples
///
/// ```rust,ignore
/// let mut slide = package.slide_mut(0)?;
/// let placeholder = slide.layout_placeholder("pic")?;
/// slide.insert_image(&placeholder, Path::new("chart.png"), 1)?;
/// ```
pub struct Slide<'a> {
    opc: &'a mut OpcPackage,
    partname: PackURI,
}

impl<'a> Slide<'a> {
    pub(crate) fn new(opc: &'a mut OpcPackage, partname: PackURI) -> Self {
        Self { opc, partname }
    }

    #[inline]
    pub fn partname(&self) -> &PackURI {
        &self.partname
    }

    fn part(&self) -> Result<SlidePart<'_>> {
        SlidePart::from_part(self.opc.get_part(&self.partname)?)
    }

    /// Partname of the slide layout this slide is based on.
    pub fn layout_partname(&self) -> Result<PackURI> {
        let slide = self.opc.get_part(&self.partname)?;
        Ok(slide
            .rels()
            .part_with_reltype(relationship_type::SLIDE_LAYOUT)?
            .target_partname()?)
    }

    /// All placeholders defined on the slide's layout, in shape tree order.
    pub fn layout_placeholders(&self) -> Result<Vec<PlaceholderShape>> {
        let layout = self.opc.get_part(&self.layout_partname()?)?;
        PlaceholderShape::parse_all(layout.blob())
    }

    /// First layout placeholder of a type (`p:ph/@type`, "body" when absent).
    pub fn layout_placeholder(&self, kind: &str) -> Result<PlaceholderShape> {
        self.layout_placeholders()?
            .into_iter()
            .find(|ph| ph.kind() == kind)
            .ok_or_else(|| {
                OoxmlError::PlaceholderNotFound(format!("type '{kind}' on layout of {}", self.partname))
            })
    }

    /// Layout placeholder with the given `p:ph/@idx`.
    pub fn layout_placeholder_by_idx(&self, idx: u32) -> Result<PlaceholderShape> {
        self.layout_placeholders()?
            .into_iter()
            .find(|ph| ph.idx() == Some(idx))
            .ok_or_else(|| {
                OoxmlError::PlaceholderNotFound(format!("idx {idx} on layout of {}", self.partname))
            })
    }

    /// Number of shapes directly in the slide's shape tree.
    pub fn shape_count(&self) -> Result<usize> {
        Ok(self.part()?.shape_tree()?.shape_count())
    }

    /// Picture shapes directly in the slide's shape tree.
    pub fn pictures(&self) -> Result<Vec<PictureShape>> {
        PictureShape::parse_all(self.opc.get_part(&self.partname)?.blob())
    }

    pub fn text(&self) -> Result<String> {
        self.part()?.text()
    }

    /// Blob of the part an image relationship of this slide points at.
    pub fn image_bytes(&self, embed_id: &str) -> Result<&[u8]> {
        let rel = self
            .opc
            .get_part(&self.partname)?
            .rels()
            .get(embed_id)
            .ok_or_else(|| OoxmlError::InvalidRelationship(format!("{embed_id} not found")))?;
        let target = rel.target_partname()?;
        Ok(self.opc.get_part(&target)?.blob())
    }

    /// Append a picture of `image_path` to the shape tree.
    ///
    /// The picture takes the placeholder's geometry, is named
    /// `Picture {disambiguator}` and gets a shape id derived from the
    /// disambiguator. On error the package is left unchanged.
    pub fn insert_image(
        &mut self,
        placeholder: &PlaceholderShape,
        image_path: &Path,
        disambiguator: u32,
    ) -> Result<()> {
        embed_image(self.opc, &self.partname, placeholder, image_path, disambiguator)
    }
}
