//! Embedding external image files as picture shapes.

use crate::ooxml::error::{OoxmlError, Result};
use crate::ooxml::opc::constants::{content_type as ct, relationship_type};
use crate::ooxml::opc::error::OpcError;
use crate::ooxml::opc::{BlobPart, OpcPackage, PackURI};
use crate::ooxml::pptx::geometry::resolve_geometry;
use crate::ooxml::pptx::parts::ShapeTreeOutline;
use crate::ooxml::pptx::shapes::{PictureShape, PlaceholderShape};
use std::fs::File;
use std::path::Path;
use tracing::debug;

/// Image formats that can be embedded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageType {
    Jpeg,
    Png,
    Gif,
    Icon,
}

impl ImageType {
    /// Classify a file by its extension (case-insensitive).
    ///
    /// `.jpg` and `.jpeg` are JPEG, `.png` PNG, `.gif` GIF and `.ico` Icon.
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().into_owned())
            .unwrap_or_default();

        match extension.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            "png" => Ok(Self::Png),
            "gif" => Ok(Self::Gif),
            "ico" => Ok(Self::Icon),
            _ => Err(OoxmlError::UnsupportedImageType {
                extension: if extension.is_empty() {
                    extension
                } else {
                    format!(".{extension}")
                },
                file_stem: path
                    .file_stem()
                    .map(|stem| stem.to_string_lossy().into_owned())
                    .unwrap_or_default(),
            }),
        }
    }

    /// Get the MIME type for this image format.
    pub fn content_type(self) -> &'static str {
        match self {
            Self::Jpeg => ct::JPEG,
            Self::Png => ct::PNG,
            Self::Gif => ct::GIF,
            Self::Icon => ct::ICON,
        }
    }

    /// Get the file extension used for image parts of this format.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::Gif => "gif",
            Self::Icon => "ico",
        }
    }
}

/// Add the image at `image_path` to a slide as a picture positioned by
/// `placeholder`.
///
/// Everything that can fail is done before the package is touched: the
/// image is classified, the geometry resolved and the file read into a
/// detached part first. The new relationship, the shape and the image part
/// are then committed together.
pub(crate) fn embed_image(
    opc: &mut OpcPackage,
    slide: &PackURI,
    placeholder: &PlaceholderShape,
    image_path: &Path,
    disambiguator: u32,
) -> Result<()> {
    let image_type = ImageType::from_path(image_path)?;

    let transform = resolve_geometry(placeholder)?;

    let embed_n = opc.peek_rel_id(slide, disambiguator)?;
    let embed_id = format!("rId{embed_n}");
    let outline = ShapeTreeOutline::parse(opc.get_part(slide)?.blob())?;
    let shape_id = opc
        .ids()
        .peek_shape_id(slide.as_str(), outline.shape_ids(), disambiguator);
    let mut picture = PictureShape::new(shape_id, format!("Picture {disambiguator}"), transform);

    let image_partname = opc.next_partname(&format!("/ppt/media/image%d.{}", image_type.extension()))?;
    let mut image_part = BlobPart::new(
        image_partname.clone(),
        image_type.content_type().to_string(),
        Vec::new(),
    );
    let mut file = File::open(image_path)?;
    image_part.feed(&mut file).map_err(|e| match e {
        OpcError::IoError(io) => OoxmlError::Io(io),
        other => other.into(),
    })?;

    picture.bind(embed_id.as_str());
    let slide_xml = outline.append(opc.get_part(slide)?.blob(), &picture.to_xml()?);

    let slide_part = opc.get_part_mut(slide)?;
    let target_ref = image_partname.relative_ref(slide_part.rels().base_uri());
    slide_part
        .rels_mut()
        .add(relationship_type::IMAGE, &target_ref, &embed_id, false)?;
    slide_part.set_blob(slide_xml);
    opc.add_part(Box::new(image_part));

    let ids = opc.ids_mut();
    ids.commit_rel_id(slide.as_str(), embed_n);
    ids.commit_shape_id(slide.as_str(), shape_id);

    debug!(
        slide = %slide,
        image = %image_partname,
        r_id = %embed_id,
        shape_id,
        "embedded image"
    );
    Ok(())
}
