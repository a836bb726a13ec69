//! Parts for PowerPoint presentation documents.
//!
//! This module contains wrapper types for the XML parts slide composition
//! reads and rewrites, and the classification used to name copied parts.

pub mod presentation;
pub mod slide;

pub use presentation::{IdListEntry, PresentationPart, PresentationXml};
pub use slide::{ShapeTreeOutline, SlidePart, layout_ids, renumber_layout_ids};

use crate::ooxml::opc::constants::content_type as ct;
use crate::ooxml::opc::packuri::PackURI;

/// What a part is, as far as composition cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PartKind {
    Presentation,
    Slide,
    SlideLayout,
    SlideMaster,
    Theme,
    NotesSlide,
    NotesMaster,
    ImageJpeg,
    ImagePng,
    ImageGif,
    ImageIcon,
    Other,
}

impl PartKind {
    pub fn from_content_type(content_type: &str) -> Self {
        match content_type {
            ct::PML_PRESENTATION_MAIN | ct::PML_PRES_MACRO_MAIN => Self::Presentation,
            ct::PML_SLIDE => Self::Slide,
            ct::PML_SLIDE_LAYOUT => Self::SlideLayout,
            ct::PML_SLIDE_MASTER => Self::SlideMaster,
            ct::OFC_THEME => Self::Theme,
            ct::PML_NOTES_SLIDE => Self::NotesSlide,
            ct::PML_NOTES_MASTER => Self::NotesMaster,
            ct::JPEG => Self::ImageJpeg,
            ct::PNG => Self::ImagePng,
            ct::GIF => Self::ImageGif,
            ct::ICON => Self::ImageIcon,
            _ => Self::Other,
        }
    }

    #[inline]
    pub fn is_image(self) -> bool {
        matches!(
            self,
            Self::ImageJpeg | Self::ImagePng | Self::ImageGif | Self::ImageIcon
        )
    }

    /// Template for the partname of a copy of `source`, with one `%d`.
    ///
    /// Well-known kinds go to their conventional folder. Images and other
    /// parts keep their source folder, stem and extension.
    pub fn partname_template(self, source: &PackURI) -> String {
        match self {
            Self::Slide => "/ppt/slides/slide%d.xml".to_string(),
            Self::SlideLayout => "/ppt/slideLayouts/slideLayout%d.xml".to_string(),
            Self::SlideMaster => "/ppt/slideMasters/slideMaster%d.xml".to_string(),
            Self::Theme => "/ppt/theme/theme%d.xml".to_string(),
            Self::NotesSlide => "/ppt/notesSlides/notesSlide%d.xml".to_string(),
            Self::NotesMaster => "/ppt/notesMasters/notesMaster%d.xml".to_string(),
            Self::Presentation => "/ppt/presentation%d.xml".to_string(),
            _ if self.is_image() => format!("/ppt/media/image%d.{}", source.ext()),
            _ => {
                let stem = source.stem();
                let stem = if stem.is_empty() { "part" } else { stem };
                let ext = source.ext();
                let base = source.base_uri().trim_end_matches('/');
                if ext.is_empty() {
                    format!("{base}/{stem}%d")
                } else {
                    format!("{base}/{stem}%d.{ext}")
                }
            },
        }
    }
}
