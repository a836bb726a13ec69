//! PowerPoint (.pptx) presentation composition.
//!
//! This module merges slides from several presentations into a new one and
//! inserts pictures positioned by layout placeholders:
//!
//! - `Package`: a .pptx package and its presentation part
//! - `Slide`: edit handle for one slide
//! - `merge`: copying slides and their dependencies between packages
//! - `image`: embedding image files as picture shapes
//! - `geometry`: offsets and extents in EMUs
//!
//! # Example
//!
//! ```rust,no_run
//! use slidesplice::ooxml::pptx::{Package, combine};
//! use std::path::Path;
//!
//! let merged = combine(&["intro.pptx", "results.pptx"])?;
//!
//! let mut package = Package::open(&merged)?;
//! let mut slide = package.slide_mut(0)?;
//! let placeholder = slide.layout_placeholder("pic")?;
//! slide.insert_image(&placeholder, Path::new("chart.png"), 1)?;
//! package.save(&merged, Default::default())?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod geometry;
pub mod image;
pub mod merge;
pub mod options;
pub mod package;
pub mod parts;
pub mod shapes;
pub mod slide;

#[cfg(test)]
pub(crate) mod test_support;

pub use geometry::{EMU_PER_INCH, Point, Size, Transform2D, resolve_geometry};
pub use image::ImageType;
pub use merge::{combine, combine_into, combine_with, compose, validate_sources};
pub use options::ComposeOptions;
pub use package::{Package, insert_image_into_file};
pub use parts::PartKind;
pub use shapes::{DEFAULT_PLACEHOLDER_TYPE, PictureShape, PlaceholderShape};
pub use slide::Slide;
