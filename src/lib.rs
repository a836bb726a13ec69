//! Slidesplice - compose PowerPoint (.pptx) presentations
//!
//! This library edits OOXML presentation packages at the part and
//! relationship level.
//!
//! # Features
//!
//! - **Merge**: concatenate the slides of several `.pptx` files into a new
//!   file, copying every layout, master, theme, media and notes part they use
//! - **Picture insertion**: add an image to a slide's shape tree, sized and
//!   positioned like a placeholder of the slide's layout
//! - **Collision-free ids**: relationship, shape, slide and master ids are
//!   allocated per package and never clash with ids already in use
//!
//! # Example - Merging presentations
//!
//! ```no_run
//! use slidesplice::combine;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let merged = combine(&["intro.pptx", "q3-results.pptx"])?;
//! println!("Merged deck written to {}", merged.display());
//! # Ok(())
//! # }
//! ```
//!
//! # Example - Inserting a picture
//!
//! ```no_run
//! use slidesplice::Package;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut pkg = Package::open("deck.pptx")?;
//! let mut slide = pkg.slide_mut(0)?;
//!
//! // Geometry comes from the layout's picture placeholder
//! let placeholder = slide.layout_placeholder("pic")?;
//! slide.insert_image(&placeholder, Path::new("chart.png"), 1)?;
//!
//! pkg.save("deck.pptx", Default::default())?;
//! # Ok(())
//! # }
//! ```
//!
//! # Logging
//!
//! Operations emit `tracing` events at debug and trace level. No subscriber
//! is installed by the library.

/// OOXML (Office Open XML) package and presentation support
///
/// This module provides the OPC package layer and the PresentationML
/// operations built on it.
pub mod ooxml;

// Re-export commonly used types for convenience
pub use ooxml::error::{OoxmlError, Result, ValidationReason, ValidationReport};
pub use ooxml::opc::PartCompression;
pub use ooxml::pptx::{
    ComposeOptions, ImageType, Package, PlaceholderShape, Slide, Transform2D, combine,
    combine_into, combine_with, insert_image_into_file,
};
