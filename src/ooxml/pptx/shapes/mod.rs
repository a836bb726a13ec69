//! Shapes module for PowerPoint presentations.
//!
//! This module provides types for the shapes slide composition touches:
//! - Placeholders defined on slide layouts
//! - Pictures (images)
//! - The shape tree scanner both are read through

pub mod base;
pub mod picture;
pub mod placeholder;

pub use base::{ShapeFragment, ShapeTreeScan, ShapeType, TreeBounds, scan_shape_tree};
pub use picture::PictureShape;
pub use placeholder::{DEFAULT_PLACEHOLDER_TYPE, PlaceholderShape};
