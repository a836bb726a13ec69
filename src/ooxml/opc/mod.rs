//! Open Packaging Conventions (OPC) implementation.
//!
//! This module provides the package layer that presentation composition is
//! built on. It includes support for:
//!
//! - Package structure (parts, relationships)
//! - Content type management
//! - ZIP-based physical packaging
//! - Identifier allocation for parts copied or created inside a package
//!
//! Parts are held in memory for the duration of one operation and written
//! back as a whole; there is no incremental update of the ZIP container.

pub mod constants;
pub mod error;
pub mod ids;
pub mod package;
pub mod packuri;
pub mod part;
pub mod phys_pkg;
pub mod pkgreader;
pub mod pkgwriter;
pub mod rel;

// Re-export commonly used types
pub use ids::IdAllocator;
pub use package::OpcPackage;
pub use packuri::PackURI;
pub use part::{BlobPart, Part, XmlPart};
pub use phys_pkg::PartCompression;
pub use rel::{Relationship, Relationships};
