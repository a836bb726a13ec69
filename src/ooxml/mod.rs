//! Office Open XML (OOXML) support for presentation composition.
//!
//! The module is organized into two layers:
//!
//! 1. **OPC Layer** (`opc`): Low-level package handling (ZIP, parts, relationships, ids)
//! 2. **PresentationML** (`pptx`): Slides, layouts, pictures and merging
//!
//! # Example
//!
//! ```rust,no_run
//! use slidesplice::ooxml::pptx::Package;
//!
//! let pkg = Package::open("presentation.pptx")?;
//! println!("Presentation has {} slides", pkg.slide_count()?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
pub mod error;
pub mod opc;
pub mod pptx;

// Re-export commonly used types from OPC layer
pub use opc::{OpcPackage, PackURI};

pub use error::{OoxmlError, Result, ValidationProblem, ValidationReason, ValidationReport};
