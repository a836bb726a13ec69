//! Error types for OOXML operations.

use crate::ooxml::opc::error::OpcError;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for OOXML operations.
pub type Result<T> = std::result::Result<T, OoxmlError>;

/// Error types for OOXML operations.
#[derive(Error, Debug)]
pub enum OoxmlError {
    /// OPC package error
    #[error("OPC error: {0}")]
    Opc(#[from] OpcError),

    /// XML parsing error
    #[error("XML error: {0}")]
    Xml(String),

    /// Part not found
    #[error("Part not found: {0}")]
    PartNotFound(String),

    /// Invalid content type
    #[error("Invalid content type: expected {expected}, got {got}")]
    InvalidContentType { expected: String, got: String },

    /// Invalid relationship
    #[error("Invalid relationship: {0}")]
    InvalidRelationship(String),

    /// Invalid format
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// One or more source paths cannot be composed
    #[error("{0}")]
    Validation(ValidationReport),

    /// Image extension outside jpg/jpeg/png/gif/ico
    #[error("Image file type '{extension}' for file '{file_stem}' not recognized")]
    UnsupportedImageType { extension: String, file_stem: String },

    /// Placeholder without an `a:xfrm` of its own
    #[error("Placeholder '{placeholder}' has no transform")]
    MissingGeometry { placeholder: String },

    /// No layout placeholder matches the requested type or index
    #[error("Placeholder not found: {0}")]
    PlaceholderNotFound(String),

    /// A source file could not be read as a presentation package
    #[error("Cannot open '{}' as a presentation package: {source}", path.display())]
    PackageCorrupt {
        path: PathBuf,
        #[source]
        source: OpcError,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<quick_xml::Error> for OoxmlError {
    fn from(err: quick_xml::Error) -> Self {
        OoxmlError::Xml(err.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for OoxmlError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        OoxmlError::Xml(err.to_string())
    }
}

impl From<std::str::Utf8Error> for OoxmlError {
    fn from(err: std::str::Utf8Error) -> Self {
        OoxmlError::Xml(err.to_string())
    }
}

/// Why a source path was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationReason {
    /// The path does not end in `.pptx`
    UnsupportedExtension,
    /// Nothing exists at the path
    NotFound,
    /// The source list is empty
    NoInputs,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationProblem {
    pub path: PathBuf,
    pub reason: ValidationReason,
}

impl fmt::Display for ValidationProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.reason {
            ValidationReason::UnsupportedExtension => write!(
                f,
                "{} does not have a valid presentation format. Supported formats include: .pptx",
                self.path.display()
            ),
            ValidationReason::NotFound => write!(f, "Cannot find file '{}'", self.path.display()),
            ValidationReason::NoInputs => f.write_str("no source presentations supplied"),
        }
    }
}

/// Every problem found in one validation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    problems: Vec<ValidationProblem>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, path: impl Into<PathBuf>, reason: ValidationReason) {
        self.problems.push(ValidationProblem {
            path: path.into(),
            reason,
        });
    }

    pub fn problems(&self) -> &[ValidationProblem] {
        &self.problems
    }

    pub fn is_empty(&self) -> bool {
        self.problems.is_empty()
    }

    /// `Ok(())` when nothing was reported.
    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(OoxmlError::Validation(self))
        }
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Invalid presentation sources")?;
        for (i, problem) in self.problems.iter().enumerate() {
            let sep = if i == 0 { ": " } else { "; " };
            write!(f, "{sep}{problem}")?;
        }
        Ok(())
    }
}
