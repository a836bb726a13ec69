//! Options for composing presentations.

use crate::ooxml::opc::PartCompression;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default prefix of composed output files.
pub const DEFAULT_TEMP_PREFIX: &str = "composed-";

/// Options controlling where and how a composed presentation is written.
///
/// # Examples
///
/// ```rust
/// use slidesplice::ooxml::pptx::ComposeOptions;
/// use slidesplice::ooxml::opc::PartCompression;
///
/// let options = ComposeOptions::new()
///     .with_temp_prefix("weekly-")
///     .with_compression(PartCompression::Stored);
/// assert_eq!(options.temp_prefix, "weekly-");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComposeOptions {
    /// Directory the output is created in; the system temp dir when `None`
    pub output_dir: Option<PathBuf>,

    /// File name prefix of the output
    pub temp_prefix: String,

    /// How part bodies are stored in the ZIP container
    pub compression: PartCompression,
}

impl Default for ComposeOptions {
    fn default() -> Self {
        Self {
            output_dir: None,
            temp_prefix: DEFAULT_TEMP_PREFIX.to_string(),
            compression: PartCompression::default(),
        }
    }
}

impl ComposeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    pub fn with_temp_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.temp_prefix = prefix.into();
        self
    }

    pub fn with_compression(mut self, compression: PartCompression) -> Self {
        self.compression = compression;
        self
    }

    /// Directory the output file is created in.
    pub fn output_dir(&self) -> PathBuf {
        self.output_dir
            .as_deref()
            .map(Path::to_path_buf)
            .unwrap_or_else(std::env::temp_dir)
    }
}
