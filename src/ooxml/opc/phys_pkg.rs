//! Provides a general interface to a physical OPC package (ZIP file).
//!
//! This module handles the low-level reading and writing of ZIP members.
//! Everything above it works with partnames and byte buffers only.

use crate::ooxml::opc::error::{OpcError, Result};
use crate::ooxml::opc::packuri::PackURI;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::{Cursor, Read, Seek, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// How part bodies are stored in the ZIP container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartCompression {
    /// Deflate compression, as written by Office itself
    #[default]
    Deflated,
    /// No compression
    Stored,
}

impl PartCompression {
    fn method(self) -> CompressionMethod {
        match self {
            Self::Deflated => CompressionMethod::Deflated,
            Self::Stored => CompressionMethod::Stored,
        }
    }
}

/// Physical package reader over an in-memory ZIP archive.
pub struct PhysPkgReader {
    archive: ZipArchive<Cursor<Vec<u8>>>,
}

impl PhysPkgReader {
    /// Open an OPC package file.
    ///
    /// # Errors
    /// Returns an error if the file doesn't exist, can't be read, or isn't a
    /// valid ZIP archive.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.is_file() {
            return Err(OpcError::PackageNotFound(path.display().to_string()));
        }

        Self::from_bytes(std::fs::read(path)?)
    }

    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let archive = ZipArchive::new(Cursor::new(data))?;
        Ok(Self { archive })
    }

    /// Decompress every file member, keyed by member name.
    pub fn read_all(&mut self) -> Result<HashMap<String, Vec<u8>>> {
        let mut members = HashMap::with_capacity(self.archive.len());

        for index in 0..self.archive.len() {
            let mut file = self.archive.by_index(index)?;
            if file.is_dir() {
                continue;
            }

            let name = file.name().to_string();
            let mut data = Vec::with_capacity(usize::try_from(file.size()).unwrap_or(0));
            file.read_to_end(&mut data)?;
            members.insert(name, data);
        }

        Ok(members)
    }
}

/// Physical package writer for creating OPC packages.
pub struct PhysPkgWriter<W: Write + Seek> {
    archive: ZipWriter<W>,
    options: SimpleFileOptions,
}

impl<W: Write + Seek> PhysPkgWriter<W> {
    pub fn new(writer: W, compression: PartCompression) -> Self {
        Self {
            archive: ZipWriter::new(writer),
            options: SimpleFileOptions::default().compression_method(compression.method()),
        }
    }

    /// Write one member.
    pub fn write(&mut self, pack_uri: &PackURI, blob: &[u8]) -> Result<()> {
        self.archive.start_file(pack_uri.membername(), self.options)?;
        self.archive.write_all(blob)?;
        Ok(())
    }

    /// Write the central directory and return the underlying writer.
    pub fn finish(self) -> Result<W> {
        Ok(self.archive.finish()?)
    }
}
