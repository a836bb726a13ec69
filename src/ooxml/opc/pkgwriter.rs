//! Package writer for OPC packages.
//!
//! This module serializes an in-memory package to a ZIP container,
//! including the [Content_Types].xml, package relationships and every part
//! together with its relationships.

use crate::ooxml::opc::constants::content_type as ct;
use crate::ooxml::opc::error::Result;
use crate::ooxml::opc::package::OpcPackage;
use crate::ooxml::opc::packuri::{CONTENT_TYPES_URI, PackURI};
use crate::ooxml::opc::phys_pkg::{PartCompression, PhysPkgWriter};
use quick_xml::escape::escape;
use std::collections::BTreeMap;
use std::io::{Cursor, Seek, Write};
use std::path::Path;

/// Package writer that serializes an OPC package to a ZIP file.
///
/// Members are written in a stable order: [Content_Types].xml, `_rels/.rels`,
/// then parts sorted by partname, each followed by its `.rels` part when it
/// has relationships.
///
/// # Example
///
/// ```no_run
/// use slidesplice::ooxml::opc::{OpcPackage, PartCompression};
/// use slidesplice::ooxml::opc::pkgwriter::PackageWriter;
///
/// let pkg = OpcPackage::open("deck.pptx")?;
/// PackageWriter::write("copy.pptx", &pkg, PartCompression::Deflated)?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct PackageWriter;

impl PackageWriter {
    /// Write an OPC package to a file, replacing it if it exists.
    pub fn write<P: AsRef<Path>>(
        path: P,
        package: &OpcPackage,
        compression: PartCompression,
    ) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let mut file = Self::write_to(file, package, compression)?;
        file.flush()?;
        Ok(())
    }

    /// Write an OPC package to a seekable stream and hand the stream back.
    pub fn write_to<W: Write + Seek>(
        writer: W,
        package: &OpcPackage,
        compression: PartCompression,
    ) -> Result<W> {
        let mut phys_writer = PhysPkgWriter::new(writer, compression);

        Self::write_content_types(&mut phys_writer, package)?;
        Self::write_pkg_rels(&mut phys_writer, package)?;
        Self::write_parts(&mut phys_writer, package)?;

        phys_writer.finish()
    }

    /// Serialize an OPC package to bytes.
    pub fn to_bytes(package: &OpcPackage, compression: PartCompression) -> Result<Vec<u8>> {
        Ok(Self::write_to(Cursor::new(Vec::new()), package, compression)?.into_inner())
    }

    fn write_content_types<W: Write + Seek>(
        phys_writer: &mut PhysPkgWriter<W>,
        package: &OpcPackage,
    ) -> Result<()> {
        let cti = ContentTypesItem::from_package(package);
        phys_writer.write(&PackURI::new(CONTENT_TYPES_URI)?, cti.to_xml().as_bytes())
    }

    fn write_pkg_rels<W: Write + Seek>(
        phys_writer: &mut PhysPkgWriter<W>,
        package: &OpcPackage,
    ) -> Result<()> {
        let rels_uri = PackURI::package().rels_uri()?;
        phys_writer.write(&rels_uri, package.rels().to_xml().as_bytes())
    }

    fn write_parts<W: Write + Seek>(
        phys_writer: &mut PhysPkgWriter<W>,
        package: &OpcPackage,
    ) -> Result<()> {
        let mut parts: Vec<_> = package.iter_parts().collect();
        parts.sort_by(|a, b| a.partname().cmp(b.partname()));

        for part in parts {
            phys_writer.write(part.partname(), part.blob())?;

            if !part.rels().is_empty() {
                let rels_uri = part.partname().rels_uri()?;
                phys_writer.write(&rels_uri, part.rels().to_xml().as_bytes())?;
            }
        }

        Ok(())
    }
}

/// Default and Override elements of [Content_Types].xml.
struct ContentTypesItem {
    defaults: BTreeMap<String, String>,
    overrides: BTreeMap<String, String>,
}

impl ContentTypesItem {
    fn new() -> Self {
        let mut defaults = BTreeMap::new();
        defaults.insert("rels".to_string(), ct::OPC_RELATIONSHIPS.to_string());
        defaults.insert("xml".to_string(), ct::XML.to_string());

        Self {
            defaults,
            overrides: BTreeMap::new(),
        }
    }

    fn from_package(package: &OpcPackage) -> Self {
        let mut cti = Self::new();

        for part in package.iter_parts() {
            cti.add_content_type(part.partname(), part.content_type());
        }

        cti
    }

    /// Register a part under an extension default when the pair is a
    /// well-known one, otherwise under a partname override.
    fn add_content_type(&mut self, partname: &PackURI, content_type: &str) {
        let ext = partname.ext().to_lowercase();

        if Self::is_default_content_type(&ext, content_type) {
            self.defaults.insert(ext, content_type.to_string());
        } else {
            self.overrides
                .insert(partname.to_string(), content_type.to_string());
        }
    }

    fn is_default_content_type(ext: &str, content_type: &str) -> bool {
        matches!(
            (ext, content_type),
            ("rels", ct::OPC_RELATIONSHIPS)
                | ("xml", ct::XML)
                | ("png", ct::PNG)
                | ("jpg", ct::JPEG)
                | ("jpeg", ct::JPEG)
                | ("gif", ct::GIF)
                | ("ico", ct::ICON)
        )
    }

    fn to_xml(&self) -> String {
        let mut xml = String::with_capacity(256 + self.overrides.len() * 160);

        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push('\n');
        xml.push_str(
            r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
        );

        for (ext, content_type) in &self.defaults {
            xml.push_str(&format!(
                r#"<Default Extension="{}" ContentType="{}"/>"#,
                escape(ext.as_str()),
                escape(content_type.as_str())
            ));
        }

        for (partname, content_type) in &self.overrides {
            xml.push_str(&format!(
                r#"<Override PartName="{}" ContentType="{}"/>"#,
                escape(partname.as_str()),
                escape(content_type.as_str())
            ));
        }

        xml.push_str("</Types>");
        xml
    }
}
