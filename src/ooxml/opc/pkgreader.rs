//! Low-level, read-only API to a serialized Open Packaging Convention (OPC) package.
//!
//! This module provides the PackageReader, which maps partnames to content
//! types and loads the parts reachable from the package relationships.
//! Members that no relationship reaches are not loaded.

use crate::ooxml::opc::constants::target_mode;
use crate::ooxml::opc::error::{OpcError, Result};
use crate::ooxml::opc::packuri::{CONTENT_TYPES_URI, PackURI};
use crate::ooxml::opc::phys_pkg::PhysPkgReader;
use quick_xml::Reader;
use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};
use smallvec::SmallVec;
use std::collections::{HashMap, HashSet};

/// Serialized part with its content and relationships.
#[derive(Debug)]
pub struct SerializedPart {
    pub partname: PackURI,
    pub content_type: String,
    /// The relationship type that first reached this part
    pub reltype: String,
    pub blob: Vec<u8>,
    pub srels: SmallVec<[SerializedRelationship; 8]>,
}

/// Serialized relationship as read from a .rels file.
#[derive(Debug, Clone)]
pub struct SerializedRelationship {
    pub base_uri: String,
    pub r_id: String,
    pub reltype: String,
    pub target_ref: String,
    pub target_mode: String,
}

impl SerializedRelationship {
    #[inline]
    pub fn is_external(&self) -> bool {
        self.target_mode == target_mode::EXTERNAL
    }

    pub fn target_partname(&self) -> Result<PackURI> {
        if self.is_external() {
            return Err(OpcError::InvalidRelationship(format!(
                "{} is external and has no target partname",
                self.r_id
            )));
        }
        PackURI::from_rel_ref(&self.base_uri, &self.target_ref)
    }
}

/// Read an attribute value, unescaping entities.
fn attr_value(e: &BytesStart<'_>, key: &[u8]) -> Result<Option<String>> {
    for attr in e.attributes() {
        let attr = attr?;
        if attr.key.as_ref() == key {
            let raw = std::str::from_utf8(&attr.value)?;
            return Ok(Some(unescape(raw)?.into_owned()));
        }
    }
    Ok(None)
}

/// Content type map built from the Default and Override elements of
/// [Content_Types].xml. Partname and extension matching is case-insensitive.
struct ContentTypeMap {
    defaults: HashMap<String, String>,
    overrides: HashMap<String, String>,
}

impl ContentTypeMap {
    fn from_xml(xml: &[u8]) -> Result<Self> {
        let mut map = Self {
            defaults: HashMap::new(),
            overrides: HashMap::new(),
        };
        let mut reader = Reader::from_reader(xml);
        reader.config_mut().trim_text(true);

        loop {
            match reader.read_event() {
                Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) => {
                    match e.local_name().as_ref() {
                        b"Default" => {
                            if let (Some(ext), Some(ct)) =
                                (attr_value(e, b"Extension")?, attr_value(e, b"ContentType")?)
                            {
                                map.defaults.insert(ext.to_lowercase(), ct);
                            }
                        },
                        b"Override" => {
                            if let (Some(pn), Some(ct)) =
                                (attr_value(e, b"PartName")?, attr_value(e, b"ContentType")?)
                            {
                                map.overrides.insert(pn.to_lowercase(), ct);
                            }
                        },
                        _ => {},
                    }
                },
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(OpcError::XmlError(format!("Content types parse error: {e}")));
                },
                _ => {},
            }
        }

        Ok(map)
    }

    /// Override first, then the default for the extension.
    fn get(&self, pack_uri: &PackURI) -> Result<String> {
        if let Some(ct) = self.overrides.get(&pack_uri.as_str().to_lowercase()) {
            return Ok(ct.clone());
        }

        self.defaults
            .get(&pack_uri.ext().to_lowercase())
            .cloned()
            .ok_or_else(|| OpcError::ContentTypeNotFound(pack_uri.to_string()))
    }
}

/// Package reader that provides access to serialized parts and relationships.
pub struct PackageReader {
    pkg_srels: SmallVec<[SerializedRelationship; 8]>,
    sparts: Vec<SerializedPart>,
}

impl PackageReader {
    /// Parse a physical package.
    ///
    /// Decompresses every member, parses the content types and package
    /// relationships, then walks the relationship graph.
    pub fn from_phys_reader(phys_reader: &mut PhysPkgReader) -> Result<Self> {
        let mut members = phys_reader.read_all()?;

        let content_types_xml = members
            .get(CONTENT_TYPES_URI.trim_start_matches('/'))
            .ok_or_else(|| OpcError::PartNotFound("[Content_Types].xml".to_string()))?;
        let content_types = ContentTypeMap::from_xml(content_types_xml)?;

        let pkg_srels = Self::rels_for(&members, &PackURI::package())?;
        let sparts = Self::walk_parts(&mut members, &pkg_srels, &content_types)?;

        Ok(Self { pkg_srels, sparts })
    }

    /// Relationships of one source, or none if it has no .rels member.
    fn rels_for(
        members: &HashMap<String, Vec<u8>>,
        source_uri: &PackURI,
    ) -> Result<SmallVec<[SerializedRelationship; 8]>> {
        let rels_uri = source_uri.rels_uri()?;

        match members.get(rels_uri.membername()) {
            Some(xml) => Self::parse_rels_xml(xml, source_uri.base_uri()),
            None => Ok(SmallVec::new()),
        }
    }

    fn parse_rels_xml(
        rels_xml: &[u8],
        base_uri: &str,
    ) -> Result<SmallVec<[SerializedRelationship; 8]>> {
        let mut srels = SmallVec::new();
        let mut reader = Reader::from_reader(rels_xml);
        reader.config_mut().trim_text(true);

        loop {
            match reader.read_event() {
                Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                    if e.local_name().as_ref() == b"Relationship" =>
                {
                    let r_id = attr_value(e, b"Id")?;
                    let reltype = attr_value(e, b"Type")?;
                    let target_ref = attr_value(e, b"Target")?;
                    let target_mode = attr_value(e, b"TargetMode")?
                        .unwrap_or_else(|| target_mode::INTERNAL.to_string());

                    if let (Some(r_id), Some(reltype), Some(target_ref)) = (r_id, reltype, target_ref)
                    {
                        srels.push(SerializedRelationship {
                            base_uri: base_uri.to_string(),
                            r_id,
                            reltype,
                            target_ref,
                            target_mode,
                        });
                    }
                },
                Ok(Event::Eof) => break,
                Err(e) => return Err(OpcError::XmlError(format!("Rels parse error: {e}"))),
                _ => {},
            }
        }

        Ok(srels)
    }

    /// Load every part reachable from the package relationships.
    ///
    /// Blobs are moved out of `members` as parts are discovered.
    fn walk_parts(
        members: &mut HashMap<String, Vec<u8>>,
        pkg_srels: &[SerializedRelationship],
        content_types: &ContentTypeMap,
    ) -> Result<Vec<SerializedPart>> {
        let mut sparts = Vec::with_capacity(32);
        let mut visited: HashSet<PackURI> = HashSet::with_capacity(32);
        let mut work_queue: Vec<(PackURI, String)> = Vec::with_capacity(pkg_srels.len());

        for srel in pkg_srels.iter().filter(|srel| !srel.is_external()) {
            let partname = srel.target_partname()?;
            if visited.insert(partname.clone()) {
                work_queue.push((partname, srel.reltype.clone()));
            }
        }

        while let Some((partname, reltype)) = work_queue.pop() {
            let part_srels = Self::rels_for(members, &partname)?;

            for child in part_srels.iter().filter(|srel| !srel.is_external()) {
                let child_partname = child.target_partname()?;
                if visited.insert(child_partname.clone()) {
                    work_queue.push((child_partname, child.reltype.clone()));
                }
            }

            let blob = members
                .remove(partname.membername())
                .ok_or_else(|| OpcError::PartNotFound(partname.to_string()))?;
            let content_type = content_types.get(&partname)?;

            sparts.push(SerializedPart {
                partname,
                content_type,
                reltype,
                blob,
                srels: part_srels,
            });
        }

        Ok(sparts)
    }

    pub fn pkg_srels(&self) -> &[SerializedRelationship] {
        &self.pkg_srels
    }

    /// Take ownership of all serialized parts.
    pub fn take_sparts(&mut self) -> Vec<SerializedPart> {
        std::mem::take(&mut self.sparts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_map() {
        let xml = br#"<?xml version="1.0"?>
            <Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
                <Default Extension="xml" ContentType="application/xml"/>
                <Default Extension="PNG" ContentType="image/png"/>
                <Override PartName="/ppt/presentation.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml"/>
            </Types>"#;

        let ct_map = ContentTypeMap::from_xml(xml).unwrap();

        let uri = PackURI::new("/ppt/other.xml").unwrap();
        assert_eq!(ct_map.get(&uri).unwrap(), "application/xml");

        let uri = PackURI::new("/ppt/media/image1.png").unwrap();
        assert_eq!(ct_map.get(&uri).unwrap(), "image/png");

        let uri = PackURI::new("/PPT/Presentation.xml").unwrap();
        assert_eq!(
            ct_map.get(&uri).unwrap(),
            "application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml"
        );

        let uri = PackURI::new("/ppt/media/movie.mp4").unwrap();
        assert!(matches!(ct_map.get(&uri), Err(OpcError::ContentTypeNotFound(_))));
    }

    #[test]
    fn test_parse_rels_xml() {
        let xml = br#"<?xml version="1.0"?>
            <Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
                <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout" Target="../slideLayouts/slideLayout1.xml"/>
                <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink" Target="https://example.com/?a=1&amp;b=2" TargetMode="External"/>
            </Relationships>"#;

        let srels = PackageReader::parse_rels_xml(xml, "/ppt/slides").unwrap();
        assert_eq!(srels.len(), 2);
        assert_eq!(
            srels[0].target_partname().unwrap().as_str(),
            "/ppt/slideLayouts/slideLayout1.xml"
        );
        assert!(srels[1].is_external());
        assert_eq!(srels[1].target_ref, "https://example.com/?a=1&b=2");
    }
}
