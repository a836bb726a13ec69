//! Objects that implement reading and writing OPC packages.
//!
//! This module provides the main OpcPackage type, which represents an Open Packaging
//! Convention package in memory. It manages parts, relationships and the
//! identifier allocator shared by every edit made to the package.

use crate::ooxml::opc::constants::relationship_type;
use crate::ooxml::opc::error::{OpcError, Result};
use crate::ooxml::opc::ids::IdAllocator;
use crate::ooxml::opc::packuri::{PACKAGE_URI, PackURI};
use crate::ooxml::opc::part::{Part, PartFactory};
use crate::ooxml::opc::phys_pkg::{PartCompression, PhysPkgReader};
use crate::ooxml::opc::pkgreader::PackageReader;
use crate::ooxml::opc::pkgwriter::PackageWriter;
use crate::ooxml::opc::rel::Relationships;
use std::collections::HashMap;
use std::path::Path;

/// Upper bound on the index tried by [`OpcPackage::next_partname`].
const MAX_PARTNAME_INDEX: u32 = 100_000;

/// Main API class for working with OPC packages.
///
/// OpcPackage represents an Open Packaging Convention package in memory,
/// providing access to parts, relationships, and package-level operations.
pub struct OpcPackage {
    /// Package-level relationships
    rels: Relationships,

    /// All parts in the package, indexed by partname
    parts: HashMap<String, Box<dyn Part>>,

    ids: IdAllocator,
}

impl OpcPackage {
    /// Create a new empty OPC package.
    pub fn new() -> Self {
        Self {
            rels: Relationships::new(PACKAGE_URI.to_string()),
            parts: HashMap::new(),
            ids: IdAllocator::new(),
        }
    }

    /// Open an OPC package from a file.
    ///
    /// # Example
    /// ```no_run
    /// use slidesplice::ooxml::opc::OpcPackage;
    ///
    /// let pkg = OpcPackage::open("deck.pptx").unwrap();
    /// ```
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut phys_reader = PhysPkgReader::open(path)?;
        Self::from_phys_reader(&mut phys_reader)
    }

    /// Load an OPC package from the bytes of a ZIP container.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let mut phys_reader = PhysPkgReader::from_bytes(data)?;
        Self::from_phys_reader(&mut phys_reader)
    }

    fn from_phys_reader(phys_reader: &mut PhysPkgReader) -> Result<Self> {
        let pkg_reader = PackageReader::from_phys_reader(phys_reader)?;
        Self::unmarshal(pkg_reader)
    }

    /// Build the in-memory object graph from serialized parts and relationships.
    fn unmarshal(mut pkg_reader: PackageReader) -> Result<Self> {
        let mut package = Self::new();

        for srel in pkg_reader.pkg_srels() {
            package
                .rels
                .add(&srel.reltype, &srel.target_ref, &srel.r_id, srel.is_external())?;
        }

        for spart in pkg_reader.take_sparts() {
            let mut part = PartFactory::load(spart.partname, spart.content_type, spart.blob)?;
            for srel in &spart.srels {
                part.rels_mut()
                    .add(&srel.reltype, &srel.target_ref, &srel.r_id, srel.is_external())?;
            }
            package.add_part(part);
        }

        Ok(package)
    }

    /// Partname of the main document part (`/ppt/presentation.xml` for decks).
    pub fn main_partname(&self) -> Result<PackURI> {
        self.rels
            .part_with_reltype(relationship_type::OFFICE_DOCUMENT)?
            .target_partname()
    }

    /// Get a reference to the main document part.
    pub fn main_document_part(&self) -> Result<&dyn Part> {
        let partname = self.main_partname()?;
        self.get_part(&partname)
    }

    /// Get a part by its partname.
    pub fn get_part(&self, partname: &PackURI) -> Result<&dyn Part> {
        self.parts
            .get(partname.as_str())
            .map(|b| &**b as &dyn Part)
            .ok_or_else(|| OpcError::PartNotFound(partname.to_string()))
    }

    /// Get a mutable reference to a part by its partname.
    pub fn get_part_mut(&mut self, partname: &PackURI) -> Result<&mut dyn Part> {
        self.parts
            .get_mut(partname.as_str())
            .map(|b| &mut **b as &mut dyn Part)
            .ok_or_else(|| OpcError::PartNotFound(partname.to_string()))
    }

    /// Check if a part exists in the package.
    pub fn contains_part(&self, partname: &PackURI) -> bool {
        self.parts.contains_key(partname.as_str())
    }

    /// Add a part, replacing any part stored under the same partname.
    pub fn add_part(&mut self, part: Box<dyn Part>) {
        let partname = part.partname().to_string();
        self.parts.insert(partname, part);
    }

    /// Get an iterator over all parts in the package.
    pub fn iter_parts(&self) -> impl Iterator<Item = &dyn Part> {
        self.parts.values().map(|b| &**b as &dyn Part)
    }

    /// Get the number of parts in the package.
    pub fn part_count(&self) -> usize {
        self.parts.len()
    }

    /// Get a reference to the package-level relationships.
    pub fn rels(&self) -> &Relationships {
        &self.rels
    }

    /// Get a mutable reference to the package-level relationships.
    pub fn rels_mut(&mut self) -> &mut Relationships {
        &mut self.rels
    }

    /// Relationships of a source, where the package pseudo-partname selects
    /// the package-level relationships.
    pub fn source_rels(&self, source: &PackURI) -> Result<&Relationships> {
        if source.is_package() {
            Ok(&self.rels)
        } else {
            Ok(self.get_part(source)?.rels())
        }
    }

    fn source_rels_mut(&mut self, source: &PackURI) -> Result<&mut Relationships> {
        if source.is_package() {
            Ok(&mut self.rels)
        } else {
            Ok(self.get_part_mut(source)?.rels_mut())
        }
    }

    pub fn ids(&self) -> &IdAllocator {
        &self.ids
    }

    /// The identifier allocator of this package.
    pub fn ids_mut(&mut self) -> &mut IdAllocator {
        &mut self.ids
    }

    /// Find the next available partname for a part template.
    ///
    /// # Example
    /// ```no_run
    /// # use slidesplice::ooxml::opc::OpcPackage;
    /// # let pkg = OpcPackage::new();
    /// let next_image = pkg.next_partname("/ppt/media/image%d.png").unwrap();
    /// ```
    pub fn next_partname(&self, template: &str) -> Result<PackURI> {
        for n in 1..=MAX_PARTNAME_INDEX {
            let candidate = PackURI::from_template(template, n)?;
            if !self.contains_part(&candidate) {
                return Ok(candidate);
            }
        }

        Err(OpcError::InvalidPackUri(format!(
            "no free partname for template '{template}'"
        )))
    }

    /// Candidate relationship number free in the scope of `source`. The
    /// allocator is left untouched; see [`IdAllocator::commit_rel_id`].
    pub fn peek_rel_id(&self, source: &PackURI, disambiguator: u32) -> Result<u32> {
        let scope = self.source_rels(source)?;
        Ok(self.ids.peek_rel_id(source.as_str(), scope, disambiguator))
    }

    /// Allocate and record a relationship id that is free in the scope of `source`.
    pub fn allocate_rel_id(&mut self, source: &PackURI, disambiguator: u32) -> Result<String> {
        let n = self.peek_rel_id(source, disambiguator)?;
        self.ids.commit_rel_id(source.as_str(), n);
        Ok(format!("rId{n}"))
    }

    /// Add an internal relationship from `source` to `target` under a newly
    /// allocated id, returning that id.
    pub fn relate(
        &mut self,
        source: &PackURI,
        target: &PackURI,
        reltype: &str,
        disambiguator: u32,
    ) -> Result<String> {
        let r_id = self.allocate_rel_id(source, disambiguator)?;
        let rels = self.source_rels_mut(source)?;
        let target_ref = target.relative_ref(rels.base_uri());
        rels.add(reltype, &target_ref, &r_id, false)?;
        Ok(r_id)
    }

    /// Serialize the package to a file.
    pub fn save<P: AsRef<Path>>(&self, path: P, compression: PartCompression) -> Result<()> {
        PackageWriter::write(path, self, compression)
    }

    /// Serialize the package to bytes.
    pub fn to_bytes(&self, compression: PartCompression) -> Result<Vec<u8>> {
        PackageWriter::to_bytes(self, compression)
    }
}

impl Default for OpcPackage {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for OpcPackage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpcPackage")
            .field("rels", &self.rels.len())
            .field("parts", &self.parts.len())
            .finish()
    }
}
