//! Package implementation for PowerPoint presentations.

use crate::ooxml::error::{OoxmlError, Result};
use crate::ooxml::opc::constants::{content_type as ct, relationship_type};
use crate::ooxml::opc::pkgwriter::PackageWriter;
use crate::ooxml::opc::{OpcPackage, PackURI, PartCompression, XmlPart};
use crate::ooxml::pptx::parts::{PresentationPart, PresentationXml, layout_ids};
use crate::ooxml::pptx::slide::Slide;
use std::io::{Seek, Write};
use std::path::Path;
use tracing::debug;

/// Partname of the presentation part in packages created from scratch.
pub const PRESENTATION_PARTNAME: &str = "/ppt/presentation.xml";

/// A PowerPoint (.pptx) package.
///
/// This is the main entry point for editing a presentation. It wraps an OPC
/// package and knows where the presentation part and its slides are.
///
/// # Examples
///
/// ```rust,no_run
/// use slidesplice::ooxml::pptx::Package;
/// use std::path::Path;
///
/// let mut pkg = Package::open("presentation.pptx")?;
/// let mut slide = pkg.slide_mut(0)?;
/// let placeholder = slide.layout_placeholder("pic")?;
/// slide.insert_image(&placeholder, Path::new("chart.png"), 1)?;
/// pkg.save("presentation.pptx", Default::default())?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct Package {
    /// The underlying OPC package
    opc: OpcPackage,
    main: PackURI,
}

impl Package {
    /// Open a .pptx package from a file path.
    ///
    /// Any failure to read the container is reported as
    /// [`OoxmlError::PackageCorrupt`] naming `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let opc = OpcPackage::open(path).map_err(|source| OoxmlError::PackageCorrupt {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), parts = opc.part_count(), "opened package");
        Self::from_opc(opc)
    }

    /// Load a .pptx package from the bytes of its ZIP container.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        Self::from_opc(OpcPackage::from_bytes(data)?)
    }

    /// Wrap an OPC package whose main part is a presentation.
    pub fn from_opc(mut opc: OpcPackage) -> Result<Self> {
        let main = opc
            .main_partname()
            .map_err(|e| OoxmlError::PartNotFound(format!("main presentation part: {e}")))?;

        let content_type = opc.get_part(&main)?.content_type();
        // Support both regular and macro-enabled presentations
        if content_type != ct::PML_PRESENTATION_MAIN && content_type != ct::PML_PRES_MACRO_MAIN {
            return Err(OoxmlError::InvalidContentType {
                expected: format!("{} or {}", ct::PML_PRESENTATION_MAIN, ct::PML_PRES_MACRO_MAIN),
                got: content_type.to_string(),
            });
        }

        let (slide_ids, master_ids) = existing_ids(&opc, &main)?;
        opc.ids_mut().reserve_existing(&slide_ids, &master_ids);

        Ok(Self { opc, main })
    }

    /// A package holding only an empty presentation part.
    pub fn empty() -> Result<Self> {
        let mut opc = OpcPackage::new();
        let main = PackURI::new(PRESENTATION_PARTNAME)?;

        let xml = PresentationXml::default().to_xml()?;
        opc.add_part(Box::new(XmlPart::new(
            main.clone(),
            ct::PML_PRESENTATION_MAIN.to_string(),
            xml.into_bytes(),
        )));

        let target_ref = main.relative_ref(opc.rels().base_uri());
        opc.rels_mut()
            .get_or_add(relationship_type::OFFICE_DOCUMENT, &target_ref)?;

        Ok(Self { opc, main })
    }

    #[inline]
    pub fn opc(&self) -> &OpcPackage {
        &self.opc
    }

    #[inline]
    pub fn opc_mut(&mut self) -> &mut OpcPackage {
        &mut self.opc
    }

    #[inline]
    pub fn main_partname(&self) -> &PackURI {
        &self.main
    }

    /// Read-only view of the presentation part.
    pub fn presentation(&self) -> Result<PresentationPart<'_>> {
        PresentationPart::from_part(self.opc.get_part(&self.main)?)
    }

    /// Partnames of all slides in presentation order (`p:sldIdLst`).
    pub fn slide_partnames(&self) -> Result<Vec<PackURI>> {
        let pres_part = self.opc.get_part(&self.main)?;
        let rels = pres_part.rels();

        PresentationPart::from_part(pres_part)?
            .slide_rids()?
            .iter()
            .map(|r_id| {
                let rel = rels.get(r_id).ok_or_else(|| {
                    OoxmlError::InvalidRelationship(format!(
                        "slide relationship {r_id} missing from {}",
                        self.main
                    ))
                })?;
                Ok(rel.target_partname()?)
            })
            .collect()
    }

    pub fn slide_count(&self) -> Result<usize> {
        self.presentation()?.slide_count()
    }

    /// Edit handle for the slide at `index` (0-based, presentation order).
    pub fn slide_mut(&mut self, index: usize) -> Result<Slide<'_>> {
        let mut partnames = self.slide_partnames()?;
        if index >= partnames.len() {
            return Err(OoxmlError::PartNotFound(format!(
                "slide {index} (presentation has {} slides)",
                partnames.len()
            )));
        }
        let partname = partnames.swap_remove(index);
        Ok(Slide::new(&mut self.opc, partname))
    }

    /// Save to `path`, replacing it only once the whole package was written.
    pub fn save<P: AsRef<Path>>(&self, path: P, compression: PartCompression) -> Result<()> {
        let path = path.as_ref();
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        self.write_to(tmp.as_file_mut(), compression)?.flush()?;
        tmp.persist(path).map_err(|e| OoxmlError::Io(e.error))?;

        debug!(path = %path.display(), "saved package");
        Ok(())
    }

    /// Write the package to a seekable stream and hand the stream back.
    pub fn write_to<W: Write + Seek>(&self, writer: W, compression: PartCompression) -> Result<W> {
        Ok(PackageWriter::write_to(writer, &self.opc, compression)?)
    }

    pub fn to_bytes(&self, compression: PartCompression) -> Result<Vec<u8>> {
        Ok(self.opc.to_bytes(compression)?)
    }
}

impl std::fmt::Debug for Package {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Package")
            .field("main", &self.main)
            .field("opc", &self.opc)
            .finish()
    }
}

/// Slide ids and master/layout ids already used by a package.
fn existing_ids(opc: &OpcPackage, main: &PackURI) -> Result<(Vec<u32>, Vec<u32>)> {
    let pres_part = opc.get_part(main)?;
    let pres = PresentationPart::from_part(pres_part)?;

    let slide_ids = pres.slide_entries()?.into_iter().map(|e| e.id).collect();

    let mut master_ids = Vec::new();
    for entry in pres.master_entries()? {
        master_ids.push(entry.id);
        let Some(rel) = pres_part.rels().get(&entry.r_id) else {
            continue;
        };
        if let Ok(master) = opc.get_part(&rel.target_partname()?) {
            master_ids.extend(layout_ids(master.blob())?);
        }
    }

    Ok((slide_ids, master_ids))
}

/// Insert an image into one slide of a file, saving the file in place.
///
/// The placeholder is the first one of type `placeholder_kind` on the
/// slide's layout.
pub fn insert_image_into_file(
    pptx_path: &Path,
    slide_index: usize,
    placeholder_kind: &str,
    image_path: &Path,
    disambiguator: u32,
) -> Result<()> {
    let mut package = Package::open(pptx_path)?;
    {
        let mut slide = package.slide_mut(slide_index)?;
        let placeholder = slide.layout_placeholder(placeholder_kind)?;
        slide.insert_image(&placeholder, image_path, disambiguator)?;
    }
    package.save(pptx_path, PartCompression::default())
}
