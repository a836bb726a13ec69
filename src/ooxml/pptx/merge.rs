//! Merging the slides of several presentations into a new one.
//!
//! Each slide is copied together with every part it reaches through internal
//! relationships (layout, master, theme, media, notes, ...). Copies get fresh
//! partnames in the destination while relationship ids are kept, so the
//! `r:id`/`r:embed` references inside the copied XML stay valid without
//! rewriting it. Parts shared by several slides are copied once per slide.

use crate::ooxml::error::{OoxmlError, Result, ValidationReason, ValidationReport};
use crate::ooxml::opc::constants::relationship_type as rt;
use crate::ooxml::opc::part::PartFactory;
use crate::ooxml::opc::{OpcPackage, PackURI, PartCompression};
use crate::ooxml::pptx::geometry::Size;
use crate::ooxml::pptx::options::ComposeOptions;
use crate::ooxml::pptx::package::Package;
use crate::ooxml::pptx::parts::{
    IdListEntry, PartKind, PresentationXml, renumber_layout_ids,
    presentation::{DEFAULT_NOTES_SIZE, DEFAULT_SLIDE_SIZE},
};
use std::collections::HashMap;
use std::ffi::OsStr;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Extension every source presentation must have.
pub const PRESENTATION_EXTENSION: &str = "pptx";

/// Check every source before anything is opened.
///
/// All problems are collected into one [`OoxmlError::Validation`].
pub fn validate_sources<P: AsRef<Path>>(sources: &[P]) -> Result<()> {
    let mut report = ValidationReport::new();
    if sources.is_empty() {
        report.push(PathBuf::new(), ValidationReason::NoInputs);
    }

    for source in sources {
        let path = source.as_ref();
        if path.extension() != Some(OsStr::new(PRESENTATION_EXTENSION)) {
            report.push(path, ValidationReason::UnsupportedExtension);
        }
        if !path.exists() {
            report.push(path, ValidationReason::NotFound);
        }
    }

    report.into_result()
}

/// Merge `sources` into a new presentation with default options.
///
/// Returns the path of the new file, created in the system temp directory.
/// The caller owns the file.
///
/// # Examples
///
/// ```rust,no_run
/// use slidesplice::combine;
///
/// let merged = combine(&["intro.pptx", "results.pptx"])?;
/// println!("written to {}", merged.display());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn combine<P: AsRef<Path>>(sources: &[P]) -> Result<PathBuf> {
    combine_with(sources, &ComposeOptions::default())
}

/// Merge `sources` into a new file named by `options`.
///
/// The file only persists once it was written completely.
pub fn combine_with<P: AsRef<Path>>(sources: &[P], options: &ComposeOptions) -> Result<PathBuf> {
    let package = compose(sources)?;

    let mut tmp = tempfile::Builder::new()
        .prefix(&options.temp_prefix)
        .suffix(".pptx")
        .tempfile_in(options.output_dir())?;
    package
        .write_to(tmp.as_file_mut(), options.compression)?
        .flush()?;
    let (_, path) = tmp.keep().map_err(|e| OoxmlError::Io(e.error))?;

    debug!(path = %path.display(), sources = sources.len(), "combined presentations");
    Ok(path)
}

/// Merge `sources` into `dest`, replacing it if it exists.
pub fn combine_into<P: AsRef<Path>, Q: AsRef<Path>>(sources: &[P], dest: Q) -> Result<()> {
    compose(sources)?.save(dest, PartCompression::default())
}

/// Build the merged presentation in memory.
pub fn compose<P: AsRef<Path>>(sources: &[P]) -> Result<Package> {
    validate_sources(sources)?;

    let mut composer = Composer::new()?;
    for (index, source) in sources.iter().enumerate() {
        let path = source.as_ref();
        debug!(index, path = %path.display(), "appending source");
        composer.append_source(path)?;
    }
    composer.finish()
}

/// Destination presentation under construction.
struct Composer {
    dest: Package,
    masters: Vec<IdListEntry>,
    notes_master: Option<String>,
    slides: Vec<IdListEntry>,
    theme_related: bool,
    sizes: Option<(Size, Size)>,
}

impl Composer {
    fn new() -> Result<Self> {
        Ok(Self {
            dest: Package::empty()?,
            masters: Vec::new(),
            notes_master: None,
            slides: Vec::new(),
            theme_related: false,
            sizes: None,
        })
    }

    fn append_source(&mut self, path: &Path) -> Result<()> {
        let source = Package::open(path)?;

        if self.sizes.is_none() {
            let pres = source.presentation()?;
            self.sizes = Some((
                pres.slide_size()?.unwrap_or(DEFAULT_SLIDE_SIZE),
                pres.notes_size()?.unwrap_or(DEFAULT_NOTES_SIZE),
            ));
        }

        let dest_main = self.dest.main_partname().clone();
        let mut slide_copies = HashMap::new();
        let mut slide_links = Vec::new();
        for slide in source.slide_partnames()? {
            let mut copier = ClosureCopier::new(&source, self.dest.opc_mut(), &dest_main);
            let copied_slide = copier.copy(&slide)?;
            let (copied_parts, mut links) = copier.into_parts();
            slide_links.append(&mut links);
            self.register_copied(&copied_parts)?;

            let opc = self.dest.opc_mut();
            let r_id = opc.relate(&dest_main, &copied_slide, rt::SLIDE, 0)?;
            let id = opc.ids_mut().next_slide_id();
            self.slides.push(IdListEntry { id, r_id });

            debug!(
                source = %slide,
                slide = %copied_slide,
                parts = copied_parts.len(),
                "copied slide"
            );
            slide_copies.insert(slide, copied_slide);
        }

        while let Some(link) = slide_links.pop() {
            let existing = slide_copies.get(&link.target).cloned();
            let target = match existing {
                Some(copy) => copy,
                // not in p:sldIdLst, so it travels as an ordinary dependency
                None => {
                    let mut copier = ClosureCopier::new(&source, self.dest.opc_mut(), &dest_main);
                    let copy = copier.copy(&link.target)?;
                    let (copied_parts, mut links) = copier.into_parts();
                    slide_links.append(&mut links);
                    self.register_copied(&copied_parts)?;
                    slide_copies.insert(link.target.clone(), copy.clone());
                    copy
                },
            };
            let rels = self.dest.opc_mut().get_part_mut(&link.from)?.rels_mut();
            let target_ref = target.relative_ref(rels.base_uri());
            rels.add(rt::SLIDE, &target_ref, &link.r_id, false)?;
            trace!(from = %link.from, to = %target, r_id = %link.r_id, "linked slide");
        }

        Ok(())
    }

    /// Register the masters and the first notes master among freshly copied parts.
    fn register_copied(&mut self, copied_parts: &[(PartKind, PackURI)]) -> Result<()> {
        let dest_main = self.dest.main_partname().clone();
        for (kind, partname) in copied_parts {
            match kind {
                PartKind::SlideMaster => self.register_master(partname)?,
                PartKind::NotesMaster if self.notes_master.is_none() => {
                    let opc = self.dest.opc_mut();
                    self.notes_master = Some(opc.relate(&dest_main, partname, rt::NOTES_MASTER, 0)?);
                },
                _ => {},
            }
        }
        Ok(())
    }

    /// Add a copied master to `p:sldMasterIdLst`, renumbering its layout ids.
    fn register_master(&mut self, master: &PackURI) -> Result<()> {
        let dest_main = self.dest.main_partname().clone();
        let opc = self.dest.opc_mut();

        let xml = opc.get_part(master)?.blob().to_vec();
        let ids = opc.ids_mut();
        let master_id = ids.next_master_id();
        let renumbered = renumber_layout_ids(&xml, || ids.next_master_id())?;
        opc.get_part_mut(master)?.set_blob(renumbered);

        let r_id = opc.relate(&dest_main, master, rt::SLIDE_MASTER, 0)?;
        self.masters.push(IdListEntry { id: master_id, r_id });

        if !self.theme_related {
            let theme = match opc.get_part(master)?.rels().part_with_reltype(rt::THEME) {
                Ok(rel) => Some(rel.target_partname()?),
                Err(_) => None,
            };
            if let Some(theme) = theme {
                opc.relate(&dest_main, &theme, rt::THEME, 0)?;
                self.theme_related = true;
            }
        }

        Ok(())
    }

    fn finish(mut self) -> Result<Package> {
        let (slide_size, notes_size) = self.sizes.unwrap_or((DEFAULT_SLIDE_SIZE, DEFAULT_NOTES_SIZE));
        let xml = PresentationXml {
            masters: self.masters,
            notes_master: self.notes_master,
            slides: self.slides,
            slide_size,
            notes_size,
        }
        .to_xml()?;

        let main = self.dest.main_partname().clone();
        self.dest.opc_mut().get_part_mut(&main)?.set_blob(xml.into_bytes());
        Ok(self.dest)
    }
}

/// Relationship to a slide, added once every slide of the source is copied.
struct SlideLink {
    /// Destination part owning the relationship
    from: PackURI,
    r_id: String,
    /// Source slide it points at
    target: PackURI,
}

/// Depth-first copy of a part and everything it reaches.
///
/// `copied` memoises source partname to destination partname for one slide,
/// which ends relationship cycles such as layout/master and slide/notes.
/// Relationships to slides outside the memo are not followed; they are
/// collected in `slide_links` and resolved by the caller.
struct ClosureCopier<'s, 'd> {
    source: &'s OpcPackage,
    source_main: &'s PackURI,
    dest: &'d mut OpcPackage,
    dest_main: &'d PackURI,
    copied: HashMap<PackURI, PackURI>,
    /// Destination parts in the order they were created
    order: Vec<(PartKind, PackURI)>,
    slide_links: Vec<SlideLink>,
}

impl<'s, 'd> ClosureCopier<'s, 'd> {
    fn new(source: &'s Package, dest: &'d mut OpcPackage, dest_main: &'d PackURI) -> Self {
        Self {
            source: source.opc(),
            source_main: source.main_partname(),
            dest,
            dest_main,
            copied: HashMap::new(),
            order: Vec::new(),
            slide_links: Vec::new(),
        }
    }

    fn into_parts(self) -> (Vec<(PartKind, PackURI)>, Vec<SlideLink>) {
        (self.order, self.slide_links)
    }

    fn copy(&mut self, partname: &PackURI) -> Result<PackURI> {
        if let Some(done) = self.copied.get(partname) {
            return Ok(done.clone());
        }

        let source = self.source;
        let part = source.get_part(partname)?;
        let kind = PartKind::from_content_type(part.content_type());

        // reserve the name before recursing so cycles resolve to it
        let new_name = self.dest.next_partname(&kind.partname_template(partname))?;
        self.dest.add_part(PartFactory::load(
            new_name.clone(),
            part.content_type().to_string(),
            part.blob().to_vec(),
        )?);
        self.copied.insert(partname.clone(), new_name.clone());
        self.order.push((kind, new_name.clone()));
        trace!(from = %partname, to = %new_name, "copied part");

        for rel in part.rels().sorted() {
            let target = if rel.is_external() {
                None
            } else {
                let target = rel.target_partname()?;
                if &target == self.source_main {
                    Some(self.dest_main.clone())
                } else if rel.reltype() == rt::SLIDE && !self.copied.contains_key(&target) {
                    self.slide_links.push(SlideLink {
                        from: new_name.clone(),
                        r_id: rel.r_id().to_string(),
                        target,
                    });
                    continue;
                } else {
                    Some(self.copy(&target)?)
                }
            };

            let rels = self.dest.get_part_mut(&new_name)?.rels_mut();
            let target_ref = match &target {
                Some(target) => target.relative_ref(rels.base_uri()),
                None => rel.target_ref().to_string(),
            };
            rels.add(rel.reltype(), &target_ref, rel.r_id(), rel.is_external())?;
        }

        Ok(new_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::pptx::parts::layout_ids;
    use crate::ooxml::pptx::test_support::{PNG_BYTES, write_deck, write_deck_with};

    fn texts(package: &mut Package) -> Vec<String> {
        (0..package.slide_count().unwrap())
            .map(|i| package.slide_mut(i).unwrap().text().unwrap())
            .collect()
    }

    #[test]
    fn test_combine_concatenates_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_deck(dir.path(), "a.pptx", "deck-a", 2);
        let b = write_deck(dir.path(), "b.pptx", "deck-b", 3);

        let options = ComposeOptions::new().with_output_dir(dir.path());
        let merged = combine_with(&[&a, &b], &options).unwrap();
        assert!(merged.starts_with(dir.path()));
        assert_eq!(merged.extension(), Some(OsStr::new("pptx")));

        let mut package = Package::open(&merged).unwrap();
        assert_eq!(package.slide_count().unwrap(), 5);
        assert_eq!(
            texts(&mut package),
            vec!["deck-a 1", "deck-a 2", "deck-b 1", "deck-b 2", "deck-b 3"]
        );

        let ids: Vec<u32> = package
            .presentation()
            .unwrap()
            .slide_entries()
            .unwrap()
            .iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(ids, vec![256, 257, 258, 259, 260]);
    }

    #[test]
    fn test_validation_reports_every_problem() {
        let dir = tempfile::tempdir().unwrap();
        let good = write_deck(dir.path(), "good.pptx", "deck-a", 1);
        let notes = dir.path().join("notes.txt");
        std::fs::write(&notes, b"not a deck").unwrap();
        let missing = dir.path().join("missing.pptx");

        let out = tempfile::tempdir().unwrap();
        let options = ComposeOptions::new().with_output_dir(out.path());
        match combine_with(&[&good, &notes, &missing], &options) {
            Err(OoxmlError::Validation(report)) => {
                let problems = report.problems();
                assert_eq!(problems.len(), 2);
                assert_eq!(problems[0].path, notes);
                assert_eq!(problems[0].reason, ValidationReason::UnsupportedExtension);
                assert_eq!(problems[1].path, missing);
                assert_eq!(problems[1].reason, ValidationReason::NotFound);
            },
            other => panic!("unexpected result {other:?}"),
        }

        assert_eq!(std::fs::read_dir(out.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_empty_source_list_is_rejected() {
        let sources: [&Path; 0] = [];
        match combine(&sources) {
            Err(OoxmlError::Validation(report)) => {
                assert_eq!(report.problems()[0].reason, ValidationReason::NoInputs);
            },
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn test_corrupt_source_names_path_and_leaves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let good = write_deck(dir.path(), "good.pptx", "deck-a", 1);
        let broken = dir.path().join("broken.pptx");
        std::fs::write(&broken, b"PK but not really").unwrap();

        let out = tempfile::tempdir().unwrap();
        let options = ComposeOptions::new().with_output_dir(out.path());
        match combine_with(&[&good, &broken], &options) {
            Err(OoxmlError::PackageCorrupt { path, .. }) => assert_eq!(path, broken),
            other => panic!("unexpected result {other:?}"),
        }
        assert_eq!(std::fs::read_dir(out.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_copied_relationships_keep_ids() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_deck_with(dir.path(), "a.pptx", "deck-a", 2, true);

        let package = compose(&[&a]).unwrap();
        let opc = package.opc();
        let slides = package.slide_partnames().unwrap();
        let first = opc.get_part(&slides[0]).unwrap();

        let image = first.rels().get("rId2").unwrap();
        assert_eq!(image.reltype(), rt::IMAGE);
        let image_part = opc.get_part(&image.target_partname().unwrap()).unwrap();
        assert_eq!(image_part.blob(), PNG_BYTES);
        assert!(String::from_utf8_lossy(first.blob()).contains(r#"r:embed="rId2""#));

        let link = first.rels().get("rId3").unwrap();
        assert!(link.is_external());
        assert_eq!(link.target_ref(), "https://example.com/deck");

        // the notes slide points back at the copy, not at a second copy
        let notes = first.rels().get("rId4").unwrap().target_partname().unwrap();
        let back = opc
            .get_part(&notes)
            .unwrap()
            .rels()
            .get("rId2")
            .unwrap()
            .target_partname()
            .unwrap();
        assert_eq!(back, slides[0]);

        for part in opc.iter_parts() {
            for rel in part.rels().iter().filter(|rel| !rel.is_external()) {
                assert!(
                    opc.contains_part(&rel.target_partname().unwrap()),
                    "{} -> {} dangles",
                    part.partname(),
                    rel.target_ref()
                );
            }
        }
    }

    #[test]
    fn test_slide_links_point_at_listed_copies() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_deck(dir.path(), "a.pptx", "deck-a", 1);
        let b = write_deck_with(dir.path(), "b.pptx", "deck-b", 3, true);

        let package = compose(&[&a, &b]).unwrap();
        let opc = package.opc();
        let slides = package.slide_partnames().unwrap();
        assert_eq!(slides.len(), 4);

        let jump = opc.get_part(&slides[1]).unwrap().rels().get("rId5").unwrap();
        assert_eq!(jump.reltype(), rt::SLIDE);
        assert_eq!(jump.target_partname().unwrap(), slides[2]);

        let slide_parts = opc
            .iter_parts()
            .filter(|p| PartKind::from_content_type(p.content_type()) == PartKind::Slide)
            .count();
        assert_eq!(slide_parts, slides.len());
    }

    #[test]
    fn test_masters_are_registered_with_unique_ids() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_deck_with(dir.path(), "a.pptx", "deck-a", 1, true);
        let b = write_deck(dir.path(), "b.pptx", "deck-b", 2);

        let package = compose(&[&a, &b]).unwrap();
        let pres = package.presentation().unwrap();
        let masters = pres.master_entries().unwrap();
        // one master copy per slide
        assert_eq!(masters.len(), 3);

        let pres_part = package.opc().get_part(package.main_partname()).unwrap();
        let mut ids = Vec::new();
        for entry in &masters {
            ids.push(entry.id);
            let master = pres_part
                .rels()
                .get(&entry.r_id)
                .unwrap()
                .target_partname()
                .unwrap();
            ids.extend(layout_ids(package.opc().get_part(&master).unwrap().blob()).unwrap());
        }
        let unique: std::collections::BTreeSet<u32> = ids.iter().copied().collect();
        assert_eq!(unique.len(), ids.len());
        assert!(ids.iter().all(|&id| id >= 2_147_483_648));

        assert!(pres_part.rels().part_with_reltype(rt::THEME).is_ok());
        assert!(pres_part.rels().part_with_reltype(rt::NOTES_MASTER).is_ok());

        let layouts = package
            .opc()
            .iter_parts()
            .filter(|p| PartKind::from_content_type(p.content_type()) == PartKind::SlideLayout)
            .count();
        assert_eq!(layouts, 3);
    }

    #[test]
    fn test_slide_size_comes_from_first_source() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_deck(dir.path(), "a.pptx", "deck-a", 1);

        let package = compose(&[&a]).unwrap();
        assert_eq!(
            package.presentation().unwrap().slide_size().unwrap(),
            Some(Size {
                cx: 12_192_000,
                cy: 6_858_000
            })
        );
    }

    #[test]
    fn test_combine_into_and_insert_image() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_deck(dir.path(), "a.pptx", "deck-a", 1);
        let b = write_deck(dir.path(), "b.pptx", "deck-b", 1);
        let out = dir.path().join("merged.pptx");
        combine_into(&[&a, &b], &out).unwrap();

        let image = dir.path().join("photo.PNG");
        std::fs::write(&image, PNG_BYTES).unwrap();

        let mut package = Package::open(&out).unwrap();
        let mut slide = package.slide_mut(1).unwrap();
        let placeholder = slide.layout_placeholder_by_idx(2).unwrap();
        slide.insert_image(&placeholder, &image, 1).unwrap();
        package.save(&out, PartCompression::Stored).unwrap();

        let mut reopened = Package::open(&out).unwrap();
        let slide = reopened.slide_mut(1).unwrap();
        let pictures = slide.pictures().unwrap();
        assert_eq!(pictures.len(), 1);
        let xfrm = pictures[0].transform().unwrap();
        assert_eq!((xfrm.offset.x, xfrm.offset.y), (500, 600));
        assert_eq!((xfrm.extents.cx, xfrm.extents.cy), (700, 800));
    }
}
