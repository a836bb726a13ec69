//! Minimal presentations for tests, built in memory with `zip::ZipWriter`.
//!
//! A deck has `slides` slides sharing one layout, master and theme. The
//! slide at position `k` (1-based, `p:sldIdLst` order) says `"{label} {k}"`
//! and is stored as `slide{slides + 1 - k}.xml`, so storage order is the
//! reverse of presentation order.
//!
//! The layout carries a title placeholder at (100, 200) sized (300, 400), a
//! picture placeholder with `idx="1"` and no transform, and a body
//! placeholder with `idx="2"` at (500, 600) sized (700, 800).
//!
//! With `extras`, the first slide also has a picture bound to
//! `/ppt/media/image1.png`, an external hyperlink and a notes slide whose
//! notes master has its own theme. When there is a second slide, the first
//! one links to it with `rId5`.

use crate::ooxml::opc::constants::{content_type as ct, namespace, relationship_type as rt};
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// Bytes standing in for a PNG file.
pub const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR fixture";

const SLIDE_SIZE: (i64, i64) = (12_192_000, 6_858_000);

fn ns() -> String {
    format!(
        r#"xmlns:a="{}" xmlns:r="{}" xmlns:p="{}""#,
        namespace::DML_MAIN,
        namespace::OFC_RELATIONSHIPS,
        namespace::PML_MAIN
    )
}

const TREE_ROOT: &str = r#"<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/>"#;

fn rels_xml(rels: &[(&str, &str, &str, bool)]) -> String {
    let mut xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="{}">"#,
        namespace::OPC_RELATIONSHIPS
    );
    for (r_id, reltype, target, external) in rels {
        let mode = if *external { r#" TargetMode="External""# } else { "" };
        xml.push_str(&format!(
            r#"<Relationship Id="{r_id}" Type="{reltype}" Target="{target}"{mode}/>"#
        ));
    }
    xml.push_str("</Relationships>");
    xml
}

fn slide_xml(label: &str, position: usize, with_picture: bool) -> String {
    let picture = if with_picture {
        r#"<p:pic><p:nvPicPr><p:cNvPr id="3" name="Logo"/><p:cNvPicPr/><p:nvPr/></p:nvPicPr><p:blipFill><a:blip r:embed="rId2"/><a:stretch><a:fillRect/></a:stretch></p:blipFill><p:spPr><a:xfrm><a:off x="10" y="10"/><a:ext cx="20" cy="20"/></a:xfrm></p:spPr></p:pic>"#
    } else {
        ""
    };
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><p:sld {}><p:cSld><p:spTree>{TREE_ROOT}<p:sp><p:nvSpPr><p:cNvPr id="2" name="Title 1"/><p:cNvSpPr/><p:nvPr><p:ph type="title"/></p:nvPr></p:nvSpPr><p:spPr/><p:txBody><a:bodyPr/><a:p><a:r><a:t>{label} {position}</a:t></a:r></a:p></p:txBody></p:sp>{picture}</p:spTree></p:cSld></p:sld>"#,
        ns()
    )
}

fn layout_xml() -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><p:sldLayout {}><p:cSld name="Title and Picture"><p:spTree>{TREE_ROOT}<p:sp><p:nvSpPr><p:cNvPr id="2" name="Title 1"/><p:cNvSpPr/><p:nvPr><p:ph type="title"/></p:nvPr></p:nvSpPr><p:spPr><a:xfrm><a:off x="100" y="200"/><a:ext cx="300" cy="400"/></a:xfrm></p:spPr></p:sp><p:sp><p:nvSpPr><p:cNvPr id="3" name="Picture Placeholder 2"/><p:cNvSpPr/><p:nvPr><p:ph type="pic" idx="1"/></p:nvPr></p:nvSpPr><p:spPr/></p:sp><p:sp><p:nvSpPr><p:cNvPr id="4" name="Text Placeholder 3"/><p:cNvSpPr/><p:nvPr><p:ph idx="2"/></p:nvPr></p:nvSpPr><p:spPr><a:xfrm><a:off x="500" y="600"/><a:ext cx="700" cy="800"/></a:xfrm></p:spPr></p:sp></p:spTree></p:cSld></p:sldLayout>"#,
        ns()
    )
}

fn master_xml() -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><p:sldMaster {}><p:cSld><p:spTree>{TREE_ROOT}</p:spTree></p:cSld><p:sldLayoutIdLst><p:sldLayoutId id="2147483649" r:id="rId1"/></p:sldLayoutIdLst></p:sldMaster>"#,
        ns()
    )
}

fn theme_xml(name: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><a:theme xmlns:a="{}" name="{name}"><a:themeElements/></a:theme>"#,
        namespace::DML_MAIN
    )
}

fn presentation_xml(slides: usize, extras: bool) -> String {
    let mut xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><p:presentation {}><p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst>"#,
        ns()
    );
    if extras {
        xml.push_str(&format!(
            r#"<p:notesMasterIdLst><p:notesMasterId r:id="rId{}"/></p:notesMasterIdLst>"#,
            slides + 3
        ));
    }
    xml.push_str("<p:sldIdLst>");
    for position in 1..=slides {
        xml.push_str(&format!(
            r#"<p:sldId id="{}" r:id="rId{}"/>"#,
            255 + position,
            position + 1
        ));
    }
    xml.push_str(&format!(
        r#"</p:sldIdLst><p:sldSz cx="{}" cy="{}"/><p:notesSz cx="6858000" cy="9144000"/></p:presentation>"#,
        SLIDE_SIZE.0, SLIDE_SIZE.1
    ));
    xml
}

/// Bytes of a deck whose slides say `"{label} 1"`, `"{label} 2"`, ...
pub fn deck_bytes(label: &str, slides: usize, extras: bool) -> Vec<u8> {
    let mut zip_data = Vec::new();
    let mut writer = ZipWriter::new(Cursor::new(&mut zip_data));
    let options = SimpleFileOptions::default();
    let mut put = |name: &str, body: &[u8]| {
        writer.start_file(name, options).unwrap();
        writer.write_all(body).unwrap();
    };

    let file_of = |position: usize| slides + 1 - position;

    let mut overrides = String::new();
    let mut override_for = |partname: String, content_type: &str| {
        overrides.push_str(&format!(
            r#"<Override PartName="{partname}" ContentType="{content_type}"/>"#
        ));
    };
    override_for("/ppt/presentation.xml".into(), ct::PML_PRESENTATION_MAIN);
    for n in 1..=slides {
        override_for(format!("/ppt/slides/slide{n}.xml"), ct::PML_SLIDE);
    }
    override_for("/ppt/slideLayouts/slideLayout1.xml".into(), ct::PML_SLIDE_LAYOUT);
    override_for("/ppt/slideMasters/slideMaster1.xml".into(), ct::PML_SLIDE_MASTER);
    override_for("/ppt/theme/theme1.xml".into(), ct::OFC_THEME);
    if extras {
        override_for("/ppt/notesSlides/notesSlide1.xml".into(), ct::PML_NOTES_SLIDE);
        override_for("/ppt/notesMasters/notesMaster1.xml".into(), ct::PML_NOTES_MASTER);
        override_for("/ppt/theme/theme2.xml".into(), ct::OFC_THEME);
    }

    put(
        "[Content_Types].xml",
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Types xmlns="{}"><Default Extension="rels" ContentType="{}"/><Default Extension="xml" ContentType="{}"/><Default Extension="png" ContentType="{}"/>{overrides}</Types>"#,
            namespace::OPC_CONTENT_TYPES,
            ct::OPC_RELATIONSHIPS,
            ct::XML,
            ct::PNG
        )
        .as_bytes(),
    );
    put(
        "_rels/.rels",
        rels_xml(&[("rId1", rt::OFFICE_DOCUMENT, "ppt/presentation.xml", false)]).as_bytes(),
    );

    put("ppt/presentation.xml", presentation_xml(slides, extras).as_bytes());
    let mut pres_rels = vec![(
        "rId1".to_string(),
        rt::SLIDE_MASTER,
        "slideMasters/slideMaster1.xml".to_string(),
    )];
    for position in 1..=slides {
        pres_rels.push((
            format!("rId{}", position + 1),
            rt::SLIDE,
            format!("slides/slide{}.xml", file_of(position)),
        ));
    }
    pres_rels.push((format!("rId{}", slides + 2), rt::THEME, "theme/theme1.xml".into()));
    if extras {
        pres_rels.push((
            format!("rId{}", slides + 3),
            rt::NOTES_MASTER,
            "notesMasters/notesMaster1.xml".into(),
        ));
    }
    let pres_rels: Vec<(&str, &str, &str, bool)> = pres_rels
        .iter()
        .map(|(r_id, reltype, target)| (r_id.as_str(), *reltype, target.as_str(), false))
        .collect();
    put("ppt/_rels/presentation.xml.rels", rels_xml(&pres_rels).as_bytes());

    for position in 1..=slides {
        let n = file_of(position);
        let with_extras = extras && position == 1;
        put(
            &format!("ppt/slides/slide{n}.xml"),
            slide_xml(label, position, with_extras).as_bytes(),
        );

        let mut rels = vec![(
            "rId1",
            rt::SLIDE_LAYOUT,
            "../slideLayouts/slideLayout1.xml",
            false,
        )];
        if with_extras {
            rels.push(("rId2", rt::IMAGE, "../media/image1.png", false));
            rels.push(("rId3", rt::HYPERLINK, "https://example.com/deck", true));
            rels.push(("rId4", rt::NOTES_SLIDE, "../notesSlides/notesSlide1.xml", false));
        }
        let jump = (with_extras && slides >= 2).then(|| format!("slide{}.xml", file_of(2)));
        if let Some(jump) = &jump {
            rels.push(("rId5", rt::SLIDE, jump.as_str(), false));
        }
        put(&format!("ppt/slides/_rels/slide{n}.xml.rels"), rels_xml(&rels).as_bytes());
    }

    put("ppt/slideLayouts/slideLayout1.xml", layout_xml().as_bytes());
    put(
        "ppt/slideLayouts/_rels/slideLayout1.xml.rels",
        rels_xml(&[("rId1", rt::SLIDE_MASTER, "../slideMasters/slideMaster1.xml", false)])
            .as_bytes(),
    );
    put("ppt/slideMasters/slideMaster1.xml", master_xml().as_bytes());
    put(
        "ppt/slideMasters/_rels/slideMaster1.xml.rels",
        rels_xml(&[
            ("rId1", rt::SLIDE_LAYOUT, "../slideLayouts/slideLayout1.xml", false),
            ("rId2", rt::THEME, "../theme/theme1.xml", false),
        ])
        .as_bytes(),
    );
    put("ppt/theme/theme1.xml", theme_xml(label).as_bytes());

    if extras {
        put("ppt/media/image1.png", PNG_BYTES);
        put(
            "ppt/notesSlides/notesSlide1.xml",
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><p:notes {}><p:cSld><p:spTree>{TREE_ROOT}</p:spTree></p:cSld></p:notes>"#,
                ns()
            )
            .as_bytes(),
        );
        let back_to_slide = format!("../slides/slide{}.xml", file_of(1));
        put(
            "ppt/notesSlides/_rels/notesSlide1.xml.rels",
            rels_xml(&[
                ("rId1", rt::NOTES_MASTER, "../notesMasters/notesMaster1.xml", false),
                ("rId2", rt::SLIDE, back_to_slide.as_str(), false),
            ])
            .as_bytes(),
        );
        put(
            "ppt/notesMasters/notesMaster1.xml",
            format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><p:notesMaster {}><p:cSld><p:spTree>{TREE_ROOT}</p:spTree></p:cSld></p:notesMaster>"#,
                ns()
            )
            .as_bytes(),
        );
        put(
            "ppt/notesMasters/_rels/notesMaster1.xml.rels",
            rels_xml(&[("rId1", rt::THEME, "../theme/theme2.xml", false)]).as_bytes(),
        );
        put("ppt/theme/theme2.xml", theme_xml("Notes").as_bytes());
    }

    writer.finish().unwrap();
    zip_data
}

/// Write a deck without extras to `dir/name`.
pub fn write_deck(dir: &Path, name: &str, label: &str, slides: usize) -> PathBuf {
    write_deck_with(dir, name, label, slides, false)
}

pub fn write_deck_with(dir: &Path, name: &str, label: &str, slides: usize, extras: bool) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, deck_bytes(label, slides, extras)).unwrap();
    path
}
