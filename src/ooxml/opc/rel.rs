use crate::ooxml::opc::error::{OpcError, Result};
use crate::ooxml::opc::packuri::PackURI;
use quick_xml::escape::escape;
/// Relationship-related objects for OPC packages.
///
/// A relationship scope is either the package root or a single source part.
/// Relationship ids are unique within their scope; `Relationships::add`
/// refuses to break that invariant.
use std::collections::HashMap;

/// A single relationship from a source part to a target.
///
/// Internal relationships point at another part through a reference relative
/// to the source part's folder. External relationships carry a URL.
#[derive(Debug, Clone)]
pub struct Relationship {
    /// Relationship ID (e.g., "rId1", "rId2")
    r_id: String,

    /// Relationship type URI
    reltype: String,

    /// Target reference - either a relative part reference or external URL
    target_ref: String,

    /// Base URI for resolving relative references
    base_uri: String,

    /// Whether this is an external relationship
    is_external: bool,
}

impl Relationship {
    pub fn new(
        r_id: String,
        reltype: String,
        target_ref: String,
        base_uri: String,
        is_external: bool,
    ) -> Self {
        Self {
            r_id,
            reltype,
            target_ref,
            base_uri,
            is_external,
        }
    }

    #[inline]
    pub fn r_id(&self) -> &str {
        &self.r_id
    }

    #[inline]
    pub fn reltype(&self) -> &str {
        &self.reltype
    }

    #[inline]
    pub fn target_ref(&self) -> &str {
        &self.target_ref
    }

    #[inline]
    pub fn is_external(&self) -> bool {
        self.is_external
    }

    /// Numeric suffix of an `rIdN` identifier.
    #[inline]
    pub fn r_id_number(&self) -> Option<u32> {
        r_id_number(&self.r_id)
    }

    /// Absolute partname of the target; an error for external relationships.
    pub fn target_partname(&self) -> Result<PackURI> {
        if self.is_external {
            return Err(OpcError::InvalidRelationship(format!(
                "{} is external and has no target partname",
                self.r_id
            )));
        }
        PackURI::from_rel_ref(&self.base_uri, &self.target_ref)
    }
}

/// Parse the number out of an `rId123` identifier.
pub(crate) fn r_id_number(r_id: &str) -> Option<u32> {
    r_id.strip_prefix("rId")
        .and_then(|digits| atoi_simd::parse::<u32, false, false>(digits.as_bytes()).ok())
}

/// Collection of relationships from a single source.
#[derive(Debug)]
pub struct Relationships {
    /// Base URI for resolving relative references
    base_uri: String,

    /// Map of relationship ID to Relationship
    rels: HashMap<String, Relationship>,
}

impl Relationships {
    pub fn new(base_uri: String) -> Self {
        Self {
            base_uri,
            rels: HashMap::new(),
        }
    }

    #[inline]
    pub fn base_uri(&self) -> &str {
        &self.base_uri
    }

    /// Add a relationship under an explicit id.
    ///
    /// Fails with [`OpcError::DuplicateRelationship`] if the id is already
    /// used in this scope.
    pub fn add(
        &mut self,
        reltype: &str,
        target_ref: &str,
        r_id: &str,
        is_external: bool,
    ) -> Result<&Relationship> {
        use std::collections::hash_map::Entry;

        match self.rels.entry(r_id.to_string()) {
            Entry::Occupied(_) => Err(OpcError::DuplicateRelationship {
                r_id: r_id.to_string(),
                scope: self.base_uri.clone(),
            }),
            Entry::Vacant(slot) => Ok(&*slot.insert(Relationship::new(
                r_id.to_string(),
                reltype.to_string(),
                target_ref.to_string(),
                self.base_uri.clone(),
                is_external,
            ))),
        }
    }

    #[inline]
    pub fn get(&self, r_id: &str) -> Option<&Relationship> {
        self.rels.get(r_id)
    }

    #[inline]
    pub fn contains(&self, r_id: &str) -> bool {
        self.rels.contains_key(r_id)
    }

    /// Get or add an internal relationship to a target.
    ///
    /// Reuses an existing relationship of the same type and target, otherwise
    /// creates one under the lowest free `rIdN`.
    pub fn get_or_add(&mut self, reltype: &str, target_ref: &str) -> Result<String> {
        if let Some(rel) = self.rels.values().find(|rel| {
            rel.reltype() == reltype && rel.target_ref() == target_ref && !rel.is_external()
        }) {
            return Ok(rel.r_id().to_string());
        }

        let r_id = self.next_r_id();
        self.add(reltype, target_ref, &r_id, false)?;
        Ok(r_id)
    }

    /// Lowest `rIdN` not yet used, filling gaps.
    pub fn next_r_id(&self) -> String {
        let mut used: Vec<u32> = self.numeric_ids().collect();
        used.sort_unstable();

        let mut next_num = 1u32;
        for num in used {
            match num.cmp(&next_num) {
                std::cmp::Ordering::Equal => next_num += 1,
                std::cmp::Ordering::Greater => break,
                std::cmp::Ordering::Less => {},
            }
        }

        format!("rId{next_num}")
    }

    /// Numeric suffixes of all `rIdN` identifiers in this scope.
    pub fn numeric_ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.rels.keys().filter_map(|r_id| r_id_number(r_id))
    }

    /// The single relationship of a type.
    ///
    /// Returns an error if no relationship of the type is found,
    /// or if multiple relationships of the type exist.
    pub fn part_with_reltype(&self, reltype: &str) -> Result<&Relationship> {
        let mut matching = self.rels.values().filter(|rel| rel.reltype() == reltype);

        match (matching.next(), matching.next()) {
            (None, _) => Err(OpcError::RelationshipNotFound(format!(
                "No relationship of type '{reltype}'"
            ))),
            (Some(rel), None) => Ok(rel),
            (Some(_), Some(_)) => Err(OpcError::InvalidRelationship(format!(
                "Multiple relationships of type '{reltype}'"
            ))),
        }
    }

    /// Relationships in id order (`rId2` before `rId10`).
    pub fn sorted(&self) -> Vec<&Relationship> {
        let mut rels: Vec<&Relationship> = self.rels.values().collect();
        rels.sort_by(|a, b| {
            a.r_id_number()
                .cmp(&b.r_id_number())
                .then_with(|| a.r_id().cmp(b.r_id()))
        });
        rels
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Relationship> {
        self.rels.values()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rels.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rels.is_empty()
    }

    /// Serialize to the XML of a `.rels` part.
    pub fn to_xml(&self) -> String {
        let mut xml = String::with_capacity(128 + self.rels.len() * 160);

        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push('\n');
        xml.push_str(
            r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        );

        for rel in self.sorted() {
            let target_mode = if rel.is_external() {
                r#" TargetMode="External""#
            } else {
                ""
            };

            xml.push_str(&format!(
                r#"<Relationship Id="{}" Type="{}" Target="{}"{}/>"#,
                escape(rel.r_id()),
                escape(rel.reltype()),
                escape(rel.target_ref()),
                target_mode
            ));
        }

        xml.push_str("</Relationships>");
        xml
    }
}

impl Default for Relationships {
    fn default() -> Self {
        Self::new("/".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_id_rejected() {
        let mut rels = Relationships::new("/ppt/slides".to_string());
        rels.add("type1", "../a.xml", "rId1", false).unwrap();

        let err = rels.add("type2", "../b.xml", "rId1", false).unwrap_err();
        assert!(matches!(err, OpcError::DuplicateRelationship { ref r_id, .. } if r_id == "rId1"));
        assert_eq!(rels.len(), 1);
        assert_eq!(rels.get("rId1").unwrap().target_ref(), "../a.xml");
    }

    #[test]
    fn test_next_r_id_fills_gaps() {
        let mut rels = Relationships::new("/ppt".to_string());
        assert_eq!(rels.next_r_id(), "rId1");

        rels.add("t", "a.xml", "rId1", false).unwrap();
        rels.add("t", "c.xml", "rId3", false).unwrap();
        assert_eq!(rels.next_r_id(), "rId2");
    }

    #[test]
    fn test_get_or_add() {
        let mut rels = Relationships::new("/ppt".to_string());

        assert_eq!(rels.get_or_add("type1", "target1").unwrap(), "rId1");
        assert_eq!(rels.get_or_add("type1", "target1").unwrap(), "rId1");
        assert_eq!(rels.get_or_add("type1", "target2").unwrap(), "rId2");
    }

    #[test]
    fn test_target_partname() {
        let mut rels = Relationships::new("/ppt/slides".to_string());
        let rel = rels
            .add("t", "../media/image1.png", "rId2", false)
            .unwrap()
            .clone();
        assert_eq!(rel.target_partname().unwrap().as_str(), "/ppt/media/image1.png");

        let ext = rels.add("t", "https://example.com", "rId3", true).unwrap();
        assert!(ext.target_partname().is_err());
    }

    #[test]
    fn test_to_xml_numeric_order() {
        let mut rels = Relationships::new("/ppt".to_string());
        rels.add("t", "b.xml", "rId10", false).unwrap();
        rels.add("t", "a.xml", "rId2", false).unwrap();
        rels.add("t", "https://x.test/?a=1&b=2", "rId3", true).unwrap();

        let xml = rels.to_xml();
        let pos2 = xml.find(r#"Id="rId2""#).unwrap();
        let pos10 = xml.find(r#"Id="rId10""#).unwrap();
        assert!(pos2 < pos10);
        assert!(xml.contains(r#"Target="https://x.test/?a=1&amp;b=2" TargetMode="External""#));
    }
}
