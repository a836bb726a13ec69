//! Identifier allocation inside one package.
//!
//! New relationships and shapes are numbered from a preferred value derived
//! from the current size of their namespace, a fixed base and a caller-supplied
//! disambiguator. The allocator owned by each [`OpcPackage`] keeps a high-water
//! mark per scope (the source part of a relationship, the slide of a shape),
//! so ids it hands out are strictly increasing within that scope and never
//! collide with ids already present in it.
//!
//! `peek_*` computes a candidate without recording it; `commit_*` records it.
//! Callers that may still fail between the two leave the allocator untouched.
//!
//! [`OpcPackage`]: crate::ooxml::opc::OpcPackage

use crate::ooxml::opc::rel::Relationships;
use std::collections::{BTreeSet, HashMap};

/// Base added to the relationship count when numbering a new relationship.
pub const REL_ID_BASE: u32 = 100;

/// Base added to the disambiguator when numbering a new shape.
pub const SHAPE_ID_BASE: u32 = 50;

/// First `p:sldId/@id` value allowed by ECMA-376.
pub const FIRST_SLIDE_ID: u32 = 256;

/// First id of the shared slide-master / slide-layout id space.
pub const FIRST_MASTER_ID: u32 = 2_147_483_648;

#[derive(Debug, Clone)]
pub struct IdAllocator {
    rel_high_water: HashMap<String, u32>,
    shape_high_water: HashMap<String, u32>,
    next_slide_id: u32,
    next_master_id: u32,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self {
            rel_high_water: HashMap::new(),
            shape_high_water: HashMap::new(),
            next_slide_id: FIRST_SLIDE_ID,
            next_master_id: FIRST_MASTER_ID,
        }
    }

    /// Candidate relationship number for the relationships of `source`.
    ///
    /// The preferred id is `rId{len + 100 + disambiguator}`. It is used when it
    /// is free and above every id committed for `source` before; otherwise the
    /// next number satisfying both is taken.
    pub fn peek_rel_id(&self, source: &str, scope: &Relationships, disambiguator: u32) -> u32 {
        let used: BTreeSet<u32> = scope.numeric_ids().collect();
        let preferred = u32::try_from(scope.len())
            .unwrap_or(u32::MAX)
            .saturating_add(REL_ID_BASE)
            .saturating_add(disambiguator);

        first_free(preferred, high_water(&self.rel_high_water, source), &used)
    }

    pub fn commit_rel_id(&mut self, source: &str, n: u32) {
        raise(&mut self.rel_high_water, source, n);
    }

    /// Allocate a relationship id for `source` and record it.
    pub fn next_rel_id(&mut self, source: &str, scope: &Relationships, disambiguator: u32) -> String {
        let n = self.peek_rel_id(source, scope, disambiguator);
        self.commit_rel_id(source, n);
        format!("rId{n}")
    }

    /// Candidate shape id for `slide`, whose existing `cNvPr` ids are `used`.
    ///
    /// The preferred id is `50 + disambiguator`, with the same fallback rule as
    /// [`IdAllocator::peek_rel_id`].
    pub fn peek_shape_id(&self, slide: &str, used: &BTreeSet<u32>, disambiguator: u32) -> u32 {
        let preferred = SHAPE_ID_BASE.saturating_add(disambiguator);
        first_free(preferred, high_water(&self.shape_high_water, slide), used)
    }

    pub fn commit_shape_id(&mut self, slide: &str, n: u32) {
        raise(&mut self.shape_high_water, slide, n);
    }

    /// Allocate a shape id for `slide` and record it.
    pub fn next_shape_id(&mut self, slide: &str, used: &BTreeSet<u32>, disambiguator: u32) -> u32 {
        let n = self.peek_shape_id(slide, used, disambiguator);
        self.commit_shape_id(slide, n);
        n
    }

    /// Next `p:sldId/@id`.
    pub fn next_slide_id(&mut self) -> u32 {
        let id = self.next_slide_id;
        self.next_slide_id += 1;
        id
    }

    /// Next id in the slide-master / slide-layout id space.
    pub fn next_master_id(&mut self) -> u32 {
        let id = self.next_master_id;
        self.next_master_id = self.next_master_id.saturating_add(1);
        id
    }

    /// Move the slide and master counters past ids already present in a
    /// package that was read from disk.
    pub fn reserve_existing(&mut self, slide_ids: &[u32], master_ids: &[u32]) {
        if let Some(max) = slide_ids.iter().max() {
            self.next_slide_id = self.next_slide_id.max(max.saturating_add(1));
        }
        if let Some(max) = master_ids.iter().max() {
            self.next_master_id = self.next_master_id.max(max.saturating_add(1));
        }
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

fn high_water(marks: &HashMap<String, u32>, scope: &str) -> u32 {
    marks.get(scope).copied().unwrap_or(0)
}

fn raise(marks: &mut HashMap<String, u32>, scope: &str, n: u32) {
    let mark = marks.entry(scope.to_string()).or_insert(0);
    *mark = (*mark).max(n);
}

/// Smallest n >= preferred with n > high_water and n not in used.
fn first_free(preferred: u32, high_water: u32, used: &BTreeSet<u32>) -> u32 {
    let mut n = preferred.max(high_water.saturating_add(1));
    while used.contains(&n) {
        n += 1;
    }
    n
}
