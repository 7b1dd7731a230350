use crate::types::{Hit, HitId};
use serde::{Deserialize, Serialize};

/// Upper bound on the number of hits a segment may hold.
pub const MAX_SEGMENT_HITS: usize = 3;

/// Handle of a segment inside a [`super::SegmentGraph`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SegmentId(pub u32);

impl SegmentId {
    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// Ordered chain of 1–3 hits, innermost first, acting as one node of the
/// automaton graph.
#[derive(Clone, Debug)]
pub struct Segment {
    hits: Vec<Hit>,
    pub(crate) state: u32,
    pub(crate) parents: Vec<SegmentId>,
    pub(crate) children: Vec<SegmentId>,
}

impl Segment {
    pub fn new(hits: Vec<Hit>) -> Self {
        debug_assert!(
            !hits.is_empty() && hits.len() <= MAX_SEGMENT_HITS,
            "segment length {} out of range",
            hits.len()
        );
        Self {
            hits,
            state: 0,
            parents: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn hits(&self) -> &[Hit] {
        &self.hits
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    /// Innermost hit (closest to the trajectory origin).
    pub fn inner(&self) -> &Hit {
        &self.hits[0]
    }

    /// Outermost hit.
    pub fn outer(&self) -> &Hit {
        &self.hits[self.hits.len() - 1]
    }

    pub fn hit_ids(&self) -> impl Iterator<Item = HitId> + '_ {
        self.hits.iter().map(|h| h.id)
    }

    /// Automaton state: depth of the longest compatible chain ending here.
    pub fn state(&self) -> u32 {
        self.state
    }

    pub fn parents(&self) -> &[SegmentId] {
        &self.parents
    }

    pub fn children(&self) -> &[SegmentId] {
        &self.children
    }

    /// Hits of `self` extended by the outer hit of `child`.
    pub(crate) fn extended_by(&self, child: &Segment) -> Vec<Hit> {
        let mut hits = Vec::with_capacity(self.hits.len() + 1);
        hits.extend_from_slice(&self.hits);
        hits.push(*child.outer());
        hits
    }
}
