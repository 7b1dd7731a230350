//! Best-subset selection among candidate tracks that share hits.
//!
//! Candidates carry the measured hit ids of a track (virtual hits are left
//! out, so two tracks through the interaction point do not conflict) and an
//! externally supplied quality. A selector returns the indices of a
//! pairwise hit-disjoint subset with high total quality.
//!
//! Modules
//! - `simple` – greedy acceptance in descending quality order.
//! - `hopfield` – annealed Hopfield-network relaxation followed by a greedy
//!   disjointness pass.

mod hopfield;
mod simple;

pub use hopfield::{HopfieldParams, HopfieldSubset};
pub use simple::SimpleSubset;

use crate::error::ConfigError;
use crate::types::HitId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// One track candidate as seen by the selectors.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub hit_ids: Vec<HitId>,
    pub quality: f64,
}

impl Candidate {
    pub fn new(hit_ids: Vec<HitId>, quality: f64) -> Self {
        Self { hit_ids, quality }
    }

    pub fn shares_hit(&self, other: &Candidate) -> bool {
        self.hit_ids.iter().any(|id| other.hit_ids.contains(id))
    }
}

/// Outcome of a selection, as indices into the candidate slice.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    /// Accepted candidates in ascending index order.
    pub accepted: Vec<usize>,
    pub rejected: Vec<usize>,
    /// Network iterations; 0 for non-iterative selectors.
    pub iterations: usize,
}

impl Selection {
    fn from_mask(mask: &[bool], iterations: usize) -> Self {
        let (accepted, rejected): (Vec<usize>, Vec<usize>) = (0..mask.len()).partition(|&i| mask[i]);
        Self {
            accepted,
            rejected,
            iterations,
        }
    }
}

pub trait SubsetSelector: fmt::Debug + Send + Sync {
    fn select(&self, candidates: &[Candidate]) -> Selection;
}

/// Accepts every candidate, overlaps included.
#[derive(Clone, Copy, Debug, Default)]
pub struct KeepAll;

impl SubsetSelector for KeepAll {
    fn select(&self, candidates: &[Candidate]) -> Selection {
        Selection::from_mask(&vec![true; candidates.len()], 0)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SubsetStrategy {
    /// No selection: overlapping tracks are all kept.
    None,
    Simple,
    #[default]
    Hopfield,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SubsetParams {
    pub strategy: SubsetStrategy,
    pub hopfield: HopfieldParams,
}

impl SubsetParams {
    /// Instantiates the configured selector.
    pub fn selector(&self) -> Result<Box<dyn SubsetSelector>, ConfigError> {
        Ok(match self.strategy {
            SubsetStrategy::None => Box::new(KeepAll),
            SubsetStrategy::Simple => Box::new(SimpleSubset),
            SubsetStrategy::Hopfield => Box::new(HopfieldSubset::new(self.hopfield)?),
        })
    }
}

/// Candidate indices in descending quality; equal qualities keep input
/// order.
fn by_quality(candidates: &[Candidate]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..candidates.len()).collect();
    order.sort_by(|&a, &b| candidates[b].quality.total_cmp(&candidates[a].quality));
    order
}

/// Greedy pass over `order`: a candidate is kept if `eligible` allows it and
/// it shares no hit with a candidate kept before.
fn greedy_disjoint(candidates: &[Candidate], order: &[usize], eligible: impl Fn(usize) -> bool) -> Vec<bool> {
    let mut used: BTreeSet<HitId> = BTreeSet::new();
    let mut mask = vec![false; candidates.len()];
    for &i in order {
        if !eligible(i) {
            continue;
        }
        let hits = &candidates[i].hit_ids;
        if hits.iter().any(|id| used.contains(id)) {
            continue;
        }
        used.extend(hits.iter().copied());
        mask[i] = true;
    }
    mask
}

/// Conflict lists: `conflicts[i]` holds every `j != i` sharing a hit with `i`.
fn conflict_lists(candidates: &[Candidate]) -> Vec<Vec<usize>> {
    let mut by_hit: BTreeMap<HitId, Vec<usize>> = BTreeMap::new();
    for (i, candidate) in candidates.iter().enumerate() {
        for &id in &candidate.hit_ids {
            by_hit.entry(id).or_default().push(i);
        }
    }
    let mut conflicts: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); candidates.len()];
    for owners in by_hit.values() {
        for &a in owners {
            for &b in owners {
                if a != b {
                    conflicts[a].insert(b);
                }
            }
        }
    }
    conflicts.into_iter().map(|s| s.into_iter().collect()).collect()
}

/// True when no two accepted candidates share a hit.
pub fn is_disjoint(candidates: &[Candidate], accepted: &[usize]) -> bool {
    let mut used: BTreeSet<HitId> = BTreeSet::new();
    accepted.iter().all(|&i| {
        let own: BTreeSet<HitId> = candidates[i].hit_ids.iter().copied().collect();
        let clash = own.iter().any(|id| used.contains(id));
        used.extend(own);
        !clash
    })
}
