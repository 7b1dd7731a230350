use super::{by_quality, greedy_disjoint, Candidate, Selection, SubsetSelector};

/// Accepts candidates in descending quality unless they share a hit with a
/// candidate accepted before.
#[derive(Clone, Copy, Debug, Default)]
pub struct SimpleSubset;

impl SubsetSelector for SimpleSubset {
    fn select(&self, candidates: &[Candidate]) -> Selection {
        let order = by_quality(candidates);
        let mask = greedy_disjoint(candidates, &order, |_| true);
        Selection::from_mask(&mask, 0)
    }
}
