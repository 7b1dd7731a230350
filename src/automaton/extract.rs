//! Raw-track extraction from a relaxed graph.

use super::{Automaton, TieBreak};
use crate::geometry::angle_between;
use crate::graph::{Segment, SegmentId};
use crate::types::{HitId, RawTrack};
use log::debug;
use nalgebra::Vector3;
use std::collections::BTreeSet;

impl Automaton {
    /// Walks back from every chain end (a segment without compatible
    /// children) through the highest-state compatible parents until a root is
    /// reached. Each walk yields the root's hits followed by the outer hit of
    /// every later segment. Identical hit sequences are reported once.
    pub fn raw_tracks(&self) -> Vec<RawTrack> {
        let children = self.compatible_children();
        let mut seen: BTreeSet<Vec<HitId>> = BTreeSet::new();
        let mut tracks = Vec::new();
        let mut ends = 0usize;
        for (end, _) in self.graph.iter() {
            if !children[end.index()].is_empty() {
                continue;
            }
            ends += 1;
            for chain in self.chains_ending_at(end) {
                let track = self.track_from_chain(&chain);
                if seen.insert(track.hit_ids().collect()) {
                    tracks.push(track);
                }
            }
        }
        debug!(
            "Automaton::raw_tracks ends={} tracks={} tie_break={:?}",
            ends,
            tracks.len(),
            self.params.tie_break
        );
        tracks
    }

    /// Chains as segment ids, outermost first.
    fn chains_ending_at(&self, end: SegmentId) -> Vec<Vec<SegmentId>> {
        let cap = self.params.max_branches.max(1);
        let mut done = Vec::new();
        let mut stack = vec![vec![end]];
        while let Some(chain) = stack.pop() {
            let Some(&last) = chain.last() else {
                continue;
            };
            let parents = self.best_parents(last);
            if parents.is_empty() {
                done.push(chain);
                if done.len() >= cap {
                    break;
                }
                continue;
            }
            for &parent in parents.iter().rev() {
                let mut next = chain.clone();
                next.push(parent);
                stack.push(next);
            }
        }
        done
    }

    fn best_parents(&self, id: SegmentId) -> Vec<SegmentId> {
        let parents = self.compatible_parents(id);
        let Some(best) = parents.iter().map(|&p| self.graph.segment(p).state()).max() else {
            return Vec::new();
        };
        let mut tied: Vec<SegmentId> = parents
            .iter()
            .copied()
            .filter(|&p| self.graph.segment(p).state() == best)
            .collect();
        tied.sort_unstable();
        match self.params.tie_break {
            TieBreak::Branch => tied,
            TieBreak::Straightest => {
                let child = self.graph.segment(id);
                tied.into_iter()
                    .map(|p| (p, bend(self.graph.segment(p), child)))
                    .min_by(|a, b| a.1.total_cmp(&b.1))
                    .map(|(p, _)| vec![p])
                    .unwrap_or_default()
            }
        }
    }

    fn track_from_chain(&self, chain: &[SegmentId]) -> RawTrack {
        let mut inward = chain.iter().rev();
        let mut hits = match inward.next() {
            Some(&root) => self.graph.segment(root).hits().to_vec(),
            None => Vec::new(),
        };
        for &id in inward {
            hits.push(*self.graph.segment(id).outer());
        }
        RawTrack::new(hits)
    }
}

fn direction(segment: &Segment) -> Vector3<f64> {
    if segment.len() >= 2 {
        segment.outer().position - segment.inner().position
    } else {
        segment.inner().position
    }
}

/// Angle (radians) between the directions of two joined segments.
fn bend(parent: &Segment, child: &Segment) -> f64 {
    angle_between(&direction(parent), &direction(child)).unwrap_or(0.0)
}
