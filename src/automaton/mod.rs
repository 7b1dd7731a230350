//! Cellular-automaton relaxation over the segment graph.
//!
//! Overview
//! - [`Automaton::lengthen_segments`] turns every edge of an `n`-hit graph
//!   into an `(n+1)`-hit segment and every two-edge path into an edge.
//! - [`Automaton::relax`] evaluates each edge once against the criteria for
//!   the current segment length and propagates integer states to a fixed
//!   point: `state(S) = 1 + max(state(P))` over compatible parents `P`, or 0
//!   without one.
//! - [`Automaton::clean_bad_states`] removes segments that do not lie on a
//!   compatible chain from an anchor; [`Automaton::clean_bad_connections`]
//!   drops edges failing the criteria.
//! - [`Automaton::raw_tracks`] walks back from every chain end through the
//!   highest-state parents.
//!
//! Relaxation is Gauss–Seidel in topological order (inner layer first), so a
//! single sweep already settles every state; the next sweep confirms the
//! fixed point. Sweeps are capped at `live segments + 1`.

mod extract;
pub mod params;


pub use params::{AutomatonParams, ChainAnchor, TieBreak};

use crate::criteria::{are_compatible, Criterion};
use crate::error::{CriterionError, TrackingError};
use crate::graph::{SegmentGraph, SegmentId, MAX_SEGMENT_HITS};
use log::{debug, warn};
use serde::Serialize;
use std::collections::{BTreeMap, VecDeque};

/// Counters of one [`Automaton::relax`] run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelaxStats {
    /// Full passes over the graph, including the confirming pass.
    pub sweeps: usize,
    pub edges_evaluated: usize,
    pub edges_compatible: usize,
    pub max_state: u32,
}

/// Segment graph plus the automaton's per-run bookkeeping.
#[derive(Clone, Debug, Default)]
pub struct Automaton {
    graph: SegmentGraph,
    params: AutomatonParams,
    /// Compatible parents per segment slot, recorded by the last `relax`.
    compatible: Option<Vec<Vec<SegmentId>>>,
}

impl Automaton {
    pub fn new(graph: SegmentGraph) -> Self {
        Self::with_params(graph, AutomatonParams::default())
    }

    pub fn with_params(graph: SegmentGraph, params: AutomatonParams) -> Self {
        Self {
            graph,
            params,
            compatible: None,
        }
    }

    pub fn set_params(&mut self, params: AutomatonParams) {
        self.params = params;
    }

    pub fn params(&self) -> &AutomatonParams {
        &self.params
    }

    pub fn graph(&self) -> &SegmentGraph {
        &self.graph
    }

    pub fn into_graph(self) -> SegmentGraph {
        self.graph
    }

    /// Live segments.
    pub fn len(&self) -> usize {
        self.graph.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Hit count shared by all segments, `None` on an empty graph.
    pub fn segment_len(&self) -> Option<usize> {
        self.graph.iter().next().map(|(_, s)| s.len())
    }

    /// Replaces the graph of `n`-hit segments by the graph of `(n+1)`-hit
    /// segments: one segment per edge `P → C` (hits of `P` followed by the
    /// outer hit of `C`) and one edge per path `P → S → C`.
    pub fn lengthen_segments(&mut self) -> Result<(), TrackingError> {
        let Some(len) = self.segment_len() else {
            return Ok(());
        };
        if len >= MAX_SEGMENT_HITS {
            return Err(TrackingError::SegmentLimit {
                max: MAX_SEGMENT_HITS,
            });
        }

        let mut next = SegmentGraph::with_capacity(self.graph.edge_count());
        let mut by_edge: BTreeMap<(SegmentId, SegmentId), SegmentId> = BTreeMap::new();
        for (id, segment) in self.graph.iter() {
            for &child in segment.children() {
                let hits = segment.extended_by(self.graph.segment(child));
                by_edge.insert((id, child), next.add(hits));
            }
        }
        for (id, segment) in self.graph.iter() {
            for &parent in segment.parents() {
                for &child in segment.children() {
                    if let (Some(&p), Some(&c)) = (by_edge.get(&(parent, id)), by_edge.get(&(id, child))) {
                        next.connect(p, c);
                    }
                }
            }
        }
        debug!(
            "Automaton::lengthen_segments {}-hit: segments {} -> {}, edges {} -> {}",
            len,
            self.graph.len(),
            next.len(),
            self.graph.edge_count(),
            next.edge_count()
        );
        self.graph = next;
        self.compatible = None;
        Ok(())
    }

    /// Evaluates every edge against `criteria` and iterates the state update
    /// to its fixed point. Compatible-parent lists are kept for the cleanup
    /// and extraction passes.
    pub fn relax(&mut self, criteria: &[&dyn Criterion]) -> Result<RelaxStats, CriterionError> {
        let mut stats = RelaxStats::default();
        let mut compatible = vec![Vec::new(); self.graph.id_bound()];
        for (id, segment) in self.graph.iter() {
            for &parent in segment.parents() {
                stats.edges_evaluated += 1;
                if are_compatible(criteria, self.graph.segment(parent), segment)? {
                    compatible[id.index()].push(parent);
                    stats.edges_compatible += 1;
                }
            }
        }

        let order = self.graph.topological_order();
        let max_sweeps = order.len() + 1;
        loop {
            stats.sweeps += 1;
            let mut changed = false;
            for &id in &order {
                let state = compatible[id.index()]
                    .iter()
                    .map(|&p| self.graph.segment(p).state + 1)
                    .max()
                    .unwrap_or(0);
                let segment = self.graph.segment_mut(id);
                if segment.state != state {
                    segment.state = state;
                    changed = true;
                }
            }
            if !changed {
                break;
            }
            if stats.sweeps >= max_sweeps {
                warn!("Automaton::relax stopped after {} sweeps without a fixed point", stats.sweeps);
                break;
            }
        }
        stats.max_state = self.graph.iter().map(|(_, s)| s.state).max().unwrap_or(0);
        debug!(
            "Automaton::relax segments={} edges={} compatible={} sweeps={} max_state={}",
            self.graph.len(),
            stats.edges_evaluated,
            stats.edges_compatible,
            stats.sweeps,
            stats.max_state
        );
        self.compatible = Some(compatible);
        Ok(stats)
    }

    /// Compatible parents of `id`: the relaxation verdicts when available,
    /// otherwise every graph parent.
    pub(crate) fn compatible_parents(&self, id: SegmentId) -> &[SegmentId] {
        match &self.compatible {
            Some(lists) => lists.get(id.index()).map(Vec::as_slice).unwrap_or(&[]),
            None => self.graph.segment(id).parents(),
        }
    }

    /// Inverse of [`Self::compatible_parents`] for every live segment.
    pub(crate) fn compatible_children(&self) -> Vec<Vec<SegmentId>> {
        let mut children = vec![Vec::new(); self.graph.id_bound()];
        for id in self.graph.ids() {
            for &parent in self.compatible_parents(id) {
                children[parent.index()].push(id);
            }
        }
        children
    }

    /// Removes every segment that is not on a compatible chain starting at
    /// an anchor (see [`ChainAnchor`]). Returns the number removed.
    pub fn clean_bad_states(&mut self) -> usize {
        let children = self.compatible_children();
        let mut keep = vec![false; self.graph.id_bound()];
        let mut queue = VecDeque::new();
        for (id, segment) in self.graph.iter() {
            if !self.compatible_parents(id).is_empty() {
                continue;
            }
            let anchored = match self.params.anchor {
                ChainAnchor::VirtualHit => segment.inner().is_virtual,
                ChainAnchor::Any => !children[id.index()].is_empty(),
            };
            if anchored {
                keep[id.index()] = true;
                queue.push_back(id);
            }
        }
        while let Some(id) = queue.pop_front() {
            for &child in &children[id.index()] {
                if !keep[child.index()] {
                    keep[child.index()] = true;
                    queue.push_back(child);
                }
            }
        }

        let doomed: Vec<SegmentId> = self.graph.ids().filter(|id| !keep[id.index()]).collect();
        for &id in &doomed {
            self.graph.remove(id);
        }
        if let Some(lists) = self.compatible.as_mut() {
            for (index, parents) in lists.iter_mut().enumerate() {
                if keep[index] {
                    parents.retain(|p| keep[p.index()]);
                } else {
                    parents.clear();
                }
            }
        }
        debug!(
            "Automaton::clean_bad_states removed={} remaining={}",
            doomed.len(),
            self.graph.len()
        );
        doomed.len()
    }

    /// Re-evaluates every remaining edge and disconnects those that fail.
    /// Returns the number of edges removed.
    pub fn clean_bad_connections(&mut self, criteria: &[&dyn Criterion]) -> Result<usize, CriterionError> {
        let mut failing = Vec::new();
        for (id, segment) in self.graph.iter() {
            for &parent in segment.parents() {
                if !are_compatible(criteria, self.graph.segment(parent), segment)? {
                    failing.push((parent, id));
                }
            }
        }
        for &(parent, child) in &failing {
            self.graph.disconnect(parent, child);
            if let Some(list) = self.compatible.as_mut().and_then(|l| l.get_mut(child.index())) {
                list.retain(|&p| p != parent);
            }
        }
        debug!(
            "Automaton::clean_bad_connections removed={} remaining_edges={}",
            failing.len(),
            self.graph.edge_count()
        );
        Ok(failing.len())
    }

    /// Zeroes every state so the graph can be relaxed again.
    pub fn reset_states(&mut self) {
        self.graph.reset_states();
    }
}
