//! Construction of the initial segment graph of one event.
//!
//! Every hit becomes a 1-hit segment. For every inner hit and every hit in a
//! sector the [`HitConnector`] reports as reachable outward, the pair is
//! tested against the registered two-hit criteria; accepted pairs become
//! parent → child edges. Rejected pairs never enter the graph.

use crate::automaton::{Automaton, AutomatonParams};
use crate::connector::HitConnector;
use crate::criteria::{are_compatible, Criterion};
use crate::error::TrackingError;
use crate::event::Event;
use crate::graph::{SegmentGraph, SegmentId};
use log::debug;

pub struct SegmentBuilder<'a> {
    event: &'a Event,
    criteria: Vec<&'a dyn Criterion>,
    connector: Option<&'a dyn HitConnector>,
    params: AutomatonParams,
}

impl<'a> SegmentBuilder<'a> {
    pub fn new(event: &'a Event) -> Self {
        Self {
            event,
            criteria: Vec::new(),
            connector: None,
            params: AutomatonParams::default(),
        }
    }

    /// Registers a criterion applied to every candidate hit pair. It must
    /// compare 1-hit segments; anything else fails `build` with an arity
    /// error.
    pub fn with_criterion(mut self, criterion: &'a dyn Criterion) -> Self {
        self.criteria.push(criterion);
        self
    }

    pub fn with_criteria(mut self, criteria: impl IntoIterator<Item = &'a dyn Criterion>) -> Self {
        self.criteria.extend(criteria);
        self
    }

    /// Without a connector no hit pairs are enumerated and the graph has no
    /// edges.
    pub fn with_connector(mut self, connector: &'a dyn HitConnector) -> Self {
        self.connector = Some(connector);
        self
    }

    pub fn with_params(mut self, params: AutomatonParams) -> Self {
        self.params = params;
        self
    }

    /// Builds the 1-hit segment graph.
    pub fn build(&self) -> Result<Automaton, TrackingError> {
        let mut graph = SegmentGraph::with_capacity(self.event.len());
        let nodes: Vec<SegmentId> = self
            .event
            .hits()
            .iter()
            .map(|hit| graph.add(vec![*hit]))
            .collect();

        let mut candidates = 0usize;
        if let Some(connector) = self.connector {
            for (sector, inner_ids) in self.event.sectors() {
                for target in connector.outward(sector) {
                    let outer_ids = self.event.hits_in(target);
                    if outer_ids.is_empty() {
                        continue;
                    }
                    for &inner in inner_ids {
                        let parent = nodes[inner.0 as usize];
                        for &outer in outer_ids {
                            let child = nodes[outer.0 as usize];
                            candidates += 1;
                            if are_compatible(&self.criteria, graph.segment(parent), graph.segment(child))? {
                                graph.connect(parent, child);
                            }
                        }
                    }
                }
            }
        }
        debug!(
            "SegmentBuilder::build hits={} candidates={} edges={}",
            self.event.len(),
            candidates,
            graph.edge_count()
        );
        Ok(Automaton::with_params(graph, self.params))
    }

    /// Builds the 1-hit graph and lengthens it until segments hold
    /// `segment_len` hits.
    pub fn build_lengthened(&self, segment_len: usize) -> Result<Automaton, TrackingError> {
        let mut automaton = self.build()?;
        for _ in 1..segment_len {
            if automaton.is_empty() {
                break;
            }
            automaton.lengthen_segments()?;
        }
        Ok(automaton)
    }
}
