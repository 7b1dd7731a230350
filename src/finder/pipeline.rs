//! [`TrackFinder`] implementation.
//!
//! Typical usage:
//! ```no_run
//! use forward_tracking::{FinderParams, HitRecord, LineFitter, TrackFinder};
//!
//! # fn example(records: Vec<HitRecord>) -> Result<(), forward_tracking::TrackingError> {
//! let finder = TrackFinder::new(FinderParams::default())?;
//! let report = finder.find_tracks(&records, &LineFitter::default())?;
//! for track in &report.tracks {
//!     println!("{} hits, quality {:.3}", track.hits.len(), track.quality());
//! }
//! # Ok(())
//! # }
//! ```
use super::{FinderParams, Track};
use crate::automaton::{Automaton, ChainAnchor};
use crate::builder::SegmentBuilder;
use crate::connector::LayerConnector;
use crate::criteria::Criteria;
use crate::diagnostics::{elapsed_ms, PipelineTrace, SegmentStage, TrackingReport};
use crate::error::{ConfigError, TrackingError};
use crate::event::Event;
use crate::fit::{FittedTrack, TrackFitter};
use crate::graph::MAX_SEGMENT_HITS;
use crate::overlap::{expand_variants, overlap_map};
use crate::sectors::SectorSystem;
use crate::subset::{Candidate, SubsetSelector};
use crate::types::{Hit, HitId, HitRecord, RawTrack};
use log::{debug, warn};
use std::collections::BTreeSet;
use std::time::Instant;

/// Run-scoped track finder. Construction validates the whole configuration;
/// afterwards the finder is immutable and processes events independently.
#[derive(Debug)]
pub struct TrackFinder {
    params: FinderParams,
    sectors: SectorSystem,
    connector: LayerConnector,
    criteria: Criteria,
    selector: Box<dyn SubsetSelector>,
}

/// Fitted variant waiting for subset selection.
struct Scored {
    hits: Vec<Hit>,
    fit: FittedTrack,
}

impl TrackFinder {
    pub fn new(params: FinderParams) -> Result<Self, ConfigError> {
        params.validate()?;
        let sectors = SectorSystem::new(params.geometry)?;
        let connector = LayerConnector::new(&sectors, params.connector)?;
        let criteria = params.criteria.build(&params.criterion_context())?;
        let selector = params.subset.selector()?;
        if !params.virtual_origin && params.automaton.anchor == ChainAnchor::VirtualHit {
            warn!(
                "TrackFinder::new virtual origin disabled while chains are anchored at virtual hits; \
                 only events carrying their own virtual records yield tracks"
            );
        }
        debug!(
            "TrackFinder::new sectors={} criteria={} strategy={:?}",
            sectors.sector_count(),
            criteria.len(),
            params.subset.strategy
        );
        Ok(Self {
            params,
            sectors,
            connector,
            criteria,
            selector,
        })
    }

    pub fn params(&self) -> &FinderParams {
        &self.params
    }

    pub fn sectors(&self) -> &SectorSystem {
        &self.sectors
    }

    pub fn criteria(&self) -> &Criteria {
        &self.criteria
    }

    /// Sectorizes `records` and runs the full pipeline on them.
    pub fn find_tracks(
        &self,
        records: &[HitRecord],
        fitter: &dyn TrackFitter,
    ) -> Result<TrackingReport, TrackingError> {
        let event = Event::from_records(records, &self.sectors)?;
        self.find_tracks_in(event, fitter)
    }

    /// Runs the pipeline on an already sectorized event.
    pub fn find_tracks_in(
        &self,
        mut event: Event,
        fitter: &dyn TrackFitter,
    ) -> Result<TrackingReport, TrackingError> {
        let total_start = Instant::now();
        let mut trace = PipelineTrace {
            hits: event.real_hit_count(),
            ..PipelineTrace::default()
        };
        debug!(
            "TrackFinder::find_tracks start hits={} virtual_origin={}",
            trace.hits, self.params.virtual_origin
        );
        if trace.hits == 0 {
            trace.timings.total_ms = elapsed_ms(total_start);
            return Ok(TrackingReport {
                tracks: Vec::new(),
                trace,
            });
        }
        if self.params.virtual_origin {
            event.add_virtual_origin(&self.sectors);
        }
        trace.virtual_hits = event.len() - trace.hits;

        let stage_start = Instant::now();
        let mut automaton = SegmentBuilder::new(&event)
            .with_criteria(self.criteria.for_segment_len(1))
            .with_connector(&self.connector)
            .with_params(self.params.automaton)
            .build()?;
        trace.segment_stages.push(SegmentStage {
            segment_len: 1,
            segments: automaton.len(),
            edges: automaton.edge_count(),
            ..SegmentStage::default()
        });
        trace.timings.stop("build", stage_start);

        for segment_len in 2..=MAX_SEGMENT_HITS {
            let stage_start = Instant::now();
            automaton.lengthen_segments()?;
            let stage = self.relax_and_clean(&mut automaton, segment_len)?;
            trace.segment_stages.push(stage);
            trace.timings.stop(format!("automaton{segment_len}"), stage_start);
        }

        let stage_start = Instant::now();
        let raw = self.extract(&mut automaton)?;
        trace.raw_tracks = raw.len();
        let kept: Vec<RawTrack> = raw
            .into_iter()
            .filter(|t| t.len() >= self.params.hits_per_track_min)
            .collect();
        trace.raw_tracks_kept = kept.len();
        trace.timings.stop("extract", stage_start);

        let stage_start = Instant::now();
        let overlaps = overlap_map(&event, &self.sectors, self.params.overlapping_hits_dist_max);
        trace.hits_with_overlaps = overlaps.len();
        let groups: Vec<Vec<RawTrack>> = kept
            .iter()
            .map(|track| expand_variants(track, &overlaps, &event, self.params.max_variants))
            .collect();
        trace.variants = groups.iter().map(Vec::len).sum();
        trace.timings.stop("overlap", stage_start);

        let stage_start = Instant::now();
        let scored = self.score(&groups, fitter, &mut trace);
        trace.timings.stop("fit", stage_start);

        let stage_start = Instant::now();
        let candidates: Vec<Candidate> = scored
            .iter()
            .map(|s| Candidate::new(s.hits.iter().map(|h| h.id).collect(), s.fit.quality))
            .collect();
        let selection = self.selector.select(&candidates);
        trace.candidates = candidates.len();
        trace.selected = selection.accepted.len();
        trace.selection_iterations = selection.iterations;
        let tracks: Vec<Track> = selection
            .accepted
            .iter()
            .map(|&i| Track {
                hits: scored[i].hits.clone(),
                fit: scored[i].fit,
            })
            .collect();
        trace.timings.stop("select", stage_start);

        trace.timings.total_ms = elapsed_ms(total_start);
        debug!("TrackFinder::find_tracks done {}", trace.summary());
        Ok(TrackingReport { tracks, trace })
    }

    /// Relaxes a freshly lengthened graph with the criteria of its segment
    /// length, then drops unanchored segments and failing edges.
    fn relax_and_clean(
        &self,
        automaton: &mut Automaton,
        segment_len: usize,
    ) -> Result<SegmentStage, TrackingError> {
        let criteria = self.criteria.for_segment_len(segment_len);
        let segments = automaton.len();
        let edges = automaton.edge_count();
        let relax = automaton.relax(&criteria)?;
        let removed_segments = automaton.clean_bad_states();
        let removed_edges = automaton.clean_bad_connections(&criteria)?;
        Ok(SegmentStage {
            segment_len,
            segments,
            edges,
            relax: Some(relax),
            removed_segments,
            removed_edges,
        })
    }

    /// Cleanup may have removed the parent a state was derived from, so the
    /// cleaned graph is relaxed once more before walking it.
    fn extract(&self, automaton: &mut Automaton) -> Result<Vec<RawTrack>, TrackingError> {
        let criteria = self.criteria.for_segment_len(MAX_SEGMENT_HITS);
        automaton.relax(&criteria)?;
        let raw = automaton.raw_tracks();
        automaton.reset_states();
        Ok(raw)
    }

    /// Fits every variant on its measured hits and applies the quality cut.
    /// Identical hit sets coming from different raw tracks are scored once.
    fn score(
        &self,
        groups: &[Vec<RawTrack>],
        fitter: &dyn TrackFitter,
        trace: &mut PipelineTrace,
    ) -> Vec<Scored> {
        let mut seen: BTreeSet<Vec<HitId>> = BTreeSet::new();
        let mut scored = Vec::new();
        for group in groups {
            let mut fitted: Vec<Scored> = Vec::with_capacity(group.len());
            for variant in group {
                let hits: Vec<Hit> = variant.hits.iter().filter(|h| !h.is_virtual).copied().collect();
                match fitter.fit(&hits) {
                    Some(fit) if fit.quality >= self.params.quality_min => {
                        trace.fitted += 1;
                        fitted.push(Scored { hits, fit });
                    }
                    Some(_) => {
                        trace.fitted += 1;
                        trace.rejected_fits += 1;
                    }
                    None => trace.rejected_fits += 1,
                }
            }
            let accepted: Vec<Scored> = if self.params.take_best_version {
                fitted
                    .into_iter()
                    .reduce(|best, next| if next.fit.quality > best.fit.quality { next } else { best })
                    .into_iter()
                    .collect()
            } else {
                fitted
            };
            for s in accepted {
                if seen.insert(s.hits.iter().map(|h| h.id).collect()) {
                    scored.push(s);
                }
            }
        }
        scored
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criteria::{CriteriaConfig, CriterionKind};
    use crate::fit::LineFitter;
    use crate::sectors::GeometryParams;
    use crate::subset::{SubsetParams, SubsetStrategy};

    fn params() -> FinderParams {
        FinderParams {
            geometry: GeometryParams {
                layers: 6,
                modules: 8,
                sensors: 1,
            },
            criteria: CriteriaConfig::none()
                .with(CriterionKind::StraightTrackRatio, 0.9, 1.1)
                .with(CriterionKind::Angle3d, 0.0, 5.0)
                .with(CriterionKind::Angle3dChange, 0.0, 10.0),
            ..FinderParams::default()
        }
    }

    /// Hits of a straight track from the origin along `direction`, one per
    /// layer, at |z| = 10·layer.
    fn straight(direction: [f64; 3], module: u32, layers: std::ops::RangeInclusive<u32>) -> Vec<HitRecord> {
        let side = if direction[2] < 0.0 { -1 } else { 1 };
        layers
            .map(|layer| {
                let t = 10.0 * layer as f64 / direction[2].abs();
                HitRecord::new(
                    [direction[0] * t, direction[1] * t, direction[2] * t],
                    side,
                    layer,
                    module,
                    0,
                )
            })
            .collect()
    }

    #[test]
    fn finds_single_straight_track() {
        let finder = TrackFinder::new(params()).unwrap();
        let records = straight([0.3, 0.1, 1.0], 0, 1..=5);
        let report = finder.find_tracks(&records, &LineFitter::default()).unwrap();
        assert_eq!(report.tracks.len(), 1);
        let ids: Vec<u32> = report.tracks[0].hit_ids().iter().map(|id| id.0).collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 4]);
        assert!(report.tracks[0].quality() > 0.99);
        assert_eq!(report.trace.virtual_hits, 2);
        assert_eq!(report.trace.segment_stages.len(), 3);
        assert_eq!(report.trace.selected, 1);
    }

    #[test]
    fn finds_tracks_on_both_sides() {
        let finder = TrackFinder::new(params()).unwrap();
        let mut records = straight([0.3, 0.1, 1.0], 0, 1..=5);
        records.extend(straight([-0.2, 0.25, -1.0], 3, 1..=5));
        let report = finder.find_tracks(&records, &LineFitter::default()).unwrap();
        assert_eq!(report.tracks.len(), 2);
        let sides: BTreeSet<_> = report.tracks.iter().map(|t| t.hits[0].address.side).collect();
        assert_eq!(sides.len(), 2);
    }

    #[test]
    fn empty_input_yields_empty_report() {
        let finder = TrackFinder::new(params()).unwrap();
        let report = finder.find_tracks(&[], &LineFitter::default()).unwrap();
        assert!(report.tracks.is_empty());
        assert_eq!(report.trace.hits, 0);
        assert!(report.trace.segment_stages.is_empty());
    }

    #[test]
    fn invalid_record_aborts_the_event() {
        let finder = TrackFinder::new(params()).unwrap();
        let records = vec![HitRecord::new([0.0, 0.0, 10.0], 1, 9, 0, 0)];
        assert!(matches!(
            finder.find_tracks(&records, &LineFitter::default()),
            Err(TrackingError::InvalidAddress { index: 0, .. })
        ));
    }

    #[test]
    fn short_tracks_are_dropped() {
        let finder = TrackFinder::new(FinderParams {
            hits_per_track_min: 5,
            ..params()
        })
        .unwrap();
        // Virtual origin plus three hits: the full chain and the one
        // skipping layer 1 straight from the origin.
        let records = straight([0.3, 0.1, 1.0], 0, 1..=3);
        let report = finder.find_tracks(&records, &LineFitter::default()).unwrap();
        assert_eq!(report.trace.raw_tracks, 2);
        assert_eq!(report.trace.raw_tracks_kept, 0);
        assert!(report.tracks.is_empty());
    }

    #[test]
    fn keep_all_strategy_reports_every_candidate() {
        let finder = TrackFinder::new(FinderParams {
            subset: SubsetParams {
                strategy: SubsetStrategy::None,
                ..SubsetParams::default()
            },
            ..params()
        })
        .unwrap();
        let records = straight([0.3, 0.1, 1.0], 0, 1..=5);
        let report = finder.find_tracks(&records, &LineFitter::default()).unwrap();
        assert_eq!(report.trace.candidates, report.tracks.len());
    }

    #[test]
    fn invalid_configuration_is_rejected() {
        let bad = FinderParams {
            quality_min: 2.0,
            ..params()
        };
        assert!(TrackFinder::new(bad).is_err());
        let missing = FinderParams {
            criteria: CriteriaConfig {
                enabled: vec![CriterionKind::Pt],
                ..CriteriaConfig::none()
            },
            ..params()
        };
        assert!(matches!(
            TrackFinder::new(missing),
            Err(ConfigError::MissingBounds(CriterionKind::Pt))
        ));
    }
}
