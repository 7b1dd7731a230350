use crate::automaton::RelaxStats;
use crate::diagnostics::TimingBreakdown;
use crate::finder::Track;
use serde::Serialize;

/// Result of [`TrackFinder::find_tracks`](crate::TrackFinder::find_tracks).
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingReport {
    pub tracks: Vec<Track>,
    pub trace: PipelineTrace,
}

/// Counters of one segment length of the automaton.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentStage {
    pub segment_len: usize,
    /// Segments and edges right after building or lengthening.
    pub segments: usize,
    pub edges: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relax: Option<RelaxStats>,
    pub removed_segments: usize,
    pub removed_edges: usize,
}

/// Per-event trace of every stage the finder ran.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineTrace {
    pub hits: usize,
    pub virtual_hits: usize,
    pub segment_stages: Vec<SegmentStage>,
    pub raw_tracks: usize,
    /// Raw tracks left after the minimum-hit cut.
    pub raw_tracks_kept: usize,
    pub hits_with_overlaps: usize,
    pub variants: usize,
    pub fitted: usize,
    pub rejected_fits: usize,
    pub candidates: usize,
    pub selected: usize,
    pub selection_iterations: usize,
    pub timings: TimingBreakdown,
}

impl PipelineTrace {
    /// One-line summary for logs and the demo tool.
    pub fn summary(&self) -> String {
        let segments = self
            .segment_stages
            .iter()
            .map(|s| format!("{}:{}", s.segment_len, s.segments))
            .collect::<Vec<_>>()
            .join(" ");
        format!(
            "hits={} segments=[{}] raw={} kept={} variants={} fitted={} rejected={} selected={} ({:.2} ms)",
            self.hits,
            segments,
            self.raw_tracks,
            self.raw_tracks_kept,
            self.variants,
            self.fitted,
            self.rejected_fits,
            self.selected,
            self.timings.total_ms
        )
    }
}
