//! Diagnostics data model exposed by the track finder and the analysis
//! tools.
//!
//! `TrackingReport` is the main entry point returned by the finder, bundling
//! the selected tracks with a `PipelineTrace` describing every stage the
//! pipeline executed.

pub mod analysis;
pub mod pipeline;
pub mod timing;

pub use analysis::{AnalysisParams, CriterionSample, TrueTrackAnalyser};
pub use pipeline::{PipelineTrace, SegmentStage, TrackingReport};
pub use timing::{elapsed_ms, StageTiming, TimingBreakdown};
