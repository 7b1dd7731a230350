#![doc = include_str!("../README.md")]

// Public modules (stable-ish surface)
pub mod diagnostics;
pub mod error;
pub mod finder;
pub mod fit;
pub mod types;

// Pipeline building blocks – public for tools and custom pipelines.
pub mod automaton;
pub mod builder;
pub mod connector;
pub mod criteria;
pub mod event;
pub mod geometry;
pub mod graph;
pub mod overlap;
pub mod sectors;
pub mod subset;

// Demo support.
pub mod config;
pub mod synthetic;

// --- High-level re-exports -------------------------------------------------

// Main entry points: finder + results.
pub use crate::finder::{FinderParams, Track, TrackFinder};
pub use crate::types::{DetectorAddress, Hit, HitId, HitRecord, RawTrack, SectorId, Side};

// Errors and diagnostics returned by the finder.
pub use crate::diagnostics::{PipelineTrace, TrackingReport};
pub use crate::error::{ConfigError, CriterionError, TrackingError};

// Fitter interface plus the reference implementation.
pub use crate::fit::{FittedTrack, LineFitter, TrackFitter};

// --- Prelude ---------------------------------------------------------------

/// Small prelude for quick experiments.
///
/// ```no_run
/// use forward_tracking::prelude::*;
///
/// # fn main() -> Result<(), TrackingError> {
/// let records = vec![
///     HitRecord::new([20.0, 10.0, 200.0], 1, 1, 0, 0),
///     HitRecord::new([40.0, 20.0, 400.0], 1, 2, 0, 0),
///     HitRecord::new([60.0, 30.0, 600.0], 1, 3, 0, 0),
/// ];
/// let finder = TrackFinder::new(FinderParams::default())?;
/// let report = finder.find_tracks(&records, &LineFitter::default())?;
/// println!("tracks={} latency_ms={:.3}", report.tracks.len(), report.trace.timings.total_ms);
/// # Ok(())
/// # }
/// ```
pub mod prelude {
    pub use crate::criteria::{CriteriaConfig, CriterionKind};
    pub use crate::subset::SubsetStrategy;
    pub use crate::{FinderParams, HitRecord, LineFitter, TrackFinder, TrackingError};
}

// --- Stage-level API (for tools & advanced users) ---------------------------

pub mod stages {
    // Stage runners.
    pub use crate::automaton::{Automaton, AutomatonParams, ChainAnchor, RelaxStats, TieBreak};
    pub use crate::builder::SegmentBuilder;
    pub use crate::connector::{ConnectorParams, HitConnector, LayerConnector};
    pub use crate::event::Event;
    pub use crate::overlap::{expand_variants, overlap_map, OverlapMap};
    pub use crate::subset::{Candidate, HopfieldSubset, Selection, SimpleSubset, SubsetSelector};

    // Structured diagnostics types.
    pub use crate::diagnostics::{
        AnalysisParams, CriterionSample, SegmentStage, StageTiming, TimingBreakdown,
        TrueTrackAnalyser,
    };
}
