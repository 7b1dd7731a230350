//! Per-event orchestration of the full track-finding data flow.
//!
//! Overview
//! - Sectorizes the raw hit records and adds the virtual interaction-point
//!   hits.
//! - Builds 1-hit segments with the two-hit criteria, then lengthens twice,
//!   relaxing and cleaning the automaton with the three-hit and four-hit
//!   criteria in turn.
//! - Extracts raw tracks, expands them over overlapping sensors, fits every
//!   variant with the caller's [`TrackFitter`](crate::fit::TrackFitter) and
//!   keeps a hit-disjoint best subset.
//!
//! Modules
//! - [`params`] – run-wide configuration ([`FinderParams`]).
//! - `pipeline` – the [`TrackFinder`] implementation.

pub mod params;
mod pipeline;

pub use params::FinderParams;
pub use pipeline::TrackFinder;

use crate::fit::FittedTrack;
use crate::types::{Hit, HitId};
use serde::Serialize;

/// A selected track: its measured hits (inner to outer) and the fit that
/// scored it.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub hits: Vec<Hit>,
    pub fit: FittedTrack,
}

impl Track {
    pub fn hit_ids(&self) -> Vec<HitId> {
        self.hits.iter().map(|h| h.id).collect()
    }

    pub fn quality(&self) -> f64 {
        self.fit.quality
    }
}
