//! Parameter types configuring the track finder.
//!
//! Defaults follow the forward-disk setup the engine was tuned on: 8 layers
//! (layer 0 is the interaction point), 16 petals with 2 sensors each, a
//! loose straight-track cut on hit pairs and a 10° bend window on triplets.

use crate::automaton::AutomatonParams;
use crate::connector::ConnectorParams;
use crate::criteria::{CriteriaConfig, CriterionContext};
use crate::error::ConfigError;
use crate::sectors::GeometryParams;
use crate::subset::SubsetParams;
use serde::{Deserialize, Serialize};

/// Run-wide parameters of [`super::TrackFinder`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FinderParams {
    pub geometry: GeometryParams,
    pub connector: ConnectorParams,
    /// Criteria for every stage; each stage picks those matching its
    /// segment length.
    pub criteria: CriteriaConfig,
    /// Solenoid field along z (tesla) used by momentum criteria.
    pub b_field_tesla: f64,
    pub automaton: AutomatonParams,
    /// Adds one virtual hit per side at the origin, on layer 0.
    pub virtual_origin: bool,
    /// Raw tracks with fewer hits (virtual ones included) are dropped.
    pub hits_per_track_min: usize,
    /// Largest distance (mm) between two hits in overlapping sensors that
    /// may stem from one crossing.
    pub overlapping_hits_dist_max: f64,
    /// Cap on overlap variants generated per raw track.
    pub max_variants: usize,
    /// Fits below this quality are rejected.
    pub quality_min: f64,
    /// Keep only the best-quality variant of every raw track.
    pub take_best_version: bool,
    pub subset: SubsetParams,
}

impl Default for FinderParams {
    fn default() -> Self {
        Self {
            geometry: GeometryParams::default(),
            connector: ConnectorParams::default(),
            criteria: CriteriaConfig::default(),
            b_field_tesla: CriterionContext::default().b_field_tesla,
            automaton: AutomatonParams::default(),
            virtual_origin: true,
            hits_per_track_min: 3,
            overlapping_hits_dist_max: 3.5,
            max_variants: 64,
            quality_min: 0.005,
            take_best_version: true,
            subset: SubsetParams::default(),
        }
    }
}

impl FinderParams {
    pub fn criterion_context(&self) -> CriterionContext {
        CriterionContext {
            b_field_tesla: self.b_field_tesla,
        }
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if !self.b_field_tesla.is_finite() {
            return Err(ConfigError::InvalidParameter {
                name: "bFieldTesla",
                reason: format!("{} is not finite", self.b_field_tesla),
            });
        }
        if !(self.overlapping_hits_dist_max >= 0.0) {
            return Err(ConfigError::InvalidParameter {
                name: "overlappingHitsDistMax",
                reason: "must be non-negative".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.quality_min) {
            return Err(ConfigError::InvalidParameter {
                name: "qualityMin",
                reason: format!("{} is outside [0, 1]", self.quality_min),
            });
        }
        Ok(())
    }
}
