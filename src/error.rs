//! Error types surfaced by the tracking core.

use crate::criteria::CriterionKind;
use thiserror::Error;

/// Invalid run configuration. Reported before any event is processed.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("invalid geometry: {layers} layers, {modules} modules, {sensors} sensors (all must be >= 1)")]
    InvalidGeometry {
        layers: u32,
        modules: u32,
        sensors: u32,
    },

    #[error("criterion `{0}` is enabled but has no bounds configured")]
    MissingBounds(CriterionKind),

    #[error("criterion `{kind}` has invalid bounds [{min}, {max}]")]
    InvalidBounds {
        kind: CriterionKind,
        min: f64,
        max: f64,
    },

    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

/// Contract violations raised while evaluating a criterion.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CriterionError {
    #[error(
        "criterion `{criterion}` needs two segments with {expected} hits each, \
         got {parent} (parent) and {child} (child)"
    )]
    ArityMismatch {
        criterion: CriterionKind,
        expected: usize,
        parent: usize,
        child: usize,
    },
}

/// Per-event failure of the tracking pipeline.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TrackingError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Criterion(#[from] CriterionError),

    #[error("hit record {index} has an invalid detector address: {reason}")]
    InvalidAddress { index: usize, reason: String },

    #[error("cannot lengthen segments beyond {max} hits")]
    SegmentLimit { max: usize },
}
