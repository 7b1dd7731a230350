//! Geometric compatibility criteria between a parent and a child segment.
//!
//! Every criterion encodes one heuristic about how hits of a real particle
//! line up: spacing ratios, bend angles, curvature consistency. A criterion
//! compares two segments of equal length `n` (so `n + 1` distinct hits are
//! involved) and is configured with a `[min, max]` window on the quantity it
//! measures. Criteria are immutable after construction: bounds that need
//! transcendental functions (angle windows) are converted once in `new`.
//!
//! Degenerate inputs (zero-length vectors, collinear hits where a circle is
//! needed, zero denominators) cannot disprove compatibility: the criterion
//! passes and records a neutral value.
//!
//! Instrumentation: passing `Some(&mut CriterionValues)` to
//! [`Criterion::evaluate`] records every intermediate quantity under
//! `"<criterion>.<quantity>"` keys. It never changes the verdict.
//!
//! Modules
//! - `two_hit` – criteria on pairs of 1-hit segments.
//! - `three_hit` – criteria on pairs of 2-hit segments.
//! - `four_hit` – criteria on pairs of 3-hit segments.

mod four_hit;
mod kind;
mod three_hit;
mod two_hit;

#[cfg(test)]
mod tests;

pub use four_hit::{
    Angle2dChange, Angle3dChange, DistOfCircleCenters, DistToExtrapolation, NoZigZag,
    PhiZRatioChange, RChange,
};
pub use kind::CriterionKind;
pub use three_hit::{Angle2d, Angle3d, ChangeRzRatio, IpCircleDist, Pt};
pub use two_hit::{DeltaPhi, DeltaRho, HelixWithIp, RzRatio, StraightTrackRatio};

use crate::error::{ConfigError, CriterionError};
use crate::graph::Segment;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Shared contract of all compatibility criteria.
pub trait Criterion: fmt::Debug + Send + Sync {
    fn kind(&self) -> CriterionKind;

    /// Number of hits each of the two compared segments must have.
    fn segment_len(&self) -> usize {
        self.kind().segment_len()
    }

    /// Tests whether `child` is a plausible outward continuation of `parent`.
    ///
    /// Fails with [`CriterionError::ArityMismatch`] when either segment does
    /// not have [`Self::segment_len`] hits.
    fn evaluate(
        &self,
        parent: &Segment,
        child: &Segment,
        values: Option<&mut CriterionValues>,
    ) -> Result<bool, CriterionError>;
}

/// Named scalars recorded in instrumentation mode.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CriterionValues(BTreeMap<&'static str, f64>);

impl CriterionValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: &'static str, value: f64) {
        self.0.insert(key, value);
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.0.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        self.0.iter().map(|(k, v)| (*k, *v))
    }

    pub fn extend(&mut self, other: &CriterionValues) {
        self.0.extend(other.iter());
    }
}

/// Write-through handle that is a no-op when instrumentation is off.
pub(crate) struct Recorder<'a>(Option<&'a mut CriterionValues>);

impl<'a> Recorder<'a> {
    pub(crate) fn new(values: Option<&'a mut CriterionValues>) -> Self {
        Self(values)
    }

    #[inline]
    pub(crate) fn active(&self) -> bool {
        self.0.is_some()
    }

    #[inline]
    pub(crate) fn set(&mut self, key: &'static str, value: f64) {
        if let Some(values) = self.0.as_deref_mut() {
            values.insert(key, value);
        }
    }
}

/// Closed window `[min, max]` on a criterion's measured quantity.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

impl Bounds {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    #[inline]
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    fn validate(&self, kind: CriterionKind) -> Result<(), ConfigError> {
        if !self.min.is_finite() || !self.max.is_finite() || self.min > self.max {
            return Err(ConfigError::InvalidBounds {
                kind,
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }
}

/// Window on a non-negative ratio, compared on squares.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct SquaredWindow {
    lo: f64,
    hi: f64,
}

impl SquaredWindow {
    pub(crate) fn new(bounds: Bounds) -> Self {
        Self {
            lo: crate::geometry::signed_square(bounds.min),
            hi: crate::geometry::signed_square(bounds.max),
        }
    }

    #[inline]
    pub(crate) fn contains(&self, value_sq: f64) -> bool {
        value_sq >= self.lo && value_sq <= self.hi
    }
}

/// Run-scoped inputs some criteria need besides their bounds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CriterionContext {
    /// Solenoid field along z in tesla.
    pub b_field_tesla: f64,
}

impl Default for CriterionContext {
    fn default() -> Self {
        Self { b_field_tesla: 3.5 }
    }
}

/// Which criteria run and with which windows.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CriteriaConfig {
    pub enabled: Vec<CriterionKind>,
    pub bounds: BTreeMap<CriterionKind, Bounds>,
}

impl Default for CriteriaConfig {
    fn default() -> Self {
        let mut bounds = BTreeMap::new();
        bounds.insert(CriterionKind::StraightTrackRatio, Bounds::new(0.9, 1.1));
        bounds.insert(CriterionKind::Angle3d, Bounds::new(0.0, 10.0));
        Self {
            enabled: vec![CriterionKind::StraightTrackRatio, CriterionKind::Angle3d],
            bounds,
        }
    }
}

impl CriteriaConfig {
    /// Empty configuration: nothing enabled.
    pub fn none() -> Self {
        Self {
            enabled: Vec::new(),
            bounds: BTreeMap::new(),
        }
    }

    /// Enables `kind` with the given window.
    pub fn with(mut self, kind: CriterionKind, min: f64, max: f64) -> Self {
        if !self.enabled.contains(&kind) {
            self.enabled.push(kind);
        }
        self.bounds.insert(kind, Bounds::new(min, max));
        self
    }

    /// Instantiates every enabled criterion. Bounds configured for criteria
    /// that are not enabled are ignored.
    pub fn build(&self, ctx: &CriterionContext) -> Result<Criteria, ConfigError> {
        let mut criteria = Criteria::new();
        for &kind in &self.enabled {
            if criteria.iter().any(|c| c.kind() == kind) {
                continue;
            }
            let bounds = self
                .bounds
                .get(&kind)
                .copied()
                .ok_or(ConfigError::MissingBounds(kind))?;
            bounds.validate(kind)?;
            criteria.push(kind.build(bounds, ctx));
        }
        Ok(criteria)
    }
}

/// Run-scoped list of configured criteria, shared read-only by every event.
#[derive(Debug, Default)]
pub struct Criteria {
    items: Vec<Box<dyn Criterion>>,
}

impl Criteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, criterion: Box<dyn Criterion>) {
        self.items.push(criterion);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Criterion> {
        self.items.iter().map(|c| c.as_ref())
    }

    /// Criteria that compare segments of `len` hits.
    pub fn for_segment_len(&self, len: usize) -> Vec<&dyn Criterion> {
        self.iter().filter(|c| c.segment_len() == len).collect()
    }
}

/// True when every criterion accepts the pair. Stops at the first rejection.
pub fn are_compatible(
    criteria: &[&dyn Criterion],
    parent: &Segment,
    child: &Segment,
) -> Result<bool, CriterionError> {
    for criterion in criteria {
        if !criterion.evaluate(parent, child, None)? {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Evaluates every criterion in instrumentation mode, collecting all values.
/// Returns the combined verdict.
pub fn evaluate_all(
    criteria: &[&dyn Criterion],
    parent: &Segment,
    child: &Segment,
    values: &mut CriterionValues,
) -> Result<bool, CriterionError> {
    let mut accepted = true;
    for criterion in criteria {
        accepted &= criterion.evaluate(parent, child, Some(&mut *values))?;
    }
    Ok(accepted)
}

pub(crate) fn check_arity(
    kind: CriterionKind,
    parent: &Segment,
    child: &Segment,
) -> Result<(), CriterionError> {
    let expected = kind.segment_len();
    if parent.len() != expected || child.len() != expected {
        return Err(CriterionError::ArityMismatch {
            criterion: kind,
            expected,
            parent: parent.len(),
            child: child.len(),
        });
    }
    Ok(())
}
