//! Criteria on two 1-hit segments: `a` is the parent (inner) hit, `b` the
//! child (outer) hit.

use super::{check_arity, Bounds, Criterion, CriterionKind, CriterionValues, Recorder, SquaredWindow};
use crate::error::CriterionError;
use crate::geometry::{
    degrees_from_signed_squared_cosine, signed_squared_cosine, wrap_angle, xy, Circle, CosineWindow,
};
use crate::graph::Segment;
use nalgebra::Vector2;

/// Distance between the hits over their z distance. A track at polar angle
/// θ gives `1 / cos θ`.
#[derive(Clone, Debug)]
pub struct RzRatio {
    window: SquaredWindow,
}

impl RzRatio {
    pub fn new(bounds: Bounds) -> Self {
        Self {
            window: SquaredWindow::new(bounds),
        }
    }
}

impl Criterion for RzRatio {
    fn kind(&self) -> CriterionKind {
        CriterionKind::RzRatio
    }

    fn evaluate(
        &self,
        parent: &Segment,
        child: &Segment,
        values: Option<&mut CriterionValues>,
    ) -> Result<bool, CriterionError> {
        check_arity(self.kind(), parent, child)?;
        let mut rec = Recorder::new(values);
        let d = child.hits()[0].position - parent.hits()[0].position;
        let dz_sq = d.z * d.z;
        rec.set("rz_ratio.ratio", 1.0);
        if dz_sq <= 0.0 {
            return Ok(true);
        }
        let ratio_sq = d.norm_squared() / dz_sq;
        if rec.active() {
            rec.set("rz_ratio.ratio", ratio_sq.sqrt());
        }
        Ok(self.window.contains(ratio_sq))
    }
}

/// Compares `ρ/z` of both hits; hits on one straight line through the
/// origin give a ratio of 1.
#[derive(Clone, Debug)]
pub struct StraightTrackRatio {
    window: SquaredWindow,
}

impl StraightTrackRatio {
    pub fn new(bounds: Bounds) -> Self {
        Self {
            window: SquaredWindow::new(bounds),
        }
    }
}

impl Criterion for StraightTrackRatio {
    fn kind(&self) -> CriterionKind {
        CriterionKind::StraightTrackRatio
    }

    fn evaluate(
        &self,
        parent: &Segment,
        child: &Segment,
        values: Option<&mut CriterionValues>,
    ) -> Result<bool, CriterionError> {
        check_arity(self.kind(), parent, child)?;
        let mut rec = Recorder::new(values);
        let a = &parent.hits()[0];
        let b = &child.hits()[0];
        rec.set("straight_track_ratio.ratio", 1.0);

        // (ρb/zb) / (ρa/za), squared
        let numerator = b.rho_squared() * a.z() * a.z();
        let denominator = a.rho_squared() * b.z() * b.z();
        if denominator <= 0.0 {
            return Ok(true);
        }
        let ratio_sq = numerator / denominator;
        if rec.active() {
            rec.set("straight_track_ratio.ratio", ratio_sq.sqrt());
        }
        Ok(self.window.contains(ratio_sq))
    }
}

/// Azimuthal separation of the two hits in degrees.
#[derive(Clone, Debug)]
pub struct DeltaPhi {
    window: CosineWindow,
}

impl DeltaPhi {
    pub fn new(bounds: Bounds) -> Self {
        Self {
            window: CosineWindow::from_degrees(bounds.min, bounds.max),
        }
    }
}

impl Criterion for DeltaPhi {
    fn kind(&self) -> CriterionKind {
        CriterionKind::DeltaPhi
    }

    fn evaluate(
        &self,
        parent: &Segment,
        child: &Segment,
        values: Option<&mut CriterionValues>,
    ) -> Result<bool, CriterionError> {
        check_arity(self.kind(), parent, child)?;
        let mut rec = Recorder::new(values);
        let a = &parent.hits()[0];
        let b = &child.hits()[0];
        let dot = a.x() * b.x() + a.y() * b.y();
        let norms_sq = a.rho_squared() * b.rho_squared();
        rec.set("delta_phi.degrees", 0.0);
        match self.window.contains(dot, norms_sq) {
            None => Ok(true),
            Some(inside) => {
                if rec.active() {
                    let deg = degrees_from_signed_squared_cosine(signed_squared_cosine(dot, norms_sq));
                    rec.set("delta_phi.degrees", deg);
                }
                Ok(inside)
            }
        }
    }
}

/// Consistency with a helix starting at the interaction point. About the
/// transverse circle through the origin and both hits, the turning angle of
/// such a helix grows linearly with z, so `(φa/za) / (φb/zb)` is 1.
#[derive(Clone, Debug)]
pub struct HelixWithIp {
    bounds: Bounds,
}

impl HelixWithIp {
    pub fn new(bounds: Bounds) -> Self {
        Self { bounds }
    }
}

impl Criterion for HelixWithIp {
    fn kind(&self) -> CriterionKind {
        CriterionKind::HelixWithIp
    }

    fn evaluate(
        &self,
        parent: &Segment,
        child: &Segment,
        values: Option<&mut CriterionValues>,
    ) -> Result<bool, CriterionError> {
        check_arity(self.kind(), parent, child)?;
        let mut rec = Recorder::new(values);
        let a = &parent.hits()[0];
        let b = &child.hits()[0];
        rec.set("helix_with_ip.ratio", 1.0);

        let origin = Vector2::zeros();
        let (pa, pb) = (xy(&a.position), xy(&b.position));
        let Some(circle) = Circle::through(&origin, &pa, &pb) else {
            return Ok(true);
        };
        let ip_phase = circle.phase_of(&origin);
        let turn_a = wrap_angle(circle.phase_of(&pa) - ip_phase).abs();
        let turn_b = wrap_angle(circle.phase_of(&pb) - ip_phase).abs();
        let denominator = a.z() * turn_b;
        if denominator == 0.0 {
            return Ok(true);
        }
        let ratio = turn_a * b.z() / denominator;
        rec.set("helix_with_ip.ratio", ratio);
        Ok(self.bounds.contains(ratio))
    }
}

/// Radial step `ρb − ρa` in mm.
#[derive(Clone, Debug)]
pub struct DeltaRho {
    bounds: Bounds,
}

impl DeltaRho {
    pub fn new(bounds: Bounds) -> Self {
        Self { bounds }
    }
}

impl Criterion for DeltaRho {
    fn kind(&self) -> CriterionKind {
        CriterionKind::DeltaRho
    }

    fn evaluate(
        &self,
        parent: &Segment,
        child: &Segment,
        values: Option<&mut CriterionValues>,
    ) -> Result<bool, CriterionError> {
        check_arity(self.kind(), parent, child)?;
        let mut rec = Recorder::new(values);
        let delta = child.hits()[0].rho_squared().sqrt() - parent.hits()[0].rho_squared().sqrt();
        rec.set("delta_rho.mm", delta);
        Ok(self.bounds.contains(delta))
    }
}
