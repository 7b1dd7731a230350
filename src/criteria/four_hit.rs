//! Criteria on two 3-hit segments. With parent `[a, b, c]` and child
//! `[b, c, d]` the parent triplet is `(a, b, c)` and the child triplet
//! `(b, c, d)`.

use super::{check_arity, Bounds, Criterion, CriterionKind, CriterionValues, Recorder};
use crate::error::CriterionError;
use crate::geometry::{angle_between, signed_bend_2d, wrap_angle, xy, Circle};
use crate::graph::Segment;
use nalgebra::{Vector2, Vector3};

fn quadruplet(parent: &Segment, child: &Segment) -> [Vector3<f64>; 4] {
    let p = parent.hits();
    [p[0].position, p[1].position, p[2].position, child.hits()[2].position]
}

fn circles(q: &[Vector3<f64>; 4]) -> Option<(Circle, Circle)> {
    let [a, b, c, d] = [xy(&q[0]), xy(&q[1]), xy(&q[2]), xy(&q[3])];
    Some((Circle::through(&a, &b, &c)?, Circle::through(&b, &c, &d)?))
}

/// Ratio of the child's bend angle to the parent's, in the xy plane.
#[derive(Clone, Debug)]
pub struct Angle2dChange {
    bounds: Bounds,
}

impl Angle2dChange {
    pub fn new(bounds: Bounds) -> Self {
        Self { bounds }
    }
}

impl Criterion for Angle2dChange {
    fn kind(&self) -> CriterionKind {
        CriterionKind::Angle2dChange
    }

    fn evaluate(
        &self,
        parent: &Segment,
        child: &Segment,
        values: Option<&mut CriterionValues>,
    ) -> Result<bool, CriterionError> {
        check_arity(self.kind(), parent, child)?;
        let mut rec = Recorder::new(values);
        let [a, b, c, d] = quadruplet(parent, child);
        let lift = |v: Vector2<f64>| Vector3::new(v.x, v.y, 0.0);
        let ab = lift(xy(&(b - a)));
        let bc = lift(xy(&(c - b)));
        let cd = lift(xy(&(d - c)));
        rec.set("angle_2d_change.ratio", 1.0);
        let (Some(outer), Some(inner)) = (angle_between(&bc, &cd), angle_between(&ab, &bc)) else {
            return Ok(true);
        };
        if inner <= 0.0 {
            return Ok(true);
        }
        let ratio = outer / inner;
        rec.set("angle_2d_change.ratio", ratio);
        Ok(self.bounds.contains(ratio))
    }
}

/// Ratio of the child's bend angle to the parent's, in space.
#[derive(Clone, Debug)]
pub struct Angle3dChange {
    bounds: Bounds,
}

impl Angle3dChange {
    pub fn new(bounds: Bounds) -> Self {
        Self { bounds }
    }
}

impl Criterion for Angle3dChange {
    fn kind(&self) -> CriterionKind {
        CriterionKind::Angle3dChange
    }

    fn evaluate(
        &self,
        parent: &Segment,
        child: &Segment,
        values: Option<&mut CriterionValues>,
    ) -> Result<bool, CriterionError> {
        check_arity(self.kind(), parent, child)?;
        let mut rec = Recorder::new(values);
        let [a, b, c, d] = quadruplet(parent, child);
        rec.set("angle_3d_change.ratio", 1.0);
        let (Some(outer), Some(inner)) = (angle_between(&(c - b), &(d - c)), angle_between(&(b - a), &(c - b)))
        else {
            return Ok(true);
        };
        if inner <= 0.0 {
            return Ok(true);
        }
        let ratio = outer / inner;
        rec.set("angle_3d_change.ratio", ratio);
        Ok(self.bounds.contains(ratio))
    }
}

/// Distance (mm) between the xy circle centres of both triplets.
#[derive(Clone, Debug)]
pub struct DistOfCircleCenters {
    bounds: Bounds,
}

impl DistOfCircleCenters {
    pub fn new(bounds: Bounds) -> Self {
        Self { bounds }
    }
}

impl Criterion for DistOfCircleCenters {
    fn kind(&self) -> CriterionKind {
        CriterionKind::DistOfCircleCenters
    }

    fn evaluate(
        &self,
        parent: &Segment,
        child: &Segment,
        values: Option<&mut CriterionValues>,
    ) -> Result<bool, CriterionError> {
        check_arity(self.kind(), parent, child)?;
        let mut rec = Recorder::new(values);
        let q = quadruplet(parent, child);
        rec.set("dist_of_circle_centers.mm", 0.0);
        let Some((inner, outer)) = circles(&q) else {
            return Ok(true);
        };
        let dist = (inner.center - outer.center).norm();
        rec.set("dist_of_circle_centers.mm", dist);
        Ok(self.bounds.contains(dist))
    }
}

/// Product of the signed xy bend angles (degrees²) of both triplets. A track
/// in a solenoid bends one way only, so a sign flip gives a negative
/// product.
#[derive(Clone, Debug)]
pub struct NoZigZag {
    bounds: Bounds,
}

impl NoZigZag {
    pub fn new(bounds: Bounds) -> Self {
        Self { bounds }
    }
}

impl Criterion for NoZigZag {
    fn kind(&self) -> CriterionKind {
        CriterionKind::NoZigZag
    }

    fn evaluate(
        &self,
        parent: &Segment,
        child: &Segment,
        values: Option<&mut CriterionValues>,
    ) -> Result<bool, CriterionError> {
        check_arity(self.kind(), parent, child)?;
        let mut rec = Recorder::new(values);
        let [a, b, c, d] = quadruplet(parent, child);
        let ab = xy(&(b - a));
        let bc = xy(&(c - b));
        let cd = xy(&(d - c));
        rec.set("no_zig_zag.product", 0.0);
        let (Some(first), Some(second)) = (signed_bend_2d(&ab, &bc), signed_bend_2d(&bc, &cd)) else {
            return Ok(true);
        };
        let product = first.to_degrees() * second.to_degrees();
        rec.set("no_zig_zag.product", product);
        Ok(self.bounds.contains(product))
    }
}

/// Ratio of the child circle radius to the parent circle radius.
#[derive(Clone, Debug)]
pub struct RChange {
    bounds: Bounds,
}

impl RChange {
    pub fn new(bounds: Bounds) -> Self {
        Self { bounds }
    }
}

impl Criterion for RChange {
    fn kind(&self) -> CriterionKind {
        CriterionKind::RChange
    }

    fn evaluate(
        &self,
        parent: &Segment,
        child: &Segment,
        values: Option<&mut CriterionValues>,
    ) -> Result<bool, CriterionError> {
        check_arity(self.kind(), parent, child)?;
        let mut rec = Recorder::new(values);
        let q = quadruplet(parent, child);
        rec.set("r_change.ratio", 1.0);
        let Some((inner, outer)) = circles(&q) else {
            return Ok(true);
        };
        if inner.radius <= 0.0 {
            return Ok(true);
        }
        let ratio = outer.radius / inner.radius;
        rec.set("r_change.ratio", ratio);
        Ok(self.bounds.contains(ratio))
    }
}

/// Ratio of the turning rate `dφ/dz` of the outer step (`c → d` on the child
/// circle) to that of the inner step (`b → c` on the parent circle).
#[derive(Clone, Debug)]
pub struct PhiZRatioChange {
    bounds: Bounds,
}

impl PhiZRatioChange {
    pub fn new(bounds: Bounds) -> Self {
        Self { bounds }
    }
}

impl Criterion for PhiZRatioChange {
    fn kind(&self) -> CriterionKind {
        CriterionKind::PhiZRatioChange
    }

    fn evaluate(
        &self,
        parent: &Segment,
        child: &Segment,
        values: Option<&mut CriterionValues>,
    ) -> Result<bool, CriterionError> {
        check_arity(self.kind(), parent, child)?;
        let mut rec = Recorder::new(values);
        let q = quadruplet(parent, child);
        let [_, b, c, d] = q;
        rec.set("phi_z_ratio_change.ratio", 1.0);
        let Some((inner, outer)) = circles(&q) else {
            return Ok(true);
        };
        let dz_inner = c.z - b.z;
        let dz_outer = d.z - c.z;
        if dz_inner == 0.0 || dz_outer == 0.0 {
            return Ok(true);
        }
        let rate_inner = wrap_angle(inner.phase_of(&xy(&c)) - inner.phase_of(&xy(&b))) / dz_inner;
        let rate_outer = wrap_angle(outer.phase_of(&xy(&d)) - outer.phase_of(&xy(&c))) / dz_outer;
        if rate_inner == 0.0 {
            return Ok(true);
        }
        let ratio = rate_outer / rate_inner;
        rec.set("phi_z_ratio_change.ratio", ratio);
        Ok(self.bounds.contains(ratio))
    }
}

/// Transverse distance between `d` and the extrapolation of the parent
/// triplet to `z_d`, per mm of z travelled. Collinear parents extrapolate
/// along a straight line, curved ones along the helix.
#[derive(Clone, Debug)]
pub struct DistToExtrapolation {
    bounds: Bounds,
}

impl DistToExtrapolation {
    pub fn new(bounds: Bounds) -> Self {
        Self { bounds }
    }
}

impl Criterion for DistToExtrapolation {
    fn kind(&self) -> CriterionKind {
        CriterionKind::DistToExtrapolation
    }

    fn evaluate(
        &self,
        parent: &Segment,
        child: &Segment,
        values: Option<&mut CriterionValues>,
    ) -> Result<bool, CriterionError> {
        check_arity(self.kind(), parent, child)?;
        let mut rec = Recorder::new(values);
        let [a, b, c, d] = quadruplet(parent, child);
        rec.set("dist_to_extrapolation.mm", 0.0);
        rec.set("dist_to_extrapolation.ratio", 0.0);
        let dz_step = c.z - b.z;
        let dz_target = d.z - c.z;
        if dz_step == 0.0 || dz_target == 0.0 {
            return Ok(true);
        }
        let predicted = match Circle::through(&xy(&a), &xy(&b), &xy(&c)) {
            Some(circle) => {
                let phase_c = circle.phase_of(&xy(&c));
                let rate = wrap_angle(phase_c - circle.phase_of(&xy(&b))) / dz_step;
                circle.point_at(phase_c + rate * dz_target)
            }
            None => xy(&c) + xy(&(c - b)) * (dz_target / dz_step),
        };
        let dist = (xy(&d) - predicted).norm();
        let ratio = dist / dz_target.abs();
        rec.set("dist_to_extrapolation.mm", dist);
        rec.set("dist_to_extrapolation.ratio", ratio);
        Ok(self.bounds.contains(ratio))
    }
}
