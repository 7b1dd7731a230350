//! Criteria on two 2-hit segments. With parent `[a, b]` and child `[b, c]`
//! the three hits are `a` (innermost), `b`, `c` (outermost).

use super::{check_arity, Bounds, Criterion, CriterionKind, CriterionValues, Recorder, SquaredWindow};
use crate::error::CriterionError;
use crate::geometry::{
    degrees_from_signed_squared_cosine, signed_squared_cosine, xy, Circle, CosineWindow,
};
use crate::graph::Segment;
use nalgebra::Vector3;

fn triplet(parent: &Segment, child: &Segment) -> [Vector3<f64>; 3] {
    let p = parent.hits();
    [p[0].position, p[1].position, child.hits()[1].position]
}

/// Bend angle (degrees) between `ab` and `bc` projected on the xy plane.
#[derive(Clone, Debug)]
pub struct Angle2d {
    window: CosineWindow,
}

impl Angle2d {
    pub fn new(bounds: Bounds) -> Self {
        Self {
            window: CosineWindow::from_degrees(bounds.min, bounds.max),
        }
    }
}

impl Criterion for Angle2d {
    fn kind(&self) -> CriterionKind {
        CriterionKind::Angle2d
    }

    fn evaluate(
        &self,
        parent: &Segment,
        child: &Segment,
        values: Option<&mut CriterionValues>,
    ) -> Result<bool, CriterionError> {
        check_arity(self.kind(), parent, child)?;
        let mut rec = Recorder::new(values);
        let [a, b, c] = triplet(parent, child);
        let u = xy(&(b - a));
        let v = xy(&(c - b));
        let dot = u.dot(&v);
        let norms_sq = u.norm_squared() * v.norm_squared();
        rec.set("angle_2d.cos_squared", 1.0);
        rec.set("angle_2d.degrees", 0.0);
        let Some(inside) = self.window.contains(dot, norms_sq) else {
            return Ok(true);
        };
        if rec.active() {
            let cos_sq = signed_squared_cosine(dot, norms_sq);
            rec.set("angle_2d.cos_squared", cos_sq);
            rec.set("angle_2d.degrees", degrees_from_signed_squared_cosine(cos_sq));
        }
        Ok(inside)
    }
}

/// Bend angle (degrees) between `ab` and `bc` in space.
#[derive(Clone, Debug)]
pub struct Angle3d {
    window: CosineWindow,
}

impl Angle3d {
    pub fn new(bounds: Bounds) -> Self {
        Self {
            window: CosineWindow::from_degrees(bounds.min, bounds.max),
        }
    }
}

impl Criterion for Angle3d {
    fn kind(&self) -> CriterionKind {
        CriterionKind::Angle3d
    }

    fn evaluate(
        &self,
        parent: &Segment,
        child: &Segment,
        values: Option<&mut CriterionValues>,
    ) -> Result<bool, CriterionError> {
        check_arity(self.kind(), parent, child)?;
        let mut rec = Recorder::new(values);
        let [a, b, c] = triplet(parent, child);
        let u = b - a;
        let v = c - b;
        let dot = u.dot(&v);
        let norms_sq = u.norm_squared() * v.norm_squared();
        rec.set("angle_3d.cos_squared", 1.0);
        rec.set("angle_3d.degrees", 0.0);
        let Some(inside) = self.window.contains(dot, norms_sq) else {
            return Ok(true);
        };
        if rec.active() {
            let cos_sq = signed_squared_cosine(dot, norms_sq);
            rec.set("angle_3d.cos_squared", cos_sq);
            rec.set("angle_3d.degrees", degrees_from_signed_squared_cosine(cos_sq));
        }
        Ok(inside)
    }
}

/// Ratio of the distance-over-Δz of the outer step to that of the inner
/// step. Stays near 1 for tracks with constant polar angle.
#[derive(Clone, Debug)]
pub struct ChangeRzRatio {
    window: SquaredWindow,
}

impl ChangeRzRatio {
    pub fn new(bounds: Bounds) -> Self {
        Self {
            window: SquaredWindow::new(bounds),
        }
    }
}

impl Criterion for ChangeRzRatio {
    fn kind(&self) -> CriterionKind {
        CriterionKind::ChangeRzRatio
    }

    fn evaluate(
        &self,
        parent: &Segment,
        child: &Segment,
        values: Option<&mut CriterionValues>,
    ) -> Result<bool, CriterionError> {
        check_arity(self.kind(), parent, child)?;
        let mut rec = Recorder::new(values);
        let [a, b, c] = triplet(parent, child);
        let inner = b - a;
        let outer = c - b;
        rec.set("change_rz_ratio.ratio", 1.0);
        // (|outer|² / dz_outer²) / (|inner|² / dz_inner²)
        let numerator = outer.norm_squared() * inner.z * inner.z;
        let denominator = inner.norm_squared() * outer.z * outer.z;
        if denominator <= 0.0 {
            return Ok(true);
        }
        let ratio_sq = numerator / denominator;
        if rec.active() {
            rec.set("change_rz_ratio.ratio", ratio_sq.sqrt());
        }
        Ok(self.window.contains(ratio_sq))
    }
}

/// Transverse momentum (GeV) of the xy circle through the three hits.
#[derive(Clone, Debug)]
pub struct Pt {
    bounds: Bounds,
    b_field_tesla: f64,
}

impl Pt {
    pub fn new(bounds: Bounds, b_field_tesla: f64) -> Self {
        Self {
            bounds,
            b_field_tesla,
        }
    }
}

impl Criterion for Pt {
    fn kind(&self) -> CriterionKind {
        CriterionKind::Pt
    }

    fn evaluate(
        &self,
        parent: &Segment,
        child: &Segment,
        values: Option<&mut CriterionValues>,
    ) -> Result<bool, CriterionError> {
        check_arity(self.kind(), parent, child)?;
        let mut rec = Recorder::new(values);
        let [a, b, c] = triplet(parent, child);
        rec.set("pt.gev", 0.0);
        let Some(circle) = Circle::through(&xy(&a), &xy(&b), &xy(&c)) else {
            return Ok(true);
        };
        // pT [GeV] = 0.3 · B [T] · R [m]
        let pt = 0.3 * self.b_field_tesla * circle.radius / 1000.0;
        rec.set("pt.gev", pt);
        Ok(self.bounds.contains(pt))
    }
}

/// Distance (mm) of the origin from the xy circle through the three hits.
#[derive(Clone, Debug)]
pub struct IpCircleDist {
    bounds: Bounds,
}

impl IpCircleDist {
    pub fn new(bounds: Bounds) -> Self {
        Self { bounds }
    }
}

impl Criterion for IpCircleDist {
    fn kind(&self) -> CriterionKind {
        CriterionKind::IpCircleDist
    }

    fn evaluate(
        &self,
        parent: &Segment,
        child: &Segment,
        values: Option<&mut CriterionValues>,
    ) -> Result<bool, CriterionError> {
        check_arity(self.kind(), parent, child)?;
        let mut rec = Recorder::new(values);
        let [a, b, c] = triplet(parent, child);
        rec.set("ip_circle_dist.mm", 0.0);
        let Some(circle) = Circle::through(&xy(&a), &xy(&b), &xy(&c)) else {
            return Ok(true);
        };
        let dist = (circle.center.norm() - circle.radius).abs();
        rec.set("ip_circle_dist.mm", dist);
        Ok(self.bounds.contains(dist))
    }
}
