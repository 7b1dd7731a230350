//! Geometry utilities shared by the criteria and the automaton.
//!
//! Window checks on angles are done on signed squared cosines
//! (`cos·|cos|`), which is monotonic in the angle over `[0°, 180°]` and avoids
//! `sqrt`/`acos` on the hot path.

use nalgebra::{Vector2, Vector3};

/// Returns `x·|x|`, a monotonic square that keeps the sign.
#[inline]
pub fn signed_square(x: f64) -> f64 {
    x * x.abs()
}

/// Slack on signed squared cosine bounds, so a `0°` window still accepts
/// collinear hits whose cosine rounds just below 1.
const COSINE_TOLERANCE: f64 = 1e-12;

/// Angle window `[min_deg, max_deg]` pre-converted to signed squared cosine
/// bounds. Degrees are clamped to `[0, 180]`, where cosine is monotonic.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CosineWindow {
    lo: f64,
    hi: f64,
}

impl CosineWindow {
    pub fn from_degrees(min_deg: f64, max_deg: f64) -> Self {
        let min_deg = min_deg.clamp(0.0, 180.0);
        let max_deg = max_deg.clamp(0.0, 180.0);
        // Larger angle -> smaller cosine.
        let cos_lo = max_deg.to_radians().cos();
        let cos_hi = min_deg.to_radians().cos();
        Self {
            lo: signed_square(cos_lo) - COSINE_TOLERANCE,
            hi: signed_square(cos_hi) + COSINE_TOLERANCE,
        }
    }

    /// Tests the angle between two vectors given `dot = u·v` and
    /// `norms_sq = |u|²·|v|²`. Returns `None` when a vector has zero length.
    #[inline]
    pub fn contains(&self, dot: f64, norms_sq: f64) -> Option<bool> {
        if norms_sq <= 0.0 {
            return None;
        }
        let value = signed_squared_cosine(dot, norms_sq);
        Some(value >= self.lo && value <= self.hi)
    }
}

/// `cos·|cos|` of the angle between two vectors, from `dot` and `|u|²|v|²`.
/// Clamped to `[-1, 1]` to absorb rounding.
#[inline]
pub fn signed_squared_cosine(dot: f64, norms_sq: f64) -> f64 {
    (dot * dot.abs() / norms_sq).clamp(-1.0, 1.0)
}

/// Converts a signed squared cosine back to an angle in degrees. Only used
/// for diagnostics.
pub fn degrees_from_signed_squared_cosine(value: f64) -> f64 {
    let cos = value.signum() * value.abs().sqrt();
    cos.clamp(-1.0, 1.0).acos().to_degrees()
}

/// Unsigned angle in radians between two 3-D vectors, `None` if either has
/// zero length.
pub fn angle_between(u: &Vector3<f64>, v: &Vector3<f64>) -> Option<f64> {
    let norms_sq = u.norm_squared() * v.norm_squared();
    if norms_sq <= 0.0 {
        return None;
    }
    let cos = u.dot(v) / norms_sq.sqrt();
    Some(cos.clamp(-1.0, 1.0).acos())
}

/// Signed bend in radians from `u` to `v` in the transverse plane,
/// counter-clockwise positive. `None` if either has zero length.
pub fn signed_bend_2d(u: &Vector2<f64>, v: &Vector2<f64>) -> Option<f64> {
    if u.norm_squared() <= 0.0 || v.norm_squared() <= 0.0 {
        return None;
    }
    let cross = u.x * v.y - u.y * v.x;
    Some(cross.atan2(u.dot(v)))
}

/// Transverse-plane projection.
#[inline]
pub fn xy(p: &Vector3<f64>) -> Vector2<f64> {
    Vector2::new(p.x, p.y)
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Circle {
    pub center: Vector2<f64>,
    pub radius: f64,
}

impl Circle {
    /// Circle through three transverse points, `None` when they are
    /// (numerically) collinear or coincide.
    pub fn through(a: &Vector2<f64>, b: &Vector2<f64>, c: &Vector2<f64>) -> Option<Self> {
        let d = 2.0 * (a.x * (b.y - c.y) + b.x * (c.y - a.y) + c.x * (a.y - b.y));
        let scale = a.abs().max().max(b.abs().max()).max(c.abs().max());
        if d.abs() <= 1e-12 * (1.0 + scale * scale) {
            return None;
        }
        let a2 = a.norm_squared();
        let b2 = b.norm_squared();
        let c2 = c.norm_squared();
        let ux = (a2 * (b.y - c.y) + b2 * (c.y - a.y) + c2 * (a.y - b.y)) / d;
        let uy = (a2 * (c.x - b.x) + b2 * (a.x - c.x) + c2 * (b.x - a.x)) / d;
        let center = Vector2::new(ux, uy);
        let radius = (a - center).norm();
        Some(Self { center, radius })
    }

    /// Azimuth of `p` seen from the circle centre, radians in `(-π, π]`.
    pub fn phase_of(&self, p: &Vector2<f64>) -> f64 {
        let d = p - self.center;
        d.y.atan2(d.x)
    }

    pub fn point_at(&self, phase: f64) -> Vector2<f64> {
        self.center + Vector2::new(phase.cos(), phase.sin()) * self.radius
    }
}

/// Wraps an angle difference into `(-π, π]`.
pub fn wrap_angle(mut delta: f64) -> f64 {
    use std::f64::consts::{PI, TAU};
    delta = delta.rem_euclid(TAU);
    if delta > PI {
        delta -= TAU;
    }
    delta
}
