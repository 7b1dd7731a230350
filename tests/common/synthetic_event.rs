use forward_tracking::{FittedTrack, Hit, HitRecord, TrackFitter};
use std::f64::consts::PI;

/// Distance (mm) between consecutive disks.
pub const LAYER_SPACING: f64 = 100.0;

/// Records of a straight track from the origin with polar angle `theta_deg`
/// and azimuth `phi_deg`, one hit per layer at |z| = LAYER_SPACING · layer.
/// The module follows from the azimuth; every hit is on sensor 0.
pub fn straight_track(
    theta_deg: f64,
    phi_deg: f64,
    side: i8,
    layers: std::ops::RangeInclusive<u32>,
    modules: u32,
) -> Vec<HitRecord> {
    let phi = phi_deg.to_radians();
    let module = ((phi.rem_euclid(2.0 * PI) / (2.0 * PI) * modules as f64) as u32).min(modules - 1);
    layers
        .map(|layer| {
            let z = LAYER_SPACING * layer as f64;
            let rho = z * theta_deg.to_radians().tan();
            HitRecord::new(
                [rho * phi.cos(), rho * phi.sin(), side as f64 * z],
                side,
                layer,
                module,
                0,
            )
        })
        .collect()
}

/// Fitter giving every hit list with at least one hit the same quality.
#[derive(Debug)]
pub struct FixedQuality(pub f64);

impl TrackFitter for FixedQuality {
    fn fit(&self, hits: &[Hit]) -> Option<FittedTrack> {
        if hits.is_empty() {
            return None;
        }
        Some(FittedTrack {
            chi2: 0.0,
            ndf: 1,
            quality: self.0,
        })
    }
}
