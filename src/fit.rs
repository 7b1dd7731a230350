//! Interface to the external track fitter, plus a straight-line reference
//! implementation used by the demo tool and the tests.

use crate::types::Hit;
use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Goodness of fit of one hit sequence.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FittedTrack {
    pub chi2: f64,
    pub ndf: u32,
    /// Fit quality in `(0, 1]`, higher is better.
    pub quality: f64,
}

/// Fits an ordered (inner to outer) list of measured hits. `None` means the
/// fit failed and the candidate is dropped.
pub trait TrackFitter: fmt::Debug + Send + Sync {
    fn fit(&self, hits: &[Hit]) -> Option<FittedTrack>;
}

/// Least-squares straight line through the hits (principal axis of their
/// scatter matrix) with isotropic resolution `sigma` in mm.
///
/// `chi2` sums squared perpendicular residuals over `sigma²`,
/// `ndf = 2·n − 4`, `quality = exp(−chi2 / (2·ndf))`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineFitter {
    pub sigma: f64,
}

impl Default for LineFitter {
    fn default() -> Self {
        Self { sigma: 0.05 }
    }
}

impl LineFitter {
    pub fn new(sigma: f64) -> Self {
        Self { sigma }
    }
}

impl TrackFitter for LineFitter {
    fn fit(&self, hits: &[Hit]) -> Option<FittedTrack> {
        if hits.len() < 3 || self.sigma <= 0.0 {
            return None;
        }
        let n = hits.len() as f64;
        let centroid: Vector3<f64> = hits.iter().map(|h| h.position).sum::<Vector3<f64>>() / n;
        let scatter: Matrix3<f64> = hits
            .iter()
            .map(|h| {
                let d = h.position - centroid;
                d * d.transpose()
            })
            .sum();
        let eigen = scatter.symmetric_eigen();
        let axis: Vector3<f64> = eigen.eigenvectors.column(eigen.eigenvalues.imax()).into_owned();
        if !axis.iter().all(|v| v.is_finite()) {
            return None;
        }

        let chi2: f64 = hits
            .iter()
            .map(|h| {
                let d = h.position - centroid;
                (d - axis * d.dot(&axis)).norm_squared()
            })
            .sum::<f64>()
            / (self.sigma * self.sigma);
        let ndf = 2 * hits.len() as u32 - 4;
        let quality = (-chi2 / (2.0 * ndf as f64)).exp();
        Some(FittedTrack { chi2, ndf, quality })
    }
}
