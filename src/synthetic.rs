//! Seeded synthetic events for demos and tests.
//!
//! Tracks are straight lines from the interaction point. Each disk layer is a
//! plane at fixed |z|; a crossing inside the disk's radial acceptance becomes
//! a hit on the module covering its azimuth and the sensor covering its
//! radius. Noise hits are spread uniformly over the same acceptance.

use crate::sectors::GeometryParams;
use crate::types::HitRecord;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SyntheticEventConfig {
    pub tracks: usize,
    pub noise_hits: usize,
    /// |z| (mm) of the disk planes, layer 1 first.
    pub layer_z: Vec<f64>,
    /// Radial acceptance (mm) of every disk.
    pub rho_min: f64,
    pub rho_max: f64,
    /// Radial extent (mm) of one sensor; sensor 0 is the innermost.
    pub sensor_pitch: f64,
    /// Polar-angle range (deg) of generated tracks.
    pub theta_min_deg: f64,
    pub theta_max_deg: f64,
    /// Half-width (mm) of the uniform smearing applied to x and y.
    pub resolution: f64,
    /// Chance that a crossing also leaves a hit in the neighbouring module.
    pub overlap_probability: f64,
    pub seed: u64,
}

impl Default for SyntheticEventConfig {
    fn default() -> Self {
        Self {
            tracks: 5,
            noise_hits: 10,
            layer_z: vec![220.0, 370.0, 650.0, 850.0, 1050.0, 1250.0, 1450.0],
            rho_min: 20.0,
            rho_max: 300.0,
            sensor_pitch: 150.0,
            theta_min_deg: 7.0,
            theta_max_deg: 20.0,
            resolution: 0.005,
            overlap_probability: 0.0,
            seed: 7,
        }
    }
}

/// Generated hit records plus, per true track, the indices of its records
/// ordered inner to outer.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyntheticEvent {
    pub records: Vec<HitRecord>,
    pub tracks: Vec<Vec<usize>>,
}

/// Generates one event for `geometry`. Layers beyond the geometry or
/// `layer_z` are left empty.
pub fn generate_event(config: &SyntheticEventConfig, geometry: &GeometryParams) -> SyntheticEvent {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let layers = config
        .layer_z
        .len()
        .min(geometry.layers.saturating_sub(1) as usize);
    let (theta_lo, theta_hi) = ordered(config.theta_min_deg, config.theta_max_deg);
    let (rho_lo, rho_hi) = ordered(config.rho_min, config.rho_max);
    let mut event = SyntheticEvent::default();

    for _ in 0..config.tracks {
        let side: i8 = if rng.gen_bool(0.5) { 1 } else { -1 };
        let theta = rng.gen_range(theta_lo..=theta_hi).to_radians();
        let phi = rng.gen_range(0.0..2.0 * PI);
        let mut track = Vec::new();
        for (i, &plane_z) in config.layer_z.iter().take(layers).enumerate() {
            let rho = plane_z * theta.tan();
            if rho < rho_lo || rho > rho_hi {
                continue;
            }
            let layer = i as u32 + 1;
            let x = rho * phi.cos() + smear(&mut rng, config.resolution);
            let y = rho * phi.sin() + smear(&mut rng, config.resolution);
            let z = side as f64 * plane_z;
            let Some(record) = record_at([x, y, z], side, layer, config, geometry) else {
                continue;
            };
            let module = record.module;
            track.push(event.records.len());
            event.records.push(record);

            if geometry.modules > 1 && rng.gen_bool(config.overlap_probability.clamp(0.0, 1.0)) {
                if let Some(mut duplicate) = record_at(
                    [x + smear(&mut rng, 1.0), y + smear(&mut rng, 1.0), z + side as f64 * 2.0],
                    side,
                    layer,
                    config,
                    geometry,
                ) {
                    duplicate.module = (module + 1) % geometry.modules;
                    event.records.push(duplicate);
                }
            }
        }
        event.tracks.push(track);
    }

    for _ in 0..config.noise_hits {
        if layers == 0 {
            break;
        }
        let side: i8 = if rng.gen_bool(0.5) { 1 } else { -1 };
        let layer_index = rng.gen_range(0..layers);
        let rho = rng.gen_range(rho_lo..=rho_hi);
        let phi = rng.gen_range(0.0..2.0 * PI);
        let z = side as f64 * config.layer_z[layer_index];
        if let Some(record) = record_at(
            [rho * phi.cos(), rho * phi.sin(), z],
            side,
            layer_index as u32 + 1,
            config,
            geometry,
        ) {
            event.records.push(record);
        }
    }
    event
}

fn ordered(a: f64, b: f64) -> (f64, f64) {
    (a.min(b), a.max(b))
}

fn smear(rng: &mut StdRng, half_width: f64) -> f64 {
    if half_width > 0.0 {
        rng.gen_range(-half_width..=half_width)
    } else {
        0.0
    }
}

/// Record for a point on a disk, with module from the azimuth and sensor
/// from the radius. `None` outside the geometry.
fn record_at(
    position: [f64; 3],
    side: i8,
    layer: u32,
    config: &SyntheticEventConfig,
    geometry: &GeometryParams,
) -> Option<HitRecord> {
    if layer >= geometry.layers || geometry.modules == 0 || geometry.sensors == 0 {
        return None;
    }
    let phi = position[1].atan2(position[0]).rem_euclid(2.0 * PI);
    let module = ((phi / (2.0 * PI) * geometry.modules as f64) as u32).min(geometry.modules - 1);
    let rho = position[0].hypot(position[1]);
    let pitch = config.sensor_pitch.max(f64::EPSILON);
    let sensor = (((rho - config.rho_min).max(0.0) / pitch) as u32).min(geometry.sensors - 1);
    Some(HitRecord::new(position, side, layer, module, sensor))
}
