//! Criterion analysis on known true tracks.
//!
//! Given the hits of a track whose origin is known (for example from
//! simulation truth), the analyser prepends the virtual interaction point,
//! thins out hits that sit closer than `dist_min` to their inner neighbour
//! (overlap duplicates), cuts the ordered hits into consecutive 1-, 2- and
//! 3-hit segments and evaluates every configured criterion on each
//! consecutive pair in instrumentation mode. The resulting samples show
//! which windows true tracks actually need.

use crate::criteria::{evaluate_all, Criteria, CriteriaConfig, CriterionContext, CriterionValues};
use crate::error::{ConfigError, TrackingError};
use crate::event::Event;
use crate::graph::{Segment, MAX_SEGMENT_HITS};
use crate::sectors::{GeometryParams, SectorSystem};
use crate::types::{Hit, HitRecord};
use log::debug;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnalysisParams {
    /// Hits closer than this (mm) to the previous kept hit are dropped.
    pub dist_min: f64,
    /// Tracks whose true origin lies farther from the IP (mm) are skipped.
    pub dist_to_ip_max: Option<f64>,
}

impl Default for AnalysisParams {
    fn default() -> Self {
        Self {
            dist_min: 5.0,
            dist_to_ip_max: None,
        }
    }
}

/// Criterion values of one consecutive parent/child pair of a true track.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CriterionSample {
    pub segment_len: usize,
    /// Decimal digits of the hit layers, outermost first: `743` for hits on
    /// layers 3, 4 and 7.
    pub layers: u64,
    /// Distance (mm) between the two hits; only for 1-hit segments.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
    /// Distance of the true origin from the interaction point, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dist_to_ip: Option<f64>,
    pub values: CriterionValues,
    /// Combined verdict of the configured windows.
    pub accepted: bool,
}

#[derive(Debug)]
pub struct TrueTrackAnalyser {
    sectors: SectorSystem,
    criteria: Criteria,
    params: AnalysisParams,
}

impl TrueTrackAnalyser {
    pub fn new(
        geometry: GeometryParams,
        criteria: &CriteriaConfig,
        ctx: &CriterionContext,
        params: AnalysisParams,
    ) -> Result<Self, ConfigError> {
        if !(params.dist_min >= 0.0) {
            return Err(ConfigError::InvalidParameter {
                name: "distMin",
                reason: "must be non-negative".to_string(),
            });
        }
        Ok(Self {
            sectors: SectorSystem::new(geometry)?,
            criteria: criteria.build(ctx)?,
            params,
        })
    }

    /// Samples for the hits of one true track. `vertex` is the track's true
    /// origin.
    pub fn analyse(
        &self,
        records: &[HitRecord],
        vertex: Option<Vector3<f64>>,
    ) -> Result<Vec<CriterionSample>, TrackingError> {
        let dist_to_ip = vertex.map(|v| v.norm());
        if let (Some(dist), Some(max)) = (dist_to_ip, self.params.dist_to_ip_max) {
            if dist > max {
                return Ok(Vec::new());
            }
        }
        let mut event = Event::from_records(records, &self.sectors)?;
        let mut real: Vec<Hit> = event.hits().iter().filter(|h| !h.is_virtual).copied().collect();
        real.sort_by(|a, b| a.z().abs().total_cmp(&b.z().abs()));
        let Some(first) = real.first() else {
            return Ok(Vec::new());
        };
        let side = first.address.side;
        let origin = event.add_virtual_origin(&self.sectors)[side.index() as usize];

        let mut hits: Vec<Hit> = Vec::with_capacity(real.len() + 1);
        hits.push(*event.hit(origin));
        for hit in real {
            let far_enough = hits
                .last()
                .map_or(true, |last| last.distance_to(&hit) >= self.params.dist_min);
            if far_enough {
                hits.push(hit);
            }
        }

        let mut samples = Vec::new();
        for segment_len in 1..=MAX_SEGMENT_HITS {
            let criteria = self.criteria.for_segment_len(segment_len);
            if criteria.is_empty() || hits.len() <= segment_len {
                continue;
            }
            for window in hits.windows(segment_len + 1) {
                let parent = Segment::new(window[..segment_len].to_vec());
                let child = Segment::new(window[1..].to_vec());
                let mut values = CriterionValues::new();
                let accepted = evaluate_all(&criteria, &parent, &child, &mut values)?;
                samples.push(CriterionSample {
                    segment_len,
                    layers: layers_code(window),
                    distance: (segment_len == 1).then(|| window[0].distance_to(&window[1])),
                    dist_to_ip,
                    values,
                    accepted,
                });
            }
        }
        debug!(
            "TrueTrackAnalyser::analyse hits={} kept={} samples={}",
            records.len(),
            hits.len(),
            samples.len()
        );
        Ok(samples)
    }
}

/// Layer digits, outermost first.
fn layers_code(hits: &[Hit]) -> u64 {
    hits.iter()
        .rev()
        .fold(0u64, |code, hit| code * 10 + u64::from(hit.layer()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criteria::CriterionKind;

    fn analyser(params: AnalysisParams) -> TrueTrackAnalyser {
        let criteria = CriteriaConfig::none()
            .with(CriterionKind::StraightTrackRatio, 0.9, 1.1)
            .with(CriterionKind::Angle3d, 0.0, 5.0)
            .with(CriterionKind::Angle3dChange, 0.0, 10.0);
        TrueTrackAnalyser::new(
            GeometryParams::default(),
            &criteria,
            &CriterionContext::default(),
            params,
        )
        .unwrap()
    }

    fn records(zs: &[f64]) -> Vec<HitRecord> {
        zs.iter()
            .enumerate()
            .map(|(i, &z)| HitRecord::new([0.2 * z, 0.1 * z, z], 1, i as u32 + 1, 0, 0))
            .collect()
    }

    #[test]
    fn consecutive_pairs_are_sampled_per_length() {
        let samples = analyser(AnalysisParams::default())
            .analyse(&records(&[100.0, 200.0, 300.0]), None)
            .unwrap();
        // IP + 3 hits: 3 two-hit, 2 three-hit and 1 four-hit pairs.
        let per_len: Vec<usize> = (1..=3)
            .map(|n| samples.iter().filter(|s| s.segment_len == n).count())
            .collect();
        assert_eq!(per_len, vec![3, 2, 1]);
        assert!(samples.iter().all(|s| s.accepted));
        assert_eq!(samples[0].layers, 10);
        assert_eq!(samples[3].layers, 210);
        assert_eq!(samples[5].layers, 3210);
        assert!(samples[0].distance.is_some());
        assert!(samples[3].distance.is_none());
        assert!(samples[3].values.get("angle_3d.degrees").is_some());
    }

    #[test]
    fn records_are_sorted_by_z() {
        let shuffled = vec![records(&[300.0])[0].clone(), records(&[100.0])[0].clone()];
        let samples = analyser(AnalysisParams::default()).analyse(&shuffled, None).unwrap();
        let two_hit: Vec<&CriterionSample> = samples.iter().filter(|s| s.segment_len == 1).collect();
        assert_eq!(two_hit.len(), 2);
        let distance = two_hit[1].distance.unwrap();
        let expected = Vector3::<f64>::new(40.0, 20.0, 200.0).norm();
        assert!((distance - expected).abs() < 1e-9);
    }

    #[test]
    fn close_hits_are_dropped() {
        let samples = analyser(AnalysisParams::default())
            .analyse(&records(&[100.0, 101.0, 200.0]), None)
            .unwrap();
        assert_eq!(samples.iter().filter(|s| s.segment_len == 1).count(), 2);
    }

    #[test]
    fn distant_origin_is_skipped() {
        let params = AnalysisParams {
            dist_to_ip_max: Some(10.0),
            ..AnalysisParams::default()
        };
        let a = analyser(params);
        let recs = records(&[100.0, 200.0]);
        assert!(a.analyse(&recs, Some(Vector3::new(0.0, 0.0, 50.0))).unwrap().is_empty());
        let near = a.analyse(&recs, Some(Vector3::new(0.0, 0.0, 1.0))).unwrap();
        assert!(near.iter().all(|s| s.dist_to_ip == Some(1.0)));
        assert!(!near.is_empty());
    }

    #[test]
    fn layers_code_puts_outermost_first() {
        let hits: Vec<Hit> = records(&[10.0, 20.0, 30.0])
            .into_iter()
            .zip([3u32, 4, 7])
            .enumerate()
            .map(|(i, (r, layer))| Hit {
                id: crate::types::HitId(i as u32),
                position: Vector3::new(r.position[0], r.position[1], r.position[2]),
                address: crate::types::DetectorAddress::new(crate::types::Side::Forward, layer, 0, 0),
                sector: crate::types::SectorId(0),
                is_virtual: false,
            })
            .collect();
        assert_eq!(layers_code(&hits), 743);
    }
}
