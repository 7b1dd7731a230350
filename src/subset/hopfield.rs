//! Hopfield-network subset selection.
//!
//! Every candidate is a neuron with activation `s ∈ [0, 1]`. The local field
//! of neuron `i` rewards its quality and penalises active competitors:
//!
//! ```text
//! y_i = ω · Q_i − penalty · Σ_{j conflicts i} s_j
//! s_i ← ½ · (1 + tanh(y_i / T))
//! ```
//!
//! Neurons are updated asynchronously in a fresh random order each
//! iteration, and the temperature anneals as `T ← ½ (T + T_inf)`. The network
//! stops once no activation moves by more than `limit_for_stable`, or at the
//! iteration cap. Neurons above `threshold`, and every candidate without a
//! competitor, are then accepted greedily by quality so the result is always
//! hit-disjoint.

use super::{by_quality, conflict_lists, greedy_disjoint, Candidate, Selection, SubsetSelector};
use crate::error::ConfigError;
use log::{debug, warn};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HopfieldParams {
    /// Weight of the candidate quality in the local field.
    pub omega: f64,
    /// Start temperature.
    pub t_start: f64,
    /// Asymptotic temperature.
    pub t_inf: f64,
    /// Largest activation change still counted as converged.
    pub limit_for_stable: f64,
    /// Activation needed for acceptance.
    pub threshold: f64,
    pub max_iterations: usize,
    /// Weight of each active competitor.
    pub conflict_penalty: f64,
    /// Seed of the update-order shuffle.
    pub seed: u64,
}

impl Default for HopfieldParams {
    fn default() -> Self {
        Self {
            omega: 0.75,
            t_start: 2.1,
            t_inf: 0.1,
            limit_for_stable: 0.01,
            threshold: 0.5,
            max_iterations: 100,
            conflict_penalty: 1.0,
            seed: 0x5eed,
        }
    }
}

impl HopfieldParams {
    fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |name: &'static str, reason: &str| {
            Err(ConfigError::InvalidParameter {
                name,
                reason: reason.to_string(),
            })
        };
        if !(self.omega > 0.0 && self.omega.is_finite()) {
            return invalid("omega", "must be positive");
        }
        if !(self.t_inf > 0.0 && self.t_start >= self.t_inf && self.t_start.is_finite()) {
            return invalid("tStart", "temperatures must satisfy 0 < tInf <= tStart");
        }
        if !(self.limit_for_stable > 0.0) {
            return invalid("limitForStable", "must be positive");
        }
        if !(0.0..1.0).contains(&self.threshold) {
            return invalid("threshold", "must lie in [0, 1)");
        }
        if self.max_iterations == 0 {
            return invalid("maxIterations", "must be at least 1");
        }
        if !(self.conflict_penalty >= 0.0 && self.conflict_penalty.is_finite()) {
            return invalid("conflictPenalty", "must be non-negative");
        }
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct HopfieldSubset {
    params: HopfieldParams,
}

impl HopfieldSubset {
    pub fn new(params: HopfieldParams) -> Result<Self, ConfigError> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &HopfieldParams {
        &self.params
    }

    /// Final activations and the number of iterations run.
    pub fn activations(&self, candidates: &[Candidate]) -> (Vec<f64>, usize) {
        let p = &self.params;
        let conflicts = conflict_lists(candidates);
        let mut states = vec![0.0f64; candidates.len()];
        let mut order: Vec<usize> = (0..candidates.len()).collect();
        let mut rng = StdRng::seed_from_u64(p.seed);
        let mut temperature = p.t_start;
        let mut iterations = 0;
        let mut converged = candidates.is_empty();

        while !converged && iterations < p.max_iterations {
            iterations += 1;
            order.shuffle(&mut rng);
            let mut max_delta = 0.0f64;
            for &i in &order {
                let competition: f64 = conflicts[i].iter().map(|&j| states[j]).sum();
                let field = p.omega * candidates[i].quality - p.conflict_penalty * competition;
                let next = 0.5 * (1.0 + (field / temperature).tanh());
                max_delta = max_delta.max((next - states[i]).abs());
                states[i] = next;
            }
            temperature = 0.5 * (temperature + p.t_inf);
            converged = max_delta < p.limit_for_stable;
        }
        if !converged {
            warn!(
                "HopfieldSubset: no convergence after {} iterations ({} candidates)",
                iterations,
                candidates.len()
            );
        }
        (states, iterations)
    }
}

impl SubsetSelector for HopfieldSubset {
    fn select(&self, candidates: &[Candidate]) -> Selection {
        let (states, iterations) = self.activations(candidates);
        let conflicts = conflict_lists(candidates);
        let order = by_quality(candidates);
        let mask = greedy_disjoint(candidates, &order, |i| {
            conflicts[i].is_empty() || states[i] > self.params.threshold
        });
        let selection = Selection::from_mask(&mask, iterations);
        debug!(
            "HopfieldSubset::select candidates={} accepted={} iterations={}",
            candidates.len(),
            selection.accepted.len(),
            iterations
        );
        selection
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subset::is_disjoint;
    use crate::types::HitId;
    use rand::Rng;

    fn candidate(hits: &[u32], quality: f64) -> Candidate {
        Candidate::new(hits.iter().map(|&h| HitId(h)).collect(), quality)
    }

    fn selector(seed: u64) -> HopfieldSubset {
        HopfieldSubset::new(HopfieldParams {
            seed,
            ..HopfieldParams::default()
        })
        .unwrap()
    }

    #[test]
    fn prefers_better_of_two_conflicting_tracks() {
        let candidates = [candidate(&[1, 5], 0.4), candidate(&[2, 5], 0.9)];
        for seed in 0..8 {
            let selection = selector(seed).select(&candidates);
            assert_eq!(selection.accepted, vec![1], "seed {seed}");
            assert!(selection.iterations >= 1);
        }
    }

    #[test]
    fn zero_quality_candidate_without_competitors_is_kept() {
        let selection = selector(3).select(&[candidate(&[1, 2, 3], 0.0)]);
        assert_eq!(selection.accepted, vec![0]);
        assert!(selection.rejected.is_empty());

        let candidates = [candidate(&[1, 2], 0.0), candidate(&[2, 3], 0.9), candidate(&[7, 8], 0.0)];
        assert_eq!(selector(3).select(&candidates).accepted, vec![1, 2]);
    }

    #[test]
    fn independent_tracks_are_all_accepted() {
        let candidates = [candidate(&[1, 2], 0.9), candidate(&[3, 4], 0.05), candidate(&[5], 0.005)];
        let selection = selector(1).select(&candidates);
        assert_eq!(selection.accepted, vec![0, 1, 2]);
    }

    #[test]
    fn random_candidate_sets_yield_disjoint_output() {
        let mut rng = StdRng::seed_from_u64(7);
        for round in 0..20 {
            let candidates: Vec<Candidate> = (0..12)
                .map(|_| {
                    let hits: Vec<u32> = (0..4).map(|_| rng.gen_range(0..30)).collect();
                    candidate(&hits, rng.gen_range(0.01..1.0))
                })
                .collect();
            let selection = selector(round).select(&candidates);
            assert!(is_disjoint(&candidates, &selection.accepted), "round {round}");
            assert_eq!(selection.accepted.len() + selection.rejected.len(), candidates.len());
        }
    }

    #[test]
    fn same_seed_same_result() {
        let candidates = [
            candidate(&[1, 2, 3], 0.6),
            candidate(&[3, 4, 5], 0.6),
            candidate(&[5, 6, 1], 0.6),
        ];
        let a = selector(3).select(&candidates);
        let b = selector(3).select(&candidates);
        assert_eq!(a, b);
        assert!(is_disjoint(&candidates, &a.accepted));
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        let bad = [
            HopfieldParams {
                t_inf: 0.0,
                ..HopfieldParams::default()
            },
            HopfieldParams {
                threshold: 1.0,
                ..HopfieldParams::default()
            },
            HopfieldParams {
                max_iterations: 0,
                ..HopfieldParams::default()
            },
        ];
        for params in bad {
            assert!(HopfieldSubset::new(params).is_err(), "{params:?}");
        }
    }

    #[test]
    fn empty_input_does_not_iterate() {
        let selection = selector(0).select(&[]);
        assert_eq!(selection, Selection::default());
    }
}
