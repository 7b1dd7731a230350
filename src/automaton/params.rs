//! Knobs of the cellular automaton's cleanup and extraction passes.

use serde::{Deserialize, Serialize};

/// Which roots make a chain worth keeping in [`super::Automaton::clean_bad_states`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChainAnchor {
    /// The chain must start at a segment whose first hit is virtual, i.e.
    /// it reaches back to the interaction point.
    #[default]
    VirtualHit,
    /// Any root with at least one compatible child anchors a chain.
    Any,
}

/// How track extraction picks among parents of equal state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TieBreak {
    /// Follow every tied parent; each branch yields its own raw track.
    #[default]
    Branch,
    /// Follow only the parent joining the child with the smallest bend.
    Straightest,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AutomatonParams {
    pub anchor: ChainAnchor,
    pub tie_break: TieBreak,
    /// Upper bound on raw tracks extracted from one chain end when
    /// branching on ties.
    pub max_branches: usize,
}

impl Default for AutomatonParams {
    fn default() -> Self {
        Self {
            anchor: ChainAnchor::default(),
            tie_break: TieBreak::default(),
            max_branches: 16,
        }
    }
}
