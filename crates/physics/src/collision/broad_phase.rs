//! Broad-phase strategies
//!
//! A closed set of strategies selected by configuration. Each one can be
//! cleared, updated with the current body positions and asked to detect the
//! confirmed collisions for the step.

use serde::{Deserialize, Serialize};

use crate::body::BodySet;
use crate::metrics::Metrics;
use crate::types::Bounds;
use super::{detect_all_pairs, detect_candidate_pairs, Collision, Grid, GridOptions, PairId};

/// Which strategy the engine uses
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BroadphaseKind {
    #[default]
    Grid,
    BruteForce,
}

impl std::str::FromStr for BroadphaseKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "grid" => Ok(Self::Grid),
            "bruteForce" | "brute-force" | "brute_force" => Ok(Self::BruteForce),
            other => Err(format!("unknown broadphase `{other}`")),
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BroadphaseOptions {
    pub kind: BroadphaseKind,
    pub grid: GridOptions,
}

/// Candidate set handed to the narrowphase
#[derive(Debug, Clone, Copy)]
pub enum Candidates<'a> {
    /// Pairs sharing a grid bucket
    Pairs(&'a [PairId]),
    /// No spatial filtering; every pair must be tested
    All,
}

#[derive(Debug, Clone)]
pub enum Broadphase {
    Grid(Grid),
    BruteForce,
}

impl Broadphase {
    pub fn new(options: &BroadphaseOptions) -> Self {
        match options.kind {
            BroadphaseKind::Grid => Self::Grid(Grid::new(options.grid)),
            BroadphaseKind::BruteForce => Self::BruteForce,
        }
    }

    pub fn kind(&self) -> BroadphaseKind {
        match self {
            Self::Grid(_) => BroadphaseKind::Grid,
            Self::BruteForce => BroadphaseKind::BruteForce,
        }
    }

    /// Drop all cached spatial state
    pub fn clear(&mut self) {
        if let Self::Grid(grid) = self {
            grid.clear();
        }
    }

    /// Bring the index in line with current body positions
    pub fn update(&mut self, bodies: &BodySet<'_>, world_bounds: &Bounds, force_update: bool) {
        if let Self::Grid(grid) = self {
            grid.update(bodies, world_bounds, force_update);
        }
    }

    pub fn candidates(&self) -> Candidates<'_> {
        match self {
            Self::Grid(grid) => Candidates::Pairs(grid.pairs()),
            Self::BruteForce => Candidates::All,
        }
    }

    /// Run the narrowphase over this strategy's candidates
    pub fn detect(&self, bodies: &BodySet<'_>, metrics: &mut Metrics) -> Vec<Collision> {
        match self.candidates() {
            Candidates::Pairs(pairs) => {
                metrics.broadphase_tests += pairs.len();
                detect_candidate_pairs(pairs, bodies, metrics)
            }
            Candidates::All => detect_all_pairs(bodies, metrics),
        }
    }

    pub fn grid(&self) -> Option<&Grid> {
        match self {
            Self::Grid(grid) => Some(grid),
            Self::BruteForce => None,
        }
    }
}

impl Default for Broadphase {
    fn default() -> Self {
        Self::new(&BroadphaseOptions::default())
    }
}
