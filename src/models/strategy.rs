use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which externally hosted ordering algorithm to ask for a visit order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum SolverStrategy {
    #[default]
    #[serde(rename = "held-karp")]
    ExactHeldKarp,
    #[serde(rename = "nearest-neighbor")]
    NearestNeighbor,
    #[serde(rename = "best-edge")]
    BestEdgeInsertion,
}

impl SolverStrategy {
    pub const ALL: [SolverStrategy; 3] = [
        SolverStrategy::ExactHeldKarp,
        SolverStrategy::NearestNeighbor,
        SolverStrategy::BestEdgeInsertion,
    ];

    /// Path of the solver service endpoint hosting this strategy
    pub fn endpoint(&self) -> &'static str {
        match self {
            SolverStrategy::ExactHeldKarp => "/solve_tsp",
            SolverStrategy::NearestNeighbor => "/solve_tsp_nn",
            SolverStrategy::BestEdgeInsertion => "/solve_tsp_be",
        }
    }
}

impl fmt::Display for SolverStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolverStrategy::ExactHeldKarp => write!(f, "held-karp"),
            SolverStrategy::NearestNeighbor => write!(f, "nearest-neighbor"),
            SolverStrategy::BestEdgeInsertion => write!(f, "best-edge"),
        }
    }
}

impl FromStr for SolverStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "held-karp" | "exact" => Ok(SolverStrategy::ExactHeldKarp),
            "nearest-neighbor" | "nearest-neighbour" | "nn" => Ok(SolverStrategy::NearestNeighbor),
            "best-edge" | "be" => Ok(SolverStrategy::BestEdgeInsertion),
            _ => Err(format!(
                "Invalid solver strategy: '{}'. Use 'held-karp', 'nearest-neighbor' or 'best-edge'",
                s
            )),
        }
    }
}
