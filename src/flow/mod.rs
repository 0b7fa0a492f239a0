//! Flow machinery for the cut-matching iteration.
//!
//! | Type | Role |
//! |------|------|
//! | [`FlowNetwork`] | undirected capacitated network |
//! | [`FlowProblem`] / [`FlowSolution`] | max flow, min cut, path decomposition |
//! | [`SubdivisionGraph`] | edges-as-vertices view with reversible source/sink |
//! | [`FlowRescaler`] | saturates heavily used source edges |
//!
//! The solver is scoped to what the decomposition needs: single source,
//! single sink, real capacities, Edmonds–Karp.

mod network;
mod rescale;
mod subdivision;

pub use network::{
    FlowNetwork, FlowPath, FlowProblem, FlowSolution, MatchedPair, MinCut, NetworkEdge,
};
pub use rescale::FlowRescaler;
pub use subdivision::{SplitVertex, SubdivisionGraph};
