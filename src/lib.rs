//! # cleave
//!
//! Hierarchical balanced decomposition of weighted undirected graphs.
//!
//! The decomposition is a tree whose leaves are the graph's vertices and whose
//! internal nodes are nested, roughly balanced clusters. Each level is found
//! by a randomized cut-matching iteration (after Khandekar, Rao and Vazirani)
//! that runs max-flow problems on the subdivision graph, followed by one
//! min-cut that pulls the separator towards the cluster boundary.
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`graph`] | input graphs and induced subgraphs |
//! | [`flow`] | max flow, min cut, path decomposition, subdivision graphs |
//! | [`krv`] | the cut-matching iteration |
//! | [`bisection`] | Phase A and Phase B of one bisection |
//! | [`hierarchy`] | decomposition trees and the recursive builder |
//!
//! Logging goes through `tracing`; install a subscriber to see it.

pub mod bisection;
/// Error types used across `cleave`.
pub mod error;
pub mod flow;
pub mod graph;
pub mod hierarchy;
pub mod krv;

#[cfg(test)]
mod decomposition_tests;

pub use error::{Error, Result};
pub use graph::{Subgraph, WeightedGraph};
pub use hierarchy::{
    decompose, DecompositionConfig, DecompositionTree, Decomposer, HealthCheck, NodeKind,
    ValidationReport,
};
pub use krv::{DivisionStrategy, KrvConfig};
