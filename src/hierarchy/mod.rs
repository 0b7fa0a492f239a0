//! Decomposition trees and the recursive builder that produces them.
//!
//! # The output
//!
//! A decomposition tree has one leaf per graph vertex. Internal nodes are
//! nested clusters; the weight of the edge above a node says how expensive
//! it is to separate that cluster from its siblings:
//!
//! ```text
//!                    root
//!                  /      \
//!             R (∞)        L (w = out-degree of L)
//!              |            |
//!          C₁ (∞)       C₂ (∞)      C₃ (∞)
//!          /   \          |          ...
//!        ...   ...      v₇ (deg v₇)
//! ```
//!
//! Weight `∞` marks edges that are never the first to be cut.
//!
//! # Module Overview
//!
//! - [`tree`]: [`DecompositionTree`] (append-only arena) and [`TreeFragment`]
//! - [`decompose`]: [`Decomposer`] and [`DecompositionConfig`]
//! - validation: [`DecompositionTree::validate`] and [`HealthCheck`]

pub mod decompose;
pub mod tree;
mod validate;

pub use decompose::{decompose, DecompositionConfig, Decomposer};
pub use tree::{DecompositionTree, NodeKind, TreeFragment, TreeNode};
pub use validate::{
    validate_tree_structure, HealthCheck, HealthReport, Severity, ValidationIssue, ValidationReport,
};
