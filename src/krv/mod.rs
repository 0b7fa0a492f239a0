//! Cut-matching iteration over the edges of a subgraph.
//!
//! Every edge starts with its own flow vector. Rounds of max-flow between
//! two halves of the active edges either mix their flow vectors (matching)
//! or peel mass onto a small cut (deletion), until the flow vectors are close
//! to their mean. The active and inactive edges left at the end form a
//! balanced separator of the subgraph.
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`divider`] | source/sink selection per sampled direction |
//! | [`potential`] | random-projection potential |
//! | [`step`] | sparse linear steps and the edge partition |
//! | [`iteration`] | the loop and its configuration |

pub mod divider;
pub mod iteration;
pub mod potential;
pub mod step;

pub use divider::{Division, DivisionStrategy, VertexDivider};
pub use iteration::{KrvConfig, KrvIteration, KrvOutcome, Termination};
pub use potential::PotentialTracker;
pub use step::{DeletionStep, EdgePartition, MatchingStep, Route, SparseMap, Step};
