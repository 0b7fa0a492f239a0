//! The cut-matching loop.
//!
//! Each round samples a direction, splits the active set into sources and
//! sinks, solves one flow problem on the subdivision graph and turns the
//! result into two candidate steps. The candidate that lowers the potential
//! more is committed. The loop ends once the potential drops under the
//! convergence bound or a single active edge remains.
//!
//! ```text
//!            ┌──────────── Running ◄───────────┐
//!            │  divide → flow → steps → commit │
//!            ▼                                 │
//!   potential < bound ──► Terminated    size < 7/8 ──► Restarting
//! ```

use super::divider::{DivisionStrategy, VertexDivider};
use super::potential::PotentialTracker;
use super::step::{DeletionStep, EdgePartition, MatchingStep, Route, Step};
use crate::error::{Error, Result};
use crate::flow::{FlowProblem, FlowRescaler, FlowSolution, SubdivisionGraph};
use crate::graph::Subgraph;
use rand::Rng;
use std::collections::BTreeSet;
use tracing::{debug, trace, warn};

/// Parameters of the cut-matching loop.
#[derive(Debug, Clone, PartialEq)]
pub struct KrvConfig {
    /// Number of random directions tracked (K).
    pub projections: usize,
    /// How many times a matching step is applied per commit.
    pub matching_repetitions: usize,
    /// Share of matched mass exchanged per application.
    pub flow_movement_fraction: f64,
    /// Sink capacity as a share of edge weight.
    pub sink_capacity_fraction: f64,
    /// Restart once |A| + |B| falls below this share of the baseline.
    pub restart_fraction: f64,
    /// Multiplier on the `Φ₀ / (16 n²)` convergence bound.
    pub convergence_slack: f64,
    /// Rounds before giving up and returning the current sets.
    pub max_iterations: usize,
    /// Source selection on large active sets.
    pub division: DivisionStrategy,
}

impl Default for KrvConfig {
    fn default() -> Self {
        Self {
            projections: 100,
            matching_repetitions: 15,
            flow_movement_fraction: 0.5,
            sink_capacity_fraction: 0.5,
            restart_fraction: 7.0 / 8.0,
            convergence_slack: 8.0,
            max_iterations: 1000,
            division: DivisionStrategy::Practical,
        }
    }
}

impl KrvConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of tracked directions.
    pub fn with_projections(mut self, projections: usize) -> Self {
        self.projections = projections;
        self
    }

    /// Set how often a matching step is applied per commit.
    pub fn with_matching_repetitions(mut self, repetitions: usize) -> Self {
        self.matching_repetitions = repetitions;
        self
    }

    /// Set the matched-mass exchange share.
    pub fn with_flow_movement_fraction(mut self, fraction: f64) -> Self {
        self.flow_movement_fraction = fraction;
        self
    }

    /// Set the sink capacity share.
    pub fn with_sink_capacity_fraction(mut self, fraction: f64) -> Self {
        self.sink_capacity_fraction = fraction;
        self
    }

    /// Set the restart threshold.
    pub fn with_restart_fraction(mut self, fraction: f64) -> Self {
        self.restart_fraction = fraction;
        self
    }

    /// Set the convergence slack.
    pub fn with_convergence_slack(mut self, slack: f64) -> Self {
        self.convergence_slack = slack;
        self
    }

    /// Set the iteration cap.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Set the division strategy.
    pub fn with_division(mut self, division: DivisionStrategy) -> Self {
        self.division = division;
        self
    }

    /// Check every parameter is in range.
    pub fn validate(&self) -> Result<()> {
        if self.projections == 0 {
            return Err(Error::InvalidParameter {
                name: "projections",
                message: "must be at least 1",
            });
        }
        if self.matching_repetitions == 0 {
            return Err(Error::InvalidParameter {
                name: "matching_repetitions",
                message: "must be at least 1",
            });
        }
        let fractions = [
            ("flow_movement_fraction", self.flow_movement_fraction),
            ("sink_capacity_fraction", self.sink_capacity_fraction),
            ("restart_fraction", self.restart_fraction),
        ];
        for (name, value) in fractions {
            if !(value > 0.0 && value <= 1.0) {
                return Err(Error::InvalidParameter {
                    name,
                    message: "must be in (0, 1]",
                });
            }
        }
        if !(self.convergence_slack.is_finite() && self.convergence_slack > 0.0) {
            return Err(Error::InvalidParameter {
                name: "convergence_slack",
                message: "must be positive and finite",
            });
        }
        if self.max_iterations == 0 {
            return Err(Error::InvalidParameter {
                name: "max_iterations",
                message: "must be at least 1",
            });
        }
        Ok(())
    }
}

/// How the loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// |B| > 2|A| / log₂ n.
    Case1,
    /// |B| ≤ 2|A| / log₂ n.
    Case2,
}

/// Result and diagnostics of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct KrvOutcome {
    /// Final active and inactive sets, as local edges.
    pub partition: EdgePartition,
    /// Termination case.
    pub termination: Termination,
    /// Rounds executed, skipped rounds included.
    pub iterations: usize,
    /// Restarts performed.
    pub restarts: usize,
    /// Matching steps committed.
    pub matching_steps: usize,
    /// Deletion steps committed.
    pub deletion_steps: usize,
    /// Potential when the loop ended.
    pub potential: f64,
    /// Convergence bound.
    pub bound: f64,
    /// Whether the run stopped at the iteration cap.
    pub iteration_limit_reached: bool,
}

impl KrvOutcome {
    /// A ∪ B as local edges, ascending.
    pub fn separator(&self) -> Vec<usize> {
        self.partition.edges()
    }
}

/// The cut-matching loop over the edges of one subgraph.
#[derive(Debug)]
pub struct KrvIteration<'s, 'g> {
    subgraph: &'s Subgraph<'g>,
    config: &'s KrvConfig,
}

impl<'s, 'g> KrvIteration<'s, 'g> {
    /// Prepare a run over `subgraph`.
    pub fn new(subgraph: &'s Subgraph<'g>, config: &'s KrvConfig) -> Self {
        Self { subgraph, config }
    }

    /// Run from the seed edge set (local edges) until convergence.
    ///
    /// Fully determined by `rng`'s state.
    pub fn run<R: Rng + ?Sized>(&self, seed: &[usize], rng: &mut R) -> Result<KrvOutcome> {
        let config = self.config;
        let subgraph = self.subgraph;
        let weights = subgraph.weights();
        let n = subgraph.graph().node_count() as f64;
        let log_n = n.log2().max(1.0);

        let mut partition = EdgePartition::from_active(seed.iter().copied());
        let mut tracker = PotentialTracker::new(
            &weights,
            config.projections,
            partition.active.clone(),
            rng,
        );
        let initial = tracker.potential();
        let bound = config.convergence_slack * initial / (16.0 * n * n);

        let mut subdivision =
            SubdivisionGraph::new(subgraph).with_sink_fraction(config.sink_capacity_fraction);
        let divider = VertexDivider::new(config.division);
        let rescaler = FlowRescaler::new();

        let mut outcome = KrvOutcome {
            partition: EdgePartition::default(),
            termination: Termination::Case2,
            iterations: 0,
            restarts: 0,
            matching_steps: 0,
            deletion_steps: 0,
            potential: initial,
            bound,
            iteration_limit_reached: false,
        };
        let mut baseline = partition.len();
        let mut potential = initial;

        debug!(
            edges = partition.len(),
            vertices = subgraph.vertex_count(),
            potential = initial,
            bound,
            "krv start"
        );

        while initial > 0.0 && potential >= bound && partition.active.len() > 1 {
            if outcome.iterations == config.max_iterations {
                warn!(
                    iterations = outcome.iterations,
                    potential, bound, "krv iteration cap reached"
                );
                outcome.iteration_limit_reached = true;
                break;
            }
            outcome.iterations += 1;

            let projection = tracker.fresh_projection(rng);
            let division = divider.divide(&partition.active, &projection, &weights);
            if division.is_empty() {
                trace!(iteration = outcome.iterations, "empty division, skipping round");
                continue;
            }

            let (source, sink) = subdivision.attach(&division.sources, &division.sinks);
            let (cut, paths) = {
                let solution = FlowProblem::new(subdivision.network(), source, sink).max_flow();
                (solution.min_cut(), solution.paths())
            };
            let paths = rescaler.rescale(&mut subdivision, paths);
            let cut_edges = subdivision.translate_cut(&cut.edges);

            let cut_network: BTreeSet<usize> = cut.edges.iter().copied().collect();
            let routes: Vec<Route> = paths
                .iter()
                .filter_map(|path| {
                    let source = subdivision.edge_of_node(path.first_hop()?)?;
                    let crossing = *path.edges.iter().find(|&&e| cut_network.contains(&e))?;
                    let cut = *subdivision.translate_cut(&[crossing]).first()?;
                    Some(Route {
                        source,
                        cut,
                        mass: path.weight,
                    })
                })
                .collect();
            let pairs: Vec<(usize, usize, f64)> = FlowSolution::fractional_partial_matching(&paths)
                .into_iter()
                .filter_map(|pair| {
                    Some((
                        subdivision.edge_of_node(pair.from)?,
                        subdivision.edge_of_node(pair.to)?,
                        pair.weight,
                    ))
                })
                .collect();
            subdivision.detach();

            let deletion = DeletionStep::new(
                subgraph,
                &partition,
                &division,
                &cut_edges,
                &routes,
                config.restart_fraction * baseline as f64,
            );
            let matching = MatchingStep::new(
                &pairs,
                &weights,
                &partition.active,
                config.flow_movement_fraction,
                config.matching_repetitions,
            );
            let phi_matching = tracker.potential_after(&partition.active, matching.map());
            let phi_deletion =
                tracker.potential_after(&deletion.partition().active, deletion.map());

            let take_deletion = !deletion.no_progress()
                && if deletion.restart_needed() {
                    phi_deletion <= phi_matching
                } else {
                    phi_deletion < phi_matching
                };

            let mut restart = false;
            if take_deletion {
                outcome.deletion_steps += 1;
                restart = deletion.restart_needed();
                let map = deletion.map().clone();
                partition = deletion.into_partition();
                tracker.commit(map, partition.active.clone());
            } else {
                outcome.matching_steps += 1;
                tracker.commit(matching.map().clone(), partition.active.clone());
            }
            if (partition.len() as f64) < config.restart_fraction * baseline as f64 {
                restart = true;
            }
            if restart {
                partition.reactivate();
                baseline = partition.len();
                tracker.restart(partition.active.clone());
                outcome.restarts += 1;
            }

            potential = tracker.potential();
            trace!(
                iteration = outcome.iterations,
                step = if take_deletion { "deletion" } else { "matching" },
                phi_matching,
                phi_deletion,
                potential,
                active = partition.active.len(),
                inactive = partition.inactive.len(),
                restart,
                "krv round"
            );
        }

        // Φ over at most one active edge is zero, so reaching here with one
        // edge left and Φ ≥ bound means the estimate itself broke down.
        if partition.active.len() <= 1 && bound > 0.0 && potential >= bound {
            return Err(Error::ActiveSetCollapsed { potential, bound });
        }

        let inactive = partition.inactive.len() as f64;
        outcome.termination = if inactive <= 2.0 * partition.active.len() as f64 / log_n {
            Termination::Case2
        } else {
            Termination::Case1
        };
        outcome.potential = potential;
        outcome.partition = partition;

        debug!(
            iterations = outcome.iterations,
            restarts = outcome.restarts,
            matching = outcome.matching_steps,
            deletion = outcome.deletion_steps,
            separator = outcome.partition.len(),
            termination = ?outcome.termination,
            "krv done"
        );
        Ok(outcome)
    }
}
