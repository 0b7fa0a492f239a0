//! Two-phase bisection of a subgraph.
//!
//! **Phase A** runs the cut-matching loop on every edge of `S`. What remains
//! active or inactive is a balanced separator `F_A`; the connected components
//! of `S − F_A` are the internal clusters.
//!
//! **Phase B** pulls the separator towards the boundary of `S`:
//!
//! ```text
//!   source ──w(b)/log₂|V(G)|──► inside endpoint of boundary edge b
//!   x_e    ──w(e)─────────────► sink               for every e ∈ F_A
//! ```
//!
//! One min cut on the subdivision graph of `S` gives the final separator and
//! splits the vertices into the source side `R` and the sink side `L`.

use crate::error::Result;
use crate::flow::{FlowProblem, SplitVertex, SubdivisionGraph};
use crate::graph::Subgraph;
use crate::krv::{KrvConfig, KrvIteration, KrvOutcome};
use rand::Rng;
use tracing::debug;

/// Result of Phase A.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseA {
    /// Local edges of the separator, ascending.
    pub separator: Vec<usize>,
    /// Components of `S` minus the separator, as global vertices.
    pub clusters: Vec<Vec<usize>>,
    /// Diagnostics of the underlying run.
    pub outcome: KrvOutcome,
}

/// Result of Phase B.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseB {
    /// Local edges of the final separator, ascending.
    pub separator: Vec<usize>,
    /// Vertices reachable from the source (R), global, ascending.
    pub source_side: Vec<usize>,
    /// The remaining vertices (L), global, ascending.
    pub sink_side: Vec<usize>,
    /// Capacity of the min cut.
    pub cut_capacity: f64,
}

/// Run Phase A on `subgraph`.
pub fn phase_a<R: Rng + ?Sized>(
    subgraph: &Subgraph<'_>,
    config: &KrvConfig,
    rng: &mut R,
) -> Result<PhaseA> {
    let seed: Vec<usize> = (0..subgraph.edge_count()).collect();
    let outcome = KrvIteration::new(subgraph, config).run(&seed, rng)?;
    let separator = outcome.separator();

    let mut removed = vec![false; subgraph.edge_count()];
    for &e in &separator {
        removed[e] = true;
    }
    let clusters: Vec<Vec<usize>> = subgraph
        .components(&removed)
        .into_iter()
        .map(|component| {
            component
                .into_iter()
                .map(|v| subgraph.global_vertex(v))
                .collect()
        })
        .collect();

    debug!(
        vertices = subgraph.vertex_count(),
        separator = separator.len(),
        clusters = clusters.len(),
        "phase A"
    );
    Ok(PhaseA {
        separator,
        clusters,
        outcome,
    })
}

/// Run Phase B on `subgraph` given Phase A's separator (local edges).
pub fn phase_b(subgraph: &Subgraph<'_>, separator: &[usize]) -> PhaseB {
    let graph = subgraph.graph();
    let scale = (graph.node_count() as f64).log2().max(1.0);

    let mut subdivision = SubdivisionGraph::new(subgraph);
    let sources: Vec<(SplitVertex, f64)> = subgraph
        .boundary_edges()
        .iter()
        .filter_map(|&b| {
            let v = subgraph.inside_endpoint(b)?;
            Some((SplitVertex::Vertex(v), graph.weight(b) / scale))
        })
        .collect();
    let sinks: Vec<(SplitVertex, f64)> = separator
        .iter()
        .map(|&e| (SplitVertex::Edge(e), subgraph.weight(e)))
        .collect();
    let (source, sink) = subdivision.attach_terminals(sources, sinks);

    let cut = FlowProblem::new(subdivision.network(), source, sink)
        .max_flow()
        .min_cut();
    let final_separator = subdivision.translate_cut(&cut.edges);

    let (reached, rest): (Vec<usize>, Vec<usize>) =
        (0..subgraph.vertex_count()).partition(|&v| cut.source_side[v]);
    let to_global = |vs: Vec<usize>| -> Vec<usize> {
        vs.into_iter().map(|v| subgraph.global_vertex(v)).collect()
    };
    subdivision.detach();

    debug!(
        separator = final_separator.len(),
        source_side = reached.len(),
        sink_side = rest.len(),
        capacity = cut.capacity,
        "phase B"
    );
    PhaseB {
        separator: final_separator,
        source_side: to_global(reached),
        sink_side: to_global(rest),
        cut_capacity: cut.capacity,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{six_vertex_graph, WeightedGraph};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn config() -> KrvConfig {
        KrvConfig::default()
            .with_projections(16)
            .with_max_iterations(100)
    }

    #[test]
    fn test_phase_a_clusters_partition_the_subgraph() {
        let graph = six_vertex_graph();
        let sub = Subgraph::full(&graph);
        let mut rng = StdRng::seed_from_u64(17);
        let a = phase_a(&sub, &config(), &mut rng).unwrap();

        assert!(sub.is_balanced(a.separator.iter().copied()));
        let mut all: Vec<usize> = a.clusters.iter().flatten().copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..6).collect::<Vec<_>>());
        for cluster in &a.clusters {
            assert!(cluster.len() <= 4);
        }
    }

    #[test]
    fn test_phase_b_without_boundary_puts_everything_on_sink_side() {
        let graph = six_vertex_graph();
        let sub = Subgraph::full(&graph);
        let b = phase_b(&sub, &[2, 3, 4]);

        assert!(b.source_side.is_empty());
        assert_eq!(b.sink_side, (0..6).collect::<Vec<_>>());
        assert!(b.separator.is_empty());
        assert_eq!(b.cut_capacity, 0.0);
    }

    #[test]
    fn test_phase_b_cuts_between_boundary_and_separator() {
        // 0 - 1 - 2 - 3 - 4, with S = {1, 2, 3, 4}; the boundary edge (0,1)
        // feeds vertex 1 and the separator is edge (3,4).
        let graph = WeightedGraph::from_edges(
            5,
            &[(0, 1, 4.0), (1, 2, 1.0), (2, 3, 1.0), (3, 4, 1.0)],
        )
        .unwrap();
        let sub = Subgraph::induced(&graph, &[1, 2, 3, 4]);
        let separator = [sub.local_edge(3).unwrap()];
        let b = phase_b(&sub, &separator);

        // Source capacity 4 / log2(5) ≈ 1.72 exceeds every unit edge, so the
        // cut lands on one unit edge between vertex 1 and the sink.
        assert!((b.cut_capacity - 1.0).abs() < 1e-9);
        assert_eq!(b.separator.len(), 1);
        assert!(b.source_side.contains(&1));
        let mut all = b.source_side.clone();
        all.extend(&b.sink_side);
        all.sort_unstable();
        assert_eq!(all, vec![1, 2, 3, 4]);
    }
}
