#[cfg(test)]
mod tests {
    use crate::flow::{FlowNetwork, FlowProblem, FlowSolution, SubdivisionGraph};
    use crate::graph::{Subgraph, WeightedGraph};
    use crate::hierarchy::{decompose, DecompositionConfig, HealthCheck};
    use crate::krv::{DivisionStrategy, KrvConfig};
    use crate::Result;
    use petgraph::graph::UnGraph;
    use proptest::prelude::*;

    /// The six-vertex graph, with vertices numbered from 1 as usually drawn:
    /// (1,2,1) (1,3,2) (2,4,1) (3,4,1) (3,5,1) (4,6,2) (5,6,2).
    fn six_vertex_graph() -> Result<WeightedGraph> {
        let drawn = [
            (1, 2, 1.0),
            (1, 3, 2.0),
            (2, 4, 1.0),
            (3, 4, 1.0),
            (3, 5, 1.0),
            (4, 6, 2.0),
            (5, 6, 2.0),
        ];
        let edges: Vec<(usize, usize, f64)> =
            drawn.iter().map(|&(u, v, w)| (u - 1, v - 1, w)).collect();
        WeightedGraph::from_edges(6, &edges)
    }

    /// Two dense `k`-vertex communities joined by a single light edge.
    fn two_communities(k: usize) -> Result<WeightedGraph> {
        let mut graph = WeightedGraph::new(2 * k);
        for offset in [0, k] {
            for u in 0..k {
                for v in (u + 1)..k {
                    graph.add_edge(offset + u, offset + v, 1.0)?;
                }
            }
        }
        graph.add_edge(0, k, 0.1)?;
        Ok(graph)
    }

    fn quick(seed: u64) -> DecompositionConfig {
        DecompositionConfig::default()
            .with_krv(
                KrvConfig::default()
                    .with_projections(16)
                    .with_max_iterations(80),
            )
            .with_seed(seed)
    }

    #[test]
    fn test_end_to_end_flow_on_six_vertex_graph() -> Result<()> {
        let graph = six_vertex_graph()?;
        let network = FlowNetwork::from_graph(&graph);
        let solution = FlowProblem::new(&network, 0, 5).max_flow();

        assert!((solution.value() - 3.0).abs() < 1e-9);
        assert_eq!(solution.min_cut().edges.len(), 2);
        let paths = solution.paths();
        assert_eq!(paths.len(), 3);
        assert!(paths.iter().all(|p| (p.weight - 1.0).abs() < 1e-9));

        let matching = FlowSolution::fractional_partial_matching(&paths);
        assert_eq!(matching.len(), 3);
        assert!(matching.iter().all(|m| m.from != 0 && m.to != 5));
        Ok(())
    }

    #[test]
    fn test_balanced_clustering_on_six_vertex_graph() -> Result<()> {
        let graph = six_vertex_graph()?;
        let full = Subgraph::full(&graph);
        // {(1,2), (1,3)} and {(2,4), (3,4), (3,5)} in drawn numbering.
        assert!(!full.is_balanced([0, 1]));
        assert!(full.is_balanced([2, 3, 4]));
        Ok(())
    }

    #[test]
    fn test_flow_on_subdivision_graph_of_six_vertex_graph() -> Result<()> {
        let graph = six_vertex_graph()?;
        let sub = Subgraph::full(&graph);
        let mut sd = SubdivisionGraph::new(&sub);
        let pristine = sd.network().clone();

        // Source at edge (1,3), sinks at (4,6) and (5,6).
        let (s, t) = sd.attach(&[1], &[5, 6]);
        let solution = FlowProblem::new(sd.network(), s, t).max_flow();
        let cut = solution.min_cut();
        assert!((solution.value() - cut.capacity).abs() < 1e-9);
        let separator = sd.translate_cut(&cut.edges);
        assert!(!separator.is_empty());
        assert!(separator.iter().all(|&e| e < graph.edge_count()));

        sd.detach();
        assert_eq!(sd.network(), &pristine);
        Ok(())
    }

    #[test]
    fn test_two_communities_decompose_completely() -> Result<()> {
        let graph = two_communities(6)?;
        let tree = decompose(&graph, quick(21))?;

        let health = tree.health_check();
        assert!(health.is_healthy(), "{}", health);
        assert_eq!(tree.num_leaves(), 12);
        for v in 0..12 {
            let leaf = tree.leaf_for(v).expect("every vertex has a leaf");
            assert_eq!(tree.original_vertex(leaf), Some(v));
        }
        Ok(())
    }

    #[test]
    fn test_theoretical_division_decomposes_too() -> Result<()> {
        let graph = two_communities(5)?;
        let config = quick(8).with_krv(
            KrvConfig::default()
                .with_projections(16)
                .with_max_iterations(80)
                .with_division(DivisionStrategy::Theoretical),
        );
        let tree = decompose(&graph, config)?;
        assert!(tree.validate().is_healthy());
        assert_eq!(tree.all_vertices_below(tree.root()), (0..10).collect::<Vec<_>>());
        Ok(())
    }

    #[test]
    fn test_petgraph_input() -> Result<()> {
        let mut pg = UnGraph::<&str, f64>::new_undirected();
        let nodes: Vec<_> = ["a", "b", "c", "d", "e"]
            .iter()
            .map(|&name| pg.add_node(name))
            .collect();
        for i in 0..nodes.len() {
            let _ = pg.add_edge(nodes[i], nodes[(i + 1) % nodes.len()], 1.0 + i as f64);
        }

        let graph = WeightedGraph::from_petgraph(&pg)?;
        let tree = decompose(&graph, quick(4))?;
        assert_eq!(tree.num_leaves(), 5);
        assert!(tree.validate().is_healthy());
        Ok(())
    }

    fn arb_graph() -> impl Strategy<Value = WeightedGraph> {
        (3usize..14).prop_flat_map(|n| {
            proptest::collection::vec((0..n, 0..n, 1u32..6), 0..(3 * n)).prop_map(move |edges| {
                let mut graph = WeightedGraph::new(n);
                for (u, v, w) in edges {
                    if u != v {
                        let _ = graph.add_edge(u, v, f64::from(w));
                    }
                }
                graph
            })
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn decomposition_has_one_leaf_per_vertex(graph in arb_graph(), seed in any::<u64>()) {
            let tree = decompose(&graph, quick(seed)).unwrap();
            let report = tree.validate();
            prop_assert!(report.is_healthy(), "{}", report);
            prop_assert_eq!(tree.num_leaves(), graph.node_count());
            prop_assert_eq!(
                tree.all_vertices_below(tree.root()),
                (0..graph.node_count()).collect::<Vec<_>>()
            );
            prop_assert!(tree.parent(tree.root()).is_none());
        }

        #[test]
        fn decomposition_is_reproducible(graph in arb_graph(), seed in any::<u64>()) {
            let first = decompose(&graph, quick(seed)).unwrap();
            let second = decompose(&graph, quick(seed)).unwrap();
            prop_assert_eq!(first, second);
        }
    }
}
