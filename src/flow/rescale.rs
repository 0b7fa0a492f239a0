//! Scaling heavily used source edges up to full capacity.

use super::network::{FlowPath, FLOW_EPSILON};
use super::subdivision::SubdivisionGraph;
use std::collections::BTreeMap;

/// Rescales the flow paths leaving well-saturated source edges.
///
/// A source edge whose paths carry at least `threshold · capacity` has every
/// one of its paths multiplied by `capacity / carried`, so the edge is treated
/// as fully saturated. Other paths are returned unchanged. Network capacities
/// are raised where the scaled paths would overload an edge; they are never
/// lowered, and [`SubdivisionGraph::detach`] restores them.
#[derive(Debug, Clone, Copy)]
pub struct FlowRescaler {
    threshold: f64,
}

impl Default for FlowRescaler {
    fn default() -> Self {
        Self { threshold: 0.5 }
    }
}

impl FlowRescaler {
    /// Rescaler with the default saturation threshold of one half.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the saturation threshold (share of capacity).
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Rescale `paths`, which must start at the attached source of `subdivision`.
    pub fn rescale(
        &self,
        subdivision: &mut SubdivisionGraph,
        mut paths: Vec<FlowPath>,
    ) -> Vec<FlowPath> {
        let mut carried: BTreeMap<usize, f64> = BTreeMap::new();
        for path in &paths {
            if let Some(&first) = path.edges.first() {
                *carried.entry(first).or_insert(0.0) += path.weight;
            }
        }

        let network = subdivision.network();
        let factors: BTreeMap<usize, f64> = carried
            .into_iter()
            .filter_map(|(edge, flow)| {
                let capacity = network.capacity(edge);
                (flow > FLOW_EPSILON && flow >= self.threshold * capacity)
                    .then(|| (edge, capacity / flow))
            })
            .collect();
        if factors.is_empty() {
            return paths;
        }

        for path in &mut paths {
            if let Some(factor) = path.edges.first().and_then(|e| factors.get(e)) {
                path.weight *= factor;
            }
        }

        let mut load = vec![0.0; network.edge_count()];
        for path in &paths {
            for &e in &path.edges {
                load[e] += path.weight;
            }
        }
        let network = subdivision.network_mut();
        for (e, &l) in load.iter().enumerate() {
            if l > network.capacity(e) {
                network.set_capacity(e, l);
            }
        }

        paths
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::network::FlowProblem;
    use crate::graph::{Subgraph, WeightedGraph};

    fn path_graph() -> WeightedGraph {
        // 0 -e0- 1 -e1- 2 -e2- 3
        WeightedGraph::from_edges(4, &[(0, 1, 2.0), (1, 2, 1.5), (2, 3, 2.0)]).unwrap()
    }

    #[test]
    fn test_saturated_source_scales_to_capacity() {
        let graph = path_graph();
        let sub = Subgraph::full(&graph);
        let mut sd = SubdivisionGraph::new(&sub);
        let (s, t) = sd.attach(&[0], &[2]);

        let paths = {
            let solution = FlowProblem::new(sd.network(), s, t).max_flow();
            // Sink edge caps the flow at 1.0 out of a source capacity of 2.0.
            assert!((solution.value() - 1.0).abs() < 1e-9);
            solution.paths()
        };
        let scaled = FlowRescaler::new().rescale(&mut sd, paths);

        assert_eq!(scaled.len(), 1);
        assert!((scaled[0].weight - 2.0).abs() < 1e-9);
        for &e in &scaled[0].edges {
            assert!(sd.network().capacity(e) >= 2.0 - 1e-9);
        }

        sd.detach();
        assert_eq!(sd.network().capacity(2), 1.5);
    }

    #[test]
    fn test_light_source_left_alone() {
        let graph = path_graph();
        let sub = Subgraph::full(&graph);
        let mut sd = SubdivisionGraph::new(&sub);
        let (s, t) = sd.attach(&[0], &[2]);

        let paths = FlowProblem::new(sd.network(), s, t).max_flow().paths();
        let before = sd.network().clone();
        let out = FlowRescaler::new().with_threshold(0.75).rescale(&mut sd, paths.clone());

        assert_eq!(out, paths);
        assert_eq!(sd.network(), &before);
    }
}
