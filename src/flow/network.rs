//! Undirected flow networks and augmenting-path max flow.
//!
//! ## Directed doubling
//!
//! Every undirected edge `{u, v}` of capacity `c` becomes two opposite arcs
//! `u → v` and `v → u`, each of capacity `c`, each with its own residual
//! reverse arc. Edmonds–Karp (shortest augmenting paths by BFS) runs on the
//! doubled network; afterwards each pair of opposite arc flows collapses into
//! one signed value per undirected edge:
//!
//! ```text
//! flow(e) = f(u → v) - f(v → u)      (> 0: along the declared direction)
//! ```
//!
//! ## Complexity
//!
//! - Max flow: O(V · E²)
//! - Min cut, one path extraction: O(V + E)

use crate::graph::WeightedGraph;
use std::collections::VecDeque;

/// Residual capacities at or below this are treated as exhausted.
pub(crate) const FLOW_EPSILON: f64 = 1e-9;

/// One undirected edge of a [`FlowNetwork`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NetworkEdge {
    /// Declared source endpoint; positive flow runs `from → to`.
    pub from: usize,
    /// Declared target endpoint.
    pub to: usize,
    /// Capacity in both directions.
    pub capacity: f64,
}

/// An undirected capacitated network.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlowNetwork {
    node_count: usize,
    edges: Vec<NetworkEdge>,
}

impl FlowNetwork {
    /// Create a network with `node_count` nodes and no edges.
    pub fn new(node_count: usize) -> Self {
        Self {
            node_count,
            edges: Vec::new(),
        }
    }

    /// Capacities equal to the graph's edge weights; indices carry over.
    pub fn from_graph(graph: &WeightedGraph) -> Self {
        let mut network = Self::new(graph.node_count());
        for (_, u, v, w) in graph.edges() {
            let _ = network.add_edge(u, v, w);
        }
        network
    }

    /// Append a node and return its index.
    pub fn add_node(&mut self) -> usize {
        self.node_count += 1;
        self.node_count - 1
    }

    /// Append an undirected edge and return its index.
    pub fn add_edge(&mut self, from: usize, to: usize, capacity: f64) -> usize {
        debug_assert!(from < self.node_count && to < self.node_count);
        debug_assert!(capacity >= 0.0);
        self.edges.push(NetworkEdge { from, to, capacity });
        self.edges.len() - 1
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// All edges, by index.
    pub fn edges(&self) -> &[NetworkEdge] {
        &self.edges
    }

    /// A single edge.
    pub fn edge(&self, edge: usize) -> NetworkEdge {
        self.edges[edge]
    }

    /// Capacity of an edge.
    pub fn capacity(&self, edge: usize) -> f64 {
        self.edges[edge].capacity
    }

    pub(crate) fn set_capacity(&mut self, edge: usize, capacity: f64) {
        self.edges[edge].capacity = capacity;
    }

    /// Drop every node and edge past the given counts.
    pub(crate) fn truncate(&mut self, node_count: usize, edge_count: usize) {
        self.edges.truncate(edge_count);
        self.node_count = node_count.min(self.node_count);
    }

    /// Incident edge indices per node.
    fn incidence(&self) -> Vec<Vec<usize>> {
        let mut incident = vec![Vec::new(); self.node_count];
        for (e, edge) in self.edges.iter().enumerate() {
            incident[edge.from].push(e);
            incident[edge.to].push(e);
        }
        incident
    }
}

/// A path from source to sink carrying `weight` units of flow.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowPath {
    /// Nodes from source to sink.
    pub nodes: Vec<usize>,
    /// Network edges between consecutive nodes (`nodes.len() - 1` of them).
    pub edges: Vec<usize>,
    /// Bottleneck flow along the path.
    pub weight: f64,
}

impl FlowPath {
    /// The node right after the source.
    pub fn first_hop(&self) -> Option<usize> {
        self.nodes.get(1).copied()
    }

    /// The node right before the sink.
    pub fn last_hop(&self) -> Option<usize> {
        self.nodes.len().checked_sub(2).map(|i| self.nodes[i])
    }
}

/// One entry of a fractional partial matching.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchedPair {
    /// Node adjacent to the source.
    pub from: usize,
    /// Node adjacent to the sink.
    pub to: usize,
    /// Matched amount (the path's flow).
    pub weight: f64,
}

/// A minimum source/sink cut.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MinCut {
    /// Edges with exactly one endpoint on the source side.
    pub edges: Vec<usize>,
    /// Membership mask: nodes reachable from the source in the residual network.
    pub source_side: Vec<bool>,
    /// Total capacity of the cut edges.
    pub capacity: f64,
}

/// A max-flow problem over a borrowed network.
#[derive(Debug, Clone, Copy)]
pub struct FlowProblem<'a> {
    network: &'a FlowNetwork,
    source: usize,
    sink: usize,
}

impl<'a> FlowProblem<'a> {
    /// Pose a problem. Out-of-range or equal terminals are allowed and
    /// simply yield an empty solution.
    pub fn new(network: &'a FlowNetwork, source: usize, sink: usize) -> Self {
        Self {
            network,
            source,
            sink,
        }
    }

    fn is_well_posed(&self) -> bool {
        let n = self.network.node_count();
        self.source < n && self.sink < n && self.source != self.sink
    }

    /// Maximum flow by shortest augmenting paths on the doubled network.
    pub fn max_flow(&self) -> FlowSolution<'a> {
        let network = self.network;
        let mut solution = FlowSolution {
            network,
            source: self.source,
            sink: self.sink,
            value: 0.0,
            flow: vec![0.0; network.edge_count()],
        };
        if !self.is_well_posed() {
            return solution;
        }

        let n = network.node_count();
        let mut arcs: Vec<Arc> = Vec::with_capacity(4 * network.edge_count());
        let mut out: Vec<Vec<usize>> = vec![Vec::new(); n];
        for edge in network.edges() {
            let (u, v, c) = (edge.from, edge.to, edge.capacity);
            for (a, b) in [(u, v), (v, u)] {
                out[a].push(arcs.len());
                arcs.push(Arc::new(a, b, c));
                out[b].push(arcs.len());
                arcs.push(Arc::new(b, a, 0.0));
            }
        }

        let mut parent: Vec<Option<usize>> = vec![None; n];
        let mut seen = vec![false; n];
        let mut queue = VecDeque::new();
        loop {
            parent.fill(None);
            seen.fill(false);
            queue.clear();
            seen[self.source] = true;
            queue.push_back(self.source);

            while let Some(u) = queue.pop_front() {
                if u == self.sink {
                    break;
                }
                for &a in &out[u] {
                    let arc = &arcs[a];
                    if !seen[arc.to] && arc.residual() > FLOW_EPSILON {
                        seen[arc.to] = true;
                        parent[arc.to] = Some(a);
                        queue.push_back(arc.to);
                    }
                }
            }
            if !seen[self.sink] {
                break;
            }

            let mut bottleneck = f64::INFINITY;
            let mut v = self.sink;
            while let Some(a) = parent[v] {
                bottleneck = bottleneck.min(arcs[a].residual());
                v = arcs[a].from;
            }

            let mut v = self.sink;
            while let Some(a) = parent[v] {
                arcs[a].flow += bottleneck;
                arcs[a ^ 1].flow -= bottleneck;
                v = arcs[a].from;
            }
            solution.value += bottleneck;
        }

        for (e, f) in solution.flow.iter_mut().enumerate() {
            *f = arcs[4 * e].flow - arcs[4 * e + 2].flow;
        }
        solution
    }
}

#[derive(Debug, Clone, Copy)]
struct Arc {
    from: usize,
    to: usize,
    cap: f64,
    flow: f64,
}

impl Arc {
    fn new(from: usize, to: usize, cap: f64) -> Self {
        Self {
            from,
            to,
            cap,
            flow: 0.0,
        }
    }

    fn residual(&self) -> f64 {
        self.cap - self.flow
    }
}

/// A computed maximum flow.
#[derive(Debug, Clone)]
pub struct FlowSolution<'a> {
    network: &'a FlowNetwork,
    source: usize,
    sink: usize,
    value: f64,
    flow: Vec<f64>,
}

impl<'a> FlowSolution<'a> {
    /// Total flow leaving the source.
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Signed flow on an edge.
    pub fn flow(&self, edge: usize) -> f64 {
        self.flow[edge]
    }

    /// Signed flow on every edge.
    pub fn flows(&self) -> &[f64] {
        &self.flow
    }

    /// The cut found by searching the residual network from the source.
    ///
    /// An edge `u → v` carrying signed flow `f` has residual `c - f` forward
    /// and `c + f` backward.
    pub fn min_cut(&self) -> MinCut {
        let n = self.network.node_count();
        let mut source_side = vec![false; n];
        if self.source >= n || self.sink >= n || self.source == self.sink {
            return MinCut {
                source_side,
                ..MinCut::default()
            };
        }

        let incident = self.network.incidence();
        let mut queue = VecDeque::from([self.source]);
        source_side[self.source] = true;
        while let Some(u) = queue.pop_front() {
            for &e in &incident[u] {
                let edge = self.network.edge(e);
                let (next, residual) = if edge.from == u {
                    (edge.to, edge.capacity - self.flow[e])
                } else {
                    (edge.from, edge.capacity + self.flow[e])
                };
                if !source_side[next] && residual > FLOW_EPSILON {
                    source_side[next] = true;
                    queue.push_back(next);
                }
            }
        }

        let edges: Vec<usize> = self
            .network
            .edges()
            .iter()
            .enumerate()
            .filter(|(_, edge)| source_side[edge.from] != source_side[edge.to])
            .map(|(e, _)| e)
            .collect();
        let capacity = edges.iter().map(|&e| self.network.capacity(e)).sum();

        MinCut {
            edges,
            source_side,
            capacity,
        }
    }

    /// Decompose the flow into source-to-sink paths.
    ///
    /// Repeatedly finds a BFS path through edges that still carry flow in the
    /// direction of travel, records its bottleneck, and subtracts it. Flow on
    /// cycles that never reach the sink is left out. The decomposition depends
    /// on BFS order and is not canonical.
    pub fn paths(&self) -> Vec<FlowPath> {
        let n = self.network.node_count();
        if self.source >= n || self.sink >= n || self.source == self.sink {
            return Vec::new();
        }

        let incident = self.network.incidence();
        let mut remaining = self.flow.clone();
        let mut paths = Vec::new();
        let mut parent: Vec<Option<(usize, usize)>> = vec![None; n];
        let mut seen = vec![false; n];

        loop {
            parent.fill(None);
            seen.fill(false);
            seen[self.source] = true;
            let mut queue = VecDeque::from([self.source]);

            while let Some(u) = queue.pop_front() {
                if u == self.sink {
                    break;
                }
                for &e in &incident[u] {
                    let edge = self.network.edge(e);
                    let next = if edge.from == u && remaining[e] > FLOW_EPSILON {
                        edge.to
                    } else if edge.to == u && remaining[e] < -FLOW_EPSILON {
                        edge.from
                    } else {
                        continue;
                    };
                    if !seen[next] {
                        seen[next] = true;
                        parent[next] = Some((u, e));
                        queue.push_back(next);
                    }
                }
            }
            if !seen[self.sink] {
                break;
            }

            let mut nodes = vec![self.sink];
            let mut edges = Vec::new();
            let mut v = self.sink;
            while let Some((u, e)) = parent[v] {
                nodes.push(u);
                edges.push(e);
                v = u;
            }
            nodes.reverse();
            edges.reverse();

            let weight = edges
                .iter()
                .map(|&e| remaining[e].abs())
                .fold(f64::INFINITY, f64::min);

            for (hop, &e) in edges.iter().enumerate() {
                if self.network.edge(e).from == nodes[hop] {
                    remaining[e] -= weight;
                } else {
                    remaining[e] += weight;
                }
                if remaining[e].abs() <= FLOW_EPSILON {
                    remaining[e] = 0.0;
                }
            }

            paths.push(FlowPath {
                nodes,
                edges,
                weight,
            });
        }

        paths
    }

    /// Match each path's first hop with its last hop, weighted by its flow.
    pub fn fractional_partial_matching(paths: &[FlowPath]) -> Vec<MatchedPair> {
        paths
            .iter()
            .filter_map(|path| {
                Some(MatchedPair {
                    from: path.first_hop()?,
                    to: path.last_hop()?,
                    weight: path.weight,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::six_vertex_graph;
    use proptest::prelude::*;

    #[test]
    fn test_six_vertex_max_flow() {
        let network = FlowNetwork::from_graph(&six_vertex_graph());
        let solution = FlowProblem::new(&network, 0, 5).max_flow();

        assert!((solution.value() - 3.0).abs() < 1e-9);

        let cut = solution.min_cut();
        assert_eq!(cut.edges.len(), 2);
        assert_eq!(cut.edges, vec![0, 1]);
        assert!((cut.capacity - 3.0).abs() < 1e-9);
        assert!(cut.source_side[0]);
        assert!(!cut.source_side[5]);

        let paths = solution.paths();
        assert_eq!(paths.len(), 3);
        for path in &paths {
            assert!((path.weight - 1.0).abs() < 1e-9);
            assert_eq!(path.nodes.first(), Some(&0));
            assert_eq!(path.nodes.last(), Some(&5));
            assert_eq!(path.edges.len() + 1, path.nodes.len());
        }
    }

    #[test]
    fn test_signed_flow_follows_declared_direction() {
        // 0 - 1 declared as (1, 0): flow from 0 to 1 is negative.
        let mut network = FlowNetwork::new(2);
        let _ = network.add_edge(1, 0, 2.5);
        let solution = FlowProblem::new(&network, 0, 1).max_flow();
        assert!((solution.value() - 2.5).abs() < 1e-9);
        assert!((solution.flow(0) + 2.5).abs() < 1e-9);
        assert_eq!(solution.paths().len(), 1);
    }

    #[test]
    fn test_missing_or_disconnected_terminals() {
        let mut network = FlowNetwork::new(4);
        let _ = network.add_edge(0, 1, 1.0);
        let _ = network.add_edge(2, 3, 1.0);

        let absent = FlowProblem::new(&network, 0, 9).max_flow();
        assert_eq!(absent.value(), 0.0);
        assert!(absent.min_cut().edges.is_empty());
        assert!(absent.paths().is_empty());

        let disconnected = FlowProblem::new(&network, 0, 3).max_flow();
        assert_eq!(disconnected.value(), 0.0);
        let cut = disconnected.min_cut();
        assert!(cut.edges.is_empty());
        assert!(cut.source_side[1]);
        assert!(!cut.source_side[3]);
        assert!(disconnected.paths().is_empty());
    }

    #[test]
    fn test_fractional_partial_matching() {
        let paths = vec![
            FlowPath {
                nodes: vec![9, 1, 4, 2, 8],
                edges: vec![0, 1, 2, 3],
                weight: 0.5,
            },
            FlowPath {
                nodes: vec![9, 8],
                edges: vec![4],
                weight: 1.0,
            },
        ];
        let matching = FlowSolution::fractional_partial_matching(&paths);
        assert_eq!(matching.len(), 2);
        assert_eq!(
            matching[0],
            MatchedPair {
                from: 1,
                to: 2,
                weight: 0.5
            }
        );
        // A direct source-sink edge matches the terminals with each other.
        assert_eq!(matching[1].from, 8);
        assert_eq!(matching[1].to, 9);
    }

    fn arb_network() -> impl Strategy<Value = FlowNetwork> {
        (2usize..9).prop_flat_map(|n| {
            proptest::collection::vec((0..n, 0..n, 1u32..6), 0..24).prop_map(move |edges| {
                let mut network = FlowNetwork::new(n);
                for (u, v, c) in edges {
                    if u != v {
                        let _ = network.add_edge(u, v, f64::from(c));
                    }
                }
                network
            })
        })
    }

    proptest! {
        #[test]
        fn max_flow_equals_min_cut(network in arb_network()) {
            let sink = network.node_count() - 1;
            let solution = FlowProblem::new(&network, 0, sink).max_flow();
            let cut = solution.min_cut();

            prop_assert!((solution.value() - cut.capacity).abs() < 1e-6);
            prop_assert!(cut.source_side[0]);
            prop_assert!(!cut.source_side[sink]);
            for (e, f) in solution.flows().iter().enumerate() {
                prop_assert!(f.abs() <= network.capacity(e) + 1e-6);
            }
        }

        #[test]
        fn paths_decompose_the_flow(network in arb_network()) {
            let sink = network.node_count() - 1;
            let solution = FlowProblem::new(&network, 0, sink).max_flow();
            let paths = solution.paths();

            let total: f64 = paths.iter().map(|p| p.weight).sum();
            prop_assert!((total - solution.value()).abs() < 1e-6);

            let mut carried = vec![0.0; network.edge_count()];
            for path in &paths {
                prop_assert!(path.weight > 0.0);
                for &e in &path.edges {
                    carried[e] += path.weight;
                }
            }
            for (e, &c) in carried.iter().enumerate() {
                prop_assert!(c <= solution.flow(e).abs() + 1e-6);
            }
        }
    }
}
