//! Subdivision graphs: every edge of a subgraph becomes a vertex of its own.
//!
//! For a subgraph with local vertices `0..nv` and local edges `0..ne`, the
//! flow network has one node per vertex and one per edge:
//!
//! ```text
//!   node id        split vertex
//!   0 .. nv        Vertex(v)
//!   nv .. nv+ne    Edge(e)
//!   nv+ne          Source   (while attached)
//!   nv+ne+1        Sink     (while attached)
//! ```
//!
//! Local edge `e = (u, v, w)` becomes network edges `2e = (u, x_e, w)` and
//! `2e + 1 = (x_e, v, w)`. Terminal edges are appended after these and removed
//! again by [`SubdivisionGraph::detach`], which also restores every capacity
//! changed while attached.

use super::network::FlowNetwork;
use crate::graph::Subgraph;

/// A node of a subdivision graph.
///
/// Vertex and edge indices are local to the subgraph the subdivision was built
/// from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SplitVertex {
    /// An original vertex.
    Vertex(usize),
    /// The midpoint of an original edge.
    Edge(usize),
    /// Ephemeral source.
    Source,
    /// Ephemeral sink.
    Sink,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Terminals {
    source: usize,
    sink: usize,
}

/// The subdivision graph of a [`Subgraph`], with reversible terminal attachment.
#[derive(Debug, Clone)]
pub struct SubdivisionGraph {
    network: FlowNetwork,
    vertex_count: usize,
    edge_count: usize,
    /// Capacities of the `2 * edge_count` subdivision edges as built.
    original: Vec<f64>,
    terminals: Option<Terminals>,
    sink_fraction: f64,
}

impl SubdivisionGraph {
    /// Build the subdivision of `subgraph`.
    pub fn new(subgraph: &Subgraph<'_>) -> Self {
        let vertex_count = subgraph.vertex_count();
        let edge_count = subgraph.edge_count();
        let mut network = FlowNetwork::new(vertex_count + edge_count);
        for e in 0..edge_count {
            let (u, v) = subgraph.local_endpoints(e);
            let w = subgraph.weight(e);
            let x = vertex_count + e;
            let _ = network.add_edge(u, x, w);
            let _ = network.add_edge(x, v, w);
        }
        let original = network.edges().iter().map(|edge| edge.capacity).collect();

        Self {
            network,
            vertex_count,
            edge_count,
            original,
            terminals: None,
            sink_fraction: 0.5,
        }
    }

    /// Share of an edge's weight used as its sink capacity in [`attach`](Self::attach).
    pub fn with_sink_fraction(mut self, fraction: f64) -> Self {
        self.sink_fraction = fraction;
        self
    }

    /// The underlying flow network (including terminals while attached).
    pub fn network(&self) -> &FlowNetwork {
        &self.network
    }

    pub(crate) fn network_mut(&mut self) -> &mut FlowNetwork {
        &mut self.network
    }

    /// Number of original vertices.
    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    /// Number of original edges.
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Weight of an original edge.
    pub fn edge_weight(&self, edge: usize) -> f64 {
        self.original[2 * edge]
    }

    /// Source and sink node ids while attached.
    pub fn terminals(&self) -> Option<(usize, usize)> {
        self.terminals.map(|t| (t.source, t.sink))
    }

    /// Whether terminals are attached.
    pub fn is_attached(&self) -> bool {
        self.terminals.is_some()
    }

    /// Network node of a split vertex, if it exists.
    pub fn node(&self, split: SplitVertex) -> Option<usize> {
        match split {
            SplitVertex::Vertex(v) if v < self.vertex_count => Some(v),
            SplitVertex::Edge(e) if e < self.edge_count => Some(self.vertex_count + e),
            SplitVertex::Source => self.terminals.map(|t| t.source),
            SplitVertex::Sink => self.terminals.map(|t| t.sink),
            _ => None,
        }
    }

    /// Split vertex behind a network node.
    pub fn split_vertex(&self, node: usize) -> Option<SplitVertex> {
        if node < self.vertex_count {
            return Some(SplitVertex::Vertex(node));
        }
        if node < self.vertex_count + self.edge_count {
            return Some(SplitVertex::Edge(node - self.vertex_count));
        }
        match self.terminals {
            Some(t) if node == t.source => Some(SplitVertex::Source),
            Some(t) if node == t.sink => Some(SplitVertex::Sink),
            _ => None,
        }
    }

    /// Original edge behind a network node, if it is an edge split vertex.
    pub fn edge_of_node(&self, node: usize) -> Option<usize> {
        match self.split_vertex(node) {
            Some(SplitVertex::Edge(e)) => Some(e),
            _ => None,
        }
    }

    /// Connect `sources` edge split vertices to a new source (capacity = the
    /// edge's weight) and `sinks` edge split vertices to a new sink (capacity
    /// = weight times the sink fraction). Returns `(source, sink)`.
    ///
    /// Any previous attachment is detached first.
    pub fn attach(&mut self, sources: &[usize], sinks: &[usize]) -> (usize, usize) {
        let source_arcs: Vec<(SplitVertex, f64)> = sources
            .iter()
            .map(|&e| (SplitVertex::Edge(e), self.edge_weight(e)))
            .collect();
        let sink_arcs: Vec<(SplitVertex, f64)> = sinks
            .iter()
            .map(|&e| (SplitVertex::Edge(e), self.edge_weight(e) * self.sink_fraction))
            .collect();
        self.attach_terminals(source_arcs, sink_arcs)
    }

    /// Connect arbitrary split vertices to a new source and sink with the
    /// given capacities. Returns `(source, sink)`.
    pub fn attach_terminals<S, T>(&mut self, sources: S, sinks: T) -> (usize, usize)
    where
        S: IntoIterator<Item = (SplitVertex, f64)>,
        T: IntoIterator<Item = (SplitVertex, f64)>,
    {
        self.detach();
        let source = self.network.add_node();
        let sink = self.network.add_node();
        for (split, capacity) in sources {
            if let Some(node) = self.node(split) {
                let _ = self.network.add_edge(source, node, capacity);
            }
        }
        for (split, capacity) in sinks {
            if let Some(node) = self.node(split) {
                let _ = self.network.add_edge(node, sink, capacity);
            }
        }
        self.terminals = Some(Terminals { source, sink });
        (source, sink)
    }

    /// Remove the terminals and restore every subdivision capacity.
    ///
    /// Calling this while detached is a no-op.
    pub fn detach(&mut self) {
        if self.terminals.take().is_none() {
            return;
        }
        self.network
            .truncate(self.vertex_count + self.edge_count, self.original.len());
        for (e, &capacity) in self.original.iter().enumerate() {
            self.network.set_capacity(e, capacity);
        }
    }

    /// Original edges behind a set of network cut edges.
    ///
    /// Each cut edge maps to whichever endpoint is an edge split vertex; cut
    /// edges without one are dropped. Output is sorted and deduplicated.
    pub fn translate_cut(&self, cut_edges: &[usize]) -> Vec<usize> {
        let mut out: Vec<usize> = cut_edges
            .iter()
            .filter_map(|&e| {
                let edge = self.network.edge(e);
                self.edge_of_node(edge.from)
                    .or_else(|| self.edge_of_node(edge.to))
            })
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::network::FlowProblem;
    use crate::graph::{six_vertex_graph, WeightedGraph};
    use proptest::prelude::*;

    #[test]
    fn test_layout_and_lookups() {
        let graph = six_vertex_graph();
        let sub = Subgraph::full(&graph);
        let sd = SubdivisionGraph::new(&sub);

        assert_eq!(sd.network().node_count(), 6 + 7);
        assert_eq!(sd.network().edge_count(), 14);
        assert_eq!(sd.node(SplitVertex::Edge(3)), Some(9));
        assert_eq!(sd.split_vertex(9), Some(SplitVertex::Edge(3)));
        assert_eq!(sd.split_vertex(2), Some(SplitVertex::Vertex(2)));
        assert_eq!(sd.node(SplitVertex::Source), None);
        assert_eq!(sd.node(SplitVertex::Edge(7)), None);
        assert_eq!(sd.edge_weight(1), 2.0);

        // (0, 2, 2.0) -> (0, x_1) and (x_1, 2).
        let first = sd.network().edge(2);
        assert_eq!((first.from, first.to, first.capacity), (0, 7, 2.0));
        let second = sd.network().edge(3);
        assert_eq!((second.from, second.to), (7, 2));
    }

    #[test]
    fn test_attach_uses_half_capacity_sinks() {
        let graph = six_vertex_graph();
        let sub = Subgraph::full(&graph);
        let mut sd = SubdivisionGraph::new(&sub);

        let (s, t) = sd.attach(&[1], &[5, 6]);
        assert_eq!(sd.node(SplitVertex::Source), Some(s));
        assert_eq!(sd.split_vertex(t), Some(SplitVertex::Sink));
        assert_eq!(sd.network().edge_count(), 14 + 3);

        let source_edge = sd.network().edge(14);
        assert_eq!((source_edge.from, source_edge.capacity), (s, 2.0));
        let sink_edge = sd.network().edge(15);
        assert_eq!((sink_edge.to, sink_edge.capacity), (t, 1.0));

        // Two sink edges of capacity 1.0 bound the flow.
        let solution = FlowProblem::new(sd.network(), s, t).max_flow();
        assert!((solution.value() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_translate_cut() {
        let graph = six_vertex_graph();
        let sub = Subgraph::full(&graph);
        let mut sd = SubdivisionGraph::new(&sub);
        let _ = sd.attach(&[0], &[6]);

        // Both halves of edge 4, plus the source edge of edge 0.
        assert_eq!(sd.translate_cut(&[9, 8, 14]), vec![0, 4]);
    }

    #[test]
    fn test_detach_restores_raised_capacities() {
        let graph = six_vertex_graph();
        let sub = Subgraph::full(&graph);
        let mut sd = SubdivisionGraph::new(&sub);
        let pristine = sd.network().clone();

        let _ = sd.attach(&[0, 1], &[5]);
        sd.network_mut().set_capacity(3, 40.0);
        sd.detach();
        assert_eq!(sd.network(), &pristine);
        assert!(!sd.is_attached());

        sd.detach();
        assert_eq!(sd.network(), &pristine);
    }

    proptest! {
        #[test]
        fn attach_detach_is_reversible(
            edges in proptest::collection::vec((0usize..7, 0usize..7, 1u32..9), 1..16),
            picks in proptest::collection::vec(any::<bool>(), 16),
        ) {
            let mut graph = WeightedGraph::new(7);
            for (u, v, w) in edges {
                if u != v {
                    let _ = graph.add_edge(u, v, f64::from(w));
                }
            }
            let sub = Subgraph::full(&graph);
            let mut sd = SubdivisionGraph::new(&sub);
            let pristine = sd.network().clone();

            let m = graph.edge_count();
            let sources: Vec<usize> = (0..m).filter(|&e| picks[e]).collect();
            let sinks: Vec<usize> = (0..m).filter(|&e| !picks[e]).collect();
            for _ in 0..2 {
                let _ = sd.attach(&sources, &sinks);
                for e in 0..2 * m {
                    let raised = sd.network().capacity(e) + 1.0;
                    sd.network_mut().set_capacity(e, raised);
                }
                sd.detach();
                prop_assert_eq!(sd.network(), &pristine);
            }
            for e in 0..m {
                prop_assert_eq!(sd.edge_weight(e), graph.weight(e));
            }
        }
    }
}
