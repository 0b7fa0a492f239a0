//! Weighted undirected graphs and induced subgraph views.
//!
//! The decomposition reads its input through [`WeightedGraph`], a dense
//! arena: vertices are `0..n`, edges are `0..m`, and every relation is an
//! index array. Nothing is keyed by object identity, so "the same edge" is
//! always the same integer.
//!
//! ```text
//!   vertices   0 ─── 1          edges    0: (0, 1, w=1.0)
//!              │     │                   1: (0, 2, w=2.0)
//!              2 ─── 3                   2: (1, 3, w=1.0)
//!                                        3: (2, 3, w=1.0)
//! ```
//!
//! A recursive decomposition unit works on a [`Subgraph`]: the subgraph
//! induced by a vertex set, with its own dense local numbering and the list
//! of boundary edges that leave it.

mod subgraph;

pub use subgraph::Subgraph;

use crate::error::{Error, Result};
use petgraph::graph::UnGraph;
use petgraph::visit::EdgeRef;

/// An undirected, positively weighted simple graph.
#[derive(Debug, Clone, Default)]
pub struct WeightedGraph {
    /// Endpoints of each edge, in insertion order.
    endpoints: Vec<(usize, usize)>,
    /// Weight of each edge.
    weights: Vec<f64>,
    /// Adjacency: vertex -> [(neighbor, edge)]
    adj: Vec<Vec<(usize, usize)>>,
    /// Weighted degree of each vertex.
    degrees: Vec<f64>,
}

impl WeightedGraph {
    /// Create a graph with `n` isolated vertices.
    pub fn new(n: usize) -> Self {
        Self {
            endpoints: Vec::new(),
            weights: Vec::new(),
            adj: vec![Vec::new(); n],
            degrees: vec![0.0; n],
        }
    }

    /// Build from an edge list over vertices `0..n`.
    pub fn from_edges(n: usize, edges: &[(usize, usize, f64)]) -> Result<Self> {
        let mut graph = Self::new(n);
        for &(u, v, w) in edges {
            graph.add_edge(u, v, w)?;
        }
        Ok(graph)
    }

    /// Build from a petgraph undirected graph with `f64` edge weights.
    ///
    /// Vertex `i` of the result is `NodeIndex::new(i)` of the input.
    pub fn from_petgraph<N>(graph: &UnGraph<N, f64>) -> Result<Self> {
        let mut out = Self::new(graph.node_count());
        for edge in graph.edge_references() {
            out.add_edge(edge.source().index(), edge.target().index(), *edge.weight())?;
        }
        Ok(out)
    }

    /// Append a vertex and return its index.
    pub fn add_vertex(&mut self) -> usize {
        self.adj.push(Vec::new());
        self.degrees.push(0.0);
        self.adj.len() - 1
    }

    /// Append an undirected edge and return its index.
    pub fn add_edge(&mut self, u: usize, v: usize, weight: f64) -> Result<usize> {
        let n = self.node_count();
        for vertex in [u, v] {
            if vertex >= n {
                return Err(Error::VertexOutOfRange {
                    vertex,
                    n_vertices: n,
                });
            }
        }
        if u == v {
            return Err(Error::SelfLoop { vertex: u });
        }
        let edge = self.endpoints.len();
        if !weight.is_finite() || weight <= 0.0 {
            return Err(Error::InvalidWeight { edge, weight });
        }

        self.endpoints.push((u, v));
        self.weights.push(weight);
        self.adj[u].push((v, edge));
        self.adj[v].push((u, edge));
        self.degrees[u] += weight;
        self.degrees[v] += weight;
        Ok(edge)
    }

    /// Number of vertices.
    pub fn node_count(&self) -> usize {
        self.adj.len()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.endpoints.len()
    }

    /// Endpoints `(source, target)` of an edge, in declaration order.
    pub fn endpoints(&self, edge: usize) -> (usize, usize) {
        self.endpoints[edge]
    }

    /// Weight of an edge.
    pub fn weight(&self, edge: usize) -> f64 {
        self.weights[edge]
    }

    /// All edge weights, indexed by edge.
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Neighbors of a vertex as `(neighbor, edge)` pairs.
    pub fn neighbors(&self, vertex: usize) -> &[(usize, usize)] {
        &self.adj[vertex]
    }

    /// Total weight of the edges incident to `vertex`.
    ///
    /// For a single vertex this is its out-degree: every incident edge leaves it.
    pub fn degree(&self, vertex: usize) -> f64 {
        self.degrees[vertex]
    }

    /// Iterate over `(edge, u, v, weight)`.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize, usize, f64)> + '_ {
        self.endpoints
            .iter()
            .zip(&self.weights)
            .enumerate()
            .map(|(e, (&(u, v), &w))| (e, u, v, w))
    }

    /// Total weight of edges with exactly one endpoint in `set`.
    ///
    /// `set` is a membership mask over all vertices.
    pub fn out_degree(&self, set: &[bool]) -> f64 {
        debug_assert_eq!(set.len(), self.node_count());
        self.edges()
            .filter(|&(_, u, v, _)| set[u] != set[v])
            .map(|(_, _, _, w)| w)
            .sum()
    }
}

/// The six-vertex graph shared by the crate's tests, 0-indexed:
/// (0,1,1) (0,2,2) (1,3,1) (2,3,1) (2,4,1) (3,5,2) (4,5,2).
#[cfg(test)]
pub(crate) fn six_vertex_graph() -> WeightedGraph {
    WeightedGraph::from_edges(
        6,
        &[
            (0, 1, 1.0),
            (0, 2, 2.0),
            (1, 3, 1.0),
            (2, 3, 1.0),
            (2, 4, 1.0),
            (3, 5, 2.0),
            (4, 5, 2.0),
        ],
    )
    .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_edge_tracks_degrees() {
        let mut graph = WeightedGraph::new(3);
        graph.add_edge(0, 1, 2.0).unwrap();
        graph.add_edge(1, 2, 0.5).unwrap();

        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.degree(1), 2.5);
        assert_eq!(graph.neighbors(1), &[(0, 0), (2, 1)]);
        assert_eq!(graph.endpoints(1), (1, 2));
    }

    #[test]
    fn test_rejects_bad_edges() {
        let mut graph = WeightedGraph::new(2);
        assert_eq!(
            graph.add_edge(0, 5, 1.0),
            Err(Error::VertexOutOfRange {
                vertex: 5,
                n_vertices: 2
            })
        );
        assert_eq!(graph.add_edge(1, 1, 1.0), Err(Error::SelfLoop { vertex: 1 }));
        assert!(matches!(
            graph.add_edge(0, 1, 0.0),
            Err(Error::InvalidWeight { edge: 0, .. })
        ));
        assert!(graph.add_edge(0, 1, f64::NAN).is_err());
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_from_petgraph_keeps_indices() {
        let mut pg = UnGraph::<(), f64>::new_undirected();
        let a = pg.add_node(());
        let b = pg.add_node(());
        let c = pg.add_node(());
        let _ = pg.add_edge(a, b, 1.5);
        let _ = pg.add_edge(b, c, 3.0);

        let graph = WeightedGraph::from_petgraph(&pg).unwrap();
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.endpoints(1), (1, 2));
        assert_eq!(graph.weight(1), 3.0);
    }

    #[test]
    fn test_out_degree() {
        let graph =
            WeightedGraph::from_edges(4, &[(0, 1, 1.0), (1, 2, 2.0), (2, 3, 4.0)]).unwrap();
        let set = [true, true, false, false];
        assert_eq!(graph.out_degree(&set), 2.0);
        assert_eq!(graph.out_degree(&[false; 4]), 0.0);
    }

    #[test]
    fn test_add_vertex() {
        let mut graph = WeightedGraph::new(0);
        let v = graph.add_vertex();
        let w = graph.add_vertex();
        graph.add_edge(v, w, 1.0).unwrap();
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.degree(w), 1.0);
    }
}
