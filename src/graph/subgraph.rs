//! Induced subgraph views with local numbering.

use super::WeightedGraph;
use petgraph::unionfind::UnionFind;
use std::collections::HashMap;

/// Largest component share a clustering may leave behind.
const BALANCE_RATIO: f64 = 0.75;

/// The subgraph of a [`WeightedGraph`] induced by a vertex set.
///
/// Vertices and edges get dense local indices (`0..vertex_count()`,
/// `0..edge_count()`), ordered by their global index. The view borrows the
/// parent graph, which stays read-only for the lifetime of the view.
#[derive(Debug, Clone)]
pub struct Subgraph<'g> {
    graph: &'g WeightedGraph,
    /// Local vertex -> global vertex.
    vertices: Vec<usize>,
    vertex_slot: HashMap<usize, usize>,
    /// Local edge -> global edge.
    edges: Vec<usize>,
    edge_slot: HashMap<usize, usize>,
    /// Endpoints of each local edge, as local vertices.
    local_endpoints: Vec<(usize, usize)>,
    /// Global edges with exactly one endpoint inside.
    boundary: Vec<usize>,
}

impl<'g> Subgraph<'g> {
    /// The subgraph induced by `vertices` (duplicates are ignored).
    pub fn induced(graph: &'g WeightedGraph, vertices: &[usize]) -> Self {
        let mut vertices = vertices.to_vec();
        vertices.sort_unstable();
        vertices.dedup();

        let vertex_slot: HashMap<usize, usize> = vertices
            .iter()
            .enumerate()
            .map(|(local, &global)| (global, local))
            .collect();

        let mut edges = Vec::new();
        let mut boundary = Vec::new();
        for &v in &vertices {
            for &(neighbor, edge) in graph.neighbors(v) {
                if vertex_slot.contains_key(&neighbor) {
                    if v < neighbor {
                        edges.push(edge);
                    }
                } else {
                    boundary.push(edge);
                }
            }
        }
        edges.sort_unstable();
        boundary.sort_unstable();

        Self::assemble(graph, vertices, vertex_slot, edges, boundary)
    }

    /// The whole graph as a subgraph; local and global indices coincide.
    pub fn full(graph: &'g WeightedGraph) -> Self {
        let vertices: Vec<usize> = (0..graph.node_count()).collect();
        let vertex_slot = vertices.iter().map(|&v| (v, v)).collect();
        let edges = (0..graph.edge_count()).collect();
        Self::assemble(graph, vertices, vertex_slot, edges, Vec::new())
    }

    fn assemble(
        graph: &'g WeightedGraph,
        vertices: Vec<usize>,
        vertex_slot: HashMap<usize, usize>,
        edges: Vec<usize>,
        boundary: Vec<usize>,
    ) -> Self {
        let edge_slot = edges
            .iter()
            .enumerate()
            .map(|(local, &global)| (global, local))
            .collect();
        let local_endpoints = edges
            .iter()
            .map(|&e| {
                let (u, v) = graph.endpoints(e);
                (vertex_slot[&u], vertex_slot[&v])
            })
            .collect();

        Self {
            graph,
            vertices,
            vertex_slot,
            edges,
            edge_slot,
            local_endpoints,
            boundary,
        }
    }

    /// The parent graph.
    pub fn graph(&self) -> &'g WeightedGraph {
        self.graph
    }

    /// Number of vertices in the subgraph.
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of edges with both endpoints inside.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Global indices of the vertices, in local order.
    pub fn vertices(&self) -> &[usize] {
        &self.vertices
    }

    /// Global indices of the internal edges, in local order.
    pub fn edges(&self) -> &[usize] {
        &self.edges
    }

    /// Global index of a local vertex.
    pub fn global_vertex(&self, local: usize) -> usize {
        self.vertices[local]
    }

    /// Global index of a local edge.
    pub fn global_edge(&self, local: usize) -> usize {
        self.edges[local]
    }

    /// Local index of a global vertex, if it lies inside.
    pub fn local_vertex(&self, global: usize) -> Option<usize> {
        self.vertex_slot.get(&global).copied()
    }

    /// Local index of a global edge, if both endpoints lie inside.
    pub fn local_edge(&self, global: usize) -> Option<usize> {
        self.edge_slot.get(&global).copied()
    }

    /// Endpoints of a local edge as local vertices.
    pub fn local_endpoints(&self, local_edge: usize) -> (usize, usize) {
        self.local_endpoints[local_edge]
    }

    /// Weight of a local edge.
    pub fn weight(&self, local_edge: usize) -> f64 {
        self.graph.weight(self.edges[local_edge])
    }

    /// Weights of all local edges.
    pub fn weights(&self) -> Vec<f64> {
        self.edges.iter().map(|&e| self.graph.weight(e)).collect()
    }

    /// Global edges leaving the subgraph.
    pub fn boundary_edges(&self) -> &[usize] {
        &self.boundary
    }

    /// Local index of the endpoint of a boundary edge that lies inside.
    pub fn inside_endpoint(&self, boundary_edge: usize) -> Option<usize> {
        let (u, v) = self.graph.endpoints(boundary_edge);
        self.local_vertex(u).or_else(|| self.local_vertex(v))
    }

    /// Connected components after removing the masked local edges.
    ///
    /// Components are listed by their smallest local vertex; members are
    /// ascending local vertices.
    pub fn components(&self, removed: &[bool]) -> Vec<Vec<usize>> {
        debug_assert_eq!(removed.len(), self.edge_count());
        let labels = self.labeling(removed);

        let mut group_of = vec![None; self.vertex_count()];
        let mut groups: Vec<Vec<usize>> = Vec::new();
        for (v, &label) in labels.iter().enumerate() {
            let slot = *group_of[label].get_or_insert_with(|| {
                groups.push(Vec::new());
                groups.len() - 1
            });
            groups[slot].push(v);
        }
        groups
    }

    /// Whether removing the given local edges is a *balanced clustering*:
    /// every remaining connected component holds at most 3/4 of the vertices.
    pub fn is_balanced<I>(&self, removed: I) -> bool
    where
        I: IntoIterator<Item = usize>,
    {
        let mut mask = vec![false; self.edge_count()];
        for e in removed {
            mask[e] = true;
        }
        self.is_balanced_mask(&mask)
    }

    /// [`Subgraph::is_balanced`] for a membership mask over local edges.
    pub fn is_balanced_mask(&self, removed: &[bool]) -> bool {
        let n = self.vertex_count();
        if n == 0 {
            return true;
        }
        let limit = BALANCE_RATIO * n as f64;
        let mut sizes = vec![0usize; n];
        for label in self.labeling(removed) {
            sizes[label] += 1;
        }
        sizes.iter().all(|&size| size as f64 <= limit)
    }

    fn labeling(&self, removed: &[bool]) -> Vec<usize> {
        let mut uf = UnionFind::new(self.vertex_count());
        for (e, &(u, v)) in self.local_endpoints.iter().enumerate() {
            if !removed[e] {
                let _ = uf.union(u, v);
            }
        }
        uf.into_labeling()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::six_vertex_graph;

    #[test]
    fn test_balanced_clustering_predicate() {
        let graph = six_vertex_graph();
        let full = Subgraph::full(&graph);

        // {(1,2),(1,3)} only isolates vertex 1: five vertices stay together.
        assert!(!full.is_balanced([0, 1]));
        // {(2,4),(3,4),(3,5)} leaves {1,2,3} and {4,5,6}.
        assert!(full.is_balanced([2, 3, 4]));
    }

    #[test]
    fn test_removing_everything_is_balanced() {
        let graph = six_vertex_graph();
        let full = Subgraph::full(&graph);
        assert!(full.is_balanced(0..graph.edge_count()));
        assert!(!full.is_balanced(std::iter::empty()));
    }

    #[test]
    fn test_induced_subgraph_indices_and_boundary() {
        let graph = six_vertex_graph();
        let sub = Subgraph::induced(&graph, &[3, 2, 5, 3]);

        assert_eq!(sub.vertices(), &[2, 3, 5]);
        // (2,3) and (3,5) are internal.
        assert_eq!(sub.edges(), &[3, 5]);
        assert_eq!(sub.local_edge(5), Some(1));
        assert_eq!(sub.local_edge(0), None);
        assert_eq!(sub.local_endpoints(1), (1, 2));
        // (0,2) (1,3) (2,4) (4,5) leave the set.
        assert_eq!(sub.boundary_edges(), &[1, 2, 4, 6]);
        assert_eq!(sub.inside_endpoint(6), Some(2));
    }

    #[test]
    fn test_components() {
        let graph = six_vertex_graph();
        let sub = Subgraph::induced(&graph, &[2, 3, 5]);

        let comps = sub.components(&[false, true]);
        assert_eq!(comps, vec![vec![0, 1], vec![2]]);
    }
}
