//! Decomposition trees.
//!
//! Nodes live in an arena and are addressed by `usize` ids; id 0 is the root.
//! Every non-root node stores the weight of the edge to its parent. An
//! infinite weight marks an edge that should never be cut first.
//!
//! Workers build [`TreeFragment`]s independently; a fragment is hung below an
//! existing node with [`DecompositionTree::graft`]. Nodes are only ever
//! appended.

/// What a node stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// An original graph vertex.
    Leaf(usize),
    /// A cluster.
    Internal,
}

/// A node of a [`DecompositionTree`].
#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode {
    /// Node id.
    pub id: usize,
    /// Parent id (`None` for the root).
    pub parent: Option<usize>,
    /// Weight of the edge to the parent (0 for the root).
    pub weight: f64,
    /// Leaf or internal.
    pub kind: NodeKind,
    /// Child ids in insertion order.
    pub children: Vec<usize>,
}

/// A hierarchical decomposition of a graph's vertices.
#[derive(Debug, Clone, PartialEq)]
pub struct DecompositionTree {
    nodes: Vec<TreeNode>,
    /// Vertex -> leaf node.
    leaf_of: Vec<Option<usize>>,
}

impl DecompositionTree {
    /// A tree holding only the root, for a graph with `n_vertices` vertices.
    pub fn new(n_vertices: usize) -> Self {
        Self {
            nodes: vec![TreeNode {
                id: 0,
                parent: None,
                weight: 0.0,
                kind: NodeKind::Internal,
                children: Vec::new(),
            }],
            leaf_of: vec![None; n_vertices],
        }
    }

    /// The root id.
    pub fn root(&self) -> usize {
        0
    }

    /// Add an internal node below `parent`.
    pub fn add_internal(&mut self, parent: usize, weight: f64) -> usize {
        self.push(parent, weight, NodeKind::Internal)
    }

    /// Add the leaf of `vertex` below `parent`.
    pub fn add_leaf(&mut self, parent: usize, vertex: usize, weight: f64) -> usize {
        debug_assert!(self.leaf_of[vertex].is_none(), "vertex {vertex} already has a leaf");
        let id = self.push(parent, weight, NodeKind::Leaf(vertex));
        self.leaf_of[vertex] = Some(id);
        id
    }

    fn push(&mut self, parent: usize, weight: f64, kind: NodeKind) -> usize {
        let id = self.nodes.len();
        self.nodes.push(TreeNode {
            id,
            parent: Some(parent),
            weight,
            kind,
            children: Vec::new(),
        });
        self.nodes[parent].children.push(id);
        id
    }

    /// Hang `fragment` below `parent`: the fragment's anchor becomes `parent`.
    pub fn graft(&mut self, parent: usize, fragment: TreeFragment) {
        let mut ids = Vec::with_capacity(fragment.nodes.len() + 1);
        ids.push(parent);
        for node in fragment.nodes {
            let at = ids[node.parent];
            let id = match node.kind {
                NodeKind::Leaf(v) => self.add_leaf(at, v, node.weight),
                NodeKind::Internal => self.add_internal(at, node.weight),
            };
            ids.push(id);
        }
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree holds only its root.
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    /// Number of vertices of the decomposed graph.
    pub fn n_vertices(&self) -> usize {
        self.leaf_of.len()
    }

    /// Number of leaves.
    pub fn num_leaves(&self) -> usize {
        self.leaf_of.iter().flatten().count()
    }

    /// All nodes, by id.
    pub fn nodes(&self) -> &[TreeNode] {
        &self.nodes
    }

    /// A node by id.
    pub fn node(&self, id: usize) -> Option<&TreeNode> {
        self.nodes.get(id)
    }

    /// Children of a node.
    pub fn children(&self, id: usize) -> &[usize] {
        &self.nodes[id].children
    }

    /// Children with the weights of the edges leading to them.
    pub fn child_edges(&self, id: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.nodes[id]
            .children
            .iter()
            .map(|&c| (c, self.nodes[c].weight))
    }

    /// Parent of a node and the weight of the edge to it.
    pub fn parent(&self, id: usize) -> Option<(usize, f64)> {
        let node = &self.nodes[id];
        node.parent.map(|p| (p, node.weight))
    }

    /// Whether a node is a vertex leaf.
    pub fn is_leaf(&self, id: usize) -> bool {
        matches!(self.nodes[id].kind, NodeKind::Leaf(_))
    }

    /// The vertex behind a leaf.
    pub fn original_vertex(&self, id: usize) -> Option<usize> {
        match self.nodes.get(id)?.kind {
            NodeKind::Leaf(v) => Some(v),
            NodeKind::Internal => None,
        }
    }

    /// The leaf of a vertex.
    pub fn leaf_for(&self, vertex: usize) -> Option<usize> {
        self.leaf_of.get(vertex).copied().flatten()
    }

    /// Vertices of every leaf below `id`, ascending.
    pub fn all_vertices_below(&self, id: usize) -> Vec<usize> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(node) = stack.pop() {
            match self.nodes[node].kind {
                NodeKind::Leaf(v) => out.push(v),
                NodeKind::Internal => stack.extend(&self.nodes[node].children),
            }
        }
        out.sort_unstable();
        out
    }

    /// Number of edges between `id` and the root.
    pub fn depth(&self, id: usize) -> usize {
        let mut depth = 0;
        let mut current = id;
        while let Some(parent) = self.nodes[current].parent {
            depth += 1;
            current = parent;
        }
        depth
    }

    /// Largest depth of any node.
    pub fn height(&self) -> usize {
        // Parents always precede children, so one forward pass suffices.
        let mut depths = vec![0usize; self.nodes.len()];
        for node in &self.nodes[1..] {
            if let Some(p) = node.parent {
                depths[node.id] = depths[p] + 1;
            }
        }
        depths.into_iter().max().unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq)]
struct FragmentNode {
    /// 0 is the anchor; node `i` of `nodes` has id `i + 1`.
    parent: usize,
    weight: f64,
    kind: NodeKind,
}

/// A detached piece of a decomposition tree, built by one worker.
///
/// Id [`TreeFragment::ANCHOR`] stands for the node the fragment will be
/// grafted under.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TreeFragment {
    nodes: Vec<FragmentNode>,
}

impl TreeFragment {
    /// The node this fragment hangs from.
    pub const ANCHOR: usize = 0;

    /// An empty fragment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an internal node.
    pub fn add_internal(&mut self, parent: usize, weight: f64) -> usize {
        self.push(parent, weight, NodeKind::Internal)
    }

    /// Add a vertex leaf.
    pub fn add_leaf(&mut self, parent: usize, vertex: usize, weight: f64) -> usize {
        self.push(parent, weight, NodeKind::Leaf(vertex))
    }

    fn push(&mut self, parent: usize, weight: f64, kind: NodeKind) -> usize {
        debug_assert!(parent <= self.nodes.len());
        self.nodes.push(FragmentNode {
            parent,
            weight,
            kind,
        });
        self.nodes.len()
    }

    /// Hang `other` below `parent`.
    pub fn graft(&mut self, parent: usize, other: TreeFragment) {
        let offset = self.nodes.len();
        for node in other.nodes {
            let parent = if node.parent == Self::ANCHOR {
                parent
            } else {
                node.parent + offset
            };
            self.nodes.push(FragmentNode { parent, ..node });
        }
    }

    /// Number of nodes, anchor excluded.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether nothing was added.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Vertices of the fragment's leaves, in insertion order.
    pub fn leaves(&self) -> impl Iterator<Item = usize> + '_ {
        self.nodes.iter().filter_map(|n| match n.kind {
            NodeKind::Leaf(v) => Some(v),
            NodeKind::Internal => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DecompositionTree {
        //        0
        //      /   \
        //   1(∞)   2(3.0)
        //   /  \      \
        // v0    v1     v2
        let mut tree = DecompositionTree::new(3);
        let a = tree.add_internal(0, f64::INFINITY);
        let b = tree.add_internal(0, 3.0);
        tree.add_leaf(a, 0, 1.0);
        tree.add_leaf(a, 1, 2.0);
        tree.add_leaf(b, 2, 3.0);
        tree
    }

    #[test]
    fn test_read_api() {
        let tree = sample();
        assert_eq!(tree.root(), 0);
        assert_eq!(tree.len(), 6);
        assert_eq!(tree.num_leaves(), 3);
        assert_eq!(tree.children(0), &[1, 2]);
        assert_eq!(tree.parent(2), Some((0, 3.0)));
        assert_eq!(tree.parent(0), None);
        assert!(tree.child_edges(0).any(|(c, w)| c == 1 && w.is_infinite()));

        let leaf = tree.leaf_for(1).unwrap();
        assert!(tree.is_leaf(leaf));
        assert_eq!(tree.original_vertex(leaf), Some(1));
        assert_eq!(tree.original_vertex(1), None);
        assert_eq!(tree.all_vertices_below(1), vec![0, 1]);
        assert_eq!(tree.all_vertices_below(0), vec![0, 1, 2]);
        assert_eq!(tree.depth(leaf), 2);
        assert_eq!(tree.height(), 2);
    }

    #[test]
    fn test_graft_nested_fragments() {
        let mut inner = TreeFragment::new();
        let c = inner.add_internal(TreeFragment::ANCHOR, f64::INFINITY);
        inner.add_leaf(c, 3, 1.5);

        let mut outer = TreeFragment::new();
        let top = outer.add_internal(TreeFragment::ANCHOR, 2.0);
        outer.add_leaf(top, 2, 0.5);
        outer.graft(top, inner);
        assert_eq!(outer.len(), 4);
        assert_eq!(outer.leaves().collect::<Vec<_>>(), vec![2, 3]);

        let mut tree = DecompositionTree::new(4);
        tree.graft(tree.root(), outer);
        let leaf = tree.leaf_for(3).unwrap();
        assert_eq!(tree.depth(leaf), 3);
        assert_eq!(tree.parent(leaf).map(|(_, w)| w), Some(1.5));
        assert_eq!(tree.all_vertices_below(1), vec![2, 3]);
        assert_eq!(tree.leaf_for(0), None);
    }
}
