//! Recursive decomposition of a graph into a tree.
//!
//! One unit of work takes a vertex set `S`, bisects it, and returns a
//! [`TreeFragment`]:
//!
//! ```text
//!   anchor
//!   ├── R (∞)                      source side of Phase B
//!   │   └── cluster ∩ R (∞) ──► leaves, or a recursive unit
//!   └── L (out-degree of L)        sink side of Phase B
//!       └── cluster ∩ L (∞) ──► leaves, or a recursive unit
//! ```
//!
//! Clusters of one or two vertices become leaves weighted by their degree in
//! the whole graph. Larger clusters are decomposed by child units, which run
//! in parallel when the `parallel` feature is enabled. Each child gets a seed
//! drawn from its parent's generator in a fixed order, so the resulting tree
//! does not depend on scheduling.

use super::tree::{DecompositionTree, TreeFragment};
use crate::bisection::{phase_a, phase_b};
use crate::error::{Error, Result};
use crate::graph::{Subgraph, WeightedGraph};
use crate::krv::KrvConfig;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Configuration of a decomposition run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecompositionConfig {
    /// Parameters of every cut-matching run.
    pub krv: KrvConfig,
    /// Seed of the top-level unit; drawn at random when `None`.
    pub seed: Option<u64>,
    /// Worker threads; twice the available cores when `None`.
    pub num_threads: Option<usize>,
}

impl DecompositionConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the cut-matching parameters.
    pub fn with_krv(mut self, krv: KrvConfig) -> Self {
        self.krv = krv;
        self
    }

    /// Fix the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the number of worker threads.
    pub fn with_num_threads(mut self, threads: usize) -> Self {
        self.num_threads = Some(threads);
        self
    }

    /// Check every parameter is in range.
    pub fn validate(&self) -> Result<()> {
        if self.num_threads == Some(0) {
            return Err(Error::InvalidParameter {
                name: "num_threads",
                message: "must be at least 1",
            });
        }
        self.krv.validate()
    }
}

/// Builds decomposition trees.
///
/// # Example
///
/// ```rust
/// use cleave::{DecompositionConfig, Decomposer, WeightedGraph};
///
/// let graph = WeightedGraph::from_edges(
///     4,
///     &[(0, 1, 1.0), (1, 2, 1.0), (2, 3, 1.0), (3, 0, 1.0)],
/// ).unwrap();
/// let decomposer = Decomposer::new(DecompositionConfig::default().with_seed(7)).unwrap();
/// let tree = decomposer.decompose(&graph).unwrap();
///
/// assert_eq!(tree.num_leaves(), 4);
/// assert!(tree.validate().is_healthy());
/// ```
#[derive(Debug, Clone)]
pub struct Decomposer {
    config: DecompositionConfig,
}

impl Decomposer {
    /// Validate `config` and build a decomposer.
    pub fn new(config: DecompositionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The configuration in use.
    pub fn config(&self) -> &DecompositionConfig {
        &self.config
    }

    /// Decompose `graph`.
    pub fn decompose(&self, graph: &WeightedGraph) -> Result<DecompositionTree> {
        let n = graph.node_count();
        if n == 0 {
            return Err(Error::EmptyInput);
        }

        let mut tree = DecompositionTree::new(n);
        let root = tree.root();
        if n <= 2 {
            for v in 0..n {
                let _ = tree.add_leaf(root, v, graph.degree(v));
            }
            return Ok(tree);
        }

        let seed = self.config.seed.unwrap_or_else(|| {
            let seed = rand::rng().random();
            debug!(seed, "no seed configured, drew one");
            seed
        });
        debug!(vertices = n, edges = graph.edge_count(), seed, "decomposition start");

        let vertices: Vec<usize> = (0..n).collect();
        let krv = &self.config.krv;
        let fragment = self.in_pool(|| decompose_unit(graph, &vertices, seed, krv))?;
        tree.graft(root, fragment);

        debug!(nodes = tree.len(), height = tree.height(), "decomposition done");
        Ok(tree)
    }

    #[cfg(feature = "parallel")]
    fn in_pool<T, F>(&self, job: F) -> Result<T>
    where
        T: Send,
        F: FnOnce() -> Result<T> + Send,
    {
        let threads = self.config.num_threads.unwrap_or_else(|| {
            std::thread::available_parallelism().map_or(1, |n| n.get()) * 2
        });
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .map_err(|e| Error::ThreadPool(e.to_string()))?;
        pool.install(job)
    }

    #[cfg(not(feature = "parallel"))]
    fn in_pool<T, F>(&self, job: F) -> Result<T>
    where
        F: FnOnce() -> Result<T>,
    {
        job()
    }
}

/// Decompose `graph` with `config`.
pub fn decompose(graph: &WeightedGraph, config: DecompositionConfig) -> Result<DecompositionTree> {
    Decomposer::new(config)?.decompose(graph)
}

/// A cluster waiting for its own unit.
struct Pending {
    anchor: usize,
    vertices: Vec<usize>,
    seed: u64,
}

/// One unit: bisect `vertices` and recurse into the clusters.
fn decompose_unit(
    graph: &WeightedGraph,
    vertices: &[usize],
    seed: u64,
    config: &KrvConfig,
) -> Result<TreeFragment> {
    let mut rng = StdRng::seed_from_u64(seed);
    let subgraph = Subgraph::induced(graph, vertices);
    let a = phase_a(&subgraph, config, &mut rng)?;
    let b = phase_b(&subgraph, &a.separator);

    let mut on_source = vec![false; subgraph.vertex_count()];
    for &v in &b.source_side {
        if let Some(local) = subgraph.local_vertex(v) {
            on_source[local] = true;
        }
    }
    let mut sink_mask = vec![false; graph.node_count()];
    for &v in &b.sink_side {
        sink_mask[v] = true;
    }

    let mut fragment = TreeFragment::new();
    let mut pending = Vec::new();
    let sides = [
        (&b.source_side, true, f64::INFINITY),
        (&b.sink_side, false, graph.out_degree(&sink_mask)),
    ];
    for (side, source, weight) in sides {
        if side.is_empty() {
            continue;
        }
        let child = fragment.add_internal(TreeFragment::ANCHOR, weight);

        for cluster in &a.clusters {
            let members: Vec<usize> = cluster
                .iter()
                .copied()
                .filter(|&v| subgraph.local_vertex(v).is_some_and(|l| on_source[l] == source))
                .collect();
            if members.is_empty() {
                continue;
            }
            // A cluster covering the whole unit would recurse forever.
            let groups: Vec<Vec<usize>> = if members.len() == subgraph.vertex_count() {
                members.iter().map(|&v| vec![v]).collect()
            } else {
                vec![members]
            };

            for group in groups {
                let grandchild = fragment.add_internal(child, f64::INFINITY);
                if group.len() <= 2 {
                    for v in group {
                        let _ = fragment.add_leaf(grandchild, v, graph.degree(v));
                    }
                } else {
                    pending.push(Pending {
                        anchor: grandchild,
                        vertices: group,
                        seed: rng.random(),
                    });
                }
            }
        }
    }

    debug!(
        vertices = vertices.len(),
        clusters = a.clusters.len(),
        source_side = b.source_side.len(),
        sink_side = b.sink_side.len(),
        recursing = pending.len(),
        "unit done"
    );

    #[cfg(feature = "parallel")]
    let results: Vec<Result<TreeFragment>> = pending
        .par_iter()
        .map(|p| decompose_unit(graph, &p.vertices, p.seed, config))
        .collect();
    #[cfg(not(feature = "parallel"))]
    let results: Vec<Result<TreeFragment>> = pending
        .iter()
        .map(|p| decompose_unit(graph, &p.vertices, p.seed, config))
        .collect();

    let mut first_error = None;
    for (p, result) in pending.iter().zip(results) {
        match result {
            Ok(child) => fragment.graft(p.anchor, child),
            Err(e) => {
                let _ = first_error.get_or_insert(e);
            }
        }
    }
    match first_error {
        Some(e) => Err(e),
        None => Ok(fragment),
    }
}
