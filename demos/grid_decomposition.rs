use cleave::{
    decompose, DecompositionConfig, DecompositionTree, HealthCheck, KrvConfig, WeightedGraph,
};
use tracing_subscriber::EnvFilter;

/// Two 4x4 grids joined by a pair of weak edges.
fn two_grids() -> cleave::Result<WeightedGraph> {
    const SIDE: usize = 4;
    let mut graph = WeightedGraph::new(2 * SIDE * SIDE);
    for offset in [0, SIDE * SIDE] {
        for r in 0..SIDE {
            for c in 0..SIDE {
                let v = offset + r * SIDE + c;
                if c + 1 < SIDE {
                    graph.add_edge(v, v + 1, 1.0)?;
                }
                if r + 1 < SIDE {
                    graph.add_edge(v, v + SIDE, 1.0)?;
                }
            }
        }
    }
    // Right column of the first grid to the left column of the second.
    graph.add_edge(SIDE - 1, SIDE * SIDE, 0.2)?;
    graph.add_edge(SIDE * SIDE - 1, SIDE * SIDE + (SIDE - 1) * SIDE, 0.2)?;
    Ok(graph)
}

fn print_node(tree: &DecompositionTree, node: usize, indent: usize) {
    let weight = tree.parent(node).map_or(String::from("-"), |(_, w)| {
        if w.is_infinite() {
            "inf".to_string()
        } else {
            format!("{w:.2}")
        }
    });
    match tree.original_vertex(node) {
        Some(v) => println!("{:indent$}v{v} (w={weight})", ""),
        None => println!(
            "{:indent$}node {node} (w={weight}) {:?}",
            "",
            tree.all_vertices_below(node)
        ),
    }
    for &child in tree.children(node) {
        print_node(tree, child, indent + 2);
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // RUST_LOG=cleave=debug shows per-unit summaries; trace shows every round.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let graph = two_grids()?;
    let config = DecompositionConfig::default()
        .with_krv(KrvConfig::default().with_max_iterations(300))
        .with_seed(2024);
    let tree = decompose(&graph, config)?;

    println!(
        "n_vertices={} n_edges={} tree_nodes={} height={}",
        graph.node_count(),
        graph.edge_count(),
        tree.len(),
        tree.height()
    );
    print_node(&tree, tree.root(), 0);
    println!();
    println!("{}", tree.health_check());

    Ok(())
}
