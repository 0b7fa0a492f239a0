use core::fmt;

/// Result alias for `cleave`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by graph construction and decomposition.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Input was empty.
    EmptyInput,

    /// An edge endpoint does not name an existing vertex.
    VertexOutOfRange {
        /// Offending vertex index.
        vertex: usize,
        /// Number of vertices in the graph.
        n_vertices: usize,
    },

    /// Self-loops are not part of a simple graph.
    SelfLoop {
        /// The vertex the loop was attached to.
        vertex: usize,
    },

    /// Edge weights must be finite and strictly positive.
    InvalidWeight {
        /// Index the edge would have received.
        edge: usize,
        /// The rejected weight.
        weight: f64,
    },

    /// Invalid parameter value.
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Error message.
        message: &'static str,
    },

    /// The active edge set shrank to a single edge while the potential was
    /// still above the convergence bound. The randomized iteration failed for
    /// this unit; a caller may retry with another seed.
    ActiveSetCollapsed {
        /// Potential at the time of collapse.
        potential: f64,
        /// Convergence bound the potential had to reach.
        bound: f64,
    },

    /// The worker pool could not be built.
    ThreadPool(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::EmptyInput => write!(f, "empty input provided"),
            Error::VertexOutOfRange { vertex, n_vertices } => {
                write!(f, "vertex {vertex} out of range for graph with {n_vertices} vertices")
            }
            Error::SelfLoop { vertex } => write!(f, "self-loop on vertex {vertex}"),
            Error::InvalidWeight { edge, weight } => {
                write!(f, "edge {edge} has invalid weight {weight}")
            }
            Error::InvalidParameter { name, message } => {
                write!(f, "invalid parameter '{name}': {message}")
            }
            Error::ActiveSetCollapsed { potential, bound } => write!(
                f,
                "active set collapsed with potential {potential} above bound {bound}"
            ),
            Error::ThreadPool(msg) => write!(f, "worker pool: {msg}"),
        }
    }
}

impl std::error::Error for Error {}
