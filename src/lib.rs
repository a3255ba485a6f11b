//! Sociogram is a social network analysis engine: it stores actors and their ties, possibly over
//! several named relations, and computes the structural measures of the network.
//!
//! # Basic usage
//!
//! The library is centered around the [`Graph`](graph::Graph) structure. Analyses don't read the
//! graph directly: they run on a [`Snapshot`](matrix::Snapshot), a dense matrix view of the
//! current relation taken with an explicit [`AnalysisConfig`](config::AnalysisConfig). Once
//! taken, prominence indices, matrices, similarities, subgroups and layouts can be computed from
//! it.
//!
//! ```rust
//! use sociogram::{centrality::Index, config::AnalysisConfig, graph::Graph};
//!
//! // Construct the graph instance.
//! let mut graph = Graph::undirected();
//!
//! // Actors get stable ids, starting at 1.
//! let (a, b, c) = (graph.add_vertex(), graph.add_vertex(), graph.add_vertex());
//! graph.add_edge(a, b, 1.0).unwrap();
//! graph.add_edge(a, c, 1.0).unwrap();
//!
//! // Compute some measures on that state of the graph.
//! let snapshot = graph.snapshot(&AnalysisConfig::default());
//! let degree = Index::Degree.compute(&snapshot, &mut ()).unwrap();
//!
//! assert_eq!(degree.raw(a), Some(2.0));
//! assert_eq!(snapshot.diameter(), 2.0);
//!
//! // Matrices can be pretty printed...
//! println!("{}", snapshot.laplacian_matrix());
//! // ...outputs:
//! //  ┌          ┐
//! //  │  2 -1 -1 │
//! //  │ -1  1  0 │
//! //  │ -1  0  1 │
//! //  └          ┘
//! ```
//!
//! Long computations take an [`Observer`](progress::Observer) for progress reports and
//! cancellation; `&mut ()` ignores both.

/// Builds a graph from paths of vertex ids, adding missing vertices and a unit tie between
/// consecutive ids.
#[cfg(test)]
macro_rules! graph {
    (@build $graph:expr; $($path:expr),*) => {{
        let mut graph = $graph;

        $(
            let path: &[$crate::vertex::VertexId] = &$path;
            for &id in path {
                if !graph.contains_vertex(id) {
                    graph.insert_vertex(id).unwrap();
                }
            }
            for pair in path.windows(2) {
                graph.add_edge(pair[0], pair[1], 1.0).unwrap();
            }
        )*

        graph
    }};
    (directed; $($path:expr),* $(,)?) => {
        graph!(@build $crate::graph::Graph::directed(); $($path),*)
    };
    ($($path:expr),* $(,)?) => {
        graph!(@build $crate::graph::Graph::undirected(); $($path),*)
    };
}

pub mod centrality;
pub mod community;
pub mod config;
pub mod edge;
pub mod error;
pub mod generate;
pub mod graph;
pub mod layout;
pub mod matrix;
pub mod progress;
pub mod similarity;
pub mod vertex;
