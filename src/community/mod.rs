//! Cohesive subgroups and local structure: maximal cliques, the triad census and clustering
//! coefficients.

pub mod cliques;
pub mod triads;

use std::collections::BTreeMap;

use serde::Serialize;

use crate::{matrix::Snapshot, vertex::VertexId};

/// Local clustering coefficients and their network average.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ClusteringCoefficients {
    pub local: BTreeMap<VertexId, f64>,
    /// Mean of the local coefficients; actors with fewer than two neighbours count as zero.
    pub average: f64,
}

impl Snapshot {
    /// Computes the share of each actor's neighbour pairs that are tied themselves.
    ///
    /// Ties are read as undirected, so this is Watts and Strogatz's coefficient over the
    /// symmetrized network.
    ///
    /// # Examples
    ///
    /// ```
    /// use sociogram::{config::AnalysisConfig, graph::Graph};
    ///
    /// // A triangle with a pendant on 1.
    /// let mut graph = Graph::undirected();
    /// for _ in 0..4 {
    ///     graph.add_vertex();
    /// }
    /// for (source, target) in [(1, 2), (2, 3), (3, 1), (1, 4)] {
    ///     graph.add_edge(source, target, 1.0).unwrap();
    /// }
    ///
    /// let coefficients = graph
    ///     .snapshot(&AnalysisConfig::default())
    ///     .clustering_coefficients();
    ///
    /// assert_eq!(coefficients.local[&1], 1.0 / 3.0);
    /// assert_eq!(coefficients.local[&2], 1.0);
    /// assert_eq!(coefficients.local[&4], 0.0);
    /// ```
    pub fn clustering_coefficients(&self) -> ClusteringCoefficients {
        let n = self.len();
        let mut local = BTreeMap::new();

        for i in 0..n {
            let neighbours: Vec<usize> = (0..n).filter(|&j| self.tied(i, j)).collect();
            let k = neighbours.len();

            let coefficient = if k < 2 {
                0.0
            } else {
                let mut links = 0usize;
                for (a, &j) in neighbours.iter().enumerate() {
                    links += neighbours[a + 1..]
                        .iter()
                        .filter(|&&l| self.tied(j, l))
                        .count();
                }
                links as f64 / (k * (k - 1) / 2) as f64
            };

            local.insert(self.ids()[i], coefficient);
        }

        let average = if n == 0 {
            0.0
        } else {
            local.values().sum::<f64>() / n as f64
        };

        ClusteringCoefficients { local, average }
    }
}
