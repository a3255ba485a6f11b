//! Maximal clique census.

use std::{
    collections::{BTreeMap, BTreeSet},
    time::Instant,
};

use nalgebra::DMatrix;
use serde::Serialize;
use tracing::info;

use crate::{
    error::Result,
    matrix::{LabeledMatrix, Snapshot},
    progress::{Observer, Progress},
    vertex::VertexId,
};

/// The maximal cliques of a network.
///
/// Ties are read as undirected. Only cliques of two or more actors are reported, so isolates
/// belong to none.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CliqueCensus {
    ids: Vec<VertexId>,
    /// Every maximal clique with its members in ascending id order. Larger cliques come first,
    /// cliques of equal size in lexicographic order.
    cliques: Vec<Vec<VertexId>>,
}

impl CliqueCensus {
    pub fn cliques(&self) -> &[Vec<VertexId>] {
        &self.cliques
    }

    pub fn len(&self) -> usize {
        self.cliques.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cliques.is_empty()
    }

    /// The size of the largest clique, zero if there are none.
    pub fn clique_number(&self) -> usize {
        self.cliques.first().map_or(0, Vec::len)
    }

    /// Number of maximal cliques of each size.
    pub fn by_size(&self) -> BTreeMap<usize, usize> {
        let mut counts = BTreeMap::new();
        for clique in &self.cliques {
            *counts.entry(clique.len()).or_default() += 1;
        }
        counts
    }

    /// The positions in [`CliqueCensus::cliques`] of the cliques an actor belongs to.
    pub fn membership(&self, id: VertexId) -> Vec<usize> {
        self.cliques
            .iter()
            .enumerate()
            .filter(|(_, clique)| clique.binary_search(&id).is_ok())
            .map(|(position, _)| position)
            .collect()
    }

    /// Clique co-membership: entry `(i, j)` counts the cliques holding both actors, the
    /// diagonal the cliques holding each actor.
    pub fn co_membership(&self) -> LabeledMatrix {
        let index: BTreeMap<VertexId, usize> =
            self.ids.iter().enumerate().map(|(i, &id)| (id, i)).collect();

        let n = self.ids.len();
        let mut matrix = DMatrix::<f64>::zeros(n, n);

        for clique in &self.cliques {
            for a in clique {
                for b in clique {
                    matrix[(index[a], index[b])] += 1.0;
                }
            }
        }

        LabeledMatrix::from_parts(self.ids.clone(), matrix)
    }
}

impl Snapshot {
    /// Enumerates the maximal cliques with Bron and Kerbosch's algorithm, pivoting on the
    /// candidate with the most neighbours among the candidates.
    ///
    /// Progress advances once per actor of the outer loop.
    pub fn clique_census(&self, observer: &mut dyn Observer) -> Result<CliqueCensus> {
        let start = Instant::now();
        let n = self.len();
        self.config().limits.check("clique census", n)?;

        let neighbours: Vec<BTreeSet<usize>> = (0..n)
            .map(|i| (0..n).filter(|&j| self.tied(i, j)).collect())
            .collect();

        let mut found: Vec<Vec<usize>> = Vec::new();
        let mut progress = Progress::new(observer, n);

        // Each clique is reported from its lowest member: later neighbours are candidates,
        // earlier ones are excluded.
        for v in 0..n {
            let candidates: BTreeSet<usize> = neighbours[v].range(v + 1..).copied().collect();
            let excluded: BTreeSet<usize> = neighbours[v].range(..v).copied().collect();

            bron_kerbosch(&neighbours, vec![v], candidates, excluded, &mut found);
            progress.tick()?;
        }

        let mut cliques: Vec<Vec<VertexId>> = found
            .into_iter()
            .filter(|clique| clique.len() >= 2)
            .map(|clique| {
                let mut members: Vec<VertexId> =
                    clique.into_iter().map(|i| self.ids()[i]).collect();
                members.sort_unstable();
                members
            })
            .collect();

        cliques.sort_unstable_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

        info!(n, cliques = cliques.len(), elapsed = ?start.elapsed(), "counted maximal cliques");

        Ok(CliqueCensus {
            ids: self.ids().to_vec(),
            cliques,
        })
    }
}

fn bron_kerbosch(
    neighbours: &[BTreeSet<usize>],
    clique: Vec<usize>,
    mut candidates: BTreeSet<usize>,
    mut excluded: BTreeSet<usize>,
    found: &mut Vec<Vec<usize>>,
) {
    if candidates.is_empty() {
        if excluded.is_empty() {
            found.push(clique);
        }
        return;
    }

    let Some(&pivot) = candidates
        .union(&excluded)
        .max_by_key(|&&u| neighbours[u].intersection(&candidates).count())
    else {
        return;
    };

    let branches: Vec<usize> = candidates.difference(&neighbours[pivot]).copied().collect();

    for v in branches {
        let mut extended = clique.clone();
        extended.push(v);

        bron_kerbosch(
            neighbours,
            extended,
            candidates.intersection(&neighbours[v]).copied().collect(),
            excluded.intersection(&neighbours[v]).copied().collect(),
            found,
        );

        candidates.remove(&v);
        excluded.insert(v);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::AnalysisConfig, error::Error, progress::tests::Recorder};

    fn census(graph: &crate::graph::Graph) -> CliqueCensus {
        graph
            .snapshot(&AnalysisConfig::default())
            .clique_census(&mut ())
            .unwrap()
    }

    #[test]
    fn two_triangles_sharing_an_edge() {
        let graph = graph!([1, 2, 3, 1], [2, 4, 3]);
        let census = census(&graph);

        assert_eq!(census.cliques(), &[vec![1, 2, 3], vec![2, 3, 4]]);
        assert_eq!(census.clique_number(), 3);
        assert_eq!(census.by_size(), BTreeMap::from([(3, 2)]));
        assert_eq!(census.membership(2), vec![0, 1]);
        assert_eq!(census.membership(1), vec![0]);

        let co_membership = census.co_membership();
        assert_eq!(co_membership.get(2, 3), Some(2.0));
        assert_eq!(co_membership.get(1, 4), Some(0.0));
        assert_eq!(co_membership.get(2, 2), Some(2.0));
    }

    #[test]
    fn complete_graph_is_one_clique() {
        let graph = graph!([1, 2, 3, 4, 5, 1], [1, 3], [1, 4], [2, 4], [2, 5], [3, 5]);
        let census = census(&graph);

        assert_eq!(census.cliques(), &[vec![1, 2, 3, 4, 5]]);
    }

    #[test]
    fn ties_and_isolates() {
        let mut graph = graph!([1, 2, 3]);
        graph.add_vertex();
        let census = census(&graph);

        assert_eq!(census.cliques(), &[vec![1, 2], vec![2, 3]]);
        assert_eq!(census.by_size(), BTreeMap::from([(2, 2)]));
        assert!(census.membership(4).is_empty());
    }

    #[test]
    fn arcs_are_read_as_ties() {
        let graph = graph!(directed; [1, 2, 3], [3, 1]);

        assert_eq!(census(&graph).cliques(), &[vec![1, 2, 3]]);
    }

    #[test]
    fn cancellation() {
        let graph = graph!([1, 2, 3, 4, 5]);
        let mut recorder = Recorder {
            cancel_after: Some(1),
            ..Default::default()
        };

        assert_eq!(
            graph
                .snapshot(&AnalysisConfig::default())
                .clique_census(&mut recorder),
            Err(Error::Cancelled)
        );
    }

    #[test]
    fn large_networks_require_confirmation() {
        let mut graph = crate::graph::Graph::undirected();
        for _ in 0..201 {
            graph.add_vertex();
        }

        assert_eq!(
            graph
                .snapshot(&AnalysisConfig::default())
                .clique_census(&mut ())
                .map(|_| ()),
            Err(Error::ConfirmationRequired {
                operation: "clique census",
                size: 201,
                limit: 200,
            })
        );

        let confirmed = AnalysisConfig::default().confirmed();
        assert!(graph.snapshot(&confirmed).clique_census(&mut ()).is_ok());
    }
}
