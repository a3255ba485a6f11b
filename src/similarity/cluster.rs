//! Agglomerative hierarchical clustering.
//!
//! Every actor starts in its own cluster; the two closest clusters are merged until a single one
//! remains. Inter-cluster distances are updated with the Lance–Williams recurrence for the chosen
//! [`Linkage`], and candidate pairs wait in a binary heap whose stale entries are skipped when
//! popped, which keeps the whole run at `O(n² log n)`.

use std::{cmp::Ordering, collections::BinaryHeap, time::Instant};

use serde::{Deserialize, Serialize};
use tracing::info;

use super::{Measure, ProfileOptions};
use crate::{
    config::Limits,
    error::{Error, Result},
    matrix::{LabeledMatrix, Snapshot},
    progress::{Observer, Progress},
    vertex::VertexId,
};

/// How the distance between two clusters derives from the distances between their members.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Linkage {
    /// The closest pair of members.
    #[default]
    Single,
    /// The farthest pair of members.
    Complete,
    /// The mean over all pairs of members.
    Average,
}

impl Linkage {
    /// The distance from the union of `a` and `b` to a third cluster.
    fn merged(&self, to_a: f64, to_b: f64, size_a: usize, size_b: usize) -> f64 {
        match self {
            Linkage::Single => to_a.min(to_b),
            Linkage::Complete => to_a.max(to_b),
            Linkage::Average => {
                (size_a as f64 * to_a + size_b as f64 * to_b) / (size_a + size_b) as f64
            }
        }
    }
}

/// One step of the agglomeration.
///
/// Clusters are numbered like the leaves and merges of a dendrogram: `0..n` are the actors in
/// id order, and the cluster created by the `k`-th merge is `n + k`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Merge {
    /// Distance at which the two clusters were joined.
    pub level: f64,
    pub left: usize,
    pub right: usize,
    /// Number of actors in the new cluster.
    pub size: usize,
}

/// The merge sequence of a hierarchical clustering.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Dendrogram {
    linkage: Linkage,
    ids: Vec<VertexId>,
    merges: Vec<Merge>,
}

impl Dendrogram {
    pub fn linkage(&self) -> Linkage {
        self.linkage
    }

    /// The leaves, in cluster number order.
    pub fn ids(&self) -> &[VertexId] {
        &self.ids
    }

    pub fn merges(&self) -> &[Merge] {
        &self.merges
    }

    /// The actors in a cluster, in ascending id order.
    pub fn members(&self, cluster: usize) -> Vec<VertexId> {
        let n = self.ids.len();
        let mut members = Vec::new();
        let mut stack = vec![cluster];

        while let Some(cluster) = stack.pop() {
            if cluster < n {
                members.push(self.ids[cluster]);
            } else if let Some(merge) = self.merges.get(cluster - n) {
                stack.push(merge.left);
                stack.push(merge.right);
            }
        }

        members.sort_unstable();
        members
    }

    /// Cuts the tree at `level`: the clusters formed by every merge at or below it.
    pub fn clusters_at(&self, level: f64) -> Vec<Vec<VertexId>> {
        let count = self
            .merges
            .iter()
            .take_while(|merge| merge.level <= level)
            .count();

        self.partition_after(count)
    }

    /// The cluster diagram: the partition after each merge, keyed by the merge level.
    pub fn levels(&self) -> Vec<(f64, Vec<Vec<VertexId>>)> {
        self.merges
            .iter()
            .enumerate()
            .map(|(k, merge)| (merge.level, self.partition_after(k + 1)))
            .collect()
    }

    /// The partition once the first `count` merges are applied, clusters ordered by their
    /// smallest member.
    fn partition_after(&self, count: usize) -> Vec<Vec<VertexId>> {
        let n = self.ids.len();
        let mut alive = vec![true; n + count];

        for merge in &self.merges[..count] {
            alive[merge.left] = false;
            alive[merge.right] = false;
        }

        let mut clusters: Vec<Vec<VertexId>> = alive
            .iter()
            .enumerate()
            .filter(|(_, alive)| **alive)
            .map(|(cluster, _)| self.members(cluster))
            .collect();

        clusters.sort_unstable();
        clusters
    }
}

/// A candidate pair, ordered so that `BinaryHeap` pops the closest (then lowest-numbered) pair
/// first.
#[derive(Debug, PartialEq)]
struct Candidate {
    distance: f64,
    a: usize,
    b: usize,
    /// Versions of the two slots when the entry was pushed.
    stamps: (usize, usize),
}

impl Eq for Candidate {}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .distance
            .total_cmp(&self.distance)
            .then_with(|| other.a.cmp(&self.a))
            .then_with(|| other.b.cmp(&self.b))
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Clusters the actors labelling a dissimilarity matrix. Asymmetric entries are averaged.
///
/// # Examples
///
/// ```
/// use nalgebra::dmatrix;
/// use sociogram::{
///     config::Limits,
///     matrix::LabeledMatrix,
///     similarity::cluster::{hierarchical_clustering, Linkage},
/// };
///
/// let distances = LabeledMatrix::new(
///     vec![1, 2, 3],
///     dmatrix![0.0, 1.0, 4.0;
///              1.0, 0.0, 2.0;
///              4.0, 2.0, 0.0],
/// )
/// .unwrap();
///
/// let dendrogram =
///     hierarchical_clustering(&distances, Linkage::Single, &Limits::default(), &mut ()).unwrap();
///
/// assert_eq!(dendrogram.clusters_at(1.0), vec![vec![1, 2], vec![3]]);
/// assert_eq!(dendrogram.merges()[1].level, 2.0);
/// ```
pub fn hierarchical_clustering(
    dissimilarities: &LabeledMatrix,
    linkage: Linkage,
    limits: &Limits,
    observer: &mut dyn Observer,
) -> Result<Dendrogram> {
    let n = dissimilarities.len();
    limits.check("hierarchical clustering", n)?;

    let matrix = dissimilarities.matrix();
    if matrix.iter().any(|value| value.is_nan()) {
        return Err(Error::invalid("dissimilarities must not be NaN"));
    }

    let start = Instant::now();

    let mut distances = vec![vec![0.0; n]; n];
    let mut heap = BinaryHeap::with_capacity(n * n.saturating_sub(1) / 2);
    for a in 0..n {
        for b in a + 1..n {
            let distance = (matrix[(a, b)] + matrix[(b, a)]) / 2.0;
            distances[a][b] = distance;
            distances[b][a] = distance;
            heap.push(Candidate {
                distance,
                a,
                b,
                stamps: (0, 0),
            });
        }
    }

    // Slot `i` holds a live cluster while `alive[i]`; the merged cluster takes the lower slot.
    let mut alive = vec![true; n];
    let mut stamps = vec![0usize; n];
    let mut sizes = vec![1usize; n];
    let mut labels: Vec<usize> = (0..n).collect();
    let mut merges = Vec::with_capacity(n.saturating_sub(1));
    let mut progress = Progress::new(observer, n.saturating_sub(1));

    while let Some(Candidate {
        distance,
        a,
        b,
        stamps: (stamp_a, stamp_b),
    }) = heap.pop()
    {
        if !alive[a] || !alive[b] || stamps[a] != stamp_a || stamps[b] != stamp_b {
            continue;
        }

        merges.push(Merge {
            level: distance,
            left: labels[a],
            right: labels[b],
            size: sizes[a] + sizes[b],
        });

        for k in (0..n).filter(|&k| alive[k] && k != a && k != b) {
            let updated = linkage.merged(distances[a][k], distances[b][k], sizes[a], sizes[b]);
            distances[a][k] = updated;
            distances[k][a] = updated;
        }

        alive[b] = false;
        sizes[a] += sizes[b];
        stamps[a] += 1;
        labels[a] = n + merges.len() - 1;

        for k in (0..n).filter(|&k| alive[k] && k != a) {
            let (low, high) = if k < a { (k, a) } else { (a, k) };
            heap.push(Candidate {
                distance: distances[low][high],
                a: low,
                b: high,
                stamps: (stamps[low], stamps[high]),
            });
        }

        progress.tick()?;
    }

    info!(n, ?linkage, elapsed = ?start.elapsed(), "clustered actors");

    Ok(Dendrogram {
        linkage,
        ids: dissimilarities.ids().to_vec(),
        merges,
    })
}

impl Snapshot {
    /// Clusters the actors by the dissimilarity of their tie profiles under `measure`.
    pub fn hierarchical_clustering(
        &self,
        measure: Measure,
        options: &ProfileOptions,
        linkage: Linkage,
        observer: &mut dyn Observer,
    ) -> Result<Dendrogram> {
        self.config().validate()?;
        // Refuse before building the n² comparison matrix.
        self.config().limits.check("hierarchical clustering", self.len())?;

        let dissimilarities = self.dissimilarity_matrix(measure, options);
        hierarchical_clustering(&dissimilarities, linkage, &self.config().limits, observer)
    }
}

#[cfg(test)]
mod tests {
    use nalgebra::dmatrix;

    use super::*;
    use crate::{config::AnalysisConfig, progress::tests::Recorder};

    fn four_points() -> LabeledMatrix {
        // Two tight pairs, {1, 2} and {3, 4}, far apart.
        LabeledMatrix::new(
            vec![1, 2, 3, 4],
            dmatrix![0.0, 1.0, 5.0, 6.0;
                     1.0, 0.0, 4.0, 5.0;
                     5.0, 4.0, 0.0, 2.0;
                     6.0, 5.0, 2.0, 0.0],
        )
        .unwrap()
    }

    fn cluster(linkage: Linkage) -> Dendrogram {
        hierarchical_clustering(&four_points(), linkage, &Limits::default(), &mut ()).unwrap()
    }

    #[test]
    fn merge_sequence() {
        let dendrogram = cluster(Linkage::Single);
        let merges = dendrogram.merges();

        assert_eq!(merges.len(), 3);
        assert_eq!(
            merges[0],
            Merge {
                level: 1.0,
                left: 0,
                right: 1,
                size: 2
            }
        );
        assert_eq!(
            merges[1],
            Merge {
                level: 2.0,
                left: 2,
                right: 3,
                size: 2
            }
        );
        assert_eq!(merges[2].size, 4);
        assert_eq!(dendrogram.members(6), vec![1, 2, 3, 4]);
        assert_eq!(dendrogram.members(5), vec![3, 4]);
    }

    #[test]
    fn linkage_sets_the_final_level() {
        assert_eq!(cluster(Linkage::Single).merges()[2].level, 4.0);
        assert_eq!(cluster(Linkage::Complete).merges()[2].level, 6.0);
        assert_eq!(cluster(Linkage::Average).merges()[2].level, 5.0);
    }

    #[test]
    fn levels_are_monotonic() {
        for linkage in [Linkage::Single, Linkage::Complete, Linkage::Average] {
            let dendrogram = cluster(linkage);
            for pair in dendrogram.merges().windows(2) {
                assert!(pair[0].level <= pair[1].level, "{linkage:?}");
            }
        }
    }

    #[test]
    fn cluster_diagram() {
        let levels = cluster(Linkage::Single).levels();

        assert_eq!(levels.len(), 3);
        assert_eq!(levels[0], (1.0, vec![vec![1, 2], vec![3], vec![4]]));
        assert_eq!(levels[1], (2.0, vec![vec![1, 2], vec![3, 4]]));
        assert_eq!(levels[2], (4.0, vec![vec![1, 2, 3, 4]]));
    }

    #[test]
    fn cut() {
        let dendrogram = cluster(Linkage::Complete);

        assert_eq!(dendrogram.clusters_at(0.5).len(), 4);
        assert_eq!(
            dendrogram.clusters_at(3.0),
            vec![vec![1, 2], vec![3, 4]]
        );
        assert_eq!(dendrogram.clusters_at(10.0), vec![vec![1, 2, 3, 4]]);
    }

    #[test]
    fn requires_confirmation() {
        let limits = Limits {
            expensive_size: 3,
            confirmed: false,
        };

        assert!(matches!(
            hierarchical_clustering(&four_points(), Linkage::Single, &limits, &mut ()),
            Err(Error::ConfirmationRequired { .. })
        ));
    }

    #[test]
    fn reports_progress() {
        let mut recorder = Recorder::default();
        hierarchical_clustering(&four_points(), Linkage::Single, &Limits::default(), &mut recorder)
            .unwrap();

        assert_eq!(recorder.calls.last(), Some(&(3, 3)));
    }

    #[test]
    fn clusters_equivalent_actors_first() {
        // 2 and 3 are structurally equivalent: both tied to 1 and 4 only.
        let graph = graph!([1, 2, 4], [1, 3, 4], [4, 5]);
        let snapshot = graph.snapshot(&AnalysisConfig::default());
        let dendrogram = snapshot
            .hierarchical_clustering(
                Measure::Hamming,
                &ProfileOptions::default().with_diagonal(true),
                Linkage::Average,
                &mut (),
            )
            .unwrap();

        let first = &dendrogram.merges()[0];
        assert_eq!(first.level, 0.0);
        assert_eq!(dendrogram.members(5), vec![2, 3]);
    }
}
