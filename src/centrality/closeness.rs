//! Distance-based indices: closeness, influence range closeness, eccentricity, power and
//! proximity prestige.

use nalgebra::DMatrix;

use super::{Index, Values};
use crate::{
    error::{Error, Result},
    matrix::Snapshot,
    progress::Observer,
};

/// `1 / Σ d(u, v)` over every other actor. Undefined unless every actor reaches every other.
pub(crate) fn closeness_centrality(
    snapshot: &Snapshot,
    observer: &mut dyn Observer,
) -> Result<Values> {
    let distances = &snapshot.paths_with(observer)?.distances;

    if distances.iter().any(|distance| distance.is_infinite()) {
        return Err(Error::DisconnectedGraph {
            index: Index::Closeness.name(),
        });
    }

    let raw = (0..snapshot.len())
        .map(|u| {
            let sum: f64 = distances.row(u).sum();
            if sum == 0.0 {
                0.0
            } else {
                1.0 / sum
            }
        })
        .collect();

    // The standardized form is the inverse of the mean distance.
    Ok(Values::scaled(raw, 1.0 / snapshot.len().saturating_sub(1) as f64))
}

/// Closeness over the influence range: the share of actors reachable from `u` divided by the
/// mean distance to them. Well defined on disconnected graphs.
pub(crate) fn influence_range_closeness(
    snapshot: &Snapshot,
    observer: &mut dyn Observer,
) -> Result<Values> {
    let distances = &snapshot.paths_with(observer)?.distances;
    let n = snapshot.len();
    let raw = (0..n)
        .map(|u| ranged_closeness(n, u, (0..n).map(|v| (v, distances[(u, v)]))))
        .collect();

    Ok(Values::unscaled(raw))
}

/// The inbound counterpart of influence range closeness: the share of actors that can reach
/// `u` divided by their mean distance to it.
pub(crate) fn proximity_prestige(
    snapshot: &Snapshot,
    observer: &mut dyn Observer,
) -> Result<Values> {
    let distances = &snapshot.paths_with(observer)?.distances;
    let n = snapshot.len();
    let raw = (0..n)
        .map(|u| ranged_closeness(n, u, (0..n).map(|v| (v, distances[(v, u)]))))
        .collect();

    Ok(Values::unscaled(raw))
}

/// `1 / max d(u, v)` over the actors `u` reaches; zero for actors reaching nobody.
pub(crate) fn eccentricity_centrality(
    snapshot: &Snapshot,
    observer: &mut dyn Observer,
) -> Result<Values> {
    let distances = &snapshot.paths_with(observer)?.distances;
    let raw = (0..snapshot.len())
        .map(|u| {
            let eccentricity = finite_row(distances, u).fold(0.0, f64::max);
            if eccentricity == 0.0 {
                0.0
            } else {
                1.0 / eccentricity
            }
        })
        .collect();

    Ok(Values::unscaled(raw))
}

/// Gil and Schmidt's power: the size of each `k`-th order neighbourhood divided by `k`, summed
/// over `k` (that is, the sum of the reciprocal distances). Standardized by the number of
/// actors `u` reaches, the size of its component minus one.
pub(crate) fn power_centrality(snapshot: &Snapshot, observer: &mut dyn Observer) -> Result<Values> {
    let distances = &snapshot.paths_with(observer)?.distances;
    let mut raw = Vec::with_capacity(snapshot.len());
    let mut standardized = Vec::with_capacity(snapshot.len());

    for u in 0..snapshot.len() {
        let (mut power, mut reached) = (0.0, 0usize);
        for distance in finite_row(distances, u).filter(|distance| *distance > 0.0) {
            power += 1.0 / distance;
            reached += 1;
        }

        raw.push(power);
        standardized.push(if reached == 0 {
            0.0
        } else {
            power / reached as f64
        });
    }

    Ok(Values { raw, standardized })
}

/// Finite distances from `u`, the zero distance to itself included.
fn finite_row(distances: &DMatrix<f64>, u: usize) -> impl Iterator<Item = f64> + '_ {
    (0..distances.ncols())
        .map(move |v| distances[(u, v)])
        .filter(|distance| distance.is_finite())
}

/// `(|R| / (n - 1)) / (Σ d / |R|)` over the actors `R` at a finite, non-zero distance.
fn ranged_closeness(n: usize, u: usize, distances: impl Iterator<Item = (usize, f64)>) -> f64 {
    let (mut sum, mut reached) = (0.0, 0usize);
    for (_, distance) in distances.filter(|(v, d)| *v != u && d.is_finite()) {
        sum += distance;
        reached += 1;
    }

    if reached == 0 || sum == 0.0 {
        return 0.0;
    }

    let share = reached as f64 / (n - 1) as f64;
    let mean = sum / reached as f64;

    share / mean
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalysisConfig;

    fn snapshot(graph: &crate::graph::Graph) -> Snapshot {
        graph.snapshot(&AnalysisConfig::default())
    }

    #[test]
    fn closeness_on_complete_graph() {
        let graph = graph!([1, 2, 3, 4, 5, 1], [1, 3], [1, 4], [2, 4], [2, 5], [3, 5]);
        let values = closeness_centrality(&snapshot(&graph), &mut ()).unwrap();

        assert_eq!(values.raw, vec![0.25; 5]);
        assert_eq!(values.standardized, vec![1.0; 5]);
    }

    #[test]
    fn closeness_on_a_line() {
        let graph = graph!([1, 2, 3]);
        let values = closeness_centrality(&snapshot(&graph), &mut ()).unwrap();

        assert_eq!(values.raw, vec![1.0 / 3.0, 0.5, 1.0 / 3.0]);
        assert_eq!(values.standardized[1], 1.0);
    }

    #[test]
    fn closeness_requires_connectivity() {
        let graph = graph!([1, 2, 3], [4, 5, 6]);

        assert_eq!(
            closeness_centrality(&snapshot(&graph), &mut ()),
            Err(Error::DisconnectedGraph {
                index: "closeness centrality"
            })
        );
    }

    #[test]
    fn influence_range_on_disconnected_graph() {
        let graph = graph!([1, 2, 3], [4, 5, 6]);
        let values = influence_range_closeness(&snapshot(&graph), &mut ()).unwrap();

        // The middle of each line reaches 2 of 5 actors at mean distance 1.
        assert!((values.raw[1] - 0.4).abs() < 1e-12);
        // The ends reach 2 of 5 actors at mean distance 1.5.
        assert!((values.raw[0] - 0.4 / 1.5).abs() < 1e-12);
        assert!(values.raw.iter().all(|value| value.is_finite()));
    }

    #[test]
    fn influence_range_of_an_isolate() {
        let mut graph = graph!([1, 2]);
        graph.add_vertex();
        let values = influence_range_closeness(&snapshot(&graph), &mut ()).unwrap();

        assert_eq!(values.raw[2], 0.0);
    }

    #[test]
    fn proximity_follows_inbound_ties() {
        // Everybody points at 1; 1 points nowhere.
        let graph = graph!(directed; [2, 1], [3, 1], [4, 3]);
        let values = proximity_prestige(&snapshot(&graph), &mut ()).unwrap();

        // 1 is reached by 3 of 3 actors at mean distance (1 + 1 + 2) / 3.
        assert!((values.raw[0] - 0.75).abs() < 1e-12);
        // 2 is reached by nobody.
        assert_eq!(values.raw[1], 0.0);
        // 3 is reached by 1 of 3 actors at distance 1.
        assert!((values.raw[2] - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn eccentricity() {
        let graph = graph!([1, 2, 3, 4]);
        let values = eccentricity_centrality(&snapshot(&graph), &mut ()).unwrap();

        assert_eq!(values.raw, vec![1.0 / 3.0, 0.5, 0.5, 1.0 / 3.0]);
    }

    #[test]
    fn power() {
        let graph = graph!([1, 2, 3]);
        let values = power_centrality(&snapshot(&graph), &mut ()).unwrap();

        // The ends have one actor at distance 1 and one at distance 2.
        assert_eq!(values.raw, vec![1.5, 2.0, 1.5]);
        assert_eq!(values.standardized, vec![0.75, 1.0, 0.75]);
    }
}
