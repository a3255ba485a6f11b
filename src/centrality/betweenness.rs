//! Betweenness and stress centrality, both read off the cached shortest-path pass.

use super::Values;
use crate::{error::Result, matrix::Snapshot, progress::Observer};

/// The summed fraction of shortest paths between other pairs passing through each actor.
///
/// Standardized by the number of pairs not involving the actor, `(n - 1)(n - 2)` ordered pairs
/// on directed graphs and half as many on undirected ones.
pub(crate) fn betweenness_centrality(
    snapshot: &Snapshot,
    observer: &mut dyn Observer,
) -> Result<Values> {
    let paths = snapshot.paths_with(observer)?;
    let raw = per_pair(snapshot, &paths.betweenness);

    let n = snapshot.len();
    let mut pairs = (n.saturating_sub(1) * n.saturating_sub(2)) as f64;
    if !snapshot.is_directed() {
        pairs /= 2.0;
    }

    Ok(Values::scaled(raw, pairs))
}

/// The number of shortest paths between other pairs passing through each actor.
pub(crate) fn stress_centrality(
    snapshot: &Snapshot,
    observer: &mut dyn Observer,
) -> Result<Values> {
    let paths = snapshot.paths_with(observer)?;
    let raw = per_pair(snapshot, &paths.stress);

    Ok(Values::relative_to_max(raw))
}

/// Path sums run over ordered pairs; undirected graphs count each pair twice.
fn per_pair(snapshot: &Snapshot, sums: &[f64]) -> Vec<f64> {
    if snapshot.is_directed() {
        sums.to_vec()
    } else {
        sums.iter().map(|sum| sum / 2.0).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::AnalysisConfig, progress::tests::Recorder};

    #[test]
    fn star() {
        let graph = graph!([1, 2], [1, 3], [1, 4], [1, 5]);
        let snapshot = graph.snapshot(&AnalysisConfig::default());
        let values = betweenness_centrality(&snapshot, &mut ()).unwrap();

        assert_eq!(values.raw, vec![6.0, 0.0, 0.0, 0.0, 0.0]);
        assert_eq!(values.standardized, vec![1.0, 0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn split_geodesics() {
        // Two geodesics from 1 to 3, one through each of 2 and 4.
        let graph = graph!([1, 2, 3, 4, 1]);
        let snapshot = graph.snapshot(&AnalysisConfig::default());
        let values = betweenness_centrality(&snapshot, &mut ()).unwrap();

        assert_eq!(values.raw, vec![0.5; 4]);
    }

    #[test]
    fn directed_line() {
        let graph = graph!(directed; [1, 2, 3]);
        let snapshot = graph.snapshot(&AnalysisConfig::default());
        let values = betweenness_centrality(&snapshot, &mut ()).unwrap();

        assert_eq!(values.raw, vec![0.0, 1.0, 0.0]);
        assert_eq!(values.standardized, vec![0.0, 0.5, 0.0]);
    }

    #[test]
    fn stress_counts_paths() {
        // 1 reaches 5 through either 2 or 3; 4 hangs off 5.
        let graph = graph!([1, 2, 5], [1, 3, 5], [5, 4]);
        let snapshot = graph.snapshot(&AnalysisConfig::default());
        let values = stress_centrality(&snapshot, &mut ()).unwrap();

        let betweenness = betweenness_centrality(&snapshot, &mut ()).unwrap();

        // 5 sits on both geodesics 1-4, on 2-4 and 3-4, and on one of the two 2-3 geodesics.
        let five = 4;
        assert_eq!(values.raw[five], 5.0);
        assert_eq!(betweenness.raw[five], 3.5);
        assert_eq!(values.standardized[five], 1.0);
    }

    #[test]
    fn cancellation() {
        let graph = graph!([1, 2, 3, 4, 5, 6]);
        let snapshot = graph.snapshot(&AnalysisConfig::default());
        let mut recorder = Recorder {
            cancel_after: Some(1),
            ..Default::default()
        };

        assert_eq!(
            betweenness_centrality(&snapshot, &mut recorder),
            Err(crate::error::Error::Cancelled)
        );
    }
}
