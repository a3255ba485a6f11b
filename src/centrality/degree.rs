//! Degree centrality and degree prestige.

use super::Values;
use crate::matrix::Snapshot;

/// Outbound tie values of every actor, self-loops excluded.
pub(crate) fn degree_centrality(snapshot: &Snapshot) -> Values {
    let adjacency = snapshot.adjacency();
    let raw: Vec<f64> = (0..snapshot.len())
        .map(|i| {
            adjacency
                .row(i)
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .map(|(_, value)| value)
                .sum::<f64>()
        })
        .collect();

    standardize(snapshot, raw)
}

/// Inbound tie values of every actor, self-loops excluded. Equal to degree centrality on
/// undirected graphs.
pub(crate) fn degree_prestige(snapshot: &Snapshot) -> Values {
    let adjacency = snapshot.adjacency();
    let raw: Vec<f64> = (0..snapshot.len())
        .map(|j| {
            adjacency
                .column(j)
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != j)
                .map(|(_, value)| value)
                .sum::<f64>()
        })
        .collect();

    standardize(snapshot, raw)
}

/// Counts are divided by the `n - 1` possible ties; weighted sums by their maximum.
fn standardize(snapshot: &Snapshot, raw: Vec<f64>) -> Values {
    if snapshot.config().consider_weights {
        Values::relative_to_max(raw)
    } else {
        Values::scaled(raw, snapshot.len().saturating_sub(1) as f64)
    }
}
