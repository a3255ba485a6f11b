//! Indices derived from the spectrum or the inverse of a matrix built from the adjacency
//! matrix: information centrality and eigenvector centrality.

use std::collections::VecDeque;

use nalgebra::{DMatrix, DVector};
use tracing::{debug, warn};

use super::Values;
use crate::{
    error::{Error, Result},
    matrix::{invert, Snapshot},
};

/// Stephenson and Zelen's information centrality.
///
/// Ties are read as undirected. With `w(i, j)` the tie value, the matrix `M` holds
/// `1 + Σ w(i, ·)` on the diagonal and `1 - w(i, j)` elsewhere (`1` where there's no tie).
/// From its inverse `C`, with `T` the trace and `R` a row sum, an actor's information is
/// `1 / (C[i][i] + (T - 2R) / n)`. Standardized scores are shares of the total.
///
/// `M` is singular unless the network is connected, in which case this fails with
/// [`Error::SingularMatrix`].
pub(crate) fn information_centrality(snapshot: &Snapshot) -> Result<Values> {
    let n = snapshot.len();
    snapshot.config().limits.check("information centrality", n)?;

    if n < 2 {
        return Ok(Values::unscaled(vec![0.0; n]));
    }

    if !tied_component_spans(snapshot) {
        return Err(Error::SingularMatrix);
    }

    let adjacency = snapshot.adjacency();
    let mut m = DMatrix::<f64>::from_element(n, n, 1.0);

    for i in 0..n {
        let mut degree = 0.0;
        for j in (0..n).filter(|&j| snapshot.tied(i, j)) {
            let weight = if adjacency[(i, j)] != 0.0 {
                adjacency[(i, j)]
            } else {
                adjacency[(j, i)]
            };
            m[(i, j)] = 1.0 - weight;
            degree += weight;
        }
        m[(i, i)] = 1.0 + degree;
    }

    let c = invert(&m)?;
    let trace = c.trace();

    let raw: Vec<f64> = (0..n)
        .map(|i| {
            let row_sum: f64 = c.row(i).sum();
            1.0 / (c[(i, i)] + (trace - 2.0 * row_sum) / n as f64)
        })
        .collect();

    let total = raw.iter().sum::<f64>();

    Ok(Values::scaled(raw, total))
}

/// The component of the principal eigenvector of the adjacency matrix, by power iteration.
///
/// Iterates `x ← (Aᵗ + I) x`, which has the same principal eigenvector as `Aᵗ` but doesn't
/// oscillate on bipartite networks. Isolates score zero.
pub(crate) fn eigenvector_centrality(snapshot: &Snapshot) -> Result<Values> {
    let n = snapshot.len();
    let config = snapshot.config();
    config.validate()?;

    let mut x = DVector::<f64>::from_iterator(
        n,
        (0..n).map(|i| {
            if (0..n).any(|j| snapshot.tied(i, j)) {
                1.0
            } else {
                0.0
            }
        }),
    );

    let norm = x.norm();
    if norm == 0.0 {
        return Ok(Values::unscaled(vec![0.0; n]));
    }
    x /= norm;

    let transpose = snapshot.adjacency().transpose();
    let mut converged = false;

    for iteration in 0..config.max_iterations {
        let mut next = &transpose * &x + &x;
        let norm = next.norm();
        if norm == 0.0 {
            break;
        }
        next /= norm;

        let change = (&next - &x).amax();
        x = next;

        if change < config.tolerance {
            debug!(iteration, "eigenvector centrality converged");
            converged = true;
            break;
        }
    }

    if !converged {
        warn!(
            max_iterations = config.max_iterations,
            "eigenvector centrality did not converge"
        );
    }

    Ok(Values::relative_to_max(x.iter().copied().collect()))
}

/// Whether every actor can reach every other one when ties are read as undirected.
fn tied_component_spans(snapshot: &Snapshot) -> bool {
    let n = snapshot.len();
    let mut seen = vec![false; n];
    let mut queue = VecDeque::from([0]);
    seen[0] = true;

    while let Some(i) = queue.pop_front() {
        for j in 0..n {
            if !seen[j] && snapshot.tied(i, j) {
                seen[j] = true;
                queue.push_back(j);
            }
        }
    }

    seen.into_iter().all(|seen| seen)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalysisConfig;

    const TOLERANCE: f64 = 1e-8;

    #[test]
    fn information_on_a_triangle() {
        let graph = graph!([1, 2, 3, 1]);
        let snapshot = graph.snapshot(&AnalysisConfig::default());
        let values = information_centrality(&snapshot).unwrap();

        // M = 3I, so C = I / 3 and every actor scores 1 / (1/3 + (1 - 2/3) / 3).
        for (raw, standardized) in values.raw.iter().zip(&values.standardized) {
            assert!((raw - 2.25).abs() < TOLERANCE);
            assert!((standardized - 1.0 / 3.0).abs() < TOLERANCE);
        }
    }

    #[test]
    fn information_favours_the_middle() {
        let graph = graph!([1, 2, 3]);
        let snapshot = graph.snapshot(&AnalysisConfig::default());
        let values = information_centrality(&snapshot).unwrap();

        assert!(values.raw[1] > values.raw[0]);
        assert!((values.raw[0] - values.raw[2]).abs() < TOLERANCE);
        assert!((values.standardized.iter().sum::<f64>() - 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn information_reads_arcs_as_ties() {
        let directed = graph!(directed; [1, 2, 3]);
        let undirected = graph!([1, 2, 3]);
        let config = AnalysisConfig::default();

        assert_eq!(
            information_centrality(&directed.snapshot(&config)),
            information_centrality(&undirected.snapshot(&config))
        );
    }

    #[test]
    fn information_on_disconnected_network() {
        let mut graph = graph!([1, 2, 3]);
        graph.add_vertex();

        assert_eq!(
            information_centrality(&graph.snapshot(&AnalysisConfig::default())),
            Err(Error::SingularMatrix)
        );

        // Dropping the isolate leaves a connected network.
        let config = AnalysisConfig::new().with_drop_isolates(true);
        assert!(information_centrality(&graph.snapshot(&config)).is_ok());
    }

    #[test]
    fn information_requires_confirmation() {
        let graph = graph!([1, 2, 3, 4]);
        let config = AnalysisConfig::new().with_expensive_size(3);

        assert!(matches!(
            information_centrality(&graph.snapshot(&config)),
            Err(Error::ConfirmationRequired { .. })
        ));
    }

    #[test]
    fn eigenvector_on_a_star() {
        let graph = graph!([1, 2], [1, 3], [1, 4], [1, 5]);
        let snapshot = graph.snapshot(&AnalysisConfig::default());
        let values = eigenvector_centrality(&snapshot).unwrap();

        // The principal eigenvalue is 2: the hub scores twice as much as each leaf.
        assert!((values.raw[0] - 1.0 / 2f64.sqrt()).abs() < TOLERANCE);
        assert!((values.standardized[0] - 1.0).abs() < TOLERANCE);
        for leaf in 1..5 {
            assert!((values.standardized[leaf] - 0.5).abs() < TOLERANCE);
        }
    }

    #[test]
    fn eigenvector_isolates_score_zero() {
        let mut graph = graph!([1, 2, 3]);
        graph.add_vertex();
        let values = eigenvector_centrality(&graph.snapshot(&AnalysisConfig::default())).unwrap();

        assert_eq!(values.raw[3], 0.0);
        assert!(values.raw.iter().all(|value| *value >= 0.0));
    }

    #[test]
    fn eigenvector_without_ties() {
        let mut graph = crate::graph::Graph::undirected();
        graph.add_vertex();
        graph.add_vertex();
        let values = eigenvector_centrality(&graph.snapshot(&AnalysisConfig::default())).unwrap();

        assert_eq!(values.raw, vec![0.0, 0.0]);
    }

    #[test]
    fn eigenvector_on_a_directed_cycle() {
        let graph = graph!(directed; [1, 2, 3, 1]);
        let values = eigenvector_centrality(&graph.snapshot(&AnalysisConfig::default())).unwrap();

        for standardized in values.standardized {
            assert!((standardized - 1.0).abs() < TOLERANCE);
        }
    }

    #[test]
    fn eigenvector_rejects_zero_tolerance() {
        let graph = graph!([1, 2, 3, 1]);
        let config = AnalysisConfig::new().with_tolerance(0.0);

        assert!(matches!(
            eigenvector_centrality(&graph.snapshot(&config)),
            Err(crate::error::Error::InvalidParameter(_))
        ));
    }
}
