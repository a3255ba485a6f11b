//! PageRank prestige.

use tracing::{debug, warn};

use super::Values;
use crate::{error::Result, matrix::Snapshot};

/// The fixed point of `x = (1 - d) / n + d Mᵗ x`, where `M` divides every tie by the sender's
/// total outbound tie value.
///
/// Actors without outbound ties spread their score evenly over everybody, so the scores always
/// sum to one. Iteration stops once the L1 change drops below the configured tolerance.
pub(crate) fn pagerank_prestige(snapshot: &Snapshot) -> Result<Values> {
    let config = snapshot.config();
    config.validate()?;

    let n = snapshot.len();
    if n == 0 {
        return Ok(Values::default());
    }

    let damping = config.damping_factor;
    let adjacency = snapshot.adjacency();

    // Outbound ties per sender, normalized by the sender's total; self-loops excluded.
    let mut out_links: Vec<Vec<(usize, f64)>> = vec![Vec::new(); n];
    for (u, links) in out_links.iter_mut().enumerate() {
        let total: f64 = (0..n)
            .filter(|&v| v != u)
            .map(|v| adjacency[(u, v)].max(0.0))
            .sum();

        if total > 0.0 {
            links.extend(
                (0..n)
                    .filter(|&v| v != u && adjacency[(u, v)] > 0.0)
                    .map(|v| (v, adjacency[(u, v)] / total)),
            );
        }
    }

    let base = (1.0 - damping) / n as f64;
    let mut ranks = vec![1.0 / n as f64; n];
    let mut converged = false;

    for iteration in 0..config.max_iterations {
        let dangling: f64 = out_links
            .iter()
            .zip(&ranks)
            .filter(|(links, _)| links.is_empty())
            .map(|(_, rank)| rank)
            .sum();

        let mut next = vec![base + damping * dangling / n as f64; n];
        for (u, links) in out_links.iter().enumerate() {
            for &(v, share) in links {
                next[v] += damping * ranks[u] * share;
            }
        }

        let change: f64 = next.iter().zip(&ranks).map(|(a, b)| (a - b).abs()).sum();
        ranks = next;

        if change < config.tolerance {
            debug!(iteration, "pagerank converged");
            converged = true;
            break;
        }
    }

    if !converged {
        warn!(
            max_iterations = config.max_iterations,
            "pagerank did not converge"
        );
    }

    Ok(Values::relative_to_max(ranks))
}
