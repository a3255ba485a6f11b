//! All-pairs shortest paths, path counting and pair dependencies.
//!
//! Every source is processed with Ulrik Brandes's "A Faster Algorithm for Betweenness
//! Centrality" (BFS for unit costs, Dijkstra otherwise), which yields in a single pass the
//! distances, the number of geodesics and the dependency of the source on every other vertex.
//! Sources can be spread over worker threads; results are folded in source order so the sums
//! don't depend on scheduling.

use std::{
    cmp::Ordering,
    collections::{BTreeMap, BinaryHeap, VecDeque},
    sync::{
        atomic::{AtomicBool, Ordering as AtomicOrdering},
        mpsc, Mutex,
    },
    thread,
    time::Instant,
};

use nalgebra::DMatrix;
use tracing::debug;

use crate::{error::Result, progress::Progress};

/// Two path lengths closer than this are considered equal.
const EPSILON: f64 = 1e-9;

pub const MIN_NUM_THREADS: usize = 1;
pub const MAX_NUM_THREADS: usize = 128;

/// Outbound neighbours with their traversal cost, one list per dense vertex index.
pub(crate) type Neighbours = Vec<Vec<(usize, f64)>>;

/// The aggregated result of a shortest-path traversal from every vertex.
#[derive(Clone, Debug, PartialEq)]
pub struct PathAnalysis {
    /// `distances[(s, t)]`, infinite when `t` isn't reachable from `s`.
    pub distances: DMatrix<f64>,
    /// `geodesics[(s, t)]`, the number of shortest paths; zero on the diagonal and for unreachable
    /// pairs.
    pub geodesics: DMatrix<f64>,
    /// Sum over ordered pairs `(s, t)` of the fraction of shortest paths passing through each
    /// vertex.
    pub betweenness: Vec<f64>,
    /// Sum over ordered pairs `(s, t)` of the number of shortest paths passing through each
    /// vertex.
    pub stress: Vec<f64>,
}

/// What a single source contributes.
#[derive(Debug)]
struct SourcePaths {
    distances: Vec<f64>,
    sigma: Vec<f64>,
    dependency: Vec<f64>,
    stress: Vec<f64>,
}

/// A heap entry ordered so that `BinaryHeap` pops the shortest distance first.
#[derive(Debug, PartialEq)]
struct Candidate {
    distance: f64,
    vertex: usize,
}

impl Eq for Candidate {}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .distance
            .total_cmp(&self.distance)
            .then_with(|| other.vertex.cmp(&self.vertex))
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Single-source shortest paths: distances only.
pub(crate) fn distances_from(source: usize, neighbours: &Neighbours, weighted: bool) -> Vec<f64> {
    paths_for_source(source, neighbours, weighted).distances
}

/// Runs the traversal from every source and folds the results.
pub(crate) fn compute_paths(
    neighbours: &Neighbours,
    weighted: bool,
    num_threads: usize,
    progress: &mut Progress<'_>,
) -> Result<PathAnalysis> {
    let start = Instant::now();
    let num_nodes = neighbours.len();
    let num_threads = num_threads
        .clamp(MIN_NUM_THREADS, MAX_NUM_THREADS)
        .min(num_nodes.max(1));

    let mut analysis = PathAnalysis {
        distances: DMatrix::from_element(num_nodes, num_nodes, f64::INFINITY),
        geodesics: DMatrix::zeros(num_nodes, num_nodes),
        betweenness: vec![0.0; num_nodes],
        stress: vec![0.0; num_nodes],
    };

    if num_threads == 1 {
        for source in 0..num_nodes {
            let paths = paths_for_source(source, neighbours, weighted);
            fold(&mut analysis, source, paths);
            progress.tick()?;
        }
    } else {
        fold_parallel(&mut analysis, neighbours, weighted, num_threads, progress)?;
    }

    debug!(
        num_nodes,
        num_threads,
        weighted,
        elapsed = ?start.elapsed(),
        "computed all-pairs shortest paths"
    );

    Ok(analysis)
}

/// Spreads the sources over worker threads. Each worker grabs the next unprocessed source from
/// a shared counter until none remain. The calling thread folds the results in source order and
/// reports progress, raising the stop flag if the observer cancels.
fn fold_parallel(
    analysis: &mut PathAnalysis,
    neighbours: &Neighbours,
    weighted: bool,
    num_threads: usize,
    progress: &mut Progress<'_>,
) -> Result<()> {
    let num_nodes = neighbours.len();
    let counter = Mutex::new(0usize);
    let stop = AtomicBool::new(false);
    let (sender, receiver) = mpsc::channel::<(usize, SourcePaths)>();

    thread::scope(|scope| {
        for _ in 0..num_threads {
            let sender = sender.clone();
            let (counter, stop) = (&counter, &stop);

            scope.spawn(move || loop {
                if stop.load(AtomicOrdering::Relaxed) {
                    break;
                }

                let source = {
                    let mut counter = match counter.lock() {
                        Ok(guard) => guard,
                        Err(poisoned) => poisoned.into_inner(),
                    };
                    let source = *counter;
                    *counter += 1;
                    source
                };

                if source >= num_nodes {
                    break;
                }

                let paths = paths_for_source(source, neighbours, weighted);
                if sender.send((source, paths)).is_err() {
                    break;
                }
            });
        }

        // Only the workers hold senders now, so the receiver ends once they're all done.
        drop(sender);

        let mut pending = BTreeMap::new();
        let mut next = 0;
        for (source, paths) in receiver {
            pending.insert(source, paths);

            while let Some(paths) = pending.remove(&next) {
                fold(analysis, next, paths);
                next += 1;

                if let Err(e) = progress.tick() {
                    stop.store(true, AtomicOrdering::Relaxed);
                    return Err(e);
                }
            }
        }

        Ok(())
    })
}

fn fold(analysis: &mut PathAnalysis, source: usize, paths: SourcePaths) {
    for (target, (distance, sigma)) in paths.distances.iter().zip(&paths.sigma).enumerate() {
        analysis.distances[(source, target)] = *distance;
        if target != source {
            analysis.geodesics[(source, target)] = *sigma;
        }
    }

    for (v, (dependency, stress)) in paths.dependency.iter().zip(&paths.stress).enumerate() {
        if v != source {
            analysis.betweenness[v] += dependency;
            analysis.stress[v] += stress;
        }
    }
}

/// Brandes's single-source stage followed by the dependency accumulation.
fn paths_for_source(source: usize, neighbours: &Neighbours, weighted: bool) -> SourcePaths {
    let num_nodes = neighbours.len();

    let mut distances = vec![f64::INFINITY; num_nodes];
    let mut sigma = vec![0.0; num_nodes];
    let mut predecessors: Vec<Vec<usize>> = vec![Vec::new(); num_nodes];
    // Vertices in non-decreasing distance from the source.
    let mut stack: Vec<usize> = Vec::with_capacity(num_nodes);

    distances[source] = 0.0;
    sigma[source] = 1.0;

    if weighted {
        let mut settled = vec![false; num_nodes];
        let mut heap = BinaryHeap::new();
        heap.push(Candidate {
            distance: 0.0,
            vertex: source,
        });

        while let Some(Candidate { distance, vertex: v }) = heap.pop() {
            if settled[v] || distance > distances[v] + EPSILON {
                continue;
            }
            settled[v] = true;
            stack.push(v);

            for &(w, cost) in &neighbours[v] {
                let candidate = distances[v] + cost;
                if candidate < distances[w] - EPSILON {
                    distances[w] = candidate;
                    sigma[w] = sigma[v];
                    predecessors[w].clear();
                    predecessors[w].push(v);
                    heap.push(Candidate {
                        distance: candidate,
                        vertex: w,
                    });
                } else if !settled[w] && (candidate - distances[w]).abs() <= EPSILON {
                    sigma[w] += sigma[v];
                    predecessors[w].push(v);
                }
            }
        }
    } else {
        let mut queue: VecDeque<usize> = VecDeque::new();
        queue.push_back(source);

        while let Some(v) = queue.pop_front() {
            stack.push(v);

            for &(w, _) in &neighbours[v] {
                if distances[w].is_infinite() {
                    distances[w] = distances[v] + 1.0;
                    queue.push_back(w);
                }
                if distances[w] == distances[v] + 1.0 {
                    sigma[w] += sigma[v];
                    predecessors[w].push(v);
                }
            }
        }
    }

    // Back-propagation. `delta` is the pair dependency of the source on each vertex, `successors`
    // the number of shortest paths leaving each vertex towards every vertex behind it.
    let mut delta = vec![0.0; num_nodes];
    let mut successors = vec![0.0; num_nodes];
    let mut stress = vec![0.0; num_nodes];

    while let Some(w) = stack.pop() {
        for &v in &predecessors[w] {
            delta[v] += sigma[v] / sigma[w] * (1.0 + delta[w]);
            successors[v] += 1.0 + successors[w];
        }
        if w != source {
            stress[w] = sigma[w] * successors[w];
        }
    }

    SourcePaths {
        distances,
        sigma,
        dependency: delta,
        stress,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Builds unit-cost symmetric neighbour lists from undirected pairs.
    fn undirected(num_nodes: usize, pairs: &[(usize, usize)]) -> Neighbours {
        let mut neighbours = vec![Vec::new(); num_nodes];
        for &(a, b) in pairs {
            neighbours[a].push((b, 1.0));
            neighbours[b].push((a, 1.0));
        }
        neighbours
    }

    fn compute(neighbours: &Neighbours, weighted: bool, threads: usize) -> PathAnalysis {
        let mut observer = ();
        let mut progress = Progress::new(&mut observer, neighbours.len());
        compute_paths(neighbours, weighted, threads, &mut progress).unwrap()
    }

    #[test]
    fn line_distances() {
        let neighbours = undirected(4, &[(0, 1), (1, 2), (2, 3)]);
        let analysis = compute(&neighbours, false, 1);

        assert_eq!(analysis.distances[(0, 3)], 3.0);
        assert_eq!(analysis.distances[(3, 0)], 3.0);
        assert_eq!(analysis.distances[(2, 2)], 0.0);
        assert_eq!(analysis.geodesics[(0, 3)], 1.0);
    }

    #[test]
    fn two_shortest_paths() {
        // a - b - c and a - d - c.
        let neighbours = undirected(4, &[(0, 1), (1, 2), (0, 3), (3, 2)]);
        let analysis = compute(&neighbours, false, 1);

        assert_eq!(analysis.geodesics[(0, 2)], 2.0);
        assert_eq!(analysis.geodesics[(0, 1)], 1.0);
        assert_eq!(analysis.geodesics[(0, 0)], 0.0);
    }

    #[test]
    fn betweenness_on_a_line() {
        let neighbours = undirected(4, &[(0, 1), (1, 2), (2, 3)]);
        let analysis = compute(&neighbours, false, 1);

        // Ordered pairs count every undirected pair twice.
        assert_eq!(analysis.betweenness, vec![0.0, 4.0, 4.0, 0.0]);
        assert_eq!(analysis.stress, vec![0.0, 4.0, 4.0, 0.0]);
    }

    #[test]
    fn stress_counts_every_path() {
        // Two geodesics between 0 and 2, one through each of 1 and 3.
        let neighbours = undirected(4, &[(0, 1), (1, 2), (0, 3), (3, 2)]);
        let analysis = compute(&neighbours, false, 1);

        assert_eq!(analysis.betweenness[1], 1.0);
        assert_eq!(analysis.stress[1], 2.0);
    }

    #[test]
    fn unreachable() {
        let neighbours: Neighbours = vec![vec![(1, 1.0)], vec![], vec![]];
        let analysis = compute(&neighbours, false, 1);

        assert_eq!(analysis.distances[(0, 1)], 1.0);
        assert!(analysis.distances[(1, 0)].is_infinite());
        assert!(analysis.distances[(0, 2)].is_infinite());
        assert_eq!(analysis.geodesics[(1, 0)], 0.0);
    }

    #[test]
    fn weighted_prefers_cheaper_route() {
        // 0 -> 1 costs 5, 0 -> 2 -> 1 costs 2.
        let neighbours: Neighbours = vec![vec![(1, 5.0), (2, 1.0)], vec![], vec![(1, 1.0)]];
        let analysis = compute(&neighbours, true, 1);

        assert_eq!(analysis.distances[(0, 1)], 2.0);
        assert_eq!(analysis.geodesics[(0, 1)], 1.0);
        assert_eq!(analysis.betweenness[2], 1.0);
    }

    #[test]
    fn weighted_ties_count_both_routes() {
        let neighbours: Neighbours = vec![
            vec![(1, 1.5), (2, 0.5)],
            vec![(3, 0.5)],
            vec![(3, 1.5)],
            vec![],
        ];
        let analysis = compute(&neighbours, true, 1);

        assert_eq!(analysis.distances[(0, 3)], 2.0);
        assert_eq!(analysis.geodesics[(0, 3)], 2.0);
    }

    #[test]
    fn threads_match_inline() {
        let pairs: Vec<(usize, usize)> = (0..30)
            .flat_map(|i| [(i, (i + 1) % 30), (i, (i * 7 + 3) % 30)])
            .filter(|(a, b)| a != b)
            .collect();
        let neighbours = undirected(30, &pairs);

        let inline = compute(&neighbours, false, 1);
        let threaded = compute(&neighbours, false, 4);

        assert_eq!(inline, threaded);
    }

    #[test]
    fn distances_from_source() {
        let neighbours = undirected(3, &[(0, 1)]);

        assert_eq!(
            distances_from(0, &neighbours, false),
            vec![0.0, 1.0, f64::INFINITY]
        );
    }
}
