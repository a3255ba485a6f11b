//! Random and regular network generators.
//!
//! Every generator builds a fresh [`Graph`] whose vertices are numbered from 1. Models whose ties
//! are symmetric by construction (ring lattices, small worlds, regular and grid lattices) produce
//! reciprocated pairs of arcs when asked for a directed graph. Randomized models take any
//! [`Rng`], so a seeded generator reproduces the same network.
//!
//! ```
//! use rand::{rngs::StdRng, SeedableRng};
//! use sociogram::generate::{erdos_renyi_gnm, GeneratorOptions};
//!
//! let mut rng = StdRng::seed_from_u64(7);
//! let graph = erdos_renyi_gnm(10, 12, &GeneratorOptions::default(), &mut rng).unwrap();
//!
//! assert_eq!(graph.vertex_count(), 10);
//! assert_eq!(graph.edge_count(), 12);
//! ```

use std::{collections::BTreeSet, time::Instant};

use rand::{
    distributions::{Distribution, WeightedIndex},
    seq::index,
    Rng,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    error::{Error, Result},
    graph::Graph,
    vertex::VertexId,
};

/// Output settings shared by every generator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorOptions {
    pub directed: bool,
    /// Give every actor a self-loop (or, for Erdős–Rényi models, let loops be drawn).
    pub diagonal: bool,
}

impl GeneratorOptions {
    pub const fn with_directed(mut self, directed: bool) -> Self {
        self.directed = directed;
        self
    }

    pub const fn with_diagonal(mut self, diagonal: bool) -> Self {
        self.diagonal = diagonal;
        self
    }
}

/// Parameters of the Barabási–Albert preferential attachment model.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BarabasiAlbert {
    /// Size of the complete seed network.
    pub initial: usize,
    /// Ties each new actor makes; at most `initial`.
    pub edges_per_step: usize,
    /// Exponent applied to the attractiveness of an actor; 1 is linear attachment.
    pub power: f64,
    /// Attractiveness of an actor without ties.
    pub zero_appeal: f64,
}

impl Default for BarabasiAlbert {
    fn default() -> Self {
        Self {
            initial: 2,
            edges_per_step: 1,
            power: 1.0,
            zero_appeal: 1.0,
        }
    }
}

/// Erdős–Rényi `G(n, p)`: every possible tie exists independently with probability `p`.
///
/// Directed graphs draw each arc separately.
pub fn erdos_renyi_gnp(
    n: usize,
    p: f64,
    options: &GeneratorOptions,
    rng: &mut impl Rng,
) -> Result<Graph> {
    if !(0.0..=1.0).contains(&p) {
        return Err(Error::invalid(format!("probability {p} is outside [0, 1]")));
    }

    let start = Instant::now();
    let mut graph = with_vertices(n, options.directed);

    for (source, target) in possible_ties(n, options) {
        if rng.gen_bool(p) {
            add_arc(&mut graph, source, target);
        }
    }

    info!(
        model = "G(n, p)",
        n,
        p,
        edges = graph.edge_count(),
        elapsed = ?start.elapsed(),
        "generated network"
    );

    Ok(graph)
}

/// Erdős–Rényi `G(n, M)`: exactly `m` ties drawn uniformly from the possible ones.
pub fn erdos_renyi_gnm(
    n: usize,
    m: usize,
    options: &GeneratorOptions,
    rng: &mut impl Rng,
) -> Result<Graph> {
    let candidates = possible_ties(n, options);
    if m > candidates.len() {
        return Err(Error::invalid(format!(
            "cannot draw {m} ties from {} possible ones",
            candidates.len()
        )));
    }

    let start = Instant::now();
    let mut graph = with_vertices(n, options.directed);

    for position in index::sample(rng, candidates.len(), m) {
        let (source, target) = candidates[position];
        add_arc(&mut graph, source, target);
    }

    info!(model = "G(n, M)", n, m, elapsed = ?start.elapsed(), "generated network");

    Ok(graph)
}

/// A ring lattice: actors on a line (or a circle when `circular`), each tied to the `degree / 2`
/// nearest actors on either side.
pub fn ring_lattice(
    n: usize,
    degree: usize,
    circular: bool,
    options: &GeneratorOptions,
) -> Result<Graph> {
    let ties = Ties::ring(n, degree, circular)?;

    Ok(ties.into_graph(options))
}

/// Watts and Strogatz's small world: a circular ring lattice whose ties are each rewired, with
/// probability `beta`, to a uniformly drawn actor not yet tied to the same end.
pub fn watts_strogatz(
    n: usize,
    degree: usize,
    beta: f64,
    options: &GeneratorOptions,
    rng: &mut impl Rng,
) -> Result<Graph> {
    if !(0.0..=1.0).contains(&beta) {
        return Err(Error::invalid(format!(
            "rewiring probability {beta} is outside [0, 1]"
        )));
    }

    let start = Instant::now();
    let mut ties = Ties::ring(n, degree, true)?;

    for i in 0..n {
        for k in 1..=degree / 2 {
            let j = (i + k) % n;
            if !ties.contains(i, j) || !rng.gen_bool(beta) {
                continue;
            }

            let free: Vec<usize> = (0..n).filter(|&t| t != i && !ties.contains(i, t)).collect();
            if free.is_empty() {
                continue;
            }

            let target = free[rng.gen_range(0..free.len())];
            ties.remove(i, j);
            ties.insert(i, target);
        }
    }

    info!(model = "small world", n, degree, beta, elapsed = ?start.elapsed(), "generated network");

    Ok(ties.into_graph(options))
}

/// A random `degree`-regular network: a circular ring lattice shuffled by degree-preserving
/// double-edge swaps. `degree` must be even and below `n`.
pub fn regular(
    n: usize,
    degree: usize,
    options: &GeneratorOptions,
    rng: &mut impl Rng,
) -> Result<Graph> {
    let start = Instant::now();
    let mut ties = Ties::ring(n, degree, true)?;
    let mut edges: Vec<(usize, usize)> = ties.pairs.iter().copied().collect();

    if edges.len() >= 2 {
        for _ in 0..10 * edges.len() {
            let first = rng.gen_range(0..edges.len());
            let second = rng.gen_range(0..edges.len());
            if first == second {
                continue;
            }

            let (a, b) = edges[first];
            let (c, d) = if rng.gen_bool(0.5) {
                edges[second]
            } else {
                (edges[second].1, edges[second].0)
            };

            // a-b, c-d becomes a-d, c-b.
            let distinct = a != c && a != d && b != c && b != d;
            if !distinct || ties.contains(a, d) || ties.contains(c, b) {
                continue;
            }

            ties.remove(a, b);
            ties.remove(c, d);
            ties.insert(a, d);
            ties.insert(c, b);
            edges[first] = (a, d);
            edges[second] = (c, b);
        }
    }

    info!(model = "regular", n, degree, elapsed = ?start.elapsed(), "generated network");

    Ok(ties.into_graph(options))
}

/// Barabási and Albert's scale-free network.
///
/// Starts from a complete network of `initial` actors. Each new actor then ties to
/// `edges_per_step` distinct existing actors, each drawn with probability proportional to
/// `(degree + zero_appeal) ^ power`. In directed graphs the arcs point from the new actor.
pub fn barabasi_albert(
    n: usize,
    params: &BarabasiAlbert,
    options: &GeneratorOptions,
    rng: &mut impl Rng,
) -> Result<Graph> {
    let BarabasiAlbert {
        initial,
        edges_per_step,
        power,
        zero_appeal,
    } = *params;

    if initial == 0 || initial > n {
        return Err(Error::invalid(format!(
            "the seed network needs between 1 and {n} actors, got {initial}"
        )));
    }
    if edges_per_step == 0 || edges_per_step > initial {
        return Err(Error::invalid(format!(
            "each step needs between 1 and {initial} ties, got {edges_per_step}"
        )));
    }
    if !power.is_finite() || power < 0.0 || !zero_appeal.is_finite() || zero_appeal < 0.0 {
        return Err(Error::invalid(
            "power and zero appeal must be finite and non-negative",
        ));
    }

    let start = Instant::now();
    let mut graph = with_vertices(n, options.directed);
    let mut degrees = vec![0.0f64; n];

    for a in 0..initial {
        for b in a + 1..initial {
            tie(&mut graph, a, b);
            degrees[a] += 1.0;
            degrees[b] += 1.0;
        }
    }

    for new in initial..n {
        let mut weights: Vec<f64> = degrees[..new]
            .iter()
            .map(|degree| (degree + zero_appeal).powf(power))
            .collect();

        let mut chosen = vec![false; new];

        for _ in 0..edges_per_step {
            let target = match WeightedIndex::new(&weights) {
                Ok(distribution) => distribution.sample(rng),
                // Every remaining weight is zero: fall back to a uniform draw.
                Err(_) => {
                    let remaining: Vec<usize> = (0..new).filter(|&i| !chosen[i]).collect();
                    remaining[rng.gen_range(0..remaining.len())]
                }
            };
            chosen[target] = true;

            if options.directed {
                add_arc(&mut graph, new, target);
            } else {
                tie(&mut graph, new, target);
            }
            degrees[new] += 1.0;
            degrees[target] += 1.0;

            // Drawn without replacement.
            weights[target] = 0.0;
        }
    }

    if options.diagonal {
        for i in 0..n {
            add_arc(&mut graph, i, i);
        }
    }

    info!(model = "scale free", n, ?params, elapsed = ?start.elapsed(), "generated network");

    Ok(graph)
}

/// An `n`-dimensional grid lattice with the given side lengths. Actors are tied to every actor
/// within Manhattan distance `radius`; `circular` wraps each dimension into a ring.
pub fn lattice(
    sides: &[usize],
    radius: usize,
    circular: bool,
    options: &GeneratorOptions,
) -> Result<Graph> {
    if sides.is_empty() || sides.contains(&0) {
        return Err(Error::invalid("every lattice dimension needs at least one actor"));
    }
    if radius == 0 {
        return Err(Error::invalid("the neighbourhood radius must be positive"));
    }

    let n = sides
        .iter()
        .try_fold(1usize, |product, &side| product.checked_mul(side))
        .ok_or_else(|| Error::invalid("lattice is too large"))?;

    let coordinates: Vec<Vec<usize>> = (0..n)
        .map(|mut i| {
            sides
                .iter()
                .map(|&side| {
                    let coordinate = i % side;
                    i /= side;
                    coordinate
                })
                .collect()
        })
        .collect();

    let mut ties = Ties::new(n);
    for a in 0..n {
        for b in a + 1..n {
            let distance: usize = coordinates[a]
                .iter()
                .zip(&coordinates[b])
                .zip(sides)
                .map(|((&x, &y), &side)| {
                    let gap = x.abs_diff(y);
                    if circular {
                        gap.min(side - gap)
                    } else {
                        gap
                    }
                })
                .sum();

            if distance <= radius {
                ties.insert(a, b);
            }
        }
    }

    Ok(ties.into_graph(options))
}

/// Undirected ties between dense indices, kept as ordered pairs `(low, high)`.
struct Ties {
    n: usize,
    pairs: BTreeSet<(usize, usize)>,
}

impl Ties {
    fn new(n: usize) -> Self {
        Self {
            n,
            pairs: BTreeSet::new(),
        }
    }

    fn ring(n: usize, degree: usize, circular: bool) -> Result<Self> {
        if degree % 2 != 0 {
            return Err(Error::invalid(format!("degree must be even, got {degree}")));
        }
        if degree >= n.max(1) {
            return Err(Error::invalid(format!(
                "degree {degree} needs more than {n} actors"
            )));
        }

        let mut ties = Self::new(n);
        for i in 0..n {
            for k in 1..=degree / 2 {
                let j = i + k;
                if j < n {
                    ties.insert(i, j);
                } else if circular {
                    ties.insert(i, j - n);
                }
            }
        }

        Ok(ties)
    }

    fn key(a: usize, b: usize) -> (usize, usize) {
        (a.min(b), a.max(b))
    }

    fn contains(&self, a: usize, b: usize) -> bool {
        self.pairs.contains(&Self::key(a, b))
    }

    fn insert(&mut self, a: usize, b: usize) {
        self.pairs.insert(Self::key(a, b));
    }

    fn remove(&mut self, a: usize, b: usize) {
        self.pairs.remove(&Self::key(a, b));
    }

    fn into_graph(self, options: &GeneratorOptions) -> Graph {
        let mut graph = with_vertices(self.n, options.directed);

        for (a, b) in self.pairs {
            tie(&mut graph, a, b);
        }

        if options.diagonal {
            for i in 0..self.n {
                add_arc(&mut graph, i, i);
            }
        }

        graph
    }
}

fn with_vertices(n: usize, directed: bool) -> Graph {
    let mut graph = Graph::new(directed);
    for _ in 0..n {
        graph.add_vertex();
    }
    graph
}

/// Dense index `i` is vertex `i + 1`.
fn vertex(i: usize) -> VertexId {
    i as VertexId + 1
}

/// Adds one arc (or one undirected tie in undirected graphs).
fn add_arc(graph: &mut Graph, a: usize, b: usize) {
    // Safety: generators only address the vertices they created.
    let _ = graph.add_edge(vertex(a), vertex(b), 1.0);
}

/// Adds a symmetric tie: both arcs in directed graphs.
fn tie(graph: &mut Graph, a: usize, b: usize) {
    add_arc(graph, a, b);
    if graph.is_directed() {
        add_arc(graph, b, a);
    }
}

/// Every tie a graph of `n` actors could hold: ordered pairs when directed, unordered ones
/// otherwise, plus self-loops with `diagonal`.
fn possible_ties(n: usize, options: &GeneratorOptions) -> Vec<(usize, usize)> {
    let mut candidates = Vec::new();

    for a in 0..n {
        if options.diagonal {
            candidates.push((a, a));
        }

        let targets = if options.directed { 0..n } else { a + 1..n };
        candidates.extend(targets.filter(|&b| b != a).map(|b| (a, b)));
    }

    candidates
}
