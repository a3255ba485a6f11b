//! Matrix representations of a graph and the distance algebra built on them.
//!
//! Every analysis runs on a [`Snapshot`]: a read-only, densely indexed view of the current
//! relation, taken with an explicit [`AnalysisConfig`]. Expensive derived structures (the
//! all-pairs shortest paths) are computed once per snapshot and cached.

mod paths;

use std::{cell::OnceCell, collections::BTreeMap, fmt, time::Instant};

use nalgebra::DMatrix;
use tracing::{debug, info};

pub use self::paths::PathAnalysis;
pub(crate) use self::paths::Neighbours;
use self::paths::{compute_paths, distances_from};
use crate::{
    config::AnalysisConfig,
    error::{Error, Result},
    graph::Graph,
    progress::{Observer, Progress},
    vertex::VertexId,
};

/// A square matrix whose rows and columns are labelled by vertex id.
#[derive(Clone, Debug, PartialEq)]
pub struct LabeledMatrix {
    ids: Vec<VertexId>,
    matrix: DMatrix<f64>,
}

impl LabeledMatrix {
    /// Labels a square matrix, one id per row and column.
    pub fn new(ids: Vec<VertexId>, matrix: DMatrix<f64>) -> Result<Self> {
        if matrix.nrows() != ids.len() || matrix.ncols() != ids.len() {
            return Err(Error::invalid(format!(
                "{} labels for a {}x{} matrix",
                ids.len(),
                matrix.nrows(),
                matrix.ncols()
            )));
        }

        Ok(Self { ids, matrix })
    }

    /// For matrices built from the ids themselves, square by construction.
    pub(crate) fn from_parts(ids: Vec<VertexId>, matrix: DMatrix<f64>) -> Self {
        debug_assert_eq!(ids.len(), matrix.nrows());
        debug_assert_eq!(ids.len(), matrix.ncols());

        Self { ids, matrix }
    }

    /// Returns the row and column labels.
    pub fn ids(&self) -> &[VertexId] {
        &self.ids
    }

    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.matrix
    }

    pub fn into_matrix(self) -> DMatrix<f64> {
        self.matrix
    }

    /// Returns the entry at the row labelled `row` and the column labelled `col`.
    pub fn get(&self, row: VertexId, col: VertexId) -> Option<f64> {
        let i = self.ids.iter().position(|id| *id == row)?;
        let j = self.ids.iter().position(|id| *id == col)?;

        Some(self.matrix[(i, j)])
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl fmt::Display for LabeledMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>8}", "")?;
        for id in &self.ids {
            write!(f, " {id:>8}")?;
        }
        writeln!(f)?;

        for (i, id) in self.ids.iter().enumerate() {
            write!(f, "{id:>8}")?;
            for j in 0..self.ids.len() {
                let value = self.matrix[(i, j)];
                if value.is_infinite() {
                    write!(f, " {:>8}", "\u{221e}")?;
                } else {
                    write!(f, " {value:>8.3}")?;
                }
            }
            writeln!(f)?;
        }

        Ok(())
    }
}

/// Inverts a square matrix with an LU decomposition.
///
/// # Examples
///
/// ```
/// use nalgebra::dmatrix;
/// use sociogram::matrix::invert;
///
/// let inverse = invert(&dmatrix![2.0, 0.0; 0.0, 4.0]).unwrap();
/// assert_eq!(inverse, dmatrix![0.5, 0.0; 0.0, 0.25]);
///
/// assert!(invert(&dmatrix![1.0, 2.0; 2.0, 4.0]).is_err());
/// ```
pub fn invert(matrix: &DMatrix<f64>) -> Result<DMatrix<f64>> {
    if !matrix.is_square() {
        return Err(Error::invalid(format!(
            "cannot invert a {}x{} matrix",
            matrix.nrows(),
            matrix.ncols()
        )));
    }

    let inverse = matrix
        .clone()
        .lu()
        .try_inverse()
        .ok_or(Error::SingularMatrix)?;

    // Pivots that are tiny but non-zero blow up instead of failing.
    if inverse.iter().any(|value| !value.is_finite()) {
        return Err(Error::SingularMatrix);
    }

    Ok(inverse)
}

/// A read-only dense view of a graph's current relation.
///
/// # Examples
///
/// ```
/// use nalgebra::dmatrix;
/// use sociogram::{config::AnalysisConfig, graph::Graph};
///
/// let mut graph = Graph::undirected();
/// let (a, b, c) = (graph.add_vertex(), graph.add_vertex(), graph.add_vertex());
/// graph.add_edge(a, b, 1.0).unwrap();
/// graph.add_edge(a, c, 1.0).unwrap();
///
/// let snapshot = graph.snapshot(&AnalysisConfig::default());
///
/// // Matrices can be pretty printed...
/// println!("{}", snapshot.laplacian_matrix());
/// assert_eq!(
///     snapshot.laplacian_matrix().into_matrix(),
///     dmatrix![ 2.0, -1.0, -1.0;
///              -1.0,  1.0,  0.0;
///              -1.0,  0.0,  1.0]
/// );
/// assert_eq!(snapshot.distance_matrix().get(b, c), Some(2.0));
/// ```
#[derive(Debug)]
pub struct Snapshot {
    directed: bool,
    config: AnalysisConfig,
    /// Vertex ids in ascending order; position in this vector is the dense index.
    ids: Vec<VertexId>,
    index: BTreeMap<VertexId, usize>,
    /// Tie values: weights when they're considered, ones otherwise.
    adjacency: DMatrix<f64>,
    /// Outbound neighbours with traversal costs, self-loops excluded.
    outbound: Neighbours,
    /// Inbound neighbours with traversal costs, self-loops excluded.
    inbound: Neighbours,
    /// Whether distances need Dijkstra rather than BFS.
    weighted: bool,
    /// Cache of the all-pairs shortest paths.
    paths: OnceCell<PathAnalysis>,
}

impl Snapshot {
    /// Takes a snapshot of the graph's current relation.
    pub fn new(graph: &Graph, config: &AnalysisConfig) -> Self {
        let start = Instant::now();

        let ids: Vec<VertexId> = graph
            .vertices()
            .map(|vertex| vertex.id())
            .filter(|id| !(config.drop_isolates && graph.is_isolated(*id)))
            .collect();

        let index: BTreeMap<VertexId, usize> =
            ids.iter().enumerate().map(|(i, &id)| (id, i)).collect();

        let n = ids.len();
        let mut adjacency = DMatrix::<f64>::zeros(n, n);
        let mut outbound: Neighbours = vec![Vec::new(); n];
        let mut inbound: Neighbours = vec![Vec::new(); n];
        let mut weighted = false;

        for edge in graph.arcs() {
            // Ties touching a dropped isolate can only be self-loops.
            let (Some(&i), Some(&j)) = (index.get(&edge.source()), index.get(&edge.target()))
            else {
                continue;
            };

            let value = if config.consider_weights {
                edge.weight
            } else {
                1.0
            };
            adjacency[(i, j)] = value;

            if i == j {
                continue;
            }

            let cost = if !config.consider_weights {
                1.0
            } else if config.inverse_weights {
                1.0 / edge.weight.abs()
            } else {
                edge.weight.abs()
            };

            // Weights are non-zero, so only a subnormal read as strength overflows here.
            if !cost.is_finite() {
                continue;
            }

            weighted |= cost != 1.0;
            outbound[i].push((j, cost));
            inbound[j].push((i, cost));
        }

        debug!(
            vertices = n,
            directed = graph.is_directed(),
            weighted,
            elapsed = ?start.elapsed(),
            "took snapshot"
        );

        Self {
            directed: graph.is_directed(),
            config: config.clone(),
            ids,
            index,
            adjacency,
            outbound,
            inbound,
            weighted,
            paths: OnceCell::new(),
        }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn is_directed(&self) -> bool {
        self.directed
    }

    /// Returns the number of vertices in the snapshot.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Returns the vertex ids in dense index order.
    pub fn ids(&self) -> &[VertexId] {
        &self.ids
    }

    /// Returns the dense index of a vertex.
    pub fn index_of(&self, id: VertexId) -> Result<usize> {
        self.index.get(&id).copied().ok_or(Error::VertexNotFound(id))
    }

    //
    // Adjacency algebra
    //

    /// Constructs the adjacency matrix: the tie value where a tie exists, zero elsewhere.
    pub fn adjacency_matrix(&self) -> LabeledMatrix {
        self.labeled(self.adjacency.clone())
    }

    pub fn transpose_matrix(&self) -> LabeledMatrix {
        self.labeled(self.adjacency.transpose())
    }

    /// Constructs the cocitation matrix: entry `(i, j)` counts the actors with ties to both `i`
    /// and `j`. The diagonal holds each actor's in-degree.
    pub fn cocitation_matrix(&self) -> LabeledMatrix {
        let binary = self.binary_adjacency();
        self.labeled(binary.transpose() * &binary)
    }

    /// Constructs the degree matrix, holding each row sum of the adjacency matrix on the
    /// diagonal.
    pub fn degree_matrix(&self) -> LabeledMatrix {
        self.labeled(self.degrees())
    }

    /// Constructs the laplacian matrix, the degree matrix minus the adjacency matrix.
    pub fn laplacian_matrix(&self) -> LabeledMatrix {
        self.labeled(self.degrees() - &self.adjacency)
    }

    /// Computes the matrix of walks of length `k`, the `k`-th power of the adjacency matrix.
    pub fn walks_matrix(&self, k: usize) -> LabeledMatrix {
        let n = self.len();
        let mut power = DMatrix::<f64>::identity(n, n);
        for _ in 0..k {
            power = &power * &self.adjacency;
        }

        self.labeled(power)
    }

    /// Computes the sum of the walk matrices of length 1 to `n - 1`.
    ///
    /// This takes `n - 2` products of `n`x`n` matrices and is guarded by the expensive-size
    /// limit.
    pub fn total_walks_matrix(&self, observer: &mut dyn Observer) -> Result<LabeledMatrix> {
        let n = self.len();
        self.config.limits.check("total walks", n)?;

        let start = Instant::now();
        let mut total = DMatrix::<f64>::zeros(n, n);
        let mut power = self.adjacency.clone();
        let mut progress = Progress::new(observer, n.saturating_sub(1));

        for k in 1..n {
            total += &power;
            if k + 1 < n {
                power = &power * &self.adjacency;
            }
            progress.tick()?;
        }

        info!(n, elapsed = ?start.elapsed(), "computed total walks");

        Ok(self.labeled(total))
    }

    /// Inverts the adjacency matrix.
    pub fn adjacency_inverse(&self) -> Result<LabeledMatrix> {
        self.config.limits.check("matrix inversion", self.len())?;

        invert(&self.adjacency).map(|inverse| self.labeled(inverse))
    }

    //
    // Distances
    //

    /// Returns the length of the shortest path from `source` to `target`, infinite when
    /// `target` isn't reachable.
    pub fn geodesic_distance(&self, source: VertexId, target: VertexId) -> Result<f64> {
        let s = self.index_of(source)?;
        let t = self.index_of(target)?;

        if let Some(paths) = self.paths.get() {
            return Ok(paths.distances[(s, t)]);
        }

        Ok(distances_from(s, &self.outbound, self.weighted)[t])
    }

    /// Returns the cached all-pairs shortest paths, computing them on first use.
    pub fn paths(&self) -> &PathAnalysis {
        if let Some(paths) = self.paths.get() {
            return paths;
        }

        let mut observer = ();
        let mut progress = Progress::new(&mut observer, self.len());
        // Without an observer nothing can cancel the computation.
        match compute_paths(&self.outbound, self.weighted, self.config.threads, &mut progress) {
            Ok(paths) => self.paths.get_or_init(|| paths),
            Err(_) => unreachable!("shortest paths can only fail on cancellation"),
        }
    }

    /// Like [`Snapshot::paths`], reporting progress to (and honouring cancellation from) the
    /// observer.
    pub fn paths_with(&self, observer: &mut dyn Observer) -> Result<&PathAnalysis> {
        if let Some(paths) = self.paths.get() {
            return Ok(paths);
        }

        let mut progress = Progress::new(observer, self.len());
        let paths = compute_paths(&self.outbound, self.weighted, self.config.threads, &mut progress)?;

        Ok(self.paths.get_or_init(|| paths))
    }

    /// Constructs the matrix of geodesic distances; unreachable pairs are infinite.
    pub fn distance_matrix(&self) -> LabeledMatrix {
        self.labeled(self.paths().distances.clone())
    }

    /// Constructs the matrix counting the shortest paths between each pair.
    pub fn geodesics_matrix(&self) -> LabeledMatrix {
        self.labeled(self.paths().geodesics.clone())
    }

    /// Constructs the reachability matrix: one where the distance is finite, zero elsewhere.
    pub fn reachability_matrix(&self) -> LabeledMatrix {
        let reachable = self
            .paths()
            .distances
            .map(|distance| if distance.is_finite() { 1.0 } else { 0.0 });

        self.labeled(reachable)
    }

    /// Returns the longest finite geodesic, zero for graphs without ties.
    pub fn diameter(&self) -> f64 {
        self.paths()
            .distances
            .iter()
            .filter(|distance| distance.is_finite())
            .fold(0.0, |max, &distance| f64::max(max, distance))
    }

    /// Returns the mean length of the geodesics between distinct, mutually reachable pairs.
    pub fn average_distance(&self) -> f64 {
        let distances = &self.paths().distances;
        let (mut sum, mut count) = (0.0, 0usize);

        for i in 0..self.len() {
            for j in (0..self.len()).filter(|&j| j != i) {
                let distance = distances[(i, j)];
                if distance.is_finite() {
                    sum += distance;
                    count += 1;
                }
            }
        }

        if count == 0 {
            return 0.0;
        }

        sum / count as f64
    }

    /// Returns whether every vertex can reach every other vertex.
    pub fn is_connected(&self) -> bool {
        self.paths()
            .distances
            .iter()
            .all(|distance| distance.is_finite())
    }

    /// Returns the largest finite distance from a vertex to any vertex it can reach.
    pub fn eccentricity(&self, id: VertexId) -> Result<f64> {
        let i = self.index_of(id)?;

        Ok(self
            .paths()
            .distances
            .row(i)
            .iter()
            .filter(|distance| distance.is_finite())
            .fold(0.0, |max, &distance| f64::max(max, distance)))
    }

    //
    // Crate-internal accessors
    //

    pub(crate) fn adjacency(&self) -> &DMatrix<f64> {
        &self.adjacency
    }

    pub(crate) fn outbound(&self) -> &Neighbours {
        &self.outbound
    }

    pub(crate) fn inbound(&self) -> &Neighbours {
        &self.inbound
    }

    /// The adjacency matrix with every tie set to one. Self-loops are kept.
    pub(crate) fn binary_adjacency(&self) -> DMatrix<f64> {
        self.adjacency
            .map(|value| if value != 0.0 { 1.0 } else { 0.0 })
    }

    /// Whether two distinct vertices are tied in either direction.
    pub(crate) fn tied(&self, i: usize, j: usize) -> bool {
        i != j && (self.adjacency[(i, j)] != 0.0 || self.adjacency[(j, i)] != 0.0)
    }

    pub(crate) fn labeled(&self, matrix: DMatrix<f64>) -> LabeledMatrix {
        LabeledMatrix::from_parts(self.ids.clone(), matrix)
    }

    fn degrees(&self) -> DMatrix<f64> {
        let n = self.len();
        let mut matrix = DMatrix::<f64>::zeros(n, n);

        for (i, row) in self.adjacency.row_iter().enumerate() {
            // The rows are visited in index order, so the row number is the diagonal position.
            matrix[(i, i)] = row.sum();
        }

        matrix
    }
}
