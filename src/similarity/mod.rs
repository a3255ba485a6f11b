//! Structural equivalence: how alike two actors' tie profiles are.
//!
//! An actor's profile is its row (outbound ties), its column (inbound ties) or both, read from
//! the adjacency matrix or the distance matrix. Pairs of profiles are compared with Pearson's
//! correlation or with one of the [`Measure`]s, and the resulting dissimilarities feed the
//! agglomerative clustering in [`cluster`].

pub mod cluster;

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::matrix::{LabeledMatrix, Snapshot};

/// The matrix profiles are read from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProfileSource {
    #[default]
    Adjacency,
    /// Geodesic distances. Unreachable pairs read as one more than the largest finite distance.
    Distances,
}

/// Which ties make up an actor's profile.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Profile {
    /// Outbound ties.
    #[default]
    Rows,
    /// Inbound ties.
    Columns,
    /// Outbound ties followed by inbound ties.
    Both,
}

/// How profiles are built before they're compared.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileOptions {
    pub source: ProfileSource,
    pub profile: Profile,
    /// Compare the entries describing the pair itself (`k == i` or `k == j`) too.
    pub include_diagonal: bool,
}

impl ProfileOptions {
    pub const fn with_source(mut self, source: ProfileSource) -> Self {
        self.source = source;
        self
    }

    pub const fn with_profile(mut self, profile: Profile) -> Self {
        self.profile = profile;
        self
    }

    pub const fn with_diagonal(mut self, include_diagonal: bool) -> Self {
        self.include_diagonal = include_diagonal;
        self
    }
}

/// Pairwise comparison measures over tie profiles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Measure {
    /// Share of positions where both profiles hold the same value.
    SimpleMatching,
    /// Shared ties over ties held by either actor.
    Jaccard,
    /// Number of positions where the profiles differ.
    Hamming,
    /// Cosine of the angle between the profiles.
    Cosine,
    Euclidean,
    Manhattan,
    Chebyshev,
}

impl Measure {
    pub const ALL: [Measure; 7] = [
        Measure::SimpleMatching,
        Measure::Jaccard,
        Measure::Hamming,
        Measure::Cosine,
        Measure::Euclidean,
        Measure::Manhattan,
        Measure::Chebyshev,
    ];

    /// Similarity of two profiles.
    ///
    /// Matching, Jaccard and cosine are similarities in `[0, 1]` already. Hamming similarity is
    /// the share of positions that agree. The geometric distances map to `1 / (1 + d)`.
    pub fn similarity(&self, pairs: &[(f64, f64)]) -> f64 {
        match self {
            Measure::SimpleMatching => matching(pairs),
            Measure::Jaccard => jaccard(pairs),
            Measure::Hamming => {
                if pairs.is_empty() {
                    1.0
                } else {
                    1.0 - hamming(pairs) / pairs.len() as f64
                }
            }
            Measure::Cosine => cosine(pairs),
            Measure::Euclidean | Measure::Manhattan | Measure::Chebyshev => {
                1.0 / (1.0 + self.distance(pairs))
            }
        }
    }

    /// Distance between two profiles: the complement of the similarity for the bounded
    /// measures and the plain distance otherwise.
    pub fn distance(&self, pairs: &[(f64, f64)]) -> f64 {
        match self {
            Measure::SimpleMatching => 1.0 - matching(pairs),
            Measure::Jaccard => 1.0 - jaccard(pairs),
            Measure::Hamming => hamming(pairs),
            Measure::Cosine => 1.0 - cosine(pairs),
            Measure::Euclidean => pairs
                .iter()
                .map(|(a, b)| (a - b).powi(2))
                .sum::<f64>()
                .sqrt(),
            Measure::Manhattan => pairs.iter().map(|(a, b)| (a - b).abs()).sum(),
            Measure::Chebyshev => pairs
                .iter()
                .map(|(a, b)| (a - b).abs())
                .fold(0.0, f64::max),
        }
    }
}

fn matching(pairs: &[(f64, f64)]) -> f64 {
    if pairs.is_empty() {
        return 1.0;
    }

    let matches = pairs.iter().filter(|(a, b)| a == b).count();
    matches as f64 / pairs.len() as f64
}

/// Ties are read as present or absent.
fn jaccard(pairs: &[(f64, f64)]) -> f64 {
    let (mut both, mut either) = (0usize, 0usize);
    for (a, b) in pairs {
        let (a, b) = (*a != 0.0, *b != 0.0);
        both += usize::from(a && b);
        either += usize::from(a || b);
    }

    if either == 0 {
        // Two empty profiles are identical.
        return 1.0;
    }

    both as f64 / either as f64
}

fn hamming(pairs: &[(f64, f64)]) -> f64 {
    pairs.iter().filter(|(a, b)| a != b).count() as f64
}

fn cosine(pairs: &[(f64, f64)]) -> f64 {
    let dot: f64 = pairs.iter().map(|(a, b)| a * b).sum();
    let squares_a: f64 = pairs.iter().map(|(a, _)| a * a).sum();
    let squares_b: f64 = pairs.iter().map(|(_, b)| b * b).sum();

    if squares_a == 0.0 || squares_b == 0.0 {
        return 0.0;
    }

    dot / (squares_a * squares_b).sqrt()
}

/// Pearson's correlation coefficient, zero when either profile is constant.
fn pearson(pairs: &[(f64, f64)]) -> f64 {
    if pairs.is_empty() {
        return 0.0;
    }

    let n = pairs.len() as f64;
    let mean_a = pairs.iter().map(|(a, _)| a).sum::<f64>() / n;
    let mean_b = pairs.iter().map(|(_, b)| b).sum::<f64>() / n;

    let (mut covariance, mut variance_a, mut variance_b) = (0.0, 0.0, 0.0);
    for (a, b) in pairs {
        covariance += (a - mean_a) * (b - mean_b);
        variance_a += (a - mean_a).powi(2);
        variance_b += (b - mean_b).powi(2);
    }

    if variance_a == 0.0 || variance_b == 0.0 {
        return 0.0;
    }

    covariance / (variance_a * variance_b).sqrt()
}

impl Snapshot {
    /// Constructs the matrix of Pearson correlations between the actors' tie profiles.
    ///
    /// # Examples
    ///
    /// ```
    /// use sociogram::{config::AnalysisConfig, graph::Graph, similarity::ProfileOptions};
    ///
    /// // 1 and 2 tie to the same actors; 3 only ties to 2.
    /// let mut graph = Graph::directed();
    /// for _ in 0..5 {
    ///     graph.add_vertex();
    /// }
    /// for (source, target) in [(1, 4), (1, 5), (2, 4), (2, 5), (3, 2)] {
    ///     graph.add_edge(source, target, 1.0).unwrap();
    /// }
    ///
    /// let snapshot = graph.snapshot(&AnalysisConfig::default());
    /// let correlation = snapshot.pearson_correlation(&ProfileOptions::default());
    ///
    /// assert!((correlation.get(1, 2).unwrap() - 1.0).abs() < 1e-12);
    /// assert!(correlation.get(1, 3).unwrap() < 0.0);
    /// ```
    pub fn pearson_correlation(&self, options: &ProfileOptions) -> LabeledMatrix {
        self.compare_profiles(options, pearson)
    }

    /// Constructs the matrix of pairwise similarities under `measure`.
    pub fn similarity_matrix(&self, measure: Measure, options: &ProfileOptions) -> LabeledMatrix {
        self.compare_profiles(options, |pairs| measure.similarity(pairs))
    }

    /// Constructs the matrix of pairwise distances under `measure`.
    pub fn dissimilarity_matrix(
        &self,
        measure: Measure,
        options: &ProfileOptions,
    ) -> LabeledMatrix {
        self.compare_profiles(options, |pairs| measure.distance(pairs))
    }

    fn compare_profiles(
        &self,
        options: &ProfileOptions,
        compare: impl Fn(&[(f64, f64)]) -> f64,
    ) -> LabeledMatrix {
        let source = self.profile_matrix(options.source);
        let n = self.len();
        let mut result = DMatrix::<f64>::zeros(n, n);
        let mut pairs = Vec::with_capacity(2 * n);

        for i in 0..n {
            for j in i..n {
                profile_pairs(&source, options, i, j, &mut pairs);
                let value = compare(&pairs);
                result[(i, j)] = value;
                result[(j, i)] = value;
            }
        }

        debug!(n, ?options, "compared tie profiles");

        self.labeled(result)
    }

    fn profile_matrix(&self, source: ProfileSource) -> DMatrix<f64> {
        match source {
            ProfileSource::Adjacency => self.adjacency().clone(),
            ProfileSource::Distances => {
                let distances = &self.paths().distances;
                let unreachable = distances
                    .iter()
                    .filter(|distance| distance.is_finite())
                    .fold(0.0, |max: f64, &distance| max.max(distance))
                    + 1.0;

                distances.map(|distance| {
                    if distance.is_finite() {
                        distance
                    } else {
                        unreachable
                    }
                })
            }
        }
    }
}

/// Collects the aligned profile entries of actors `i` and `j` into `pairs`.
fn profile_pairs(
    matrix: &DMatrix<f64>,
    options: &ProfileOptions,
    i: usize,
    j: usize,
    pairs: &mut Vec<(f64, f64)>,
) {
    pairs.clear();
    let positions = (0..matrix.nrows()).filter(|&k| options.include_diagonal || (k != i && k != j));

    if matches!(options.profile, Profile::Rows | Profile::Both) {
        pairs.extend(positions.clone().map(|k| (matrix[(i, k)], matrix[(j, k)])));
    }
    if matches!(options.profile, Profile::Columns | Profile::Both) {
        pairs.extend(positions.map(|k| (matrix[(k, i)], matrix[(k, j)])));
    }
}
