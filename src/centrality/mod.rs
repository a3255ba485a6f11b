//! Prominence indices: centrality and prestige scores per actor, their group-level
//! centralization and their distribution.
//!
//! Each index is a variant of [`Index`]. Computing one yields [`Scores`]: a raw and a
//! standardized value per vertex plus Freeman's centralization, which compares the spread of the
//! standardized scores with the spread the same index has on a star of the same size (the most
//! centralized network).
//!
//! ```
//! use sociogram::{centrality::Index, config::AnalysisConfig, graph::Graph};
//!
//! let mut graph = Graph::undirected();
//! let hub = graph.add_vertex();
//! for _ in 0..4 {
//!     let leaf = graph.add_vertex();
//!     graph.add_edge(hub, leaf, 1.0).unwrap();
//! }
//!
//! let snapshot = graph.snapshot(&AnalysisConfig::default());
//! let betweenness = Index::Betweenness.compute(&snapshot, &mut ()).unwrap();
//!
//! assert_eq!(betweenness.raw(hub), Some(6.0));
//! assert_eq!(betweenness.centralization(), Some(1.0));
//! ```

mod betweenness;
mod closeness;
mod degree;
mod pagerank;
mod spectral;

use std::{collections::BTreeMap, fmt, str::FromStr, time::Instant};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    error::{Error, Result},
    graph::Graph,
    matrix::Snapshot,
    progress::Observer,
    vertex::VertexId,
};

/// Two standardized spreads below this are treated as zero.
const SPREAD_EPSILON: f64 = 1e-12;

/// Decimal places kept when bucketing scores into a distribution.
const DISTRIBUTION_PRECISION: f64 = 1e6;

/// The prominence indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Index {
    /// Sum of outbound tie values.
    Degree,
    /// Inverse of the sum of distances to every other actor.
    Closeness,
    /// Closeness restricted to the actors each actor can reach.
    InfluenceRangeCloseness,
    /// Fraction of the shortest paths between other actors passing through the actor.
    Betweenness,
    /// Number of shortest paths between other actors passing through the actor.
    Stress,
    /// Inverse of the largest distance to a reachable actor.
    Eccentricity,
    /// Gil and Schmidt's power: neighbourhood sizes weighted by their distance.
    Power,
    /// Stephenson and Zelen's information centrality.
    Information,
    /// Component of the principal eigenvector of the adjacency matrix.
    Eigenvector,
    /// Sum of inbound tie values.
    DegreePrestige,
    /// PageRank.
    PageRank,
    /// Closeness from the actors able to reach the actor.
    Proximity,
}

impl Index {
    pub const ALL: [Index; 12] = [
        Index::Degree,
        Index::Closeness,
        Index::InfluenceRangeCloseness,
        Index::Betweenness,
        Index::Stress,
        Index::Eccentricity,
        Index::Power,
        Index::Information,
        Index::Eigenvector,
        Index::DegreePrestige,
        Index::PageRank,
        Index::Proximity,
    ];

    pub const fn abbreviation(&self) -> &'static str {
        match self {
            Index::Degree => "DC",
            Index::Closeness => "CC",
            Index::InfluenceRangeCloseness => "IRCC",
            Index::Betweenness => "BC",
            Index::Stress => "SC",
            Index::Eccentricity => "EC",
            Index::Power => "PC",
            Index::Information => "IC",
            Index::Eigenvector => "EVC",
            Index::DegreePrestige => "DP",
            Index::PageRank => "PRP",
            Index::Proximity => "PP",
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Index::Degree => "degree centrality",
            Index::Closeness => "closeness centrality",
            Index::InfluenceRangeCloseness => "influence range closeness centrality",
            Index::Betweenness => "betweenness centrality",
            Index::Stress => "stress centrality",
            Index::Eccentricity => "eccentricity centrality",
            Index::Power => "power centrality",
            Index::Information => "information centrality",
            Index::Eigenvector => "eigenvector centrality",
            Index::DegreePrestige => "degree prestige",
            Index::PageRank => "pagerank prestige",
            Index::Proximity => "proximity prestige",
        }
    }

    /// Prestige indices rank actors by the ties they receive.
    pub const fn is_prestige(&self) -> bool {
        matches!(
            self,
            Index::DegreePrestige | Index::PageRank | Index::Proximity
        )
    }

    /// Whether the index is undefined on a disconnected graph.
    pub const fn requires_connectivity(&self) -> bool {
        matches!(self, Index::Closeness)
    }

    /// Computes the index over every vertex of the snapshot.
    pub fn compute(self, snapshot: &Snapshot, observer: &mut dyn Observer) -> Result<Scores> {
        snapshot.config().validate()?;

        let start = Instant::now();
        let values = self.values(snapshot, observer)?;
        let centralization = self.centralization(snapshot, &values.standardized, observer)?;

        let scores = snapshot
            .ids()
            .iter()
            .zip(values.raw.iter().zip(&values.standardized))
            .map(|(&id, (&raw, &standardized))| (id, Score { raw, standardized }))
            .collect();

        debug!(index = self.abbreviation(), n = snapshot.len(), elapsed = ?start.elapsed(), "computed index");

        Ok(Scores {
            index: self,
            scores,
            centralization,
        })
    }

    fn values(self, snapshot: &Snapshot, observer: &mut dyn Observer) -> Result<Values> {
        match self {
            Index::Degree => Ok(degree::degree_centrality(snapshot)),
            Index::DegreePrestige => Ok(degree::degree_prestige(snapshot)),
            Index::Closeness => closeness::closeness_centrality(snapshot, observer),
            Index::InfluenceRangeCloseness => {
                closeness::influence_range_closeness(snapshot, observer)
            }
            Index::Eccentricity => closeness::eccentricity_centrality(snapshot, observer),
            Index::Power => closeness::power_centrality(snapshot, observer),
            Index::Proximity => closeness::proximity_prestige(snapshot, observer),
            Index::Betweenness => betweenness::betweenness_centrality(snapshot, observer),
            Index::Stress => betweenness::stress_centrality(snapshot, observer),
            Index::Information => spectral::information_centrality(snapshot),
            Index::Eigenvector => spectral::eigenvector_centrality(snapshot),
            Index::PageRank => pagerank::pagerank_prestige(snapshot),
        }
    }

    /// The star on which the index is most centralized. Undirected graphs compare against an
    /// undirected star. On directed graphs outbound indices use a hub sending to every leaf,
    /// inbound indices a hub receiving from every leaf, and path indices a reciprocated star.
    fn reference_star(self, n: usize, directed: bool) -> Graph {
        if !directed {
            return star_graph(n, Star::Undirected);
        }

        match self {
            Index::Degree
            | Index::InfluenceRangeCloseness
            | Index::Eccentricity
            | Index::Power
            | Index::Information => star_graph(n, Star::Outward),
            Index::DegreePrestige | Index::PageRank | Index::Proximity | Index::Eigenvector => {
                star_graph(n, Star::Inward)
            }
            Index::Closeness | Index::Betweenness | Index::Stress => star_graph(n, Star::Mutual),
        }
    }

    /// Freeman's centralization: the summed gap to the top standardized score, relative to the
    /// same sum on a star with as many actors.
    fn centralization(
        self,
        snapshot: &Snapshot,
        standardized: &[f64],
        observer: &mut dyn Observer,
    ) -> Result<Option<f64>> {
        let n = snapshot.len();
        if n < 3 {
            return Ok(None);
        }

        let star = self.reference_star(n, snapshot.is_directed());
        let config = snapshot.config().clone().with_consider_weights(false).confirmed();
        let reference = self.values(&star.snapshot(&config), observer)?;

        let observed = spread(standardized);
        let maximum = spread(&reference.standardized);

        if maximum < SPREAD_EPSILON {
            return Ok(None);
        }

        Ok(Some(observed / maximum))
    }
}

impl fmt::Display for Index {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Index {
    type Err = Error;

    /// Parses an index from its abbreviation, ignoring case.
    fn from_str(s: &str) -> Result<Self> {
        Index::ALL
            .into_iter()
            .find(|index| index.abbreviation().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::invalid(format!("unknown prominence index: {s}")))
    }
}

/// The raw and standardized values of an index for one actor.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Score {
    pub raw: f64,
    pub standardized: f64,
}

/// The values of an index for every actor of a snapshot.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Scores {
    index: Index,
    scores: BTreeMap<VertexId, Score>,
    centralization: Option<f64>,
}

impl Scores {
    pub fn index(&self) -> Index {
        self.index
    }

    pub fn get(&self, id: VertexId) -> Option<&Score> {
        self.scores.get(&id)
    }

    pub fn raw(&self, id: VertexId) -> Option<f64> {
        self.get(id).map(|score| score.raw)
    }

    pub fn standardized(&self, id: VertexId) -> Option<f64> {
        self.get(id).map(|score| score.standardized)
    }

    /// Iterates over the scores in ascending vertex id order.
    pub fn iter(&self) -> impl Iterator<Item = (VertexId, &Score)> {
        self.scores.iter().map(|(id, score)| (*id, score))
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Group-level centralization in `[0, 1]`, if defined for the network's size.
    pub fn centralization(&self) -> Option<f64> {
        self.centralization
    }

    /// Sum of the raw scores.
    pub fn sum(&self) -> f64 {
        self.scores.values().map(|score| score.raw).sum()
    }

    /// Mean of the standardized scores.
    pub fn mean(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }

        self.scores.values().map(|score| score.standardized).sum::<f64>() / self.len() as f64
    }

    /// Population variance of the standardized scores.
    pub fn variance(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }

        let mean = self.mean();
        self.scores
            .values()
            .map(|score| (score.standardized - mean).powi(2))
            .sum::<f64>()
            / self.len() as f64
    }

    /// The vertex with the highest standardized score (the lowest id on ties).
    pub fn max(&self) -> Option<(VertexId, f64)> {
        self.extreme(|candidate, best| candidate > best)
    }

    /// The vertex with the lowest standardized score (the lowest id on ties).
    pub fn min(&self) -> Option<(VertexId, f64)> {
        self.extreme(|candidate, best| candidate < best)
    }

    /// Tallies how many actors share each standardized value.
    pub fn distribution(&self) -> Distribution {
        let mut counts: BTreeMap<i64, usize> = BTreeMap::new();
        for score in self.scores.values() {
            let bucket = (score.standardized * DISTRIBUTION_PRECISION).round() as i64;
            *counts.entry(bucket).or_default() += 1;
        }

        let series: Vec<(f64, usize)> = counts
            .into_iter()
            .map(|(bucket, count)| (bucket as f64 / DISTRIBUTION_PRECISION, count))
            .collect();

        Distribution {
            index: self.index,
            min: series.first().map_or(0.0, |(value, _)| *value),
            max: series.last().map_or(0.0, |(value, _)| *value),
            series,
        }
    }

    fn extreme(&self, better: impl Fn(f64, f64) -> bool) -> Option<(VertexId, f64)> {
        self.scores.iter().fold(None, |best, (id, score)| match best {
            Some((_, value)) if !better(score.standardized, value) => best,
            _ => Some((*id, score.standardized)),
        })
    }
}

/// A value → frequency series for charting an index.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Distribution {
    pub index: Index,
    pub min: f64,
    pub max: f64,
    /// `(value, frequency)` pairs in ascending value order.
    pub series: Vec<(f64, usize)>,
}

/// Raw and standardized values in snapshot index order.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct Values {
    pub(crate) raw: Vec<f64>,
    pub(crate) standardized: Vec<f64>,
}

impl Values {
    /// Standardizes by dividing by a constant, leaving zeros when the constant is zero.
    pub(crate) fn scaled(raw: Vec<f64>, divisor: f64) -> Self {
        let standardized = raw
            .iter()
            .map(|value| if divisor == 0.0 { 0.0 } else { value / divisor })
            .collect();

        Self { raw, standardized }
    }

    /// Standardizes by the largest raw value.
    pub(crate) fn relative_to_max(raw: Vec<f64>) -> Self {
        let max = raw.iter().copied().fold(0.0, f64::max);
        Self::scaled(raw, max)
    }

    /// Uses the raw values as standardized values.
    pub(crate) fn unscaled(raw: Vec<f64>) -> Self {
        Self {
            standardized: raw.clone(),
            raw,
        }
    }
}

/// Sum of the gaps between each value and the largest one.
fn spread(values: &[f64]) -> f64 {
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    values.iter().map(|value| max - value).sum()
}

/// Orientation of the ties of a reference star.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Star {
    Undirected,
    Outward,
    Inward,
    Mutual,
}

/// A star with `n` actors, the hub first.
fn star_graph(n: usize, shape: Star) -> Graph {
    let mut graph = Graph::new(shape != Star::Undirected);
    let hub = graph.add_vertex();

    for _ in 1..n {
        let leaf = graph.add_vertex();
        // Safety: both endpoints were just created.
        match shape {
            Star::Undirected | Star::Outward => {
                let _ = graph.add_edge(hub, leaf, 1.0);
            }
            Star::Inward => {
                let _ = graph.add_edge(leaf, hub, 1.0);
            }
            Star::Mutual => {
                let _ = graph.add_edge(hub, leaf, 1.0);
                let _ = graph.add_edge(leaf, hub, 1.0);
            }
        }
    }

    graph
}
