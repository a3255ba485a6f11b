//! Holland, Leinhardt and Davis's triad census.

use std::{fmt, time::Instant};

use itertools::Itertools;
use serde::Serialize;
use tracing::info;

use crate::{
    error::Result,
    matrix::Snapshot,
    progress::{Observer, Progress},
};

/// The 16 isomorphism classes of a directed triad, named by their M-A-N code: the number of
/// mutual, asymmetric and null dyads, plus a letter telling apart classes that share one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum TriadType {
    T003,
    T012,
    T102,
    T021D,
    T021U,
    T021C,
    T111D,
    T111U,
    T030T,
    T030C,
    T201,
    T120D,
    T120U,
    T120C,
    T210,
    T300,
}

impl TriadType {
    pub const ALL: [TriadType; 16] = [
        TriadType::T003,
        TriadType::T012,
        TriadType::T102,
        TriadType::T021D,
        TriadType::T021U,
        TriadType::T021C,
        TriadType::T111D,
        TriadType::T111U,
        TriadType::T030T,
        TriadType::T030C,
        TriadType::T201,
        TriadType::T120D,
        TriadType::T120U,
        TriadType::T120C,
        TriadType::T210,
        TriadType::T300,
    ];

    pub const fn name(&self) -> &'static str {
        match self {
            TriadType::T003 => "003",
            TriadType::T012 => "012",
            TriadType::T102 => "102",
            TriadType::T021D => "021D",
            TriadType::T021U => "021U",
            TriadType::T021C => "021C",
            TriadType::T111D => "111D",
            TriadType::T111U => "111U",
            TriadType::T030T => "030T",
            TriadType::T030C => "030C",
            TriadType::T201 => "201",
            TriadType::T120D => "120D",
            TriadType::T120U => "120U",
            TriadType::T120C => "120C",
            TriadType::T210 => "210",
            TriadType::T300 => "300",
        }
    }

    /// Classifies a triad from its six possible arcs, encoded as bits: `v→u` 1, `u→v` 2,
    /// `v→w` 4, `w→v` 8, `u→w` 16, `w→u` 32.
    fn from_code(code: usize) -> Self {
        // Position in `ALL`, plus one, for each of the 64 codes.
        const CLASSES: [u8; 64] = [
            1, 2, 2, 3, 2, 4, 6, 8, 2, 6, 5, 7, 3, 8, 7, 11, 2, 6, 4, 8, 5, 9, 9, 13, 6, 10, 9,
            14, 7, 14, 12, 15, 2, 5, 6, 7, 6, 9, 10, 14, 4, 9, 9, 12, 8, 13, 14, 15, 3, 7, 8, 11,
            7, 12, 14, 15, 8, 14, 13, 15, 11, 15, 15, 16,
        ];

        Self::ALL[usize::from(CLASSES[code & 63]) - 1]
    }
}

impl fmt::Display for TriadType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How many triads of each type a network holds.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct TriadCensus {
    counts: [u64; 16],
}

impl TriadCensus {
    pub fn get(&self, triad: TriadType) -> u64 {
        self.counts[triad as usize]
    }

    /// The counts in [`TriadType::ALL`] order.
    pub fn iter(&self) -> impl Iterator<Item = (TriadType, u64)> + '_ {
        TriadType::ALL.into_iter().zip(self.counts.iter().copied())
    }

    /// The number of triads counted, `n choose 3`.
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }
}

impl Snapshot {
    /// Classifies every triple of actors.
    ///
    /// Undirected ties count as mutual dyads, so undirected networks only hold the 003, 102, 201
    /// and 300 types.
    ///
    /// # Examples
    ///
    /// ```
    /// use sociogram::{community::triads::TriadType, config::AnalysisConfig, graph::Graph};
    ///
    /// let mut graph = Graph::directed();
    /// for _ in 0..3 {
    ///     graph.add_vertex();
    /// }
    /// for (source, target) in [(1, 2), (2, 3), (3, 1)] {
    ///     graph.add_edge(source, target, 1.0).unwrap();
    /// }
    ///
    /// let census = graph
    ///     .snapshot(&AnalysisConfig::default())
    ///     .triad_census(&mut ())
    ///     .unwrap();
    ///
    /// assert_eq!(census.get(TriadType::T030C), 1);
    /// assert_eq!(census.total(), 1);
    /// ```
    pub fn triad_census(&self, observer: &mut dyn Observer) -> Result<TriadCensus> {
        let start = Instant::now();
        let n = self.len();
        self.config().limits.check("triad census", n)?;
        let adjacency = self.adjacency();
        let arc = |from: usize, to: usize| adjacency[(from, to)] != 0.0;

        let mut census = TriadCensus::default();
        let mut progress = Progress::new(observer, n);

        for v in 0..n {
            for (u, w) in (v + 1..n).tuple_combinations() {
                let code = usize::from(arc(v, u))
                    | usize::from(arc(u, v)) << 1
                    | usize::from(arc(v, w)) << 2
                    | usize::from(arc(w, v)) << 3
                    | usize::from(arc(u, w)) << 4
                    | usize::from(arc(w, u)) << 5;

                census.counts[TriadType::from_code(code) as usize] += 1;
            }
            progress.tick()?;
        }

        info!(n, elapsed = ?start.elapsed(), "took triad census");

        Ok(census)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::AnalysisConfig, error::Error, graph::Graph};

    fn census(graph: &Graph) -> TriadCensus {
        graph
            .snapshot(&AnalysisConfig::default())
            .triad_census(&mut ())
            .unwrap()
    }

    #[test]
    fn codes() {
        assert_eq!(TriadType::from_code(0), TriadType::T003);
        assert_eq!(TriadType::from_code(1), TriadType::T012);
        assert_eq!(TriadType::from_code(3), TriadType::T102);
        // v→u, v→w: v sends both.
        assert_eq!(TriadType::from_code(1 | 4), TriadType::T021D);
        // u→v, w→v: v receives both.
        assert_eq!(TriadType::from_code(2 | 8), TriadType::T021U);
        // u→v→w.
        assert_eq!(TriadType::from_code(2 | 4), TriadType::T021C);
        assert_eq!(TriadType::from_code(1 | 16 | 8), TriadType::T030C);
        assert_eq!(TriadType::from_code(1 | 4 | 16), TriadType::T030T);
        assert_eq!(TriadType::from_code(63), TriadType::T300);
    }

    #[test]
    fn total_is_n_choose_3() {
        let mut graph = graph!(directed; [1, 2, 3], [4, 1]);
        graph.add_vertex();

        assert_eq!(census(&graph).total(), 10);
    }

    #[test]
    fn directed_triangle() {
        let graph = graph!(directed; [1, 2, 3, 1]);
        let census = census(&graph);

        assert_eq!(census.get(TriadType::T030C), 1);
        assert_eq!(census.iter().filter(|(_, count)| *count > 0).count(), 1);
    }

    #[test]
    fn transitive_triangle() {
        let graph = graph!(directed; [1, 2, 3], [1, 3]);

        assert_eq!(census(&graph).get(TriadType::T030T), 1);
    }

    #[test]
    fn undirected_types() {
        // A triangle plus a pendant: triads {1,2,3} complete, the others around 4.
        let graph = graph!([1, 2, 3, 1], [3, 4]);
        let census = census(&graph);

        assert_eq!(census.get(TriadType::T300), 1);
        // {1,3,4} and {2,3,4}: two mutual dyads each.
        assert_eq!(census.get(TriadType::T201), 2);
        // {1,2,4}: only 1-2.
        assert_eq!(census.get(TriadType::T102), 1);
        assert_eq!(census.total(), 4);
    }

    #[test]
    fn mutual_and_asymmetric() {
        let graph = graph!(directed; [1, 2, 1], [2, 3]);
        let census = census(&graph);

        // 1 ↔ 2 → 3 with no tie between 1 and 3.
        assert_eq!(census.get(TriadType::T111U) + census.get(TriadType::T111D), 1);
    }

    #[test]
    fn names() {
        let names: Vec<&str> = TriadType::ALL.iter().map(TriadType::name).collect();

        assert_eq!(names[0], "003");
        assert_eq!(names[15], "300");
        assert_eq!(TriadType::T120C.to_string(), "120C");
    }

    #[test]
    fn large_networks_require_confirmation() {
        let mut graph = Graph::undirected();
        for _ in 0..201 {
            graph.add_vertex();
        }

        assert_eq!(
            graph
                .snapshot(&AnalysisConfig::default())
                .triad_census(&mut ())
                .map(|_| ()),
            Err(Error::ConfirmationRequired {
                operation: "triad census",
                size: 201,
                limit: 200,
            })
        );

        let confirmed = AnalysisConfig::default().confirmed();
        assert!(graph.snapshot(&confirmed).triad_census(&mut ()).is_ok());
    }
}
