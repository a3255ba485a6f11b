//! A module for working with edges (ties).

use serde::{Deserialize, Serialize};

use crate::vertex::VertexId;

/// How a tie relates to its mirror.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeType {
    /// An arc without a mirror arc.
    Directed,
    /// A tie in an undirected graph.
    Undirected,
    /// An arc whose mirror arc also exists.
    Reciprocated,
}

/// A weighted tie from `source` to `target`, plus its presentation payload.
///
/// In an undirected graph the store keeps both orientations of a tie with the same weight and
/// payload, and reports the tie once.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    source: VertexId,
    target: VertexId,
    pub weight: f64,
    pub label: String,
    pub color: String,
}

impl Edge {
    /// Creates a new edge between two vertices.
    ///
    /// # Examples
    ///
    /// ```
    /// use sociogram::edge::Edge;
    ///
    /// let edge = Edge::new(1, 2, 0.5);
    /// assert_eq!(edge.source(), 1);
    /// assert_eq!(edge.target(), 2);
    /// assert_eq!(edge.weight, 0.5);
    /// ```
    pub fn new(source: VertexId, target: VertexId, weight: f64) -> Self {
        Self {
            source,
            target,
            weight,
            label: String::new(),
            color: "black".to_owned(),
        }
    }

    /// Returns the vertex the edge leaves.
    pub fn source(&self) -> VertexId {
        self.source
    }

    /// Returns the vertex the edge enters.
    pub fn target(&self) -> VertexId {
        self.target
    }

    /// Returns whether the edge contains the given vertex.
    ///
    /// # Examples
    ///
    /// ```
    /// use sociogram::edge::Edge;
    ///
    /// let edge = Edge::new(1, 2, 1.0);
    ///
    /// assert!(edge.contains(1));
    /// assert!(edge.contains(2));
    /// assert!(!edge.contains(3));
    /// ```
    pub fn contains(&self, vertex: VertexId) -> bool {
        self.source == vertex || self.target == vertex
    }

    /// Returns whether the edge starts and ends at the same vertex.
    pub fn is_loop(&self) -> bool {
        self.source == self.target
    }

    /// Returns a copy of the edge pointing the other way.
    pub fn reversed(&self) -> Self {
        Self {
            source: self.target,
            target: self.source,
            ..self.clone()
        }
    }

    /// Returns the endpoints ordered so that `(a, b)` and `(b, a)` produce the same pair.
    pub fn unordered(&self) -> (VertexId, VertexId) {
        if self.source <= self.target {
            (self.source, self.target)
        } else {
            (self.target, self.source)
        }
    }
}
