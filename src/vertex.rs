//! A module for working with vertices (actors).

use serde::{Deserialize, Serialize};

/// A stable vertex identifier. Ids are never reused within a graph, even after removal.
pub type VertexId = u32;

/// A point on the 2-D plane.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    ///
    /// # Examples
    ///
    /// ```
    /// use sociogram::vertex::Point;
    ///
    /// assert_eq!(Point::new(0.0, 0.0).distance(&Point::new(3.0, 4.0)), 5.0);
    /// ```
    pub fn distance(&self, other: &Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// The on-screen shape of a vertex. Carried as payload only.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Shape {
    #[default]
    Circle,
    Box,
    Diamond,
    Ellipse,
    Triangle,
    Star,
}

/// An actor of the network together with its presentation payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    id: VertexId,
    pub position: Point,
    pub label: String,
    pub size: f64,
    pub color: String,
    pub shape: Shape,
}

impl Vertex {
    /// Creates a vertex with default payload, labelled after its id.
    pub fn new(id: VertexId) -> Self {
        Self {
            id,
            position: Point::default(),
            label: id.to_string(),
            size: 8.0,
            color: "red".to_owned(),
            shape: Shape::default(),
        }
    }

    /// Returns the vertex id.
    pub fn id(&self) -> VertexId {
        self.id
    }
}
