//! Two-dimensional embeddings of a network for drawing.
//!
//! Placements come either from prominence scores ([`prominence`]) or from a physical simulation
//! ([`force`]). Both produce values keyed by vertex id that can be written back into the graph's
//! vertex payload.

pub mod force;
pub mod prominence;

use std::{collections::BTreeMap, f64::consts::TAU};

use serde::{Deserialize, Serialize};

use crate::{
    error::Result,
    graph::Graph,
    vertex::{Point, VertexId},
};

/// The drawing area layouts are fitted into.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Canvas {
    pub width: f64,
    pub height: f64,
    /// Blank border kept on every side.
    pub margin: f64,
}

impl Default for Canvas {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            margin: 40.0,
        }
    }
}

impl Canvas {
    pub const fn new(width: f64, height: f64, margin: f64) -> Self {
        Self {
            width,
            height,
            margin,
        }
    }

    pub fn center(&self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }

    /// The largest radius of a circle around the center that stays inside the margins.
    pub fn max_radius(&self) -> f64 {
        (self.width.min(self.height) / 2.0 - self.margin).max(0.0)
    }

    /// Whether a point lies inside the margins.
    pub fn contains(&self, point: &Point) -> bool {
        (self.margin..=self.width - self.margin).contains(&point.x)
            && (self.margin..=self.height - self.margin).contains(&point.y)
    }

    /// Moves a point to the nearest position inside the margins.
    fn clamp(&self, point: Point) -> Point {
        Point::new(
            point.x.clamp(self.margin, (self.width - self.margin).max(self.margin)),
            point.y.clamp(self.margin, (self.height - self.margin).max(self.margin)),
        )
    }
}

/// A position per vertex.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Layout {
    positions: BTreeMap<VertexId, Point>,
}

impl Layout {
    pub fn get(&self, id: VertexId) -> Option<Point> {
        self.positions.get(&id).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (VertexId, Point)> + '_ {
        self.positions.iter().map(|(id, point)| (*id, *point))
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Writes the positions into the vertices of the graph.
    pub fn apply(&self, graph: &mut Graph) -> Result<()> {
        for (id, point) in self.iter() {
            graph.vertex_mut(id)?.position = point;
        }

        Ok(())
    }
}

impl FromIterator<(VertexId, Point)> for Layout {
    fn from_iter<I: IntoIterator<Item = (VertexId, Point)>>(iter: I) -> Self {
        Self {
            positions: iter.into_iter().collect(),
        }
    }
}

/// Places the actors evenly on the largest circle fitting the canvas, in the given order,
/// starting at angle zero.
///
/// # Examples
///
/// ```
/// use sociogram::layout::{circular_layout, Canvas};
///
/// let canvas = Canvas::new(200.0, 200.0, 0.0);
/// let layout = circular_layout(&[1, 2, 3, 4], &canvas);
///
/// let first = layout.get(1).unwrap();
/// assert!((first.x - 200.0).abs() < 1e-9 && (first.y - 100.0).abs() < 1e-9);
/// ```
pub fn circular_layout(ids: &[VertexId], canvas: &Canvas) -> Layout {
    let center = canvas.center();
    let radius = canvas.max_radius();
    let step = TAU / ids.len().max(1) as f64;

    ids.iter()
        .enumerate()
        .map(|(k, &id)| {
            let angle = step * k as f64;
            (
                id,
                Point::new(
                    center.x + radius * angle.cos(),
                    center.y + radius * angle.sin(),
                ),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn circle_is_on_the_canvas() {
        let canvas = Canvas::default();
        let layout = circular_layout(&[1, 2, 3, 4, 5], &canvas);

        assert_eq!(layout.len(), 5);
        for (_, point) in layout.iter() {
            assert!((point.distance(&canvas.center()) - canvas.max_radius()).abs() < 1e-9);
            assert!(canvas.contains(&point));
        }
    }

    #[test]
    fn apply_writes_positions() {
        let mut graph = graph!([1, 2]);
        let layout: Layout = [(1, Point::new(1.0, 2.0)), (2, Point::new(3.0, 4.0))]
            .into_iter()
            .collect();

        layout.apply(&mut graph).unwrap();

        assert_eq!(graph.vertex(2).unwrap().position, Point::new(3.0, 4.0));
    }

    #[test]
    fn apply_to_unknown_vertex() {
        let mut graph = graph!([1, 2]);
        let layout: Layout = [(9, Point::default())].into_iter().collect();

        assert_eq!(
            layout.apply(&mut graph),
            Err(crate::error::Error::VertexNotFound(9))
        );
    }

    #[test]
    fn clamp() {
        let canvas = Canvas::new(100.0, 100.0, 10.0);

        assert_eq!(canvas.clamp(Point::new(-5.0, 50.0)), Point::new(10.0, 50.0));
        assert_eq!(canvas.clamp(Point::new(95.0, 200.0)), Point::new(90.0, 90.0));
    }
}
