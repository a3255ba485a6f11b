//! Placement by prominence: the score of an index becomes a position, a size or a color.

use std::{collections::BTreeMap, f64::consts::TAU, time::Instant};

use serde::{Deserialize, Serialize};
use tracing::info;

use super::{Canvas, Layout};
use crate::{
    centrality::{Index, Scores},
    error::Result,
    graph::Graph,
    matrix::Snapshot,
    progress::Observer,
    vertex::{Point, VertexId},
};

/// Share of the largest radius left empty around the center in radial placement.
const INNER_RADIUS: f64 = 0.1;

pub const MIN_NODE_SIZE: f64 = 4.0;
pub const MAX_NODE_SIZE: f64 = 24.0;

/// What a score is mapped to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProminenceMode {
    /// Concentric circles, the most prominent actors nearest the center.
    #[default]
    Radial,
    /// Horizontal levels, the most prominent actors at the top.
    Leveled,
    /// Node sizes between [`MIN_NODE_SIZE`] and [`MAX_NODE_SIZE`].
    NodeSize,
    /// Colors from blue for the least prominent to red for the most prominent.
    NodeColor,
}

/// The outcome of a prominence placement, ready to be written into the graph.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum Placement {
    Positions(Layout),
    Sizes(BTreeMap<VertexId, f64>),
    /// Colors as `#rrggbb`.
    Colors(BTreeMap<VertexId, String>),
}

impl Placement {
    /// Writes the placement into the vertex payload it targets.
    pub fn apply(&self, graph: &mut Graph) -> Result<()> {
        match self {
            Placement::Positions(layout) => layout.apply(graph),
            Placement::Sizes(sizes) => {
                for (&id, &size) in sizes {
                    graph.vertex_mut(id)?.size = size;
                }
                Ok(())
            }
            Placement::Colors(colors) => {
                for (&id, color) in colors {
                    graph.vertex_mut(id)?.color.clone_from(color);
                }
                Ok(())
            }
        }
    }
}

/// Computes `index` over the snapshot and maps each actor's standardized score with `mode`.
///
/// Errors raised by the index, a disconnected graph for closeness among them, are returned
/// unchanged.
///
/// # Examples
///
/// ```
/// use sociogram::{
///     centrality::Index,
///     config::AnalysisConfig,
///     graph::Graph,
///     layout::{prominence::{prominence_layout, Placement, ProminenceMode}, Canvas},
/// };
///
/// let mut graph = Graph::undirected();
/// let hub = graph.add_vertex();
/// for _ in 0..3 {
///     let leaf = graph.add_vertex();
///     graph.add_edge(hub, leaf, 1.0).unwrap();
/// }
///
/// let canvas = Canvas::default();
/// let snapshot = graph.snapshot(&AnalysisConfig::default());
/// let placement =
///     prominence_layout(&snapshot, Index::Degree, ProminenceMode::Radial, &canvas, &mut ())
///         .unwrap();
///
/// let Placement::Positions(layout) = placement else { unreachable!() };
/// let center = canvas.center();
/// assert!(layout.get(hub).unwrap().distance(&center) < layout.get(2).unwrap().distance(&center));
/// ```
pub fn prominence_layout(
    snapshot: &Snapshot,
    index: Index,
    mode: ProminenceMode,
    canvas: &Canvas,
    observer: &mut dyn Observer,
) -> Result<Placement> {
    let start = Instant::now();
    let scores = index.compute(snapshot, observer)?;
    let shares = shares(&scores);

    let placement = match mode {
        ProminenceMode::Radial => Placement::Positions(radial(&shares, canvas)),
        ProminenceMode::Leveled => Placement::Positions(leveled(&shares, canvas)),
        ProminenceMode::NodeSize => Placement::Sizes(
            shares
                .iter()
                .map(|&(id, share)| (id, MIN_NODE_SIZE + share * (MAX_NODE_SIZE - MIN_NODE_SIZE)))
                .collect(),
        ),
        ProminenceMode::NodeColor => Placement::Colors(
            shares
                .iter()
                .map(|&(id, share)| (id, heat_color(share)))
                .collect(),
        ),
    };

    info!(index = index.abbreviation(), ?mode, elapsed = ?start.elapsed(), "placed by prominence");

    Ok(placement)
}

/// Each actor's standardized score relative to the top one, in `[0, 1]`.
fn shares(scores: &Scores) -> Vec<(VertexId, f64)> {
    let max = scores.max().map_or(0.0, |(_, value)| value);

    scores
        .iter()
        .map(|(id, score)| {
            let share = if max > 0.0 {
                (score.standardized / max).clamp(0.0, 1.0)
            } else {
                0.0
            };
            (id, share)
        })
        .collect()
}

fn radial(shares: &[(VertexId, f64)], canvas: &Canvas) -> Layout {
    let center = canvas.center();
    let outer = canvas.max_radius();
    let inner = outer * INNER_RADIUS;
    let step = TAU / shares.len().max(1) as f64;

    shares
        .iter()
        .enumerate()
        .map(|(k, &(id, share))| {
            let radius = inner + (1.0 - share) * (outer - inner);
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

fn leveled(shares: &[(VertexId, f64)], canvas: &Canvas) -> Layout {
    let inner_width = canvas.width - 2.0 * canvas.margin;
    let inner_height = canvas.height - 2.0 * canvas.margin;
    let columns = shares.len().max(1) as f64;

    shares
        .iter()
        .enumerate()
        .map(|(k, &(id, share))| {
            let x = canvas.margin + (k as f64 + 0.5) / columns * inner_width;
            let y = canvas.margin + (1.0 - share) * inner_height;
            (id, Point::new(x, y))
        })
        .collect()
}

/// Maps a share to a fully saturated hue, 240° (blue) at zero down to 0° (red) at one.
fn heat_color(share: f64) -> String {
    let hue = 240.0 * (1.0 - share.clamp(0.0, 1.0));
    let sector = hue / 60.0;
    let falling = 1.0 - (sector % 2.0 - 1.0).abs();

    let (r, g, b) = match sector as u32 {
        0 => (1.0, falling, 0.0),
        1 => (falling, 1.0, 0.0),
        2 => (0.0, 1.0, falling),
        3 => (0.0, falling, 1.0),
        _ => (0.0, 0.0, 1.0),
    };

    let channel = |value: f64| (value * 255.0).round() as u8;
    format!("#{:02x}{:02x}{:02x}", channel(r), channel(g), channel(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::AnalysisConfig, error::Error};

    fn place(graph: &Graph, index: Index, mode: ProminenceMode) -> Result<Placement> {
        prominence_layout(
            &graph.snapshot(&AnalysisConfig::default()),
            index,
            mode,
            &Canvas::default(),
            &mut (),
        )
    }

    #[test]
    fn heat_colors() {
        assert_eq!(heat_color(0.0), "#0000ff");
        assert_eq!(heat_color(0.5), "#00ff00");
        assert_eq!(heat_color(1.0), "#ff0000");
    }

    #[test]
    fn radial_puts_the_hub_inside() {
        let graph = graph!([1, 2], [1, 3], [1, 4], [1, 5]);
        let canvas = Canvas::default();

        let Ok(Placement::Positions(layout)) = place(&graph, Index::Degree, ProminenceMode::Radial)
        else {
            panic!("expected positions");
        };

        let center = canvas.center();
        let hub = layout.get(1).unwrap().distance(&center);
        assert!((hub - canvas.max_radius() * INNER_RADIUS).abs() < 1e-9);

        for leaf in 2..=5 {
            let radius = layout.get(leaf).unwrap().distance(&center);
            assert!(radius > hub);
            assert!(canvas.contains(&layout.get(leaf).unwrap()));
        }
    }

    #[test]
    fn leveled_puts_the_hub_on_top() {
        let graph = graph!([1, 2], [1, 3], [1, 4]);
        let canvas = Canvas::default();

        let Ok(Placement::Positions(layout)) =
            place(&graph, Index::Degree, ProminenceMode::Leveled)
        else {
            panic!("expected positions");
        };

        assert_eq!(layout.get(1).unwrap().y, canvas.margin);
        assert!(layout.get(2).unwrap().y > canvas.margin);
        assert_eq!(layout.get(2).unwrap().y, layout.get(3).unwrap().y);
    }

    #[test]
    fn sizes_and_colors() {
        let mut graph = graph!([1, 2], [1, 3]);

        let sizes = place(&graph, Index::Degree, ProminenceMode::NodeSize).unwrap();
        let colors = place(&graph, Index::Degree, ProminenceMode::NodeColor).unwrap();

        sizes.apply(&mut graph).unwrap();
        colors.apply(&mut graph).unwrap();

        assert_eq!(graph.vertex(1).unwrap().size, MAX_NODE_SIZE);
        assert_eq!(
            graph.vertex(2).unwrap().size,
            MIN_NODE_SIZE + 0.5 * (MAX_NODE_SIZE - MIN_NODE_SIZE)
        );
        assert_eq!(graph.vertex(1).unwrap().color, "#ff0000");
        assert_eq!(graph.vertex(3).unwrap().color, "#00ff00");
    }

    #[test]
    fn no_ties_means_least_prominent() {
        let mut graph = Graph::undirected();
        graph.add_vertex();
        graph.add_vertex();

        let Ok(Placement::Sizes(sizes)) = place(&graph, Index::Degree, ProminenceMode::NodeSize)
        else {
            panic!("expected sizes");
        };

        assert!(sizes.values().all(|&size| size == MIN_NODE_SIZE));
    }

    #[test]
    fn disconnected_closeness_is_reported() {
        let graph = graph!([1, 2], [3, 4]);

        assert_eq!(
            place(&graph, Index::Closeness, ProminenceMode::Radial),
            Err(Error::DisconnectedGraph {
                index: Index::Closeness.name()
            })
        );
    }
}
