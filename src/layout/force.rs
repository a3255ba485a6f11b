//! Force-directed placement.
//!
//! Every model runs for a fixed number of iterations starting from the positions stored in the
//! graph, or from a circle when those all coincide. Eades and Fruchterman–Reingold move every
//! actor once per iteration and keep it inside the canvas margins. Kamada–Kawai works in its own
//! coordinates and the result is fitted to the canvas at the end.

use std::{f64::consts::TAU, time::Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{circular_layout, Canvas, Layout};
use crate::{
    config::AnalysisConfig,
    error::Result,
    graph::Graph,
    matrix::Snapshot,
    progress::{Observer, Progress},
    vertex::Point,
};

/// Two actors closer than this are pushed apart as if they were this far.
const MIN_DISTANCE: f64 = 0.01;

/// Eades's spring constant, natural length (in units of the ideal edge length), repulsion
/// constant and step size.
const EADES_SPRING: f64 = 2.0;
const EADES_LENGTH: f64 = 1.0;
const EADES_REPULSION: f64 = 1.0;
const EADES_STEP: f64 = 0.1;

/// Kamada–Kawai stops early once no actor's energy gradient exceeds this.
const KAMADA_KAWAI_EPSILON: f64 = 1e-4;

/// The physical models.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ForceModel {
    /// Logarithmic springs between tied actors, inverse-square repulsion between all.
    Eades,
    /// Quadratic attraction between tied actors, inverse repulsion between all, with cooling.
    #[default]
    FruchtermanReingold,
    /// Springs between every pair with the geodesic distance as natural length.
    KamadaKawai,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForceOptions {
    pub model: ForceModel,
    pub iterations: usize,
}

impl Default for ForceOptions {
    fn default() -> Self {
        Self {
            model: ForceModel::default(),
            iterations: 100,
        }
    }
}

impl ForceOptions {
    pub fn new(model: ForceModel) -> Self {
        Self {
            model,
            ..Default::default()
        }
    }

    pub const fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }
}

/// Runs a force-directed simulation over the graph's current relation.
///
/// The snapshot taken with `config` decides which actors take part and which pairs are tied.
/// Progress advances once per iteration.
///
/// # Examples
///
/// ```
/// use sociogram::{
///     config::AnalysisConfig,
///     graph::Graph,
///     layout::{force::{force_directed, ForceModel, ForceOptions}, Canvas},
/// };
///
/// let mut graph = Graph::undirected();
/// for _ in 0..4 {
///     graph.add_vertex();
/// }
/// for (source, target) in [(1, 2), (2, 3), (3, 4)] {
///     graph.add_edge(source, target, 1.0).unwrap();
/// }
///
/// let canvas = Canvas::default();
/// let options = ForceOptions::new(ForceModel::Eades);
/// let layout = force_directed(&graph, &AnalysisConfig::default(), &options, &canvas, &mut ())
///     .unwrap();
///
/// assert_eq!(layout.len(), 4);
/// assert!(layout.iter().all(|(_, point)| canvas.contains(&point)));
/// layout.apply(&mut graph).unwrap();
/// ```
pub fn force_directed(
    graph: &Graph,
    config: &AnalysisConfig,
    options: &ForceOptions,
    canvas: &Canvas,
    observer: &mut dyn Observer,
) -> Result<Layout> {
    config.validate()?;

    let start = Instant::now();
    let snapshot = graph.snapshot(config);
    let mut positions = initial_positions(graph, &snapshot, canvas)?;

    if snapshot.len() > 1 {
        match options.model {
            ForceModel::Eades => eades(&snapshot, &mut positions, options, canvas, observer)?,
            ForceModel::FruchtermanReingold => {
                fruchterman_reingold(&snapshot, &mut positions, options, canvas, observer)?
            }
            ForceModel::KamadaKawai => {
                kamada_kawai(&snapshot, &mut positions, options, observer)?;
                fit(&mut positions, canvas);
            }
        }
    }

    info!(
        model = ?options.model,
        n = snapshot.len(),
        iterations = options.iterations,
        elapsed = ?start.elapsed(),
        "ran force-directed layout"
    );

    Ok(snapshot.ids().iter().copied().zip(positions).collect())
}

/// Stored positions, or a circle when they all coincide.
fn initial_positions(graph: &Graph, snapshot: &Snapshot, canvas: &Canvas) -> Result<Vec<Point>> {
    let stored = snapshot
        .ids()
        .iter()
        .map(|&id| graph.vertex(id).map(|vertex| vertex.position))
        .collect::<Result<Vec<Point>>>()?;

    let coincide = stored.windows(2).all(|pair| pair[0] == pair[1]);
    if stored.len() > 1 && coincide {
        debug!("stored positions coincide, starting from a circle");
        let circle = circular_layout(snapshot.ids(), canvas);
        return Ok(circle.iter().map(|(_, point)| point).collect());
    }

    Ok(stored.into_iter().map(|point| canvas.clamp(point)).collect())
}

/// The vector from `b` to `a` and its length, never shorter than [`MIN_DISTANCE`]. Coinciding
/// actors are separated along a direction derived from their indices.
fn separation(positions: &[Point], a: usize, b: usize) -> (f64, f64, f64) {
    let dx = positions[a].x - positions[b].x;
    let dy = positions[a].y - positions[b].y;
    let distance = dx.hypot(dy);

    if distance >= MIN_DISTANCE {
        return (dx, dy, distance);
    }

    let angle = TAU * (a * 31 + b * 17) as f64 / 97.0;
    (
        MIN_DISTANCE * angle.cos(),
        MIN_DISTANCE * angle.sin(),
        MIN_DISTANCE,
    )
}

/// The edge length the canvas allows if every actor gets an equal share of its area.
fn ideal_length(canvas: &Canvas, n: usize) -> f64 {
    let width = canvas.width - 2.0 * canvas.margin;
    let height = canvas.height - 2.0 * canvas.margin;
    (width * height / n as f64).sqrt().max(MIN_DISTANCE)
}

fn eades(
    snapshot: &Snapshot,
    positions: &mut [Point],
    options: &ForceOptions,
    canvas: &Canvas,
    observer: &mut dyn Observer,
) -> Result<()> {
    let n = positions.len();
    let k = ideal_length(canvas, n);
    let mut progress = Progress::new(observer, options.iterations);

    for _ in 0..options.iterations {
        let mut displacement = vec![(0.0, 0.0); n];

        for i in 0..n {
            for j in 0..n {
                if i == j {
                    continue;
                }

                let (dx, dy, distance) = separation(positions, i, j);
                let length = distance / k;

                // Positive pushes `i` away from `j`.
                let mut force = EADES_REPULSION / (length * length);
                if snapshot.tied(i, j) {
                    force -= EADES_SPRING * (length / EADES_LENGTH).ln();
                }

                displacement[i].0 += dx / distance * force * EADES_STEP * k;
                displacement[i].1 += dy / distance * force * EADES_STEP * k;
            }
        }

        move_all(positions, &displacement, f64::INFINITY, canvas);
        progress.tick()?;
    }

    Ok(())
}

fn fruchterman_reingold(
    snapshot: &Snapshot,
    positions: &mut [Point],
    options: &ForceOptions,
    canvas: &Canvas,
    observer: &mut dyn Observer,
) -> Result<()> {
    let n = positions.len();
    let k = ideal_length(canvas, n);
    let initial_temperature = (canvas.width - 2.0 * canvas.margin).max(0.0) / 10.0;
    let mut progress = Progress::new(observer, options.iterations);

    for iteration in 0..options.iterations {
        let temperature =
            initial_temperature * (1.0 - iteration as f64 / options.iterations as f64);
        let mut displacement = vec![(0.0, 0.0); n];

        for i in 0..n {
            for j in 0..n {
                if i == j {
                    continue;
                }

                let (dx, dy, distance) = separation(positions, i, j);

                let mut force = k * k / distance;
                if snapshot.tied(i, j) {
                    force -= distance * distance / k;
                }

                displacement[i].0 += dx / distance * force;
                displacement[i].1 += dy / distance * force;
            }
        }

        move_all(positions, &displacement, temperature, canvas);
        progress.tick()?;
    }

    Ok(())
}

/// Moves every actor by its displacement, capped at `limit`, and keeps it on the canvas.
fn move_all(positions: &mut [Point], displacement: &[(f64, f64)], limit: f64, canvas: &Canvas) {
    for (position, &(dx, dy)) in positions.iter_mut().zip(displacement) {
        let length = dx.hypot(dy);
        if length == 0.0 || !length.is_finite() {
            continue;
        }

        let step = length.min(limit);
        *position = canvas.clamp(Point::new(
            position.x + dx / length * step,
            position.y + dy / length * step,
        ));
    }
}

/// Minimizes the spring energy one actor at a time, always moving the actor with the steepest
/// gradient with a Newton–Raphson step. Each iteration moves `n` actors.
fn kamada_kawai(
    snapshot: &Snapshot,
    positions: &mut [Point],
    options: &ForceOptions,
    observer: &mut dyn Observer,
) -> Result<()> {
    let n = positions.len();
    snapshot.config().limits.check("kamada-kawai layout", n)?;

    let targets = target_distances(snapshot, observer)?;

    // Natural lengths scale so the diameter spans the initial drawing.
    let diameter = targets.iter().flatten().copied().fold(0.0, f64::max);
    let extent = positions
        .iter()
        .flat_map(|a| positions.iter().map(move |b| a.distance(b)))
        .fold(0.0, f64::max)
        .max(1.0);
    let unit = extent / diameter.max(1.0);

    let springs = |i: usize, j: usize| {
        let target = targets[i][j];
        (unit * target, 1.0 / (target * target))
    };

    let gradient = |positions: &[Point], m: usize| {
        let (mut ex, mut ey) = (0.0, 0.0);
        for i in (0..n).filter(|&i| i != m) {
            let (dx, dy, distance) = separation(positions, m, i);
            let (length, strength) = springs(m, i);
            ex += strength * (dx - length * dx / distance);
            ey += strength * (dy - length * dy / distance);
        }
        (ex, ey)
    };

    let mut progress = Progress::new(observer, options.iterations);

    'iterations: for _ in 0..options.iterations {
        for _ in 0..n {
            let (m, steepest) = (0..n)
                .map(|m| {
                    let (ex, ey) = gradient(&*positions, m);
                    (m, ex.hypot(ey))
                })
                .fold((0, f64::NEG_INFINITY), |best, candidate| {
                    if candidate.1 > best.1 {
                        candidate
                    } else {
                        best
                    }
                });

            if steepest < KAMADA_KAWAI_EPSILON {
                debug!("kamada-kawai converged");
                break 'iterations;
            }

            let (ex, ey) = gradient(&*positions, m);
            let (mut exx, mut eyy, mut exy) = (0.0, 0.0, 0.0);
            for i in (0..n).filter(|&i| i != m) {
                let (dx, dy, distance) = separation(positions, m, i);
                let (length, strength) = springs(m, i);
                let cube = distance.powi(3);
                exx += strength * (1.0 - length * dy * dy / cube);
                eyy += strength * (1.0 - length * dx * dx / cube);
                exy += strength * length * dx * dy / cube;
            }

            let determinant = exx * eyy - exy * exy;
            if determinant.abs() < f64::EPSILON {
                break;
            }

            positions[m].x += (exy * ey - eyy * ex) / determinant;
            positions[m].y += (exy * ex - exx * ey) / determinant;
        }

        progress.tick()?;
    }

    Ok(())
}

/// Symmetric geodesic distances; unreachable pairs are one longer than the longest path.
fn target_distances(snapshot: &Snapshot, observer: &mut dyn Observer) -> Result<Vec<Vec<f64>>> {
    let distances = &snapshot.paths_with(observer)?.distances;
    let n = snapshot.len();

    let shortest = |i: usize, j: usize| distances[(i, j)].min(distances[(j, i)]);
    let longest = (0..n)
        .flat_map(|i| (0..n).map(move |j| (i, j)))
        .map(|(i, j)| shortest(i, j))
        .filter(|distance| distance.is_finite())
        .fold(0.0, f64::max);

    Ok((0..n)
        .map(|i| {
            (0..n)
                .map(|j| {
                    let distance = shortest(i, j);
                    if distance.is_finite() {
                        distance.max(MIN_DISTANCE)
                    } else {
                        longest + 1.0
                    }
                })
                .collect()
        })
        .collect())
}

/// Scales and translates the drawing to fill the area inside the margins, keeping its
/// proportions.
fn fit(positions: &mut [Point], canvas: &Canvas) {
    let (min_x, max_x) = bounds(positions.iter().map(|point| point.x));
    let (min_y, max_y) = bounds(positions.iter().map(|point| point.y));

    let width = canvas.width - 2.0 * canvas.margin;
    let height = canvas.height - 2.0 * canvas.margin;
    let span = (max_x - min_x).max(max_y - min_y);
    let scale = if span > 0.0 {
        (width / span).min(height / span)
    } else {
        0.0
    };

    let center = canvas.center();
    let (middle_x, middle_y) = ((min_x + max_x) / 2.0, (min_y + max_y) / 2.0);

    for point in positions.iter_mut() {
        *point = canvas.clamp(Point::new(
            center.x + (point.x - middle_x) * scale,
            center.y + (point.y - middle_y) * scale,
        ));
    }
}

fn bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), value| {
        (min.min(value), max.max(value))
    })
}
