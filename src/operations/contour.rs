use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ContourError, Result};
use crate::field::Raster;
use crate::math::Point2;

/// Iso-values to extract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContourLevels {
    /// `n` equally spaced levels strictly inside the raster's value range.
    Count(usize),
    /// Explicit, strictly ascending levels.
    Explicit(Vec<f64>),
}

impl Default for ContourLevels {
    fn default() -> Self {
        Self::Count(10)
    }
}

impl ContourLevels {
    /// Largest level count `Count` accepts.
    pub const MAX_COUNT: usize = 10_000;

    /// Resolves the concrete level values for `raster`.
    ///
    /// `Count(n)` yields `min + (max - min) * k / (n + 1)` for `k = 1..=n`,
    /// so neither extreme of the observed range is a level. It yields nothing
    /// for an all no-data or constant raster.
    ///
    /// # Errors
    ///
    /// Returns `ContourError::InvalidLevels` if explicit levels are not
    /// finite or not strictly ascending, or if a count exceeds
    /// [`Self::MAX_COUNT`].
    #[allow(clippy::cast_precision_loss)]
    pub fn resolve(&self, raster: &Raster) -> std::result::Result<Vec<f64>, ContourError> {
        match self {
            Self::Explicit(levels) => {
                if let Some(bad) = levels.iter().find(|v| !v.is_finite()) {
                    return Err(ContourError::InvalidLevels(format!(
                        "level {bad} is not finite"
                    )));
                }
                if let Some(pair) = levels.windows(2).find(|w| w[0] >= w[1]) {
                    return Err(ContourError::InvalidLevels(format!(
                        "levels must be strictly ascending, found {} then {}",
                        pair[0], pair[1]
                    )));
                }
                Ok(levels.clone())
            }
            Self::Count(n) => {
                if *n > Self::MAX_COUNT {
                    return Err(ContourError::InvalidLevels(format!(
                        "level count {n} exceeds {}",
                        Self::MAX_COUNT
                    )));
                }
                let Some((lo, hi)) = raster.value_range() else {
                    return Ok(Vec::new());
                };
                if hi <= lo {
                    return Ok(Vec::new());
                }
                let step = (hi - lo) / (*n + 1) as f64;
                Ok((1..=*n).map(|k| lo + step * k as f64).collect())
            }
        }
    }
}

/// One iso-line polyline.
#[derive(Debug, Clone, PartialEq)]
pub struct Contour {
    /// Iso-value followed by this polyline.
    pub level: f64,
    /// Ordered vertices. For a closed contour the last point repeats the first.
    pub points: Vec<Point2>,
    /// Whether the polyline returns to its start.
    pub closed: bool,
}

/// Iso-lines for a set of levels.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContourSet {
    /// Levels that were traced, ascending.
    pub levels: Vec<f64>,
    /// Polylines for all levels, grouped by level in ascending order.
    pub contours: Vec<Contour>,
}

impl ContourSet {
    /// Number of polylines over all levels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.contours.len()
    }

    /// Whether no polyline was traced.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.contours.is_empty()
    }

    /// Iterates over polylines, grouped by ascending level.
    pub fn iter(&self) -> std::slice::Iter<'_, Contour> {
        self.contours.iter()
    }

    /// Polylines following exactly `level`.
    pub fn for_level(&self, level: f64) -> impl Iterator<Item = &Contour> {
        self.contours.iter().filter(move |c| c.level.to_bits() == level.to_bits())
    }
}

/// Extracts iso-lines from a raster by marching squares.
///
/// A grid cell with any no-data corner produces no segment, so contours end
/// where the raster has gaps instead of bridging them.
pub struct ExtractContours {
    levels: ContourLevels,
}

impl ExtractContours {
    /// Creates a new `ExtractContours` operation.
    #[must_use]
    pub fn new(levels: ContourLevels) -> Self {
        Self { levels }
    }

    /// Executes the extraction.
    ///
    /// Output is fully determined by the raster and the levels: crossings
    /// are keyed by grid edge and polylines are traced in key order.
    ///
    /// # Errors
    ///
    /// Returns an error if the levels are invalid.
    pub fn execute(&self, raster: &Raster) -> Result<ContourSet> {
        let levels = self.levels.resolve(raster)?;
        let range = raster.value_range();
        let mut contours = Vec::new();

        for &level in &levels {
            let in_range = range.is_some_and(|(lo, hi)| level >= lo && level <= hi);
            if !in_range {
                debug!(level, "Level outside raster range, skipped");
                continue;
            }
            let before = contours.len();
            trace_level(raster, level, &mut contours);
            debug!(level, polylines = contours.len() - before, "Traced level");
        }

        info!(
            levels = levels.len(),
            polylines = contours.len(),
            "Extracted contours"
        );
        Ok(ContourSet { levels, contours })
    }
}

/// A grid edge: horizontal edges join `(ix, iy)` and `(ix + 1, iy)`,
/// vertical edges join `(ix, iy)` and `(ix, iy + 1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct GridEdge {
    iy: usize,
    ix: usize,
    vertical: bool,
}

impl GridEdge {
    fn horizontal(ix: usize, iy: usize) -> Self {
        Self {
            iy,
            ix,
            vertical: false,
        }
    }

    fn vertical(ix: usize, iy: usize) -> Self {
        Self {
            iy,
            ix,
            vertical: true,
        }
    }

    fn end(&self) -> (usize, usize) {
        if self.vertical {
            (self.ix, self.iy + 1)
        } else {
            (self.ix + 1, self.iy)
        }
    }
}

/// Segment graph of one level: crossing points and their neighbours.
#[derive(Default)]
struct SegmentGraph {
    points: BTreeMap<GridEdge, Point2>,
    links: BTreeMap<GridEdge, Vec<GridEdge>>,
}

impl SegmentGraph {
    fn connect(&mut self, raster: &Raster, level: f64, a: GridEdge, b: GridEdge) {
        for e in [a, b] {
            self.points
                .entry(e)
                .or_insert_with(|| crossing(raster, level, e));
        }
        self.links.entry(a).or_default().push(b);
        self.links.entry(b).or_default().push(a);
    }
}

/// Corner values of a cell in counter-clockwise order starting bottom-left.
fn cell_corners(raster: &Raster, ix: usize, iy: usize) -> Option<[f64; 4]> {
    Some([
        raster.value(ix, iy)?,
        raster.value(ix + 1, iy)?,
        raster.value(ix + 1, iy + 1)?,
        raster.value(ix, iy + 1)?,
    ])
}

fn trace_level(raster: &Raster, level: f64, out: &mut Vec<Contour>) {
    let mut graph = SegmentGraph::default();

    for iy in 0..raster.ny().saturating_sub(1) {
        for ix in 0..raster.nx().saturating_sub(1) {
            let Some(corners) = cell_corners(raster, ix, iy) else {
                continue;
            };
            march_cell(raster, level, ix, iy, corners, &mut graph);
        }
    }

    for targets in graph.links.values_mut() {
        targets.sort_unstable();
        targets.dedup();
    }

    let mut visited = BTreeSet::new();

    // Open polylines start at a crossing with a single neighbour.
    let starts: Vec<GridEdge> = graph
        .links
        .iter()
        .filter(|(_, n)| n.len() == 1)
        .map(|(e, _)| *e)
        .collect();
    for start in starts {
        if visited.contains(&start) {
            continue;
        }
        let path = walk(&graph, start, &mut visited);
        out.push(to_contour(&graph, level, &path, false));
    }

    // Everything left lies on loops.
    let remaining: Vec<GridEdge> = graph.links.keys().copied().collect();
    for start in remaining {
        if visited.contains(&start) {
            continue;
        }
        let path = walk(&graph, start, &mut visited);
        let closed = path.len() > 2
            && path
                .last()
                .and_then(|last| graph.links.get(last))
                .is_some_and(|n| n.contains(&start));
        out.push(to_contour(&graph, level, &path, closed));
    }
}

/// Emits the segments of one cell. Corners are `[bl, br, tr, tl]`.
fn march_cell(
    raster: &Raster,
    level: f64,
    ix: usize,
    iy: usize,
    corners: [f64; 4],
    graph: &mut SegmentGraph,
) {
    let above = corners.map(|v| v >= level);
    // Cell sides, each joining corner i to corner i + 1.
    let sides = [
        GridEdge::horizontal(ix, iy),
        GridEdge::vertical(ix + 1, iy),
        GridEdge::horizontal(ix, iy + 1),
        GridEdge::vertical(ix, iy),
    ];
    let crossed: Vec<GridEdge> = (0..4)
        .filter(|&i| above[i] != above[(i + 1) % 4])
        .map(|i| sides[i])
        .collect();

    match crossed.as_slice() {
        &[a, b] => graph.connect(raster, level, a, b),
        &[_, _, _, _] => {
            // Saddle: the centre decides which diagonal pair stays joined.
            let center_above = corners.iter().sum::<f64>() / 4.0 >= level;
            for corner in 0..4 {
                if above[corner] != center_above {
                    // Cut this corner off along its two adjacent sides.
                    graph.connect(raster, level, sides[(corner + 3) % 4], sides[corner]);
                }
            }
        }
        _ => {}
    }
}

/// Point where `level` crosses grid edge `e`, interpolated linearly.
fn crossing(raster: &Raster, level: f64, e: GridEdge) -> Point2 {
    let (ex, ey) = e.end();
    let (Some(p0), Some(p1)) = (raster.position(e.ix, e.iy), raster.position(ex, ey)) else {
        return Point2::origin();
    };
    let (Some(v0), Some(v1)) = (raster.value(e.ix, e.iy), raster.value(ex, ey)) else {
        return p0;
    };
    let t = if (v1 - v0).abs() > f64::EPSILON {
        ((level - v0) / (v1 - v0)).clamp(0.0, 1.0)
    } else {
        0.5
    };
    p0 + (p1 - p0) * t
}

fn walk(graph: &SegmentGraph, start: GridEdge, visited: &mut BTreeSet<GridEdge>) -> Vec<GridEdge> {
    let mut path = vec![start];
    visited.insert(start);
    let mut current = start;
    while let Some(next) = graph
        .links
        .get(&current)
        .and_then(|n| n.iter().copied().find(|e| !visited.contains(e)))
    {
        visited.insert(next);
        path.push(next);
        current = next;
    }
    path
}

fn to_contour(graph: &SegmentGraph, level: f64, path: &[GridEdge], closed: bool) -> Contour {
    let mut points: Vec<Point2> = path
        .iter()
        .filter_map(|e| graph.points.get(e).copied())
        .collect();
    if closed {
        if let Some(&first) = points.first() {
            points.push(first);
        }
    }
    Contour {
        level,
        points,
        closed,
    }
}
