#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use spade::{
    DelaunayTriangulation, FloatTriangulation, HasPosition, InsertionError,
    Point2 as SpadePoint2, PositionInTriangulation, Triangulation,
};
use tracing::{debug, info, warn};

use crate::error::{InterpolationError, Result};
use crate::field::{Raster, Sample, SampleSet};
use crate::math::linspace;

/// Raster size in grid points along each axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub nx: usize,
    pub ny: usize,
}

impl Resolution {
    /// `nx` columns by `ny` rows.
    #[must_use]
    pub fn new(nx: usize, ny: usize) -> Self {
        Self { nx, ny }
    }
}

impl Default for Resolution {
    fn default() -> Self {
        Self { nx: 100, ny: 100 }
    }
}

/// Kernel used to estimate a value at a grid point.
///
/// Every kernel yields no-data outside the convex hull of the samples.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterpolationMethod {
    /// Barycentric interpolation inside the enclosing Delaunay triangle.
    #[default]
    Linear,
    /// Value of the closest sample.
    Nearest,
    /// Sibson natural-neighbour interpolation; smooth away from samples.
    NaturalNeighbor,
}

/// Parameters controlling scattered-data interpolation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterpolationParams {
    pub resolution: Resolution,
    pub method: InterpolationMethod,
}

/// A sample as stored in the triangulation.
#[derive(Debug, Clone, Copy)]
struct FieldVertex {
    position: SpadePoint2<f64>,
    value: f64,
}

impl HasPosition for FieldVertex {
    type Scalar = f64;

    fn position(&self) -> SpadePoint2<f64> {
        self.position
    }
}

type FieldTriangulation = DelaunayTriangulation<FieldVertex>;

/// Interpolates scattered samples onto a regular raster spanning their
/// bounding box.
pub struct Interpolate {
    params: InterpolationParams,
}

impl Interpolate {
    /// Creates a new `Interpolate` operation.
    #[must_use]
    pub fn new(params: InterpolationParams) -> Self {
        Self { params }
    }

    /// Executes the interpolation, returning the raster.
    ///
    /// Fewer than three non-collinear samples produce a raster in which every
    /// cell is no-data. With no samples at all the grid collapses onto the
    /// origin. Samples sharing coordinates are reduced to the first one;
    /// samples with non-finite fields or with coordinates the triangulation
    /// cannot represent are dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the resolution has a zero axis or the samples
    /// cannot be triangulated.
    pub fn execute(&self, samples: &SampleSet) -> Result<Raster> {
        let Resolution { nx, ny } = self.params.resolution;
        if nx == 0 || ny == 0 {
            return Err(InterpolationError::InvalidResolution { nx, ny }.into());
        }

        let finite: SampleSet = samples.iter().copied().filter(Sample::is_finite).collect();
        let dropped = samples.len() - finite.len();
        if dropped > 0 {
            warn!(dropped, "Dropped samples with non-finite fields");
        }
        let usable: SampleSet = finite.iter().copied().filter(is_triangulable).collect();
        let dropped = finite.len() - usable.len();
        if dropped > 0 {
            warn!(dropped, "Dropped samples with coordinates too small to triangulate");
        }
        let finite = usable;

        let Some(bounds) = finite.bounds() else {
            debug!("No samples, raster is all no-data");
            return Ok(Raster::no_data(vec![0.0; nx], vec![0.0; ny]));
        };
        let xs = linspace(bounds.min.x, bounds.max.x, nx);
        let ys = linspace(bounds.min.y, bounds.max.y, ny);

        let unique = finite.deduplicated();
        if unique.len() < finite.len() {
            debug!(
                duplicates = finite.len() - unique.len(),
                "Collapsed coincident samples, keeping first"
            );
        }

        let triangulation = triangulate(&unique)?;
        if triangulation.num_inner_faces() == 0 {
            debug!(
                samples = unique.len(),
                "Samples span no triangle, raster is all no-data"
            );
            return Ok(Raster::no_data(xs, ys));
        }

        let method = self.params.method;
        let row = |y: &f64| -> Vec<Option<f64>> {
            xs.iter()
                .map(|&x| evaluate(&triangulation, method, SpadePoint2::new(x, *y)))
                .collect()
        };
        #[cfg(feature = "parallel")]
        let rows: Vec<Vec<Option<f64>>> = ys.par_iter().map(row).collect();
        #[cfg(not(feature = "parallel"))]
        let rows: Vec<Vec<Option<f64>>> = ys.iter().map(row).collect();

        let raster = Raster::from_grid(xs, ys, rows.concat());
        info!(
            samples = unique.len(),
            triangles = triangulation.num_inner_faces(),
            nx,
            ny,
            covered = raster.data_count(),
            ?method,
            "Interpolated scattered samples"
        );
        Ok(raster)
    }
}

/// Whether the triangulation accepts the sample's position. Nonzero
/// coordinates below roughly `1e-43` in magnitude are refused.
fn is_triangulable(sample: &Sample) -> bool {
    spade::validate_coordinate(sample.x).is_ok() && spade::validate_coordinate(sample.y).is_ok()
}

fn triangulate(samples: &[Sample]) -> Result<FieldTriangulation> {
    let vertices = samples
        .iter()
        .map(|s| FieldVertex {
            position: SpadePoint2::new(s.x, s.y),
            value: s.value,
        })
        .collect();
    let triangulation = FieldTriangulation::bulk_load(vertices).map_err(|e: InsertionError| {
        InterpolationError::Triangulation(format!("Delaunay bulk load: {e}"))
    })?;
    Ok(triangulation)
}

fn evaluate(
    triangulation: &FieldTriangulation,
    method: InterpolationMethod,
    position: SpadePoint2<f64>,
) -> Option<f64> {
    match method {
        InterpolationMethod::Linear => triangulation
            .barycentric()
            .interpolate(|v| v.data().value, position),
        InterpolationMethod::NaturalNeighbor => triangulation
            .natural_neighbor()
            .interpolate(|v| v.data().value, position),
        InterpolationMethod::Nearest => match triangulation.locate(position) {
            PositionInTriangulation::OutsideOfConvexHull(_)
            | PositionInTriangulation::NoTriangulation => None,
            _ => triangulation
                .nearest_neighbor(position)
                .map(|v| v.data().value),
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::error::GridViewError;

    fn plane(x: f64, y: f64) -> f64 {
        2.0 * x + 3.0 * y + 1.0
    }

    fn square_with_center() -> Vec<Sample> {
        [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0), (0.5, 0.5)]
            .into_iter()
            .map(|(x, y)| Sample::new(x, y, plane(x, y)))
            .collect()
    }

    fn run(samples: Vec<Sample>, nx: usize, ny: usize, method: InterpolationMethod) -> Raster {
        Interpolate::new(InterpolationParams {
            resolution: Resolution::new(nx, ny),
            method,
        })
        .execute(&SampleSet::new(samples))
        .unwrap()
    }

    #[test]
    fn default_resolution_is_100_by_100() {
        let raster = Interpolate::new(InterpolationParams::default())
            .execute(&SampleSet::new(square_with_center()))
            .unwrap();
        assert_eq!(raster.nx(), 100);
        assert_eq!(raster.ny(), 100);
    }

    #[test]
    fn linear_reproduces_plane_over_hull() {
        let raster = run(square_with_center(), 11, 7, InterpolationMethod::Linear);
        assert_eq!(raster.data_count(), 77);
        for iy in 0..raster.ny() {
            for ix in 0..raster.nx() {
                let p = raster.position(ix, iy).unwrap();
                let v = raster.value(ix, iy).unwrap();
                assert_abs_diff_eq!(v, plane(p.x, p.y), epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn grid_spans_sample_bounding_box() {
        let samples = vec![
            Sample::new(-2.0, 1.0, 0.0),
            Sample::new(3.0, 1.0, 0.0),
            Sample::new(0.0, 5.0, 0.0),
        ];
        let raster = run(samples, 6, 5, InterpolationMethod::Linear);
        assert_abs_diff_eq!(raster.xs()[0], -2.0);
        assert_abs_diff_eq!(raster.xs()[5], 3.0);
        assert_abs_diff_eq!(raster.ys()[0], 1.0);
        assert_abs_diff_eq!(raster.ys()[4], 5.0);
    }

    #[test]
    fn cells_outside_hull_are_no_data() {
        let samples = vec![
            Sample::new(0.0, 0.0, 1.0),
            Sample::new(1.0, 0.0, 1.0),
            Sample::new(0.0, 1.0, 1.0),
        ];
        let raster = run(samples, 5, 5, InterpolationMethod::Linear);
        assert_abs_diff_eq!(raster.value(0, 0).unwrap(), 1.0, epsilon = 1e-12);
        assert_eq!(raster.value(4, 4), None);
        assert_eq!(raster.value(3, 3), None);
        assert!(raster.value(1, 1).is_some());
        assert!(raster.data_count() < 25);
    }

    #[test]
    fn two_samples_give_all_no_data() {
        let samples = vec![Sample::new(0.0, 0.0, 1.0), Sample::new(1.0, 1.0, 2.0)];
        let raster = run(samples, 10, 10, InterpolationMethod::Linear);
        assert_eq!(raster.values().len(), 100);
        assert!(raster.is_all_no_data());
    }

    #[test]
    fn collinear_samples_give_all_no_data() {
        let samples = (0..5)
            .map(|i| Sample::new(f64::from(i), 2.0 * f64::from(i), 1.0))
            .collect();
        let raster = run(samples, 8, 8, InterpolationMethod::NaturalNeighbor);
        assert!(raster.is_all_no_data());
    }

    #[test]
    fn no_samples_give_all_no_data() {
        let raster = run(Vec::new(), 4, 3, InterpolationMethod::Nearest);
        assert_eq!(raster.nx(), 4);
        assert_eq!(raster.ny(), 3);
        assert!(raster.is_all_no_data());
    }

    #[test]
    fn zero_resolution_is_rejected() {
        let err = Interpolate::new(InterpolationParams {
            resolution: Resolution::new(0, 10),
            method: InterpolationMethod::Linear,
        })
        .execute(&SampleSet::new(square_with_center()))
        .unwrap_err();
        assert!(matches!(
            err,
            GridViewError::Interpolation(InterpolationError::InvalidResolution { nx: 0, ny: 10 })
        ));
    }

    #[test]
    fn coincident_samples_keep_first() {
        let mut samples = square_with_center();
        samples.push(Sample::new(0.0, 0.0, 100.0));
        let raster = run(samples, 3, 3, InterpolationMethod::Linear);
        assert_abs_diff_eq!(raster.value(0, 0).unwrap(), plane(0.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn non_finite_samples_are_dropped() {
        let mut samples = square_with_center();
        samples.push(Sample::new(f64::NAN, 0.5, 1.0));
        samples.push(Sample::new(0.2, 0.2, f64::INFINITY));
        let raster = run(samples, 5, 5, InterpolationMethod::Linear);
        assert_eq!(raster.data_count(), 25);
        assert_abs_diff_eq!(raster.xs()[0], 0.0);
    }

    #[test]
    fn tiny_coordinates_are_dropped_not_fatal() {
        let samples: SampleSet = vec![
            Sample::new(0.0, 0.0, 1.0),
            Sample::new(1.0, 1e-50, 2.0),
            Sample::new(0.0, 1.0, 3.0),
        ]
        .into_iter()
        .collect();
        let raster = Interpolate::new(InterpolationParams::default())
            .execute(&samples)
            .unwrap();
        assert!(raster.is_all_no_data());

        let samples: SampleSet = vec![
            Sample::new(0.0, 0.0, 1.0),
            Sample::new(1.0, 0.0, 2.0),
            Sample::new(0.0, 1.0, 3.0),
            Sample::new(0.5, 1e-50, 9.0),
        ]
        .into_iter()
        .collect();
        let raster = Interpolate::new(InterpolationParams {
            resolution: Resolution::new(3, 3),
            method: InterpolationMethod::Linear,
        })
        .execute(&samples)
        .unwrap();
        assert_abs_diff_eq!(raster.value(1, 0).unwrap(), 1.5, epsilon = 1e-12);
    }

    #[test]
    fn nearest_takes_sample_values_inside_hull() {
        let samples = vec![
            Sample::new(0.0, 0.0, 1.0),
            Sample::new(1.0, 0.0, 2.0),
            Sample::new(0.0, 1.0, 3.0),
        ];
        let raster = run(samples, 5, 5, InterpolationMethod::Nearest);
        assert_eq!(raster.value(0, 0), Some(1.0));
        assert_eq!(raster.value(4, 0), Some(2.0));
        assert_eq!(raster.value(0, 4), Some(3.0));
        assert_eq!(raster.value(4, 4), None);
    }

    #[test]
    fn natural_neighbor_reproduces_plane_inside() {
        let raster = run(square_with_center(), 4, 4, InterpolationMethod::NaturalNeighbor);
        for (ix, iy) in [(1, 1), (2, 1), (1, 2), (2, 2)] {
            let p = raster.position(ix, iy).unwrap();
            let v = raster.value(ix, iy).unwrap();
            assert_abs_diff_eq!(v, plane(p.x, p.y), epsilon = 1e-9);
        }
    }

    #[test]
    fn result_is_independent_of_sample_order() {
        let forward = run(square_with_center(), 9, 9, InterpolationMethod::Linear);
        let mut reversed_samples = square_with_center();
        reversed_samples.reverse();
        let reversed = run(reversed_samples, 9, 9, InterpolationMethod::Linear);
        for (a, b) in forward.values().iter().zip(reversed.values()) {
            assert_abs_diff_eq!(a.unwrap(), b.unwrap(), epsilon = 1e-12);
        }
    }
}
