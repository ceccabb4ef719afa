use crate::math::Point2;

/// A regular grid of interpolated values.
///
/// Values are stored row by row: `values[iy * nx + ix]` is the value at
/// `(xs[ix], ys[iy])`. `None` marks a no-data cell, which is distinct from
/// a numeric zero.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    xs: Vec<f64>,
    ys: Vec<f64>,
    values: Vec<Option<f64>>,
}

impl Raster {
    /// Builds a raster from axis coordinates and row-major values.
    ///
    /// Returns `None` if `values.len() != xs.len() * ys.len()`.
    #[must_use]
    pub fn from_rows(xs: Vec<f64>, ys: Vec<f64>, values: Vec<Option<f64>>) -> Option<Self> {
        (values.len() == xs.len() * ys.len()).then_some(Self { xs, ys, values })
    }

    /// Builds a raster whose shape is correct by construction.
    pub(crate) fn from_grid(xs: Vec<f64>, ys: Vec<f64>, values: Vec<Option<f64>>) -> Self {
        debug_assert_eq!(values.len(), xs.len() * ys.len());
        Self { xs, ys, values }
    }

    /// A raster where every cell is no-data.
    #[must_use]
    pub fn no_data(xs: Vec<f64>, ys: Vec<f64>) -> Self {
        let values = vec![None; xs.len() * ys.len()];
        Self { xs, ys, values }
    }

    /// Number of columns (x samples).
    #[must_use]
    pub fn nx(&self) -> usize {
        self.xs.len()
    }

    /// Number of rows (y samples).
    #[must_use]
    pub fn ny(&self) -> usize {
        self.ys.len()
    }

    /// Column coordinates, ascending.
    #[must_use]
    pub fn xs(&self) -> &[f64] {
        &self.xs
    }

    /// Row coordinates, ascending.
    #[must_use]
    pub fn ys(&self) -> &[f64] {
        &self.ys
    }

    /// Row-major cell values.
    #[must_use]
    pub fn values(&self) -> &[Option<f64>] {
        &self.values
    }

    /// Value at column `ix`, row `iy`; `None` for no-data or out of range.
    #[must_use]
    pub fn value(&self, ix: usize, iy: usize) -> Option<f64> {
        if ix >= self.nx() || iy >= self.ny() {
            return None;
        }
        self.values[iy * self.nx() + ix]
    }

    /// Grid position of column `ix`, row `iy`.
    #[must_use]
    pub fn position(&self, ix: usize, iy: usize) -> Option<Point2> {
        Some(Point2::new(*self.xs.get(ix)?, *self.ys.get(iy)?))
    }

    /// Iterates over rows of values, bottom row first.
    pub fn rows(&self) -> std::slice::Chunks<'_, Option<f64>> {
        self.values.chunks(self.nx().max(1))
    }

    /// Number of cells holding a value.
    #[must_use]
    pub fn data_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }

    /// Returns `true` if no cell holds a value.
    #[must_use]
    pub fn is_all_no_data(&self) -> bool {
        self.values.iter().all(Option::is_none)
    }

    /// `(min, max)` over cells holding a value.
    #[must_use]
    pub fn value_range(&self) -> Option<(f64, f64)> {
        let mut iter = self.values.iter().flatten().copied();
        let first = iter.next()?;
        Some(iter.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn small() -> Raster {
        Raster::from_rows(
            vec![0.0, 1.0, 2.0],
            vec![0.0, 1.0],
            vec![Some(1.0), None, Some(3.0), Some(0.0), Some(-2.0), None],
        )
        .unwrap()
    }

    #[test]
    fn row_major_indexing() {
        let r = small();
        assert_eq!(r.nx(), 3);
        assert_eq!(r.ny(), 2);
        assert_eq!(r.value(2, 0), Some(3.0));
        assert_eq!(r.value(1, 1), Some(-2.0));
        assert_eq!(r.value(1, 0), None);
        assert_eq!(r.value(3, 0), None);
        let p = r.position(2, 1).unwrap();
        assert!((p.x - 2.0).abs() < f64::EPSILON && (p.y - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn zero_is_data_not_gap() {
        let r = small();
        assert_eq!(r.value(0, 1), Some(0.0));
        assert_eq!(r.data_count(), 4);
        assert_eq!(r.value_range(), Some((-2.0, 3.0)));
    }

    #[test]
    fn mismatched_shape_rejected() {
        assert!(Raster::from_rows(vec![0.0, 1.0], vec![0.0], vec![None]).is_none());
    }

    #[test]
    fn no_data_raster() {
        let r = Raster::no_data(vec![0.0, 1.0], vec![0.0, 1.0, 2.0]);
        assert!(r.is_all_no_data());
        assert_eq!(r.values().len(), 6);
        assert!(r.value_range().is_none());
        assert_eq!(r.rows().count(), 3);
    }
}
