use super::{Point2, TOLERANCE};

/// Computes the signed area of a closed polygon (shoelace formula).
///
/// Positive for counter-clockwise, negative for clockwise.
#[must_use]
pub fn signed_area_2d(points: &[Point2]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        sum += points[i].x * points[j].y - points[j].x * points[i].y;
    }
    sum * 0.5
}

/// Arithmetic mean of the vertices, or `None` for an empty slice.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn vertex_average(points: &[Point2]) -> Option<Point2> {
    if points.is_empty() {
        return None;
    }
    let (sx, sy) = points
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
    let n = points.len() as f64;
    Some(Point2::new(sx / n, sy / n))
}

/// Area-weighted centroid of a simple closed polygon.
///
/// Returns `None` when the polygon has (near) zero area.
#[must_use]
pub fn area_centroid(points: &[Point2]) -> Option<Point2> {
    let area = signed_area_2d(points);
    if area.abs() < TOLERANCE {
        return None;
    }
    let n = points.len();
    let mut cx = 0.0;
    let mut cy = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        let cross = points[i].x * points[j].y - points[j].x * points[i].y;
        cx += (points[i].x + points[j].x) * cross;
        cy += (points[i].y + points[j].y) * cross;
    }
    let k = 1.0 / (6.0 * area);
    Some(Point2::new(cx * k, cy * k))
}

/// Midpoint of the segment `a`-`b`.
#[must_use]
pub fn midpoint(a: &Point2, b: &Point2) -> Point2 {
    Point2::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn unit_square() -> Vec<Point2> {
        vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(0.0, 1.0),
        ]
    }

    #[test]
    fn signed_area_ccw_square() {
        assert!((signed_area_2d(&unit_square()) - 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn signed_area_cw_square() {
        let mut pts = unit_square();
        pts.reverse();
        assert!((signed_area_2d(&pts) + 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn signed_area_degenerate() {
        assert!(signed_area_2d(&[Point2::new(0.0, 0.0)]).abs() < TOLERANCE);
        assert!(signed_area_2d(&[]).abs() < TOLERANCE);
    }

    #[test]
    fn vertex_average_differs_from_area_centroid() {
        // Trapezoid with unbalanced vertex spacing.
        let pts = vec![
            Point2::new(0.0, 0.0),
            Point2::new(4.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(0.0, 1.0),
        ];
        let avg = vertex_average(&pts).unwrap();
        let c = area_centroid(&pts).unwrap();
        assert!((avg.x - 1.25).abs() < TOLERANCE);
        assert!((c.x - avg.x).abs() > 0.1);
    }

    #[test]
    fn area_centroid_of_square() {
        let c = area_centroid(&unit_square()).unwrap();
        assert!((c.x - 0.5).abs() < TOLERANCE);
        assert!((c.y - 0.5).abs() < TOLERANCE);
    }

    #[test]
    fn area_centroid_zero_area() {
        let pts = vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(2.0, 2.0),
        ];
        assert!(area_centroid(&pts).is_none());
    }

    #[test]
    fn midpoint_basic() {
        let m = midpoint(&Point2::new(1.0, 2.0), &Point2::new(3.0, -2.0));
        assert!((m.x - 2.0).abs() < TOLERANCE);
        assert!(m.y.abs() < TOLERANCE);
    }
}
