//! Geometric measurements

use geo::{Area, MultiPolygon};

/// Area of a multi-part polygon, summed across parts (holes subtracted).
///
/// Planar area in CRS units squared; only an equal-area projection makes
/// this a true surface area.
pub fn multipolygon_area(mp: &MultiPolygon<f64>) -> f64 {
    mp.0.iter().map(|p| p.unsigned_area()).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{LineString, Polygon};

    fn square(x0: f64, size: f64) -> Polygon<f64> {
        Polygon::new(
            LineString::from(vec![
                (x0, 0.0), (x0 + size, 0.0), (x0 + size, size), (x0, size), (x0, 0.0),
            ]),
            vec![],
        )
    }

    #[test]
    fn test_area_multipart_sums_parts() {
        let mp = MultiPolygon::new(vec![square(0.0, 10.0), square(20.0, 5.0)]);
        assert!((multipolygon_area(&mp) - 125.0).abs() < 1e-10);
    }

    #[test]
    fn test_area_with_hole() {
        let poly = Polygon::new(
            LineString::from(vec![
                (0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0), (0.0, 0.0),
            ]),
            vec![LineString::from(vec![
                (2.0, 2.0), (8.0, 2.0), (8.0, 8.0), (2.0, 8.0), (2.0, 2.0),
            ])],
        );
        assert!((multipolygon_area(&MultiPolygon::new(vec![poly])) - 64.0).abs() < 1e-10);
    }
}
