//! Spatial helpers: extents, point-in-polygon index, dissolve

use bathyzone_core::Extent;
use geo::{BooleanOps, BoundingRect, Intersects, MultiPolygon, Point, Polygon, Rect};
use std::collections::BTreeMap;

/// Bounding extent of a multi-part polygon, `None` if it has no parts
pub fn bounding_extent(mp: &MultiPolygon<f64>) -> Option<Extent> {
    mp.bounding_rect().map(Extent::from)
}

/// Polygons with cached bounding boxes for repeated point queries.
///
/// A point on a polygon boundary counts as inside.
#[derive(Debug, Clone, Default)]
pub struct PolygonIndex {
    entries: Vec<(Rect<f64>, Polygon<f64>)>,
}

impl PolygonIndex {
    pub fn new<'a>(polygons: impl IntoIterator<Item = &'a Polygon<f64>>) -> Self {
        let entries = polygons
            .into_iter()
            .filter_map(|p| p.bounding_rect().map(|r| (r, p.clone())))
            .collect();
        Self { entries }
    }

    pub fn from_multipolygon(mp: &MultiPolygon<f64>) -> Self {
        Self::new(mp.0.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Combined extent of all indexed polygons
    pub fn extent(&self) -> Option<Extent> {
        self.entries.iter().map(|(r, _)| Extent::from(*r)).reduce(|a, b| {
            Extent::new(
                a.min_x.min(b.min_x),
                a.min_y.min(b.min_y),
                a.max_x.max(b.max_x),
                a.max_y.max(b.max_y),
            )
        })
    }

    /// Whether (x, y) lies in any indexed polygon
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        let point = Point::new(x, y);
        self.entries.iter().any(|(rect, poly)| {
            x >= rect.min().x
                && x <= rect.max().x
                && y >= rect.min().y
                && y <= rect.max().y
                && poly.intersects(&point)
        })
    }
}

/// Dissolve: merge the polygon parts that share a key into one geometry.
///
/// Parts of the same key are unioned, so overlapping parts are not counted
/// twice. Keys come back in sorted order.
pub fn dissolve_by_key<K: Ord>(
    parts: impl IntoIterator<Item = (K, MultiPolygon<f64>)>,
) -> BTreeMap<K, MultiPolygon<f64>> {
    let mut groups: BTreeMap<K, Vec<MultiPolygon<f64>>> = BTreeMap::new();
    for (key, geom) in parts {
        groups.entry(key).or_default().push(geom);
    }

    groups
        .into_iter()
        .map(|(key, mut geoms)| {
            let first = geoms.swap_remove(0);
            let merged = geoms.iter().fold(first, |acc, g| acc.union(g));
            (key, merged)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::multipolygon_area;
    use geo::LineString;

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Polygon<f64> {
        Polygon::new(
            LineString::from(vec![(x0, y0), (x1, y0), (x1, y1), (x0, y1), (x0, y0)]),
            vec![],
        )
    }

    #[test]
    fn test_index_contains_point() {
        let index = PolygonIndex::new([rect(0.0, 0.0, 10.0, 10.0), rect(20.0, 0.0, 30.0, 10.0)].iter());
        assert!(index.contains_point(5.0, 5.0));
        assert!(index.contains_point(25.0, 5.0));
        assert!(index.contains_point(10.0, 5.0)); // boundary
        assert!(!index.contains_point(15.0, 5.0));
        assert_eq!(index.extent(), Some(Extent::new(0.0, 0.0, 30.0, 10.0)));
    }

    #[test]
    fn test_empty_index() {
        let index = PolygonIndex::default();
        assert!(index.is_empty());
        assert!(!index.contains_point(0.0, 0.0));
        assert_eq!(index.extent(), None);
    }

    #[test]
    fn test_dissolve_merges_parts_by_key() {
        let parts = vec![
            (2u64, MultiPolygon::new(vec![rect(0.0, 0.0, 5.0, 5.0)])),
            (1u64, MultiPolygon::new(vec![rect(20.0, 20.0, 25.0, 25.0)])),
            (2u64, MultiPolygon::new(vec![rect(5.0, 0.0, 10.0, 5.0)])),
        ];

        let result = dissolve_by_key(parts);
        assert_eq!(result.keys().copied().collect::<Vec<_>>(), vec![1, 2]);
        assert!((multipolygon_area(&result[&2]) - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_dissolve_overlap_not_double_counted() {
        let parts = vec![
            ("a", MultiPolygon::new(vec![rect(0.0, 0.0, 10.0, 10.0)])),
            ("a", MultiPolygon::new(vec![rect(5.0, 0.0, 15.0, 10.0)])),
        ];
        let result = dissolve_by_key(parts);
        assert!((multipolygon_area(&result["a"]) - 150.0).abs() < 1e-9);
    }
}
