//! Overlay of reporting regions with protection polygons

use super::measurements::multipolygon_area;
use super::spatial::bounding_extent;
use geo::{BooleanOps, MultiPolygon};
use std::fmt;

/// Parts smaller than this (in squared CRS units) are treated as slivers from
/// shared boundaries and dropped
const SLIVER_AREA: f64 = 1e-6;

/// Protection status of a subdivided part
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum ZoneTag {
    /// Inside the protection polygon with this identifier
    Protected(String),
    /// Outside every protection polygon
    Unprotected,
}

impl ZoneTag {
    pub fn is_protected(&self) -> bool {
        matches!(self, ZoneTag::Protected(_))
    }
}

impl fmt::Display for ZoneTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ZoneTag::Protected(id) => write!(f, "{}", id),
            ZoneTag::Unprotected => write!(f, "none"),
        }
    }
}

/// One piece of a reporting region after overlay
#[derive(Debug, Clone)]
pub struct SubdividedPart {
    pub region_id: u64,
    pub tag: ZoneTag,
    pub geometry: MultiPolygon<f64>,
}

impl SubdividedPart {
    pub fn area(&self) -> f64 {
        multipolygon_area(&self.geometry)
    }
}

/// Intersect one region with a full protection polygon set.
///
/// Yields one `Protected` part per protection polygon that overlaps the
/// region, plus at most one `Unprotected` part holding the region minus the
/// union of all protection polygons. Protected parts may overlap each other
/// when the protection polygons do.
pub fn subdivide<'a>(
    region_id: u64,
    region: &MultiPolygon<f64>,
    zones: impl IntoIterator<Item = (&'a str, &'a MultiPolygon<f64>)>,
) -> Vec<SubdividedPart> {
    let Some(region_extent) = bounding_extent(region) else {
        return Vec::new();
    };

    let mut parts: Vec<SubdividedPart> = zones
        .into_iter()
        .filter(|(_, zone)| bounding_extent(zone).is_some_and(|e| e.intersects(&region_extent)))
        .filter_map(|(id, zone)| {
            let overlap = region.intersection(zone);
            (multipolygon_area(&overlap) > SLIVER_AREA).then(|| SubdividedPart {
                region_id,
                tag: ZoneTag::Protected(id.to_string()),
                geometry: overlap,
            })
        })
        .collect();

    let remainder = if parts.is_empty() {
        region.clone()
    } else {
        let protected = parts
            .iter()
            .skip(1)
            .fold(parts[0].geometry.clone(), |acc, p| acc.union(&p.geometry));
        region.difference(&protected)
    };

    if multipolygon_area(&remainder) > SLIVER_AREA {
        parts.push(SubdividedPart {
            region_id,
            tag: ZoneTag::Unprotected,
            geometry: remainder,
        });
    }

    parts
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{LineString, Polygon};

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> MultiPolygon<f64> {
        MultiPolygon::new(vec![Polygon::new(
            LineString::from(vec![(x0, y0), (x1, y0), (x1, y1), (x0, y1), (x0, y0)]),
            vec![],
        )])
    }

    #[test]
    fn test_no_zones_gives_single_unprotected_part() {
        let region = rect(0.0, 0.0, 10.0, 10.0);
        let parts = subdivide(7, &region, std::iter::empty());
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].tag, ZoneTag::Unprotected);
        assert!((parts[0].area() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_partial_overlap() {
        let region = rect(0.0, 0.0, 10.0, 10.0);
        let zone = rect(5.0, -5.0, 20.0, 20.0);
        let far = rect(100.0, 100.0, 110.0, 110.0);
        let parts = subdivide(7, &region, [("A", &zone), ("B", &far)]);

        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].tag, ZoneTag::Protected("A".into()));
        assert!((parts[0].area() - 50.0).abs() < 1e-9);
        assert_eq!(parts[1].tag, ZoneTag::Unprotected);
        assert!((parts[1].area() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_overlapping_zones_leave_correct_remainder() {
        let region = rect(0.0, 0.0, 10.0, 10.0);
        let a = rect(0.0, 0.0, 6.0, 10.0);
        let b = rect(4.0, 0.0, 8.0, 10.0);
        let parts = subdivide(1, &region, [("A", &a), ("B", &b)]);

        let protected: Vec<_> = parts.iter().filter(|p| p.tag.is_protected()).collect();
        assert_eq!(protected.len(), 2);
        let remainder = parts.iter().find(|p| !p.tag.is_protected()).unwrap();
        assert!((remainder.area() - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_fully_covered_region_has_no_remainder() {
        let region = rect(0.0, 0.0, 10.0, 10.0);
        let zone = rect(-1.0, -1.0, 11.0, 11.0);
        let parts = subdivide(3, &region, [("Z", &zone)]);
        assert_eq!(parts.len(), 1);
        assert!(parts[0].tag.is_protected());
        assert_eq!(ZoneTag::Unprotected.to_string(), "none");
    }
}
