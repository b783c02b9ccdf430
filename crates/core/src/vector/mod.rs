//! Vector features: geometry plus attributes

use crate::crs::CRS;
use crate::error::{Error, Result};
use geo::MapCoords;
use geo_types::{Geometry, MultiPolygon, Polygon};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Attribute value types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl AttributeValue {
    /// Interpret the value as a non-negative integer identifier.
    ///
    /// Identifier columns often arrive as text or as whole floats.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            AttributeValue::Int(v) => u64::try_from(*v).ok(),
            AttributeValue::Float(v) if v.fract() == 0.0 && *v >= 0.0 => Some(*v as u64),
            AttributeValue::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Render the value as a label, `None` for null
    pub fn as_label(&self) -> Option<String> {
        match self {
            AttributeValue::Null => None,
            AttributeValue::Bool(v) => Some(v.to_string()),
            AttributeValue::Int(v) => Some(v.to_string()),
            AttributeValue::Float(v) => Some(v.to_string()),
            AttributeValue::String(s) => Some(s.clone()),
        }
    }
}

/// A geographic feature with geometry and attributes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feature {
    /// Feature geometry
    pub geometry: Option<Geometry<f64>>,
    /// Feature attributes
    #[serde(default)]
    pub properties: BTreeMap<String, AttributeValue>,
}

impl Feature {
    /// Create a new feature with geometry
    pub fn new(geometry: impl Into<Geometry<f64>>) -> Self {
        Self {
            geometry: Some(geometry.into()),
            properties: BTreeMap::new(),
        }
    }

    /// Builder-style attribute setter
    pub fn with_property(mut self, key: impl Into<String>, value: AttributeValue) -> Self {
        self.properties.insert(key.into(), value);
        self
    }

    /// Get an attribute
    pub fn get_property(&self, key: &str) -> Option<&AttributeValue> {
        self.properties.get(key)
    }

    /// Polygonal part of the geometry; non-areal geometries yield nothing
    pub fn polygons(&self) -> MultiPolygon<f64> {
        match &self.geometry {
            Some(geom) => polygons_of(geom),
            None => MultiPolygon::new(Vec::new()),
        }
    }
}

fn polygons_of(geom: &Geometry<f64>) -> MultiPolygon<f64> {
    let parts: Vec<Polygon<f64>> = match geom {
        Geometry::Polygon(p) => vec![p.clone()],
        Geometry::MultiPolygon(mp) => mp.0.clone(),
        Geometry::Rect(r) => vec![r.to_polygon()],
        Geometry::Triangle(t) => vec![t.to_polygon()],
        Geometry::GeometryCollection(gc) => gc.0.iter().flat_map(|g| polygons_of(g).0).collect(),
        _ => Vec::new(),
    };
    MultiPolygon::new(parts)
}

/// Collection of features sharing one CRS
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(default)]
    pub crs: Option<CRS>,
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new(crs: Option<CRS>) -> Self {
        Self {
            crs,
            features: Vec::new(),
        }
    }

    pub fn push(&mut self, feature: Feature) {
        self.features.push(feature);
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Feature> {
        self.features.iter()
    }

    /// Every polygonal part of every feature, as one multi-polygon
    pub fn polygons(&self) -> MultiPolygon<f64> {
        MultiPolygon::new(self.features.iter().flat_map(|f| f.polygons().0).collect())
    }

    /// Bring every geometry into `target`.
    ///
    /// Layers already in `target` pass through unchanged; geographic layers
    /// are projected when `target` is a supported equal-area CRS. Anything
    /// else is a CRS mismatch.
    pub fn reproject(&self, target: &CRS) -> Result<FeatureCollection> {
        let source = self.crs.as_ref().ok_or_else(|| {
            Error::CrsMismatch("undefined".to_string(), target.identifier())
        })?;

        if source.is_equivalent(target) {
            return Ok(self.clone());
        }

        let projection = match (source.is_geographic(), target.equal_area_projection()) {
            (true, Some(projection)) => projection,
            _ => return Err(Error::CrsMismatch(source.identifier(), target.identifier())),
        };

        let features = self
            .features
            .iter()
            .map(|f| Feature {
                geometry: f.geometry.as_ref().map(|g| {
                    g.map_coords(|c| {
                        let (x, y) = projection.forward(c.x, c.y);
                        geo_types::coord! { x: x, y: y }
                    })
                }),
                properties: f.properties.clone(),
            })
            .collect();

        Ok(FeatureCollection {
            crs: Some(target.clone()),
            features,
        })
    }
}

impl IntoIterator for FeatureCollection {
    type Item = Feature;
    type IntoIter = std::vec::IntoIter<Feature>;

    fn into_iter(self) -> Self::IntoIter {
        self.features.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Area;
    use geo_types::polygon;

    fn lonlat_square() -> Polygon<f64> {
        polygon![
            (x: -155.0, y: 57.0),
            (x: -154.0, y: 57.0),
            (x: -154.0, y: 58.0),
            (x: -155.0, y: 58.0),
            (x: -155.0, y: 57.0),
        ]
    }

    #[test]
    fn test_attribute_ids() {
        assert_eq!(AttributeValue::Int(645_501).as_u64(), Some(645_501));
        assert_eq!(AttributeValue::String(" 655430 ".into()).as_u64(), Some(655_430));
        assert_eq!(AttributeValue::Float(12.0).as_u64(), Some(12));
        assert_eq!(AttributeValue::Float(12.5).as_u64(), None);
        assert_eq!(AttributeValue::Int(-1).as_u64(), None);
        assert_eq!(AttributeValue::Null.as_label(), None);
    }

    #[test]
    fn test_polygons_from_collection() {
        let gc = Geometry::GeometryCollection(geo_types::GeometryCollection(vec![
            Geometry::Polygon(lonlat_square()),
            Geometry::Point(geo_types::Point::new(0.0, 0.0)),
        ]));
        assert_eq!(Feature::new(gc).polygons().0.len(), 1);

        let mut layer = FeatureCollection::new(None);
        layer.push(Feature::new(lonlat_square()));
        layer.push(Feature::new(geo_types::Point::new(1.0, 1.0)));
        layer.push(Feature::new(lonlat_square()));
        assert_eq!(layer.polygons().0.len(), 2);
    }

    #[test]
    fn test_reproject_to_albers() {
        let mut layer = FeatureCollection::new(Some(CRS::wgs84()));
        layer.push(Feature::new(lonlat_square()));

        let projected = layer.reproject(&CRS::alaska_albers()).unwrap();
        assert_eq!(projected.crs, Some(CRS::alaska_albers()));

        let area = projected.features[0].polygons().unsigned_area();
        // 1 x 1 degree near 57.5N is roughly 6.6e9 m^2
        assert!(area > 6.0e9 && area < 7.2e9, "area {}", area);
    }

    #[test]
    fn test_reproject_passthrough_and_mismatch() {
        let layer = FeatureCollection::new(Some(CRS::alaska_albers()));
        assert!(layer.reproject(&CRS::alaska_albers()).is_ok());

        let utm = FeatureCollection::new(Some(CRS::from_epsg(32606)));
        let err = utm.reproject(&CRS::alaska_albers()).unwrap_err();
        assert!(err.is_alignment());
    }

    #[test]
    fn test_layer_json_roundtrip() {
        let mut layer = FeatureCollection::new(Some(CRS::wgs84()));
        layer.push(
            Feature::new(lonlat_square()).with_property("STAT_AREA", AttributeValue::Int(645_501)),
        );
        let json = serde_json::to_string(&layer).unwrap();
        let back: FeatureCollection = serde_json::from_str(&json).unwrap();
        assert_eq!(back.len(), 1);
        assert_eq!(
            back.features[0].get_property("STAT_AREA").and_then(|v| v.as_u64()),
            Some(645_501)
        );
    }
}
