//! Reporting regions and protection layers built from feature layers

use crate::vector::{bounding_extent, dissolve_by_key};
use bathyzone_core::raster::Extent;
use bathyzone_core::{Error, FeatureCollection, Result, CRS};
use geo::MultiPolygon;

/// One reporting region, all parts dissolved under its identifier
#[derive(Debug, Clone)]
pub struct ReportingRegion {
    pub id: u64,
    pub geometry: MultiPolygon<f64>,
}

/// Allow-listed reporting regions, unique ids in ascending order
#[derive(Debug, Clone, Default)]
pub struct RegionSet {
    crs: Option<CRS>,
    regions: Vec<ReportingRegion>,
}

impl RegionSet {
    /// Build the region set from a feature layer.
    ///
    /// Every feature must carry an integer identifier in `id_field`. With an
    /// allow-list, features whose id is not listed are dropped. Features
    /// sharing an id are dissolved into one multi-part region.
    pub fn from_layer(
        layer: &FeatureCollection,
        id_field: &str,
        allow: Option<&[u64]>,
    ) -> Result<Self> {
        let mut parts = Vec::with_capacity(layer.len());
        for (index, feature) in layer.iter().enumerate() {
            let id = feature
                .get_property(id_field)
                .and_then(|v| v.as_u64())
                .ok_or_else(|| Error::MissingAttribute {
                    field: id_field.to_string(),
                    index,
                })?;

            if allow.is_some_and(|ids| !ids.contains(&id)) {
                continue;
            }

            let polygons = feature.polygons();
            if !polygons.0.is_empty() {
                parts.push((id, polygons));
            }
        }

        let regions = dissolve_by_key(parts)
            .into_iter()
            .map(|(id, geometry)| ReportingRegion { id, geometry })
            .collect();

        Ok(Self {
            crs: layer.crs.clone(),
            regions,
        })
    }

    pub fn from_regions(crs: Option<CRS>, mut regions: Vec<ReportingRegion>) -> Self {
        regions.sort_by_key(|r| r.id);
        Self { crs, regions }
    }

    pub fn crs(&self) -> Option<&CRS> {
        self.crs.as_ref()
    }

    pub fn regions(&self) -> &[ReportingRegion] {
        &self.regions
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn get(&self, id: u64) -> Option<&ReportingRegion> {
        self.regions
            .binary_search_by_key(&id, |r| r.id)
            .ok()
            .map(|i| &self.regions[i])
    }

    /// Ids the allow-list asked for but the layer did not provide
    pub fn missing_ids(&self, allow: &[u64]) -> Vec<u64> {
        allow.iter().copied().filter(|&id| self.get(id).is_none()).collect()
    }

    pub fn extent(&self) -> Option<Extent> {
        union_extent(self.regions.iter().map(|r| &r.geometry))
    }
}

/// One protection polygon
#[derive(Debug, Clone)]
pub struct ProtectionZone {
    pub id: String,
    pub geometry: MultiPolygon<f64>,
}

/// One vintage of protection polygons
#[derive(Debug, Clone)]
pub struct ProtectionLayer {
    label: String,
    crs: Option<CRS>,
    zones: Vec<ProtectionZone>,
}

impl ProtectionLayer {
    /// Build a protection layer from features.
    ///
    /// The zone id is taken from `id_field` when present; features without
    /// one are named by their position (`#0`, `#1`, ...). Features without
    /// polygonal geometry are skipped.
    pub fn from_layer(
        label: impl Into<String>,
        layer: &FeatureCollection,
        id_field: Option<&str>,
    ) -> Self {
        let zones = layer
            .iter()
            .enumerate()
            .filter_map(|(index, feature)| {
                let geometry = feature.polygons();
                if geometry.0.is_empty() {
                    return None;
                }
                let id = id_field
                    .and_then(|field| feature.get_property(field))
                    .and_then(|v| v.as_label())
                    .unwrap_or_else(|| format!("#{}", index));
                Some(ProtectionZone { id, geometry })
            })
            .collect();

        Self {
            label: label.into(),
            crs: layer.crs.clone(),
            zones,
        }
    }

    pub fn from_zones(label: impl Into<String>, crs: Option<CRS>, zones: Vec<ProtectionZone>) -> Self {
        Self {
            label: label.into(),
            crs,
            zones,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn crs(&self) -> Option<&CRS> {
        self.crs.as_ref()
    }

    pub fn zones(&self) -> &[ProtectionZone] {
        &self.zones
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    /// (id, geometry) pairs in layer order
    pub fn zone_pairs(&self) -> impl Iterator<Item = (&str, &MultiPolygon<f64>)> + '_ {
        self.zones.iter().map(|z| (z.id.as_str(), &z.geometry))
    }

    pub fn extent(&self) -> Option<Extent> {
        union_extent(self.zones.iter().map(|z| &z.geometry))
    }
}

fn union_extent<'a>(geoms: impl Iterator<Item = &'a MultiPolygon<f64>>) -> Option<Extent> {
    geoms.filter_map(bounding_extent).reduce(|a, b| {
        Extent::new(
            a.min_x.min(b.min_x),
            a.min_y.min(b.min_y),
            a.max_x.max(b.max_x),
            a.max_y.max(b.max_y),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use bathyzone_core::{AttributeValue, Feature};
    use geo::{LineString, Polygon};

    fn square(x0: f64, y0: f64, size: f64) -> Polygon<f64> {
        Polygon::new(
            LineString::from(vec![
                (x0, y0),
                (x0 + size, y0),
                (x0 + size, y0 + size),
                (x0, y0 + size),
                (x0, y0),
            ]),
            vec![],
        )
    }

    fn region_layer() -> FeatureCollection {
        let mut layer = FeatureCollection::new(Some(CRS::alaska_albers()));
        layer.push(Feature::new(square(0.0, 0.0, 10.0)).with_property("STAT_AREA", AttributeValue::Int(655_430)));
        layer.push(Feature::new(square(10.0, 0.0, 10.0)).with_property("STAT_AREA", AttributeValue::Int(645_501)));
        layer.push(
            Feature::new(square(20.0, 0.0, 10.0))
                .with_property("STAT_AREA", AttributeValue::String("655430".into())),
        );
        layer.push(Feature::new(square(40.0, 0.0, 10.0)).with_property("STAT_AREA", AttributeValue::Int(1)));
        layer
    }

    #[test]
    fn test_regions_dissolve_and_allow_list() {
        let set = RegionSet::from_layer(&region_layer(), "STAT_AREA", Some(&[645_501, 655_430, 999][..])).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.regions()[0].id, 645_501);
        assert_eq!(set.regions()[1].id, 655_430);
        assert_eq!(crate::vector::multipolygon_area(&set.get(655_430).unwrap().geometry), 200.0);
        assert_eq!(set.missing_ids(&[645_501, 999]), vec![999]);
        assert_eq!(set.extent(), Some(Extent::new(0.0, 0.0, 30.0, 10.0)));
    }

    #[test]
    fn test_regions_without_allow_list_keep_everything() {
        let set = RegionSet::from_layer(&region_layer(), "STAT_AREA", None).unwrap();
        assert_eq!(set.len(), 3);
        assert_eq!(set.crs(), Some(&CRS::alaska_albers()));
    }

    #[test]
    fn test_region_without_id_is_an_error() {
        let mut layer = region_layer();
        layer.push(Feature::new(square(0.0, 50.0, 1.0)));
        let err = RegionSet::from_layer(&layer, "STAT_AREA", None).unwrap_err();
        assert!(matches!(err, Error::MissingAttribute { index: 4, .. }));
    }

    #[test]
    fn test_protection_ids_fall_back_to_position() {
        let mut layer = FeatureCollection::new(None);
        layer.push(Feature::new(square(0.0, 0.0, 5.0)).with_property("Id", AttributeValue::String("Kodiak".into())));
        layer.push(Feature::new(square(5.0, 0.0, 5.0)));
        layer.push(Feature::new(geo::Point::new(1.0, 1.0)));

        let zones = ProtectionLayer::from_layer("legacy", &layer, Some("Id"));
        assert_eq!(zones.label(), "legacy");
        let ids: Vec<&str> = zones.zone_pairs().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["Kodiak", "#1"]);

        let unnamed = ProtectionLayer::from_layer("current", &layer, None);
        assert_eq!(unnamed.zones()[0].id, "#0");
    }
}
