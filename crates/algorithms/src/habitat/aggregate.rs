//! Per-region depth-stratum area tallies
//!
//! For each reporting region the polygon area is split across depth strata in
//! proportion to the region's raster cell counts. With `n` valid samples in the
//! region and `k[s]` of them in stratum `s`:
//!
//! ```text
//! total[s]     = k[s]           / n * region_area
//! protected[s] = k_protected[s] / n * region_area
//! ```
//!
//! The protected tally shares the region's denominator, so protected and
//! total areas sit on the same per-cell scale. A region with `n == 0` gets
//! zero everywhere.

use super::layers::{ProtectionLayer, RegionSet, ReportingRegion};
use crate::maybe_rayon::*;
use crate::statistics::{zonal_stratum_counts, DepthStrata, StratumCounts};
use crate::vector::{multipolygon_area, subdivide, PolygonIndex, ZoneTag};
use bathyzone_core::raster::Raster;
use bathyzone_core::{Error, Result};
use serde::Serialize;
use tracing::{debug, info};

/// Stratum areas of one region under one protection layer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionStratumRecord {
    pub region_id: u64,
    /// Geometric area of the region, whatever the raster coverage
    pub polygon_area: f64,
    /// Area apportioned to strata: `polygon_area`, or zero without samples
    pub total_area: f64,
    pub strata_total: Vec<f64>,
    pub protected_area: f64,
    pub strata_protected: Vec<f64>,
    /// Geometric area of the region inside any protection polygon
    pub protected_polygon_area: f64,
    pub sample_count: u64,
    pub protected_sample_count: u64,
    pub unstratified_count: u64,
    pub missing_count: u64,
    /// Ids of the protection polygons that overlap the region
    pub protection_zones: Vec<String>,
}

impl RegionStratumRecord {
    /// Whether the region had no valid raster samples
    pub fn is_empty_sample(&self) -> bool {
        self.sample_count == 0
    }

    fn from_counts(
        region_id: u64,
        polygon_area: f64,
        protected_polygon_area: f64,
        counts: &StratumCounts,
        protection_zones: Vec<String>,
    ) -> Self {
        let (total_fraction, protected_fraction) = counts.fractions();
        let total_area = if counts.sample_count() == 0 { 0.0 } else { polygon_area };

        let strata_total: Vec<f64> = total_fraction.iter().map(|f| f * total_area).collect();
        let strata_protected: Vec<f64> = protected_fraction.iter().map(|f| f * total_area).collect();

        Self {
            region_id,
            polygon_area,
            total_area,
            protected_area: strata_protected.iter().sum(),
            strata_total,
            strata_protected,
            protected_polygon_area,
            sample_count: counts.sample_count(),
            protected_sample_count: counts.protected_count(),
            unstratified_count: counts.unstratified,
            missing_count: counts.missing,
            protection_zones,
        }
    }
}

/// Anomalies met while aggregating, kept for the run log
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AggregationAudit {
    /// Regions without any valid sample; all their areas are zero
    pub empty_regions: Vec<u64>,
    /// Valid cells inside regions that no stratum contains
    pub unstratified_cells: u64,
    /// No-data cells inside regions
    pub missing_cells: u64,
}

/// All region records of one protection layer, sorted by region id
#[derive(Debug, Clone)]
pub struct StratumTable {
    pub label: String,
    pub strata: DepthStrata,
    pub records: Vec<RegionStratumRecord>,
    pub audit: AggregationAudit,
}

impl StratumTable {
    pub fn get(&self, region_id: u64) -> Option<&RegionStratumRecord> {
        self.records
            .binary_search_by_key(&region_id, |r| r.region_id)
            .ok()
            .map(|i| &self.records[i])
    }
}

/// Fail fast when the raster and the two layers are not in one frame
pub fn check_alignment(
    raster: &Raster<f64>,
    regions: &RegionSet,
    layer: &ProtectionLayer,
) -> Result<()> {
    let frames = [
        ("regions", regions.crs()),
        (layer.label(), layer.crs()),
    ];
    if let Some(raster_crs) = raster.crs() {
        for (name, crs) in frames {
            if let Some(crs) = crs {
                if !crs.is_equivalent(raster_crs) {
                    return Err(Error::CrsMismatch(
                        format!("{} ({})", crs.identifier(), name),
                        raster_crs.identifier(),
                    ));
                }
            }
        }
    }

    if let Some(extent) = regions.extent() {
        if !extent.intersects(&raster.extent()) {
            return Err(Error::NoOverlap(format!(
                "reporting regions {:?} and raster {:?}",
                extent,
                raster.extent()
            )));
        }
    }

    Ok(())
}

/// Tally stratum areas for every region under one protection layer.
///
/// Regions are processed independently (in parallel with the `parallel`
/// feature) and the records come back sorted by region id.
pub fn aggregate_regions(
    raster: &Raster<f64>,
    regions: &RegionSet,
    layer: &ProtectionLayer,
    strata: &DepthStrata,
) -> Result<StratumTable> {
    check_alignment(raster, regions, layer)?;

    let mut records: Vec<RegionStratumRecord> = regions
        .regions()
        .into_par_iter()
        .map(|region| aggregate_region(raster, region, layer, strata))
        .collect();
    records.sort_by_key(|r| r.region_id);

    let mut audit = AggregationAudit::default();
    for record in &records {
        audit.unstratified_cells += record.unstratified_count;
        audit.missing_cells += record.missing_count;
        if record.is_empty_sample() {
            info!(
                region = record.region_id,
                layer = layer.label(),
                "region has no valid raster samples; areas set to zero"
            );
            audit.empty_regions.push(record.region_id);
        }
    }

    debug!(
        layer = layer.label(),
        regions = records.len(),
        empty = audit.empty_regions.len(),
        unstratified = audit.unstratified_cells,
        "stratum aggregation complete"
    );

    Ok(StratumTable {
        label: layer.label().to_string(),
        strata: strata.clone(),
        records,
        audit,
    })
}

/// One region: overlay, sample, apportion
pub fn aggregate_region(
    raster: &Raster<f64>,
    region: &ReportingRegion,
    layer: &ProtectionLayer,
    strata: &DepthStrata,
) -> RegionStratumRecord {
    let parts = subdivide(region.id, &region.geometry, layer.zone_pairs());
    let polygon_area = multipolygon_area(&region.geometry);

    let protection_zones: Vec<String> = parts
        .iter()
        .filter_map(|p| match &p.tag {
            ZoneTag::Protected(id) => Some(id.clone()),
            ZoneTag::Unprotected => None,
        })
        .collect();

    let unprotected_area: f64 = parts
        .iter()
        .filter(|p| !p.tag.is_protected())
        .map(|p| p.area())
        .sum();
    let protected_polygon_area = if protection_zones.is_empty() {
        0.0
    } else {
        (polygon_area - unprotected_area).max(0.0)
    };

    // Membership is tested against the whole zone polygons that touch the
    // region; cells are only looked at once they are inside the region.
    let protected = PolygonIndex::new(
        layer
            .zones()
            .iter()
            .filter(|z| protection_zones.contains(&z.id))
            .flat_map(|z| z.geometry.0.iter()),
    );

    let counts = zonal_stratum_counts(
        raster,
        &PolygonIndex::from_multipolygon(&region.geometry),
        &protected,
        strata,
    );

    RegionStratumRecord::from_counts(
        region.id,
        polygon_area,
        protected_polygon_area,
        &counts,
        protection_zones,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::habitat::layers::ProtectionZone;
    use approx::assert_relative_eq;
    use bathyzone_core::{GeoTransform, CRS};
    use geo::{LineString, MultiPolygon, Polygon};

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> MultiPolygon<f64> {
        MultiPolygon::new(vec![Polygon::new(
            LineString::from(vec![(x0, y0), (x1, y0), (x1, y1), (x0, y1), (x0, y0)]),
            vec![],
        )])
    }

    /// 10x10 unit cells over [0, 10]^2; rows 0..4 at -20, rows 4..10 at -70
    fn raster() -> Raster<f64> {
        let data: Vec<f64> = (0..100).map(|i| if i < 40 { -20.0 } else { -70.0 }).collect();
        Raster::from_vec(data, 10, 10)
            .unwrap()
            .with_transform(GeoTransform::new(0.0, 10.0, 1.0, -1.0))
            .with_crs(CRS::alaska_albers())
            .with_nodata(f64::NAN)
    }

    fn strata() -> DepthStrata {
        DepthStrata::new(vec![0.0, -50.0, -100.0, -150.0]).unwrap()
    }

    fn regions() -> RegionSet {
        RegionSet::from_regions(
            Some(CRS::alaska_albers()),
            vec![
                ReportingRegion { id: 30, geometry: rect(0.0, 0.0, 10.0, 10.0) },
                ReportingRegion { id: 20, geometry: rect(100.0, 100.0, 110.0, 110.0) },
            ],
        )
    }

    #[test]
    fn test_apportions_region_area_by_cell_fraction() {
        let layer = ProtectionLayer::from_zones("none", Some(CRS::alaska_albers()), vec![]);
        let table = aggregate_regions(&raster(), &regions(), &layer, &strata()).unwrap();

        assert_eq!(table.records.iter().map(|r| r.region_id).collect::<Vec<_>>(), vec![20, 30]);
        let record = table.get(30).unwrap();
        assert_relative_eq!(record.strata_total[0], 40.0, epsilon = 1e-12);
        assert_relative_eq!(record.strata_total[1], 60.0, epsilon = 1e-12);
        assert_eq!(record.strata_total[2], 0.0);
        assert_eq!(record.strata_protected, vec![0.0, 0.0, 0.0]);
        assert_eq!(record.protected_area, 0.0);
        assert!(record.protection_zones.is_empty());
    }

    #[test]
    fn test_empty_region_is_zero_and_audited() {
        let layer = ProtectionLayer::from_zones("none", None, vec![]);
        let table = aggregate_regions(&raster(), &regions(), &layer, &strata()).unwrap();

        let empty = table.get(20).unwrap();
        assert_eq!(empty.polygon_area, 100.0);
        assert_eq!(empty.total_area, 0.0);
        assert!(empty.strata_total.iter().all(|&a| a == 0.0));
        assert_eq!(table.audit.empty_regions, vec![20]);
    }

    #[test]
    fn test_protected_uses_region_denominator() {
        // Covers the top half: 40 cells at -20 and 10 at -70
        let zone = ProtectionZone { id: "Z1".into(), geometry: rect(-5.0, 5.0, 15.0, 15.0) };
        let layer = ProtectionLayer::from_zones("current", Some(CRS::alaska_albers()), vec![zone]);
        let table = aggregate_regions(&raster(), &regions(), &layer, &strata()).unwrap();

        let record = table.get(30).unwrap();
        assert_eq!(record.protection_zones, vec!["Z1".to_string()]);
        assert_relative_eq!(record.strata_protected[0], 40.0, epsilon = 1e-12);
        assert_relative_eq!(record.strata_protected[1], 10.0, epsilon = 1e-12);
        assert_relative_eq!(record.protected_area, 50.0, epsilon = 1e-12);
        assert_relative_eq!(record.protected_polygon_area, 50.0, epsilon = 1e-9);
        assert_eq!(record.protected_sample_count, 50);
    }

    #[test]
    fn test_crs_mismatch_fails_fast() {
        let layer = ProtectionLayer::from_zones("legacy", Some(CRS::wgs84()), vec![]);
        let err = aggregate_regions(&raster(), &regions(), &layer, &strata()).unwrap_err();
        assert!(matches!(err, Error::CrsMismatch(..)));
    }

    #[test]
    fn test_disjoint_regions_fail_fast() {
        let far = RegionSet::from_regions(
            None,
            vec![ReportingRegion { id: 1, geometry: rect(500.0, 500.0, 510.0, 510.0) }],
        );
        let layer = ProtectionLayer::from_zones("legacy", None, vec![]);
        let err = aggregate_regions(&raster(), &far, &layer, &strata()).unwrap_err();
        assert!(matches!(err, Error::NoOverlap(_)));
    }
}
