//! Zonal stratum counts
//!
//! Counts raster cells per depth stratum inside a polygon zone, without
//! materialising the sampled values. Only the block of cells under the zone's
//! bounding box is visited; a cell belongs to the zone when its center does.

use super::strata::DepthStrata;
use crate::resample::GridSpec;
use crate::vector::PolygonIndex;
use bathyzone_core::raster::Raster;

/// Per-stratum cell tallies for one zone
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StratumCounts {
    /// Valid cells per stratum inside the zone
    pub total: Vec<u64>,
    /// Valid cells per stratum inside both the zone and the protected set
    pub protected: Vec<u64>,
    /// Valid cells inside the zone whose value lies outside every stratum
    pub unstratified: u64,
    /// No-data cells inside the zone
    pub missing: u64,
}

impl StratumCounts {
    pub fn new(strata: usize) -> Self {
        Self {
            total: vec![0; strata],
            protected: vec![0; strata],
            unstratified: 0,
            missing: 0,
        }
    }

    /// Cells counted in some stratum
    pub fn sample_count(&self) -> u64 {
        self.total.iter().sum()
    }

    /// Cells counted in some stratum and inside the protected set
    pub fn protected_count(&self) -> u64 {
        self.protected.iter().sum()
    }

    /// Fraction of the zone's samples falling in each stratum, all zero when
    /// there are no samples
    pub fn fractions(&self) -> (Vec<f64>, Vec<f64>) {
        let n = self.sample_count();
        if n == 0 {
            return (vec![0.0; self.total.len()], vec![0.0; self.protected.len()]);
        }
        let n = n as f64;
        (
            self.total.iter().map(|&c| c as f64 / n).collect(),
            self.protected.iter().map(|&c| c as f64 / n).collect(),
        )
    }
}

/// Count the cells of `raster` inside `zone` per stratum.
///
/// A cell is sampled when its center lies in `zone` (boundary included) and
/// it holds a valid value that some stratum contains. Sampled cells whose
/// center also lies in `protected` are counted a second time in the
/// protected tally; overlapping protected polygons never count a cell twice.
pub fn zonal_stratum_counts(
    raster: &Raster<f64>,
    zone: &PolygonIndex,
    protected: &PolygonIndex,
    strata: &DepthStrata,
) -> StratumCounts {
    let mut counts = StratumCounts::new(strata.len());

    let Some(window) = zone.extent().and_then(|e| GridSpec::of(raster).cells_over(&e)) else {
        return counts;
    };

    for row in window.rows.clone() {
        for col in window.cols.clone() {
            let (x, y) = raster.pixel_to_geo(col, row);
            if !zone.contains_point(x, y) {
                continue;
            }

            let Some(value) = raster.valid_value(row, col) else {
                counts.missing += 1;
                continue;
            };

            match strata.classify(value) {
                Some(s) => {
                    counts.total[s] += 1;
                    if protected.contains_point(x, y) {
                        counts.protected[s] += 1;
                    }
                }
                None => counts.unstratified += 1,
            }
        }
    }

    counts
}
