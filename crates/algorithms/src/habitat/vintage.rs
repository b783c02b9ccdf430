//! One protection-layer vintage run: aggregate, reduce, validate, persist

use super::aggregate::{aggregate_regions, AggregationAudit, StratumTable};
use super::layers::{ProtectionLayer, RegionSet};
use super::protection::{HabitatBand, HabitatProtectionCalculator, ProtectionMetric};
use crate::maybe_rayon::*;
use crate::statistics::DepthStrata;
use bathyzone_core::raster::Raster;
use bathyzone_core::{Error, Result};
use serde::Serialize;
use std::fmt::Write as _;
use std::ops::Range;
use std::path::{Path, PathBuf};
use tracing::info;

/// Stratum schedule and the habitat band drawn from it.
///
/// Both come from the configured cuts alone. The composite's depth range
/// never adds or removes strata, so the band covers the same depths in
/// every run; depths outside the schedule are counted as unstratified.
#[derive(Debug, Clone, PartialEq)]
pub struct HabitatSchedule {
    strata: DepthStrata,
    band: HabitatBand,
    band_range: Range<usize>,
}

impl HabitatSchedule {
    /// # Errors
    /// `InvalidParameter` for a bad cut sequence or a band that leaves no stratum
    pub fn new(cuts: Vec<f64>, band: HabitatBand) -> Result<Self> {
        let strata = DepthStrata::new(cuts)?;
        let band_range = band.range(strata.len())?;
        Ok(Self {
            strata,
            band,
            band_range,
        })
    }

    pub fn strata(&self) -> &DepthStrata {
        &self.strata
    }

    pub fn band(&self) -> HabitatBand {
        self.band
    }

    /// Stratum indices of the band
    pub fn band_range(&self) -> Range<usize> {
        self.band_range.clone()
    }

    pub fn band_labels(&self) -> Vec<String> {
        self.band_range
            .clone()
            .filter_map(|i| self.strata.stratum(i))
            .map(|s| s.to_string())
            .collect()
    }

    /// Depth interval of the band as (deepest, shallowest)
    pub fn band_depths(&self) -> (f64, f64) {
        let cuts = self.strata.cuts();
        (cuts[self.band_range.end], cuts[self.band_range.start])
    }

    pub fn calculator(&self, tolerance: f64) -> HabitatProtectionCalculator {
        HabitatProtectionCalculator {
            band: self.band,
            tolerance,
        }
    }
}

/// Output row, keyed by region id
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRow {
    pub region_id: u64,
    pub total_area: f64,
    pub strata_total: Vec<f64>,
    pub protected_area: f64,
    pub strata_protected: Vec<f64>,
    pub protected_fraction: f64,
}

/// Validated result of one vintage
#[derive(Debug, Clone)]
pub struct VintageRun {
    pub table: StratumTable,
    pub metrics: Vec<ProtectionMetric>,
    /// Stratum indices the metrics were reduced over
    pub band: Range<usize>,
}

/// Files written for one vintage
#[derive(Debug, Clone, PartialEq)]
pub struct VintageFiles {
    pub json: PathBuf,
    pub csv: PathBuf,
}

#[derive(Serialize)]
struct VintageReport<'a> {
    label: &'a str,
    strata: Vec<String>,
    band: Vec<String>,
    rows: Vec<ResultRow>,
    audit: &'a AggregationAudit,
}

impl VintageRun {
    pub fn label(&self) -> &str {
        &self.table.label
    }

    pub fn band_labels(&self) -> Vec<String> {
        self.table.strata.labels()[self.band.clone()].to_vec()
    }

    /// Write `<label>_habitat.json` and `<label>_habitat.csv` into `dir`
    pub fn persist(&self, dir: &Path) -> Result<VintageFiles> {
        let report = VintageReport {
            label: self.label(),
            strata: self.table.strata.labels(),
            band: self.band_labels(),
            rows: self.rows(),
            audit: &self.table.audit,
        };
        let files = VintageFiles {
            json: dir.join(format!("{}_habitat.json", self.label())),
            csv: dir.join(format!("{}_habitat.csv", self.label())),
        };
        std::fs::write(&files.json, serde_json::to_string_pretty(&report)?)?;
        std::fs::write(&files.csv, self.to_csv())?;
        Ok(files)
    }

    /// Records joined with their metrics, in region id order
    pub fn rows(&self) -> Vec<ResultRow> {
        self.table
            .records
            .iter()
            .zip(&self.metrics)
            .map(|(record, metric)| ResultRow {
                region_id: record.region_id,
                total_area: record.total_area,
                strata_total: record.strata_total.clone(),
                protected_area: record.protected_area,
                strata_protected: record.strata_protected.clone(),
                protected_fraction: metric.protected_fraction,
            })
            .collect()
    }

    /// Rows as CSV text, one column per stratum for both tallies
    pub fn to_csv(&self) -> String {
        let labels = self.table.strata.labels();
        let mut out = String::from("region_id,total_area");
        for label in &labels {
            let _ = write!(out, ",\"total {}\"", label);
        }
        out.push_str(",protected_area");
        for label in &labels {
            let _ = write!(out, ",\"protected {}\"", label);
        }
        out.push_str(",protected_fraction\n");

        for row in self.rows() {
            let _ = write!(out, "{},{}", row.region_id, row.total_area);
            for v in &row.strata_total {
                let _ = write!(out, ",{}", v);
            }
            let _ = write!(out, ",{}", row.protected_area);
            for v in &row.strata_protected {
                let _ = write!(out, ",{}", v);
            }
            let _ = writeln!(out, ",{}", row.protected_fraction);
        }
        out
    }
}

/// Run one vintage against the shared composite and region set.
///
/// Both vintages go through this one routine; they share nothing mutable, so
/// the two calls may run concurrently.
///
/// # Errors
/// Alignment errors before any work, `ValidationFailed` when the gate
/// rejects the table. Either way no partial result is returned.
pub fn run_vintage(
    composite: &Raster<f64>,
    regions: &RegionSet,
    strata: &DepthStrata,
    calculator: &HabitatProtectionCalculator,
    layer: &ProtectionLayer,
) -> Result<VintageRun> {
    if regions.is_empty() {
        return Err(Error::Algorithm("no reporting regions to aggregate".into()));
    }

    let table = aggregate_regions(composite, regions, layer, strata)?;
    let metrics = calculator.calculate(&table)?;
    let band = calculator.band.range(table.strata.len())?;

    info!(
        layer = layer.label(),
        regions = metrics.len(),
        empty = table.audit.empty_regions.len(),
        "vintage validated"
    );

    Ok(VintageRun {
        table,
        metrics,
        band,
    })
}

/// Run every layer against the shared composite and regions, concurrently
/// with the `parallel` feature.
///
/// Results come back in layer order. A layer that fails leaves the others
/// untouched.
pub fn run_vintages(
    composite: &Raster<f64>,
    regions: &RegionSet,
    schedule: &HabitatSchedule,
    tolerance: f64,
    layers: &[ProtectionLayer],
) -> Vec<Result<VintageRun>> {
    let calculator = schedule.calculator(tolerance);
    layers
        .into_par_iter()
        .map(|layer| run_vintage(composite, regions, schedule.strata(), &calculator, layer))
        .collect()
}
