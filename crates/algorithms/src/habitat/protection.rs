//! Protected fraction of the habitat depth band, with the output gate

use super::aggregate::{RegionStratumRecord, StratumTable};
use bathyzone_core::{Algorithm, Error, Result, ValidationFailure};
use serde::{Deserialize, Serialize};
use std::ops::Range;
use tracing::debug;

/// Strata making up the habitat band: everything except `skip_shallow`
/// strata at the top and `skip_deep` at the bottom
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HabitatBand {
    pub skip_shallow: usize,
    pub skip_deep: usize,
}

impl Default for HabitatBand {
    fn default() -> Self {
        Self {
            skip_shallow: 1,
            skip_deep: 2,
        }
    }
}

impl HabitatBand {
    /// Stratum indices of the band for a schedule of `strata` strata
    pub fn range(&self, strata: usize) -> Result<Range<usize>> {
        let end = strata.saturating_sub(self.skip_deep);
        if self.skip_shallow >= end {
            return Err(Error::InvalidParameter {
                name: "habitat_band",
                value: format!("skip {} shallow, {} deep", self.skip_shallow, self.skip_deep),
                reason: format!("leaves no stratum out of {}", strata),
            });
        }
        Ok(self.skip_shallow..end)
    }
}

/// Protected fraction of one region's habitat band
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProtectionMetric {
    pub region_id: u64,
    pub band_total_area: f64,
    pub band_protected_area: f64,
    pub protected_fraction: f64,
}

/// Reduces stratum records to band fractions and gates the result
#[derive(Debug, Clone)]
pub struct HabitatProtectionCalculator {
    pub band: HabitatBand,
    /// Relative tolerance for the area comparisons
    pub tolerance: f64,
}

impl Default for HabitatProtectionCalculator {
    fn default() -> Self {
        Self {
            band: HabitatBand::default(),
            tolerance: 1e-9,
        }
    }
}

impl Algorithm for HabitatProtectionCalculator {
    type Input = StratumTable;
    type Output = Vec<ProtectionMetric>;
    type Params = HabitatBand;
    type Error = Error;

    fn name(&self) -> &'static str {
        "Habitat Protection"
    }

    fn description(&self) -> &'static str {
        "Protected fraction of the habitat depth band per reporting region"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        let calculator = Self {
            band: params,
            ..self.clone()
        };
        calculator.calculate(&input)
    }
}

impl HabitatProtectionCalculator {
    pub fn new(band: HabitatBand) -> Self {
        Self {
            band,
            ..Self::default()
        }
    }

    /// Band fraction for one record; zero when the band holds no area
    pub fn metric(&self, record: &RegionStratumRecord, band: Range<usize>) -> ProtectionMetric {
        let band_total_area: f64 = record.strata_total[band.clone()].iter().sum();
        let band_protected_area: f64 = record.strata_protected[band].iter().sum();
        let protected_fraction = if band_total_area == 0.0 {
            0.0
        } else {
            band_protected_area / band_total_area
        };

        ProtectionMetric {
            region_id: record.region_id,
            band_total_area,
            band_protected_area,
            protected_fraction,
        }
    }

    /// Compute every region's metric, then validate the whole table.
    ///
    /// # Errors
    /// `ValidationFailed` naming every offending region; nothing is returned
    /// for a table with any failure.
    pub fn calculate(&self, table: &StratumTable) -> Result<Vec<ProtectionMetric>> {
        let band = self.band.range(table.strata.len())?;
        let metrics: Vec<ProtectionMetric> = table
            .records
            .iter()
            .map(|r| self.metric(r, band.clone()))
            .collect();

        self.validate(table, &metrics)?;
        debug!(layer = %table.label, regions = metrics.len(), ?band, "habitat band metrics validated");
        Ok(metrics)
    }

    /// Check the numeric invariants of a table and its metrics
    pub fn validate(&self, table: &StratumTable, metrics: &[ProtectionMetric]) -> Result<()> {
        let mut failures = Vec::new();

        for (record, metric) in table.records.iter().zip(metrics) {
            let tol = self.tolerance * record.total_area.abs().max(1.0);
            let mut fail = |reason: String| {
                failures.push(ValidationFailure {
                    region_id: record.region_id,
                    reason,
                })
            };

            let fraction = metric.protected_fraction;
            if !(0.0..=1.0 + self.tolerance).contains(&fraction) {
                fail(format!("protected fraction {} outside [0, 1]", fraction));
            }

            for (s, (p, t)) in record
                .strata_protected
                .iter()
                .zip(&record.strata_total)
                .enumerate()
            {
                if p - t > tol {
                    fail(format!("stratum {}: protected area {} exceeds total {}", s, p, t));
                }
            }

            let total_sum: f64 = record.strata_total.iter().sum();
            if (total_sum - record.total_area).abs() > tol {
                fail(format!(
                    "stratum areas sum to {} but region area is {}",
                    total_sum, record.total_area
                ));
            }

            let protected_sum: f64 = record.strata_protected.iter().sum();
            if (protected_sum - record.protected_area).abs() > tol {
                fail(format!(
                    "protected stratum areas sum to {} but protected area is {}",
                    protected_sum, record.protected_area
                ));
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(Error::ValidationFailed {
                label: table.label.clone(),
                failures,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::habitat::aggregate::AggregationAudit;
    use crate::statistics::DepthStrata;

    fn record(region_id: u64, total: Vec<f64>, protected: Vec<f64>) -> RegionStratumRecord {
        let total_area = total.iter().sum();
        RegionStratumRecord {
            region_id,
            polygon_area: total_area,
            total_area,
            protected_area: protected.iter().sum(),
            strata_total: total,
            strata_protected: protected,
            protected_polygon_area: 0.0,
            sample_count: 1,
            protected_sample_count: 0,
            unstratified_count: 0,
            missing_count: 0,
            protection_zones: vec![],
        }
    }

    fn table(records: Vec<RegionStratumRecord>) -> StratumTable {
        StratumTable {
            label: "current".into(),
            strata: DepthStrata::new(vec![0.0, -50.0, -100.0, -150.0, -200.0, -300.0]).unwrap(),
            records,
            audit: AggregationAudit::default(),
        }
    }

    #[test]
    fn test_band_range() {
        let band = HabitatBand::default();
        assert_eq!(band.range(5).unwrap(), 1..3);
        assert!(band.range(3).is_err());
        assert_eq!(HabitatBand { skip_shallow: 0, skip_deep: 0 }.range(2).unwrap(), 0..2);
    }

    #[test]
    fn test_fraction_over_band_only() {
        let t = table(vec![record(
            7,
            vec![100.0, 40.0, 60.0, 10.0, 10.0],
            vec![100.0, 10.0, 30.0, 10.0, 10.0],
        )]);
        let metrics = HabitatProtectionCalculator::default().calculate(&t).unwrap();
        assert_eq!(metrics[0].band_total_area, 100.0);
        assert_eq!(metrics[0].band_protected_area, 40.0);
        assert_eq!(metrics[0].protected_fraction, 0.4);
    }

    #[test]
    fn test_empty_band_gives_zero_fraction() {
        let t = table(vec![record(7, vec![5.0, 0.0, 0.0, 5.0, 0.0], vec![0.0; 5])]);
        let metrics = HabitatProtectionCalculator::default().calculate(&t).unwrap();
        assert_eq!(metrics[0].protected_fraction, 0.0);
    }

    #[test]
    fn test_gate_rejects_and_names_every_failing_region() {
        let t = table(vec![
            record(1, vec![0.0, 10.0, 10.0, 0.0, 0.0], vec![0.0, 5.0, 5.0, 0.0, 0.0]),
            record(2, vec![0.0, 10.0, 10.0, 0.0, 0.0], vec![0.0, 20.0, 5.0, 0.0, 0.0]),
            record(3, vec![0.0, 1.0, 1.0, 0.0, 0.0], vec![0.0, 1.5, 1.0, 0.0, 0.0]),
        ]);

        let err = HabitatProtectionCalculator::default().calculate(&t).unwrap_err();
        match err {
            Error::ValidationFailed { label, failures } => {
                assert_eq!(label, "current");
                let mut ids: Vec<u64> = failures.iter().map(|f| f.region_id).collect();
                ids.dedup();
                assert_eq!(ids, vec![2, 3]);
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn test_gate_rejects_broken_sum() {
        let mut bad = record(4, vec![0.0, 10.0, 10.0, 0.0, 0.0], vec![0.0; 5]);
        bad.total_area = 25.0;
        let err = HabitatProtectionCalculator::default()
            .calculate(&table(vec![bad]))
            .unwrap_err();
        assert!(err.to_string().contains("region 4"));
    }

    #[test]
    fn test_algorithm_trait_uses_band_params() {
        let t = table(vec![record(
            9,
            vec![10.0, 10.0, 10.0, 10.0, 10.0],
            vec![10.0, 0.0, 0.0, 0.0, 0.0],
        )]);
        let calculator = HabitatProtectionCalculator::default();
        let whole = calculator
            .execute(t, HabitatBand { skip_shallow: 0, skip_deep: 0 })
            .unwrap();
        assert_eq!(whole[0].protected_fraction, 0.2);
    }
}
