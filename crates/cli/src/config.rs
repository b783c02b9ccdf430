//! JSON run configuration for the `run` command

use anyhow::{bail, Context, Result};
use bathyzone_algorithms::habitat::{HabitatBand, HabitatSchedule};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One protection polygon layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VintageConfig {
    /// Name used in logs and output file names
    pub label: String,
    pub path: PathBuf,
    /// Attribute holding the zone identifier, if the layer has one
    #[serde(default)]
    pub id_field: Option<String>,
}

/// Reporting region layer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionsConfig {
    pub path: PathBuf,
    pub id_field: String,
    /// Region ids to keep; empty keeps every region
    pub allow: Vec<u64>,
}

impl Default for RegionsConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("regions.json"),
            id_field: "STAT_AREA".to_string(),
            allow: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub fine: PathBuf,
    pub coarse: PathBuf,
    /// Optional domain-of-interest layer bounding the gap fill
    pub domain: Option<PathBuf>,
    pub regions: RegionsConfig,
    pub vintages: Vec<VintageConfig>,
    /// Decreasing depth cut points
    pub depth_cuts: Vec<f64>,
    pub band: HabitatBand,
    /// EPSG code of the equal-area frame everything is brought into
    pub target_epsg: u32,
    pub smoothing_shift: f64,
    pub coarse_margin_cells: usize,
    /// Relative tolerance of the validation gate
    pub tolerance: f64,
    pub output_dir: PathBuf,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            fine: PathBuf::from("fine.tif"),
            coarse: PathBuf::from("coarse.tif"),
            domain: None,
            regions: RegionsConfig::default(),
            vintages: vec![
                VintageConfig {
                    label: "legacy".to_string(),
                    path: PathBuf::from("legacy_protection.json"),
                    id_field: None,
                },
                VintageConfig {
                    label: "current".to_string(),
                    path: PathBuf::from("current_protection.json"),
                    id_field: Some("Id".to_string()),
                },
            ],
            depth_cuts: vec![0.0, -50.0, -100.0, -150.0, -200.0, -300.0],
            band: HabitatBand::default(),
            target_epsg: 3338,
            smoothing_shift: 0.5,
            coarse_margin_cells: 1,
            tolerance: 1e-9,
            output_dir: PathBuf::from("output"),
        }
    }
}

impl RunConfig {
    /// Read a config file; relative paths resolve against its directory
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: RunConfig = serde_json::from_str(&text)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        let config = config.resolved(base);
        config.validate()?;
        Ok(config)
    }

    fn resolved(mut self, base: &Path) -> Self {
        let fix = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        fix(&mut self.fine);
        fix(&mut self.coarse);
        if let Some(domain) = self.domain.as_mut() {
            fix(domain);
        }
        fix(&mut self.regions.path);
        for vintage in &mut self.vintages {
            fix(&mut vintage.path);
        }
        fix(&mut self.output_dir);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.vintages.is_empty() {
            bail!("Config lists no protection layers");
        }
        for (i, v) in self.vintages.iter().enumerate() {
            if self.vintages[..i].iter().any(|w| w.label == v.label) {
                bail!("Duplicate protection layer label: {}", v.label);
            }
        }
        if self.tolerance < 0.0 || !self.tolerance.is_finite() {
            bail!("Tolerance must be a non-negative number, got {}", self.tolerance);
        }
        self.schedule()?;
        Ok(())
    }

    /// Stratum schedule and habitat band, fixed by the configured cuts
    pub fn schedule(&self) -> Result<HabitatSchedule> {
        HabitatSchedule::new(self.depth_cuts.clone(), self.band).context("Invalid depth schedule")
    }

    pub fn allow_list(&self) -> Option<&[u64]> {
        (!self.regions.allow.is_empty()).then_some(self.regions.allow.as_slice())
    }
}
