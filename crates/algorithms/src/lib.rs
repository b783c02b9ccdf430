//! # bathyzone algorithms
//!
//! Processing stages for depth-stratified habitat accounting.
//!
//! ## Modules
//!
//! - **resample**: nearest-neighbour and bilinear raster resampling
//! - **gapfill**: fill fine-raster holes from a coarse raster
//! - **vector**: polygon area, overlay, point-in-polygon index
//! - **statistics**: depth strata and zonal stratum counts
//! - **habitat**: per-region stratum areas and protected fractions

pub(crate) mod maybe_rayon;

pub mod gapfill;
pub mod habitat;
pub mod resample;
pub mod statistics;
pub mod vector;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::gapfill::{fill_gaps, GapFillInput, GapFillOutput, GapFillParams, RasterGapFiller};
    pub use crate::habitat::{
        aggregate_regions, run_vintage, run_vintages, HabitatBand, HabitatProtectionCalculator,
        HabitatSchedule, ProtectionLayer, RegionSet, RegionStratumRecord, StratumTable, VintageRun,
    };
    pub use crate::resample::{resample_bilinear, resample_nearest, GridSpec};
    pub use crate::statistics::{DepthStrata, StratumCounts};
    pub use crate::vector::{multipolygon_area, subdivide, PolygonIndex, ZoneTag};
    pub use bathyzone_core::prelude::*;
}
