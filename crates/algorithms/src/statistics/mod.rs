//! Depth-stratified statistics for raster data
//!
//! - **strata**: depth strata from a decreasing cut sequence
//! - **zonal**: streaming per-stratum cell counts inside polygon zones

pub mod strata;
pub mod zonal;

pub use strata::{DepthStrata, DepthStratum};
pub use zonal::{zonal_stratum_counts, StratumCounts};
