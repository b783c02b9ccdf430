//! Depth-stratified habitat protection accounting
//!
//! - **layers**: reporting regions and protection polygon layers
//! - **aggregate**: per-region stratum areas under one protection layer
//! - **protection**: protected fraction of the habitat band and the output gate
//! - **vintage**: the fixed stratum schedule and one parametrised run per
//!   protection layer vintage

pub mod aggregate;
pub mod layers;
pub mod protection;
pub mod vintage;

pub use aggregate::{
    aggregate_region, aggregate_regions, check_alignment, AggregationAudit, RegionStratumRecord,
    StratumTable,
};
pub use layers::{ProtectionLayer, ProtectionZone, RegionSet, ReportingRegion};
pub use protection::{HabitatBand, HabitatProtectionCalculator, ProtectionMetric};
pub use vintage::{run_vintage, run_vintages, HabitatSchedule, ResultRow, VintageFiles, VintageRun};
