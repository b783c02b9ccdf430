//! I/O for rasters and vector layers

mod layer;
mod native;

pub use layer::read_layer;
pub use native::{read_geotiff, write_geotiff};
