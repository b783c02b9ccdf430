//! JSON vector layers
//!
//! A layer file is a serialized [`FeatureCollection`]: an optional CRS plus a
//! list of features with `geo-types` geometries and flat attributes.

use crate::error::Result;
use crate::vector::FeatureCollection;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Read a feature layer from a JSON file
pub fn read_layer<P: AsRef<Path>>(path: P) -> Result<FeatureCollection> {
    let reader = BufReader::new(File::open(path.as_ref())?);
    Ok(serde_json::from_reader(reader)?)
}
