//! Coordinate Reference System handling
//!
//! Areas are only meaningful in an equal-area projection, so every layer is
//! brought into one Albers equal-area CRS before any computation.

mod albers;

pub use albers::AlbersEqualArea;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coordinate Reference System representation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CRS {
    /// EPSG code if known
    #[serde(default)]
    epsg: Option<u32>,
    /// WKT representation
    #[serde(default)]
    wkt: Option<String>,
}

impl CRS {
    /// Create a CRS from an EPSG code
    pub fn from_epsg(code: u32) -> Self {
        Self {
            epsg: Some(code),
            wkt: None,
        }
    }

    /// Create a CRS from a WKT string
    pub fn from_wkt(wkt: impl Into<String>) -> Self {
        Self {
            epsg: None,
            wkt: Some(wkt.into()),
        }
    }

    /// WGS84 geographic CRS (EPSG:4326)
    pub fn wgs84() -> Self {
        Self::from_epsg(4326)
    }

    /// NAD83 / Alaska Albers (EPSG:3338)
    pub fn alaska_albers() -> Self {
        Self::from_epsg(3338)
    }

    /// NAD83 / Conus Albers (EPSG:5070)
    pub fn conus_albers() -> Self {
        Self::from_epsg(5070)
    }

    /// Get EPSG code if known
    pub fn epsg(&self) -> Option<u32> {
        self.epsg
    }

    /// Geographic lon/lat CRS (WGS84 or NAD83)
    pub fn is_geographic(&self) -> bool {
        matches!(self.epsg, Some(4326) | Some(4269))
    }

    /// Equal-area projection behind this CRS, if it is one we can compute
    pub fn equal_area_projection(&self) -> Option<AlbersEqualArea> {
        match self.epsg? {
            3338 => Some(AlbersEqualArea::alaska()),
            5070 => Some(AlbersEqualArea::conus()),
            _ => None,
        }
    }

    /// Check if two CRS are equivalent
    pub fn is_equivalent(&self, other: &CRS) -> bool {
        if let (Some(a), Some(b)) = (self.epsg, other.epsg) {
            return a == b;
        }

        if let (Some(a), Some(b)) = (&self.wkt, &other.wkt) {
            return a == b;
        }

        false
    }

    /// Get a string identifier for this CRS
    pub fn identifier(&self) -> String {
        if let Some(code) = self.epsg {
            return format!("EPSG:{}", code);
        }
        if let Some(wkt) = &self.wkt {
            let head: String = wkt.chars().take(50).collect();
            return format!("WKT:{}", head);
        }
        "Unknown".to_string()
    }
}

impl fmt::Display for CRS {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.identifier())
    }
}

impl Default for CRS {
    fn default() -> Self {
        Self::alaska_albers()
    }
}
