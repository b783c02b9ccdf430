//! Vector operations on polygon layers
//!
//! - Area: planar area of polygonal geometry (meaningful in an equal-area CRS)
//! - PolygonIndex: bounding-box filtered point-in-polygon tests
//! - Dissolve: merge multi-part features sharing an identifier
//! - Overlay: subdivide regions by a protection polygon set

mod measurements;
mod overlay;
mod spatial;

pub use measurements::multipolygon_area;
pub use overlay::{subdivide, SubdividedPart, ZoneTag};
pub use spatial::{bounding_extent, dissolve_by_key, PolygonIndex};
