//! Raster-to-raster resampling
//!
//! Both resamplers evaluate the source at the cell centers of a target grid:
//! - Nearest neighbour: value of the source cell whose footprint contains the center
//! - Bilinear: distance-weighted average of the four nearest source cell centers

mod bilinear;
mod nearest;

pub use bilinear::resample_bilinear;
pub use nearest::resample_nearest;

use bathyzone_core::raster::{Extent, GeoTransform, Raster, RasterElement};
use std::ops::Range;

/// Shape and georeferencing of a target grid
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridSpec {
    pub transform: GeoTransform,
    pub rows: usize,
    pub cols: usize,
}

impl GridSpec {
    pub fn new(transform: GeoTransform, rows: usize, cols: usize) -> Self {
        Self { transform, rows, cols }
    }

    /// The grid a raster lives on
    pub fn of<T: RasterElement>(raster: &Raster<T>) -> Self {
        Self {
            transform: *raster.transform(),
            rows: raster.rows(),
            cols: raster.cols(),
        }
    }

    /// The same grid with cell centers moved by separate column and row fractions
    pub fn offset(&self, d_col: f64, d_row: f64) -> Self {
        Self {
            transform: self.transform.shifted(d_col, d_row),
            ..*self
        }
    }

    /// Rows and columns of the cells that overlap `extent`, `None` when the
    /// extent misses the grid entirely
    pub fn cells_over(&self, extent: &Extent) -> Option<CellWindow> {
        let (c0, r0) = self.transform.geo_to_pixel(extent.min_x, extent.max_y);
        let (c1, r1) = self.transform.geo_to_pixel(extent.max_x, extent.min_y);

        let span = |a: f64, b: f64, n: usize| -> Option<Range<usize>> {
            let (lo, hi) = (a.min(b), a.max(b));
            if !lo.is_finite() || !hi.is_finite() || hi < 0.0 || lo >= n as f64 {
                return None;
            }
            let start = lo.floor().max(0.0) as usize;
            let end = (hi.ceil().max(0.0) as usize).clamp(start + 1, n);
            Some(start..end)
        };

        Some(CellWindow {
            rows: span(r0, r1, self.rows)?,
            cols: span(c0, c1, self.cols)?,
        })
    }
}

/// Rectangular block of cells in grid coordinates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellWindow {
    pub rows: Range<usize>,
    pub cols: Range<usize>,
}

impl CellWindow {
    pub fn len(&self) -> usize {
        self.rows.len() * self.cols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
