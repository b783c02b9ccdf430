//! Gap filling of a fine depth raster from a coarse one
//!
//! 1. Crop both rasters to the domain of interest
//! 2. Nearest-neighbour resample the coarse raster onto the fine grid
//! 3. Composite: fine value where valid, resampled coarse value elsewhere
//! 4. Smooth the composite: mean of bilinear passes on the grid staggered
//!    toward each of the four diagonals
//! 5. Composite again: smoothed value only where the fine raster had no data
//!
//! Cells that were valid in the fine raster come out bit-for-bit unchanged.
//! Holes with no coarse coverage stay no-data and are reported as residual.

mod domain;

pub use domain::{clip_to_extent, domain_mask};

use crate::maybe_rayon::*;
use crate::resample::{resample_bilinear, resample_nearest, GridSpec};
use crate::vector::bounding_extent;
use bathyzone_core::raster::Raster;
use bathyzone_core::{Algorithm, Error, Result};
use geo::MultiPolygon;
use tracing::{debug, warn};

/// Parameters for gap filling
#[derive(Debug, Clone)]
pub struct GapFillParams {
    /// Offset of the smoothing grids, in cells along both axes.
    ///
    /// One bilinear pass is taken per diagonal direction and the passes are
    /// averaged, so the fill is not pulled toward any side. At 0.5 this is a
    /// 3x3 `[1 2 1]` tent kernel.
    pub smoothing_shift: f64,
    /// Extra coarse cells kept around the fine extent when cropping
    pub coarse_margin_cells: usize,
}

impl Default for GapFillParams {
    fn default() -> Self {
        Self {
            smoothing_shift: 0.5,
            coarse_margin_cells: 1,
        }
    }
}

/// Inputs for [`RasterGapFiller`]
#[derive(Debug, Clone)]
pub struct GapFillInput {
    pub fine: Raster<f64>,
    pub coarse: Raster<f64>,
    pub domain: Option<MultiPolygon<f64>>,
}

/// No-data cells left inside the domain after filling
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ResidualGaps {
    pub cells: usize,
    /// Map area of those cells
    pub area: f64,
}

impl ResidualGaps {
    pub fn is_empty(&self) -> bool {
        self.cells == 0
    }
}

/// What the filler did
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GapFillReport {
    /// No-data cells inside the domain before filling
    pub original_gaps: usize,
    /// Of those, cells that received a value
    pub filled_cells: usize,
    pub residual: ResidualGaps,
}

#[derive(Debug, Clone)]
pub struct GapFillOutput {
    pub raster: Raster<f64>,
    pub report: GapFillReport,
}

/// Composite a fine raster's holes from a coarse raster
#[derive(Debug, Clone, Default)]
pub struct RasterGapFiller;

impl Algorithm for RasterGapFiller {
    type Input = GapFillInput;
    type Output = GapFillOutput;
    type Params = GapFillParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "Raster Gap Filler"
    }

    fn description(&self) -> &'static str {
        "Fill no-data holes in a fine raster from a coarse raster, then smooth the fill"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        fill_gaps(&input.fine, &input.coarse, input.domain.as_ref(), &params)
    }
}

/// Check CRS and extents before any computation
fn check_alignment(
    fine: &Raster<f64>,
    coarse: &Raster<f64>,
    domain: Option<&MultiPolygon<f64>>,
) -> Result<()> {
    if let (Some(a), Some(b)) = (fine.crs(), coarse.crs()) {
        if !a.is_equivalent(b) {
            return Err(Error::CrsMismatch(a.identifier(), b.identifier()));
        }
    }

    if !fine.extent().intersects(&coarse.extent()) {
        return Err(Error::NoOverlap("fine and coarse rasters".into()));
    }

    if let Some(domain) = domain {
        let overlaps = bounding_extent(domain).is_some_and(|e| e.intersects(&fine.extent()));
        if !overlaps {
            return Err(Error::NoOverlap("domain of interest and fine raster".into()));
        }
    }

    Ok(())
}

/// Fill the no-data holes of `fine` from `coarse`.
///
/// The output lies on `fine`'s lattice, cropped to the domain's bounding
/// box when a domain is given. Cells whose center falls outside the domain
/// are no-data.
///
/// # Errors
/// `CrsMismatch` or `NoOverlap` when the inputs are misaligned, and
/// `InvalidParameter` for a smoothing shift outside `[0, 1)`.
pub fn fill_gaps(
    fine: &Raster<f64>,
    coarse: &Raster<f64>,
    domain: Option<&MultiPolygon<f64>>,
    params: &GapFillParams,
) -> Result<GapFillOutput> {
    if !(0.0..1.0).contains(&params.smoothing_shift) {
        return Err(Error::InvalidParameter {
            name: "smoothing_shift",
            value: params.smoothing_shift.to_string(),
            reason: "must lie in [0, 1)".into(),
        });
    }
    check_alignment(fine, coarse, domain)?;

    // Step 1: crop to the area of interest
    let fine = match domain.and_then(bounding_extent) {
        Some(extent) => clip_to_extent(fine, &extent)?,
        None => fine.clone(),
    };
    let margin = coarse.cell_size() * params.coarse_margin_cells as f64;
    let coarse = clip_to_extent(coarse, &fine.extent().expanded(margin))?;

    let grid = GridSpec::of(&fine);
    let inside = domain_mask(&grid, domain)?;
    let (rows, cols) = fine.shape();

    // Step 2: blocky but complete coarse values on the fine lattice
    let coarse_on_fine = resample_nearest(&coarse, &grid)?;

    // Step 3: first composite
    let first = composite(&fine, &coarse_on_fine, |_, _| true)?;

    // Step 4: smoothing, centred on each cell
    let shift = params.smoothing_shift;
    let passes = [(shift, shift), (shift, -shift), (-shift, shift), (-shift, -shift)]
        .iter()
        .map(|&(d_col, d_row)| resample_bilinear(&first, &grid.offset(d_col, d_row)))
        .collect::<Result<Vec<_>>>()?;
    let smoothed = mean_of(&passes)?;

    // Step 5: smoothed values only where the fine raster had holes
    let mut raster = composite(&fine, &smoothed, |row, col| inside[(row, col)])?;
    raster.set_crs(fine.crs().cloned());

    let (mut original_gaps, mut residual_cells) = (0, 0);
    for ((row, col), _) in inside.indexed_iter().filter(|&(_, &m)| m) {
        if fine.valid_value(row, col).is_none() {
            original_gaps += 1;
        }
        if raster.valid_value(row, col).is_none() {
            residual_cells += 1;
        }
    }

    let report = GapFillReport {
        original_gaps,
        filled_cells: original_gaps - residual_cells,
        residual: ResidualGaps {
            cells: residual_cells,
            area: residual_cells as f64 * fine.transform().cell_area(),
        },
    };

    debug!(
        rows,
        cols,
        original_gaps = report.original_gaps,
        filled = report.filled_cells,
        "gap fill complete"
    );
    if !report.residual.is_empty() {
        warn!(
            cells = report.residual.cells,
            area = report.residual.area,
            "composite still has no-data cells inside the domain; they are excluded from sampling"
        );
    }

    Ok(GapFillOutput { raster, report })
}

/// Cell-wise mean of the valid values of rasters sharing one grid
fn mean_of(passes: &[Raster<f64>]) -> Result<Raster<f64>> {
    let first = passes
        .first()
        .ok_or_else(|| Error::Algorithm("no smoothing passes".into()))?;
    let (rows, cols) = first.shape();

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];

            for (col, cell) in row_data.iter_mut().enumerate() {
                let (sum, n) = passes
                    .iter()
                    .filter_map(|p| p.valid_value(row, col))
                    .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
                if n > 0 {
                    *cell = sum / n as f64;
                }
            }

            row_data
        })
        .collect();

    let mut output = Raster::from_vec(data, rows, cols)?;
    output.set_transform(*first.transform());
    output.set_nodata(Some(f64::NAN));

    Ok(output)
}

/// Cell-wise merge on `base`'s grid: `base` where valid, else `fill`.
///
/// Cells for which `keep` is false become no-data.
fn composite<F>(base: &Raster<f64>, fill: &Raster<f64>, keep: F) -> Result<Raster<f64>>
where
    F: Fn(usize, usize) -> bool + Sync,
{
    let (rows, cols) = base.shape();
    if fill.shape() != (rows, cols) {
        return Err(Error::SizeMismatch {
            er: rows,
            ec: cols,
            ar: fill.rows(),
            ac: fill.cols(),
        });
    }

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];

            for (col, cell) in row_data.iter_mut().enumerate() {
                if !keep(row, col) {
                    continue;
                }
                *cell = base
                    .valid_value(row, col)
                    .or_else(|| fill.valid_value(row, col))
                    .unwrap_or(f64::NAN);
            }

            row_data
        })
        .collect();

    let mut output = Raster::from_vec(data, rows, cols)?;
    output.set_transform(*base.transform());
    output.set_nodata(Some(f64::NAN));

    Ok(output)
}
