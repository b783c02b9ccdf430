//! Bilinear resampling

use super::GridSpec;
use crate::maybe_rayon::*;
use bathyzone_core::raster::Raster;
use bathyzone_core::Result;

/// Resample `source` onto `grid` by bilinear interpolation.
///
/// Each target cell center is located among the four nearest source cell
/// centers and receives their distance-weighted average. Indices past the
/// last row or column clamp to the edge. No-data neighbours are dropped and
/// the remaining weights renormalised; a center with no valid neighbour, or
/// one lying outside the source footprint, becomes NaN.
pub fn resample_bilinear(source: &Raster<f64>, grid: &GridSpec) -> Result<Raster<f64>> {
    let GridSpec { transform, rows, cols } = *grid;
    let (src_rows, src_cols) = source.shape();

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];

            for (col, cell) in row_data.iter_mut().enumerate() {
                let (x, y) = transform.pixel_to_geo(col, row);
                let (fc, fr) = source.geo_to_pixel(x, y);
                if !(0.0..=src_cols as f64).contains(&fc) || !(0.0..=src_rows as f64).contains(&fr) {
                    continue;
                }
                *cell = interpolate(source, fc - 0.5, fr - 0.5);
            }

            row_data
        })
        .collect();

    let mut output = Raster::from_vec(data, rows, cols)?;
    output.set_transform(transform);
    output.set_crs(source.crs().cloned());
    output.set_nodata(Some(f64::NAN));

    Ok(output)
}

/// Weighted average around fractional center coordinates (u, v)
fn interpolate(source: &Raster<f64>, u: f64, v: f64) -> f64 {
    let (rows, cols) = source.shape();
    let c0 = u.floor();
    let r0 = v.floor();
    let fx = u - c0;
    let fy = v - r0;

    let clamp = |i: f64, n: usize| -> usize { (i.max(0.0) as usize).min(n - 1) };
    let (c0i, c1i) = (clamp(c0, cols), clamp(c0 + 1.0, cols));
    let (r0i, r1i) = (clamp(r0, rows), clamp(r0 + 1.0, rows));

    let taps = [
        (r0i, c0i, (1.0 - fx) * (1.0 - fy)),
        (r0i, c1i, fx * (1.0 - fy)),
        (r1i, c0i, (1.0 - fx) * fy),
        (r1i, c1i, fx * fy),
    ];

    let (sum, weight) = taps
        .iter()
        .filter_map(|&(r, c, w)| source.valid_value(r, c).map(|v| (v * w, w)))
        .fold((0.0, 0.0), |(s, ws), (v, w)| (s + v, ws + w));

    if weight > 1e-12 {
        sum / weight
    } else {
        f64::NAN
    }
}
