//! Nearest neighbour resampling

use super::GridSpec;
use crate::maybe_rayon::*;
use bathyzone_core::raster::Raster;
use bathyzone_core::Result;

/// Resample `source` onto `grid` by nearest neighbour.
///
/// Each target cell takes the value of the source cell whose footprint
/// contains the target cell center. Centers outside the source, or over a
/// source no-data cell, become NaN. The output is exactly aligned to `grid`.
pub fn resample_nearest(source: &Raster<f64>, grid: &GridSpec) -> Result<Raster<f64>> {
    let GridSpec { transform, rows, cols } = *grid;

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];

            for (col, cell) in row_data.iter_mut().enumerate() {
                let (x, y) = transform.pixel_to_geo(col, row);
                if let Some((sr, sc)) = source.cell_containing(x, y) {
                    *cell = source.valid_value(sr, sc).unwrap_or(f64::NAN);
                }
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

#[cfg(test)]
mod tests {
    use super::*;
    use bathyzone_core::GeoTransform;

    /// 2x2 coarse grid of 100 m cells
    fn coarse() -> Raster<f64> {
        Raster::from_vec(vec![-10.0, -20.0, -30.0, -40.0], 2, 2)
            .unwrap()
            .with_transform(GeoTransform::new(0.0, 200.0, 100.0, -100.0))
            .with_nodata(f64::NAN)
    }

    #[test]
    fn test_blocky_upsampling() {
        let grid = GridSpec::new(GeoTransform::new(0.0, 200.0, 25.0, -25.0), 8, 8);
        let result = resample_nearest(&coarse(), &grid).unwrap();

        assert_eq!(result.shape(), (8, 8));
        assert_eq!(result.get(0, 0).unwrap(), -10.0);
        assert_eq!(result.get(3, 3).unwrap(), -10.0);
        assert_eq!(result.get(0, 4).unwrap(), -20.0);
        assert_eq!(result.get(4, 0).unwrap(), -30.0);
        assert_eq!(result.get(7, 7).unwrap(), -40.0);
    }

    #[test]
    fn test_outside_source_is_nan() {
        let grid = GridSpec::new(GeoTransform::new(120.0, 200.0, 100.0, -100.0), 1, 2);
        let result = resample_nearest(&coarse(), &grid).unwrap();

        assert_eq!(result.get(0, 0).unwrap(), -20.0);
        assert!(result.get(0, 1).unwrap().is_nan());
    }

    #[test]
    fn test_source_nodata_propagates() {
        let mut source = coarse();
        source.set(0, 0, f64::NAN).unwrap();
        let grid = GridSpec::new(GeoTransform::new(0.0, 200.0, 50.0, -50.0), 4, 4);
        let result = resample_nearest(&source, &grid).unwrap();

        assert!(result.get(1, 1).unwrap().is_nan());
        assert_eq!(result.get(1, 2).unwrap(), -20.0);
    }
}
