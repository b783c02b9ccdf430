//! Domain-of-interest clipping and masking

use crate::maybe_rayon::*;
use crate::resample::GridSpec;
use crate::vector::PolygonIndex;
use bathyzone_core::raster::{Extent, Raster};
use bathyzone_core::{Error, Result};
use geo::MultiPolygon;
use ndarray::Array2;

/// Crop `raster` to the cells overlapping `extent`.
///
/// The result stays on the raster's own lattice: its cells are a sub-block
/// of the input, never resampled.
pub fn clip_to_extent(raster: &Raster<f64>, extent: &Extent) -> Result<Raster<f64>> {
    let window = GridSpec::of(raster).cells_over(extent).ok_or_else(|| {
        Error::NoOverlap(format!(
            "raster {:?} does not reach {:?}",
            raster.extent(),
            extent
        ))
    })?;

    raster.window(
        window.rows.start,
        window.cols.start,
        window.rows.len(),
        window.cols.len(),
    )
}

/// Which cells of `grid` have their center inside `domain`.
///
/// Without a domain every cell is inside.
pub fn domain_mask(grid: &GridSpec, domain: Option<&MultiPolygon<f64>>) -> Result<Array2<bool>> {
    let GridSpec { transform, rows, cols } = *grid;

    let Some(domain) = domain else {
        return Ok(Array2::from_elem((rows, cols), true));
    };
    let index = PolygonIndex::from_multipolygon(domain);

    let flags: Vec<bool> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            (0..cols)
                .map(|col| {
                    let (x, y) = transform.pixel_to_geo(col, row);
                    index.contains_point(x, y)
                })
                .collect::<Vec<bool>>()
        })
        .collect();

    Array2::from_shape_vec((rows, cols), flags).map_err(|e| Error::Algorithm(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bathyzone_core::GeoTransform;
    use geo::{LineString, Polygon};

    fn raster() -> Raster<f64> {
        let data: Vec<f64> = (0..64).map(|i| i as f64).collect();
        Raster::from_vec(data, 8, 8)
            .unwrap()
            .with_transform(GeoTransform::new(0.0, 80.0, 10.0, -10.0))
    }

    #[test]
    fn test_clip_keeps_lattice() {
        let clipped = clip_to_extent(&raster(), &Extent::new(22.0, 31.0, 48.0, 59.0)).unwrap();
        assert_eq!(clipped.shape(), (3, 3));
        assert_eq!(clipped.transform().origin_x, 20.0);
        assert_eq!(clipped.transform().origin_y, 60.0);
        // Top-left of the block is row 2, col 2 of the source
        assert_eq!(clipped.get(0, 0).unwrap(), 18.0);
    }

    #[test]
    fn test_clip_outside_is_no_overlap() {
        let err = clip_to_extent(&raster(), &Extent::new(500.0, 500.0, 600.0, 600.0)).unwrap_err();
        assert!(err.is_alignment());
    }

    #[test]
    fn test_domain_mask_by_center() {
        let grid = GridSpec::of(&raster());
        let triangle = MultiPolygon::new(vec![Polygon::new(
            LineString::from(vec![(0.0, 0.0), (80.0, 0.0), (0.0, 80.0), (0.0, 0.0)]),
            vec![],
        )]);

        let mask = domain_mask(&grid, Some(&triangle)).unwrap();
        assert_eq!(mask.dim(), (8, 8));
        // (5, 65) is inside, top-right center (75, 75) is not
        assert!(mask[(1, 0)]);
        assert!(!mask[(0, 7)]);
        assert!(domain_mask(&grid, None).unwrap().iter().all(|&m| m));
    }
}
