//! Benchmarks for gap filling and stratum aggregation

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use bathyzone_algorithms::gapfill::{fill_gaps, GapFillParams};
use bathyzone_algorithms::habitat::{
    aggregate_regions, ProtectionLayer, ProtectionZone, RegionSet, ReportingRegion,
};
use bathyzone_algorithms::statistics::DepthStrata;
use bathyzone_core::{GeoTransform, Raster};
use geo::{LineString, MultiPolygon, Polygon};

fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> MultiPolygon<f64> {
    MultiPolygon::new(vec![Polygon::new(
        LineString::from(vec![(x0, y0), (x1, y0), (x1, y1), (x0, y1), (x0, y0)]),
        vec![],
    )])
}

fn create_bathymetry(size: usize) -> Raster<f64> {
    let mut raster = Raster::new(size, size);
    raster.set_transform(GeoTransform::new(0.0, size as f64, 1.0, -1.0));

    for row in 0..size {
        for col in 0..size {
            let slope = -((row + col) as f64) * 300.0 / (2 * size) as f64;
            let ripple = ((row * 7 + col * 13) % 20) as f64;
            raster.set(row, col, slope - ripple).unwrap();
        }
    }
    raster
}

fn bench_aggregate(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregate_regions");
    let strata = DepthStrata::new(vec![0.0, -50.0, -100.0, -150.0, -200.0, -250.0, -400.0]).unwrap();

    for size in [256, 512, 1024].iter() {
        let raster = create_bathymetry(*size);
        let s = *size as f64;
        let step = s / 8.0;

        let regions = RegionSet::from_regions(
            None,
            (0..64)
                .map(|i| {
                    let (x, y) = ((i % 8) as f64 * step, (i / 8) as f64 * step);
                    ReportingRegion { id: i as u64, geometry: rect(x, y, x + step, y + step) }
                })
                .collect(),
        );
        let layer = ProtectionLayer::from_zones(
            "bench",
            None,
            vec![
                ProtectionZone { id: "a".into(), geometry: rect(0.1 * s, 0.1 * s, 0.6 * s, 0.5 * s) },
                ProtectionZone { id: "b".into(), geometry: rect(0.4 * s, 0.3 * s, 0.9 * s, 0.9 * s) },
            ],
        );

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| aggregate_regions(black_box(&raster), &regions, &layer, &strata).unwrap())
        });
    }

    group.finish();
}

fn bench_gap_fill(c: &mut Criterion) {
    let mut group = c.benchmark_group("fill_gaps");

    for size in [256, 512, 1024].iter() {
        let mut fine = create_bathymetry(*size);
        for row in (0..*size).step_by(3) {
            for col in 0..*size / 2 {
                fine.set(row, col, f64::NAN).unwrap();
            }
        }
        let mut coarse = Raster::filled(size / 8 + 2, size / 8 + 2, -150.0);
        coarse.set_transform(GeoTransform::new(-8.0, *size as f64 + 8.0, 8.0, -8.0));

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| fill_gaps(black_box(&fine), &coarse, None, &GapFillParams::default()).unwrap())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_aggregate, bench_gap_fill);
criterion_main!(benches);
