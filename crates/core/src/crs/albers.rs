//! Pure-Rust Albers Equal-Area Conic projection (Snyder 1987, eqs. 14-1 to 14-21).
//!
//! Ellipsoidal forward and inverse formulas on GRS80, which is what the NAD83
//! Albers CRSs (EPSG:3338, EPSG:5070) use. No libproj dependency.

// ── GRS80 ellipsoid constants ────────────────────────────────────────────

const A: f64 = 6_378_137.0; // semi-major axis (m)
const F: f64 = 1.0 / 298.257_222_101; // flattening
const E2: f64 = 2.0 * F - F * F; // eccentricity squared

/// Albers Equal-Area Conic projection with precomputed constants
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlbersEqualArea {
    lon0: f64,
    false_easting: f64,
    false_northing: f64,
    n: f64,
    c: f64,
    rho0: f64,
}

impl AlbersEqualArea {
    /// Build a projection from standard parallels, origin and false offsets (degrees / metres)
    pub fn new(
        lat1: f64,
        lat2: f64,
        lat0: f64,
        lon0: f64,
        false_easting: f64,
        false_northing: f64,
    ) -> Self {
        let (phi1, phi2, phi0) = (lat1.to_radians(), lat2.to_radians(), lat0.to_radians());

        let m1 = m(phi1);
        let m2 = m(phi2);
        let q1 = q(phi1);
        let q2 = q(phi2);
        let q0 = q(phi0);

        let n = if (phi1 - phi2).abs() < 1e-12 {
            phi1.sin()
        } else {
            (m1 * m1 - m2 * m2) / (q2 - q1)
        };
        let c = m1 * m1 + n * q1;
        let rho0 = A * (c - n * q0).sqrt() / n;

        Self {
            lon0: lon0.to_radians(),
            false_easting,
            false_northing,
            n,
            c,
            rho0,
        }
    }

    /// NAD83 / Alaska Albers (EPSG:3338)
    pub fn alaska() -> Self {
        Self::new(55.0, 65.0, 50.0, -154.0, 0.0, 0.0)
    }

    /// NAD83 / Conus Albers (EPSG:5070)
    pub fn conus() -> Self {
        Self::new(29.5, 45.5, 23.0, -96.0, 0.0, 0.0)
    }

    /// Project (lon, lat) in degrees to (easting, northing) in metres
    pub fn forward(&self, lon: f64, lat: f64) -> (f64, f64) {
        let phi = lat.to_radians();
        let rho = A * (self.c - self.n * q(phi)).max(0.0).sqrt() / self.n;
        let theta = self.n * wrap_lon(lon.to_radians() - self.lon0);

        let x = rho * theta.sin() + self.false_easting;
        let y = self.rho0 - rho * theta.cos() + self.false_northing;
        (x, y)
    }
}

fn m(phi: f64) -> f64 {
    let s = phi.sin();
    phi.cos() / (1.0 - E2 * s * s).sqrt()
}

fn q(phi: f64) -> f64 {
    let e = E2.sqrt();
    let s = phi.sin();
    (1.0 - E2) * (s / (1.0 - E2 * s * s) - (1.0 / (2.0 * e)) * ((1.0 - e * s) / (1.0 + e * s)).ln())
}

fn wrap_lon(mut lambda: f64) -> f64 {
    use std::f64::consts::PI;
    while lambda > PI {
        lambda -= 2.0 * PI;
    }
    while lambda < -PI {
        lambda += 2.0 * PI;
    }
    lambda
}
