//! # Orbit Module
//!
//! Sub-satellite position for geotagging and the data rows.
//!
//! This module handles:
//! - The [`PositionProvider`] trait the acquisition loop asks for coordinates
//! - An SGP4 propagator driven by a two-line element set ([`tle`])
//! - A circular-orbit ground track for bench runs ([`circular`])
//! - TEME to geodetic conversion on the WGS84 ellipsoid

pub mod circular;
pub mod tle;

use chrono::{DateTime, Utc};

use crate::error::Result;

/// WGS84 equatorial radius, km.
pub const WGS84_A_KM: f64 = 6378.137;
/// WGS84 flattening.
pub const WGS84_F: f64 = 1.0 / 298.257_223_563;

const WGS84_E2: f64 = WGS84_F * (2.0 - WGS84_F);

/// Point on the reference surface under the platform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPosition {
    /// Degrees, south negative.
    pub latitude: f64,
    /// Degrees, west negative.
    pub longitude: f64,
}

impl GeoPosition {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

/// Trait for position providers to enable testing
#[cfg_attr(test, mockall::automock)]
pub trait PositionProvider {
    /// Sub-satellite point at `at`.
    fn coordinates(&self, at: DateTime<Utc>) -> Result<GeoPosition>;
}

/// Wraps a longitude into (-180, 180].
pub fn wrap_longitude(longitude: f64) -> f64 {
    let wrapped = (longitude + 180.0).rem_euclid(360.0) - 180.0;
    if wrapped == -180.0 {
        180.0
    } else {
        wrapped
    }
}

/// Greenwich mean sidereal time in radians (IAU 1982, UT1 taken as UTC).
pub fn gmst(at: DateTime<Utc>) -> f64 {
    let unix_days =
        (at.timestamp() as f64 + f64::from(at.timestamp_subsec_nanos()) * 1e-9) / 86_400.0;
    let t = (unix_days + 2_440_587.5 - 2_451_545.0) / 36_525.0;
    let seconds = 67_310.548_41 + (876_600.0 * 3600.0 + 8_640_184.812_866) * t
        + 0.093_104 * t * t
        - 6.2e-6 * t * t * t;
    (seconds.rem_euclid(86_400.0) / 240.0).to_radians()
}

/// Rotates a TEME position (km) into the Earth-fixed frame at `at`.
pub fn teme_to_ecef(position: [f64; 3], at: DateTime<Utc>) -> [f64; 3] {
    let (sin, cos) = gmst(at).sin_cos();
    let [x, y, z] = position;
    [cos * x + sin * y, -sin * x + cos * y, z]
}

/// Geodetic latitude and longitude of an Earth-fixed point (km).
pub fn ecef_to_geodetic(position: [f64; 3]) -> GeoPosition {
    let [x, y, z] = position;
    let p = x.hypot(y);

    let mut latitude = z.atan2(p * (1.0 - WGS84_E2));
    for _ in 0..6 {
        let sin = latitude.sin();
        let n = WGS84_A_KM / (1.0 - WGS84_E2 * sin * sin).sqrt();
        latitude = (z + WGS84_E2 * n * sin).atan2(p);
    }

    GeoPosition::new(latitude.to_degrees(), wrap_longitude(y.atan2(x).to_degrees()))
}
