//! Circular-orbit ground track.
//!
//! Models the ground track of a circular orbit over a rotating Earth:
//!
//! ```text
//! u   = 2π · t / period                     (argument of latitude)
//! lat = asin(sin i · sin u)
//! lon = Ω + atan2(cos i · sin u, cos u) − ωE · t
//! ```
//!
//! with `t` measured from an ascending-node crossing at the epoch. Latitudes
//! are geocentric; good enough for bench runs without an element set.

use chrono::{DateTime, Utc};
use tracing::trace;

use super::{wrap_longitude, GeoPosition, PositionProvider};
use crate::error::{Result, SamplerError};

/// Earth sidereal rotation rate, degrees per second.
pub const EARTH_ROTATION_DEG_PER_S: f64 = 360.0 / 86_164.0905;

/// Circular-orbit ground track model
#[derive(Debug, Clone)]
pub struct CircularOrbit {
    inclination_deg: f64,
    period_s: f64,
    ascending_node_lon_deg: f64,
    epoch: DateTime<Utc>,
}

impl CircularOrbit {
    /// Creates a ground track whose ascending-node crossing happens at `epoch`.
    ///
    /// # Errors
    ///
    /// Returns error if the inclination is outside 0-180° or the period is not
    /// positive.
    pub fn new(
        inclination_deg: f64,
        period_minutes: f64,
        ascending_node_lon_deg: f64,
        epoch: DateTime<Utc>,
    ) -> Result<Self> {
        if !(0.0..=180.0).contains(&inclination_deg) {
            return Err(SamplerError::Position(format!(
                "inclination {} outside 0-180 degrees",
                inclination_deg
            )));
        }
        if !(period_minutes > 0.0) {
            return Err(SamplerError::Position(format!(
                "orbital period must be positive, got {}",
                period_minutes
            )));
        }

        Ok(Self {
            inclination_deg,
            period_s: period_minutes * 60.0,
            ascending_node_lon_deg,
            epoch,
        })
    }

    /// Ground position `seconds` after the epoch.
    pub fn position_at(&self, seconds: f64) -> GeoPosition {
        let i = self.inclination_deg.to_radians();
        let u = std::f64::consts::TAU * seconds / self.period_s;

        let latitude = (i.sin() * u.sin()).asin().to_degrees();
        let along_track = (i.cos() * u.sin()).atan2(u.cos()).to_degrees();
        let longitude = wrap_longitude(
            self.ascending_node_lon_deg + along_track - EARTH_ROTATION_DEG_PER_S * seconds,
        );

        GeoPosition::new(latitude, longitude)
    }
}

impl PositionProvider for CircularOrbit {
    fn coordinates(&self, at: DateTime<Utc>) -> Result<GeoPosition> {
        let elapsed = at.signed_duration_since(self.epoch);
        let seconds = elapsed.num_microseconds().ok_or_else(|| {
            SamplerError::Position(format!("time {} too far from epoch {}", at, self.epoch))
        })? as f64
            / 1e6;

        let position = self.position_at(seconds);
        trace!(
            "Sub-satellite point at t+{:.1}s: {:.4}, {:.4}",
            seconds,
            position.latitude,
            position.longitude
        );
        Ok(position)
    }
}
