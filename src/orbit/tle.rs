//! Two-line element set propagation.
//!
//! Propagates a NORAD element set with SGP4 and reduces the TEME position to
//! the geodetic sub-satellite point:
//!
//! ```text
//! TLE ──SGP4──> r_TEME(t) ──R3(GMST)──> r_ECEF(t) ──WGS84──> (lat, lon)
//! ```
//!
//! The element file holds the two element lines, optionally preceded by a
//! name line as published by CelesTrak.

use std::fs;
use std::path::Path;

use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::{info, trace};

use super::{ecef_to_geodetic, teme_to_ecef, GeoPosition, PositionProvider};
use crate::error::{Result, SamplerError};

/// Position provider propagating one element set
pub struct TlePropagator {
    name: Option<String>,
    epoch: NaiveDateTime,
    constants: sgp4::Constants,
}

impl TlePropagator {
    /// Parses an element set from text.
    ///
    /// # Errors
    ///
    /// Returns error if fewer than two element lines are present or the lines
    /// fail the format or checksum checks.
    pub fn from_tle(text: &str) -> Result<Self> {
        let lines: Vec<&str> = text
            .lines()
            .map(str::trim_end)
            .filter(|line| !line.trim().is_empty())
            .collect();

        let (name, line1, line2) = match lines.as_slice() {
            [line1, line2] => (None, *line1, *line2),
            [name, line1, line2] => (Some(name.trim().to_string()), *line1, *line2),
            _ => {
                return Err(SamplerError::Position(format!(
                    "expected 2 or 3 element set lines, got {}",
                    lines.len()
                )))
            }
        };

        let elements = sgp4::Elements::from_tle(name.clone(), line1.as_bytes(), line2.as_bytes())
            .map_err(|e| SamplerError::Position(format!("Invalid element set: {}", e)))?;
        let constants = sgp4::Constants::from_elements(&elements)
            .map_err(|e| SamplerError::Position(format!("Unusable element set: {}", e)))?;

        Ok(Self {
            name,
            epoch: elements.datetime,
            constants,
        })
    }

    /// Loads an element set file.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or holds no valid element set.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| {
            SamplerError::Position(format!("Failed to read element set {}: {}", path.display(), e))
        })?;
        let propagator = Self::from_tle(&text)?;
        info!(
            "Loaded element set {} with epoch {} from {}",
            propagator.name().unwrap_or("(unnamed)"),
            propagator.epoch(),
            path.display()
        );
        Ok(propagator)
    }

    /// Object name from the optional first line.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// UTC epoch of the element set.
    pub fn epoch(&self) -> NaiveDateTime {
        self.epoch
    }

    /// Minutes between the element epoch and `at`.
    fn minutes_since_epoch(&self, at: DateTime<Utc>) -> Result<f64> {
        let elapsed = at.naive_utc().signed_duration_since(self.epoch);
        let micros = elapsed.num_microseconds().ok_or_else(|| {
            SamplerError::Position(format!("time {} too far from epoch {}", at, self.epoch))
        })?;
        Ok(micros as f64 / 60e6)
    }
}

impl PositionProvider for TlePropagator {
    fn coordinates(&self, at: DateTime<Utc>) -> Result<GeoPosition> {
        let minutes = self.minutes_since_epoch(at)?;
        let prediction = self
            .constants
            .propagate(sgp4::MinutesSinceEpoch(minutes))
            .map_err(|e| SamplerError::Position(format!("SGP4 failed at {}: {}", at, e)))?;

        let position = ecef_to_geodetic(teme_to_ecef(prediction.position, at));
        trace!(
            "Sub-satellite point {:.1} min from epoch: {:.4}, {:.4}",
            minutes,
            position.latitude,
            position.longitude
        );
        Ok(position)
    }
}
