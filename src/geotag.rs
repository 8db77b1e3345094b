//! # Geotag Encoding
//!
//! Converts signed geographic angles into the rational triples used by EXIF
//! GPS tags.
//!
//! An angle is first decomposed into sign, degrees, minutes and seconds with no
//! rounding. Rounding happens only when the triple is formatted:
//!
//! ```text
//! 51.5074°  ->  51° 30' 26.64"  ->  "51/1,30/1,266/10"
//! ```
//!
//! Seconds keep one decimal digit (denominator 10), so a decoded triple is
//! within 0.1 arc-second (1/36000°) of the original angle.
//!
//! ## Usage
//!
//! ```
//! use orbit_sampler::geotag::{encode, latitude_ref};
//!
//! let (south, exif) = encode(-0.1278);
//! assert!(south);
//! assert_eq!(exif.to_string(), "0/1,7/1,401/10");
//! assert_eq!(latitude_ref(south), "S");
//! ```

use std::fmt;

/// Minutes per degree and seconds per minute.
const SEXAGESIMAL: f64 = 60.0;

/// Denominator used for the seconds rational.
pub const SECONDS_DENOMINATOR: u32 = 10;

/// A signed angle split into unsigned degrees, minutes and seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoAngle {
    /// True for south latitudes and west longitudes.
    pub negative: bool,
    /// Whole degrees of the magnitude.
    pub degrees: f64,
    /// Whole minutes, 0 to 59.
    pub minutes: f64,
    /// Seconds, 0 (inclusive) to 60 (exclusive), unrounded.
    pub seconds: f64,
}

impl GeoAngle {
    /// Decomposes a signed angle in decimal degrees.
    ///
    /// # Examples
    ///
    /// ```
    /// use orbit_sampler::geotag::GeoAngle;
    ///
    /// let angle = GeoAngle::from_degrees(51.5074);
    /// assert!(!angle.negative);
    /// assert_eq!(angle.degrees, 51.0);
    /// assert_eq!(angle.minutes, 30.0);
    /// assert!((angle.seconds - 26.64).abs() < 1e-6);
    /// ```
    #[must_use]
    pub fn from_degrees(angle: f64) -> Self {
        let magnitude = angle.abs();
        let degrees = magnitude.trunc();
        let total_minutes = (magnitude - degrees) * SEXAGESIMAL;
        let minutes = total_minutes.trunc();
        let seconds = (total_minutes - minutes) * SEXAGESIMAL;

        Self {
            negative: angle < 0.0,
            degrees,
            minutes,
            seconds,
        }
    }

    /// Recombines the parts into signed decimal degrees.
    #[must_use]
    pub fn to_degrees(&self) -> f64 {
        let magnitude =
            self.degrees + self.minutes / SEXAGESIMAL + self.seconds / (SEXAGESIMAL * SEXAGESIMAL);
        if self.negative {
            -magnitude
        } else {
            magnitude
        }
    }
}

/// An unsigned angle as EXIF rationals: `degrees/1, minutes/1, tenths/10`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodedAngle {
    pub degrees: u32,
    pub minutes: u32,
    /// Arc-seconds scaled by 10.
    pub tenths_of_seconds: u32,
}

impl EncodedAngle {
    /// Rounds a decomposed angle into its rational form.
    ///
    /// `f64::round` rounds half away from zero, which is the rounding the
    /// triple is specified with.
    #[must_use]
    pub fn from_geo_angle(angle: &GeoAngle) -> Self {
        Self {
            degrees: angle.degrees.round() as u32,
            minutes: angle.minutes.round() as u32,
            tenths_of_seconds: (angle.seconds * f64::from(SECONDS_DENOMINATOR)).round() as u32,
        }
    }

    /// Decodes the unsigned magnitude back into decimal degrees.
    #[must_use]
    pub fn to_degrees(&self) -> f64 {
        let seconds = f64::from(self.tenths_of_seconds) / f64::from(SECONDS_DENOMINATOR);
        f64::from(self.degrees)
            + f64::from(self.minutes) / SEXAGESIMAL
            + seconds / (SEXAGESIMAL * SEXAGESIMAL)
    }
}

impl fmt::Display for EncodedAngle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/1,{}/1,{}/{}",
            self.degrees, self.minutes, self.tenths_of_seconds, SECONDS_DENOMINATOR
        )
    }
}

/// Encodes a signed angle for a GPS tag.
///
/// Returns `true` as the first element when the angle is negative (south or
/// west) together with the unsigned rational triple.
#[must_use]
pub fn encode(angle: f64) -> (bool, EncodedAngle) {
    let geo = GeoAngle::from_degrees(angle);
    (geo.negative, EncodedAngle::from_geo_angle(&geo))
}

/// Inverse of [`encode`], to within 0.1 arc-second.
#[must_use]
pub fn decode(negative: bool, encoded: &EncodedAngle) -> f64 {
    let magnitude = encoded.to_degrees();
    if negative {
        -magnitude
    } else {
        magnitude
    }
}

/// EXIF `GPSLatitudeRef` value.
pub fn latitude_ref(south: bool) -> &'static str {
    if south {
        "S"
    } else {
        "N"
    }
}

/// EXIF `GPSLongitudeRef` value.
pub fn longitude_ref(west: bool) -> &'static str {
    if west {
        "W"
    } else {
        "E"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 0.1 arc-second in degrees
    const RESOLUTION_DEG: f64 = 1.0 / 36000.0;

    #[test]
    fn test_encode_london_latitude() {
        let geo = GeoAngle::from_degrees(51.5074);
        assert!(!geo.negative);
        assert_eq!(geo.degrees, 51.0);
        assert_eq!(geo.minutes, 30.0);
        assert!((geo.seconds - 26.64).abs() < 1e-6);

        let (south, exif) = encode(51.5074);
        assert!(!south);
        assert_eq!(exif.to_string(), "51/1,30/1,266/10");
    }

    #[test]
    fn test_encode_london_longitude() {
        let geo = GeoAngle::from_degrees(-0.1278);
        assert!(geo.negative);
        assert_eq!(geo.degrees, 0.0);
        assert_eq!(geo.minutes, 7.0);
        assert!((geo.seconds - 40.08).abs() < 1e-6);

        let (west, exif) = encode(-0.1278);
        assert!(west);
        assert_eq!(exif.to_string(), "0/1,7/1,401/10");
    }

    #[test]
    fn test_encode_zero() {
        let (negative, exif) = encode(0.0);
        assert!(!negative);
        assert_eq!(exif.to_string(), "0/1,0/1,0/10");
    }

    #[test]
    fn test_encode_docstring_example() {
        // 98° 34' 58.7"
        let angle = 98.0 + 34.0 / 60.0 + 58.7 / 3600.0;
        let (_, exif) = encode(angle);
        assert_eq!(exif.to_string(), "98/1,34/1,587/10");
    }

    #[test]
    fn test_decomposition_ranges() {
        for &angle in &[179.999, -179.999, 90.0, -90.0, 0.5, -45.25, 12.3456] {
            let geo = GeoAngle::from_degrees(angle);
            assert!(geo.degrees >= 0.0 && geo.degrees <= 179.0, "degrees for {}", angle);
            assert!(geo.minutes >= 0.0 && geo.minutes <= 59.0, "minutes for {}", angle);
            assert!(geo.seconds >= 0.0 && geo.seconds < 60.0, "seconds for {}", angle);
            assert!((geo.to_degrees() - angle).abs() < 1e-9);
        }
    }

    #[test]
    fn test_round_trip_within_resolution() {
        let mut angle = -179.999;
        while angle <= 179.999 {
            let (negative, exif) = encode(angle);
            assert_eq!(negative, angle < 0.0, "sign for {}", angle);

            let decoded = decode(negative, &exif);
            assert!(
                (decoded - angle).abs() <= RESOLUTION_DEG,
                "angle {} decoded to {}",
                angle,
                decoded
            );
            angle += 0.0137;
        }
    }

    #[test]
    fn test_hemisphere_refs() {
        assert_eq!(latitude_ref(true), "S");
        assert_eq!(latitude_ref(false), "N");
        assert_eq!(longitude_ref(true), "W");
        assert_eq!(longitude_ref(false), "E");
    }
}
