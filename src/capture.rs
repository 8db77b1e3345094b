//! # Capture Step
//!
//! Takes one geotagged photo of the ground track.
//!
//! The camera's EXIF map receives the four GPS tags before the shutter is
//! triggered. The size returned is what the filesystem reports once the file
//! has been written.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::camera::{
    CameraDevice, EXIF_GPS_LATITUDE, EXIF_GPS_LATITUDE_REF, EXIF_GPS_LONGITUDE,
    EXIF_GPS_LONGITUDE_REF,
};
use crate::error::{Result, SamplerError};
use crate::geotag::{encode, latitude_ref, longitude_ref};
use crate::orbit::GeoPosition;

/// Path of the photo for iteration `counter`, e.g. `photo_0007.jpg`.
pub fn photo_path(dir: &Path, counter: u32) -> PathBuf {
    dir.join(format!("photo_{:04}.jpg", counter))
}

/// Sets the GPS tags for `position` on the camera.
pub fn apply_geotag(camera: &mut dyn CameraDevice, position: &GeoPosition) {
    let (south, latitude) = encode(position.latitude);
    let (west, longitude) = encode(position.longitude);

    let tags = camera.exif_tags_mut();
    tags.insert(EXIF_GPS_LATITUDE.to_string(), latitude.to_string());
    tags.insert(EXIF_GPS_LATITUDE_REF.to_string(), latitude_ref(south).to_string());
    tags.insert(EXIF_GPS_LONGITUDE.to_string(), longitude.to_string());
    tags.insert(EXIF_GPS_LONGITUDE_REF.to_string(), longitude_ref(west).to_string());
}

/// Captures a geotagged photo to `path` and returns its size in bytes.
///
/// # Errors
///
/// Returns [`SamplerError::Capture`] if the camera fails or the written file
/// cannot be inspected.
pub fn capture(camera: &mut dyn CameraDevice, position: &GeoPosition, path: &Path) -> Result<u64> {
    apply_geotag(camera, position);

    camera.capture_to(path).map_err(|e| match e {
        SamplerError::Capture(_) => e,
        other => SamplerError::Capture(other.to_string()),
    })?;

    let size = fs::metadata(path)
        .map_err(|e| SamplerError::Capture(format!("Failed to stat {}: {}", path.display(), e)))?
        .len();

    debug!("Captured {} ({} bytes)", path.display(), size);
    Ok(size)
}
