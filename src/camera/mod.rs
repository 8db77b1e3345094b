//! # Camera Module
//!
//! Still camera abstraction used for ground-track photos.
//!
//! This module handles:
//! - The [`CameraDevice`] trait (resolution, EXIF tag map, capture)
//! - GPS EXIF tag keys
//! - A still-command backend driving `rpicam-still`
//! - A simulated backend writing JPEG-framed placeholder files

pub mod simulated;
pub mod still;

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::Result;

/// EXIF key for the latitude rational triple.
pub const EXIF_GPS_LATITUDE: &str = "GPS.GPSLatitude";
/// EXIF key for the latitude hemisphere (`N`/`S`).
pub const EXIF_GPS_LATITUDE_REF: &str = "GPS.GPSLatitudeRef";
/// EXIF key for the longitude rational triple.
pub const EXIF_GPS_LONGITUDE: &str = "GPS.GPSLongitude";
/// EXIF key for the longitude hemisphere (`E`/`W`).
pub const EXIF_GPS_LONGITUDE_REF: &str = "GPS.GPSLongitudeRef";

/// Default capture width in pixels.
pub const DEFAULT_WIDTH: u32 = 1296;
/// Default capture height in pixels.
pub const DEFAULT_HEIGHT: u32 = 972;

/// Trait for camera operations to enable testing
pub trait CameraDevice {
    /// Sets the capture resolution for subsequent captures.
    fn set_resolution(&mut self, width: u32, height: u32);

    /// EXIF tags written into the next capture.
    fn exif_tags_mut(&mut self) -> &mut BTreeMap<String, String>;

    /// Captures one still image to `path`.
    fn capture_to(&mut self, path: &Path) -> Result<()>;
}

#[cfg(test)]
pub mod mocks {
    use super::*;
    use crate::error::SamplerError;
    use std::sync::{Arc, Mutex};

    /// Mock camera for testing
    ///
    /// Writes `sizes[n]` bytes on the n-th capture (the last size repeats) and
    /// records the tags it saw. Captures listed in `fail_on` (1-based) return
    /// an error instead.
    #[derive(Clone)]
    pub struct MockCamera {
        pub sizes: Vec<usize>,
        pub tags: BTreeMap<String, String>,
        pub captured: Arc<Mutex<Vec<(std::path::PathBuf, BTreeMap<String, String>)>>>,
        pub fail_on: Vec<usize>,
        pub resolution: (u32, u32),
        calls: usize,
    }

    impl MockCamera {
        pub fn new(size: usize) -> Self {
            Self::with_sizes(&[size])
        }

        pub fn with_sizes(sizes: &[usize]) -> Self {
            Self {
                sizes: sizes.to_vec(),
                tags: BTreeMap::new(),
                captured: Arc::new(Mutex::new(Vec::new())),
                fail_on: Vec::new(),
                resolution: (0, 0),
                calls: 0,
            }
        }

        pub fn failing_on(mut self, calls: &[usize]) -> Self {
            self.fail_on = calls.to_vec();
            self
        }

        pub fn get_captured(&self) -> Vec<(std::path::PathBuf, BTreeMap<String, String>)> {
            self.captured.lock().unwrap().clone()
        }
    }

    impl CameraDevice for MockCamera {
        fn set_resolution(&mut self, width: u32, height: u32) {
            self.resolution = (width, height);
        }

        fn exif_tags_mut(&mut self) -> &mut BTreeMap<String, String> {
            &mut self.tags
        }

        fn capture_to(&mut self, path: &Path) -> Result<()> {
            self.calls += 1;
            if self.fail_on.contains(&self.calls) {
                return Err(SamplerError::Capture("Mock camera timeout".to_string()));
            }
            let size = self.sizes[(self.calls - 1).min(self.sizes.len() - 1)];
            std::fs::write(path, vec![0xAB; size])?;
            self.captured
                .lock()
                .unwrap()
                .push((path.to_path_buf(), self.tags.clone()));
            Ok(())
        }
    }
}
