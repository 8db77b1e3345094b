//! Simulated camera backend.
//!
//! Writes a JPEG-framed placeholder for bench runs without camera hardware:
//!
//! ```text
//! FF D8                      SOI
//! FF FE len "KEY=VALUE\n"..  COM segment with the geotags
//! filler                     deterministic bytes up to the target size
//! FF D9                      EOI
//! ```

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use super::{CameraDevice, DEFAULT_HEIGHT, DEFAULT_WIDTH};
use crate::error::{Result, SamplerError};

/// JPEG start-of-image marker
const JPEG_SOI: [u8; 2] = [0xFF, 0xD8];
/// JPEG comment marker
const JPEG_COM: [u8; 2] = [0xFF, 0xFE];
/// JPEG end-of-image marker
const JPEG_EOI: [u8; 2] = [0xFF, 0xD9];

/// Largest COM payload (segment length is a u16 including itself).
const MAX_COMMENT_LEN: usize = u16::MAX as usize - 2;

/// Camera that writes placeholder files of a fixed size
#[derive(Debug, Clone)]
pub struct SimulatedCamera {
    target_size: usize,
    width: u32,
    height: u32,
    exif_tags: BTreeMap<String, String>,
}

impl SimulatedCamera {
    /// Creates a camera whose files are about `target_size` bytes.
    ///
    /// Files never shrink below the framing and tag comment.
    pub fn new(target_size: usize) -> Self {
        Self {
            target_size,
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            exif_tags: BTreeMap::new(),
        }
    }

    /// Builds the file contents for the current tags.
    pub fn render(&self) -> Result<Vec<u8>> {
        let mut comment = format!("resolution={}x{}\n", self.width, self.height);
        for (key, value) in &self.exif_tags {
            comment.push_str(&format!("{}={}\n", key, value));
        }
        if comment.len() > MAX_COMMENT_LEN {
            return Err(SamplerError::Capture(format!(
                "geotag comment too long ({} bytes)",
                comment.len()
            )));
        }

        let mut image = Vec::with_capacity(self.target_size.max(64));
        image.extend_from_slice(&JPEG_SOI);
        image.extend_from_slice(&JPEG_COM);
        image.extend_from_slice(&((comment.len() + 2) as u16).to_be_bytes());
        image.extend_from_slice(comment.as_bytes());

        let framed = image.len() + JPEG_EOI.len();
        let filler = self.target_size.saturating_sub(framed);
        // Never emit 0xFF in filler so no marker is spoofed
        image.extend((0..filler).map(|i| (i % 0xFF) as u8));
        image.extend_from_slice(&JPEG_EOI);

        Ok(image)
    }
}

impl CameraDevice for SimulatedCamera {
    fn set_resolution(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    fn exif_tags_mut(&mut self) -> &mut BTreeMap<String, String> {
        &mut self.exif_tags
    }

    fn capture_to(&mut self, path: &Path) -> Result<()> {
        let image = self.render()?;
        let mut file = File::create(path)
            .map_err(|e| SamplerError::Capture(format!("Failed to create {}: {}", path.display(), e)))?;
        file.write_all(&image)
            .and_then(|_| file.sync_all())
            .map_err(|e| SamplerError::Capture(format!("Failed to write {}: {}", path.display(), e)))?;
        Ok(())
    }
}
