//! Still-command camera backend.
//!
//! Drives the Raspberry Pi camera stack through `rpicam-still` (or any
//! compatible command such as `libcamera-still`). GPS tags are passed as
//! `--exif KEY=VALUE` arguments, which the tool writes into the JPEG.
//!
//! A capture that outlives its deadline is killed and reported as a capture
//! failure, so a wedged camera stack cannot stall the acquisition loop.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use super::{CameraDevice, DEFAULT_HEIGHT, DEFAULT_WIDTH};
use crate::error::{Result, SamplerError};

/// Default capture command.
pub const DEFAULT_STILL_COMMAND: &str = "rpicam-still";

/// Time allowed on top of the preview time for the tool to finish.
pub const CAPTURE_GRACE: Duration = Duration::from_secs(10);

/// Interval between exit checks while waiting on the tool.
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Camera driven by an external still-capture command
#[derive(Debug, Clone)]
pub struct StillCommandCamera {
    command: String,
    width: u32,
    height: u32,
    timeout: Duration,
    deadline: Duration,
    exif_tags: BTreeMap<String, String>,
}

impl StillCommandCamera {
    /// Creates a camera that runs `command` once per capture.
    ///
    /// `timeout` is the preview time handed to the tool before it triggers the
    /// shutter. The tool is killed if it is still running [`CAPTURE_GRACE`]
    /// after that.
    pub fn new(command: impl Into<String>, timeout: Duration) -> Self {
        Self {
            command: command.into(),
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            timeout,
            deadline: timeout.saturating_add(CAPTURE_GRACE),
            exif_tags: BTreeMap::new(),
        }
    }

    /// Overrides how long one capture may run before the tool is killed.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Command line arguments for one capture.
    pub fn build_args(&self, path: &Path) -> Vec<String> {
        let mut args = vec![
            "-n".to_string(),
            "-t".to_string(),
            self.timeout.as_millis().to_string(),
            "--width".to_string(),
            self.width.to_string(),
            "--height".to_string(),
            self.height.to_string(),
        ];

        for (key, value) in &self.exif_tags {
            args.push("--exif".to_string());
            args.push(format!("{}={}", key, value));
        }

        args.push("-o".to_string());
        args.push(path.to_string_lossy().to_string());
        args
    }
}

impl CameraDevice for StillCommandCamera {
    fn set_resolution(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    fn exif_tags_mut(&mut self) -> &mut BTreeMap<String, String> {
        &mut self.exif_tags
    }

    fn capture_to(&mut self, path: &Path) -> Result<()> {
        let args = self.build_args(path);
        debug!("Running {} {}", self.command, args.join(" "));

        let mut child = Command::new(&self.command)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| SamplerError::Capture(format!("Failed to run {}: {}", self.command, e)))?;

        // Drained on its own thread so a chatty tool cannot block on a full pipe
        let stderr_reader = child.stderr.take().map(|mut stderr| {
            thread::spawn(move || {
                let mut text = String::new();
                let _ = stderr.read_to_string(&mut text);
                text
            })
        });

        let status = wait_with_deadline(&mut child, self.deadline);
        let stderr = stderr_reader
            .and_then(|reader| reader.join().ok())
            .unwrap_or_default();

        match status? {
            Some(status) if status.success() => Ok(()),
            Some(status) => Err(SamplerError::Capture(format!(
                "{} exited with {}: {}",
                self.command,
                status,
                stderr.trim()
            ))),
            None => Err(SamplerError::Capture(format!(
                "{} timed out after {} ms and was killed",
                self.command,
                self.deadline.as_millis()
            ))),
        }
    }
}

/// Waits for `child` to exit, killing it once `deadline` has passed.
///
/// Returns `None` when the child had to be killed.
fn wait_with_deadline(child: &mut Child, deadline: Duration) -> Result<Option<ExitStatus>> {
    let started = Instant::now();
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(Some(status)),
            Ok(None) if started.elapsed() >= deadline => {
                warn!("Capture command still running after {:?}, killing it", deadline);
                let _ = child.kill();
                let _ = child.wait();
                return Ok(None);
            }
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(SamplerError::Capture(format!(
                    "Failed to wait for capture command: {}",
                    e
                )));
            }
        }
    }
}
