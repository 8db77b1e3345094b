//! # Configuration Module
//!
//! Handles loading and validating mission configuration from TOML files.
//!
//! Every field has a default, so an empty file (or no file at all) yields the
//! standard three-hour mission.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Result, SamplerError};

/// Longest accepted mission, one week.
pub const MAX_RUN_MINUTES: u64 = 10_080;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub mission: MissionConfig,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub sensors: SensorConfig,
    #[serde(default)]
    pub orbit: OrbitConfig,
}

/// Mission timing and storage configuration
#[derive(Debug, Deserialize, Clone)]
pub struct MissionConfig {
    #[serde(default = "default_run_minutes")]
    pub run_minutes: u64,

    #[serde(default = "default_sampling_interval_secs")]
    pub sampling_interval_secs: u64,

    #[serde(default = "default_max_photos_bytes")]
    pub max_photos_bytes: u64,

    /// Empty means the directory of the running executable.
    #[serde(default)]
    pub output_dir: String,

    #[serde(default = "default_data_file")]
    pub data_file: String,

    #[serde(default = "default_event_log")]
    pub event_log: String,
}

/// Camera configuration
#[derive(Debug, Deserialize, Clone)]
pub struct CameraConfig {
    #[serde(default = "default_camera_backend")]
    pub backend: String,

    #[serde(default = "default_width")]
    pub width: u32,

    #[serde(default = "default_height")]
    pub height: u32,

    #[serde(default = "default_still_command")]
    pub command: String,

    #[serde(default = "default_camera_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default = "default_simulated_size_bytes")]
    pub simulated_size_bytes: usize,
}

/// Sensor cluster configuration
#[derive(Debug, Deserialize, Clone)]
pub struct SensorConfig {
    #[serde(default = "default_sensor_backend")]
    pub backend: String,

    /// Sysfs directory scanned by the `iio` backend.
    #[serde(default = "default_iio_root")]
    pub iio_root: String,

    #[serde(default = "default_rotation_deg")]
    pub rotation_deg: u16,

    #[serde(default)]
    pub phase: f64,
}

/// Position model configuration
#[derive(Debug, Deserialize, Clone)]
pub struct OrbitConfig {
    #[serde(default = "default_orbit_model")]
    pub model: String,

    /// Element set file for the `tle` model, relative to the executable
    /// directory unless absolute.
    #[serde(default = "default_tle_file")]
    pub tle_file: String,

    #[serde(default = "default_inclination_deg")]
    pub inclination_deg: f64,

    #[serde(default = "default_period_minutes")]
    pub period_minutes: f64,

    #[serde(default)]
    pub ascending_node_lon_deg: f64,
}

// Default value functions
fn default_run_minutes() -> u64 { 175 }
fn default_sampling_interval_secs() -> u64 { 10 }
fn default_max_photos_bytes() -> u64 { crate::budget::DEFAULT_MAX_PHOTOS_BYTES }
fn default_data_file() -> String { "data.csv".to_string() }
fn default_event_log() -> String { "events.log".to_string() }

fn default_camera_backend() -> String { "still".to_string() }
fn default_width() -> u32 { crate::camera::DEFAULT_WIDTH }
fn default_height() -> u32 { crate::camera::DEFAULT_HEIGHT }
fn default_still_command() -> String { crate::camera::still::DEFAULT_STILL_COMMAND.to_string() }
fn default_camera_timeout_ms() -> u64 { 2000 }
fn default_simulated_size_bytes() -> usize { 1_500_000 }

fn default_sensor_backend() -> String { "iio".to_string() }
fn default_iio_root() -> String { crate::sensors::iio::DEFAULT_IIO_ROOT.to_string() }
fn default_rotation_deg() -> u16 { crate::sensors::DEFAULT_ROTATION_DEG }

fn default_orbit_model() -> String { "tle".to_string() }
fn default_tle_file() -> String { "iss.tle".to_string() }
fn default_inclination_deg() -> f64 { 51.64 }
fn default_period_minutes() -> f64 { 92.9 }

impl Default for MissionConfig {
    fn default() -> Self {
        Self {
            run_minutes: default_run_minutes(),
            sampling_interval_secs: default_sampling_interval_secs(),
            max_photos_bytes: default_max_photos_bytes(),
            output_dir: String::new(),
            data_file: default_data_file(),
            event_log: default_event_log(),
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            backend: default_camera_backend(),
            width: default_width(),
            height: default_height(),
            command: default_still_command(),
            timeout_ms: default_camera_timeout_ms(),
            simulated_size_bytes: default_simulated_size_bytes(),
        }
    }
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            backend: default_sensor_backend(),
            iio_root: default_iio_root(),
            rotation_deg: default_rotation_deg(),
            phase: 0.0,
        }
    }
}

impl Default for OrbitConfig {
    fn default() -> Self {
        Self {
            model: default_orbit_model(),
            tle_file: default_tle_file(),
            inclination_deg: default_inclination_deg(),
            period_minutes: default_period_minutes(),
            ascending_node_lon_deg: 0.0,
        }
    }
}

fn invalid(msg: impl std::fmt::Display) -> SamplerError {
    SamplerError::Config(toml::de::Error::custom(msg))
}

impl MissionConfig {
    /// Time ceiling of the acquisition loop.
    ///
    /// Saturates instead of overflowing for values `validate()` would reject.
    pub fn run_duration(&self) -> Duration {
        self.run_minutes
            .checked_mul(60)
            .map(Duration::from_secs)
            .unwrap_or(Duration::MAX)
    }

    /// Sleep between iterations.
    pub fn sampling_interval(&self) -> Duration {
        Duration::from_secs(self.sampling_interval_secs)
    }

    /// Output directory, resolved against `base` when not configured.
    pub fn resolve_output_dir(&self, base: &Path) -> PathBuf {
        if self.output_dir.is_empty() {
            base.to_path_buf()
        } else {
            base.join(&self.output_dir)
        }
    }
}

impl OrbitConfig {
    /// Element set path, resolved against `base` when relative.
    pub fn resolve_tle_file(&self, base: &Path) -> PathBuf {
        base.join(&self.tle_file)
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use orbit_sampler::config::Config;
    ///
    /// let config = Config::load("orbit-sampler.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        if self.mission.run_minutes == 0 || self.mission.run_minutes > MAX_RUN_MINUTES {
            return Err(invalid(format!(
                "run_minutes must be between 1 and {}",
                MAX_RUN_MINUTES
            )));
        }

        if self.mission.sampling_interval_secs == 0 || self.mission.sampling_interval_secs > 3600 {
            return Err(invalid("sampling_interval_secs must be between 1 and 3600"));
        }

        if self.mission.max_photos_bytes == 0 {
            return Err(invalid("max_photos_bytes must be greater than 0"));
        }

        for (name, value) in [
            ("data_file", &self.mission.data_file),
            ("event_log", &self.mission.event_log),
        ] {
            if value.is_empty() {
                return Err(invalid(format!("{} cannot be empty", name)));
            }
        }

        if !["still", "simulated"].contains(&self.camera.backend.as_str()) {
            return Err(invalid("camera backend must be 'still' or 'simulated'"));
        }

        if self.camera.backend == "still" && self.camera.command.is_empty() {
            return Err(invalid("camera command cannot be empty for the still backend"));
        }

        if self.camera.width == 0 || self.camera.height == 0 {
            return Err(invalid("camera width and height must be greater than 0"));
        }

        if self.camera.timeout_ms > 60000 {
            return Err(invalid("camera timeout_ms must be at most 60000"));
        }

        if !["iio", "simulated"].contains(&self.sensors.backend.as_str()) {
            return Err(invalid("sensor backend must be 'iio' or 'simulated'"));
        }

        if self.sensors.backend == "iio" && self.sensors.iio_root.is_empty() {
            return Err(invalid("iio_root cannot be empty for the iio backend"));
        }

        if self.sensors.rotation_deg % 90 != 0 || self.sensors.rotation_deg >= 360 {
            return Err(invalid("rotation_deg must be one of: 0, 90, 180, 270"));
        }

        if !["tle", "circular"].contains(&self.orbit.model.as_str()) {
            return Err(invalid("orbit model must be 'tle' or 'circular'"));
        }

        if self.orbit.model == "tle" && self.orbit.tle_file.is_empty() {
            return Err(invalid("tle_file cannot be empty for the tle model"));
        }

        if !(0.0..=180.0).contains(&self.orbit.inclination_deg) {
            return Err(invalid("inclination_deg must be between 0 and 180"));
        }

        if !(self.orbit.period_minutes > 0.0) {
            return Err(invalid("period_minutes must be greater than 0"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.mission.run_duration(), Duration::from_secs(175 * 60));
        assert_eq!(config.mission.sampling_interval(), Duration::from_secs(10));
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.mission.run_minutes, 175);
        assert_eq!(config.mission.max_photos_bytes, 2_684_354_560);
        assert_eq!(config.camera.width, 1296);
        assert_eq!(config.camera.height, 972);
        assert_eq!(config.sensors.rotation_deg, 90);
    }

    #[test]
    fn test_load_config_from_file() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let toml_content = r#"
[mission]
run_minutes = 30
sampling_interval_secs = 5
output_dir = "run1"

[camera]
backend = "simulated"
simulated_size_bytes = 4096

[orbit]
inclination_deg = 97.4
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = Config::load(temp_file.path()).unwrap();
        assert_eq!(config.mission.run_minutes, 30);
        assert_eq!(config.mission.sampling_interval_secs, 5);
        assert_eq!(config.camera.backend, "simulated");
        assert_eq!(config.camera.simulated_size_bytes, 4096);
        assert_eq!(config.orbit.inclination_deg, 97.4);
        assert_eq!(config.orbit.period_minutes, 92.9);
    }

    #[test]
    fn test_sample_config_file_matches_defaults() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config/orbit-sampler.toml");
        let config = Config::load(path).unwrap();
        let defaults = Config::default();
        assert_eq!(config.mission.run_minutes, defaults.mission.run_minutes);
        assert_eq!(config.mission.max_photos_bytes, defaults.mission.max_photos_bytes);
        assert_eq!(config.camera.command, defaults.camera.command);
        assert_eq!(config.sensors.backend, defaults.sensors.backend);
        assert_eq!(config.sensors.iio_root, defaults.sensors.iio_root);
        assert_eq!(config.sensors.rotation_deg, defaults.sensors.rotation_deg);
        assert_eq!(config.orbit.model, defaults.orbit.model);
        assert_eq!(config.orbit.tle_file, defaults.orbit.tle_file);
        assert_eq!(config.orbit.period_minutes, defaults.orbit.period_minutes);
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load("/nonexistent/orbit-sampler.toml").unwrap_err();
        assert_eq!(err.kind(), "IoError");
    }

    #[test]
    fn test_malformed_toml() {
        let err = Config::from_toml("[mission\nrun_minutes = ").unwrap_err();
        assert_eq!(err.kind(), "ConfigError");
    }

    #[test]
    fn test_resolve_output_dir() {
        let mut mission = MissionConfig::default();
        let base = Path::new("/opt/sampler");
        assert_eq!(mission.resolve_output_dir(base), PathBuf::from("/opt/sampler"));

        mission.output_dir = "data".to_string();
        assert_eq!(mission.resolve_output_dir(base), PathBuf::from("/opt/sampler/data"));

        mission.output_dir = "/mnt/sd".to_string();
        assert_eq!(mission.resolve_output_dir(base), PathBuf::from("/mnt/sd"));
    }

    #[test]
    fn test_run_minutes_zero() {
        let mut config = Config::default();
        config.mission.run_minutes = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_run_minutes_upper_bound() {
        let mut config = Config::default();
        config.mission.run_minutes = MAX_RUN_MINUTES;
        assert!(config.validate().is_ok());

        config.mission.run_minutes = MAX_RUN_MINUTES + 1;
        assert!(config.validate().is_err());

        let err = Config::from_toml("[mission]\nrun_minutes = 300000000000000000").unwrap_err();
        assert_eq!(err.kind(), "ConfigError");
        let err = Config::from_toml("[mission]\nrun_minutes = 9223372036854775807").unwrap_err();
        assert_eq!(err.kind(), "ConfigError");
    }

    #[test]
    fn test_run_duration_saturates() {
        let mission = MissionConfig {
            run_minutes: u64::MAX,
            ..MissionConfig::default()
        };
        assert_eq!(mission.run_duration(), Duration::MAX);
    }

    #[test]
    fn test_sampling_interval_zero() {
        let mut config = Config::default();
        config.mission.sampling_interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_sampling_interval_too_high() {
        let mut config = Config::default();
        config.mission.sampling_interval_secs = 3601;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_max_photos_bytes_zero() {
        let mut config = Config::default();
        config.mission.max_photos_bytes = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_file_names() {
        let mut config = Config::default();
        config.mission.data_file = String::new();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.mission.event_log = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_camera_backend() {
        let mut config = Config::default();
        config.camera.backend = "webcam".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_still_command() {
        let mut config = Config::default();
        config.camera.command = String::new();
        assert!(config.validate().is_err());

        // Irrelevant for the simulated backend
        config.camera.backend = "simulated".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_resolution() {
        let mut config = Config::default();
        config.camera.width = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_sensor_backend() {
        let mut config = Config::default();
        config.sensors.backend = "sense-hat".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_sensor_backends() {
        let config = Config::from_toml("[sensors]\nbackend = \"simulated\"\nphase = 1.5\n").unwrap();
        assert_eq!(config.sensors.backend, "simulated");
        assert_eq!(config.sensors.phase, 1.5);

        let config = Config::from_toml("[sensors]\niio_root = \"/tmp/iio\"\n").unwrap();
        assert_eq!(config.sensors.backend, "iio");
        assert_eq!(config.sensors.iio_root, "/tmp/iio");
    }

    #[test]
    fn test_empty_iio_root() {
        let mut config = Config::default();
        config.sensors.iio_root = String::new();
        assert!(config.validate().is_err());

        // Irrelevant for the simulated backend
        config.sensors.backend = "simulated".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_orbit_models() {
        let mut config = Config::default();
        config.orbit.model = "circular".to_string();
        assert!(config.validate().is_ok());

        config.orbit.model = "keplerian".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_tle_file() {
        let mut config = Config::default();
        config.orbit.tle_file = String::new();
        assert!(config.validate().is_err());

        config.orbit.model = "circular".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_resolve_tle_file() {
        let mut orbit = OrbitConfig::default();
        let base = Path::new("/opt/sampler");
        assert_eq!(orbit.resolve_tle_file(base), PathBuf::from("/opt/sampler/iss.tle"));

        orbit.tle_file = "/etc/orbit/iss.tle".to_string();
        assert_eq!(orbit.resolve_tle_file(base), PathBuf::from("/etc/orbit/iss.tle"));
    }

    #[test]
    fn test_invalid_rotation() {
        let mut config = Config::default();
        config.sensors.rotation_deg = 45;
        assert!(config.validate().is_err());
        config.sensors.rotation_deg = 360;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_valid_rotations() {
        for &rotation in &[0, 90, 180, 270] {
            let mut config = Config::default();
            config.sensors.rotation_deg = rotation;
            assert!(config.validate().is_ok(), "Rotation {} should be valid", rotation);
        }
    }

    #[test]
    fn test_invalid_orbit() {
        let mut config = Config::default();
        config.orbit.inclination_deg = 181.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.orbit.period_minutes = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_functions() {
        assert_eq!(default_run_minutes(), 175);
        assert_eq!(default_sampling_interval_secs(), 10);
        assert_eq!(default_max_photos_bytes(), 2_684_354_560);
        assert_eq!(default_data_file(), "data.csv");
        assert_eq!(default_event_log(), "events.log");
        assert_eq!(default_camera_backend(), "still");
        assert_eq!(default_width(), 1296);
        assert_eq!(default_height(), 972);
        assert_eq!(default_still_command(), "rpicam-still");
        assert_eq!(default_camera_timeout_ms(), 2000);
        assert_eq!(default_simulated_size_bytes(), 1_500_000);
        assert_eq!(default_sensor_backend(), "iio");
        assert_eq!(default_iio_root(), "/sys/bus/iio/devices");
        assert_eq!(default_orbit_model(), "tle");
        assert_eq!(default_tle_file(), "iss.tle");
        assert_eq!(default_rotation_deg(), 90);
        assert_eq!(default_inclination_deg(), 51.64);
        assert_eq!(default_period_minutes(), 92.9);
    }
}
