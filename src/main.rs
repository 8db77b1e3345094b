//! # Orbit Sampler
//!
//! Samples the Earth's magnetic field along the ground track for a fixed
//! mission window, with a geotagged photo per sample while storage allows.
//!
//! # Control Flow
//!
//! 1. **Setup** (unguarded; any failure aborts the run)
//!    - Resolve the output directory next to the executable
//!    - Load `orbit-sampler.toml` if present, otherwise use defaults
//!    - Start the event log
//!    - Open the sensor cluster and rotate it, set the camera resolution
//!    - Load the orbital element set
//!    - Create `data.csv` with its header
//!
//! 2. **Acquisition loop** (every iteration guarded)
//!    - Runs until the mission time ceiling
//!
//! 3. **Summary**
//!    - Logs totals and exits
//!
//! # Examples
//!
//! ```bash
//! cargo run --release
//! ```
//!
//! Expected output:
//! ```text
//! INFO orbit_sampler: Orbit Sampler v0.1.0 starting...
//! INFO orbit_sampler::acquisition: Mission started: 10500s run, 10s interval, 2684354560 byte photo budget
//! INFO orbit_sampler::acquisition: iteration 1 photo size 1500000
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{info, warn};

use orbit_sampler::acquisition::{AcquisitionLoop, MissionSettings};
use orbit_sampler::budget::StorageBudget;
use orbit_sampler::camera::simulated::SimulatedCamera;
use orbit_sampler::camera::still::StillCommandCamera;
use orbit_sampler::camera::CameraDevice;
use orbit_sampler::config::{CameraConfig, Config, OrbitConfig, SensorConfig};
use orbit_sampler::orbit::circular::CircularOrbit;
use orbit_sampler::orbit::tle::TlePropagator;
use orbit_sampler::orbit::PositionProvider;
use orbit_sampler::record::{CsvRecordSink, RecordSink, CSV_HEADER};
use orbit_sampler::sensors::iio::IioSensorCluster;
use orbit_sampler::sensors::simulated::SimulatedSensorCluster;
use orbit_sampler::sensors::SensorCluster;

/// Configuration file looked up next to the executable
const CONFIG_FILE_NAME: &str = "orbit-sampler.toml";

/// Element sets older than this are reported at startup
const STALE_ELEMENTS_DAYS: i64 = 14;

/// Directory holding the running executable.
fn base_folder() -> Result<PathBuf> {
    let exe = std::env::current_exe().context("Failed to locate the running executable")?;
    let exe = exe.canonicalize().unwrap_or(exe);
    Ok(exe
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(".")))
}

/// Loads the config file in `base` if there is one.
fn load_config(base: &Path) -> Result<Config> {
    let path = base.join(CONFIG_FILE_NAME);
    if path.exists() {
        Config::load(&path).with_context(|| format!("Failed to load {}", path.display()))
    } else {
        Ok(Config::default())
    }
}

/// Builds the configured camera backend.
fn build_camera(config: &CameraConfig) -> Box<dyn CameraDevice> {
    let mut camera: Box<dyn CameraDevice> = match config.backend.as_str() {
        "simulated" => Box::new(SimulatedCamera::new(config.simulated_size_bytes)),
        _ => Box::new(StillCommandCamera::new(
            config.command.clone(),
            Duration::from_millis(config.timeout_ms),
        )),
    };
    camera.set_resolution(config.width, config.height);
    camera
}

/// Opens the configured sensor backend and applies the board rotation.
fn build_sensors(config: &SensorConfig) -> Result<Box<dyn SensorCluster>> {
    let mut sensors: Box<dyn SensorCluster> = match config.backend.as_str() {
        "simulated" => {
            warn!("Using simulated sensor readings");
            Box::new(SimulatedSensorCluster::new(config.phase))
        }
        _ => Box::new(
            IioSensorCluster::discover(&config.iio_root)
                .context("Failed to open the IIO sensor cluster")?,
        ),
    };
    sensors.set_rotation(config.rotation_deg)?;
    Ok(sensors)
}

/// Builds the configured position model.
fn build_position(config: &OrbitConfig, base: &Path) -> Result<Box<dyn PositionProvider>> {
    match config.model.as_str() {
        "circular" => {
            warn!("Using a circular ground track starting at the ascending node");
            Ok(Box::new(CircularOrbit::new(
                config.inclination_deg,
                config.period_minutes,
                config.ascending_node_lon_deg,
                Utc::now(),
            )?))
        }
        _ => {
            let path = config.resolve_tle_file(base);
            let propagator = TlePropagator::load(&path)
                .with_context(|| format!("Failed to load element set {}", path.display()))?;

            let age = Utc::now().naive_utc().signed_duration_since(propagator.epoch());
            if age > chrono::Duration::days(STALE_ELEMENTS_DAYS) {
                warn!(
                    "Element set epoch {} is {} days old, positions will drift",
                    propagator.epoch(),
                    age.num_days()
                );
            }
            Ok(Box::new(propagator))
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let base = base_folder()?;
    let config = load_config(&base)?;

    let output_dir = config.mission.resolve_output_dir(&base);
    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;

    let _log_guard = orbit_sampler::logging::init(&output_dir, &config.mission.event_log)?;
    info!("Orbit Sampler v{} starting...", env!("CARGO_PKG_VERSION"));
    info!("Writing data, photos and events to {}", output_dir.display());

    let sensors = build_sensors(&config.sensors)?;
    info!("Sensor backend '{}'", config.sensors.backend);

    let camera = build_camera(&config.camera);
    info!(
        "Camera backend '{}' at {}x{}",
        config.camera.backend, config.camera.width, config.camera.height
    );

    let position = build_position(&config.orbit, &base)?;
    info!("Position model '{}'", config.orbit.model);

    let mut sink = CsvRecordSink::new(output_dir.join(&config.mission.data_file));
    sink.initialize(&CSV_HEADER)?;

    let settings = MissionSettings {
        run_duration: config.mission.run_duration(),
        sampling_interval: config.mission.sampling_interval(),
        output_dir,
    };

    let mut mission = AcquisitionLoop::new(
        sensors,
        position,
        camera,
        Box::new(sink),
        StorageBudget::new(config.mission.max_photos_bytes),
        settings,
    );

    let summary = mission.run().await;
    info!(
        "Mission complete: {} iterations, {} rows, {} photos ({} bytes), {} failed iterations",
        summary.iterations,
        summary.rows_written,
        summary.photos,
        summary.bytes,
        summary.failures.len()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    #[test]
    fn test_config_file_name() {
        assert_eq!(CONFIG_FILE_NAME, "orbit-sampler.toml");
    }

    #[test]
    fn test_load_config_defaults_without_file() {
        let dir = tempdir().unwrap();
        let config = load_config(dir.path()).unwrap();
        assert_eq!(config.mission.run_minutes, 175);
        assert_eq!(config.mission.sampling_interval_secs, 10);
    }

    #[test]
    fn test_load_config_from_base_folder() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "[mission]\nrun_minutes = 5\n[camera]\nbackend = \"simulated\"\n",
        )
        .unwrap();

        let config = load_config(dir.path()).unwrap();
        assert_eq!(config.mission.run_minutes, 5);
        assert_eq!(config.camera.backend, "simulated");
    }

    #[test]
    fn test_invalid_config_file_aborts() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "[mission]\nrun_minutes = 0\n").unwrap();
        assert!(load_config(dir.path()).is_err());
    }

    #[test]
    fn test_build_simulated_camera() {
        let dir = tempdir().unwrap();
        let config = CameraConfig {
            backend: "simulated".to_string(),
            simulated_size_bytes: 512,
            ..CameraConfig::default()
        };

        let mut camera = build_camera(&config);
        let path = dir.path().join("photo_0001.jpg");
        camera.capture_to(&path).unwrap();
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 512);
    }

    #[test]
    fn test_build_simulated_sensors() {
        let config = SensorConfig {
            backend: "simulated".to_string(),
            ..SensorConfig::default()
        };
        let mut sensors = build_sensors(&config).unwrap();
        assert!(sensors.temperature().is_ok());
    }

    #[test]
    fn test_build_iio_sensors_without_devices_aborts() {
        let dir = tempdir().unwrap();
        let config = SensorConfig {
            iio_root: dir.path().to_string_lossy().to_string(),
            ..SensorConfig::default()
        };
        assert!(build_sensors(&config).is_err());
    }

    #[test]
    fn test_build_tle_position_from_base_folder() {
        let dir = tempdir().unwrap();
        std::fs::copy(
            concat!(env!("CARGO_MANIFEST_DIR"), "/config/iss.tle"),
            dir.path().join("iss.tle"),
        )
        .unwrap();

        let position = build_position(&OrbitConfig::default(), dir.path()).unwrap();
        let at = Utc.with_ymd_and_hms(2020, 7, 13, 0, 0, 0).unwrap();
        let p = position.coordinates(at).unwrap();
        assert!(p.latitude.abs() <= 52.0);
    }

    #[test]
    fn test_build_position_without_element_set_aborts() {
        let dir = tempdir().unwrap();
        assert!(build_position(&OrbitConfig::default(), dir.path()).is_err());
    }

    #[test]
    fn test_build_circular_position() {
        let config = OrbitConfig {
            model: "circular".to_string(),
            ..OrbitConfig::default()
        };
        let dir = tempdir().unwrap();
        let position = build_position(&config, dir.path()).unwrap();
        assert!(position.coordinates(Utc::now()).is_ok());
    }

    #[test]
    fn test_base_folder_is_a_directory() {
        let base = base_folder().unwrap();
        assert!(base.is_dir());
    }
}
