//! Linux IIO sensor cluster.
//!
//! Reads the Sense HAT chips through the kernel's Industrial I/O drivers
//! under `/sys/bus/iio/devices`:
//!
//! | Reading       | IIO channel         | Kernel unit       | Reported as |
//! |---------------|---------------------|-------------------|-------------|
//! | Magnetometer  | `magn_{x,y,z}`      | gauss             | µT          |
//! | Accelerometer | `accel_{x,y,z}`     | m/s²              | g           |
//! | Temperature   | `temp`              | milli °C          | °C          |
//! | Humidity      | `humidityrelative`  | milli percent     | %           |
//!
//! Every channel value is `(raw + offset) * scale`, read from the
//! `in_<channel>_raw`, `in_<channel>_offset` and `in_<channel>_scale` files.
//! Devices are found by the channels they expose, not by driver name.
//!
//! Orientation is derived from the accelerometer (pitch, roll) and the
//! tilt-compensated magnetometer (yaw), all in degrees within 0-360.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::{Orientation, SensorCluster, Vector3};
use crate::error::{Result, SamplerError};

/// Default sysfs directory holding the IIO devices.
pub const DEFAULT_IIO_ROOT: &str = "/sys/bus/iio/devices";

/// Standard gravity, m/s² per g.
const STANDARD_GRAVITY: f64 = 9.80665;

/// Microtesla per gauss.
const MICROTESLA_PER_GAUSS: f64 = 100.0;

/// One IIO device directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IioDevice {
    path: PathBuf,
}

impl IioDevice {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the device exposes `in_<channel>_raw`.
    pub fn has_channel(&self, channel: &str) -> bool {
        self.path.join(format!("in_{}_raw", channel)).is_file()
    }

    /// Reads one channel in the kernel's unit.
    ///
    /// The scale falls back from `in_<channel>_scale` to the shared
    /// `in_<type>_scale` (`magn_x` -> `magn`) and finally to 1. A missing
    /// offset is 0.
    pub fn read_channel(&self, channel: &str) -> Result<f64> {
        let raw = self.read_attribute(&format!("in_{}_raw", channel))?;
        let offset = self.read_optional(&format!("in_{}_offset", channel))?.unwrap_or(0.0);

        let scale = match self.read_optional(&format!("in_{}_scale", channel))? {
            Some(scale) => scale,
            None => {
                let channel_type = channel.split('_').next().unwrap_or(channel);
                self.read_optional(&format!("in_{}_scale", channel_type))?
                    .unwrap_or(1.0)
            }
        };

        Ok((raw + offset) * scale)
    }

    fn read_optional(&self, attribute: &str) -> Result<Option<f64>> {
        if self.path.join(attribute).is_file() {
            self.read_attribute(attribute).map(Some)
        } else {
            Ok(None)
        }
    }

    fn read_attribute(&self, attribute: &str) -> Result<f64> {
        let path = self.path.join(attribute);
        let text = fs::read_to_string(&path)
            .map_err(|e| SamplerError::Sensor(format!("Failed to read {}: {}", path.display(), e)))?;
        text.trim().parse::<f64>().map_err(|e| {
            SamplerError::Sensor(format!(
                "Unparsable value {:?} in {}: {}",
                text.trim(),
                path.display(),
                e
            ))
        })
    }
}

/// Sensor cluster backed by IIO sysfs channels
#[derive(Debug, Clone)]
pub struct IioSensorCluster {
    magnetometer: IioDevice,
    accelerometer: IioDevice,
    humidity: IioDevice,
    temperature: IioDevice,
    rotation: u16,
}

impl IioSensorCluster {
    /// Builds a cluster from explicit devices.
    pub fn new(
        magnetometer: IioDevice,
        accelerometer: IioDevice,
        humidity: IioDevice,
        temperature: IioDevice,
    ) -> Self {
        Self {
            magnetometer,
            accelerometer,
            humidity,
            temperature,
            rotation: 0,
        }
    }

    /// Scans `root` for devices exposing the required channels.
    ///
    /// Temperature is taken from the humidity chip when it has a `temp`
    /// channel, otherwise from the first device that does.
    ///
    /// # Errors
    ///
    /// Returns error if `root` cannot be listed or a required channel is not
    /// exposed by any device.
    pub fn discover(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        let entries = fs::read_dir(root).map_err(|e| {
            SamplerError::Sensor(format!("Failed to list IIO devices in {}: {}", root.display(), e))
        })?;

        let mut devices: Vec<IioDevice> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_dir())
            .map(IioDevice::new)
            .collect();
        devices.sort_by(|a, b| a.path.cmp(&b.path));

        let find = |channel: &str| -> Result<IioDevice> {
            devices
                .iter()
                .find(|device| device.has_channel(channel))
                .cloned()
                .ok_or_else(|| {
                    SamplerError::Sensor(format!(
                        "No IIO device in {} exposes in_{}_raw",
                        root.display(),
                        channel
                    ))
                })
        };

        let magnetometer = find("magn_x")?;
        let accelerometer = find("accel_x")?;
        let humidity = find("humidityrelative")?;
        let temperature = if humidity.has_channel("temp") {
            humidity.clone()
        } else {
            find("temp")?
        };

        info!(
            "IIO sensors: magnetometer {}, accelerometer {}, humidity {}, temperature {}",
            magnetometer.path.display(),
            accelerometer.path.display(),
            humidity.path.display(),
            temperature.path.display()
        );

        Ok(Self::new(magnetometer, accelerometer, humidity, temperature))
    }

    /// Current board rotation in degrees.
    pub fn rotation(&self) -> u16 {
        self.rotation
    }

    fn read_vector(device: &IioDevice, channel_type: &str) -> Result<Vector3> {
        Ok(Vector3::new(
            device.read_channel(&format!("{}_x", channel_type))?,
            device.read_channel(&format!("{}_y", channel_type))?,
            device.read_channel(&format!("{}_z", channel_type))?,
        ))
    }
}

/// Attitude from a gravity vector and a magnetic field vector.
///
/// ```text
/// roll  = atan2(ay, az)
/// pitch = atan2(-ax, √(ay² + az²))
/// yaw   = atan2(-my', mx')        (field rotated into the horizontal plane)
/// ```
pub fn tilt_compensated_orientation(acceleration: Vector3, magnetic: Vector3) -> Orientation {
    let roll = acceleration.y.atan2(acceleration.z);
    let pitch = (-acceleration.x).atan2(acceleration.y.hypot(acceleration.z));

    let mx = magnetic.x * pitch.cos() + magnetic.z * pitch.sin();
    let my = magnetic.x * roll.sin() * pitch.sin() + magnetic.y * roll.cos()
        - magnetic.z * roll.sin() * pitch.cos();
    let yaw = (-my).atan2(mx);

    Orientation::new(pitch, roll, yaw).map(|a| a.to_degrees().rem_euclid(360.0))
}

impl SensorCluster for IioSensorCluster {
    /// Rotation only concerns the HAT's LED matrix; channel axes are left as
    /// the kernel reports them.
    fn set_rotation(&mut self, degrees: u16) -> Result<()> {
        if degrees % 90 != 0 || degrees >= 360 {
            return Err(SamplerError::Sensor(format!(
                "rotation must be 0, 90, 180 or 270, got {}",
                degrees
            )));
        }
        debug!("IIO sensor cluster rotation set to {} degrees", degrees);
        self.rotation = degrees;
        Ok(())
    }

    fn compass_raw(&mut self) -> Result<Vector3> {
        Ok(Self::read_vector(&self.magnetometer, "magn")?.map(|g| g * MICROTESLA_PER_GAUSS))
    }

    fn orientation(&mut self) -> Result<Orientation> {
        let acceleration = self.accelerometer_raw()?;
        let magnetic = self.compass_raw()?;
        Ok(tilt_compensated_orientation(acceleration, magnetic))
    }

    fn accelerometer_raw(&mut self) -> Result<Vector3> {
        Ok(Self::read_vector(&self.accelerometer, "accel")?.map(|a| a / STANDARD_GRAVITY))
    }

    fn temperature(&mut self) -> Result<f64> {
        Ok(self.temperature.read_channel("temp")? / 1000.0)
    }

    fn humidity(&mut self) -> Result<f64> {
        Ok(self.humidity.read_channel("humidityrelative")? / 1000.0)
    }
}
