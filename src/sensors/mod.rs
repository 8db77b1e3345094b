//! # Sensors Module
//!
//! Sensor cluster abstraction for the magnetometer, orientation, accelerometer
//! and environment readings.
//!
//! This module handles:
//! - The [`SensorCluster`] trait the acquisition loop samples from
//! - Raw reading types ([`Vector3`], [`Orientation`])
//! - An IIO sysfs cluster for the Sense HAT chips
//! - A simulated cluster for bench runs and tests

pub mod iio;
pub mod simulated;

use crate::error::Result;

/// Rotation applied to the cluster at setup (board mounted sideways).
pub const DEFAULT_ROTATION_DEG: u16 = 90;

/// A raw three-axis reading (magnetometer in µT, accelerometer in g).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Applies `f` to each axis.
    pub fn map(self, f: impl Fn(f64) -> f64) -> Self {
        Self::new(f(self.x), f(self.y), f(self.z))
    }
}

/// Attitude in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Orientation {
    pub pitch: f64,
    pub roll: f64,
    pub yaw: f64,
}

impl Orientation {
    pub fn new(pitch: f64, roll: f64, yaw: f64) -> Self {
        Self { pitch, roll, yaw }
    }

    /// Applies `f` to each angle.
    pub fn map(self, f: impl Fn(f64) -> f64) -> Self {
        Self::new(f(self.pitch), f(self.roll), f(self.yaw))
    }
}

/// Trait for sensor cluster operations to enable testing
///
/// Every read may fail; the acquisition loop treats a failed read as a failed
/// iteration.
#[cfg_attr(test, mockall::automock)]
pub trait SensorCluster {
    /// Sets the board rotation and clears any display state.
    fn set_rotation(&mut self, degrees: u16) -> Result<()>;

    /// Raw magnetometer vector in µT.
    fn compass_raw(&mut self) -> Result<Vector3>;

    /// Fused orientation in degrees.
    fn orientation(&mut self) -> Result<Orientation>;

    /// Raw accelerometer vector in g.
    fn accelerometer_raw(&mut self) -> Result<Vector3>;

    /// Temperature in °C.
    fn temperature(&mut self) -> Result<f64>;

    /// Relative humidity in %.
    fn humidity(&mut self) -> Result<f64>;
}
