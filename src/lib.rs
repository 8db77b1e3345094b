//! # Orbit Sampler Library
//!
//! Fixed-duration telemetry acquisition for an orbital payload.
//!
//! This library samples a magnetometer/orientation/accelerometer/environment
//! sensor cluster, captures geotagged photos of the ground track under a
//! storage ceiling, and appends one CSV row per sample.

pub mod acquisition;
pub mod budget;
pub mod camera;
pub mod capture;
pub mod config;
pub mod error;
pub mod geotag;
pub mod logging;
pub mod orbit;
pub mod record;
pub mod sensors;
