//! # Record Module
//!
//! Sample rows and their append-only CSV persistence.
//!
//! This module handles:
//! - The immutable [`SampleRecord`] built once per iteration
//! - Storage rounding for sensor values
//! - The [`RecordSink`] trait and its CSV file implementation
//!
//! ## Row Format
//!
//! ```text
//! Counter,Date/time,Latitude,Longitude,Temperature,Humidity,MagX,MagY,MagZ,Pitch,Roll,Yaw,X_Acc,Y_Acc,Z_Acc
//! 1,2022-04-20 12:00:00.000000,51.5074,-0.1278,25.12,40.5,-12.34,20.1,-33.02,0.512,359.875,180.125,0.001,-0.002,1
//! ```

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use tracing::debug;

use crate::error::{Result, SamplerError};
use crate::orbit::GeoPosition;
use crate::sensors::{Orientation, Vector3};

/// Column schema, in row order.
pub const CSV_HEADER: [&str; 15] = [
    "Counter",
    "Date/time",
    "Latitude",
    "Longitude",
    "Temperature",
    "Humidity",
    "MagX",
    "MagY",
    "MagZ",
    "Pitch",
    "Roll",
    "Yaw",
    "X_Acc",
    "Y_Acc",
    "Z_Acc",
];

/// Timestamp format for the `Date/time` column.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Decimals kept for magnetometer, temperature and humidity.
pub const ENVIRONMENT_DECIMALS: i32 = 2;

/// Decimals kept for orientation and acceleration.
pub const MOTION_DECIMALS: i32 = 3;

/// Rounds to a fixed number of decimals, half away from zero.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

/// One row of mission data
///
/// Sensor values are stored already rounded; latitude and longitude keep
/// full precision.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleRecord {
    counter: u32,
    timestamp: NaiveDateTime,
    position: GeoPosition,
    temperature: f64,
    humidity: f64,
    magnetic: Vector3,
    orientation: Orientation,
    acceleration: Vector3,
}

impl SampleRecord {
    /// Builds a record from raw readings, applying storage rounding.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        counter: u32,
        timestamp: NaiveDateTime,
        position: GeoPosition,
        temperature: f64,
        humidity: f64,
        magnetic: Vector3,
        orientation: Orientation,
        acceleration: Vector3,
    ) -> Self {
        Self {
            counter,
            timestamp,
            position,
            temperature: round_to(temperature, ENVIRONMENT_DECIMALS),
            humidity: round_to(humidity, ENVIRONMENT_DECIMALS),
            magnetic: magnetic.map(|v| round_to(v, ENVIRONMENT_DECIMALS)),
            orientation: orientation.map(|v| round_to(v, MOTION_DECIMALS)),
            acceleration: acceleration.map(|v| round_to(v, MOTION_DECIMALS)),
        }
    }

    pub fn counter(&self) -> u32 {
        self.counter
    }

    pub fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }

    pub fn position(&self) -> GeoPosition {
        self.position
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn humidity(&self) -> f64 {
        self.humidity
    }

    pub fn magnetic(&self) -> Vector3 {
        self.magnetic
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn acceleration(&self) -> Vector3 {
        self.acceleration
    }

    /// Field values in [`CSV_HEADER`] order.
    pub fn fields(&self) -> Vec<String> {
        vec![
            self.counter.to_string(),
            self.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            self.position.latitude.to_string(),
            self.position.longitude.to_string(),
            self.temperature.to_string(),
            self.humidity.to_string(),
            self.magnetic.x.to_string(),
            self.magnetic.y.to_string(),
            self.magnetic.z.to_string(),
            self.orientation.pitch.to_string(),
            self.orientation.roll.to_string(),
            self.orientation.yaw.to_string(),
            self.acceleration.x.to_string(),
            self.acceleration.y.to_string(),
            self.acceleration.z.to_string(),
        ]
    }

    /// The record as one CSV line, without the terminator.
    pub fn to_csv_row(&self) -> String {
        self.fields().join(",")
    }
}

/// Trait for append-only row persistence to enable testing
pub trait RecordSink {
    /// Creates (or truncates) the destination and writes the header once.
    fn initialize(&mut self, schema: &[&'static str]) -> Result<()>;

    /// Appends one row; durable on return.
    fn append(&mut self, record: &SampleRecord) -> Result<()>;
}

/// CSV file sink
#[derive(Debug)]
pub struct CsvRecordSink {
    path: PathBuf,
    columns: Option<usize>,
}

impl CsvRecordSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            columns: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persistence_error(&self, action: &str, e: std::io::Error) -> SamplerError {
        SamplerError::Persistence(format!("Failed to {} {}: {}", action, self.path.display(), e))
    }
}

impl RecordSink for CsvRecordSink {
    fn initialize(&mut self, schema: &[&'static str]) -> Result<()> {
        let file = File::create(&self.path).map_err(|e| self.persistence_error("create", e))?;
        let mut writer = BufWriter::new(file);

        writeln!(writer, "{}", schema.join(","))
            .and_then(|_| writer.flush())
            .and_then(|_| writer.get_ref().sync_all())
            .map_err(|e| self.persistence_error("write header to", e))?;

        self.columns = Some(schema.len());
        debug!("Created {} with {} columns", self.path.display(), schema.len());
        Ok(())
    }

    fn append(&mut self, record: &SampleRecord) -> Result<()> {
        let columns = self.columns.ok_or_else(|| {
            SamplerError::Persistence(format!("{} has no header yet", self.path.display()))
        })?;

        let fields = record.fields();
        if fields.len() != columns {
            return Err(SamplerError::Persistence(format!(
                "row has {} fields, schema has {}",
                fields.len(),
                columns
            )));
        }

        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(|e| self.persistence_error("open", e))?;

        writeln!(file, "{}", fields.join(","))
            .and_then(|_| file.sync_data())
            .map_err(|e| self.persistence_error("append to", e))?;

        Ok(())
    }
}
