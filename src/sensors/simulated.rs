//! Simulated sensor cluster.
//!
//! Produces smooth, deterministic readings around typical low-orbit cabin
//! values. Each `compass_raw` call advances the sample phase, so consecutive
//! iterations see a slowly rotating field.

use tracing::debug;

use super::{Orientation, SensorCluster, Vector3};
use crate::error::{Result, SamplerError};

/// Field magnitude of the simulated magnetometer, µT.
const FIELD_STRENGTH_UT: f64 = 35.0;

/// Phase advance per sample, radians.
const PHASE_STEP: f64 = 0.07;

/// Simulated cluster with an optional injected failure.
#[derive(Debug, Clone)]
pub struct SimulatedSensorCluster {
    phase: f64,
    rotation: u16,
    fail_reads: bool,
}

impl SimulatedSensorCluster {
    /// Creates a cluster whose readings start at `phase` radians.
    pub fn new(phase: f64) -> Self {
        Self {
            phase,
            rotation: 0,
            fail_reads: false,
        }
    }

    /// Makes every subsequent read fail until cleared.
    pub fn set_fail_reads(&mut self, fail: bool) {
        self.fail_reads = fail;
    }

    /// Current board rotation in degrees.
    pub fn rotation(&self) -> u16 {
        self.rotation
    }

    fn check(&self, what: &str) -> Result<()> {
        if self.fail_reads {
            return Err(SamplerError::Sensor(format!("{} read failed", what)));
        }
        Ok(())
    }
}

impl SensorCluster for SimulatedSensorCluster {
    fn set_rotation(&mut self, degrees: u16) -> Result<()> {
        if degrees % 90 != 0 || degrees >= 360 {
            return Err(SamplerError::Sensor(format!(
                "rotation must be 0, 90, 180 or 270, got {}",
                degrees
            )));
        }
        debug!("Simulated sensor cluster rotated to {} degrees", degrees);
        self.rotation = degrees;
        Ok(())
    }

    fn compass_raw(&mut self) -> Result<Vector3> {
        self.check("compass")?;
        self.phase += PHASE_STEP;
        let p = self.phase;
        Ok(Vector3::new(
            FIELD_STRENGTH_UT * p.cos(),
            FIELD_STRENGTH_UT * p.sin() * 0.8,
            -FIELD_STRENGTH_UT * (0.5 * p).sin(),
        ))
    }

    fn orientation(&mut self) -> Result<Orientation> {
        self.check("orientation")?;
        let p = self.phase;
        Ok(Orientation::new(
            (360.0 + 2.0 * p.sin()) % 360.0,
            (360.0 + 1.5 * p.cos()) % 360.0,
            (p.to_degrees() * 0.1).rem_euclid(360.0),
        ))
    }

    fn accelerometer_raw(&mut self) -> Result<Vector3> {
        self.check("accelerometer")?;
        let p = self.phase;
        Ok(Vector3::new(0.002 * p.sin(), 0.003 * p.cos(), 1.0 + 0.001 * p.sin()))
    }

    fn temperature(&mut self) -> Result<f64> {
        self.check("temperature")?;
        Ok(25.0 + 1.5 * (0.1 * self.phase).sin())
    }

    fn humidity(&mut self) -> Result<f64> {
        self.check("humidity")?;
        Ok(40.0 + 3.0 * (0.1 * self.phase).cos())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_readings_are_deterministic() {
        let mut a = SimulatedSensorCluster::new(0.0);
        let mut b = SimulatedSensorCluster::new(0.0);
        for _ in 0..5 {
            assert_eq!(a.compass_raw().unwrap(), b.compass_raw().unwrap());
            assert_eq!(a.orientation().unwrap(), b.orientation().unwrap());
        }
    }

    #[test]
    fn test_readings_are_plausible() {
        let mut cluster = SimulatedSensorCluster::new(1.0);
        let mag = cluster.compass_raw().unwrap();
        let magnitude = (mag.x * mag.x + mag.y * mag.y + mag.z * mag.z).sqrt();
        assert!(magnitude > 15.0 && magnitude < 65.0, "field {}", magnitude);

        let acc = cluster.accelerometer_raw().unwrap();
        assert!((acc.z - 1.0).abs() < 0.01);

        let o = cluster.orientation().unwrap();
        for angle in [o.pitch, o.roll, o.yaw] {
            assert!((0.0..360.0).contains(&angle));
        }

        let t = cluster.temperature().unwrap();
        assert!((20.0..30.0).contains(&t));
        let h = cluster.humidity().unwrap();
        assert!((30.0..50.0).contains(&h));
    }

    #[test]
    fn test_injected_failure() {
        let mut cluster = SimulatedSensorCluster::new(0.0);
        cluster.set_fail_reads(true);
        assert!(matches!(cluster.compass_raw(), Err(SamplerError::Sensor(_))));
        assert!(cluster.humidity().is_err());

        cluster.set_fail_reads(false);
        assert!(cluster.humidity().is_ok());
    }

    #[test]
    fn test_rotation() {
        let mut cluster = SimulatedSensorCluster::new(0.0);
        cluster.set_rotation(90).unwrap();
        assert_eq!(cluster.rotation(), 90);
        assert!(cluster.set_rotation(45).is_err());
        assert!(cluster.set_rotation(360).is_err());
        assert_eq!(cluster.rotation(), 90);
    }
}
