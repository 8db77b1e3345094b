//! # Acquisition Loop
//!
//! Top-level mission state machine.
//!
//! ## Control Flow
//!
//! While `now < start + run_duration` the loop runs one iteration:
//!
//! 1. Sample the sensor cluster and the sub-satellite position
//! 2. Build the [`SampleRecord`] for this counter
//! 3. Capture a geotagged photo if the storage budget still allows it
//! 4. Append the record to the sink
//! 5. Advance the counter, sleep one sampling interval, refresh `now`
//!
//! Steps 1-4 form the guarded part of an iteration. Any failure there abandons
//! the rest of that iteration and is logged; step 5 always runs, so a counter
//! value is never reused.
//!
//! A photo is captured before its row is written. A failed capture therefore
//! leaves neither a photo nor a row for that counter.

use std::path::PathBuf;
use std::time::Duration;

use chrono::{Local, Utc};
use tokio::time::{sleep, Instant};
use tracing::{error, info};

use crate::budget::StorageBudget;
use crate::camera::CameraDevice;
use crate::capture::{capture, photo_path};
use crate::error::{Result, SamplerError};
use crate::orbit::PositionProvider;
use crate::record::{RecordSink, SampleRecord};
use crate::sensors::SensorCluster;

/// Fixed parameters of one mission run.
#[derive(Debug, Clone)]
pub struct MissionSettings {
    /// Time ceiling of the run.
    pub run_duration: Duration,
    /// Sleep after every iteration.
    pub sampling_interval: Duration,
    /// Directory photos are written to.
    pub output_dir: PathBuf,
}

/// Loop phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopPhase {
    Running,
    Ended,
}

/// Timing and counter state of a run
#[derive(Debug, Clone)]
pub struct LoopState {
    started: Instant,
    now: Instant,
    counter: u32,
    run_ceiling: Duration,
}

impl LoopState {
    /// Starts the clock with the counter at 1.
    pub fn start(run_ceiling: Duration) -> Self {
        let now = Instant::now();
        Self {
            started: now,
            now,
            counter: 1,
            run_ceiling,
        }
    }

    pub fn phase(&self) -> LoopPhase {
        if self.elapsed() < self.run_ceiling {
            LoopPhase::Running
        } else {
            LoopPhase::Ended
        }
    }

    /// Counter of the next iteration.
    pub fn counter(&self) -> u32 {
        self.counter
    }

    pub fn elapsed(&self) -> Duration {
        self.now - self.started
    }

    fn advance(&mut self) {
        self.counter += 1;
    }

    fn refresh(&mut self) {
        self.now = Instant::now();
    }
}

/// What happened to the photo in a completed iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// Photo stored; `total` is the budget consumption after it.
    Captured { bytes: u64, total: u64 },
    /// Budget already spent, no photo taken.
    BudgetExhausted,
}

/// Result of one successful iteration.
#[derive(Debug, Clone, PartialEq)]
pub struct IterationReport {
    pub record: SampleRecord,
    pub capture: CaptureOutcome,
}

/// A failed iteration, as written to the event log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IterationFailure {
    pub counter: u32,
    pub kind: &'static str,
    pub message: String,
}

/// Totals of a finished run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MissionSummary {
    /// Iterations attempted.
    pub iterations: u32,
    /// Rows appended to the sink.
    pub rows_written: u32,
    /// Photos stored.
    pub photos: u32,
    /// Cumulative photo bytes.
    pub bytes: u64,
    pub failures: Vec<IterationFailure>,
    /// Counter value when the loop ended (next unused counter).
    pub final_counter: u32,
}

/// Mission controller owning every collaborator
pub struct AcquisitionLoop {
    sensors: Box<dyn SensorCluster>,
    position: Box<dyn PositionProvider>,
    camera: Box<dyn CameraDevice>,
    sink: Box<dyn RecordSink>,
    budget: StorageBudget,
    settings: MissionSettings,
}

impl AcquisitionLoop {
    /// Creates a loop over already-initialized collaborators.
    ///
    /// The sink must have written its header; device setup (rotation,
    /// resolution) is the caller's job.
    pub fn new(
        sensors: Box<dyn SensorCluster>,
        position: Box<dyn PositionProvider>,
        camera: Box<dyn CameraDevice>,
        sink: Box<dyn RecordSink>,
        budget: StorageBudget,
        settings: MissionSettings,
    ) -> Self {
        Self {
            sensors,
            position,
            camera,
            sink,
            budget,
            settings,
        }
    }

    pub fn budget(&self) -> &StorageBudget {
        &self.budget
    }

    pub fn settings(&self) -> &MissionSettings {
        &self.settings
    }

    /// Runs the guarded part of one iteration.
    ///
    /// # Errors
    ///
    /// Returns the first sensor, position, capture or persistence failure. No
    /// storage is credited for a failed capture.
    pub fn iterate(&mut self, counter: u32) -> Result<IterationReport> {
        let magnetic = self.sensors.compass_raw()?;
        let orientation = self.sensors.orientation()?;
        let acceleration = self.sensors.accelerometer_raw()?;
        let humidity = self.sensors.humidity()?;
        let temperature = self.sensors.temperature()?;

        let now = Local::now();
        let position = self.position.coordinates(now.with_timezone(&Utc))?;

        let record = SampleRecord::new(
            counter,
            now.naive_local(),
            position,
            temperature,
            humidity,
            magnetic,
            orientation,
            acceleration,
        );

        let outcome = if self.budget.remaining() {
            let path = photo_path(&self.settings.output_dir, counter);
            let bytes = capture(self.camera.as_mut(), &position, &path)?;
            self.budget.consume(bytes);
            info!("iteration {} photo size {}", counter, self.budget.consumed());
            CaptureOutcome::Captured {
                bytes,
                total: self.budget.consumed(),
            }
        } else {
            info!("iteration {} Max photos size reached.", counter);
            CaptureOutcome::BudgetExhausted
        };

        self.sink.append(&record)?;

        Ok(IterationReport {
            record,
            capture: outcome,
        })
    }

    /// Runs iterations until the time ceiling is reached.
    ///
    /// Never fails: every iteration error is logged and counted in the
    /// summary.
    pub async fn run(&mut self) -> MissionSummary {
        let mut state = LoopState::start(self.settings.run_duration);
        let mut summary = MissionSummary::default();

        info!(
            "Mission started: {}s run, {}s interval, {} byte photo budget",
            self.settings.run_duration.as_secs(),
            self.settings.sampling_interval.as_secs(),
            self.budget.ceiling()
        );

        while state.phase() == LoopPhase::Running {
            let counter = state.counter();
            match self.iterate(counter) {
                Ok(report) => {
                    summary.rows_written += 1;
                    if let CaptureOutcome::Captured { .. } = report.capture {
                        summary.photos += 1;
                    }
                }
                Err(e) => summary.failures.push(log_failure(counter, &e)),
            }
            summary.iterations += 1;

            state.advance();
            sleep(self.settings.sampling_interval).await;
            state.refresh();
        }

        summary.bytes = self.budget.consumed();
        summary.final_counter = state.counter();
        info!("Ended on iteration {}.", state.counter());
        summary
    }
}

fn log_failure(counter: u32, e: &SamplerError) -> IterationFailure {
    error!("iteration {} {}: {}", counter, e.kind(), e);
    IterationFailure {
        counter,
        kind: e.kind(),
        message: e.to_string(),
    }
}
